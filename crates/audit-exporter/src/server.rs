//! HTTP endpoint serving the metrics registry.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use audit_metrics::{ExporterRegistry, MetricsHandler};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{ExporterError, Result};

/// HTTP/1.1 server exposing the registry on a single path.
#[derive(Debug)]
pub struct MetricsServer {
    listener: TcpListener,
    path: Arc<str>,
    handler: MetricsHandler,
}

impl MetricsServer {
    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::Bind`] if the address cannot be bound.
    pub async fn bind(
        addr: SocketAddr,
        path: impl Into<String>,
        registry: ExporterRegistry,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ExporterError::Bind(addr, e))?;

        Ok(Self {
            listener,
            path: Arc::from(path.into()),
            handler: MetricsHandler::new(registry),
        })
    }

    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` turns true or its sender is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the local address cannot be read.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr = self.local_addr()?;
        info!(addr = %addr, path = %self.path, "metrics endpoint listening");

        loop {
            tokio::select! {
                accept = self.listener.accept() => {
                    match accept {
                        Ok((stream, peer)) => {
                            let path = Arc::clone(&self.path);
                            let handler = self.handler.clone();
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let svc = service_fn(move |req| {
                                    let response = respond(&req, &path, &handler);
                                    async move { Ok::<_, Infallible>(response) }
                                });

                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, svc)
                                    .await
                                {
                                    if !e.is_incomplete_message() {
                                        warn!(peer = %peer, error = %e, "metrics connection error");
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "accept failed");
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("metrics endpoint shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

fn respond(req: &Request<Incoming>, path: &str, handler: &MetricsHandler) -> Response<Full<Bytes>> {
    debug!(method = %req.method(), uri = %req.uri(), "metrics request");

    if req.uri().path() != path {
        return plain(StatusCode::NOT_FOUND, "not found\n");
    }
    if req.method() != Method::GET {
        let mut response = plain(StatusCode::METHOD_NOT_ALLOWED, "method not allowed\n");
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("GET"));
        return response;
    }

    match handler.handle() {
        Ok(metrics) => {
            let mut response = Response::new(Full::new(Bytes::from(metrics.body)));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static(metrics.content_type),
            );
            response
        }
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics\n")
        }
    }
}

fn plain(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}
