//! Error types for the exporter.

use std::net::SocketAddr;

use audit_tail::TailError;
use audit_types::TypesError;
use thiserror::Error;

/// Errors that can occur while running the exporter.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// The metrics listener could not bind.
    #[error("failed to bind metrics listener on {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Tailing the audit log failed.
    #[error(transparent)]
    Tail(#[from] TailError),

    /// An audit record could not be decoded.
    #[error("failed to decode audit event: {0}")]
    Decode(#[from] TypesError),

    /// A blocking source task panicked or was cancelled.
    #[error("source task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Socket-level I/O failure after bind.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, ExporterError>;
