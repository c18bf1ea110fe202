//! kube-audit-exporter - Kubernetes audit log exporter
//!
//! Tails API server audit logs and serves the derived metrics over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use audit_exporter::config::{
    DEFAULT_AUDIT_LOG_PATH, DEFAULT_CLUSTER_LABEL, DEFAULT_METRICS_PATH, SOURCE_WAIT_RETRY,
};
use audit_exporter::{
    wait_for_sources, ExporterConfig, ExporterError, MetricsServer, SourceRunner, SourceSpec,
};
use audit_metrics::ExporterRegistry;
use audit_tail::DEFAULT_READ_BUFFER_SIZE;
use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "kube-audit-exporter")]
#[command(about = "Export Kubernetes audit log activity as Prometheus metrics")]
#[command(version)]
struct Cli {
    /// Audit log to tail, as `path` or `path:cluster`. Repeatable.
    #[arg(
        long = "audit-log-path",
        env = "AUDIT_EXPORTER_AUDIT_LOG_PATH",
        default_value = DEFAULT_AUDIT_LOG_PATH
    )]
    audit_log_paths: Vec<String>,

    /// Address of the metrics listener
    #[arg(long, env = "AUDIT_EXPORTER_LISTEN_ADDRESS", default_value = "0.0.0.0:8080")]
    listen_address: SocketAddr,

    /// HTTP path serving the metrics
    #[arg(long, env = "AUDIT_EXPORTER_METRICS_PATH", default_value = DEFAULT_METRICS_PATH)]
    metrics_path: String,

    /// Cluster label for audit logs given without one
    #[arg(long, env = "AUDIT_EXPORTER_CLUSTER_LABEL", default_value = DEFAULT_CLUSTER_LABEL)]
    cluster_label: String,

    /// Replay historical logs at their original pace
    #[arg(long, env = "AUDIT_EXPORTER_REPLAY")]
    replay: bool,

    /// Seconds to wait before tailing starts
    #[arg(long, env = "AUDIT_EXPORTER_STARTUP_DELAY_SECS", default_value_t = 0)]
    startup_delay_secs: u64,

    /// Wait until every audit log exists and is non-empty
    #[arg(long, env = "AUDIT_EXPORTER_WAIT_FOR_SOURCES")]
    wait_for_sources: bool,

    /// Milliseconds between poll cycles
    #[arg(long, env = "AUDIT_EXPORTER_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Read buffer per audit log in bytes
    #[arg(long, env = "AUDIT_EXPORTER_READ_BUFFER_SIZE", default_value_t = DEFAULT_READ_BUFFER_SIZE)]
    read_buffer_size: usize,

    /// Log output format
    #[arg(long, env = "AUDIT_EXPORTER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    fn into_config(self) -> Result<ExporterConfig, ExporterError> {
        let mut config = ExporterConfig::new()
            .with_listen_addr(self.listen_address)
            .with_metrics_path(self.metrics_path)
            .with_replay(self.replay)
            .with_wait_for_sources(self.wait_for_sources)
            .with_startup_delay(Duration::from_secs(self.startup_delay_secs))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_read_buffer_size(self.read_buffer_size);

        for raw in &self.audit_log_paths {
            config = config.with_source(SourceSpec::parse(raw, &self.cluster_label)?);
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.into_config()?;
    run(config).await
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!(
        sources = config.sources.len(),
        listen = %config.listen_addr,
        replay = config.replay,
        "starting kube-audit-exporter"
    );

    let registry = ExporterRegistry::new();
    let server =
        MetricsServer::bind(config.listen_addr, config.metrics_path(), registry.clone()).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server_task = tokio::spawn(server.serve(shutdown_rx));

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown requested");
            Ok(())
        }
        result = tail_sources(&config, &registry) => result,
    };

    // The receiver is gone only if the server already stopped.
    let _ = shutdown_tx.send(true);
    server_task.await??;
    outcome
}

async fn tail_sources(config: &ExporterConfig, registry: &ExporterRegistry) -> anyhow::Result<()> {
    if config.wait_for_sources {
        let paths: Vec<PathBuf> = config.sources.iter().map(|s| s.path.clone()).collect();
        wait_for_sources(&paths, SOURCE_WAIT_RETRY).await;
    }
    if !config.startup_delay.is_zero() {
        info!(delay_secs = config.startup_delay.as_secs(), "delaying start");
        tokio::time::sleep(config.startup_delay).await;
    }

    let mut runners = JoinSet::new();
    for source in &config.sources {
        let runner =
            SourceRunner::new(source.clone(), config.tailer, config.replay, registry.clone());
        runners.spawn(runner.run(config.poll_interval));
    }

    while let Some(joined) = runners.join_next().await {
        if let Err(e) = joined? {
            error!(error = %e, "audit source stopped");
            return Err(e.into());
        }
    }
    Ok(())
}
