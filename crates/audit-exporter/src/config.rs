//! Exporter configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use audit_tail::TailerConfig;

use crate::error::{ExporterError, Result};

/// Default metrics listener: all interfaces, port 8080.
pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);

/// Default exposition path.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Cluster label used for sources given without one.
pub const DEFAULT_CLUSTER_LABEL: &str = "default";

/// Default audit log location.
pub const DEFAULT_AUDIT_LOG_PATH: &str = "./audit.log";

/// Default interval between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Retry interval of the startup barrier.
pub const SOURCE_WAIT_RETRY: Duration = Duration::from_secs(1);

/// One audit log and the cluster label its series carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Path of the audit log.
    pub path: PathBuf,
    /// Value of the `cluster` label.
    pub cluster: String,
}

impl SourceSpec {
    /// Creates a source from its parts.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, cluster: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cluster: cluster.into(),
        }
    }

    /// Parses `path` or `path:label`.
    ///
    /// The label is everything after the last `:`. A missing or empty label
    /// falls back to `default_cluster`.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::Config`] if the path part is empty.
    pub fn parse(raw: &str, default_cluster: &str) -> Result<Self> {
        let (path, cluster) = match raw.rsplit_once(':') {
            Some((path, label)) if !label.is_empty() => (path, label),
            Some((path, _)) => (path, default_cluster),
            None => (raw, default_cluster),
        };

        if path.is_empty() {
            return Err(ExporterError::Config(format!(
                "audit log source {raw:?} has no path"
            )));
        }

        Ok(Self::new(path, cluster))
    }
}

/// Runtime configuration of the exporter.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Audit logs to tail, one runner each.
    pub sources: Vec<SourceSpec>,
    /// Metrics listener address.
    pub listen_addr: SocketAddr,
    /// Exposition path.
    pub metrics_path: String,
    /// Pace historical logs to wall-clock time.
    pub replay: bool,
    /// Block until every source exists and is non-empty.
    pub wait_for_sources: bool,
    /// One-time delay before tailing starts.
    pub startup_delay: Duration,
    /// Interval between poll cycles.
    pub poll_interval: Duration,
    /// Tailer settings shared by all sources.
    pub tailer: TailerConfig,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterConfig {
    /// Creates a configuration with default values and no sources.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sources: Vec::new(),
            listen_addr: DEFAULT_LISTEN_ADDR,
            metrics_path: String::new(),
            replay: false,
            wait_for_sources: false,
            startup_delay: Duration::ZERO,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tailer: TailerConfig::new(),
        }
    }

    /// Adds a source.
    #[must_use]
    pub fn with_source(mut self, source: SourceSpec) -> Self {
        self.sources.push(source);
        self
    }

    /// Sets the listener address.
    #[must_use]
    pub const fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// Sets the exposition path.
    #[must_use]
    pub fn with_metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = path.into();
        self
    }

    /// Enables or disables replay pacing.
    #[must_use]
    pub const fn with_replay(mut self, replay: bool) -> Self {
        self.replay = replay;
        self
    }

    /// Enables or disables the startup barrier.
    #[must_use]
    pub const fn with_wait_for_sources(mut self, wait: bool) -> Self {
        self.wait_for_sources = wait;
        self
    }

    /// Sets the one-time startup delay.
    #[must_use]
    pub const fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the tailer read buffer size.
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.tailer = self.tailer.with_read_buffer_size(size);
        self
    }

    /// Returns the exposition path, defaulting to `/metrics`.
    #[must_use]
    pub fn metrics_path(&self) -> &str {
        if self.metrics_path.is_empty() {
            DEFAULT_METRICS_PATH
        } else {
            &self.metrics_path
        }
    }

    /// Checks the configuration before anything is started.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(ExporterError::Config(
                "at least one audit log source is required".to_string(),
            ));
        }
        if !self.metrics_path().starts_with('/') {
            return Err(ExporterError::Config(format!(
                "metrics path {:?} must start with '/'",
                self.metrics_path
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(ExporterError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
