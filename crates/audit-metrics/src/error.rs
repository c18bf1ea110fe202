//! Error types for the audit-metrics crate.

use thiserror::Error;

/// Errors that can occur in the metrics sink.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The registry could not be rendered in exposition format.
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] std::fmt::Error),
}

/// Result type for metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;
