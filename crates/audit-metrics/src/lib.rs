//! Metric series derived from Kubernetes audit events.
#![forbid(unsafe_code)]
//!
//! `audit-metrics` owns the sink side of the exporter: the observation
//! vocabulary the correlation engine emits, and a `prometheus-client`
//! registry that turns observations into OpenMetrics series.
//!
//! | series | kind | labels |
//! |---|---|---|
//! | `api_requests_total` | counter | cluster, namespace, user, verb, resource, code |
//! | `pod_scheduling_latency_seconds` | histogram | cluster, namespace, user |
//! | `pod_deleted_total` | counter | cluster, namespace, user, phase |
//! | `batchjob_completion_latency_seconds` | histogram | cluster, namespace, user |
//!
//! # Example
//!
//! ```rust
//! use audit_metrics::{ExporterRegistry, Observation, ObservationSink, WorkloadLabels};
//!
//! let registry = ExporterRegistry::new();
//! registry.record(&Observation::PodScheduling {
//!     labels: WorkloadLabels::new("prod", "team-a", "kube-scheduler"),
//!     seconds: 1.5,
//! });
//!
//! let output = registry.encode().unwrap();
//! assert!(output.contains("pod_scheduling_latency_seconds"));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod observation;
pub mod registry;

// Re-export main types at crate root
pub use error::{MetricsError, Result};
pub use observation::{
    ApiRequestLabels, Observation, ObservationSink, PodDeletedLabels, WorkloadLabels,
};
pub use registry::{ExporterMetrics, ExporterRegistry, MetricsHandler, MetricsResponse};
