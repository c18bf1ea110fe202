//! Kubernetes audit log exporter.
#![forbid(unsafe_code)]
//!
//! Tails one or more API server audit logs, correlates related events per
//! workload and publishes the results as Prometheus metrics:
//!
//! - [`engine::CorrelationEngine`]: pod scheduling and job completion latency
//! - [`source::SourceRunner`]: the periodic tail-decode-correlate cycle
//! - [`server::MetricsServer`]: the `/metrics` HTTP endpoint
//! - [`startup::wait_for_sources`]: optional startup barrier
//!
//! # Example
//!
//! ```rust
//! use audit_exporter::CorrelationEngine;
//! use audit_types::AuditEvent;
//!
//! let line = br#"{"stage":"ResponseComplete","verb":"create","userAgent":"kube-scheduler/v1.29.0","objectRef":{"resource":"pods","namespace":"default","name":"web-0","subresource":"binding"},"responseStatus":{"code":201},"stageTimestamp":"2024-03-01T10:00:05Z"}"#;
//! let event = AuditEvent::from_slice(line).unwrap();
//!
//! let mut engine = CorrelationEngine::new("prod");
//! let observations = engine.apply(&event);
//! // One API request plus a zero-second scheduling latency for the untracked pod.
//! assert_eq!(observations.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod source;
pub mod startup;
pub mod state;

// Re-export main types at crate root
pub use config::{ExporterConfig, SourceSpec};
pub use engine::CorrelationEngine;
pub use error::{ExporterError, Result};
pub use server::MetricsServer;
pub use source::{CycleReport, SourceRunner};
pub use startup::wait_for_sources;
pub use state::{CorrelationState, Lifecycle};
