//! # audit-types
//!
//! Decoded model of Kubernetes API-server audit events.
//!
//! This crate provides:
//!
//! - [`AuditEvent`] — One decoded audit log line
//! - [`Target`] — The (name, namespace) identity used to correlate events
//! - [`PodSnapshot`] / [`BatchJobSnapshot`] — Response bodies decoded lazily
//! - [`extract_user_agent`] / [`extract_resource_name`] — Metric label helpers
//!
//! ## Example
//!
//! ```rust
//! use audit_types::{AuditEvent, Stage, extract_resource_name, extract_user_agent};
//!
//! let line = br#"{"verb":"create","stage":"ResponseComplete","userAgent":"kubectl/v1.29 (linux/amd64)","objectRef":{"resource":"jobs","apiGroup":"batch","namespace":"ml","name":"train"},"responseStatus":{"code":201}}"#;
//! let event = AuditEvent::from_slice(line).unwrap();
//!
//! assert_eq!(event.stage, Stage::ResponseComplete);
//! assert_eq!(extract_user_agent(&event.user_agent), "kubectl");
//! assert_eq!(extract_resource_name(&event), "jobs.batch");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod extract;
pub mod snapshot;
pub mod target;

// Re-export main types
pub use error::{Result, TypesError};
pub use event::{AuditEvent, Level, ObjectRef, ResponseStatus, Stage};
pub use extract::{extract_resource_name, extract_user_agent, UNKNOWN_USER};
pub use snapshot::{
    BatchJobSnapshot, JobCondition, JobState, JobStatus, ObjectMeta, PodCondition, PodSnapshot,
    PodSpec, PodStatus,
};
pub use target::Target;
