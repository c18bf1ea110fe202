//! Per-source lifecycle tracking for pods and batch jobs.

use std::collections::HashMap;

use audit_types::Target;
use chrono::{DateTime, Utc};

/// Where a tracked workload is in its create-to-resolution lifecycle.
///
/// A workload with no entry is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created at the given time, waiting for the resolving event.
    Pending(DateTime<Utc>),
    /// Latency already emitted, or never applicable.
    Resolved,
}

/// Lifecycle maps owned by one correlation engine.
#[derive(Debug, Clone, Default)]
pub struct CorrelationState {
    pods: HashMap<Target, Lifecycle>,
    jobs: HashMap<Target, Lifecycle>,
}

impl CorrelationState {
    /// Creates empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pod's lifecycle, `None` when absent.
    #[must_use]
    pub fn pod(&self, target: &Target) -> Option<Lifecycle> {
        self.pods.get(target).copied()
    }

    /// Records the pod's lifecycle.
    pub fn set_pod(&mut self, target: Target, lifecycle: Lifecycle) {
        self.pods.insert(target, lifecycle);
    }

    /// Forgets the pod, returning its previous lifecycle.
    pub fn remove_pod(&mut self, target: &Target) -> Option<Lifecycle> {
        self.pods.remove(target)
    }

    /// Returns the job's lifecycle, `None` when absent.
    #[must_use]
    pub fn job(&self, target: &Target) -> Option<Lifecycle> {
        self.jobs.get(target).copied()
    }

    /// Records the job's lifecycle.
    pub fn set_job(&mut self, target: Target, lifecycle: Lifecycle) {
        self.jobs.insert(target, lifecycle);
    }

    /// Forgets the job, returning its previous lifecycle.
    pub fn remove_job(&mut self, target: &Target) -> Option<Lifecycle> {
        self.jobs.remove(target)
    }

    /// Number of tracked pods.
    #[must_use]
    pub fn pod_count(&self) -> usize {
        self.pods.len()
    }

    /// Number of tracked jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}
