//! Correlates audit events into metric observations.
//!
//! One engine exists per audit source. It counts successful API requests and
//! tracks pods and batch jobs from creation to their resolving event:
//!
//! - pods: `create` -> `pods/binding` create gives the scheduling latency
//! - jobs: `create` -> first update whose body shows completion gives the
//!   completion latency
//!
//! A `delete` forgets the workload so a reused name starts over.

use audit_metrics::{ApiRequestLabels, Observation, PodDeletedLabels, WorkloadLabels};
use audit_types::{
    extract_resource_name, extract_user_agent, AuditEvent, ObjectMeta, Stage, Target,
};
use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::state::{CorrelationState, Lifecycle};

const PODS: &str = "pods";
const JOBS: &str = "jobs";
const BINDING: &str = "binding";
const STATUS: &str = "status";
const UNKNOWN_PHASE: &str = "Unknown";

/// Turns audit events from one source into observations.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    cluster: String,
    state: CorrelationState,
}

impl CorrelationEngine {
    /// Creates an engine whose observations carry the given cluster label.
    #[must_use]
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            state: CorrelationState::new(),
        }
    }

    /// Cluster label of this engine.
    #[must_use]
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Lifecycle state tracked so far.
    #[must_use]
    pub const fn state(&self) -> &CorrelationState {
        &self.state
    }

    /// Applies one event and returns the observations it produced.
    ///
    /// Events without a 2xx response status are ignored.
    pub fn apply(&mut self, event: &AuditEvent) -> Vec<Observation> {
        let mut observations = Vec::new();
        if !event.is_successful() {
            trace!(audit_id = %event.audit_id, code = ?event.response_code(), "skipping unsuccessful event");
            return observations;
        }

        let user = extract_user_agent(&event.user_agent);

        if event.stage == Stage::ResponseComplete {
            observations.push(Observation::ApiRequest(ApiRequestLabels {
                cluster: self.cluster.clone(),
                namespace: event.namespace().to_string(),
                user: user.clone(),
                verb: event.verb.clone(),
                resource: extract_resource_name(event),
                code: event.response_code().unwrap_or_default().to_string(),
            }));
        }

        match event.resource() {
            PODS => self.apply_pod(event, &user, &mut observations),
            JOBS => self.apply_job(event, &user, &mut observations),
            _ => {}
        }

        observations
    }

    fn workload_labels(&self, event: &AuditEvent, user: &str) -> WorkloadLabels {
        WorkloadLabels::new(self.cluster.as_str(), event.namespace(), user)
    }

    fn apply_pod(&mut self, event: &AuditEvent, user: &str, out: &mut Vec<Observation>) {
        match (event.subresource(), event.verb.as_str()) {
            (BINDING, "create") => self.pod_bound(event, user, out),
            ("", "create") => self.pod_created(event),
            ("", "delete") => self.pod_deleted(event, user, out),
            _ => {}
        }
    }

    fn pod_bound(&mut self, event: &AuditEvent, user: &str, out: &mut Vec<Observation>) {
        let target = Target::from_object_ref(event.object_ref.as_ref());
        let Some(bound_at) = event.reference_time() else {
            warn!(audit_id = %event.audit_id, pod = %target, "binding without timestamp, skipping");
            return;
        };

        let seconds = match self.state.pod(&target) {
            Some(Lifecycle::Resolved) => {
                trace!(pod = %target, "pod already resolved");
                return;
            }
            Some(Lifecycle::Pending(created)) => latency_seconds(created, bound_at),
            None => {
                debug!(pod = %target, "binding for untracked pod");
                0.0
            }
        };

        self.state.set_pod(target, Lifecycle::Resolved);
        out.push(Observation::PodScheduling {
            labels: self.workload_labels(event, user),
            seconds,
        });
    }

    fn pod_created(&mut self, event: &AuditEvent) {
        if !event.has_response_object() {
            return;
        }
        let pod = match event.decode_pod() {
            Ok(pod) => pod,
            Err(e) => {
                warn!(audit_id = %event.audit_id, error = %e, "failed to decode created pod");
                return;
            }
        };

        let target = target_of(&pod.metadata, event);
        if self.state.pod(&target).is_some() {
            debug!(pod = %target, "pod already tracked");
            return;
        }

        if pod.is_scheduled() {
            trace!(pod = %target, node = %pod.spec.node_name, "pod created already bound");
            self.state.set_pod(target, Lifecycle::Resolved);
            return;
        }

        // creationTimestamp is truncated to whole seconds; the stage time is not.
        match event.reference_time().or(pod.metadata.creation_timestamp) {
            Some(created) => self.state.set_pod(target, Lifecycle::Pending(created)),
            None => warn!(audit_id = %event.audit_id, pod = %target, "pod created without timestamp, not tracked"),
        }
    }

    fn pod_deleted(&mut self, event: &AuditEvent, user: &str, out: &mut Vec<Observation>) {
        let target = Target::from_object_ref(event.object_ref.as_ref());
        self.state.remove_pod(&target);

        if !event.has_response_object() {
            return;
        }
        let pod = match event.decode_pod() {
            Ok(pod) => pod,
            Err(e) => {
                warn!(audit_id = %event.audit_id, pod = %target, error = %e, "failed to decode deleted pod");
                return;
            }
        };

        let phase = if pod.status.phase.is_empty() {
            UNKNOWN_PHASE.to_string()
        } else {
            pod.status.phase
        };
        out.push(Observation::PodDeleted(PodDeletedLabels {
            cluster: self.cluster.clone(),
            namespace: event.namespace().to_string(),
            user: user.to_string(),
            phase,
        }));
    }

    fn apply_job(&mut self, event: &AuditEvent, user: &str, out: &mut Vec<Observation>) {
        match (event.subresource(), event.verb.as_str()) {
            ("", "create") => self.job_created(event),
            ("", "delete") => {
                let target = Target::from_object_ref(event.object_ref.as_ref());
                self.state.remove_job(&target);
            }
            ("" | STATUS, _) => self.job_updated(event, user, out),
            _ => {}
        }
    }

    fn job_created(&mut self, event: &AuditEvent) {
        if !event.has_response_object() {
            return;
        }
        let job = match event.decode_batch_job() {
            Ok(job) => job,
            Err(e) => {
                warn!(audit_id = %event.audit_id, error = %e, "failed to decode created job");
                return;
            }
        };

        let target = target_of(&job.metadata, event);
        if self.state.job(&target).is_some() {
            debug!(job = %target, "job already tracked");
            return;
        }

        match job.metadata.creation_timestamp.or_else(|| event.reference_time()) {
            Some(created) => self.state.set_job(target, Lifecycle::Pending(created)),
            None => warn!(audit_id = %event.audit_id, job = %target, "job created without timestamp, not tracked"),
        }
    }

    fn job_updated(&mut self, event: &AuditEvent, user: &str, out: &mut Vec<Observation>) {
        if !event.has_response_object() {
            return;
        }
        let target = Target::from_object_ref(event.object_ref.as_ref());
        let Some(Lifecycle::Pending(stored)) = self.state.job(&target) else {
            return;
        };

        let job = match event.decode_batch_job() {
            Ok(job) => job,
            Err(e) => {
                warn!(audit_id = %event.audit_id, job = %target, error = %e, "failed to decode updated job");
                return;
            }
        };
        if !job.is_completed() {
            return;
        }

        let Some(completed_at) = event.reference_time() else {
            warn!(audit_id = %event.audit_id, job = %target, "completion without timestamp, skipping");
            return;
        };
        let created = job.metadata.creation_timestamp.unwrap_or(stored);

        self.state.set_job(target, Lifecycle::Resolved);
        out.push(Observation::JobCompletion {
            labels: self.workload_labels(event, user),
            seconds: latency_seconds(created, completed_at),
        });
    }
}

/// Identity of a created object: its metadata, or the event's objectRef when
/// the body carries no name.
fn target_of(meta: &ObjectMeta, event: &AuditEvent) -> Target {
    if meta.name.is_empty() {
        Target::from_object_ref(event.object_ref.as_ref())
    } else {
        Target::from_meta(meta)
    }
}

/// Seconds from `from` to `to`, clamped at zero.
fn latency_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    match (to - from).to_std() {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(_) => {
            debug!(%from, %to, "negative latency clamped to zero");
            0.0
        }
    }
}
