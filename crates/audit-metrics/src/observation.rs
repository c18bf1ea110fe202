//! Observations emitted by the correlation engine and the sink they feed.

use std::sync::Arc;

use parking_lot::Mutex;
use prometheus_client::encoding::EncodeLabelSet;

/// Label set for `api_requests_total`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ApiRequestLabels {
    /// Cluster label of the audit source.
    pub cluster: String,
    /// Namespace of the referenced object.
    pub namespace: String,
    /// Client name derived from the user agent.
    pub user: String,
    /// Kubernetes verb.
    pub verb: String,
    /// `resource[.group][/subresource]`.
    pub resource: String,
    /// HTTP response code.
    pub code: String,
}

/// Label set for the latency histograms.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct WorkloadLabels {
    /// Cluster label of the audit source.
    pub cluster: String,
    /// Namespace of the workload.
    pub namespace: String,
    /// Client name derived from the user agent.
    pub user: String,
}

impl WorkloadLabels {
    /// Creates a workload label set.
    #[must_use]
    pub fn new(
        cluster: impl Into<String>,
        namespace: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            namespace: namespace.into(),
            user: user.into(),
        }
    }
}

/// Label set for `pod_deleted_total`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct PodDeletedLabels {
    /// Cluster label of the audit source.
    pub cluster: String,
    /// Namespace of the deleted pod.
    pub namespace: String,
    /// Client name derived from the user agent.
    pub user: String,
    /// Phase of the pod when it was deleted.
    pub phase: String,
}

/// One update for the metrics sink.
#[derive(Clone, Debug, PartialEq)]
pub enum Observation {
    /// A successful API request completed.
    ApiRequest(ApiRequestLabels),
    /// Time from pod creation to its binding.
    PodScheduling {
        /// Histogram labels.
        labels: WorkloadLabels,
        /// Latency in seconds.
        seconds: f64,
    },
    /// A pod was deleted.
    PodDeleted(PodDeletedLabels),
    /// Time from job creation to completion.
    JobCompletion {
        /// Histogram labels.
        labels: WorkloadLabels,
        /// Latency in seconds.
        seconds: f64,
    },
}

/// Destination for observations, shared by every audit source.
pub trait ObservationSink: Send + Sync {
    /// Applies one observation.
    fn record(&self, observation: &Observation);
}

impl<S: ObservationSink + ?Sized> ObservationSink for Arc<S> {
    fn record(&self, observation: &Observation) {
        (**self).record(observation);
    }
}

/// Keeps observations in memory, in arrival order.
impl ObservationSink for Mutex<Vec<Observation>> {
    fn record(&self, observation: &Observation) {
        self.lock().push(observation.clone());
    }
}
