//! Prometheus registry holding the exporter's series.

use std::sync::Arc;

use parking_lot::RwLock;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use tracing::trace;

use crate::error::Result;
use crate::observation::{
    ApiRequestLabels, Observation, ObservationSink, PodDeletedLabels, WorkloadLabels,
};

type HistogramFamily = Family<WorkloadLabels, Histogram, fn() -> Histogram>;

// 1ms .. ~524s
fn scheduling_histogram() -> Histogram {
    Histogram::new(exponential_buckets(0.001, 2.0, 20))
}

// 1s .. ~34min
fn completion_histogram() -> Histogram {
    Histogram::new(exponential_buckets(1.0, 2.0, 12))
}

/// The four series derived from audit events.
#[derive(Clone)]
pub struct ExporterMetrics {
    api_requests: Family<ApiRequestLabels, Counter>,
    pod_scheduling_latency: HistogramFamily,
    pod_deleted: Family<PodDeletedLabels, Counter>,
    job_completion_latency: HistogramFamily,
}

impl std::fmt::Debug for ExporterMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterMetrics").finish_non_exhaustive()
    }
}

impl ExporterMetrics {
    /// Creates the series and registers them with the given registry.
    fn new(registry: &mut Registry) -> Self {
        let api_requests = Family::<ApiRequestLabels, Counter>::default();
        registry.register(
            "api_requests",
            "Successful Kubernetes API requests seen in the audit log",
            api_requests.clone(),
        );

        let pod_scheduling_latency: HistogramFamily =
            Family::new_with_constructor(scheduling_histogram);
        registry.register(
            "pod_scheduling_latency_seconds",
            "Time from pod creation to binding onto a node",
            pod_scheduling_latency.clone(),
        );

        let pod_deleted = Family::<PodDeletedLabels, Counter>::default();
        registry.register(
            "pod_deleted",
            "Pods deleted, by phase at deletion time",
            pod_deleted.clone(),
        );

        let job_completion_latency: HistogramFamily =
            Family::new_with_constructor(completion_histogram);
        registry.register(
            "batchjob_completion_latency_seconds",
            "Time from batch job creation to completion",
            job_completion_latency.clone(),
        );

        Self {
            api_requests,
            pod_scheduling_latency,
            pod_deleted,
            job_completion_latency,
        }
    }

    /// Increments `api_requests_total` for the label set.
    pub fn inc_api_requests(&self, labels: &ApiRequestLabels) {
        self.api_requests.get_or_create(labels).inc();
    }

    /// Gets the current `api_requests_total` value for the label set.
    #[must_use]
    pub fn get_api_requests(&self, labels: &ApiRequestLabels) -> u64 {
        self.api_requests.get_or_create(labels).get()
    }

    /// Records a pod scheduling latency in seconds.
    pub fn observe_pod_scheduling(&self, labels: &WorkloadLabels, seconds: f64) {
        self.pod_scheduling_latency
            .get_or_create(labels)
            .observe(seconds);
    }

    /// Increments `pod_deleted_total` for the label set.
    pub fn inc_pod_deleted(&self, labels: &PodDeletedLabels) {
        self.pod_deleted.get_or_create(labels).inc();
    }

    /// Gets the current `pod_deleted_total` value for the label set.
    #[must_use]
    pub fn get_pod_deleted(&self, labels: &PodDeletedLabels) -> u64 {
        self.pod_deleted.get_or_create(labels).get()
    }

    /// Records a batch job completion latency in seconds.
    pub fn observe_job_completion(&self, labels: &WorkloadLabels, seconds: f64) {
        self.job_completion_latency
            .get_or_create(labels)
            .observe(seconds);
    }
}

/// Registry shared between the audit sources and the HTTP endpoint.
///
/// Clones share the same underlying series.
#[derive(Clone)]
pub struct ExporterRegistry {
    registry: Arc<RwLock<Registry>>,
    metrics: ExporterMetrics,
}

impl std::fmt::Debug for ExporterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterRegistry")
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Default for ExporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterRegistry {
    /// Creates a registry with every exporter series registered.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let metrics = ExporterMetrics::new(&mut registry);

        Self {
            registry: Arc::new(RwLock::new(registry)),
            metrics,
        }
    }

    /// Returns the registered series.
    #[must_use]
    pub const fn metrics(&self) -> &ExporterMetrics {
        &self.metrics
    }

    /// Encodes all series in OpenMetrics text format.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder fails to write a series.
    pub fn encode(&self) -> Result<String> {
        let registry = self.registry.read();
        let mut buffer = String::new();
        encode(&mut buffer, &registry)?;
        Ok(buffer)
    }

    /// Returns the Content-Type header value for the encoded output.
    #[must_use]
    pub const fn content_type() -> &'static str {
        "application/openmetrics-text; version=1.0.0; charset=utf-8"
    }
}

impl ObservationSink for ExporterRegistry {
    fn record(&self, observation: &Observation) {
        trace!(?observation, "recording observation");
        match observation {
            Observation::ApiRequest(labels) => self.metrics.inc_api_requests(labels),
            Observation::PodScheduling { labels, seconds } => {
                self.metrics.observe_pod_scheduling(labels, *seconds);
            }
            Observation::PodDeleted(labels) => self.metrics.inc_pod_deleted(labels),
            Observation::JobCompletion { labels, seconds } => {
                self.metrics.observe_job_completion(labels, *seconds);
            }
        }
    }
}

/// Framework-independent handler for the metrics endpoint.
#[derive(Clone, Debug)]
pub struct MetricsHandler {
    registry: ExporterRegistry,
}

impl MetricsHandler {
    /// Creates a handler serving the given registry.
    #[must_use]
    pub const fn new(registry: ExporterRegistry) -> Self {
        Self { registry }
    }

    /// Renders the current series.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn handle(&self) -> Result<MetricsResponse> {
        Ok(MetricsResponse {
            body: self.registry.encode()?,
            content_type: ExporterRegistry::content_type(),
        })
    }
}

/// Response from the metrics handler.
#[derive(Debug, Clone)]
pub struct MetricsResponse {
    /// The response body in OpenMetrics text format.
    pub body: String,
    /// The Content-Type header value.
    pub content_type: &'static str,
}
