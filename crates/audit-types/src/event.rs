//! Audit event model.
//!
//! Mirrors the subset of the `audit.k8s.io/v1` `Event` schema the exporter
//! reads. The response body is kept as raw JSON and only decoded into a
//! snapshot when the resource kind calls for it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{Result, TypesError};
use crate::snapshot::{BatchJobSnapshot, PodSnapshot};

/// Stage of request handling at which the event was emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// The handler received the request.
    RequestReceived,
    /// Response headers were sent (long-running requests only).
    ResponseStarted,
    /// The response body was completed.
    ResponseComplete,
    /// A panic occurred while handling the request.
    Panic,
    /// Stage missing or not recognised.
    #[default]
    #[serde(other)]
    Unknown,
}

impl Stage {
    /// Returns the audit schema name of this stage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequestReceived => "RequestReceived",
            Self::ResponseStarted => "ResponseStarted",
            Self::ResponseComplete => "ResponseComplete",
            Self::Panic => "Panic",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit level the event was recorded at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Nothing recorded.
    None,
    /// Request metadata only.
    Metadata,
    /// Metadata and request body.
    Request,
    /// Metadata, request and response bodies.
    RequestResponse,
    /// Level missing or not recognised.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Reference to the object a request acted on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectRef {
    /// Resource plural, e.g. `pods`.
    pub resource: String,
    /// Subresource, e.g. `binding` or `status`.
    pub subresource: String,
    /// API group; empty for the core group.
    pub api_group: String,
    /// Object namespace.
    pub namespace: String,
    /// Object name; may be empty on create with `generateName`.
    pub name: String,
}

/// HTTP status attached to the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseStatus {
    /// HTTP status code.
    pub code: i32,
}

impl ResponseStatus {
    /// Returns true for a 2xx code.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }
}

/// One decoded audit log line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Unique audit identifier for the request.
    #[serde(default, rename = "auditID")]
    pub audit_id: String,
    /// Stage at which the event was generated.
    #[serde(default)]
    pub stage: Stage,
    /// Level the event was recorded at.
    #[serde(default)]
    pub level: Level,
    /// Request URI as sent by the client.
    #[serde(default, rename = "requestURI")]
    pub request_uri: String,
    /// Kubernetes verb, e.g. `create`, `update`, `delete`.
    #[serde(default)]
    pub verb: String,
    /// Raw user agent string.
    #[serde(default)]
    pub user_agent: String,
    /// Object the request acted on, when any.
    #[serde(default)]
    pub object_ref: Option<ObjectRef>,
    /// Response status, absent for stages without a response.
    #[serde(default)]
    pub response_status: Option<ResponseStatus>,
    /// Opaque response body, only present at `RequestResponse` level.
    #[serde(default)]
    pub response_object: Option<Box<RawValue>>,
    /// Time the request reached the API server.
    #[serde(default)]
    pub request_received_timestamp: Option<DateTime<Utc>>,
    /// Time the request reached the current stage.
    #[serde(default)]
    pub stage_timestamp: Option<DateTime<Utc>>,
}

impl AuditEvent {
    /// Decodes one audit log line.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidEvent`] if the bytes are not a valid event.
    pub fn from_slice(record: &[u8]) -> Result<Self> {
        serde_json::from_slice(record).map_err(TypesError::InvalidEvent)
    }

    /// Returns the response code, if the event has a response status.
    #[must_use]
    pub fn response_code(&self) -> Option<i32> {
        self.response_status.map(|s| s.code)
    }

    /// Returns true if the event carries a 2xx response status.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.response_status.is_some_and(|s| s.is_success())
    }

    /// Returns the referenced resource, or an empty string.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.object_ref.as_ref().map_or("", |r| r.resource.as_str())
    }

    /// Returns the referenced subresource, or an empty string.
    #[must_use]
    pub fn subresource(&self) -> &str {
        self.object_ref.as_ref().map_or("", |r| r.subresource.as_str())
    }

    /// Returns the referenced namespace, or an empty string.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.object_ref.as_ref().map_or("", |r| r.namespace.as_str())
    }

    /// Time the event describes: the stage timestamp, falling back to the
    /// request-received timestamp.
    #[must_use]
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.stage_timestamp.or(self.request_received_timestamp)
    }

    /// Returns true if a response body is attached.
    #[must_use]
    pub fn has_response_object(&self) -> bool {
        self.response_object.is_some()
    }

    /// Decodes the response body as a pod.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no body or it is not a pod.
    pub fn decode_pod(&self) -> Result<PodSnapshot> {
        let raw = self
            .response_object
            .as_deref()
            .ok_or(TypesError::MissingResponseObject)?;
        PodSnapshot::from_raw(raw)
    }

    /// Decodes the response body as a batch job.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no body or it is not a job.
    pub fn decode_batch_job(&self) -> Result<BatchJobSnapshot> {
        let raw = self
            .response_object
            .as_deref()
            .ok_or(TypesError::MissingResponseObject)?;
        BatchJobSnapshot::from_raw(raw)
    }
}
