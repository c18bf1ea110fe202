//! Object snapshots embedded in audit response bodies.
//!
//! Only the fields the correlation engine reads are modelled; everything else
//! in the body is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{Result, TypesError};

/// Phase string that job engines use for a finished job.
const COMPLETED_PHASE: &str = "Completed";

/// Condition type prefix marking a finished job (`Complete`, `Completed`).
const COMPLETE_CONDITION_PREFIX: &str = "Complete";

/// Common object metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    /// Object UID.
    pub uid: String,
    /// Object name.
    pub name: String,
    /// Object namespace.
    pub namespace: String,
    /// Time the object was created.
    pub creation_timestamp: Option<DateTime<Utc>>,
}

/// Pod spec fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodSpec {
    /// Node the pod is bound to; empty while unscheduled.
    pub node_name: String,
}

/// One pod status condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodCondition {
    /// Condition type, e.g. `PodScheduled`.
    #[serde(rename = "type")]
    pub type_: String,
    /// `True`, `False` or `Unknown`.
    pub status: String,
}

/// Pod status fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodStatus {
    /// Pod phase, e.g. `Pending`, `Succeeded`.
    pub phase: String,
    /// Status conditions.
    pub conditions: Vec<PodCondition>,
}

/// A pod decoded from a response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodSnapshot {
    /// Object metadata.
    pub metadata: ObjectMeta,
    /// Pod spec.
    pub spec: PodSpec,
    /// Pod status.
    pub status: PodStatus,
}

impl PodSnapshot {
    /// Decodes a pod from a raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidSnapshot`] if the body does not decode.
    pub fn from_raw(raw: &RawValue) -> Result<Self> {
        serde_json::from_str(raw.get())
            .map_err(|source| TypesError::InvalidSnapshot { kind: "pod", source })
    }

    /// Returns true if the pod already has a node assigned.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        !self.spec.node_name.is_empty()
    }
}

/// One job status condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobCondition {
    /// Condition type, e.g. `Complete`, `Failed`.
    #[serde(rename = "type")]
    pub type_: String,
    /// `True`, `False` or `Unknown`.
    pub status: String,
}

/// Nested state block used by Volcano-style jobs (`status.state.phase`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobState {
    /// Engine phase.
    pub phase: String,
}

/// Job status in any of the encodings the exporter understands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobStatus {
    /// Engine phase reported at the top level of the status.
    pub phase: Option<String>,
    /// Engine phase reported in a nested state block.
    pub state: Option<JobState>,
    /// Completion time set by the batch/v1 job controller.
    pub completion_time: Option<DateTime<Utc>>,
    /// Status conditions.
    pub conditions: Vec<JobCondition>,
}

impl JobStatus {
    /// Returns the engine-specific phase, if any encoding carries one.
    #[must_use]
    pub fn phase(&self) -> Option<&str> {
        self.phase
            .as_deref()
            .or_else(|| self.state.as_ref().map(|s| s.phase.as_str()))
            .filter(|p| !p.is_empty())
    }

    /// Returns true if the job finished.
    ///
    /// Checked in order: engine phase `Completed`, a non-zero completion
    /// time, then any condition whose type starts with `Complete`.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        if self.phase() == Some(COMPLETED_PHASE) {
            return true;
        }
        if self.completion_time.is_some_and(|t| t.timestamp() > 0) {
            return true;
        }
        self.conditions
            .iter()
            .any(|c| c.type_.starts_with(COMPLETE_CONDITION_PREFIX))
    }
}

/// A batch job decoded from a response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchJobSnapshot {
    /// Object metadata.
    pub metadata: ObjectMeta,
    /// Job status.
    pub status: JobStatus,
}

impl BatchJobSnapshot {
    /// Decodes a job from a raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidSnapshot`] if the body does not decode.
    pub fn from_raw(raw: &RawValue) -> Result<Self> {
        serde_json::from_str(raw.get())
            .map_err(|source| TypesError::InvalidSnapshot { kind: "job", source })
    }

    /// Returns true if the job finished.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }
}
