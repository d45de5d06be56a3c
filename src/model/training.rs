//! Model creation, training status and training results from the CAI service.

use super::{null_variant, render, NullVariant};
use crate::codec::{loose_flag, opaque};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// State value the CAI service reports once training has finished.
pub const COMPLETED_STATE: &str = "COMPLETED";

/// Answer to `POST /models`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateModelResponse {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "loose_flag")]
    pub success: Option<bool>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

/// Answer to `POST /trainings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainModelResponse {
    #[serde(default)]
    pub message: Option<String>,
    /// Id to pass to the training-status query
    #[serde(default)]
    pub train_id: Option<String>,
    #[serde(default, deserialize_with = "loose_flag")]
    pub success: Option<bool>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

/// Progress report of a training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStatus {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub current_step: Option<u64>,
    #[serde(default)]
    pub total_steps: Option<u64>,
    #[serde(default, deserialize_with = "opaque")]
    pub result: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "message", default)]
    pub status_message: Option<String>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

impl TrainingStatus {
    /// `true` once `state` is `COMPLETED`, compared case-insensitively.
    pub fn is_completed(&self) -> bool {
        self.state.as_deref().map_or(false, |state| state.eq_ignore_ascii_case(COMPLETED_STATE))
    }
}

/// Named artifacts produced by a finished training run, kept as serialized text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingArtifacts {
    #[serde(default, deserialize_with = "opaque", skip_serializing_if = "Option::is_none")]
    pub feature_importance: Option<String>,
    #[serde(default, deserialize_with = "opaque", skip_serializing_if = "Option::is_none")]
    pub cv_probabilities: Option<String>,
    #[serde(default, deserialize_with = "opaque", skip_serializing_if = "Option::is_none")]
    pub cv_predictions: Option<String>,
    #[serde(default, deserialize_with = "opaque", skip_serializing_if = "Option::is_none")]
    pub test_probabilities: Option<String>,
    #[serde(default, deserialize_with = "opaque", skip_serializing_if = "Option::is_none")]
    pub test_predictions: Option<String>,
    #[serde(default, deserialize_with = "opaque", skip_serializing_if = "Option::is_none")]
    pub eda_description: Option<String>,
}

impl TrainingArtifacts {
    pub fn is_empty(&self) -> bool {
        [
            &self.feature_importance,
            &self.cv_probabilities,
            &self.cv_predictions,
            &self.test_probabilities,
            &self.test_predictions,
            &self.eda_description,
        ]
        .iter()
        .all(|artifact| artifact.is_none())
    }
}

/// Answer to `POST /get_result`.
///
/// While training runs the service echoes the training status; once it is done
/// the artifacts come back instead. A result is completed exactly when it does
/// not hold a status.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingResult {
    Running(TrainingStatus),
    Completed(TrainingArtifacts),
}

impl TrainingResult {
    /// Wraps a status. A completed status carries no artifacts yet.
    pub fn from_status(status: TrainingStatus) -> Self {
        if status.is_completed() && !status.is_null() {
            TrainingResult::Completed(TrainingArtifacts::default())
        } else {
            TrainingResult::Running(status)
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TrainingResult::Completed(_))
    }

    pub fn status(&self) -> Option<&TrainingStatus> {
        match self {
            | TrainingResult::Running(status) => Some(status),
            | TrainingResult::Completed(_) => None,
        }
    }

    pub fn artifacts(&self) -> Option<&TrainingArtifacts> {
        match self {
            | TrainingResult::Running(_) => None,
            | TrainingResult::Completed(artifacts) => Some(artifacts),
        }
    }
}

impl Default for TrainingResult {
    fn default() -> Self {
        TrainingResult::Running(TrainingStatus::default())
    }
}

impl NullVariant for TrainingResult {
    fn null(message: impl Into<String>) -> Self {
        TrainingResult::Running(TrainingStatus::null(message))
    }

    fn diagnostic(&self) -> Option<&str> {
        self.status().and_then(NullVariant::diagnostic)
    }
}

#[derive(Deserialize)]
struct TrainingResultWire {
    #[serde(flatten)]
    status: TrainingStatus,
    #[serde(flatten)]
    artifacts: TrainingArtifacts,
}

impl From<TrainingResultWire> for TrainingResult {
    fn from(wire: TrainingResultWire) -> Self {
        let still_running = wire.status.state.is_some() && !wire.status.is_completed();
        if still_running {
            TrainingResult::Running(wire.status)
        } else if !wire.artifacts.is_empty() || wire.status.is_completed() {
            TrainingResult::Completed(wire.artifacts)
        } else {
            TrainingResult::Running(wire.status)
        }
    }
}

impl<'de> Deserialize<'de> for TrainingResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        TrainingResultWire::deserialize(deserializer).map(TrainingResult::from)
    }
}

impl Serialize for TrainingResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            | TrainingResult::Running(status) => status.serialize(serializer),
            | TrainingResult::Completed(artifacts) => artifacts.serialize(serializer),
        }
    }
}

impl fmt::Display for TrainingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, self.diagnostic(), self)
    }
}

null_variant!(CreateModelResponse, TrainModelResponse, TrainingStatus);
