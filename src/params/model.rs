//! CAI model configuration.
//!
//! Boolean switches travel as the literal tokens `"yes"` and `"no"`. Decoding any
//! other token fails with [`Error::OutOfRange`] naming the field.

use crate::codec::yes_no;
use crate::utils::error::Error;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelMode {
    Train,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Classification,
    Regression,
}

/// Configuration sent as `params` when creating a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelParametersWire")]
pub struct ModelParameters {
    pub mode: ModelMode,
    pub task_type: TaskType,
    /// Feature-selection strategy, e.g. `boruta`
    pub feature_selection: String,
    /// Depth of the exploratory analysis, e.g. `basic` or `full`
    pub analysis_depth: String,
    /// Gradient boosting library, e.g. `lightgbm` or `xgboost`
    pub boosting_algorithm: String,
    /// Share of samples held out for testing
    pub test_size: f64,
    #[serde(serialize_with = "yes_no::serialize")]
    pub hyperparameter_tuning: bool,
    #[serde(serialize_with = "yes_no::serialize")]
    pub calibrate_probabilities: bool,
    #[serde(serialize_with = "yes_no::serialize")]
    pub explainability: bool,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            mode: ModelMode::Train,
            task_type: TaskType::Classification,
            feature_selection: "boruta".to_string(),
            analysis_depth: "basic".to_string(),
            boosting_algorithm: "lightgbm".to_string(),
            test_size: 0.2,
            hyperparameter_tuning: false,
            calibrate_probabilities: false,
            explainability: false,
        }
    }
}

#[derive(Deserialize)]
struct ModelParametersWire {
    mode: ModelMode,
    task_type: TaskType,
    feature_selection: String,
    analysis_depth: String,
    boosting_algorithm: String,
    test_size: f64,
    hyperparameter_tuning: String,
    calibrate_probabilities: String,
    explainability: String,
}

impl TryFrom<ModelParametersWire> for ModelParameters {
    type Error = Error;

    fn try_from(wire: ModelParametersWire) -> Result<Self, Self::Error> {
        Ok(Self {
            mode: wire.mode,
            task_type: wire.task_type,
            feature_selection: wire.feature_selection,
            analysis_depth: wire.analysis_depth,
            boosting_algorithm: wire.boosting_algorithm,
            test_size: wire.test_size,
            hyperparameter_tuning: yes_no::parse("hyperparameter_tuning", &wire.hyperparameter_tuning)?,
            calibrate_probabilities: yes_no::parse(
                "calibrate_probabilities",
                &wire.calibrate_probabilities,
            )?,
            explainability: yes_no::parse("explainability", &wire.explainability)?,
        })
    }
}
