use super::null_variant;
use crate::codec::{loose_flag, opaque};
use serde::{Deserialize, Serialize};

/// Answer to `POST /predictions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictResult {
    /// Name of the prediction file the service wrote
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub labels: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub probabilities: Option<String>,
    #[serde(default, deserialize_with = "loose_flag")]
    pub prob_calib: Option<bool>,
    #[serde(default)]
    pub title: Option<String>,
    /// Input columns with too many missing values to be used
    #[serde(rename = "over_null_cols", default)]
    pub over_null_columns: Vec<String>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

null_variant!(PredictResult);
