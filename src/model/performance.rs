use super::null_variant;
use serde::{Deserialize, Serialize};

/// Risk/return metrics of a backtest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    #[serde(rename = "return", default)]
    pub return_: Option<f64>,
    #[serde(default)]
    pub risk: Option<f64>,
    #[serde(default)]
    pub sharpe_ratio: Option<f64>,
    #[serde(default)]
    pub cagr: Option<f64>,
    #[serde(default)]
    pub ulcer_index: Option<f64>,
    #[serde(default)]
    pub ulcer_performance_index: Option<f64>,
    #[serde(default)]
    pub max_drawdown: Option<f64>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

null_variant!(Performance);
