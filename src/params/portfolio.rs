//! Portfolio optimization parameters for backtests and live predictions.

use super::wire_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rebalancing period unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Shared description of a portfolio optimization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioParameters {
    pub project_name: String,
    /// Uploaded `returns` file
    pub returns_file: String,
    /// Uploaded `constraint` file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_file: Option<String>,
    /// Uploaded `features` file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_file: Option<String>,
    /// Risk tolerance: the largest share of the portfolio allowed in cash
    pub max_cash: f64,
    pub rebalance_period_unit: PeriodUnit,
    /// Rebalance every `rebalance_period_multiple` units
    pub rebalance_period_multiple: u32,
    /// Which day of the period rebalancing happens on, e.g. `first` or `last`
    pub rebalance_day: String,
    /// Number of periods in the training window
    pub training_window: u32,
    /// Evaluation metric the optimizer targets
    pub metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_price_features: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_volume_features: Option<bool>,
}

impl PortfolioParameters {
    /// Monthly rebalancing on the last day, 12-period window, Sharpe ratio target.
    pub fn new(project_name: impl Into<String>, returns_file: impl Into<String>, max_cash: f64) -> Self {
        Self {
            project_name: project_name.into(),
            returns_file: returns_file.into(),
            constraint_file: None,
            feature_file: None,
            max_cash,
            rebalance_period_unit: PeriodUnit::Month,
            rebalance_period_multiple: 1,
            rebalance_day: "last".to_string(),
            training_window: 12,
            metric: "sharpe_ratio".to_string(),
            exclude_price_features: None,
            exclude_volume_features: None,
        }
    }

    pub fn with_constraint_file(mut self, file: impl Into<String>) -> Self {
        self.constraint_file = Some(file.into());
        self
    }

    pub fn with_feature_file(mut self, file: impl Into<String>) -> Self {
        self.feature_file = Some(file.into());
        self
    }

    pub fn with_rebalancing(mut self, unit: PeriodUnit, multiple: u32, day: impl Into<String>) -> Self {
        self.rebalance_period_unit = unit;
        self.rebalance_period_multiple = multiple;
        self.rebalance_day = day.into();
        self
    }
}

/// Parameters of an in-sample or out-of-sample backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestParameters {
    #[serde(flatten)]
    pub portfolio: PortfolioParameters,
    #[serde(with = "wire_date")]
    pub start_date: NaiveDate,
    #[serde(with = "wire_date")]
    pub end_date: NaiveDate,
}

impl BacktestParameters {
    pub fn new(portfolio: PortfolioParameters, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self { portfolio, start_date, end_date }
    }
}

/// Body of an in-sample backtest: the backtest plus the share of the sample to
/// train on. Only in-sample runs carry `sampling_proportion`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InSampleBacktest<'a> {
    #[serde(flatten)]
    pub backtest: &'a BacktestParameters,
    pub sampling_proportion: f64,
}

impl<'a> InSampleBacktest<'a> {
    pub fn new(backtest: &'a BacktestParameters, sampling_proportion: f64) -> Self {
        Self { backtest, sampling_proportion }
    }
}

/// Parameters of a live prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePredictionParameters {
    #[serde(flatten)]
    pub portfolio: PortfolioParameters,
    #[serde(with = "wire_date")]
    pub rebalance_date: NaiveDate,
    /// Trading days of history to feed the prediction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_days: Option<u32>,
}

impl LivePredictionParameters {
    pub fn new(portfolio: PortfolioParameters, rebalance_date: NaiveDate) -> Self {
        Self { portfolio, rebalance_date, market_days: None }
    }
}
