//! Request parameter types and their wire form.
//!
//! Parameter values never carry the caller identity. The client stamps it in at
//! serialization time through [`Stamped`], so the same value can be reused for
//! any number of calls.

pub mod model;
pub mod portfolio;

pub use model::{ModelMode, ModelParameters, TaskType};
pub use portfolio::{
    BacktestParameters, InSampleBacktest, LivePredictionParameters, PeriodUnit, PortfolioParameters,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Request body with the caller identity injected under `email`.
#[derive(Debug, Serialize)]
pub struct Stamped<'a, P: Serialize> {
    #[serde(flatten)]
    pub params: &'a P,
    pub email: &'a str,
}

impl<'a, P: Serialize> Stamped<'a, P> {
    pub fn new(params: &'a P, email: &'a str) -> Self {
        Self { params, email }
    }
}

/// Category an uploaded CPO input file is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Returns,
    Constraint,
    Features,
}

impl FileCategory {
    pub const ALL: [FileCategory; 3] =
        [FileCategory::Returns, FileCategory::Constraint, FileCategory::Features];

    pub fn as_str(&self) -> &'static str {
        match self {
            | FileCategory::Returns => "returns",
            | FileCategory::Constraint => "constraint",
            | FileCategory::Features => "features",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        FileCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                crate::Error::InvalidArgument(format!(
                    "unknown file type {:?}, expected returns, constraint or features",
                    s
                ))
            })
    }
}

/// `yyyy-MM-dd` dates.
pub(crate) mod wire_date {
    use chrono::NaiveDate;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&text, FORMAT).map_err(D::Error::custom)
    }
}
