//! Connectivity, file management and portfolio weight results.

use super::null_variant;
use crate::params::FileCategory;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Whatever the service root answers with; only decodability matters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceInfo {
    pub entries: BTreeMap<String, Value>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

/// Answer to `upload-data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

/// Uploaded file names keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileListing {
    pub entries: BTreeMap<String, Vec<String>>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

impl FileListing {
    /// Keeps only the entry for `category`, under its wire name.
    ///
    /// The service may key the list as `returns` or `returns_files`; anything
    /// filed under another category is dropped.
    pub fn narrowed_to(mut self, category: FileCategory) -> Self {
        let name = category.as_str();
        let suffixed = format!("{}_files", name);
        let mut files = self.entries.remove(name).unwrap_or_default();
        files.extend(self.entries.remove(&suffixed).unwrap_or_default());
        self.entries = BTreeMap::from([(name.to_string(), files)]);
        self
    }

    pub fn files(&self, category: FileCategory) -> &[String] {
        self.entries.get(category.as_str()).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Portfolio weights, `{date: {symbol: weight}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    pub weights: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

impl WeightTable {
    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn weight(&self, date: &str, symbol: &str) -> Option<f64> {
        self.weights.get(date).and_then(|row| row.get(symbol)).copied()
    }
}

null_variant!(ServiceInfo, UploadResult, FileListing, WeightTable);
