//! Job creation and job status results from the CPO service.

use super::{null_variant, Performance};
use crate::codec::lenient;
use serde::{Deserialize, Serialize};

/// Status value the CPO service reports for a finished job.
pub const SUCCESS_STATUS: &str = "SUCCESS";

/// Result of submitting a backtest or live-prediction job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobCreationResult {
    /// Opaque job id used for polling
    #[serde(rename = "task_id", default)]
    pub job_id: Option<String>,
    /// Confirmation text for the submitted operation
    #[serde(default)]
    pub message: Option<String>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

impl JobCreationResult {
    /// The job id when the submission produced a usable one.
    pub fn id(&self) -> Option<&str> {
        self.job_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Partial-completion snapshot of a running job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub step: Option<u64>,
    #[serde(rename = "message", default)]
    pub text: Option<String>,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

/// One observation of a job's state, as returned by `get-cpo-job-status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "cpo_job_id", default)]
    pub job_id: Option<String>,
    /// Free-form status text; only [`SUCCESS_STATUS`] has a defined meaning
    #[serde(rename = "cpo_job_status", default)]
    pub status: Option<String>,
    #[serde(rename = "cpo_result", default, deserialize_with = "lenient")]
    pub performance: Performance,
    #[serde(default, deserialize_with = "lenient")]
    pub progress: Progress,
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

impl JobStatus {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(SUCCESS_STATUS)
    }
}

null_variant!(JobCreationResult, Progress, JobStatus);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::model::NullVariant;

    #[test]
    fn test_decode_job_creation() {
        let created: JobCreationResult =
            decode(r#"{"task_id": "7f3c", "message": "queued"}"#).unwrap();
        assert_eq!(created.id(), Some("7f3c"));
        assert_eq!(created.message.as_deref(), Some("queued"));
        assert!(!created.is_null());
    }

    #[test]
    fn test_blank_job_id_is_not_usable() {
        let created: JobCreationResult = decode(r#"{"task_id": "  "}"#).unwrap();
        assert_eq!(created.id(), None);
    }

    #[test]
    fn test_success_is_exact() {
        let mut status = JobStatus { status: Some("SUCCESS".into()), ..Default::default() };
        assert!(status.is_success());
        status.status = Some("PENDING".into());
        assert!(!status.is_success());
        status.status = Some("success".into());
        assert!(!status.is_success());
    }

    #[test]
    fn test_full_status_decodes_performance() {
        let body = r#"{
            "cpo_job_id": "42",
            "cpo_job_status": "SUCCESS",
            "cpo_result": {"return": 0.12, "risk": 0.08, "sharpe_ratio": 1.5, "cagr": 0.11,
                           "ulcer_index": 0.03, "ulcer_performance_index": 4.0, "max_drawdown": -0.2},
            "progress": {"step": 10, "message": "done"}
        }"#;
        let status: JobStatus = decode(body).unwrap();
        assert!(status.is_success());
        assert_eq!(status.performance.sharpe_ratio, Some(1.5));
        assert_eq!(status.performance.max_drawdown, Some(-0.2));
        assert!(!status.performance.is_null());
    }
}
