//! Result model returned by every client operation.
//!
//! Each type has a null variant built by [`NullVariant::null`]: no data, only a
//! diagnostic message. Callers always get a well-typed value back and inspect
//! [`NullVariant::is_null`] instead of handling errors at each call site.

pub mod job;
pub mod performance;
pub mod prediction;
pub mod service;
pub mod training;

pub use job::{JobCreationResult, JobStatus, Progress, SUCCESS_STATUS};
pub use performance::Performance;
pub use prediction::PredictResult;
pub use service::{FileListing, ServiceInfo, UploadResult, WeightTable};
pub use training::{
    CreateModelResponse, TrainModelResponse, TrainingArtifacts, TrainingResult, TrainingStatus,
};

use serde::Serialize;
use std::fmt;

/// Total constructor for the "empty/error" form of a result type.
pub trait NullVariant: Sized {
    /// Builds the null variant; never fails.
    fn null(message: impl Into<String>) -> Self;

    /// Diagnostic message, present only on null variants.
    fn diagnostic(&self) -> Option<&str>;

    fn is_null(&self) -> bool {
        self.diagnostic().is_some()
    }
}

/// Shared rendering: the diagnostic when there is one, otherwise the JSON form.
pub(crate) fn render<T: Serialize>(
    f: &mut fmt::Formatter<'_>,
    diagnostic: Option<&str>,
    value: &T,
) -> fmt::Result {
    if let Some(message) = diagnostic {
        return f.write_str(message);
    }
    match serde_json::to_string(value) {
        | Ok(json) => f.write_str(&json),
        | Err(_) => f.write_str("{}"),
    }
}

/// Implements `NullVariant` and `Display` for result structs whose data fields
/// all implement `Default` and which carry a `diagnostic: Option<String>`.
macro_rules! null_variant {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::model::NullVariant for $ty {
                fn null(message: impl Into<String>) -> Self {
                    Self { diagnostic: Some(message.into()), ..Default::default() }
                }

                fn diagnostic(&self) -> Option<&str> {
                    self.diagnostic.as_deref()
                }
            }

            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    $crate::model::render(f, self.diagnostic.as_deref(), self)
                }
            }
        )+
    };
}
pub(crate) use null_variant;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_null_variant_is_empty() {
        let created = JobCreationResult::null("boom");
        assert!(created.job_id.is_none());
        assert!(created.message.is_none());

        let status = JobStatus::null("boom");
        assert!(!status.is_success());
        assert!(status.status.is_none());

        let perf = Performance::null("boom");
        assert!(perf.return_.is_none() && perf.risk.is_none() && perf.max_drawdown.is_none());

        let progress = Progress::null("boom");
        assert!(progress.step.is_none() && progress.text.is_none());

        let training = TrainingStatus::null("boom");
        assert!(!training.is_completed());
        assert!(training.state.is_none());

        let result = TrainingResult::null("boom");
        assert!(!result.is_completed());
        assert!(result.artifacts().is_none());

        let predict = PredictResult::null("boom");
        assert!(predict.output_file.is_none());

        let created = CreateModelResponse::null("boom");
        assert_ne!(created.success, Some(true));

        let trained = TrainModelResponse::null("boom");
        assert_ne!(trained.success, Some(true));

        for rendered in [perf.to_string(), status.to_string(), result.to_string()] {
            assert_eq!(rendered, "boom");
        }
    }

    #[test]
    fn test_render_falls_back_to_json() {
        let perf = Performance { sharpe_ratio: Some(1.5), ..Default::default() };
        let text = perf.to_string();
        assert!(text.contains("\"sharpe_ratio\":1.5"));
    }
}
