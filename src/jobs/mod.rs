//! Job submission and polling against the CPO service.
//!
//! A submitted job is tracked client-side as
//! `SUBMITTED -> (poll)* -> SUCCESS | exhausted`. Only the `SUCCESS` status ends
//! polling early; anything else, including statuses that may mean the job failed
//! remotely, is treated as still pending until the attempt budget runs out.

use crate::codec;
use crate::config::PollConfig;
use crate::gate::Grant;
use crate::model::{JobCreationResult, JobStatus, NullVariant};
use crate::params::{BacktestParameters, InSampleBacktest, LivePredictionParameters, Stamped};
use crate::transport::{call, path_segment, Endpoint, Outcome, Request, Transport};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;

pub const IN_SAMPLE_CONFIRMATION: &str = "job submitted for cpo in-sample backtesting.";
pub const OUT_OF_SAMPLE_CONFIRMATION: &str = "job submitted for cpo back-testing.";
pub const LIVE_PREDICTION_CONFIRMATION: &str = "job submitted for cpo live prediction.";

/// How long and how often to wait for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollConfig::default())
    }
}

impl From<&PollConfig> for PollPolicy {
    fn from(config: &PollConfig) -> Self {
        Self { interval: Duration::from_secs(config.interval_secs), max_attempts: config.max_attempts }
    }
}

/// A job the CPO service runs asynchronously.
#[derive(Debug, Clone, Copy)]
pub enum JobRequest<'a> {
    InSampleBacktest(InSampleBacktest<'a>),
    OutOfSampleBacktest(&'a BacktestParameters),
    LivePrediction(&'a LivePredictionParameters),
}

impl JobRequest<'_> {
    pub fn path(&self) -> &'static str {
        match self {
            | JobRequest::InSampleBacktest(_) => "run-insample-backtest",
            | JobRequest::OutOfSampleBacktest(_) => "run-oos-backtest",
            | JobRequest::LivePrediction(_) => "run-live-prediction",
        }
    }

    /// Message reported back to the caller once the service accepted the job.
    pub fn confirmation(&self) -> &'static str {
        match self {
            | JobRequest::InSampleBacktest(_) => IN_SAMPLE_CONFIRMATION,
            | JobRequest::OutOfSampleBacktest(_) => OUT_OF_SAMPLE_CONFIRMATION,
            | JobRequest::LivePrediction(_) => LIVE_PREDICTION_CONFIRMATION,
        }
    }

    fn encode(&self, identity: &str) -> Result<String> {
        match self {
            | JobRequest::InSampleBacktest(body) => codec::encode(&Stamped::new(body, identity)),
            | JobRequest::OutOfSampleBacktest(params) => codec::encode(&Stamped::new(*params, identity)),
            | JobRequest::LivePrediction(params) => codec::encode(&Stamped::new(*params, identity)),
        }
    }
}

pub fn status_path(job_id: &str) -> String {
    format!("get-cpo-job-status/{}", path_segment(job_id.trim()))
}

pub struct JobEngine {
    transport: Arc<dyn Transport>,
    policy: PollPolicy,
}

impl JobEngine {
    pub fn new(transport: Arc<dyn Transport>, policy: PollPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Submits a job. The result holds a non-empty id and the operation's
    /// confirmation message, or is the null variant with the failure reason.
    pub async fn submit(&self, grant: &Grant<'_>, request: JobRequest<'_>) -> JobCreationResult {
        let body = match request.encode(grant.identity()) {
            | Ok(body) => body,
            | Err(e) => return JobCreationResult::null(e.to_string()),
        };
        let outcome: Outcome<JobCreationResult> =
            call(self.transport.as_ref(), Request::post_json(Endpoint::Cpo, request.path(), body)).await;
        if !outcome.success {
            return outcome.value;
        }

        let mut created = outcome.value;
        if created.id().is_none() {
            return JobCreationResult::null(format!("{} returned no job id: {}", request.path(), created));
        }
        created.message = Some(request.confirmation().to_string());
        log::info!("{} accepted job {}", request.path(), created.id().unwrap_or_default());
        created
    }

    /// One status observation.
    pub async fn fetch_status(&self, grant: &Grant<'_>, job_id: &str) -> JobStatus {
        if job_id.trim().is_empty() {
            return JobStatus::null("job id is blank");
        }
        log::debug!("fetching status of job {} for {}", job_id, grant.identity());
        call(self.transport.as_ref(), Request::get(Endpoint::Cpo, status_path(job_id)))
            .await
            .into_value()
    }

    /// Polls until the job reports success or the attempt budget is spent.
    ///
    /// Returns the last observed status either way; a status that is not
    /// `SUCCESS` means the caller may poll again later.
    pub async fn poll_to_completion(&self, grant: &Grant<'_>, job_id: &str) -> JobStatus {
        if job_id.trim().is_empty() {
            return JobStatus::null("job id is blank");
        }
        let max_attempts = self.policy.max_attempts;
        let mut last = JobStatus::null(format!("job {} was not polled", job_id));
        for attempt in 1..=max_attempts {
            last = self.fetch_status(grant, job_id).await;
            if last.is_success() {
                log::info!("job {} succeeded after {} attempt(s)", job_id, attempt);
                return last;
            }
            log::info!(
                "job {} status {} (attempt {}/{})",
                job_id,
                last.status.as_deref().unwrap_or("unknown"),
                attempt,
                max_attempts
            );
            if attempt < max_attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }
        log::warn!("job {} still not finished after {} attempt(s)", job_id, max_attempts);
        last
    }

    /// Submits a job and waits for it.
    pub async fn run_to_completion(&self, grant: &Grant<'_>, request: JobRequest<'_>) -> JobStatus {
        let created = self.submit(grant, request).await;
        match created.id() {
            | Some(job_id) => self.poll_to_completion(grant, job_id).await,
            | None => JobStatus::null(created.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::AccessGate;
    use crate::params::PortfolioParameters;
    use crate::transport::{MockTransport, RawReply, RequestBody};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn backtest() -> BacktestParameters {
        BacktestParameters::new(
            PortfolioParameters::new("alpha", "returns.csv", 0.1),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
        )
    }

    fn fast() -> PollPolicy {
        PollPolicy { interval: Duration::from_millis(1), max_attempts: 5 }
    }

    fn status_body(status: &str) -> String {
        format!(r#"{{"cpo_job_id": "j1", "cpo_job_status": "{}", "cpo_result": "None", "progress": "None"}}"#, status)
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(PollPolicy::default(), PollPolicy { interval: Duration::from_secs(60), max_attempts: 5 });
    }

    #[tokio::test]
    async fn test_submit_confirmation_messages() {
        let params = backtest();
        let live = LivePredictionParameters::new(
            PortfolioParameters::new("alpha", "returns.csv", 0.1),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let cases = [
            (
                JobRequest::InSampleBacktest(InSampleBacktest::new(&params, 0.7)),
                "run-insample-backtest",
                IN_SAMPLE_CONFIRMATION,
            ),
            (JobRequest::OutOfSampleBacktest(&params), "run-oos-backtest", OUT_OF_SAMPLE_CONFIRMATION),
            (JobRequest::LivePrediction(&live), "run-live-prediction", LIVE_PREDICTION_CONFIRMATION),
        ];

        for (request, path, confirmation) in cases {
            let mut transport = MockTransport::new();
            transport
                .expect_execute()
                .withf(move |req| {
                    req.endpoint == Endpoint::Cpo
                        && req.path == path
                        && matches!(&req.body, RequestBody::Json(body) if body.contains("\"email\":\"quant@example.com\""))
                })
                .times(1)
                .returning(|_| Ok(RawReply::new(200, r#"{"task_id": "job-123", "message": "ok"}"#)));

            let gate = AccessGate::open("quant@example.com");
            let engine = JobEngine::new(Arc::new(transport), fast());
            let created = engine.submit(&gate.authorize().unwrap(), request).await;
            assert_eq!(created.id(), Some("job-123"));
            assert_eq!(created.message.as_deref(), Some(confirmation));
            assert!(!created.is_null());
        }
    }

    #[tokio::test]
    async fn test_only_in_sample_body_carries_sampling_proportion() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| {
                req.path == "run-insample-backtest"
                    && matches!(&req.body, RequestBody::Json(body) if body.contains("\"sampling_proportion\":0.7"))
            })
            .times(1)
            .returning(|_| Ok(RawReply::new(200, r#"{"task_id": "j1"}"#)));
        transport
            .expect_execute()
            .withf(|req| {
                req.path == "run-oos-backtest"
                    && matches!(&req.body, RequestBody::Json(body) if !body.contains("sampling_proportion"))
            })
            .times(1)
            .returning(|_| Ok(RawReply::new(200, r#"{"task_id": "j2"}"#)));

        let gate = AccessGate::open("quant@example.com");
        let grant = gate.authorize().unwrap();
        let engine = JobEngine::new(Arc::new(transport), fast());
        let params = backtest();

        let in_sample = engine.submit(&grant, JobRequest::InSampleBacktest(InSampleBacktest::new(&params, 0.7))).await;
        assert_eq!(in_sample.id(), Some("j1"));
        let oos = engine.submit(&grant, JobRequest::OutOfSampleBacktest(&params)).await;
        assert_eq!(oos.id(), Some("j2"));
    }

    #[tokio::test]
    async fn test_failed_submission_is_null() {
        let mut transport = MockTransport::new();
        transport.expect_execute().returning(|_| Ok(RawReply::new(503, "maintenance")));
        let gate = AccessGate::open("quant@example.com");
        let engine = JobEngine::new(Arc::new(transport), fast());
        let params = backtest();
        let created = engine.submit(&gate.authorize().unwrap(), JobRequest::OutOfSampleBacktest(&params)).await;
        assert!(created.id().is_none());
        assert!(created.diagnostic().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_missing_job_id_is_null() {
        let mut transport = MockTransport::new();
        transport.expect_execute().returning(|_| Ok(RawReply::new(200, "None")));
        let gate = AccessGate::open("quant@example.com");
        let engine = JobEngine::new(Arc::new(transport), fast());
        let params = backtest();
        let request = JobRequest::InSampleBacktest(InSampleBacktest::new(&params, 0.7));
        let created = engine.submit(&gate.authorize().unwrap(), request).await;
        assert!(created.is_null());
        assert!(created.message.is_none());
    }

    #[tokio::test]
    async fn test_poll_stops_at_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.path == "get-cpo-job-status/j1")
            .returning(move |_| {
                let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
                let status = if n >= 3 { "SUCCESS" } else { "PENDING" };
                Ok(RawReply::new(200, status_body(status)))
            });

        let gate = AccessGate::open("quant@example.com");
        let engine = JobEngine::new(Arc::new(transport), fast());
        let status = engine.poll_to_completion(&gate.authorize().unwrap(), "j1").await;
        assert!(status.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_gives_up_after_budget() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(5)
            .returning(|_| Ok(RawReply::new(200, status_body("RUNNING"))));

        let gate = AccessGate::open("quant@example.com");
        let engine = JobEngine::new(Arc::new(transport), fast());
        let status = engine.poll_to_completion(&gate.authorize().unwrap(), "j1").await;
        assert!(!status.is_success());
        assert_eq!(status.status.as_deref(), Some("RUNNING"));
        assert!(!status.is_null());
    }

    #[tokio::test]
    async fn test_poll_survives_transport_failures() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(2)
            .returning(|_| Err(crate::Error::Transport("connection reset".into())));

        let gate = AccessGate::open("quant@example.com");
        let engine = JobEngine::new(
            Arc::new(transport),
            PollPolicy { interval: Duration::from_millis(1), max_attempts: 2 },
        );
        let status = engine.poll_to_completion(&gate.authorize().unwrap(), "j1").await;
        assert!(status.is_null());
        assert!(status.diagnostic().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_blank_job_id_never_hits_the_network() {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let gate = AccessGate::open("quant@example.com");
        let engine = JobEngine::new(Arc::new(transport), fast());
        let status = engine.fetch_status(&gate.authorize().unwrap(), "  ").await;
        assert_eq!(status.diagnostic(), Some("job id is blank"));
    }

    #[tokio::test]
    async fn test_blank_job_id_returns_before_polling() {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let gate = AccessGate::open("quant@example.com");
        let slow = PollPolicy { interval: Duration::from_secs(3600), max_attempts: 5 };
        let engine = JobEngine::new(Arc::new(transport), slow);
        let status = tokio::time::timeout(
            Duration::from_secs(1),
            engine.poll_to_completion(&gate.authorize().unwrap(), ""),
        )
        .await
        .expect("blank id must not wait between attempts");
        assert_eq!(status.diagnostic(), Some("job id is blank"));
    }

    #[tokio::test]
    async fn test_job_id_is_one_path_segment() {
        assert_eq!(status_path(" a/b#c "), "get-cpo-job-status/a%2Fb%23c");

        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.path == "get-cpo-job-status/job%3F1")
            .times(1)
            .returning(|_| Ok(RawReply::new(200, status_body("PENDING"))));
        let gate = AccessGate::open("quant@example.com");
        let engine = JobEngine::new(Arc::new(transport), fast());
        let status = engine.fetch_status(&gate.authorize().unwrap(), "job?1").await;
        assert_eq!(status.status.as_deref(), Some("PENDING"));
    }

    #[tokio::test]
    async fn test_run_to_completion() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.path == "run-oos-backtest")
            .times(1)
            .returning(|_| Ok(RawReply::new(200, r#"{"task_id": "j1"}"#)));
        transport
            .expect_execute()
            .withf(|req| req.path == "get-cpo-job-status/j1")
            .times(1)
            .returning(|_| Ok(RawReply::new(200, status_body("SUCCESS"))));

        let gate = AccessGate::open("quant@example.com");
        let engine = JobEngine::new(Arc::new(transport), fast());
        let params = backtest();
        let status =
            engine.run_to_completion(&gate.authorize().unwrap(), JobRequest::OutOfSampleBacktest(&params)).await;
        assert!(status.is_success());
        assert_eq!(status.job_id.as_deref(), Some("j1"));
    }
}
