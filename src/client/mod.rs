//! Public entry point: every CPO and CAI operation behind the access gate.
//!
//! Each operation authorizes first and returns the null variant of its result
//! type when the gate refuses, without touching the network. Failures further
//! down (missing local files, transport, decoding) end up in the same place, so
//! no operation returns an error.

use crate::codec::{self, yes_no};
use crate::config::ClientConfig;
use crate::gate::{AccessGate, Grant, HttpRoster, RosterSource};
use crate::jobs::{JobEngine, JobRequest, PollPolicy};
use crate::model::{
    CreateModelResponse, FileListing, JobCreationResult, JobStatus, NullVariant, Performance,
    PredictResult, ServiceInfo, TrainModelResponse, TrainingResult, TrainingStatus, UploadResult,
    WeightTable,
};
use crate::params::{
    BacktestParameters, FileCategory, InSampleBacktest, LivePredictionParameters, ModelParameters,
    Stamped,
};
use crate::transport::{call, path_segment, Endpoint, FormPart, HttpTransport, Request, Transport};
use crate::utils::error::Result;
use crate::utils::fs::load_upload;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Hyperparameter overrides sent as `hyp_dict` when creating a model.
pub type Hyperparameters = BTreeMap<String, Value>;

#[derive(Serialize)]
struct CreateModelBody<'a> {
    params: &'a ModelParameters,
    model_name: &'a str,
    username: &'a str,
    hyp_dict: &'a Hyperparameters,
}

pub struct ServiceClient {
    config: ClientConfig,
    gate: AccessGate,
    transport: Arc<dyn Transport>,
    engine: JobEngine,
}

impl ServiceClient {
    /// Builds a client over HTTP and resolves the access gate.
    ///
    /// An invalid configuration does not fail here; it leaves the gate denied.
    /// Only a failure to set up the HTTP stack itself is returned.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.cpo_url, &config.cai_url, config.request_timeout())?;
        let roster = HttpRoster::new(config.request_timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport), &roster).await)
    }

    /// Builds a client over any transport and roster source.
    pub async fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        roster: &dyn RosterSource,
    ) -> Self {
        let gate = match config.validate() {
            | Ok(()) => AccessGate::resolve(&config, roster).await,
            | Err(e) => AccessGate::denied(e.to_string()),
        };
        let engine = JobEngine::new(transport.clone(), PollPolicy::from(&config.poll));
        Self { config, gate, transport, engine }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_authorized(&self) -> bool {
        self.gate.is_granted()
    }

    /// Runs `op` with a grant, or returns `T::null` with the denial reason.
    async fn gated<'s, T, F, Fut>(&'s self, op: F) -> T
    where
        T: NullVariant,
        F: FnOnce(Grant<'s>) -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        match self.gate.authorize() {
            | Ok(grant) => op(grant).await,
            | Err(e) => T::null(e.to_string()),
        }
    }

    async fn fetch<T: DeserializeOwned + NullVariant>(&self, request: Request) -> T {
        call(self.transport.as_ref(), request).await.into_value()
    }

    async fn post_stamped<T, P>(&self, endpoint: Endpoint, path: &str, params: &P, identity: &str) -> T
    where
        T: DeserializeOwned + NullVariant,
        P: Serialize,
    {
        match codec::encode(&Stamped::new(params, identity)) {
            | Ok(body) => self.fetch(Request::post_json(endpoint, path, body)).await,
            | Err(e) => T::null(e.to_string()),
        }
    }

    // ---------- CPO: connectivity and files ----------

    /// Checks that the CPO service answers with a decodable map.
    pub async fn ping(&self) -> ServiceInfo {
        self.gated(|_| self.fetch(Request::get(Endpoint::Cpo, "/"))).await
    }

    /// Checks that the CAI service answers with a decodable map.
    pub async fn ping_cai(&self) -> ServiceInfo {
        self.gated(|_| self.fetch(Request::get(Endpoint::Cai, "/"))).await
    }

    /// Uploads a local input file under `category`.
    pub async fn upload_file(&self, path: impl AsRef<Path>, category: FileCategory) -> UploadResult {
        let path = path.as_ref();
        self.gated(|grant| async move {
            let file = match load_upload(path) {
                | Ok(file) => file,
                | Err(e) => return UploadResult::null(e.to_string()),
            };
            let parts = vec![
                FormPart::file("file", file),
                FormPart::text("email", grant.identity()),
                FormPart::text("type", category.as_str()),
            ];
            self.fetch(Request::post_form(Endpoint::Cpo, "upload-data", parts)).await
        })
        .await
    }

    /// Lists the caller's uploaded files of one category.
    pub async fn list_files(&self, category: FileCategory) -> FileListing {
        self.gated(|grant| async move {
            let path = format!("list-{}-files/{}", category.as_str(), path_segment(grant.identity()));
            let listing: FileListing = self.fetch(Request::get(Endpoint::Cpo, path)).await;
            if listing.is_null() {
                listing
            } else {
                listing.narrowed_to(category)
            }
        })
        .await
    }

    // ---------- CPO: jobs ----------

    /// Submits an in-sample backtest training on `sampling_proportion` of the sample.
    pub async fn submit_in_sample_backtest(
        &self,
        params: &BacktestParameters,
        sampling_proportion: f64,
    ) -> JobCreationResult {
        self.gated(|grant| async move {
            let request = JobRequest::InSampleBacktest(InSampleBacktest::new(params, sampling_proportion));
            self.engine.submit(&grant, request).await
        })
        .await
    }

    pub async fn submit_backtest(&self, params: &BacktestParameters) -> JobCreationResult {
        self.gated(|grant| async move {
            self.engine.submit(&grant, JobRequest::OutOfSampleBacktest(params)).await
        })
        .await
    }

    pub async fn submit_live_prediction(&self, params: &LivePredictionParameters) -> JobCreationResult {
        self.gated(|grant| async move {
            self.engine.submit(&grant, JobRequest::LivePrediction(params)).await
        })
        .await
    }

    pub async fn job_status(&self, job_id: &str) -> JobStatus {
        self.gated(|grant| async move { self.engine.fetch_status(&grant, job_id).await }).await
    }

    /// Polls a job at the configured interval until it succeeds or the attempt
    /// budget is spent; see [`JobEngine::poll_to_completion`].
    pub async fn wait_for_job(&self, job_id: &str) -> JobStatus {
        self.gated(|grant| async move { self.engine.poll_to_completion(&grant, job_id).await }).await
    }

    /// Submits a job and waits for it in one call.
    pub async fn run_to_completion(&self, request: JobRequest<'_>) -> JobStatus {
        self.gated(|grant| async move { self.engine.run_to_completion(&grant, request).await }).await
    }

    // ---------- CPO: results ----------

    pub async fn backtest_performance(&self, params: &BacktestParameters) -> Performance {
        self.gated(|grant| {
            self.post_stamped(Endpoint::Cpo, "get-backtest-performance", params, grant.identity())
        })
        .await
    }

    pub async fn backtest_weights(&self, params: &BacktestParameters) -> WeightTable {
        self.gated(|grant| self.post_stamped(Endpoint::Cpo, "get-backtest-weights", params, grant.identity()))
            .await
    }

    pub async fn live_prediction_weights(&self, params: &LivePredictionParameters) -> WeightTable {
        self.gated(|grant| {
            self.post_stamped(Endpoint::Cpo, "get-live-prediction-weights", params, grant.identity())
        })
        .await
    }

    // ---------- CAI: models ----------

    pub async fn create_model(
        &self,
        model_name: &str,
        params: &ModelParameters,
        hyperparameters: &Hyperparameters,
    ) -> CreateModelResponse {
        self.gated(|grant| async move {
            let body = CreateModelBody {
                params,
                model_name,
                username: grant.identity(),
                hyp_dict: hyperparameters,
            };
            match codec::encode(&body) {
                | Ok(body) => self.fetch(Request::post_json(Endpoint::Cai, "/models", body)).await,
                | Err(e) => CreateModelResponse::null(e.to_string()),
            }
        })
        .await
    }

    /// Starts training `model_name` on a local data file.
    ///
    /// The training id is generated here and returned in the response, falling
    /// back to the generated one when the service does not echo it.
    pub async fn train_model(
        &self,
        model_name: &str,
        label: &str,
        data_file: impl AsRef<Path>,
    ) -> TrainModelResponse {
        let data_file = data_file.as_ref();
        self.gated(|grant| async move {
            let file = match load_upload(data_file) {
                | Ok(file) => file,
                | Err(e) => return TrainModelResponse::null(e.to_string()),
            };
            let train_id = Uuid::new_v4().to_string();
            let parts = vec![
                FormPart::text("username", grant.identity()),
                FormPart::text("email", grant.identity()),
                FormPart::text("model_name", model_name),
                FormPart::text("train_id", train_id.as_str()),
                FormPart::text("label", label),
                FormPart::file("file", file),
            ];
            let mut response: TrainModelResponse =
                self.fetch(Request::post_form(Endpoint::Cai, "/trainings", parts)).await;
            if !response.is_null() && response.train_id.is_none() {
                response.train_id = Some(train_id);
            }
            response
        })
        .await
    }

    pub async fn training_status(&self, train_id: &str) -> TrainingStatus {
        self.gated(|grant| async move {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("username", grant.identity())
                .append_pair("train_id", train_id)
                .finish();
            self.fetch(Request::get(Endpoint::Cai, format!("/get_status?{}", query))).await
        })
        .await
    }

    pub async fn training_result(&self, model_name: &str) -> TrainingResult {
        self.gated(|grant| async move {
            let parts = vec![
                FormPart::text("username", grant.identity()),
                FormPart::text("model_name", model_name),
            ];
            self.fetch(Request::post_form(Endpoint::Cai, "/get_result", parts)).await
        })
        .await
    }

    /// Runs a trained model over a local data file.
    pub async fn predict(
        &self,
        model_name: &str,
        data_file: impl AsRef<Path>,
        eda: bool,
        prob_calib: bool,
    ) -> PredictResult {
        let data_file = data_file.as_ref();
        self.gated(|grant| async move {
            let file = match load_upload(data_file) {
                | Ok(file) => file,
                | Err(e) => return PredictResult::null(e.to_string()),
            };
            let parts = vec![
                FormPart::text("username", grant.identity()),
                FormPart::text("model_name", model_name),
                FormPart::text("eda", yes_no::token(eda)),
                FormPart::text("prob_calib", yes_no::token(prob_calib)),
                FormPart::file("file", file),
            ];
            self.fetch(Request::post_form(Endpoint::Cai, "/predictions", parts)).await
        })
        .await
    }
}
