//! # CPO Client
//! Async client for the CPO portfolio-optimization service and the CAI model
//! training/inference service.
//!
//! Every operation goes through [`ServiceClient`], which checks the caller's
//! access once at construction and then returns typed results. Failures never
//! surface as errors from an operation: the result's null variant carries the
//! diagnostic instead (see [`NullVariant`]).

pub use crate::utils::error::{Error, Result};

pub mod client;
pub mod codec;
pub mod config;
pub mod gate;
pub mod jobs;
pub mod model;
pub mod params;
pub mod transport;
pub mod utils;

pub use client::{Hyperparameters, ServiceClient};
pub use config::{ClientConfig, PollConfig};
pub use gate::{AccessGate, Grant, HttpRoster, RosterSource};
pub use jobs::{JobEngine, JobRequest, PollPolicy};
pub use model::{
    CreateModelResponse, FileListing, JobCreationResult, JobStatus, NullVariant, Performance,
    PredictResult, ServiceInfo, TrainModelResponse, TrainingArtifacts, TrainingResult,
    TrainingStatus, UploadResult, WeightTable,
};
pub use params::{
    BacktestParameters, FileCategory, InSampleBacktest, LivePredictionParameters, ModelMode,
    ModelParameters, PeriodUnit, PortfolioParameters, TaskType,
};
pub use transport::{HttpTransport, Outcome, Transport};
