//! `cpo` command line front end for the CPO and CAI services.

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use cpoclient::utils::init_from_config;
use cpoclient::{
    BacktestParameters, ClientConfig, FileCategory, Hyperparameters, InSampleBacktest, JobRequest,
    LivePredictionParameters, ModelParameters, NullVariant, ServiceClient,
};
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "cpo", author, version, about = "CPO / CAI service client", long_about = None)]
struct Args {
    /// Path to the configuration file (TOML); defaults to ./cpo.toml, then the user config dir
    #[arg(short, long, env = "CPO_CONFIG")]
    config: Option<PathBuf>,

    /// Log level when CPO_LOG is not set
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a default configuration file
    Init {
        #[arg(short, long, default_value = "cpo.toml")]
        output: PathBuf,
        /// Overwrite if the file already exists
        #[arg(short, long)]
        force: bool,
    },
    /// Check that both services answer
    Ping,
    /// Upload an input file
    Upload {
        file: PathBuf,
        /// returns, constraint or features
        #[arg(short = 't', long = "type")]
        category: FileCategory,
    },
    /// List uploaded files, optionally of one category
    List {
        #[arg(short = 't', long = "type")]
        category: Option<FileCategory>,
    },
    /// Submit a backtest described by a JSON parameter file
    Backtest {
        #[arg(short, long)]
        params: PathBuf,
        /// Run the in-sample variant
        #[arg(long, conflicts_with = "oos")]
        in_sample: bool,
        /// Share of the sample an in-sample run trains on
        #[arg(long, requires = "in_sample")]
        sampling_proportion: Option<f64>,
        /// Run the out-of-sample variant (default)
        #[arg(long)]
        oos: bool,
        /// Poll until the job finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Submit a live prediction described by a JSON parameter file
    Live {
        #[arg(short, long)]
        params: PathBuf,
        #[arg(short, long)]
        wait: bool,
    },
    /// Show the status of a job
    Status { job_id: String },
    /// Poll a job until it succeeds or the attempt budget runs out
    Wait { job_id: String },
    /// Fetch backtest performance metrics
    Performance {
        #[arg(short, long)]
        params: PathBuf,
    },
    /// Fetch portfolio weights of a backtest, or of a live prediction with --live
    Weights {
        #[arg(short, long)]
        params: PathBuf,
        #[arg(long)]
        live: bool,
    },
    /// Create a CAI model
    CreateModel {
        name: String,
        /// JSON model parameters; defaults are used when omitted
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// JSON object of hyperparameter overrides
        #[arg(long)]
        hyperparameters: Option<PathBuf>,
    },
    /// Train a model on a local data file
    Train {
        name: String,
        #[arg(short, long)]
        label: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Show training progress
    TrainingStatus { train_id: String },
    /// Fetch training artifacts, or the progress if training is still running
    TrainingResult { name: String },
    /// Run a trained model over a local data file
    Predict {
        name: String,
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        eda: bool,
        #[arg(long)]
        prob_calib: bool,
    },
    /// Print shell completions
    Completions { shell: Shell },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match &args.command {
        | Command::Init { output, force } => return init(output, *force),
        | Command::Completions { shell } => {
            clap_complete::generate(*shell, &mut Args::command(), "cpo", &mut std::io::stdout());
            return Ok(());
        }
        | _ => {}
    }

    let mut config = match &args.config {
        | Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        | None => ClientConfig::load().context("Failed to load configuration")?,
    };
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    init_from_config(&config);

    let client = ServiceClient::connect(config).await.context("Failed to set up HTTP client")?;
    if !client.is_authorized() {
        log::warn!("caller is not authorized; every request will be refused");
    }

    match args.command {
        | Command::Init { .. } | Command::Completions { .. } => Ok(()),
        | Command::Ping => {
            report(&client.ping().await)?;
            report(&client.ping_cai().await)
        }
        | Command::Upload { file, category } => report(&client.upload_file(&file, category).await),
        | Command::List { category } => {
            for category in category.map_or(FileCategory::ALL.to_vec(), |c| vec![c]) {
                let listing = client.list_files(category).await;
                if listing.is_null() {
                    return report(&listing);
                }
                println!("{}:", category);
                for file in listing.files(category) {
                    println!("  {}", file);
                }
            }
            Ok(())
        }
        | Command::Backtest { params, in_sample, sampling_proportion, oos: _, wait } => {
            let params: BacktestParameters = read_json(&params)?;
            let request = match (in_sample, sampling_proportion) {
                | (true, Some(proportion)) => {
                    JobRequest::InSampleBacktest(InSampleBacktest::new(&params, proportion))
                }
                | (true, None) => bail!("--in-sample needs --sampling-proportion"),
                | (false, _) => JobRequest::OutOfSampleBacktest(&params),
            };
            submit(&client, request, wait).await
        }
        | Command::Live { params, wait } => {
            let params: LivePredictionParameters = read_json(&params)?;
            submit(&client, JobRequest::LivePrediction(&params), wait).await
        }
        | Command::Status { job_id } => report(&client.job_status(&job_id).await),
        | Command::Wait { job_id } => {
            let status = client.wait_for_job(&job_id).await;
            report(&status)?;
            if !status.is_success() {
                bail!("job {} has not finished yet", job_id);
            }
            Ok(())
        }
        | Command::Performance { params } => {
            let params: BacktestParameters = read_json(&params)?;
            report(&client.backtest_performance(&params).await)
        }
        | Command::Weights { params, live } => {
            if live {
                let params: LivePredictionParameters = read_json(&params)?;
                report(&client.live_prediction_weights(&params).await)
            } else {
                let params: BacktestParameters = read_json(&params)?;
                report(&client.backtest_weights(&params).await)
            }
        }
        | Command::CreateModel { name, params, hyperparameters } => {
            let params: ModelParameters = match params {
                | Some(path) => read_json(&path)?,
                | None => ModelParameters::default(),
            };
            let hyperparameters: Hyperparameters = match hyperparameters {
                | Some(path) => read_json(&path)?,
                | None => Hyperparameters::new(),
            };
            report(&client.create_model(&name, &params, &hyperparameters).await)
        }
        | Command::Train { name, label, file } => report(&client.train_model(&name, &label, &file).await),
        | Command::TrainingStatus { train_id } => report(&client.training_status(&train_id).await),
        | Command::TrainingResult { name } => report(&client.training_result(&name).await),
        | Command::Predict { name, file, eda, prob_calib } => {
            report(&client.predict(&name, &file, eda, prob_calib).await)
        }
    }
}

fn init(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("Config file {} exists. Use --force to overwrite.", output.display());
    }
    ClientConfig::default().save(output)?;
    println!("Wrote default configuration to {}", output.display());
    Ok(())
}

async fn submit(client: &ServiceClient, request: JobRequest<'_>, wait: bool) -> Result<()> {
    if wait {
        let status = client.run_to_completion(request).await;
        report(&status)?;
        if !status.is_success() {
            bail!("job has not finished yet; check again with `cpo status`");
        }
        return Ok(());
    }
    let created = match request {
        | JobRequest::InSampleBacktest(body) => {
            client.submit_in_sample_backtest(body.backtest, body.sampling_proportion).await
        }
        | JobRequest::OutOfSampleBacktest(params) => client.submit_backtest(params).await,
        | JobRequest::LivePrediction(params) => client.submit_live_prediction(params).await,
    };
    report(&created)
}

/// Prints a result; a null variant becomes the process error.
fn report<T: NullVariant + Display>(value: &T) -> Result<()> {
    if let Some(message) = value.diagnostic() {
        bail!("{}", message);
    }
    println!("{}", value);
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
