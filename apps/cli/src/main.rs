//! IPM training CLI
//!
//! Provides the `ipm-train` command, which stages training data onto HDFS and
//! runs Iterative Parameter Mixtures training as a sequence of Hadoop
//! streaming jobs.

mod config;
mod report;

use clap::Parser;
use ipm_training::{IpmDriver, RunConfig, ShellRunner, TracingProgressSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

/// Iterative Parameter Mixtures training on Hadoop
///
/// Every iteration trains one model per data shard in parallel, merges the
/// shards into a single model, and scores it against the development data.
/// Options not given on the command line are read from `--config` or
/// `./ipm-train.toml`.
#[derive(Parser, Debug)]
#[command(
    name = "ipm-train",
    author,
    version,
    about = "Iterative Parameter Mixtures training with Hadoop streaming"
)]
struct Args {
    /// Location of the hadoop installation
    #[arg(short = 'H', long = "hadooproot")]
    hadoop_root: Option<PathBuf>,

    /// Location of the Reranker Framework bin directory
    #[arg(long = "refrbin")]
    refr_bin: Option<PathBuf>,

    /// Development data file
    #[arg(short = 'd', long = "develdata")]
    devel_data: Option<PathBuf>,

    /// Input data, as whitespace-separated glob patterns (repeatable)
    #[arg(short = 'i', long = "input")]
    inputs: Vec<String>,

    /// HDFS directory to hold the staged input data
    #[arg(short = 'I', long = "hdfsinputdir")]
    hdfs_input_dir: Option<String>,

    /// HDFS directory for job output, cleared before every iteration
    #[arg(short = 'O', long = "hdfsoutputdir")]
    hdfs_output_dir: Option<String>,

    /// Local directory for the trained models
    #[arg(short = 'o', long = "outputdir")]
    output_dir: Option<PathBuf>,

    /// Model to resume training from
    #[arg(short = 'M', long = "inputmodel")]
    input_model: Option<PathBuf>,

    /// Iteration number of the input model
    #[arg(short = 'S', long = "inputmodeliter")]
    start_iteration: Option<u32>,

    /// Prefix of the model file names
    #[arg(short = 'm', long = "modelname")]
    model_name: Option<String>,

    /// Maximum number of training iterations
    #[arg(long = "maxiter")]
    max_iterations: Option<u32>,

    /// Number of reducers merging the shard models (negative keeps the cluster default)
    #[arg(long = "numreducer", allow_negative_numbers = true)]
    num_reducers: Option<i32>,

    /// Location of the hadoop streaming jar
    #[arg(long = "streamingloc")]
    streaming_jar: Option<PathBuf>,

    /// LD_LIBRARY_PATH for the tasks
    #[arg(long = "libpath")]
    lib_path: Option<String>,

    /// Minimum input split size in bytes (0 keeps the cluster default)
    #[arg(long = "splitsize")]
    split_size: Option<i64>,

    /// Task timeout in milliseconds (negative keeps the cluster default)
    #[arg(long = "tasktimeout", allow_negative_numbers = true)]
    task_timeout: Option<i64>,

    /// Restage the input data even if it is already on HDFS
    #[arg(long)]
    force: bool,

    /// Recompile the features even if precompiled data exists
    #[arg(long = "forcecompile")]
    force_compile: bool,

    /// Precompile features to symbol indices before training
    #[arg(long = "compilefeatures")]
    compile_features: bool,

    /// Consecutive loss increases reported as a decline
    #[arg(long = "maxdecline")]
    max_decline: Option<u32>,

    /// Stop training once the decline limit is reached
    #[arg(long)]
    stop_on_decline: bool,

    /// Score with the unweighted loss
    #[arg(long)]
    no_weighted_loss: bool,

    /// Model configuration file for the training mapper
    #[arg(long)]
    model_config: Option<PathBuf>,

    /// Training configuration file for the training mapper
    #[arg(long)]
    train_config: Option<PathBuf>,

    /// Configuration file for the evaluator
    #[arg(long)]
    dev_config: Option<PathBuf>,

    /// Extra files shipped with every training task (repeatable)
    #[arg(long = "mapperfiles")]
    mapper_files: Vec<PathBuf>,

    /// Run configuration file (defaults to ./ipm-train.toml if present)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

fn parse_level(level: Option<&str>) -> Level {
    match level.unwrap_or("info") {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let loaded = RunConfig::discover_and_load(args.config.as_deref());

    let file_level = loaded.as_ref().ok().and_then(|c| c.log_level.as_deref());
    let level = parse_level(args.log_level.as_deref().or(file_level));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let json = args.json;
    let result = match loaded {
        Ok(base) => {
            let config = args.apply_to(base);
            let driver = IpmDriver::new(config, Arc::new(ShellRunner::new()));
            driver.run(&TracingProgressSink).await
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(outcome) => report::print(&outcome, json),
        Err(err) => {
            error!("{err}");
            std::process::exit(err.exit_code());
        }
    }
}
