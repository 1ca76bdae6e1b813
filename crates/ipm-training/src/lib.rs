//! IPM Training
//!
//! Drives Iterative Parameter Mixtures training on a Hadoop cluster:
//! - Staging local data onto HDFS (`DataStager`)
//! - Submitting streaming MapReduce jobs (`JobLauncher`)
//! - Merging per-shard models and scoring them through a persistent
//!   evaluator process (`PipedScorer`)
//! - Tracking the loss history and the best iteration (`IpmTrainer`)
//!
//! The learning itself happens in external executables; this crate only
//! sequences them.

pub mod artifacts;
pub mod command;
pub mod compile;
pub mod config;
pub mod driver;
pub mod error;
pub mod hdfs;
pub mod history;
pub mod install;
pub mod job;
pub mod layout;
pub mod pipe;
pub mod progress;
pub mod runner;
pub mod scorer;
pub mod staging;
pub mod toolkit;
pub mod trainer;

pub use artifacts::{BestModel, ModelArtifact};
pub use command::ShellCommand;
pub use compile::{CompileOptions, CompiledInputs, FeatureCompiler};
pub use config::RunConfig;
pub use driver::{collect_input_files, IpmDriver};
pub use error::{TrainingError, TrainingResult};
pub use hdfs::{hdfs_join, DistributedFs};
pub use history::{LossHistory, LossRecord, LossUpdate};
pub use install::HadoopInstallation;
pub use job::{JobLauncher, JobSpec, StreamingOptions};
pub use layout::{shards_glob, ModelLayout, StagingLayout};
pub use pipe::PipeChannel;
pub use progress::{ProgressEvent, ProgressSink, TracingProgressSink};
pub use runner::{CapturedLines, CommandRunner, CommandStatus, ShellRunner};
pub use scorer::{parse_loss, LossScorer, PipedScorer};
pub use staging::{DataStager, StagedInput};
pub use toolkit::{MapperConfig, Toolkit};
pub use trainer::{DeclinePolicy, IpmOptions, IpmTrainer, TrainingOutcome};
