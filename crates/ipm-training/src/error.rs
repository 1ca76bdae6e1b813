use std::path::PathBuf;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

/// Every way a training run can fail.
///
/// Nothing in this crate retries; the first error propagates to the driver,
/// which turns it into the process exit code returned by [`TrainingError::exit_code`].
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("hadoop installation not found: {0}")]
    InstallationNotFound(String),

    #[error("input file not found: {0}")]
    InputNotFound(String),

    #[error("development data not found: {}", .0.display())]
    DevDataNotFound(PathBuf),

    #[error("unable to decompress {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to create input on HDFS: {0}")]
    StagingFailed(String),

    #[error("MapReduce job failed with {status}: {command}")]
    JobFailed { status: String, command: String },

    #[error("pipeline failed with {status}: {command}")]
    PipelineFailed { status: String, command: String },

    #[error("filesystem command failed with {status}: {command}")]
    FsCommandFailed { status: String, command: String },

    #[error("unable to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command {command} did not start up correctly: {reason}")]
    ScorerStartup { command: String, reason: String },

    #[error("scorer channel failed: {0}")]
    ScorerChannel(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrainingError {
    /// Process exit code for this failure category.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig(_) => 2,
            Self::InstallationNotFound(_) => 10,
            Self::StagingFailed(_) => 11,
            Self::Decompress { .. } => 12,
            Self::JobFailed { .. } => 33,
            Self::PipelineFailed { .. } => 34,
            Self::FsCommandFailed { .. } => 35,
            Self::Spawn { .. } => 36,
            Self::ScorerStartup { .. } => 100,
            Self::ScorerChannel(_) => 101,
            Self::InputNotFound(_) => 130,
            Self::DevDataNotFound(_) => 131,
            Self::Io(_) => 1,
        }
    }
}
