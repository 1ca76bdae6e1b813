//! Run configuration file support.
//!
//! Every command-line option has a field here; a TOML file can provide any of
//! them and the CLI overrides what it is given explicitly.

use crate::error::{TrainingError, TrainingResult};
use crate::job::StreamingOptions;
use crate::trainer::DeclinePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Hadoop installation root; discovered when unset.
    pub hadoop_root: Option<PathBuf>,
    /// Streaming jar; discovered under the root when unset.
    pub streaming_jar: Option<PathBuf>,
    /// Reranker framework `bin` directory.
    pub refr_bin: PathBuf,
    /// Local training data: whitespace-separated glob patterns per entry.
    pub inputs: Vec<String>,
    pub devel_data: Option<PathBuf>,
    pub hdfs_input_dir: Option<String>,
    /// Removed before each iteration.
    pub hdfs_output_dir: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub input_model: Option<PathBuf>,
    pub start_iteration: u32,
    pub model_name: String,
    pub max_iterations: u32,
    pub num_reducers: i32,
    pub lib_path: Option<String>,
    pub split_size: i64,
    pub task_timeout: i64,
    pub force: bool,
    pub force_compile: bool,
    pub compile_features: bool,
    pub max_decline: u32,
    pub stop_on_decline: bool,
    pub weighted_loss: bool,
    pub model_config: Option<PathBuf>,
    pub train_config: Option<PathBuf>,
    pub dev_config: Option<PathBuf>,
    pub mapper_files: Vec<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            hadoop_root: None,
            streaming_jar: None,
            refr_bin: PathBuf::from("/usr/local/refr/bin"),
            inputs: Vec::new(),
            devel_data: None,
            hdfs_input_dir: None,
            hdfs_output_dir: None,
            output_dir: None,
            input_model: None,
            start_iteration: 0,
            model_name: "model".to_string(),
            max_iterations: 100,
            num_reducers: 1,
            lib_path: Some("/usr/local/lib:".to_string()),
            split_size: 0,
            task_timeout: 0,
            force: false,
            force_compile: false,
            compile_features: false,
            max_decline: 5,
            stop_on_decline: false,
            weighted_loss: true,
            model_config: None,
            train_config: None,
            dev_config: None,
            mapper_files: Vec::new(),
            log_level: None,
        }
    }
}

fn required<'a, T>(value: &'a Option<T>, option: &str) -> TrainingResult<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| TrainingError::InvalidConfig(format!("--{option} option is required")))
}

impl RunConfig {
    /// Default config file looked up in the working directory.
    pub const LOCAL_FILE: &'static str = "ipm-train.toml";

    pub fn load_from_file(path: &Path) -> TrainingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrainingError::InvalidConfig(format!(
                "failed to read configuration file {}: {e}",
                path.display()
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            TrainingError::InvalidConfig(format!(
                "failed to parse configuration file {}: {e}",
                path.display()
            ))
        })
    }

    /// Load `explicit` if given, else `./ipm-train.toml` if present, else defaults.
    pub fn discover_and_load(explicit: Option<&Path>) -> TrainingResult<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let local = PathBuf::from(Self::LOCAL_FILE);
                if local.exists() { Self::load_from_file(&local) } else { Ok(Self::default()) }
            }
        }
    }

    pub fn validate(&self) -> TrainingResult<()> {
        if self.inputs.iter().all(|i| i.trim().is_empty()) {
            return Err(TrainingError::InvalidConfig("--input option is required".to_string()));
        }
        self.hdfs_input_dir()?;
        self.hdfs_output_dir()?;
        self.output_dir()?;
        if self.model_name.trim().is_empty() {
            return Err(TrainingError::InvalidConfig("--modelname must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn hdfs_input_dir(&self) -> TrainingResult<&str> {
        required(&self.hdfs_input_dir, "hdfsinputdir").map(String::as_str)
    }

    pub fn hdfs_output_dir(&self) -> TrainingResult<&str> {
        required(&self.hdfs_output_dir, "hdfsoutputdir").map(String::as_str)
    }

    pub fn output_dir(&self) -> TrainingResult<&Path> {
        required(&self.output_dir, "outputdir").map(PathBuf::as_path)
    }

    #[must_use]
    pub fn streaming_options(&self) -> StreamingOptions {
        StreamingOptions {
            min_split_size: self.split_size,
            task_timeout: self.task_timeout,
            lib_path: self.lib_path.clone(),
        }
    }

    #[must_use]
    pub fn decline_policy(&self) -> DeclinePolicy {
        if self.stop_on_decline { DeclinePolicy::Stop } else { DeclinePolicy::Advisory }
    }
}
