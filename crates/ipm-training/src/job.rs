//! Streaming MapReduce job submission.

use crate::command::ShellCommand;
use crate::error::{TrainingError, TrainingResult};
use crate::runner::CommandRunner;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Job-level tuning shared by every submission of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingOptions {
    /// `mapred.min.split.size`; only passed when > 0.
    pub min_split_size: i64,
    /// `mapred.task.timeout`; only passed when >= 0.
    pub task_timeout: i64,
    /// Exported to tasks as `LD_LIBRARY_PATH` when non-empty.
    pub lib_path: Option<String>,
}

impl Default for StreamingOptions {
    fn default() -> Self {
        Self { min_split_size: 0, task_timeout: 0, lib_path: Some("/usr/local/lib:".to_string()) }
    }
}

/// One job submission. Built fresh for each iteration and never persisted.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub inputs: Vec<String>,
    pub output_dir: String,
    /// `None` (or an empty command) makes the job map-only.
    pub reducer: Option<ShellCommand>,
    /// Negative leaves the count to the cluster default.
    pub reduce_tasks: i32,
    pub mapper: ShellCommand,
    /// Local files shipped to every task.
    pub files: Vec<PathBuf>,
    /// Extra generic options, e.g. `-Dmapred.job.name=...`.
    pub extra_options: Vec<String>,
}

impl JobSpec {
    #[must_use]
    pub fn new(inputs: Vec<String>, output_dir: impl Into<String>, mapper: ShellCommand) -> Self {
        Self {
            inputs,
            output_dir: output_dir.into(),
            reducer: None,
            reduce_tasks: -1,
            mapper,
            files: Vec::new(),
            extra_options: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_reducer(mut self, reducer: ShellCommand, reduce_tasks: i32) -> Self {
        self.reducer = Some(reducer);
        self.reduce_tasks = reduce_tasks;
        self
    }

    #[must_use]
    pub fn with_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.files.extend(files);
        self
    }

    /// Generic options placed right after the `-D` tuning options.
    #[must_use]
    pub fn with_extra_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_options.extend(options.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn is_map_only(&self) -> bool {
        self.reducer.as_ref().map_or(true, ShellCommand::is_empty)
    }

    pub fn validate(&self) -> TrainingResult<()> {
        if self.inputs.is_empty() {
            return Err(TrainingError::InvalidConfig("job has no inputs".to_string()));
        }
        if self.output_dir.trim().is_empty() {
            return Err(TrainingError::InvalidConfig(
                "job output directory is required".to_string(),
            ));
        }
        if self.mapper.is_empty() {
            return Err(TrainingError::InvalidConfig("job mapper is required".to_string()));
        }
        Ok(())
    }
}

/// Builds and submits streaming jobs: `<hadoop> jar <streaming-jar> ...`.
#[derive(Clone)]
pub struct JobLauncher {
    runner: Arc<dyn CommandRunner>,
    hadoop_bin: PathBuf,
    streaming_jar: PathBuf,
    options: StreamingOptions,
}

impl JobLauncher {
    #[must_use]
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        hadoop_bin: PathBuf,
        streaming_jar: PathBuf,
        options: StreamingOptions,
    ) -> Self {
        Self { runner, hadoop_bin, streaming_jar, options }
    }

    #[must_use]
    pub fn build_command(&self, job: &JobSpec) -> ShellCommand {
        let mut cmd = ShellCommand::from_path(&self.hadoop_bin)
            .arg("jar")
            .arg(self.streaming_jar.to_string_lossy());

        if self.options.min_split_size > 0 {
            cmd = cmd.arg(format!("-Dmapred.min.split.size={}", self.options.min_split_size));
        }
        if self.options.task_timeout >= 0 {
            cmd = cmd.arg(format!("-Dmapred.task.timeout={}", self.options.task_timeout));
        }
        cmd = cmd.args(job.extra_options.iter().cloned());

        if let Some(lib_path) = self.options.lib_path.as_deref().filter(|p| !p.is_empty()) {
            cmd = cmd.arg("--cmdenv").arg(format!("LD_LIBRARY_PATH={lib_path}"));
        }

        for input in &job.inputs {
            cmd = cmd.arg("--input").arg(input.as_str());
        }

        match job.reducer.as_ref().filter(|r| !r.is_empty()) {
            None => {
                cmd = cmd.args(["-numReduceTasks", "0", "--reducer", "None"]);
            }
            Some(reducer) => {
                if job.reduce_tasks >= 0 {
                    cmd = cmd.arg("-numReduceTasks").arg(job.reduce_tasks.to_string());
                }
                cmd = cmd.arg("--reducer").nested(reducer);
            }
        }

        cmd = cmd.arg("--output").arg(job.output_dir.as_str());
        cmd = cmd.arg("--mapper").nested(&job.mapper);

        for file in &job.files {
            cmd = cmd.arg("-file").arg(file.to_string_lossy());
        }
        cmd
    }

    /// Run the job to completion. Any non-zero exit is fatal.
    pub async fn submit(&self, job: &JobSpec) -> TrainingResult<()> {
        job.validate()?;
        let command = self.build_command(job);
        info!("Running MR on: {}", job.inputs.join(" "));

        let status = self.runner.run(&command).await?;
        if !status.success() {
            return Err(TrainingError::JobFailed {
                status: status.to_string(),
                command: command.to_shell_string(),
            });
        }
        Ok(())
    }
}
