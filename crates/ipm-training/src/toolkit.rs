//! Commands for the reranker framework executables.
//!
//! The executables are opaque collaborators; this module only knows their
//! names and flags.

use crate::artifacts::ModelArtifact;
use crate::command::ShellCommand;
use crate::error::{TrainingError, TrainingResult};
use std::path::{Path, PathBuf};

/// Configuration files handed to the training mapper.
#[derive(Debug, Clone, Default)]
pub struct MapperConfig {
    pub model_config: Option<PathBuf>,
    pub train_config: Option<PathBuf>,
    /// Extra files shipped with every training task.
    pub extra_files: Vec<PathBuf>,
}

impl MapperConfig {
    /// Files to ship with the training job, after the warm-start model.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        self.model_config
            .iter()
            .chain(self.train_config.iter())
            .chain(self.extra_files.iter())
            .cloned()
            .collect()
    }
}

fn task_local(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    format!("./{name}")
}

/// The framework `bin` directory.
#[derive(Debug, Clone)]
pub struct Toolkit {
    bin_dir: PathBuf,
}

impl Toolkit {
    #[must_use]
    pub fn new(bin_dir: PathBuf) -> Self {
        Self { bin_dir }
    }

    /// The directory must exist and contain `run-model`.
    pub fn validate(&self) -> TrainingResult<()> {
        if !self.bin_dir.is_dir() || !self.bin_dir.join("run-model").exists() {
            return Err(TrainingError::InvalidConfig(format!(
                "--refrbin directory must be the Reranker Framework bin directory. Checked: {}",
                self.bin_dir.display()
            )));
        }
        Ok(())
    }

    fn tool(&self, name: &str) -> ShellCommand {
        ShellCommand::from_path(&self.bin_dir.join(name))
    }

    /// Per-shard trainer run as the streaming mapper.
    #[must_use]
    pub fn train_mapper(
        &self,
        config: &MapperConfig,
        warm_start: Option<&ModelArtifact>,
    ) -> ShellCommand {
        let mut cmd = self.tool("run-model");
        if let Some(model_config) = &config.model_config {
            cmd = cmd.arg("--model-config").arg(task_local(model_config));
        }
        if let Some(train_config) = &config.train_config {
            cmd = cmd.arg("--train-config").arg(task_local(train_config));
        }
        cmd = cmd.args(["--train", "-", "--mapper", "-m", "-"]);
        if let Some(model) = warm_start {
            cmd = cmd.arg("-i").arg(model.task_local_name());
        }
        cmd
    }

    /// Reducer merging per-shard models; `symbols` switches it to symbol tables.
    #[must_use]
    pub fn model_merge_reducer(&self, symbols: bool) -> ShellCommand {
        let cmd = self.tool("model-merge-reducer");
        if symbols { cmd.arg("-S") } else { cmd }
    }

    #[must_use]
    pub fn combine_shards(&self, output: &Path) -> ShellCommand {
        self.tool("model-combine-shards").arg("-o").arg(output.to_string_lossy())
    }

    #[must_use]
    pub fn combine_symbols(&self, output: &Path) -> ShellCommand {
        self.tool("model-combine-symbols").arg("-o").arg(output.to_string_lossy())
    }

    #[must_use]
    pub fn extract_symbols_mapper(&self) -> ShellCommand {
        self.tool("compile-features").args(["-i", "-"])
    }

    #[must_use]
    pub fn compile_data_mapper(&self, symbols: &Path) -> ShellCommand {
        self.tool("compile-features")
            .args(["-i", "-", "--clear-raw", "--input-symbols"])
            .arg(task_local(symbols))
    }

    /// Long-lived evaluator: reads a model path per line, answers with its loss.
    #[must_use]
    pub fn evaluator(
        &self,
        dev_data: &Path,
        dev_config: Option<&Path>,
        weighted_loss: bool,
    ) -> ShellCommand {
        let mut cmd = self.tool("piped-model-evaluator");
        if let Some(dev_config) = dev_config {
            cmd = cmd.arg("--dev-config").arg(dev_config.to_string_lossy());
        }
        cmd = cmd.arg("-d").arg(dev_data.to_string_lossy());
        if !weighted_loss {
            cmd = cmd.args(["--use-weighted-loss", "false"]);
        }
        cmd
    }
}
