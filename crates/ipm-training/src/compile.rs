//! Optional feature precompilation pass.
//!
//! Replaces string features by symbol indices before training, which shrinks
//! the models at the cost of two extra jobs (three with development data).

use crate::command::ShellCommand;
use crate::error::TrainingResult;
use crate::hdfs::DistributedFs;
use crate::job::{JobLauncher, JobSpec};
use crate::layout::{shards_glob, ModelLayout, StagingLayout};
use crate::staging::DataStager;
use crate::toolkit::Toolkit;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub force: bool,
    pub force_compile: bool,
}

/// Inputs to train on once compilation has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInputs {
    pub job_inputs: Vec<String>,
    /// Compiled development data for the scorer.
    pub dev_data: Option<PathBuf>,
}

pub struct FeatureCompiler<'a> {
    pub fs: &'a DistributedFs,
    pub launcher: &'a JobLauncher,
    pub stager: &'a DataStager,
    pub toolkit: &'a Toolkit,
    pub layout: &'a ModelLayout,
    pub staging: &'a StagingLayout,
}

impl FeatureCompiler<'_> {
    pub async fn compile(
        &self,
        inputs: &[String],
        dev_data: Option<&Path>,
        options: CompileOptions,
    ) -> TrainingResult<CompiledInputs> {
        info!("Precompiling feature indices");
        let compiled_dev = dev_data.map(|dev| self.layout.compiled_dev_path(dev));
        let precompiled_dir = self.staging.precompiled_dir();

        let cleared = self
            .fs
            .remove_if_exists(&precompiled_dir, options.force || options.force_compile)
            .await?;

        if cleared || options.force_compile {
            let dev_input = match dev_data {
                Some(dev) => {
                    let staged = self
                        .stager
                        .ensure_staged(dev, self.staging.input_dir(), options.force, true)
                        .await?;
                    info!("Dev data file: {}", staged.remote);
                    Some(staged.job_input())
                }
                None => None,
            };

            let symbols = self.layout.symbols_path();
            if !symbols.exists() {
                self.extract_symbols(inputs, dev_input.as_deref(), &symbols).await?;
            }

            let convert = |job_inputs: Vec<String>, output: &str| {
                JobSpec::new(job_inputs, output, self.toolkit.compile_data_mapper(&symbols))
                    .with_files([symbols.clone()])
            };
            self.launcher.submit(&convert(inputs.to_vec(), &precompiled_dir)).await?;

            if let (Some(dev_input), Some(compiled_dev)) = (dev_input, compiled_dev.as_deref()) {
                let dev_dir = self.staging.precompiled_dev_dir();
                self.fs.remove_if_exists(&dev_dir, true).await?;
                self.launcher.submit(&convert(vec![dev_input], &dev_dir)).await?;
                self.fs
                    .cat_through_pipe(
                        &shards_glob(&dev_dir),
                        ShellCommand::new("gzip").arg("-c").redirect_stdout(compiled_dev),
                    )
                    .await?;
                self.fs.remove_if_exists(&dev_dir, true).await?;
            }
        } else {
            info!("Reusing precompiled data in {precompiled_dir}");
        }

        Ok(CompiledInputs { job_inputs: vec![precompiled_dir], dev_data: compiled_dev })
    }

    async fn extract_symbols(
        &self,
        inputs: &[String],
        dev_input: Option<&str>,
        symbols: &Path,
    ) -> TrainingResult<()> {
        let symbols_dir = self.staging.symbols_dir();
        self.fs.remove_if_exists(&symbols_dir, true).await?;

        let mut job_inputs = inputs.to_vec();
        job_inputs.extend(dev_input.map(str::to_string));
        let mapper = self.toolkit.extract_symbols_mapper();
        let job = JobSpec::new(job_inputs, symbols_dir.as_str(), mapper)
            .with_reducer(self.toolkit.model_merge_reducer(true), 100);
        self.launcher.submit(&job).await?;

        self.fs
            .cat_through_pipe(&shards_glob(&symbols_dir), self.toolkit.combine_symbols(symbols))
            .await
    }
}
