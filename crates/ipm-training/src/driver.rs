//! End-to-end training run: configuration to best model.

use crate::compile::{CompileOptions, FeatureCompiler};
use crate::config::RunConfig;
use crate::error::{TrainingError, TrainingResult};
use crate::hdfs::DistributedFs;
use crate::install::HadoopInstallation;
use crate::job::JobLauncher;
use crate::layout::{ModelLayout, StagingLayout};
use crate::progress::ProgressSink;
use crate::runner::CommandRunner;
use crate::scorer::{LossScorer, PipedScorer};
use crate::staging::DataStager;
use crate::toolkit::{MapperConfig, Toolkit};
use crate::trainer::{IpmOptions, IpmTrainer, TrainingOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Expand input entries into local files.
///
/// Each entry holds whitespace-separated glob patterns; a pattern that matches
/// nothing is an error.
pub fn collect_input_files(entries: &[String]) -> TrainingResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in entries.iter().flat_map(|e| e.split_whitespace()) {
        let matches: Vec<PathBuf> = glob::glob(pattern)
            .map_err(|e| {
                TrainingError::InvalidConfig(format!("invalid input pattern {pattern}: {e}"))
            })?
            .filter_map(Result::ok)
            .collect();
        if matches.is_empty() {
            return Err(TrainingError::InputNotFound(pattern.to_string()));
        }
        for file in matches {
            info!("Input file: {}", file.display());
            files.push(file);
        }
    }
    Ok(files)
}

pub struct IpmDriver {
    config: RunConfig,
    runner: Arc<dyn CommandRunner>,
}

impl IpmDriver {
    #[must_use]
    pub fn new(config: RunConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub async fn run(&self, progress: &dyn ProgressSink) -> TrainingResult<TrainingOutcome> {
        let config = &self.config;
        config.validate()?;

        let install = HadoopInstallation::discover(
            config.hadoop_root.as_deref(),
            config.streaming_jar.as_deref(),
        )?;
        let toolkit = Toolkit::new(config.refr_bin.clone());
        toolkit.validate()?;

        let input_files = collect_input_files(&config.inputs)?;
        if let Some(dev) = &config.devel_data {
            if !dev.exists() {
                return Err(TrainingError::DevDataNotFound(dev.clone()));
            }
        }

        let layout =
            ModelLayout::new(config.output_dir()?.to_path_buf(), config.model_name.clone());
        layout.ensure_output_dir()?;
        install.probe_version(self.runner.as_ref()).await?;

        let fs = DistributedFs::new(self.runner.clone(), install.hadoop_bin());
        let launcher = JobLauncher::new(
            self.runner.clone(),
            install.hadoop_bin(),
            install.streaming_jar().to_path_buf(),
            config.streaming_options(),
        );
        let stager = DataStager::new(fs.clone(), layout.output_dir().to_path_buf());
        let staging = StagingLayout::new(config.hdfs_input_dir()?);

        let mut job_inputs = Vec::with_capacity(input_files.len());
        for file in &input_files {
            let staged = stager.ensure_staged(file, staging.input_dir(), config.force, true).await?;
            job_inputs.push(staged.job_input());
        }

        let mut dev_data = config.devel_data.clone();
        if config.compile_features {
            let compiler = FeatureCompiler {
                fs: &fs,
                launcher: &launcher,
                stager: &stager,
                toolkit: &toolkit,
                layout: &layout,
                staging: &staging,
            };
            let options =
                CompileOptions { force: config.force, force_compile: config.force_compile };
            let compiled =
                compiler.compile(&job_inputs, config.devel_data.as_deref(), options).await?;
            job_inputs = compiled.job_inputs;
            dev_data = compiled.dev_data;
        }

        let mut scorer = match &dev_data {
            Some(dev) => {
                let command =
                    toolkit.evaluator(dev, config.dev_config.as_deref(), config.weighted_loss);
                Some(PipedScorer::open(&command).await?)
            }
            None => None,
        };

        let trainer = IpmTrainer::new(
            fs,
            launcher,
            toolkit,
            layout,
            IpmOptions {
                max_iterations: config.max_iterations,
                start_iteration: config.start_iteration,
                initial_model: config.input_model.clone(),
                num_reducers: config.num_reducers,
                max_decline: config.max_decline,
                decline_policy: config.decline_policy(),
                hdfs_output_dir: config.hdfs_output_dir()?.to_string(),
                mapper: MapperConfig {
                    model_config: config.model_config.clone(),
                    train_config: config.train_config.clone(),
                    extra_files: config.mapper_files.clone(),
                },
            },
        );

        let outcome = trainer
            .run(&job_inputs, scorer.as_mut().map(|s| s as &mut dyn LossScorer), progress)
            .await?;

        if let Some(scorer) = scorer {
            scorer.close().await?;
        }
        Ok(outcome)
    }
}
