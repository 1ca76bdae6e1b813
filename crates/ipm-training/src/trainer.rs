//! The Iterative Parameter Mixtures control loop.

use crate::artifacts::{BestModel, ModelArtifact};
use crate::error::TrainingResult;
use crate::hdfs::DistributedFs;
use crate::history::LossHistory;
use crate::job::{JobLauncher, JobSpec};
use crate::layout::{shards_glob, ModelLayout};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::scorer::LossScorer;
use crate::toolkit::{MapperConfig, Toolkit};
use serde::Serialize;
use std::path::PathBuf;

/// What happens once the loss has declined `max_decline` times in a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclinePolicy {
    /// Report it and keep going until `max_iterations`.
    #[default]
    Advisory,
    /// Stop training.
    Stop,
}

#[derive(Debug, Clone)]
pub struct IpmOptions {
    pub max_iterations: u32,
    /// Iteration number of `initial_model`; training resumes at the next one.
    pub start_iteration: u32,
    pub initial_model: Option<PathBuf>,
    pub num_reducers: i32,
    pub max_decline: u32,
    pub decline_policy: DeclinePolicy,
    /// Job output directory, cleared before every iteration.
    pub hdfs_output_dir: String,
    pub mapper: MapperConfig,
}

impl Default for IpmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            start_iteration: 0,
            initial_model: None,
            num_reducers: 1,
            max_decline: 5,
            decline_policy: DeclinePolicy::Advisory,
            hdfs_output_dir: String::new(),
            mapper: MapperConfig::default(),
        }
    }
}

/// Result of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingOutcome {
    pub history: LossHistory,
    pub models: Vec<ModelArtifact>,
    pub best: Option<BestModel>,
}

struct TrainingState {
    iteration: u32,
    current_model: Option<ModelArtifact>,
    history: LossHistory,
    converged: bool,
}

pub struct IpmTrainer {
    fs: DistributedFs,
    launcher: JobLauncher,
    toolkit: Toolkit,
    layout: ModelLayout,
    options: IpmOptions,
}

impl IpmTrainer {
    #[must_use]
    pub fn new(
        fs: DistributedFs,
        launcher: JobLauncher,
        toolkit: Toolkit,
        layout: ModelLayout,
        options: IpmOptions,
    ) -> Self {
        Self { fs, launcher, toolkit, layout, options }
    }

    /// The training job of one iteration, warm-started from `current` if set.
    #[must_use]
    pub fn job_for_iteration(&self, inputs: &[String], current: Option<&ModelArtifact>) -> JobSpec {
        let mapper = self.toolkit.train_mapper(&self.options.mapper, current);
        let files = current.map(|m| m.path.clone()).into_iter().chain(self.options.mapper.files());

        JobSpec::new(inputs.to_vec(), self.options.hdfs_output_dir.as_str(), mapper)
            .with_reducer(self.toolkit.model_merge_reducer(false), self.options.num_reducers)
            .with_files(files)
    }

    /// Run iterations until `max_iterations` (or a decline stop, if enabled).
    ///
    /// Without a scorer every iteration records a loss of 0.
    pub async fn run(
        &self,
        inputs: &[String],
        mut scorer: Option<&mut dyn LossScorer>,
        progress: &dyn ProgressSink,
    ) -> TrainingResult<TrainingOutcome> {
        let opts = &self.options;
        let mut state = TrainingState {
            iteration: opts.start_iteration,
            current_model: opts
                .initial_model
                .as_deref()
                .map(|p| ModelArtifact::resumed(opts.start_iteration, p)),
            history: LossHistory::new(),
            converged: false,
        };
        let mut models = Vec::new();

        while !state.converged && state.iteration < opts.max_iterations {
            state.iteration += 1;
            let iteration = state.iteration;
            progress.on_event(ProgressEvent::IterationStarted {
                iteration,
                max_iterations: opts.max_iterations,
            });

            self.fs.remove_if_exists(&opts.hdfs_output_dir, true).await?;
            let job = self.job_for_iteration(inputs, state.current_model.as_ref());
            self.launcher.submit(&job).await?;

            let model = ModelArtifact::new(iteration, self.layout.model_path(iteration));
            let combine = self.toolkit.combine_shards(&model.path);
            self.fs.cat_through_pipe(&shards_glob(&opts.hdfs_output_dir), combine).await?;
            progress.on_event(ProgressEvent::ModelMerged { model: model.clone() });

            let loss = match scorer.as_mut() {
                Some(scorer) => scorer.score(&model.path).await?.unwrap_or(0.0),
                None => 0.0,
            };
            let update = state.history.record(iteration, loss);
            progress.on_event(ProgressEvent::LossRecorded { iteration, loss, delta: update.delta });

            if update.delta.is_some() {
                let exhausted =
                    update.decline_count > 0 && update.decline_count >= opts.max_decline;
                let stopping = exhausted && opts.decline_policy == DeclinePolicy::Stop;
                progress.on_event(ProgressEvent::DeclineNoted {
                    decline_count: update.decline_count,
                    max_decline: opts.max_decline,
                    stopping,
                });
                state.converged = stopping;
            }

            models.push(model.clone());
            state.current_model = Some(model);
        }

        let best = state.history.best().and_then(|record| {
            models.iter().find(|m| m.iteration == record.iteration).map(|m| BestModel {
                iteration: record.iteration,
                loss: record.loss,
                model: m.path.clone(),
            })
        });
        progress.on_event(ProgressEvent::Finished { best: best.clone() });

        Ok(TrainingOutcome { history: state.history, models, best })
    }
}
