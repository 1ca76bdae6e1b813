use crate::artifacts::{BestModel, ModelArtifact};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    IterationStarted { iteration: u32, max_iterations: u32 },
    ModelMerged { model: ModelArtifact },
    LossRecorded { iteration: u32, loss: f64, delta: Option<f64> },
    /// Emitted after every scored iteration with the consecutive decline count.
    DeclineNoted { decline_count: u32, max_decline: u32, stopping: bool },
    Finished { best: Option<BestModel> },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Writes progress as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::IterationStarted { iteration, max_iterations } => {
                info!("Training iteration: {iteration} (max {max_iterations})");
            }
            ProgressEvent::ModelMerged { model } => {
                info!("Merged model for iteration {}: {}", model.iteration, model.path.display());
            }
            ProgressEvent::LossRecorded { iteration, loss, delta: None } => {
                info!("Loss for iteration {iteration}: {loss}");
            }
            ProgressEvent::LossRecorded { iteration, loss, delta: Some(delta) } => {
                info!("Loss for iteration {iteration}: {loss} loss-delta: {delta}");
            }
            ProgressEvent::DeclineNoted { decline_count, max_decline, .. }
                if decline_count < max_decline =>
            {
                info!(
                    "Continuing to train as number epochs in decline is: {decline_count}, \
                     which is less than {max_decline}"
                );
            }
            ProgressEvent::DeclineNoted { decline_count, max_decline, stopping } => {
                let next = if stopping { "stopping" } else { "continuing" };
                warn!(
                    "Loss has declined for {decline_count} iterations (limit {max_decline}); {next}"
                );
            }
            ProgressEvent::Finished { best: Some(best) } => {
                info!(
                    "Best model is from iteration: {} with a devset loss of: {} ({})",
                    best.iteration,
                    best.loss,
                    best.model.display()
                );
            }
            ProgressEvent::Finished { best: None } => info!("No training iterations were run"),
        }
    }
}
