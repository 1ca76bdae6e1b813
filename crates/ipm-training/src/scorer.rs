use crate::command::ShellCommand;
use crate::error::TrainingResult;
use crate::pipe::PipeChannel;
use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

/// Scores a merged model against held-out data.
#[async_trait]
pub trait LossScorer: Send {
    /// `Ok(None)` means the scorer gave no usable number.
    async fn score(&mut self, model: &Path) -> TrainingResult<Option<f64>>;
}

/// Parse a scorer response; empty, non-numeric and non-finite values give `None`.
#[must_use]
pub fn parse_loss(response: &str) -> Option<f64> {
    response.trim().parse::<f64>().ok().filter(|l| l.is_finite())
}

/// Scorer backed by a persistent evaluator subprocess.
pub struct PipedScorer {
    channel: PipeChannel,
}

impl PipedScorer {
    pub async fn open(command: &ShellCommand) -> TrainingResult<Self> {
        Ok(Self { channel: PipeChannel::open(command).await? })
    }

    pub async fn close(self) -> TrainingResult<()> {
        self.channel.close().await
    }
}

#[async_trait]
impl LossScorer for PipedScorer {
    async fn score(&mut self, model: &Path) -> TrainingResult<Option<f64>> {
        let response = self.channel.send_receive(&model.to_string_lossy()).await?;
        let loss = parse_loss(&response);
        if loss.is_none() {
            warn!("No usable score for {} (response: {response:?})", model.display());
        }
        Ok(loss)
    }
}
