use serde::Serialize;

/// Loss of one completed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LossRecord {
    pub iteration: u32,
    pub loss: f64,
}

/// What changed when a loss was appended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossUpdate {
    pub iteration: u32,
    pub loss: f64,
    /// `previous - loss`; `None` for the first entry.
    pub delta: Option<f64>,
    pub best_index: usize,
    pub decline_count: u32,
}

/// Per-iteration losses in iteration order, with the running best and the
/// number of consecutive declines (losses worse than the one before).
#[derive(Debug, Clone, Default, Serialize)]
pub struct LossHistory {
    records: Vec<LossRecord>,
    best_index: usize,
    decline_count: u32,
}

impl LossHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the loss of `iteration`.
    ///
    /// The best index only moves on a strictly smaller loss, so the earliest
    /// minimum wins ties.
    pub fn record(&mut self, iteration: u32, loss: f64) -> LossUpdate {
        let previous = self.records.last().map(|r| r.loss);

        if let Some(previous) = previous {
            if loss < self.records[self.best_index].loss {
                self.best_index = self.records.len();
            }
            if loss > previous {
                self.decline_count += 1;
            } else {
                self.decline_count = 0;
            }
        }

        self.records.push(LossRecord { iteration, loss });
        LossUpdate {
            iteration,
            loss,
            delta: previous.map(|p| p - loss),
            best_index: self.best_index,
            decline_count: self.decline_count,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[LossRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn best_index(&self) -> Option<usize> {
        (!self.records.is_empty()).then_some(self.best_index)
    }

    #[must_use]
    pub fn best(&self) -> Option<&LossRecord> {
        self.records.get(self.best_index)
    }

    #[must_use]
    pub fn decline_count(&self) -> u32 {
        self.decline_count
    }
}
