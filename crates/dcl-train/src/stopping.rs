use dcl_core::*;

/// What to do after an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// The model improved enough to be persisted.
    pub save: bool,
    /// Training should end now.
    pub stop: bool,
}

/// Patience-based early stopping on validation loss.
///
/// An epoch improves when its loss beats the best seen by at least
/// `delta`. The first epoch always improves. A non-finite loss never
/// improves. Once stopped, every later update is a stop without save.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    delta: Score,
    best: Option<Score>,
    strikes: usize,
    stopped: bool,
}

impl EarlyStopping {
    pub fn new(patience: usize, delta: Score) -> Self {
        Self {
            patience,
            delta,
            best: None,
            strikes: 0,
            stopped: false,
        }
    }
    pub fn best(&self) -> Option<Score> {
        self.best
    }
    pub fn strikes(&self) -> usize {
        self.strikes
    }
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    pub fn update(&mut self, loss: Score) -> Verdict {
        if self.stopped {
            return Verdict {
                save: false,
                stop: true,
            };
        }
        // a non-finite loss is a strike even as the first value, so a
        // diverged model never becomes the saved best
        let improved = loss.is_finite()
            && match self.best {
                None => true,
                Some(best) => loss <= best - self.delta,
            };
        if improved {
            self.best = Some(loss);
            self.strikes = 0;
        } else {
            self.strikes += 1;
        }
        self.stopped = self.strikes >= self.patience;
        Verdict {
            save: improved,
            stop: self.stopped,
        }
    }
}

impl Default for EarlyStopping {
    fn default() -> Self {
        Self::new(EARLY_STOPPING_PATIENCE, EARLY_STOPPING_DELTA)
    }
}
