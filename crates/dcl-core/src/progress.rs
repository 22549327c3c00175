use crate::TRAINING_LOG_INTERVAL;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

/// Thread-safe progress counter for batches of independent rollouts.
///
/// Workers call [`Progress::tick`] as they finish; at most one INFO line
/// is emitted per [`TRAINING_LOG_INTERVAL`].
pub struct Progress {
    label: &'static str,
    total: usize,
    units: AtomicUsize,
    items: AtomicUsize,
    start: Instant,
    last: AtomicU64,
}

impl Progress {
    pub fn new(label: &'static str, total: usize) -> Self {
        Self {
            label,
            total,
            units: AtomicUsize::new(0),
            items: AtomicUsize::new(0),
            start: Instant::now(),
            last: AtomicU64::new(0),
        }
    }
    pub fn units(&self) -> usize {
        self.units.load(Ordering::Relaxed)
    }
    pub fn items(&self) -> usize {
        self.items.load(Ordering::Relaxed)
    }
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
    /// Record one finished unit carrying `items` results.
    pub fn tick(&self, items: usize) {
        self.units.fetch_add(1, Ordering::Relaxed);
        self.items.fetch_add(items, Ordering::Relaxed);
        let now = self.elapsed().as_secs();
        let last = self.last.load(Ordering::Relaxed);
        if now >= last + TRAINING_LOG_INTERVAL.as_secs()
            && self
                .last
                .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        {
            log::info!("{}", self.format());
        }
    }
    pub fn format(&self) -> String {
        let rate = self.items() as f64 / self.elapsed().as_secs_f64().max(1e-3);
        format!(
            "{:<32}{:<32}{:<32}",
            format!("{} {}/{}", self.label, self.units(), self.total),
            format!("items {}", self.items()),
            format!("items/sec {:.1}", rate),
        )
    }
    pub fn summary(&self) -> String {
        format!("{} done in {:.1?}\n{}", self.label, self.elapsed(), self.format())
    }
}
