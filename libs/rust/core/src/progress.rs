//! Progress side channel. Observers see every generation but cannot affect the run.

use parking_lot::Mutex;
use tracing::info;

use crate::optimizer::{GenerationRecord, TrialOutcome};

pub trait ProgressObserver: Sync {
    fn on_trial_start(&self, _trial: usize, _seed: u64) {}
    fn on_generation(&self, trial: usize, record: &GenerationRecord);
    fn on_trial_end(&self, _outcome: &TrialOutcome) {}
}

pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_generation(&self, _trial: usize, _record: &GenerationRecord) {}
}

/// Logs each generation at info level.
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn on_trial_start(&self, trial: usize, seed: u64) { info!(trial, seed, "trial started"); }

    fn on_generation(&self, trial: usize, record: &GenerationRecord) {
        info!(trial, generation = record.generation, best_ever = record.best_ever, current_min = record.current_min, "generation complete");
    }

    fn on_trial_end(&self, outcome: &TrialOutcome) {
        info!(trial = outcome.trial, best = outcome.best_fitness, features = outcome.best_features.len(), evaluations = outcome.evaluations, "trial finished");
    }
}

/// Keeps every `(trial, record)` in memory.
#[derive(Default)]
pub struct RecordingProgress {
    records: Mutex<Vec<(usize, GenerationRecord)>>,
    finished: Mutex<Vec<usize>>,
}

impl RecordingProgress {
    pub fn new() -> Self { Self::default() }
    pub fn records(&self) -> Vec<(usize, GenerationRecord)> { self.records.lock().clone() }
    pub fn finished_trials(&self) -> Vec<usize> { self.finished.lock().clone() }
}

impl ProgressObserver for RecordingProgress {
    fn on_generation(&self, trial: usize, record: &GenerationRecord) { self.records.lock().push((trial, record.clone())); }
    fn on_trial_end(&self, outcome: &TrialOutcome) { self.finished.lock().push(outcome.trial); }
}
