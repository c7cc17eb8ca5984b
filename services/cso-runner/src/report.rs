//! JSON run report written at the end of a run.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cso_core::{CsoConfig, RunOutcome, RunSummary, TrialOutcome};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dataset: String,
    pub rows: usize,
    pub dim: usize,
    pub config: CsoConfig,
    pub base_seed: u64,
    pub summary: RunSummary,
    /// Column names of the overall best subset, when the dataset had a header.
    pub best_feature_names: Option<Vec<String>>,
    pub trials: Vec<TrialOutcome>,
}

impl RunReport {
    pub fn new(dataset: &str, rows: usize, dim: usize, config: CsoConfig, started_at: DateTime<Utc>, outcome: RunOutcome) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            dataset: dataset.to_string(),
            rows,
            dim,
            config,
            base_seed: outcome.base_seed,
            summary: outcome.summary(),
            best_feature_names: None,
            trials: outcome.trials,
        }
    }

    pub fn best_trial(&self) -> Option<&TrialOutcome> {
        self.trials.iter().fold(None, |acc: Option<&TrialOutcome>, t| match acc {
            Some(b) if b.best_fitness <= t.best_fitness => Some(b),
            _ => Some(t),
        })
    }

    pub fn with_feature_names(mut self, names: Option<&[String]>) -> Self {
        self.best_feature_names = match (names, self.best_trial()) {
            (Some(n), Some(best)) => Some(best.best_features.iter().filter_map(|&d| n.get(d).cloned()).collect()),
            _ => None,
        };
        self
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing report to {}", path.display()))
    }
}
