use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use cso_core::{init_tracing, load_config, metrics, CompetitiveSwarm, CsoConfig, DatasetEvaluator, TracingProgress};
use serde::Deserialize;
use tracing::{debug, info};

mod dataset;
mod knn;
mod report;

use dataset::Dataset;
use report::RunReport;

const SERVICE: &str = "cso-runner";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RunnerSettings {
    /// CSV path; last column is the class label.
    dataset: Option<PathBuf>,
    /// Optional JSON report destination.
    report: Option<PathBuf>,
    /// k for the leave-one-out k-NN evaluator.
    neighbors: usize,
    normalize: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self { Self { dataset: None, report: None, neighbors: 5, normalize: true } }
}

fn main() -> Result<()> {
    init_tracing(SERVICE)?;
    let settings: RunnerSettings = load_config(SERVICE)?;
    let cfg: CsoConfig = load_config(SERVICE)?;
    info!(?settings, ?cfg, "config loaded");

    let path = settings.dataset.clone().context("no dataset configured (set CSO_DATASET or `dataset` in CSO_CONFIG_FILE)")?;
    let raw = Dataset::from_path(&path).with_context(|| format!("loading dataset {}", path.display()))?;
    let data = if settings.normalize { raw.normalized() } else { raw };
    let (rows, dim) = (data.len(), data.dim());
    let names = data.feature_names().map(|n| n.to_vec());
    info!(rows, dim, dataset = %path.display(), "dataset loaded");

    let opt = CompetitiveSwarm::new(cfg.clone(), dim)?;
    let k = settings.neighbors;
    let evaluator = DatasetEvaluator::new(data, move |d: &Dataset, f: &[usize]| knn::loo_error(d, k, f));

    let started_at = Utc::now();
    let outcome = opt.run(&evaluator, &TracingProgress)?;
    let report = RunReport::new(&path.display().to_string(), rows, dim, cfg, started_at, outcome).with_feature_names(names.as_deref());

    let s = &report.summary;
    info!(trials = s.trials, best = s.best, worst = s.worst, mean = s.mean, std_dev = s.std_dev, base_seed = report.base_seed, "run complete");
    if let Some(best) = report.best_trial() {
        info!(trial = best.trial, fitness = best.best_fitness, features = ?best.best_features, names = ?report.best_feature_names, "best subset");
    }
    if let Some(out) = &settings.report {
        report.write(out)?;
        info!(report = %out.display(), run_id = %report.run_id, "report written");
    }
    debug!(exposition = %metrics::render()?, "final metrics");
    Ok(())
}
