//! Run orchestration: independent trials of the competitive swarm optimizer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::bounds::Bounds;
use crate::competition::{advance, UpdateParams};
use crate::config::CsoConfig;
use crate::error::CsoError;
use crate::evaluator::FitnessEvaluator;
use crate::metrics::CSO_METRICS;
use crate::progress::ProgressObserver;
use crate::swarm::Swarm;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub best_ever: f64,
    pub current_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialOutcome {
    pub trial: usize,
    /// Stream seed; 0 when the caller drove `run_trial` with its own RNG.
    pub seed: u64,
    /// Best fitness of the freshly initialized swarm.
    pub initial_best: f64,
    pub best_fitness: f64,
    pub best_features: Vec<usize>,
    pub generations: usize,
    pub evaluations: u64,
    pub trace: Vec<GenerationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub trials: usize,
    pub best: f64,
    pub worst: f64,
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub base_seed: u64,
    pub trials: Vec<TrialOutcome>,
}

impl RunOutcome {
    pub fn best_trial(&self) -> Option<&TrialOutcome> {
        self.trials.iter().fold(None, |acc: Option<&TrialOutcome>, t| match acc {
            Some(b) if b.best_fitness <= t.best_fitness => Some(b),
            _ => Some(t),
        })
    }

    /// Sample statistics over per-trial best fitness values.
    pub fn summary(&self) -> RunSummary {
        let vals: Vec<f64> = self.trials.iter().map(|t| t.best_fitness).collect();
        let n = vals.len();
        if n == 0 {
            return RunSummary { trials: 0, best: f64::NAN, worst: f64::NAN, mean: f64::NAN, std_dev: f64::NAN };
        }
        let mean = vals.iter().sum::<f64>() / n as f64;
        let var = if n < 2 { 0.0 } else { vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0) };
        RunSummary {
            trials: n,
            best: vals.iter().copied().fold(f64::INFINITY, f64::min),
            worst: vals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            std_dev: var.sqrt(),
        }
    }
}

pub struct CompetitiveSwarm {
    cfg: CsoConfig,
    bounds: Bounds,
}

impl CompetitiveSwarm {
    /// Validates `cfg` for a problem with `dim` features; nothing runs on error.
    pub fn new(cfg: CsoConfig, dim: usize) -> Result<Self, CsoError> {
        let bounds = cfg.validate(dim)?;
        Ok(Self { cfg, bounds })
    }

    pub fn config(&self) -> &CsoConfig { &self.cfg }
    pub fn bounds(&self) -> &Bounds { &self.bounds }
    pub fn dim(&self) -> usize { self.bounds.dim() }

    fn params(&self) -> UpdateParams<'_> {
        UpdateParams { phi: self.cfg.phi, bounds: &self.bounds, transfer: self.cfg.transfer, parallel_evaluation: self.cfg.parallel_evaluation }
    }

    /// Fresh swarm, then exactly `maxfe` generations driven by `rng`.
    pub fn run_trial<E, R, O>(&self, trial: usize, evaluator: &E, rng: &mut R, observer: &O) -> Result<TrialOutcome, CsoError>
    where
        E: FitnessEvaluator + ?Sized,
        R: Rng + ?Sized,
        O: ProgressObserver + ?Sized,
    {
        let m = self.cfg.population;
        let params = self.params();
        let mut swarm = Swarm::initialize(m, &self.bounds, &self.cfg.transfer, evaluator, rng, self.cfg.parallel_evaluation)?;
        let initial_best = swarm.best().fitness;
        let mut evaluations = m as u64;
        let mut trace = Vec::with_capacity(self.cfg.maxfe);

        for generation in 0..self.cfg.maxfe {
            let report = advance(&mut swarm, &params, evaluator, rng)?;
            evaluations += report.bouts.len() as u64;
            let record = GenerationRecord { generation, best_ever: report.best_ever, current_min: report.current_min };
            observer.on_generation(trial, &record);
            trace.push(record);
        }

        CSO_METRICS.trials_total.inc();
        let best = swarm.best();
        Ok(TrialOutcome {
            trial,
            seed: 0,
            initial_best,
            best_fitness: best.fitness,
            best_features: best.features.clone(),
            generations: self.cfg.maxfe,
            evaluations,
            trace,
        })
    }

    fn seeded_trial<E, O>(&self, trial: usize, base_seed: u64, evaluator: &E, observer: &O) -> Result<TrialOutcome, CsoError>
    where
        E: FitnessEvaluator + ?Sized,
        O: ProgressObserver + ?Sized,
    {
        let seed = base_seed.wrapping_add(trial as u64);
        let _span = info_span!("trial", trial, seed).entered();
        observer.on_trial_start(trial, seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut outcome = self.run_trial(trial, evaluator, &mut rng, observer).map_err(|e| {
            warn!(trial, error = %e, "trial aborted");
            CsoError::TrialAborted { trial, source: Box::new(e) }
        })?;
        outcome.seed = seed;
        observer.on_trial_end(&outcome);
        Ok(outcome)
    }

    /// Runs `runnum` independent trials; the first failing trial aborts the run.
    pub fn run<E, O>(&self, evaluator: &E, observer: &O) -> Result<RunOutcome, CsoError>
    where
        E: FitnessEvaluator + ?Sized,
        O: ProgressObserver + ?Sized,
    {
        let base_seed = self.cfg.seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!(
            runnum = self.cfg.runnum,
            maxfe = self.cfg.maxfe,
            population = self.cfg.population,
            dim = self.dim(),
            base_seed,
            parallel_trials = self.cfg.parallel_trials,
            "starting CSO run"
        );
        let trials = if self.cfg.parallel_trials {
            let results: Vec<Result<TrialOutcome, CsoError>> =
                (0..self.cfg.runnum).into_par_iter().map(|t| self.seeded_trial(t, base_seed, evaluator, observer)).collect();
            results.into_iter().collect::<Result<Vec<_>, _>>()?
        } else {
            (0..self.cfg.runnum).map(|t| self.seeded_trial(t, base_seed, evaluator, observer)).collect::<Result<Vec<_>, _>>()?
        };
        Ok(RunOutcome { base_seed, trials })
    }
}
