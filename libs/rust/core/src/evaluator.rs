//! Fitness evaluator seam.
//!
//! The optimizer never looks inside the fitness function: it hands over the
//! selected feature indices and gets a score back, lower being better.

use std::time::Instant;

use rayon::prelude::*;
use tracing::warn;

use crate::error::{CsoError, EvalError};
use crate::metrics::CSO_METRICS;

pub trait FitnessEvaluator: Sync {
    /// Score a feature subset. `features` is ascending and may be empty.
    fn evaluate(&self, features: &[usize]) -> Result<f64, EvalError>;
}

impl<F> FitnessEvaluator for F
where
    F: Fn(&[usize]) -> f64 + Sync,
{
    fn evaluate(&self, features: &[usize]) -> Result<f64, EvalError> { Ok(self(features)) }
}

/// Binds an opaque dataset handle to a scoring function.
pub struct DatasetEvaluator<D, F> {
    dataset: D,
    func: F,
}

impl<D, F> DatasetEvaluator<D, F>
where
    D: Sync,
    F: Fn(&D, &[usize]) -> Result<f64, EvalError> + Sync,
{
    pub fn new(dataset: D, func: F) -> Self { Self { dataset, func } }
    pub fn dataset(&self) -> &D { &self.dataset }
}

impl<D, F> FitnessEvaluator for DatasetEvaluator<D, F>
where
    D: Sync,
    F: Fn(&D, &[usize]) -> Result<f64, EvalError> + Sync,
{
    fn evaluate(&self, features: &[usize]) -> Result<f64, EvalError> { (self.func)(&self.dataset, features) }
}

/// Evaluate one particle's subset, rejecting errors and non-finite scores.
pub(crate) fn score<E: FitnessEvaluator + ?Sized>(evaluator: &E, particle: usize, features: &[usize]) -> Result<f64, CsoError> {
    let start = Instant::now();
    CSO_METRICS.evaluations_total.inc();
    let res = evaluator.evaluate(features);
    CSO_METRICS.evaluation_latency_ms.observe(start.elapsed().as_secs_f64() * 1000.0);
    let value = match res {
        Ok(v) => v,
        Err(source) => {
            CSO_METRICS.evaluation_failures_total.inc();
            warn!(particle, error = %source, "evaluator failed");
            return Err(CsoError::Evaluator { particle, source });
        }
    };
    if !value.is_finite() {
        CSO_METRICS.evaluation_failures_total.inc();
        warn!(particle, value, "evaluator returned non-finite fitness");
        return Err(CsoError::NonFiniteFitness { particle, value });
    }
    Ok(value)
}

/// Score a batch of `(particle, features)` jobs, in input order.
/// The first failure (by input order) is returned.
pub(crate) fn score_batch<E: FitnessEvaluator + ?Sized>(evaluator: &E, jobs: &[(usize, Vec<usize>)], parallel: bool) -> Result<Vec<f64>, CsoError> {
    if parallel {
        let results: Vec<Result<f64, CsoError>> = jobs.par_iter().map(|(p, feats)| score(evaluator, *p, feats)).collect();
        results.into_iter().collect()
    } else {
        jobs.iter().map(|(p, feats)| score(evaluator, *p, feats)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::eval_err;

    #[test]
    fn closures_and_dataset_evaluators_share_the_seam() {
        let count = |f: &[usize]| f.len() as f64;
        assert_eq!(count.evaluate(&[1, 4]).unwrap(), 2.0);

        let weights = vec![0.5, 1.5, 2.0];
        let weighted = DatasetEvaluator::new(weights, |w: &Vec<f64>, f: &[usize]| -> Result<f64, EvalError> {
            Ok(f.iter().map(|&i| w[i]).sum())
        });
        assert_eq!(weighted.evaluate(&[0, 2]).unwrap(), 2.5);
        assert_eq!(weighted.evaluate(&[]).unwrap(), 0.0);
    }

    #[test]
    fn non_finite_scores_are_rejected() {
        let nan = |_: &[usize]| f64::NAN;
        match score(&nan, 7, &[]) {
            Err(CsoError::NonFiniteFitness { particle, .. }) => assert_eq!(particle, 7),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn batch_reports_first_failure_in_order() {
        let picky = DatasetEvaluator::new((), |_: &(), f: &[usize]| -> Result<f64, EvalError> {
            if f.contains(&9) { Err(eval_err("feature 9 unsupported")) } else { Ok(f.len() as f64) }
        });
        let jobs = vec![(0, vec![1]), (1, vec![9]), (2, vec![9, 3]), (3, vec![])];
        for parallel in [false, true] {
            match score_batch(&picky, &jobs, parallel) {
                Err(CsoError::Evaluator { particle, .. }) => assert_eq!(particle, 1),
                other => panic!("unexpected {other:?}"),
            }
        }
        let ok = score_batch(&picky, &jobs[..1], true).unwrap();
        assert_eq!(ok, vec![1.0]);
    }
}
