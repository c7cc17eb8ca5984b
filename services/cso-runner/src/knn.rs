//! Leave-one-out k-nearest-neighbour error rate, used as the CSO fitness.

use cso_core::{eval_err, EvalError};
use rayon::prelude::*;

use crate::dataset::Dataset;

fn sq_dist(a: &[f64], b: &[f64], features: &[usize]) -> f64 {
    features.iter().map(|&d| { let t = a[d] - b[d]; t * t }).sum()
}

/// Majority label among `neighbours` (sorted nearest first); ties go to the
/// label whose first vote came earliest.
fn vote(neighbours: &[(f64, f64)]) -> f64 {
    let mut tally: Vec<(f64, usize)> = Vec::new();
    for &(_, label) in neighbours {
        match tally.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => tally.push((label, 1)),
        }
    }
    tally.iter().fold((f64::NAN, 0usize), |best, &(l, n)| if n > best.1 { (l, n) } else { best }).0
}

/// Fraction of rows misclassified by their `k` nearest other rows
/// over the selected columns. The empty subset scores 1.0.
pub fn loo_error(data: &Dataset, k: usize, features: &[usize]) -> Result<f64, EvalError> {
    if let Some(&bad) = features.iter().find(|&&d| d >= data.dim()) {
        return Err(format!("feature index {bad} out of range (dim {})", data.dim()).into());
    }
    if data.len() < 2 { return Err(eval_err("leave-one-out needs at least two rows")); }
    if features.is_empty() { return Ok(1.0); }
    let k = k.clamp(1, data.len() - 1);
    let rows = data.rows();
    let labels = data.labels();

    let wrong: usize = (0..rows.len()).into_par_iter().filter(|&i| {
        let mut dists: Vec<(f64, f64)> = (0..rows.len()).filter(|&j| j != i).map(|j| (sq_dist(&rows[i], &rows[j], features), labels[j])).collect();
        let cmp = |a: &(f64, f64), b: &(f64, f64)| a.0.total_cmp(&b.0);
        if k < dists.len() { dists.select_nth_unstable_by(k - 1, cmp); dists.truncate(k); }
        dists.sort_by(cmp);
        vote(&dists) != labels[i]
    }).count();
    Ok(wrong as f64 / rows.len() as f64)
}
