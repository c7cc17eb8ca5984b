//! Per-dimension search-space bounds.

use rand::Rng;

use crate::error::CsoError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, CsoError> {
        if lower.is_empty() { return Err(CsoError::config("dimensionality must be at least 1")); }
        if lower.len() != upper.len() {
            return Err(CsoError::config(format!("bounds length mismatch: {} lower vs {} upper", lower.len(), upper.len())));
        }
        for (d, (lo, hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() { return Err(CsoError::config(format!("bounds for dimension {d} must be finite"))); }
            if lo >= hi { return Err(CsoError::config(format!("lower bound {lo} must be below upper bound {hi} (dimension {d})"))); }
        }
        Ok(Self { lower, upper })
    }

    /// Same `[lower, upper]` interval on every one of `dim` dimensions.
    pub fn uniform(lower: f64, upper: f64, dim: usize) -> Result<Self, CsoError> {
        Self::new(vec![lower; dim], vec![upper; dim])
    }

    pub fn dim(&self) -> usize { self.lower.len() }
    pub fn lower(&self) -> &[f64] { &self.lower }
    pub fn upper(&self) -> &[f64] { &self.upper }

    pub fn contains(&self, position: &[f64]) -> bool {
        position.len() == self.dim()
            && position.iter().zip(self.lower.iter().zip(self.upper.iter())).all(|(x, (lo, hi))| x >= lo && x <= hi)
    }

    pub fn clamp(&self, position: &mut [f64]) {
        for (x, (lo, hi)) in position.iter_mut().zip(self.lower.iter().zip(self.upper.iter())) {
            *x = x.max(*lo).min(*hi);
        }
    }

    /// One uniform point: `lower_d + (upper_d - lower_d) * u` per dimension, `u` in `[0, 1)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.lower.iter().zip(self.upper.iter()).map(|(lo, hi)| lo + (hi - lo) * rng.gen::<f64>()).collect()
    }
}
