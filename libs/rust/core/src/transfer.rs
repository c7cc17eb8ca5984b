//! Sigmoid transfer function mapping continuous positions onto feature masks.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// `1 / (1 + exp(-steepness * (x - offset)))`
pub fn sigmoid(x: f64, steepness: f64, offset: f64) -> f64 {
    1.0 / (1.0 + (-steepness * (x - offset)).exp())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transfer {
    pub steepness: f64,
    pub offset: f64,
}

impl Default for Transfer { fn default() -> Self { Self { steepness: 1.0, offset: 0.0 } } }

impl Transfer {
    pub fn probability(&self, x: f64) -> f64 { sigmoid(x, self.steepness, self.offset) }

    /// Stochastic threshold: bit `d` is set when `sigmoid(x_d) > u_d`, one fresh draw per dimension.
    pub fn binarize<R: Rng + ?Sized>(&self, position: &[f64], rng: &mut R) -> Vec<bool> {
        position.iter().map(|&x| self.probability(x) > rng.gen::<f64>()).collect()
    }
}

/// Indices of the set bits, ascending. An all-false mask yields an empty list.
pub fn selected_features(mask: &[bool]) -> Vec<usize> {
    mask.iter().enumerate().filter(|(_, &on)| on).map(|(d, _)| d).collect()
}
