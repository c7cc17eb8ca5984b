//! Run configuration.
//!
//! Every key is optional; see [`crate::load_config`] for the sources it is
//! read from.

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::CsoError;
use crate::transfer::Transfer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OddPopulation {
    /// Last entry of the shuffled order sits the generation out.
    #[default]
    Bye,
    /// Odd population sizes fail validation.
    Reject,
}

/// One side of the search box: a single value for every dimension, or one
/// value per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundLimit {
    Uniform(f64),
    PerDimension(Vec<f64>),
}

impl BoundLimit {
    fn expand(&self, side: &str, dim: usize) -> Result<Vec<f64>, CsoError> {
        match self {
            Self::Uniform(v) => Ok(vec![*v; dim]),
            Self::PerDimension(v) if v.len() == dim => Ok(v.clone()),
            Self::PerDimension(v) => Err(CsoError::config(format!("bounds.{side} has {} entries, problem has {dim} features", v.len()))),
        }
    }
}

impl From<f64> for BoundLimit { fn from(v: f64) -> Self { Self::Uniform(v) } }
impl From<Vec<f64>> for BoundLimit { fn from(v: Vec<f64>) -> Self { Self::PerDimension(v) } }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    pub lower: BoundLimit,
    pub upper: BoundLimit,
}

impl BoundsConfig {
    pub fn new(lower: impl Into<BoundLimit>, upper: impl Into<BoundLimit>) -> Self {
        Self { lower: lower.into(), upper: upper.into() }
    }

    pub fn resolve(&self, dim: usize) -> Result<Bounds, CsoError> {
        Bounds::new(self.lower.expand("lower", dim)?, self.upper.expand("upper", dim)?)
    }
}

impl Default for BoundsConfig { fn default() -> Self { Self::new(-5.0, 5.0) } }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsoConfig {
    /// Generations per trial.
    pub maxfe: usize,
    /// Independent trials.
    pub runnum: usize,
    #[serde(alias = "m")]
    pub population: usize,
    /// Social (centroid) coefficient.
    pub phi: f64,
    pub bounds: BoundsConfig,
    pub transfer: Transfer,
    pub odd_population: OddPopulation,
    /// Base seed; trial `t` is seeded with `seed + t`.
    pub seed: Option<u64>,
    pub parallel_trials: bool,
    pub parallel_evaluation: bool,
}

impl Default for CsoConfig {
    fn default() -> Self {
        Self {
            maxfe: 100,
            runnum: 30,
            population: 50,
            phi: 0.1,
            bounds: BoundsConfig::default(),
            transfer: Transfer::default(),
            odd_population: OddPopulation::Bye,
            seed: None,
            parallel_trials: false,
            parallel_evaluation: false,
        }
    }
}

impl CsoConfig {
    /// Check the configuration against a problem of `dim` features and build its bounds.
    pub fn validate(&self, dim: usize) -> Result<Bounds, CsoError> {
        if self.population < 2 {
            return Err(CsoError::config(format!("population size must be at least 2, got {}", self.population)));
        }
        if self.population % 2 == 1 && self.odd_population == OddPopulation::Reject {
            return Err(CsoError::config(format!("odd population size {} rejected (odd_population = reject)", self.population)));
        }
        if self.runnum == 0 { return Err(CsoError::config("runnum must be at least 1")); }
        if !self.phi.is_finite() { return Err(CsoError::config(format!("phi must be finite, got {}", self.phi))); }
        if !(self.transfer.steepness.is_finite() && self.transfer.steepness > 0.0) {
            return Err(CsoError::config(format!("transfer steepness must be positive, got {}", self.transfer.steepness)));
        }
        if !self.transfer.offset.is_finite() { return Err(CsoError::config("transfer offset must be finite")); }
        self.bounds.resolve(dim)
    }
}
