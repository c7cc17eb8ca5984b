//! Error types shared by the optimizer crate.

use thiserror::Error;

/// Boxed error returned by fallible evaluators.
pub type EvalError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CsoError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("evaluator failed for particle {particle}: {source}")]
    Evaluator { particle: usize, #[source] source: EvalError },
    #[error("evaluator returned non-finite fitness {value} for particle {particle}")]
    NonFiniteFitness { particle: usize, value: f64 },
    #[error("trial {trial} aborted: {source}")]
    TrialAborted { trial: usize, #[source] source: Box<CsoError> },
}

impl CsoError {
    pub(crate) fn config(msg: impl Into<String>) -> Self { CsoError::InvalidConfig(msg.into()) }

    /// True when the error originated from the evaluator rather than from configuration.
    pub fn is_evaluator_failure(&self) -> bool {
        match self {
            CsoError::Evaluator { .. } | CsoError::NonFiniteFitness { .. } => true,
            CsoError::TrialAborted { source, .. } => source.is_evaluator_failure(),
            CsoError::InvalidConfig(_) => false,
        }
    }
}

// lightweight error helper
pub fn eval_err(msg: &str) -> EvalError { msg.into() }
