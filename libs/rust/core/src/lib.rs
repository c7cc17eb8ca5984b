//! Competitive Swarm Optimizer (CSO) for feature selection.
//!
//! Particles live in a continuous box; each generation they are paired at
//! random, the worse particle of every pair learns from the better one and
//! from the swarm centroid, and positions are binarized through a sigmoid
//! into feature masks scored by an external [`FitnessEvaluator`].

use std::path::Path;

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use tracing::info;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

pub const ENV_PREFIX: &str = "CSO";

/// Install the fmt subscriber once per process. `RUST_LOG` drives filtering
/// (default `info`); `CSO_JSON_LOG=1` switches to JSON lines.
pub fn init_tracing(service: &str) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| -> Result<()> {
        let json = std::env::var("CSO_JSON_LOG").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true).with_line_number(true);
        let res = if json {
            builder.json().flatten_event(true).with_current_span(true).with_span_list(false).try_init()
        } else {
            builder.try_init()
        };
        res.map_err(|e| anyhow!("tracing init failed: {e}"))
    })?;
    info!(target: "cso", service, "tracing initialized");
    Ok(())
}

/// Layered settings: `service_name` default, optional `CSO_CONFIG_FILE`, then
/// `CSO_*` environment variables (`__` separates nested keys, e.g.
/// `CSO_BOUNDS__LOWER`).
pub fn load_config<T: DeserializeOwned>(service: &str) -> Result<T> {
    let file = std::env::var("CSO_CONFIG_FILE").ok();
    build_config(service, file.as_deref().map(Path::new), ENV_PREFIX)
}

pub fn build_config<T: DeserializeOwned>(service: &str, file: Option<&Path>, env_prefix: &str) -> Result<T> {
    let mut builder = ::config::Config::builder().set_default("service_name", service)?;
    if let Some(path) = file {
        builder = builder.add_source(::config::File::from(path).required(false));
    }
    builder = builder.add_source(
        ::config::Environment::with_prefix(env_prefix).prefix_separator("_").separator("__").try_parsing(true),
    );
    let cfg = builder.build()?;
    Ok(cfg.try_deserialize()?)
}

pub mod bounds;
pub mod competition;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod optimizer;
pub mod progress;
pub mod swarm;
pub mod transfer;

pub use bounds::Bounds;
pub use competition::{advance, compete, pair_up, Bout, GenerationReport, Pair, Pairing, UpdateParams};
pub use config::{BoundLimit, BoundsConfig, CsoConfig, OddPopulation};
pub use error::{eval_err, CsoError, EvalError};
pub use evaluator::{DatasetEvaluator, FitnessEvaluator};
pub use metrics::CSO_METRICS;
pub use optimizer::{CompetitiveSwarm, GenerationRecord, RunOutcome, RunSummary, TrialOutcome};
pub use progress::{NoProgress, ProgressObserver, RecordingProgress, TracingProgress};
pub use swarm::{Elite, Particle, Swarm};
pub use transfer::{selected_features, sigmoid, Transfer};
