//! Optimizer metrics registered in the default prometheus registry.
//!
//! Counters are process-wide; parallel trials all feed the same series.

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::core::Collector;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, TextEncoder};
use tracing::warn;

pub struct CsoMetrics {
    pub evaluations_total: IntCounter,
    pub evaluation_failures_total: IntCounter,
    pub generations_total: IntCounter,
    pub trials_total: IntCounter,
    pub evaluation_latency_ms: Histogram,
}

/// Already-registered is fine: the handle still counts. Anything else means
/// the series is missing from the exposition.
fn register<C: Collector + Clone + 'static>(name: &str, collector: &C) -> bool {
    match prometheus::default_registry().register(Box::new(collector.clone())) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => true,
        Err(e) => {
            warn!(metric = name, error = %e, "metric registration failed");
            false
        }
    }
}

fn counter(name: &str, help: &str) -> IntCounter {
    let c = IntCounter::new(name, help).expect("static counter definition");
    register(name, &c);
    c
}

fn histogram(name: &str, help: &str, buckets: Vec<f64>) -> Histogram {
    let h = Histogram::with_opts(HistogramOpts::new(name, help).buckets(buckets)).expect("static histogram definition");
    register(name, &h);
    h
}

pub static CSO_METRICS: Lazy<CsoMetrics> = Lazy::new(|| CsoMetrics {
    evaluations_total: counter("cso_evaluations_total", "Total fitness evaluations issued"),
    evaluation_failures_total: counter("cso_evaluation_failures_total", "Evaluations that errored or returned a non-finite score"),
    generations_total: counter("cso_generations_total", "Completed competition generations"),
    trials_total: counter("cso_trials_total", "Completed independent trials"),
    evaluation_latency_ms: histogram(
        "cso_evaluation_latency_ms",
        "Latency of a single fitness evaluation (ms)",
        vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0],
    ),
});

/// Prometheus text exposition of the default registry.
pub fn render() -> Result<String> {
    Lazy::force(&CSO_METRICS);
    let families = prometheus::default_registry().gather();
    let mut buf = Vec::new();
    TextEncoder::new().encode(&families, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
