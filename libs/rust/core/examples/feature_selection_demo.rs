/// CSO feature-selection demo on a synthetic problem
///
/// Run with: cargo run --example feature_selection_demo

use std::collections::HashSet;

use cso_core::{init_tracing, CompetitiveSwarm, CsoConfig, TracingProgress};

const INFORMATIVE: [usize; 4] = [1, 5, 8, 13];
const DIM: usize = 20;

fn main() -> anyhow::Result<()> {
    init_tracing("cso-demo")?;
    println!("=== CSO Feature Selection Demo ===\n");

    // hidden target subset; every wrong inclusion or omission costs 1
    let goal: HashSet<usize> = INFORMATIVE.iter().copied().collect();
    let eval = |f: &[usize]| {
        let chosen: HashSet<usize> = f.iter().copied().collect();
        chosen.symmetric_difference(&goal).count() as f64
    };

    let cfg = CsoConfig { maxfe: 60, runnum: 5, population: 30, seed: Some(42), parallel_trials: true, ..CsoConfig::default() };
    let opt = CompetitiveSwarm::new(cfg, DIM)?;
    let run = opt.run(&eval, &TracingProgress)?;

    for t in &run.trials {
        println!("  trial {} (seed {}): initial {:.0} -> best {:.0} features {:?}", t.trial, t.seed, t.initial_best, t.best_fitness, t.best_features);
    }
    let s = run.summary();
    println!("\nbest {:.0} worst {:.0} mean {:.2} std {:.2}", s.best, s.worst, s.mean, s.std_dev);
    println!("target features {:?}", INFORMATIVE);
    Ok(())
}
