//! One CSO generation: random pairing, pairwise competition, loser update.
//!
//! Every random draw of a generation happens in a fixed sequential order
//! before the evaluator is called, so parallel evaluation never changes the
//! outcome under a fixed seed:
//! 1. shuffle of `0..m`
//! 2. for each loser in pair order: `r1`, `r2`, `r3` (`dim` draws each), then
//!    `dim` binarization draws

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::trace;

use crate::bounds::Bounds;
use crate::error::CsoError;
use crate::evaluator::{score_batch, FitnessEvaluator};
use crate::metrics::CSO_METRICS;
use crate::swarm::Swarm;
use crate::transfer::{selected_features, Transfer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pair { pub first: usize, pub second: usize }

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pairing {
    pub pairs: Vec<Pair>,
    /// Unpaired index when `m` is odd; it sits the generation out.
    pub bye: Option<usize>,
}

impl Pairing {
    /// Pairs `order[k]` with `order[k + m/2]`; an odd trailing entry gets the bye.
    pub fn from_order(order: &[usize]) -> Self {
        let half = order.len() / 2;
        let pairs = (0..half).map(|k| Pair { first: order[k], second: order[k + half] }).collect();
        let bye = if order.len() % 2 == 1 { order.last().copied() } else { None };
        Self { pairs, bye }
    }
}

pub fn pair_up<R: Rng + ?Sized>(m: usize, rng: &mut R) -> Pairing {
    let mut order: Vec<usize> = (0..m).collect();
    order.shuffle(rng);
    Pairing::from_order(&order)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bout { pub winner: usize, pub loser: usize }

/// Lower fitness wins; exact ties go to `pair.first`.
pub fn compete(pair: Pair, fitness: impl Fn(usize) -> f64) -> Bout {
    if fitness(pair.first) > fitness(pair.second) {
        Bout { winner: pair.second, loser: pair.first }
    } else {
        Bout { winner: pair.first, loser: pair.second }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateParams<'a> {
    pub phi: f64,
    pub bounds: &'a Bounds,
    pub transfer: Transfer,
    pub parallel_evaluation: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub best_ever: f64,
    pub current_min: f64,
    pub bouts: Vec<Bout>,
    pub bye: Option<usize>,
    pub improved: bool,
}

struct Staged {
    loser: usize,
    position: Vec<f64>,
    velocity: Vec<f64>,
    mask: Vec<bool>,
}

/// Velocity and position update of a single loser, clamped into `bounds`.
/// Returns `(velocity, position)`.
pub fn learn<R: Rng + ?Sized>(
    loser_pos: &[f64],
    loser_vel: &[f64],
    winner_pos: &[f64],
    center: &[f64],
    phi: f64,
    bounds: &Bounds,
    rng: &mut R,
) -> (Vec<f64>, Vec<f64>) {
    let dim = loser_pos.len();
    let r1: Vec<f64> = (0..dim).map(|_| rng.gen::<f64>()).collect();
    let r2: Vec<f64> = (0..dim).map(|_| rng.gen::<f64>()).collect();
    let r3: Vec<f64> = (0..dim).map(|_| rng.gen::<f64>()).collect();
    let velocity: Vec<f64> = (0..dim)
        .map(|d| r1[d] * loser_vel[d] + r2[d] * (winner_pos[d] - loser_pos[d]) + phi * r3[d] * (center[d] - loser_pos[d]))
        .collect();
    let mut position: Vec<f64> = loser_pos.iter().zip(velocity.iter()).map(|(x, v)| x + v).collect();
    bounds.clamp(&mut position);
    (velocity, position)
}

/// Advance the swarm by one generation. Losers are staged and only committed
/// once every one of them has been scored; on error the swarm is unchanged.
pub fn advance<E, R>(swarm: &mut Swarm, params: &UpdateParams<'_>, evaluator: &E, rng: &mut R) -> Result<GenerationReport, CsoError>
where
    E: FitnessEvaluator + ?Sized,
    R: Rng + ?Sized,
{
    let pairing = pair_up(swarm.len(), rng);
    let center = swarm.centroid();
    let particles = swarm.particles();
    let bouts: Vec<Bout> = pairing.pairs.iter().map(|&pair| compete(pair, |i| particles[i].fitness)).collect();

    let mut staged = Vec::with_capacity(bouts.len());
    for bout in &bouts {
        let (w, l) = (&particles[bout.winner], &particles[bout.loser]);
        let (velocity, position) = learn(&l.position, &l.velocity, &w.position, &center, params.phi, params.bounds, rng);
        let mask = params.transfer.binarize(&position, rng);
        staged.push(Staged { loser: bout.loser, position, velocity, mask });
    }

    let jobs: Vec<(usize, Vec<usize>)> = staged.iter().map(|s| (s.loser, selected_features(&s.mask))).collect();
    let scores = score_batch(evaluator, &jobs, params.parallel_evaluation)?;

    let particles = swarm.particles_mut();
    for (s, fitness) in staged.into_iter().zip(scores) {
        let p = &mut particles[s.loser];
        trace!(loser = s.loser, old = p.fitness, new = fitness, "loser moved");
        p.position = s.position;
        p.velocity = s.velocity;
        p.mask = s.mask;
        p.fitness = fitness;
    }
    let improved = swarm.refresh_best();
    CSO_METRICS.generations_total.inc();

    Ok(GenerationReport { best_ever: swarm.best().fitness, current_min: swarm.min_fitness(), bouts, bye: pairing.bye, improved })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn even_pairing_covers_every_index_once() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = pair_up(10, &mut rng);
        assert_eq!(p.pairs.len(), 5);
        assert_eq!(p.bye, None);
        let seen: HashSet<usize> = p.pairs.iter().flat_map(|x| [x.first, x.second]).collect();
        assert_eq!(seen.len(), 10);
        assert!(seen.iter().all(|i| *i < 10));
    }

    #[test]
    fn repeated_pairing_changes_partition() {
        let mut rng = StdRng::seed_from_u64(42);
        let norm = |p: &Pairing| -> HashSet<(usize, usize)> {
            p.pairs.iter().map(|x| (x.first.min(x.second), x.first.max(x.second))).collect()
        };
        let first = norm(&pair_up(50, &mut rng));
        let differs = (0..5).any(|_| norm(&pair_up(50, &mut rng)) != first);
        assert!(differs);
    }

    #[test]
    fn odd_pairing_gives_last_entry_a_bye() {
        let p = Pairing::from_order(&[4, 0, 3, 1, 2]);
        assert_eq!(p.pairs, vec![Pair { first: 4, second: 3 }, Pair { first: 0, second: 1 }]);
        assert_eq!(p.bye, Some(2));
    }

    #[test]
    fn lower_fitness_wins_and_ties_go_to_first() {
        let fit = [3.0, 1.0, 2.0, 2.0];
        let f = |i: usize| fit[i];
        assert_eq!(compete(Pair { first: 0, second: 1 }, f), Bout { winner: 1, loser: 0 });
        assert_eq!(compete(Pair { first: 1, second: 0 }, f), Bout { winner: 1, loser: 0 });
        assert_eq!(compete(Pair { first: 2, second: 3 }, f), Bout { winner: 2, loser: 3 });
        assert_eq!(compete(Pair { first: 3, second: 2 }, f), Bout { winner: 3, loser: 2 });
    }

    #[test]
    fn learn_moves_toward_winner_and_respects_bounds() {
        let bounds = Bounds::uniform(-5.0, 5.0, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let (v, x) = learn(&[0.0, 0.0, 0.0], &[0.0; 3], &[4.0, -4.0, 0.0], &[0.0; 3], 0.1, &bounds, &mut rng);
        assert!(v[0] >= 0.0 && v[1] <= 0.0 && v[2] == 0.0);
        assert!(bounds.contains(&x));

        let (_, clamped) = learn(&[4.9; 3], &[100.0; 3], &[5.0; 3], &[5.0; 3], 0.1, &bounds, &mut rng);
        assert!(clamped.iter().all(|c| *c <= 5.0));
    }
}
