/// Replays a seeded m=4, n=2 generation by hand and checks the optimizer
/// produced the same winners, losers and updated positions, then pins the
/// literal values for that seed so a change in the `rand` streams shows up.
///
/// Run with: cargo test --test pinned_generation

use cso_core::{advance, sigmoid, Bout, Bounds, Swarm, Transfer, UpdateParams};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const SEED: u64 = 20_180_811;
const PHI: f64 = 0.1;

fn index_sum(f: &[usize]) -> f64 { f.iter().sum::<usize>() as f64 }

fn replay_mask(position: &[f64], rng: &mut StdRng) -> Vec<bool> {
    position.iter().map(|&x| sigmoid(x, 1.0, 0.0) > rng.gen::<f64>()).collect()
}

fn mask_fitness(mask: &[bool]) -> f64 {
    mask.iter().enumerate().filter(|(_, on)| **on).map(|(d, _)| d).sum::<usize>() as f64
}

#[test]
fn one_generation_matches_hand_replay() {
    let bounds = Bounds::uniform(-5.0, 5.0, 2).unwrap();
    let transfer = Transfer::default();
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut swarm = Swarm::initialize(4, &bounds, &transfer, &index_sum, &mut rng, false).unwrap();

    // initialization: per particle two position draws then two mask draws
    let mut replay = StdRng::seed_from_u64(SEED);
    let mut pos: Vec<Vec<f64>> = Vec::new();
    let mut fit: Vec<f64> = Vec::new();
    for i in 0..4 {
        let x: Vec<f64> = (0..2).map(|_| -5.0 + 10.0 * replay.gen::<f64>()).collect();
        let mask = replay_mask(&x, &mut replay);
        let p = swarm.particle(i).unwrap();
        assert_eq!(p.position, x);
        assert_eq!(p.mask, mask);
        assert_eq!(p.fitness, mask_fitness(&mask));
        assert_eq!(p.velocity, vec![0.0, 0.0]);
        fit.push(mask_fitness(&mask));
        pos.push(x);
    }
    let before = swarm.particles().to_vec();

    let params = UpdateParams { phi: PHI, bounds: &bounds, transfer, parallel_evaluation: false };
    let report = advance(&mut swarm, &params, &index_sum, &mut rng).unwrap();

    let mut order: Vec<usize> = (0..4).collect();
    order.shuffle(&mut replay);
    let pairs = [(order[0], order[2]), (order[1], order[3])];
    let expected_bouts: Vec<Bout> = pairs.iter()
        .map(|&(a, b)| if fit[a] > fit[b] { Bout { winner: b, loser: a } } else { Bout { winner: a, loser: b } })
        .collect();
    assert_eq!(report.bouts, expected_bouts);
    assert_eq!(report.bye, None);

    let center: Vec<f64> = (0..2).map(|d| pos.iter().map(|x| x[d]).sum::<f64>() / 4.0).collect();
    let mut fit_after = fit.clone();
    for bout in &expected_bouts {
        let (w, l) = (bout.winner, bout.loser);
        let r1: Vec<f64> = (0..2).map(|_| replay.gen::<f64>()).collect();
        let r2: Vec<f64> = (0..2).map(|_| replay.gen::<f64>()).collect();
        let r3: Vec<f64> = (0..2).map(|_| replay.gen::<f64>()).collect();
        // velocities start at zero so the inertia term vanishes
        let v: Vec<f64> = (0..2).map(|d| r1[d] * 0.0 + r2[d] * (pos[w][d] - pos[l][d]) + PHI * r3[d] * (center[d] - pos[l][d])).collect();
        let x: Vec<f64> = (0..2).map(|d| (pos[l][d] + v[d]).clamp(-5.0, 5.0)).collect();
        let mask = replay_mask(&x, &mut replay);

        let moved = swarm.particle(l).unwrap();
        for d in 0..2 {
            assert!((moved.velocity[d] - v[d]).abs() < 1e-12, "velocity[{d}] of loser {l}");
            assert!((moved.position[d] - x[d]).abs() < 1e-12, "position[{d}] of loser {l}");
        }
        assert_eq!(moved.mask, mask);
        assert_eq!(moved.fitness, mask_fitness(&mask));
        fit_after[l] = mask_fitness(&mask);

        assert_eq!(swarm.particle(w).unwrap(), &before[w], "winner {w} must not move");
    }

    let expected_min = fit_after.iter().copied().fold(f64::INFINITY, f64::min);
    let initial_min = fit.iter().copied().fold(f64::INFINITY, f64::min);
    assert_eq!(report.current_min, expected_min);
    assert_eq!(report.best_ever, expected_min.min(initial_min));

    // both streams consumed exactly the same number of draws
    assert_eq!(rng.gen::<u64>(), replay.gen::<u64>());
}

fn close(a: &[f64], b: &[f64]) -> bool { a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12) }

#[test]
fn seeded_generation_literal_values() {
    let bounds = Bounds::uniform(-5.0, 5.0, 2).unwrap();
    let transfer = Transfer::default();
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut swarm = Swarm::initialize(4, &bounds, &transfer, &index_sum, &mut rng, false).unwrap();

    let initial = [
        [-0.529577561241803, -0.7377949462273516],
        [-4.8499835573239425, 1.2630393410635286],
        [1.0823160781687786, 1.88680615622384],
        [0.7991197923354125, -0.5551090987583409],
    ];
    for (i, x) in initial.iter().enumerate() {
        assert!(close(&swarm.particle(i).unwrap().position, x), "initial position of {i}");
    }
    let masks: Vec<Vec<bool>> = swarm.particles().iter().map(|p| p.mask.clone()).collect();
    assert_eq!(masks, vec![vec![false, false], vec![false, true], vec![true, true], vec![false, true]]);
    assert_eq!(swarm.best().fitness, 0.0);

    let params = UpdateParams { phi: PHI, bounds: &bounds, transfer, parallel_evaluation: false };
    let report = advance(&mut swarm, &params, &index_sum, &mut rng).unwrap();
    // shuffled order [3, 2, 0, 1]: 0 beats 3 outright, 2 keeps its tie with 1
    assert_eq!(report.bouts, vec![Bout { winner: 0, loser: 3 }, Bout { winner: 2, loser: 1 }]);

    let moved = swarm.particle(3).unwrap();
    assert!(close(&moved.velocity, &[-0.6938606680004246, -0.001794837247131753]));
    assert!(close(&moved.position, &[0.10525912433498796, -0.5569039360054726]));
    assert_eq!(moved.mask, vec![false, false]);
    let moved = swarm.particle(1).unwrap();
    assert!(close(&moved.position, &[-4.37816288284036, 1.3143942740340286]));
    assert_eq!(moved.fitness, 1.0);
    assert_eq!((report.current_min, report.best_ever), (0.0, 0.0));
}
