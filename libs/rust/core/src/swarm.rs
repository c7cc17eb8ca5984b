//! Per-trial swarm state.
//!
//! A `Swarm` is created fresh for every trial and only mutated by
//! [`crate::competition::advance`].

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::bounds::Bounds;
use crate::error::CsoError;
use crate::evaluator::{score_batch, FitnessEvaluator};
use crate::transfer::{selected_features, Transfer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub mask: Vec<bool>,
    pub fitness: f64,
}

impl Particle {
    pub fn features(&self) -> Vec<usize> { selected_features(&self.mask) }
}

/// Best fitness seen so far in a trial and the subset that scored it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Elite {
    pub fitness: f64,
    pub features: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Swarm {
    particles: Vec<Particle>,
    dim: usize,
    best: Elite,
}

impl Swarm {
    /// Draws `m` positions uniformly inside `bounds`, zero velocities, then
    /// binarizes and scores every particle. For each particle the RNG yields
    /// `dim` position draws followed by `dim` binarization draws.
    pub fn initialize<E, R>(m: usize, bounds: &Bounds, transfer: &Transfer, evaluator: &E, rng: &mut R, parallel: bool) -> Result<Self, CsoError>
    where
        E: FitnessEvaluator + ?Sized,
        R: Rng + ?Sized,
    {
        if m < 2 { return Err(CsoError::config(format!("population size must be at least 2, got {m}"))); }
        let dim = bounds.dim();
        let mut particles = Vec::with_capacity(m);
        for _ in 0..m {
            let position = bounds.sample(rng);
            let mask = transfer.binarize(&position, rng);
            particles.push(Particle { position, velocity: vec![0.0; dim], mask, fitness: f64::INFINITY });
        }
        let jobs: Vec<(usize, Vec<usize>)> = particles.iter().enumerate().map(|(i, p)| (i, p.features())).collect();
        let scores = score_batch(evaluator, &jobs, parallel)?;
        for (p, f) in particles.iter_mut().zip(scores) { p.fitness = f; }

        let best = Self::argmin(&particles).map(|i| Elite { fitness: particles[i].fitness, features: particles[i].features() })
            .ok_or_else(|| CsoError::config("empty swarm"))?;
        debug!(m, dim, best = best.fitness, "swarm initialized");
        Ok(Self { particles, dim, best })
    }

    pub fn len(&self) -> usize { self.particles.len() }
    pub fn is_empty(&self) -> bool { self.particles.is_empty() }
    pub fn dim(&self) -> usize { self.dim }
    pub fn particles(&self) -> &[Particle] { &self.particles }
    pub fn particle(&self, i: usize) -> Option<&Particle> { self.particles.get(i) }
    pub fn best(&self) -> &Elite { &self.best }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] { &mut self.particles }

    /// Mean position across the whole swarm.
    pub fn centroid(&self) -> Vec<f64> {
        let mut c = vec![0.0; self.dim];
        for p in &self.particles {
            for (acc, x) in c.iter_mut().zip(p.position.iter()) { *acc += x; }
        }
        let m = self.particles.len() as f64;
        c.iter_mut().for_each(|x| *x /= m);
        c
    }

    pub fn min_fitness(&self) -> f64 {
        self.particles.iter().map(|p| p.fitness).fold(f64::INFINITY, f64::min)
    }

    /// Replace the elite when some particle strictly improves on it.
    pub(crate) fn refresh_best(&mut self) -> bool {
        match Self::argmin(&self.particles) {
            Some(i) if self.particles[i].fitness < self.best.fitness => {
                self.best = Elite { fitness: self.particles[i].fitness, features: self.particles[i].features() };
                true
            }
            _ => false,
        }
    }

    // lowest index wins ties
    fn argmin(particles: &[Particle]) -> Option<usize> {
        particles.iter().enumerate().fold(None, |acc: Option<(usize, f64)>, (i, p)| match acc {
            Some((_, f)) if f <= p.fitness => acc,
            _ => Some((i, p.fitness)),
        }).map(|(i, _)| i)
    }
}
