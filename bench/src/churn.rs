//! A seeded mix of entity creates and destroys, used to fragment colonies before iterating.

use colony_ecs::ecs::{Entity, Registry};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::components::{Health, Position, Velocity};

/// Configuration for a churn run.
#[derive(Debug, Clone)]
pub struct ChurnConfig {
    /// Entities alive after warm-up.
    pub population: usize,
    /// Create/destroy steps to run.
    pub steps: usize,
    /// Chance in `[0, 1]` that a step destroys rather than creates.
    pub destroy_ratio: f64,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            population: 10_000,
            steps: 10_000,
            destroy_ratio: 0.5,
            seed: 12345,
        }
    }
}

/// A registry driven by a deterministic create/destroy sequence.
pub struct Churn {
    config: ChurnConfig,
    rng: ChaCha8Rng,
    registry: Registry,
    alive: Vec<Entity>,
}

impl Churn {
    pub fn new(config: ChurnConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            registry: Registry::new(),
            alive: Vec::new(),
        }
    }

    /// Fill the registry up to the configured population.
    pub fn warm_up(&mut self) {
        while self.alive.len() < self.config.population {
            self.spawn();
        }
    }

    /// Run the configured number of steps.
    pub fn run(&mut self) {
        for _ in 0..self.config.steps {
            if !self.alive.is_empty() && self.rng.gen_bool(self.config.destroy_ratio) {
                let victim = self.rng.gen_range(0..self.alive.len());
                let entity = self.alive.swap_remove(victim);
                let _ = self.registry.destroy(entity);
            } else {
                self.spawn();
            }
        }
    }

    #[inline]
    pub fn registry(&mut self) -> &mut Registry {
        &mut self.registry
    }

    #[inline]
    pub fn alive(&self) -> usize {
        self.alive.len()
    }

    fn spawn(&mut self) {
        let position = Position {
            x: self.rng.gen_range(-100.0..100.0),
            y: self.rng.gen_range(-100.0..100.0),
            z: 0.0,
        };
        let created = if self.rng.gen_bool(0.5) {
            self.registry.create((position, Velocity::default()))
        } else {
            self.registry.create((position, Velocity::default(), Health::default()))
        };
        if let Ok(entity) = created {
            self.alive.push(entity);
        }
    }
}
