//! services/random_source.rs

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::dispatcher_config::DelayRange;

/// Aleatoriedad de la simulación, inyectable para tests.
pub trait RandomSource: Send + Sync {
    /// Milisegundos dentro de `range` (extremos incluidos).
    fn delay_ms(&self, range: DelayRange) -> u64;

    /// `true` con probabilidad `probability`.
    fn chance(&self, probability: f64) -> bool;
}

fn sample_delay<R: Rng>(rng: &mut R, range: DelayRange) -> u64 {
    if range.max_ms <= range.min_ms {
        return range.min_ms;
    }
    rng.random_range(range.min_ms..=range.max_ms)
}

fn sample_chance<R: Rng>(rng: &mut R, probability: f64) -> bool {
    if probability.is_nan() {
        return false;
    }
    rng.random_bool(probability.clamp(0.0, 1.0))
}

/// Usa el generador thread-local de `rand`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn delay_ms(&self, range: DelayRange) -> u64 {
        sample_delay(&mut rand::rng(), range)
    }

    fn chance(&self, probability: f64) -> bool {
        sample_chance(&mut rand::rng(), probability)
    }
}

/// Generador con semilla fija, para demos reproducibles.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn delay_ms(&self, range: DelayRange) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        sample_delay(&mut *rng, range)
    }

    fn chance(&self, probability: f64) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        sample_chance(&mut *rng, probability)
    }
}
