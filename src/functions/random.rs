use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Source of random numbers for `rnd()` and `rndg()`.
pub trait RandomSource: Send + Sync {
    /// Uniform draw from `[low, high)`.
    fn uniform(&self, low: f64, high: f64) -> f64;

    /// Normal draw with the given mean and standard deviation.
    fn gaussian(&self, mean: f64, stddev: f64) -> f64;
}

/// `RandomSource` backed by a `StdRng`.
#[derive(Debug)]
pub struct StdRandom {
    rng: Mutex<StdRng>,
}

impl StdRandom {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for StdRandom {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        low + rng.random::<f64>() * (high - low)
    }

    fn gaussian(&self, mean: f64, stddev: f64) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let z: f64 = StandardNormal.sample(&mut *rng);
        mean + stddev * z
    }
}
