//! Bounded measurement noise for reported temperatures.
//!
//! Two phase-advancing sinusoids give slow, plausible wander; a small
//! uniform jitter from a seeded ChaCha8 stream adds sample-to-sample
//! variation. The generator state is serializable, so a restored model
//! continues the exact same noise sequence.

use pit_core::round_tenth;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

const PHASE_STEP: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseSource {
    phase: f64,
    rng: ChaCha8Rng,
}

impl NoiseSource {
    /// Deterministic noise stream; the starting phase is drawn from the seed.
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let phase = rng.gen::<f64>() * TAU;
        Self { phase, rng }
    }

    /// Noise stream seeded from the thread-local generator.
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Return `value` plus noise of at most `magnitude`, rounded to 0.1.
    /// The two waves and the jitter contribute 0.5, 0.3 and 0.2 of it.
    ///
    /// Advances the phase and consumes one draw from the stream.
    pub fn apply(&mut self, value: f64, magnitude: f64) -> f64 {
        self.phase += PHASE_STEP;
        let jitter = self.rng.gen::<f64>() - 0.5;
        let noise = (self.phase * 7.3).sin() * magnitude * 0.5
            + (self.phase * 13.1).sin() * magnitude * 0.3
            + jitter * magnitude * 0.4;
        round_tenth(value + noise)
    }
}
