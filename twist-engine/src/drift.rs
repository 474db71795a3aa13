//! Slow random pitch drift.
//!
//! A leaky random walk, normalized so its long-run spread is about one unit;
//! the pipeline scales it by the host's drift amount (in semitones). The walk
//! starts from a per-note seed drawn at initialization and is ticked once per
//! native sub-block while the note plays. It owns its random source, so the
//! walk depends only on what it was reset with.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Leak per tick; also the step size of the walk.
const LEAK: f32 = 1.0e-5;

#[derive(Clone, Debug)]
pub struct DriftLfo {
    seed: f32,
    state: f32,
    value: f32,
    rng: StdRng,
}

impl Default for DriftLfo {
    fn default() -> Self {
        Self { seed: 0.0, state: 0.0, value: 0.0, rng: StdRng::seed_from_u64(Self::FIXED_STREAM) }
    }
}

impl DriftLfo {
    /// Largest seed `initialize` draws.
    pub const MAX_SEED: f32 = 0.0005;

    /// Step stream used when a note asks for a reproducible walk.
    pub const FIXED_STREAM: u64 = 0x7715_7d21;

    /// Restart the walk from `seed`, with steps drawn from stream `stream`.
    /// The output is zero until the next tick.
    pub fn reset(&mut self, seed: f32, stream: u64) {
        self.seed = seed;
        self.state = seed;
        self.value = 0.0;
        self.rng = StdRng::seed_from_u64(stream);
    }

    /// One walk step; returns the new normalized value.
    #[inline]
    pub fn tick(&mut self) -> f32 {
        let step: f32 = self.rng.gen_range(-1.0..1.0);
        self.state = self.state * (1.0 - LEAK) + step * LEAK;
        self.value = self.state / LEAK.sqrt();
        self.value
    }

    #[inline] pub fn value(&self) -> f32 { self.value }
    #[inline] pub fn seed(&self) -> f32 { self.seed }
}
