//! Envelope generators and parameter ramps.
//!
//! Provided:
//! - `LinearSmoother` : block-rate target → per-tick linear ramp that lands exactly on target
//! - `DecayEnvelope`  : struck exponential decay (LPG, percussion)
//! - `ArExp`          : exponential attack/release envelope (grains)
//!
//! All envelopes are `no_std` friendly and avoid heap allocations.

use crate::dsp::{clamp, one_pole_coeff_ms};

// -------------------------------- Linear smoother --------------------------------

/// Per-parameter ramp generator.
///
/// The host sets a target once per block with [`set_target`](Self::set_target); the
/// engine pulls one value per tick with [`advance`](Self::advance). After exactly
/// `steps` advances the value equals the target bit for bit, so no residual error
/// accumulates across blocks.
#[derive(Copy, Clone, Debug)]
pub struct LinearSmoother {
    value: f32,
    target: f32,
    step: f32,
    remaining: u32,
    steps: u32,
}

impl LinearSmoother {
    /// `steps == 0` makes every new target take effect immediately.
    #[inline]
    pub fn new(steps: u32) -> Self {
        Self { value: 0.0, target: 0.0, step: 0.0, remaining: 0, steps }
    }

    /// Jump straight to `v` with no ramp in flight.
    #[inline]
    pub fn snap(&mut self, v: f32) {
        self.value = v;
        self.target = v;
        self.step = 0.0;
        self.remaining = 0;
    }

    /// Start a new ramp from the current value towards `v`.
    #[inline]
    pub fn set_target(&mut self, v: f32) {
        self.target = v;
        if self.steps == 0 {
            self.snap(v);
            return;
        }
        self.step = (v - self.value) / self.steps as f32;
        self.remaining = self.steps;
    }

    /// Advance one tick and return the new current value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining == 0 {
                self.value = self.target;
            } else {
                self.value += self.step;
            }
        }
        self.value
    }

    #[inline] pub fn value(&self) -> f32 { self.value }
    #[inline] pub fn target(&self) -> f32 { self.target }
    #[inline] pub fn steps(&self) -> u32 { self.steps }
    #[inline] pub fn is_ramping(&self) -> bool { self.remaining > 0 }
}

// -------------------------------- Decay envelope ---------------------------------

/// Instant-attack exponential decay. `strike()` jumps to 1.0; every tick multiplies
/// by the decay coefficient. Decay time is the ~63% time constant in ms.
#[derive(Copy, Clone, Debug)]
pub struct DecayEnvelope {
    sr: f32,
    coeff: f32,
    env: f32,
}

impl DecayEnvelope {
    #[inline]
    pub fn new(decay_ms: f32, sr: f32) -> Self {
        let mut s = Self { sr: sr.max(1.0), coeff: 0.0, env: 0.0 };
        s.set_decay_ms(decay_ms);
        s
    }

    #[inline]
    pub fn set_decay_ms(&mut self, decay_ms: f32) {
        self.coeff = one_pole_coeff_ms(decay_ms.max(0.05), self.sr);
    }

    #[inline] pub fn strike(&mut self) { self.env = 1.0; }
    #[inline] pub fn reset(&mut self) { self.env = 0.0; }

    #[inline]
    pub fn next(&mut self) -> f32 {
        let v = self.env;
        self.env *= self.coeff;
        if self.env < 1e-6 { self.env = 0.0; }
        v
    }

    #[inline] pub fn value(&self) -> f32 { self.env }
}

// ------------------------------- AR (percussive) ---------------------------------

/// Exponential AR envelope. Attack and release are ms time constants (RC style).
/// Calling `trigger()` restarts from zero.
#[derive(Copy, Clone, Debug)]
pub struct ArExp {
    sr:     f32,
    env:    f32,
    rising: bool,
    a_a:    f32,
    a_r:    f32,
}

impl ArExp {
    #[inline]
    pub fn new(atk_ms: f32, rel_ms: f32, sr: f32) -> Self {
        let mut s = Self { sr: sr.max(1.0), env: 0.0, rising: false, a_a: 0.0, a_r: 0.0 };
        s.set_params(atk_ms, rel_ms);
        s
    }

    #[inline]
    pub fn set_params(&mut self, atk_ms: f32, rel_ms: f32) {
        self.a_a = one_pole_coeff_ms(atk_ms.max(0.0), self.sr);
        self.a_r = one_pole_coeff_ms(rel_ms.max(0.0), self.sr);
    }

    /// Start from 0, go up, then decay.
    #[inline] pub fn trigger(&mut self) { self.env = 0.0; self.rising = true; }
    #[inline] pub fn reset(&mut self) { self.env = 0.0; self.rising = false; }
    #[inline] pub fn is_idle(&self) -> bool { !self.rising && self.env == 0.0 }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.rising {
            self.env += (1.0 - self.env) * (1.0 - self.a_a);
            if self.env >= 0.99 { self.rising = false; }
        } else {
            self.env -= self.env * (1.0 - self.a_r);
            if self.env <= 1e-5 { self.env = 0.0; }
        }
        clamp(self.env, 0.0, 1.0)
    }
}

// ------------------------------------ Tests --------------------------------------
