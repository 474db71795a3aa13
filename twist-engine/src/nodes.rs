//! Building blocks (nodes) for the synthesis models.
//!
//! These are zero-allocation, per-sample components designed for realtime use.
//! Everything here is `Copy` and cheap to move; no locks, no heap.
//!
//! Contents:
//! - `Wave`, `Phasor`  : naive waveforms over a stable wrapping phase
//! - `poly_blep`       : band-limited step residual for saw/square edges
//! - `BlepOsc`         : anti-aliased saw / variable-width pulse
//! - `NoiseSource`     : xorshift white noise
//! - `Dust`            : sparse random impulses
//!
//! Notes:
//! - Frequencies are **normalized** (cycles per sample, `hz / sr`); the models
//!   convert once per render call.
//! - `NoiseSource` keeps `rand` off the per-sample path and reseeds to a fixed
//!   state so engine resets stay reproducible.

use twist_core::dsp::sin01;

/// Naive waveform shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Wave { Sine, Tri, Saw }

/// Sample of `wave` at `phase01` in `[0, 1)`.
#[inline]
pub fn wave_sample(phase01: f32, wave: Wave) -> f32 {
    match wave {
        Wave::Sine => sin01(phase01),
        Wave::Tri  => 4.0 * (phase01 - 0.5).abs() - 1.0,
        Wave::Saw  => 2.0 * phase01 - 1.0,
    }
}

// ---- Phase accumulator ----

/// Wrapping phase in `[0, 1)`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Phasor {
    phase: f32,
}

impl Phasor {
    #[inline] pub fn new() -> Self { Self { phase: 0.0 } }
    #[inline] pub fn phase(&self) -> f32 { self.phase }
    #[inline] pub fn reset(&mut self) { self.phase = 0.0; }

    /// Advance by `inc` cycles and return the phase *before* the step.
    /// Returns `true` in the second slot when the phase wrapped.
    #[inline]
    pub fn tick(&mut self, inc: f32) -> (f32, bool) {
        let p = self.phase;
        self.phase += inc;
        let wrapped = self.phase >= 1.0;
        if wrapped {
            self.phase -= self.phase.floor();
        }
        (p, wrapped)
    }
}

// ---- Band-limited oscillator ----

/// Polynomial band-limited step residual at phase `t` for increment `dt`.
#[inline]
pub fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let x = t / dt;
        x + x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + x + x + 1.0
    } else {
        0.0
    }
}

/// Saw and pulse from one phase, both corrected with `poly_blep`.
#[derive(Copy, Clone, Debug, Default)]
pub struct BlepOsc {
    phasor: Phasor,
}

impl BlepOsc {
    #[inline] pub fn new() -> Self { Self::default() }
    #[inline] pub fn reset(&mut self) { self.phasor.reset(); }
    #[inline] pub fn phase(&self) -> f32 { self.phasor.phase() }

    /// Next saw sample at normalized frequency `f`.
    #[inline]
    pub fn saw(&mut self, f: f32) -> f32 {
        let (t, _) = self.phasor.tick(f);
        2.0 * t - 1.0 - poly_blep(t, f)
    }

    /// Next pulse sample with duty cycle `pw` in `(0, 1)`.
    #[inline]
    pub fn pulse(&mut self, f: f32, pw: f32) -> f32 {
        let pw = pw.clamp(0.02, 0.98);
        let (t, _) = self.phasor.tick(f);
        let naive = if t < pw { 1.0 } else { -1.0 };
        let mut t2 = t + 1.0 - pw;
        if t2 >= 1.0 { t2 -= 1.0; }
        naive + poly_blep(t, f) - poly_blep(t2, f)
    }

    /// Saw (`shape = 0`) to pulse (`shape = 1`) from a single phase advance.
    #[inline]
    pub fn morph(&mut self, f: f32, shape: f32, pw: f32) -> f32 {
        let pw = pw.clamp(0.02, 0.98);
        let (t, _) = self.phasor.tick(f);
        let saw = 2.0 * t - 1.0 - poly_blep(t, f);
        let mut t2 = t + 1.0 - pw;
        if t2 >= 1.0 { t2 -= 1.0; }
        let naive = if t < pw { 1.0 } else { -1.0 };
        let pulse = naive + poly_blep(t, f) - poly_blep(t2, f);
        saw + (pulse - saw) * shape
    }
}

// ---- Noise ----

/// 32-bit xorshift white noise.
#[derive(Copy, Clone, Debug)]
pub struct NoiseSource {
    state: u32,
}

impl NoiseSource {
    /// Zero would lock the generator; it is replaced by a fixed non-zero state.
    #[inline]
    pub fn new(seed: u32) -> Self {
        Self { state: if seed == 0 { 0x9E37_79B9 } else { seed } }
    }

    #[inline]
    pub fn reseed(&mut self, seed: u32) {
        *self = Self::new(seed);
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in `[0, 1)`.
    #[inline]
    pub fn next01(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }

    /// Uniform in `[-1, 1)`.
    #[inline]
    pub fn next11(&mut self) -> f32 {
        2.0 * self.next01() - 1.0
    }
}

/// Random unit impulses at an average `density` per sample.
#[derive(Copy, Clone, Debug)]
pub struct Dust {
    noise: NoiseSource,
}

impl Dust {
    #[inline] pub fn new(seed: u32) -> Self { Self { noise: NoiseSource::new(seed) } }
    #[inline] pub fn reseed(&mut self, seed: u32) { self.noise.reseed(seed); }

    /// Returns a signed impulse with random amplitude in `[-1, 1)`, or 0.
    #[inline]
    pub fn next(&mut self, density: f32) -> f32 {
        let u = self.noise.next01();
        if u < density {
            let a = u / density.max(1e-9);
            2.0 * a - 1.0
        } else {
            0.0
        }
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phasor_wraps_and_reports() {
        let mut p = Phasor::new();
        let mut wraps = 0;
        for _ in 0..100 {
            let (ph, w) = p.tick(0.125);
            assert!((0.0..1.0).contains(&ph));
            wraps += usize::from(w);
        }
        assert_eq!(wraps, 12);
    }

    #[test]
    fn blep_saw_stays_bounded() {
        let mut o = BlepOsc::new();
        for _ in 0..10_000 {
            let s = o.saw(0.05);
            assert!(s.abs() <= 1.01, "{s}");
        }
    }

    #[test]
    fn pulse_averages_to_duty() {
        let mut o = BlepOsc::new();
        let n = 48_000;
        let mean: f32 = (0..n).map(|_| o.pulse(0.01, 0.25)).sum::<f32>() / n as f32;
        // 25% high, 75% low
        assert!((mean + 0.5).abs() < 0.02, "mean={mean}");
    }

    #[test]
    fn noise_is_reproducible_and_centered() {
        let mut a = NoiseSource::new(7);
        let mut b = NoiseSource::new(7);
        let mut sum = 0.0;
        for _ in 0..50_000 {
            let x = a.next11();
            assert_eq!(x, b.next11());
            assert!((-1.0..1.0).contains(&x));
            sum += x;
        }
        assert!((sum / 50_000.0).abs() < 0.02);
    }

    #[test]
    fn dust_density_is_respected() {
        let mut d = Dust::new(3);
        let hits = (0..100_000).filter(|_| d.next(0.01) != 0.0).count();
        assert!((800..1200).contains(&hits), "hits={hits}");
    }
}
