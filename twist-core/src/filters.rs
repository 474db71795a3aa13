//! Filters: lightweight one-poles and a TPT (state-variable) filter.
//!
//! Goals
//! - `no_std`-friendly, allocation free
//! - Stable under per-sample parameter modulation (the synthesis models sweep these hard)
//!
//! Contents
//! - `OnePoleHP`  : “RC-style” one-pole high-pass
//! - `DcBlock`    : convenience wrapper specialized for DC removal
//! - `SvfMode`    : LP/HP/BP/Notch modes for the SVF
//! - `SvfTpt`     : State-Variable Filter via Topology Preserving Transform
//!
//! Notes
//! - `SvfTpt` uses the trapezoidal-integrator form with `g = tan(π fc / sr)` and `k = 1/Q`;
//!   coefficients can be set directly in normalized frequency (`f = fc / sr`) with
//!   [`SvfTpt::set_f_q`], which is what the synthesis models do per sample.

use crate::dsp::{kill_denormals, one_pole_coeff_hz, tpt_g};

/// One-pole high-pass using the standard “leaky integrator” form:
///
/// `y[n] = x[n] - x[n-1] + b * y[n-1]`, with `b = exp(-2π fc / sr)`.
#[derive(Copy, Clone, Debug)]
pub struct OnePoleHP {
    b: f32,
    x1: f32,
    y1: f32,
    sr: f32,
    fc: f32,
}

impl OnePoleHP {
    #[inline]
    pub fn new(cut_hz: f32, sr: f32) -> Self {
        let mut s = Self {
            b: 0.0,
            x1: 0.0,
            y1: 0.0,
            sr: sr.max(1.0),
            fc: cut_hz.max(0.0),
        };
        s.update_coeffs();
        s
    }

    #[inline] pub fn set_cutoff_hz(&mut self, cut_hz: f32) { self.fc = cut_hz.max(0.0); self.update_coeffs(); }

    #[inline]
    fn update_coeffs(&mut self) {
        self.b = one_pole_coeff_hz(self.fc, self.sr);
    }

    #[inline] pub fn reset(&mut self) { self.x1 = 0.0; self.y1 = 0.0; }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = kill_denormals(x - self.x1 + self.b * self.y1);
        self.x1 = x;
        self.y1 = y;
        y
    }
}

/// Convenience DC blocker: a high-pass with a very low cutoff (e.g., 5–30 Hz).
#[derive(Copy, Clone, Debug)]
pub struct DcBlock {
    hp: OnePoleHP,
}

impl DcBlock {
    /// `cut_hz` default recommendation: 20 Hz.
    #[inline]
    pub fn new(cut_hz: f32, sr: f32) -> Self {
        Self { hp: OnePoleHP::new(cut_hz, sr) }
    }

    #[inline] pub fn reset(&mut self) { self.hp.reset(); }
    #[inline] pub fn process(&mut self, x: f32) -> f32 { self.hp.process(x) }
}

/// SVF output tap selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SvfMode {
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
}

/// All four SVF taps from one tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct SvfTaps {
    pub lp: f32,
    pub bp: f32,
    pub hp: f32,
    pub notch: f32,
}

/// Topology-Preserving Transform SVF (State-Variable Filter).
///
/// Internals:
/// - `g = tan(π fc / sr)`, `k = 1 / Q`
/// - `a1 = 1 / (1 + g (g + k))`, `a2 = g a1`, `a3 = g a2`
#[derive(Copy, Clone, Debug)]
pub struct SvfTpt {
    g: f32,
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,
    ic1eq: f32,
    ic2eq: f32,
}

impl Default for SvfTpt {
    fn default() -> Self {
        let mut s = Self { g: 0.0, k: 2.0, a1: 0.0, a2: 0.0, a3: 0.0, ic1eq: 0.0, ic2eq: 0.0 };
        s.set_f_q(0.01, 0.707);
        s
    }
}

impl SvfTpt {
    #[inline]
    pub fn new(cut_hz: f32, q: f32, sr: f32) -> Self {
        let mut s = Self::default();
        s.set_hz_q(cut_hz, q, sr);
        s
    }

    /// Set cutoff in Hz and resonance.
    #[inline]
    pub fn set_hz_q(&mut self, cut_hz: f32, q: f32, sr: f32) {
        self.g = tpt_g(cut_hz, sr.max(1.0));
        self.k = 1.0 / q.max(1e-4);
        self.recalc();
    }

    /// Set normalized cutoff (`fc / sr`, clamped below Nyquist) and resonance.
    #[inline]
    pub fn set_f_q(&mut self, f: f32, q: f32) {
        self.g = tpt_g(f, 1.0);
        self.k = 1.0 / q.max(1e-4);
        self.recalc();
    }

    #[inline]
    fn recalc(&mut self) {
        self.a1 = 1.0 / (1.0 + self.g * (self.g + self.k));
        self.a2 = self.g * self.a1;
        self.a3 = self.g * self.a2;
    }

    #[inline]
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    /// Process one sample and return every tap.
    #[inline]
    pub fn process_all(&mut self, x: f32) -> SvfTaps {
        let v3 = x - self.ic2eq;
        let v1 = self.a1 * self.ic1eq + self.a2 * v3;
        let v2 = self.ic2eq + self.a2 * self.ic1eq + self.a3 * v3;
        self.ic1eq = kill_denormals(2.0 * v1 - self.ic1eq);
        self.ic2eq = kill_denormals(2.0 * v2 - self.ic2eq);

        let hp = x - self.k * v1 - v2;
        SvfTaps { lp: v2, bp: v1, hp, notch: hp + v2 }
    }

    /// Process one sample, returning only the mode requested.
    #[inline]
    pub fn process(&mut self, x: f32, mode: SvfMode) -> f32 {
        let t = self.process_all(x);
        match mode {
            SvfMode::Lowpass => t.lp,
            SvfMode::Highpass => t.hp,
            SvfMode::Bandpass => t.bp,
            SvfMode::Notch => t.notch,
        }
    }

    #[inline] pub fn process_lp(&mut self, x: f32) -> f32 { self.process(x, SvfMode::Lowpass) }
    #[inline] pub fn process_hp(&mut self, x: f32) -> f32 { self.process(x, SvfMode::Highpass) }
    #[inline] pub fn process_bp(&mut self, x: f32) -> f32 { self.process(x, SvfMode::Bandpass) }
}

// ------------------------------------ Tests --------------------------------------
