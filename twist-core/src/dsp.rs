//! Generic DSP utilities and math helpers.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Optional `fast-math` approximations for hot paths
//! - Side-effect free helpers that are easy to test
//!
//! Conventions:
//! - All functions are `#[inline]` where useful to help the optimizer.
//! - Pitch is expressed as a linear "note" value (MIDI note numbers, fractional allowed).

#![allow(clippy::excessive_precision)]

use core::f32::consts::PI;

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // libm (C math) in no_std
    if #[cfg(feature = "no-std")] {
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { libm::sinf(x) }
        #[inline] pub(crate) fn m_exp(x: f32) -> f32 { libm::expf(x) }
        #[inline] pub(crate) fn m_exp2(x: f32) -> f32 { libm::exp2f(x) }
        #[inline] pub(crate) fn m_tanh(x: f32) -> f32 { libm::tanhf(x) }
        #[inline] pub(crate) fn m_tan(x: f32) -> f32 { libm::tanf(x) }
        #[inline] pub(crate) fn m_exp2_f64(x: f64) -> f64 { libm::exp2(x) }
    // std backend
    } else {
        #[inline] pub(crate) fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] pub(crate) fn m_exp(x: f32) -> f32 { x.exp() }
        #[inline] pub(crate) fn m_exp2(x: f32) -> f32 { x.exp2() }
        #[inline] pub(crate) fn m_tanh(x: f32) -> f32 { x.tanh() }
        #[inline] pub(crate) fn m_tan(x: f32) -> f32 { x.tan() }
        #[inline] pub(crate) fn m_exp2_f64(x: f64) -> f64 { x.exp2() }
    }
}

// --------------------------------- Constants -------------------------------------

/// 2π (commonly useful)
pub const TAU: f32 = 2.0 * PI;

/// A very small epsilon used in denormal handling and safe divisions.
pub const EPS_SMALL: f32 = 1.0e-20;

/// Frequency of MIDI note 0 in Hz (A4 = 440 Hz, 12-TET).
pub const MIDI_0_FREQ: f64 = 8.175_798_915_643_707;

// --------------------------------- Utilities -------------------------------------

#[inline]
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    if x < lo { lo } else if x > hi { hi } else { x }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// `floor` that needs no math backend; saturates outside the `i32` range.
#[inline]
pub fn floor_to_i32(x: f32) -> i32 {
    let i = x as i32;
    if (i as f32) > x { i - 1 } else { i }
}

/// Wrap phase into [0, 1).
#[inline]
pub fn wrap_phase01(p: f32) -> f32 {
    let w = p - floor_to_i32(p) as f32;
    if w >= 1.0 { w - 1.0 } else { w }
}

/// Kill denormal/subnormal values. Returns 0.0 if |x| < EPS_SMALL.
#[inline]
pub fn kill_denormals(x: f32) -> f32 {
    if x.abs() < EPS_SMALL { 0.0 } else { x }
}

// --------------------------------- Pitch -----------------------------------------

/// Frequency ratio of an interval given in semitones: `2^(st/12)`.
#[inline]
pub fn semitones_to_ratio(st: f32) -> f32 {
    m_exp2(st / 12.0)
}

/// Note number to Hz (12-TET, MIDI 0 at [`MIDI_0_FREQ`]).
#[inline]
pub fn note_to_hz(note: f64) -> f64 {
    MIDI_0_FREQ * m_exp2_f64(note / 12.0)
}

/// Per-sample phase increment (cycles/sample) of `note` at sample rate `sr`.
#[inline]
pub fn note_to_phase_increment(note: f64, sr: f64) -> f64 {
    note_to_hz(note) / sr
}

// --------------------------------- Fast trig -------------------------------------

/// Sine of a phase given in cycles (`sin(2π·phase01)`).
///
/// With `fast-math` this uses a 5th-order odd polynomial after range reduction
/// (max abs error ~1e-4); otherwise the backend sine.
#[inline]
pub fn sin01(phase01: f32) -> f32 {
    if cfg!(feature = "fast-math") {
        // reduce to [-0.25, 0.25] cycles by symmetry, then to radians
        let mut p = wrap_phase01(phase01 + 0.5) - 0.5;
        if p > 0.25 {
            p = 0.5 - p;
        } else if p < -0.25 {
            p = -0.5 - p;
        }
        let x = p * TAU;
        let x2 = x * x;
        x * (0.999_979_313_3 + x2 * (-0.166_624_432_0 + x2 * 0.008_308_978_98))
    } else {
        m_sin(phase01 * TAU)
    }
}

// --------------------------------- Nonlinearities --------------------------------

/// Soft clip via tanh. If `fast-math` is enabled, uses a stable rational approximation.
///
/// Approximation used when `fast-math`:
/// `tanh(x) ≈ x * (27 + x^2) / (27 + 9 x^2)`
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    if cfg!(feature = "fast-math") {
        let x = clamp(x, -3.0, 3.0);
        let x2 = x * x;
        x * (27.0 + x2) / (27.0 + 9.0 * x2)
    } else {
        m_tanh(x)
    }
}

/// Drive + soft saturation helper: `tanh(drive * x)` (or fast approx).
#[inline]
pub fn saturate(x: f32, drive: f32) -> f32 {
    soft_clip(x * drive)
}

/// Sine wavefolder: folds `x` back into [-1, 1] smoothly.
#[inline]
pub fn fold(x: f32) -> f32 {
    m_sin(x * 0.5 * PI)
}

// --------------------------------- Exponentials / smoothing ----------------------

/// One-pole smoothing coefficient for a time constant `t_ms` (milliseconds).
///
/// The discrete one-pole form: `y[n] += (1 - a) * (x[n] - y[n])`
/// where `a = exp(-1/(tau * sr))`.
#[inline]
pub fn one_pole_coeff_ms(t_ms: f32, sr: f32) -> f32 {
    if t_ms <= 0.0 { return 0.0; }
    let tau = t_ms * 0.001;
    m_exp(-1.0 / (tau * sr))
}

/// `exp(-2π fc / sr)` for the RC-style one-pole filters in [`crate::filters`].
#[inline]
pub fn one_pole_coeff_hz(cut_hz: f32, sr: f32) -> f32 {
    let fc = cut_hz.max(0.0).min(0.499 * sr);
    m_exp(-2.0 * PI * fc / sr)
}

/// TPT (Topology-Preserving Transform) `g = tan(π fc / sr)` helper for state-variable filters.
/// The cutoff is kept just below Nyquist so `g` stays finite.
#[inline]
pub fn tpt_g(cut_hz: f32, sr: f32) -> f32 {
    let fc = clamp(cut_hz, 0.0, 0.497 * sr);
    m_tan(PI * (fc / sr))
}

// --------------------------------- Tests (std only) ------------------------------
