//! Configuration of one oscillator pipeline.
//!
//! [`PipelineConfig`] is fixed for the lifetime of a voice: rates, sub-block and
//! resampler chunk sizes, ramp length, pre-roll floor, arena size and resampler quality. Hosts usually
//! build one and hand a clone to every voice. [`Controls`] is the per-block
//! control snapshot.

use rubato::{SincInterpolationParameters, SincInterpolationType, WindowFunction};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TwistError};
use crate::voice;

/// Sinc resampler presets, from cheapest to cleanest.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResamplerQuality {
    Fast,
    #[default]
    Medium,
    Best,
}

impl ResamplerQuality {
    pub fn sinc_parameters(self) -> SincInterpolationParameters {
        let (sinc_len, oversampling_factor, interpolation, window) = match self {
            Self::Fast => (32, 64, SincInterpolationType::Linear, WindowFunction::Hann2),
            Self::Medium => (64, 128, SincInterpolationType::Cubic, WindowFunction::BlackmanHarris2),
            Self::Best => (128, 256, SincInterpolationType::Cubic, WindowFunction::BlackmanHarris2),
        };
        SincInterpolationParameters {
            sinc_len,
            f_cutoff: 0.95,
            interpolation,
            oversampling_factor,
            window,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fixed rate the synthesis engine runs at (Hz).
    pub native_rate: f64,
    /// Host's internal (oversampled) processing rate (Hz).
    pub target_rate: f64,
    /// Native frames rendered per engine call.
    pub sub_block: usize,
    /// Native frames the resampler consumes per call. Need not divide or match
    /// `sub_block`; leftovers wait for the next call.
    pub resampler_chunk: usize,
    /// Engine ticks a parameter ramp takes to reach a new target.
    pub smoothing_steps: u32,
    /// Shortest pre-roll, in native samples; short cycles are doubled up to it.
    pub min_cycle_samples: f64,
    /// Engine scratch memory, in samples.
    pub arena_len: usize,
    pub quality: ResamplerQuality,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            native_rate: 48_000.0,
            target_rate: 96_000.0,
            sub_block: 4,
            resampler_chunk: 4,
            smoothing_steps: 8,
            min_cycle_samples: 10.0,
            arena_len: voice::ARENA_LEN,
            quality: ResamplerQuality::Medium,
        }
    }
}

impl PipelineConfig {
    /// Default config targeting `target_rate`.
    pub fn with_target_rate(target_rate: f64) -> Self {
        Self { target_rate, ..Self::default() }
    }

    /// Output frames per native frame.
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.target_rate / self.native_rate
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.ratio();
        if !(ratio.is_finite() && ratio > 0.0) || !(self.native_rate > 0.0) {
            return Err(TwistError::InvalidRatio(ratio));
        }
        if self.sub_block == 0 || self.sub_block > 256 {
            return Err(TwistError::Config(format!("sub_block must be in 1..=256, got {}", self.sub_block)));
        }
        if self.resampler_chunk == 0 || self.resampler_chunk > 1024 {
            return Err(TwistError::Config(format!(
                "resampler_chunk must be in 1..=1024, got {}",
                self.resampler_chunk
            )));
        }
        if !(self.min_cycle_samples.is_finite() && self.min_cycle_samples >= 1.0) {
            return Err(TwistError::Config(format!(
                "min_cycle_samples must be >= 1, got {}",
                self.min_cycle_samples
            )));
        }
        Ok(())
    }
}

// ---- Controls ----

/// Host-side snapshot of the control slots (see [`CONTROL_SLOTS`](crate::catalog::CONTROL_SLOTS)).
///
/// `harmonics`, `timbre` and `morph` are bipolar (`[-1, 1]`), the rest unipolar.
/// `lpg_response: None` means the low-pass gate is switched off and the voice
/// free-runs regardless of the note gate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    pub engine: i32,
    pub harmonics: f32,
    pub timbre: f32,
    pub morph: f32,
    pub aux_mix: f32,
    pub lpg_response: Option<f32>,
    pub lpg_decay: f32,
    /// Skip the random pre-roll jitter so every note starts identically.
    pub retrigger: bool,
}

impl Controls {
    /// Bipolar control value mapped onto the engine's `[0, 1]` range.
    #[inline]
    pub fn unipolar(bipolar: f32) -> f32 {
        (0.5 * (bipolar + 1.0)).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn lpg_enabled(&self) -> bool {
        self.lpg_response.is_some()
    }
}

// ------------------------------------ Tests --------------------------------------
