//! The sixteen synthesis models behind [`Voice`](crate::voice::Voice).
//!
//! Families:
//! - [`oscillators`] : 0 Waveforms, 1 Waveshaper, 2 2-Operator FM, 3 Formant/PD
//! - [`spectral`]    : 4 Harmonic, 5 Wavetable, 6 Chords, 7 Vowels/Speech
//! - [`noise`]       : 8 Granular Cloud, 9 Filtered Noise, 10 Particle Noise
//! - [`physical`]    : 11 Inharmonic String, 12 Modal Resonator
//! - [`drums`]       : 13 Analog Kick, 14 Analog Snare, 15 Analog Hi-Hat
//!
//! Every model reads the same three macro controls (`harmonics`, `timbre`,
//! `morph`, all in `[0, 1]`) and writes a main and an auxiliary signal.

use twist_core::arena::ScratchArena;

use crate::catalog::ENGINE_NAMES;
use crate::engine::Frame;

pub mod drums;
pub mod noise;
pub mod oscillators;
pub mod physical;
pub mod spectral;

/// Highest normalized frequency any oscillator or filter is driven at.
pub const MAX_F: f32 = 0.45;
/// Lowest normalized frequency (~0.05 Hz at 48 kHz).
pub const MIN_F: f32 = 1.0e-6;

/// Per-render model inputs, derived once from the patch.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelParams {
    /// Pitch in semitones, FM included.
    pub note: f32,
    /// Fundamental as cycles per sample, in `[MIN_F, MAX_F]`.
    pub f0: f32,
    pub harmonics: f32,
    pub timbre: f32,
    pub morph: f32,
    pub sample_rate: f32,
}

impl ModelParams {
    /// `f0` scaled by `ratio`, kept inside the usable band.
    #[inline]
    pub fn scaled(&self, ratio: f32) -> f32 {
        (self.f0 * ratio).clamp(MIN_F, MAX_F)
    }
}

/// One synthesis algorithm.
pub trait Model {
    /// Back to the post-construction state; arena regions owned by the model
    /// have already been zeroed.
    fn reset(&mut self, arena: &mut ScratchArena);

    /// Excite the model (rising trigger edge or voice reset). No-op for models
    /// that free-run.
    fn strike(&mut self) {}

    fn render(&mut self, p: &ModelParams, arena: &mut ScratchArena, frames: &mut [Frame]);
}

/// Engine selector, in catalog order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Waveforms,
    Waveshaper,
    Fm2,
    Formant,
    Harmonic,
    Wavetable,
    Chords,
    Vowels,
    Granular,
    FilteredNoise,
    Particle,
    String,
    Modal,
    Kick,
    Snare,
    HiHat,
}

impl EngineKind {
    pub const ALL: [EngineKind; 16] = [
        Self::Waveforms,
        Self::Waveshaper,
        Self::Fm2,
        Self::Formant,
        Self::Harmonic,
        Self::Wavetable,
        Self::Chords,
        Self::Vowels,
        Self::Granular,
        Self::FilteredNoise,
        Self::Particle,
        Self::String,
        Self::Modal,
        Self::Kick,
        Self::Snare,
        Self::HiHat,
    ];

    /// Out-of-range indices clamp to the nearest model.
    #[inline]
    pub fn from_index(index: i32) -> Self {
        let last = Self::ALL.len() - 1;
        Self::ALL[usize::try_from(index.max(0)).unwrap_or(0).min(last)]
    }

    #[inline] pub fn index(self) -> usize { self as usize }
    #[inline] pub fn name(self) -> &'static str { ENGINE_NAMES[self.index()] }

    /// Models excited by a strike (reset and rising trigger edges).
    #[inline]
    pub fn is_struck(self) -> bool {
        self.index() >= Self::String.index()
    }

    /// Drum models carry their own envelope and skip the low-pass gate.
    #[inline]
    pub fn bypasses_lpg(self) -> bool {
        self.index() >= Self::Kick.index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_and_clamps() {
        for (i, k) in EngineKind::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
            assert_eq!(EngineKind::from_index(i as i32), *k);
        }
        assert_eq!(EngineKind::from_index(-4), EngineKind::Waveforms);
        assert_eq!(EngineKind::from_index(99), EngineKind::HiHat);
        assert_eq!(EngineKind::HiHat.name(), "Analog Hi-Hat");
    }

    #[test]
    fn strike_and_gate_groups() {
        let struck: Vec<usize> = EngineKind::ALL.iter().filter(|k| k.is_struck()).map(|k| k.index()).collect();
        assert_eq!(struck, [11, 12, 13, 14, 15]);
        let own_env: Vec<usize> = EngineKind::ALL.iter().filter(|k| k.bypasses_lpg()).map(|k| k.index()).collect();
        assert_eq!(own_env, [13, 14, 15]);
    }
}
