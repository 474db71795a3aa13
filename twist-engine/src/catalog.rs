//! Engine catalog and control-slot descriptors.
//!
//! Both tables are static and ordered; hosts index them, never mutate them.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Display names of the sixteen synthesis models, by engine index.
pub const ENGINE_NAMES: [&str; 16] = [
    "Waveforms",
    "Waveshaper",
    "2-Operator FM",
    "Formant/PD",
    "Harmonic",
    "Wavetable",
    "Chords",
    "Vowels/Speech",
    "Granular Cloud",
    "Filtered Noise",
    "Particle Noise",
    "Inharmonic String",
    "Modal Resonator",
    "Analog Kick",
    "Analog Snare",
    "Analog Hi-Hat",
];

/// Name of engine `index`, or `"Error <index>"` when out of range.
pub fn engine_name(index: i32) -> Cow<'static, str> {
    usize::try_from(index)
        .ok()
        .and_then(|i| ENGINE_NAMES.get(i))
        .map_or_else(|| Cow::Owned(format!("Error {index}")), |&n| Cow::Borrowed(n))
}

// ---- Control slots ----

/// How a control slot is presented and ranged.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlKind {
    /// Integer engine index, `0..ENGINE_NAMES.len()`.
    EngineSelector,
    /// `[-1, 1]`.
    PercentBipolar,
    /// `[0, 1]`.
    Percent,
    /// `[0, 1]`, can be switched off entirely.
    PercentDeactivatable,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControlDescriptor {
    pub name: &'static str,
    pub kind: ControlKind,
    pub default: f32,
    pub default_deactivated: bool,
}

const fn slot(name: &'static str, kind: ControlKind) -> ControlDescriptor {
    ControlDescriptor { name, kind, default: 0.0, default_deactivated: false }
}

/// The seven control slots, in host order.
pub const CONTROL_SLOTS: [ControlDescriptor; 7] = [
    slot("Engine", ControlKind::EngineSelector),
    slot("Harmonics", ControlKind::PercentBipolar),
    slot("Timbre", ControlKind::PercentBipolar),
    slot("Morph", ControlKind::PercentBipolar),
    slot("Aux Mix", ControlKind::Percent),
    ControlDescriptor {
        name: "LPG Response",
        kind: ControlKind::PercentDeactivatable,
        default: 0.0,
        default_deactivated: true,
    },
    slot("LPG Decay", ControlKind::Percent),
];
