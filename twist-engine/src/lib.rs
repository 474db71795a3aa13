//! Twist Engine: a sixteen-model macro oscillator rendered at a fixed native
//! rate and streamed to any host rate.
//!
//! Crate layout:
//! - [`engine`]     : `SynthEngine` trait, `Patch`, `Modulations`, `Frame`
//! - [`models`]     : the sixteen synthesis models and `EngineKind`
//! - [`voice`]      : `Voice` (model dispatch + low-pass gate) over a scratch arena
//! - [`nodes`]      : phasors, band-limited oscillators, noise sources
//! - [`resampler`]  : streaming stereo sinc resampler
//! - [`carryover`]  : fixed-capacity FIFO of surplus resampled frames
//! - [`drift`]      : slow random pitch walk
//! - [`oscillator`] : `TwistOscillator`, the per-note pipeline hosts drive
//! - [`catalog`]    : engine names and control-slot descriptors
//! - [`config`]     : `PipelineConfig` and the `Controls` snapshot
//! - [`error`]      : `TwistError`
//!
//! Nothing on the block path allocates; configuration problems degrade the
//! pipeline to silence instead of failing the host.

pub mod carryover;
pub mod catalog;
pub mod config;
pub mod drift;
pub mod engine;
pub mod error;
pub mod models;
pub mod nodes;
pub mod oscillator;
pub mod resampler;
pub mod voice;

pub use catalog::{engine_name, ControlDescriptor, ControlKind, CONTROL_SLOTS, ENGINE_NAMES};
pub use config::{Controls, PipelineConfig, ResamplerQuality};
pub use engine::{Frame, Modulations, Patch, SynthEngine};
pub use error::{Result, TwistError};
pub use models::EngineKind;
pub use oscillator::{SpinUp, TwistOscillator};
pub use voice::Voice;
