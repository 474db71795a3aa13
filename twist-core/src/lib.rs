#![cfg_attr(not(feature = "std"), no_std)]
//! Twist Core: no_std-ready DSP primitives for the Twist multi-engine oscillator.
//!
//! Features
//! - `std`      : (default) use the Rust standard library
//! - `no-std`   : build with `#![no_std]` (plus `alloc`) and use `libm` math
//! - `fast-math`: enable approximations (polys/rationals) for tanh/trig
//!
//! Modules
//! - [`dsp`]       : math backend, pitch helpers, smoothing coefficients
//! - [`envelopes`] : linear parameter ramp, decay and AR envelopes
//! - [`filters`]   : one-pole HP/DC blocker, TPT SVF
//! - [`tuning`]    : tuning-table query trait and pitch mapper
//! - [`arena`]     : flat scratch arena for engine working memory
//!
//! Design
//! - No heap allocations after construction; sample-by-sample stateful primitives
//! - Friendly to embedded / real-time targets

extern crate alloc;

pub mod arena;
pub mod dsp;
pub mod envelopes;
pub mod filters;
pub mod tuning;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::arena::{ArenaExhausted, Region, ScratchArena};
    pub use crate::dsp::{
        clamp, kill_denormals, lerp, note_to_hz, note_to_phase_increment, semitones_to_ratio,
        saturate, sin01, soft_clip, wrap_phase01, TAU,
    };
    pub use crate::envelopes::{ArExp, DecayEnvelope, LinearSmoother};
    pub use crate::filters::{DcBlock, OnePoleHP, SvfMode, SvfTpt};
    pub use crate::tuning::{EqualTemperament, NoteTable, TuningMapper, TuningMode, TuningTable};
}
