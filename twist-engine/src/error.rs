//! Error type for everything that can fail outside the per-sample path.
//!
//! Nothing here is ever surfaced from the audio thread: the oscillator turns any of
//! these into a silent, degraded state and logs it once.

use thiserror::Error;
use twist_core::arena::ArenaExhausted;

#[derive(Debug, Error)]
pub enum TwistError {
    /// The resampling library refused to build a resampler.
    #[error("resampler construction failed: {0}")]
    Resampler(#[from] rubato::ResamplerConstructionError),

    /// A resampling call failed (buffer validation inside the library).
    #[error("resampling failed: {0}")]
    Resample(#[from] rubato::ResampleError),

    /// Target/native ratio is not a positive finite number.
    #[error("invalid resample ratio {0} (target and native rates must be positive and finite)")]
    InvalidRatio(f64),

    /// The engine's working memory did not fit into the scratch arena.
    #[error("engine working memory: {0}")]
    Arena(ArenaExhausted),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<ArenaExhausted> for TwistError {
    fn from(e: ArenaExhausted) -> Self {
        Self::Arena(e)
    }
}

pub type Result<T> = std::result::Result<T, TwistError>;
