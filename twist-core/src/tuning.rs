//! Tuning-aware pitch mapping.
//!
//! The oscillator works in "12-per-octave exponent" space: a pitch of 60.0 means
//! MIDI note 60 in equal temperament. When a microtonal table is loaded and the
//! voice retunes everything, the fractional pitch is re-expressed through the
//! table so downstream `2^(n/12)` math lands on the table's frequencies.
//!
//! Tables themselves are built elsewhere; only the [`TuningTable`] query is used here.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::dsp::floor_to_i32;

/// Read-only query interface of a tuning table.
pub trait TuningTable: Send + Sync {
    /// `log2(freq(note) / freq(MIDI 0))`, i.e. octaves above MIDI note 0.
    fn log_scaled_frequency(&self, note: i32) -> f64;

    /// True when the table is plain 12-TET, which makes remapping a no-op.
    fn is_standard(&self) -> bool {
        false
    }
}

/// Plain 12-tone equal temperament.
#[derive(Copy, Clone, Debug, Default)]
pub struct EqualTemperament;

impl TuningTable for EqualTemperament {
    #[inline]
    fn log_scaled_frequency(&self, note: i32) -> f64 {
        f64::from(note) / 12.0
    }

    fn is_standard(&self) -> bool {
        true
    }
}

/// Explicit per-note table (`octaves above MIDI 0` for notes `0..len`).
/// Notes outside the table are extended by whole periods of the table's span.
#[derive(Clone, Debug)]
pub struct NoteTable {
    octaves: Vec<f64>,
}

impl NoteTable {
    /// Returns `None` for an empty table.
    pub fn new(octaves: Vec<f64>) -> Option<Self> {
        if octaves.is_empty() { None } else { Some(Self { octaves }) }
    }

    /// A table where every step is `cents` wide (e.g. 100.0 is 12-TET).
    pub fn equal_steps(cents: f64, len: usize) -> Option<Self> {
        Self::new((0..len).map(|i| i as f64 * cents / 1200.0).collect())
    }
}

impl TuningTable for NoteTable {
    fn log_scaled_frequency(&self, note: i32) -> f64 {
        let len = self.octaves.len() as i32;
        let span = self.octaves[self.octaves.len() - 1] - self.octaves[0];
        let step = if len > 1 { span / f64::from(len - 1) } else { 0.0 };
        let wrapped = note.rem_euclid(len);
        let periods = f64::from(note.div_euclid(len));
        // continue linearly past the ends so interpolation stays monotonic
        self.octaves[wrapped as usize] + periods * (span + step)
    }
}

/// How pitches flow through the table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TuningMode {
    /// Equal-tempered; pitches pass through untouched.
    #[default]
    Standard,
    /// Every pitch is re-expressed through the loaded table.
    RetuneAll,
}

/// Maps a linear pitch to a frequency exponent, optionally through a table.
#[derive(Clone, Default)]
pub struct TuningMapper {
    mode: TuningMode,
    table: Option<Arc<dyn TuningTable>>,
    external_active: bool,
}

impl core::fmt::Debug for TuningMapper {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TuningMapper")
            .field("mode", &self.mode)
            .field("has_table", &self.table.is_some())
            .field("external_active", &self.external_active)
            .finish()
    }
}

impl TuningMapper {
    /// Equal temperament, no table.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Retune through `table`.
    pub fn retune_all(table: Arc<dyn TuningTable>) -> Self {
        Self { mode: TuningMode::RetuneAll, table: Some(table), external_active: false }
    }

    pub fn set_mode(&mut self, mode: TuningMode) { self.mode = mode; }
    pub fn set_table(&mut self, table: Option<Arc<dyn TuningTable>>) { self.table = table; }

    /// An external master-tuning client takes precedence over the local table.
    pub fn set_external_active(&mut self, active: bool) { self.external_active = active; }

    pub fn mode(&self) -> TuningMode { self.mode }

    /// Whether [`map`](Self::map) currently goes through the table.
    #[inline]
    pub fn is_remapping(&self) -> bool {
        self.mode == TuningMode::RetuneAll
            && !self.external_active
            && self.table.as_ref().is_some_and(|t| !t.is_standard())
    }

    /// Map `pitch` to a 12-per-octave exponent.
    #[inline]
    pub fn map(&self, pitch: f32) -> f32 {
        let table = match &self.table {
            Some(t) if self.is_remapping() => t,
            _ => return pitch,
        };
        let idx = floor_to_i32(pitch);
        let frac = f64::from(pitch - idx as f32);
        let b0 = table.log_scaled_frequency(idx) * 12.0;
        let b1 = table.log_scaled_frequency(idx + 1) * 12.0;
        ((1.0 - frac) * b0 + frac * b1) as f32
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter_tone() -> Arc<dyn TuningTable> {
        Arc::new(NoteTable::equal_steps(50.0, 128).unwrap())
    }

    #[test]
    fn standard_mode_is_identity() {
        let m = TuningMapper::standard();
        for p in [-12.5, 0.0, 0.001, 60.0, 60.5, 127.99, 1.0e6] {
            assert_eq!(m.map(p), p);
        }
    }

    #[test]
    fn table_hits_integer_notes_exactly() {
        let table = quarter_tone();
        let m = TuningMapper::retune_all(table.clone());
        assert_eq!(m.map(60.0), (table.log_scaled_frequency(60) * 12.0) as f32);
    }

    #[test]
    fn table_interpolates_between_notes() {
        let table = quarter_tone();
        let m = TuningMapper::retune_all(table.clone());
        let a = table.log_scaled_frequency(60) * 12.0;
        let b = table.log_scaled_frequency(61) * 12.0;
        let mean = ((a + b) * 0.5) as f32;
        assert!((m.map(60.5) - mean).abs() < 1e-4, "got {} want {}", m.map(60.5), mean);
    }

    #[test]
    fn external_client_or_standard_table_bypasses_remap() {
        let mut m = TuningMapper::retune_all(quarter_tone());
        m.set_external_active(true);
        assert_eq!(m.map(61.25), 61.25);

        let m = TuningMapper::retune_all(Arc::new(EqualTemperament));
        assert!(!m.is_remapping());
        assert_eq!(m.map(61.25), 61.25);
    }

    #[test]
    fn note_table_extends_past_its_ends() {
        let t = NoteTable::equal_steps(100.0, 12).unwrap();
        // 12-TET spelled as one octave: note 12 is one octave up
        assert!((t.log_scaled_frequency(12) - 1.0).abs() < 1e-12);
        assert!((t.log_scaled_frequency(-1) - (-1.0 / 12.0)).abs() < 1e-12);
    }
}
