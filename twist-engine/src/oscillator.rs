//! The oscillator pipeline.
//!
//! One `TwistOscillator` drives one note: it advances the parameter ramps, ticks
//! the drift walk, renders the engine a small native sub-block at a time, runs
//! the result through the streaming resampler and stitches the target-rate
//! frames into host blocks of any length, holding the overflow for the next
//! call.
//!
//! Real-time rules:
//! - `process_block` and `initialize` never allocate, lock or block
//! - Errors never reach the host: a pipeline that cannot run (bad rates,
//!   resampler failure) is *degraded* and leaves its outputs untouched
//! - Randomness comes from the pipeline's own `StdRng` and the drift walk's
//!   step stream, which `initialize` reseeds

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use twist_core::arena::ScratchArena;
use twist_core::dsp::{lerp, note_to_phase_increment};
use twist_core::envelopes::LinearSmoother;
use twist_core::tuning::TuningMapper;

use crate::carryover::Carryover;
use crate::config::{Controls, PipelineConfig};
use crate::drift::DriftLfo;
use crate::engine::{Frame, Modulations, Patch, SynthEngine};
use crate::error::{Result, TwistError};
use crate::resampler::StreamResampler;
use crate::voice::Voice;

/// What `initialize` did to spin the engine up.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SpinUp {
    /// One period of the mapped pitch in native samples (at least 1).
    pub nominal_cycle: f64,
    /// Pre-roll length after doubling up to the floor and jitter.
    pub cycle: f64,
    /// Random stretch applied to the cycle; exactly 1 for display or retriggered notes.
    pub jitter: f64,
    /// Native frames rendered and discarded.
    pub preroll_frames: usize,
    /// Starting point of the drift walk.
    pub drift_seed: f32,
}

// ---- Parameter ramps ----

#[derive(Copy, Clone, Debug)]
struct Smoothers {
    harmonics: LinearSmoother,
    timbre: LinearSmoother,
    morph: LinearSmoother,
    lpg_colour: LinearSmoother,
    lpg_decay: LinearSmoother,
}

impl Smoothers {
    fn new(steps: u32) -> Self {
        let s = LinearSmoother::new(steps);
        Self { harmonics: s, timbre: s, morph: s, lpg_colour: s, lpg_decay: s }
    }

    fn targets(c: &Controls) -> [f32; 5] {
        [
            Controls::unipolar(c.harmonics),
            Controls::unipolar(c.timbre),
            Controls::unipolar(c.morph),
            c.lpg_response.unwrap_or(0.0).clamp(0.0, 1.0),
            c.lpg_decay.clamp(0.0, 1.0),
        ]
    }

    fn all(&mut self) -> [&mut LinearSmoother; 5] {
        [&mut self.harmonics, &mut self.timbre, &mut self.morph, &mut self.lpg_colour, &mut self.lpg_decay]
    }

    fn set_targets(&mut self, c: &Controls) {
        for (s, t) in self.all().into_iter().zip(Self::targets(c)) {
            s.set_target(t);
        }
    }

    fn snap(&mut self, c: &Controls) {
        for (s, t) in self.all().into_iter().zip(Self::targets(c)) {
            s.snap(t);
        }
    }

    /// One tick of every ramp, written into the patch.
    fn advance(&mut self, patch: &mut Patch) {
        patch.harmonics = self.harmonics.advance();
        patch.timbre = self.timbre.advance();
        patch.morph = self.morph.advance();
        patch.lpg_colour = self.lpg_colour.advance();
        patch.decay = self.lpg_decay.advance();
    }
}

// ---- Native side ----

/// Everything that runs at the engine's rate, up to the FIFO feeding the resampler.
#[derive(Debug)]
struct NativeSource<E> {
    engine: E,
    smoothers: Smoothers,
    drift: DriftLfo,
    patch: Patch,
    block: Vec<Frame>,
    /// Rendered native frames the resampler has not consumed yet.
    pending: Vec<Frame>,
    rendered: usize,
}

impl<E: SynthEngine> NativeSource<E> {
    /// One native sub-block: ramps, drift, patch, modulations, engine.
    /// `drift: None` holds the drift walk still (pre-roll).
    fn render_tick(&mut self, controls: &Controls, gate: bool, note: f32, drift: Option<f32>, fm: f32) {
        self.smoothers.advance(&mut self.patch);
        self.patch.note = match drift {
            Some(amount) => note + amount * self.drift.tick(),
            None => note,
        };
        self.patch.engine = controls.engine;

        let mut modulations = Modulations { frequency: fm, ..Modulations::default() };
        if controls.lpg_enabled() {
            modulations.trigger = if gate { 1.0 } else { 0.0 };
            modulations.trigger_patched = true;
        }
        self.engine.render(&self.patch, &modulations, &mut self.block);
        self.pending.extend_from_slice(&self.block);
        self.rendered += self.block.len();
    }
}

// ---- Pipeline ----

/// Single-voice oscillator pipeline, generic over the synthesis engine.
#[derive(Debug)]
pub struct TwistOscillator<E: SynthEngine = Voice> {
    config: PipelineConfig,
    source: NativeSource<E>,
    tuning: TuningMapper,
    resampler: Option<StreamResampler>,
    carryover: Carryover,
    controls: Controls,
    gate: bool,
    rng: StdRng,
}

impl TwistOscillator<Voice> {
    /// Pipeline around the sixteen-model [`Voice`].
    ///
    /// Fails only if the voice does not fit `config.arena_len`; every other
    /// problem degrades the pipeline instead (see [`is_degraded`](Self::is_degraded)).
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let voice = Voice::new(config.native_rate as f32, ScratchArena::with_capacity(config.arena_len))?;
        Ok(Self::with_engine(config, voice))
    }
}

impl<E: SynthEngine> TwistOscillator<E> {
    pub fn with_engine(config: PipelineConfig, engine: E) -> Self {
        let resampler = match Self::build_resampler(&config, &engine) {
            Ok(rs) => Some(rs),
            Err(e) => {
                log::error!("oscillator degraded to silence: {e}");
                None
            }
        };
        let (burst, chunk) = resampler.as_ref().map_or((0, 0), |r| (r.max_burst(), r.input_frames_max()));
        let sub_block = config.sub_block.max(1);
        log::debug!(
            "oscillator: {} Hz -> {} Hz, sub-block {sub_block}, chunk {chunk}, carryover capacity {burst}",
            config.native_rate,
            config.target_rate
        );
        Self {
            source: NativeSource {
                engine,
                smoothers: Smoothers::new(config.smoothing_steps),
                drift: DriftLfo::default(),
                patch: Patch::default(),
                block: vec![Frame::default(); sub_block],
                pending: Vec::with_capacity(chunk + sub_block),
                rendered: 0,
            },
            carryover: Carryover::with_capacity(burst),
            config,
            tuning: TuningMapper::standard(),
            resampler,
            controls: Controls::default(),
            gate: false,
            rng: StdRng::from_entropy(),
        }
    }

    fn build_resampler(config: &PipelineConfig, engine: &E) -> Result<StreamResampler> {
        config.validate()?;
        let engine_rate = f64::from(engine.sample_rate());
        if (engine_rate - config.native_rate).abs() > 0.5 {
            return Err(TwistError::Config(format!(
                "engine renders at {engine_rate} Hz but the pipeline expects {} Hz",
                config.native_rate
            )));
        }
        StreamResampler::new(config.ratio(), config.resampler_chunk, config.quality)
    }

    /// Replace the random source with a seeded one (reproducible drift seeds and jitter).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ---- Host-facing state ----

    #[inline] pub fn config(&self) -> &PipelineConfig { &self.config }
    #[inline] pub fn controls(&self) -> &Controls { &self.controls }
    #[inline] pub fn engine(&self) -> &E { &self.source.engine }
    #[inline] pub fn engine_mut(&mut self) -> &mut E { &mut self.source.engine }
    #[inline] pub fn patch(&self) -> &Patch { &self.source.patch }
    #[inline] pub fn tuning(&self) -> &TuningMapper { &self.tuning }
    #[inline] pub fn gate(&self) -> bool { self.gate }

    /// New control snapshot; ramps towards it start with the next block.
    pub fn set_controls(&mut self, controls: &Controls) {
        self.controls.clone_from(controls);
    }

    /// Note gate, forwarded to the engine trigger while the LPG is enabled.
    #[inline]
    pub fn set_gate(&mut self, gate: bool) {
        self.gate = gate;
    }

    pub fn set_tuning(&mut self, tuning: TuningMapper) {
        self.tuning = tuning;
    }

    #[inline] pub fn is_degraded(&self) -> bool { self.resampler.is_none() }

    /// Frames currently held for the next block.
    #[inline] pub fn carryover_len(&self) -> usize { self.carryover.len() }

    /// Upper bound of [`carryover_len`](Self::carryover_len).
    #[inline] pub fn max_burst(&self) -> usize { self.carryover.capacity() }

    /// Native frames rendered but not yet consumed by the resampler.
    #[inline] pub fn pending_len(&self) -> usize { self.source.pending.len() }

    // ---- Note start ----

    /// Reset everything for a new note and silently pre-roll the engine.
    ///
    /// With `nonzero_drift` unset the drift walk restarts from zero on a fixed
    /// step stream, so two such calls leave identical state behind.
    ///
    /// Returns `None` (and does nothing) when the pipeline is degraded.
    pub fn initialize(&mut self, pitch: f32, is_display: bool, nonzero_drift: bool) -> Option<SpinUp> {
        self.resampler.as_mut()?.reset();
        self.carryover.clear();
        let src = &mut self.source;
        src.pending.clear();
        src.engine.reset();
        src.patch = Patch::default();
        src.smoothers.snap(&self.controls);

        let (drift_seed, stream) = if nonzero_drift {
            (self.rng.gen_range(0.0..DriftLfo::MAX_SEED), self.rng.gen())
        } else {
            (0.0, DriftLfo::FIXED_STREAM)
        };
        src.drift.reset(drift_seed, stream);

        let note = self.tuning.map(pitch);
        let native_rate = self.config.native_rate;
        let inc = note_to_phase_increment(f64::from(note), native_rate);
        // at most one second of pre-roll
        let nominal_cycle = if inc.is_finite() && inc > 0.0 { (1.0 / inc).clamp(1.0, native_rate) } else { native_rate };
        let mut cycle = nominal_cycle;
        while cycle < self.config.min_cycle_samples {
            cycle *= 2.0;
        }
        let jitter = if self.controls.retrigger || is_display { 1.0 } else { self.rng.gen_range(1.0..2.0) };
        cycle *= jitter;
        let preroll_frames = cycle.ceil() as usize;

        if let Err(e) = self.preroll(note, preroll_frames) {
            self.degrade(&e);
            return None;
        }
        log::debug!(
            "note init: pitch {pitch} -> {note}, cycle {nominal_cycle:.2} -> {cycle:.2}, pre-roll {preroll_frames}, drift seed {drift_seed:.6}"
        );
        Some(SpinUp { nominal_cycle, cycle, jitter, preroll_frames, drift_seed })
    }

    // ---- Block rendering ----

    /// Fill `left` and `right` with target-rate audio and return the number of
    /// frames written: the shorter of the two lengths. Samples past it are left
    /// untouched, as is everything when the pipeline is degraded (returns 0).
    ///
    /// `drift` scales the drift walk (semitones), `fm_depth` is added to the
    /// engine's frequency input (semitones) when `fm` is set. Mono writes
    /// `lerp(out, aux, aux_mix)` to both channels; stereo writes `out` left and
    /// `aux` right.
    #[allow(clippy::too_many_arguments)]
    pub fn process_block(
        &mut self,
        pitch: f32,
        drift: f32,
        stereo: bool,
        fm: bool,
        fm_depth: f32,
        left: &mut [f32],
        right: &mut [f32],
    ) -> usize {
        if self.resampler.is_none() {
            return 0;
        }
        let n = left.len().min(right.len());
        self.source.smoothers.set_targets(&self.controls);
        let note = self.tuning.map(pitch);
        let fm_offset = if fm { fm_depth } else { 0.0 };
        let aux_mix = self.controls.aux_mix.clamp(0.0, 1.0);
        let route = |f: Frame| if stereo { (f.out, f.aux) } else { let m = lerp(f.out, f.aux, aux_mix); (m, m) };

        let mut produced = 0;
        while produced < n {
            let Some(f) = self.carryover.pop() else { break };
            (left[produced], right[produced]) = route(f);
            produced += 1;
        }

        while produced < n {
            let written = match self.convert(note, Some(drift), fm_offset) {
                Ok((_, written)) => written,
                Err(e) => {
                    self.degrade(&e);
                    return produced;
                }
            };
            if let Some(rs) = self.resampler.as_ref() {
                for i in 0..written {
                    let f = rs.frame(i);
                    if produced < n {
                        (left[produced], right[produced]) = route(f);
                        produced += 1;
                    } else {
                        let kept = self.carryover.push(f);
                        debug_assert!(kept, "carryover overflow");
                    }
                }
            }
        }
        produced
    }

    /// Render and discard `native_frames` engine frames; the carryover ends empty.
    fn preroll(&mut self, note: f32, native_frames: usize) -> Result<()> {
        self.source.rendered = 0;
        while self.source.rendered < native_frames {
            self.convert(note, None, 0.0)?;
        }
        self.carryover.clear();
        Ok(())
    }

    /// One resampler call, topping up the pending native FIFO first.
    /// Returns `(native frames consumed, target-rate frames produced)`.
    fn convert(&mut self, note: f32, drift: Option<f32>, fm: f32) -> Result<(usize, usize)> {
        let rs = self.resampler.as_mut().ok_or_else(|| TwistError::Config("pipeline is degraded".into()))?;
        let src = &mut self.source;
        while src.pending.len() < rs.input_frames_next() {
            src.render_tick(&self.controls, self.gate, note, drift, fm);
        }
        let (used, written) = rs.process(&src.pending)?;
        let used = used.min(src.pending.len());
        src.pending.drain(..used);
        Ok((used, written))
    }

    fn degrade(&mut self, e: &TwistError) {
        log::error!("oscillator degraded to silence: {e}");
        self.resampler = None;
        self.carryover.clear();
        self.source.pending.clear();
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn osc(target_rate: f64) -> TwistOscillator {
        TwistOscillator::new(PipelineConfig::with_target_rate(target_rate)).unwrap().with_seed(7)
    }

    #[test]
    fn smoothers_snap_then_ramp() {
        let mut s = Smoothers::new(4);
        let c = Controls { harmonics: 1.0, lpg_response: Some(0.5), ..Controls::default() };
        s.snap(&c);
        let mut p = Patch::default();
        s.advance(&mut p);
        assert_eq!((p.harmonics, p.timbre, p.lpg_colour), (1.0, 0.5, 0.5));
        s.set_targets(&Controls::default());
        for _ in 0..4 {
            s.advance(&mut p);
        }
        assert_eq!((p.harmonics, p.lpg_colour), (0.5, 0.0));
    }

    #[test]
    fn block_is_filled_exactly_and_carryover_stays_bounded() {
        let mut o = osc(96_000.0);
        o.initialize(60.0, false, false).unwrap();
        assert_eq!(o.carryover_len(), 0);
        for n in [1, 7, 32, 64, 333, 0, 5] {
            let mut l = vec![f32::NAN; n];
            let mut r = vec![f32::NAN; n];
            o.process_block(60.0, 0.0, true, false, 0.0, &mut l, &mut r);
            assert!(l.iter().chain(&r).all(|x| x.is_finite()));
            assert!(o.carryover_len() <= o.max_burst());
        }
    }

    #[test]
    fn mono_mixes_aux_into_both_channels() {
        let mut o = osc(48_000.0);
        o.set_controls(&Controls { aux_mix: 1.0, ..Controls::default() });
        o.initialize(48.0, true, false).unwrap();
        let (mut l, mut r) = (vec![0.0; 256], vec![1.0; 256]);
        o.process_block(48.0, 0.0, false, false, 0.0, &mut l, &mut r);
        assert_eq!(l, r);
    }

    #[test]
    fn preroll_counts_native_frames_and_leaves_no_carryover() {
        let mut o = osc(192_000.0);
        let s = o.initialize(60.0, true, false).unwrap();
        assert_eq!(s.jitter, 1.0);
        assert!(o.source.rendered >= s.preroll_frames);
        assert!(o.source.rendered < s.preroll_frames + o.config.sub_block + o.resampler.as_ref().unwrap().input_frames_max());
        assert_eq!(o.carryover_len(), 0);
    }

    #[test]
    fn preroll_holds_the_drift_walk() {
        let mut o = osc(96_000.0);
        o.initialize(40.0, true, false).unwrap();
        assert_eq!(o.source.drift.value(), 0.0);
        assert_eq!(o.source.patch.note, o.tuning.map(40.0));
        let (mut l, mut r) = (vec![0.0; 64], vec![0.0; 64]);
        o.process_block(40.0, 1.0, true, false, 0.0, &mut l, &mut r);
        assert_ne!(o.source.drift.value(), 0.0);
    }

    #[test]
    fn uneven_chunk_carries_native_frames_forward() {
        // chunk 7 against sub-blocks of 4 leaves a remainder after most calls
        let config = PipelineConfig { resampler_chunk: 7, ..PipelineConfig::with_target_rate(44_100.0) };
        let mut o = TwistOscillator::new(config).unwrap().with_seed(7);
        o.initialize(60.0, true, false).unwrap();
        let (mut consumed, mut leftovers) = (0, 0);
        let start = o.source.rendered - o.pending_len();
        for _ in 0..500 {
            let (used, _) = o.convert(60.0, Some(0.0), 0.0).unwrap();
            assert_eq!(used, 7);
            assert!(o.pending_len() < 7 + o.config.sub_block);
            consumed += used;
            leftovers += usize::from(o.pending_len() > 0);
            // every rendered frame is either consumed or still queued
            assert_eq!(o.source.rendered - start, consumed + o.pending_len());
        }
        assert!(leftovers > 250, "leftovers {leftovers}");
    }

    #[test]
    fn short_right_channel_limits_the_block() {
        let mut o = osc(96_000.0);
        o.initialize(60.0, true, false).unwrap();
        let (mut l, mut r) = (vec![f32::NAN; 100], vec![f32::NAN; 40]);
        assert_eq!(o.process_block(60.0, 0.0, true, false, 0.0, &mut l, &mut r), 40);
        assert!(l[..40].iter().chain(&r).all(|x| x.is_finite()));
        assert!(l[40..].iter().all(|x| x.is_nan()));
        let (mut l, mut r) = (vec![0.0; 3], vec![0.0; 9]);
        assert_eq!(o.process_block(60.0, 0.0, false, false, 0.0, &mut l, &mut r), 3);
        assert_eq!(&r[3..], &[0.0; 6]);
    }

    #[test]
    fn retrigger_disables_jitter() {
        let mut o = osc(96_000.0);
        o.set_controls(&Controls { retrigger: true, ..Controls::default() });
        for _ in 0..8 {
            assert_eq!(o.initialize(72.0, false, true).unwrap().jitter, 1.0);
        }
    }

    #[test]
    fn extreme_low_pitch_preroll_is_capped() {
        let mut o = osc(96_000.0);
        let s = o.initialize(-500.0, true, false).unwrap();
        assert_eq!(s.nominal_cycle, 48_000.0);
        assert_eq!(s.preroll_frames, 48_000);
    }

    #[test]
    fn lpg_gate_reaches_the_engine() {
        let mut o = osc(48_000.0);
        o.set_controls(&Controls { lpg_response: Some(0.0), ..Controls::default() });
        o.set_gate(false);
        o.initialize(60.0, true, false).unwrap();
        let (mut l, mut r) = (vec![0.0; 512], vec![0.0; 512]);
        // settle past the resampler delay, gate closed: silence
        for _ in 0..4 {
            o.process_block(60.0, 0.0, true, false, 0.0, &mut l, &mut r);
        }
        assert!(l.iter().all(|x| x.abs() < 1e-6));
        o.set_gate(true);
        let mut peak = 0.0f32;
        for _ in 0..4 {
            o.process_block(60.0, 0.0, true, false, 0.0, &mut l, &mut r);
            peak = l.iter().fold(peak, |m, x| m.max(x.abs()));
        }
        assert!(peak > 1e-3, "peak={peak}");
    }
}
