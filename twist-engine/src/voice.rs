//! Reference engine: all sixteen models behind one [`SynthEngine`], plus the
//! low-pass gate.
//!
//! Every model is constructed up front and keeps its state while another model
//! is selected, so switching engines never allocates. Working memory (the
//! wavetable and the string delay line) lives in a caller-supplied
//! [`ScratchArena`].

use twist_core::arena::{ArenaExhausted, ScratchArena};
use twist_core::dsp::{kill_denormals, lerp, note_to_hz, semitones_to_ratio};
use twist_core::envelopes::DecayEnvelope;
use twist_core::filters::SvfTpt;

use crate::engine::{Frame, Modulations, Patch, SynthEngine};
use crate::models::drums::{HiHat, Kick, Snare};
use crate::models::noise::{FilteredNoise, Granular, Particle};
use crate::models::oscillators::{Fm2, Formant, Waveforms, Waveshaper};
use crate::models::physical::{KarplusString, Modal};
use crate::models::spectral::{Chords, Harmonic, Vowels, Wavetable};
use crate::models::{EngineKind, Model, ModelParams, MAX_F, MIN_F};

/// Arena samples the voice needs.
pub const ARENA_LEN: usize = Wavetable::ARENA_LEN + KarplusString::ARENA_LEN;

// ---- Low-pass gate ----

/// Struck decay envelope driving a low-pass filter and a VCA.
///
/// `colour` 0 is filter+VCA (the filter closes as the envelope falls),
/// 1 is a plain VCA.
#[derive(Copy, Clone, Debug)]
pub struct LowPassGate {
    env: DecayEnvelope,
    out_lp: SvfTpt,
    aux_lp: SvfTpt,
    sr: f32,
}

impl LowPassGate {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            env: DecayEnvelope::new(100.0, sample_rate),
            out_lp: SvfTpt::default(),
            aux_lp: SvfTpt::default(),
            sr: sample_rate,
        }
    }

    /// `decay` in `[0, 1]` maps exponentially onto 10 ms .. 4 s.
    #[inline]
    pub fn decay_ms(decay: f32) -> f32 {
        10.0 * 400.0f32.powf(decay.clamp(0.0, 1.0))
    }

    pub fn reset(&mut self) {
        self.env.reset();
        self.out_lp.reset();
        self.aux_lp.reset();
    }

    #[inline]
    pub fn strike(&mut self) {
        self.env.strike();
    }

    pub fn process(&mut self, decay: f32, colour: f32, frames: &mut [Frame]) {
        self.env.set_decay_ms(Self::decay_ms(decay));
        // cutoff follows the envelope: 40 Hz closed, ~20 kHz fully open
        let hz = 40.0 * semitones_to_ratio(108.0 * self.env.value());
        let f = (hz / self.sr).min(MAX_F);
        self.out_lp.set_f_q(f, 0.6);
        self.aux_lp.set_f_q(f, 0.6);
        let colour = colour.clamp(0.0, 1.0);
        for fr in frames {
            let e = self.env.next();
            let out = lerp(self.out_lp.process_lp(fr.out), fr.out, colour);
            let aux = lerp(self.aux_lp.process_lp(fr.aux), fr.aux, colour);
            *fr = Frame::new(out * e, aux * e);
        }
    }
}

// ---- Voice ----

#[derive(Clone, Debug)]
struct Models {
    waveforms: Waveforms,
    waveshaper: Waveshaper,
    fm2: Fm2,
    formant: Formant,
    harmonic: Harmonic,
    wavetable: Wavetable,
    chords: Chords,
    vowels: Vowels,
    granular: Granular,
    filtered_noise: FilteredNoise,
    particle: Particle,
    string: KarplusString,
    modal: Modal,
    kick: Kick,
    snare: Snare,
    hihat: HiHat,
}

impl Models {
    fn new(sr: f32, arena: &mut ScratchArena) -> Result<Self, ArenaExhausted> {
        Ok(Self {
            waveforms: Waveforms::default(),
            waveshaper: Waveshaper::new(sr),
            fm2: Fm2::default(),
            formant: Formant::default(),
            harmonic: Harmonic::default(),
            wavetable: Wavetable::new(arena)?,
            chords: Chords::default(),
            vowels: Vowels::default(),
            granular: Granular::new(sr),
            filtered_noise: FilteredNoise::default(),
            particle: Particle::default(),
            string: KarplusString::new(arena)?,
            modal: Modal::new(sr),
            kick: Kick::new(sr),
            snare: Snare::new(sr),
            hihat: HiHat::new(sr),
        })
    }

    fn get_mut(&mut self, kind: EngineKind) -> &mut dyn Model {
        match kind {
            EngineKind::Waveforms => &mut self.waveforms,
            EngineKind::Waveshaper => &mut self.waveshaper,
            EngineKind::Fm2 => &mut self.fm2,
            EngineKind::Formant => &mut self.formant,
            EngineKind::Harmonic => &mut self.harmonic,
            EngineKind::Wavetable => &mut self.wavetable,
            EngineKind::Chords => &mut self.chords,
            EngineKind::Vowels => &mut self.vowels,
            EngineKind::Granular => &mut self.granular,
            EngineKind::FilteredNoise => &mut self.filtered_noise,
            EngineKind::Particle => &mut self.particle,
            EngineKind::String => &mut self.string,
            EngineKind::Modal => &mut self.modal,
            EngineKind::Kick => &mut self.kick,
            EngineKind::Snare => &mut self.snare,
            EngineKind::HiHat => &mut self.hihat,
        }
    }
}

/// Sixteen-model voice with a low-pass gate.
#[derive(Clone, Debug)]
pub struct Voice {
    sr: f32,
    arena: ScratchArena,
    models: Models,
    lpg: LowPassGate,
    prev_gate: bool,
}

impl Voice {
    /// Carve every model's working memory out of `arena` and reset.
    pub fn new(sample_rate: f32, mut arena: ScratchArena) -> Result<Self, ArenaExhausted> {
        let sr = sample_rate.max(1.0);
        let models = Models::new(sr, &mut arena)?;
        let mut v = Self { sr, arena, models, lpg: LowPassGate::new(sr), prev_gate: false };
        v.reset();
        log::debug!("voice ready: {} Hz, {} of {} arena samples used", sr, v.arena.used(), v.arena.capacity());
        Ok(v)
    }

    #[inline] pub fn arena_used(&self) -> usize { self.arena.used() }
}

impl SynthEngine for Voice {
    #[inline]
    fn sample_rate(&self) -> f32 {
        self.sr
    }

    fn reset(&mut self) {
        self.arena.clear();
        for kind in EngineKind::ALL {
            let m = self.models.get_mut(kind);
            m.reset(&mut self.arena);
            if kind.is_struck() {
                m.strike();
            }
        }
        self.lpg.reset();
        self.prev_gate = false;
    }

    fn render(&mut self, patch: &Patch, modulations: &Modulations, frames: &mut [Frame]) {
        let kind = EngineKind::from_index(patch.engine);
        let note = patch.note + modulations.frequency;
        let f0 = (note_to_hz(f64::from(note)) / f64::from(self.sr)) as f32;
        let f0 = if f0.is_finite() { f0.clamp(MIN_F, MAX_F) } else { MIN_F };
        let params = ModelParams {
            note,
            f0,
            harmonics: patch.harmonics.clamp(0.0, 1.0),
            timbre: patch.timbre.clamp(0.0, 1.0),
            morph: patch.morph.clamp(0.0, 1.0),
            sample_rate: self.sr,
        };

        let gate = modulations.gate();
        let rising = gate && !self.prev_gate;
        self.prev_gate = gate;

        let Self { arena, models, lpg, .. } = self;
        let model = models.get_mut(kind);
        if rising {
            lpg.strike();
            if kind.is_struck() {
                model.strike();
            }
        }
        model.render(&params, arena, frames);

        if modulations.trigger_patched && !kind.bypasses_lpg() {
            lpg.process(patch.decay, patch.lpg_colour, frames);
        }
        for f in frames.iter_mut() {
            f.out = kill_denormals(f.out);
            f.aux = kill_denormals(f.aux);
        }
    }
}

// ------------------------------------ Tests --------------------------------------
