//! Spectral models: 4 Harmonic, 5 Wavetable, 6 Chords, 7 Vowels/Speech.

use twist_core::arena::{ArenaExhausted, Region, ScratchArena};
use twist_core::dsp::{lerp, semitones_to_ratio, sin01, wrap_phase01};
use twist_core::filters::SvfTpt;

use super::{Model, ModelParams, MAX_F};
use crate::engine::Frame;
use crate::nodes::{BlepOsc, NoiseSource, Phasor};

// ---- 4: Harmonic (additive) ----

const PARTIALS: usize = 16;

/// Sixteen sine partials under a gaussian spectral bump.
///
/// harmonics: bump width, timbre: bump centre, morph: even-partial attenuation.
/// aux carries the odd partials only.
#[derive(Copy, Clone, Debug, Default)]
pub struct Harmonic {
    phase: Phasor,
    amps: [f32; PARTIALS],
}

impl Model for Harmonic {
    fn reset(&mut self, _: &mut ScratchArena) {
        self.phase.reset();
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let centre = p.timbre * (PARTIALS - 1) as f32;
        let width = 0.5 + 6.0 * p.harmonics;
        let even_gain = 1.0 - p.morph;
        let mut total = 0.0;
        for (k, a) in self.amps.iter_mut().enumerate() {
            let n = (k + 1) as f32;
            *a = if n * p.f0 < MAX_F {
                let d = (k as f32 - centre) / width;
                let g = (-0.5 * d * d).exp();
                if (k + 1) % 2 == 0 { g * even_gain } else { g }
            } else {
                0.0
            };
            total += *a;
        }
        let norm = if total > 0.0 { 1.0 / total } else { 0.0 };

        for fr in frames {
            let (ph, _) = self.phase.tick(p.f0);
            let (mut out, mut odd) = (0.0, 0.0);
            for (k, &a) in self.amps.iter().enumerate() {
                if a == 0.0 {
                    continue;
                }
                let s = a * sin01(ph * (k + 1) as f32);
                out += s;
                if k % 2 == 0 {
                    odd += s;
                }
            }
            *fr = Frame::new(out * norm, odd * norm);
        }
    }
}

// ---- 5: Wavetable ----

const TABLE_LEN: usize = 256;
const WAVES: usize = 4;

/// Four single-cycle waves (sine, triangle, saw, square) stored in the arena.
///
/// timbre scans the main output across the waves, morph scans aux, harmonics
/// above the midpoint hard-syncs the read phase (up to 4x).
#[derive(Copy, Clone, Debug)]
pub struct Wavetable {
    table: Region,
    phase: Phasor,
}

impl Wavetable {
    pub const ARENA_LEN: usize = TABLE_LEN * WAVES;

    pub fn new(arena: &mut ScratchArena) -> Result<Self, ArenaExhausted> {
        let table = arena.alloc(Self::ARENA_LEN)?;
        let w = Self { table, phase: Phasor::new() };
        w.fill(arena);
        Ok(w)
    }

    fn fill(&self, arena: &mut ScratchArena) {
        let t = arena.slice_mut(self.table);
        for i in 0..TABLE_LEN {
            let ph = i as f32 / TABLE_LEN as f32;
            t[i] = sin01(ph);
            t[TABLE_LEN + i] = 4.0 * (ph - 0.5).abs() - 1.0;
            // band-limited to 12 harmonics so the table can be read at any pitch we allow
            let (mut saw, mut sq) = (0.0, 0.0);
            for k in 1..=12 {
                let s = sin01(ph * k as f32) / k as f32;
                saw += s;
                if k % 2 == 1 {
                    sq += s;
                }
            }
            t[2 * TABLE_LEN + i] = saw * (2.0 / core::f32::consts::PI) * 0.85;
            t[3 * TABLE_LEN + i] = sq * (4.0 / core::f32::consts::PI) * 0.85;
        }
    }

    /// Linear read inside one wave, linear crossfade across waves.
    #[inline]
    fn read(table: &[f32], position: f32, phase: f32) -> f32 {
        let position = position.clamp(0.0, (WAVES - 1) as f32);
        let w0 = (position as usize).min(WAVES - 2);
        let wf = position - w0 as f32;
        let x = phase * TABLE_LEN as f32;
        let i0 = (x as usize) % TABLE_LEN;
        let i1 = (i0 + 1) % TABLE_LEN;
        let xf = x - x.floor();
        let sample = |w: usize| {
            let base = w * TABLE_LEN;
            lerp(table[base + i0], table[base + i1], xf)
        };
        lerp(sample(w0), sample(w0 + 1), wf)
    }
}

impl Model for Wavetable {
    fn reset(&mut self, arena: &mut ScratchArena) {
        self.phase.reset();
        self.fill(arena);
    }

    fn render(&mut self, p: &ModelParams, arena: &mut ScratchArena, frames: &mut [Frame]) {
        let table = arena.slice(self.table);
        let sync = 1.0 + 3.0 * (2.0 * p.harmonics - 1.0).max(0.0);
        let (pos_out, pos_aux) = (3.0 * p.timbre, 3.0 * p.morph);
        for fr in frames {
            let (ph, _) = self.phase.tick(p.f0);
            let read_ph = wrap_phase01(ph * sync);
            *fr = Frame::new(Self::read(table, pos_out, read_ph), Self::read(table, pos_aux, read_ph));
        }
    }
}

// ---- 6: Chords ----

/// Four-note voicings, semitones above the root.
const CHORDS: [[f32; 4]; 11] = [
    [0.0, 12.0, 19.0, 24.0], // octave + fifth
    [0.0, 7.0, 12.0, 19.0],  // fifth
    [0.0, 3.0, 7.0, 12.0],   // minor
    [0.0, 3.0, 7.0, 10.0],   // minor 7
    [0.0, 3.0, 10.0, 14.0],  // minor 9
    [0.0, 5.0, 7.0, 12.0],   // sus4
    [0.0, 4.0, 7.0, 12.0],   // major
    [0.0, 4.0, 7.0, 11.0],   // major 7
    [0.0, 4.0, 11.0, 14.0],  // major 9
    [0.0, 4.0, 7.0, 9.0],    // 6th
    [0.0, 7.0, 10.0, 14.0],  // dominant 9, no third
];

/// Four band-limited oscillators stacked into a chord.
///
/// harmonics: chord, timbre: inversion (lowest notes raised an octave),
/// morph: saw → square. aux is the root alone.
#[derive(Copy, Clone, Debug, Default)]
pub struct Chords {
    voices: [BlepOsc; 4],
    freqs: [f32; 4],
}

impl Model for Chords {
    fn reset(&mut self, _: &mut ScratchArena) {
        for v in &mut self.voices {
            v.reset();
        }
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let chord = &CHORDS[((p.harmonics * (CHORDS.len() - 1) as f32).round() as usize).min(CHORDS.len() - 1)];
        let raised = (p.timbre * 4.0) as usize;
        for (i, f) in self.freqs.iter_mut().enumerate() {
            let st = chord[i] + if i < raised { 12.0 } else { 0.0 };
            *f = p.scaled(semitones_to_ratio(st));
        }
        for fr in frames {
            let root = self.voices[0].morph(self.freqs[0], p.morph, 0.5);
            let mut sum = root;
            for (v, &f) in self.voices.iter_mut().zip(&self.freqs).skip(1) {
                sum += v.morph(f, p.morph, 0.5);
            }
            *fr = Frame::new(0.25 * sum, 0.5 * root);
        }
    }
}

// ---- 7: Vowels / speech ----

/// First three formant frequencies (Hz) of a, e, i, o, u.
const VOWELS: [[f32; 3]; 5] = [
    [730.0, 1090.0, 2440.0],
    [530.0, 1840.0, 2480.0],
    [270.0, 2290.0, 3010.0],
    [570.0, 840.0, 2410.0],
    [300.0, 870.0, 2240.0],
];
const FORMANT_GAINS: [f32; 3] = [1.0, 0.5, 0.25];
const FORMANT_Q: f32 = 8.0;

/// Buzz/noise source through three band-pass formants.
///
/// harmonics: formant shift (±1 octave), timbre: vowel a → u, morph: voiced →
/// whispered. aux is the raw glottal buzz.
#[derive(Copy, Clone, Debug)]
pub struct Vowels {
    buzz: BlepOsc,
    formants: [SvfTpt; 3],
    noise: NoiseSource,
}

impl Vowels {
    const NOISE_SEED: u32 = 0x5EED_0007;
}

impl Default for Vowels {
    fn default() -> Self {
        Self {
            buzz: BlepOsc::new(),
            formants: [SvfTpt::default(); 3],
            noise: NoiseSource::new(Self::NOISE_SEED),
        }
    }
}

impl Model for Vowels {
    fn reset(&mut self, _: &mut ScratchArena) {
        self.buzz.reset();
        for f in &mut self.formants {
            f.reset();
        }
        self.noise.reseed(Self::NOISE_SEED);
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let pos = p.timbre.clamp(0.0, 1.0) * (VOWELS.len() - 1) as f32;
        let v0 = (pos as usize).min(VOWELS.len() - 2);
        let frac = pos - v0 as f32;
        let shift = semitones_to_ratio((p.harmonics - 0.5) * 24.0);
        for (k, filter) in self.formants.iter_mut().enumerate() {
            let hz = lerp(VOWELS[v0][k], VOWELS[v0 + 1][k], frac) * shift;
            filter.set_f_q((hz / p.sample_rate).min(MAX_F), FORMANT_Q);
        }
        for fr in frames {
            let voiced = self.buzz.saw(p.f0);
            let src = lerp(voiced, self.noise.next11(), p.morph);
            let mut out = 0.0;
            for (filter, g) in self.formants.iter_mut().zip(FORMANT_GAINS) {
                out += filter.process_bp(src) * g / FORMANT_Q;
            }
            *fr = Frame::new(out, 0.5 * voiced);
        }
    }
}
