//! Pitched oscillator models: 0 Waveforms, 1 Waveshaper, 2 2-Operator FM, 3 Formant/PD.

use twist_core::arena::ScratchArena;
use twist_core::dsp::{fold, lerp, saturate, semitones_to_ratio, sin01};
use twist_core::filters::DcBlock;

use super::{Model, ModelParams};
use crate::engine::Frame;
use crate::nodes::{wave_sample, BlepOsc, Phasor, Wave};

// ---- 0: Waveforms ----

/// Two band-limited oscillators, each sweeping saw → pulse.
///
/// harmonics: detune of the second oscillator (±12 st), timbre: pulse width,
/// morph: waveshape. aux is the ring product of the pair.
#[derive(Copy, Clone, Debug, Default)]
pub struct Waveforms {
    a: BlepOsc,
    b: BlepOsc,
}

impl Model for Waveforms {
    fn reset(&mut self, _: &mut ScratchArena) {
        self.a.reset();
        self.b.reset();
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let fb = p.scaled(semitones_to_ratio((p.harmonics - 0.5) * 24.0));
        let pw = 0.5 - 0.45 * p.timbre;
        for fr in frames {
            let a = self.a.morph(p.f0, p.morph, pw);
            let b = self.b.morph(fb, p.morph, pw);
            *fr = Frame::new(0.5 * (a + b), a * b);
        }
    }
}

// ---- 1: Waveshaper ----

/// Triangle into a drive stage that crossfades soft clipping and sine folding.
///
/// harmonics: asymmetry (bias), timbre: drive, morph: clip → fold. The bias
/// offset is removed by a DC blocker on both outputs.
#[derive(Copy, Clone, Debug)]
pub struct Waveshaper {
    osc: Phasor,
    dc_out: DcBlock,
    dc_aux: DcBlock,
}

impl Waveshaper {
    pub fn new(sample_rate: f32) -> Self {
        Self { osc: Phasor::default(), dc_out: DcBlock::new(20.0, sample_rate), dc_aux: DcBlock::new(20.0, sample_rate) }
    }
}

impl Model for Waveshaper {
    fn reset(&mut self, _: &mut ScratchArena) {
        self.osc.reset();
        self.dc_out.reset();
        self.dc_aux.reset();
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let drive = 1.0 + 7.0 * p.timbre;
        let bias = (p.harmonics - 0.5) * 0.8;
        for fr in frames {
            let (ph, _) = self.osc.tick(p.f0);
            let x = wave_sample(ph, Wave::Tri) + bias / drive;
            let out = lerp(saturate(x, drive), fold(x * drive), p.morph);
            *fr = Frame::new(self.dc_out.process(out), self.dc_aux.process(fold(1.5 * drive * x)));
        }
    }
}

// ---- 2: 2-operator FM ----

/// Modulator/carrier frequency ratios selectable with harmonics.
const FM_RATIOS: [f32; 9] = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 4.0, 5.0, 7.0];

/// Sine carrier phase-modulated by a sine modulator with self-feedback.
///
/// harmonics: ratio, timbre: index, morph: modulator feedback. aux is the modulator.
#[derive(Copy, Clone, Debug, Default)]
pub struct Fm2 {
    carrier: Phasor,
    modulator: Phasor,
    prev: f32,
}

impl Model for Fm2 {
    fn reset(&mut self, _: &mut ScratchArena) {
        self.carrier.reset();
        self.modulator.reset();
        self.prev = 0.0;
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let slot = (p.harmonics * (FM_RATIOS.len() - 1) as f32).round() as usize;
        let fm = p.scaled(FM_RATIOS[slot.min(FM_RATIOS.len() - 1)]);
        let index = 1.5 * p.timbre * p.timbre;
        let feedback = 0.25 * p.morph;
        for fr in frames {
            let (mp, _) = self.modulator.tick(fm);
            let m = sin01(mp + feedback * self.prev);
            self.prev = m;
            let (cp, _) = self.carrier.tick(p.f0);
            *fr = Frame::new(sin01(cp + index * m), m);
        }
    }
}

// ---- 3: Formant / phase distortion ----

/// Phase-distorted sine crossfaded with a hard-synced, windowed formant.
///
/// harmonics: formant ratio (up to 4 octaves), timbre: distortion knee,
/// morph: PD → formant. aux is the formant alone.
#[derive(Copy, Clone, Debug, Default)]
pub struct Formant {
    master: Phasor,
    formant: Phasor,
}

impl Model for Formant {
    fn reset(&mut self, _: &mut ScratchArena) {
        self.master.reset();
        self.formant.reset();
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let knee = 0.5 - 0.49 * p.timbre;
        let ff = p.scaled(semitones_to_ratio(48.0 * p.harmonics));
        for fr in frames {
            let (ph, wrapped) = self.master.tick(p.f0);
            let warped = if ph < knee {
                0.5 * ph / knee
            } else {
                0.5 + 0.5 * (ph - knee) / (1.0 - knee)
            };
            let pd = sin01(warped);
            let (fp, _) = self.formant.tick(ff);
            let form = sin01(fp) * (1.0 - ph);
            if wrapped {
                self.formant.reset();
            }
            *fr = Frame::new(lerp(pd, form, p.morph), form);
        }
    }
}
