//! Drum models: 13 Analog Kick, 14 Analog Snare, 15 Analog Hi-Hat.
//!
//! Each carries its own amplitude envelope, so the voice routes them around the
//! low-pass gate.

use twist_core::arena::ScratchArena;
use twist_core::dsp::{lerp, sin01, soft_clip};
use twist_core::envelopes::DecayEnvelope;
use twist_core::filters::SvfTpt;

use super::{Model, ModelParams};
use crate::engine::Frame;
use crate::nodes::{NoiseSource, Phasor};

// ---- 13: Kick ----

/// Sine with a pitch sweep and an exponential body decay.
///
/// harmonics: punch (sweep depth), timbre: drive, morph: decay.
/// aux is the undriven body.
#[derive(Copy, Clone, Debug)]
pub struct Kick {
    osc: Phasor,
    amp: DecayEnvelope,
    sweep: DecayEnvelope,
}

impl Kick {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            osc: Phasor::new(),
            amp: DecayEnvelope::new(300.0, sample_rate),
            sweep: DecayEnvelope::new(8.0, sample_rate),
        }
    }
}

impl Model for Kick {
    fn reset(&mut self, _: &mut ScratchArena) {
        self.osc.reset();
        self.amp.reset();
        self.sweep.reset();
    }

    fn strike(&mut self) {
        self.osc.reset();
        self.amp.strike();
        self.sweep.strike();
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        self.amp.set_decay_ms(40.0 + 1500.0 * p.morph * p.morph);
        let punch = 8.0 * p.harmonics;
        let drive = 1.0 + 4.0 * p.timbre;
        for fr in frames {
            let f = p.scaled(1.0 + punch * self.sweep.next());
            let (ph, _) = self.osc.tick(f);
            let body = sin01(ph) * self.amp.next();
            *fr = Frame::new(soft_clip(body * drive), body);
        }
    }
}

// ---- 14: Snare ----

/// Two-mode drum body plus high-passed noise, each with its own decay.
///
/// harmonics: snappiness (noise decay), timbre: body → noise balance,
/// morph: overall decay. aux is the noise layer.
#[derive(Copy, Clone, Debug)]
pub struct Snare {
    body: [Phasor; 2],
    tone_env: DecayEnvelope,
    noise_env: DecayEnvelope,
    noise: NoiseSource,
    hp: SvfTpt,
}

impl Snare {
    const SEED: u32 = 0x6A41_000E;
    const SECOND_MODE: f32 = 1.47;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            body: [Phasor::new(); 2],
            tone_env: DecayEnvelope::new(80.0, sample_rate),
            noise_env: DecayEnvelope::new(120.0, sample_rate),
            noise: NoiseSource::new(Self::SEED),
            hp: SvfTpt::new(2_000.0, 0.8, sample_rate),
        }
    }
}

impl Model for Snare {
    fn reset(&mut self, _: &mut ScratchArena) {
        for b in &mut self.body {
            b.reset();
        }
        self.tone_env.reset();
        self.noise_env.reset();
        self.noise.reseed(Self::SEED);
        self.hp.reset();
    }

    fn strike(&mut self) {
        for b in &mut self.body {
            b.reset();
        }
        self.tone_env.strike();
        self.noise_env.strike();
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        self.tone_env.set_decay_ms(30.0 + 300.0 * p.morph);
        self.noise_env.set_decay_ms((40.0 + 400.0 * p.morph) * (0.5 + p.harmonics));
        let f1 = p.scaled(Self::SECOND_MODE);
        for fr in frames {
            let (p0, _) = self.body[0].tick(p.f0);
            let (p1, _) = self.body[1].tick(f1);
            let tone = (sin01(p0) + 0.5 * sin01(p1)) * 0.66 * self.tone_env.next();
            let n = self.hp.process_hp(self.noise.next11()) * self.noise_env.next();
            *fr = Frame::new(lerp(tone, n, p.timbre), n);
        }
    }
}

// ---- 15: Hi-hat ----

/// Inharmonic frequency ratios of the six square oscillators.
const METALLIC: [f32; 6] = [1.0, 1.4471, 1.6170, 1.9265, 2.5028, 2.6637];

/// Six detuned squares and noise, high-passed and enveloped.
///
/// harmonics: metal → noise, timbre: high-pass cutoff, morph: decay.
/// aux is the enveloped metallic layer before filtering.
#[derive(Copy, Clone, Debug)]
pub struct HiHat {
    osc: [Phasor; 6],
    env: DecayEnvelope,
    noise: NoiseSource,
    hp: SvfTpt,
}

impl HiHat {
    const SEED: u32 = 0x6A41_000F;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            osc: [Phasor::new(); 6],
            env: DecayEnvelope::new(60.0, sample_rate),
            noise: NoiseSource::new(Self::SEED),
            hp: SvfTpt::default(),
        }
    }
}

impl Model for HiHat {
    fn reset(&mut self, _: &mut ScratchArena) {
        for o in &mut self.osc {
            o.reset();
        }
        self.env.reset();
        self.noise.reseed(Self::SEED);
        self.hp.reset();
    }

    fn strike(&mut self) {
        self.env.strike();
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        self.env.set_decay_ms(10.0 + 600.0 * p.morph * p.morph);
        self.hp.set_f_q(0.05 + 0.35 * p.timbre, 1.0);
        let mut freqs = [0.0; 6];
        for (f, r) in freqs.iter_mut().zip(METALLIC) {
            *f = p.scaled(4.0 * r);
        }
        for fr in frames {
            let mut metal = 0.0;
            for (o, &f) in self.osc.iter_mut().zip(&freqs) {
                let (ph, _) = o.tick(f);
                metal += if ph < 0.5 { 1.0 } else { -1.0 };
            }
            metal /= 6.0;
            let e = self.env.next();
            let x = lerp(metal, self.noise.next11(), p.harmonics);
            *fr = Frame::new(self.hp.process_hp(x) * e, metal * e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModelParams {
        ModelParams { note: 36.0, f0: 65.4 / 48_000.0, harmonics: 0.5, timbre: 0.5, morph: 0.3, sample_rate: 48_000.0 }
    }

    fn peak(m: &mut dyn Model, n: usize) -> f32 {
        let mut arena = ScratchArena::with_capacity(0);
        let mut frames = [Frame::default(); 4];
        let mut pk = 0.0f32;
        for _ in 0..n / 4 {
            m.render(&params(), &mut arena, &mut frames);
            for f in &frames {
                assert!(f.out.is_finite() && f.aux.is_finite());
                pk = pk.max(f.out.abs());
            }
        }
        pk
    }

    #[test]
    fn drums_are_silent_until_struck_then_decay() {
        let sr = 48_000.0;
        let mut kit: [Box<dyn Model>; 3] = [Box::new(Kick::new(sr)), Box::new(Snare::new(sr)), Box::new(HiHat::new(sr))];
        for d in &mut kit {
            assert_eq!(peak(d.as_mut(), 1024), 0.0);
            d.strike();
            let hit = peak(d.as_mut(), 2048);
            assert!(hit > 0.01, "hit={hit}");
            let _ = peak(d.as_mut(), 240_000);
            assert_eq!(peak(d.as_mut(), 1024), 0.0);
        }
    }

    #[test]
    fn kick_restrike_restarts_the_sweep() {
        let mut k = Kick::new(48_000.0);
        let mut arena = ScratchArena::with_capacity(0);
        let mut a = [Frame::default(); 8];
        let mut b = [Frame::default(); 8];
        k.strike();
        k.render(&params(), &mut arena, &mut a);
        k.strike();
        k.render(&params(), &mut arena, &mut b);
        for (x, y) in a.iter().zip(&b) {
            assert!((x.out - y.out).abs() < 1e-3);
        }
    }
}
