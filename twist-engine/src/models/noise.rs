//! Noise models: 8 Granular Cloud, 9 Filtered Noise, 10 Particle Noise.

use twist_core::arena::ScratchArena;
use twist_core::dsp::{lerp, semitones_to_ratio, sin01};
use twist_core::envelopes::ArExp;
use twist_core::filters::SvfTpt;

use super::{Model, ModelParams};
use crate::engine::Frame;
use crate::nodes::{Dust, NoiseSource, Phasor};

// ---- 8: Granular cloud ----

const GRAINS: usize = 8;

#[derive(Copy, Clone, Debug)]
struct Grain {
    phase: Phasor,
    ratio: f32,
    env: ArExp,
}

/// Up to eight randomly pitched sine grains.
///
/// harmonics: grain density, timbre: pitch scatter (±12 st), morph: grain
/// length. Even grains feed out, odd grains feed aux.
#[derive(Clone, Debug)]
pub struct Granular {
    grains: [Grain; GRAINS],
    noise: NoiseSource,
}

impl Granular {
    const SEED: u32 = 0x6A41_0008;

    pub fn new(sample_rate: f32) -> Self {
        let grain = Grain { phase: Phasor::new(), ratio: 1.0, env: ArExp::new(5.0, 50.0, sample_rate) };
        Self { grains: [grain; GRAINS], noise: NoiseSource::new(Self::SEED) }
    }
}

impl Model for Granular {
    fn reset(&mut self, _: &mut ScratchArena) {
        for g in &mut self.grains {
            g.phase.reset();
            g.ratio = 1.0;
            g.env.reset();
        }
        self.noise.reseed(Self::SEED);
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let density = 0.000_2 + 0.01 * p.harmonics * p.harmonics;
        let scatter = 12.0 * p.timbre;
        let (atk, rel) = (2.0 + 40.0 * p.morph, 10.0 + 400.0 * p.morph);
        for g in &mut self.grains {
            g.env.set_params(atk, rel);
        }
        for fr in frames {
            if self.noise.next01() < density {
                if let Some(g) = self.grains.iter_mut().find(|g| g.env.is_idle()) {
                    g.ratio = semitones_to_ratio(scatter * self.noise.next11());
                    g.phase.reset();
                    g.env.trigger();
                }
            }
            let (mut even, mut odd) = (0.0, 0.0);
            for (i, g) in self.grains.iter_mut().enumerate() {
                if g.env.is_idle() {
                    continue;
                }
                let e = g.env.next();
                let (ph, _) = g.phase.tick(p.scaled(g.ratio));
                let s = e * sin01(ph);
                if i % 2 == 0 { even += s; } else { odd += s; }
            }
            *fr = Frame::new(0.5 * even, 0.5 * odd);
        }
    }
}

// ---- 9: Filtered noise ----

/// White noise through a resonant state-variable filter tuned to the note.
///
/// harmonics: resonance, timbre: LP → BP → HP, morph: offset of a second
/// band-pass that joins the first on aux.
#[derive(Copy, Clone, Debug)]
pub struct FilteredNoise {
    noise: NoiseSource,
    main: SvfTpt,
    second: SvfTpt,
}

impl FilteredNoise {
    const SEED: u32 = 0x6A41_0009;
}

impl Default for FilteredNoise {
    fn default() -> Self {
        Self { noise: NoiseSource::new(Self::SEED), main: SvfTpt::default(), second: SvfTpt::default() }
    }
}

impl Model for FilteredNoise {
    fn reset(&mut self, _: &mut ScratchArena) {
        self.noise.reseed(Self::SEED);
        self.main.reset();
        self.second.reset();
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let q = 0.5 + 40.0 * p.harmonics * p.harmonics;
        self.main.set_f_q(p.f0, q);
        self.second.set_f_q(p.scaled(semitones_to_ratio(24.0 * p.morph)), q);
        let gain = 1.0 / q.sqrt();
        for fr in frames {
            let x = self.noise.next11();
            let t = self.main.process_all(x);
            let bp = t.bp / q;
            let y = if p.timbre < 0.5 {
                lerp(t.lp, bp, 2.0 * p.timbre)
            } else {
                lerp(bp, t.hp, 2.0 * p.timbre - 1.0)
            };
            let b2 = self.second.process_bp(x) / q;
            *fr = Frame::new(y * gain, (bp + b2) * 0.5);
        }
    }
}

// ---- 10: Particle noise ----

/// Random impulses ringing a band-pass whose pitch jumps with each particle.
///
/// harmonics: pitch scatter (±24 st), timbre: particle density, morph:
/// resonance. aux is the raw impulse train.
#[derive(Copy, Clone, Debug)]
pub struct Particle {
    dust: Dust,
    noise: NoiseSource,
    filter: SvfTpt,
    ratio: f32,
}

impl Particle {
    const DUST_SEED: u32 = 0x6A41_000A;
    const PITCH_SEED: u32 = 0x6A41_100A;
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            dust: Dust::new(Self::DUST_SEED),
            noise: NoiseSource::new(Self::PITCH_SEED),
            filter: SvfTpt::default(),
            ratio: 1.0,
        }
    }
}

impl Model for Particle {
    fn reset(&mut self, _: &mut ScratchArena) {
        *self = Self::default();
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let density = 0.000_5 + 0.05 * p.timbre * p.timbre;
        let scatter = 24.0 * p.harmonics;
        let q = 1.0 + 60.0 * p.morph;
        let gain = 1.0 / q.sqrt();
        self.filter.set_f_q(p.scaled(self.ratio), q);
        for fr in frames {
            let d = self.dust.next(density);
            if d != 0.0 {
                self.ratio = semitones_to_ratio(scatter * self.noise.next11());
                self.filter.set_f_q(p.scaled(self.ratio), q);
            }
            let y = self.filter.process_bp(d);
            *fr = Frame::new(y * gain, d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(h: f32, t: f32, m: f32) -> ModelParams {
        ModelParams { note: 69.0, f0: 440.0 / 48_000.0, harmonics: h, timbre: t, morph: m, sample_rate: 48_000.0 }
    }

    fn energy<M: Model>(m: &mut M, p: &ModelParams, n: usize) -> f32 {
        let mut arena = ScratchArena::with_capacity(0);
        let mut frames = [Frame::default(); 4];
        let mut e = 0.0;
        for _ in 0..n / 4 {
            m.render(p, &mut arena, &mut frames);
            for f in &frames {
                assert!(f.out.is_finite() && f.aux.is_finite());
                e += f.out * f.out;
            }
        }
        e
    }

    #[test]
    fn noise_models_make_sound_and_stay_finite() {
        for &(h, t, m) in &[(0.2, 0.2, 0.2), (0.5, 0.5, 0.5), (1.0, 1.0, 1.0)] {
            let p = params(h, t, m);
            assert!(energy(&mut Granular::new(48_000.0), &p, 48_000) > 0.0);
            assert!(energy(&mut FilteredNoise::default(), &p, 4_800) > 0.0);
            assert!(energy(&mut Particle::default(), &p, 48_000) > 0.0);
        }
    }

    #[test]
    fn reset_makes_noise_repeat() {
        let p = params(0.7, 0.3, 0.6);
        let mut arena = ScratchArena::with_capacity(0);
        let mut g = Granular::new(48_000.0);
        let mut a = vec![Frame::default(); 4096];
        let mut b = vec![Frame::default(); 4096];
        for c in a.chunks_mut(4) { g.render(&p, &mut arena, c); }
        g.reset(&mut arena);
        for c in b.chunks_mut(4) { g.render(&p, &mut arena, c); }
        assert_eq!(a, b);
    }

    #[test]
    fn grain_pool_never_exceeds_eight_voices() {
        let p = params(1.0, 1.0, 1.0);
        let mut g = Granular::new(48_000.0);
        let mut arena = ScratchArena::with_capacity(0);
        let mut frames = [Frame::default(); 4];
        for _ in 0..2_000 {
            g.render(&p, &mut arena, &mut frames);
            // eight unit sines at most, split over two outputs
            for f in &frames {
                assert!(f.out.abs() <= 2.0 && f.aux.abs() <= 2.0);
            }
        }
    }
}
