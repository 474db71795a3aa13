//! Physical models: 11 Inharmonic String, 12 Modal Resonator.
//!
//! Both are silent until struck; the voice strikes them on reset and on every
//! rising trigger edge.

use twist_core::arena::{ArenaExhausted, Region, ScratchArena};
use twist_core::dsp::{kill_denormals, lerp};
use twist_core::envelopes::DecayEnvelope;
use twist_core::filters::SvfTpt;

use super::{Model, ModelParams, MAX_F};
use crate::engine::Frame;
use crate::nodes::NoiseSource;

// ---- 11: Inharmonic string ----

/// Delay-line length; covers periods down to ~12 Hz at 48 kHz.
const STRING_LEN: usize = 4096;

/// Karplus-Strong string with a dispersion all-pass in the loop.
///
/// harmonics: dispersion (inharmonicity), timbre: brightness of the loop
/// filter, morph: sustain. aux is a pickup halfway along the string.
#[derive(Copy, Clone, Debug)]
pub struct KarplusString {
    line: Region,
    write: usize,
    excite_pending: bool,
    excite_left: usize,
    noise: NoiseSource,
    damp: f32,
    ap_x1: f32,
    ap_y1: f32,
}

impl KarplusString {
    pub const ARENA_LEN: usize = STRING_LEN;
    const SEED: u32 = 0x6A41_000B;

    pub fn new(arena: &mut ScratchArena) -> Result<Self, ArenaExhausted> {
        Ok(Self {
            line: arena.alloc(STRING_LEN)?,
            write: 0,
            excite_pending: false,
            excite_left: 0,
            noise: NoiseSource::new(Self::SEED),
            damp: 0.0,
            ap_x1: 0.0,
            ap_y1: 0.0,
        })
    }

    /// Fractional read `delay` samples behind the write head.
    #[inline]
    fn tap(buf: &[f32], write: usize, delay: f32) -> f32 {
        let pos = write as f32 + STRING_LEN as f32 - delay;
        let i0 = pos as usize;
        let frac = pos - i0 as f32;
        lerp(buf[i0 % STRING_LEN], buf[(i0 + 1) % STRING_LEN], frac)
    }
}

impl Model for KarplusString {
    fn reset(&mut self, _: &mut ScratchArena) {
        self.write = 0;
        self.excite_pending = false;
        self.excite_left = 0;
        self.noise.reseed(Self::SEED);
        self.damp = 0.0;
        self.ap_x1 = 0.0;
        self.ap_y1 = 0.0;
    }

    fn strike(&mut self) {
        self.excite_pending = true;
    }

    fn render(&mut self, p: &ModelParams, arena: &mut ScratchArena, frames: &mut [Frame]) {
        let period = (1.0 / p.f0).clamp(2.0, (STRING_LEN - 2) as f32);
        if self.excite_pending {
            self.excite_pending = false;
            self.excite_left = period as usize;
        }
        let brightness = 0.2 + 0.79 * p.timbre;
        let feedback = 0.95 + 0.0499 * p.morph;
        let g = 0.6 * p.harmonics;
        let buf = arena.slice_mut(self.line);
        for fr in frames {
            let s = Self::tap(buf, self.write, period);
            let pickup = Self::tap(buf, self.write, 0.5 * period);
            let exc = if self.excite_left > 0 {
                self.excite_left -= 1;
                0.8 * self.noise.next11()
            } else {
                0.0
            };
            self.damp += brightness * (s - self.damp);
            let ap = kill_denormals(-g * self.damp + self.ap_x1 + g * self.ap_y1);
            self.ap_x1 = self.damp;
            self.ap_y1 = ap;
            let y = exc + ap * feedback;
            buf[self.write] = y;
            self.write = (self.write + 1) % STRING_LEN;
            *fr = Frame::new(y, pickup);
        }
    }
}

// ---- 12: Modal resonator ----

const MODES: usize = 8;

/// Eight tuned band-pass modes excited by a short noise burst.
///
/// harmonics: partial stretch (inharmonicity), timbre: brightness (spectral
/// tilt), morph: decay. aux carries the odd modes.
#[derive(Copy, Clone, Debug)]
pub struct Modal {
    modes: [SvfTpt; MODES],
    gains: [f32; MODES],
    exciter: DecayEnvelope,
    noise: NoiseSource,
}

impl Modal {
    const SEED: u32 = 0x6A41_000C;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            modes: [SvfTpt::default(); MODES],
            gains: [0.0; MODES],
            exciter: DecayEnvelope::new(2.0, sample_rate),
            noise: NoiseSource::new(Self::SEED),
        }
    }
}

impl Model for Modal {
    fn reset(&mut self, _: &mut ScratchArena) {
        for m in &mut self.modes {
            m.reset();
        }
        self.exciter.reset();
        self.noise.reseed(Self::SEED);
    }

    fn strike(&mut self) {
        self.exciter.strike();
    }

    fn render(&mut self, p: &ModelParams, _: &mut ScratchArena, frames: &mut [Frame]) {
        let stretch = 1.0 + (p.harmonics - 0.5) * 0.5;
        let q = 20.0 + 480.0 * p.morph * p.morph;
        let tilt = 2.0 * (1.0 - p.timbre);
        for (k, (mode, gain)) in self.modes.iter_mut().zip(&mut self.gains).enumerate() {
            let n = (k + 1) as f32;
            let f = p.f0 * n.powf(stretch);
            if f < MAX_F {
                mode.set_f_q(f, q);
                *gain = 4.0 * n.powf(-tilt) / q;
            } else {
                *gain = 0.0;
            }
        }
        for fr in frames {
            let x = self.noise.next11() * self.exciter.next();
            let (mut out, mut odd) = (0.0, 0.0);
            for (k, (mode, &gain)) in self.modes.iter_mut().zip(&self.gains).enumerate() {
                if gain == 0.0 {
                    continue;
                }
                let y = mode.process_bp(x) * gain;
                out += y;
                if k % 2 == 0 {
                    odd += y;
                }
            }
            *fr = Frame::new(out, odd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(f0: f32) -> ModelParams {
        ModelParams { note: 45.0, f0, harmonics: 0.5, timbre: 0.5, morph: 0.5, sample_rate: 48_000.0 }
    }

    fn peak<M: Model>(m: &mut M, arena: &mut ScratchArena, p: &ModelParams, n: usize) -> f32 {
        let mut frames = [Frame::default(); 4];
        let mut peak = 0.0f32;
        for _ in 0..n / 4 {
            m.render(p, arena, &mut frames);
            for f in &frames {
                assert!(f.out.is_finite() && f.aux.is_finite());
                peak = peak.max(f.out.abs());
            }
        }
        peak
    }

    #[test]
    fn string_is_silent_until_struck() {
        let mut arena = ScratchArena::with_capacity(KarplusString::ARENA_LEN);
        let mut s = KarplusString::new(&mut arena).unwrap();
        let p = params(110.0 / 48_000.0);
        assert_eq!(peak(&mut s, &mut arena, &p, 1024), 0.0);
        s.strike();
        assert!(peak(&mut s, &mut arena, &p, 4096) > 0.05);
    }

    #[test]
    fn string_rings_down() {
        let mut arena = ScratchArena::with_capacity(KarplusString::ARENA_LEN);
        let mut s = KarplusString::new(&mut arena).unwrap();
        let p = ModelParams { morph: 0.0, ..params(220.0 / 48_000.0) };
        s.strike();
        let early = peak(&mut s, &mut arena, &p, 2048);
        let _ = peak(&mut s, &mut arena, &p, 48_000);
        let late = peak(&mut s, &mut arena, &p, 2048);
        assert!(late < 0.1 * early, "early={early} late={late}");
    }

    #[test]
    fn modal_rings_after_strike_and_decays() {
        let mut arena = ScratchArena::with_capacity(0);
        let mut m = Modal::new(48_000.0);
        let p = params(220.0 / 48_000.0);
        assert_eq!(peak(&mut m, &mut arena, &p, 256), 0.0);
        m.strike();
        let early = peak(&mut m, &mut arena, &p, 4_800);
        assert!(early > 0.0);
        let _ = peak(&mut m, &mut arena, &p, 96_000);
        let late = peak(&mut m, &mut arena, &p, 4_800);
        assert!(late < 0.1 * early, "early={early} late={late}");
    }
}
