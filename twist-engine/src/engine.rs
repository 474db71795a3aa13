//! Synthesis engine contract.
//!
//! This module defines the `SynthEngine` trait that every sound source of the
//! pipeline implements, plus the three plain-data types exchanged with it on every
//! render call: the [`Patch`] (slow, smoothed parameters), the [`Modulations`]
//! (per-tick gate and FM input) and the [`Frame`] (one native-rate output pair).
//!
//! Design goals
//! - No dynamic allocations in the render path
//! - The native sample rate is fixed once at construction and never renegotiated
//! - The pipeline is generic over the engine type, so engines can be swapped
//!   without trait objects

/// Smoothed per-tick engine parameters.
///
/// `note` is a linear pitch in semitones (MIDI note numbers, fractional allowed)
/// after tuning and drift. The four shape parameters are normalized to `[0, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Patch {
    pub note: f32,
    pub engine: i32,
    pub harmonics: f32,
    pub timbre: f32,
    pub morph: f32,
    pub decay: f32,
    pub lpg_colour: f32,
}

/// Per-tick modulation inputs. All zero unless a feature drives them.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Modulations {
    /// Pitch offset in semitones added on top of `Patch::note`.
    pub frequency: f32,
    /// Gate level; above 0.3 counts as high.
    pub trigger: f32,
    /// Whether `trigger` is wired at all. When false, engines free-run.
    pub trigger_patched: bool,
}

impl Modulations {
    /// Gate threshold for `trigger`.
    pub const TRIGGER_THRESHOLD: f32 = 0.3;

    #[inline]
    pub fn gate(&self) -> bool {
        self.trigger_patched && self.trigger > Self::TRIGGER_THRESHOLD
    }
}

/// One native-rate output frame: main and auxiliary signals, nominally in `[-1, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub out: f32,
    pub aux: f32,
}

impl Frame {
    #[inline]
    pub const fn new(out: f32, aux: f32) -> Self {
        Self { out, aux }
    }
}

/// Anything that renders frames at a fixed native rate.
pub trait SynthEngine {
    /// Native sample rate in Hz, fixed at construction.
    fn sample_rate(&self) -> f32;

    /// Restore the post-construction state. Must be deterministic: two resets
    /// followed by the same render calls produce identical frames.
    fn reset(&mut self);

    /// Render `frames.len()` frames with one patch and one set of modulations.
    fn render(&mut self, patch: &Patch, modulations: &Modulations, frames: &mut [Frame]);
}

impl<E: SynthEngine + ?Sized> SynthEngine for Box<E> {
    #[inline]
    fn sample_rate(&self) -> f32 {
        (**self).sample_rate()
    }

    #[inline]
    fn reset(&mut self) {
        (**self).reset();
    }

    #[inline]
    fn render(&mut self, patch: &Patch, modulations: &Modulations, frames: &mut [Frame]) {
        (**self).render(patch, modulations, frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ramp {
        n: f32,
    }

    impl SynthEngine for Ramp {
        fn sample_rate(&self) -> f32 { 48_000.0 }
        fn reset(&mut self) { self.n = 0.0; }
        fn render(&mut self, _: &Patch, _: &Modulations, frames: &mut [Frame]) {
            for f in frames {
                *f = Frame::new(self.n, -self.n);
                self.n += 1.0;
            }
        }
    }

    #[test]
    fn boxed_engines_forward() {
        let mut e: Box<dyn SynthEngine> = Box::new(Ramp { n: 0.0 });
        let mut buf = [Frame::default(); 3];
        e.render(&Patch::default(), &Modulations::default(), &mut buf);
        assert_eq!(buf[2], Frame::new(2.0, -2.0));
        e.reset();
        e.render(&Patch::default(), &Modulations::default(), &mut buf);
        assert_eq!(buf[0].out, 0.0);
    }

    #[test]
    fn gate_needs_patch_and_level() {
        let mut m = Modulations { trigger: 1.0, ..Modulations::default() };
        assert!(!m.gate());
        m.trigger_patched = true;
        assert!(m.gate());
        m.trigger = 0.2;
        assert!(!m.gate());
    }
}
