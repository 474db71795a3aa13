//! Streaming stereo rate conversion on top of rubato's `SincFixedIn`.
//!
//! Native frames go in a fixed-size chunk at a time; a variable, bounded number
//! of target-rate frames come out. Filter state and fractional phase persist
//! across calls until [`StreamResampler::reset`]. All planar buffers are
//! allocated once at construction.

use rubato::{Resampler, SincFixedIn};

use crate::config::ResamplerQuality;
use crate::engine::Frame;
use crate::error::{Result, TwistError};

pub struct StreamResampler {
    inner: SincFixedIn<f32>,
    ratio: f64,
    input: [Vec<f32>; 2],
    output: [Vec<f32>; 2],
    written: usize,
}

impl StreamResampler {
    /// `ratio` is target rate / native rate and must be positive and finite.
    pub fn new(ratio: f64, chunk: usize, quality: ResamplerQuality) -> Result<Self> {
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(TwistError::InvalidRatio(ratio));
        }
        let inner = SincFixedIn::<f32>::new(ratio, 1.0, quality.sinc_parameters(), chunk, 2)?;
        let (max_in, max_out) = (inner.input_frames_max(), inner.output_frames_max());
        log::debug!(
            "resampler ready: ratio {ratio:.5}, chunk {chunk}, max burst {max_out}, delay {} frames",
            inner.output_delay()
        );
        Ok(Self {
            inner,
            ratio,
            input: [vec![0.0; max_in], vec![0.0; max_in]],
            output: [vec![0.0; max_out], vec![0.0; max_out]],
            written: 0,
        })
    }

    #[inline] pub fn ratio(&self) -> f64 { self.ratio }

    /// Native frames the next [`process`](Self::process) call consumes.
    #[inline] pub fn input_frames_next(&self) -> usize { self.inner.input_frames_next() }

    /// Largest native chunk ever requested.
    #[inline] pub fn input_frames_max(&self) -> usize { self.inner.input_frames_max() }

    /// Largest number of frames a single call can produce.
    #[inline] pub fn max_burst(&self) -> usize { self.inner.output_frames_max() }

    /// Group delay in output frames.
    #[inline] pub fn latency(&self) -> usize { self.inner.output_delay() }

    /// Drop all filter history and phase.
    pub fn reset(&mut self) {
        self.inner.reset();
        self.written = 0;
    }

    /// Convert one chunk taken from the front of `pending`.
    ///
    /// Returns `(consumed, produced)`. Produced frames are readable through
    /// [`frame`](Self::frame) until the next call.
    pub fn process(&mut self, pending: &[Frame]) -> Result<(usize, usize)> {
        let need = self.inner.input_frames_next();
        if pending.len() < need {
            return Err(TwistError::Config(format!("resampler needs {need} frames, {} pending", pending.len())));
        }
        let [l, r] = &mut self.input;
        for (i, f) in pending[..need].iter().enumerate() {
            l[i] = f.out;
            r[i] = f.aux;
        }
        let (used, written) = self.inner.process_into_buffer(&self.input, &mut self.output, None)?;
        self.written = written;
        Ok((used, written))
    }

    /// Output frame `i` of the last call; `i` must be below the produced count.
    #[inline]
    pub fn frame(&self, i: usize) -> Frame {
        debug_assert!(i < self.written);
        Frame::new(self.output[0][i], self.output[1][i])
    }
}

impl core::fmt::Debug for StreamResampler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamResampler")
            .field("ratio", &self.ratio)
            .field("chunk", &self.inner.input_frames_next())
            .field("max_burst", &self.inner.output_frames_max())
            .finish_non_exhaustive()
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(rs: &mut StreamResampler, calls: usize) -> (usize, usize) {
        let chunk = vec![Frame::new(0.25, -0.25); rs.input_frames_next()];
        let (mut consumed, mut produced) = (0, 0);
        for _ in 0..calls {
            let (u, w) = rs.process(&chunk).unwrap();
            assert!(w <= rs.max_burst());
            consumed += u;
            produced += w;
        }
        (consumed, produced)
    }

    #[test]
    fn rejects_non_positive_and_non_finite_ratios() {
        for r in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                StreamResampler::new(r, 4, ResamplerQuality::Fast),
                Err(TwistError::InvalidRatio(_))
            ));
        }
    }

    #[test]
    fn long_run_output_tracks_the_ratio() {
        for ratio in [0.5, 1.0, 44_100.0 * 2.0 / 48_000.0, 4.0] {
            let mut rs = StreamResampler::new(ratio, 4, ResamplerQuality::Medium).unwrap();
            let (consumed, produced) = drive(&mut rs, 5_000);
            let expected = consumed as f64 * ratio;
            // only the filter delay (plus a couple of input frames of lookahead) is missing
            let slack = rs.latency() as f64 + 3.0 * ratio + 2.0;
            assert!((expected - produced as f64).abs() <= slack, "ratio {ratio}: {produced} vs {expected}");
        }
    }

    #[test]
    fn dc_passes_through_after_settling() {
        let mut rs = StreamResampler::new(2.0, 4, ResamplerQuality::Medium).unwrap();
        drive(&mut rs, 200);
        let (_, w) = rs.process(&[Frame::new(0.25, -0.25); 4]).unwrap();
        assert!(w > 0);
        for i in 0..w {
            let f = rs.frame(i);
            assert!((f.out - 0.25).abs() < 0.01 && (f.aux + 0.25).abs() < 0.01, "{f:?}");
        }
    }

    #[test]
    fn short_input_is_an_error_not_a_panic() {
        let mut rs = StreamResampler::new(1.0, 4, ResamplerQuality::Fast).unwrap();
        assert!(rs.process(&[Frame::default(); 3]).is_err());
    }

    #[test]
    fn reset_reproduces_the_same_stream() {
        let mut rs = StreamResampler::new(1.5, 4, ResamplerQuality::Fast).unwrap();
        let collect = |rs: &mut StreamResampler| {
            let mut out = Vec::new();
            for k in 0..64 {
                let x = (k as f32 * 0.1).sin();
                let (_, w) = rs.process(&[Frame::new(x, x); 4]).unwrap();
                out.extend((0..w).map(|i| rs.frame(i)));
            }
            out
        };
        let a = collect(&mut rs);
        rs.reset();
        assert_eq!(a, collect(&mut rs));
    }
}
