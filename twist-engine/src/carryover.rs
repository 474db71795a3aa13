//! Fixed-capacity FIFO of resampled frames that did not fit the block they were
//! produced in.
//!
//! Capacity equals the resampler's largest single burst. The pipeline only
//! pushes while the FIFO is empty at the start of the burst, so it can never
//! overflow; a push past capacity is refused rather than growing the buffer.

use crate::engine::Frame;

#[derive(Clone, Debug)]
pub struct Carryover {
    buf: Box<[Frame]>,
    head: usize,
    len: usize,
}

impl Carryover {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: vec![Frame::default(); capacity].into_boxed_slice(), head: 0, len: 0 }
    }

    #[inline] pub fn capacity(&self) -> usize { self.buf.len() }
    #[inline] pub fn len(&self) -> usize { self.len }
    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }

    #[inline]
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Append at the back. Returns `false` (and drops nothing already held) when full.
    #[inline]
    #[must_use]
    pub fn push(&mut self, f: Frame) -> bool {
        if self.len == self.buf.len() {
            return false;
        }
        let tail = (self.head + self.len) % self.buf.len();
        self.buf[tail] = f;
        self.len += 1;
        true
    }

    /// Take from the front.
    #[inline]
    pub fn pop(&mut self) -> Option<Frame> {
        if self.len == 0 {
            return None;
        }
        let f = self.buf[self.head];
        self.head = (self.head + 1) % self.buf.len();
        self.len -= 1;
        Some(f)
    }
}
