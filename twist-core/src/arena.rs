//! Flat scratch arena for engine working memory.
//!
//! One `f32` buffer is allocated up front; engines carve fixed regions out of it at
//! construction with a bump pointer and address them through [`Region`] handles
//! afterwards. Nothing is ever freed individually and nothing grows, so the render
//! path never touches the allocator.

use alloc::vec;
use alloc::vec::Vec;

/// Handle to a slice of the arena: `len` samples starting at `offset`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Region {
    offset: usize,
    len: usize,
}

impl Region {
    #[inline] pub fn len(&self) -> usize { self.len }
    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }
}

/// Returned when a region request does not fit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArenaExhausted {
    pub requested: usize,
    pub available: usize,
}

impl core::fmt::Display for ArenaExhausted {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "scratch arena exhausted: requested {} samples, {} available", self.requested, self.available)
    }
}

/// Bump allocator over a single pre-sized buffer.
#[derive(Clone, Debug)]
pub struct ScratchArena {
    buf: Vec<f32>,
    used: usize,
}

impl ScratchArena {
    pub fn with_capacity(len: usize) -> Self {
        Self { buf: vec![0.0; len], used: 0 }
    }

    #[inline] pub fn capacity(&self) -> usize { self.buf.len() }
    #[inline] pub fn used(&self) -> usize { self.used }
    #[inline] pub fn available(&self) -> usize { self.buf.len() - self.used }

    /// Carve `len` zeroed samples off the end of the used area.
    pub fn alloc(&mut self, len: usize) -> Result<Region, ArenaExhausted> {
        if len > self.available() {
            return Err(ArenaExhausted { requested: len, available: self.available() });
        }
        let region = Region { offset: self.used, len };
        self.used += len;
        Ok(region)
    }

    #[inline]
    pub fn slice(&self, r: Region) -> &[f32] {
        &self.buf[r.offset..r.offset + r.len]
    }

    #[inline]
    pub fn slice_mut(&mut self, r: Region) -> &mut [f32] {
        &mut self.buf[r.offset..r.offset + r.len]
    }

    /// Zero everything handed out so far; regions stay valid.
    pub fn clear(&mut self) {
        self.buf[..self.used].fill(0.0);
    }
}

// ------------------------------------ Tests --------------------------------------
