// src/sample_buffer.rs

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Number of sample pairs in one acquisition window.
pub const BUFFER_SIZE: usize = 512;

/// Fixed-capacity X/Y capture buffer with one shared write cursor.
///
/// Cells hold `f32` bit patterns in atomics so the display can
/// read while the audio tick writes. A reader may see a window that is
/// partly from the previous cycle; single values are never torn.
#[derive(Debug)]
pub struct SampleBuffer {
    x: [AtomicU32; BUFFER_SIZE],
    y: [AtomicU32; BUFFER_SIZE],
    cursor: AtomicUsize,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self {
            x: std::array::from_fn(|_| AtomicU32::new(0.0_f32.to_bits())),
            y: std::array::from_fn(|_| AtomicU32::new(0.0_f32.to_bits())),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Write a pair at the cursor and advance it.
    ///
    /// Returns `false` without writing when the buffer is full.
    #[inline]
    pub(crate) fn push(&self, x: f32, y: f32) -> bool {
        let pos = self.cursor.load(Ordering::Relaxed);
        if pos >= BUFFER_SIZE {
            return false;
        }
        self.x[pos].store(x.to_bits(), Ordering::Relaxed);
        self.y[pos].store(y.to_bits(), Ordering::Relaxed);
        self.cursor.store(pos + 1, Ordering::Release);
        true
    }

    /// Move the cursor back to the start of the window.
    ///
    /// Old contents stay in place until overwritten.
    #[inline]
    pub(crate) fn rewind(&self) {
        self.cursor.store(0, Ordering::Release);
    }

    /// Current write cursor (0..=BUFFER_SIZE).
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.cursor() >= BUFFER_SIZE
    }

    #[inline]
    pub fn x(&self, index: usize) -> f32 {
        f32::from_bits(self.x[index].load(Ordering::Relaxed))
    }

    #[inline]
    pub fn y(&self, index: usize) -> f32 {
        f32::from_bits(self.y[index].load(Ordering::Relaxed))
    }

    /// Copy the X channel into `out` (up to `BUFFER_SIZE` values).
    pub fn copy_x(&self, out: &mut [f32]) {
        for (i, v) in out.iter_mut().take(BUFFER_SIZE).enumerate() {
            *v = self.x(i);
        }
    }

    /// Copy the Y channel into `out` (up to `BUFFER_SIZE` values).
    pub fn copy_y(&self, out: &mut [f32]) {
        for (i, v) in out.iter_mut().take(BUFFER_SIZE).enumerate() {
            *v = self.y(i);
        }
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
