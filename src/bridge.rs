//! Lock-free bridge between the capture engine and the display.
//!
//! This module provides the shared state that lets a display thread read
//! the capture buffer while the audio thread writes it.
//!
//! # Architecture
//!
//! - **Audio thread** owns the [`CaptureEngine`] and is the only writer of
//!   samples and the cursor
//! - **Display thread** owns a [`ScopeHandle`]: it reads samples, cursor
//!   and mode flags, and may set the two mode flags
//! - Everything shared is an atomic; there are no locks and no
//!   channels
//!
//! # Usage
//!
//! ```ignore
//! let (display, mut engine) = create_scope(ModeFlags::default());
//!
//! // Audio thread: once per tick
//! engine.advance(&ctx, &inputs, &params);
//!
//! // Display thread: once per refresh
//! let snap = display.snapshot();
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::engine::CaptureEngine;
use crate::sample_buffer::{BUFFER_SIZE, SampleBuffer};
use crate::state::{ModeFlags, PersistResult};

/// State shared by the engine and every display handle.
#[derive(Debug)]
pub(crate) struct ScopeShared {
    pub(crate) buffer: SampleBuffer,
    lissajous: AtomicBool,
    external: AtomicBool,
}

impl ScopeShared {
    pub(crate) fn new() -> Self {
        Self::with_flags(ModeFlags::default())
    }

    pub(crate) fn with_flags(flags: ModeFlags) -> Self {
        Self {
            buffer: SampleBuffer::new(),
            lissajous: AtomicBool::new(flags.lissajous),
            external: AtomicBool::new(flags.external),
        }
    }

    #[inline]
    pub(crate) fn mode_flags(&self) -> ModeFlags {
        ModeFlags {
            lissajous: self.lissajous.load(Ordering::Relaxed),
            external: self.external.load(Ordering::Relaxed),
        }
    }

    #[inline]
    pub(crate) fn set_mode_flags(&self, flags: ModeFlags) {
        self.lissajous.store(flags.lissajous, Ordering::Relaxed);
        self.external.store(flags.external, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn toggle_external(&self) {
        self.external.fetch_xor(true, Ordering::Relaxed);
    }
}

/// Copy of the capture state taken by the display.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeSnapshot {
    pub x: [f32; BUFFER_SIZE],
    pub y: [f32; BUFFER_SIZE],
    /// Write cursor at the time of the copy
    pub cursor: usize,
    pub flags: ModeFlags,
}

impl Default for ScopeSnapshot {
    fn default() -> Self {
        Self {
            x: [0.0; BUFFER_SIZE],
            y: [0.0; BUFFER_SIZE],
            cursor: 0,
            flags: ModeFlags::default(),
        }
    }
}

/// Create a linked engine and display handle.
pub fn create_scope(flags: ModeFlags) -> (ScopeHandle, CaptureEngine) {
    let shared = Arc::new(ScopeShared::with_flags(flags));
    let handle = ScopeHandle::new(Arc::clone(&shared));
    let engine = CaptureEngine::with_shared(shared);
    (handle, engine)
}

/// Display-side handle.
///
/// Read-only with respect to capture state: it can read the buffer and
/// cursor and set the mode flags, nothing else. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ScopeHandle {
    shared: Arc<ScopeShared>,
}

impl ScopeHandle {
    pub(crate) fn new(shared: Arc<ScopeShared>) -> Self {
        Self { shared }
    }

    // ───────────────────────────────────────────────────────────────
    // Buffer readback
    // ───────────────────────────────────────────────────────────────

    /// Copy both channels, the cursor and the flags.
    ///
    /// The copy may straddle a write in progress.
    pub fn snapshot(&self) -> ScopeSnapshot {
        let mut snap = ScopeSnapshot::default();
        self.snapshot_into(&mut snap);
        snap
    }

    /// Like [`snapshot`](Self::snapshot) but reuses `out`.
    pub fn snapshot_into(&self, out: &mut ScopeSnapshot) {
        let buffer = &self.shared.buffer;
        out.cursor = buffer.cursor();
        buffer.copy_x(&mut out.x);
        buffer.copy_y(&mut out.y);
        out.flags = self.shared.mode_flags();
    }

    /// Copy the X channel into `out`.
    pub fn read_x(&self, out: &mut [f32]) {
        self.shared.buffer.copy_x(out);
    }

    /// Copy the Y channel into `out`.
    pub fn read_y(&self, out: &mut [f32]) {
        self.shared.buffer.copy_y(out);
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.shared.buffer.cursor()
    }

    // ───────────────────────────────────────────────────────────────
    // Mode flags
    // ───────────────────────────────────────────────────────────────

    #[inline]
    pub fn mode_flags(&self) -> ModeFlags {
        self.shared.mode_flags()
    }

    pub fn set_mode_flags(&self, flags: ModeFlags) {
        self.shared.set_mode_flags(flags);
    }

    pub fn set_lissajous(&self, on: bool) {
        self.shared.lissajous.store(on, Ordering::Relaxed);
    }

    pub fn set_external(&self, on: bool) {
        self.shared.external.store(on, Ordering::Relaxed);
    }

    /// Restore the default flags (Lissajous on, internal trigger).
    pub fn reset_mode_flags(&self) {
        self.shared.set_mode_flags(ModeFlags::default());
    }

    /// Saved form of the current flags.
    pub fn save_json(&self) -> serde_json::Value {
        self.mode_flags().to_json()
    }

    /// Apply a saved document. Missing keys keep their current value.
    pub fn load_json(&self, value: &serde_json::Value) -> PersistResult<()> {
        let mut flags = self.mode_flags();
        flags.apply_json(value)?;
        self.set_mode_flags(flags);
        Ok(())
    }
}
