// src/lib.rs
//
// Library entry point for Rust, FFI (iOS/Swift) and WebAssembly consumers.

mod bridge;
mod display;
mod engine;
mod sample_buffer;
mod state;
mod trigger;

#[cfg(feature = "ios")]
pub mod ffi;

#[cfg(feature = "web")]
pub mod wasm;

// Re-export key types for Rust consumers
pub use bridge::{ScopeHandle, ScopeSnapshot, create_scope};
pub use display::{ChannelStats, DisplayFrame, StatsMeter, ViewSettings};
pub use engine::{
    Acquisition, AcquisitionStats, CaptureEngine, HOLD_TIME, InputBlock, InputPort, Restart,
    ScopeInputs, TRIGGER_HYSTERESIS, TickContext,
};
pub use sample_buffer::{BUFFER_SIZE, SampleBuffer};
pub use state::{
    DisplayCurve, ModeFlags, ParamId, ParamInfo, ParamUnit, PersistError, PersistResult,
    ScopeParams, params, scope_param_info, scope_param_infos,
};
pub use trigger::{BUTTON_HIGH, BUTTON_LOW, ButtonTrigger, SchmittTrigger, TriggerState};

/// Default sample rate used by the host bindings.
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

/// Host-side configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeConfig {
    /// Sample rate in Hz (e.g., 44100.0, 48000.0).
    pub sample_rate: f32,
}

impl ScopeConfig {
    pub fn tick_context(&self) -> TickContext {
        TickContext::new(self.sample_rate)
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}
