//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { FullScope } from './fullscope.js';
//!
//! await init();
//!
//! const scope = new FullScope(48000);
//! const display = scope.display();
//!
//! // AudioWorklet: once per render quantum
//! scope.process_block(left, right, trig, true, true, false);
//!
//! // requestAnimationFrame: once per refresh
//! const xs = display.read_x();
//! ```

use wasm_bindgen::prelude::*;

use crate::bridge::{ScopeHandle, create_scope};
use crate::display::{ChannelStats, DisplayFrame, ViewSettings};
use crate::engine::{Acquisition, CaptureEngine, InputBlock, Restart};
use crate::sample_buffer::BUFFER_SIZE;
use crate::state::{ModeFlags, ScopeParams, scope_param_info, scope_param_infos};
use crate::{DEFAULT_SAMPLE_RATE, ScopeConfig};

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn fullscope_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

/// Number of samples per channel in the capture window.
#[wasm_bindgen]
pub fn fullscope_buffer_size() -> u32 {
    BUFFER_SIZE as u32
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameter Table
// ═══════════════════════════════════════════════════════════════════════════

/// Parameter info for UI controls.
#[wasm_bindgen(getter_with_clone)]
#[derive(Clone)]
pub struct FullScopeParamInfo {
    pub id: u32,
    pub name: String,
    pub short_name: String,
    pub min_value: f32,
    pub max_value: f32,
    pub default_value: f32,
    pub step: f32,
    /// "V", "s", "x" or empty
    pub unit: String,
}

/// Number of scope controls. IDs run from 0 to count - 1.
#[wasm_bindgen]
pub fn fullscope_param_count() -> u32 {
    scope_param_infos().len() as u32
}

/// Metadata for a control, or `undefined` for an unknown ID.
#[wasm_bindgen]
pub fn fullscope_param_info(param_id: u32) -> Option<FullScopeParamInfo> {
    scope_param_info(param_id).map(|info| FullScopeParamInfo {
        id: info.id,
        name: info.name.clone(),
        short_name: info.short_name.clone(),
        min_value: info.min,
        max_value: info.max,
        default_value: info.default,
        step: info.step,
        unit: info.unit.to_string(),
    })
}

/// Format a control value for display, or `undefined` for an unknown ID.
#[wasm_bindgen]
pub fn fullscope_param_format(param_id: u32, value: f32) -> Option<String> {
    scope_param_info(param_id).map(|info| info.format(value))
}

/// Map a control value to 0..1 for a slider.
#[wasm_bindgen]
pub fn fullscope_param_normalize(param_id: u32, value: f32) -> f32 {
    scope_param_info(param_id)
        .map(|info| info.normalize(info.clamp(value)))
        .unwrap_or(0.0)
}

/// Map a 0..1 slider position back to a control value.
#[wasm_bindgen]
pub fn fullscope_param_denormalize(param_id: u32, normalized: f32) -> f32 {
    scope_param_info(param_id)
        .map(|info| info.denormalize(normalized.clamp(0.0, 1.0)))
        .unwrap_or(0.0)
}

// ═══════════════════════════════════════════════════════════════════════════
// Readback Data
// ═══════════════════════════════════════════════════════════════════════════

/// Acquisition totals since the engine was created.
#[wasm_bindgen]
#[derive(Clone, Copy, Default)]
pub struct FullScopeStats {
    pub free_run: u64,
    pub triggered: u64,
    pub timeouts: u64,
}

/// Per-channel statistics of the current window.
#[wasm_bindgen]
#[derive(Clone, Copy, Default)]
pub struct FullScopeChannelStats {
    pub vrms: f32,
    pub vpp: f32,
    pub vmin: f32,
    pub vmax: f32,
}

impl From<ChannelStats> for FullScopeChannelStats {
    fn from(s: ChannelStats) -> Self {
        Self {
            vrms: s.vrms,
            vpp: s.vpp,
            vmin: s.vmin,
            vmax: s.vmax,
        }
    }
}

fn acquisition_name(a: Acquisition) -> &'static str {
    match a {
        Acquisition::Capturing => "capturing",
        Acquisition::Waiting => "waiting",
        Acquisition::Restarted(Restart::FreeRun) => "free-run",
        Acquisition::Restarted(Restart::Triggered) => "triggered",
        Acquisition::Restarted(Restart::Timeout) => "timeout",
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Engine (AudioWorklet side)
// ═══════════════════════════════════════════════════════════════════════════

/// Audio-side capture engine.
#[wasm_bindgen]
pub struct FullScope {
    inner: CaptureEngine,
    display: ScopeHandle,
    config: ScopeConfig,
    params: ScopeParams,
}

#[wasm_bindgen]
impl FullScope {
    /// Create an engine at the given sample rate (0 for the default).
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f32) -> FullScope {
        let sample_rate = if sample_rate > 0.0 {
            sample_rate
        } else {
            DEFAULT_SAMPLE_RATE
        };
        let (display, inner) = create_scope(ModeFlags::default());
        FullScope {
            inner,
            display,
            config: ScopeConfig { sample_rate },
            params: ScopeParams::default(),
        }
    }

    /// Display-side handle sharing this engine's buffer.
    ///
    /// Each display starts with the default view and keeps its own
    /// position and scale controls (see `FullScopeDisplay.set_param`).
    pub fn display(&self) -> FullScopeDisplay {
        FullScopeDisplay {
            inner: self.display.clone(),
            params: ScopeParams::default(),
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.config.sample_rate = sample_rate;
    }

    /// Set a control value by parameter ID, clamped to its range.
    ///
    /// Only the time base, trigger level and external button affect
    /// capture. Position and scale belong to the display.
    pub fn set_param(&mut self, param_id: u32, value: f32) {
        self.params.set_clamped(param_id, value);
    }

    /// Advance once per frame. Returns the outcome of the last frame.
    pub fn process_block(
        &mut self,
        x: &[f32],
        y: &[f32],
        trigger: &[f32],
        x_connected: bool,
        y_connected: bool,
        trigger_connected: bool,
    ) -> String {
        let block = InputBlock {
            x,
            y,
            trigger,
            x_connected,
            y_connected,
            trigger_connected,
        };
        let ctx = self.config.tick_context();
        match self.inner.process_block(&ctx, &block, &self.params) {
            Some(a) => acquisition_name(a).to_string(),
            None => {
                log::warn!("process_block: empty input block");
                acquisition_name(Acquisition::Capturing).to_string()
            }
        }
    }

    pub fn stats(&self) -> FullScopeStats {
        let s = self.inner.stats();
        FullScopeStats {
            free_run: s.free_run,
            triggered: s.triggered,
            timeouts: s.timeouts,
        }
    }

    pub fn cursor(&self) -> u32 {
        self.inner.cursor() as u32
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Display (main thread side)
// ═══════════════════════════════════════════════════════════════════════════

/// Display-side readback handle.
#[wasm_bindgen]
pub struct FullScopeDisplay {
    inner: ScopeHandle,
    params: ScopeParams,
}

#[wasm_bindgen]
impl FullScopeDisplay {
    /// Raw X samples.
    pub fn read_x(&self) -> Vec<f32> {
        let mut out = vec![0.0; BUFFER_SIZE];
        self.inner.read_x(&mut out);
        out
    }

    /// Raw Y samples.
    pub fn read_y(&self) -> Vec<f32> {
        let mut out = vec![0.0; BUFFER_SIZE];
        self.inner.read_y(&mut out);
        out
    }

    pub fn cursor(&self) -> u32 {
        self.inner.cursor() as u32
    }

    /// Set a view control (X/Y position and scale) used by `frame`.
    ///
    /// The value is clamped to its range. Capture controls set here have
    /// no effect on the engine.
    pub fn set_param(&mut self, param_id: u32, value: f32) {
        self.params.set_clamped(param_id, value);
    }

    /// Scaled X values, interleaved with Y: `[x0, y0, x1, y1, ...]`.
    pub fn frame(&self) -> Vec<f32> {
        let view = ViewSettings::from(&self.params);
        let frame = DisplayFrame::compute(&self.inner.snapshot(), &view);
        frame
            .x
            .iter()
            .zip(frame.y.iter())
            .flat_map(|(&x, &y)| [x, y])
            .collect()
    }

    pub fn stats_x(&self) -> FullScopeChannelStats {
        ChannelStats::calculate(&self.inner.snapshot().x).into()
    }

    pub fn stats_y(&self) -> FullScopeChannelStats {
        ChannelStats::calculate(&self.inner.snapshot().y).into()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mode flags
    // ─────────────────────────────────────────────────────────────────────────

    pub fn lissajous(&self) -> bool {
        self.inner.mode_flags().lissajous
    }

    pub fn external(&self) -> bool {
        self.inner.mode_flags().external
    }

    pub fn set_lissajous(&self, on: bool) {
        self.inner.set_lissajous(on);
    }

    pub fn set_external(&self, on: bool) {
        self.inner.set_external(on);
    }

    /// Indicator light values `[time, lissajous, internal, external]`.
    pub fn lights(&self) -> Vec<f32> {
        self.inner.mode_flags().lights().to_vec()
    }

    /// Mode flags as a JSON string.
    pub fn save_json(&self) -> String {
        self.inner.save_json().to_string()
    }

    /// Apply saved mode flags. Missing keys keep their current value.
    pub fn load_json(&self, json: &str) -> Result<(), JsValue> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.load_json(&value).map_err(|e| {
            log::error!("load_json: {}", e);
            JsValue::from_str(&e.to_string())
        })
    }
}
