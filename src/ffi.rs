// C-compatible FFI bindings for Swift/iOS integration.
//
// Safety requirements:
// - All pointers must be non-null unless documented otherwise
// - All handles must be created by this module and not fabricated
// - String parameters must be valid UTF-8 (Swift strings are always valid)
// - Caller must call the corresponding _destroy function for each _create
//
// The engine handle belongs to the audio thread, the display handle to
// the UI thread. They share the capture buffer without locks.

use std::ffi::{CStr, CString, c_char};
use std::sync::LazyLock;

use crate::bridge::{ScopeHandle, create_scope};
use crate::engine::{Acquisition, CaptureEngine, InputBlock, InputPort, Restart, ScopeInputs};
use crate::sample_buffer::BUFFER_SIZE;
use crate::state::{
    DisplayCurve, ModeFlags, ParamUnit, ScopeParams, scope_param_info, scope_param_infos,
};
use crate::{DEFAULT_SAMPLE_RATE, ScopeConfig};

use log::{LevelFilter, debug, error, warn};
use oslog::OsLogger;

// Logger subsystem identifier
const LOG_SUBSYSTEM: &str = "com.fullscope.engine";

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup before using any other FFI function.
/// Output appears in Console.app and Xcode's debug console.
#[unsafe(no_mangle)]
pub extern "C" fn fullscope_init_logger() {
    OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle Types
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to the capture engine (audio-side).
pub struct FullScopeEngine {
    inner: CaptureEngine,
    config: ScopeConfig,
    params: ScopeParams,
}

/// Opaque handle to the display readback (UI-side).
pub struct FullScopeDisplay {
    inner: ScopeHandle,
}

// ═══════════════════════════════════════════════════════════════════════════
// FFI Types
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration for creating an engine/display pair.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FsConfig {
    /// Sample rate in Hz (e.g., 44100.0, 48000.0).
    pub sample_rate: f32,
    /// Initial Lissajous mode.
    pub lissajous: bool,
    /// Initial external-trigger mode.
    pub external: bool,
}

impl Default for FsConfig {
    fn default() -> Self {
        let flags = ModeFlags::default();
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            lissajous: flags.lissajous,
            external: flags.external,
        }
    }
}

/// Mode flags as seen by the UI.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FsModeFlags {
    pub lissajous: bool,
    pub external: bool,
}

impl From<ModeFlags> for FsModeFlags {
    fn from(f: ModeFlags) -> Self {
        Self {
            lissajous: f.lissajous,
            external: f.external,
        }
    }
}

impl From<FsModeFlags> for ModeFlags {
    fn from(f: FsModeFlags) -> Self {
        Self {
            lissajous: f.lissajous,
            external: f.external,
        }
    }
}

/// Acquisition totals since the engine was created.
#[repr(C)]
pub struct FsStats {
    pub free_run: u64,
    pub triggered: u64,
    pub timeouts: u64,
}

/// Parameter info for UI controls.
///
/// `name` and `short_name` point into a table owned by the library and stay
/// valid for the life of the process. Do not free them.
#[repr(C)]
pub struct FsParamInfo {
    pub id: u32,
    pub name: *const c_char,
    pub short_name: *const c_char,
    pub min_value: f32,
    pub max_value: f32,
    pub default_value: f32,
    /// Step size for discrete controls (0 = continuous)
    pub step: f32,
    /// `FS_UNIT_*`
    pub unit: u32,
    /// `FS_CURVE_*`
    pub curve: u32,
}

pub const FS_UNIT_NONE: u32 = 0;
pub const FS_UNIT_VOLTS: u32 = 1;
pub const FS_UNIT_SECONDS: u32 = 2;
pub const FS_UNIT_TIMES: u32 = 3;

pub const FS_CURVE_LINEAR: u32 = 0;
pub const FS_CURVE_EXPONENTIAL: u32 = 1;
pub const FS_CURVE_SYMMETRIC: u32 = 2;
pub const FS_CURVE_TOGGLE: u32 = 3;

/// C copies of the control names, indexed by parameter ID.
static PARAM_NAMES: LazyLock<Vec<(CString, CString)>> = LazyLock::new(|| {
    scope_param_infos()
        .iter()
        .map(|info| {
            (
                CString::new(info.name.as_str()).unwrap_or_default(),
                CString::new(info.short_name.as_str()).unwrap_or_default(),
            )
        })
        .collect()
});

/// Tick outcome codes returned by `fullscope_engine_advance`.
pub const FS_CAPTURING: u32 = 0;
pub const FS_WAITING: u32 = 1;
pub const FS_RESTART_FREE_RUN: u32 = 2;
pub const FS_RESTART_TRIGGERED: u32 = 3;
pub const FS_RESTART_TIMEOUT: u32 = 4;

fn acquisition_code(a: Acquisition) -> u32 {
    match a {
        Acquisition::Capturing => FS_CAPTURING,
        Acquisition::Waiting => FS_WAITING,
        Acquisition::Restarted(Restart::FreeRun) => FS_RESTART_FREE_RUN,
        Acquisition::Restarted(Restart::Triggered) => FS_RESTART_TRIGGERED,
        Acquisition::Restarted(Restart::Timeout) => FS_RESTART_TIMEOUT,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameter Table
// ═══════════════════════════════════════════════════════════════════════════

/// Number of scope controls. IDs run from 0 to count - 1.
#[unsafe(no_mangle)]
pub extern "C" fn fullscope_param_count() -> u32 {
    scope_param_infos().len() as u32
}

/// Get metadata for a control.
///
/// Returns `false` and leaves `out_info` untouched for an unknown ID.
///
/// # Safety
/// `out_info` must be a valid pointer to an FsParamInfo.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_param_info(param_id: u32, out_info: *mut FsParamInfo) -> bool {
    if out_info.is_null() {
        return false;
    }
    let (Some(info), Some((name, short_name))) = (
        scope_param_info(param_id),
        PARAM_NAMES.get(param_id as usize),
    ) else {
        return false;
    };

    let unit = match info.unit {
        ParamUnit::None => FS_UNIT_NONE,
        ParamUnit::Volts => FS_UNIT_VOLTS,
        ParamUnit::Seconds => FS_UNIT_SECONDS,
        ParamUnit::Times => FS_UNIT_TIMES,
    };
    let curve = match info.curve {
        DisplayCurve::Linear => FS_CURVE_LINEAR,
        DisplayCurve::Exponential => FS_CURVE_EXPONENTIAL,
        DisplayCurve::Symmetric => FS_CURVE_SYMMETRIC,
        DisplayCurve::Toggle => FS_CURVE_TOGGLE,
    };

    unsafe {
        *out_info = FsParamInfo {
            id: info.id,
            name: name.as_ptr(),
            short_name: short_name.as_ptr(),
            min_value: info.min,
            max_value: info.max,
            default_value: info.default,
            step: info.step,
            unit,
            curve,
        };
    }
    true
}

/// Format a control value for display (e.g. "61.0 µs", "1.50 V", "on").
///
/// Returns a string that must be freed with `fullscope_string_free`,
/// or NULL for an unknown ID.
#[unsafe(no_mangle)]
pub extern "C" fn fullscope_param_format(param_id: u32, value: f32) -> *mut c_char {
    let Some(info) = scope_param_info(param_id) else {
        return std::ptr::null_mut();
    };
    match CString::new(info.format(value)) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("fullscope_param_format: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Map a control value to 0..1 for a slider. Unknown IDs return 0.
#[unsafe(no_mangle)]
pub extern "C" fn fullscope_param_normalize(param_id: u32, value: f32) -> f32 {
    scope_param_info(param_id)
        .map(|info| info.normalize(info.clamp(value)))
        .unwrap_or(0.0)
}

/// Map a 0..1 slider position back to a control value. Unknown IDs return 0.
#[unsafe(no_mangle)]
pub extern "C" fn fullscope_param_denormalize(param_id: u32, normalized: f32) -> f32 {
    scope_param_info(param_id)
        .map(|info| info.denormalize(normalized.clamp(0.0, 1.0)))
        .unwrap_or(0.0)
}

// ═══════════════════════════════════════════════════════════════════════════
// Creation / Destruction
// ═══════════════════════════════════════════════════════════════════════════

/// Get the default configuration values.
#[unsafe(no_mangle)]
pub extern "C" fn fullscope_default_config() -> FsConfig {
    FsConfig::default()
}

/// Number of samples per channel in the capture window.
#[unsafe(no_mangle)]
pub extern "C" fn fullscope_buffer_size() -> u32 {
    BUFFER_SIZE as u32
}

/// Create a linked engine/display pair.
///
/// Returns the engine handle. The display handle is returned via
/// `out_display`. Both must be destroyed with their destroy functions.
///
/// # Safety
/// - `config` must be a valid pointer to an FsConfig or NULL for defaults
/// - `out_display` must be a valid pointer to store the display handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_create(
    config: *const FsConfig,
    out_display: *mut *mut FullScopeDisplay,
) -> *mut FullScopeEngine {
    if out_display.is_null() {
        error!("fullscope_create: out_display is null");
        return std::ptr::null_mut();
    }

    let cfg = if config.is_null() {
        FsConfig::default()
    } else {
        unsafe { std::ptr::read(config) }
    };

    let flags = ModeFlags {
        lissajous: cfg.lissajous,
        external: cfg.external,
    };
    let (display, engine) = create_scope(flags);

    debug!(
        "fullscope_create: sample_rate={} lissajous={} external={}",
        cfg.sample_rate, flags.lissajous, flags.external
    );

    unsafe {
        *out_display = Box::into_raw(Box::new(FullScopeDisplay { inner: display }));
    }

    Box::into_raw(Box::new(FullScopeEngine {
        inner: engine,
        config: ScopeConfig {
            sample_rate: cfg.sample_rate,
        },
        params: ScopeParams::default(),
    }))
}

/// Destroy an engine handle.
///
/// # Safety
/// `engine` must be a valid pointer returned by `fullscope_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_engine_destroy(engine: *mut FullScopeEngine) {
    if !engine.is_null() {
        unsafe { drop(Box::from_raw(engine)) };
    }
}

/// Destroy a display handle.
///
/// # Safety
/// `display` must be a valid pointer returned via `fullscope_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_display_destroy(display: *mut FullScopeDisplay) {
    if !display.is_null() {
        unsafe { drop(Box::from_raw(display)) };
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Engine Functions (audio thread)
// ═══════════════════════════════════════════════════════════════════════════

/// Change the sample rate.
///
/// # Safety
/// `engine` must be a valid pointer returned by `fullscope_create` or NULL.
/// Must not race with `fullscope_engine_advance` on another thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_engine_set_sample_rate(
    engine: *mut FullScopeEngine,
    sample_rate: f32,
) {
    if engine.is_null() {
        return;
    }
    unsafe { (*engine).config.sample_rate = sample_rate };
}

/// Set a control value by parameter ID, clamped to the control's range.
///
/// Unknown IDs are ignored. See `fullscope_param_info` for the ranges.
///
/// # Safety
/// `engine` must be a valid pointer returned by `fullscope_create` or NULL.
/// Must not race with `fullscope_engine_advance` on another thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_engine_set_param(
    engine: *mut FullScopeEngine,
    param_id: u32,
    value: f32,
) {
    if engine.is_null() {
        return;
    }
    unsafe { (*engine).params.set_clamped(param_id, value) };
}

/// Advance by one tick. Returns one of the `FS_*` outcome codes.
///
/// # Safety
/// Must be called from the audio thread. `engine` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_engine_advance(
    engine: *mut FullScopeEngine,
    x: f32,
    x_connected: bool,
    y: f32,
    y_connected: bool,
    trigger: f32,
    trigger_connected: bool,
) -> u32 {
    if engine.is_null() {
        return FS_CAPTURING;
    }
    let e = unsafe { &mut *engine };
    let inputs = ScopeInputs {
        x: InputPort {
            value: x,
            connected: x_connected,
        },
        y: InputPort {
            value: y,
            connected: y_connected,
        },
        trigger: InputPort {
            value: trigger,
            connected: trigger_connected,
        },
    };
    let ctx = e.config.tick_context();
    acquisition_code(e.inner.advance(&ctx, &inputs, &e.params))
}

/// Advance once per frame of a block.
///
/// A NULL channel pointer is treated as a disconnected input reading 0.
/// Returns the outcome code of the last frame.
///
/// # Safety
/// - Must be called from the audio thread
/// - Non-NULL buffers must hold at least `frames` samples
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_engine_process_block(
    engine: *mut FullScopeEngine,
    x: *const f32,
    y: *const f32,
    trigger: *const f32,
    frames: u32,
) -> u32 {
    if engine.is_null() {
        return FS_CAPTURING;
    }
    let e = unsafe { &mut *engine };
    let frames = frames as usize;

    const CHUNK: usize = 256;
    let silence = [0.0f32; CHUNK];
    let ctx = e.config.tick_context();
    let mut last = None;

    let mut offset = 0;
    while offset < frames {
        let n = (frames - offset).min(CHUNK);
        let block = InputBlock {
            x: unsafe { channel(x, offset, n, &silence) },
            y: unsafe { channel(y, offset, n, &silence) },
            trigger: unsafe { channel(trigger, offset, n, &silence) },
            x_connected: !x.is_null(),
            y_connected: !y.is_null(),
            trigger_connected: !trigger.is_null(),
        };
        last = e.inner.process_block(&ctx, &block, &e.params).or(last);
        offset += n;
    }

    last.map(acquisition_code).unwrap_or(FS_CAPTURING)
}

/// `n` samples of a host channel starting at `offset`, or silence for NULL.
unsafe fn channel<'a>(ptr: *const f32, offset: usize, n: usize, silence: &'a [f32]) -> &'a [f32] {
    if ptr.is_null() {
        &silence[..n]
    } else {
        unsafe { std::slice::from_raw_parts(ptr.add(offset), n) }
    }
}

/// Get acquisition totals.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_engine_get_stats(engine: *const FullScopeEngine) -> FsStats {
    if engine.is_null() {
        return FsStats {
            free_run: 0,
            triggered: 0,
            timeouts: 0,
        };
    }
    let s = unsafe { (*engine).inner.stats() };
    FsStats {
        free_run: s.free_run,
        triggered: s.triggered,
        timeouts: s.timeouts,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Display Functions (UI thread)
// ═══════════════════════════════════════════════════════════════════════════

/// Copy the capture window into caller buffers.
///
/// Copies at most `len` values per channel. Either buffer may be NULL.
/// Returns the write cursor.
///
/// # Safety
/// Non-NULL buffers must have space for `len` floats.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_display_read(
    display: *const FullScopeDisplay,
    out_x: *mut f32,
    out_y: *mut f32,
    len: u32,
) -> u32 {
    if display.is_null() {
        return 0;
    }
    let d = unsafe { &*display };
    let len = (len as usize).min(BUFFER_SIZE);
    if !out_x.is_null() {
        let out = unsafe { std::slice::from_raw_parts_mut(out_x, len) };
        d.inner.read_x(out);
    }
    if !out_y.is_null() {
        let out = unsafe { std::slice::from_raw_parts_mut(out_y, len) };
        d.inner.read_y(out);
    }
    d.inner.cursor() as u32
}

/// Current write cursor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_display_cursor(display: *const FullScopeDisplay) -> u32 {
    if display.is_null() {
        return 0;
    }
    unsafe { (*display).inner.cursor() as u32 }
}

/// Current mode flags.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_display_get_flags(
    display: *const FullScopeDisplay,
) -> FsModeFlags {
    if display.is_null() {
        return ModeFlags::default().into();
    }
    unsafe { (*display).inner.mode_flags().into() }
}

/// Replace the mode flags.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_display_set_flags(
    display: *const FullScopeDisplay,
    flags: FsModeFlags,
) {
    if display.is_null() {
        return;
    }
    unsafe { (*display).inner.set_mode_flags(flags.into()) };
}

/// Write the four indicator light values into `out` (space for 4 floats).
///
/// # Safety
/// `out` must be valid for 4 writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_display_lights(display: *const FullScopeDisplay, out: *mut f32) {
    if display.is_null() || out.is_null() {
        return;
    }
    let lights = unsafe { (*display).inner.mode_flags().lights() };
    unsafe { std::ptr::copy_nonoverlapping(lights.as_ptr(), out, lights.len()) };
}

// ═══════════════════════════════════════════════════════════════════════════
// Persistence
// ═══════════════════════════════════════════════════════════════════════════

/// Serialize the mode flags as JSON.
///
/// Returns a string that must be freed with `fullscope_string_free`,
/// or NULL on failure.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_display_save_json(
    display: *const FullScopeDisplay,
) -> *mut c_char {
    if display.is_null() {
        return std::ptr::null_mut();
    }
    let json = unsafe { (*display).inner.save_json() }.to_string();
    match CString::new(json) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("fullscope_display_save_json: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Apply saved mode flags. Missing keys keep their current value.
///
/// Returns `false` if the JSON could not be applied.
///
/// # Safety
/// `json` must be a valid null-terminated UTF-8 string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_display_load_json(
    display: *const FullScopeDisplay,
    json: *const c_char,
) -> bool {
    if display.is_null() || json.is_null() {
        return false;
    }
    let text = match unsafe { CStr::from_ptr(json) }.to_str() {
        Ok(t) => t,
        Err(e) => {
            warn!("fullscope_display_load_json: invalid UTF-8: {}", e);
            return false;
        }
    };
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("fullscope_display_load_json: {}", e);
            return false;
        }
    };
    match unsafe { (*display).inner.load_json(&value) } {
        Ok(()) => true,
        Err(e) => {
            warn!("fullscope_display_load_json: {}", e);
            false
        }
    }
}

/// Free a string returned by this module.
///
/// # Safety
/// `s` must come from `fullscope_display_save_json` or
/// `fullscope_param_format`, or be NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fullscope_string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe { drop(CString::from_raw(s)) };
    }
}
