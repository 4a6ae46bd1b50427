// src/state/scope_params.rs
//
// Panel controls of the scope and their current values.

use std::sync::LazyLock;

use super::{DisplayCurve, ParamId, ParamInfo, ParamUnit};

// ═══════════════════════════════════════════════════════════════════
// Parameter IDs
// ═══════════════════════════════════════════════════════════════════

pub mod params {
    use super::ParamId;

    pub const X_SCALE: ParamId = 0;
    pub const X_POS: ParamId = 1;
    pub const Y_SCALE: ParamId = 2;
    pub const Y_POS: ParamId = 3;
    pub const TIME: ParamId = 4;
    pub const LISSAJOUS: ParamId = 5;
    pub const TRIGGER_LEVEL: ParamId = 6;
    pub const EXTERNAL: ParamId = 7;

    pub const COUNT: usize = 8;
}

/// Metadata for every scope control, indexed by parameter ID.
///
/// Built on first access.
pub fn scope_param_infos() -> &'static [ParamInfo] {
    &PARAM_INFOS
}

/// Metadata for one control, or `None` for an unknown ID.
pub fn scope_param_info(param_id: ParamId) -> Option<&'static ParamInfo> {
    PARAM_INFOS.get(param_id as usize)
}

static PARAM_INFOS: LazyLock<Vec<ParamInfo>> = LazyLock::new(build_param_infos);

fn build_param_infos() -> Vec<ParamInfo> {
    vec![
        ParamInfo::new(params::X_SCALE, "X Scale")
            .range(-2.0, 8.0)
            .default(0.0)
            .unit(ParamUnit::Times)
            .curve(DisplayCurve::Exponential)
            .step(1.0),
        ParamInfo::new(params::X_POS, "X Position")
            .range(-10.0, 10.0)
            .default(0.0)
            .unit(ParamUnit::Volts)
            .curve(DisplayCurve::Symmetric),
        ParamInfo::new(params::Y_SCALE, "Y Scale")
            .range(-2.0, 8.0)
            .default(0.0)
            .unit(ParamUnit::Times)
            .curve(DisplayCurve::Exponential)
            .step(1.0),
        ParamInfo::new(params::Y_POS, "Y Position")
            .range(-10.0, 10.0)
            .default(0.0)
            .unit(ParamUnit::Volts)
            .curve(DisplayCurve::Symmetric),
        // Turning clockwise makes the time base faster
        ParamInfo::new(params::TIME, "Time")
            .range(-6.0, -16.0)
            .default(-14.0)
            .unit(ParamUnit::Seconds)
            .curve(DisplayCurve::Exponential),
        ParamInfo::new(params::LISSAJOUS, "Lissajous")
            .range(0.0, 1.0)
            .default(0.0)
            .curve(DisplayCurve::Toggle)
            .step(1.0),
        ParamInfo::new(params::TRIGGER_LEVEL, "Trigger")
            .range(-10.0, 10.0)
            .default(0.0)
            .unit(ParamUnit::Volts)
            .curve(DisplayCurve::Symmetric),
        ParamInfo::new(params::EXTERNAL, "External")
            .range(0.0, 1.0)
            .default(0.0)
            .curve(DisplayCurve::Toggle)
            .step(1.0),
    ]
}

/// Current values of the scope controls.
///
/// Owned by the host's parameter store. The engine only reads
/// `time`, `trigger_level` and `external_button`; the rest feed the
/// display transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeParams {
    /// log2 of seconds between captured samples
    pub time: f32,
    pub trigger_level: f32,
    /// Raw value of the external-trigger toggle button
    pub external_button: f32,
    /// Raw value of the Lissajous button (not wired to a live toggle)
    pub lissajous_button: f32,
    pub x_pos: f32,
    pub y_pos: f32,
    /// log2 gain, rounded to whole steps for display
    pub x_scale: f32,
    pub y_scale: f32,
}

impl ScopeParams {
    pub fn new() -> Self {
        let mut p = Self {
            time: 0.0,
            trigger_level: 0.0,
            external_button: 0.0,
            lissajous_button: 0.0,
            x_pos: 0.0,
            y_pos: 0.0,
            x_scale: 0.0,
            y_scale: 0.0,
        };
        for info in scope_param_infos() {
            p.set_param(info.id, info.default);
        }
        p
    }

    /// Set a parameter by ID. Unknown IDs are ignored.
    pub fn set_param(&mut self, param_id: ParamId, value: f32) {
        match param_id {
            params::X_SCALE => self.x_scale = value,
            params::X_POS => self.x_pos = value,
            params::Y_SCALE => self.y_scale = value,
            params::Y_POS => self.y_pos = value,
            params::TIME => self.time = value,
            params::LISSAJOUS => self.lissajous_button = value,
            params::TRIGGER_LEVEL => self.trigger_level = value,
            params::EXTERNAL => self.external_button = value,
            _ => {}
        }
    }

    /// Set a parameter by ID, clamped to its range. Unknown IDs are ignored.
    ///
    /// Hosts should prefer this over [`set_param`](Self::set_param).
    pub fn set_clamped(&mut self, param_id: ParamId, value: f32) {
        if let Some(info) = scope_param_info(param_id) {
            self.set_param(param_id, info.clamp(value));
        }
    }

    /// Get a parameter by ID.
    pub fn param(&self, param_id: ParamId) -> Option<f32> {
        match param_id {
            params::X_SCALE => Some(self.x_scale),
            params::X_POS => Some(self.x_pos),
            params::Y_SCALE => Some(self.y_scale),
            params::Y_POS => Some(self.y_pos),
            params::TIME => Some(self.time),
            params::LISSAJOUS => Some(self.lissajous_button),
            params::TRIGGER_LEVEL => Some(self.trigger_level),
            params::EXTERNAL => Some(self.external_button),
            _ => None,
        }
    }
}

impl Default for ScopeParams {
    fn default() -> Self {
        Self::new()
    }
}
