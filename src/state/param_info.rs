// src/state/param_info.rs
//
// Parameter metadata for UI display and validation.

use std::fmt;

/// Unique identifier for a scope parameter.
pub type ParamId = u32;

/// Display curve for parameter UI.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DisplayCurve {
    /// Linear mapping
    #[default]
    Linear,
    /// Value is a base-2 exponent; displayed as `2^value`
    Exponential,
    /// Symmetric around zero (good for offsets, trigger level)
    Symmetric,
    /// Momentary on/off control
    Toggle,
}

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamUnit {
    #[default]
    None,
    /// Volts (signal level, offsets)
    Volts,
    /// Seconds per sample (time base)
    Seconds,
    /// Gain factor
    Times,
}

impl fmt::Display for ParamUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamUnit::None => Ok(()),
            ParamUnit::Volts => write!(f, "V"),
            ParamUnit::Seconds => write!(f, "s"),
            ParamUnit::Times => write!(f, "x"),
        }
    }
}

/// Metadata describing a parameter.
///
/// Used by hosts to:
/// - Display appropriate controls (knobs, buttons)
/// - Clamp incoming values
/// - Format values for display
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Unique ID within the scope
    pub id: ParamId,

    /// Human-readable name
    pub name: String,

    /// Short name for compact displays
    pub short_name: String,

    pub min: f32,
    pub max: f32,
    pub default: f32,

    /// Unit for display
    pub unit: ParamUnit,

    /// Display curve for UI mapping
    pub curve: DisplayCurve,

    /// Step size for discrete parameters (0 = continuous)
    pub step: f32,
}

impl ParamInfo {
    pub fn new(id: ParamId, name: impl Into<String>) -> Self {
        let name = name.into();
        let short_name = name.chars().take(4).collect();
        Self {
            id,
            name,
            short_name,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            unit: ParamUnit::None,
            curve: DisplayCurve::Linear,
            step: 0.0,
        }
    }

    /// Set the range. Bounds may be given in either order; the time base
    /// knob runs from slow to fast.
    pub fn range(mut self, a: f32, b: f32) -> Self {
        self.min = a.min(b);
        self.max = a.max(b);
        self
    }

    pub fn default(mut self, value: f32) -> Self {
        self.default = value;
        self
    }

    pub fn unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn curve(mut self, curve: DisplayCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Clamp a value to the valid range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Normalize a value to 0..1 range.
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        (value - self.min) / (self.max - self.min)
    }

    /// Denormalize a 0..1 value to the parameter range.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        self.min + normalized * (self.max - self.min)
    }

    /// Format a value for display.
    pub fn format(&self, value: f32) -> String {
        let shown = match self.curve {
            DisplayCurve::Exponential => 2.0_f32.powf(value),
            _ => value,
        };
        match (self.curve, self.unit) {
            (DisplayCurve::Toggle, _) => {
                if value >= 0.5 { "on".to_string() } else { "off".to_string() }
            }
            (DisplayCurve::Exponential, ParamUnit::Seconds) => format_seconds(shown),
            (_, ParamUnit::None) => {
                let precision = if self.step > 0.0 { 0 } else { 2 };
                format!("{:.prec$}", shown, prec = precision)
            }
            _ => {
                let precision = if self.step > 0.0 { 0 } else { 2 };
                format!("{:.prec$} {}", shown, self.unit, prec = precision)
            }
        }
    }
}

fn format_seconds(seconds: f32) -> String {
    if seconds < 1e-3 {
        format!("{:.1} µs", seconds * 1e6)
    } else if seconds < 1.0 {
        format!("{:.2} ms", seconds * 1e3)
    } else {
        format!("{:.2} s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_accepts_reversed_bounds() {
        let info = ParamInfo::new(0, "Time").range(-6.0, -16.0);
        assert_eq!(info.min, -16.0);
        assert_eq!(info.max, -6.0);
        assert_eq!(info.clamp(0.0), -6.0);
    }

    #[test]
    fn test_normalize_roundtrip() {
        let info = ParamInfo::new(0, "Level").range(-10.0, 10.0);
        assert_eq!(info.normalize(0.0), 0.5);
        assert_eq!(info.denormalize(0.25), -5.0);
    }

    #[test]
    fn test_format() {
        let level = ParamInfo::new(0, "Level").unit(ParamUnit::Volts);
        assert_eq!(level.format(1.5), "1.50 V");

        let time = ParamInfo::new(1, "Time")
            .unit(ParamUnit::Seconds)
            .curve(DisplayCurve::Exponential);
        assert_eq!(time.format(-10.0), "976.6 µs");

        let button = ParamInfo::new(2, "Ext").curve(DisplayCurve::Toggle);
        assert_eq!(button.format(1.0), "on");
        assert_eq!(button.format(0.0), "off");
    }
}
