// src/state/mode_flags.rs
//
// Display/trigger mode flags and their saved form.
//
// The saved form is a flat JSON object of integers:
//
//     { "lissajous": 1, "external": 0 }
//
// Missing keys leave the current value untouched, so older or newer
// documents load without complaint.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while loading or saving mode flags.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// The two user-settable modes of the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeFlags {
    /// Plot X against Y instead of each against time.
    pub lissajous: bool,

    /// Trigger from the dedicated trigger input instead of X.
    pub external: bool,
}

impl ModeFlags {
    pub fn new() -> Self {
        Self {
            lissajous: true,
            external: false,
        }
    }

    /// Acquisition restarts without waiting for a trigger.
    #[inline]
    pub fn free_running(&self, trigger_connected: bool) -> bool {
        self.lissajous || (self.external && !trigger_connected)
    }

    /// Indicator light values: `[time, lissajous, internal, external]`.
    pub fn lights(&self) -> [f32; 4] {
        let on = |b: bool| if b { 1.0 } else { 0.0 };
        [
            on(!self.lissajous),
            on(self.lissajous),
            on(!self.external),
            on(self.external),
        ]
    }

    /// Saved form of these flags.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(ModeFlagsSerde::from(self)).unwrap_or(Value::Null)
    }

    /// Apply a saved document on top of the current flags.
    pub fn apply_json(&mut self, value: &Value) -> PersistResult<()> {
        if !value.is_object() {
            return Err(PersistError::NotAnObject(json_kind(value)));
        }
        let stored: ModeFlagsSerde = serde_json::from_value(value.clone())?;
        stored.apply_to(self);
        Ok(())
    }

    /// Serialize as pretty JSON text.
    pub fn to_json_string(&self) -> PersistResult<String> {
        Ok(serde_json::to_string_pretty(&ModeFlagsSerde::from(self))?)
    }

    /// Parse JSON text, starting from the defaults.
    pub fn from_json_str(json: &str) -> PersistResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        let mut flags = Self::default();
        flags.apply_json(&value)?;
        Ok(flags)
    }

    /// Save to a JSON file.
    pub fn save_to_path(&self, path: &Path) -> PersistResult<()> {
        let txt = self.to_json_string()?;
        std::fs::write(path, txt)?;
        log::info!("saved scope modes to {}", path.display());
        Ok(())
    }

    /// Load from a JSON file.
    pub fn load_from_path(path: &Path) -> PersistResult<Self> {
        let txt = std::fs::read_to_string(path)?;
        let flags = Self::from_json_str(&txt).inspect_err(|e| {
            log::warn!("could not parse scope modes in {}: {}", path.display(), e);
        })?;
        log::info!(
            "loaded scope modes from {} (lissajous={}, external={})",
            path.display(),
            flags.lissajous,
            flags.external
        );
        Ok(flags)
    }
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self::new()
    }
}

// ---------- Serializable mirror type ----------

/// On-disk shape of [`ModeFlags`].
///
/// Values are kept loose: integers are truthy when non-zero, booleans are
/// accepted as-is, anything else reads as 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ModeFlagsSerde {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lissajous: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external: Option<Value>,
}

impl From<&ModeFlags> for ModeFlagsSerde {
    fn from(f: &ModeFlags) -> Self {
        Self {
            lissajous: Some(Value::from(f.lissajous as i64)),
            external: Some(Value::from(f.external as i64)),
        }
    }
}

impl ModeFlagsSerde {
    fn apply_to(self, f: &mut ModeFlags) {
        if let Some(v) = self.lissajous {
            f.lissajous = truthy(&v);
        }
        if let Some(v) = self.external {
            f.external = truthy(&v);
        }
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().map(|i| i != 0).unwrap_or(false),
        _ => false,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
