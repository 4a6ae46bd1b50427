// src/state/mod.rs
//
// Host-facing state layer.
//
// This module contains structures that describe the scope to the host
// and the display: parameter metadata, current control values, and the
// persisted mode flags.
//
// Key principles:
// - Nothing here runs on the audio tick except plain reads of `ScopeParams`
// - Mode flags are the only persisted state
// - The engine never allocates through these structures

mod mode_flags;
mod param_info;
mod scope_params;

pub use mode_flags::*;
pub use param_info::*;
pub use scope_params::*;
