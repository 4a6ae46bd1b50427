// src/display.rs
//
// Display-side math: turns a snapshot into normalized plot coordinates
// and per-channel statistics. Nothing here draws.

use crate::bridge::ScopeSnapshot;
use crate::sample_buffer::BUFFER_SIZE;
use crate::state::ScopeParams;

/// Volts spanning half the screen height at unity gain.
const FULL_SCALE: f32 = 10.0;

/// Position and gain controls for the two channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub x_offset: f32,
    pub y_offset: f32,
    /// log2 gain; rounded to a whole step when applied
    pub x_scale: f32,
    pub y_scale: f32,
}

impl ViewSettings {
    #[inline]
    pub fn x_gain(&self) -> f32 {
        2.0_f32.powf(self.x_scale.round())
    }

    #[inline]
    pub fn y_gain(&self) -> f32 {
        2.0_f32.powf(self.y_scale.round())
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self::from(&ScopeParams::default())
    }
}

impl From<&ScopeParams> for ViewSettings {
    fn from(p: &ScopeParams) -> Self {
        Self {
            x_offset: p.x_pos,
            y_offset: p.y_pos,
            x_scale: p.x_scale,
            y_scale: p.y_scale,
        }
    }
}

/// Plot-ready values for one display refresh.
///
/// Values are in screen units where ±1 spans the display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub x: [f32; BUFFER_SIZE],
    pub y: [f32; BUFFER_SIZE],
    /// Plot Y against X instead of both against time.
    pub lissajous: bool,
}

impl DisplayFrame {
    /// Scale and offset a snapshot.
    ///
    /// In Lissajous mode the window is rotated so it starts at the write
    /// cursor, which keeps the oldest sample first while free-running.
    pub fn compute(snapshot: &ScopeSnapshot, view: &ViewSettings) -> Self {
        let lissajous = snapshot.flags.lissajous;
        let gain_x = view.x_gain();
        let gain_y = view.y_gain();

        let mut x = [0.0; BUFFER_SIZE];
        let mut y = [0.0; BUFFER_SIZE];
        for i in 0..BUFFER_SIZE {
            let j = if lissajous {
                (i + snapshot.cursor) % BUFFER_SIZE
            } else {
                i
            };
            x[i] = (snapshot.x[j] + view.x_offset) * gain_x / FULL_SCALE;
            y[i] = (snapshot.y[j] + view.y_offset) * gain_y / FULL_SCALE;
        }

        Self { x, y, lissajous }
    }

    /// Position of sample `i` for a time-series trace, both in 0..1.
    ///
    /// `values` is one of the frame's channels.
    #[inline]
    pub fn time_point(values: &[f32; BUFFER_SIZE], i: usize) -> (f32, f32) {
        (i as f32 / (BUFFER_SIZE - 1) as f32, values[i] / 2.0 + 0.5)
    }

    /// Position of sample `i` for the X-Y trace, both in 0..1.
    #[inline]
    pub fn xy_point(&self, i: usize) -> (f32, f32) {
        (self.x[i] / 2.0 + 0.5, self.y[i] / 2.0 + 0.5)
    }
}

/// Summary statistics over one channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelStats {
    pub vrms: f32,
    pub vpp: f32,
    pub vmin: f32,
    pub vmax: f32,
}

impl ChannelStats {
    pub fn calculate(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sum_sq = 0.0;
        let mut vmax = f32::NEG_INFINITY;
        let mut vmin = f32::INFINITY;
        for &v in values {
            sum_sq += v * v;
            vmax = vmax.max(v);
            vmin = vmin.min(v);
        }

        Self {
            vrms: (sum_sq / values.len() as f32).sqrt(),
            vpp: vmax - vmin,
            vmin,
            vmax,
        }
    }

    /// One-line readout, e.g. `rms  0.71  pp  2.00  max   1.00  min  -1.00`.
    pub fn summary(&self) -> String {
        format!(
            "rms {:5.2}  pp {:5.2}  max {:6.2}  min {:6.2}",
            self.vrms, self.vpp, self.vmax, self.vmin
        )
    }
}

/// Recomputes statistics every few refreshes.
#[derive(Debug, Clone, Default)]
pub struct StatsMeter {
    frame: u32,
    pub x: ChannelStats,
    pub y: ChannelStats,
}

impl StatsMeter {
    /// Refreshes between recalculations.
    pub const INTERVAL: u32 = 4;

    pub fn new() -> Self {
        Self::default()
    }

    /// Call once per display refresh. Returns `true` when stats changed.
    pub fn update(&mut self, snapshot: &ScopeSnapshot) -> bool {
        self.frame += 1;
        if self.frame < Self::INTERVAL {
            return false;
        }
        self.frame = 0;
        self.x = ChannelStats::calculate(&snapshot.x);
        self.y = ChannelStats::calculate(&snapshot.y);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ModeFlags;

    fn snapshot(lissajous: bool, cursor: usize) -> ScopeSnapshot {
        let mut snap = ScopeSnapshot::default();
        for i in 0..BUFFER_SIZE {
            snap.x[i] = i as f32;
            snap.y[i] = -(i as f32);
        }
        snap.cursor = cursor;
        snap.flags = ModeFlags {
            lissajous,
            external: false,
        };
        snap
    }

    #[test]
    fn test_time_mode_keeps_order() {
        let frame = DisplayFrame::compute(&snapshot(false, 100), &ViewSettings::default());
        assert!(!frame.lissajous);
        assert_eq!(frame.x[0], 0.0);
        assert_eq!(frame.x[10], 1.0);
        assert_eq!(frame.y[10], -1.0);
    }

    #[test]
    fn test_lissajous_rotates_by_cursor() {
        let frame = DisplayFrame::compute(&snapshot(true, 100), &ViewSettings::default());
        assert!(frame.lissajous);
        assert_eq!(frame.x[0], 10.0);
        assert_eq!(frame.x[BUFFER_SIZE - 100], 0.0);

        // Full buffer wraps to identity
        let full = DisplayFrame::compute(&snapshot(true, BUFFER_SIZE), &ViewSettings::default());
        assert_eq!(full.x[5], 0.5);
    }

    #[test]
    fn test_offset_and_rounded_gain() {
        let view = ViewSettings {
            x_offset: 10.0,
            y_offset: 0.0,
            x_scale: 1.4,
            y_scale: -1.0,
        };
        assert_eq!(view.x_gain(), 2.0);
        assert_eq!(view.y_gain(), 0.5);

        let frame = DisplayFrame::compute(&snapshot(false, 0), &view);
        assert_eq!(frame.x[0], 2.0);
        assert_eq!(frame.y[20], -1.0);
    }

    #[test]
    fn test_view_follows_params() {
        use crate::state::params;

        let mut p = ScopeParams::default();
        p.set_clamped(params::X_POS, 2.0);
        p.set_clamped(params::Y_SCALE, 40.0);
        let view = ViewSettings::from(&p);

        assert_eq!(view.x_offset, 2.0);
        assert_eq!(view.y_scale, 8.0);
        assert_eq!(view.y_gain(), 256.0);

        let frame = DisplayFrame::compute(&snapshot(false, 0), &view);
        assert_eq!(frame.x[0], 0.2);
    }

    #[test]
    fn test_points() {
        let mut frame = DisplayFrame::compute(&snapshot(false, 0), &ViewSettings::default());
        frame.x[0] = 1.0;
        frame.y[0] = -1.0;

        assert_eq!(frame.xy_point(0), (1.0, 0.0));
        assert_eq!(DisplayFrame::time_point(&frame.x, 0), (0.0, 1.0));
        assert_eq!(DisplayFrame::time_point(&frame.x, BUFFER_SIZE - 1).0, 1.0);
    }

    #[test]
    fn test_stats() {
        let stats = ChannelStats::calculate(&[1.0, -1.0, 1.0, -1.0]);
        assert_eq!(stats.vrms, 1.0);
        assert_eq!(stats.vpp, 2.0);
        assert_eq!(stats.vmax, 1.0);
        assert_eq!(stats.vmin, -1.0);
        assert_eq!(stats.summary(), "rms  1.00  pp  2.00  max   1.00  min  -1.00");

        assert_eq!(ChannelStats::calculate(&[]), ChannelStats::default());
    }

    #[test]
    fn test_stats_meter_interval() {
        let mut meter = StatsMeter::new();
        let snap = snapshot(false, 0);
        for _ in 0..StatsMeter::INTERVAL - 1 {
            assert!(!meter.update(&snap));
        }
        assert!(meter.update(&snap));
        assert_eq!(meter.x.vmin, 0.0);
        assert_eq!(meter.y.vmin, -((BUFFER_SIZE - 1) as f32));
    }
}
