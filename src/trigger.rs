// src/trigger.rs
//
// Hysteresis level-crossing detection.

/// Lower bound of the on/off boundary used for panel buttons.
pub const BUTTON_LOW: f32 = 0.1;

/// Upper bound of the on/off boundary used for panel buttons.
pub const BUTTON_HIGH: f32 = 1.0;

/// Detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerState {
    /// Signal has been below the low threshold; the next rise fires.
    Armed,

    /// Waiting for the signal to dip below the low threshold.
    #[default]
    Disarmed,
}

/// Schmitt trigger over a `[low, high]` hysteresis band.
///
/// Fires once per rising edge: the input must first fall below `low`
/// (arming the detector) and then reach `high`. Values oscillating
/// strictly inside the band never fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchmittTrigger {
    state: TriggerState,
}

impl SchmittTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one value. Returns `true` on a rising edge.
    #[inline]
    pub fn process(&mut self, value: f32, low: f32, high: f32) -> bool {
        if value < low {
            self.state = TriggerState::Armed;
            return false;
        }

        if value >= high && self.state == TriggerState::Armed {
            self.state = TriggerState::Disarmed;
            return true;
        }

        false
    }

    /// Force the detector back to `Disarmed`.
    ///
    /// A signal that is already above `high` will not fire until it
    /// has dipped below `low` first.
    #[inline]
    pub fn reset(&mut self) {
        self.state = TriggerState::Disarmed;
    }

    #[inline]
    pub fn state(&self) -> TriggerState {
        self.state
    }
}

/// Rising-edge detector for a momentary panel button.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonTrigger {
    inner: SchmittTrigger,
}

impl ButtonTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once per press.
    #[inline]
    pub fn process(&mut self, raw: f32) -> bool {
        self.inner.process(raw, BUTTON_LOW, BUTTON_HIGH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_rising_edge_after_dip() {
        let mut trig = SchmittTrigger::new();
        assert_eq!(trig.state(), TriggerState::Disarmed);

        assert!(!trig.process(-1.0, -0.1, 0.0));
        assert_eq!(trig.state(), TriggerState::Armed);

        assert!(trig.process(0.5, -0.1, 0.0));
        assert_eq!(trig.state(), TriggerState::Disarmed);

        // Staying high does not fire again
        assert!(!trig.process(0.5, -0.1, 0.0));
        assert!(!trig.process(1.0, -0.1, 0.0));
    }

    #[test]
    fn test_no_fire_without_dip() {
        let mut trig = SchmittTrigger::new();
        for _ in 0..100 {
            assert!(!trig.process(2.0, -0.1, 0.0));
        }
    }

    #[test]
    fn test_oscillation_inside_band_never_fires() {
        let mut trig = SchmittTrigger::new();
        // Arm first so only the band behavior is under test
        trig.process(-1.0, 0.0, 1.0);

        for i in 0..10_000 {
            let v = if i % 2 == 0 { 0.01 } else { 0.99 };
            assert!(!trig.process(v, 0.0, 1.0));
        }
        assert_eq!(trig.state(), TriggerState::Armed);
    }

    #[test]
    fn test_reset_disarms() {
        let mut trig = SchmittTrigger::new();
        trig.process(-1.0, -0.1, 0.0);
        trig.reset();

        assert!(!trig.process(1.0, -0.1, 0.0));
        assert!(!trig.process(-0.5, -0.1, 0.0));
        assert!(trig.process(1.0, -0.1, 0.0));
    }

    #[test]
    fn test_button_press_and_release() {
        let mut button = ButtonTrigger::new();

        assert!(!button.process(0.0));
        assert!(button.process(1.0));
        // Held
        assert!(!button.process(1.0));
        // Released then pressed again
        assert!(!button.process(0.0));
        assert!(button.process(1.0));
    }

    #[test]
    fn test_button_held_at_startup_does_not_fire() {
        let mut button = ButtonTrigger::new();
        assert!(!button.process(1.0));
        assert!(!button.process(1.0));
    }
}
