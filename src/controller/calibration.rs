//! # Calibration Module
//!
//! Dead-zone handling for stick readings.
//!
//! A resting stick rarely reports exactly center. Readings whose magnitude
//! falls below a fraction of full scale are treated as exactly zero, so the
//! rig does not creep. Readings outside the dead-zone pass through unscaled.
//!
//! ## Usage
//!
//! ```
//! use telepresence_rig::controller::calibration::DeadZone;
//!
//! let deadzone = DeadZone::new(0.02); // 2% of ±32767, about ±655
//!
//! assert_eq!(deadzone.apply(600), 0);
//! assert_eq!(deadzone.apply(-600), 0);
//! assert_eq!(deadzone.apply(700), 700);
//! ```

use super::mapper::AXIS_NORMALIZED_MAX;

/// Default dead-zone fraction
pub const DEFAULT_DEADZONE: f32 = 0.02;

/// Largest accepted dead-zone fraction
pub const MAX_DEADZONE: f32 = 0.25;

/// Dead-zone applied identically to every stick axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadZone {
    /// Fraction of full scale (0.0 to 0.25).
    fraction: f32,
}

impl Default for DeadZone {
    fn default() -> Self {
        Self {
            fraction: DEFAULT_DEADZONE,
        }
    }
}

impl DeadZone {
    /// Creates a dead-zone; values outside 0.0..=0.25 are clamped.
    #[must_use]
    pub fn new(fraction: f32) -> Self {
        Self {
            fraction: fraction.clamp(0.0, MAX_DEADZONE),
        }
    }

    #[must_use]
    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    /// Threshold in normalized axis units
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.fraction * AXIS_NORMALIZED_MAX as f32
    }

    /// Collapse a normalized reading near zero and clamp it to ±32767
    #[must_use]
    pub fn apply(&self, value: i32) -> i16 {
        if (value.abs() as f32) < self.threshold() {
            0
        } else {
            value.clamp(-AXIS_NORMALIZED_MAX, AXIS_NORMALIZED_MAX) as i16
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deadzone() {
        let deadzone = DeadZone::default();
        assert_eq!(deadzone.fraction(), 0.02);
        assert!((deadzone.threshold() - 655.34).abs() < 0.01);
    }

    #[test]
    fn test_deadzone_edges() {
        let deadzone = DeadZone::default();
        assert_eq!(deadzone.apply(655), 0);
        assert_eq!(deadzone.apply(-655), 0);
        assert_eq!(deadzone.apply(656), 656);
        assert_eq!(deadzone.apply(-656), -656);
    }

    #[test]
    fn test_clamps_to_symmetric_range() {
        let deadzone = DeadZone::default();
        assert_eq!(deadzone.apply(-32768), -32767);
        assert_eq!(deadzone.apply(40000), 32767);
    }

    #[test]
    fn test_zero_deadzone_passes_everything() {
        let deadzone = DeadZone::new(0.0);
        assert_eq!(deadzone.apply(1), 1);
        assert_eq!(deadzone.apply(0), 0);
    }

    #[test]
    fn test_fraction_is_clamped() {
        assert_eq!(DeadZone::new(0.9).fraction(), MAX_DEADZONE);
        assert_eq!(DeadZone::new(-0.1).fraction(), 0.0);
    }
}
