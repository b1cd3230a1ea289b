//! # Motor Mixer Module
//!
//! Maps gamepad sticks to the left and right drive motor targets.
//!
//! ## Drive Modes
//!
//! | Mode | Left motor | Right motor |
//! |------|------------|-------------|
//! | Tank | Left Stick Y | Right Stick Y |
//! | Arcade | (Left Y + Right X) / 2 | (Left Y - Right X) / 2 |
//!
//! In arcade mode, driving straight (no turn input) uses 80% of the forward
//! stick on both sides instead of halving it.
//!
//! ## Usage
//!
//! ```
//! use telepresence_rig::controller::mapper::GamepadAxes;
//! use telepresence_rig::controller::mixer::{mix, DriveMode, MotorTargets};
//!
//! let axes = GamepadAxes::default();
//! assert_eq!(mix(&axes, DriveMode::Arcade), MotorTargets::neutral());
//! ```

use serde::Deserialize;

use super::mapper::GamepadAxes;
use crate::maestro::protocol::{ChannelRange, LEFT_MOTOR_RANGE, MOTOR_NEUTRAL, RIGHT_MOTOR_RANGE};

/// Stick reading mapped onto the bottom of a motor range.
pub const GAMEPAD_AXIS_MIN: i32 = -32760;

/// Stick reading mapped onto the top of a motor range.
pub const GAMEPAD_AXIS_MAX: i32 = 32760;

/// Straight-line scale applied in arcade mode when there is no turn input.
pub const ARCADE_STRAIGHT_SCALE: f32 = 0.8;

/// Stick-to-motor convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveMode {
    /// Each stick drives one side.
    Tank,
    /// Left stick forward/back, right stick turns.
    #[default]
    Arcade,
}

impl DriveMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            DriveMode::Tank => DriveMode::Arcade,
            DriveMode::Arcade => DriveMode::Tank,
        }
    }
}

impl std::fmt::Display for DriveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriveMode::Tank => write!(f, "tank"),
            DriveMode::Arcade => write!(f, "arcade"),
        }
    }
}

/// Drive motor pulse widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorTargets {
    pub left: u16,
    pub right: u16,
}

impl MotorTargets {
    /// Both motors stopped
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            left: MOTOR_NEUTRAL,
            right: MOTOR_NEUTRAL,
        }
    }
}

impl Default for MotorTargets {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Mix stick readings into motor targets
///
/// Every returned target lies within its motor's range.
#[must_use]
pub fn mix(axes: &GamepadAxes, mode: DriveMode) -> MotorTargets {
    let (left_input, right_input) = match mode {
        DriveMode::Tank => (i32::from(axes.left_y), i32::from(axes.right_y)),
        DriveMode::Arcade => arcade_inputs(i32::from(axes.left_y), i32::from(axes.right_x)),
    };

    MotorTargets {
        left: map_axis_to_motor(left_input, LEFT_MOTOR_RANGE),
        right: map_axis_to_motor(right_input, RIGHT_MOTOR_RANGE),
    }
}

/// Combine forward and turn readings into per-side inputs
fn arcade_inputs(forward: i32, turn: i32) -> (i32, i32) {
    if turn == 0 {
        let straight = (forward as f32 * ARCADE_STRAIGHT_SCALE) as i32;
        (straight, straight)
    } else {
        ((forward + turn) / 2, (forward - turn) / 2)
    }
}

/// Rescale a stick reading onto a motor range, truncating, then clip
#[must_use]
pub fn map_axis_to_motor(value: i32, range: ChannelRange) -> u16 {
    let (out_min, out_max) = (i32::from(range.min), i32::from(range.max));
    let mapped = (value - GAMEPAD_AXIS_MIN) * (out_max - out_min)
        / (GAMEPAD_AXIS_MAX - GAMEPAD_AXIS_MIN)
        + out_min;
    range.clip(mapped)
}
