//! # Actuator Mapping
//!
//! Clips head angles to what the gimbal can reach and rescales them into
//! servo pulse widths. Pitch and roll servos are mounted mirrored, so their
//! input ranges run from +79° to -79°.
//!
//! Looking down, the roll arm can strike the pitch arm. A cubic fitted to the
//! mechanism gives the lowest safe roll for each pitch in [-79°, -5°].

use super::correction::GimbalAngles;
use crate::maestro::protocol::{ChannelRange, PITCH_SERVO_RANGE, ROLL_SERVO_RANGE, YAW_SERVO_RANGE};

/// Reachable yaw and pitch, either side of center (degrees)
pub const SERVO_ANGLE_LIMIT: f32 = 78.5;

/// Angle mapped onto the ends of a servo's pulse range (degrees)
pub const SERVO_MAP_SPAN: f32 = 79.0;

/// Reachable roll, either side of level (degrees)
pub const ROLL_ANGLE_LIMIT: f32 = 58.0;

/// Pitch band where the roll floor applies (degrees)
pub const ROLL_FLOOR_PITCH_MIN: f32 = -79.0;
pub const ROLL_FLOOR_PITCH_MAX: f32 = -5.0;

/// Gimbal servo pulse widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoTargets {
    pub yaw: u16,
    pub pitch: u16,
    pub roll: u16,
}

impl ServoTargets {
    /// All three servos at the middle of their range (looking straight ahead)
    pub fn centered() -> Self {
        Self {
            yaw: YAW_SERVO_RANGE.mid(),
            pitch: PITCH_SERVO_RANGE.mid(),
            roll: ROLL_SERVO_RANGE.mid(),
        }
    }

    /// Resting pose for shutdown: centered yaw and roll, pitch at its stop
    pub fn parked() -> Self {
        Self {
            yaw: YAW_SERVO_RANGE.mid(),
            pitch: PITCH_SERVO_RANGE.min,
            roll: ROLL_SERVO_RANGE.mid(),
        }
    }
}

impl Default for ServoTargets {
    fn default() -> Self {
        Self::centered()
    }
}

/// Linearly rescale `x` from `[in_min, in_max]` to `[out_min, out_max]`
///
/// The input range may be descending, which inverts the mapping.
#[inline]
pub fn map_range(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Lowest roll that keeps the roll arm clear of the pitch arm
///
/// # Returns
///
/// `Some(floor)` in degrees while pitch is in [-79°, -5°], `None` otherwise.
pub fn roll_floor(pitch: f32) -> Option<f32> {
    if !(ROLL_FLOOR_PITCH_MIN..=ROLL_FLOOR_PITCH_MAX).contains(&pitch) {
        return None;
    }

    Some(-0.0003 * pitch.powi(3) - 0.0512 * pitch.powi(2) - 3.3477 * pitch - 90.803)
}

/// Map corrected head angles (degrees) to servo pulse widths
///
/// Pure: identical input always yields identical output. Every target is
/// within its channel's hardware range.
///
/// # Examples
///
/// ```
/// use telepresence_rig::gimbal::actuator::{map_to_servos, ServoTargets};
/// use telepresence_rig::gimbal::correction::GimbalAngles;
///
/// let targets = map_to_servos(GimbalAngles::new(0.0, 0.0, 0.0));
/// assert_eq!(targets, ServoTargets::centered());
/// ```
pub fn map_to_servos(angles: GimbalAngles) -> ServoTargets {
    let yaw = angles.yaw.clamp(-SERVO_ANGLE_LIMIT, SERVO_ANGLE_LIMIT);
    let yaw_target = to_pulse(yaw, -SERVO_MAP_SPAN, SERVO_MAP_SPAN, YAW_SERVO_RANGE);

    let pitch = angles.pitch.clamp(-SERVO_ANGLE_LIMIT, SERVO_ANGLE_LIMIT);
    let pitch_target = to_pulse(pitch, SERVO_MAP_SPAN, -SERVO_MAP_SPAN, PITCH_SERVO_RANGE);

    let mut roll = angles.roll;
    if let Some(floor) = roll_floor(pitch) {
        roll = roll.max(floor);
    }
    let roll = roll.clamp(-ROLL_ANGLE_LIMIT, ROLL_ANGLE_LIMIT);
    let roll_target = to_pulse(roll, SERVO_MAP_SPAN, -SERVO_MAP_SPAN, ROLL_SERVO_RANGE);

    ServoTargets {
        yaw: yaw_target,
        pitch: pitch_target,
        roll: roll_target,
    }
}

/// Rescale an angle onto a channel, truncate and clip into its range
#[inline]
fn to_pulse(angle: f32, in_min: f32, in_max: f32, range: ChannelRange) -> u16 {
    let pulse = map_range(angle, in_min, in_max, f32::from(range.min), f32::from(range.max));
    range.clip(pulse as i32)
}
