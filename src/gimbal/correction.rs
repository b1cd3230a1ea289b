//! # Gimbal-Lock Correction
//!
//! Near the poles the Y-X-Z decomposition can describe a forward vector that
//! points behind the viewer, which makes yaw and roll jump by 180° between
//! adjacent frames. This stage folds such readings back in front of the
//! viewer and rebuilds yaw and pitch from the forward vector.

use std::f32::consts::{FRAC_PI_2, PI};

use super::euler::EulerAngles;

/// Head orientation in degrees, as consumed by the smoothing and mapping stages.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GimbalAngles {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl GimbalAngles {
    pub fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }
}

impl From<EulerAngles> for GimbalAngles {
    fn from(angles: EulerAngles) -> Self {
        Self {
            yaw: angles.yaw.to_degrees(),
            pitch: angles.pitch.to_degrees(),
            roll: angles.roll.to_degrees(),
        }
    }
}

/// Unit vector the head is looking along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ForwardVector {
    /// Forward direction implied by yaw and pitch (radians)
    pub fn from_yaw_pitch(yaw: f32, pitch: f32) -> Self {
        Self {
            x: yaw.sin() * pitch.cos(),
            y: -pitch.sin(),
            z: yaw.cos() * pitch.cos(),
        }
    }

    /// Heading recovered from the vector, in radians
    pub fn yaw(&self) -> f32 {
        self.x.atan2(self.z)
    }

    /// Elevation recovered from the vector, in radians
    pub fn pitch(&self) -> f32 {
        -self.y.atan2((self.z * self.z + self.x * self.x).sqrt())
    }
}

/// Correct a raw Euler decomposition for readings that face backward
///
/// When the forward vector faces away (`z < 0`) while the head is rolled past
/// 90°, the x component is mirrored, z is forced positive and roll is folded
/// across the nearest pole. Yaw and pitch are then recomputed from the
/// (possibly corrected) forward vector.
///
/// # Arguments
///
/// * `angles` - Raw angles from [`extract_euler_angles`](super::euler::extract_euler_angles), radians
///
/// # Returns
///
/// Corrected angles in radians.
pub fn correct_gimbal_lock(angles: EulerAngles) -> EulerAngles {
    let mut forward = ForwardVector::from_yaw_pitch(angles.yaw, angles.pitch);
    let mut roll = angles.roll;

    if forward.z < 0.0 && roll.abs() > FRAC_PI_2 {
        forward.x = -forward.x;
        forward.z = forward.z.abs();

        roll = if roll > FRAC_PI_2 { PI - roll } else { -PI - roll };
    }

    EulerAngles {
        yaw: forward.yaw(),
        pitch: forward.pitch(),
        roll,
    }
}
