//! # Angle Extraction
//!
//! Decomposes the HMD orientation into yaw, pitch and roll using the Y-X-Z
//! rotation order: yaw about the vertical axis first, then pitch about the
//! lateral axis, then roll about the viewing axis. Right-handed coordinates
//! with counter-clockwise positive angles, so a positive yaw turns the head
//! left and a positive pitch tilts it up.

use nalgebra::UnitQuaternion;
use std::f32::consts::FRAC_PI_2;

/// Distance from ±1 at which the pitch sine is treated as a pole.
const SINGULARITY_RADIUS: f32 = 1.0e-6;

/// Orientation of the head in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl EulerAngles {
    pub fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }
}

/// Extract Y-X-Z Euler angles from a unit quaternion
///
/// The quaternion is trusted to be normalized; no validation is done.
///
/// # Examples
///
/// ```
/// use nalgebra::{UnitQuaternion, Vector3};
/// use telepresence_rig::gimbal::euler::extract_euler_angles;
///
/// let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5);
/// let angles = extract_euler_angles(&q);
/// assert!((angles.yaw - 0.5).abs() < 1e-5);
/// assert!(angles.pitch.abs() < 1e-5);
/// ```
pub fn extract_euler_angles(orientation: &UnitQuaternion<f32>) -> EulerAngles {
    let q = orientation.quaternion();
    let (x, y, z, w) = (q.i, q.j, q.k, q.w);
    let (xx, yy, zz, ww) = (x * x, y * y, z * z, w * w);

    let pitch_sine = 2.0 * (w * x - y * z);

    if pitch_sine <= -1.0 + SINGULARITY_RADIUS {
        // Looking straight down: yaw and roll share one degree of freedom
        EulerAngles {
            yaw: 0.0,
            pitch: -FRAC_PI_2,
            roll: (2.0 * (w * z - x * y)).atan2(ww + xx - yy - zz),
        }
    } else if pitch_sine >= 1.0 - SINGULARITY_RADIUS {
        EulerAngles {
            yaw: 0.0,
            pitch: FRAC_PI_2,
            roll: (2.0 * (w * z - x * y)).atan2(ww + xx - yy - zz),
        }
    } else {
        EulerAngles {
            yaw: (2.0 * (w * y + x * z)).atan2(ww - xx - yy + zz),
            pitch: pitch_sine.asin(),
            roll: (2.0 * (w * z + x * y)).atan2(ww - xx + yy - zz),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    const EPS: f32 = 1e-5;

    /// Build an orientation by applying yaw, then pitch, then roll.
    fn yxz(yaw: f32, pitch: f32, roll: f32) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), pitch)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), roll)
    }

    #[test]
    fn test_identity_is_level() {
        let angles = extract_euler_angles(&UnitQuaternion::identity());
        assert_eq!(angles, EulerAngles::default());
    }

    #[test]
    fn test_pure_axis_rotations() {
        let yaw = extract_euler_angles(&yxz(0.7, 0.0, 0.0));
        assert!((yaw.yaw - 0.7).abs() < EPS);
        assert!(yaw.pitch.abs() < EPS && yaw.roll.abs() < EPS);

        let pitch = extract_euler_angles(&yxz(0.0, -0.4, 0.0));
        assert!((pitch.pitch + 0.4).abs() < EPS);
        assert!(pitch.yaw.abs() < EPS && pitch.roll.abs() < EPS);

        let roll = extract_euler_angles(&yxz(0.0, 0.0, 1.1));
        assert!((roll.roll - 1.1).abs() < EPS);
        assert!(roll.yaw.abs() < EPS && roll.pitch.abs() < EPS);
    }

    #[test]
    fn test_combined_rotation_recovers_angles() {
        let angles = extract_euler_angles(&yxz(-0.3, 0.25, 0.6));
        assert!((angles.yaw + 0.3).abs() < EPS);
        assert!((angles.pitch - 0.25).abs() < EPS);
        assert!((angles.roll - 0.6).abs() < EPS);
    }

    #[test]
    fn test_behind_the_viewer_yaw() {
        let angles = extract_euler_angles(&yxz(2.5, 0.0, 0.0));
        assert!((angles.yaw - 2.5).abs() < EPS);
    }

    #[test]
    fn test_north_pole() {
        let angles = extract_euler_angles(&yxz(0.0, FRAC_PI_2, 0.0));
        assert_eq!(angles.yaw, 0.0);
        assert!((angles.pitch - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_south_pole() {
        let angles = extract_euler_angles(&yxz(0.0, -FRAC_PI_2, 0.0));
        assert_eq!(angles.yaw, 0.0);
        assert!((angles.pitch + FRAC_PI_2).abs() < EPS);
    }
}
