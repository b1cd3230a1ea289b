//! # Gimbal Module
//!
//! Turns an HMD orientation into gimbal servo targets.
//!
//! The pipeline runs, in order:
//! 1. [`euler`] - quaternion to Y-X-Z yaw/pitch/roll
//! 2. [`correction`] - fold backward-facing readings, convert to degrees
//! 3. [`smoothing`] - hold yaw/roll while looking near-vertical
//! 4. [`actuator`] - clip and rescale into servo pulse widths
//!
//! Each stage is a standalone function; [`GimbalPipeline`] chains them and
//! owns the only cross-cycle state, the smoothing latches.

pub mod euler;
pub mod correction;
pub mod smoothing;
pub mod actuator;

use nalgebra::UnitQuaternion;

use actuator::{map_to_servos, ServoTargets};
use correction::{correct_gimbal_lock, GimbalAngles};
use euler::{extract_euler_angles, EulerAngles};
use smoothing::SmoothingState;

/// Every intermediate value of one pass through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GimbalFrame {
    /// Raw decomposition, radians
    pub raw: EulerAngles,
    /// After gimbal-lock correction, degrees
    pub corrected: GimbalAngles,
    /// After viewport-exit smoothing, degrees
    pub smoothed: GimbalAngles,
    /// Servo pulse widths
    pub targets: ServoTargets,
}

/// Orientation-to-servo pipeline with its smoothing state.
#[derive(Debug, Clone, Default)]
pub struct GimbalPipeline {
    smoothing: SmoothingState,
}

impl GimbalPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one orientation through all four stages
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::UnitQuaternion;
    /// use telepresence_rig::gimbal::GimbalPipeline;
    /// use telepresence_rig::gimbal::actuator::ServoTargets;
    ///
    /// let mut pipeline = GimbalPipeline::new();
    /// let frame = pipeline.process(&UnitQuaternion::identity());
    /// assert_eq!(frame.targets, ServoTargets::centered());
    /// ```
    pub fn process(&mut self, orientation: &UnitQuaternion<f32>) -> GimbalFrame {
        let raw = extract_euler_angles(orientation);
        let corrected = GimbalAngles::from(correct_gimbal_lock(raw));
        let smoothed = self.smoothing.apply(corrected);
        let targets = map_to_servos(smoothed);

        GimbalFrame {
            raw,
            corrected,
            smoothed,
            targets,
        }
    }

    pub fn smoothing(&self) -> &SmoothingState {
        &self.smoothing
    }

    /// Forget any latched yaw/roll
    pub fn reset(&mut self) {
        self.smoothing.clear();
    }
}
