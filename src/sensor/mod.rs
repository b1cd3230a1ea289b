//! # Orientation Sensor Module
//!
//! Head orientation input.
//!
//! This module handles:
//! - The [`OrientationSensor`] seam the control loop reads from
//! - A JSON Lines quaternion stream fed by the HMD runtime ([`stream`])
//! - A fixed level sensor for bench runs without a headset

pub mod stream;

use nalgebra::UnitQuaternion;

use crate::error::Result;

/// Source of head orientation readings.
#[cfg_attr(test, mockall::automock)]
pub trait OrientationSensor: Send {
    /// Current head orientation
    ///
    /// # Errors
    ///
    /// Returns `SensorReadGap` when no fresh reading is available.
    fn orientation(&mut self) -> Result<UnitQuaternion<f32>>;

    /// Make the current heading the new straight-ahead
    fn reset_reference(&mut self);
}

impl<T: OrientationSensor + ?Sized> OrientationSensor for Box<T> {
    fn orientation(&mut self) -> Result<UnitQuaternion<f32>> {
        (**self).orientation()
    }

    fn reset_reference(&mut self) {
        (**self).reset_reference()
    }
}

/// Sensor that always reports a level, forward-facing head.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelSensor;

impl OrientationSensor for LevelSensor {
    fn orientation(&mut self) -> Result<UnitQuaternion<f32>> {
        Ok(UnitQuaternion::identity())
    }

    fn reset_reference(&mut self) {}
}
