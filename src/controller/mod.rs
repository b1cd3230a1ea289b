//! # Controller Module
//!
//! Gamepad input for driving the rig.
//!
//! This module handles:
//! - PS5 controller detection and connection via evdev
//! - Reading analog sticks on a background thread
//! - Normalizing sticks and applying the dead-zone
//! - Mixing sticks into left/right motor targets (tank or arcade)

pub mod ps5;
pub mod mapper;
pub mod calibration;
pub mod mixer;
pub mod gamepad;
