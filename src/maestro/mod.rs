//! # Maestro Protocol Module
//!
//! Implementation of the Pololu Maestro compact serial protocol.
//!
//! This module handles:
//! - Channel layout and hardware pulse-width ranges of the rig
//! - Set Target (0x84) and Set Multiple Targets (0x9F) command encoding
//! - 7-bit splitting of 14-bit target values

pub mod protocol;
pub mod encoder;
