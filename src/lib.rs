//! # Telepresence Rig Library
//!
//! Drive a two-wheeled telepresence rig with a gamepad while its camera
//! gimbal follows the operator's head.
//!
//! This library provides the head-orientation-to-servo pipeline, gamepad motor
//! mixing, and the Pololu Maestro command link that carries both to the rig.

pub mod config;
pub mod error;
pub mod maestro;
pub mod gimbal;
pub mod controller;
pub mod serial;
pub mod sensor;
pub mod control;
pub mod hotkey;
