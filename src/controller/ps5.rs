//! # PS5 DualSense Controller Module
//!
//! This module handles PS5 DualSense controller detection and connection
//! using the Linux evdev interface. The controller is the rig's drive input;
//! only its analog sticks are used.
//!
//! ## Controller Detection
//!
//! The DualSense controller is identified by:
//! - Vendor ID: 0x054c (Sony)
//! - Product ID: 0x0ce6 (DualSense, both wired and Bluetooth)
//!
//! ## Input Axes
//!
//! - Left stick: ABS_X (0-255), ABS_Y (0-255)
//! - Right stick: ABS_Z (0-255), ABS_RZ (0-255)

use evdev::Device;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, RigError};

/// PS5 DualSense vendor ID (Sony)
const DUALSENSE_VENDOR_ID: u16 = 0x054c;

/// PS5 DualSense product ID (wired and Bluetooth)
const DUALSENSE_PRODUCT_ID: u16 = 0x0ce6;

/// Directory scanned for input devices
const INPUT_DIR: &str = "/dev/input";

/// PS5 DualSense controller handle
///
/// Represents an open evdev connection to a DualSense controller.
pub struct DualSenseController {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for DualSenseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualSenseController")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl DualSenseController {
    /// Detect and open the first available PS5 DualSense controller
    ///
    /// Scans `/dev/input/event*` in name order and opens the first device
    /// whose vendor and product IDs match a DualSense.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: No DualSense controller found on the system
    /// - `Controller`: `/dev/input` missing or unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use telepresence_rig::controller::ps5::DualSenseController;
    ///
    /// let controller = DualSenseController::open()?;
    /// println!("Connected to controller at: {}", controller.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open() -> Result<Self> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(RigError::Controller(format!("{} directory not found", INPUT_DIR)));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| RigError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| RigError::Controller(format!("Failed to read directory entry: {}", e)))?;

        // Deterministic choice when several controllers are attached
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_device = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_device {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    let id = device.input_id();
                    debug!(
                        "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
                        path.display(),
                        id.vendor(),
                        id.product()
                    );

                    if is_dualsense(id.vendor(), id.product()) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found PS5 DualSense controller at: {}", device_path);
                        return Ok(Self { device, device_path });
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(RigError::ControllerNotFound)
    }

    /// Open a controller at a known event device path
    ///
    /// No vendor check is made, so any gamepad exposing the DualSense axis
    /// layout can be used.
    pub fn open_path(path: &str) -> Result<Self> {
        let device = Device::open(path)
            .map_err(|e| RigError::Controller(format!("Failed to open {}: {}", path, e)))?;
        info!(
            "Opened gamepad {} at: {}",
            device.name().unwrap_or("(unnamed)"),
            path
        );

        Ok(Self {
            device,
            device_path: path.to_string(),
        })
    }

    /// Get the device path of this controller
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Fetch events from the controller
    ///
    /// Blocks until at least one event is available.
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if fetching events fails (e.g., controller disconnected).
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = evdev::InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| RigError::Controller(format!("Failed to fetch events: {}", e)))
    }

    /// Human-readable device name reported by evdev
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }
}

fn is_dualsense(vendor: u16, product: u16) -> bool {
    vendor == DUALSENSE_VENDOR_ID && product == DUALSENSE_PRODUCT_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dualsense_ids() {
        assert!(is_dualsense(0x054c, 0x0ce6));
        assert!(!is_dualsense(0x054c, 0x09cc), "DualShock 4 has a different axis layout");
        assert!(!is_dualsense(0x045e, 0x0ce6));
    }

    #[test]
    fn test_open_path_missing_device() {
        match DualSenseController::open_path("/dev/input/event_nonexistent_42") {
            Err(RigError::Controller(msg)) => assert!(msg.contains("event_nonexistent_42")),
            other => panic!("Expected Controller error, got: {:?}", other),
        }
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_open_with_real_hardware() {
        let controller = DualSenseController::open().expect("Controller not found");
        assert!(controller.device_path().starts_with("/dev/input/event"));
        assert!(controller.name().is_some());
    }
}
