//! # Gamepad Reader
//!
//! Reads the controller on a dedicated thread, since evdev blocks while
//! waiting for events, and publishes the latest stick state to the control
//! loop through a `watch` channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::calibration::DeadZone;
use super::mapper::{ControllerState, EventMapper, GamepadAxes};
use super::ps5::DualSenseController;
use crate::error::{Result, RigError};

/// Source of drive stick readings.
#[cfg_attr(test, mockall::automock)]
pub trait GamepadSource: Send {
    /// Whether a gamepad is currently delivering readings
    fn is_connected(&self) -> bool;

    /// Latest stick readings, dead-zone applied
    fn poll_axes(&mut self) -> GamepadAxes;
}

/// Gamepad fed by a background evdev reader thread.
#[derive(Debug)]
pub struct Gamepad {
    state: watch::Receiver<ControllerState>,
    connected: Arc<AtomicBool>,
    deadzone: DeadZone,
}

impl Gamepad {
    /// Start reading `controller` on a background thread
    ///
    /// The thread exits when the controller disconnects or the `Gamepad` is
    /// dropped and the next event arrives.
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if the reader thread cannot be spawned.
    pub fn spawn(mut controller: DualSenseController, deadzone: DeadZone) -> Result<Self> {
        let (tx, rx) = watch::channel(ControllerState::default());
        let connected = Arc::new(AtomicBool::new(true));
        let reader_connected = Arc::clone(&connected);
        let device_path = controller.device_path().to_string();

        std::thread::Builder::new()
            .name("gamepad-reader".to_string())
            .spawn(move || {
                let mut mapper = EventMapper::new();
                loop {
                    match controller.fetch_events() {
                        Ok(events) => {
                            for event in events {
                                mapper.process_event(&event);
                            }
                        }
                        Err(e) => {
                            warn!("Gamepad at {} disconnected: {}", device_path, e);
                            reader_connected.store(false, Ordering::Release);
                            break;
                        }
                    }

                    if tx.send(*mapper.state()).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| RigError::Controller(format!("Failed to spawn reader thread: {}", e)))?;

        info!("Gamepad reader started");
        Ok(Self {
            state: rx,
            connected,
            deadzone,
        })
    }

    /// A gamepad that never reports input; motors stay neutral
    pub fn disconnected(deadzone: DeadZone) -> Self {
        let (_tx, rx) = watch::channel(ControllerState::default());
        Self {
            state: rx,
            connected: Arc::new(AtomicBool::new(false)),
            deadzone,
        }
    }
}

impl GamepadSource for Gamepad {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn poll_axes(&mut self) -> GamepadAxes {
        if !self.is_connected() {
            return GamepadAxes::default();
        }
        self.state.borrow().axes(&self.deadzone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_gamepad_reads_centered() {
        let mut gamepad = Gamepad::disconnected(DeadZone::default());
        assert!(!gamepad.is_connected());
        assert_eq!(gamepad.poll_axes(), GamepadAxes::default());
    }

    #[test]
    fn test_connected_gamepad_reports_latest_state() {
        let (tx, rx) = watch::channel(ControllerState::default());
        let mut gamepad = Gamepad {
            state: rx,
            connected: Arc::new(AtomicBool::new(true)),
            deadzone: DeadZone::default(),
        };

        tx.send(ControllerState {
            left_stick_y: 0,
            ..ControllerState::default()
        })
        .unwrap();

        assert_eq!(gamepad.poll_axes().left_y, 32767);
    }

    #[test]
    fn test_lost_connection_reads_centered() {
        let (tx, rx) = watch::channel(ControllerState {
            right_stick_x: 255,
            ..ControllerState::default()
        });
        let connected = Arc::new(AtomicBool::new(true));
        let mut gamepad = Gamepad {
            state: rx,
            connected: Arc::clone(&connected),
            deadzone: DeadZone::default(),
        };
        assert_eq!(gamepad.poll_axes().right_x, 32767);

        connected.store(false, Ordering::Release);
        drop(tx);
        assert_eq!(gamepad.poll_axes(), GamepadAxes::default());
    }
}
