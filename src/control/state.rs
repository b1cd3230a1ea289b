//! # Control Loop State
//!
//! Operator commands and the run/pause/terminate state machine they drive.
//!
//! ```text
//!            TogglePause             Exit
//!  Running <-------------> Paused ---------> Terminating
//!     |                                          ^
//!     +------------------------------------------+
//!                         Exit
//! ```
//!
//! [`ControlLoopState::apply`] only updates flags and reports what the loop
//! has to do about it; the loop performs the I/O.

use std::fmt;

use crate::controller::mixer::DriveMode;

/// Operator command posted to the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Make the current head heading straight-ahead
    ResetOrientation,
    /// Switch between tank and arcade drive
    ToggleDriveMode,
    /// Stop or resume all transmission
    TogglePause,
    /// Hold the drive motors at neutral, or release them
    ToggleMotorPause,
    /// Freeze the gimbal, or release it
    ToggleServoPause,
    /// Shut down and leave the loop
    Exit,
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlEvent::ResetOrientation => "reset orientation",
            ControlEvent::ToggleDriveMode => "toggle drive mode",
            ControlEvent::TogglePause => "toggle pause",
            ControlEvent::ToggleMotorPause => "toggle motor pause",
            ControlEvent::ToggleServoPause => "toggle servo pause",
            ControlEvent::Exit => "exit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopPhase {
    #[default]
    Running,
    Paused,
    Terminating,
}

/// What the control loop must do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Only flags changed
    Updated,
    /// Orientation reference and smoothing must be reset
    ResetOrientation,
    /// Entered `Paused`; the shutdown sequence must run
    Paused,
    /// Left `Paused`
    Resumed,
    /// Entered `Terminating`; `shutdown` says whether the shutdown sequence
    /// still has to run
    Terminate { shutdown: bool },
    /// Event has no effect in the current phase
    Ignored,
}

/// Mode flags owned by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlLoopState {
    pub phase: LoopPhase,
    pub motor_paused: bool,
    pub servo_paused: bool,
    pub drive_mode: DriveMode,
}

impl ControlLoopState {
    pub fn new(drive_mode: DriveMode) -> Self {
        Self {
            drive_mode,
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == LoopPhase::Running
    }

    pub fn is_terminating(&self) -> bool {
        self.phase == LoopPhase::Terminating
    }

    /// Apply an operator command
    pub fn apply(&mut self, event: ControlEvent) -> Transition {
        if self.is_terminating() {
            return Transition::Ignored;
        }

        match event {
            ControlEvent::Exit => {
                let shutdown = self.phase == LoopPhase::Running;
                self.phase = LoopPhase::Terminating;
                Transition::Terminate { shutdown }
            }
            ControlEvent::TogglePause => match self.phase {
                LoopPhase::Running => {
                    self.phase = LoopPhase::Paused;
                    Transition::Paused
                }
                _ => {
                    self.phase = LoopPhase::Running;
                    Transition::Resumed
                }
            },
            ControlEvent::ResetOrientation => Transition::ResetOrientation,
            ControlEvent::ToggleDriveMode => {
                self.drive_mode = self.drive_mode.toggled();
                Transition::Updated
            }
            ControlEvent::ToggleMotorPause => {
                self.motor_paused = !self.motor_paused;
                Transition::Updated
            }
            ControlEvent::ToggleServoPause => {
                self.servo_paused = !self.servo_paused;
                Transition::Updated
            }
        }
    }
}
