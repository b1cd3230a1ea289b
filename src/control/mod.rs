//! # Control Loop Module
//!
//! The single task that owns the rig while it runs.
//!
//! This module handles:
//! - Reading the gamepad and head orientation every tick
//! - Mixing motor targets and running the gimbal pipeline
//! - Sending all five channel targets in one Maestro command
//! - Operator commands (pause, exit, reset, mode toggles)
//! - The shutdown sequence that parks the rig before pausing or exiting
//!
//! A failed transmission or a missing orientation reading only affects the
//! current tick; nothing propagates out of the loop.

pub mod rate;
pub mod state;

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::ControlConfig;
use crate::controller::gamepad::GamepadSource;
use crate::controller::mixer::{mix, MotorTargets};
use crate::gimbal::actuator::ServoTargets;
use crate::gimbal::GimbalPipeline;
use crate::maestro::protocol::{channels, MAESTRO_TARGET_OFF, MOTOR_NEUTRAL, RIG_CHANNEL_COUNT};
use crate::sensor::OrientationSensor;
use crate::serial::port_trait::{SerialPortIO, TokioSerialPort};
use crate::serial::MaestroLink;
use rate::RateMeter;
use state::{ControlEvent, ControlLoopState, Transition};

/// Depth of the operator command queue
pub const EVENT_QUEUE_DEPTH: usize = 32;

/// Timing and addressing for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub tick_interval: Duration,
    pub report_interval: Duration,
    /// Pause between the neutral and power-down commands of the shutdown sequence
    pub settle_delay: Duration,
    /// Maestro channel of the left motor; the other four follow it
    pub first_channel: u8,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from(&ControlConfig::default())
    }
}

impl From<&ControlConfig> for LoopSettings {
    fn from(config: &ControlConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            report_interval: Duration::from_millis(config.report_interval_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            first_channel: config.first_channel,
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Not running; nothing computed or sent
    Skipped,
    /// Command written
    Sent,
    /// Command could not be written and was discarded
    Dropped,
}

/// Lay out motor and servo targets in channel order
pub fn command_targets(motors: MotorTargets, servos: ServoTargets) -> [u16; RIG_CHANNEL_COUNT] {
    let mut targets = [0u16; RIG_CHANNEL_COUNT];
    targets[channels::LEFT_MOTOR] = motors.left;
    targets[channels::RIGHT_MOTOR] = motors.right;
    targets[channels::YAW_SERVO] = servos.yaw;
    targets[channels::PITCH_SERVO] = servos.pitch;
    targets[channels::ROLL_SERVO] = servos.roll;
    targets
}

/// Final command of the shutdown sequence: stop pulses on the left motor and
/// all servos, leave the right motor at neutral.
pub fn power_down_targets() -> [u16; RIG_CHANNEL_COUNT] {
    let mut targets = [MAESTRO_TARGET_OFF; RIG_CHANNEL_COUNT];
    targets[channels::RIGHT_MOTOR] = MOTOR_NEUTRAL;
    targets
}

/// Rig control loop.
pub struct ControlLoop<G, S, P = TokioSerialPort> {
    gamepad: G,
    sensor: S,
    link: MaestroLink<P>,
    state: ControlLoopState,
    pipeline: GimbalPipeline,
    motors: MotorTargets,
    servos: ServoTargets,
    meter: RateMeter,
    settings: LoopSettings,
    /// Set while orientation readings are missing
    sensor_gap: bool,
}

impl<G, S, P> ControlLoop<G, S, P>
where
    G: GamepadSource,
    S: OrientationSensor,
    P: SerialPortIO,
{
    pub fn new(
        gamepad: G,
        sensor: S,
        link: MaestroLink<P>,
        state: ControlLoopState,
        settings: LoopSettings,
    ) -> Self {
        Self {
            gamepad,
            sensor,
            link,
            state,
            pipeline: GimbalPipeline::new(),
            motors: MotorTargets::neutral(),
            servos: ServoTargets::centered(),
            meter: RateMeter::new(settings.report_interval),
            settings,
            sensor_gap: false,
        }
    }

    pub fn state(&self) -> &ControlLoopState {
        &self.state
    }

    /// Targets sent by the most recent tick
    pub fn targets(&self) -> (MotorTargets, ServoTargets) {
        (self.motors, self.servos)
    }

    /// Run until `Exit` arrives or every event sender is gone, then close the
    /// link
    pub async fn run(mut self, mut events: mpsc::Receiver<ControlEvent>) {
        let mut ticker = tokio::time::interval(self.settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Control loop started ({:?} tick, {} drive, channels {}..{})",
            self.settings.tick_interval,
            self.state.drive_mode,
            self.settings.first_channel,
            usize::from(self.settings.first_channel) + RIG_CHANNEL_COUNT
        );

        while !self.state.is_terminating() {
            tokio::select! {
                biased;

                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        info!("Event queue closed");
                        self.handle_event(ControlEvent::Exit).await;
                    }
                },

                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.link.close();
        info!("Control loop stopped after {} cycles", self.meter.total());
    }

    /// Run one control cycle
    pub async fn tick(&mut self) -> CycleOutcome {
        if !self.state.is_running() {
            return CycleOutcome::Skipped;
        }

        self.motors = if self.state.motor_paused || !self.gamepad.is_connected() {
            MotorTargets::neutral()
        } else {
            mix(&self.gamepad.poll_axes(), self.state.drive_mode)
        };

        if !self.state.servo_paused {
            self.update_servos();
        }

        if let Some(hz) = self.meter.record() {
            info!("Loop frequency: {:.1} Hz", hz);
        }

        let targets = command_targets(self.motors, self.servos);
        debug!("Targets: {:?}", targets);

        match self
            .link
            .set_multiple_targets(self.settings.first_channel, &targets)
            .await
        {
            Ok(()) => CycleOutcome::Sent,
            Err(e) => {
                warn!("Dropped command: {}", e);
                CycleOutcome::Dropped
            }
        }
    }

    /// Refresh servo targets from the sensor, holding them on a read gap
    fn update_servos(&mut self) {
        match self.sensor.orientation() {
            Ok(orientation) => {
                if self.sensor_gap {
                    info!("Orientation readings resumed");
                    self.sensor_gap = false;
                }

                let frame = self.pipeline.process(&orientation);
                debug!(
                    "Head yaw {:.1}° pitch {:.1}° roll {:.1}°",
                    frame.smoothed.yaw, frame.smoothed.pitch, frame.smoothed.roll
                );
                self.servos = frame.targets;
            }
            Err(e) if self.sensor_gap => debug!("Holding gimbal: {}", e),
            Err(e) => {
                warn!("Holding gimbal: {}", e);
                self.sensor_gap = true;
            }
        }
    }

    /// Apply an operator command
    pub async fn handle_event(&mut self, event: ControlEvent) {
        match self.state.apply(event) {
            Transition::Updated => info!(
                "{}: {} drive, motors {}, servos {}",
                event,
                self.state.drive_mode,
                if self.state.motor_paused { "paused" } else { "active" },
                if self.state.servo_paused { "paused" } else { "active" },
            ),
            Transition::ResetOrientation => {
                self.sensor.reset_reference();
                self.pipeline.reset();
                info!("Orientation reset");
            }
            Transition::Paused => {
                info!("Pausing");
                self.shutdown_sequence().await;
                info!("Paused");
            }
            Transition::Resumed => {
                self.meter.restart();
                info!("Resumed");
            }
            Transition::Terminate { shutdown } => {
                info!("Exiting");
                if shutdown {
                    self.shutdown_sequence().await;
                }
            }
            Transition::Ignored => debug!("Ignoring {} while terminating", event),
        }
    }

    /// Park the rig, let it settle, then stop the pulses
    ///
    /// Failures are logged and the sequence carries on.
    pub async fn shutdown_sequence(&mut self) {
        let neutral = command_targets(MotorTargets::neutral(), ServoTargets::parked());
        if let Err(e) = self
            .link
            .set_multiple_targets(self.settings.first_channel, &neutral)
            .await
        {
            warn!("Failed to send neutral targets: {}", e);
        }

        tokio::time::sleep(self.settings.settle_delay).await;

        if let Err(e) = self
            .link
            .set_multiple_targets(self.settings.first_channel, &power_down_targets())
            .await
        {
            warn!("Failed to send power-down targets: {}", e);
        }

        self.motors = MotorTargets::neutral();
        debug!("Shutdown sequence complete");
    }
}

/// Create the operator command queue
pub fn event_queue() -> (mpsc::Sender<ControlEvent>, mpsc::Receiver<ControlEvent>) {
    mpsc::channel(EVENT_QUEUE_DEPTH)
}
