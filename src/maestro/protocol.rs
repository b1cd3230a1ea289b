//! # Maestro Protocol Constants and Types
//!
//! Command opcodes, the rig's channel layout and the hardware pulse-width
//! range of every channel. Targets are in quarter-microseconds, so 6000 is a
//! 1.5 ms pulse.

/// Set Target command (compact protocol)
pub const MAESTRO_CMD_SET_TARGET: u8 = 0x84;

/// Set Multiple Targets command (compact protocol)
pub const MAESTRO_CMD_SET_MULTIPLE_TARGETS: u8 = 0x9F;

/// Largest Maestro board (Mini Maestro 24)
pub const MAESTRO_MAX_CHANNELS: usize = 24;

/// Targets are carried as two 7-bit bytes, so 14 bits survive
pub const MAESTRO_TARGET_MAX: u16 = 0x3FFF;

/// A target of 0 tells the Maestro to stop sending pulses on the channel
pub const MAESTRO_TARGET_OFF: u16 = 0;

/// Number of channels the rig drives per cycle
pub const RIG_CHANNEL_COUNT: usize = 5;

/// Channel offsets relative to the configured first channel.
pub mod channels {
    /// Left drive motor controller
    pub const LEFT_MOTOR: usize = 0;
    /// Right drive motor controller
    pub const RIGHT_MOTOR: usize = 1;
    /// Gimbal yaw servo
    pub const YAW_SERVO: usize = 2;
    /// Gimbal pitch servo
    pub const PITCH_SERVO: usize = 3;
    /// Gimbal roll servo
    pub const ROLL_SERVO: usize = 4;
}

/// Pulse-width limits of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    pub min: u16,
    pub max: u16,
}

impl ChannelRange {
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// Midpoint of the range, rounded down.
    pub const fn mid(&self) -> u16 {
        ((self.min as u32 + self.max as u32) / 2) as u16
    }

    /// Clip a raw value into the range.
    pub fn clip(&self, value: i32) -> u16 {
        value.clamp(i32::from(self.min), i32::from(self.max)) as u16
    }

    pub fn contains(&self, value: u16) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Left motor controller range
pub const LEFT_MOTOR_RANGE: ChannelRange = ChannelRange::new(4000, 8000);

/// Right motor controller range
pub const RIGHT_MOTOR_RANGE: ChannelRange = ChannelRange::new(4000, 8000);

/// Yaw servo range
pub const YAW_SERVO_RANGE: ChannelRange = ChannelRange::new(3012, 9932);

/// Pitch servo range
pub const PITCH_SERVO_RANGE: ChannelRange = ChannelRange::new(2900, 9508);

/// Roll servo range
pub const ROLL_SERVO_RANGE: ChannelRange = ChannelRange::new(2952, 8624);

/// Neutral motor pulse (stopped)
pub const MOTOR_NEUTRAL: u16 = 6000;
