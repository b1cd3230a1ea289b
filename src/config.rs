//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so a file only needs the values it changes.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::controller::calibration::{DeadZone, MAX_DEADZONE};
use crate::controller::mixer::DriveMode;
use crate::error::{Result, RigError};
use crate::maestro::protocol::{MAESTRO_MAX_CHANNELS, RIG_CHANNEL_COUNT};

/// Configuration file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Baud rates the Maestro's USB serial bridge accepts
pub const SUPPORTED_BAUD_RATES: [u32; 6] = [9600, 19200, 38400, 57600, 115200, 230400];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub gamepad: GamepadConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Maestro serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Gamepad configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GamepadConfig {
    /// Empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_deadzone")]
    pub deadzone: f32,

    #[serde(default)]
    pub drive_mode: DriveMode,
}

/// Orientation stream configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    /// Empty means a level bench sensor
    #[serde(default)]
    pub stream_path: String,

    #[serde(default = "default_stale_timeout_ms")]
    pub stale_timeout_ms: u64,

    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default)]
    pub first_channel: u8,

    #[serde(default = "default_hotkeys")]
    pub hotkeys: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Empty means console only
    #[serde(default)]
    pub file_dir: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 230400 }
fn default_timeout_ms() -> u64 { 1000 }

fn default_deadzone() -> f32 { 0.02 }

fn default_stale_timeout_ms() -> u64 { 100 }
fn default_open_timeout_ms() -> u64 { 5000 }

fn default_tick_interval_ms() -> u64 { 1 }
fn default_report_interval_ms() -> u64 { 500 }
fn default_settle_delay_ms() -> u64 { 500 }
fn default_hotkeys() -> bool { true }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            deadzone: default_deadzone(),
            drive_mode: DriveMode::default(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            stream_path: String::new(),
            stale_timeout_ms: default_stale_timeout_ms(),
            open_timeout_ms: default_open_timeout_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            report_interval_ms: default_report_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            first_channel: 0,
            hotkeys: default_hotkeys(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_dir: String::new(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> RigError {
    RigError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use telepresence_rig::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path`, falling back to built-in defaults when the default
    /// configuration file is absent
    ///
    /// An explicitly requested file that does not exist is still an error.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                SUPPORTED_BAUD_RATES
            )));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        if !(0.0..=MAX_DEADZONE).contains(&self.gamepad.deadzone) {
            return Err(invalid(format!(
                "deadzone must be between 0.0 and {}",
                MAX_DEADZONE
            )));
        }

        if self.sensor.stale_timeout_ms == 0 || self.sensor.stale_timeout_ms > 10000 {
            return Err(invalid("stale_timeout_ms must be between 1 and 10000"));
        }

        if self.sensor.open_timeout_ms == 0 || self.sensor.open_timeout_ms > 60000 {
            return Err(invalid("open_timeout_ms must be between 1 and 60000"));
        }

        if self.control.tick_interval_ms == 0 || self.control.tick_interval_ms > 100 {
            return Err(invalid("tick_interval_ms must be between 1 and 100"));
        }

        if self.control.report_interval_ms == 0 || self.control.report_interval_ms > 60000 {
            return Err(invalid("report_interval_ms must be between 1 and 60000"));
        }

        if self.control.settle_delay_ms > 10000 {
            return Err(invalid("settle_delay_ms must be at most 10000"));
        }

        if usize::from(self.control.first_channel) + RIG_CHANNEL_COUNT > MAESTRO_MAX_CHANNELS {
            return Err(invalid(format!(
                "first_channel {} leaves no room for {} channels (Maestro has {})",
                self.control.first_channel, RIG_CHANNEL_COUNT, MAESTRO_MAX_CHANNELS
            )));
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(invalid(format!(
                "logging level '{}' must be one of: trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        Ok(())
    }

    pub fn serial_timeout(&self) -> Duration {
        Duration::from_millis(self.serial.timeout_ms)
    }

    pub fn deadzone(&self) -> DeadZone {
        DeadZone::new(self.gamepad.deadzone)
    }

    pub fn sensor_stale_after(&self) -> Duration {
        Duration::from_millis(self.sensor.stale_timeout_ms)
    }

    pub fn sensor_open_timeout(&self) -> Duration {
        Duration::from_millis(self.sensor.open_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        let toml_content = r#"
[serial]
port = "/dev/ttyACM1"

[gamepad]
drive_mode = "tank"
deadzone = 0.1

[sensor]
stream_path = "/tmp/hmd.fifo"

[control]
first_channel = 6
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM1");
        assert_eq!(config.serial.baud_rate, 230400);
        assert_eq!(config.gamepad.drive_mode, DriveMode::Tank);
        assert_eq!(config.gamepad.deadzone, 0.1);
        assert_eq!(config.sensor.stream_path, "/tmp/hmd.fifo");
        assert_eq!(config.control.first_channel, 6);
        assert_eq!(config.control.settle_delay_ms, 500);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.gamepad.drive_mode, DriveMode::Arcade);
        assert!(config.sensor.stream_path.is_empty());
        assert!(config.control.hotkeys);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = Config::load_or_default(Some(Path::new("/nonexistent/rig.toml")));
        assert!(matches!(result, Err(RigError::Io(_))));
    }

    #[test]
    fn test_unknown_drive_mode_rejected() {
        let result = Config::parse("[gamepad]\ndrive_mode = \"hover\"\n");
        assert!(matches!(result, Err(RigError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(Config::parse("[serial\nport = ").is_err());
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = Config::default();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in &SUPPORTED_BAUD_RATES {
            let mut config = Config::default();
            config.serial.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_timeout_ms_bounds() {
        let mut config = Config::default();
        config.serial.timeout_ms = 0;
        assert!(config.validate().is_err());
        config.serial.timeout_ms = 10001;
        assert!(config.validate().is_err());
        config.serial.timeout_ms = 10000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deadzone_bounds() {
        let mut config = Config::default();
        config.gamepad.deadzone = -0.1;
        assert!(config.validate().is_err());
        config.gamepad.deadzone = 0.3;
        assert!(config.validate().is_err());
        config.gamepad.deadzone = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sensor_timeouts_bounds() {
        let mut config = Config::default();
        config.sensor.stale_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sensor.open_timeout_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_interval_bounds() {
        let mut config = Config::default();
        config.control.tick_interval_ms = 0;
        assert!(config.validate().is_err());
        config.control.tick_interval_ms = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_report_interval_zero() {
        let mut config = Config::default();
        config.control.report_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settle_delay_too_high() {
        let mut config = Config::default();
        config.control.settle_delay_ms = 10001;
        assert!(config.validate().is_err());
        config.control.settle_delay_ms = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_first_channel_must_fit_rig_channels() {
        let mut config = Config::default();
        config.control.first_channel = 19;
        assert!(config.validate().is_ok());
        config.control.first_channel = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_serial_port(), "/dev/ttyACM0");
        assert_eq!(default_baud_rate(), 230400);
        assert_eq!(default_timeout_ms(), 1000);
        assert_eq!(default_deadzone(), 0.02);
        assert_eq!(default_stale_timeout_ms(), 100);
        assert_eq!(default_open_timeout_ms(), 5000);
        assert_eq!(default_tick_interval_ms(), 1);
        assert_eq!(default_report_interval_ms(), 500);
        assert_eq!(default_settle_delay_ms(), 500);
        assert!(default_hotkeys());
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn test_duration_helpers() {
        let config = Config::default();
        assert_eq!(config.serial_timeout(), Duration::from_secs(1));
        assert_eq!(config.sensor_stale_after(), Duration::from_millis(100));
        assert_eq!(config.sensor_open_timeout(), Duration::from_secs(5));
        assert_eq!(config.deadzone(), DeadZone::new(0.02));
    }
}
