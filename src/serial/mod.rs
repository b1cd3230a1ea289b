//! # Serial Communication Module
//!
//! Handles serial communication with the Pololu Maestro servo controller.
//!
//! This module handles:
//! - Opening the Maestro command port (8N1, configurable baud rate)
//! - Sending Set Target / Set Multiple Targets commands
//! - Treating short writes and timeouts as transmission failures
//! - Closing the port on shutdown

pub mod port_trait;

use crate::error::{Result, RigError};
use crate::maestro::encoder::{encode_set_multiple_targets, encode_set_target};
use port_trait::{SerialPortIO, TokioSerialPort};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default Maestro baud rate
pub const MAESTRO_BAUD_RATE: u32 = 230_400;

/// Maestro command link
///
/// Owns the serial port of the Maestro's command channel. A command either
/// goes out completely or the send fails; nothing is retried here.
pub struct MaestroLink<P = TokioSerialPort> {
    /// Serial port handle, `None` once closed
    port: Option<P>,
    /// Device path (e.g., /dev/ttyACM0)
    device_path: String,
}

impl<P> std::fmt::Debug for MaestroLink<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaestroLink")
            .field("device_path", &self.device_path)
            .field("open", &self.port.is_some())
            .finish_non_exhaustive()
    }
}

impl MaestroLink<TokioSerialPort> {
    /// Open the Maestro command port
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/ttyACM0")
    /// * `baud_rate` - Baud rate configured on the Maestro
    /// * `timeout` - Bound on every write and flush
    ///
    /// # Errors
    ///
    /// Returns `Connection` error if the port cannot be opened or configured
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use telepresence_rig::serial::{MaestroLink, MAESTRO_BAUD_RATE};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let link = MaestroLink::open("/dev/ttyACM0", MAESTRO_BAUD_RATE, Duration::from_secs(1))?;
    ///     println!("Connected to: {}", link.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        debug!("Opening Maestro serial port: {} at {} baud", path, baud_rate);

        let port = Self::open_port(path, baud_rate)?;
        info!("Successfully opened Maestro at {}", path);

        Ok(Self::with_port(TokioSerialPort::new(port, timeout), path))
    }

    /// Open a specific serial port with Maestro settings (8N1, no flow control)
    ///
    /// Bytes left in the port buffers by an earlier session are discarded.
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt};

        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| RigError::Connection(format!("Failed to open {}: {}", path, e)))?;

        port.clear(ClearBuffer::All)
            .map_err(|e| RigError::Connection(format!("Failed to clear {}: {}", path, e)))?;

        Ok(port)
    }
}

impl<P: SerialPortIO> MaestroLink<P> {
    /// Wrap an already opened port
    pub fn with_port(port: P, device_path: impl Into<String>) -> Self {
        Self {
            port: Some(port),
            device_path: device_path.into(),
        }
    }

    /// Send raw command bytes
    ///
    /// # Errors
    ///
    /// Returns `Transmission` error if the link is closed, or the write or
    /// flush fails or times out before every byte is accepted.
    pub async fn send(&mut self, command: &[u8]) -> Result<()> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| RigError::Transmission("Link is closed".to_string()))?;

        port.write_all(command)
            .await
            .map_err(|e| RigError::Transmission(format!("Failed to write command: {}", e)))?;

        port.flush()
            .await
            .map_err(|e| RigError::Transmission(format!("Failed to flush serial port: {}", e)))?;

        debug!("Sent Maestro command ({} bytes)", command.len());
        Ok(())
    }

    /// Set one channel's target
    pub async fn set_target(&mut self, channel: u8, target: u16) -> Result<()> {
        let command = encode_set_target(channel, target);
        self.send(&command).await
    }

    /// Set consecutive channels' targets in one command
    ///
    /// # Errors
    ///
    /// Returns `Protocol` error for an invalid channel span, `Transmission`
    /// error if the write does not complete.
    pub async fn set_multiple_targets(&mut self, first_channel: u8, targets: &[u16]) -> Result<()> {
        let command = encode_set_multiple_targets(first_channel, targets)?;
        self.send(&command).await
    }

    /// Close the port
    ///
    /// # Returns
    ///
    /// `true` if an open port was closed, `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        match self.port.take() {
            Some(port) => {
                drop(port);
                info!("Closed Maestro link at {}", self.device_path);
                true
            }
            None => {
                warn!("Maestro link at {} already closed", self.device_path);
                false
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Get the device path of the serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}
