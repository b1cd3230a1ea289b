//! # Telepresence Rig
//!
//! Drive a telepresence rig with a PS5 DualSense controller while the camera
//! gimbal follows a head-mounted display.
//!
//! # Usage
//!
//! ```bash
//! telepresence-rig [config.toml]
//! ```
//!
//! Without an argument `config/default.toml` is used when present, otherwise
//! the built-in defaults.
//!
//! # Startup
//!
//! 1. Load configuration and set up logging
//! 2. Open the Maestro serial link (fatal on failure)
//! 3. Open the orientation stream, or a level bench sensor when none is
//!    configured (fatal on failure)
//! 4. Open the gamepad (a missing gamepad leaves the motors at neutral)
//! 5. Start hotkeys and the Ctrl+C handler, then run the control loop
//!
//! Expected output:
//! ```text
//! INFO telepresence_rig: Telepresence Rig v0.1.0 starting...
//! INFO telepresence_rig::serial: Successfully opened Maestro at /dev/ttyACM0
//! INFO telepresence_rig::control: Control loop started (1ms tick, arcade drive, channels 0..5)
//! INFO telepresence_rig::control: Loop frequency: 998.7 Hz
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use telepresence_rig::config::{Config, LoggingConfig};
use telepresence_rig::control::state::{ControlEvent, ControlLoopState};
use telepresence_rig::control::{event_queue, ControlLoop, LoopSettings};
use telepresence_rig::controller::gamepad::Gamepad;
use telepresence_rig::controller::ps5::DualSenseController;
use telepresence_rig::hotkey::KeyboardListener;
use telepresence_rig::sensor::stream::QuaternionStream;
use telepresence_rig::sensor::{LevelSensor, OrientationSensor};
use telepresence_rig::serial::MaestroLink;

/// Log file name prefix inside `logging.file_dir`
const LOG_FILE_PREFIX: &str = "telepresence-rig.log";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    let _log_guard = init_logging(&config.logging);
    info!("Telepresence Rig v{} starting...", env!("CARGO_PKG_VERSION"));

    let link = MaestroLink::open(&config.serial.port, config.serial.baud_rate, config.serial_timeout())
        .context("Maestro serial link is required")?;

    let sensor = open_sensor(&config).await?;
    let gamepad = open_gamepad(&config);

    let (events_tx, events_rx) = event_queue();

    let _keyboard = if config.control.hotkeys {
        match KeyboardListener::spawn(events_tx.clone()) {
            Ok(listener) => Some(listener),
            Err(e) => {
                warn!("Hotkeys unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let signal_tx = events_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
            let _ = signal_tx.send(ControlEvent::Exit).await;
        }
    });
    drop(events_tx);

    let control = ControlLoop::new(
        gamepad,
        sensor,
        link,
        ControlLoopState::new(config.gamepad.drive_mode),
        LoopSettings::from(&config.control),
    );
    control.run(events_rx).await;

    info!("Telepresence Rig stopped");
    Ok(())
}

/// Console logging, or a daily rolling file when `file_dir` is set
///
/// `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.file_dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&logging.file_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

async fn open_sensor(config: &Config) -> Result<Box<dyn OrientationSensor>> {
    if config.sensor.stream_path.is_empty() {
        info!("No orientation stream configured, gimbal stays level");
        return Ok(Box::new(LevelSensor));
    }

    let stream = QuaternionStream::open(
        &config.sensor.stream_path,
        config.sensor_open_timeout(),
        config.sensor_stale_after(),
    )
    .await
    .context("Orientation stream is required")?;
    Ok(Box::new(stream))
}

fn open_gamepad(config: &Config) -> Gamepad {
    let deadzone = config.deadzone();
    let controller = if config.gamepad.device_path.is_empty() {
        DualSenseController::open()
    } else {
        DualSenseController::open_path(&config.gamepad.device_path)
    };

    match controller.and_then(|controller| Gamepad::spawn(controller, deadzone)) {
        Ok(gamepad) => gamepad,
        Err(e) => {
            warn!("Driving disabled, motors stay neutral: {}", e);
            Gamepad::disconnected(deadzone)
        }
    }
}
