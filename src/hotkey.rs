//! # Hotkey Module
//!
//! Console keys for operating the rig while it runs.
//!
//! | Key | Command |
//! |-----|---------|
//! | `R`, `?`, `Esc` | Reset orientation |
//! | `C` | Toggle tank/arcade drive |
//! | `Space`, `.` | Pause / resume |
//! | `I` | Pause / resume drive motors |
//! | `Q` | Freeze / release gimbal |
//! | `X`, `Ctrl+C` | Exit |
//!
//! The terminal is put in raw mode so keys arrive without Enter. Raw mode also
//! swallows the Ctrl+C signal, so the key itself is mapped to `Exit`.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::control::state::ControlEvent;
use crate::error::{Result, RigError};

/// How long the reader waits for a key before checking for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Translate a key into an operator command
pub fn key_to_event(key: &KeyEvent) -> Option<ControlEvent> {
    // crossterm also reports key release and repeat events on some platforms
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(ControlEvent::Exit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => Some(ControlEvent::ResetOrientation),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'r' | '?' => Some(ControlEvent::ResetOrientation),
            'c' => Some(ControlEvent::ToggleDriveMode),
            ' ' | '.' => Some(ControlEvent::TogglePause),
            'i' => Some(ControlEvent::ToggleMotorPause),
            'q' => Some(ControlEvent::ToggleServoPause),
            'x' => Some(ControlEvent::Exit),
            _ => None,
        },
        _ => None,
    }
}

/// Background reader posting hotkey commands to the control loop.
///
/// Dropping the listener stops the reader and restores the terminal.
#[derive(Debug)]
pub struct KeyboardListener {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyboardListener {
    /// Enable raw mode and start reading keys
    ///
    /// # Errors
    ///
    /// Returns `Io` error if the terminal cannot enter raw mode or the reader
    /// thread cannot be spawned.
    pub fn spawn(events: mpsc::Sender<ControlEvent>) -> Result<Self> {
        enable_raw_mode()?;

        let stop = Arc::new(AtomicBool::new(false));
        let reader_stop = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("hotkey-reader".to_string())
            .spawn(move || read_keys(&events, &reader_stop))
            .map_err(|e| {
                let _ = disable_raw_mode();
                RigError::Io(e)
            })?;

        info!("Hotkeys active: R reset, C drive mode, Space pause, I motors, Q gimbal, X exit");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for KeyboardListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}

fn read_keys(events: &mpsc::Sender<ControlEvent>, stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!("Keyboard poll failed: {}", e);
                break;
            }
        }

        let key = match event::read() {
            Ok(Event::Key(key)) => key,
            Ok(_) => continue,
            Err(e) => {
                warn!("Keyboard read failed: {}", e);
                break;
            }
        };

        if let Some(command) = key_to_event(&key) {
            debug!("Hotkey {:?} -> {}", key.code, command);
            if events.blocking_send(command).is_err() {
                break;
            }
        }
    }
}
