//! # Controller Input Mapper Module
//!
//! Parses raw evdev events from the gamepad into a [`ControllerState`] and
//! normalizes stick positions into signed [`GamepadAxes`].
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | Range | Rig use |
//! |------|------------|-------|---------|
//! | Left Stick X | ABS_X | 0-255 | - |
//! | Left Stick Y | ABS_Y | 0-255 | Forward (arcade), left motor (tank) |
//! | Right Stick X | ABS_Z | 0-255 | Turn (arcade) |
//! | Right Stick Y | ABS_RZ | 0-255 | Right motor (tank) |

use evdev::{AbsoluteAxisType, InputEvent};

use super::calibration::DeadZone;

/// Raw axis value range from DualSense controller.
pub const AXIS_MIN: i32 = 0;
/// Raw axis value range from DualSense controller.
pub const AXIS_MAX: i32 = 255;
/// Raw axis center value.
pub const AXIS_CENTER: i32 = 128;

/// Largest magnitude of a normalized stick reading.
pub const AXIS_NORMALIZED_MAX: i32 = 32767;

/// Raw stick positions (0-255, 128 = center).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    /// Left stick X. 0 = full left, 255 = full right.
    pub left_stick_x: i32,
    /// Left stick Y. 0 = full up, 255 = full down.
    pub left_stick_y: i32,
    /// Right stick X. 0 = full left, 255 = full right.
    pub right_stick_x: i32,
    /// Right stick Y. 0 = full up, 255 = full down.
    pub right_stick_y: i32,
}

impl Default for ControllerState {
    /// All sticks centered.
    fn default() -> Self {
        Self {
            left_stick_x: AXIS_CENTER,
            left_stick_y: AXIS_CENTER,
            right_stick_x: AXIS_CENTER,
            right_stick_y: AXIS_CENTER,
        }
    }
}

impl ControllerState {
    /// Normalize the sticks and apply the dead-zone
    ///
    /// Y axes are inverted so that pushing a stick up reads positive.
    ///
    /// # Examples
    ///
    /// ```
    /// use telepresence_rig::controller::calibration::DeadZone;
    /// use telepresence_rig::controller::mapper::ControllerState;
    ///
    /// let mut state = ControllerState::default();
    /// state.left_stick_y = 0; // full up
    /// let axes = state.axes(&DeadZone::default());
    /// assert_eq!(axes.left_y, 32767);
    /// assert_eq!(axes.right_x, 0);
    /// ```
    #[must_use]
    pub fn axes(&self, deadzone: &DeadZone) -> GamepadAxes {
        GamepadAxes {
            left_x: deadzone.apply(normalize(self.left_stick_x)),
            left_y: deadzone.apply(-normalize(self.left_stick_y)),
            right_x: deadzone.apply(normalize(self.right_stick_x)),
            right_y: deadzone.apply(-normalize(self.right_stick_y)),
        }
    }
}

/// Signed stick readings in [-32767, 32767], dead-zone applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GamepadAxes {
    pub left_x: i16,
    pub left_y: i16,
    pub right_x: i16,
    pub right_y: i16,
}

/// Rescale a raw 0-255 reading to ±32767
fn normalize(raw: i32) -> i32 {
    let centered = raw.clamp(AXIS_MIN, AXIS_MAX) - AXIS_CENTER;
    (centered * AXIS_NORMALIZED_MAX / (AXIS_MAX - AXIS_CENTER))
        .clamp(-AXIS_NORMALIZED_MAX, AXIS_NORMALIZED_MAX)
}

/// Accumulates evdev events into the current stick state.
///
/// Not thread-safe; owned by the gamepad reader thread.
#[derive(Debug, Default)]
pub struct EventMapper {
    state: ControllerState,
}

impl EventMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state after all events processed so far
    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Process one evdev event; anything but a stick axis is ignored
    pub fn process_event(&mut self, event: &InputEvent) {
        if let evdev::InputEventKind::AbsAxis(axis) = event.kind() {
            self.process_axis_event(axis, event.value());
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        match axis {
            AbsoluteAxisType::ABS_X => self.state.left_stick_x = value,
            AbsoluteAxisType::ABS_Y => self.state.left_stick_y = value,

            // DualSense reports the right stick on ABS_Z / ABS_RZ
            AbsoluteAxisType::ABS_Z => self.state.right_stick_x = value,
            AbsoluteAxisType::ABS_RZ => self.state.right_stick_y = value,

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::EventType;

    fn abs_event(axis: AbsoluteAxisType, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE, axis.0, value)
    }

    #[test]
    fn test_default_state_is_centered() {
        let state = ControllerState::default();
        assert_eq!(state.left_stick_x, AXIS_CENTER);
        assert_eq!(state.right_stick_y, AXIS_CENTER);
        assert_eq!(state.axes(&DeadZone::default()), GamepadAxes::default());
    }

    #[test]
    fn test_normalize_extremes() {
        assert_eq!(normalize(AXIS_CENTER), 0);
        assert_eq!(normalize(AXIS_MAX), 32767);
        assert_eq!(normalize(AXIS_MIN), -32767);
        assert_eq!(normalize(1000), 32767);
    }

    #[test]
    fn test_y_axes_are_inverted() {
        let state = ControllerState {
            left_stick_y: AXIS_MAX,
            right_stick_y: AXIS_MIN,
            ..ControllerState::default()
        };
        let axes = state.axes(&DeadZone::default());
        assert_eq!(axes.left_y, -32767);
        assert_eq!(axes.right_y, 32767);
    }

    #[test]
    fn test_small_offsets_collapse_to_zero() {
        let state = ControllerState {
            left_stick_x: AXIS_CENTER + 1,
            ..ControllerState::default()
        };
        // One raw step is ~258, inside a 2% dead-zone (~655)
        assert_eq!(state.axes(&DeadZone::default()).left_x, 0);
        assert_ne!(state.axes(&DeadZone::new(0.0)).left_x, 0);
    }

    #[test]
    fn test_process_axis_events() {
        let mut mapper = EventMapper::new();
        mapper.process_event(&abs_event(AbsoluteAxisType::ABS_X, 10));
        mapper.process_event(&abs_event(AbsoluteAxisType::ABS_Y, 20));
        mapper.process_event(&abs_event(AbsoluteAxisType::ABS_Z, 30));
        mapper.process_event(&abs_event(AbsoluteAxisType::ABS_RZ, 40));

        let state = mapper.state();
        assert_eq!(state.left_stick_x, 10);
        assert_eq!(state.left_stick_y, 20);
        assert_eq!(state.right_stick_x, 30);
        assert_eq!(state.right_stick_y, 40);
    }

    #[test]
    fn test_ignores_triggers_and_keys() {
        let mut mapper = EventMapper::new();
        mapper.process_event(&abs_event(AbsoluteAxisType::ABS_RX, 255));
        mapper.process_event(&InputEvent::new(EventType::KEY, evdev::Key::BTN_SOUTH.code(), 1));
        assert_eq!(*mapper.state(), ControllerState::default());
    }
}
