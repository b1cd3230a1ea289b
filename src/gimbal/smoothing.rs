//! # Viewport-Exit Smoothing
//!
//! When the user looks close to straight up or down, yaw becomes numerically
//! unstable. Once pitch leaves the ±50° band the last stable yaw and roll are
//! latched, and the output is blended toward them as pitch approaches the
//! pole. Returning inside the band releases the latches immediately.
//!
//! | Zone | Pitch | Yaw blend | Roll blend |
//! |------|-------|-----------|------------|
//! | Normal | \|p\| ≤ 50° | 1 | 1 |
//! | Exiting high | p > 50° | `clip(1 - (p - 60)/10)` | `clip(1 - (p - 50)/10)` |
//! | Exiting low | p < -50° | `clip(1 - (p + 60)/-10)` | `clip(1 - (p + 50)/-10)` |

use super::correction::GimbalAngles;

/// Pitch beyond which the viewport is considered exited (degrees)
pub const VIEWPORT_EXIT_PITCH: f32 = 50.0;

/// Pitch at which yaw starts blending toward its latch (degrees)
pub const YAW_BLEND_START_PITCH: f32 = 60.0;

/// Pitch span over which a blend goes from live to fully latched (degrees)
pub const BLEND_SPAN: f32 = 10.0;

/// A held value, or nothing held.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Latch {
    #[default]
    Unset,
    Latched(f32),
}

impl Latch {
    /// Latch `value` unless something is already held, and return the held value.
    pub fn latch_once(&mut self, value: f32) -> f32 {
        match *self {
            Latch::Latched(held) => held,
            Latch::Unset => {
                *self = Latch::Latched(value);
                value
            }
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Latch::Latched(_))
    }

    pub fn value(&self) -> Option<f32> {
        match *self {
            Latch::Latched(held) => Some(held),
            Latch::Unset => None,
        }
    }
}

/// Which side of the stable pitch band the head is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportZone {
    Normal,
    ExitingHigh,
    ExitingLow,
}

impl ViewportZone {
    pub fn from_pitch(pitch: f32) -> Self {
        if pitch > VIEWPORT_EXIT_PITCH {
            ViewportZone::ExitingHigh
        } else if pitch < -VIEWPORT_EXIT_PITCH {
            ViewportZone::ExitingLow
        } else {
            ViewportZone::Normal
        }
    }
}

/// Live/latched weights for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendFactors {
    pub yaw: f32,
    pub roll: f32,
}

impl BlendFactors {
    /// Weights of the live reading for a given pitch (degrees)
    pub fn for_pitch(pitch: f32) -> Self {
        match ViewportZone::from_pitch(pitch) {
            ViewportZone::Normal => Self { yaw: 1.0, roll: 1.0 },
            ViewportZone::ExitingHigh => Self {
                yaw: blend(pitch, YAW_BLEND_START_PITCH, BLEND_SPAN),
                roll: blend(pitch, VIEWPORT_EXIT_PITCH, BLEND_SPAN),
            },
            ViewportZone::ExitingLow => Self {
                yaw: blend(pitch, -YAW_BLEND_START_PITCH, -BLEND_SPAN),
                roll: blend(pitch, -VIEWPORT_EXIT_PITCH, -BLEND_SPAN),
            },
        }
    }
}

#[inline]
fn blend(pitch: f32, start: f32, span: f32) -> f32 {
    (1.0 - (pitch - start) / span).clamp(0.0, 1.0)
}

/// Latched yaw and roll carried between control cycles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmoothingState {
    pub last_yaw: Latch,
    pub last_roll: Latch,
}

impl SmoothingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release both latches
    pub fn clear(&mut self) {
        self.last_yaw = Latch::Unset;
        self.last_roll = Latch::Unset;
    }

    /// Apply viewport-exit smoothing to one cycle's angles
    ///
    /// Pitch passes through untouched; yaw and roll are blended toward their
    /// latched values while pitch is outside the stable band.
    ///
    /// # Examples
    ///
    /// ```
    /// use telepresence_rig::gimbal::correction::GimbalAngles;
    /// use telepresence_rig::gimbal::smoothing::SmoothingState;
    ///
    /// let mut state = SmoothingState::new();
    /// state.apply(GimbalAngles::new(30.0, 45.0, 5.0));   // inside the band
    /// state.apply(GimbalAngles::new(30.0, 55.0, 5.0));   // latches yaw = 30
    /// let out = state.apply(GimbalAngles::new(90.0, 70.0, 5.0));
    /// assert_eq!(out.yaw, 30.0);
    /// ```
    pub fn apply(&mut self, angles: GimbalAngles) -> GimbalAngles {
        if ViewportZone::from_pitch(angles.pitch) == ViewportZone::Normal {
            self.clear();
            return angles;
        }

        let last_yaw = self.last_yaw.latch_once(angles.yaw);
        let last_roll = self.last_roll.latch_once(angles.roll);
        let factors = BlendFactors::for_pitch(angles.pitch);

        GimbalAngles {
            yaw: factors.yaw * angles.yaw + (1.0 - factors.yaw) * last_yaw,
            pitch: angles.pitch,
            roll: factors.roll * angles.roll + (1.0 - factors.roll) * last_roll,
        }
    }
}
