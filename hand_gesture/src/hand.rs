//! Per-frame hand result and the status line derived from it.

use std::fmt;

// ════════════════════════════════════════════════════════════════════════════
// GestureState
// ════════════════════════════════════════════════════════════════════════════

/// A discrete gesture, either detected live or picked manually for debugging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GestureState {
    #[default]
    None,
    OpenHand,
    Fist,
    Pinch,
}

impl GestureState {
    pub const ALL: [GestureState; 4] = [
        GestureState::None,
        GestureState::OpenHand,
        GestureState::Fist,
        GestureState::Pinch,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GestureState::None     => "None",
            GestureState::OpenHand => "Open Hand (Scatter)",
            GestureState::Fist     => "Fist (Gather)",
            GestureState::Pinch    => "Pinch (Zoom)",
        }
    }

    /// Next gesture in the manual-override cycle.
    pub fn next(self) -> GestureState {
        let i = Self::ALL.iter().position(|&g| g == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for GestureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandData
// ════════════════════════════════════════════════════════════════════════════

/// Normalized 2D position, `(0, 0)` top-left, `(1, 1)` bottom-right.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Position { x, y }
    }
}

/// One detection result.  Recomputed every frame; never carried over.
///
/// The three flags are meant to be exclusive but come from independent
/// thresholds, so noise can set more than one.  Consumers should go through
/// [`HandData::gesture`] rather than testing flags themselves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandData {
    pub is_open:     bool,
    pub is_fist:     bool,
    pub is_pinching: bool,
    pub position:    Position,
    /// Palm rotation from upright in radians, positive = clockwise on screen.
    pub tilt:        f32,
}

impl HandData {
    /// Resolve the flags: fist > pinch > open > none.
    pub fn gesture(&self) -> GestureState {
        if self.is_fist {
            GestureState::Fist
        } else if self.is_pinching {
            GestureState::Pinch
        } else if self.is_open {
            GestureState::OpenHand
        } else {
            GestureState::None
        }
    }
}

/// Status line for the controls panel; empty when no hand is tracked.
pub fn status_text(hand: Option<&HandData>) -> &'static str {
    match hand.map(HandData::gesture) {
        None                         => "",
        Some(GestureState::Fist)     => "FIST DETECTED: FORMING TREE",
        Some(GestureState::Pinch)    => "PINCH DETECTED: ZOOMING",
        Some(GestureState::OpenHand) => "OPEN HAND: SCATTERING",
        Some(GestureState::None)     => "HAND DETECTED",
    }
}
