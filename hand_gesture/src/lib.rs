//! # hand_gesture
//!
//! The hand model shared by the detector and the visualization:
//!
//! * [`HandLandmarks`]: the 21 keypoints of one tracked hand, in the
//!   MediaPipe hand topology (normalized image coordinates, y down).
//! * [`classify`]: landmark geometry → [`HandData`] (gesture flags, palm
//!   position, tilt).
//! * [`HandData::gesture`]: resolves possibly-overlapping flags into a single
//!   [`GestureState`], and [`status_text`] turns the latest detection into
//!   the line shown in the controls panel.
//! * [`synthesize`]: the inverse of `classify`: builds plausible landmarks
//!   for a gesture, used by the simulated camera.
//!
//! ## Gesture → action mapping
//!
//! | Gesture | Flag | Visual action |
//! |---|---|---|
//! | Fist | `is_fist` | gather particles into the selected shape |
//! | Pinch | `is_pinching` | zoom in |
//! | Open hand | `is_open` | scatter particles |
//!
//! When several flags fire at once, fist wins over pinch, pinch over open.

mod classify;
mod hand;
mod landmarks;
mod pose;

pub use classify::{classify, ClassifierConfig};
pub use hand::{status_text, GestureState, HandData, Position};
pub use landmarks::{indices, HandLandmarks, Landmark, FINGERS, LANDMARK_COUNT};
pub use pose::synthesize;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LandmarkError {
    #[error("invalid landmark data length: {got} (expected {expected})")]
    BadLength { got: usize, expected: usize },
}
