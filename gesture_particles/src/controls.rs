//! Controls surface: user intents in, display snapshot out.

use hand_gesture::GestureState;
use particle_shapes::{ColorTheme, ShapeType};

use crate::camera::CameraState;

/// Something the user asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    SelectShape(ShapeType),
    NextShape,
    ToggleCamera,
    SetDebugGesture(GestureState),
    CycleDebugGesture,
    CycleTheme,
    Quit,
}

/// Everything the controls panel displays.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlsView<'a> {
    pub shape:          ShapeType,
    pub theme:          ColorTheme,
    pub camera:         CameraState,
    pub camera_enabled: bool,
    pub debug_gesture:  GestureState,
    pub hand_status:    &'a str,
    pub loading:        bool,
    pub morph_progress: f32,
    pub zoom:           f32,
}

/// Key legend shown at the bottom of the panel.
pub const KEY_LEGEND: [&str; 4] = [
    "1-4/TAB=SHAPE  C=CAMERA  T=THEME",
    "G=DEBUG GESTURE  Q=QUIT",
    "HOLD F=FIST  O=OPEN  P=PINCH",
    "MOUSE=MOVE HAND  H=HIDE HAND",
];
