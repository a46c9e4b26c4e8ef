use thiserror::Error;

use crate::camera::CameraError;
use crate::vision::VisionError;

/// Top-level error returned by [`crate::app::run`] and
/// [`crate::app::run_headless`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to open preview window: {0}")]
    Window(String),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Vision(#[from] VisionError),
}

impl From<minifb::Error> for AppError {
    fn from(e: minifb::Error) -> Self {
        AppError::Window(e.to_string())
    }
}
