//! Simulated camera: always available, no hardware required.
//!
//! Frames carry landmarks synthesized from a shared [`SimHandPose`].  The
//! preview window writes the pose from mouse and keyboard (see
//! [`crate::visualizer`]); headless runs script it instead.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use hand_gesture::{synthesize, GestureState, Position};

use crate::camera::{
    CameraDevice, CameraError, FrameSource, MediaStream, MediaTrack, ReadyState, VideoConstraints,
    VideoFrame,
};

/// Where the simulated hand is and what it is doing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimHandPose {
    pub gesture: GestureState,
    /// Palm center in mirrored display space, 0–1.
    pub center:  Position,
    pub tilt:    f32,
    /// Palm length in normalized image units.
    pub size:    f32,
    pub visible: bool,
}

impl Default for SimHandPose {
    fn default() -> Self {
        SimHandPose {
            gesture: GestureState::None,
            center:  Position::new(0.5, 0.55),
            tilt:    0.0,
            size:    0.12,
            visible: true,
        }
    }
}

pub type SharedPose = Arc<Mutex<SimHandPose>>;

pub fn shared_pose(pose: SimHandPose) -> SharedPose {
    Arc::new(Mutex::new(pose))
}

fn read_pose(pose: &SharedPose) -> SimHandPose {
    *pose.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Apply `f` to the shared pose.
pub fn edit_pose(pose: &SharedPose, f: impl FnOnce(&mut SimHandPose)) {
    f(&mut pose.lock().unwrap_or_else(PoisonError::into_inner));
}

// ════════════════════════════════════════════════════════════════════════════
// SimCamera
// ════════════════════════════════════════════════════════════════════════════

pub struct SimCamera {
    pose:          SharedPose,
    deny:          bool,
    grant_delay:   Duration,
    warmup_frames: u32,
    issued:        Mutex<Vec<Arc<MediaTrack>>>,
}

impl SimCamera {
    pub fn new(pose: SharedPose) -> Self {
        SimCamera {
            pose,
            deny: false,
            grant_delay: Duration::from_millis(150),
            warmup_frames: 3,
            issued: Mutex::new(Vec::new()),
        }
    }

    /// Every `open` fails as if the user refused the permission prompt.
    pub fn denying(mut self, deny: bool) -> Self {
        self.deny = deny;
        self
    }

    /// How long the "permission prompt" takes to answer.
    pub fn grant_delay(mut self, delay: Duration) -> Self {
        self.grant_delay = delay;
        self
    }

    /// Frames reported as `HaveMetadata` before data is available.
    pub fn warmup_frames(mut self, frames: u32) -> Self {
        self.warmup_frames = frames;
        self
    }

    /// Tracks handed out so far that have not been stopped.
    pub fn live_tracks(&self) -> usize {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|t| t.is_live())
            .count()
    }

    pub fn issued_tracks(&self) -> usize {
        self.issued.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl CameraDevice for SimCamera {
    fn open(&self, constraints: VideoConstraints) -> Result<MediaStream, CameraError> {
        thread::sleep(self.grant_delay);
        if self.deny {
            return Err(CameraError::PermissionDenied);
        }

        let track = MediaTrack::new("Simulated camera");
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&track));

        let source = SimFrameSource {
            pose:   Arc::clone(&self.pose),
            size:   constraints,
            reads:  0,
            warmup: self.warmup_frames,
        };
        Ok(MediaStream::new(vec![track], Box::new(source)))
    }
}

struct SimFrameSource {
    pose:   SharedPose,
    size:   VideoConstraints,
    reads:  u32,
    warmup: u32,
}

impl FrameSource for SimFrameSource {
    fn read(&mut self) -> (ReadyState, Option<VideoFrame>) {
        self.reads = self.reads.saturating_add(1);
        if self.reads <= self.warmup {
            return (ReadyState::HaveMetadata, None);
        }
        let pose = read_pose(&self.pose);
        let landmarks = pose
            .visible
            .then(|| synthesize(pose.gesture, pose.center, pose.tilt, pose.size));
        let frame = VideoFrame {
            width:  self.size.width,
            height: self.size.height,
            landmarks,
        };
        (ReadyState::HaveEnoughData, Some(frame))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scripted pose for headless runs
// ════════════════════════════════════════════════════════════════════════════

/// Cycle relaxed → fist → pinch → open, `frames_per_step` frames each, while
/// the hand drifts along a slow figure eight.
pub fn scripted_pose(frame: u64, frames_per_step: u64) -> SimHandPose {
    const SCRIPT: [GestureState; 4] = [
        GestureState::None,
        GestureState::Fist,
        GestureState::Pinch,
        GestureState::OpenHand,
    ];
    let step = (frame / frames_per_step.max(1)) as usize % SCRIPT.len();
    let t = frame as f32 / 90.0;
    SimHandPose {
        gesture: SCRIPT[step],
        center:  Position::new(0.5 + 0.2 * t.sin(), 0.55 + 0.1 * (2.0 * t).sin()),
        tilt:    0.3 * (0.5 * t).sin(),
        ..SimHandPose::default()
    }
}
