//! Hand-tracking service: a [`HandDetector`] behind an explicit load-once
//! lifecycle.
//!
//! ```text
//! Uninitialized ──initialize()──▶ Initializing ──load ok──▶ Ready
//!                                      │
//!                                      └──load err──▶ Failed(reason)
//! ```
//!
//! Loading runs on a background thread so the render loop can keep drawing
//! the busy overlay.  Only the first `initialize()` does anything.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hand_gesture::{classify, ClassifierConfig, HandData};
use thiserror::Error;

use crate::camera::VideoFrame;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisionError {
    #[error("failed to load hand landmark model: {0}")]
    ModelLoad(String),
}

/// The detection backend.
///
/// `load` may be slow (model download / compilation); `detect` runs once per
/// frame on the render thread and must stay cheap.
pub trait HandDetector: Send {
    fn load(&mut self) -> Result<(), VisionError>;

    /// `None` means no hand in this frame.
    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> Option<HandData>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VisionLifecycle {
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

struct VisionInner {
    lifecycle: VisionLifecycle,
    detector:  Option<Box<dyn HandDetector>>,
}

pub struct VisionService {
    inner:  Arc<Mutex<VisionInner>>,
    loader: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl VisionService {
    pub fn new(detector: Box<dyn HandDetector>) -> Self {
        VisionService {
            inner: Arc::new(Mutex::new(VisionInner {
                lifecycle: VisionLifecycle::Uninitialized,
                detector:  Some(detector),
            })),
            loader: Mutex::new(None),
        }
    }

    /// Start loading the detector.  Returns `false` if loading was already
    /// started (or finished) by an earlier call.
    pub fn initialize(&self) -> bool {
        let mut detector = {
            let mut inner = lock(&self.inner);
            if inner.lifecycle != VisionLifecycle::Uninitialized {
                log::debug!("vision engine already {:?}; ignoring initialize", inner.lifecycle);
                return false;
            }
            let Some(detector) = inner.detector.take() else {
                inner.lifecycle = VisionLifecycle::Failed("no detector".into());
                return false;
            };
            inner.lifecycle = VisionLifecycle::Initializing;
            detector
        };

        log::info!("initializing vision engine");
        let inner = Arc::clone(&self.inner);
        let handle = thread::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| detector.load()))
                .unwrap_or_else(|_| Err(VisionError::ModelLoad("loader panicked".into())));
            let mut inner = lock(&inner);
            match result {
                Ok(()) => {
                    log::info!("vision engine ready");
                    inner.lifecycle = VisionLifecycle::Ready;
                    inner.detector = Some(detector);
                }
                Err(e) => {
                    log::error!("{e}");
                    inner.lifecycle = VisionLifecycle::Failed(e.to_string());
                }
            }
        });
        *lock(&self.loader) = Some(handle);
        true
    }

    pub fn lifecycle(&self) -> VisionLifecycle {
        lock(&self.inner).lifecycle.clone()
    }

    /// True while the model is loading.
    pub fn is_busy(&self) -> bool {
        lock(&self.inner).lifecycle == VisionLifecycle::Initializing
    }

    pub fn is_ready(&self) -> bool {
        lock(&self.inner).lifecycle == VisionLifecycle::Ready
    }

    /// Run detection on one frame.  Always `None` until the model is ready.
    pub fn detect(&self, frame: &VideoFrame, timestamp_ms: f64) -> Option<HandData> {
        let mut inner = lock(&self.inner);
        if inner.lifecycle != VisionLifecycle::Ready {
            return None;
        }
        inner.detector.as_mut()?.detect(frame, timestamp_ms)
    }

    /// Block until a started load has finished.
    pub fn wait(&self) {
        let handle = lock(&self.loader).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                lock(&self.inner).lifecycle = VisionLifecycle::Failed("loader panicked".into());
            }
        }
    }

    /// The load failure, if loading failed.
    pub fn failure(&self) -> Option<VisionError> {
        match self.lifecycle() {
            VisionLifecycle::Failed(reason) => Some(VisionError::ModelLoad(reason)),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkDetector
// ════════════════════════════════════════════════════════════════════════════

/// Detector for frames that already carry landmarks.
///
/// Stands in for model inference: the frame's landmarks are what a hand
/// landmarker would have produced, and this runs the gesture classifier on
/// them.  `warmup` simulates model load time.
pub struct LandmarkDetector {
    config: ClassifierConfig,
    warmup: Duration,
    frames: u64,
}

impl LandmarkDetector {
    pub fn new(config: ClassifierConfig, warmup: Duration) -> Self {
        LandmarkDetector { config, warmup, frames: 0 }
    }
}

impl HandDetector for LandmarkDetector {
    fn load(&mut self) -> Result<(), VisionError> {
        thread::sleep(self.warmup);
        Ok(())
    }

    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> Option<HandData> {
        self.frames += 1;
        let hand = frame.landmarks.as_ref().map(|lm| classify(lm, &self.config));
        if self.frames % 120 == 0 {
            log::debug!("frame {} @ {:.0}ms: {:?}", self.frames, timestamp_ms, hand.map(|h| h.gesture()));
        }
        hand
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::{synthesize, GestureState, Position};
    use std::sync::mpsc;

    /// Detector whose load blocks until the test releases it.
    struct GatedDetector {
        gate:   mpsc::Receiver<Result<(), VisionError>>,
    }

    impl HandDetector for GatedDetector {
        fn load(&mut self) -> Result<(), VisionError> {
            self.gate.recv().unwrap_or(Ok(()))
        }
        fn detect(&mut self, _f: &VideoFrame, _t: f64) -> Option<HandData> {
            Some(HandData::default())
        }
    }

    fn gated() -> (VisionService, mpsc::Sender<Result<(), VisionError>>) {
        let (tx, rx) = mpsc::channel();
        (VisionService::new(Box::new(GatedDetector { gate: rx })), tx)
    }

    fn blank_frame() -> VideoFrame {
        VideoFrame { width: 640, height: 480, landmarks: None }
    }

    #[test]
    fn lifecycle_runs_uninitialized_to_ready() {
        let (vision, gate) = gated();
        assert_eq!(vision.lifecycle(), VisionLifecycle::Uninitialized);
        assert!(!vision.is_busy());

        assert!(vision.initialize());
        assert_eq!(vision.lifecycle(), VisionLifecycle::Initializing);
        assert!(vision.is_busy());

        gate.send(Ok(())).unwrap();
        vision.wait();
        assert_eq!(vision.lifecycle(), VisionLifecycle::Ready);
        assert!(!vision.is_busy());
    }

    #[test]
    fn initialize_only_once() {
        let (vision, gate) = gated();
        assert!(vision.initialize());
        assert!(!vision.initialize());
        gate.send(Ok(())).unwrap();
        vision.wait();
        assert!(!vision.initialize());
        assert!(vision.is_ready());
    }

    #[test]
    fn failed_load_is_recorded() {
        let (vision, gate) = gated();
        vision.initialize();
        gate.send(Err(VisionError::ModelLoad("corrupt model".into()))).unwrap();
        vision.wait();
        assert!(matches!(vision.lifecycle(), VisionLifecycle::Failed(_)));
        assert!(!vision.is_busy());
        assert!(vision.failure().is_some());
        assert_eq!(vision.detect(&blank_frame(), 0.0), None);
    }

    struct Exploding;

    impl HandDetector for Exploding {
        fn load(&mut self) -> Result<(), VisionError> {
            panic!("model file truncated")
        }
        fn detect(&mut self, _f: &VideoFrame, _t: f64) -> Option<HandData> {
            Some(HandData::default())
        }
    }

    #[test]
    fn panicking_load_fails_without_wait() {
        let vision = VisionService::new(Box::new(Exploding));
        vision.initialize();
        let start = std::time::Instant::now();
        while vision.is_busy() && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(vision.lifecycle(), VisionLifecycle::Failed("failed to load hand landmark model: loader panicked".into()));
        assert_eq!(vision.detect(&blank_frame(), 0.0), None);
    }

    #[test]
    fn detect_before_ready_is_none() {
        let (vision, gate) = gated();
        assert_eq!(vision.detect(&blank_frame(), 0.0), None);
        vision.initialize();
        assert_eq!(vision.detect(&blank_frame(), 1.0), None);
        gate.send(Ok(())).unwrap();
        vision.wait();
        assert!(vision.detect(&blank_frame(), 2.0).is_some());
    }

    #[test]
    fn landmark_detector_classifies_frame() {
        let vision = VisionService::new(Box::new(LandmarkDetector::new(
            ClassifierConfig::default(),
            Duration::ZERO,
        )));
        vision.initialize();
        vision.wait();

        let fist = VideoFrame {
            width: 640,
            height: 480,
            landmarks: Some(synthesize(GestureState::Fist, Position::new(0.5, 0.5), 0.0, 0.12)),
        };
        let hand = vision.detect(&fist, 16.0).unwrap();
        assert_eq!(hand.gesture(), GestureState::Fist);
        assert_eq!(vision.detect(&blank_frame(), 32.0), None);
    }
}
