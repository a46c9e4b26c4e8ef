//! Per-frame detection loop.
//!
//! Not a timer of its own: the render loop calls [`FrameLoop::tick`] once per
//! displayed frame, and the loop stays scheduled until someone flips its
//! active flag off.  No iteration cap, no give-up on repeated misses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use hand_gesture::HandData;

use crate::camera::{ReadyState, VideoElement};
use crate::vision::VisionService;

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    /// Loop not running.
    Idle,
    /// Running, but the video has not buffered enough to detect on.
    NotReady,
    /// Detection ran; `None` = no hand in frame.
    Detected(Option<HandData>),
}

#[derive(Debug, Default)]
pub struct FrameLoop {
    active: AtomicBool,
    ticks:  u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        if !self.active.swap(true, Ordering::AcqRel) {
            log::debug!("frame loop started");
        }
    }

    /// Cancel the loop.  No-op if it is not running.
    pub fn cancel(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            log::debug!("frame loop cancelled after {} ticks", self.ticks);
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn ticks(&self) -> u64 { self.ticks }

    pub fn tick(&mut self, video: &VideoElement, vision: &VisionService, timestamp_ms: f64) -> FrameOutcome {
        if !self.is_running() {
            return FrameOutcome::Idle;
        }
        self.ticks += 1;

        if video.ready_state() < ReadyState::HaveEnoughData {
            return FrameOutcome::NotReady;
        }
        match video.current_frame() {
            Some(frame) => FrameOutcome::Detected(vision.detect(frame, timestamp_ms)),
            None => FrameOutcome::NotReady,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameClock: render-rate pacing when no window does it for us
// ════════════════════════════════════════════════════════════════════════════

pub struct FrameClock {
    start:    Instant,
    last:     Instant,
    interval: Duration,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        let now = Instant::now();
        FrameClock {
            start: now,
            last: now,
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
        }
    }

    /// Milliseconds since the clock was created.
    pub fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Seconds since the previous call; resets the reference point.
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }

    /// Sleep out the rest of the current frame slot.
    pub fn wait_next(&self) {
        let spent = self.last.elapsed();
        if spent < self.interval {
            thread::sleep(self.interval - spent);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
