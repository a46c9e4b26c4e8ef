//! Camera lifecycle: device access, media streams, the hidden video element
//! and the `Inactive → Starting → Active → StoppingCleanup` state machine.
//!
//! Opening a device may block on a permission prompt, so [`CameraController`]
//! runs the request on its own thread and collects the result over a channel
//! on the next [`CameraController::poll`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hand_gesture::HandLandmarks;
use thiserror::Error;

/// Requested capture resolution.
pub const CAMERA_WIDTH:  u32 = 640;
pub const CAMERA_HEIGHT: u32 = 480;

/// Message shown when the camera cannot be opened.
pub const CAMERA_ALERT: &str = "Could not access camera. Please allow permissions.";

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device found")]
    NoDevice,

    #[error("camera device error: {0}")]
    Device(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Frames and streams
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width:  u32,
    pub height: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        VideoConstraints { width: CAMERA_WIDTH, height: CAMERA_HEIGHT }
    }
}

/// One captured frame.
///
/// Real pixels never reach this crate: the detector seam only needs what the
/// landmark model produced, so a frame carries its size and the landmarks
/// of the hand in view, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    pub width:     u32,
    pub height:    u32,
    pub landmarks: Option<HandLandmarks>,
}

/// Buffering level of a video element, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

/// Producer of frames behind a [`MediaStream`].
pub trait FrameSource: Send {
    /// Newest frame (if any) and the buffering level it was read at.
    fn read(&mut self) -> (ReadyState, Option<VideoFrame>);
}

/// One track of a stream.  Stopping is idempotent.
#[derive(Debug)]
pub struct MediaTrack {
    label: String,
    live:  AtomicBool,
}

impl MediaTrack {
    pub fn new(label: &str) -> Arc<Self> {
        Arc::new(MediaTrack { label: label.to_string(), live: AtomicBool::new(true) })
    }

    pub fn is_live(&self) -> bool { self.live.load(Ordering::Acquire) }

    pub fn stop(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            log::debug!("stopped track {:?}", self.label);
        }
    }
}

/// A granted camera stream.
pub struct MediaStream {
    tracks: Vec<Arc<MediaTrack>>,
    source: Box<dyn FrameSource>,
}

impl MediaStream {
    pub fn new(tracks: Vec<Arc<MediaTrack>>, source: Box<dyn FrameSource>) -> Self {
        MediaStream { tracks, source }
    }

    pub fn tracks(&self) -> &[Arc<MediaTrack>] { &self.tracks }

    pub fn live_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_live()).count()
    }

    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    /// Nothing flows once every track is stopped.
    pub fn read(&mut self) -> (ReadyState, Option<VideoFrame>) {
        if self.live_track_count() == 0 {
            return (ReadyState::HaveNothing, None);
        }
        self.source.read()
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream").field("tracks", &self.tracks).finish()
    }
}

/// Anything that can grant a camera stream (may block on a permission prompt).
pub trait CameraDevice: Send + Sync {
    fn open(&self, constraints: VideoConstraints) -> Result<MediaStream, CameraError>;
}

// ════════════════════════════════════════════════════════════════════════════
// VideoElement: the hidden element frames are pulled from
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct VideoElement {
    stream:      Option<MediaStream>,
    ready_state: ReadyState,
    frame:       Option<VideoFrame>,
    /// One-shot "loaded data" listener.
    loaded_data_armed: bool,
}

impl VideoElement {
    pub fn attach(&mut self, stream: MediaStream) {
        self.stream = Some(stream);
        self.ready_state = ReadyState::HaveNothing;
        self.frame = None;
    }

    pub fn detach(&mut self) -> Option<MediaStream> {
        self.ready_state = ReadyState::HaveNothing;
        self.frame = None;
        self.loaded_data_armed = false;
        self.stream.take()
    }

    pub fn has_stream(&self) -> bool { self.stream.is_some() }

    pub fn ready_state(&self) -> ReadyState { self.ready_state }

    pub fn current_frame(&self) -> Option<&VideoFrame> { self.frame.as_ref() }

    /// Register a listener that fires once, the first time frame data loads.
    pub fn arm_loaded_data(&mut self) {
        self.loaded_data_armed = true;
    }

    /// Pull the newest frame from the stream.
    ///
    /// Returns `true` exactly when the armed "loaded data" listener fires.
    pub fn pump(&mut self) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        let (state, frame) = stream.read();
        self.ready_state = state;
        if frame.is_some() {
            self.frame = frame;
        }
        if self.loaded_data_armed && state >= ReadyState::HaveCurrentData {
            self.loaded_data_armed = false;
            return true;
        }
        false
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CameraController: the lifecycle state machine
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraState {
    Inactive,
    Starting,
    Active,
    StoppingCleanup,
}

impl CameraState {
    pub fn label(self) -> &'static str {
        match self {
            CameraState::Inactive        => "OFF",
            CameraState::Starting        => "STARTING",
            CameraState::Active          => "ON",
            CameraState::StoppingCleanup => "STOPPING",
        }
    }
}

/// Outcome of a stream request, reported by [`CameraController::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    Started,
    Failed(CameraError),
}

type Grant = (u64, Result<MediaStream, CameraError>);

pub struct CameraController {
    device:      Arc<dyn CameraDevice>,
    constraints: VideoConstraints,
    state:       CameraState,
    /// Bumped on every start and on stop-while-starting; a grant tagged with
    /// an older generation belongs to a request the user already abandoned.
    /// Shared with the request thread so a late grant is stopped even if
    /// nobody polls again.
    generation:  Arc<AtomicU64>,
    grant_tx:    Sender<Grant>,
    grant_rx:    Receiver<Grant>,
    video:       VideoElement,
}

impl CameraController {
    pub fn new(device: Arc<dyn CameraDevice>, constraints: VideoConstraints) -> Self {
        let (grant_tx, grant_rx) = mpsc::channel();
        CameraController {
            device,
            constraints,
            state: CameraState::Inactive,
            generation: Arc::new(AtomicU64::new(0)),
            grant_tx,
            grant_rx,
            video: VideoElement::default(),
        }
    }

    pub fn state(&self) -> CameraState { self.state }

    /// The user-facing camera toggle: on while starting or active.
    pub fn is_enabled(&self) -> bool {
        matches!(self.state, CameraState::Starting | CameraState::Active)
    }

    pub fn video(&self) -> &VideoElement { &self.video }

    pub fn video_mut(&mut self) -> &mut VideoElement { &mut self.video }

    /// `Inactive → Starting`: request a stream in the background.
    pub fn start(&mut self) {
        if self.state != CameraState::Inactive {
            return;
        }
        self.state = CameraState::Starting;

        let generation  = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current     = Arc::clone(&self.generation);
        let device      = Arc::clone(&self.device);
        let constraints = self.constraints;
        let tx          = self.grant_tx.clone();

        log::info!(
            "requesting camera stream {}x{} (request #{})",
            constraints.width, constraints.height, generation
        );
        thread::spawn(move || {
            let result = device.open(constraints);
            let tracks = result.as_ref().map(|s| s.tracks().to_vec()).unwrap_or_default();
            let _ = tx.send((generation, result));
            if current.load(Ordering::SeqCst) != generation && !tracks.is_empty() {
                log::debug!("request #{generation} abandoned before its grant arrived");
                tracks.iter().for_each(|t| t.stop());
            }
        });
    }

    /// Release everything: stop tracks, detach the stream, forget any
    /// in-flight request.  Safe to call in any state.
    pub fn stop(&mut self) {
        match self.state {
            CameraState::Starting => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                log::info!("camera toggled off while the request was pending");
            }
            CameraState::Active => {
                self.state = CameraState::StoppingCleanup;
                log::info!("stopping camera");
            }
            CameraState::Inactive | CameraState::StoppingCleanup => {}
        }
        if let Some(stream) = self.video.detach() {
            stream.stop_all();
        }
        self.state = CameraState::Inactive;
        // Anything already queued is stale now.
        self.poll();
    }

    /// Collect a finished stream request, if one arrived.
    pub fn poll(&mut self) -> Option<CameraEvent> {
        loop {
            match self.grant_rx.try_recv() {
                Ok((generation, result)) => {
                    if let Some(event) = self.accept(generation, result) {
                        return Some(event);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Like [`poll`](Self::poll) but waits up to `timeout` for a result.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Option<CameraEvent> {
        match self.grant_rx.recv_timeout(timeout) {
            Ok((generation, result)) => self.accept(generation, result).or_else(|| self.poll()),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn accept(&mut self, generation: u64, result: Result<MediaStream, CameraError>) -> Option<CameraEvent> {
        if generation != self.generation.load(Ordering::SeqCst) || self.state != CameraState::Starting {
            match result {
                Ok(stream) => {
                    log::warn!("camera granted after toggle-off (request #{generation}); stopping it");
                    stream.stop_all();
                }
                Err(e) => log::debug!("ignoring stale camera failure (request #{generation}): {e}"),
            }
            return None;
        }

        match result {
            Ok(stream) => {
                self.video.attach(stream);
                self.video.arm_loaded_data();
                self.state = CameraState::Active;
                log::info!("camera stream attached");
                Some(CameraEvent::Started)
            }
            Err(e) => {
                log::error!("Error accessing camera: {e}");
                self.state = CameraState::Inactive;
                Some(CameraEvent::Failed(e))
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Source that reports `HaveMetadata` for `warmup` reads, then frames.
    struct CountingSource {
        reads:  u32,
        warmup: u32,
    }

    impl FrameSource for CountingSource {
        fn read(&mut self) -> (ReadyState, Option<VideoFrame>) {
            self.reads += 1;
            if self.reads <= self.warmup {
                return (ReadyState::HaveMetadata, None);
            }
            (ReadyState::HaveEnoughData, Some(VideoFrame { width: 640, height: 480, landmarks: None }))
        }
    }

    struct FakeDevice {
        result: Result<(), CameraError>,
        issued: Mutex<Vec<Arc<MediaTrack>>>,
    }

    impl FakeDevice {
        fn ok() -> Arc<Self> {
            Arc::new(FakeDevice { result: Ok(()), issued: Mutex::new(Vec::new()) })
        }
        fn failing(e: CameraError) -> Arc<Self> {
            Arc::new(FakeDevice { result: Err(e), issued: Mutex::new(Vec::new()) })
        }
        fn live(&self) -> usize {
            self.issued.lock().unwrap().iter().filter(|t| t.is_live()).count()
        }
    }

    impl CameraDevice for FakeDevice {
        fn open(&self, _c: VideoConstraints) -> Result<MediaStream, CameraError> {
            self.result.clone()?;
            let track = MediaTrack::new("fake");
            self.issued.lock().unwrap().push(Arc::clone(&track));
            Ok(MediaStream::new(vec![track], Box::new(CountingSource { reads: 0, warmup: 1 })))
        }
    }

    fn stream(warmup: u32) -> MediaStream {
        MediaStream::new(vec![MediaTrack::new("t")], Box::new(CountingSource { reads: 0, warmup }))
    }

    #[test]
    fn default_constraints_are_vga() {
        let c = VideoConstraints::default();
        assert_eq!((c.width, c.height), (640, 480));
    }

    #[test]
    fn track_stop_is_idempotent() {
        let t = MediaTrack::new("t");
        t.stop();
        t.stop();
        assert!(!t.is_live());
    }

    #[test]
    fn stopped_stream_yields_nothing() {
        let mut s = stream(0);
        s.stop_all();
        assert_eq!(s.read(), (ReadyState::HaveNothing, None));
    }

    #[test]
    fn loaded_data_fires_once_after_buffering() {
        let mut video = VideoElement::default();
        video.attach(stream(2));
        video.arm_loaded_data();
        assert!(!video.pump());
        assert_eq!(video.ready_state(), ReadyState::HaveMetadata);
        assert!(!video.pump());
        assert!(video.pump());
        assert_eq!(video.ready_state(), ReadyState::HaveEnoughData);
        assert!(video.current_frame().is_some());
        assert!(!video.pump(), "listener must be one-shot");
    }

    #[test]
    fn pump_without_stream_is_noop() {
        let mut video = VideoElement::default();
        video.arm_loaded_data();
        assert!(!video.pump());
        assert_eq!(video.ready_state(), ReadyState::HaveNothing);
    }

    #[test]
    fn start_then_grant_goes_active() {
        let device = FakeDevice::ok();
        let mut cam = CameraController::new(device.clone(), VideoConstraints::default());
        cam.start();
        assert_eq!(cam.state(), CameraState::Starting);
        assert!(cam.is_enabled());
        assert_eq!(cam.poll_timeout(Duration::from_secs(2)), Some(CameraEvent::Started));
        assert_eq!(cam.state(), CameraState::Active);
        assert!(cam.video().has_stream());
        assert_eq!(device.live(), 1);
    }

    #[test]
    fn stop_releases_tracks_and_is_idempotent() {
        let device = FakeDevice::ok();
        let mut cam = CameraController::new(device.clone(), VideoConstraints::default());
        cam.start();
        cam.poll_timeout(Duration::from_secs(2));
        cam.stop();
        assert_eq!(cam.state(), CameraState::Inactive);
        assert_eq!(device.live(), 0);
        assert!(!cam.video().has_stream());
        cam.stop();
        assert_eq!(cam.state(), CameraState::Inactive);
    }

    #[test]
    fn failure_rolls_back_to_inactive() {
        let mut cam = CameraController::new(
            FakeDevice::failing(CameraError::PermissionDenied),
            VideoConstraints::default(),
        );
        cam.start();
        assert_eq!(
            cam.poll_timeout(Duration::from_secs(2)),
            Some(CameraEvent::Failed(CameraError::PermissionDenied))
        );
        assert_eq!(cam.state(), CameraState::Inactive);
        assert!(!cam.is_enabled());
    }

    #[test]
    fn grant_after_toggle_off_is_stopped() {
        let device = FakeDevice::ok();
        let mut cam = CameraController::new(device.clone(), VideoConstraints::default());
        cam.start();
        cam.stop();
        assert_eq!(cam.poll_timeout(Duration::from_secs(2)), None);
        assert_eq!(cam.state(), CameraState::Inactive);
        assert!(!cam.video().has_stream());
        assert_eq!(device.issued.lock().unwrap().len(), 1);
        assert_eq!(device.live(), 0);
    }

    #[test]
    fn late_grant_is_stopped_without_another_poll() {
        let device = FakeDevice::ok();
        let mut cam = CameraController::new(device.clone(), VideoConstraints::default());
        cam.start();
        cam.stop();
        let start = std::time::Instant::now();
        while device.issued.lock().unwrap().is_empty() && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(50));
        assert_eq!(device.issued.lock().unwrap().len(), 1);
        assert_eq!(device.live(), 0);
        assert_eq!(cam.state(), CameraState::Inactive);
    }

    #[test]
    fn start_while_active_is_ignored() {
        let device = FakeDevice::ok();
        let mut cam = CameraController::new(device.clone(), VideoConstraints::default());
        cam.start();
        cam.poll_timeout(Duration::from_secs(2));
        cam.start();
        assert_eq!(cam.state(), CameraState::Active);
        assert_eq!(cam.poll_timeout(Duration::from_millis(50)), None);
        assert_eq!(device.issued.lock().unwrap().len(), 1);
    }
}
