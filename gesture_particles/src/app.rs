//! Top-level application state machine.
//!
//! `App` owns the vision service, the camera controller, the frame loop and
//! the particle scene.  It turns [`ControlAction`]s into state changes and
//! advances everything once per rendered frame via [`App::tick`].

use std::sync::Arc;
use std::time::Duration;

use hand_gesture::{status_text, ClassifierConfig, GestureState, HandData};
use particle_shapes::{ColorTheme, ParticleConfig, ShapeType};

use crate::camera::{
    CameraController, CameraDevice, CameraError, CameraEvent, CameraState, VideoConstraints,
    VideoElement, CAMERA_ALERT,
};
use crate::controls::{ControlAction, ControlsView};
use crate::error::AppError;
use crate::frame_loop::{FrameClock, FrameLoop, FrameOutcome};
use crate::notify::{AlertSlot, LogNotifier, Notifier};
use crate::scene::{ParticleScene, Scene, SceneTuning};
use crate::sim::{edit_pose, scripted_pose, shared_pose, SimCamera, SimHandPose};
use crate::vision::{HandDetector, LandmarkDetector, VisionError, VisionService};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub shape:           ShapeType,
    pub theme:           ColorTheme,
    pub particle_count:  usize,
    pub constraints:     VideoConstraints,
    /// Render rate; also the detection rate.
    pub fps:             u32,
    /// Toggle the camera on as soon as the app starts.
    pub camera_on_start: bool,
    /// Make the simulated camera refuse permission.
    pub deny_camera:     bool,
    /// How long the landmark model takes to "load".
    pub model_warmup:    Duration,
    pub classifier:      ClassifierConfig,
    /// Morph, zoom and rotation rates for the particle scene.
    pub scene_tuning:    SceneTuning,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            shape:           ShapeType::Tree,
            theme:           ColorTheme::Emerald,
            particle_count:  3000,
            constraints:     VideoConstraints::default(),
            fps:             60,
            camera_on_start: false,
            deny_camera:     false,
            model_warmup:    Duration::from_millis(400),
            classifier:      ClassifierConfig::default(),
            scene_tuning:    SceneTuning::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// App
// ════════════════════════════════════════════════════════════════════════════

pub struct App {
    // ── user-facing state ────────────────────────────────────────────────
    shape:         ShapeType,
    theme:         ColorTheme,
    debug_gesture: GestureState,
    hand_data:     Option<HandData>,
    is_loading:    bool,
    quit:          bool,

    // ── services ─────────────────────────────────────────────────────────
    vision:        VisionService,
    camera:        CameraController,
    frame_loop:    FrameLoop,
    scene:         ParticleScene,
    notifier:      Box<dyn Notifier>,

    last_camera_error: Option<CameraError>,
}

impl App {
    pub fn new(
        cfg: AppConfig,
        device: Arc<dyn CameraDevice>,
        detector: Box<dyn HandDetector>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let vision = VisionService::new(detector);
        let is_loading = vision.initialize();

        let particles = ParticleConfig::new(cfg.particle_count, cfg.theme);
        let mut app = App {
            shape:         cfg.shape,
            theme:         cfg.theme,
            debug_gesture: GestureState::Fist,
            hand_data:     None,
            is_loading,
            quit:          false,
            vision,
            camera:        CameraController::new(device, cfg.constraints),
            frame_loop:    FrameLoop::new(),
            scene:         ParticleScene::new(particles, cfg.shape).with_tuning(cfg.scene_tuning),
            notifier,
            last_camera_error: None,
        };
        if cfg.camera_on_start {
            app.set_camera_active(true);
        }
        app
    }

    // ── process one ControlAction ────────────────────────────────────────

    pub fn handle_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::SelectShape(shape) => {
                self.shape = shape;
                log::info!("shape: {shape}");
            }
            ControlAction::NextShape => {
                self.shape = self.shape.next();
                log::info!("shape: {}", self.shape);
            }
            ControlAction::ToggleCamera => {
                let on = !self.camera_enabled();
                self.set_camera_active(on);
            }
            ControlAction::SetDebugGesture(g) => self.debug_gesture = g,
            ControlAction::CycleDebugGesture => {
                self.debug_gesture = self.debug_gesture.next();
                log::info!("debug gesture: {}", self.debug_gesture);
            }
            ControlAction::CycleTheme => {
                self.theme = self.theme.next();
                self.scene.set_theme(self.theme);
                log::info!("theme: {}", self.theme);
            }
            ControlAction::Quit => self.quit = true,
        }
    }

    /// The camera toggle.  Turning it off releases the stream, cancels the
    /// frame loop and forgets the last hand.
    pub fn set_camera_active(&mut self, on: bool) {
        if on {
            self.last_camera_error = None;
            self.camera.start();
        } else {
            self.camera.stop();
            self.frame_loop.cancel();
            self.hand_data = None;
        }
    }

    // ── Per-frame tick ───────────────────────────────────────────────────

    /// Advance one frame.  `timestamp_ms` goes to the detector, `dt` (seconds)
    /// to the scene animation.
    pub fn tick(&mut self, timestamp_ms: f64, dt: f32) {
        if self.is_loading && !self.vision.is_busy() {
            self.is_loading = false;
            log::debug!("busy overlay cleared");
        }

        match self.camera.poll() {
            Some(CameraEvent::Started) => log::info!("camera on"),
            Some(CameraEvent::Failed(e)) => {
                self.notifier.alert(CAMERA_ALERT);
                self.last_camera_error = Some(e);
            }
            None => {}
        }

        if self.camera.video_mut().pump() {
            log::debug!("video data loaded; starting detection");
            self.frame_loop.start();
        }

        match self.frame_loop.tick(self.camera.video(), &self.vision, timestamp_ms) {
            FrameOutcome::Detected(hand) => self.hand_data = hand,
            FrameOutcome::Idle | FrameOutcome::NotReady => {}
        }

        self.scene.update(self.shape, self.hand_data.as_ref(), self.debug_gesture);
        self.scene.tick(dt);
    }

    /// Release the camera before exit.
    pub fn shutdown(&mut self) {
        self.set_camera_active(false);
    }

    // ── Accessors for the render loop ────────────────────────────────────

    pub fn shape(&self)          -> ShapeType           { self.shape }
    pub fn theme(&self)          -> ColorTheme          { self.theme }
    pub fn debug_gesture(&self)  -> GestureState        { self.debug_gesture }
    pub fn hand_data(&self)      -> Option<&HandData>   { self.hand_data.as_ref() }
    pub fn is_loading(&self)     -> bool                { self.is_loading }
    pub fn should_quit(&self)    -> bool                { self.quit }
    pub fn scene(&self)          -> &ParticleScene      { &self.scene }
    pub fn video(&self)          -> &VideoElement       { self.camera.video() }
    pub fn camera_state(&self)   -> CameraState         { self.camera.state() }
    pub fn camera_enabled(&self) -> bool                { self.camera.is_enabled() }
    pub fn detecting(&self)      -> bool                { self.frame_loop.is_running() }

    pub fn last_camera_error(&self) -> Option<&CameraError> {
        self.last_camera_error.as_ref()
    }

    pub fn vision_failure(&self) -> Option<VisionError> {
        self.vision.failure()
    }

    pub fn status_text(&self) -> &'static str {
        status_text(self.hand_data.as_ref())
    }

    pub fn controls_view(&self) -> ControlsView<'static> {
        ControlsView {
            shape:          self.shape,
            theme:          self.theme,
            camera:         self.camera.state(),
            camera_enabled: self.camera_enabled(),
            debug_gesture:  self.debug_gesture,
            hand_status:    self.status_text(),
            loading:        self.is_loading,
            morph_progress: self.scene.morph_progress(),
            zoom:           self.scene.zoom(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the windowed application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the preview window until the user quits or closes it.
///
/// The simulated camera is driven from the window: the mouse moves the
/// hand, F/O/P select its pose.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let pose     = shared_pose(SimHandPose::default());
    let device   = Arc::new(SimCamera::new(Arc::clone(&pose)).denying(cfg.deny_camera));
    let detector = Box::new(LandmarkDetector::new(cfg.classifier, cfg.model_warmup));
    let alerts   = AlertSlot::new();

    let mut vis = Visualizer::new(alerts.clone(), pose)?;
    let mut clock = FrameClock::new(cfg.fps);
    let mut app = App::new(cfg, device, detector, Box::new(alerts));

    while vis.is_open() && !app.should_quit() {
        // 1. Window input → actions / simulated hand pose
        for action in vis.poll_input() {
            app.handle_action(action);
        }

        // 2. Per-frame logic
        let dt = clock.delta();
        app.tick(clock.now_ms(), dt);

        // 3. Render
        vis.render(&app);
    }

    app.shutdown();
    log::info!("bye");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// run_headless(): scripted run without a window
// ════════════════════════════════════════════════════════════════════════════

/// What a headless run saw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadlessReport {
    pub frames:     u64,
    pub with_hand:  u64,
    /// Frames per detected gesture, indexed like [`GestureState::ALL`].
    pub gestures:   [u64; 4],
}

impl HeadlessReport {
    fn record(&mut self, hand: Option<&HandData>) {
        self.frames += 1;
        if let Some(h) = hand {
            self.with_hand += 1;
            let g = h.gesture();
            if let Some(i) = GestureState::ALL.iter().position(|&s| s == g) {
                self.gestures[i] += 1;
            }
        }
    }
}

/// Run `frames` frames against a scripted hand (relaxed, fist, pinch, open,
/// two seconds each) with the camera on and alerts going to the log.
pub fn run_headless(cfg: AppConfig, frames: u64) -> Result<HeadlessReport, AppError> {
    let pose     = shared_pose(SimHandPose::default());
    let device   = Arc::new(SimCamera::new(Arc::clone(&pose)).denying(cfg.deny_camera));
    let detector = Box::new(LandmarkDetector::new(cfg.classifier, cfg.model_warmup));
    let fps      = cfg.fps.max(1);

    let mut app = App::new(cfg, device, detector, Box::new(LogNotifier));
    if !app.camera_enabled() {
        app.set_camera_active(true);
    }

    let mut clock  = FrameClock::new(fps);
    let step       = u64::from(fps) * 2;
    let mut report = HeadlessReport::default();

    for frame in 0..frames {
        edit_pose(&pose, |p| *p = scripted_pose(frame, step));
        let dt = clock.delta();
        app.tick(clock.now_ms(), dt);
        report.record(app.hand_data());

        if let Some(e) = app.last_camera_error() {
            return Err(e.clone().into());
        }
        clock.wait_next();
    }

    app.shutdown();
    if let Some(e) = app.vision_failure() {
        return Err(e.into());
    }

    log::info!(
        "headless: {} frames, hand in {}, gestures {:?}",
        report.frames, report.with_hand, report.gestures
    );
    Ok(report)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Mutex};
    use std::thread;
    use std::time::Instant;

    use crate::camera::VideoFrame;
    use crate::sim::SharedPose;

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        alerts: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingNotifier {
        fn count(&self) -> usize { self.alerts.lock().unwrap().len() }
    }

    impl Notifier for RecordingNotifier {
        fn alert(&self, message: &str) {
            self.alerts.lock().unwrap().push(message.to_string());
        }
    }

    /// Detector whose load waits for the test.
    struct Gated(mpsc::Receiver<()>);

    impl HandDetector for Gated {
        fn load(&mut self) -> Result<(), VisionError> {
            let _ = self.0.recv();
            Ok(())
        }
        fn detect(&mut self, _f: &VideoFrame, _t: f64) -> Option<HandData> { None }
    }

    /// Detector whose load panics.
    struct Exploding;

    impl HandDetector for Exploding {
        fn load(&mut self) -> Result<(), VisionError> {
            panic!("landmark model corrupted")
        }
        fn detect(&mut self, _f: &VideoFrame, _t: f64) -> Option<HandData> { None }
    }

    struct Rig {
        app:    App,
        camera: Arc<SimCamera>,
        pose:   SharedPose,
        alerts: RecordingNotifier,
    }

    fn rig_with(camera: impl FnOnce(SimCamera) -> SimCamera) -> Rig {
        let pose = shared_pose(SimHandPose::default());
        let camera = Arc::new(camera(
            SimCamera::new(Arc::clone(&pose)).grant_delay(Duration::ZERO).warmup_frames(1),
        ));
        let alerts = RecordingNotifier::default();
        let cfg = AppConfig { particle_count: 100, ..AppConfig::default() };
        let app = App::new(
            cfg,
            camera.clone(),
            Box::new(LandmarkDetector::new(ClassifierConfig::default(), Duration::ZERO)),
            Box::new(alerts.clone()),
        );
        Rig { app, camera, pose, alerts }
    }

    fn rig() -> Rig {
        rig_with(|c| c)
    }

    /// Tick at ~60 fps until `cond` holds; false on timeout.
    fn tick_until(app: &mut App, cond: impl Fn(&App) -> bool) -> bool {
        let start = Instant::now();
        let mut ts = 0.0;
        while start.elapsed() < Duration::from_secs(3) {
            app.tick(ts, 1.0 / 60.0);
            if cond(app) {
                return true;
            }
            ts += 16.0;
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn busy_overlay_clears_once_after_load() {
        let (gate, rx) = mpsc::channel();
        let mut app = App::new(
            AppConfig { particle_count: 10, ..AppConfig::default() },
            Arc::new(SimCamera::new(shared_pose(SimHandPose::default()))),
            Box::new(Gated(rx)),
            Box::new(RecordingNotifier::default()),
        );
        assert!(app.is_loading());
        assert!(app.controls_view().loading);
        app.tick(0.0, 0.016);
        assert!(app.is_loading());

        gate.send(()).unwrap();
        app.vision.wait();
        app.tick(16.0, 0.016);
        assert!(!app.is_loading());

        assert!(!app.vision.initialize());
        app.tick(32.0, 0.016);
        assert!(!app.is_loading());
    }

    #[test]
    fn panicking_loader_still_clears_busy_overlay() {
        let mut app = App::new(
            AppConfig { particle_count: 10, ..AppConfig::default() },
            Arc::new(SimCamera::new(shared_pose(SimHandPose::default()))),
            Box::new(Exploding),
            Box::new(RecordingNotifier::default()),
        );
        assert!(tick_until(&mut app, |a| !a.is_loading()));
        assert!(app.vision_failure().is_some());
        assert!(!app.controls_view().loading);
    }

    #[test]
    fn scene_uses_configured_tuning() {
        let fast = SceneTuning { gather_rate: 10.0, ..SceneTuning::default() };
        let mut app = App::new(
            AppConfig { particle_count: 10, scene_tuning: fast, ..AppConfig::default() },
            Arc::new(SimCamera::new(shared_pose(SimHandPose::default()))),
            Box::new(LandmarkDetector::new(ClassifierConfig::default(), Duration::ZERO)),
            Box::new(RecordingNotifier::default()),
        );
        app.tick(0.0, 0.1);
        assert_eq!(app.scene().gesture(), GestureState::Fist);
        assert_eq!(app.scene().morph_progress(), 1.0);
    }

    #[test]
    fn detected_pinch_drives_status() {
        let mut r = rig();
        edit_pose(&r.pose, |p| p.gesture = GestureState::Pinch);
        r.app.handle_action(ControlAction::ToggleCamera);
        assert!(tick_until(&mut r.app, |a| a.hand_data().is_some()));
        assert_eq!(r.app.status_text(), "PINCH DETECTED: ZOOMING");
        assert_eq!(r.app.scene().gesture(), GestureState::Pinch);
        assert_eq!(r.app.controls_view().hand_status, "PINCH DETECTED: ZOOMING");
    }

    #[test]
    fn hidden_hand_publishes_none() {
        let mut r = rig();
        r.app.set_camera_active(true);
        assert!(tick_until(&mut r.app, |a| a.hand_data().is_some()));
        edit_pose(&r.pose, |p| p.visible = false);
        assert!(tick_until(&mut r.app, |a| a.hand_data().is_none()));
        assert_eq!(r.app.status_text(), "");
        assert!(r.app.detecting());
    }

    #[test]
    fn toggle_off_releases_everything() {
        let mut r = rig();
        edit_pose(&r.pose, |p| p.gesture = GestureState::Fist);
        r.app.set_camera_active(true);
        assert!(tick_until(&mut r.app, |a| a.hand_data().is_some()));
        assert_eq!(r.camera.live_tracks(), 1);
        assert!(r.app.detecting());

        r.app.handle_action(ControlAction::ToggleCamera);
        assert_eq!(r.camera.live_tracks(), 0);
        assert!(!r.app.detecting());
        assert!(r.app.hand_data().is_none());
        assert_eq!(r.app.camera_state(), CameraState::Inactive);

        r.app.tick(1000.0, 0.016);
        assert!(r.app.hand_data().is_none());
    }

    #[test]
    fn denied_camera_alerts_exactly_once() {
        let mut r = rig_with(|c| c.denying(true));
        r.app.set_camera_active(true);
        assert!(tick_until(&mut r.app, |a| a.last_camera_error().is_some()));
        for i in 0..10 {
            r.app.tick(i as f64 * 16.0, 0.016);
        }
        assert!(!r.app.camera_enabled());
        assert_eq!(r.alerts.count(), 1);
        assert_eq!(r.alerts.alerts.lock().unwrap()[0], CAMERA_ALERT);
        assert_eq!(r.app.last_camera_error(), Some(&CameraError::PermissionDenied));
    }

    #[test]
    fn grant_after_toggle_off_is_released() {
        let mut r = rig_with(|c| c.grant_delay(Duration::from_millis(50)));
        r.app.set_camera_active(true);
        r.app.set_camera_active(false);
        assert!(tick_until(&mut r.app, |_| r.camera.issued_tracks() == 1));
        // the grant lands on the channel just after the track is issued
        thread::sleep(Duration::from_millis(20));
        r.app.tick(0.0, 0.016);
        assert_eq!(r.camera.live_tracks(), 0);
        assert_eq!(r.app.camera_state(), CameraState::Inactive);
        assert!(!r.app.video().has_stream());
        assert_eq!(r.alerts.count(), 0);
    }

    #[test]
    fn shutdown_while_starting_releases_late_grant() {
        let mut r = rig_with(|c| c.grant_delay(Duration::from_millis(50)));
        r.app.set_camera_active(true);
        r.app.shutdown();
        let start = Instant::now();
        while r.camera.issued_tracks() == 0 && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(100));
        assert_eq!(r.camera.issued_tracks(), 1);
        assert_eq!(r.camera.live_tracks(), 0);
        assert_eq!(r.app.camera_state(), CameraState::Inactive);
    }

    #[test]
    fn debug_gesture_applies_without_hand() {
        let mut r = rig();
        assert_eq!(r.app.debug_gesture(), GestureState::Fist);
        r.app.tick(0.0, 0.5);
        assert_eq!(r.app.scene().gesture(), GestureState::Fist);
        assert!(r.app.scene().morph_progress() > 0.0);

        r.app.handle_action(ControlAction::SetDebugGesture(GestureState::OpenHand));
        r.app.tick(16.0, 0.016);
        assert_eq!(r.app.scene().gesture(), GestureState::OpenHand);
    }

    #[test]
    fn actions_update_shape_theme_and_quit() {
        let mut r = rig();
        r.app.handle_action(ControlAction::SelectShape(ShapeType::Heart));
        r.app.tick(0.0, 0.016);
        assert_eq!(r.app.scene().shape(), ShapeType::Heart);
        r.app.handle_action(ControlAction::NextShape);
        assert_eq!(r.app.shape(), ShapeType::Galaxy);

        r.app.handle_action(ControlAction::CycleTheme);
        assert_eq!(r.app.theme(), ColorTheme::Sunset);
        assert_eq!(r.app.scene().config().colors, ColorTheme::Sunset.palette());

        r.app.handle_action(ControlAction::CycleDebugGesture);
        assert_ne!(r.app.debug_gesture(), GestureState::Fist);

        assert!(!r.app.should_quit());
        r.app.handle_action(ControlAction::Quit);
        assert!(r.app.should_quit());
    }

    #[test]
    fn headless_run_with_denied_camera_fails() {
        let cfg = AppConfig {
            particle_count: 50,
            deny_camera: true,
            model_warmup: Duration::ZERO,
            fps: 240,
            ..AppConfig::default()
        };
        let err = run_headless(cfg, 2_000).unwrap_err();
        assert!(matches!(err, AppError::Camera(CameraError::PermissionDenied)));
    }

    #[test]
    fn headless_run_sees_hand() {
        let cfg = AppConfig {
            particle_count: 50,
            model_warmup: Duration::ZERO,
            fps: 240,
            ..AppConfig::default()
        };
        let report = run_headless(cfg, 240).unwrap();
        assert_eq!(report.frames, 240);
        assert!(report.with_hand > 0);
    }
}
