//! Scene state: what the particles are doing this frame.
//!
//! The [`Scene`] trait is the rendering seam: it receives the selected shape,
//! the latest hand (if any) and the manual debug gesture.  [`ParticleScene`]
//! turns those into morph progress, rotation and zoom, and produces the
//! particle positions a renderer draws.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};
use hand_gesture::{GestureState, HandData, Position};
use particle_shapes::{generate, morph, scatter_field, ColorTheme, ParticleConfig, ShapeType};

pub trait Scene {
    fn update(&mut self, shape: ShapeType, hand: Option<&HandData>, debug_gesture: GestureState);
}

/// Rates are per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneTuning {
    pub gather_rate:  f32,
    pub scatter_rate: f32,
    pub max_zoom:     f32,
    pub zoom_rate:    f32,
    pub spin_rate:    f32,
    pub follow_rate:  f32,
}

impl Default for SceneTuning {
    fn default() -> Self {
        SceneTuning {
            gather_rate:  0.8,
            scatter_rate: 1.2,
            max_zoom:     1.8,
            zoom_rate:    3.0,
            spin_rate:    0.35,
            follow_rate:  4.0,
        }
    }
}

pub struct ParticleScene {
    config:         ParticleConfig,
    tuning:         SceneTuning,
    shape:          ShapeType,
    target:         Vec<Vec3>,
    scatter:        Vec<Vec3>,
    /// 0 = fully scattered, 1 = fully formed.
    morph_progress: f32,
    /// Radians about the vertical axis, kept in `[0, TAU)`.
    rotation:       f32,
    zoom:           f32,
    gesture:        GestureState,
    hand:           Option<(Position, f32)>,
}

impl ParticleScene {
    pub fn new(config: ParticleConfig, shape: ShapeType) -> Self {
        let target = generate(shape, config.count);
        let scatter = scatter_field(config.count);
        ParticleScene {
            config,
            tuning: SceneTuning::default(),
            shape,
            target,
            scatter,
            morph_progress: 0.0,
            rotation: 0.0,
            zoom: 1.0,
            gesture: GestureState::None,
            hand: None,
        }
    }

    pub fn with_tuning(mut self, tuning: SceneTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn shape(&self)          -> ShapeType       { self.shape }
    pub fn morph_progress(&self) -> f32             { self.morph_progress }
    pub fn rotation(&self)       -> f32             { self.rotation }
    pub fn zoom(&self)           -> f32             { self.zoom }
    /// The gesture currently driving the scene (live or manual).
    pub fn gesture(&self)        -> GestureState    { self.gesture }
    pub fn config(&self)         -> &ParticleConfig { &self.config }

    pub fn set_theme(&mut self, theme: ColorTheme) {
        self.config.retheme(theme);
    }

    /// Advance the animation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let t = &self.tuning;

        match self.gesture {
            GestureState::Fist     => self.morph_progress += t.gather_rate * dt,
            GestureState::OpenHand => self.morph_progress -= t.scatter_rate * dt,
            GestureState::Pinch | GestureState::None => {}
        }
        self.morph_progress = self.morph_progress.clamp(0.0, 1.0);

        let zoom_target = if self.gesture == GestureState::Pinch { t.max_zoom } else { 1.0 };
        self.zoom += (zoom_target - self.zoom) * (t.zoom_rate * dt).min(1.0);

        match self.hand {
            Some((pos, tilt)) => {
                // hand x sweeps half a turn each way; tilt adds on top
                let want = (pos.x - 0.5) * PI + tilt;
                let delta = wrap_angle(want - self.rotation);
                self.rotation += delta * (t.follow_rate * dt).min(1.0);
            }
            None => self.rotation += t.spin_rate * dt,
        }
        self.rotation = self.rotation.rem_euclid(TAU);
    }

    /// Particle positions for this frame, in scene units (unit cube ≈ shape).
    pub fn positions(&self) -> Vec<Vec3> {
        let rot = Quat::from_rotation_y(self.rotation);
        morph(&self.scatter, &self.target, self.morph_progress)
            .into_iter()
            .map(|p| rot * p * self.zoom)
            .collect()
    }
}

impl Scene for ParticleScene {
    fn update(&mut self, shape: ShapeType, hand: Option<&HandData>, debug_gesture: GestureState) {
        if shape != self.shape {
            log::debug!("retargeting particles {} → {}", self.shape, shape);
            self.shape = shape;
            self.target = generate(shape, self.config.count);
        }
        self.gesture = hand.map(HandData::gesture).unwrap_or(debug_gesture);
        self.hand = hand.map(|h| (h.position, h.tilt));
    }
}

/// Wrap to `(-PI, PI]`.
fn wrap_angle(a: f32) -> f32 {
    let a = a.rem_euclid(TAU);
    if a > PI { a - TAU } else { a }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
