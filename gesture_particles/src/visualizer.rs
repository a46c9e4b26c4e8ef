//! Software-rendered preview window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┬──────────────────┐
//! │                                              │ ┌──────────────┐ │
//! │                                              │ │ camera       │ │
//! │        particles (orthographic plot)         │ │ preview      │ │
//! │                                              │ └──────────────┘ │
//! │                 ◆ hand                       │  SHAPE / THEME   │
//! │                                              │  CAMERA / DEBUG  │
//! │                                              │  status line     │
//! │                                              │  [TREE][SPHERE]… │
//! │                                              │  key legend      │
//! └──────────────────────────────────────────────┴──────────────────┘
//! ```
//!
//! The loading overlay covers the particle view while the vision engine
//! initializes; a camera alert is drawn as a modal over everything and
//! swallows input until dismissed with Enter, Space or Esc.

use std::time::Duration;

use glam::Vec3;
use hand_gesture::{indices, GestureState, HandLandmarks, FINGERS};
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};
use particle_shapes::{blend, ShapeType};

use crate::app::App;
use crate::camera::{CameraState, VideoElement};
use crate::controls::{ControlAction, ControlsView, KEY_LEGEND};
use crate::error::AppError;
use crate::notify::AlertSlot;
use crate::scene::ParticleScene;
use crate::sim::{edit_pose, SharedPose};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:      usize = 1100;
pub const WIN_H:      usize = 640;
const PANEL_W:        usize = 300;
const VIEW_W:         usize = WIN_W - PANEL_W;
const PREVIEW_X:      usize = VIEW_W + 20;
const PREVIEW_Y:      usize = 20;
const PREVIEW_W:      usize = 260;
const PREVIEW_H:      usize = 195;
const TEXT_X:         usize = VIEW_W + 20;
const TEXT_Y:         usize = PREVIEW_Y + PREVIEW_H + 20;
const LINE_H:         usize = 18;
/// Pixels per scene unit.
const PLOT_SCALE:     f32   = WIN_H as f32 * 0.36;
const BG_COLOR:       u32   = 0xFF0B0F1A;
const PANEL_BG:       u32   = 0xFF141B2D;
const PREVIEW_BG:     u32   = 0xFF05070C;
const TEXT_COLOR:     u32   = 0xFFE6E6E6;
const DIM_COLOR:      u32   = 0xFF7A8499;
const ACCENT_COLOR:   u32   = 0xFFFFD700;
const ON_COLOR:       u32   = 0xFF2ECC71;
const BONE_COLOR:     u32   = 0xFF48CAE4;

const KEY_ACTIONS: [(Key, ControlAction); 10] = [
    (Key::Key1,   ControlAction::SelectShape(ShapeType::Tree)),
    (Key::Key2,   ControlAction::SelectShape(ShapeType::Sphere)),
    (Key::Key3,   ControlAction::SelectShape(ShapeType::Heart)),
    (Key::Key4,   ControlAction::SelectShape(ShapeType::Galaxy)),
    (Key::Tab,    ControlAction::NextShape),
    (Key::C,      ControlAction::ToggleCamera),
    (Key::G,      ControlAction::CycleDebugGesture),
    (Key::T,      ControlAction::CycleTheme),
    (Key::Q,      ControlAction::Quit),
    (Key::Escape, ControlAction::Quit),
];

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    alerts: AlertSlot,
    /// Simulated hand, written from mouse and keyboard.
    pose:   SharedPose,
}

impl Visualizer {
    pub fn new(alerts: AlertSlot, pose: SharedPose) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Gesture Particles — hand-controlled morphing particles",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            alerts,
            pose,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Read the keyboard and mouse.  Returns the actions requested this
    /// frame and updates the simulated hand as a side effect.
    pub fn poll_input(&mut self) -> Vec<ControlAction> {
        if !self.window.is_open() {
            return Vec::new();
        }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        // Modal alert: only dismissal gets through
        if self.alerts.is_showing() {
            if one_shot(Key::Enter) || one_shot(Key::Space) || one_shot(Key::Escape) {
                self.alerts.dismiss();
            }
            return Vec::new();
        }

        let actions = KEY_ACTIONS
            .iter()
            .filter(|(key, _)| one_shot(*key))
            .map(|&(_, action)| action)
            .collect();

        let toggle_hide = one_shot(Key::H);
        let gesture = held_gesture(
            self.window.is_key_down(Key::F),
            self.window.is_key_down(Key::O),
            self.window.is_key_down(Key::P),
        );
        let mouse = self
            .window
            .get_mouse_pos(MouseMode::Discard)
            .filter(|&(mx, _)| (mx as usize) < VIEW_W);

        edit_pose(&self.pose, |p| {
            p.gesture = gesture;
            if toggle_hide {
                p.visible = !p.visible;
            }
            if let Some((mx, my)) = mouse {
                p.center.x = mx / VIEW_W as f32;
                p.center.y = my / WIN_H as f32;
            }
        });

        actions
    }

    /// Render one frame.
    pub fn render(&mut self, app: &App) {
        let view = app.controls_view();

        self.buf.fill(BG_COLOR);

        // ── Particles ─────────────────────────────────────────────────────
        self.draw_particles(app.scene());
        if let Some(hand) = app.hand_data() {
            let hx = (hand.position.x * VIEW_W as f32) as usize;
            let hy = (hand.position.y * WIN_H as f32) as usize;
            self.draw_diamond(hx, hy, 8, gesture_color(hand.gesture()));
        }
        if view.loading {
            self.draw_loading_overlay();
        }

        // ── Controls panel ────────────────────────────────────────────────
        self.fill_rect(VIEW_W, 0, PANEL_W, WIN_H, PANEL_BG);
        self.draw_preview(app.video(), view.camera);
        self.draw_panel(&view);

        // ── Modal alert ───────────────────────────────────────────────────
        if let Some(message) = self.alerts.current() {
            self.draw_alert(&message);
        }

        if let Err(e) = self.window.update_with_buffer(&self.buf, WIN_W, WIN_H) {
            log::warn!("window update failed: {e}");
        }
    }

    // ── Particle view ─────────────────────────────────────────────────────

    fn draw_particles(&mut self, scene: &ParticleScene) {
        let config = scene.config();
        let size = config.size.max(1);
        for (i, p) in scene.positions().into_iter().enumerate() {
            let Some((sx, sy)) = project(p) else { continue };
            // far particles fade toward the background
            let near = ((p.z + 1.6) / 3.2).clamp(0.0, 1.0);
            let color = blend(config.color_of(i), BG_COLOR, (1.0 - near) * 0.6);
            self.fill_rect(sx, sy, size, size, color);
        }
    }

    fn draw_loading_overlay(&mut self) {
        for row in 0..WIN_H {
            for px in &mut self.buf[row * WIN_W..row * WIN_W + VIEW_W] {
                *px = blend(*px, 0xFF000000, 0.65);
            }
        }
        let text = "INITIALIZING VISION ENGINE...";
        let w = text_width(text, 3);
        self.draw_label(text, (VIEW_W - w) / 2, WIN_H / 2 - 8, 3, ACCENT_COLOR);
    }

    // ── Camera preview ────────────────────────────────────────────────────

    fn draw_preview(&mut self, video: &VideoElement, state: CameraState) {
        self.fill_rect(PREVIEW_X, PREVIEW_Y, PREVIEW_W, PREVIEW_H, PREVIEW_BG);
        let border = if state == CameraState::Active { ON_COLOR } else { DIM_COLOR };
        self.draw_border(PREVIEW_X, PREVIEW_Y, PREVIEW_W, PREVIEW_H, border);

        let caption = match (state, video.current_frame()) {
            (CameraState::Inactive, _)       => Some("CAMERA OFF"),
            (CameraState::Starting, _)       => Some("WAITING FOR CAMERA..."),
            (_, None)                        => Some("NO SIGNAL"),
            (_, Some(f)) if f.landmarks.is_none() => Some("NO HAND"),
            _ => None,
        };
        if let Some(caption) = caption {
            let w = text_width(caption, 2);
            self.draw_label(caption, PREVIEW_X + (PREVIEW_W - w) / 2, PREVIEW_Y + PREVIEW_H / 2 - 5, 2, DIM_COLOR);
        }

        if let Some(landmarks) = video.current_frame().and_then(|f| f.landmarks.as_ref()) {
            self.draw_skeleton(landmarks);
        }
    }

    /// Landmarks mirrored horizontally, like the user sees themselves.
    fn draw_skeleton(&mut self, hand: &HandLandmarks) {
        let to_px = |i: usize| {
            let lm = hand.get(i);
            (
                PREVIEW_X as isize + ((1.0 - lm.x) * PREVIEW_W as f32) as isize,
                PREVIEW_Y as isize + (lm.y * PREVIEW_H as f32) as isize,
            )
        };

        let thumb = [
            indices::WRIST, indices::THUMB_CMC, indices::THUMB_MCP, indices::THUMB_IP, indices::THUMB_TIP,
        ];
        for pair in thumb.windows(2) {
            self.draw_line(to_px(pair[0]), to_px(pair[1]), BONE_COLOR);
        }
        for &(mcp, pip, dip, tip) in &FINGERS {
            self.draw_line(to_px(indices::WRIST), to_px(mcp), BONE_COLOR);
            self.draw_line(to_px(mcp), to_px(pip), BONE_COLOR);
            self.draw_line(to_px(pip), to_px(dip), BONE_COLOR);
            self.draw_line(to_px(dip), to_px(tip), BONE_COLOR);
        }
        for i in 0..hand.points.len() {
            let (x, y) = to_px(i);
            for py in y - 1..=y + 1 {
                for px in x - 1..=x + 1 {
                    if in_preview(px, py) {
                        self.set_pixel_i(px, py, 0xFFFF5A5F);
                    }
                }
            }
        }
    }

    // ── Controls panel ────────────────────────────────────────────────────

    fn draw_panel(&mut self, view: &ControlsView<'_>) {
        let mut y = TEXT_Y;
        let mut line = |vis: &mut Self, text: &str, color: u32| {
            vis.draw_label(text, TEXT_X, y, 2, color);
            y += LINE_H;
        };

        line(self, "GESTURE PARTICLES", ACCENT_COLOR);
        line(self, &format!("SHAPE: {}", view.shape), TEXT_COLOR);
        line(self, &format!("THEME: {}", view.theme), TEXT_COLOR);
        let cam_color = if view.camera_enabled { ON_COLOR } else { DIM_COLOR };
        line(self, &format!("CAMERA: {}", view.camera.label()), cam_color);
        line(self, &format!("DEBUG: {}", view.debug_gesture), TEXT_COLOR);
        line(self, &format!("MORPH: {:.0}%", view.morph_progress * 100.0), TEXT_COLOR);
        line(self, &format!("ZOOM: {:.2}X", view.zoom), TEXT_COLOR);

        let status = match (view.hand_status, view.camera_enabled) {
            ("", true)  => "NO HAND",
            ("", false) => "",
            (s, _)      => s,
        };
        line(self, status, ACCENT_COLOR);

        // Morph bar
        let bar_y = TEXT_Y + LINE_H * 8 + 4;
        let bar_w = PANEL_W - 40;
        self.draw_border(TEXT_X, bar_y, bar_w, 10, DIM_COLOR);
        let filled = ((bar_w - 2) as f32 * view.morph_progress.clamp(0.0, 1.0)) as usize;
        self.fill_rect(TEXT_X + 1, bar_y + 1, filled, 8, ON_COLOR);

        // Shape buttons
        let btn_y = bar_y + 24;
        let btn_w = bar_w / ShapeType::ALL.len();
        for (i, shape) in ShapeType::ALL.iter().enumerate() {
            let bx = TEXT_X + i * btn_w;
            let selected = *shape == view.shape;
            let bg = if selected { 0xFF0F3460 } else { PANEL_BG };
            self.fill_rect(bx, btn_y, btn_w - 4, 20, bg);
            self.draw_border(bx, btn_y, btn_w - 4, 20, if selected { ACCENT_COLOR } else { DIM_COLOR });
            let label = format!("{} {}", i + 1, shape.label());
            self.draw_label(&label, bx + 4, btn_y + 8, 1, TEXT_COLOR);
        }

        // Key legend
        let legend_y = WIN_H - 14 - 10 * KEY_LEGEND.len();
        for (i, text) in KEY_LEGEND.iter().enumerate() {
            self.draw_label(text, TEXT_X, legend_y + i * 10, 1, DIM_COLOR);
        }
    }

    // ── Alert modal ───────────────────────────────────────────────────────

    fn draw_alert(&mut self, message: &str) {
        let lines = wrap(message, 36);
        let w = 36 * 8 + 40;
        let h = 60 + lines.len() * LINE_H;
        let x = (WIN_W - w) / 2;
        let y = (WIN_H - h) / 2;

        for px in self.buf.iter_mut() {
            *px = blend(*px, 0xFF000000, 0.5);
        }
        self.fill_rect(x, y, w, h, 0xFF2A1A1F);
        self.draw_border(x, y, w, h, 0xFFE74C3C);
        for (i, text) in lines.iter().enumerate() {
            self.draw_label(text, x + 20, y + 20 + i * LINE_H, 2, TEXT_COLOR);
        }
        self.draw_label("PRESS ENTER TO DISMISS", x + 20, y + h - 20, 1, DIM_COLOR);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x + w).min(WIN_W) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y + h).min(WIN_H) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn set_pixel_i(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Bresenham, clipped to the camera preview.
    fn draw_line(&mut self, (x0, y0): (isize, isize), (x1, y1): (isize, isize), color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            if in_preview(x, y) {
                self.set_pixel_i(x, y, color);
            }
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    fn draw_diamond(&mut self, cx: usize, cy: usize, r: usize, color: u32) {
        for dy in 0..=r as isize {
            let dx = r as isize - dy;
            for &(sx, sy) in &[
                (cx as isize + dx, cy as isize + dy),
                (cx as isize - dx, cy as isize + dy),
                (cx as isize + dx, cy as isize - dy),
                (cx as isize - dx, cy as isize - dy),
            ] {
                self.set_pixel_i(sx, sy, color);
            }
        }
    }

    /// 3×5 bitmap font, each pixel drawn as a `scale`×`scale` block.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pure helpers
// ────────────────────────────────────────────────────────────────────────────

/// Inside the camera preview rectangle.
fn in_preview(x: isize, y: isize) -> bool {
    (PREVIEW_X as isize..(PREVIEW_X + PREVIEW_W) as isize).contains(&x)
        && (PREVIEW_Y as isize..(PREVIEW_Y + PREVIEW_H) as isize).contains(&y)
}

/// Scene point → particle-view pixel, `None` when it falls outside the view.
fn project(p: Vec3) -> Option<(usize, usize)> {
    let sx = VIEW_W as f32 / 2.0 + p.x * PLOT_SCALE;
    let sy = WIN_H as f32 / 2.0 - p.y * PLOT_SCALE;
    if sx < 0.0 || sy < 0.0 || sx >= VIEW_W as f32 || sy >= WIN_H as f32 {
        return None;
    }
    Some((sx as usize, sy as usize))
}

/// Gesture from the held simulation keys; no key = relaxed hand.
fn held_gesture(fist: bool, open: bool, pinch: bool) -> GestureState {
    if fist {
        GestureState::Fist
    } else if pinch {
        GestureState::Pinch
    } else if open {
        GestureState::OpenHand
    } else {
        GestureState::None
    }
}

fn gesture_color(g: GestureState) -> u32 {
    match g {
        GestureState::Fist     => 0xFFE74C3C,
        GestureState::Pinch    => 0xFF48CAE4,
        GestureState::OpenHand => 0xFF2ECC71,
        GestureState::None     => 0xFFE6E6E6,
    }
}

fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * 4 * scale
}

/// Greedy word wrap to at most `width` characters per line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
