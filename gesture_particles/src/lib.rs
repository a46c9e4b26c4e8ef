//! # gesture_particles
//!
//! Camera-driven hand gesture controller for a morphing particle
//! visualization.  Particles form one of four shapes (tree, sphere, heart,
//! galaxy) and respond to the hand in front of the camera.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Fist | Gather: particles re-form the selected shape |
//! | Open hand | Scatter: particles drift apart |
//! | Pinch (thumb + index) | Zoom in |
//! | Move hand left/right, tilt | Steer rotation |
//!
//! With no hand in view (or the camera off) the manual debug gesture drives
//! the scene instead.
//!
//! ## Pipeline
//!
//! ```text
//! CameraDevice ──grant──▶ CameraController ──▶ VideoElement
//!                                                   │ loaded data
//!                                                   ▼
//!             VisionService ◀──frame── FrameLoop (once per rendered frame)
//!                   │
//!                   ▼ Option<HandData>
//!             App ──▶ ParticleScene / status text / controls panel
//! ```
//!
//! ## Simulation
//!
//! The camera is simulated: frames carry hand landmarks synthesized from the
//! mouse position and held keys, and the detector classifies them the same
//! way it would classify model output.
//!
//! | Key | Action |
//! |---|---|
//! | `1`–`4` / `Tab` | Select / cycle shape |
//! | `C` | Toggle camera |
//! | `G` | Cycle debug gesture |
//! | `T` | Cycle color theme |
//! | hold `F` / `O` / `P` | Simulated fist / open hand / pinch |
//! | mouse | Move the simulated hand |
//! | `H` | Hide / show the simulated hand |
//! | `Q` / `Esc` | Quit |

pub mod app;
pub mod camera;
pub mod controls;
pub mod error;
pub mod frame_loop;
pub mod notify;
pub mod scene;
pub mod sim;
pub mod vision;
pub mod visualizer;

pub use error::AppError;
