//! # particle_shapes
//!
//! Deterministic particle target layouts for the morphing visualization,
//! plus the color palettes the particles are painted with.
//!
//! Every generator places its points inside the cube `[-1, 1]³` (y up), so a
//! renderer only needs one projection for all four shapes.  The same
//! `(shape, count)` pair always yields the same points, which keeps morphs
//! between shapes stable: particle `i` of the tree flows into particle `i` of
//! the sphere.
//!
//! ## Quick start
//!
//! ```rust
//! use particle_shapes::{ShapeType, generate, scatter_field, morph};
//!
//! let heart   = generate(ShapeType::Heart, 2_000);
//! let scatter = scatter_field(2_000);
//! let halfway = morph(&scatter, &heart, 0.5);
//! assert_eq!(halfway.len(), 2_000);
//! ```

mod shape;
mod theme;

pub use shape::{ShapeType, generate, scatter_field, morph, unit_hash};
pub use theme::{ColorTheme, ParticleConfig, blend};

use thiserror::Error;

/// Error returned when a shape or theme name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown shape {0:?} (expected tree, sphere, heart or galaxy)")]
    UnknownShape(String),

    #[error("unknown color theme {0:?} (expected emerald, sunset, ocean or aurora)")]
    UnknownTheme(String),
}
