//! Target layouts for each [`ShapeType`].

use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use crate::ParseError;

/// Golden angle in radians; spreads successive points evenly around a spiral.
const GOLDEN_ANGLE: f32 = 2.399_963_2;

// ════════════════════════════════════════════════════════════════════════════
// ShapeType
// ════════════════════════════════════════════════════════════════════════════

/// The arrangement the particles gather into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ShapeType {
    #[default]
    Tree,
    Sphere,
    Heart,
    Galaxy,
}

impl ShapeType {
    pub const ALL: [ShapeType; 4] = [
        ShapeType::Tree,
        ShapeType::Sphere,
        ShapeType::Heart,
        ShapeType::Galaxy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShapeType::Tree   => "Tree",
            ShapeType::Sphere => "Sphere",
            ShapeType::Heart  => "Heart",
            ShapeType::Galaxy => "Galaxy",
        }
    }

    /// The next shape in selection order, wrapping around.
    pub fn next(self) -> ShapeType {
        let i = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// Shape bound to a 1-based selection slot (keys 1–4).
    pub fn from_slot(slot: usize) -> Option<ShapeType> {
        slot.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShapeType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|shape| shape.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownShape(s.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Deterministic jitter
// ════════════════════════════════════════════════════════════════════════════

/// Hash `(index, salt)` to a float in `[0, 1)`.
///
/// A splitmix64 finalizer; stable across platforms so layouts never depend on
/// a random seed.
pub fn unit_hash(index: usize, salt: u64) -> f32 {
    let mut z = (index as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(salt.wrapping_mul(0xD1B5_4A32_D192_ED03));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 40) as f32 / (1u64 << 24) as f32
}

/// Hash to `[-1, 1)`.
fn signed_hash(index: usize, salt: u64) -> f32 {
    unit_hash(index, salt) * 2.0 - 1.0
}

// ════════════════════════════════════════════════════════════════════════════
// Generators
// ════════════════════════════════════════════════════════════════════════════

/// Generate `count` target positions for `shape`.
pub fn generate(shape: ShapeType, count: usize) -> Vec<Vec3> {
    match shape {
        ShapeType::Tree   => tree(count),
        ShapeType::Sphere => sphere(count),
        ShapeType::Heart  => heart(count),
        ShapeType::Galaxy => galaxy(count),
    }
}

/// Loose cloud the particles drift to when scattered.
///
/// Wider than the unit cube on purpose so an open hand visibly blows the
/// shape apart; the renderer clips what falls outside the viewport.
pub fn scatter_field(count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            Vec3::new(signed_hash(i, 101), signed_hash(i, 102), signed_hash(i, 103)) * 1.6
        })
        .collect()
}

/// Linear interpolation `from → to` at `t` (clamped to `[0, 1]`).
///
/// Pairs are matched by index; extra points in the longer slice are ignored.
pub fn morph(from: &[Vec3], to: &[Vec3], t: f32) -> Vec<Vec3> {
    let n = from.len().min(to.len());
    if t <= 0.0 {
        return from[..n].to_vec();
    }
    if t >= 1.0 {
        return to[..n].to_vec();
    }
    from.iter().zip(to).map(|(a, b)| a.lerp(*b, t)).collect()
}

/// Cone of foliage wound as a spiral, with a short trunk underneath.
fn tree(count: usize) -> Vec<Vec3> {
    let trunk = count / 10;
    let foliage = count - trunk;
    let mut out = Vec::with_capacity(count);

    for i in 0..foliage {
        let h = i as f32 / foliage.max(1) as f32;          // 0 = base, 1 = tip
        let radius = (1.0 - h) * 0.7 * (0.75 + 0.25 * unit_hash(i, 1));
        let angle = i as f32 * GOLDEN_ANGLE;
        let y = -0.7 + h * 1.6 + signed_hash(i, 2) * 0.03;
        out.push(Vec3::new(angle.cos() * radius, y, angle.sin() * radius));
    }

    for i in 0..trunk {
        let angle = unit_hash(i, 3) * TAU;
        let radius = 0.08 * unit_hash(i, 4).sqrt();
        let y = -1.0 + unit_hash(i, 5) * 0.3;
        out.push(Vec3::new(angle.cos() * radius, y, angle.sin() * radius));
    }

    out
}

/// Fibonacci lattice on a sphere of radius 0.85.
fn sphere(count: usize) -> Vec<Vec3> {
    let n = count.max(1) as f32;
    (0..count)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f32 + 0.5) / n;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let angle = i as f32 * GOLDEN_ANGLE;
            Vec3::new(angle.cos() * r, y, angle.sin() * r) * 0.85
        })
        .collect()
}

/// Classic parametric heart, filled toward its outline and given some depth.
fn heart(count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let t = unit_hash(i, 11) * TAU;
            let x = 16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos()
                - 5.0 * (2.0 * t).cos()
                - 2.0 * (3.0 * t).cos()
                - (4.0 * t).cos();
            // bias toward the outline so the silhouette reads clearly
            let fill = unit_hash(i, 12).sqrt();
            let depth = signed_hash(i, 13) * 0.25 * fill;
            Vec3::new(x / 17.0 * fill, y / 17.0 * fill + 0.1, depth)
        })
        .collect()
}

/// Three logarithmic spiral arms around a bright central bulge.
fn galaxy(count: usize) -> Vec<Vec3> {
    const ARMS: usize = 3;
    let bulge = count * 3 / 20;
    let mut out = Vec::with_capacity(count);

    for i in 0..count - bulge {
        let arm = i % ARMS;
        let r = unit_hash(i, 21).sqrt() * 0.95;
        let twist = r * 4.0;
        let angle = arm as f32 * TAU / ARMS as f32 + twist + signed_hash(i, 22) * 0.3;
        let thickness = 0.08 * (1.0 - r);
        out.push(Vec3::new(
            angle.cos() * r,
            signed_hash(i, 23) * thickness,
            angle.sin() * r,
        ));
    }

    for i in 0..bulge {
        let theta = unit_hash(i, 24) * TAU;
        let phi = (signed_hash(i, 25)).acos();
        let r = 0.18 * unit_hash(i, 26).cbrt();
        out.push(Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.cos() * 0.6,
            r * phi.sin() * theta.sin(),
        ));
    }

    out
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn inside_unit_cube(points: &[Vec3]) -> bool {
        points.iter().all(|p| p.abs().max_element() <= 1.0 + 1e-4)
    }

    #[test]
    fn every_shape_yields_requested_count() {
        for shape in ShapeType::ALL {
            for count in [0, 1, 7, 1000] {
                assert_eq!(generate(shape, count).len(), count, "{shape} × {count}");
            }
        }
    }

    #[test]
    fn shapes_stay_inside_unit_cube() {
        for shape in ShapeType::ALL {
            assert!(inside_unit_cube(&generate(shape, 3000)), "{shape} escaped the cube");
        }
    }

    #[test]
    fn generation_is_deterministic() {
        for shape in ShapeType::ALL {
            assert_eq!(generate(shape, 500), generate(shape, 500));
        }
    }

    #[test]
    fn sphere_points_share_radius() {
        for p in generate(ShapeType::Sphere, 400) {
            assert!((p.length() - 0.85).abs() < 1e-3);
        }
    }

    #[test]
    fn tree_narrows_toward_tip() {
        let pts = generate(ShapeType::Tree, 2000);
        let width = |lo: f32, hi: f32| {
            pts.iter()
                .filter(|p| p.y >= lo && p.y < hi)
                .map(|p| (p.x * p.x + p.z * p.z).sqrt())
                .fold(0.0_f32, f32::max)
        };
        assert!(width(-0.7, -0.3) > width(0.5, 0.9));
    }

    #[test]
    fn galaxy_is_flat() {
        let pts = generate(ShapeType::Galaxy, 2000);
        let max_y = pts.iter().map(|p| p.y.abs()).fold(0.0_f32, f32::max);
        let max_x = pts.iter().map(|p| p.x.abs()).fold(0.0_f32, f32::max);
        assert!(max_y < max_x * 0.5);
    }

    #[test]
    fn morph_endpoints() {
        let a = scatter_field(50);
        let b = generate(ShapeType::Heart, 50);
        assert_eq!(morph(&a, &b, 0.0), a);
        assert_eq!(morph(&a, &b, 1.0), b);
        assert_eq!(morph(&a, &b, 3.0), b);
    }

    #[test]
    fn unit_hash_range() {
        for i in 0..10_000 {
            let h = unit_hash(i, 7);
            assert!((0.0..1.0).contains(&h));
        }
        assert_ne!(unit_hash(1, 1), unit_hash(1, 2));
    }

    #[test]
    fn shape_cycle_and_slots() {
        assert_eq!(ShapeType::Galaxy.next(), ShapeType::Tree);
        assert_eq!(ShapeType::from_slot(2), Some(ShapeType::Sphere));
        assert_eq!(ShapeType::from_slot(0), None);
        assert_eq!(ShapeType::from_slot(5), None);
    }

    #[test]
    fn shape_parse() {
        assert_eq!("heart".parse::<ShapeType>(), Ok(ShapeType::Heart));
        assert_eq!(" Galaxy ".parse::<ShapeType>(), Ok(ShapeType::Galaxy));
        assert!(matches!("cube".parse::<ShapeType>(), Err(ParseError::UnknownShape(_))));
    }
}
