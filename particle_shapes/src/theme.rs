//! Color themes and per-run particle configuration.

use std::fmt;
use std::str::FromStr;

use crate::ParseError;

// ════════════════════════════════════════════════════════════════════════════
// ColorTheme
// ════════════════════════════════════════════════════════════════════════════

/// Palette the particles are painted with.  Colors are packed `0xAARRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ColorTheme {
    #[default]
    Emerald,
    Sunset,
    Ocean,
    Aurora,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 4] = [
        ColorTheme::Emerald,
        ColorTheme::Sunset,
        ColorTheme::Ocean,
        ColorTheme::Aurora,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ColorTheme::Emerald => "Emerald",
            ColorTheme::Sunset  => "Sunset",
            ColorTheme::Ocean   => "Ocean",
            ColorTheme::Aurora  => "Aurora",
        }
    }

    pub fn palette(self) -> &'static [u32] {
        match self {
            // greens with gold and red ornaments
            ColorTheme::Emerald => &[0xFF2ECC71, 0xFF27AE60, 0xFF1E8449, 0xFFF1C40F, 0xFFE74C3C],
            ColorTheme::Sunset  => &[0xFFFF6B6B, 0xFFFF8E53, 0xFFFFC857, 0xFFE84A5F, 0xFFFF99C8],
            ColorTheme::Ocean   => &[0xFF00B4D8, 0xFF0077B6, 0xFF90E0EF, 0xFF48CAE4, 0xFFCAF0F8],
            ColorTheme::Aurora  => &[0xFF7CFFCB, 0xFF74F2CE, 0xFFB388FF, 0xFF6A4CFF, 0xFF4DD0E1],
        }
    }

    pub fn next(self) -> ColorTheme {
        let i = Self::ALL.iter().position(|&t| t == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ColorTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ColorTheme {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|theme| theme.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownTheme(s.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleConfig
// ════════════════════════════════════════════════════════════════════════════

/// How many particles to draw, with which colors, at what point size.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleConfig {
    pub count:  usize,
    pub colors: Vec<u32>,
    /// Point size in pixels.
    pub size:   usize,
}

impl ParticleConfig {
    pub fn new(count: usize, theme: ColorTheme) -> Self {
        ParticleConfig {
            count,
            colors: theme.palette().to_vec(),
            size:   2,
        }
    }

    /// Color for particle `i`; cycles through the palette.
    pub fn color_of(&self, i: usize) -> u32 {
        if self.colors.is_empty() {
            return 0xFFFFFFFF;
        }
        self.colors[i % self.colors.len()]
    }

    pub fn retheme(&mut self, theme: ColorTheme) {
        self.colors = theme.palette().to_vec();
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        ParticleConfig::new(3000, ColorTheme::default())
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t).round() as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_are_opaque() {
        for theme in ColorTheme::ALL {
            for &c in theme.palette() {
                assert_eq!(c >> 24, 0xFF, "{theme} has a translucent color");
            }
        }
    }

    #[test]
    fn theme_cycle_visits_all() {
        let mut t = ColorTheme::Emerald;
        let mut seen = vec![t];
        for _ in 0..3 {
            t = t.next();
            seen.push(t);
        }
        assert_eq!(seen, ColorTheme::ALL.to_vec());
        assert_eq!(t.next(), ColorTheme::Emerald);
    }

    #[test]
    fn color_of_wraps_palette() {
        let cfg = ParticleConfig::new(10, ColorTheme::Ocean);
        let n = cfg.colors.len();
        assert_eq!(cfg.color_of(0), cfg.color_of(n));
    }

    #[test]
    fn retheme_swaps_palette() {
        let mut cfg = ParticleConfig::default();
        cfg.retheme(ColorTheme::Sunset);
        assert_eq!(cfg.colors, ColorTheme::Sunset.palette());
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }

    #[test]
    fn theme_parse() {
        assert_eq!("aurora".parse::<ColorTheme>(), Ok(ColorTheme::Aurora));
        assert!("neon".parse::<ColorTheme>().is_err());
    }
}
