//! Hand landmark storage.

use crate::LandmarkError;

/// Keypoints per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices (MediaPipe hand landmark model convention).
pub mod indices {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

use indices::*;

/// `(mcp, pip, dip, tip)` for index, middle, ring and pinky.
pub const FINGERS: [(usize, usize, usize, usize); 4] = [
    (INDEX_MCP,  INDEX_PIP,  INDEX_DIP,  INDEX_TIP),
    (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP),
    (RING_MCP,   RING_PIP,   RING_DIP,   RING_TIP),
    (PINKY_MCP,  PINKY_PIP,  PINKY_DIP,  PINKY_TIP),
];

/// A single landmark (normalized coordinates).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,  // 0-1, image width
    pub y: f32,  // 0-1, image height, down
    pub z: f32,  // depth relative to wrist
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Planar distance; depth from a monocular model is too noisy to use.
    pub fn distance_2d(&self, other: &Landmark) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// All 21 landmarks of one hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandLandmarks {
    pub points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        HandLandmarks { points }
    }

    /// Parse a flat `[x0, y0, z0, x1, y1, z1, …]` slice of 63 values.
    pub fn from_flat(data: &[f32]) -> Result<Self, LandmarkError> {
        let expected = LANDMARK_COUNT * 3;
        if data.len() != expected {
            return Err(LandmarkError::BadLength { got: data.len(), expected });
        }
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        for (i, chunk) in data.chunks_exact(3).enumerate() {
            points[i] = Landmark::new(chunk[0], chunk[1], chunk[2]);
        }
        Ok(HandLandmarks { points })
    }

    pub fn get(&self, index: usize) -> Landmark {
        self.points[index]
    }

    /// Mean of the wrist and the four finger MCP joints.
    pub fn palm_center(&self) -> (f32, f32) {
        let ids = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];
        let (sx, sy) = ids.iter().fold((0.0, 0.0), |(sx, sy), &i| {
            (sx + self.points[i].x, sy + self.points[i].y)
        });
        (sx / ids.len() as f32, sy / ids.len() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flat_reads_triplets() {
        let data: Vec<f32> = (0..63).map(|v| v as f32).collect();
        let hand = HandLandmarks::from_flat(&data).unwrap();
        assert_eq!(hand.get(WRIST), Landmark::new(0.0, 1.0, 2.0));
        assert_eq!(hand.get(PINKY_TIP), Landmark::new(60.0, 61.0, 62.0));
    }

    #[test]
    fn from_flat_rejects_wrong_length() {
        let err = HandLandmarks::from_flat(&[0.0; 99]).unwrap_err();
        assert_eq!(err, LandmarkError::BadLength { got: 99, expected: 63 });
        assert!(HandLandmarks::from_flat(&[]).is_err());
    }

    #[test]
    fn palm_center_averages_knuckles_and_wrist() {
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        points[WRIST]      = Landmark::new(0.5, 1.0, 0.0);
        points[INDEX_MCP]  = Landmark::new(0.0, 0.0, 0.0);
        points[MIDDLE_MCP] = Landmark::new(0.5, 0.0, 0.0);
        points[RING_MCP]   = Landmark::new(1.0, 0.0, 0.0);
        points[PINKY_MCP]  = Landmark::new(0.5, 0.0, 0.0);
        let (x, y) = HandLandmarks::new(points).palm_center();
        assert!((x - 0.5).abs() < 1e-6);
        assert!((y - 0.2).abs() < 1e-6);
    }
}
