//! Synthetic landmarks for a given gesture.
//!
//! Used by the simulated camera in place of real model output.  The hand is
//! laid out in a local frame (palm scale 1.0 = wrist → middle MCP, `v` toward
//! the fingertips), rotated by `tilt`, then placed in mirrored display space
//! and flipped back into image space, so [`classify`](crate::classify)
//! recovers `center` and `tilt` exactly.

use crate::hand::{GestureState, Position};
use crate::landmarks::{indices::*, HandLandmarks, Landmark, FINGERS, LANDMARK_COUNT};

/// Knuckle positions in the local frame, index → pinky.
const MCP_LOCAL: [(f32, f32); 4] = [(-0.35, 0.95), (0.0, 1.0), (0.3, 0.95), (0.55, 0.85)];

/// Splay of each extended finger from straight up, radians.
const SPLAY: [f32; 4] = [-0.15, 0.0, 0.12, 0.25];

/// Segment lengths MCP→PIP, PIP→DIP, DIP→TIP.
const SEGMENTS: [f32; 3] = [0.45, 0.28, 0.22];

/// Build landmarks for `gesture` with the palm centered on `center` (display
/// space, mirrored), rotated by `tilt` radians, `size` = palm length in
/// normalized image units.
pub fn synthesize(gesture: GestureState, center: Position, tilt: f32, size: f32) -> HandLandmarks {
    let local = local_pose(gesture);

    let n = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];
    let (pu, pv) = n.iter().fold((0.0, 0.0), |(su, sv), &i| (su + local[i].0, sv + local[i].1));
    let (pu, pv) = (pu / n.len() as f32, pv / n.len() as f32);

    let (sin, cos) = tilt.sin_cos();
    let mut points = [Landmark::default(); LANDMARK_COUNT];
    for (i, &(u, v, z)) in local.iter().enumerate() {
        let (u, v) = (u - pu, v - pv);
        let ru = u * cos + v * sin;
        let rv = -u * sin + v * cos;
        let display_x = center.x + ru * size;
        let y = center.y - rv * size;
        points[i] = Landmark::new(1.0 - display_x, y, z * size);
    }
    HandLandmarks::new(points)
}

/// `(u, v, z)` per landmark in the local frame.
fn local_pose(gesture: GestureState) -> [(f32, f32, f32); LANDMARK_COUNT] {
    let mut p = [(0.0, 0.0, 0.0); LANDMARK_COUNT];

    p[THUMB_CMC] = (-0.25, 0.25, 0.0);
    p[THUMB_MCP] = (-0.5, 0.45, 0.0);
    p[THUMB_IP]  = (-0.65, 0.65, 0.0);

    let curled: [bool; 4] = match gesture {
        GestureState::Fist     => [true, true, true, true],
        GestureState::OpenHand => [false, false, false, false],
        GestureState::Pinch    => [false, false, false, false],
        GestureState::None     => [false, false, true, true],
    };

    for (f, &(mcp, pip, dip, tip)) in FINGERS.iter().enumerate() {
        let (mu, mv) = MCP_LOCAL[f];
        p[mcp] = (mu, mv, 0.0);
        if curled[f] {
            // folded back over the palm
            p[pip] = (mu, mv + 0.25, -0.15);
            p[dip] = (mu, mv + 0.1, -0.3);
            p[tip] = (mu, mv - 0.2, -0.25);
        } else {
            let scale = if f == 3 { 0.8 } else { 1.0 };
            let (du, dv) = (SPLAY[f].sin(), SPLAY[f].cos());
            let mut reach = 0.0;
            for (j, joint) in [pip, dip, tip].into_iter().enumerate() {
                reach += SEGMENTS[j] * scale;
                p[joint] = (mu + du * reach, mv + dv * reach, 0.0);
            }
        }
    }

    p[THUMB_TIP] = match gesture {
        GestureState::OpenHand => (-0.9, 0.8, 0.0),
        GestureState::Fist     => (0.05, 0.55, -0.2),
        GestureState::None     => (-0.3, 0.6, -0.1),
        GestureState::Pinch    => {
            // index curls forward to meet the thumb
            p[INDEX_PIP] = (-0.45, 1.3, -0.05);
            p[INDEX_DIP] = (-0.55, 1.4, -0.1);
            p[INDEX_TIP] = (-0.6, 1.35, -0.1);
            (-0.62, 1.3, -0.1)
        }
    };

    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_points_stay_in_frame() {
        for g in GestureState::ALL {
            let lm = synthesize(g, Position::new(0.5, 0.5), 0.3, 0.12);
            for p in lm.points {
                assert!((0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y), "{g}: {p:?}");
            }
        }
    }

    #[test]
    fn palm_length_matches_size() {
        let lm = synthesize(GestureState::OpenHand, Position::new(0.5, 0.5), 1.0, 0.1);
        let palm = lm.get(WRIST).distance_2d(&lm.get(MIDDLE_MCP));
        assert!((palm - 0.1).abs() < 1e-5);
    }

    #[test]
    fn upright_fingers_point_up_on_screen() {
        let lm = synthesize(GestureState::OpenHand, Position::new(0.5, 0.5), 0.0, 0.1);
        assert!(lm.get(MIDDLE_TIP).y < lm.get(WRIST).y);
    }
}
