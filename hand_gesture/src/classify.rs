//! Landmark geometry → gesture flags.
//!
//! All distances are divided by the palm scale (wrist → middle MCP), so the
//! thresholds hold whether the hand is near the camera or far from it.

use crate::hand::{HandData, Position};
use crate::landmarks::{indices::*, HandLandmarks, FINGERS};

/// Classification thresholds (empirically tuned).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifierConfig {
    /// A finger is extended when wrist→tip exceeds wrist→pip by this factor.
    pub extension_ratio:  f32,
    /// Thumb tip to index tip, in palm units, below which the hand pinches.
    pub pinch_ratio:      f32,
    /// Thumb tip to index MCP, in palm units, above which the thumb is out.
    pub thumb_open_ratio: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            extension_ratio:  1.1,
            pinch_ratio:      0.35,
            thumb_open_ratio: 0.4,
        }
    }
}

const MIN_PALM: f32 = 1e-4;

/// Classify one hand.
///
/// * fist: no finger extended
/// * open: all four fingers extended and the thumb held away from the palm
/// * pinch: thumb tip touching the index tip
///
/// `position` is the palm center with x mirrored, so moving the hand right
/// in front of the camera moves it right on screen.  `tilt` follows the same
/// mirrored convention.
pub fn classify(hand: &HandLandmarks, cfg: &ClassifierConfig) -> HandData {
    let wrist = hand.get(WRIST);
    let palm = wrist.distance_2d(&hand.get(MIDDLE_MCP)).max(MIN_PALM);

    let extended = FINGERS.map(|(_, pip, _, tip)| {
        wrist.distance_2d(&hand.get(tip)) > wrist.distance_2d(&hand.get(pip)) * cfg.extension_ratio
    });
    let extended_count = extended.iter().filter(|&&e| e).count();

    let thumb_tip = hand.get(THUMB_TIP);
    let thumb_out = thumb_tip.distance_2d(&hand.get(INDEX_MCP)) / palm > cfg.thumb_open_ratio;
    let pinch_gap = thumb_tip.distance_2d(&hand.get(INDEX_TIP)) / palm;

    let (cx, cy) = hand.palm_center();
    let mcp = hand.get(MIDDLE_MCP);
    let tilt = (wrist.x - mcp.x).atan2(wrist.y - mcp.y);

    let data = HandData {
        is_open:     extended_count == FINGERS.len() && thumb_out,
        is_fist:     extended_count == 0,
        is_pinching: pinch_gap < cfg.pinch_ratio,
        position:    Position::new(1.0 - cx, cy),
        tilt,
    };

    log::trace!(
        "classified hand: extended={} pinch_gap={:.2} open={} fist={} pinch={}",
        extended_count, pinch_gap, data.is_open, data.is_fist, data.is_pinching
    );

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::GestureState;
    use crate::pose::synthesize;

    fn classify_pose(g: GestureState) -> HandData {
        let lm = synthesize(g, Position::new(0.5, 0.5), 0.0, 0.12);
        classify(&lm, &ClassifierConfig::default())
    }

    #[test]
    fn fist_pose_is_only_fist() {
        let h = classify_pose(GestureState::Fist);
        assert!(h.is_fist);
        assert!(!h.is_open);
        assert!(!h.is_pinching);
    }

    #[test]
    fn open_pose_is_only_open() {
        let h = classify_pose(GestureState::OpenHand);
        assert!(h.is_open);
        assert!(!h.is_fist);
        assert!(!h.is_pinching);
    }

    #[test]
    fn pinch_pose_is_only_pinch() {
        let h = classify_pose(GestureState::Pinch);
        assert!(h.is_pinching);
        assert!(!h.is_fist);
        assert!(!h.is_open);
    }

    #[test]
    fn relaxed_pose_sets_no_flag() {
        let h = classify_pose(GestureState::None);
        assert_eq!(h.gesture(), GestureState::None);
    }

    #[test]
    fn scale_and_tilt_do_not_change_gesture() {
        let cfg = ClassifierConfig::default();
        for g in GestureState::ALL {
            for (size, tilt) in [(0.05, 0.0), (0.2, 0.0), (0.12, 0.6), (0.12, -0.6)] {
                let lm = synthesize(g, Position::new(0.4, 0.6), tilt, size);
                assert_eq!(classify(&lm, &cfg).gesture(), g, "{g} size={size} tilt={tilt}");
            }
        }
    }

    #[test]
    fn position_and_tilt_round_trip() {
        let lm = synthesize(GestureState::OpenHand, Position::new(0.3, 0.7), 0.4, 0.1);
        let h = classify(&lm, &ClassifierConfig::default());
        assert!((h.position.x - 0.3).abs() < 1e-4, "x = {}", h.position.x);
        assert!((h.position.y - 0.7).abs() < 1e-4, "y = {}", h.position.y);
        assert!((h.tilt - 0.4).abs() < 1e-4, "tilt = {}", h.tilt);
    }

    #[test]
    fn degenerate_hand_does_not_panic() {
        let lm = HandLandmarks::from_flat(&[0.5; 63]).unwrap();
        let h = classify(&lm, &ClassifierConfig::default());
        assert!(h.is_fist);
        assert!(h.tilt.is_finite());
    }
}
