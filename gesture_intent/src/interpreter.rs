//! The gesture interpreter: one [`LandmarkFrame`] in, one [`FrameEvents`] out.
//!
//! # Algorithm
//!
//! Each frame is examined in three independent passes:
//!
//! * **Formation**: a classified gesture above `formation_confidence` becomes
//!   the frame's current gesture.  `Open_Palm` disperses, `Closed_Fist`
//!   assembles, anything else changes nothing.
//! * **Rotation**: `(0.5 - wrist.x) * rotation_scale`, snapped to exactly
//!   zero inside `rotation_dead_zone`.  No hand means zero.
//! * **Pinch**: thumb-tip/index-tip distance below `pinch_threshold`, edge
//!   detected against the stored pinch state.  Suppressed while the current
//!   gesture is an open palm.  Losing the hand releases a held pinch.

use serde::Deserialize;
use tracing::debug;

use crate::{
    FrameEvents, Formation, GestureLabel, LandmarkFrame, PinchEdge, INDEX_TIP, THUMB_TIP, WRIST,
};

// ════════════════════════════════════════════════════════════════════════════
// InterpreterConfig
// ════════════════════════════════════════════════════════════════════════════

/// Thresholds for the interpreter.  Defaults are empirically tuned for a
/// webcam at arm's length.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpreterConfig {
    /// Classifier confidence that must be exceeded to act on a label.
    pub formation_confidence: f32,
    /// Rotation speed per unit of wrist offset from the image centre.
    pub rotation_scale:       f32,
    /// Speeds with magnitude at or below this are emitted as exactly 0.
    pub rotation_dead_zone:   f32,
    /// Thumb/index distance (normalized units) below which the hand pinches.
    pub pinch_threshold:      f32,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            formation_confidence: 0.4,
            rotation_scale:       0.15,
            rotation_dead_zone:   0.01,
            pinch_threshold:      0.08,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureInterpreter
// ════════════════════════════════════════════════════════════════════════════

/// Stateful frame-to-intent translator.
///
/// The only state carried between frames is whether the hand is pinching.
#[derive(Debug, Default)]
pub struct GestureInterpreter {
    config:      InterpreterConfig,
    is_pinching: bool,
}

impl GestureInterpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        GestureInterpreter { config, is_pinching: false }
    }

    pub fn is_pinching(&self) -> bool { self.is_pinching }

    /// Interpret one frame.
    pub fn interpret(&mut self, frame: &LandmarkFrame) -> FrameEvents {
        let current = frame
            .gesture
            .as_ref()
            .filter(|g| g.confidence > self.config.formation_confidence)
            .map(|g| &g.label);

        let formation = match current {
            Some(GestureLabel::OpenPalm)   => Some(Formation::Chaos),
            Some(GestureLabel::ClosedFist) => Some(Formation::Formed),
            _                              => None,
        };

        let rotation_speed = self.rotation_speed(frame);

        let open_palm = matches!(current, Some(GestureLabel::OpenPalm));
        let pinch = self.update_pinch(frame, open_palm);

        FrameEvents { formation, rotation_speed, pinch }
    }

    fn rotation_speed(&self, frame: &LandmarkFrame) -> f32 {
        let Some(hand) = frame.hand() else { return 0.0 };
        let speed = (0.5 - hand[WRIST].x) * self.config.rotation_scale;
        if speed.abs() <= self.config.rotation_dead_zone {
            0.0
        } else {
            speed
        }
    }

    fn update_pinch(&mut self, frame: &LandmarkFrame, open_palm: bool) -> Option<PinchEdge> {
        let Some(hand) = frame.hand() else {
            // Tracking lost: never leave a dangling pinch.
            if self.is_pinching {
                self.is_pinching = false;
                debug!("pinch released: hand lost");
                return Some(PinchEdge::End);
            }
            return None;
        };

        if open_palm {
            return None;
        }

        let thumb = &hand[THUMB_TIP];
        let index = &hand[INDEX_TIP];
        let pinching_now = thumb.distance(index) < self.config.pinch_threshold;

        match (self.is_pinching, pinching_now) {
            (false, true) => {
                self.is_pinching = true;
                let mid = thumb.midpoint(index);
                let (x, y) = (mid.x, 1.0 - mid.y);
                debug!(x, y, "pinch start");
                Some(PinchEdge::Start { x, y })
            }
            (true, false) => {
                self.is_pinching = false;
                debug!("pinch end");
                Some(PinchEdge::End)
            }
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassifiedGesture, Landmark, SceneEvent, HAND_LANDMARKS};

    /// A flat hand with the wrist at `wrist_x` and thumb/index tips
    /// `pinch_dist` apart, centred on (0.5, 0.4).
    fn hand(wrist_x: f32, pinch_dist: f32) -> Vec<Landmark> {
        let mut pts = vec![Landmark::new(0.5, 0.6, 0.0); HAND_LANDMARKS];
        pts[WRIST] = Landmark::new(wrist_x, 0.8, 0.0);
        pts[THUMB_TIP] = Landmark::new(0.5 - pinch_dist / 2.0, 0.4, 0.0);
        pts[INDEX_TIP] = Landmark::new(0.5 + pinch_dist / 2.0, 0.4, 0.0);
        pts
    }

    fn frame(wrist_x: f32, pinch_dist: f32, gesture: Option<(&str, f32)>) -> LandmarkFrame {
        LandmarkFrame::new(
            hand(wrist_x, pinch_dist),
            gesture.map(|(l, c)| ClassifiedGesture::new(GestureLabel::parse(l), c)),
        )
    }

    #[test]
    fn open_palm_disperses() {
        let mut it = GestureInterpreter::default();
        let ev = it.interpret(&frame(0.5, 0.3, Some(("Open_Palm", 0.9))));
        assert_eq!(ev.formation, Some(Formation::Chaos));
    }

    #[test]
    fn closed_fist_assembles() {
        let mut it = GestureInterpreter::default();
        let ev = it.interpret(&frame(0.5, 0.3, Some(("Closed_Fist", 0.41))));
        assert_eq!(ev.formation, Some(Formation::Formed));
    }

    #[test]
    fn low_confidence_never_changes_formation() {
        let mut it = GestureInterpreter::default();
        for label in ["Open_Palm", "Closed_Fist", "Victory"] {
            for conf in [0.0, 0.2, 0.4] {
                let ev = it.interpret(&frame(0.5, 0.3, Some((label, conf))));
                assert_eq!(ev.formation, None, "{} @ {}", label, conf);
            }
        }
    }

    #[test]
    fn other_label_changes_nothing() {
        let mut it = GestureInterpreter::default();
        let ev = it.interpret(&frame(0.5, 0.3, Some(("Thumb_Up", 0.99))));
        assert_eq!(ev.formation, None);
    }

    #[test]
    fn rotation_dead_zone_is_exactly_zero() {
        let mut it = GestureInterpreter::default();
        // |0.5 - 0.45| * 0.15 = 0.0075
        assert_eq!(it.interpret(&frame(0.45, 0.3, None)).rotation_speed, 0.0);
        // |0.5 - 0.55| * 0.15 = 0.0075
        assert_eq!(it.interpret(&frame(0.55, 0.3, None)).rotation_speed, 0.0);
    }

    #[test]
    fn rotation_outside_dead_zone_follows_formula() {
        let mut it = GestureInterpreter::default();
        let left = it.interpret(&frame(0.1, 0.3, None)).rotation_speed;
        assert!((left - 0.06).abs() < 1e-6);
        let right = it.interpret(&frame(0.9, 0.3, None)).rotation_speed;
        assert!((right + 0.06).abs() < 1e-6);
    }

    #[test]
    fn pinch_sequence_fires_each_edge_once() {
        let mut it = GestureInterpreter::default();
        let mut edges = Vec::new();
        for d in [0.20, 0.05, 0.05, 0.05, 0.20, 0.20] {
            if let Some(p) = it.interpret(&frame(0.5, d, None)).pinch {
                edges.push(p);
            }
        }
        assert_eq!(edges.len(), 2);
        assert!(matches!(edges[0], PinchEdge::Start { .. }));
        assert_eq!(edges[1], PinchEdge::End);
    }

    #[test]
    fn pinch_start_flips_vertical_axis() {
        let mut it = GestureInterpreter::default();
        let ev = it.interpret(&frame(0.5, 0.02, None));
        match ev.pinch {
            Some(PinchEdge::Start { x, y }) => {
                assert!((x - 0.5).abs() < 1e-6);
                assert!((y - 0.6).abs() < 1e-6);
            }
            other => panic!("expected PinchStart, got {:?}", other),
        }
    }

    #[test]
    fn open_palm_suppresses_pinch() {
        let mut it = GestureInterpreter::default();
        for _ in 0..5 {
            let ev = it.interpret(&frame(0.5, 0.01, Some(("Open_Palm", 0.95))));
            assert_eq!(ev.pinch, None);
        }
        assert!(!it.is_pinching());
    }

    #[test]
    fn hand_lost_mid_pinch_releases_once() {
        let mut it = GestureInterpreter::default();
        it.interpret(&frame(0.5, 0.02, None));
        assert!(it.is_pinching());
        let first = it.interpret(&LandmarkFrame::empty());
        assert_eq!(first.pinch, Some(PinchEdge::End));
        let second = it.interpret(&LandmarkFrame::empty());
        assert_eq!(second.pinch, None);
    }

    #[test]
    fn malformed_frame_counts_as_no_hand() {
        let mut it = GestureInterpreter::default();
        it.interpret(&frame(0.1, 0.02, None));
        let bad = LandmarkFrame::new(hand(0.1, 0.02)[..12].to_vec(), None);
        let ev = it.interpret(&bad);
        assert_eq!(ev.rotation_speed, 0.0);
        assert_eq!(ev.pinch, Some(PinchEdge::End));
    }

    #[test]
    fn empty_frame_is_idempotent() {
        let mut it = GestureInterpreter::default();
        for _ in 0..10 {
            let ev = it.interpret(&LandmarkFrame::empty());
            assert_eq!(ev.into_events(), vec![SceneEvent::SetRotationSpeed(0.0)]);
        }
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let mut it = GestureInterpreter::new(InterpreterConfig {
            pinch_threshold: 0.03,
            ..InterpreterConfig::default()
        });
        assert_eq!(it.interpret(&frame(0.5, 0.05, None)).pinch, None);
        assert!(it.interpret(&frame(0.5, 0.02, None)).pinch.is_some());
    }
}
