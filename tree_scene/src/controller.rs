//! Scene controller: the single owner of formation, rotation speed and the
//! selected ornament.
//!
//! Events are applied in the order they arrive; the render loop reads a
//! [`SceneSnapshot`] afterwards.

use gesture_intent::{FrameEvents, Formation, SceneEvent};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

// ════════════════════════════════════════════════════════════════════════════
// OrnamentResolver — hit-test capability supplied by the render layer
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can map a screen position to an ornament.
///
/// Coordinates are normalized to 0.0–1.0 with a bottom-left origin.
pub trait OrnamentResolver {
    fn resolve_ornament_at(&self, screen_x: f32, screen_y: f32) -> Option<usize>;

    /// Total number of ornaments; the random fallback picks below this.
    fn ornament_count(&self) -> usize;
}

// ════════════════════════════════════════════════════════════════════════════
// SceneSnapshot
// ════════════════════════════════════════════════════════════════════════════

/// Read-only view handed to the render layer once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneSnapshot {
    pub formation:         Formation,
    pub rotation_speed:    f32,
    pub selected_ornament: Option<usize>,
}

// ════════════════════════════════════════════════════════════════════════════
// SceneController
// ════════════════════════════════════════════════════════════════════════════

pub struct SceneController<H, R = SmallRng> {
    formation:      Formation,
    rotation_speed: f32,
    selected:       Option<usize>,
    resolver:       H,
    rng:            R,
}

impl<H: OrnamentResolver> SceneController<H, SmallRng> {
    /// Controller with a seeded fallback RNG.
    pub fn new(resolver: H, initial: Formation, seed: u64) -> Self {
        SceneController::with_rng(resolver, initial, SmallRng::seed_from_u64(seed))
    }
}

impl<H: OrnamentResolver, R: Rng> SceneController<H, R> {
    pub fn with_rng(resolver: H, initial: Formation, rng: R) -> Self {
        SceneController {
            formation:      initial,
            rotation_speed: 0.0,
            selected:       None,
            resolver,
            rng,
        }
    }

    /// Apply every event derived from one frame, in delivery order.
    pub fn apply_frame(&mut self, events: FrameEvents) {
        for event in events.into_events() {
            self.apply(event);
        }
    }

    pub fn apply(&mut self, event: SceneEvent) {
        match event {
            SceneEvent::SetFormation(f) => self.set_formation(f),

            SceneEvent::SetRotationSpeed(v) => {
                self.rotation_speed = v;
            }

            SceneEvent::PinchStart { x, y } => {
                if self.formation != Formation::Chaos {
                    debug!(x, y, "pinch ignored while formed");
                    return;
                }
                self.selected = self.resolve(x, y);
                info!(selected = ?self.selected, "ornament selected");
            }

            SceneEvent::PinchEnd => {
                if self.selected.take().is_some() {
                    debug!("selection cleared by pinch end");
                }
            }
        }
    }

    fn set_formation(&mut self, f: Formation) {
        if f != self.formation {
            info!(formation = f.name(), "formation changed");
        }
        self.formation = f;
        if f == Formation::Formed {
            self.selected = None;
        }
    }

    fn resolve(&mut self, x: f32, y: f32) -> Option<usize> {
        if let Some(hit) = self.resolver.resolve_ornament_at(x, y) {
            return Some(hit);
        }
        let count = self.resolver.ornament_count();
        if count == 0 {
            return None;
        }
        let pick = self.rng.gen_range(0..count);
        debug!(x, y, pick, "hit-test missed; random ornament");
        Some(pick)
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            formation:         self.formation,
            rotation_speed:    self.rotation_speed,
            selected_ornament: self.selected,
        }
    }

    pub fn formation(&self)        -> Formation     { self.formation }
    pub fn rotation_speed(&self)   -> f32           { self.rotation_speed }
    pub fn selected(&self)         -> Option<usize> { self.selected }
    pub fn resolver(&self)         -> &H            { &self.resolver }
    pub fn resolver_mut(&mut self) -> &mut H        { &mut self.resolver }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_intent::PinchEdge;

    /// Resolver with one ornament under the left half of the screen.
    struct LeftHalf { count: usize }

    impl OrnamentResolver for LeftHalf {
        fn resolve_ornament_at(&self, x: f32, _y: f32) -> Option<usize> {
            if x < 0.5 { Some(3) } else { None }
        }
        fn ornament_count(&self) -> usize { self.count }
    }

    fn make(initial: Formation) -> SceneController<LeftHalf> {
        SceneController::new(LeftHalf { count: 10 }, initial, 42)
    }

    #[test]
    fn pinch_hit_selects_resolved_index() {
        let mut sc = make(Formation::Chaos);
        sc.apply(SceneEvent::PinchStart { x: 0.2, y: 0.5 });
        assert_eq!(sc.selected(), Some(3));
    }

    #[test]
    fn pinch_miss_falls_back_to_random() {
        let mut sc = make(Formation::Chaos);
        for _ in 0..50 {
            sc.apply(SceneEvent::PinchStart { x: 0.9, y: 0.5 });
            let idx = sc.selected().unwrap();
            assert!(idx < 10);
            sc.apply(SceneEvent::PinchEnd);
        }
    }

    #[test]
    fn pinch_miss_with_no_ornaments_selects_nothing() {
        let mut sc = SceneController::new(LeftHalf { count: 0 }, Formation::Chaos, 1);
        sc.apply(SceneEvent::PinchStart { x: 0.9, y: 0.5 });
        assert_eq!(sc.selected(), None);
    }

    #[test]
    fn pinch_ignored_when_formed() {
        let mut sc = make(Formation::Formed);
        sc.apply(SceneEvent::PinchStart { x: 0.2, y: 0.5 });
        assert_eq!(sc.selected(), None);
    }

    #[test]
    fn pinch_end_clears_selection() {
        let mut sc = make(Formation::Chaos);
        sc.apply(SceneEvent::PinchStart { x: 0.2, y: 0.5 });
        sc.apply(SceneEvent::PinchEnd);
        assert_eq!(sc.selected(), None);
    }

    #[test]
    fn forming_clears_selection_mid_pinch() {
        let mut sc = make(Formation::Chaos);
        sc.apply(SceneEvent::PinchStart { x: 0.2, y: 0.5 });
        sc.apply(SceneEvent::SetFormation(Formation::Formed));
        assert_eq!(sc.selected(), None);
        assert_eq!(sc.formation(), Formation::Formed);
    }

    #[test]
    fn chaos_keeps_selection() {
        let mut sc = make(Formation::Chaos);
        sc.apply(SceneEvent::PinchStart { x: 0.2, y: 0.5 });
        sc.apply(SceneEvent::SetFormation(Formation::Chaos));
        assert_eq!(sc.selected(), Some(3));
    }

    #[test]
    fn rotation_is_replaced_not_accumulated() {
        let mut sc = make(Formation::Formed);
        sc.apply(SceneEvent::SetRotationSpeed(0.05));
        sc.apply(SceneEvent::SetRotationSpeed(0.05));
        assert_eq!(sc.rotation_speed(), 0.05);
        sc.apply(SceneEvent::SetRotationSpeed(0.0));
        assert_eq!(sc.rotation_speed(), 0.0);
    }

    #[test]
    fn frame_applies_formation_before_pinch() {
        // Disperse and pinch in the same frame: the pinch sees CHAOS.
        let mut sc = make(Formation::Formed);
        sc.apply_frame(FrameEvents {
            formation:      Some(Formation::Chaos),
            rotation_speed: -0.02,
            pinch:          Some(PinchEdge::Start { x: 0.1, y: 0.1 }),
        });
        let snap = sc.snapshot();
        assert_eq!(snap.formation, Formation::Chaos);
        assert_eq!(snap.rotation_speed, -0.02);
        assert_eq!(snap.selected_ornament, Some(3));
    }

    #[test]
    fn same_seed_same_fallback() {
        let mut a = make(Formation::Chaos);
        let mut b = make(Formation::Chaos);
        for _ in 0..5 {
            a.apply(SceneEvent::PinchStart { x: 0.9, y: 0.9 });
            b.apply(SceneEvent::PinchStart { x: 0.9, y: 0.9 });
            assert_eq!(a.selected(), b.selected());
        }
    }
}
