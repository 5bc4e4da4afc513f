//! Per-frame animation records.
//!
//! Ornaments live in a flat arena indexed by a stable [`OrnamentId`]; each
//! frame every record is replaced by [`step`]'s output.  Foliage particles
//! share one morph progress, so they are a [`ParticleField`] rather than
//! individual records.

use glam::Vec3;
use gesture_intent::Formation;

use crate::layout::{SceneLayout, ORNAMENT_PALETTE};

/// Approach rate toward formation targets (1/s).
const MORPH_RATE: f32 = 2.2;
/// Approach rate of the selection pop-up (1/s).
const POP_RATE:   f32 = 6.0;
/// Rate of the shared particle morph (progress/s).
const FIELD_RATE: f32 = 0.8;

// ════════════════════════════════════════════════════════════════════════════
// Ornament
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrnamentId(pub usize);

/// A single selectable ornament.
#[derive(Clone, Debug, PartialEq)]
pub struct Ornament {
    pub id:       OrnamentId,
    pub chaos:    Vec3,
    pub tree:     Vec3,
    /// Where the ornament is drawn this frame.
    pub position: Vec3,
    /// Selection pop-up, 0.0 (resting) to 1.0 (fully presented).
    pub pop:      f32,
    pub color:    u32,
}

impl Ornament {
    pub fn target(&self, formation: Formation) -> Vec3 {
        match formation {
            Formation::Chaos  => self.chaos,
            Formation::Formed => self.tree,
        }
    }
}

/// Advance one record by `dt` seconds toward `target`.
pub fn step(record: &Ornament, target: Vec3, selected: bool, dt: f32) -> Ornament {
    let k = 1.0 - (-MORPH_RATE * dt).exp();
    let mut position = record.position.lerp(target, k);
    if position.distance_squared(target) < 1e-6 {
        position = target;
    }

    let pop_goal = if selected { 1.0 } else { 0.0 };
    let kp = 1.0 - (-POP_RATE * dt).exp();
    let mut pop = record.pop + (pop_goal - record.pop) * kp;
    if (pop - pop_goal).abs() < 1e-3 {
        pop = pop_goal;
    }

    Ornament { position, pop, ..record.clone() }
}

// ════════════════════════════════════════════════════════════════════════════
// OrnamentArena
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct OrnamentArena {
    ornaments: Vec<Ornament>,
}

impl OrnamentArena {
    /// Build from paired placements, starting at the `initial` formation.
    pub fn new(tree: &[Vec3], chaos: &[Vec3], initial: Formation) -> Self {
        let ornaments = tree
            .iter()
            .zip(chaos)
            .enumerate()
            .map(|(i, (&t, &c))| {
                let position = match initial {
                    Formation::Chaos  => c,
                    Formation::Formed => t,
                };
                Ornament {
                    id: OrnamentId(i),
                    chaos: c,
                    tree: t,
                    position,
                    pop: 0.0,
                    color: ORNAMENT_PALETTE[i % ORNAMENT_PALETTE.len()],
                }
            })
            .collect();
        OrnamentArena { ornaments }
    }

    pub fn from_layout(layout: &SceneLayout, initial: Formation) -> Self {
        OrnamentArena::new(&layout.ornament_tree, &layout.ornament_chaos, initial)
    }

    pub fn len(&self) -> usize { self.ornaments.len() }
    pub fn is_empty(&self) -> bool { self.ornaments.is_empty() }

    pub fn get(&self, id: OrnamentId) -> Option<&Ornament> {
        self.ornaments.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ornament> {
        self.ornaments.iter()
    }

    /// Advance every record by one frame.
    pub fn tick(&mut self, formation: Formation, selected: Option<usize>, dt: f32) {
        for o in &mut self.ornaments {
            let target = o.target(formation);
            *o = step(o, target, selected == Some(o.id.0), dt);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleField — foliage sharing one morph progress
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct ParticleField {
    tree:     Vec<Vec3>,
    chaos:    Vec<Vec3>,
    /// 0.0 = fully dispersed, 1.0 = fully assembled.
    progress: f32,
}

impl ParticleField {
    pub fn new(tree: Vec<Vec3>, chaos: Vec<Vec3>, initial: Formation) -> Self {
        let progress = if initial == Formation::Formed { 1.0 } else { 0.0 };
        ParticleField { tree, chaos, progress }
    }

    pub fn from_layout(layout: &SceneLayout, initial: Formation) -> Self {
        ParticleField::new(layout.particle_tree.clone(), layout.particle_chaos.clone(), initial)
    }

    pub fn progress(&self) -> f32 { self.progress }

    pub fn tick(&mut self, formation: Formation, dt: f32) {
        let goal = if formation == Formation::Formed { 1.0 } else { 0.0 };
        let delta = FIELD_RATE * dt;
        self.progress = if self.progress < goal {
            (self.progress + delta).min(goal)
        } else {
            (self.progress - delta).max(goal)
        };
    }

    /// Current particle positions; eased so the morph starts and lands softly.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        let t = smoothstep(self.progress);
        self.chaos.iter().zip(&self.tree).map(move |(c, tr)| c.lerp(*tr, t))
    }

    pub fn len(&self) -> usize { self.tree.len() }
    pub fn is_empty(&self) -> bool { self.tree.is_empty() }
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> OrnamentArena {
        let tree  = [Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 2.0, 0.0)];
        let chaos = [Vec3::new(5.0, 5.0, 5.0), Vec3::new(-5.0, 0.0, 3.0)];
        OrnamentArena::new(&tree, &chaos, Formation::Formed)
    }

    #[test]
    fn ids_are_stable_indices() {
        let a = arena();
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(OrnamentId(1)).unwrap().tree, Vec3::new(1.0, 2.0, 0.0));
        assert!(a.get(OrnamentId(2)).is_none());
    }

    #[test]
    fn step_converges_to_target() {
        let a = arena();
        let mut o = a.get(OrnamentId(0)).unwrap().clone();
        for _ in 0..600 {
            o = step(&o, o.chaos, false, 1.0 / 60.0);
        }
        assert_eq!(o.position, o.chaos);
    }

    #[test]
    fn step_does_not_mutate_input() {
        let a = arena();
        let o = a.get(OrnamentId(0)).unwrap();
        let next = step(o, o.chaos, true, 0.1);
        assert_eq!(o.position, o.tree);
        assert!(next.pop > 0.0);
        assert_ne!(next.position, o.position);
    }

    #[test]
    fn only_selected_ornament_pops() {
        let mut a = arena();
        for _ in 0..120 {
            a.tick(Formation::Chaos, Some(1), 1.0 / 60.0);
        }
        assert_eq!(a.get(OrnamentId(1)).unwrap().pop, 1.0);
        assert_eq!(a.get(OrnamentId(0)).unwrap().pop, 0.0);

        for _ in 0..120 {
            a.tick(Formation::Chaos, None, 1.0 / 60.0);
        }
        assert_eq!(a.get(OrnamentId(1)).unwrap().pop, 0.0);
    }

    #[test]
    fn particle_field_morphs_both_ways() {
        let mut f = ParticleField::new(
            vec![Vec3::ZERO; 4],
            vec![Vec3::ONE; 4],
            Formation::Formed,
        );
        assert_eq!(f.progress(), 1.0);
        for _ in 0..200 { f.tick(Formation::Chaos, 1.0 / 60.0); }
        assert_eq!(f.progress(), 0.0);
        assert!(f.positions().all(|p| p == Vec3::ONE));
        for _ in 0..200 { f.tick(Formation::Formed, 1.0 / 60.0); }
        assert!(f.positions().all(|p| p == Vec3::ZERO));
    }
}
