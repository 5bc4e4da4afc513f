//! Target placements for the two formations.
//!
//! Tree points spiral up a cone (y is up, base at y = 0); chaos points are
//! scattered uniformly through a sphere centred on the tree's middle.  Both
//! are derived from a seed so the same config always yields the same scene.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// Golden angle in radians; successive spiral points never line up.
const GOLDEN_ANGLE: f32 = 2.399_963;

// ════════════════════════════════════════════════════════════════════════════
// SceneConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Selectable ornaments hung on the tree.
    pub ornament_count: usize,
    /// Foliage particles.
    pub particle_count: usize,
    pub seed:           u64,
    pub tree_height:    f32,
    pub tree_radius:    f32,
    pub chaos_radius:   f32,
    /// Formation shown before any gesture arrives.
    pub initial_formation: gesture_intent::Formation,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            ornament_count:    48,
            particle_count:    1800,
            seed:              2024,
            tree_height:       6.0,
            tree_radius:       2.4,
            chaos_radius:      7.0,
            initial_formation: gesture_intent::Formation::Formed,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Placement
// ════════════════════════════════════════════════════════════════════════════

/// `n` points spiralling up a cone of the given height and base radius.
///
/// `surface` in 0.0–1.0 pushes points toward the cone's skin; ornaments use
/// 1.0 so they sit on the outside, foliage uses less so it fills the volume.
pub fn tree_points(n: usize, height: f32, radius: f32, surface: f32, rng: &mut impl Rng) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let t      = (i as f32 + 0.5) / n.max(1) as f32;
            let y      = t * height;
            let r_max  = radius * (1.0 - t);
            let depth  = surface + (1.0 - surface) * rng.gen::<f32>();
            let r      = r_max * depth;
            let theta  = i as f32 * GOLDEN_ANGLE + rng.gen_range(-0.15..0.15);
            Vec3::new(r * theta.cos(), y, r * theta.sin())
        })
        .collect()
}

/// `n` points uniform in a sphere of `radius` about `center`.
pub fn chaos_points(n: usize, center: Vec3, radius: f32, rng: &mut impl Rng) -> Vec<Vec3> {
    (0..n)
        .map(|_| loop {
            let p = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if p.length_squared() <= 1.0 {
                break center + p * radius;
            }
        })
        .collect()
}

/// Festive palette cycled over the ornaments (ARGB).
pub const ORNAMENT_PALETTE: [u32; 6] = [
    0xFFD42A2A, // red
    0xFFFFD700, // gold
    0xFFC0C0C0, // silver
    0xFF2A6FD4, // blue
    0xFFE07AD4, // pink
    0xFFFFFFFF, // white
];

/// Everything the render loop needs to build the arena and particle field.
pub struct SceneLayout {
    pub ornament_tree:  Vec<Vec3>,
    pub ornament_chaos: Vec<Vec3>,
    pub particle_tree:  Vec<Vec3>,
    pub particle_chaos: Vec<Vec3>,
}

impl SceneLayout {
    pub fn generate(cfg: &SceneConfig) -> Self {
        let mut rng = SmallRng::seed_from_u64(cfg.seed);
        let center = Vec3::new(0.0, cfg.tree_height * 0.5, 0.0);
        SceneLayout {
            ornament_tree:  tree_points(cfg.ornament_count, cfg.tree_height, cfg.tree_radius, 1.0, &mut rng),
            ornament_chaos: chaos_points(cfg.ornament_count, center, cfg.chaos_radius, &mut rng),
            particle_tree:  tree_points(cfg.particle_count, cfg.tree_height, cfg.tree_radius, 0.35, &mut rng),
            particle_chaos: chaos_points(cfg.particle_count, center, cfg.chaos_radius, &mut rng),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
