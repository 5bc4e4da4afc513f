//! # tree_scene
//!
//! The state that gesture intents act on, and the plain-data records the
//! render loop animates from it.
//!
//! * [`controller`] — formation, rotation speed and ornament selection.
//! * [`arena`] — per-ornament animation records, advanced by a pure step.
//! * [`layout`] — seeded chaos-sphere and tree-cone placements.
//!
//! ```rust
//! use gesture_intent::{Formation, SceneEvent};
//! use tree_scene::{OrnamentResolver, SceneController};
//!
//! struct NothingThere;
//! impl OrnamentResolver for NothingThere {
//!     fn resolve_ornament_at(&self, _x: f32, _y: f32) -> Option<usize> { None }
//!     fn ornament_count(&self) -> usize { 12 }
//! }
//!
//! let mut scene = SceneController::new(NothingThere, Formation::Chaos, 7);
//! scene.apply(SceneEvent::PinchStart { x: 0.5, y: 0.5 });
//! assert!(scene.snapshot().selected_ornament.unwrap() < 12);
//! ```

pub mod arena;
pub mod controller;
pub mod layout;

pub use arena::{Ornament, OrnamentArena, OrnamentId, ParticleField};
pub use controller::{OrnamentResolver, SceneController, SceneSnapshot};
pub use layout::{SceneConfig, SceneLayout};
