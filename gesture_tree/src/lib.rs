//! # gesture_tree
//!
//! Hand-gesture controlled particle Christmas tree with a software-rendered
//! window.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Open palm | Scatter foliage and ornaments into a sphere (CHAOS) |
//! | Closed fist | Gather them back into the tree (FORMED), dropping any selection |
//! | Wrist left / right of centre | Spin the tree; speed grows with the offset |
//! | Pinch (thumb + index) while scattered | Pop the ornament under the fingers |
//! | Release pinch, or hand leaves view | Let the ornament go |
//!
//! ## Landmark sources
//!
//! * `sim` (default) — **Simulation mode**: the mouse is the hand.
//! * `command` — an external recognizer process streaming JSON Lines.
//! * `replay` — a recorded JSON Lines file.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Hand pose |
//! |---|---|
//! | `O` / hold | Open palm |
//! | `F` / hold | Closed fist |
//! | `P` / hold | Pinch |
//! | `H` / hold | Hand out of view |
//!
//! ### Always available
//!
//! | Key | Action |
//! |---|---|
//! | `Space` | Toggle formation |
//! | `←` / `→` hold | Spin the tree |
//! | `Q` / `Escape` | Quit |

pub mod config;
pub mod source;
pub mod hit_test;
pub mod visualizer;
pub mod app;
