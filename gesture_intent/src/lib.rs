//! # gesture_intent
//!
//! Converts the per-frame output of a hand-landmark recognizer into discrete
//! scene intents for the particle tree.
//!
//! ## Gesture → Intent mapping
//!
//! | Input | Condition | Intent |
//! |---|---|---|
//! | `Open_Palm` label | confidence > 0.4 | `SetFormation(Chaos)` — disperse |
//! | `Closed_Fist` label | confidence > 0.4 | `SetFormation(Formed)` — assemble |
//! | Wrist x offset from centre | every frame | `SetRotationSpeed(v)` (dead-zoned) |
//! | Thumb tip meets index tip | false → true edge | `PinchStart(x, y)` |
//! | Thumb tip leaves index tip | true → false edge | `PinchEnd` |
//!
//! ## Quick start
//!
//! ```rust
//! use gesture_intent::{GestureInterpreter, LandmarkFrame, SceneEvent};
//!
//! let mut interp = GestureInterpreter::default();
//! let events = interp.interpret(&LandmarkFrame::empty());
//! assert_eq!(events.into_events(), vec![SceneEvent::SetRotationSpeed(0.0)]);
//! ```

pub mod interpreter;
pub mod wire;

pub use interpreter::{GestureInterpreter, InterpreterConfig};
pub use wire::{decode_line, RecognizerSample, WireError, WireGesture};

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Hand landmark indices (21-point hand model)
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks in a well-formed hand.
pub const HAND_LANDMARKS: usize = 21;

pub const WRIST:     usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;

// ════════════════════════════════════════════════════════════════════════════
// Landmark / LandmarkFrame
// ════════════════════════════════════════════════════════════════════════════

/// One tracked point on the hand.
///
/// `x` and `y` are normalized to the camera image with a top-left origin;
/// `z` is depth relative to the wrist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Euclidean distance in all three axes.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn midpoint(&self, other: &Landmark) -> Landmark {
        Landmark {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
            z: (self.z + other.z) * 0.5,
        }
    }
}

/// Label assigned by the recognizer's gesture classifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GestureLabel {
    OpenPalm,
    ClosedFist,
    /// Any other category, kept by name for status display.
    Other(String),
}

impl GestureLabel {
    /// Parse the recognizer's category name.
    pub fn parse(name: &str) -> Self {
        match name {
            "Open_Palm"   => GestureLabel::OpenPalm,
            "Closed_Fist" => GestureLabel::ClosedFist,
            other         => GestureLabel::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            GestureLabel::OpenPalm   => "Open_Palm",
            GestureLabel::ClosedFist => "Closed_Fist",
            GestureLabel::Other(n)   => n,
        }
    }
}

/// The classifier's best guess for the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedGesture {
    pub label:      GestureLabel,
    /// 0.0–1.0.
    pub confidence: f32,
}

impl ClassifiedGesture {
    pub fn new(label: GestureLabel, confidence: f32) -> Self {
        ClassifiedGesture { label, confidence }
    }
}

/// Everything the recognizer reports for one camera frame.
///
/// An empty landmark list means no hand was tracked.  A list of any length
/// other than [`HAND_LANDMARKS`] is malformed and is treated the same way.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkFrame {
    pub landmarks: Vec<Landmark>,
    pub gesture:   Option<ClassifiedGesture>,
}

impl LandmarkFrame {
    /// A frame with no hand and no gesture.
    pub fn empty() -> Self {
        LandmarkFrame::default()
    }

    pub fn new(landmarks: Vec<Landmark>, gesture: Option<ClassifiedGesture>) -> Self {
        LandmarkFrame { landmarks, gesture }
    }

    /// The tracked hand, if the frame carries a well-formed one.
    pub fn hand(&self) -> Option<&[Landmark]> {
        if self.landmarks.len() == HAND_LANDMARKS {
            Some(&self.landmarks)
        } else {
            None
        }
    }

    pub fn has_hand(&self) -> bool {
        self.hand().is_some()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Formation / events
// ════════════════════════════════════════════════════════════════════════════

/// Global arrangement of the tree's elements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formation {
    /// Elements dispersed; ornaments can be picked.
    Chaos,
    /// Elements assembled into the tree.
    #[default]
    Formed,
}

impl Formation {
    pub fn name(&self) -> &'static str {
        match self {
            Formation::Chaos  => "CHAOS",
            Formation::Formed => "FORMED",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Formation::Chaos  => Formation::Formed,
            Formation::Formed => Formation::Chaos,
        }
    }
}

/// A pinch state transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PinchEdge {
    /// Pinch began at `(x, y)`: screen space, bottom-left origin, 0.0–1.0.
    Start { x: f32, y: f32 },
    End,
}

/// A single intent delivered to the scene controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SceneEvent {
    SetFormation(Formation),
    SetRotationSpeed(f32),
    PinchStart { x: f32, y: f32 },
    PinchEnd,
}

/// All intents derived from one frame.
///
/// Always carries a rotation speed; formation and pinch are present only when
/// the frame triggered them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameEvents {
    pub formation:      Option<Formation>,
    pub rotation_speed: f32,
    pub pinch:          Option<PinchEdge>,
}

impl FrameEvents {
    /// Flatten into delivery order: formation, rotation, pinch.
    pub fn into_events(self) -> Vec<SceneEvent> {
        let mut out = Vec::with_capacity(3);
        if let Some(f) = self.formation {
            out.push(SceneEvent::SetFormation(f));
        }
        out.push(SceneEvent::SetRotationSpeed(self.rotation_speed));
        match self.pinch {
            Some(PinchEdge::Start { x, y }) => out.push(SceneEvent::PinchStart { x, y }),
            Some(PinchEdge::End)            => out.push(SceneEvent::PinchEnd),
            None                            => {}
        }
        out
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
