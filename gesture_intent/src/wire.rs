//! JSON shape of one recognizer result.
//!
//! ```json
//! { "landmarks": [{"x": 0.51, "y": 0.62, "z": -0.03}, …],
//!   "gestures":  [{"label": "Open_Palm", "score": 0.93}] }
//! ```
//!
//! Streams carry one object per line.  Both fields default to empty, so
//! `{}` is a valid "no hand" sample.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ClassifiedGesture, GestureLabel, Landmark, LandmarkFrame};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed recognizer sample: {0}")]
    Json(#[from] serde_json::Error),
    #[error("blank line")]
    Blank,
}

/// One classifier category as reported by the recognizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireGesture {
    #[serde(alias = "categoryName", alias = "category_name")]
    pub label: String,
    pub score: f32,
}

/// One recognizer result, exactly as it arrives on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizerSample {
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub gestures:  Vec<WireGesture>,
}

impl RecognizerSample {
    /// Convert into the interpreter's input.
    ///
    /// Categories arrive best-first, so only the first one is kept.
    pub fn into_frame(self) -> LandmarkFrame {
        let gesture = self
            .gestures
            .into_iter()
            .next()
            .map(|g| ClassifiedGesture::new(GestureLabel::parse(&g.label), g.score));
        LandmarkFrame::new(self.landmarks, gesture)
    }
}

impl From<&LandmarkFrame> for RecognizerSample {
    fn from(frame: &LandmarkFrame) -> Self {
        RecognizerSample {
            landmarks: frame.landmarks.clone(),
            gestures:  frame
                .gesture
                .iter()
                .map(|g| WireGesture { label: g.label.name().to_string(), score: g.confidence })
                .collect(),
        }
    }
}

/// Decode one line of a JSON Lines stream.
pub fn decode_line(line: &str) -> Result<RecognizerSample, WireError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(WireError::Blank);
    }
    Ok(serde_json::from_str(line)?)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
