//! Tone identifiers and the tone-to-color mapping.

use serde::{Serialize, Serializer};
use std::fmt;

/// The seven tone categories the analysis service reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToneId {
    Anger,
    Fear,
    Joy,
    Sadness,
    Analytical,
    Confident,
    Tentative,
}

/// Legend order. Also the order the tones are documented in.
pub const LEGEND_ORDER: [ToneId; 7] = [
    ToneId::Anger,
    ToneId::Fear,
    ToneId::Joy,
    ToneId::Sadness,
    ToneId::Analytical,
    ToneId::Confident,
    ToneId::Tentative,
];

/// Color used for any identifier outside the known set.
pub const UNKNOWN_COLOR: Rgba = Rgba { r: 255, g: 255, b: 255, a: 0.0 };

impl ToneId {
    /// Exact, case-sensitive match against the service's `tone_id` strings.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "anger" => Some(ToneId::Anger),
            "fear" => Some(ToneId::Fear),
            "joy" => Some(ToneId::Joy),
            "sadness" => Some(ToneId::Sadness),
            "analytical" => Some(ToneId::Analytical),
            "confident" => Some(ToneId::Confident),
            "tentative" => Some(ToneId::Tentative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneId::Anger => "anger",
            ToneId::Fear => "fear",
            ToneId::Joy => "joy",
            ToneId::Sadness => "sadness",
            ToneId::Analytical => "analytical",
            ToneId::Confident => "confident",
            ToneId::Tentative => "tentative",
        }
    }

    pub fn base_rgb(&self) -> (u8, u8, u8) {
        match self {
            ToneId::Anger => (245, 66, 66),
            ToneId::Fear => (255, 225, 0),
            ToneId::Joy => (60, 255, 0),
            ToneId::Sadness => (77, 77, 77),
            ToneId::Analytical => (0, 255, 251),
            ToneId::Confident => (8, 0, 255),
            ToneId::Tentative => (158, 255, 223),
        }
    }
}

impl fmt::Display for ToneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A translucent color. Alpha is carried as given, not clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

// Serialized as the CSS string so the web page can use it directly.
impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Map a tone identifier and confidence score to a color.
///
/// Known tones get their fixed base RGB with `alpha = score`. Every other
/// identifier maps to [`UNKNOWN_COLOR`] (fully transparent white), whatever
/// the score.
pub fn color_for_tone(tone_id: &str, score: f64) -> Rgba {
    match ToneId::from_id(tone_id) {
        Some(tone) => {
            let (r, g, b) = tone.base_rgb();
            Rgba { r, g, b, a: score }
        }
        None => UNKNOWN_COLOR,
    }
}
