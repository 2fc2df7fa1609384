//! Analysis result types and the projection into rendered spans.
//!
//! The wire types mirror the tone-analysis service's JSON response. The
//! projector turns one response into everything the renderers need: the
//! overall document tone, one colored span per sentence, and the legend.

use serde::{Deserialize, Serialize};

use crate::tone::{color_for_tone, Rgba, LEGEND_ORDER};

pub const UNKNOWN_TONE_ID: &str = "unknown";
pub const UNKNOWN_TONE_NAME: &str = "Unknown";

// -- Wire types --------------------------------------------------------------

/// A single tone with its confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub score: f64,
    pub tone_id: String,
    pub tone_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentTone {
    #[serde(default)]
    pub tones: Vec<Tone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceResult {
    pub sentence_id: i64,
    pub text: String,
    #[serde(default)]
    pub tones: Vec<Tone>,
}

/// Response body of the tone endpoint.
///
/// `sentences_tone` is absent when the input is a single sentence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub document_tone: DocumentTone,
    #[serde(default)]
    pub sentences_tone: Vec<SentenceResult>,
}

// -- Derived types -----------------------------------------------------------

/// One sentence, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSpan {
    pub text: String,
    pub tone_id: String,
    pub tone_name: String,
    pub score: f64,
    pub color: Rgba,
}

impl RenderedSpan {
    /// Hover text, e.g. `"Anger 50 %"`.
    pub fn tooltip(&self) -> String {
        format!("{} {} %", self.tone_name, self.score * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub tone_id: &'static str,
    pub color: Rgba,
}

/// Everything rendered for a single analysis response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub overall_tone: String,
    pub spans: Vec<RenderedSpan>,
    pub legend: Vec<LegendEntry>,
}

// -- Projector ---------------------------------------------------------------

/// Name of the first document-level tone, or `""` when there is none.
pub fn overall_tone(result: Option<&AnalysisResult>) -> String {
    result
        .and_then(|r| r.document_tone.tones.first())
        .map(|t| t.tone_name.clone())
        .unwrap_or_default()
}

/// Project one sentence. The first tone in the service's ordering is the
/// dominant one; it is not re-ranked by score.
pub fn project_sentence(sentence: &SentenceResult) -> RenderedSpan {
    let (tone_id, tone_name, score) = match sentence.tones.first() {
        Some(t) => (t.tone_id.clone(), t.tone_name.clone(), t.score),
        None => (UNKNOWN_TONE_ID.to_string(), UNKNOWN_TONE_NAME.to_string(), 1.0),
    };
    let color = color_for_tone(&tone_id, score);
    RenderedSpan {
        text: sentence.text.clone(),
        tone_id,
        tone_name,
        score,
        color,
    }
}

/// One span per sentence, in input order. `None` means nothing to render.
pub fn project_sentences(result: Option<&AnalysisResult>) -> Vec<RenderedSpan> {
    result
        .map(|r| r.sentences_tone.iter().map(project_sentence).collect())
        .unwrap_or_default()
}

/// The static legend: every known tone at full opacity.
pub fn legend() -> Vec<LegendEntry> {
    LEGEND_ORDER
        .iter()
        .map(|tone| LegendEntry {
            tone_id: tone.as_str(),
            color: color_for_tone(tone.as_str(), 1.0),
        })
        .collect()
}

pub fn project(result: Option<&AnalysisResult>) -> Projection {
    Projection {
        overall_tone: overall_tone(result),
        spans: project_sentences(result),
        legend: legend(),
    }
}
