//! # tone-lens
//!
//! Sends free text to a remote tone-analysis service and renders the
//! per-sentence result as colored highlighting with a legend, either in the
//! terminal or in a small local web UI.
//!
//! The two pieces that do real work are pure functions:
//!
//! - [`tone::color_for_tone`] maps a tone identifier and confidence score to
//!   a translucent color.
//! - [`analysis::project`] turns an [`analysis::AnalysisResult`] into the
//!   overall tone, one [`analysis::RenderedSpan`] per sentence, and the legend.
//!
//! ```
//! use tone_lens::analysis::{project, AnalysisResult};
//!
//! let json = r#"{
//!   "document_tone": {"tones": [{"score": 0.8, "tone_id": "joy", "tone_name": "Joy"}]},
//!   "sentences_tone": [
//!     {"sentence_id": 0, "text": "What a day!", "tones": [{"score": 0.5, "tone_id": "anger", "tone_name": "Anger"}]}
//!   ]
//! }"#;
//! let result: AnalysisResult = serde_json::from_str(json).unwrap();
//! let p = project(Some(&result));
//! assert_eq!(p.overall_tone, "Joy");
//! assert_eq!(p.spans[0].color.to_string(), "rgba(245,66,66,0.5)");
//! ```

pub mod analysis;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod tone;
pub mod web;

pub use analysis::{project, AnalysisResult, Projection, RenderedSpan};
pub use config::Config;
pub use error::{Result, ToneLensError};
pub use tone::{color_for_tone, Rgba, ToneId};
