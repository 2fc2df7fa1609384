//! Terminal rendering of a [`Projection`].
//!
//! Terminals have no alpha channel, so each translucent tone color is
//! composited over a black background before being emitted as a truecolor
//! escape.

use colored::*;

use crate::analysis::{legend, LegendEntry, Projection, RenderedSpan};
use crate::tone::Rgba;

/// Composite `color` over black. Alpha outside [0,1] is clamped here only.
pub fn blend_on_dark(color: Rgba) -> (u8, u8, u8) {
    let a = color.a.clamp(0.0, 1.0);
    let mix = |c: u8| (c as f64 * a).round() as u8;
    (mix(color.r), mix(color.g), mix(color.b))
}

/// Whether black text reads better than white on `(r, g, b)`.
pub fn prefers_dark_text((r, g, b): (u8, u8, u8)) -> bool {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64 > 128.0
}

/// Paint one sentence with its tone background. Transparent spans are left
/// unstyled.
pub fn paint_span(span: &RenderedSpan) -> String {
    if span.color.is_transparent() {
        return span.text.normal().to_string();
    }
    let (r, g, b) = blend_on_dark(span.color);
    let text = span.text.on_truecolor(r, g, b);
    if prefers_dark_text((r, g, b)) {
        text.black().to_string()
    } else {
        text.bright_white().to_string()
    }
}

fn paint_legend_entry(entry: &LegendEntry) -> String {
    let (r, g, b) = blend_on_dark(entry.color);
    format!("{} {}", "  ".on_truecolor(r, g, b), entry.tone_id.bold())
}

/// One line: a swatch and the name for every known tone.
pub fn render_legend() -> String {
    legend().iter().map(paint_legend_entry).collect::<Vec<_>>().join("  ")
}

pub fn render_overall(overall_tone: &str) -> String {
    format!("{} {}", "Overall tone:".bright_blue().bold(), overall_tone.bold())
}

/// Full document: overall tone, optional legend, then the highlighted text.
///
/// Sentences are joined with a single space. With `show_scores`, each span is
/// followed by its tone and confidence in dim brackets.
pub fn render_document(projection: &Projection, show_legend: bool, show_scores: bool) -> String {
    let mut out = String::new();
    out.push_str(&render_overall(&projection.overall_tone));
    out.push('\n');
    if show_legend {
        out.push_str(&render_legend());
        out.push('\n');
    }
    out.push('\n');

    let body: Vec<String> = projection
        .spans
        .iter()
        .map(|span| {
            if show_scores {
                format!("{} {}", paint_span(span), format!("[{}]", span.tooltip()).dimmed())
            } else {
                paint_span(span)
            }
        })
        .collect();
    out.push_str(&body.join(" "));
    out.push('\n');
    out
}
