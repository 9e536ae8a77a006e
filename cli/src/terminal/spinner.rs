use colored::*;
use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::terminal::colors;

const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

pub fn style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICK_STRINGS)
}

/// Shows a spinner with `message` for as long as `span` lives.
pub fn start(span: &Span, message: &str) {
    span.pb_set_style(&style());
    span.pb_set_message(&message.color(colors::TEXT_DEFAULT).to_string());
}

/// Progress callback for the audit pipeline, updating the spinner of `span`.
pub fn switch_progress(span: Span) -> Box<dyn Fn(usize, usize) + Send + Sync> {
    Box::new(move |done, total| {
        let msg = format!(
            "Audited {} of {} switches...",
            done.to_string().green().bold(),
            total
        );
        span.pb_set_message(&msg.color(colors::TEXT_DEFAULT).to_string());
    })
}
