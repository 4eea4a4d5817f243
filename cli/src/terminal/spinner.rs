use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

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

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICK_STRINGS)
}

/// A span that shows a spinner with `message` for as long as it is entered
/// or instruments a running future.
pub fn running(message: impl Into<String>) -> Span {
    let span = info_span!("task", indicatif.pb_show = true);
    span.pb_set_style(&spinner_style());
    span.pb_set_message(&message.into());
    span
}
