//! Formatting helpers shared by the context assembler, the change narration and the
//! analysis prompt.

use chrono::FixedOffset;

use crate::models::{CanonicalInstant, LabParameter, ParameterStatus};

/// Rendered in place of a missing measurement.
pub const MISSING: &str = "N/A";
/// Rendered in place of a missing or unparsable clock time.
pub const UNKNOWN_TIME: &str = "zaman bilinmiyor";

/// Render at most `cap` items, then a notice line when older items were left out.
///
/// The notice carries `items.len() - cap` and is emitted if and only if that count
/// is positive, so a reader can always tell the list was truncated.
pub fn render_bounded_list<T>(
    items: &[T],
    cap: usize,
    format_item: impl Fn(usize, &T) -> String,
    omitted_notice: impl Fn(usize) -> String,
) -> String {
    let mut lines: Vec<String> = items
        .iter()
        .take(cap)
        .enumerate()
        .map(|(idx, item)| format_item(idx, item))
        .collect();
    if items.len() > cap {
        lines.push(omitted_notice(items.len() - cap));
    }
    lines.join("\n")
}

/// `HH:MM` at the display offset.
pub fn clock_time(instant: CanonicalInstant, offset: FixedOffset) -> String {
    match instant.at() {
        Some(t) => t.with_timezone(&offset).format("%H:%M").to_string(),
        None => UNKNOWN_TIME.to_string(),
    }
}

/// `DD.MM HH:MM` at the display offset.
pub fn day_and_clock_time(instant: CanonicalInstant, offset: FixedOffset) -> String {
    match instant.at() {
        Some(t) => t.with_timezone(&offset).format("%d.%m %H:%M").to_string(),
        None => UNKNOWN_TIME.to_string(),
    }
}

pub fn number_or_missing(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| MISSING.to_string())
}

/// The value if it holds visible text, else `fallback`.
pub fn text_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}

/// Non-blank text, or `None`.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// `min-max`, or `N/A` unless both bounds are known.
pub fn reference_range(param: &LabParameter) -> String {
    match (param.ref_min, param.ref_max) {
        (Some(min), Some(max)) => format!("{min}-{max}"),
        _ => MISSING.to_string(),
    }
}

/// Marker used in the context listing.
pub fn status_marker(status: Option<ParameterStatus>) -> &'static str {
    match status {
        Some(ParameterStatus::Normal) => "✅",
        Some(ParameterStatus::Low) => "⬇️",
        Some(ParameterStatus::High) => "⬆️",
        Some(ParameterStatus::CriticalLow) => "🚨⬇️",
        Some(ParameterStatus::CriticalHigh) => "🚨⬆️",
        None => "•",
    }
}

/// Louder marker used when a value is narrated as newly arrived.
pub fn change_marker(status: Option<ParameterStatus>) -> &'static str {
    match status {
        Some(ParameterStatus::Low) => "⬇️🟡",
        Some(ParameterStatus::High) => "⬆️🔴",
        Some(ParameterStatus::CriticalLow) => "⬇️🚨",
        Some(ParameterStatus::CriticalHigh) => "⬆️🚨",
        other => status_marker(other),
    }
}

/// Label of a parameter: its display name, else its key. `None` if it has neither.
pub fn parameter_label(param: &LabParameter) -> Option<&str> {
    present(Some(param.name.as_str())).or_else(|| present(Some(param.key.as_str())))
}

/// `{value} {unit}` with the unit dropped when unknown.
pub fn value_with_unit(param: &LabParameter) -> String {
    let value = number_or_missing(param.value);
    match present(param.unit.as_deref()) {
        Some(unit) => format!("{value} {unit}"),
        None => value,
    }
}

/// A raw results blob as text. Strings are shown bare.
pub fn raw_results(value: &serde_json::Value, pretty: bool) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other if pretty => {
            serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
        }
        other => other.to_string(),
    }
}
