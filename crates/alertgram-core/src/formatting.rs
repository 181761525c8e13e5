//! Formatting helpers exposed to templates as filters.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Human-readable binary size: `1536` -> `1.50 KiB`.
pub fn format_bytes(value: f64) -> String {
    const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

    let negative = value < 0.0;
    let mut v = value.abs();
    let mut unit = 0usize;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }

    let sign = if negative { "-" } else { "" };
    if unit == 0 {
        format!("{sign}{v} {}", UNITS[0])
    } else {
        format!("{sign}{v:.2} {}", UNITS[unit])
    }
}

/// Re-render an RFC 3339 timestamp in `tz` using a strftime `pattern`.
pub fn format_date(raw: &str, tz: Tz, pattern: &str) -> Result<String, String> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|e| format!("cannot parse {raw:?} as an RFC 3339 timestamp: {e}"))?;
    let local = parsed.with_timezone(&Utc).with_timezone(&tz);
    Ok(local.format(pattern).to_string())
}
