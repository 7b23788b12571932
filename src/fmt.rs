//! Shared formatting helpers for TUI widgets.
//!
//! Pure functions only: no ratatui styles, no layout. Functions that differ
//! between table columns and the summary panel take a [`FmtStyle`].

use std::time::Duration;

/// Compact (table columns) vs detail (summary panel) output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmtStyle {
    /// No spaces, short suffixes: `"1.5G"`, `"3m5s"`.
    Compact,
    /// Spaces, full suffixes: `"1.5 GiB"`, `"3m 5s"`.
    Detail,
}

/// Format byte count as human-readable size.
///
/// Compact: `"1.5G"`, `"100.3M"`, `"50.0K"`, `"512B"`
/// Detail:  `"1.5 GiB"`, `"100.3 MiB"`, `"50.0 KiB"`, `"512 B"`
///
/// Zero (unknown size) renders as `"-"` in compact style.
pub fn format_bytes(bytes: i64, style: FmtStyle) -> String {
    if bytes <= 0 && style == FmtStyle::Compact {
        return "-".to_string();
    }
    let bytes = bytes.max(0) as u64;
    let (t, g, m, k, b) = match style {
        FmtStyle::Compact => ("T", "G", "M", "K", "B"),
        FmtStyle::Detail => (" TiB", " GiB", " MiB", " KiB", " B"),
    };
    let f = bytes as f64;
    if bytes >= 1 << 40 {
        format!("{:.1}{}", f / (1u64 << 40) as f64, t)
    } else if bytes >= 1 << 30 {
        format!("{:.1}{}", f / (1u64 << 30) as f64, g)
    } else if bytes >= 1 << 20 {
        format!("{:.1}{}", f / (1u64 << 20) as f64, m)
    } else if bytes >= 1 << 10 {
        format!("{:.1}{}", f / 1024.0, k)
    } else {
        format!("{}{}", bytes, b)
    }
}

/// Format duration in seconds as human-readable.
///
/// Compact: `"3m5s"` (no spaces, `"-"` for negative)
/// Detail:  `"3m 5s"` (with spaces, `"0s"` for `<= 0`)
pub fn format_duration(secs: i64, style: FmtStyle) -> String {
    let sep = match style {
        FmtStyle::Compact => {
            if secs < 0 {
                return "-".to_string();
            }
            ""
        }
        FmtStyle::Detail => {
            if secs <= 0 {
                return "0s".to_string();
            }
            " "
        }
    };
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}{}s", secs / 60, sep, secs % 60)
    } else if secs < 86400 {
        format!("{}h{}{}m", secs / 3600, sep, (secs % 3600) / 60)
    } else {
        format!("{}d{}{}h", secs / 86400, sep, (secs % 86400) / 3600)
    }
}

/// Format a refresh interval: `"500ms"`, `"2s"`, `"2.5s"`.
pub fn format_interval(interval: Duration) -> String {
    let ms = interval.as_millis();
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

/// Format integer with K/M/G suffix (row counts).
pub fn format_count(v: i64) -> String {
    if v >= 1_000_000_000 {
        format!("{:.1}G", v as f64 / 1e9)
    } else if v >= 1_000_000 {
        format!("{:.1}M", v as f64 / 1e6)
    } else if v >= 10_000 {
        format!("{:.1}K", v as f64 / 1e3)
    } else {
        v.to_string()
    }
}

/// Truncate string to `max_chars` characters with a unicode ellipsis (`…`).
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Normalize query text for single-line display, collapsing whitespace runs.
pub fn normalize_query(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
