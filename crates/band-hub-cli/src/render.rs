//! Text rendering for terminal output.

use time::OffsetDateTime;
use time::macros::format_description;

const USER_COLORS: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#FFD93D", "#6BCB77", "#95E1D3", "#F38181", "#AA96DA", "#FCBAD3",
    "#FDA7DF", "#A8D8EA",
];

/// Stable per-member color, matching the web client's palette assignment.
pub fn user_color(email: &str) -> &'static str {
    if email.is_empty() {
        return USER_COLORS[0];
    }
    let mut hash = 0f64;
    for unit in email.encode_utf16() {
        let shifted = to_int32(hash).wrapping_shl(5) as f64;
        hash = unit as f64 + (shifted - hash);
    }
    USER_COLORS[(hash.abs() % USER_COLORS.len() as f64) as usize]
}

fn to_int32(value: f64) -> i32 {
    value.trunc() as i64 as i32
}

/// `"Alex Rivera"` -> `"AR"`, `"sam"` -> `"S"`, `""` -> `"?"`.
pub fn user_initials(name: &str) -> String {
    let mut parts = name.split_whitespace();
    let initial = |part: &str| part.chars().next().map(|c| c.to_uppercase().to_string());
    match (parts.next(), parts.next()) {
        (Some(first), Some(second)) => {
            format!("{}{}", initial(first).unwrap_or_default(), initial(second).unwrap_or_default())
        }
        (Some(only), None) => initial(only).unwrap_or_else(|| "?".to_string()),
        _ => "?".to_string(),
    }
}

/// Relative age of a comment: `Just now`, `5m ago`, `3h ago`, `2d ago`, else a date.
pub fn format_comment_date(timestamp_ms: i64, now_ms: i64) -> String {
    let diff_ms = now_ms - timestamp_ms;
    let mins = diff_ms.div_euclid(60_000);
    let hours = diff_ms.div_euclid(3_600_000);
    let days = diff_ms.div_euclid(86_400_000);
    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        format!("{mins}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        format_timestamp(timestamp_ms)
    }
}

/// `YYYY-MM-DD HH:MM` in UTC.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(timestamp_ms as i128 * 1_000_000)
        .ok()
        .and_then(|at| {
            at.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
                .ok()
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let value = bytes as f64;
    if value >= MB {
        format!("{:.1} MB", value / MB)
    } else if value >= KB {
        format!("{:.0} KB", value / KB)
    } else {
        format!("{bytes} B")
    }
}
