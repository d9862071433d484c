use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use std::sync::LazyLock;

static UNCHECKED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^- \[ \]").unwrap());
static CHECKED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^- \[x\]").unwrap());

/// Rewrite markdown checkbox lines into their emoji rendering for chat.
///
/// Only applied to the chat view of a body; the issue itself keeps the raw
/// markdown.
pub fn checkboxes_to_emoji(body: &str) -> String {
    let body = UNCHECKED.replace_all(body, "- :large_green_square:");
    CHECKED.replace_all(&body, "- :white_check_mark:").into_owned()
}

/// The fixed UTC+9 zone all dates in this program live in.
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

/// Time of day in JST, `HH:MM:SS`. The date is discarded, so a UTC
/// timestamp late in the day rolls over into the next JST morning.
pub fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&jst()).format("%H:%M:%S").to_string()
}
