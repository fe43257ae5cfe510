//! Display formatting for API values: ISO-8601 durations and decimal-string
//! counts.

use regex::Regex;
use std::sync::OnceLock;

use crate::positions::format_time;

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("duration pattern must compile")
    })
}

/// Parse an ISO-8601 `PT#H#M#S` duration into whole seconds.
pub fn parse_iso8601_duration(duration: &str) -> Option<u64> {
    let captures = duration_pattern().captures(duration)?;

    let component = |index: usize| {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
    };

    let hours = component(1);
    let minutes = component(2);
    let seconds = component(3);
    if hours.is_none() && minutes.is_none() && seconds.is_none() {
        return None;
    }

    Some(hours.unwrap_or(0) * 3600 + minutes.unwrap_or(0) * 60 + seconds.unwrap_or(0))
}

/// `PT4M13S` -> `4:13`. Unparseable input formats as `0:00`.
pub fn format_duration(duration: &str) -> String {
    format_time(parse_iso8601_duration(duration).unwrap_or(0) as f64)
}

/// `"1234567"` -> `"1.2M views"`. Non-numeric input passes through.
pub fn format_view_count(raw: &str) -> String {
    match raw.parse::<u64>() {
        Ok(count) => format_count(count, "views"),
        Err(_) => raw.to_string(),
    }
}

/// `"52400"` -> `"52.4K subscribers"`. Non-numeric input passes through.
pub fn format_subscriber_count(raw: &str) -> String {
    match raw.parse::<u64>() {
        Ok(count) => format_count(count, "subscribers"),
        Err(_) => raw.to_string(),
    }
}

fn format_count(count: u64, noun: &str) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M {}", count as f64 / 1_000_000.0, noun)
    } else if count >= 1_000 {
        format!("{:.1}K {}", count as f64 / 1_000.0, noun)
    } else {
        format!("{} {}", count, noun)
    }
}
