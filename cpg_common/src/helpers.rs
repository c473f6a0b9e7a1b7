use std::{str::FromStr, time::Duration};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse a whole number of seconds into a `Duration`. Zero and unparseable values are rejected.
pub fn parse_seconds(value: &str) -> Option<Duration> {
    u64::from_str(value.trim()).ok().filter(|s| *s > 0).map(Duration::from_secs)
}
