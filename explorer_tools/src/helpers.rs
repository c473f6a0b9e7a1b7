use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};

use crate::ExplorerError;

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

/// Explorers are inconsistent about numeric fields: Etherscan sends every number as a string, TronScan sends JSON
/// numbers. This accepts either.
pub fn number_or_string<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s.trim().parse::<T>().map_err(de::Error::custom),
        StringOrNumber::Number(n) => n.to_string().parse::<T>().map_err(de::Error::custom),
    }
}

/// Like [`number_or_string`], but keeps the value as text. Used for amounts, which must not be parsed as integers
/// because they may exceed 64 bits.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => Ok(s),
        StringOrNumber::Number(n) => Ok(n.to_string()),
    }
}

pub fn timestamp_from_millis(ms: i64) -> Result<DateTime<Utc>, ExplorerError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| ExplorerError::MalformedResponse(format!("Invalid millisecond timestamp: {ms}")))
}

pub fn timestamp_from_secs(secs: i64) -> Result<DateTime<Utc>, ExplorerError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| ExplorerError::MalformedResponse(format!("Invalid timestamp: {secs}")))
}
