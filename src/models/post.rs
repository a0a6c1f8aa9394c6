use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// A showcased post as returned by the remote backend.
///
/// Decoding is deliberately lenient at this boundary: the backend predates
/// this service and has shipped several shapes of the same record. Malformed
/// reaction counts decode as 0, empty-string URLs normalize to `None`, and
/// timestamps are accepted with or without a UTC offset.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", alias = "custom_link")]
    pub post_url: Option<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default, deserialize_with = "lenient_reactions")]
    pub reactions: BTreeMap<String, u64>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn lenient_reactions<'de, D>(deserializer: D) -> Result<BTreeMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(reactions_from_value).unwrap_or_default())
}

fn reactions_from_value(value: serde_json::Value) -> BTreeMap<String, u64> {
    let object = match value {
        serde_json::Value::Object(map) => map,
        // Some backend revisions store the mapping as an embedded JSON string.
        serde_json::Value::String(raw) => match serde_json::from_str(&raw) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => return BTreeMap::new(),
        },
        _ => return BTreeMap::new(),
    };

    object
        .into_iter()
        .map(|(emoji, count)| (emoji, count.as_u64().unwrap_or(0)))
        .collect()
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    // The backend emits bare `isoformat()` timestamps with no offset.
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
