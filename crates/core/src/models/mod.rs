//! Shared domain models.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder for an unknown publication year or rating.
pub const NOT_AVAILABLE: &str = "N/A";
/// Placeholder for a missing game name.
pub const UNKNOWN_NAME: &str = "Unknown";
/// Default player count when the source omits one.
pub const DEFAULT_PLAYERS: &str = "1";
/// Default play time when the source omits one.
pub const DEFAULT_PLAYTIME: &str = "0";

/// A board game as stored in the collection or shown in search results.
///
/// Search hits only carry `id`, `name` and `yearpublished`; hydration fills in
/// the remaining fields. Numeric values stay strings because the remote
/// catalog reports them that way and the collection file round-trips them
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Identifier assigned by the remote catalog.
    pub id: String,
    /// Display title.
    pub name: String,
    /// Year of first publication, `N/A` when unknown.
    #[serde(default = "not_available", deserialize_with = "lenient_year")]
    pub yearpublished: String,
    /// Minimum number of players.
    #[serde(default = "default_players", deserialize_with = "lenient_players")]
    pub minplayers: String,
    /// Maximum number of players.
    #[serde(default = "default_players", deserialize_with = "lenient_players")]
    pub maxplayers: String,
    /// Minimum play time in minutes.
    #[serde(default = "default_playtime", deserialize_with = "lenient_playtime")]
    pub minplaytime: String,
    /// Maximum play time in minutes.
    #[serde(default = "default_playtime", deserialize_with = "lenient_playtime")]
    pub maxplaytime: String,
    /// Small cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Full-size cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Long-form description, present after hydration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Average community rating, present after hydration.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_string"
    )]
    pub rating: Option<String>,
    /// Category tags in source order.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Mechanic tags in source order.
    #[serde(default)]
    pub mechanics: Vec<String>,
    /// Day the record entered the collection.
    #[serde(
        default,
        rename = "addedAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub added_at: Option<NaiveDate>,
}

impl GameRecord {
    /// Build a bare search hit with every optional field at its default.
    pub fn partial(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            yearpublished: not_available(),
            minplayers: default_players(),
            maxplayers: default_players(),
            minplaytime: default_playtime(),
            maxplaytime: default_playtime(),
            thumbnail: None,
            image: None,
            description: None,
            rating: None,
            categories: Vec::new(),
            mechanics: Vec::new(),
            added_at: None,
        }
    }

    /// Whether the record carries detail fields.
    pub fn is_hydrated(&self) -> bool {
        self.rating.is_some() || self.description.is_some()
    }

    /// Returns a user-facing label combining name and publication year.
    pub fn display_name(&self) -> String {
        if self.yearpublished == NOT_AVAILABLE {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.yearpublished)
        }
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn default_players() -> String {
    DEFAULT_PLAYERS.to_string()
}

fn default_playtime() -> String {
    DEFAULT_PLAYTIME.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::Text(text) => text,
            StringOrNumber::Number(number) => number.to_string(),
        }
    }
}

// Hand-edited collection files often carry `"minplayers": 2` or `null`.
fn lenient_or<'de, D>(deserializer: D, fallback: fn() -> String) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?
        .map(String::from)
        .unwrap_or_else(fallback))
}

fn lenient_year<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_or(deserializer, not_available)
}

fn lenient_players<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_or(deserializer, default_players)
}

fn lenient_playtime<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_or(deserializer, default_playtime)
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn missing_fields_take_sentinels() {
        let record: GameRecord =
            serde_json::from_value(json!({ "id": "13", "name": "Catan" })).unwrap();
        assert_eq!(record, GameRecord::partial("13", "Catan"));
        assert_eq!(record.yearpublished, "N/A");
        assert_eq!(record.minplayers, "1");
        assert_eq!(record.maxplaytime, "0");
        assert!(!record.is_hydrated());
    }

    #[test]
    fn numbers_are_accepted_as_strings() {
        let record: GameRecord = serde_json::from_value(json!({
            "id": "13",
            "name": "Catan",
            "yearpublished": 1995,
            "maxplayers": 4,
            "rating": 7.1
        }))
        .unwrap();
        assert_eq!(record.yearpublished, "1995");
        assert_eq!(record.maxplayers, "4");
        assert_eq!(record.rating.as_deref(), Some("7.1"));
    }

    #[test]
    fn null_numbers_take_sentinels() {
        let record: GameRecord = serde_json::from_value(json!({
            "id": "13",
            "name": "Catan",
            "yearpublished": null,
            "minplayers": null,
            "maxplaytime": null,
            "rating": null
        }))
        .unwrap();
        assert_eq!(record, GameRecord::partial("13", "Catan"));
    }

    #[test]
    fn added_at_uses_camel_case_iso_date() {
        let mut record = GameRecord::partial("13", "Catan");
        record.added_at = NaiveDate::from_ymd_opt(2024, 3, 9);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["addedAt"], json!("2024-03-09"));
        assert!(value.get("thumbnail").is_none());
    }

    #[test]
    fn display_name_skips_unknown_year() {
        let mut record = GameRecord::partial("13", "Catan");
        assert_eq!(record.display_name(), "Catan");
        record.yearpublished = "1995".to_string();
        assert_eq!(record.display_name(), "Catan (1995)");
    }
}
