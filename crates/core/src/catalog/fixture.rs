use async_trait::async_trait;
use once_cell::sync::Lazy;

use super::CatalogSource;
use crate::{
    error::Result,
    models::{GameRecord, NOT_AVAILABLE},
};

static BUILTIN_GAMES: Lazy<Vec<GameRecord>> = Lazy::new(|| {
    vec![
        builtin(
            "174430",
            "Gloomhaven",
            "2017",
            ("1", "4"),
            ("60", "120"),
            "https://cf.geekdo-images.com/micro/img/da9h6q5n1foccN4-vfLm0CYvYmg=/fit-in/64x64/pic2437871.jpg",
        ),
        builtin(
            "169786",
            "Scythe",
            "2016",
            ("1", "5"),
            ("90", "115"),
            "https://cf.geekdo-images.com/micro/img/3cQgH9qJVqXNW_2mDacEToVRCkw=/fit-in/64x64/pic3163924.jpg",
        ),
    ]
});

fn builtin(
    id: &str,
    name: &str,
    year: &str,
    players: (&str, &str),
    playtime: (&str, &str),
    thumbnail: &str,
) -> GameRecord {
    let mut record = GameRecord::partial(id, name);
    record.yearpublished = year.to_string();
    record.minplayers = players.0.to_string();
    record.maxplayers = players.1.to_string();
    record.minplaytime = playtime.0.to_string();
    record.maxplaytime = playtime.1.to_string();
    record.thumbnail = Some(thumbnail.to_string());
    record
}

/// In-memory catalog used for offline mode.
///
/// Matching mimics the remote fuzzy search: a record matches when its name
/// contains any word of the query, so results still need local narrowing.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    games: Vec<GameRecord>,
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new(BUILTIN_GAMES.clone())
    }
}

impl FixtureSource {
    /// Serve the given records.
    pub fn new(games: Vec<GameRecord>) -> Self {
        Self { games }
    }

    /// Records served by this source.
    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    fn matching(&self, query: &str) -> Vec<GameRecord> {
        let words: Vec<String> = query
            .split_whitespace()
            .map(|word| word.to_lowercase())
            .collect();
        if words.is_empty() {
            return Vec::new();
        }
        self.games
            .iter()
            .filter(|game| {
                let name = game.name.to_lowercase();
                words.iter().any(|word| name.contains(word.as_str()))
            })
            .map(|game| {
                let mut hit = GameRecord::partial(game.id.clone(), game.name.clone());
                hit.yearpublished = game.yearpublished.clone();
                hit
            })
            .collect()
    }
}

#[async_trait]
impl CatalogSource for FixtureSource {
    async fn search(&self, query: &str) -> Result<Vec<GameRecord>> {
        Ok(self.matching(query))
    }

    async fn get_details(&self, ids: &[String]) -> Result<Vec<GameRecord>> {
        Ok(self
            .games
            .iter()
            .filter(|game| ids.contains(&game.id))
            .map(|game| {
                let mut record = game.clone();
                record.rating.get_or_insert_with(|| NOT_AVAILABLE.to_string());
                record.description.get_or_insert_with(String::new);
                record
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_overmatches_on_any_word() {
        let source = FixtureSource::default();
        let hits = source.search("scythe expansion").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "169786");
        assert!(hits[0].thumbnail.is_none());
        assert!(source.search("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn details_return_full_records() {
        let source = FixtureSource::default();
        let ids = vec!["174430".to_string(), "missing".to_string()];
        let details = source.get_details(&ids).await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].name, "Gloomhaven");
        assert_eq!(details[0].maxplaytime, "120");
        assert_eq!(details[0].rating.as_deref(), Some("N/A"));
        assert_eq!(details[0].description.as_deref(), Some(""));
        assert!(details[0].is_hydrated());
    }

    #[tokio::test]
    async fn details_keep_known_rating() {
        let mut azul = GameRecord::partial("230802", "Azul");
        azul.rating = Some("7.8".to_string());
        let source = FixtureSource::new(vec![azul]);
        let details = source.get_details(&["230802".to_string()]).await.unwrap();
        assert_eq!(details[0].rating.as_deref(), Some("7.8"));
    }
}
