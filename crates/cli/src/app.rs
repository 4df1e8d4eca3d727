use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use shelf_core::{
    catalog::FixtureSource,
    collection::{self, StorageBackend},
    AppConfig, CatalogSource, CollectionStore, GameRecord, SearchOrchestrator, SearchOutcome,
    SearchState, SortOrder,
};
use tracing::{info, warn};

/// Command handlers shared by every subcommand.
pub struct ShelfApp<S> {
    source: S,
    fallback: Option<FixtureSource>,
    store: CollectionStore,
    orchestrator: SearchOrchestrator<S>,
}

impl<S: CatalogSource + Clone> ShelfApp<S> {
    pub fn new(config: &AppConfig, source: S, storage: Arc<dyn StorageBackend>) -> Self {
        let store = CollectionStore::open(storage, config.storage_key.clone());
        let orchestrator = SearchOrchestrator::from_config(source.clone(), config);
        Self {
            source,
            fallback: config.offline_fallback.then(FixtureSource::default),
            store,
            orchestrator,
        }
    }

    pub async fn search(&self, query: &str, out: &mut impl Write) -> Result<()> {
        let state = match self.orchestrator.search(query).await {
            SearchOutcome::Applied(state) => state,
            SearchOutcome::Discarded { sequence } => {
                warn!(sequence, "Search superseded");
                return Ok(());
            }
        };

        match state {
            SearchState::Idle | SearchState::Searching { .. } => {
                writeln!(out, "Enter a game name to search.")?;
            }
            SearchState::Success {
                results, degraded, ..
            } => {
                if degraded {
                    writeln!(out, "Catalog unreachable; showing offline games.")?;
                }
                for game in &results {
                    writeln!(out, "{}", self.result_line(game))?;
                }
            }
            SearchState::Empty { message, .. } | SearchState::Failed { message, .. } => {
                writeln!(out, "{message}")?;
            }
        }
        Ok(())
    }

    pub async fn add(&self, id: &str, out: &mut impl Write) -> Result<()> {
        let id = id.trim();
        if self.store.is_owned(id) {
            writeln!(out, "Already in your collection: {id}")?;
            return Ok(());
        }

        let game = self.lookup(id).await?;
        self.store.add(&game)?;
        writeln!(out, "Added {}", game.display_name())?;
        Ok(())
    }

    pub fn remove(&self, id: &str, out: &mut impl Write) -> Result<()> {
        let name = self.store.get(id).map(|game| game.display_name());
        if self.store.remove(id)? {
            writeln!(out, "Removed {}", name.unwrap_or_else(|| id.to_string()))?;
        } else {
            writeln!(out, "Not in your collection: {id}")?;
        }
        Ok(())
    }

    pub fn owned(&self, id: &str, out: &mut impl Write) -> Result<()> {
        let answer = if self.store.is_owned(id) { "yes" } else { "no" };
        writeln!(out, "{answer}")?;
        Ok(())
    }

    pub fn list(&self, order: SortOrder, out: &mut impl Write) -> Result<()> {
        let games = self.store.sorted(order);
        writeln!(out, "Your Collection ({})", games.len())?;
        if games.is_empty() {
            writeln!(out, "Your shelf is empty! Search for games to start building your collection.")?;
        }
        for game in &games {
            let added = game
                .added_at
                .map(|date| format!("  added {date}"))
                .unwrap_or_default();
            writeln!(out, "{:>8}  {}{}", game.id, game.display_name(), added)?;
        }
        Ok(())
    }

    pub fn import(&self, path: &Path, out: &mut impl Write) -> Result<()> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let games = collection::validate_import(&raw)?;
        let count = games.len();
        self.store.import(games)?;
        info!(path = %path.display(), count, "Imported collection file");
        writeln!(out, "Successfully imported {count} games!")?;
        Ok(())
    }

    pub fn export(&self, dir: &Path, out: &mut impl Write) -> Result<PathBuf> {
        let games = self.store.snapshot();
        let path = collection::write_export(dir, &games, Utc::now().date_naive())?;
        writeln!(out, "Exported {} games to {}", games.len(), path.display())?;
        Ok(path)
    }

    async fn lookup(&self, id: &str) -> Result<GameRecord> {
        let ids = [id.to_string()];
        let details = match self.source.get_details(&ids).await {
            Ok(details) => details,
            Err(err) => match &self.fallback {
                Some(fallback) => {
                    warn!(id, %err, "Catalog unavailable; looking up offline games");
                    fallback.get_details(&ids).await?
                }
                None => return Err(err.into()),
            },
        };
        details
            .into_iter()
            .find(|game| game.id == id)
            .ok_or_else(|| anyhow!("No game found with id {id}"))
    }

    fn result_line(&self, game: &GameRecord) -> String {
        let marker = if self.store.is_owned(&game.id) { "*" } else { " " };
        let rating = game.rating.as_deref().unwrap_or("N/A");
        format!(
            "{marker} {:>8}  {}  [{}-{} players, {}-{} min, rating {}]",
            game.id,
            game.display_name(),
            game.minplayers,
            game.maxplayers,
            game.minplaytime,
            game.maxplaytime,
            rating,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::{CatalogError, MemoryStorage};
    use tempfile::tempdir;

    fn app() -> ShelfApp<FixtureSource> {
        ShelfApp::new(
            &AppConfig::default(),
            FixtureSource::default(),
            Arc::new(MemoryStorage::new()),
        )
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[tokio::test]
    async fn search_add_and_mark_owned() -> Result<()> {
        let app = app();
        let mut out: Vec<u8> = Vec::new();
        app.add("169786", &mut out).await?;
        app.search("scythe", &mut out).await?;
        let text = output(out);
        assert!(text.contains("Added Scythe (2016)"));
        assert!(text.contains("*   169786  Scythe (2016)"));
        assert!(app.store.is_owned("169786"));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_id_is_an_error() {
        let app = app();
        let mut out: Vec<u8> = Vec::new();
        assert!(app.add("404", &mut out).await.is_err());
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn empty_search_reports_query() -> Result<()> {
        let app = app();
        let mut out: Vec<u8> = Vec::new();
        app.search("Terraforming Mars", &mut out).await?;
        assert!(output(out).contains("No games found for \"Terraforming Mars\""));
        Ok(())
    }

    #[tokio::test]
    async fn export_then_import_restores_collection() -> Result<()> {
        let dir = tempdir()?;
        let app = app();
        let mut out: Vec<u8> = Vec::new();
        app.add("174430", &mut out).await?;
        app.add("169786", &mut out).await?;
        let path = app.export(dir.path(), &mut out)?;
        let exported = app.store.snapshot();

        app.remove("174430", &mut out)?;
        app.remove("174430", &mut out)?;
        app.import(&path, &mut out)?;
        assert_eq!(app.store.snapshot(), exported);

        let text = output(out);
        assert!(text.contains("Removed Gloomhaven (2017)"));
        assert!(text.contains("Not in your collection: 174430"));
        assert!(text.contains("Successfully imported 2 games!"));
        Ok(())
    }

    #[test]
    fn invalid_import_keeps_collection() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"[{"id": "1"}]"#)?;

        let app = app();
        app.store.add(&GameRecord::partial("7", "Brass"))?;
        let err = app.import(&path, &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogError>(),
            Some(CatalogError::Validation(_))
        ));
        assert_eq!(app.store.len(), 1);
        Ok(())
    }

    #[test]
    fn list_sorts_by_name() -> Result<()> {
        let app = app();
        app.store.add(&GameRecord::partial("2", "brass"))?;
        app.store.add(&GameRecord::partial("1", "Azul"))?;
        let mut out: Vec<u8> = Vec::new();
        app.list(SortOrder::NameDesc, &mut out)?;
        let text = output(out);
        let brass = text.find("brass").unwrap();
        let azul = text.find("Azul").unwrap();
        assert!(brass < azul);
        assert!(text.starts_with("Your Collection (2)"));
        Ok(())
    }
}
