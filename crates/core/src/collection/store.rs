use std::{cmp::Ordering, collections::HashSet, fmt, str::FromStr, sync::Arc};

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use tracing::{error, info, warn};

use super::storage::StorageBackend;
use crate::{
    error::{CatalogError, Result},
    models::GameRecord,
};

/// Display order for the collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// A to Z by name.
    #[default]
    NameAsc,
    /// Z to A by name.
    NameDesc,
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "name-asc" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            other => Err(CatalogError::Validation(format!(
                "unknown sort order {other:?}"
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
        })
    }
}

/// Case-folded name comparison, falling back to the raw names for ties.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort records in place for display.
pub fn sort_records(records: &mut [GameRecord], order: SortOrder) {
    records.sort_by(|a, b| {
        let ordering = compare_names(&a.name, &b.name);
        match order {
            SortOrder::NameAsc => ordering,
            SortOrder::NameDesc => ordering.reverse(),
        }
    });
}

/// Persisted, de-duplicated set of owned games.
///
/// Every mutation is written to the backend before it becomes visible in
/// memory, and the write lock is held across both steps.
pub struct CollectionStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
    games: RwLock<Vec<GameRecord>>,
    clock: fn() -> NaiveDate,
}

impl CollectionStore {
    /// Open the collection stored under `key`, starting empty when the
    /// stored value is missing or unreadable.
    pub fn open(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        let key = key.into();
        let games = hydrate(backend.as_ref(), &key);
        info!(key = %key, count = games.len(), "Collection loaded");
        Self {
            backend,
            key,
            games: RwLock::new(games),
            clock: today,
        }
    }

    /// Replace the date source used for `addedAt` stamps.
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    /// Storage key the collection is persisted under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Add a game unless one with the same id is already owned.
    ///
    /// Returns `true` when the collection changed.
    pub fn add(&self, game: &GameRecord) -> Result<bool> {
        let mut games = self.games.write();
        if games.iter().any(|owned| owned.id == game.id) {
            return Ok(false);
        }

        let mut entry = game.clone();
        entry.added_at = Some((self.clock)());
        let mut next = games.clone();
        next.push(entry);
        self.persist(&next)?;
        *games = next;
        info!(id = %game.id, name = %game.name, "Game added to collection");
        Ok(true)
    }

    /// Remove the game with `id`, if owned.
    ///
    /// Returns `true` when the collection changed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut games = self.games.write();
        if !games.iter().any(|owned| owned.id == id) {
            return Ok(false);
        }

        let next: Vec<GameRecord> = games
            .iter()
            .filter(|owned| owned.id != id)
            .cloned()
            .collect();
        self.persist(&next)?;
        *games = next;
        info!(id, "Game removed from collection");
        Ok(true)
    }

    /// Replace the whole collection.
    ///
    /// Callers validate the payload first; only repeated ids are dropped here,
    /// keeping the first occurrence.
    pub fn import(&self, records: Vec<GameRecord>) -> Result<()> {
        let mut games = self.games.write();
        let total = records.len();
        let next = dedupe(records);
        if next.len() != total {
            warn!(
                dropped = total - next.len(),
                "Import contained repeated ids; kept first occurrences"
            );
        }
        self.persist(&next)?;
        *games = next;
        info!(count = games.len(), "Collection imported");
        Ok(())
    }

    /// Whether a game with `id` is owned.
    pub fn is_owned(&self, id: &str) -> bool {
        self.games.read().iter().any(|owned| owned.id == id)
    }

    /// Owned game with `id`.
    pub fn get(&self, id: &str) -> Option<GameRecord> {
        self.games.read().iter().find(|owned| owned.id == id).cloned()
    }

    /// Owned games in insertion order.
    pub fn snapshot(&self) -> Vec<GameRecord> {
        self.games.read().clone()
    }

    /// Owned games in display order.
    pub fn sorted(&self, order: SortOrder) -> Vec<GameRecord> {
        let mut games = self.snapshot();
        sort_records(&mut games, order);
        games
    }

    /// Number of owned games.
    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    /// Whether nothing is owned.
    pub fn is_empty(&self) -> bool {
        self.games.read().is_empty()
    }

    fn persist(&self, games: &[GameRecord]) -> Result<()> {
        let serialized = serde_json::to_string(games)
            .map_err(|err| CatalogError::Storage(format!("failed to serialize collection: {err}")))?;
        self.backend.save(&self.key, &serialized).map_err(|err| {
            error!(key = %self.key, %err, "Failed to persist collection");
            err
        })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn hydrate(backend: &dyn StorageBackend, key: &str) -> Vec<GameRecord> {
    let raw = match backend.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            error!(key, %err, "Failed to read stored collection; starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<GameRecord>>(&raw) {
        Ok(games) => dedupe(games),
        Err(err) => {
            warn!(key, %err, "Stored collection is corrupt; starting empty");
            Vec::new()
        }
    }
}

fn dedupe(records: Vec<GameRecord>) -> Vec<GameRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.id.clone()))
        .collect()
}
