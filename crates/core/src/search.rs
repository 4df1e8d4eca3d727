//! Two-phase search: name lookup, local narrowing and ranking, then detail
//! hydration of the best candidates.
//!
//! Each search takes a sequence number when it starts. Results are only
//! applied while that number is still the latest, so a slow response can
//! never overwrite the state of a search issued after it.

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::{
    catalog::{CatalogSource, FixtureSource},
    config::{AppConfig, DEFAULT_HYDRATION_LIMIT},
    error::Result,
    models::GameRecord,
};

/// Message shown when the catalog cannot be searched.
pub const SEARCH_FAILED: &str = "Failed to search games. Please try again.";
/// Message shown when hydration fails.
pub const DETAILS_FAILED: &str = "Failed to load game details.";

/// Visible state of the search flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchState {
    /// Nothing searched, or the last query was blank.
    #[default]
    Idle,
    /// A search for `query` is in flight.
    Searching {
        /// Trimmed query text.
        query: String,
    },
    /// Hydrated results for `query`.
    Success {
        /// Trimmed query text.
        query: String,
        /// Ranked, hydrated records.
        results: Vec<GameRecord>,
        /// Results came from the offline fixture set.
        degraded: bool,
    },
    /// Nothing matched `query`.
    Empty {
        /// Trimmed query text.
        query: String,
        /// User-facing message echoing the query.
        message: String,
    },
    /// A phase failed.
    Failed {
        /// Trimmed query text.
        query: String,
        /// User-facing message.
        message: String,
    },
}

impl SearchState {
    /// Records to render; empty for every state but `Success`.
    pub fn results(&self) -> &[GameRecord] {
        match self {
            Self::Success { results, .. } => results,
            _ => &[],
        }
    }

    /// User-facing message for `Empty` and `Failed`.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Empty { message, .. } | Self::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// What happened to a finished search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The search was still the latest; its final state is now visible.
    Applied(SearchState),
    /// A newer search started first; this result was dropped.
    Discarded {
        /// Sequence number of the dropped search.
        sequence: u64,
    },
}

/// Message for a query with no matches.
pub fn no_results_message(query: &str) -> String {
    format!("No games found for \"{query}\"")
}

/// How closely a candidate name matches the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchTier {
    Prefix,
    Contains,
}

fn match_tier(needle: &str, name: &str) -> Option<MatchTier> {
    let name = name.to_lowercase();
    if name.starts_with(needle) {
        Some(MatchTier::Prefix)
    } else if name.contains(needle) {
        Some(MatchTier::Contains)
    } else {
        None
    }
}

/// Keep candidates whose name contains `query` (case-insensitive), prefix
/// matches first. Source order is kept within each group.
pub fn rank_candidates(query: &str, candidates: Vec<GameRecord>) -> Vec<GameRecord> {
    let needle = query.trim().to_lowercase();
    let mut matches: Vec<(MatchTier, GameRecord)> = candidates
        .into_iter()
        .filter_map(|game| match_tier(&needle, &game.name).map(|tier| (tier, game)))
        .collect();
    matches.sort_by_key(|(tier, _)| *tier);
    matches.into_iter().map(|(_, game)| game).collect()
}

struct Inner {
    latest: u64,
    state: SearchState,
}

/// Runs searches against a [`CatalogSource`] and owns the resulting state.
pub struct SearchOrchestrator<S> {
    source: S,
    fallback: Option<FixtureSource>,
    hydration_limit: usize,
    inner: RwLock<Inner>,
}

impl<S: CatalogSource> SearchOrchestrator<S> {
    /// Orchestrator with no offline fallback and the default hydration cap.
    pub fn new(source: S) -> Self {
        Self {
            source,
            fallback: None,
            hydration_limit: DEFAULT_HYDRATION_LIMIT,
            inner: RwLock::new(Inner {
                latest: 0,
                state: SearchState::Idle,
            }),
        }
    }

    /// Orchestrator configured from application settings.
    pub fn from_config(source: S, config: &AppConfig) -> Self {
        let orchestrator = Self::new(source).with_hydration_limit(config.hydration_limit);
        if config.offline_fallback {
            orchestrator.with_fallback(FixtureSource::default())
        } else {
            orchestrator
        }
    }

    /// Serve `fallback` when the primary source fails the name search.
    pub fn with_fallback(mut self, fallback: FixtureSource) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Cap the number of ranked candidates sent to hydration.
    pub fn with_hydration_limit(mut self, limit: usize) -> Self {
        self.hydration_limit = limit.max(1);
        self
    }

    /// Current state.
    pub fn state(&self) -> SearchState {
        self.inner.read().state.clone()
    }

    /// Sequence number of the most recently started search.
    pub fn latest_sequence(&self) -> u64 {
        self.inner.read().latest
    }

    /// Return to `Idle`, superseding any search in flight.
    pub fn reset(&self) {
        self.begin(SearchState::Idle);
    }

    /// Run a search for `query` and apply its result if still current.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            let sequence = self.begin(SearchState::Idle);
            debug!(sequence, "Blank query; search cleared");
            return SearchOutcome::Applied(SearchState::Idle);
        }

        let sequence = self.begin(SearchState::Searching {
            query: query.to_string(),
        });
        info!(sequence, query, "Search started");
        let state = self.run(sequence, query).await;
        self.commit(sequence, state)
    }

    async fn run(&self, sequence: u64, query: &str) -> SearchState {
        let (candidates, degraded) = match self.lookup(query).await {
            Ok(found) => found,
            Err(err) => {
                warn!(sequence, query, %err, "Search phase failed");
                return failed(query, SEARCH_FAILED);
            }
        };

        if candidates.is_empty() {
            return empty(query);
        }
        let total = candidates.len();
        let ranked = rank_candidates(query, candidates);
        debug!(sequence, total, kept = ranked.len(), "Candidates narrowed");
        if ranked.is_empty() {
            return empty(query);
        }

        if !self.is_latest(sequence) {
            // Superseded; skip hydration entirely.
            return SearchState::Idle;
        }

        let ids: Vec<String> = ranked
            .iter()
            .take(self.hydration_limit)
            .map(|game| game.id.clone())
            .collect();
        let details = match self.hydrate(&ids, degraded).await {
            Ok(details) => details,
            Err(err) => {
                warn!(sequence, query, %err, "Hydration phase failed");
                return failed(query, DETAILS_FAILED);
            }
        };

        let results = in_ranked_order(&ids, details);
        if results.is_empty() {
            warn!(sequence, query, requested = ids.len(), "Detail lookup returned no records");
            return failed(query, DETAILS_FAILED);
        }
        info!(sequence, query, count = results.len(), degraded, "Search succeeded");
        SearchState::Success {
            query: query.to_string(),
            results,
            degraded,
        }
    }

    async fn lookup(&self, query: &str) -> Result<(Vec<GameRecord>, bool)> {
        match self.source.search(query).await {
            Ok(candidates) => Ok((candidates, false)),
            Err(err) => match &self.fallback {
                Some(fallback) => {
                    warn!(query, %err, "Catalog unavailable; using offline games");
                    Ok((fallback.search(query).await?, true))
                }
                None => Err(err),
            },
        }
    }

    async fn hydrate(&self, ids: &[String], degraded: bool) -> Result<Vec<GameRecord>> {
        match (&self.fallback, degraded) {
            (Some(fallback), true) => fallback.get_details(ids).await,
            _ => self.source.get_details(ids).await,
        }
    }

    fn begin(&self, state: SearchState) -> u64 {
        let mut inner = self.inner.write();
        inner.latest += 1;
        inner.state = state;
        inner.latest
    }

    fn is_latest(&self, sequence: u64) -> bool {
        self.inner.read().latest == sequence
    }

    fn commit(&self, sequence: u64, state: SearchState) -> SearchOutcome {
        let mut inner = self.inner.write();
        if inner.latest != sequence {
            debug!(sequence, latest = inner.latest, "Discarding stale search result");
            return SearchOutcome::Discarded { sequence };
        }
        inner.state = state.clone();
        SearchOutcome::Applied(state)
    }
}

fn empty(query: &str) -> SearchState {
    SearchState::Empty {
        query: query.to_string(),
        message: no_results_message(query),
    }
}

fn failed(query: &str, message: &str) -> SearchState {
    SearchState::Failed {
        query: query.to_string(),
        message: message.to_string(),
    }
}

fn in_ranked_order(ids: &[String], mut details: Vec<GameRecord>) -> Vec<GameRecord> {
    details.retain(|game| ids.contains(&game.id));
    details.sort_by_key(|game| ids.iter().position(|id| *id == game.id));
    details.dedup_by(|a, b| a.id == b.id);
    details
}
