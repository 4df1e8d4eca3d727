#![warn(clippy::all, missing_docs)]

//! Core logic for the board game shelf.
//!
//! This crate hosts the game record model, the remote catalog client and its
//! payload normalization, the persisted collection store with its
//! import/export boundary, and the search orchestrator used by the CLI and
//! any future frontends.

pub mod catalog;
pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod search;

pub use catalog::{BggClient, CatalogSource, FixtureSource};
pub use collection::{CollectionStore, FileStorage, MemoryStorage, SortOrder, StorageBackend};
pub use config::AppConfig;
pub use error::{CatalogError, Result};
pub use models::GameRecord;
pub use search::{SearchOrchestrator, SearchOutcome, SearchState};
