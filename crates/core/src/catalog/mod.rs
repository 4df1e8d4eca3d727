//! Remote catalog access and payload normalization.

/// HTTP client for the XML API.
pub mod client;
/// Built-in offline catalog.
pub mod fixture;
/// Element-to-record mapping.
pub mod normalize;
/// XML/JSON payload decoding.
pub mod payload;

use async_trait::async_trait;

use crate::{error::Result, models::GameRecord};

pub use client::BggClient;
pub use fixture::FixtureSource;

/// A source of board game records.
///
/// `search` returns partial records; `get_details` returns hydrated ones.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fuzzy name search. Blank queries yield no results without touching
    /// the source.
    async fn search(&self, query: &str) -> Result<Vec<GameRecord>>;

    /// Fetch full records for `ids` in a single batched request.
    async fn get_details(&self, ids: &[String]) -> Result<Vec<GameRecord>>;
}
