//! Error kinds shared by the catalog client, the collection store and the
//! import boundary.

use thiserror::Error;

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failures surfaced by the core.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport failure or an unusable response from the remote catalog.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed import payload.
    #[error("{0}")]
    Validation(String),

    /// Persisted collection could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<roxmltree::Error> for CatalogError {
    fn from(err: roxmltree::Error) -> Self {
        Self::Network(format!("failed to parse XML response: {err}"))
    }
}
