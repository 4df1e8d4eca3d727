use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use tracing::{debug, info, warn};

use super::{normalize, payload, CatalogSource};
use crate::{
    config::AppConfig,
    error::{CatalogError, Result},
    models::GameRecord,
};

const ITEM_TYPE: &str = "boardgame";

/// Client for the BoardGameGeek XML API (`/search` and `/thing`).
#[derive(Clone)]
pub struct BggClient {
    api_url: String,
    api_token: Option<String>,
    exact: bool,
    client: reqwest::Client,
}

impl BggClient {
    /// Build a client from application configuration.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            exact: config.exact_search,
            client: reqwest::Client::new(),
        }
    }

    /// Build an unauthenticated fuzzy-search client for `api_url`.
    pub fn with_url(api_url: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: None,
            exact: false,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.api_url, path);
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn search_params(&self, query: &str) -> [(&'static str, String); 3] {
        [
            ("query", query.to_string()),
            ("type", ITEM_TYPE.to_string()),
            ("exact", if self.exact { "1" } else { "0" }.to_string()),
        ]
    }

    fn detail_params(ids: &[String]) -> [(&'static str, String); 2] {
        [("id", ids.join(",")), ("stats", "1".to_string())]
    }

    async fn fetch(&self, path: &str, params: &[(&'static str, String)]) -> Result<String> {
        let response = self
            .build_request(Method::GET, path)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(path, %status, "Catalog request failed");
            return Err(CatalogError::Network(format!(
                "{path} request failed: {status}"
            )));
        }

        let body = response.text().await?;
        debug!(path, length = body.len(), "Catalog response received");
        Ok(body)
    }
}

#[async_trait]
impl CatalogSource for BggClient {
    async fn search(&self, query: &str) -> Result<Vec<GameRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        info!(query, exact = self.exact, "Searching catalog");
        let body = self.fetch("search", &self.search_params(query)).await?;
        let root = payload::parse_document(&body)?;
        let results = normalize::search_results(&root);
        info!(query, count = results.len(), "Catalog search returned");
        Ok(results)
    }

    async fn get_details(&self, ids: &[String]) -> Result<Vec<GameRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        info!(count = ids.len(), "Fetching catalog details");
        let body = self.fetch("thing", &Self::detail_params(ids)).await?;
        let root = payload::parse_document(&body)?;
        Ok(normalize::detail_results(&root))
    }
}
