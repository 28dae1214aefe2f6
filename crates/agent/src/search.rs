use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use roster_core::config::SearchConfig;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search transport error: {0}")]
    Transport(String),
    #[error("search request timed out after {0}s")]
    Timeout(u64),
    #[error("search response could not be decoded: {0}")]
    Decode(String),
    #[error("search client configuration error: {0}")]
    Configuration(String),
}

/// A single non-paid result item. Any field may be absent; display defaults
/// are applied at the formatting site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct OrganicResult {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub link: Option<String>,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Ordered organic results for the query, most relevant first.
    async fn search(&self, query: &str) -> Result<Vec<OrganicResult>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

pub struct SerpApiClient {
    http: reqwest::Client,
    engine: String,
    api_key: SecretString,
    timeout_secs: u64,
}

impl SerpApiClient {
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| SearchError::Configuration("search.api_key is not set".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| SearchError::Configuration(err.to_string()))?;

        Ok(Self { http, engine: config.engine.clone(), api_key, timeout_secs: config.timeout_secs })
    }
}

#[async_trait]
impl SearchClient for SerpApiClient {
    async fn search(&self, query: &str) -> Result<Vec<OrganicResult>, SearchError> {
        let response = self
            .http
            .get("https://serpapi.com/search.json")
            .query(&[
                ("engine", self.engine.as_str()),
                ("q", query),
                ("api_key", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SearchError::Timeout(self.timeout_secs)
                } else {
                    SearchError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Transport(format!("status {status}")));
        }

        let parsed: SerpApiResponse =
            response.json().await.map_err(|err| SearchError::Decode(err.to_string()))?;
        Ok(parsed.organic_results)
    }
}
