use std::time::Duration;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::{
    config::SearchConfig,
    error::{SearchError, SearchResult},
    response::normalize,
};

/// Posts SQL text to the search backend and normalises what comes back.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    config: SearchConfig,
}

impl SearchClient {
    /// # Errors
    ///
    /// [`SearchError::Network`] when the HTTP client cannot be built.
    pub fn new(config: SearchConfig) -> SearchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::Network {
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_env() -> SearchResult<Self> {
        Self::new(SearchConfig::from_env())
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run one statement and return its rows as JSON records.
    ///
    /// # Errors
    ///
    /// Network failures, non-2xx statuses, unparseable bodies and errors
    /// reported by the backend.
    pub async fn execute(&self, sql: &str) -> SearchResult<Vec<JsonValue>> {
        let url = self.config.sql_endpoint();
        debug!(%url, %sql, "search query");

        let response = self
            .client
            .post(&url)
            .form(&[("query", sql)])
            .send()
            .await
            .map_err(|e| SearchError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "search backend rejected query");
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse {
                message: format!("failed to parse response body: {e}"),
            })?;
        normalize(body).inspect_err(|e| warn!(error = %e, "search backend query failed"))
    }
}
