use serde::{Deserialize, Serialize};

/// Where the search backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the backend's HTTP interface; `/sql?mode=raw` is appended.
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://127.0.0.1:9308".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SearchConfig {
    /// Read `SEARCH_BACKEND_URL` and `SEARCH_BACKEND_TIMEOUT_SECS`, falling back
    /// to the defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("SEARCH_BACKEND_URL").unwrap_or_else(|_| default_url()),
            timeout_secs: std::env::var("SEARCH_BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Endpoint SQL is posted to.
    #[must_use]
    pub fn sql_endpoint(&self) -> String {
        format!("{}/sql?mode=raw", self.url.trim_end_matches('/'))
    }
}
