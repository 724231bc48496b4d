use std::time::Duration;

/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a single provider.
///
/// Passed into each provider at construction time; the caller owns its
/// lifecycle. Nothing in this crate reads endpoints from process-global state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL without trailing slash (e.g. `https://api.awattar.at`)
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
