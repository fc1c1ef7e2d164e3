//! Configuration for coordinate enrichment.

use std::time::Duration;

/// Default base URL of the coordinate knowledge source.
pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";

/// Default page-title suffixes, tried in order.
pub const DEFAULT_CANDIDATE_SUFFIXES: [&str; 3] = ["_metro_station", "_metro", ""];

/// Configuration parameters for coordinate enrichment.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Base URL pages are fetched from; titles go under `/wiki/`.
    pub base_url: String,

    /// Suffixes appended to the station's page title, tried in order.
    pub candidate_suffixes: Vec<String>,

    /// Maximum number of stations processed at once.
    pub max_workers: usize,

    /// Minimum spacing between consecutive fetches across all workers (ms).
    pub request_interval_ms: u64,

    /// Per-fetch timeout (seconds).
    pub timeout_secs: u64,

    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl EnrichConfig {
    /// Set a custom base URL (for testing or mirrors).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Replace the candidate suffixes.
    pub fn with_candidate_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidate_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the worker count.
    pub fn with_max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self
    }

    /// Set the spacing between fetches.
    pub fn with_request_interval_ms(mut self, ms: u64) -> Self {
        self.request_interval_ms = ms;
        self
    }

    /// Set the per-fetch timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Returns the spacing between fetches as a Duration.
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    /// Returns the per-fetch timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            candidate_suffixes: DEFAULT_CANDIDATE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_workers: 4,
            request_interval_ms: 500,
            timeout_secs: 10,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
