//! Authoritative station listing client.

use std::sync::LazyLock;
use std::time::Duration;

use scraper::{Html, Selector};
use tracing::debug;

use super::error::RegistryError;

/// Default listing page for the authoritative station registry.
pub const DEFAULT_LISTING_URL: &str = "https://en.wikipedia.org/wiki/List_of_Delhi_Metro_stations";

/// Rows of the listing tables.
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.wikitable tr").expect("valid row selector"));

/// First data cell of a row.
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid cell selector"));

/// Configuration for the registry client.
#[derive(Debug, Clone)]
pub struct RegistryClientConfig {
    /// Listing page URL
    pub listing_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent sent with the request
    pub user_agent: String,
}

impl RegistryClientConfig {
    /// Create a config for the default listing page.
    pub fn new() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            timeout_secs: 10,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set a custom listing URL.
    pub fn with_listing_url(mut self, url: impl Into<String>) -> Self {
        self.listing_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for the authoritative station listing page.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    listing_url: String,
}

impl RegistryClient {
    /// Create a new registry client.
    pub fn new(config: RegistryClientConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            listing_url: config.listing_url,
        })
    }

    /// The listing page this client reads.
    pub fn listing_url(&self) -> &str {
        &self.listing_url
    }

    /// Fetch the listing page and extract every station name on it.
    pub async fn fetch_names(&self) -> Result<Vec<String>, RegistryError> {
        let response = self.http.get(&self.listing_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        let names = extract_listing_names(&body);
        debug!(url = %self.listing_url, names = names.len(), "fetched registry listing");

        if names.is_empty() {
            return Err(RegistryError::Empty {
                source_name: self.listing_url.clone(),
            });
        }

        Ok(names)
    }
}

/// Extract station names from a listing page.
///
/// Each row of each `wikitable` contributes the text of its first data
/// cell. Header rows have no data cells and are skipped.
pub fn extract_listing_names(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ROW_SELECTOR)
        .filter_map(|row| row.select(&CELL_SELECTOR).next())
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
