//! Where candidate pages come from.

use std::future::Future;

use reqwest::Url;
use tracing::trace;

use super::config::EnrichConfig;
use super::error::FetchError;

/// Trait for fetching a page by title.
///
/// This abstraction allows the enricher to work against the live site
/// or an offline directory of saved pages.
pub trait PageSource {
    /// Fetch the HTML of the page called `title`.
    fn fetch(&self, title: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Page source that reads `{base_url}/wiki/{title}` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpPageSource {
    /// Create a source from the enrichment config.
    pub fn new(config: &EnrichConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self { http, base_url })
    }

    /// The URL a title is fetched from. The title is percent-encoded as a
    /// single path segment.
    pub fn page_url(&self, title: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("wiki")
            .push(title);
        Ok(url)
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, title: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
        let url = self.page_url(title);
        let title = title.to_string();
        async move {
            let url = url?;
            trace!(%url, "fetching page");

            let response = self.http.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    title,
                    status: status.as_u16(),
                });
            }

            Ok(response.text().await?)
        }
    }
}
