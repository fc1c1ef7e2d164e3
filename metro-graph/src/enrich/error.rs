//! Page fetch error types.

use std::time::Duration;

/// Errors from a single page fetch.
///
/// Every variant is transient from the enricher's point of view: the next
/// candidate is tried.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, client timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The fetch did not finish in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The page returned a non-success status
    #[error("page {title} returned status {status}")]
    Status { title: String, status: u16 },

    /// The page URL could not be built
    #[error("invalid page URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FetchError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "timed out after 10s");

        let err = FetchError::Status {
            title: "Rajiv_Chowk_metro_station".into(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "page Rajiv_Chowk_metro_station returned status 404"
        );
    }
}
