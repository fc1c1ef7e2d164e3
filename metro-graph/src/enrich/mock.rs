//! Offline page source.
//!
//! Serves saved pages from memory or from a directory of HTML files as
//! if they were live responses. Every requested title is recorded.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::error::FetchError;
use super::source::PageSource;

/// Page source backed by pre-loaded pages, keyed by title.
#[derive(Debug, Clone, Default)]
pub struct MockPageSource {
    pages: Arc<HashMap<String, String>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockPageSource {
    /// Create a source from `(title, html)` pairs.
    pub fn from_pages<I, T, H>(pages: I) -> Self
    where
        I: IntoIterator<Item = (T, H)>,
        T: Into<String>,
        H: Into<String>,
    {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(title, html)| (title.into(), html.into()))
                    .collect(),
            ),
            requests: Arc::default(),
        }
    }

    /// Load every `{title}.html` file in `dir`.
    ///
    /// Other files are ignored. An empty directory gives a source on which
    /// every fetch fails.
    pub fn from_dir(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let mut pages = HashMap::new();

        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("html") {
                continue;
            }
            let Some(title) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            pages.insert(title.to_string(), std::fs::read_to_string(&path)?);
        }

        Ok(Self::from_pages(pages))
    }

    /// Number of pages available.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no pages are available.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Titles requested so far, in request order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

impl PageSource for MockPageSource {
    fn fetch(&self, title: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
        let title = title.to_string();
        async move {
            self.requests.lock().await.push(title.clone());
            self.pages
                .get(&title)
                .cloned()
                .ok_or(FetchError::Status { title, status: 404 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn serves_known_pages() {
        let source = MockPageSource::from_pages([("Dwarka", "<p>Dwarka</p>")]);
        assert_eq!(source.fetch("Dwarka").await.unwrap(), "<p>Dwarka</p>");
        assert!(matches!(
            source.fetch("Dwarka_metro").await,
            Err(FetchError::Status { status: 404, .. })
        ));
        assert_eq!(source.requests().await, ["Dwarka", "Dwarka_metro"]);
    }

    #[tokio::test]
    async fn loads_html_files_from_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Rajiv_Chowk_metro_station.html"), "<html/>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = MockPageSource::from_dir(dir.path()).unwrap();
        assert_eq!(source.len(), 1);
        assert!(source.fetch("Rajiv_Chowk_metro_station").await.is_ok());
        assert!(source.fetch("notes").await.is_err());
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(MockPageSource::from_dir("/nonexistent/pages").is_err());
    }
}
