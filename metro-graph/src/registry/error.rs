//! Registry error types.

/// Errors that can occur while loading the authoritative station registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Listing page returned an error status
    #[error("registry error {status}: {message}")]
    Api { status: u16, message: String },

    /// Listing page held no station names
    #[error("no station names found in {source_name}")]
    Empty { source_name: String },

    /// Reading a local registry file failed
    #[error("failed to read registry file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Cache operation failed
    #[error("cache error: {message}")]
    Cache { message: String },
}
