//! The authoritative set of real station names.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::canonicalize;

use super::cache::RegistryCache;
use super::client::RegistryClient;
use super::error::RegistryError;

/// Canonical (trimmed, case-folded) names of real stations.
///
/// Used to validate built graphs, never to repair them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoritativeNameSet {
    names: HashSet<String>,
}

impl AuthoritativeNameSet {
    /// Build a set from raw names, normalizing each and dropping blanks.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| canonicalize(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Read a plain-text registry: one name per line, `#` starts a comment line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let set = Self::from_names(text.lines().filter(|l| !l.trim_start().starts_with('#')));
        if set.is_empty() {
            return Err(RegistryError::Empty {
                source_name: path.display().to_string(),
            });
        }
        Ok(set)
    }

    /// Load the registry from the listing page, going through the disk cache.
    ///
    /// A fresh cache entry avoids the network entirely. A failure to write
    /// the cache is logged and otherwise ignored.
    pub async fn fetch(client: &RegistryClient, cache: &RegistryCache) -> Result<Self, RegistryError> {
        if let Some(names) = cache.load(client.listing_url()) {
            info!(path = %cache.path().display(), names = names.len(), "loaded registry from cache");
            return Ok(Self::from_names(names));
        }

        let names = client.fetch_names().await?;
        if let Err(e) = cache.save(client.listing_url(), &names) {
            warn!(error = %e, "failed to cache registry listing");
        }
        info!(url = client.listing_url(), names = names.len(), "fetched registry listing");

        Ok(Self::from_names(names))
    }

    /// Whether `name` (in any spelling) is a real station.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&canonicalize(name))
    }

    /// Number of distinct canonical names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
