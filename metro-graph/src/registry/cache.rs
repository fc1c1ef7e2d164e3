//! Disk-based cache for the registry listing.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use super::error::RegistryError;

/// Default cache TTL: 24 hours.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cached registry names with metadata.
#[derive(Debug, Serialize, Deserialize)]
struct CachedNames {
    /// Unix timestamp when the cache was written.
    cached_at_secs: u64,
    /// Where the names were fetched from.
    source: String,
    /// Station names as listed, not normalized.
    names: Vec<String>,
}

/// Configuration for the registry disk cache.
#[derive(Debug, Clone)]
pub struct RegistryCacheConfig {
    /// Path to the cache file.
    pub path: PathBuf,
    /// How long the cache remains valid.
    pub ttl: Duration,
}

impl RegistryCacheConfig {
    /// Create a new cache config with the given path and default TTL (24 hours).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for RegistryCacheConfig {
    fn default() -> Self {
        Self::new("registry_cache.json")
    }
}

/// Disk cache for registry names.
#[derive(Debug, Clone)]
pub struct RegistryCache {
    config: RegistryCacheConfig,
}

impl RegistryCache {
    /// Create a new registry cache with the given config.
    pub fn new(config: RegistryCacheConfig) -> Self {
        Self { config }
    }

    /// Try to load names cached from `source`.
    ///
    /// Returns `None` if the cache doesn't exist, is invalid, was written
    /// for a different source, or has expired.
    pub fn load(&self, source: &str) -> Option<Vec<String>> {
        let contents = std::fs::read_to_string(&self.config.path).ok()?;
        let cached: CachedNames = serde_json::from_str(&contents).ok()?;

        if cached.source != source {
            return None;
        }

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .ok()?
            .as_secs();

        let age_secs = now.saturating_sub(cached.cached_at_secs);
        if age_secs >= self.config.ttl.as_secs() {
            return None;
        }

        Some(cached.names)
    }

    /// Save names fetched from `source`.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, source: &str, names: &[String]) -> Result<(), RegistryError> {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|_| RegistryError::Cache {
                message: "system time before unix epoch".to_string(),
            })?
            .as_secs();

        let cached = CachedNames {
            cached_at_secs: now,
            source: source.to_string(),
            names: names.to_vec(),
        };

        if let Some(parent) = self.config.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| RegistryError::Cache {
                message: format!("failed to create cache directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(&cached).map_err(|e| RegistryError::Cache {
            message: format!("failed to serialize cache: {}", e),
        })?;

        std::fs::write(&self.config.path, json).map_err(|e| RegistryError::Cache {
            message: format!("failed to write cache file: {}", e),
        })?;

        Ok(())
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the cache TTL.
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SOURCE: &str = "https://example.org/list";

    fn names() -> Vec<String> {
        vec!["Rajiv Chowk".to_string(), "Kashmere Gate".to_string()]
    }

    #[test]
    fn save_and_load_cache() {
        let dir = tempdir().unwrap();
        let cache = RegistryCache::new(RegistryCacheConfig::new(dir.path().join("registry.json")));

        cache.save(SOURCE, &names()).unwrap();

        let loaded = cache.load(SOURCE).unwrap();
        assert_eq!(loaded, names());
    }

    #[test]
    fn expired_cache_returns_none() {
        let dir = tempdir().unwrap();
        let config =
            RegistryCacheConfig::new(dir.path().join("registry.json")).with_ttl(Duration::from_secs(0));
        let cache = RegistryCache::new(config);

        cache.save(SOURCE, &names()).unwrap();

        // With 0 TTL, cache should immediately be expired
        assert!(cache.load(SOURCE).is_none());
    }

    #[test]
    fn other_source_returns_none() {
        let dir = tempdir().unwrap();
        let cache = RegistryCache::new(RegistryCacheConfig::new(dir.path().join("registry.json")));

        cache.save(SOURCE, &names()).unwrap();
        assert!(cache.load("https://example.org/other").is_none());
    }

    #[test]
    fn missing_cache_returns_none() {
        let cache = RegistryCache::new(RegistryCacheConfig::new("/nonexistent/path/registry.json"));
        assert!(cache.load(SOURCE).is_none());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("registry.json");
        let cache = RegistryCache::new(RegistryCacheConfig::new(&path));

        cache.save(SOURCE, &names()).unwrap();
        assert!(path.exists());
        assert_eq!(cache.path(), path.as_path());
        assert_eq!(cache.ttl(), DEFAULT_TTL);
    }
}
