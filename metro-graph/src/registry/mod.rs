//! Authoritative station registry.
//!
//! Provides the flat set of real station names that built graphs are
//! checked against. Names come from a listing page (cached on disk) or
//! from a local text file.

mod cache;
mod client;
mod error;
mod names;

pub use cache::{RegistryCache, RegistryCacheConfig};
pub use client::{DEFAULT_LISTING_URL, RegistryClient, RegistryClientConfig, extract_listing_names};
pub use error::RegistryError;
pub use names::AuthoritativeNameSet;
