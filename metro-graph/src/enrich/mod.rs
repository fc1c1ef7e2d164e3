//! Coordinate enrichment from an external knowledge source.
//!
//! For each station a fixed list of page-title guesses is tried against a
//! [`PageSource`], and each page is read with an ordered list of extraction
//! strategies. A bounded pool of workers shares one rate limiter.

mod candidates;
mod config;
mod enricher;
mod error;
mod extract;
mod limiter;
mod mock;
mod source;

pub use candidates::candidate_titles;
pub use config::{DEFAULT_BASE_URL, DEFAULT_CANDIDATE_SUFFIXES, EnrichConfig};
pub use enricher::{CoordinateEnricher, Enrichment, EnrichmentReport};
pub use error::FetchError;
pub use extract::{Strategy, extract_coordinates, parse_decimal_pair, parse_degree_pair};
pub use limiter::RateLimiter;
pub use mock::MockPageSource;
pub use source::{HttpPageSource, PageSource};
