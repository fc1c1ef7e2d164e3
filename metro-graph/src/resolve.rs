//! Registry validation of station names.
//!
//! Splits a graph's stations into those the authoritative registry knows
//! and those it does not. Nothing is renamed or corrected: unmatched names
//! are surfaced for manual reconciliation.

use tracing::info;

use crate::graph::MergedGraph;
use crate::registry::AuthoritativeNameSet;

/// Outcome of checking a graph against the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Stations whose canonical name is in the registry, with full records.
    pub matched: MergedGraph,
    /// Stations the registry does not know, in key order.
    pub unmatched: Vec<String>,
}

impl Resolution {
    /// Total number of stations checked.
    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }
}

/// Partition `graph` against `registry`.
///
/// The two partitions are disjoint and together cover every station.
pub fn resolve_names(graph: &MergedGraph, registry: &AuthoritativeNameSet) -> Resolution {
    let mut resolution = Resolution::default();

    for (name, record) in graph.iter() {
        if registry.contains(name) {
            resolution.matched.insert(name.clone(), record.clone());
        } else {
            resolution.unmatched.push(name.clone());
        }
    }

    info!(
        matched = resolution.matched.len(),
        unmatched = resolution.unmatched.len(),
        "resolved station names against registry"
    );

    resolution
}
