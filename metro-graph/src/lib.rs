//! Transit network graph builder.
//!
//! Turns per-line station tables and hand-assembled graph documents into
//! one canonical station graph, flags interchanges, checks names against
//! an authoritative registry, and looks up missing coordinates.

pub mod domain;
pub mod enrich;
pub mod graph;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod resolve;
