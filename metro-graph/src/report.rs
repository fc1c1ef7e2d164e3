//! Diagnostic artifacts written alongside the graph.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::GraphError;
use crate::graph::{AsymmetricEdge, MergeReport};

/// A line that could not be built and was left out of the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineFailure {
    pub line: String,
    pub source: String,
    pub error: String,
}

impl LineFailure {
    pub fn new(source: impl Into<String>, error: &GraphError) -> Self {
        Self {
            line: error.line().to_string(),
            source: source.into(),
            error: error.to_string(),
        }
    }
}

/// Everything a build run skipped, repaired or relabeled.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub generated_at: DateTime<Utc>,
    pub lines_built: usize,
    pub line_failures: Vec<LineFailure>,
    pub merge: MergeReport,
    /// Stations relabeled as interchanges.
    pub interchanges: usize,
    pub stations: usize,
    pub asymmetric_edges: Vec<AsymmetricEdge>,
}

/// Stations the enricher could not place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotFoundReport {
    pub generated_at: DateTime<Utc>,
    pub not_found: Vec<String>,
}

impl NotFoundReport {
    pub fn new(not_found: Vec<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            not_found,
        }
    }
}

/// Write `value` as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    ensure_parent(path)?;
    std::fs::write(path, json + "\n")
}

/// Write one name per line.
pub fn write_lines<I, S>(path: &Path, lines: I) -> io::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for line in lines {
        text.push_str(line.as_ref());
        text.push('\n');
    }
    ensure_parent(path)?;
    std::fs::write(path, text)
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
