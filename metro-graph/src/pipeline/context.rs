//! Inputs and outputs of a pipeline run.

use std::path::{Path, PathBuf};

use crate::graph::MergeConfig;
use crate::registry::AuthoritativeNameSet;

use super::error::PipelineError;

/// Where one top-level input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A file on disk.
    Path(PathBuf),
    /// Contents held in memory under a name.
    Inline { name: String, contents: String },
}

impl InputSource {
    /// An in-memory input.
    pub fn inline(name: impl Into<String>, contents: impl Into<String>) -> Self {
        InputSource::Inline {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> String {
        match self {
            InputSource::Path(path) => path.display().to_string(),
            InputSource::Inline { name, .. } => name.clone(),
        }
    }

    /// Label for the line a table describes: the file stem, or the inline
    /// name without its extension.
    pub fn line_label(&self) -> String {
        let stem = match self {
            InputSource::Path(path) => path.file_stem(),
            InputSource::Inline { name, .. } => Path::new(name).file_stem(),
        };
        stem.map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name())
    }

    /// Read the whole input as text.
    pub fn read(&self) -> Result<String, PipelineError> {
        match self {
            InputSource::Path(path) => std::fs::read_to_string(path)
                .map_err(|e| PipelineError::unusable(self.name(), e)),
            InputSource::Inline { contents, .. } => Ok(contents.clone()),
        }
    }
}

impl From<PathBuf> for InputSource {
    fn from(path: PathBuf) -> Self {
        InputSource::Path(path)
    }
}

impl From<&Path> for InputSource {
    fn from(path: &Path) -> Self {
        InputSource::Path(path.to_path_buf())
    }
}

/// File names used by [`OutputSinks::in_dir`].
pub const GRAPH_FILE: &str = "graph.json";
pub const BUILD_REPORT_FILE: &str = "build_report.json";
pub const MATCHED_FILE: &str = "matched.json";
pub const UNMATCHED_FILE: &str = "unmatched.txt";
pub const NOT_FOUND_FILE: &str = "not_found.json";

/// Where each artifact goes. Artifacts without a destination are not
/// written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSinks {
    pub graph: Option<PathBuf>,
    pub build_report: Option<PathBuf>,
    pub matched: Option<PathBuf>,
    pub unmatched: Option<PathBuf>,
    pub not_found: Option<PathBuf>,
}

impl OutputSinks {
    /// Write every artifact into `dir` under its standard name.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            graph: Some(dir.join(GRAPH_FILE)),
            build_report: Some(dir.join(BUILD_REPORT_FILE)),
            matched: Some(dir.join(MATCHED_FILE)),
            unmatched: Some(dir.join(UNMATCHED_FILE)),
            not_found: Some(dir.join(NOT_FOUND_FILE)),
        }
    }

    /// Override the graph destination.
    pub fn with_graph(mut self, path: impl Into<PathBuf>) -> Self {
        self.graph = Some(path.into());
        self
    }
}

/// Everything a run reads and where its results go.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    /// Per-line station tables.
    pub tables: Vec<InputSource>,
    /// Raw graph documents merged alongside the tables.
    pub documents: Vec<InputSource>,
    /// Registry to validate names against, if any.
    pub registry: Option<AuthoritativeNameSet>,
    pub merge: MergeConfig,
    pub sinks: OutputSinks,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a station table.
    pub fn with_table(mut self, source: impl Into<InputSource>) -> Self {
        self.tables.push(source.into());
        self
    }

    /// Add a raw graph document.
    pub fn with_document(mut self, source: impl Into<InputSource>) -> Self {
        self.documents.push(source.into());
        self
    }

    /// Validate names against `registry`.
    pub fn with_registry(mut self, registry: AuthoritativeNameSet) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the merge configuration.
    pub fn with_merge_config(mut self, config: MergeConfig) -> Self {
        self.merge = config;
        self
    }

    /// Set the output destinations.
    pub fn with_sinks(mut self, sinks: OutputSinks) -> Self {
        self.sinks = sinks;
        self
    }
}
