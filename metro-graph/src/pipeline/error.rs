//! Pipeline error types.

use crate::enrich::FetchError;
use crate::graph::MergeError;
use crate::registry::RegistryError;

/// Errors that abort a pipeline run.
///
/// Problems with individual rows, lines, fragments or stations never
/// appear here; they are collected into reports instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A top-level input could not be read or parsed
    #[error("unusable input {input}: {reason}")]
    Source { input: String, reason: String },

    /// An output could not be written
    #[error("failed to write {path}: {source}")]
    Sink {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The merge was rejected
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// The registry could not be loaded
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The page source could not be set up
    #[error(transparent)]
    PageSource(#[from] FetchError),
}

impl PipelineError {
    /// An unusable-input error naming `input`.
    pub fn unusable(input: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::Source {
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}
