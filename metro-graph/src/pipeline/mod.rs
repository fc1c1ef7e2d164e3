//! End-to-end runs.
//!
//! A [`PipelineContext`] names every input and output, so each stage can
//! be driven from files or from memory. Tables become lines, lines and
//! raw documents are merged, interchanges are classified, names are
//! checked against the registry, and coordinates are looked up.

mod context;
mod error;
mod run;
mod tables;

pub use context::{
    BUILD_REPORT_FILE, GRAPH_FILE, InputSource, MATCHED_FILE, NOT_FOUND_FILE, OutputSinks,
    PipelineContext, UNMATCHED_FILE,
};
pub use error::PipelineError;
pub use run::{PipelineOutput, build, run};
pub use tables::{parse_table, read_table};
