//! Graph construction and consolidation.
//!
//! Per-line tables become [`LineGraph`]s, which are merged with any raw
//! documents into one [`MergedGraph`]. Interchanges are then detected
//! structurally from neighbor counts.

mod document;
mod interchange;
mod line;
mod merge;
mod record;

pub use document::RawDocument;
pub use interchange::{INTERCHANGE_LINE, classify_interchanges};
pub use line::{
    DISTANCE_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN, LineGraph, LineGraphBuilder, LineStation,
    NAME_COLUMN, RawStationRow, StationRow, round_km,
};
pub use merge::{
    ConflictPolicy, GraphMerger, InvalidConflictPolicy, MergeConfig, MergeError, MergeReport,
    NeighborConflict, ParseFailure, merge_lines,
};
pub use record::{AsymmetricEdge, MergedGraph, StationRecord};
