//! Interchange detection.
//!
//! A single line gives a station at most two neighbors, so a station with
//! more than two after merging must be served by several lines.

use tracing::debug;

use super::record::MergedGraph;

/// Line label given to stations served by more than one line.
pub const INTERCHANGE_LINE: &str = "interchange";

/// Highest neighbor count a station on a single line can have.
const MAX_SINGLE_LINE_DEGREE: usize = 2;

/// Relabel every station with more than two neighbors as an interchange.
///
/// Returns the number of stations whose label changed. Applying this twice
/// changes nothing the second time.
pub fn classify_interchanges(graph: &mut MergedGraph) -> usize {
    let mut relabeled = 0;
    for (name, record) in graph.iter_mut() {
        if record.degree() > MAX_SINGLE_LINE_DEGREE && record.line != INTERCHANGE_LINE {
            debug!(station = %name, previous = %record.line, "relabeling as interchange");
            record.line = INTERCHANGE_LINE.to_string();
            relabeled += 1;
        }
    }
    relabeled
}
