//! CSV station tables.

use tracing::debug;

use crate::graph::{DISTANCE_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN, NAME_COLUMN, RawStationRow};

use super::context::InputSource;
use super::error::PipelineError;

const REQUIRED_COLUMNS: [&str; 4] = [NAME_COLUMN, DISTANCE_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN];

/// Read a station table into untyped rows.
///
/// The header row must name every required column; other columns are
/// ignored. Short rows yield absent cells, which the line builder reports
/// per row. Anything that stops the file being read as CSV aborts.
pub fn read_table(source: &InputSource) -> Result<Vec<RawStationRow>, PipelineError> {
    let text = source.read()?;
    parse_table(&source.name(), &text)
}

/// Parse CSV text already in memory. `name` is used in diagnostics.
pub fn parse_table(name: &str, text: &str) -> Result<Vec<RawStationRow>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::unusable(name, e))?
        .clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::unusable(
            name,
            format!("missing column(s) {missing:?}"),
        ));
    }

    let rows = reader
        .deserialize::<RawStationRow>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PipelineError::unusable(name, e))?;

    debug!(source = name, rows = rows.len(), "read station table");
    Ok(rows)
}
