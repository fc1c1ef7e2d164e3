//! Per-line graph construction.
//!
//! A line table lists its stations in order of distance from the start of
//! the line. Each station is linked to its immediate predecessor and
//! successor, so a single line never gives a station more than two
//! neighbors.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{Coordinates, GraphError, StationName};

use super::record::StationRecord;

/// Column headings of a station table.
pub const NAME_COLUMN: &str = "Station Name";
pub const DISTANCE_COLUMN: &str = "Distance from Start (km)";
pub const LATITUDE_COLUMN: &str = "Latitude";
pub const LONGITUDE_COLUMN: &str = "Longitude";

/// Field reported when a latitude/longitude pair is out of range.
const POSITION_FIELD: &str = "Latitude/Longitude";

/// One untyped row of a station table. Cells may be absent.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct RawStationRow {
    #[serde(rename = "Station Name")]
    pub name: Option<String>,
    #[serde(rename = "Distance from Start (km)")]
    pub distance_km: Option<String>,
    #[serde(rename = "Latitude")]
    pub lat: Option<String>,
    #[serde(rename = "Longitude")]
    pub lng: Option<String>,
}

impl RawStationRow {
    /// Build a row from string cells.
    pub fn new(name: &str, distance_km: &str, lat: &str, lng: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            distance_km: Some(distance_km.to_string()),
            lat: Some(lat.to_string()),
            lng: Some(lng.to_string()),
        }
    }
}

/// A typed row of a station table.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRow {
    pub name: StationName,
    pub distance_km: f64,
    pub position: Coordinates,
}

/// A station placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStation {
    pub name: StationName,
    /// Distance from the start of this line, in km.
    pub distance_km: f64,
    pub record: StationRecord,
}

/// A linear graph fragment for one line, ordered by distance from start.
#[derive(Debug, Clone, PartialEq)]
pub struct LineGraph {
    line: String,
    stations: Vec<LineStation>,
}

impl LineGraph {
    /// The line label every station carries.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Stations in line order.
    pub fn stations(&self) -> &[LineStation] {
        &self.stations
    }

    /// Number of stations on the line.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether the line has no stations.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Consume the graph, yielding its stations in line order.
    pub fn into_stations(self) -> Vec<LineStation> {
        self.stations
    }
}

/// Round a distance to two decimal places.
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Builds [`LineGraph`]s for a single line label.
#[derive(Debug, Clone)]
pub struct LineGraphBuilder {
    line: String,
}

impl LineGraphBuilder {
    /// Create a builder for the given line.
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }

    /// The line label used for every built station.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Type-check raw rows, then build the line.
    ///
    /// Rows are numbered from 1 in error messages.
    pub fn build_raw(&self, rows: &[RawStationRow]) -> Result<LineGraph, GraphError> {
        let typed = rows
            .iter()
            .enumerate()
            .map(|(i, raw)| self.type_row(i + 1, raw))
            .collect::<Result<Vec<_>, _>>()?;
        self.build(typed)
    }

    /// Build the line from typed rows sorted by ascending distance.
    pub fn build(&self, rows: Vec<StationRow>) -> Result<LineGraph, GraphError> {
        self.check_ordering(&rows)?;

        let weights: Vec<f64> = rows
            .windows(2)
            .map(|pair| round_km((pair[1].distance_km - pair[0].distance_km).abs()))
            .collect();

        let mut stations: Vec<LineStation> = rows
            .iter()
            .map(|row| LineStation {
                name: row.name.clone(),
                distance_km: row.distance_km,
                record: StationRecord::new(row.position, self.line.clone()),
            })
            .collect();

        for (i, weight) in weights.into_iter().enumerate() {
            let prev = stations[i].name.as_str().to_string();
            let next = stations[i + 1].name.as_str().to_string();
            stations[i].record.neighbors.insert(next, weight);
            stations[i + 1].record.neighbors.insert(prev, weight);
        }

        debug!(line = %self.line, stations = stations.len(), "built line graph");

        Ok(LineGraph {
            line: self.line.clone(),
            stations,
        })
    }

    fn check_ordering(&self, rows: &[StationRow]) -> Result<(), GraphError> {
        let mut seen: HashSet<&StationName> = HashSet::new();

        for (i, row) in rows.iter().enumerate() {
            if !row.distance_km.is_finite() || row.distance_km < 0.0 {
                return Err(self.malformed(
                    i + 1,
                    DISTANCE_COLUMN,
                    format!("must be a non-negative number, got {}", row.distance_km),
                ));
            }
            if !seen.insert(&row.name) {
                return Err(GraphError::OrderingViolation {
                    line: self.line.clone(),
                    row: i + 1,
                    reason: format!("station {:?} appears more than once", row.name.as_str()),
                });
            }
            if i > 0 && row.distance_km <= rows[i - 1].distance_km {
                return Err(GraphError::OrderingViolation {
                    line: self.line.clone(),
                    row: i + 1,
                    reason: format!(
                        "distance {} does not exceed {}",
                        row.distance_km,
                        rows[i - 1].distance_km
                    ),
                });
            }
        }

        Ok(())
    }

    fn type_row(&self, row: usize, raw: &RawStationRow) -> Result<StationRow, GraphError> {
        let name = self.required(row, NAME_COLUMN, raw.name.as_deref())?;
        let name = StationName::parse(name).map_err(|e| self.malformed(row, NAME_COLUMN, e))?;
        let distance_km = self.number(row, DISTANCE_COLUMN, raw.distance_km.as_deref())?;
        if distance_km < 0.0 {
            return Err(self.malformed(row, DISTANCE_COLUMN, "must not be negative"));
        }
        let lat = self.number(row, LATITUDE_COLUMN, raw.lat.as_deref())?;
        let lng = self.number(row, LONGITUDE_COLUMN, raw.lng.as_deref())?;
        let position =
            Coordinates::new(lat, lng).map_err(|e| self.malformed(row, POSITION_FIELD, e))?;

        Ok(StationRow {
            name,
            distance_km,
            position,
        })
    }

    fn required<'a>(
        &self,
        row: usize,
        field: &'static str,
        cell: Option<&'a str>,
    ) -> Result<&'a str, GraphError> {
        match cell.map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(self.malformed(row, field, "missing")),
        }
    }

    fn number(&self, row: usize, field: &'static str, cell: Option<&str>) -> Result<f64, GraphError> {
        let text = self.required(row, field, cell)?;
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(self.malformed(row, field, format!("not a number: {text:?}"))),
        }
    }

    fn malformed(&self, row: usize, field: &'static str, problem: impl ToString) -> GraphError {
        GraphError::MalformedRecord {
            line: self.line.clone(),
            row,
            field,
            problem: problem.to_string(),
        }
    }
}
