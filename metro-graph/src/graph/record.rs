//! Station records and the merged graph artifact.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Coordinates;

/// One station in the persisted graph.
///
/// The station's name is its key in [`MergedGraph`]; neighbor weights are
/// kilometres and never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub lat: f64,
    pub lng: f64,
    pub line: String,
    #[serde(default)]
    pub neighbors: BTreeMap<String, f64>,
}

impl StationRecord {
    /// Create a record with no neighbors.
    pub fn new(position: Coordinates, line: impl Into<String>) -> Self {
        Self {
            lat: position.lat(),
            lng: position.lng(),
            line: line.into(),
            neighbors: BTreeMap::new(),
        }
    }

    /// Decode a raw station fragment from a source document.
    ///
    /// Rejects fragments whose neighbor weights are negative or not finite.
    pub fn from_fragment(fragment: serde_json::Value) -> Result<Self, String> {
        let record: StationRecord =
            serde_json::from_value(fragment).map_err(|e| e.to_string())?;

        if let Some((name, weight)) = record
            .neighbors
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(format!("neighbor {name:?} has invalid weight {weight}"));
        }

        Ok(record)
    }

    /// The record's position, if it is a valid coordinate pair.
    pub fn position(&self) -> Option<Coordinates> {
        Coordinates::new(self.lat, self.lng).ok()
    }

    /// Overwrite the record's position.
    pub fn set_position(&mut self, position: Coordinates) {
        self.lat = position.lat();
        self.lng = position.lng();
    }

    /// Number of distinct neighbors.
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }
}

/// An edge seen from one side only, or with different weights on each side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsymmetricEdge {
    pub from: String,
    pub to: String,
    pub forward_km: f64,
    /// Weight listed by `to` for `from`, if it lists it at all.
    pub reverse_km: Option<f64>,
}

/// The canonical consolidated graph: station name → record.
///
/// Serializes to `{"stations": {<name>: {"lat", "lng", "line", "neighbors"}}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedGraph {
    stations: BTreeMap<String, StationRecord>,
}

impl MergedGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a graph artifact.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to the pretty-printed artifact form.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Insert or replace a station.
    pub fn insert(&mut self, name: impl Into<String>, record: StationRecord) {
        self.stations.insert(name.into(), record);
    }

    /// Look up a station by exact key.
    pub fn get(&self, name: &str) -> Option<&StationRecord> {
        self.stations.get(name)
    }

    /// Mutable lookup by exact key.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut StationRecord> {
        self.stations.get_mut(name)
    }

    /// Whether the graph has a station with this exact key.
    pub fn contains(&self, name: &str) -> bool {
        self.stations.contains_key(name)
    }

    /// Number of stations.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether the graph has no stations.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Iterate stations in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &StationRecord)> {
        self.stations.iter()
    }

    /// Iterate stations mutably in key order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut StationRecord)> {
        self.stations.iter_mut()
    }

    /// Station names in key order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(String::as_str)
    }

    /// Every directed edge whose reverse is missing or has a different weight.
    ///
    /// Merging partial sources can leave such edges behind; they are reported,
    /// not repaired.
    pub fn asymmetric_edges(&self) -> Vec<AsymmetricEdge> {
        let mut edges = Vec::new();
        for (from, record) in &self.stations {
            for (to, &forward_km) in &record.neighbors {
                let reverse_km = self
                    .stations
                    .get(to)
                    .and_then(|other| other.neighbors.get(from))
                    .copied();
                if reverse_km != Some(forward_km) {
                    edges.push(AsymmetricEdge {
                        from: from.clone(),
                        to: to.clone(),
                        forward_km,
                        reverse_km,
                    });
                }
            }
        }
        edges
    }
}

impl FromIterator<(String, StationRecord)> for MergedGraph {
    fn from_iter<I: IntoIterator<Item = (String, StationRecord)>>(iter: I) -> Self {
        Self {
            stations: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str, neighbors: &[(&str, f64)]) -> StationRecord {
        StationRecord {
            lat: 28.0,
            lng: 77.0,
            line: line.to_string(),
            neighbors: neighbors
                .iter()
                .map(|(n, w)| (n.to_string(), *w))
                .collect(),
        }
    }

    #[test]
    fn artifact_shape() {
        let mut graph = MergedGraph::new();
        graph.insert("A", record("Red", &[("B", 2.5)]));

        let value: serde_json::Value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value["stations"]["A"]["line"], "Red");
        assert_eq!(value["stations"]["A"]["lat"], 28.0);
        assert_eq!(value["stations"]["A"]["neighbors"]["B"], 2.5);
    }

    #[test]
    fn fragment_without_neighbors_defaults_empty() {
        let fragment = serde_json::json!({"lat": 1.0, "lng": 2.0, "line": "Grey"});
        let record = StationRecord::from_fragment(fragment).unwrap();
        assert!(record.neighbors.is_empty());
    }

    #[test]
    fn fragment_rejects_negative_weight() {
        let fragment = serde_json::json!({
            "lat": 1.0, "lng": 2.0, "line": "Grey",
            "neighbors": {"X": -1.0}
        });
        let err = StationRecord::from_fragment(fragment).unwrap_err();
        assert!(err.contains("\"X\""));
    }

    #[test]
    fn fragment_rejects_missing_fields() {
        let fragment = serde_json::json!({"lat": 1.0, "line": "Grey"});
        assert!(StationRecord::from_fragment(fragment).is_err());
        assert!(StationRecord::from_fragment(serde_json::json!("Grey")).is_err());
    }

    #[test]
    fn asymmetric_edges_detected() {
        let mut graph = MergedGraph::new();
        graph.insert("A", record("Red", &[("B", 2.5), ("Z", 1.0)]));
        graph.insert("B", record("Red", &[("A", 2.0)]));

        let edges = graph.asymmetric_edges();
        assert_eq!(edges.len(), 3);
        assert!(edges.iter().any(|e| e.from == "A" && e.to == "Z" && e.reverse_km.is_none()));
        assert!(
            edges
                .iter()
                .any(|e| e.from == "B" && e.to == "A" && e.reverse_km == Some(2.5))
        );
    }

    #[test]
    fn position_validates() {
        let mut r = record("Red", &[]);
        assert!(r.position().is_some());
        r.lat = 200.0;
        assert!(r.position().is_none());
        r.set_position(Coordinates::new(10.0, 20.0).unwrap());
        assert_eq!((r.lat, r.lng), (10.0, 20.0));
    }
}
