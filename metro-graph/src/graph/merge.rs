//! Cross-line graph merging.
//!
//! Stations are identified by canonical name. For each station the first
//! occurrence's position, line label and spelling are kept; neighbor maps
//! are unioned key by key, and a neighbor already present keeps its
//! first-seen weight. Weight disagreements are recorded and handled by the
//! configured [`ConflictPolicy`].

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{StationName, canonicalize};

use super::document::RawDocument;
use super::line::LineGraph;
use super::record::{MergedGraph, StationRecord};

/// Weights closer than this are treated as equal.
const WEIGHT_EPSILON: f64 = 1e-9;

/// What to do when two sources disagree on a neighbor distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Keep the first-seen weight and report the disagreement.
    #[default]
    FirstWins,
    /// Fail the merge if any disagreement was seen.
    Reject,
}

/// Error returned when parsing an unknown conflict policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown conflict policy {0:?} (expected \"first-wins\" or \"reject\")")]
pub struct InvalidConflictPolicy(String);

impl FromStr for ConflictPolicy {
    type Err = InvalidConflictPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-wins" | "first_wins" => Ok(ConflictPolicy::FirstWins),
            "reject" => Ok(ConflictPolicy::Reject),
            _ => Err(InvalidConflictPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::FirstWins => f.write_str("first-wins"),
            ConflictPolicy::Reject => f.write_str("reject"),
        }
    }
}

/// Configuration for [`GraphMerger`].
#[derive(Debug, Clone, Default)]
pub struct MergeConfig {
    /// Handling of conflicting neighbor weights.
    pub conflict_policy: ConflictPolicy,
}

impl MergeConfig {
    /// Set the conflict policy.
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }
}

/// A station fragment that could not be decoded and was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseFailure {
    pub source: String,
    pub station: String,
    pub message: String,
}

/// Two sources giving different distances for the same neighbor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborConflict {
    pub station: String,
    pub neighbor: String,
    pub kept_km: f64,
    pub discarded_km: f64,
}

/// Diagnostics collected during a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    /// Fragments absorbed into the graph, duplicates included.
    pub fragments_merged: usize,
    /// Fragments whose station had already been seen.
    pub repeated_fragments: usize,
    pub parse_failures: Vec<ParseFailure>,
    pub conflicts: Vec<NeighborConflict>,
}

/// Errors that fail a merge outright.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    /// Conflicting neighbor weights under [`ConflictPolicy::Reject`]
    #[error("{} conflicting neighbor distance(s){}", .0.len(), first_conflict(.0))]
    Conflicts(Vec<NeighborConflict>),
}

fn first_conflict(conflicts: &[NeighborConflict]) -> String {
    conflicts
        .first()
        .map(|c| {
            format!(
                ", first: {} -> {} ({} km vs {} km)",
                c.station, c.neighbor, c.kept_km, c.discarded_km
            )
        })
        .unwrap_or_default()
}

/// A station being accumulated, keyed by canonical name.
#[derive(Debug)]
struct Accumulated {
    display: String,
    record: StationRecord,
    /// canonical neighbor name → (spelling as first seen, weight)
    neighbors: BTreeMap<String, (String, f64)>,
}

/// Unions graph fragments into one [`MergedGraph`].
#[derive(Debug, Default)]
pub struct GraphMerger {
    config: MergeConfig,
    stations: HashMap<String, Accumulated>,
    report: MergeReport,
}

impl GraphMerger {
    /// Create a merger with the given configuration.
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            stations: HashMap::new(),
            report: MergeReport::default(),
        }
    }

    /// Absorb every station of a line graph.
    pub fn add_line(&mut self, line: LineGraph) {
        debug!(line = line.line(), stations = line.len(), "merging line");
        for station in line.into_stations() {
            self.absorb(&station.name, station.record);
        }
    }

    /// Absorb every fragment of a raw document, skipping undecodable ones.
    pub fn add_document(&mut self, document: RawDocument) {
        let source = document.source().to_string();
        debug!(source = %source, fragments = document.len(), "merging document");
        for (key, fragment) in document.into_entries() {
            self.add_fragment(&source, &key, fragment);
        }
    }

    /// Absorb one raw station fragment.
    ///
    /// A fragment that does not decode is recorded as a [`ParseFailure`]
    /// and skipped. Returns whether the fragment was absorbed.
    pub fn add_fragment(&mut self, source: &str, key: &str, fragment: Value) -> bool {
        let decoded = StationName::parse(key)
            .map_err(|e| e.to_string())
            .and_then(|name| StationRecord::from_fragment(fragment).map(|r| (name, r)));

        match decoded {
            Ok((name, record)) => {
                self.absorb(&name, record);
                true
            }
            Err(message) => {
                warn!(source, station = key, error = %message, "skipping unreadable station fragment");
                self.report.parse_failures.push(ParseFailure {
                    source: source.to_string(),
                    station: key.to_string(),
                    message,
                });
                false
            }
        }
    }

    /// Diagnostics collected so far.
    pub fn report(&self) -> &MergeReport {
        &self.report
    }

    /// Number of distinct stations so far.
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Finish the merge.
    ///
    /// Neighbor keys are rewritten to the spelling the named station was
    /// first seen with. Fails only under [`ConflictPolicy::Reject`] when
    /// weights disagreed.
    pub fn finish(self) -> Result<(MergedGraph, MergeReport), MergeError> {
        if self.config.conflict_policy == ConflictPolicy::Reject && !self.report.conflicts.is_empty()
        {
            return Err(MergeError::Conflicts(self.report.conflicts));
        }
        Ok(self.assemble())
    }

    fn assemble(self) -> (MergedGraph, MergeReport) {
        let spelling: HashMap<&str, &str> = self
            .stations
            .iter()
            .map(|(canonical, acc)| (canonical.as_str(), acc.display.as_str()))
            .collect();

        let graph = self
            .stations
            .values()
            .map(|acc| {
                let mut record = acc.record.clone();
                record.neighbors = acc
                    .neighbors
                    .iter()
                    .map(|(canonical, (seen_as, weight))| {
                        let key = spelling.get(canonical.as_str()).copied().unwrap_or(seen_as.as_str());
                        (key.to_string(), *weight)
                    })
                    .collect();
                (acc.display.clone(), record)
            })
            .collect::<MergedGraph>();

        debug!(
            stations = graph.len(),
            conflicts = self.report.conflicts.len(),
            parse_failures = self.report.parse_failures.len(),
            "merge finished"
        );

        (graph, self.report)
    }

    fn absorb(&mut self, name: &StationName, record: StationRecord) {
        self.report.fragments_merged += 1;

        let StationRecord {
            lat,
            lng,
            line,
            neighbors,
        } = record;

        let acc = match self.stations.entry(name.canonical().to_string()) {
            Entry::Occupied(entry) => {
                self.report.repeated_fragments += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(Accumulated {
                display: name.as_str().to_string(),
                record: StationRecord {
                    lat,
                    lng,
                    line,
                    neighbors: BTreeMap::new(),
                },
                neighbors: BTreeMap::new(),
            }),
        };

        for (neighbor, weight) in neighbors {
            let canonical = canonicalize(&neighbor);
            match acc.neighbors.get(&canonical) {
                None => {
                    acc.neighbors.insert(canonical, (neighbor, weight));
                }
                Some((_, kept)) if (kept - weight).abs() > WEIGHT_EPSILON => {
                    warn!(
                        station = %acc.display,
                        neighbor = %neighbor,
                        kept_km = kept,
                        discarded_km = weight,
                        "conflicting neighbor distance, keeping first"
                    );
                    self.report.conflicts.push(NeighborConflict {
                        station: acc.display.clone(),
                        neighbor,
                        kept_km: *kept,
                        discarded_km: weight,
                    });
                }
                Some(_) => {}
            }
        }
    }
}

/// Merge line graphs with the default configuration.
pub fn merge_lines(lines: impl IntoIterator<Item = LineGraph>) -> (MergedGraph, MergeReport) {
    let mut merger = GraphMerger::new(MergeConfig::default());
    for line in lines {
        merger.add_line(line);
    }
    merger.assemble()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{Coordinates, StationName};
    use crate::graph::line::{LineGraphBuilder, StationRow};
    use proptest::prelude::*;
    use std::collections::HashSet;

    /// A line over a subset of a small shared station pool.
    fn line(label: &'static str) -> impl Strategy<Value = LineGraph> {
        prop::sample::subsequence((0..12).collect::<Vec<u32>>(), 0..12).prop_map(move |picked| {
            let rows = picked
                .iter()
                .enumerate()
                .map(|(i, id)| StationRow {
                    name: StationName::parse(&format!("S{id}")).unwrap(),
                    distance_km: i as f64 * 1.5,
                    position: Coordinates::new(28.0, 77.0).unwrap(),
                })
                .collect();
            LineGraphBuilder::new(label).build(rows).unwrap()
        })
    }

    proptest! {
        /// Merging never drops a neighbor key and never invents stations
        #[test]
        fn merge_is_monotonic(a in line("A"), b in line("B")) {
            let union: HashSet<String> = a
                .stations()
                .iter()
                .chain(b.stations())
                .map(|s| s.name.as_str().to_string())
                .collect();

            let (graph, _) = merge_lines([a.clone(), b.clone()]);
            prop_assert_eq!(graph.len(), union.len());

            for station in a.stations().iter().chain(b.stations()) {
                let merged = graph.get(station.name.as_str()).unwrap();
                for neighbor in station.record.neighbors.keys() {
                    prop_assert!(merged.neighbors.contains_key(neighbor));
                }
            }
        }
    }
}
