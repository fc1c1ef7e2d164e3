//! Reader for raw graph documents that repeat keys.
//!
//! Hand-assembled sources often concatenate several per-line graphs, so the
//! same station key (and even the `"stations"` key itself) can appear many
//! times. A normal map deserializer keeps only the last occurrence. This
//! reader keeps every `(key, fragment)` pair in document order instead.

use std::fmt;

use serde::de::{Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::Value;

/// Top-level key holding station fragments.
const STATIONS_KEY: &str = "stations";

/// A raw document: every station fragment, in order, duplicates included.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    source: String,
    entries: Vec<(String, Value)>,
}

impl RawDocument {
    /// Parse a document.
    ///
    /// The text may hold several top-level JSON objects back to back. Each
    /// object may contain any number of `"stations"` sections; other keys
    /// are ignored. Fragments are not validated here.
    pub fn parse(source: impl Into<String>, text: &str) -> Result<Self, serde_json::Error> {
        let mut entries = Vec::new();
        for sections in serde_json::Deserializer::from_str(text).into_iter::<StationSections>() {
            entries.extend(sections?.0);
        }

        Ok(Self {
            source: source.into(),
            entries,
        })
    }

    /// Name of the source this document was read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All `(station key, fragment)` pairs in document order.
    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    /// Consume the document, yielding its pairs.
    pub fn into_entries(self) -> Vec<(String, Value)> {
        self.entries
    }

    /// Number of fragments, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document holds no fragments.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All station fragments of one top-level object.
struct StationSections(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for StationSections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SectionsVisitor;

        impl<'de> Visitor<'de> for SectionsVisitor {
            type Value = StationSections;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object with a \"stations\" map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    if key == STATIONS_KEY {
                        let OrderedEntries(section) = map.next_value()?;
                        entries.extend(section);
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(StationSections(entries))
            }
        }

        deserializer.deserialize_map(SectionsVisitor)
    }
}

/// A JSON object read as an ordered list of pairs.
struct OrderedEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of station name to station")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, Value>()? {
                    entries.push(entry);
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
