//! Station name types.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Error returned when parsing an invalid station name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station name: {reason}")]
pub struct InvalidStationName {
    reason: &'static str,
}

/// Normalize a raw station name into its canonical lookup form.
///
/// Trims surrounding whitespace and case-folds.
pub fn canonicalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A station name as it appears in source data, paired with its canonical form.
///
/// Equality and hashing use only the canonical form, so `"Rajiv Chowk"` and
/// `" rajiv chowk "` name the same station while each keeps its own spelling
/// for display.
///
/// # Examples
///
/// ```
/// use metro_graph::domain::StationName;
///
/// let a = StationName::parse("  Rajiv Chowk ").unwrap();
/// assert_eq!(a.as_str(), "Rajiv Chowk");
/// assert_eq!(a.canonical(), "rajiv chowk");
///
/// let b = StationName::parse("RAJIV CHOWK").unwrap();
/// assert_eq!(a, b);
///
/// assert!(StationName::parse("   ").is_err());
/// ```
#[derive(Clone)]
pub struct StationName {
    display: String,
    canonical: String,
}

impl StationName {
    /// Parse a station name, trimming whitespace.
    ///
    /// The name must contain at least one non-whitespace character.
    pub fn parse(s: &str) -> Result<Self, InvalidStationName> {
        let display = s.trim();
        if display.is_empty() {
            return Err(InvalidStationName {
                reason: "must not be empty",
            });
        }

        Ok(Self {
            display: display.to_string(),
            canonical: canonicalize(display),
        })
    }

    /// Returns the trimmed name as written in the source.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Returns the canonical (trimmed, case-folded) form.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for StationName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for StationName {}

impl Hash for StationName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Debug for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationName({})", self.display)
    }
}

impl fmt::Display for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims() {
        let name = StationName::parse("\tKashmere Gate \n").unwrap();
        assert_eq!(name.as_str(), "Kashmere Gate");
        assert_eq!(name.canonical(), "kashmere gate");
    }

    #[test]
    fn reject_blank() {
        assert!(StationName::parse("").is_err());
        assert!(StationName::parse("   ").is_err());
    }

    #[test]
    fn equality_is_case_insensitive() {
        let a = StationName::parse("Hauz Khas").unwrap();
        let b = StationName::parse("hauz khas").unwrap();
        let c = StationName::parse("Hauz Rani").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn hash_consistent_with_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(StationName::parse("Dwarka").unwrap());
        assert!(set.contains(&StationName::parse("DWARKA").unwrap()));
        assert!(!set.contains(&StationName::parse("Dwarka Mor").unwrap()));
    }

    #[test]
    fn display_and_debug() {
        let name = StationName::parse("Botanical Garden").unwrap();
        assert_eq!(format!("{}", name), "Botanical Garden");
        assert_eq!(format!("{:?}", name), "StationName(Botanical Garden)");
    }

    #[test]
    fn canonicalize_folds_unicode() {
        assert_eq!(canonicalize("  ÉCOLE "), "école");
    }
}
