//! Page-title guesses for a station.

/// Build the ordered page-title candidates for `station`.
///
/// The trimmed name has its spaces replaced by underscores, then each
/// suffix is appended in order. Repeated titles are dropped, keeping the
/// first.
pub fn candidate_titles(station: &str, suffixes: &[String]) -> Vec<String> {
    let base = station.split_whitespace().collect::<Vec<_>>().join("_");
    if base.is_empty() {
        return Vec::new();
    }

    let mut titles: Vec<String> = Vec::with_capacity(suffixes.len());
    for suffix in suffixes {
        let title = format!("{base}{suffix}");
        if !titles.contains(&title) {
            titles.push(title);
        }
    }
    titles
}
