//! Coordinate extraction from fetched pages.
//!
//! Two strategies, tried in order:
//! 1. the machine-readable `span.geo` whose text is `"lat; lng"`;
//! 2. the human-readable `span.geo-dec` whose text is like
//!    `"28.63°N 77.22°E"`, where the hemisphere letter gives the sign.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Serialize;

use crate::domain::Coordinates;

static GEO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.geo").expect("valid geo selector"));

static GEO_DEC_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.geo-dec").expect("valid geo-dec selector"));

/// Which extraction strategy produced a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Decimal `"lat; lng"` span.
    DecimalSpan,
    /// Degree and hemisphere-letter span.
    DegreeSpan,
}

/// Find the first position on a page, trying each strategy in order.
pub fn extract_coordinates(html: &str) -> Option<(Coordinates, Strategy)> {
    let document = Html::parse_document(html);

    let span_texts = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .map(|span| span.text().collect::<String>())
            .collect()
    };

    if let Some(position) = span_texts(&GEO_SELECTOR)
        .iter()
        .find_map(|text| parse_decimal_pair(text))
    {
        return Some((position, Strategy::DecimalSpan));
    }

    span_texts(&GEO_DEC_SELECTOR)
        .iter()
        .find_map(|text| parse_degree_pair(text))
        .map(|position| (position, Strategy::DegreeSpan))
}

/// Parse `"28.6328; 77.2197"`.
pub fn parse_decimal_pair(text: &str) -> Option<Coordinates> {
    let (lat, lng) = text.split_once(';')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lng = lng.trim().parse::<f64>().ok()?;
    Coordinates::new(lat, lng).ok()
}

/// Parse `"28.63°N 77.22°E"`.
///
/// The first token must carry `N`/`S` and the second `E`/`W`, in either
/// case. `S` and `W` make the value negative.
pub fn parse_degree_pair(text: &str) -> Option<Coordinates> {
    let mut tokens = text.split_whitespace();
    let lat = parse_hemisphere_value(tokens.next()?, 'N', 'S')?;
    let lng = parse_hemisphere_value(tokens.next()?, 'E', 'W')?;
    Coordinates::new(lat, lng).ok()
}

fn parse_hemisphere_value(token: &str, positive: char, negative: char) -> Option<f64> {
    let token = token.replace('°', "");
    let mut chars = token.chars();
    let hemisphere = chars.next_back()?.to_ascii_uppercase();
    let magnitude = chars.as_str().parse::<f64>().ok()?;
    if magnitude < 0.0 {
        return None;
    }

    if hemisphere == positive {
        Some(magnitude)
    } else if hemisphere == negative {
        Some(-magnitude)
    } else {
        None
    }
}
