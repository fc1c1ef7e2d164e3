//! Coordinate lookup for stations.
//!
//! Each station's candidate titles are tried in order, and each fetched
//! page is read with every extraction strategy in order. The first
//! position found wins. Running out of candidates is an ordinary outcome,
//! reported as [`Enrichment::NotFound`].

use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::Coordinates;
use crate::graph::MergedGraph;

use super::candidates::candidate_titles;
use super::config::EnrichConfig;
use super::error::FetchError;
use super::extract::{Strategy, extract_coordinates};
use super::limiter::RateLimiter;
use super::source::PageSource;

/// Outcome of looking up one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Enrichment {
    /// A position was found.
    Resolved {
        station: String,
        coordinates: Coordinates,
        /// Title of the page the position came from.
        candidate: String,
        strategy: Strategy,
        /// Candidates tried, including the successful one.
        attempts: usize,
    },

    /// Every candidate was tried without finding a position.
    NotFound { station: String, attempts: usize },
}

impl Enrichment {
    /// The station this outcome is for.
    pub fn station(&self) -> &str {
        match self {
            Enrichment::Resolved { station, .. } | Enrichment::NotFound { station, .. } => station,
        }
    }

    /// How many candidates were tried.
    pub fn attempts(&self) -> usize {
        match self {
            Enrichment::Resolved { attempts, .. } | Enrichment::NotFound { attempts, .. } => {
                *attempts
            }
        }
    }

    /// The position found, if any.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Enrichment::Resolved { coordinates, .. } => Some(*coordinates),
            Enrichment::NotFound { .. } => None,
        }
    }
}

/// Outcomes for a batch of stations, sorted by station name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentReport {
    pub results: Vec<Enrichment>,
}

impl EnrichmentReport {
    /// Number of stations with a position.
    pub fn resolved_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, Enrichment::Resolved { .. }))
            .count()
    }

    /// Stations without a position, in name order.
    pub fn not_found(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| matches!(r, Enrichment::NotFound { .. }))
            .map(|r| r.station().to_string())
            .collect()
    }

    /// Write every resolved position into `graph`.
    ///
    /// Returns the number of records updated. Outcomes for stations the
    /// graph does not contain are skipped.
    pub fn apply(&self, graph: &mut MergedGraph) -> usize {
        let mut updated = 0;
        for result in &self.results {
            let Some(position) = result.coordinates() else {
                continue;
            };
            match graph.get_mut(result.station()) {
                Some(record) => {
                    record.set_position(position);
                    updated += 1;
                }
                None => warn!(station = result.station(), "enriched station not in graph"),
            }
        }
        updated
    }
}

/// Looks up station positions against a [`PageSource`].
pub struct CoordinateEnricher<S> {
    source: S,
    suffixes: Vec<String>,
    limiter: RateLimiter,
    timeout: Duration,
    max_workers: usize,
}

impl<S: PageSource> CoordinateEnricher<S> {
    /// Create an enricher reading pages from `source`.
    pub fn new(source: S, config: &EnrichConfig) -> Self {
        Self {
            source,
            suffixes: config.candidate_suffixes.clone(),
            limiter: RateLimiter::new(config.request_interval()),
            timeout: config.timeout(),
            max_workers: config.max_workers.max(1),
        }
    }

    /// The underlying page source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Look up one station, trying candidates in order.
    pub async fn enrich_station(&self, station: &str) -> Enrichment {
        let candidates = candidate_titles(station, &self.suffixes);

        for (index, candidate) in candidates.iter().enumerate() {
            let attempts = index + 1;

            match self.fetch(candidate).await {
                Ok(html) => {
                    if let Some((coordinates, strategy)) = extract_coordinates(&html) {
                        debug!(station, candidate, ?strategy, attempts, "resolved coordinates");
                        return Enrichment::Resolved {
                            station: station.to_string(),
                            coordinates,
                            candidate: candidate.clone(),
                            strategy,
                            attempts,
                        };
                    }
                    debug!(station, candidate, "page has no coordinates");
                }
                Err(e) => debug!(station, candidate, error = %e, "candidate fetch failed"),
            }
        }

        debug!(station, attempts = candidates.len(), "no candidate had coordinates");
        Enrichment::NotFound {
            station: station.to_string(),
            attempts: candidates.len(),
        }
    }

    /// Look up many stations with at most `max_workers` in flight.
    ///
    /// Results are sorted by station name regardless of completion order.
    pub async fn enrich_all<I>(&self, stations: I) -> EnrichmentReport
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let stations: Vec<String> = stations
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        info!(
            stations = stations.len(),
            workers = self.max_workers,
            interval_ms = self.limiter.interval().as_millis() as u64,
            "enriching station coordinates"
        );

        let mut results: Vec<Enrichment> = stream::iter(&stations)
            .map(|station| self.enrich_station(station))
            .buffer_unordered(self.max_workers)
            .collect()
            .await;
        results.sort_by(|a, b| a.station().cmp(b.station()));

        let report = EnrichmentReport { results };
        info!(
            resolved = report.resolved_count(),
            not_found = report.results.len() - report.resolved_count(),
            "enrichment finished"
        );
        report
    }

    /// Look up every station in `graph`.
    pub async fn enrich_graph(&self, graph: &MergedGraph) -> EnrichmentReport {
        self.enrich_all(graph.names()).await
    }

    /// One rate-limited, time-bounded fetch.
    async fn fetch(&self, title: &str) -> Result<String, FetchError> {
        self.limiter.acquire().await;
        match tokio::time::timeout(self.timeout, self.source.fetch(title)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::MockPageSource;
    use crate::graph::StationRecord;
    use std::future::Future;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;
    use tokio::time::Instant;

    fn geo_dec_page(text: &str) -> String {
        format!(r#"<html><body><span class="geo-dec">{text}</span></body></html>"#)
    }

    fn geo_page(lat: f64, lng: f64) -> String {
        format!(r#"<html><body><span class="geo">{lat}; {lng}</span></body></html>"#)
    }

    /// Serves every title after a delay, recording when each fetch started
    /// and the peak number in flight.
    #[derive(Clone, Default)]
    struct ProbeSource {
        delay: Duration,
        started: Arc<Mutex<Vec<Instant>>>,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl ProbeSource {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }
    }

    impl PageSource for ProbeSource {
        fn fetch(&self, _title: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
            async move {
                self.started.lock().await.push(Instant::now());
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);

                tokio::time::sleep(self.delay).await;

                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(geo_page(28.6, 77.2))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_third_candidate() {
        let source = MockPageSource::from_pages([("Rajiv_Chowk", geo_dec_page("28.63°N 77.22°E"))]);
        let enricher = CoordinateEnricher::new(source, &EnrichConfig::default());

        let result = enricher.enrich_station("Rajiv Chowk").await;

        let position = result.coordinates().unwrap();
        assert_eq!((position.lat(), position.lng()), (28.63, 77.22));
        assert_eq!(result.attempts(), 3);
        assert!(matches!(
            &result,
            Enrichment::Resolved { candidate, strategy: Strategy::DegreeSpan, .. }
                if candidate == "Rajiv_Chowk"
        ));
        assert_eq!(
            enricher.source().requests().await,
            ["Rajiv_Chowk_metro_station", "Rajiv_Chowk_metro", "Rajiv_Chowk"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_stops_the_search() {
        let source = MockPageSource::from_pages([
            ("Dwarka_metro_station", geo_page(28.61, 77.03)),
            ("Dwarka", geo_page(0.0, 0.0)),
        ]);
        let enricher = CoordinateEnricher::new(source, &EnrichConfig::default());

        let result = enricher.enrich_station("Dwarka").await;
        assert_eq!(result.attempts(), 1);
        assert_eq!(result.coordinates().unwrap().lat(), 28.61);
        assert_eq!(enricher.source().requests().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn page_without_coordinates_moves_on() {
        let source = MockPageSource::from_pages([
            ("Hauz_Khas_metro_station", "<html><p>Disambiguation</p></html>".to_string()),
            ("Hauz_Khas_metro", geo_page(28.54, 77.20)),
        ]);
        let enricher = CoordinateEnricher::new(source, &EnrichConfig::default());

        let result = enricher.enrich_station("Hauz Khas").await;
        assert_eq!(result.attempts(), 2);
        assert!(matches!(result, Enrichment::Resolved { strategy: Strategy::DecimalSpan, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_candidates_are_not_found() {
        let enricher = CoordinateEnricher::new(MockPageSource::default(), &EnrichConfig::default());

        let result = enricher.enrich_station("Nowhere").await;
        assert_eq!(
            result,
            Enrichment::NotFound {
                station: "Nowhere".to_string(),
                attempts: 3,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_time_out() {
        let source = ProbeSource::with_delay(Duration::from_secs(60));
        let config = EnrichConfig::default()
            .with_candidate_suffixes(["_metro", ""])
            .with_timeout(2)
            .with_request_interval_ms(0);
        let enricher = CoordinateEnricher::new(source, &config);

        let start = Instant::now();
        let result = enricher.enrich_station("Mandi House").await;

        assert!(matches!(result, Enrichment::NotFound { attempts: 2, .. }));
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn spacing_holds_across_workers() {
        let source = ProbeSource::with_delay(Duration::from_millis(10));
        let config = EnrichConfig::default()
            .with_candidate_suffixes([""])
            .with_max_workers(4)
            .with_request_interval_ms(500);
        let enricher = CoordinateEnricher::new(source, &config);

        let report = enricher.enrich_all(["A", "B", "C", "D", "E", "F"]).await;
        assert_eq!(report.resolved_count(), 6);

        let mut started = enricher.source().started.lock().await.clone();
        started.sort();
        assert_eq!(started.len(), 6);
        for pair in started.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn workers_are_bounded() {
        let source = ProbeSource::with_delay(Duration::from_millis(100));
        let config = EnrichConfig::default()
            .with_candidate_suffixes([""])
            .with_max_workers(2)
            .with_request_interval_ms(0);
        let enricher = CoordinateEnricher::new(source, &config);

        let stations: Vec<String> = (0..8).map(|i| format!("S{i}")).collect();
        let report = enricher.enrich_all(&stations).await;

        assert_eq!(report.results.len(), 8);
        assert_eq!(enricher.source().peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn report_is_sorted_and_applies_positions() {
        let source = MockPageSource::from_pages([
            ("Rajiv_Chowk", geo_dec_page("28.63°N 77.22°E")),
            ("Dwarka_metro", geo_page(28.61, 77.03)),
        ]);
        let config = EnrichConfig::default().with_max_workers(3);
        let enricher = CoordinateEnricher::new(source, &config);

        let mut graph = MergedGraph::new();
        for name in ["Rajiv Chowk", "Dwarka", "Nowhere"] {
            graph.insert(
                name,
                StationRecord::new(Coordinates::new(0.0, 0.0).unwrap(), "Blue"),
            );
        }

        let report = enricher.enrich_graph(&graph).await;
        let order: Vec<&str> = report.results.iter().map(Enrichment::station).collect();
        assert_eq!(order, ["Dwarka", "Nowhere", "Rajiv Chowk"]);
        assert_eq!(report.not_found(), ["Nowhere"]);

        assert_eq!(report.apply(&mut graph), 2);
        let rajiv = graph.get("Rajiv Chowk").unwrap();
        assert_eq!((rajiv.lat, rajiv.lng), (28.63, 77.22));
        assert_eq!(graph.get("Nowhere").unwrap().lat, 0.0);
    }

    #[test]
    fn outcome_serialization() {
        let resolved = Enrichment::Resolved {
            station: "Dwarka".to_string(),
            coordinates: Coordinates::new(28.61, 77.03).unwrap(),
            candidate: "Dwarka_metro".to_string(),
            strategy: Strategy::DecimalSpan,
            attempts: 2,
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["outcome"], "resolved");
        assert_eq!(json["strategy"], "decimal_span");
        assert_eq!(json["coordinates"]["lat"], 28.61);

        let missing = Enrichment::NotFound {
            station: "Nowhere".to_string(),
            attempts: 3,
        };
        assert_eq!(serde_json::to_value(&missing).unwrap()["outcome"], "not_found");
    }
}
