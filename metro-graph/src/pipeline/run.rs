//! Stage sequencing.

use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::enrich::{CoordinateEnricher, EnrichmentReport, PageSource};
use crate::graph::{GraphMerger, LineGraphBuilder, MergedGraph, RawDocument, classify_interchanges};
use crate::report::{self, BuildReport, LineFailure, NotFoundReport};
use crate::resolve::{Resolution, resolve_names};

use super::context::{OutputSinks, PipelineContext};
use super::error::PipelineError;
use super::tables::read_table;

/// Results of a run, ready to be written.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub graph: MergedGraph,
    pub report: BuildReport,
    /// Present when the context carried a registry.
    pub resolution: Option<Resolution>,
    /// Present once [`PipelineOutput::enrich`] has run.
    pub enrichment: Option<EnrichmentReport>,
}

/// Build, merge, classify and (with a registry) resolve.
///
/// A line that fails to build is reported and left out. Unreadable
/// inputs and a rejected merge abort the run.
pub fn build(ctx: &PipelineContext) -> Result<PipelineOutput, PipelineError> {
    let mut merger = GraphMerger::new(ctx.merge.clone());
    let mut line_failures = Vec::new();
    let mut lines_built = 0;

    for table in &ctx.tables {
        let rows = read_table(table)?;
        match LineGraphBuilder::new(table.line_label()).build_raw(&rows) {
            Ok(line) => {
                lines_built += 1;
                merger.add_line(line);
            }
            Err(e) => {
                warn!(source = %table.name(), error = %e, "skipping line");
                line_failures.push(LineFailure::new(table.name(), &e));
            }
        }
    }

    for source in &ctx.documents {
        let text = source.read()?;
        let document =
            RawDocument::parse(source.name(), &text).map_err(|e| PipelineError::unusable(source.name(), e))?;
        merger.add_document(document);
    }

    debug!(
        stations = merger.station_count(),
        conflicts = merger.report().conflicts.len(),
        parse_failures = merger.report().parse_failures.len(),
        "merged all inputs"
    );
    let (mut graph, merge_report) = merger.finish()?;
    let interchanges = classify_interchanges(&mut graph);
    let asymmetric_edges = graph.asymmetric_edges();
    if !asymmetric_edges.is_empty() {
        warn!(edges = asymmetric_edges.len(), "graph has asymmetric edges");
    }

    info!(
        lines = lines_built,
        failed_lines = line_failures.len(),
        stations = graph.len(),
        interchanges,
        "built graph"
    );

    let resolution = ctx.registry.as_ref().map(|registry| resolve_names(&graph, registry));

    let report = BuildReport {
        generated_at: Utc::now(),
        lines_built,
        line_failures,
        merge: merge_report,
        interchanges,
        stations: graph.len(),
        asymmetric_edges,
    };

    Ok(PipelineOutput {
        graph,
        report,
        resolution,
        enrichment: None,
    })
}

impl PipelineOutput {
    /// Look up coordinates for every station and write the ones found into
    /// the graph and the matched subset.
    pub async fn enrich<S: PageSource>(&mut self, enricher: &CoordinateEnricher<S>) {
        let enrichment = enricher.enrich_graph(&self.graph).await;
        self.apply_enrichment(enrichment);
    }

    /// Record an enrichment and write its positions into the graph and the
    /// matched subset.
    pub fn apply_enrichment(&mut self, enrichment: EnrichmentReport) {
        let updated = enrichment.apply(&mut self.graph);
        if let Some(resolution) = &mut self.resolution {
            enrichment.apply(&mut resolution.matched);
        }
        info!(updated, not_found = enrichment.not_found().len(), "applied coordinates");
        self.enrichment = Some(enrichment);
    }

    /// Write every artifact that has both a destination and content.
    pub fn write(&self, sinks: &OutputSinks) -> Result<(), PipelineError> {
        if let Some(path) = &sinks.graph {
            write_json(path, &self.graph)?;
        }
        if let Some(path) = &sinks.build_report {
            write_json(path, &self.report)?;
        }
        if let Some(resolution) = &self.resolution {
            if let Some(path) = &sinks.matched {
                write_json(path, &resolution.matched)?;
            }
            if let Some(path) = &sinks.unmatched {
                report::write_lines(path, &resolution.unmatched).map_err(|e| sink_error(path, e))?;
            }
        }
        if let Some(enrichment) = &self.enrichment
            && let Some(path) = &sinks.not_found
        {
            write_json(path, &NotFoundReport::new(enrichment.not_found()))?;
        }
        Ok(())
    }
}

/// Build, optionally enrich, and write to the context's sinks.
pub async fn run<S: PageSource>(
    ctx: &PipelineContext,
    enricher: Option<&CoordinateEnricher<S>>,
) -> Result<PipelineOutput, PipelineError> {
    let mut output = build(ctx)?;
    if let Some(enricher) = enricher {
        output.enrich(enricher).await;
    }
    output.write(&ctx.sinks)?;
    Ok(output)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    report::write_json(path, value).map_err(|e| sink_error(path, e))?;
    info!(path = %path.display(), "wrote artifact");
    Ok(())
}

fn sink_error(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::Sink {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{EnrichConfig, MockPageSource};
    use crate::graph::{ConflictPolicy, INTERCHANGE_LINE, MergeConfig};
    use crate::pipeline::InputSource;
    use crate::registry::AuthoritativeNameSet;
    use tempfile::tempdir;

    const HEADER: &str = "Station Name,Distance from Start (km),Latitude,Longitude";

    fn table(name: &str, rows: &[&str]) -> InputSource {
        let mut text = format!("{HEADER}\n");
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        InputSource::inline(name, text)
    }

    fn two_lines() -> PipelineContext {
        PipelineContext::new()
            .with_table(table(
                "Red.csv",
                &["A,0,28.60,77.20", "B,1.5,28.61,77.21", "C,3.0,28.62,77.22"],
            ))
            .with_table(table(
                "Blue.csv",
                &["X,0,28.50,77.10", "b,2.0,28.61,77.21", "Y,4.0,28.70,77.30"],
            ))
    }

    #[test]
    fn builds_merges_and_classifies() {
        let output = build(&two_lines()).unwrap();

        assert_eq!(output.graph.len(), 5);
        let b = output.graph.get("B").unwrap();
        assert_eq!(b.line, INTERCHANGE_LINE);
        assert_eq!(b.degree(), 4);
        assert_eq!(b.neighbors["X"], 2.0);
        assert_eq!(output.graph.get("X").unwrap().neighbors["B"], 2.0);

        assert_eq!(output.report.lines_built, 2);
        assert_eq!(output.report.interchanges, 1);
        assert!(output.report.asymmetric_edges.is_empty());
        assert!(output.resolution.is_none());
    }

    #[test]
    fn bad_line_is_reported_not_fatal() {
        let ctx = two_lines().with_table(table(
            "Green.csv",
            &["P,0,28.0,77.0", "Q,0,28.1,77.1"],
        ));

        let output = build(&ctx).unwrap();
        assert_eq!(output.report.lines_built, 2);
        assert_eq!(output.report.line_failures.len(), 1);
        assert_eq!(output.report.line_failures[0].line, "Green");
        assert!(!output.graph.contains("P"));
    }

    #[test]
    fn table_without_headers_aborts() {
        let ctx = two_lines().with_table(InputSource::inline("Broken.csv", "name,km\nA,0\n"));
        assert!(matches!(
            build(&ctx),
            Err(PipelineError::Source { input, .. }) if input == "Broken.csv"
        ));
    }

    #[test]
    fn documents_merge_with_tables() {
        let doc = r#"{"stations": {
            "Z": {"lat": 28.9, "lng": 77.9, "line": "Pink", "neighbors": {"A": 1.0}},
            "Z": {"lat": 0.0, "lng": 0.0, "line": "Ignored", "neighbors": {"C": 2.0}},
            "Bad": {"lat": "north"}
        }}"#;
        let ctx = two_lines().with_document(InputSource::inline("extra.json", doc));

        let output = build(&ctx).unwrap();
        let z = output.graph.get("Z").unwrap();
        assert_eq!(z.line, "Pink");
        assert_eq!(z.degree(), 2);
        assert_eq!(output.report.merge.parse_failures.len(), 1);
        assert_eq!(output.report.asymmetric_edges.len(), 2);
    }

    #[test]
    fn invalid_document_aborts() {
        let ctx = two_lines().with_document(InputSource::inline("extra.json", "{not json"));
        assert!(matches!(build(&ctx), Err(PipelineError::Source { .. })));
    }

    #[test]
    fn reject_policy_fails_on_conflict() {
        let ctx = two_lines()
            .with_table(table("Red Branch.csv", &["A,0,28.60,77.20", "B,9.0,28.61,77.21"]))
            .with_merge_config(MergeConfig::default().with_conflict_policy(ConflictPolicy::Reject));
        assert!(matches!(build(&ctx), Err(PipelineError::Merge(_))));
    }

    #[test]
    fn registry_partitions_output() {
        let ctx = two_lines().with_registry(AuthoritativeNameSet::from_names(["a", "B", "c"]));
        let resolution = build(&ctx).unwrap().resolution.unwrap();
        assert_eq!(resolution.matched.len(), 3);
        assert_eq!(resolution.unmatched, ["X", "Y"]);
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_writes_artifacts() {
        let dir = tempdir().unwrap();
        let ctx = two_lines()
            .with_registry(AuthoritativeNameSet::from_names(["A", "B", "C"]))
            .with_sinks(OutputSinks::in_dir(dir.path()));

        let pages = MockPageSource::from_pages([(
            "A_metro_station",
            r#"<span class="geo">28.6001; 77.2001</span>"#,
        )]);
        let enricher = CoordinateEnricher::new(pages, &EnrichConfig::default().with_max_workers(2));

        let output = run(&ctx, Some(&enricher)).await.unwrap();
        assert_eq!(output.graph.get("A").unwrap().lat, 28.6001);
        assert_eq!(output.resolution.as_ref().unwrap().matched.get("A").unwrap().lat, 28.6001);

        let graph = MergedGraph::from_json(
            &std::fs::read_to_string(dir.path().join("graph.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(graph, output.graph);

        let unmatched = std::fs::read_to_string(dir.path().join("unmatched.txt")).unwrap();
        assert_eq!(unmatched, "X\nY\n");

        let not_found: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("not_found.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(not_found["not_found"], serde_json::json!(["B", "C", "X", "Y"]));

        assert!(dir.path().join("matched.json").exists());
        assert!(dir.path().join("build_report.json").exists());
    }

    #[tokio::test]
    async fn without_enricher_no_not_found_file() {
        let dir = tempdir().unwrap();
        let ctx = two_lines().with_sinks(OutputSinks::in_dir(dir.path()));

        run::<MockPageSource>(&ctx, None).await.unwrap();

        assert!(dir.path().join("graph.json").exists());
        assert!(!dir.path().join("not_found.json").exists());
        assert!(!dir.path().join("unmatched.txt").exists());
    }
}
