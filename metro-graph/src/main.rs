use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use metro_graph::enrich::{
    CoordinateEnricher, DEFAULT_BASE_URL, EnrichConfig, EnrichmentReport, HttpPageSource,
    MockPageSource,
};
use metro_graph::graph::{ConflictPolicy, MergeConfig, MergedGraph};
use metro_graph::pipeline::{
    InputSource, MATCHED_FILE, NOT_FOUND_FILE, OutputSinks, PipelineContext, PipelineError,
    UNMATCHED_FILE, build,
};
use metro_graph::registry::{
    AuthoritativeNameSet, DEFAULT_LISTING_URL, RegistryCache, RegistryCacheConfig, RegistryClient,
    RegistryClientConfig,
};
use metro_graph::report::{self, NotFoundReport};
use metro_graph::resolve::resolve_names;

#[derive(Parser)]
#[command(name = "metro-graph", about = "Transit network graph builder")]
struct Cli {
    /// Directory artifacts are written to
    #[arg(short, long, global = true, default_value = "out")]
    out: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the merged graph from line tables and raw documents
    Build {
        /// Station table, one per line; the file stem is the line label (repeatable)
        #[arg(short, long = "table", required = true)]
        tables: Vec<PathBuf>,

        /// Raw graph document to merge in (repeatable)
        #[arg(short, long = "document")]
        documents: Vec<PathBuf>,

        /// Handling of conflicting neighbor distances: first-wins, reject
        #[arg(long, default_value_t = ConflictPolicy::FirstWins)]
        conflict_policy: ConflictPolicy,

        /// Also look up coordinates for every station
        #[arg(long)]
        enrich: bool,

        #[command(flatten)]
        registry: RegistryArgs,

        #[command(flatten)]
        pages: PageArgs,
    },

    /// Check a built graph's names against the registry
    Resolve {
        /// Graph artifact to check
        graph: PathBuf,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Look up coordinates for the stations of a built graph
    Enrich {
        /// Graph artifact to enrich
        graph: PathBuf,

        #[command(flatten)]
        pages: PageArgs,
    },
}

#[derive(Args)]
struct RegistryArgs {
    /// Plain-text registry, one name per line
    #[arg(long, conflicts_with = "registry_url")]
    registry_file: Option<PathBuf>,

    /// Listing page to read the registry from
    #[arg(long)]
    registry_url: Option<String>,

    /// Cache file for the listing page
    #[arg(long, default_value = "registry_cache.json")]
    registry_cache: PathBuf,

    /// Hours a cached listing stays valid
    #[arg(long, default_value_t = 24)]
    registry_ttl_hours: u64,
}

impl RegistryArgs {
    fn requested(&self) -> bool {
        self.registry_file.is_some() || self.registry_url.is_some()
    }

    async fn load(&self) -> Result<AuthoritativeNameSet, PipelineError> {
        if let Some(path) = &self.registry_file {
            let names = AuthoritativeNameSet::from_file(path)?;
            info!(path = %path.display(), names = names.len(), "loaded registry file");
            return Ok(names);
        }

        let url = self.registry_url.as_deref().unwrap_or(DEFAULT_LISTING_URL);
        let client = RegistryClient::new(RegistryClientConfig::new().with_listing_url(url))?;
        let cache = RegistryCache::new(
            RegistryCacheConfig::new(&self.registry_cache)
                .with_ttl(Duration::from_secs(self.registry_ttl_hours * 60 * 60)),
        );
        Ok(AuthoritativeNameSet::fetch(&client, &cache).await?)
    }
}

#[derive(Args)]
struct PageArgs {
    /// Read pages from saved `{title}.html` files instead of the network
    #[arg(long)]
    pages_dir: Option<PathBuf>,

    /// Site pages are fetched from
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Stations looked up at once
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Minimum spacing between requests, in milliseconds
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

impl PageArgs {
    fn config(&self) -> EnrichConfig {
        EnrichConfig::default()
            .with_base_url(&self.base_url)
            .with_max_workers(self.workers)
            .with_request_interval_ms(self.interval_ms)
            .with_timeout(self.timeout_secs)
    }

    async fn enrich(&self, graph: &MergedGraph) -> Result<EnrichmentReport, PipelineError> {
        let config = self.config();
        let report = match &self.pages_dir {
            Some(dir) => {
                let source = MockPageSource::from_dir(dir)
                    .map_err(|e| PipelineError::unusable(dir.display().to_string(), e))?;
                info!(dir = %dir.display(), pages = source.len(), "serving saved pages");
                CoordinateEnricher::new(source, &config).enrich_graph(graph).await
            }
            None => {
                let source = HttpPageSource::new(&config)?;
                CoordinateEnricher::new(source, &config).enrich_graph(graph).await
            }
        };
        Ok(report)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), PipelineError> {
    match cli.command {
        Commands::Build {
            tables,
            documents,
            conflict_policy,
            enrich,
            registry,
            pages,
        } => {
            let mut ctx = PipelineContext::new()
                .with_merge_config(MergeConfig::default().with_conflict_policy(conflict_policy))
                .with_sinks(OutputSinks::in_dir(&cli.out));
            ctx.tables = tables.into_iter().map(InputSource::from).collect();
            ctx.documents = documents.into_iter().map(InputSource::from).collect();
            if registry.requested() {
                ctx.registry = Some(registry.load().await?);
            }

            let mut output = build(&ctx)?;
            if enrich {
                let enrichment = pages.enrich(&output.graph).await?;
                output.apply_enrichment(enrichment);
            }
            output.write(&ctx.sinks)?;

            info!(
                stations = output.graph.len(),
                failed_lines = output.report.line_failures.len(),
                out = %cli.out.display(),
                "build complete"
            );
        }

        Commands::Resolve { graph, registry } => {
            let graph = read_graph(&graph)?;
            let names = registry.load().await?;
            let resolution = resolve_names(&graph, &names);

            write_artifact(&cli.out.join(MATCHED_FILE), |path| {
                report::write_json(path, &resolution.matched)
            })?;
            write_artifact(&cli.out.join(UNMATCHED_FILE), |path| {
                report::write_lines(path, &resolution.unmatched)
            })?;
        }

        Commands::Enrich { graph: path, pages } => {
            let mut graph = read_graph(&path)?;
            let enrichment = pages.enrich(&graph).await?;
            let updated = enrichment.apply(&mut graph);
            info!(updated, "applied coordinates");

            let file_name = path.file_name().map(PathBuf::from).unwrap_or_else(|| "graph.json".into());
            write_artifact(&cli.out.join(file_name), |p| report::write_json(p, &graph))?;
            write_artifact(&cli.out.join(NOT_FOUND_FILE), |p| {
                report::write_json(p, &NotFoundReport::new(enrichment.not_found()))
            })?;
        }
    }

    Ok(())
}

fn read_graph(path: &Path) -> Result<MergedGraph, PipelineError> {
    let source = InputSource::from(path);
    MergedGraph::from_json(&source.read()?).map_err(|e| PipelineError::unusable(source.name(), e))
}

fn write_artifact(
    path: &Path,
    write: impl FnOnce(&Path) -> std::io::Result<()>,
) -> Result<(), PipelineError> {
    write(path).map_err(|source| PipelineError::Sink {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "wrote artifact");
    Ok(())
}
