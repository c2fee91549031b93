mod render;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use docportal_core::{
    discover_manifest, load_manifest, DocumentDescriptor, DocumentIndex, DocumentSource,
    IndexOptions, LopdfExtractor,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docportal", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory relative locators are resolved against
    #[arg(long, env = "DOCPORTAL_ROOT")]
    root: Option<PathBuf>,

    /// Base URL relative locators are fetched from; wins over --root
    #[arg(long, env = "DOCPORTAL_BASE_URL")]
    base_url: Option<url::Url>,

    /// Pages extracted from the front of each document
    #[arg(long, env = "DOCPORTAL_MAX_PAGES", default_value = "5")]
    max_pages: u32,

    /// Only ingest the first N indexable documents
    #[arg(long, env = "DOCPORTAL_MAX_DOCUMENTS")]
    max_documents: Option<usize>,

    /// Documents fetched at the same time
    #[arg(long, env = "DOCPORTAL_CONCURRENCY", default_value = "4")]
    concurrency: usize,

    /// Per-document fetch and extraction timeout
    #[arg(long, env = "DOCPORTAL_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ManifestSource {
    /// JSON manifest: [{"title", "locator" | "path", "category"}]
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Build the manifest from every file under this folder
    #[arg(long)]
    folder: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest the manifest and print grounding snippets for a question.
    Search {
        #[command(flatten)]
        source: ManifestSource,

        /// Free-text question
        #[arg(long)]
        query: String,

        /// Number of snippets to return
        #[arg(long, default_value = "2")]
        limit: usize,
    },
    /// Ingest the manifest and list indexed and skipped documents.
    Documents {
        #[command(flatten)]
        source: ManifestSource,
    },
}

impl Cli {
    fn index_options(&self) -> IndexOptions {
        IndexOptions {
            max_pages: self.max_pages,
            max_documents: self.max_documents,
            concurrency: self.concurrency,
            fetch_timeout: Duration::from_secs(self.timeout_secs),
            ..IndexOptions::default()
        }
    }

    fn document_source(&self, source: &ManifestSource) -> DocumentSource {
        let mut documents = DocumentSource::new();
        if let Some(root) = self.root.as_ref().or(source.folder.as_ref()) {
            documents = documents.with_root(root);
        }
        if let Some(base_url) = &self.base_url {
            documents = documents.with_base_url(base_url.clone());
        }
        documents
    }
}

impl ManifestSource {
    fn load(&self) -> anyhow::Result<Vec<DocumentDescriptor>> {
        let manifest = match (&self.manifest, &self.folder) {
            (Some(path), _) => load_manifest(path)?,
            (None, Some(folder)) => discover_manifest(folder)?,
            (None, None) => anyhow::bail!("either --manifest or --folder is required"),
        };
        Ok(manifest)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "docportal boot"
    );

    match &cli.command {
        Command::Search {
            source,
            query,
            limit,
        } => {
            let options = IndexOptions {
                result_limit: *limit,
                ..cli.index_options()
            };
            let index = DocumentIndex::with_options(
                LopdfExtractor::new(cli.document_source(source)),
                options,
            );
            index.initialize(&source.load()?).await;

            let hits = index.search(query);
            info!(query = %query, hits = hits.len(), documents = index.len(), "search finished");
            println!("{}", render::grounding_block(query, &hits));
        }
        Command::Documents { source } => {
            let index = DocumentIndex::with_options(
                LopdfExtractor::new(cli.document_source(source)),
                cli.index_options(),
            );
            index.initialize(&source.load()?).await;

            print!("{}", render::document_listing(&index));
            println!(
                "{} indexed, {} skipped at {}",
                index.len(),
                index.skipped().len(),
                Utc::now().to_rfc3339()
            );
        }
    }

    Ok(())
}
