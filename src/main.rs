use anyhow::Context;
use clap::Parser;
use docindex::cache::{IndexCache, build_cached};
use docindex::cli::{Cli, Commands};
use docindex::format::{self, OutputFormat};
use docindex::search::{ObjectKind, QueryOptions, SearchIndex};
use docindex::server::DocIndexServer;
use docindex::tools::{
    LookupObjectRequest, SearchRequest, handle_lookup_object, handle_search,
};
use docindex::{Config, pages};
use rmcp::{ServiceExt, transport::stdio};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    docindex::tracing::init(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            source,
            output,
            js,
            no_cache,
        } => build(&config, &source, output, js, no_cache).await,
        Commands::Search {
            index,
            query,
            limit,
        } => {
            let loaded = load_index(&index).await?;
            let request = SearchRequest { query, limit };
            print_tool_output(handle_search(&loaded, &config.query, request))
        }
        Commands::Objects {
            index,
            name,
            kind,
            limit,
        } => objects(&config.query, &index, name, kind, limit).await,
        Commands::Serve { index } => serve(&config.query, index).await,
    }
}

async fn build(
    config: &Config,
    source: &Path,
    output: Option<PathBuf>,
    js: bool,
    no_cache: bool,
) -> anyhow::Result<()> {
    let pages = pages::collect_pages(source)?;
    let cache = if no_cache {
        None
    } else {
        IndexCache::from_config(&config.cache)
    };

    let index = build_cached(source, &pages, &config.tokenizer, cache.as_ref())
        .with_context(|| format!("Failed to build index from {}", source.display()))?;

    let format = if js {
        OutputFormat::Js
    } else {
        OutputFormat::Json
    };
    let rendered = format.render(&index).context("Failed to serialize index")?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("Failed to write index to {}", path.display()))?;
            tracing::info!(
                "Wrote index of {} documents to {}",
                index.document_count(),
                path.display()
            );
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

async fn objects(
    options: &QueryOptions,
    index: &Path,
    name: String,
    kind: Option<ObjectKind>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let loaded = load_index(index).await?;
    let request = LookupObjectRequest { name, kind, limit };
    print_tool_output(handle_lookup_object(&loaded, options.default_limit, request))
}

async fn serve(options: &QueryOptions, path: PathBuf) -> anyhow::Result<()> {
    let index = load_index(&path).await?;

    tracing::info!(
        "Starting docindex MCP server for {} ({} documents)",
        path.display(),
        index.document_count()
    );

    let server = DocIndexServer::new(Arc::new(index), options.clone()).with_source(path);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    // Wait for the service to complete
    service.waiting().await?;

    Ok(())
}

/// Reads and validates a persisted index (JSON or JS wrapper).
async fn load_index(path: &Path) -> anyhow::Result<SearchIndex> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read index {}", path.display()))?;
    let index =
        format::parse(&content).with_context(|| format!("Invalid index {}", path.display()))?;

    tracing::debug!(
        "Loaded {} documents and {} objects from {}",
        index.document_count(),
        index.objects().len(),
        path.display()
    );
    Ok(index)
}

fn print_tool_output(result: Result<String, String>) -> anyhow::Result<()> {
    match result {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(message) => anyhow::bail!(message),
    }
}
