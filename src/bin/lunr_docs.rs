//! MCP server binary speaking newline-delimited JSON-RPC on stdin/stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lunr_docs::config::ConfigSources;
use lunr_docs::host::{McpHandler, run_stdio_bridge};
use lunr_docs::tools::ToolRegistry;
use lunr_search::{IndexCache, PageRetriever};

#[derive(Parser)]
#[command(
    name = "lunr-docs",
    about = "Search published Lunr.js documentation indexes over MCP",
    version
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site to serve as KEY=URL, or KEY=URL|URL for a dual index (repeatable)
    #[arg(short, long = "site", value_name = "KEY=URL")]
    sites: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("lunr_docs=info,lunr_search=info")
            }),
        )
        .init();

    let config = ConfigSources::from_env(cli.config, cli.sites)
        .load()
        .context("failed to load configuration")?;
    let sites = config.site_configs().context("invalid configuration")?;

    tracing::info!(
        sites = sites.len(),
        keys = %sites.iter().map(|s| s.key()).collect::<Vec<_>>().join(","),
        "lunr-docs starting"
    );

    let cache = Arc::new(
        IndexCache::new(sites, &config.search).context("failed to build index cache")?,
    );
    let retriever = PageRetriever::new(&config.search).context("failed to build page retriever")?;
    let handler = McpHandler::new(ToolRegistry::for_sites(cache, retriever));

    run_stdio_bridge(handler).await.map_err(|e| {
        tracing::error!(error = %e, "lunr-docs exited with error");
        anyhow::anyhow!("lunr-docs failed: {e}")
    })?;

    tracing::info!("lunr-docs shut down cleanly");
    Ok(())
}
