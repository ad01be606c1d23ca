use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use codegraph::config::{Config, DEFAULT_CONFIG_PATH};
use codegraph::indexer::index_folder;

/// Build a code graph of a source tree.
#[derive(Parser)]
#[command(name = "codegraph", about = "Extract entities and their call graph from a source tree")]
#[command(version)]
struct Cli {
    /// Root folder to index
    root: PathBuf,

    /// JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Output path for nodes (overrides the config)
    #[arg(long)]
    nodes: Option<String>,

    /// Output path for links (overrides the config)
    #[arg(long)]
    links: Option<String>,

    /// Process files on a single thread
    #[arg(long)]
    sequential: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // 1. Load config
    let mut config = Config::load(&cli.config)?;
    if let Some(nodes) = cli.nodes {
        config.nodes_output = nodes;
    }
    if let Some(links) = cli.links {
        config.links_output = links;
    }
    if cli.sequential {
        config.parallel = false;
    }
    config.validate().context("invalid configuration")?;

    // 2. Build the graph
    info!("Indexing {}", cli.root.display());
    let (codebase, _stats) = index_folder(&cli.root, &config)?;

    // 3. Write outputs
    let nodes_path = Path::new(&config.nodes_output);
    let links_path = Path::new(&config.links_output);
    codebase
        .write_json(nodes_path, links_path)
        .with_context(|| format!("failed to write {} / {}", config.nodes_output, config.links_output))?;

    info!("Wrote {} and {}", config.nodes_output, config.links_output);
    Ok(())
}
