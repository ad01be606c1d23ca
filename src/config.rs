/// Configuration module for codegraph.
///
/// Handles loading, validating, and providing default configuration values
/// for a graph run.
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indexer::languages::EXCLUDED_SUFFIXES;

pub const DEFAULT_CONFIG_PATH: &str = "codegraph.json";

// ── Default value functions ──────────────────────────────────────────

fn default_excluded_folders() -> Vec<String> {
    [".git", ".vscode", "venv", "node_modules", "dist", "__pycache__"]
        .map(String::from)
        .to_vec()
}

fn default_excluded_extensions() -> Vec<String> {
    EXCLUDED_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

fn default_nodes_output() -> String {
    "nodes.json".to_string()
}

fn default_links_output() -> String {
    "links.json".to_string()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Folder names skipped at any depth.
    #[serde(default = "default_excluded_folders")]
    pub excluded_folders: Vec<String>,

    /// File suffixes skipped even when the extension is supported.
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,

    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    #[serde(default)]
    pub include_hidden: bool,

    #[serde(default = "default_true")]
    pub parallel: bool,

    #[serde(default = "default_nodes_output")]
    pub nodes_output: String,

    #[serde(default = "default_links_output")]
    pub links_output: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            excluded_folders: default_excluded_folders(),
            excluded_extensions: default_excluded_extensions(),
            respect_gitignore: default_true(),
            include_hidden: false,
            parallel: default_true(),
            nodes_output: default_nodes_output(),
            links_output: default_links_output(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"codegraph.json"`. A missing
    /// file or invalid JSON yields the default config.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            DEFAULT_CONFIG_PATH
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.nodes_output.is_empty(), "nodes_output must not be empty");
        anyhow::ensure!(!self.links_output.is_empty(), "links_output must not be empty");
        anyhow::ensure!(
            self.nodes_output != self.links_output,
            "nodes_output and links_output must differ"
        );
        Ok(())
    }

    /// Compile the exclusions into one matcher for root-relative paths.
    pub fn exclusion_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for folder in &self.excluded_folders {
            for pattern in [format!("**/{folder}"), format!("**/{folder}/**")] {
                builder.add(Glob::new(&pattern).with_context(|| format!("invalid folder exclusion: {folder}"))?);
            }
        }
        for suffix in &self.excluded_extensions {
            let pattern = format!("**/*{suffix}");
            builder.add(Glob::new(&pattern).with_context(|| format!("invalid extension exclusion: {suffix}"))?);
        }
        builder.build().context("failed to build exclusion set")
    }
}

// ── Tests ────────────────────────────────────────────────────────────
