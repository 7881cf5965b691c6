//! CLI route: single route table and run context.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_asset_text, format_node_list_json, format_node_list_text, format_value,
};
use crate::config::{ConfigLoader, RoConfig};
use crate::engine::Engine;
use crate::fingerprint;
use crate::logging::LoggingConfig;
use crate::node::Node;
use crate::root::Root;
use crate::urls::UrlOptions;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Runtime context for CLI execution: loaded configuration and the root index.
pub struct RunContext {
    config: RoConfig,
    root: Arc<Root>,
}

impl RunContext {
    /// Create run context from workspace, optional config file and CLI overrides.
    pub fn new(
        workspace: &Path,
        config_path: Option<&Path>,
        root_override: Option<PathBuf>,
        url_override: Option<String>,
    ) -> Result<Self> {
        let config = load_config(workspace, config_path)?;
        Self::from_config(apply_overrides(config, workspace, root_override, url_override))
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(config: RoConfig) -> Result<Self> {
        config.validate().map_err(|errors| {
            let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
            anyhow!("Invalid configuration:\n  {}", lines.join("\n  "))
        })?;

        let engine = Engine::from_config(&config)
            .with_context(|| format!("Failed to open content root {:?}", config.root))?;
        Ok(Self {
            config,
            root: Root::new(Arc::new(engine)),
        })
    }

    pub fn config(&self) -> &RoConfig {
        &self.config
    }

    pub fn root(&self) -> &Arc<Root> {
        &self.root
    }

    fn node(&self, identifier: &str) -> Result<Node> {
        Ok(self.root.node(identifier)?)
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::List { r#type, format } => {
                let nodes = match r#type {
                    Some(type_name) => self.root.nodes_of(type_name)?,
                    None => self.root.nodes()?,
                };
                debug!(count = nodes.len(), "Listing nodes");
                Ok(match format {
                    OutputFormat::Text => format_node_list_text(&nodes),
                    OutputFormat::Json => format_node_list_json(&nodes),
                })
            }
            Commands::Show { identifier } => {
                let node = self.node(identifier)?;
                let json = node
                    .as_json()
                    .with_context(|| format!("Failed to load {}", identifier))?;
                Ok(serde_json::to_string_pretty(&json)?)
            }
            Commands::Get { identifier, key } => {
                let node = self.node(identifier)?;
                let value = node
                    .get(key.as_str())?
                    .ok_or_else(|| anyhow!("{} has no attribute {:?}", identifier, key))?;
                Ok(format_value(&value.materialize()?))
            }
            Commands::Fingerprint { identifier } => {
                let node = self.node(identifier)?;
                Ok(fingerprint::compute(node.path())?.to_string())
            }
            Commands::Asset { identifier, name } => {
                let node = self.node(identifier)?;
                let asset = node.asset_for(name)?;
                let url = asset.url()?;
                Ok(format_asset_text(&asset, &url))
            }
            Commands::Url { identifier, path } => {
                let node = self.node(identifier)?;
                let options = UrlOptions::default();
                Ok(match path {
                    Some(relative) => node.url_for(relative, &options)?,
                    None => node.url(&options)?,
                })
            }
            Commands::Related {
                identifier,
                names,
                format,
            } => {
                let node = self.node(identifier)?;
                let related = node
                    .related(names.as_slice())
                    .with_context(|| format!("Failed to resolve relations of {}", identifier))?;
                Ok(match format {
                    OutputFormat::Text => format_node_list_text(&related),
                    OutputFormat::Json => format_node_list_json(&related),
                })
            }
        }
    }
}

/// Load configuration from an explicit file or by workspace discovery.
pub fn load_config(workspace: &Path, config_path: Option<&Path>) -> Result<RoConfig> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load config file {:?}", path))?,
        None => ConfigLoader::load(workspace)
            .with_context(|| format!("Failed to load configuration for {:?}", workspace))?,
    };
    Ok(config)
}

/// Logging section of the configuration; defaults when none can be loaded.
pub fn load_config_for_logging(workspace: &Path, config_path: Option<&Path>) -> LoggingConfig {
    load_config(workspace, config_path)
        .map(|config| config.logging)
        .unwrap_or_default()
}

fn apply_overrides(
    mut config: RoConfig,
    workspace: &Path,
    root: Option<PathBuf>,
    url: Option<String>,
) -> RoConfig {
    if let Some(root) = root {
        config.root = if root.is_relative() {
            workspace.join(root)
        } else {
            root
        };
    }
    if let Some(url) = url {
        config.url = url;
    }
    config
}
