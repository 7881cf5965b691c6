//! CLI parse: clap types for ro. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ro CLI - directory trees as lazily loaded nodes
#[derive(Parser)]
#[command(name = "ro")]
#[command(about = "Browse a directory tree of <type>/<id> nodes and their rendered attributes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace directory (config discovery and relative paths)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Content root (overrides configuration)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Public base URL (overrides configuration)
    #[arg(long)]
    pub url: Option<String>,

    /// Enable info-level logging
    #[arg(long, short, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List nodes, optionally of one type
    List {
        /// Node type (first path segment)
        r#type: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print a node with every attribute rendered, as JSON
    Show {
        /// Node identifier (type/id)
        identifier: String,
    },
    /// Print one attribute of a node
    Get {
        /// Node identifier (type/id)
        identifier: String,
        /// Attribute key (a/b or a.b)
        key: String,
    },
    /// Print a node's fingerprint
    Fingerprint {
        /// Node identifier (type/id)
        identifier: String,
    },
    /// Resolve an asset by approximate name
    Asset {
        /// Node identifier (type/id)
        identifier: String,
        /// Asset name (separators and case are ignored)
        name: String,
    },
    /// Print the URL of a node or of a file under it
    Url {
        /// Node identifier (type/id)
        identifier: String,
        /// File path relative to the node
        path: Option<String>,
    },
    /// List the nodes a node is related to
    Related {
        /// Node identifier (type/id)
        identifier: String,
        /// Relationship names to follow (default: all)
        names: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}
