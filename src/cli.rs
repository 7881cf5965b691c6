//! CLI domain: parse, route, output and presentation only.
//! No engine logic; a single route table dispatches to the node API.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use route::{load_config, load_config_for_logging, RunContext};
