//! ro CLI Binary
//!
//! Command-line interface for browsing a ro content tree.

use clap::Parser;
use ro::cli::{Cli, RunContext};
use ro::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("ro CLI starting");

    let context = match RunContext::new(
        &cli.workspace,
        cli.config.as_deref(),
        cli.root.clone(),
        cli.url.clone(),
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error initializing: {:#}", e);
            eprintln!("{}", ro::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{}", ro::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args and the config file
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    if cli.quiet {
        return LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
    }

    let mut config = ro::cli::load_config_for_logging(&cli.workspace, cli.config.as_deref());

    if cli.verbose {
        config.level = "info".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}
