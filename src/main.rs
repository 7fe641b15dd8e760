// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            working_dir,
            package_dir,
            templates,
        } => {
            debug!("build: config={} working_dir={}", config, working_dir);
            commands::cmd_build(
                &config,
                &working_dir,
                package_dir.as_deref(),
                templates.as_deref(),
            )
        }
        Commands::Plan {
            config,
            working_dir,
            templates,
        } => commands::cmd_plan(&config, &working_dir, templates.as_deref()),
        Commands::Init { path, force } => commands::cmd_init(&path, force),
    }
}
