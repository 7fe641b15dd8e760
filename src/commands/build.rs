// src/commands/build.rs

//! Build command - render runners and write packages

use anyhow::{Context, Result};
use std::path::Path;
use svcdrop::Orchestrator;
use tracing::info;

/// Render every (packager, runner) pair, then write one package per packager
pub fn cmd_build(
    config_path: &str,
    working_dir: &str,
    package_dir: Option<&str>,
    templates: Option<&str>,
) -> Result<()> {
    let config = super::load_config(config_path, templates)?;
    let working_dir = Path::new(working_dir);

    info!(
        "Building {} runners with {} packagers in {}",
        config.runners.len(),
        config.packagers.len(),
        working_dir.display()
    );

    let orchestrator = Orchestrator::from_config(&config);
    let report = orchestrator
        .build(working_dir, package_dir.map(Path::new))
        .context("Build failed")?;

    println!("Rendered {} files", report.render.files().len());
    for package in &report.packages {
        println!("{}", package.path.display());
        println!("  size:   {} bytes", package.size);
        println!("  sha256: {}", package.sha256);
    }

    Ok(())
}
