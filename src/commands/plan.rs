// src/commands/plan.rs

//! Plan command - dry run of a build

use anyhow::{Context, Result};
use std::path::Path;
use svcdrop::{ConversionKind, Orchestrator};

/// Print the conversion plan per pair and the install manifest per packager
pub fn cmd_plan(config_path: &str, working_dir: &str, templates: Option<&str>) -> Result<()> {
    let config = super::load_config(config_path, templates)?;
    let working_dir = Path::new(working_dir);

    let report = Orchestrator::from_config(&config)
        .plan(working_dir)
        .context("Planning failed")?;

    for pair in &report.pairs {
        match &pair.runner_name {
            Some(name) => println!("[{} / {} '{}']", pair.packager, pair.runner, name),
            None => println!("[{} / {}]", pair.packager, pair.runner),
        }
        for entry in &pair.entries {
            let verb = match entry.kind {
                ConversionKind::Render => "render",
                ConversionKind::Copy => "copy  ",
            };
            let dest = entry
                .destination
                .strip_prefix(working_dir)
                .unwrap_or(&entry.destination);
            println!("  {} {} -> {}", verb, entry.source.display(), dest.display());
        }
    }

    for (packager, manifest) in &report.manifests {
        println!();
        println!("Install manifest ({}): {} files", packager, manifest.len());
        for token in manifest.tokens() {
            println!("  {}/", token);
            for file in manifest.files(token).into_iter().flatten() {
                println!("    {}", file);
            }
        }
    }

    Ok(())
}
