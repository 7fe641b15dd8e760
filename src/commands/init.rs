// src/commands/init.rs

//! Init command - write a starter configuration

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use svcdrop::{DropConfig, PackagerDefinition, RunnerDefinition};

pub fn cmd_init(path: &str, force: bool) -> Result<()> {
    let path = Path::new(path);
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let config = DropConfig {
        template_dir: None,
        runners: vec![
            RunnerDefinition::new("service")
                .named("app")
                .with_parameter("SVC_NAME", "app")
                .with_parameter("MAIN_CLASS", "com.example.Main"),
        ],
        packagers: vec![
            PackagerDefinition::new("rpm")
                .with_parameter("PKG_NAME", "app")
                .with_parameter("PKG_VERSION", "1.0.0")
                .with_parameter("PKG_RELEASE", "1"),
        ],
    };

    let content = config.to_toml().context("Failed to serialize configuration")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote {}", path.display());
    Ok(())
}
