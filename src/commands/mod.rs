// src/commands/mod.rs
//! Command handlers for the svcdrop CLI

mod build;
mod init;
mod plan;

pub use build::cmd_build;
pub use init::cmd_init;
pub use plan::cmd_plan;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use svcdrop::DropConfig;

/// Load the configuration file, letting `--templates` win over `template_dir`
fn load_config(config_path: &str, templates: Option<&str>) -> Result<DropConfig> {
    let path = Path::new(config_path);
    let mut config = DropConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration: {}", path.display()))?;

    if let Some(dir) = templates {
        config.template_dir = Some(PathBuf::from(dir));
    }
    if let Some(dir) = &config.template_dir
        && !dir.is_dir()
    {
        anyhow::bail!("Template directory does not exist: {}", dir.display());
    }

    Ok(config)
}
