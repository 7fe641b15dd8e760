// src/cli/mod.rs
//! CLI definitions for svcdrop
//!
//! Definitions only; the handlers live in the `commands` module.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "svcdrop")]
#[command(author = "svcdrop Contributors")]
#[command(version)]
#[command(about = "Build installable service packages from runner and packager definitions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render every runner and write one package per packager
    Build {
        /// Path to the svcdrop configuration file
        #[arg(short, long, default_value = "svcdrop.toml")]
        config: String,

        /// Directory holding build artifacts; rendered files land here
        #[arg(short, long, default_value = ".")]
        working_dir: String,

        /// Directory receiving the finished packages
        #[arg(short, long)]
        package_dir: Option<String>,

        /// Directory whose templates shadow the built-in ones
        #[arg(short, long)]
        templates: Option<String>,
    },

    /// Show what a build would render and install without writing anything
    Plan {
        /// Path to the svcdrop configuration file
        #[arg(short, long, default_value = "svcdrop.toml")]
        config: String,

        /// Directory holding build artifacts
        #[arg(short, long, default_value = ".")]
        working_dir: String,

        /// Directory whose templates shadow the built-in ones
        #[arg(short, long)]
        templates: Option<String>,
    },

    /// Write a starter configuration file
    Init {
        /// Where to write the configuration
        #[arg(default_value = "svcdrop.toml")]
        path: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
