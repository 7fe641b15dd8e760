// src/lib.rs

//! svcdrop: service distribution builder
//!
//! Turns pre-built application artifacts into an installable RPM by combining
//! *runners* (how the software is launched: standalone process, OS service,
//! web container) with *packagers* (how the result is bundled).
//!
//! # Architecture
//!
//! - Variables: built-in defaults overlaid by definition parameters
//! - Conversion plans: destination-keyed render/copy instructions
//! - Install manifests: directory-grouped files, annotated for the writer
//! - Two-phase pipeline: everything is rendered before anything is packaged

pub mod config;
pub mod conversion;
pub mod digest;
mod error;
pub mod manifest;
pub mod orchestrator;
pub mod packager;
pub mod runner;
pub mod template;
pub mod variables;

pub use config::{DropConfig, PackagerDefinition, RunnerDefinition};
pub use conversion::{ConversionEntry, ConversionKind, ConversionPlan};
pub use error::{Error, PipelineStage, Result};
pub use manifest::{InstallManifest, ManifestEntry, PackageFileAttributes};
pub use orchestrator::{BuildReport, Orchestrator, PlanReport, RenderReport};
pub use packager::{Packager, PackagerKind, PackageWriter, RpmPackager, RpmWriter};
pub use runner::{Runner, RunnerKind, ServiceRunner, StandaloneRunner, WebContainerRunner};
pub use template::{MiniJinjaEngine, TemplateEngine};
pub use variables::Variables;
