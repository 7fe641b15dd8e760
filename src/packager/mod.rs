// src/packager/mod.rs

//! Packager strategies
//!
//! A packager renders its own support files (lifecycle scripts and the like)
//! next to each runner's files, then bundles everything the eligible runners
//! contribute into one distributable archive.

mod rpm;
mod writer;

pub use self::rpm::RpmPackager;
pub use self::writer::{PackageMetadata, PackageWriter, RpmWriter, WrittenPackage, rpm_arch};

use crate::config::PackagerDefinition;
use crate::conversion::{ConversionEntry, ConversionPlan};
use crate::error::{Error, PipelineStage, Result};
use crate::manifest::{InstallManifest, PackageFileAttributes};
use crate::runner::{Runner, RunnerRef};
use crate::template::TemplateEngine;
use crate::variables::{self, Variables};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Supported packager variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackagerKind {
    Rpm,
}

impl PackagerKind {
    pub const ALL: [PackagerKind; 1] = [Self::Rpm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rpm => "rpm",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Rpm => "rpm packager",
        }
    }
}

impl fmt::Display for PackagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackagerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rpm" => Ok(Self::Rpm),
            _ => Err(Error::UnknownPackagerKind(s.to_string())),
        }
    }
}

/// Mutable state shared by every packager variant
#[derive(Debug, Clone, Default)]
pub struct PackagerState {
    pub variables: Variables,
    /// Runner names left out of this packager's manifest
    pub exclusions: BTreeSet<String>,
    configured: bool,
}

/// Capability set of a packager variant
pub trait Packager: fmt::Debug {
    fn kind(&self) -> PackagerKind;

    fn defaults(&self) -> Variables;

    fn required_variables(&self) -> &'static [&'static str] {
        &[]
    }

    fn state(&self) -> &PackagerState;

    fn state_mut(&mut self) -> &mut PackagerState;

    /// Backend that writes the final archive
    fn writer(&self) -> &dyn PackageWriter;

    /// Files this packager adds for `runner` under `output_root`
    fn plan_own_conversions(&self, output_root: &Path, runner: &dyn Runner)
    -> Result<Vec<ConversionEntry>>;

    /// Packaging attributes for files installed from a directory token
    fn file_attributes(&self, token: &str) -> PackageFileAttributes;

    /// Header-level metadata, read once rendering is complete
    fn package_metadata(&self, working_dir: &Path) -> Result<PackageMetadata>;

    /// Reset to defaults, overlay `params` and validate required keys
    fn apply_parameters(&mut self, params: &Variables) -> Result<()> {
        let resolved = variables::resolve(&self.defaults(), params);
        let validation = variables::require(self.kind().label(), &resolved, self.required_variables());

        let state = self.state_mut();
        state.variables = resolved;
        state.configured = validation.is_ok();
        validation
    }

    fn variables(&self) -> &Variables {
        &self.state().variables
    }

    fn variable(&self, key: &str) -> Result<&str> {
        self.variables()
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::MissingVariable {
                variant: self.kind().label().to_string(),
                key: key.to_string(),
            })
    }

    fn excluded_runners(&self) -> &BTreeSet<String> {
        &self.state().exclusions
    }

    fn is_configured(&self) -> bool {
        self.state().configured
    }

    /// Runner plan merged with this packager's plan for the same runner
    fn plan_for(&self, runner: &dyn Runner, output_root: &Path) -> Result<ConversionPlan> {
        let mut plan = ConversionPlan::new();
        plan.extend(runner.plan_conversions(output_root)?);
        plan.extend(self.plan_own_conversions(output_root, runner)?);
        Ok(plan)
    }

    /// Render or copy every planned file for `runner` into `output_root`
    ///
    /// Templates see the packager variables overlaid by the runner variables.
    fn render_all(
        &self,
        runner: &dyn Runner,
        engine: &dyn TemplateEngine,
        output_root: &Path,
    ) -> Result<Vec<PathBuf>> {
        let plan = self.plan_for(runner, output_root)?;
        fs::create_dir_all(output_root).map_err(|e| Error::io(output_root, e))?;

        let combined = variables::combine(self.variables(), runner.variables());
        let produced = plan.apply(engine, &combined)?;
        debug!(
            "{} produced {} files for {}",
            self.kind().label(),
            produced.len(),
            runner.kind()
        );
        Ok(produced)
    }

    /// Variant-specific cleanup of rendered files
    fn post_process_artifacts(&self, _runner: &dyn Runner, _output_root: &Path) -> Result<()> {
        Ok(())
    }

    /// Union of the eligible runners' contributions, checked against disk
    fn build_manifest(&self, working_dir: &Path, runners: &[RunnerRef<'_>]) -> Result<InstallManifest> {
        let manifest = InstallManifest::build(runners.iter().copied(), self.excluded_runners(), working_dir)?;
        manifest.verify(working_dir)?;
        Ok(manifest)
    }

    /// Build the install manifest and hand it to the writer
    fn assemble_package(
        &self,
        package_dir: Option<&Path>,
        working_dir: &Path,
        runners: &[RunnerRef<'_>],
    ) -> Result<WrittenPackage> {
        let subject = self.kind().label();

        let package_dir = package_dir
            .ok_or(Error::MissingPackageDirectory)
            .map_err(|e| e.at_stage(PipelineStage::ManifestAssembly, subject))?;
        let manifest = self
            .build_manifest(working_dir, runners)
            .map_err(|e| e.at_stage(PipelineStage::ManifestAssembly, subject))?;

        let entries = manifest.annotate(working_dir, |token| self.file_attributes(token));
        let metadata = self
            .package_metadata(working_dir)
            .map_err(|e| e.at_stage(PipelineStage::PackageWriting, subject))?;

        info!(
            "Assembling {} {}-{} from {} files",
            metadata.name,
            metadata.version,
            metadata.release,
            entries.len()
        );
        self.writer()
            .write(&metadata, &entries, package_dir)
            .map_err(|e| e.at_stage(PipelineStage::PackageWriting, subject))
    }
}

/// Create an unconfigured packager for a definition
pub fn create_packager(definition: &PackagerDefinition) -> Result<Box<dyn Packager>> {
    let mut packager: Box<dyn Packager> = match definition.kind.parse::<PackagerKind>()? {
        PackagerKind::Rpm => Box::new(RpmPackager::new()),
    };
    packager.state_mut().exclusions = definition.exclude_runners.clone();
    Ok(packager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("RPM".parse::<PackagerKind>().unwrap(), PackagerKind::Rpm);
        assert!(matches!(
            "deb".parse::<PackagerKind>(),
            Err(Error::UnknownPackagerKind(ref kind)) if kind == "deb"
        ));
    }

    #[test]
    fn test_registry_copies_exclusions() {
        let def = PackagerDefinition::new("rpm").excluding("svcB");
        let packager = create_packager(&def).unwrap();
        assert_eq!(packager.kind(), PackagerKind::Rpm);
        assert!(packager.excluded_runners().contains("svcB"));
        assert!(!packager.is_configured());
    }

    #[test]
    fn test_plan_adds_lifecycle_scripts_for_every_runner_kind() {
        use crate::config::RunnerDefinition;
        use crate::runner::{DefinitionId, RunnerKind, create_runner};
        use crate::variables::from_pairs;

        let root = Path::new("/work");
        let mut packager = create_packager(&PackagerDefinition::new("rpm")).unwrap();
        packager
            .apply_parameters(&from_pairs([("PKG_NAME", "svc"), ("PKG_VERSION", "1"), ("PKG_RELEASE", "1")]))
            .unwrap();

        for kind in RunnerKind::ALL {
            let mut runner = create_runner(&RunnerDefinition::new(kind.as_str()), DefinitionId(0)).unwrap();
            runner
                .apply_parameters(&from_pairs([("MAIN_CLASS", "com.x.Main")]))
                .unwrap();

            let plan = packager.plan_for(runner.as_ref(), root).unwrap();
            assert!(
                plan.entries().any(|e| e.destination == root.join("rpm/svc/preinstall.sh")),
                "{} has no lifecycle scripts",
                kind
            );
        }
    }

    #[test]
    fn test_unknown_kind() {
        assert!(create_packager(&PackagerDefinition::new("zip")).is_err());
    }
}
