// src/orchestrator.rs

//! Build pipeline
//!
//! The orchestrator owns the runner and packager definitions and drives a
//! strict two-phase pipeline:
//!
//! 1. Instantiate every strategy and apply its parameters.
//! 2. Render phase: every packager renders every runner into the working
//!    directory and post-processes the result.
//! 3. Assemble phase: every packager builds its install manifest from the
//!    runners it does not exclude and writes one package.
//!
//! No package is assembled until every (packager, runner) pair has been
//! rendered, so a packager that excludes a runner still sees the files the
//! other packagers rendered for it without shipping them.

use crate::config::{DropConfig, PackagerDefinition, RunnerDefinition};
use crate::conversion::ConversionEntry;
use crate::error::{PipelineStage, Result};
use crate::manifest::InstallManifest;
use crate::packager::{Packager, PackagerKind, WrittenPackage, create_packager};
use crate::runner::{DefinitionId, Runner, RunnerKind, RunnerRef, create_runner};
use crate::template::{MiniJinjaEngine, TemplateEngine};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Files produced for one (packager, runner) pair
#[derive(Debug, Clone)]
pub struct RenderedPair {
    pub packager: PackagerKind,
    pub runner: RunnerKind,
    pub runner_name: Option<String>,
    pub files: Vec<PathBuf>,
}

/// Outcome of the render phase
#[derive(Debug, Clone, Default)]
pub struct RenderReport {
    pub pairs: Vec<RenderedPair>,
}

impl RenderReport {
    /// Every distinct file written to the working directory
    pub fn files(&self) -> BTreeSet<&Path> {
        self.pairs
            .iter()
            .flat_map(|pair| pair.files.iter().map(PathBuf::as_path))
            .collect()
    }
}

/// Outcome of a full build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub render: RenderReport,
    pub packages: Vec<WrittenPackage>,
}

/// Conversion plan for one (packager, runner) pair
#[derive(Debug, Clone)]
pub struct PlannedPair {
    pub packager: PackagerKind,
    pub runner: RunnerKind,
    pub runner_name: Option<String>,
    pub entries: Vec<ConversionEntry>,
}

/// Dry-run view of a build
#[derive(Debug, Clone, Default)]
pub struct PlanReport {
    pub pairs: Vec<PlannedPair>,
    pub manifests: Vec<(PackagerKind, InstallManifest)>,
}

/// Configured strategy instances for one pipeline run
struct Instances {
    runners: Vec<Box<dyn Runner>>,
    packagers: Vec<Box<dyn Packager>>,
}

/// Drives runners and packagers through the build pipeline
pub struct Orchestrator {
    runner_definitions: Vec<RunnerDefinition>,
    packager_definitions: Vec<PackagerDefinition>,
    engine: Box<dyn TemplateEngine>,
}

impl Orchestrator {
    pub fn new(runners: Vec<RunnerDefinition>, packagers: Vec<PackagerDefinition>) -> Self {
        Self {
            runner_definitions: runners,
            packager_definitions: packagers,
            engine: Box::new(MiniJinjaEngine::new()),
        }
    }

    /// Orchestrator for a loaded configuration file
    pub fn from_config(config: &DropConfig) -> Self {
        let mut engine = MiniJinjaEngine::new();
        if let Some(dir) = &config.template_dir {
            engine = engine.with_override_dir(dir);
        }
        Self::new(config.runners.clone(), config.packagers.clone()).with_engine(Box::new(engine))
    }

    /// Replace the template engine
    pub fn with_engine(mut self, engine: Box<dyn TemplateEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn runner_definitions(&self) -> &[RunnerDefinition] {
        &self.runner_definitions
    }

    pub fn packager_definitions(&self) -> &[PackagerDefinition] {
        &self.packager_definitions
    }

    /// Render every pair, then assemble one package per packager
    pub fn build(&self, working_dir: &Path, package_dir: Option<&Path>) -> Result<BuildReport> {
        let instances = self.instantiate()?;

        let render = self.render_phase(&instances, working_dir)?;
        let packages = self.assemble_phase(&instances, working_dir, package_dir)?;

        info!(
            "Build complete: {} files rendered, {} packages written",
            render.files().len(),
            packages.len()
        );
        Ok(BuildReport { render, packages })
    }

    /// Run only the render phase
    pub fn render(&self, working_dir: &Path) -> Result<RenderReport> {
        let instances = self.instantiate()?;
        self.render_phase(&instances, working_dir)
    }

    /// Plan every pair and manifest without touching the filesystem
    pub fn plan(&self, working_dir: &Path) -> Result<PlanReport> {
        let instances = self.instantiate()?;
        let mut report = PlanReport::default();

        for packager in &instances.packagers {
            for runner in &instances.runners {
                let plan = packager.plan_for(runner.as_ref(), working_dir).map_err(|e| {
                    e.at_stage(
                        PipelineStage::Rendering,
                        self.pair_subject(packager.as_ref(), runner.as_ref()),
                    )
                })?;
                report.pairs.push(PlannedPair {
                    packager: packager.kind(),
                    runner: runner.kind(),
                    runner_name: self.runner_name(runner.as_ref()).map(str::to_string),
                    entries: plan.entries().cloned().collect(),
                });
            }

            let manifest = InstallManifest::build(
                self.runner_refs(&instances.runners),
                packager.excluded_runners(),
                working_dir,
            )
            .map_err(|e| e.at_stage(PipelineStage::ManifestAssembly, packager.kind().label()))?;
            report.manifests.push((packager.kind(), manifest));
        }

        Ok(report)
    }

    /// Create every strategy and apply its parameters
    fn instantiate(&self) -> Result<Instances> {
        let mut runners = Vec::with_capacity(self.runner_definitions.len());
        for (index, definition) in self.runner_definitions.iter().enumerate() {
            let subject = definition_subject(&definition.kind, definition.name.as_deref());
            let mut runner = create_runner(definition, DefinitionId(index))
                .map_err(|e| e.at_stage(PipelineStage::Instantiation, subject.as_str()))?;
            runner
                .apply_parameters(&definition.parameters)
                .map_err(|e| e.at_stage(PipelineStage::Parameters, subject.as_str()))?;
            runners.push(runner);
        }

        let mut packagers = Vec::with_capacity(self.packager_definitions.len());
        for definition in &self.packager_definitions {
            let subject = definition_subject(&definition.kind, None);
            let mut packager = create_packager(definition)
                .map_err(|e| e.at_stage(PipelineStage::Instantiation, subject.as_str()))?;
            packager
                .apply_parameters(&definition.parameters)
                .map_err(|e| e.at_stage(PipelineStage::Parameters, subject.as_str()))?;
            self.warn_unknown_exclusions(packager.as_ref());
            packagers.push(packager);
        }

        info!(
            "Configured {} runners and {} packagers",
            runners.len(),
            packagers.len()
        );
        Ok(Instances { runners, packagers })
    }

    fn render_phase(&self, instances: &Instances, working_dir: &Path) -> Result<RenderReport> {
        let mut report = RenderReport::default();

        for packager in &instances.packagers {
            for runner in &instances.runners {
                let subject = self.pair_subject(packager.as_ref(), runner.as_ref());

                let files = packager
                    .render_all(runner.as_ref(), self.engine.as_ref(), working_dir)
                    .map_err(|e| e.at_stage(PipelineStage::Rendering, subject.as_str()))?;
                packager
                    .post_process_artifacts(runner.as_ref(), working_dir)
                    .map_err(|e| e.at_stage(PipelineStage::PostProcessing, subject.as_str()))?;

                info!("Rendered {} ({} files)", subject, files.len());
                report.pairs.push(RenderedPair {
                    packager: packager.kind(),
                    runner: runner.kind(),
                    runner_name: self.runner_name(runner.as_ref()).map(str::to_string),
                    files,
                });
            }
        }

        Ok(report)
    }

    fn assemble_phase(
        &self,
        instances: &Instances,
        working_dir: &Path,
        package_dir: Option<&Path>,
    ) -> Result<Vec<WrittenPackage>> {
        let refs = self.runner_refs(&instances.runners);

        let mut packages = Vec::with_capacity(instances.packagers.len());
        for packager in &instances.packagers {
            packages.push(packager.assemble_package(package_dir, working_dir, &refs)?);
        }
        Ok(packages)
    }

    fn runner_name(&self, runner: &dyn Runner) -> Option<&str> {
        runner
            .definition()
            .and_then(|DefinitionId(index)| self.runner_definitions.get(index))
            .and_then(|definition| definition.name.as_deref())
    }

    fn runner_refs<'a>(&'a self, runners: &'a [Box<dyn Runner>]) -> Vec<RunnerRef<'a>> {
        runners
            .iter()
            .map(|runner| RunnerRef::new(runner.as_ref(), self.runner_name(runner.as_ref())))
            .collect()
    }

    fn pair_subject(&self, packager: &dyn Packager, runner: &dyn Runner) -> String {
        format!(
            "{} / {}",
            packager.kind().label(),
            definition_subject(runner.kind().label(), self.runner_name(runner))
        )
    }

    fn warn_unknown_exclusions(&self, packager: &dyn Packager) {
        let known: BTreeSet<&str> = self
            .runner_definitions
            .iter()
            .filter_map(|d| d.name.as_deref())
            .collect();
        for name in packager.excluded_runners() {
            if !known.contains(name.as_str()) {
                warn!(
                    "{} excludes runner '{}', but no runner has that name",
                    packager.kind().label(),
                    name
                );
            }
        }
    }
}

fn definition_subject(kind: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{} '{}'", kind, name),
        None => kind.to_string(),
    }
}
