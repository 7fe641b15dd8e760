// src/runner/mod.rs

//! Runner strategies
//!
//! A runner describes how a piece of software is launched once installed:
//! a standalone process, an OS service, or an application hosted in a web
//! container. Each runner plans the files it needs (launch scripts,
//! configuration, build artifacts) and declares where they are installed.
//!
//! Runners are created through a static registry keyed by [`RunnerKind`];
//! adding a variant means adding an enum case and a registry arm.

mod artifacts;
mod service;
mod standalone;
mod web_container;

pub use artifacts::{discover_artifacts, plan_artifact_copies};
pub use service::ServiceRunner;
pub use standalone::StandaloneRunner;
pub use web_container::WebContainerRunner;

use crate::config::RunnerDefinition;
use crate::conversion::ConversionEntry;
use crate::error::{Error, Result};
use crate::manifest::{InstallContribution, contribution_from_entries};
use crate::variables::{self, Variables};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Working-directory subtree holding rendered runner files
pub const RUNNERS_DIR: &str = "runners";

/// Index of a definition in the orchestrator's definition list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefinitionId(pub usize);

/// Supported runner variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerKind {
    Standalone,
    Service,
    WebContainer,
}

impl RunnerKind {
    pub const ALL: [RunnerKind; 3] = [Self::Standalone, Self::Service, Self::WebContainer];

    /// Type tag used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::Service => "service",
            Self::WebContainer => "web-container",
        }
    }

    /// Human-readable name for messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standalone => "standalone runner",
            Self::Service => "service runner",
            Self::WebContainer => "web-container runner",
        }
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunnerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standalone" | "java-app" | "app" => Ok(Self::Standalone),
            "service" | "main-service" => Ok(Self::Service),
            "web-container" | "webcontainer" | "jetty" => Ok(Self::WebContainer),
            _ => Err(Error::UnknownRunnerKind(s.to_string())),
        }
    }
}

/// Mutable state shared by every runner variant
#[derive(Debug, Clone, Default)]
pub struct RunnerState {
    /// Defaults overlaid by definition parameters
    pub variables: Variables,
    /// Definition this runner was created from (name lookup only)
    pub definition: Option<DefinitionId>,
    configured: bool,
}

/// Capability set of a runner variant
pub trait Runner: fmt::Debug {
    fn kind(&self) -> RunnerKind;

    /// Built-in defaults for this variant
    fn defaults(&self) -> Variables;

    /// Keys that must be supplied because they have no default
    fn required_variables(&self) -> &'static [&'static str] {
        &[]
    }

    fn state(&self) -> &RunnerState;

    fn state_mut(&mut self) -> &mut RunnerState;

    /// Plan every file this runner needs under `output_root`
    fn plan_conversions(&self, output_root: &Path) -> Result<Vec<ConversionEntry>>;

    /// Reset to defaults, overlay `params` and validate required keys
    fn apply_parameters(&mut self, params: &Variables) -> Result<()> {
        let resolved = variables::resolve(&self.defaults(), params);
        let validation = variables::require(self.kind().label(), &resolved, self.required_variables());

        let state = self.state_mut();
        state.variables = resolved;
        state.configured = validation.is_ok();
        validation
    }

    /// Directory token → file names this runner installs
    ///
    /// Derived from the conversion plan, so the two can never disagree.
    fn plan_install_contribution(&self, output_root: &Path) -> Result<InstallContribution> {
        let entries = self.plan_conversions(output_root)?;
        Ok(contribution_from_entries(output_root, &entries))
    }

    fn variables(&self) -> &Variables {
        &self.state().variables
    }

    /// Look up a resolved variable
    fn variable(&self, key: &str) -> Result<&str> {
        self.variables()
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::MissingVariable {
                variant: self.kind().label().to_string(),
                key: key.to_string(),
            })
    }

    fn definition(&self) -> Option<DefinitionId> {
        self.state().definition
    }

    fn is_configured(&self) -> bool {
        self.state().configured
    }
}

/// A runner paired with the name of the definition it came from
#[derive(Debug, Clone, Copy)]
pub struct RunnerRef<'a> {
    pub runner: &'a dyn Runner,
    pub name: Option<&'a str>,
}

impl<'a> RunnerRef<'a> {
    pub fn new(runner: &'a dyn Runner, name: Option<&'a str>) -> Self {
        Self { runner, name }
    }
}

/// Defaults common to every runner variant
pub fn base_defaults() -> Variables {
    variables::from_pairs([
        ("RUNNER_NAME", "runner"),
        ("RUNNER_INSTALL_LOC", "/usr/local/svcdrop/runner"),
        ("RUNNER_USER", "svcdrop"),
        ("RUNNER_GROUP", "svcdrop"),
        ("JAVA_INSTALL_LOC", "/usr/java/latest"),
        ("JMX_PORT", "1098"),
        ("JAVA_OPTS", ""),
    ])
}

/// Create an unconfigured runner for a definition
pub fn create_runner(definition: &RunnerDefinition, id: DefinitionId) -> Result<Box<dyn Runner>> {
    let mut runner: Box<dyn Runner> = match definition.kind.parse::<RunnerKind>()? {
        RunnerKind::Standalone => Box::new(StandaloneRunner::new()),
        RunnerKind::Service => Box::new(ServiceRunner::new()),
        RunnerKind::WebContainer => Box::new(WebContainerRunner::new()),
    };
    runner.state_mut().definition = Some(id);
    Ok(runner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::from_pairs;

    fn configured(kind: RunnerKind) -> Box<dyn Runner> {
        let def = RunnerDefinition::new(kind.as_str());
        let mut runner = create_runner(&def, DefinitionId(0)).unwrap();
        runner
            .apply_parameters(&from_pairs([("MAIN_CLASS", "com.x.Main")]))
            .unwrap();
        runner
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("standalone".parse::<RunnerKind>().unwrap(), RunnerKind::Standalone);
        assert_eq!("Jetty".parse::<RunnerKind>().unwrap(), RunnerKind::WebContainer);
        assert_eq!("service".parse::<RunnerKind>().unwrap(), RunnerKind::Service);
        assert!(matches!(
            "cobol".parse::<RunnerKind>(),
            Err(Error::UnknownRunnerKind(_))
        ));
        for kind in RunnerKind::ALL {
            assert_eq!(kind.as_str().parse::<RunnerKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_registry_sets_definition() {
        let def = RunnerDefinition::new("service").named("svc");
        let runner = create_runner(&def, DefinitionId(3)).unwrap();
        assert_eq!(runner.kind(), RunnerKind::Service);
        assert_eq!(runner.definition(), Some(DefinitionId(3)));
        assert!(!runner.is_configured());
    }

    #[test]
    fn test_apply_parameters_is_idempotent() {
        let params = from_pairs([("MAIN_CLASS", "com.x.Main"), ("JMX_PORT", "1093")]);
        for kind in RunnerKind::ALL {
            let mut runner = create_runner(&RunnerDefinition::new(kind.as_str()), DefinitionId(0)).unwrap();
            runner.apply_parameters(&params).unwrap();
            let once = runner.variables().clone();
            runner.apply_parameters(&params).unwrap();
            assert_eq!(runner.variables(), &once, "{} not idempotent", kind);
            assert!(runner.is_configured());
        }
    }

    #[test]
    fn test_apply_parameters_resets_previous_overrides() {
        let mut runner = configured(RunnerKind::Service);
        runner
            .apply_parameters(&from_pairs([("MAIN_CLASS", "a.B"), ("JMX_PORT", "1")]))
            .unwrap();
        runner.apply_parameters(&from_pairs([("MAIN_CLASS", "a.B")])).unwrap();
        assert_eq!(runner.variable("JMX_PORT").unwrap(), "1098");
    }

    #[test]
    fn test_default_floor() {
        for kind in RunnerKind::ALL {
            let mut runner = create_runner(&RunnerDefinition::new(kind.as_str()), DefinitionId(0)).unwrap();
            let required = runner.required_variables();
            let _ = runner.apply_parameters(&Variables::new());
            if required.is_empty() {
                assert_eq!(runner.variables(), &runner.defaults());
            } else {
                // Defaults still land even though validation fails
                assert!(!runner.is_configured());
                for (key, value) in runner.defaults() {
                    assert_eq!(runner.variables()[&key], value);
                }
            }
        }
    }

    #[test]
    fn test_missing_required_variable_is_eager() {
        let mut runner = create_runner(&RunnerDefinition::new("standalone"), DefinitionId(0)).unwrap();
        let err = runner.apply_parameters(&Variables::new()).unwrap_err();
        match err {
            Error::MissingVariable { variant, key } => {
                assert_eq!(variant, "standalone runner");
                assert_eq!(key, "MAIN_CLASS");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_defaults_include_base() {
        for kind in RunnerKind::ALL {
            let runner = configured(kind);
            for key in base_defaults().keys() {
                assert!(runner.variables().contains_key(key), "{} lacks {}", kind, key);
            }
        }
    }
}
