// src/config.rs

//! Runner and packager definitions (svcdrop.toml)
//!
//! Definitions are loaded once, before the pipeline starts, and never change
//! afterwards. The type tags are kept as plain strings here; resolving them to
//! a concrete strategy happens in the registries so that an unknown tag
//! surfaces as an instantiation error rather than a parse error.

use crate::error::{Error, Result};
use crate::variables::Variables;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// How one piece of software is launched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerDefinition {
    /// Runner type tag (`standalone`, `service`, `web-container`)
    pub kind: String,

    /// Name used by packagers to exclude this runner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Parameters overlaid on the runner defaults
    #[serde(default)]
    pub parameters: Variables,
}

impl RunnerDefinition {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: None,
            parameters: Variables::new(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_parameter(mut self, key: &str, value: &str) -> Self {
        self.parameters.insert(key.to_string(), value.to_string());
        self
    }
}

/// How rendered artifacts are bundled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagerDefinition {
    /// Packager type tag (`rpm`)
    pub kind: String,

    /// Parameters overlaid on the packager defaults
    #[serde(default)]
    pub parameters: Variables,

    /// Runner names left out of this packager's install manifest
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exclude_runners: BTreeSet<String>,
}

impl PackagerDefinition {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            parameters: Variables::new(),
            exclude_runners: BTreeSet::new(),
        }
    }

    pub fn with_parameter(mut self, key: &str, value: &str) -> Self {
        self.parameters.insert(key.to_string(), value.to_string());
        self
    }

    pub fn excluding(mut self, runner_name: &str) -> Self {
        self.exclude_runners.insert(runner_name.to_string());
        self
    }
}

/// Root structure of svcdrop.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropConfig {
    /// Directory whose templates shadow the embedded ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,

    #[serde(default, rename = "runner")]
    pub runners: Vec<RunnerDefinition>,

    #[serde(default, rename = "packager")]
    pub packagers: Vec<PackagerDefinition>,
}

impl DropConfig {
    /// Load configuration from a file path
    ///
    /// A relative `template_dir` is resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = Self::parse(&content)?;

        if let Some(dir) = &config.template_dir
            && dir.is_relative()
            && let Some(base) = path.parent()
        {
            config.template_dir = Some(base.join(dir));
        }

        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: DropConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural requirements
    pub fn validate(&self) -> Result<()> {
        if self.runners.is_empty() {
            return Err(Error::Config("at least one [[runner]] is required".to_string()));
        }
        if self.packagers.is_empty() {
            return Err(Error::Config("at least one [[packager]] is required".to_string()));
        }

        let mut seen = BTreeSet::new();
        for name in self.runners.iter().filter_map(|r| r.name.as_deref()) {
            if !seen.insert(name) {
                return Err(Error::Config(format!("duplicate runner name '{}'", name)));
            }
        }
        Ok(())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
template_dir = "templates"

[[runner]]
kind = "standalone"
name = "svcA"
[runner.parameters]
MAIN_CLASS = "com.x.Main"

[[runner]]
kind = "web-container"
name = "svcB"
[runner.parameters]
CONTEXT = "/app"

[[packager]]
kind = "rpm"
exclude_runners = ["svcB"]
[packager.parameters]
PKG_NAME = "svc"
PKG_VERSION = "1.0"
PKG_RELEASE = "1"
"#;

    #[test]
    fn test_parse_sample() {
        let config = DropConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.runners.len(), 2);
        assert_eq!(config.runners[0].name.as_deref(), Some("svcA"));
        assert_eq!(config.runners[0].parameters["MAIN_CLASS"], "com.x.Main");
        assert_eq!(config.runners[1].kind, "web-container");
        assert!(config.packagers[0].exclude_runners.contains("svcB"));
        assert_eq!(config.template_dir, Some(PathBuf::from("templates")));
    }

    #[test]
    fn test_from_file_resolves_template_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("svcdrop.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = DropConfig::from_file(&path).unwrap();
        assert_eq!(config.template_dir, Some(temp_dir.path().join("templates")));
    }

    #[test]
    fn test_requires_runner_and_packager() {
        assert!(DropConfig::parse("[[runner]]\nkind = \"service\"\n").is_err());
        assert!(DropConfig::parse("[[packager]]\nkind = \"rpm\"\n").is_err());
    }

    #[test]
    fn test_duplicate_runner_names_rejected() {
        let content = r#"
[[runner]]
kind = "service"
name = "a"
[[runner]]
kind = "standalone"
name = "a"
[[packager]]
kind = "rpm"
"#;
        let err = DropConfig::parse(content).unwrap_err();
        assert!(err.to_string().contains("duplicate runner name"));
    }

    #[test]
    fn test_unknown_kind_still_parses() {
        let content = "[[runner]]\nkind = \"nope\"\n[[packager]]\nkind = \"zip\"\n";
        let config = DropConfig::parse(content).unwrap();
        assert_eq!(config.runners[0].kind, "nope");
    }

    #[test]
    fn test_toml_roundtrip_keeps_definitions() {
        let config = DropConfig {
            template_dir: None,
            runners: vec![RunnerDefinition::new("service").named("svc").with_parameter("MAIN_CLASS", "a.B")],
            packagers: vec![PackagerDefinition::new("rpm").excluding("other")],
        };
        let reparsed = DropConfig::parse(&config.to_toml().unwrap()).unwrap();
        assert_eq!(reparsed, config);
    }
}
