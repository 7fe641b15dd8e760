// src/runner/standalone.rs

//! Standalone process runner
//!
//! Launches a main class from a plain shell script, with a properties file
//! and a logging configuration next to it. Build archives go into `lib/`.

use super::{RUNNERS_DIR, Runner, RunnerKind, RunnerState, base_defaults, plan_artifact_copies};
use crate::conversion::ConversionEntry;
use crate::error::Result;
use crate::variables::Variables;
use std::path::Path;

const LAUNCH_TEMPLATE: &str = "runners/standalone/launch.sh.j2";
const PROPERTIES_TEMPLATE: &str = "runners/standalone/app.properties.j2";
const LOGGING_TEMPLATE: &str = "runners/standalone/logging.xml.j2";

const LIBRARY_DIR: &str = "lib";

#[derive(Debug, Default)]
pub struct StandaloneRunner {
    state: RunnerState,
}

impl StandaloneRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Runner for StandaloneRunner {
    fn kind(&self) -> RunnerKind {
        RunnerKind::Standalone
    }

    fn defaults(&self) -> Variables {
        let mut defaults = base_defaults();
        defaults.insert("APP_NAME".to_string(), "app".to_string());
        defaults.insert("ARTIFACT_PATTERN".to_string(), "*.jar".to_string());
        defaults
    }

    fn required_variables(&self) -> &'static [&'static str] {
        &["MAIN_CLASS"]
    }

    fn state(&self) -> &RunnerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RunnerState {
        &mut self.state
    }

    fn plan_conversions(&self, output_root: &Path) -> Result<Vec<ConversionEntry>> {
        let app = self.variable("APP_NAME")?;
        let runners = output_root.join(RUNNERS_DIR);

        let mut entries = vec![
            ConversionEntry::render(LAUNCH_TEMPLATE, runners.join("bin").join(format!("{}.sh", app))),
            ConversionEntry::render(
                PROPERTIES_TEMPLATE,
                runners.join("conf").join(format!("{}.properties", app)),
            ),
            ConversionEntry::render(
                LOGGING_TEMPLATE,
                runners.join("conf").join(format!("{}-logging.xml", app)),
            ),
        ];
        entries.extend(plan_artifact_copies(
            output_root,
            LIBRARY_DIR,
            self.variable("ARTIFACT_PATTERN")?,
        )?);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::from_pairs;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn runner(params: &[(&str, &str)]) -> StandaloneRunner {
        let mut runner = StandaloneRunner::new();
        runner.apply_parameters(&from_pairs(params.iter().copied())).unwrap();
        runner
    }

    #[test]
    fn test_plans_scripts_named_after_app() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let runner = runner(&[("MAIN_CLASS", "com.x.Main"), ("APP_NAME", "billing")]);

        let destinations: Vec<_> = runner
            .plan_conversions(root)
            .unwrap()
            .into_iter()
            .map(|e| e.destination)
            .collect();
        assert_eq!(
            destinations,
            vec![
                root.join("runners/bin/billing.sh"),
                root.join("runners/conf/billing.properties"),
                root.join("runners/conf/billing-logging.xml"),
            ]
        );
    }

    #[test]
    fn test_contribution_matches_plan() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("svc-2.1.jar"), b"PK").unwrap();
        let runner = runner(&[("MAIN_CLASS", "com.x.Main")]);

        let contribution = runner.plan_install_contribution(root).unwrap();
        assert_eq!(contribution["runners/bin"], BTreeSet::from(["app.sh".to_string()]));
        assert_eq!(
            contribution["runners/conf"],
            BTreeSet::from(["app-logging.xml".to_string(), "app.properties".to_string()])
        );
        assert_eq!(contribution["lib"], BTreeSet::from(["svc-2.1.jar".to_string()]));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["b.jar", "a.jar", "c.jar"] {
            fs::write(root.join(name), b"PK").unwrap();
        }
        let runner = runner(&[("MAIN_CLASS", "com.x.Main")]);

        assert_eq!(
            runner.plan_conversions(root).unwrap(),
            runner.plan_conversions(root).unwrap()
        );
    }

    #[test]
    fn test_custom_artifact_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("app.jar"), b"PK").unwrap();
        fs::write(root.join("app.zip"), b"PK").unwrap();
        let runner = runner(&[("MAIN_CLASS", "com.x.Main"), ("ARTIFACT_PATTERN", "*.zip")]);

        let contribution = runner.plan_install_contribution(root).unwrap();
        assert_eq!(contribution["lib"], BTreeSet::from(["app.zip".to_string()]));
    }
}
