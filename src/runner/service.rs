// src/runner/service.rs

//! OS service runner
//!
//! Wraps a main class in a launch script driven by a SysV init script and a
//! systemd unit, so the package works on either init system.

use super::{RUNNERS_DIR, Runner, RunnerKind, RunnerState, base_defaults, plan_artifact_copies};
use crate::conversion::ConversionEntry;
use crate::error::Result;
use crate::variables::Variables;
use std::path::Path;

const LAUNCH_TEMPLATE: &str = "runners/service/launch.sh.j2";
const INIT_TEMPLATE: &str = "runners/service/init.d.j2";
const UNIT_TEMPLATE: &str = "runners/service/unit.service.j2";

#[derive(Debug, Default)]
pub struct ServiceRunner {
    state: RunnerState,
}

impl ServiceRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Runner for ServiceRunner {
    fn kind(&self) -> RunnerKind {
        RunnerKind::Service
    }

    fn defaults(&self) -> Variables {
        let mut defaults = base_defaults();
        defaults.insert("SVC_NAME".to_string(), "service".to_string());
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
        let svc = self.variable("SVC_NAME")?;
        let runners = output_root.join(RUNNERS_DIR);

        let mut entries = vec![
            ConversionEntry::render(LAUNCH_TEMPLATE, runners.join("bin").join(format!("{}.sh", svc))),
            ConversionEntry::render(INIT_TEMPLATE, runners.join("init.d").join(svc)),
            ConversionEntry::render(
                UNIT_TEMPLATE,
                runners.join("systemd").join(format!("{}.service", svc)),
            ),
        ];
        entries.extend(plan_artifact_copies(
            output_root,
            "lib",
            self.variable("ARTIFACT_PATTERN")?,
        )?);
        Ok(entries)
    }
}
