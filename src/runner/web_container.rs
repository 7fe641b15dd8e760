// src/runner/web_container.rs

//! Web container runner
//!
//! Hosts web archives in an embedded servlet container. The container is
//! configured through `runners/conf`; archives are deployed from `webapps/`.

use super::{RUNNERS_DIR, Runner, RunnerKind, RunnerState, base_defaults, plan_artifact_copies};
use crate::conversion::ConversionEntry;
use crate::error::Result;
use crate::variables::Variables;
use std::path::Path;

const TEMPLATE_ROOT: &str = "runners/web-container";

/// Container configuration templates and their names under `runners/conf`
const CONF_FILES: &[(&str, &str)] = &[
    ("env.j2", "env"),
    ("container.xml.j2", "container.xml"),
    ("logging.xml.j2", "logging.xml"),
    ("webdefault.xml.j2", "webdefault.xml"),
];

const DEPLOY_DIR: &str = "webapps";

#[derive(Debug, Default)]
pub struct WebContainerRunner {
    state: RunnerState,
}

impl WebContainerRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn template(name: &str) -> String {
        format!("{}/{}", TEMPLATE_ROOT, name)
    }
}

impl Runner for WebContainerRunner {
    fn kind(&self) -> RunnerKind {
        RunnerKind::WebContainer
    }

    fn defaults(&self) -> Variables {
        let mut defaults = base_defaults();
        for (key, value) in [
            ("WEB_NAME", "webapp"),
            ("CONTEXT", "/"),
            ("WEB_PORT", "8080"),
            ("ARTIFACT_PATTERN", "*.war"),
        ] {
            defaults.insert(key.to_string(), value.to_string());
        }
        defaults
    }

    fn state(&self) -> &RunnerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RunnerState {
        &mut self.state
    }

    fn plan_conversions(&self, output_root: &Path) -> Result<Vec<ConversionEntry>> {
        let web = self.variable("WEB_NAME")?;
        let runners = output_root.join(RUNNERS_DIR);

        let mut entries = vec![
            ConversionEntry::render(
                Self::template("launch.sh.j2"),
                runners.join("bin").join(format!("{}.sh", web)),
            ),
            ConversionEntry::render(Self::template("init.d.j2"), runners.join("init.d").join(web)),
        ];
        for (template, file_name) in CONF_FILES {
            entries.push(ConversionEntry::render(
                Self::template(template),
                runners.join("conf").join(file_name),
            ));
        }
        entries.extend(plan_artifact_copies(
            output_root,
            DEPLOY_DIR,
            self.variable("ARTIFACT_PATTERN")?,
        )?);
        Ok(entries)
    }
}
