// src/packager/rpm.rs

//! RPM packager
//!
//! Installs every runner directory under `PKG_INSTALL_LOC`, keyed by the
//! last component of the directory token (`runners/conf` installs into
//! `<PKG_INSTALL_LOC>/conf`). Lifecycle scripts create the service account
//! before install and clean up after the last removal. They are rendered to
//! `rpm/<PKG_NAME>/` so packagers sharing a working directory keep their own.

use super::{Packager, PackagerKind, PackagerState};
use super::writer::{PackageMetadata, PackageWriter, RpmWriter};
use crate::conversion::ConversionEntry;
use crate::error::{Error, Result};
use crate::manifest::{PackageFileAttributes, token_basename};
use crate::runner::Runner;
use crate::variables::{self, Variables};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_INSTALL_LOC: &str = "/usr/local/svcdrop/service";

/// Working-directory subtree holding rendered lifecycle scripts, one
/// directory per package name
const SCRIPT_DIR: &str = "rpm";

const PRE_INSTALL: (&str, &str) = ("packagers/rpm/preinstall.sh.j2", "preinstall.sh");
const POST_INSTALL: (&str, &str) = ("packagers/rpm/postinstall.sh.j2", "postinstall.sh");
const POST_REMOVE: (&str, &str) = ("packagers/rpm/postremove.sh.j2", "postremove.sh");

/// Token basenames whose files must be executable
const EXECUTABLE_DIRS: &[&str] = &["bin", "init.d"];

#[derive(Debug)]
pub struct RpmPackager {
    state: PackagerState,
    writer: Box<dyn PackageWriter>,
}

impl Default for RpmPackager {
    fn default() -> Self {
        Self::new()
    }
}

impl RpmPackager {
    pub fn new() -> Self {
        Self {
            state: PackagerState::default(),
            writer: Box::new(RpmWriter::new()),
        }
    }

    /// Replace the archive backend
    pub fn with_writer(mut self, writer: Box<dyn PackageWriter>) -> Self {
        self.writer = writer;
        self
    }

    fn install_loc(&self) -> &str {
        self.variables()
            .get("PKG_INSTALL_LOC")
            .map(String::as_str)
            .unwrap_or(DEFAULT_INSTALL_LOC)
    }

    fn script_dir(&self, working_dir: &Path) -> Result<PathBuf> {
        Ok(working_dir.join(SCRIPT_DIR).join(self.variable("PKG_NAME")?))
    }

    fn read_script(&self, working_dir: &Path, file_name: &str) -> Result<Option<String>> {
        let path = self.script_dir(working_dir)?.join(file_name);
        if !path.is_file() {
            return Ok(None);
        }
        let script = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        Ok(Some(script))
    }
}

impl Packager for RpmPackager {
    fn kind(&self) -> PackagerKind {
        PackagerKind::Rpm
    }

    fn defaults(&self) -> Variables {
        variables::from_pairs([
            ("PKG_INSTALL_LOC", DEFAULT_INSTALL_LOC),
            ("PKG_GROUP", "svc"),
            ("PKG_LICENSE", "proprietary"),
            ("PKG_ARCH", "noarch"),
            ("PKG_SUMMARY", ""),
            ("PKG_REQUIRES", ""),
            ("USER_ID", "55"),
            ("GROUP_ID", "700"),
            ("RUNNER_USER", "svcdrop"),
            ("RUNNER_GROUP", "svcdrop"),
        ])
    }

    fn required_variables(&self) -> &'static [&'static str] {
        &["PKG_NAME", "PKG_VERSION", "PKG_RELEASE"]
    }

    fn state(&self) -> &PackagerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PackagerState {
        &mut self.state
    }

    fn writer(&self) -> &dyn PackageWriter {
        self.writer.as_ref()
    }

    fn plan_own_conversions(
        &self,
        output_root: &Path,
        _runner: &dyn Runner,
    ) -> Result<Vec<ConversionEntry>> {
        let scripts = self.script_dir(output_root)?;
        Ok([PRE_INSTALL, POST_INSTALL, POST_REMOVE]
            .into_iter()
            .map(|(template, file_name)| ConversionEntry::render(template, scripts.join(file_name)))
            .collect())
    }

    fn file_attributes(&self, token: &str) -> PackageFileAttributes {
        let basename = token_basename(token);
        let attributes = PackageFileAttributes::plain(Path::new(self.install_loc()).join(basename));

        match basename {
            "conf" => attributes.config(true),
            "bin" | "init.d" => attributes.mode(0o755),
            "doc" => attributes.documentation(),
            _ => attributes,
        }
    }

    fn package_metadata(&self, working_dir: &Path) -> Result<PackageMetadata> {
        let mut metadata = PackageMetadata::new(
            self.variable("PKG_NAME")?,
            self.variable("PKG_VERSION")?,
            self.variable("PKG_RELEASE")?,
        );
        metadata.arch = self.variable("PKG_ARCH")?.to_string();
        metadata.license = self.variable("PKG_LICENSE")?.to_string();
        metadata.group = self.variable("PKG_GROUP")?.to_string();

        let summary = self.variable("PKG_SUMMARY")?.trim();
        if !summary.is_empty() {
            metadata.summary = summary.to_string();
        }

        metadata.requires = self
            .variable("PKG_REQUIRES")?
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();

        metadata.pre_install_script = self.read_script(working_dir, PRE_INSTALL.1)?;
        metadata.post_install_script = self.read_script(working_dir, POST_INSTALL.1)?;
        metadata.post_uninstall_script = self.read_script(working_dir, POST_REMOVE.1)?;
        Ok(metadata)
    }

    /// Mark launch scripts, init scripts and lifecycle scripts executable
    fn post_process_artifacts(&self, runner: &dyn Runner, output_root: &Path) -> Result<()> {
        let mut targets: Vec<PathBuf> = runner
            .plan_conversions(output_root)?
            .into_iter()
            .map(|entry| entry.destination)
            .filter(|dest| {
                dest.parent()
                    .and_then(Path::file_name)
                    .is_some_and(|dir| EXECUTABLE_DIRS.iter().any(|d| dir == *d))
            })
            .collect();
        targets.extend(
            self.plan_own_conversions(output_root, runner)?
                .into_iter()
                .map(|entry| entry.destination),
        );

        for path in targets.iter().filter(|p| p.is_file()) {
            make_executable(path)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| Error::io(path, e))?;
    debug!("Marked {} executable", path.display());
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
