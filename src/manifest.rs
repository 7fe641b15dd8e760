// src/manifest.rs

//! Install manifest
//!
//! The install manifest maps directory tokens (working-directory-relative
//! directories such as `runners/bin`) to the file names installed from them.
//! It is the union of the contributions of every runner a packager is allowed
//! to see, and is annotated with packaging attributes right before it is
//! handed to the package writer.

use crate::conversion::ConversionEntry;
use crate::error::{Error, Result};
use crate::runner::RunnerRef;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory token → file names contributed by one runner
pub type InstallContribution = BTreeMap<String, BTreeSet<String>>;

/// Group conversion destinations by their directory relative to `output_root`
pub fn contribution_from_entries(output_root: &Path, entries: &[ConversionEntry]) -> InstallContribution {
    let mut contribution = InstallContribution::new();

    for entry in entries {
        let Ok(relative) = entry.destination.strip_prefix(output_root) else {
            warn!(
                "Ignoring {} for install: outside {}",
                entry.destination.display(),
                output_root.display()
            );
            continue;
        };
        let Some(file_name) = relative.file_name() else {
            continue;
        };

        let token = relative.parent().map(directory_token).unwrap_or_default();
        contribution
            .entry(token)
            .or_default()
            .insert(file_name.to_string_lossy().into_owned());
    }

    contribution
}

/// Render a relative directory as a `/`-separated token
fn directory_token(dir: &Path) -> String {
    dir.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Last component of a directory token (`runners/conf` → `conf`)
pub fn token_basename(token: &str) -> &str {
    token.rsplit('/').next().unwrap_or(token)
}

/// Packaging attributes for one installed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFileAttributes {
    pub is_config: bool,
    pub no_replace_on_upgrade: bool,
    pub is_documentation: bool,
    /// Directory the file is installed into
    pub install_prefix: PathBuf,
    /// Permission bits
    pub mode: u32,
}

impl PackageFileAttributes {
    /// Regular data file, mode 0644
    pub fn plain(install_prefix: impl Into<PathBuf>) -> Self {
        Self {
            is_config: false,
            no_replace_on_upgrade: false,
            is_documentation: false,
            install_prefix: install_prefix.into(),
            mode: 0o644,
        }
    }

    pub fn config(mut self, no_replace_on_upgrade: bool) -> Self {
        self.is_config = true;
        self.no_replace_on_upgrade = no_replace_on_upgrade;
        self
    }

    pub fn documentation(mut self) -> Self {
        self.is_documentation = true;
        self
    }

    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

/// One installed file with its source on disk and its attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub token: String,
    pub file_name: String,
    /// File in the working directory
    pub source: PathBuf,
    pub attributes: PackageFileAttributes,
}

impl ManifestEntry {
    /// Absolute path the file is installed to
    pub fn install_path(&self) -> PathBuf {
        self.attributes.install_prefix.join(&self.file_name)
    }
}

/// Directory-grouped set of files to install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallManifest {
    directories: BTreeMap<String, BTreeSet<String>>,
}

impl InstallManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the manifest from every runner not named in `exclusions`
    ///
    /// A runner without a name is always included.
    pub fn build<'a>(
        runners: impl IntoIterator<Item = RunnerRef<'a>>,
        exclusions: &BTreeSet<String>,
        output_root: &Path,
    ) -> Result<Self> {
        let mut manifest = Self::new();

        for runner_ref in runners {
            if is_excluded(&runner_ref, exclusions) {
                debug!(
                    "Excluding {} '{}' from install manifest",
                    runner_ref.runner.kind(),
                    runner_ref.name.unwrap_or_default()
                );
                continue;
            }
            manifest.merge(runner_ref.runner.plan_install_contribution(output_root)?);
        }

        info!(
            "Install manifest: {} files in {} directories",
            manifest.len(),
            manifest.directories.len()
        );
        Ok(manifest)
    }

    /// Union a contribution into the manifest
    pub fn merge(&mut self, contribution: InstallContribution) {
        for (token, files) in contribution {
            self.directories.entry(token).or_default().extend(files);
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.directories.keys().map(String::as_str)
    }

    pub fn files(&self, token: &str) -> Option<&BTreeSet<String>> {
        self.directories.get(token)
    }

    pub fn contains(&self, token: &str, file_name: &str) -> bool {
        self.directories
            .get(token)
            .is_some_and(|files| files.contains(file_name))
    }

    /// (token, file name) pairs in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.directories
            .iter()
            .flat_map(|(token, files)| files.iter().map(move |f| (token.as_str(), f.as_str())))
    }

    /// Number of files across all directories
    pub fn len(&self) -> usize {
        self.directories.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail if any listed file is absent from `working_dir`
    pub fn verify(&self, working_dir: &Path) -> Result<()> {
        for (token, file_name) in self.iter() {
            let path = working_dir.join(token).join(file_name);
            if !path.is_file() {
                return Err(Error::MissingInstallFile(path));
            }
        }
        Ok(())
    }

    /// Attach packaging attributes to every file
    pub fn annotate<F>(&self, working_dir: &Path, attributes_for: F) -> Vec<ManifestEntry>
    where
        F: Fn(&str) -> PackageFileAttributes,
    {
        let mut entries = Vec::with_capacity(self.len());
        for (token, files) in &self.directories {
            let attributes = attributes_for(token);
            for file_name in files {
                entries.push(ManifestEntry {
                    token: token.clone(),
                    file_name: file_name.clone(),
                    source: working_dir.join(token).join(file_name),
                    attributes: attributes.clone(),
                });
            }
        }
        entries
    }
}

fn is_excluded(runner_ref: &RunnerRef<'_>, exclusions: &BTreeSet<String>) -> bool {
    runner_ref.name.is_some_and(|name| exclusions.contains(name))
}
