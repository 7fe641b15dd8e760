// src/packager/writer.rs
//! Package writer backends
//!
//! A writer turns package metadata plus an annotated install manifest into a
//! binary archive inside the package directory. The archive is assembled in a
//! temporary file next to its final location and renamed into place, so a
//! failed write never leaves a truncated package behind.

use crate::digest;
use crate::error::{Error, Result};
use crate::manifest::ManifestEntry;
use rpm::PackageBuilder;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Regular-file type bits expected by the rpm file mode
const S_IFREG: u32 = 0o100000;

/// Header-level package description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: String,
    pub license: String,
    pub summary: String,
    pub group: String,
    /// Dependency expressions such as `java >= 1.6`
    pub requires: Vec<String>,
    pub pre_install_script: Option<String>,
    pub post_install_script: Option<String>,
    pub post_uninstall_script: Option<String>,
}

impl PackageMetadata {
    pub fn new(name: &str, version: &str, release: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            release: release.to_string(),
            arch: "noarch".to_string(),
            license: "proprietary".to_string(),
            summary: name.to_string(),
            group: String::new(),
            requires: Vec::new(),
            pre_install_script: None,
            post_install_script: None,
            post_uninstall_script: None,
        }
    }

    /// `<name>-<version>-<release>.<arch>.rpm`
    pub fn rpm_file_name(&self) -> String {
        format!(
            "{}-{}-{}.{}.rpm",
            self.name,
            self.version,
            self.release,
            rpm_arch(&self.arch)
        )
    }
}

/// Result of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPackage {
    pub path: PathBuf,
    pub sha256: String,
    pub size: u64,
}

/// Packaging backend
pub trait PackageWriter: fmt::Debug {
    /// Write one package for `entries` into `package_dir`
    fn write(
        &self,
        metadata: &PackageMetadata,
        entries: &[ManifestEntry],
        package_dir: &Path,
    ) -> Result<WrittenPackage>;
}

/// Writes RPM packages with the `rpm` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct RpmWriter;

impl RpmWriter {
    pub fn new() -> Self {
        Self
    }

    fn build(&self, metadata: &PackageMetadata, entries: &[ManifestEntry]) -> Result<rpm::Package> {
        let arch = rpm_arch(&metadata.arch);
        let mut builder = PackageBuilder::new(
            &metadata.name,
            &metadata.version,
            &metadata.license,
            &arch,
            &metadata.summary,
        )
        .release(&metadata.release)
        .compression(rpm::CompressionType::Gzip);

        if !metadata.group.is_empty() {
            builder = builder.group(&metadata.group);
        }

        for requirement in &metadata.requires {
            if let Some(dep) = parse_requirement(requirement) {
                builder = builder.requires(dep);
            }
        }

        for entry in entries {
            let install_path = entry.install_path();
            let attrs = &entry.attributes;

            let mut options = rpm::FileOptions::new(install_path.to_string_lossy())
                .mode(rpm::FileMode::from((S_IFREG | attrs.mode) as i32));
            if attrs.is_config {
                options = if attrs.no_replace_on_upgrade {
                    options.is_config_noreplace()
                } else {
                    options.is_config()
                };
            }
            if attrs.is_documentation {
                options = options.is_doc();
            }

            builder = builder.with_file(&entry.source, options).map_err(|e| {
                Error::PackageWrite(format!("failed to add {}: {}", entry.source.display(), e))
            })?;
            debug!("Added {} as {}", entry.source.display(), install_path.display());
        }

        if let Some(script) = &metadata.pre_install_script {
            builder = builder.pre_install_script(script.clone());
        }
        if let Some(script) = &metadata.post_install_script {
            builder = builder.post_install_script(script.clone());
        }
        if let Some(script) = &metadata.post_uninstall_script {
            builder = builder.post_uninstall_script(script.clone());
        }

        builder
            .build()
            .map_err(|e| Error::PackageWrite(format!("failed to build RPM: {}", e)))
    }
}

impl PackageWriter for RpmWriter {
    fn write(
        &self,
        metadata: &PackageMetadata,
        entries: &[ManifestEntry],
        package_dir: &Path,
    ) -> Result<WrittenPackage> {
        let package = self.build(metadata, entries)?;

        fs::create_dir_all(package_dir).map_err(|e| Error::io(package_dir, e))?;
        let output_path = package_dir.join(metadata.rpm_file_name());

        let mut temp = NamedTempFile::new_in(package_dir).map_err(|e| Error::io(package_dir, e))?;
        package
            .write(&mut temp)
            .map_err(|e| Error::PackageWrite(format!("failed to write RPM: {}", e)))?;
        temp.persist(&output_path)
            .map_err(|e| Error::io(&output_path, e.error))?;

        let size = fs::metadata(&output_path)
            .map_err(|e| Error::io(&output_path, e))?
            .len();
        let sha256 = digest::sha256_file(&output_path)?;

        info!(
            "Wrote {} ({} files, {} bytes, sha256 {})",
            output_path.display(),
            entries.len(),
            size,
            sha256
        );
        Ok(WrittenPackage {
            path: output_path,
            sha256,
            size,
        })
    }
}

/// Normalize an architecture name to the RPM spelling
pub fn rpm_arch(arch: &str) -> String {
    match arch {
        "amd64" => "x86_64",
        "arm64" => "aarch64",
        "all" | "any" | "" => "noarch",
        _ => arch,
    }
    .to_string()
}

/// Parse `name`, `name >= 1.0`, `name>1.0` or `name 1.0` into an RPM dependency
///
/// A bare version means an exact match.
fn parse_requirement(expr: &str) -> Option<rpm::Dependency> {
    let expr = expr.trim();
    if expr.is_empty() {
        return None;
    }

    let (name, constraint) = match expr.find(['<', '>', '=']) {
        Some(idx) => (expr[..idx].trim(), expr[idx..].trim()),
        None => match expr.split_once(char::is_whitespace) {
            Some((name, version)) => (name, version.trim()),
            None => return Some(rpm::Dependency::any(expr)),
        },
    };

    let split = constraint
        .find(|c: char| !matches!(c, '<' | '>' | '='))
        .unwrap_or(constraint.len());
    let (operator, version) = constraint.split_at(split);
    let version = version.trim();

    Some(match operator {
        ">=" | "=>" => rpm::Dependency::greater_eq(name, version),
        "<=" | "=<" => rpm::Dependency::less_eq(name, version),
        ">" => rpm::Dependency::greater(name, version),
        "<" => rpm::Dependency::less(name, version),
        _ => rpm::Dependency::eq(name, version),
    })
}
