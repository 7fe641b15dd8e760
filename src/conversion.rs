// src/conversion.rs

//! Conversion planning
//!
//! A conversion entry is one instruction to produce a file in the working
//! directory: either render a template or copy a pre-built artifact verbatim.
//! Runners and packagers each contribute entries; the plan merges them keyed
//! by destination so every output path is produced exactly once.

use crate::error::{Error, Result};
use crate::template::TemplateEngine;
use crate::variables::Variables;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File suffix marking a source as a template
pub const TEMPLATE_SUFFIX: &str = "j2";

/// How a conversion entry produces its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// Run the source through the template engine
    Render,
    /// Copy the source byte-for-byte
    Copy,
}

/// One render-or-copy instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: ConversionKind,
}

impl ConversionEntry {
    pub fn render(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            kind: ConversionKind::Render,
        }
    }

    pub fn copy(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            kind: ConversionKind::Copy,
        }
    }

    /// Pick the kind from the source file extension
    pub fn detect(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        let source = source.into();
        if is_template(&source) {
            Self::render(source, destination)
        } else {
            Self::copy(source, destination)
        }
    }

    /// Produce the destination file
    pub fn apply(&self, engine: &dyn TemplateEngine, variables: &Variables) -> Result<()> {
        match self.kind {
            ConversionKind::Render => engine.render(&self.source, &self.destination, variables),
            ConversionKind::Copy => self.copy_verbatim(),
        }
    }

    fn copy_verbatim(&self) -> Result<()> {
        if self.source == self.destination {
            // Artifact already sits where it will be installed from
            if !self.source.is_file() {
                return Err(Error::MissingInstallFile(self.source.clone()));
            }
            return Ok(());
        }

        if let Some(parent) = self.destination.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::copy(&self.source, &self.destination).map_err(|e| Error::io(&self.source, e))?;
        debug!(
            "Copied {} -> {}",
            self.source.display(),
            self.destination.display()
        );
        Ok(())
    }
}

/// Whether a source path names a template
pub fn is_template(source: &Path) -> bool {
    source
        .extension()
        .map(|ext| ext == TEMPLATE_SUFFIX)
        .unwrap_or(false)
}

/// Destination-keyed set of conversion entries
#[derive(Debug, Clone, Default)]
pub struct ConversionPlan {
    entries: BTreeMap<PathBuf, ConversionEntry>,
}

impl ConversionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add entries; a later entry for the same destination replaces an earlier one
    pub fn extend(&mut self, entries: impl IntoIterator<Item = ConversionEntry>) {
        for entry in entries {
            if let Some(previous) = self.entries.get(&entry.destination)
                && previous.source != entry.source
            {
                warn!(
                    "Conversion for {} replaced: {} -> {}",
                    entry.destination.display(),
                    previous.source.display(),
                    entry.source.display()
                );
            }
            self.entries.insert(entry.destination.clone(), entry);
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConversionEntry> {
        self.entries.values()
    }

    pub fn get(&self, destination: &Path) -> Option<&ConversionEntry> {
        self.entries.get(destination)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every entry in destination order, returning the produced paths
    pub fn apply(&self, engine: &dyn TemplateEngine, variables: &Variables) -> Result<Vec<PathBuf>> {
        let mut produced = Vec::with_capacity(self.entries.len());
        for entry in self.entries.values() {
            entry.apply(engine, variables)?;
            produced.push(entry.destination.clone());
        }
        Ok(produced)
    }
}

impl FromIterator<ConversionEntry> for ConversionPlan {
    fn from_iter<I: IntoIterator<Item = ConversionEntry>>(iter: I) -> Self {
        let mut plan = Self::new();
        plan.extend(iter);
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MiniJinjaEngine;
    use crate::variables::from_pairs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_kind_from_extension() {
        assert_eq!(
            ConversionEntry::detect("runners/bin/launch.sh.j2", "/w/a.sh").kind,
            ConversionKind::Render
        );
        assert_eq!(
            ConversionEntry::detect("/w/app-1.0.jar", "/w/lib/app-1.0.jar").kind,
            ConversionKind::Copy
        );
    }

    #[test]
    fn test_plan_last_writer_wins() {
        let plan: ConversionPlan = [
            ConversionEntry::render("a.j2", "/w/out"),
            ConversionEntry::render("b.j2", "/w/out"),
            ConversionEntry::render("c.j2", "/w/other"),
        ]
        .into_iter()
        .collect();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.get(Path::new("/w/out")).unwrap().source, PathBuf::from("b.j2"));
    }

    #[test]
    fn test_copy_is_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("blob.jar");
        let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        fs::write(&source, &bytes).unwrap();

        let dest = temp_dir.path().join("lib/blob.jar");
        ConversionEntry::copy(&source, &dest)
            .apply(&MiniJinjaEngine::new(), &Variables::new())
            .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), bytes);
    }

    #[test]
    fn test_copy_in_place_keeps_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lib/dep.jar");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"dep").unwrap();

        ConversionEntry::copy(&path, &path)
            .apply(&MiniJinjaEngine::new(), &Variables::new())
            .unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"dep");
    }

    #[test]
    fn test_copy_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let entry = ConversionEntry::copy(
            temp_dir.path().join("missing.jar"),
            temp_dir.path().join("lib/missing.jar"),
        );
        assert!(entry.apply(&MiniJinjaEngine::new(), &Variables::new()).is_err());
    }

    #[test]
    fn test_apply_renders_substitutions() {
        let temp_dir = TempDir::new().unwrap();
        let tpl = temp_dir.path().join("conf.j2");
        fs::write(&tpl, "group={{ PKG_GROUP }}").unwrap();
        let dest = temp_dir.path().join("out/conf");

        let plan: ConversionPlan = [ConversionEntry::render(&tpl, &dest)].into_iter().collect();
        let produced = plan
            .apply(&MiniJinjaEngine::new(), &from_pairs([("PKG_GROUP", "ops")]))
            .unwrap();

        assert_eq!(produced, vec![dest.clone()]);
        assert_eq!(fs::read_to_string(dest).unwrap(), "group=ops");
    }
}
