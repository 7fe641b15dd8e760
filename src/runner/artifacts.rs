// src/runner/artifacts.rs

//! Build artifact discovery
//!
//! Runners pick up the archives a build left in the working directory and
//! plan copies of them into their library directory. Archives that already
//! sit in the library directory are planned in place.

use crate::conversion::ConversionEntry;
use crate::error::{Error, Result};
use glob::Pattern;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Secondary archives a build emits next to the real one
const AUXILIARY_MARKERS: &[&str] = &["-sources.", "-docs.", "-javadoc."];

/// Files in `dir` (non-recursive) whose names match `pattern`, sorted
pub fn discover_artifacts(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = Pattern::new(pattern)
        .map_err(|e| Error::Config(format!("invalid ARTIFACT_PATTERN '{}': {}", pattern, e)))?;

    if !dir.is_dir() {
        debug!("Artifact directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if matcher.matches(&file_name) && !is_auxiliary(&file_name) {
            found.push(path);
        }
    }

    found.sort();
    Ok(found)
}

fn is_auxiliary(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    AUXILIARY_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Plan copies of matching artifacts into `output_root/<library_dir>`
///
/// An archive at the working directory root replaces a same-named archive
/// already in the library directory; the rest are planned in place.
pub fn plan_artifact_copies(
    output_root: &Path,
    library_dir: &str,
    pattern: &str,
) -> Result<Vec<ConversionEntry>> {
    let target = output_root.join(library_dir);
    let fresh = discover_artifacts(output_root, pattern)?;
    let fresh_names: BTreeSet<_> = fresh.iter().filter_map(|p| p.file_name()).collect();

    let mut entries: Vec<ConversionEntry> = discover_artifacts(&target, pattern)?
        .into_iter()
        .filter(|path| path.file_name().is_some_and(|name| !fresh_names.contains(name)))
        .map(|path| ConversionEntry::copy(path.clone(), path))
        .collect();

    for path in &fresh {
        if let Some(file_name) = path.file_name() {
            entries.push(ConversionEntry::copy(path.clone(), target.join(file_name)));
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"PK").unwrap();
    }

    #[test]
    fn test_discover_skips_auxiliary_archives() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("app-1.0.jar"));
        touch(&root.join("app-1.0-sources.jar"));
        touch(&root.join("app-1.0-javadoc.jar"));
        touch(&root.join("README.md"));
        touch(&root.join("nested/inner.jar"));

        let found = discover_artifacts(root, "*.jar").unwrap();
        assert_eq!(found, vec![root.join("app-1.0.jar")]);
    }

    #[test]
    fn test_discover_is_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["zeta.jar", "alpha.jar", "mid.jar"] {
            touch(&root.join(name));
        }

        let names: Vec<_> = discover_artifacts(root, "*.jar")
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["alpha.jar", "mid.jar", "zeta.jar"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(
            discover_artifacts(&temp_dir.path().join("nope"), "*.jar")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let temp_dir = TempDir::new().unwrap();
        assert!(discover_artifacts(temp_dir.path(), "[").is_err());
    }

    #[test]
    fn test_plan_copies_root_and_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("app.jar"));
        touch(&root.join("lib/dep.jar"));

        let entries = plan_artifact_copies(root, "lib", "*.jar").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ConversionEntry::copy(root.join("lib/dep.jar"), root.join("lib/dep.jar")));
        assert_eq!(entries[1], ConversionEntry::copy(root.join("app.jar"), root.join("lib/app.jar")));
    }

    #[test]
    fn test_fresh_artifact_shadows_library_copy() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("app.jar"));
        touch(&root.join("lib/app.jar"));

        let entries = plan_artifact_copies(root, "lib", "*.jar").unwrap();
        assert_eq!(entries, vec![ConversionEntry::copy(root.join("app.jar"), root.join("lib/app.jar"))]);
    }
}
