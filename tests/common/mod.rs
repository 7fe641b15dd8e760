// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use svcdrop::{PackagerDefinition, RunnerDefinition};
use tempfile::TempDir;

/// Default install location used by the rpm packager
pub const INSTALL_LOC: &str = "/usr/local/svcdrop/service";

/// Scratch layout for one build: (TempDir, working dir, package dir)
///
/// Keep the TempDir alive to prevent cleanup.
pub fn setup_workspace() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let work = temp_dir.path().join("work");
    let out = temp_dir.path().join("packages");
    fs::create_dir_all(&work).unwrap();
    (temp_dir, work, out)
}

/// Drop a fake build artifact into `dir`
pub fn write_artifact(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, format!("PK\x03\x04{}", name)).unwrap();
    path
}

/// rpm packager definition with the required identity set
pub fn rpm_packager(name: &str) -> PackagerDefinition {
    PackagerDefinition::new("rpm")
        .with_parameter("PKG_NAME", name)
        .with_parameter("PKG_VERSION", "1.0")
        .with_parameter("PKG_RELEASE", "1")
}

/// The svcA (standalone) + svcB (web container) pair
pub fn svc_a_and_b() -> Vec<RunnerDefinition> {
    vec![
        RunnerDefinition::new("standalone")
            .named("svcA")
            .with_parameter("MAIN_CLASS", "com.x.Main"),
        RunnerDefinition::new("web-container")
            .named("svcB")
            .with_parameter("CONTEXT", "/app"),
    ]
}

pub fn read_rpm(path: &Path) -> rpm::Package {
    let file = fs::File::open(path).unwrap();
    rpm::Package::parse(&mut BufReader::new(file)).unwrap()
}

/// Installed paths listed in an RPM
pub fn installed_paths(pkg: &rpm::Package) -> BTreeSet<PathBuf> {
    pkg.metadata
        .get_file_entries()
        .unwrap()
        .into_iter()
        .map(|entry| entry.path)
        .collect()
}

/// Absolute install path under the default install location
pub fn installed(relative: &str) -> PathBuf {
    Path::new(INSTALL_LOC).join(relative)
}
