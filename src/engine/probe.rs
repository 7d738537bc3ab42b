//! Host capability probing: which executables and install directories are present.
//!
//! Probing only looks at the filesystem. Nothing is run or installed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Requirement name to whether the host satisfies it.
pub type CapabilityReport = BTreeMap<String, bool>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementKind {
    /// A program looked up on `PATH` unless given with a directory component.
    Executable(PathBuf),
    /// A file or directory that must exist.
    Path(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub kind: RequirementKind,
}

impl Requirement {
    pub fn executable(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Requirement {
            name: name.into(),
            kind: RequirementKind::Executable(program.into()),
        }
    }

    pub fn path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Requirement {
            name: name.into(),
            kind: RequirementKind::Path(path.into()),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        match &self.kind {
            RequirementKind::Executable(p) => which(p).is_some(),
            RequirementKind::Path(p) => p.exists(),
        }
    }
}

pub fn probe(requirements: &[Requirement]) -> CapabilityReport {
    requirements
        .iter()
        .map(|r| (r.name.clone(), r.is_satisfied()))
        .collect()
}

/// Resolve a program the way a shell would: explicit paths as-is, bare names through `PATH`.
pub fn which(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return is_executable(program).then(|| program.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_requirements_are_false_not_errors() {
        let report = probe(&[
            Requirement::executable("nope", "definitely-not-an-fpga-tool-xyz"),
            Requirement::path("NOPEDIR", "/nonexistent/lscc"),
        ]);
        assert_eq!(report.get("nope"), Some(&false));
        assert_eq!(report.get("NOPEDIR"), Some(&false));
    }

    #[test]
    fn test_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let report = probe(&[Requirement::path("ICECUBEDIR", dir.path())]);
        assert_eq!(report.get("ICECUBEDIR"), Some(&true));
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_executable_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("icetime");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        assert!(which(&tool).is_none());

        let mut perms = std::fs::metadata(&tool).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&tool, perms).unwrap();
        assert_eq!(which(&tool), Some(tool.clone()));
    }

    #[test]
    fn test_capability_report_is_stable() {
        let reqs = [
            Requirement::executable("sh", "sh"),
            Requirement::path("tmp", std::env::temp_dir()),
        ];
        let a = probe(&reqs);
        let b = probe(&reqs);
        assert_eq!(a, b);
        assert_eq!(a.keys().collect::<Vec<_>>(), vec!["sh", "tmp"]);
    }
}
