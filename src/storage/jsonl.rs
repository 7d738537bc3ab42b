//! Run history: one `RunReport` per line, append-only.
//!
//! A line that cannot be read back is reported with its line number rather
//! than skipped, so a damaged history is noticed before it is exported.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::core::schema::{RunReport, SCHEMA_VERSION};
use crate::{PerfError, PerfResult};

#[derive(Debug, Clone)]
pub struct RunHistory {
    path: PathBuf,
}

impl RunHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RunHistory { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn io_error(&self, what: &str, e: std::io::Error) -> PerfError {
        PerfError::Message(format!("failed to {what} {}: {e}", self.path.display()))
    }

    fn corrupt(&self, line: usize, reason: impl Into<String>) -> PerfError {
        PerfError::CorruptHistory {
            path: self.path.clone(),
            line,
            reason: reason.into(),
        }
    }

    /// Append one report as a single line. Reports from another schema version are refused.
    pub fn append(&self, report: &RunReport) -> PerfResult<()> {
        if report.schema_version != SCHEMA_VERSION {
            return Err(PerfError::InvalidConfig(format!(
                "report {} has schema v{}, history holds v{SCHEMA_VERSION}",
                report.record_id, report.schema_version
            )));
        }
        let mut line = serde_json::to_string(report)
            .map_err(|e| PerfError::Message(format!("failed to encode report {}: {e}", report.record_id)))?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error("create directory for", e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .map_err(|e| self.io_error("append to", e))
    }

    pub fn read_all(&self) -> PerfResult<Vec<RunReport>> {
        self.read_toolchain(None)
    }

    /// Reports in file order, optionally only those of one toolchain id.
    pub fn read_toolchain(&self, toolchain: Option<&str>) -> PerfResult<Vec<RunReport>> {
        let file = std::fs::File::open(&self.path).map_err(|e| self.io_error("open", e))?;
        let mut reports = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let lineno = idx + 1;
            let line = line.map_err(|e| self.corrupt(lineno, e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let report: RunReport =
                serde_json::from_str(&line).map_err(|e| self.corrupt(lineno, e.to_string()))?;
            if report.schema_version != SCHEMA_VERSION {
                return Err(self.corrupt(lineno, format!("schema v{}", report.schema_version)));
            }
            if toolchain.is_none_or(|t| report.toolchain() == t) {
                reports.push(report);
            }
        }
        Ok(reports)
    }
}
