pub mod core;
pub mod engine;
pub mod parse;
pub mod storage;
pub mod toolchain;

pub mod list_cmd;
pub mod run_cmd;

use std::path::PathBuf;

use thiserror::Error;

/// Number of trailing stderr lines kept on a failed tool invocation.
pub const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum PerfError {
    #[error("toolchain {toolchain} does not support {family} device {device} package {package}")]
    UnsupportedTarget {
        toolchain: String,
        family: String,
        device: String,
        package: String,
    },
    #[error("toolchain {toolchain} cannot honor {option}")]
    UnsupportedOption { toolchain: String, option: String },
    #[error("{program} exited with {status}\n{stderr_tail}")]
    ToolFailure {
        program: String,
        status: String,
        stderr_tail: String,
    },
    #[error("expected report {} is missing", path.display())]
    ReportMissing { path: PathBuf },
    #[error("failed to parse {report}: expected {expected}")]
    Parse {
        report: &'static str,
        expected: &'static str,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{}:{line}: {reason}", path.display())]
    CorruptHistory {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("{0}")]
    Message(String),
}

impl PerfError {
    pub(crate) fn parse(report: &'static str, expected: &'static str) -> Self {
        PerfError::Parse { report, expected }
    }
}

pub type PerfResult<T> = Result<T, PerfError>;

/// Read a report produced by an external tool, mapping absence to `ReportMissing`.
///
/// Vendor logs are not always clean UTF-8; invalid bytes are replaced so the
/// parsers decide whether the content is usable.
pub fn read_report(path: impl Into<PathBuf>) -> PerfResult<String> {
    let path = path.into();
    match std::fs::read(&path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PerfError::ReportMissing { path }),
        Err(e) => Err(PerfError::Message(format!(
            "failed to read {}: {e}",
            path.display()
        ))),
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha256::digest;
    digest(bytes)
}
