//! Running external tools.
//!
//! The child gets a copy of the caller's environment plus an explicit overlay;
//! the caller's own environment is never modified.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::{PerfError, PerfResult, STDERR_TAIL_LINES};

/// Environment variables set only in the child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<String, String>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Captured result of a finished tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code; `None` if killed by a signal or never started.
    pub status: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// One invocation of an external program.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    env: EnvOverlay,
    cwd: Option<PathBuf>,
    best_effort: bool,
    stdout_log: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ToolCommand {
            program: program.into(),
            args: Vec::new(),
            env: EnvOverlay::default(),
            cwd: None,
            best_effort: false,
            stdout_log: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append arguments given as one shell-style string, e.g. `"--syn lse --strategy Area"`.
    pub fn arg_string(self, s: &str) -> PerfResult<Self> {
        let parts = shlex::split(s)
            .ok_or_else(|| PerfError::InvalidConfig(format!("unbalanced quoting in '{s}'")))?;
        Ok(self.args(parts))
    }

    pub fn env(mut self, overlay: EnvOverlay) -> Self {
        self.env = overlay;
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// A non-zero exit (or a missing program) is returned as data instead of `ToolFailure`.
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    /// Also write captured stdout to this file.
    pub fn log_stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_log = Some(path.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn overlay(&self) -> &EnvOverlay {
        &self.env
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    /// Run to completion, blocking the calling thread.
    pub fn run(&self) -> PerfResult<ToolOutput> {
        let name = self.program_name();
        debug!(
            program = %self.program.display(),
            args = ?self.args,
            env = ?self.env.keys().collect::<Vec<_>>(),
            "running tool"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = match cmd.output() {
            Ok(o) => o,
            Err(e) if self.best_effort => {
                debug!(program = %name, error = %e, "best-effort tool did not start");
                return Ok(ToolOutput {
                    status: None,
                    success: false,
                    stdout: String::new(),
                    stderr: e.to_string(),
                });
            }
            Err(e) => {
                return Err(PerfError::ToolFailure {
                    program: name,
                    status: format!("failed to start ({e})"),
                    stderr_tail: String::new(),
                });
            }
        };

        let result = ToolOutput {
            status: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if let Some(log) = &self.stdout_log {
            std::fs::write(log, &result.stdout).map_err(|e| {
                PerfError::Message(format!("failed to write {}: {e}", log.display()))
            })?;
        }

        if result.success {
            info!(program = %name, "tool finished");
        } else if self.best_effort {
            warn!(program = %name, status = %output.status, "best-effort tool failed");
        } else {
            return Err(PerfError::ToolFailure {
                program: name,
                status: output.status.to_string(),
                stderr_tail: tail_lines(&result.stderr, STDERR_TAIL_LINES),
            });
        }
        Ok(result)
    }
}

/// Last `n` lines of `s`.
pub fn tail_lines(s: &str, n: usize) -> String {
    let lines: Vec<&str> = s.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
