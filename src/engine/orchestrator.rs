//! Run orchestration: resolve a request into a configured adapter, run it, persist the report.
//!
//! Validation happens before anything touches the filesystem, so a rejected
//! target or option leaves no output directory behind. A failed run is never
//! retried; its partial stage times go to `failure.json` instead.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::core::config::{CarryMode, Constraints, ProjectDescription, ToolPaths, ToolchainConfig, design_name};
use crate::core::env::EnvironmentInfo;
use crate::core::metrics::RunMetrics;
use crate::core::schema::{FailureReport, RunReport, hash_sources};
use crate::core::target::{Family, Target};
use crate::engine::timing::StageTimings;
use crate::toolchain::{Toolchain, ToolchainKind};
use crate::{PerfError, PerfResult};

pub const META_FILE: &str = "meta.json";
pub const FAILURE_FILE: &str = "failure.json";
pub const DEFAULT_OUT_PREFIX: &str = "build";

/// One (family, device, package, toolchain, project) tuple plus run options, as given by the user.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub project: ProjectDescription,
    pub family: String,
    pub device: String,
    pub package: String,
    pub toolchain: String,
    pub strategy: Option<String>,
    pub seed: Option<u32>,
    pub carry: CarryMode,
    pub constraints: Constraints,
    /// Explicit output directory; otherwise `<out_prefix>/<design>`.
    pub out_dir: Option<PathBuf>,
    pub out_prefix: Option<PathBuf>,
    pub overwrite: bool,
    pub build: Option<String>,
    pub cli_args: Vec<String>,
}

impl RunRequest {
    pub fn new(
        project: ProjectDescription,
        family: impl Into<String>,
        device: impl Into<String>,
        package: impl Into<String>,
        toolchain: impl Into<String>,
    ) -> Self {
        RunRequest {
            project,
            family: family.into(),
            device: device.into(),
            package: package.into(),
            toolchain: toolchain.into(),
            strategy: None,
            seed: None,
            carry: CarryMode::Default,
            constraints: Constraints::default(),
            out_dir: None,
            out_prefix: None,
            overwrite: false,
            build: None,
            cli_args: Vec::new(),
        }
    }

    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(dir.into());
        self
    }

    pub fn with_out_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.out_prefix = Some(prefix.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_carry(mut self, carry: CarryMode) -> Self {
        self.carry = carry;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    fn target(&self) -> PerfResult<Target> {
        let family = Family::parse(&self.family).map_err(|_| PerfError::UnsupportedTarget {
            toolchain: self.toolchain.clone(),
            family: self.family.clone(),
            device: self.device.clone(),
            package: self.package.clone(),
        })?;
        Ok(Target::new(family, &self.device, &self.package))
    }

    /// Turn the request into the immutable config the adapter gets. Touches nothing on disk.
    pub fn resolve(&self) -> PerfResult<ToolchainConfig> {
        let target = self.target()?;
        let out_dir = match &self.out_dir {
            Some(dir) => dir.clone(),
            None => self
                .out_prefix
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_PREFIX))
                .join(design_name(&self.project.name, &self.toolchain, &target, self.carry)),
        };

        let mut project = self.project.clone();
        for p in project.srcs.iter_mut().chain(project.data.iter_mut()) {
            *p = absolute(p)?;
        }
        let constraints = Constraints {
            pcf: self.constraints.pcf.as_deref().map(absolute).transpose()?,
            sdc: self.constraints.sdc.as_deref().map(absolute).transpose()?,
            xdc: self.constraints.xdc.as_deref().map(absolute).transpose()?,
        };

        ToolchainConfig::new(&project, target, &self.toolchain, absolute(&out_dir)?)
            .with_strategy(self.strategy.clone())
            .with_seed(self.seed)
            .map(|c| {
                c.with_carry(self.carry)
                    .with_constraints(constraints)
                    .with_build(self.build.clone())
            })
    }
}

fn absolute(path: &Path) -> PerfResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| PerfError::InvalidConfig(format!("bad path {}: {e}", path.display())))
}

/// Run the request with the adapter registered under its toolchain id.
pub fn run(request: &RunRequest, tools: &ToolPaths) -> PerfResult<RunReport> {
    let kind = ToolchainKind::parse(&request.toolchain)?;
    let mut toolchain = kind.instantiate(tools);
    run_with(toolchain.as_mut(), request)
}

/// Run the request on a given adapter.
pub fn run_with(toolchain: &mut dyn Toolchain, request: &RunRequest) -> PerfResult<RunReport> {
    let config = request.resolve()?;
    toolchain.configure(&config)?;
    let hashes = hash_sources(&config.sources)?;
    prepare_out_dir(&config.out_dir, request.overwrite)?;

    info!(
        design = %config.design(),
        out_dir = %config.out_dir.display(),
        "starting run"
    );
    let mut runtimes = StageTimings::new();
    let metrics = match toolchain
        .run(&mut runtimes)
        .and_then(|()| collect_metrics(toolchain, &mut runtimes))
    {
        Ok(m) => m,
        Err(e) => {
            error!(design = %config.design(), error = %e, "run failed");
            let failure = FailureReport::new(config.clone(), runtimes, &e);
            if let Err(write_err) = write_json(&config.out_path(FAILURE_FILE), &failure) {
                error!(error = %write_err, "could not write failure report");
            }
            return Err(e);
        }
    };

    let report = RunReport::new(config, metrics, EnvironmentInfo::detect())
        .with_source_hashes(hashes)
        .with_cli_args(request.cli_args.clone());
    write_json(&report.config.out_path(META_FILE), &report)?;
    info!(
        design = %report.design,
        fmax_mhz = ?report.metrics.max_freq.worst_mhz(),
        total_s = report.metrics.runtimes.total(),
        "run complete"
    );
    Ok(report)
}

fn collect_metrics(toolchain: &dyn Toolchain, runtimes: &mut StageTimings) -> PerfResult<RunMetrics> {
    let max_freq = toolchain.max_freq()?;
    let resources = toolchain.resources()?;
    let versions = toolchain.versions();
    Ok(RunMetrics {
        runtimes: std::mem::take(runtimes),
        max_freq,
        resources,
        versions,
    })
}

/// Create `dir`; an existing non-empty one is cleared only with `overwrite`.
pub fn prepare_out_dir(dir: &Path, overwrite: bool) -> PerfResult<()> {
    let io_err = |e: std::io::Error| PerfError::Message(format!("{}: {e}", dir.display()));
    if dir.exists() {
        let non_empty = std::fs::read_dir(dir).map_err(io_err)?.next().is_some();
        if non_empty {
            if !overwrite {
                return Err(PerfError::InvalidConfig(format!(
                    "output directory {} is not empty (use --overwrite)",
                    dir.display()
                )));
            }
            std::fs::remove_dir_all(dir).map_err(io_err)?;
        }
    }
    std::fs::create_dir_all(dir).map_err(io_err)
}

/// Write pretty JSON through a temp file in the same directory so readers never see half a report.
fn write_json<T: Serialize>(path: &Path, value: &T) -> PerfResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let err = |e: String| PerfError::Message(format!("failed to write {}: {e}", path.display()));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| err(e.to_string()))?;
    serde_json::to_writer_pretty(&mut tmp, value).map_err(|e| err(e.to_string()))?;
    tmp.write_all(b"\n").map_err(|e| err(e.to_string()))?;
    tmp.persist(path).map_err(|e| err(e.to_string()))?;
    Ok(())
}
