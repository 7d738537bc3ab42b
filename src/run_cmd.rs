//! CLI command handler for `run`.

use std::path::PathBuf;

use crate::core::config::{CarryMode, Constraints, ProjectDescription, ToolPaths, parse_seed};
use crate::core::metrics::MaxFreq;
use crate::core::schema::RunReport;
use crate::engine::orchestrator::{self, RunRequest};
use crate::engine::timing::StageEntry;
use crate::storage::RunHistory;
use crate::{PerfError, PerfResult};

/// Arguments of `fpga-tool-perf run`, as parsed by the CLI.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub project: PathBuf,
    pub toolchain: String,
    pub family: String,
    pub device: String,
    pub package: String,
    pub strategy: Option<String>,
    pub seed: Option<String>,
    pub carry: Option<bool>,
    pub pcf: Option<PathBuf>,
    pub sdc: Option<PathBuf>,
    pub xdc: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub out_prefix: Option<PathBuf>,
    pub overwrite: bool,
    pub build: Option<String>,
    pub config: Option<PathBuf>,
    pub jsonl: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub cli_args: Vec<String>,
}

pub fn run(args: RunArgs) -> PerfResult<()> {
    let tools = ToolPaths::load(args.config.as_deref())?;
    let project = ProjectDescription::load(&args.project)?;
    let seed = args.seed.as_deref().map(parse_seed).transpose()?;

    let mut request = RunRequest::new(project, args.family, args.device, args.package, args.toolchain)
        .with_carry(CarryMode::from_flag(args.carry))
        .with_overwrite(args.overwrite)
        .with_constraints(Constraints {
            pcf: args.pcf,
            sdc: args.sdc,
            xdc: args.xdc,
        });
    request.strategy = args.strategy;
    request.seed = seed;
    request.out_dir = args.out_dir;
    request.out_prefix = args.out_prefix;
    request.build = args.build;
    request.cli_args = args.cli_args;

    let report = orchestrator::run(&request, &tools)?;
    print_summary(&report);

    if let Some(path) = &args.jsonl {
        RunHistory::new(path).append(&report)?;
        eprintln!("Appended report to: {}", path.display());
    }
    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| PerfError::Message(format!("failed to serialize report: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| PerfError::Message(format!("failed to write {}: {e}", path.display())))?;
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    let metrics = &report.metrics;
    println!("design: {}", report.design);
    println!("out_dir: {}", report.config.out_dir.display());
    match &metrics.max_freq {
        MaxFreq::Single { mhz } => println!("max_freq: {mhz:.3} MHz"),
        MaxFreq::PerDomain { domains } => {
            for (clk, d) in domains {
                println!(
                    "max_freq[{clk}]: {:.3} MHz (requested {:.3}, {})",
                    d.actual,
                    d.requested,
                    if d.met { "met" } else { "FAILED" }
                );
            }
        }
    }
    for (kind, count) in &metrics.resources {
        println!("resources[{kind}]: {count}");
    }
    for (stage, entry) in metrics.runtimes.iter() {
        println!("runtime[{stage}]: {:.3} s", entry.elapsed());
        if let StageEntry::Group(group) = entry {
            for (sub, secs) in group.stages.iter() {
                println!("runtime[{stage}.{sub}]: {secs:.3} s");
            }
        }
    }
    for (tool, version) in &metrics.versions {
        println!("version[{tool}]: {}", version.as_deref().unwrap_or("unknown"));
    }
}
