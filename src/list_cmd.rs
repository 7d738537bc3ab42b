//! CLI command handlers for the listing and export subcommands.

use std::path::{Path, PathBuf};

use crate::PerfResult;
use crate::core::config::ToolPaths;
use crate::storage::{CsvExporter, RunHistory};
use crate::toolchain::{check_env_all, env_ready, get_seedable, get_toolchains};

pub fn list_toolchains() -> PerfResult<()> {
    for id in get_toolchains() {
        println!("{id}");
    }
    Ok(())
}

pub fn list_seedable() -> PerfResult<()> {
    for id in get_seedable() {
        println!("{id}");
    }
    Ok(())
}

/// Print each requirement as `toolchain: name: ok|missing`. Missing tools are not an error.
pub fn check_env(config: Option<&Path>, toolchain: Option<&str>) -> PerfResult<()> {
    let tools = ToolPaths::load(config)?;
    for (id, report) in check_env_all(&tools, toolchain)? {
        println!("{id}");
        for (name, ok) in report {
            println!("  {name}: {}", if ok { "ok" } else { "missing" });
        }
    }
    if toolchain.is_none() {
        println!("ready: {}", env_ready(&tools));
    }
    Ok(())
}

/// Export a JSONL history as CSV, to `output` or stdout.
pub fn export_csv(jsonl: PathBuf, output: Option<PathBuf>, toolchain: Option<String>) -> PerfResult<()> {
    let reports = RunHistory::new(&jsonl).read_toolchain(toolchain.as_deref())?;
    let exporter = CsvExporter::new();
    match output {
        Some(path) => {
            exporter.export(&reports, &path)?;
            eprintln!("Exported {} report(s) to: {}", reports.len(), path.display());
        }
        None => exporter.export_to_stdout(&reports)?,
    }
    Ok(())
}
