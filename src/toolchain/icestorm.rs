//! IceStorm back end shared by the iCE40 flows: unpack, time and count a placed `.asc`.

use crate::core::config::{ToolPaths, ToolchainConfig};
use crate::core::metrics::{MaxFreq, Resources};
use crate::engine::probe::Requirement;
use crate::engine::runner::{EnvOverlay, ToolCommand};
use crate::engine::timing::SubStages;
use crate::parse::{parse_icebox_stat, parse_icetime};
use crate::{PerfResult, read_report};

use super::traits::yosys_carry_flag;

pub const ASC: &str = "my.asc";
pub const BIN: &str = "my.bin";
pub const ICETIME_REPORT: &str = "icetime.txt";
pub const ICEBOX_REPORT: &str = "icebox_stat.txt";

/// Device name `icetime -d` understands; the UltraPlus parts share one timing model.
pub fn icetime_device(device: &str) -> &str {
    match device {
        "up3k" => "up5k",
        other => other,
    }
}

pub fn iceunpack(tools: &ToolPaths, cfg: &ToolchainConfig) -> ToolCommand {
    ToolCommand::new(tools.exe("iceunpack"))
        .args([BIN, ASC])
        .current_dir(&cfg.out_dir)
}

pub fn icepack(tools: &ToolPaths, cfg: &ToolchainConfig) -> ToolCommand {
    ToolCommand::new(tools.exe("icepack"))
        .args([ASC, BIN])
        .current_dir(&cfg.out_dir)
}

pub fn icetime(tools: &ToolPaths, cfg: &ToolchainConfig, device: &str) -> ToolCommand {
    ToolCommand::new(tools.exe("icetime"))
        .args(["-tmd", icetime_device(device), ASC])
        .current_dir(&cfg.out_dir)
        .log_stdout_to(cfg.out_path(ICETIME_REPORT))
}

pub fn icebox_stat(tools: &ToolPaths, cfg: &ToolchainConfig) -> ToolCommand {
    ToolCommand::new(tools.exe("icebox_stat"))
        .arg(ASC)
        .current_dir(&cfg.out_dir)
        .log_stdout_to(cfg.out_path(ICEBOX_REPORT))
}

/// `yosys -p "synth_ice40 ..."` writing `output` in the given netlist format.
pub fn yosys_synth(tools: &ToolPaths, cfg: &ToolchainConfig, format: &str, output: &str) -> ToolCommand {
    let script = format!(
        "synth_ice40 -top {}{} -{} {}",
        cfg.top,
        yosys_carry_flag(cfg.carry),
        format,
        output
    );
    ToolCommand::new(tools.exe("yosys"))
        .args(["-q", "-l", "yosys.log", "-p"])
        .arg(script)
        .args(&cfg.sources)
        .current_dir(&cfg.out_dir)
}

/// Time the placed design and count its resources, as sub-stages of the open build stage.
pub fn analyze(
    sub: &mut SubStages,
    tools: &ToolPaths,
    cfg: &ToolchainConfig,
    timing: bool,
) -> PerfResult<()> {
    if timing {
        sub.timed("timing", || icetime(tools, cfg, &cfg.target.device).run())?;
    }
    sub.timed("stat", || icebox_stat(tools, cfg).run())?;
    Ok(())
}

pub fn read_icetime(cfg: &ToolchainConfig) -> PerfResult<MaxFreq> {
    let text = read_report(cfg.out_path(ICETIME_REPORT))?;
    Ok(parse_icetime(&text)?.max_freq())
}

pub fn read_icebox_stat(cfg: &ToolchainConfig) -> PerfResult<Resources> {
    let text = read_report(cfg.out_path(ICEBOX_REPORT))?;
    parse_icebox_stat(&text)
}

/// Base environment every wrapper script gets: sources, top and constraint files.
pub fn script_env(cfg: &ToolchainConfig) -> EnvOverlay {
    let mut env = EnvOverlay::new()
        .with("SRCS", cfg.sources_joined())
        .with("TOP", cfg.top.clone());
    if let Some(pcf) = &cfg.constraints.pcf {
        env = env.with("PCF", pcf.to_string_lossy());
    }
    if let Some(sdc) = &cfg.constraints.sdc {
        env = env.with("SDC", sdc.to_string_lossy());
    }
    env
}

pub fn backend_requirements(tools: &ToolPaths, timing: bool) -> Vec<Requirement> {
    let mut reqs = Vec::new();
    if timing {
        reqs.push(Requirement::executable("icetime", tools.exe("icetime")));
    }
    reqs.push(Requirement::executable("icebox_stat", tools.exe("icebox_stat")));
    reqs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProjectDescription;
    use crate::core::target::{Family, Target};

    fn cfg() -> ToolchainConfig {
        let project = ProjectDescription {
            name: "oneblink".into(),
            srcs: vec!["a.v".into(), "b.v".into()],
            top: "top".into(),
            data: vec![],
        };
        ToolchainConfig::new(&project, Target::new(Family::Ice40, "up3k", "uwg30"), "x", "/tmp/out")
    }

    #[test]
    fn test_icetime_device() {
        assert_eq!(icetime_device("up3k"), "up5k");
        assert_eq!(icetime_device("hx8k"), "hx8k");
    }

    #[test]
    fn test_icetime_command_shape() {
        let cmd = icetime(&ToolPaths::default(), &cfg(), "up3k");
        let args: Vec<_> = cmd.arguments().iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-tmd", "up5k", "my.asc"]);
    }

    #[test]
    fn test_script_env() {
        let env = script_env(&cfg());
        assert_eq!(env.get("SRCS"), Some("a.v b.v"));
        assert_eq!(env.get("TOP"), Some("top"));
        assert_eq!(env.get("PCF"), None);
    }

    #[test]
    fn test_missing_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = cfg();
        c.out_dir = dir.path().to_path_buf();
        assert!(matches!(read_icetime(&c), Err(crate::PerfError::ReportMissing { .. })));
        assert!(matches!(read_icebox_stat(&c), Err(crate::PerfError::ReportMissing { .. })));
    }
}
