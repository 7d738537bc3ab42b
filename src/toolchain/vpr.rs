//! Yosys and VPR for 7-series parts with a prebuilt routing graph.

use std::path::PathBuf;

use crate::core::config::{ToolPaths, ToolchainConfig};
use crate::core::metrics::{MaxFreq, Resources, Versions};
use crate::core::target::Family;
use crate::engine::probe::Requirement;
use crate::engine::runner::ToolCommand;
use crate::engine::timing::StageTimings;
use crate::parse::{parse_vpr_fmax, parse_vpr_pack_log};
use crate::{PerfResult, read_report};

use super::versions::tool_versions;
use super::traits::{
    EnvironmentCheckable, FlowCapabilities, FrequencyReporting, ResourceReporting, Runnable,
    Strategies, VersionReporting, configured,
};

pub const PACK_LOG: &str = "pack.log";
pub const ROUTE_LOG: &str = "route.log";
const EBLIF: &str = "top.eblif";

/// Parts with a published architecture and routing graph.
pub const SUPPORTED: &[(&str, &str)] = &[
    ("a35t", "csg324-1"),
    ("a35t", "cpg236-1"),
    ("a50t", "csg324-1"),
    ("a50t", "cpg236-1"),
];

#[derive(Debug, Clone, Copy)]
enum VprStep {
    Pack,
    Place,
    Route,
}

impl VprStep {
    fn flag(self) -> &'static str {
        match self {
            VprStep::Pack => "--pack",
            VprStep::Place => "--place",
            VprStep::Route => "--route",
        }
    }
}

pub struct Vpr {
    tools: ToolPaths,
    config: Option<ToolchainConfig>,
}

impl Vpr {
    pub fn new(tools: ToolPaths) -> Self {
        Vpr { tools, config: None }
    }

    fn arch_dir(&self, cfg: &ToolchainConfig) -> PathBuf {
        self.tools.vpr_arch_dir().join(cfg.target.xilinx_part())
    }

    fn synth_command(&self, cfg: &ToolchainConfig) -> ToolCommand {
        let script = format!(
            "synth_xilinx -flatten -nocarry -top {}; write_blif -attr -cname -param {EBLIF}",
            cfg.top
        );
        ToolCommand::new(self.tools.exe("yosys"))
            .args(["-q", "-l", "yosys.log", "-p"])
            .arg(script)
            .args(&cfg.sources)
            .current_dir(&cfg.out_dir)
    }

    fn vpr_command(&self, cfg: &ToolchainConfig, step: VprStep) -> ToolCommand {
        let arch = self.arch_dir(cfg);
        let mut cmd = ToolCommand::new(self.tools.exe("vpr"))
            .arg(arch.join("arch.timing.xml"))
            .arg(EBLIF)
            .args(["--device", cfg.target.xilinx_part().as_str()])
            .arg("--read_rr_graph")
            .arg(arch.join("rr_graph.real.bin"));
        if let Some(sdc) = &cfg.constraints.sdc {
            cmd = cmd.arg("--sdc_file").arg(sdc);
        }
        if let Some(seed) = cfg.seed {
            cmd = cmd.arg("--seed").arg(seed.to_string());
        }
        cmd = cmd.arg(step.flag()).current_dir(&cfg.out_dir);
        match step {
            VprStep::Pack => cmd.log_stdout_to(cfg.out_path(PACK_LOG)),
            VprStep::Route => cmd.log_stdout_to(cfg.out_path(ROUTE_LOG)),
            VprStep::Place => cmd,
        }
    }

    fn fasm_command(&self, cfg: &ToolchainConfig) -> ToolCommand {
        let arch = self.arch_dir(cfg);
        ToolCommand::new(self.tools.exe("genfasm"))
            .arg(arch.join("arch.timing.xml"))
            .arg(EBLIF)
            .args(["--device", cfg.target.xilinx_part().as_str()])
            .arg("--read_rr_graph")
            .arg(arch.join("rr_graph.real.bin"))
            .current_dir(&cfg.out_dir)
    }
}

impl Runnable for Vpr {
    fn name(&self) -> &'static str {
        "vpr"
    }

    fn capabilities(&self) -> FlowCapabilities {
        FlowCapabilities {
            seedable: true,
            carries: &[],
            strategies: Strategies::None,
        }
    }

    fn configure(&mut self, config: &ToolchainConfig) -> PerfResult<()> {
        config.target.require(self.name(), Family::Xc7, Some(SUPPORTED))?;
        self.capabilities().validate(self.name(), config)?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn run(&mut self, stages: &mut StageTimings) -> PerfResult<()> {
        let cfg = configured(&self.config, self.name())?;
        tracing::info!(part = %cfg.target.xilinx_part(), seed = ?cfg.seed, "running VPR flow");
        stages.group("bit-all", |sub| {
            sub.timed("synthesis", || self.synth_command(cfg).run())?;
            sub.timed("pack", || self.vpr_command(cfg, VprStep::Pack).run())?;
            sub.timed("place", || self.vpr_command(cfg, VprStep::Place).run())?;
            sub.timed("route", || self.vpr_command(cfg, VprStep::Route).run())?;
            sub.timed("fasm", || self.fasm_command(cfg).run())?;
            Ok(())
        })
    }
}

impl FrequencyReporting for Vpr {
    fn max_freq(&self) -> PerfResult<MaxFreq> {
        let cfg = configured(&self.config, self.name())?;
        parse_vpr_fmax(&read_report(cfg.out_path(ROUTE_LOG))?)
    }
}

impl ResourceReporting for Vpr {
    fn resources(&self) -> PerfResult<Resources> {
        let cfg = configured(&self.config, self.name())?;
        parse_vpr_pack_log(&read_report(cfg.out_path(PACK_LOG))?)
    }
}

impl VersionReporting for Vpr {
    fn versions(&self) -> Versions {
        tool_versions(&self.requirements())
    }
}

impl EnvironmentCheckable for Vpr {
    fn requirements(&self) -> Vec<Requirement> {
        let tools = &self.tools;
        vec![
            Requirement::executable("yosys", tools.exe("yosys")),
            Requirement::executable("vpr", tools.exe("vpr")),
            Requirement::executable("genfasm", tools.exe("genfasm")),
            Requirement::path("VPR_ARCH_DIR", tools.vpr_arch_dir()),
        ]
    }
}
