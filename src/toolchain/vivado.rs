//! Xilinx Vivado in batch mode, with either Vivado or Yosys doing synthesis.

use std::fmt::Write as _;

use crate::core::config::{ToolPaths, ToolchainConfig};
use crate::core::metrics::{MaxFreq, Resources, Versions};
use crate::core::target::Family;
use crate::engine::probe::Requirement;
use crate::engine::runner::ToolCommand;
use crate::engine::timing::StageTimings;
use crate::parse::{parse_timing_summary, parse_utilization};
use crate::{PerfError, PerfResult, read_report};

use super::versions::tool_versions;
use super::traits::{
    EnvironmentCheckable, FlowCapabilities, FrequencyReporting, ResourceReporting, Runnable,
    Strategies, VersionReporting, configured, yosys_carry_flag,
};

pub const TCL: &str = "vivado.tcl";
pub const TIMING_REPORT: &str = "timing_summary.rpt";
pub const UTILIZATION_REPORT: &str = "utilization.rpt";
const EDIF: &str = "top.edf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VivadoSynth {
    Vivado,
    Yosys,
}

pub struct Vivado {
    synth: VivadoSynth,
    tools: ToolPaths,
    config: Option<ToolchainConfig>,
}

impl Vivado {
    pub fn new(synth: VivadoSynth, tools: ToolPaths) -> Self {
        Vivado {
            synth,
            tools,
            config: None,
        }
    }

    /// Batch script: read the design, implement it, write the bitstream and both reports.
    fn tcl_script(&self, cfg: &ToolchainConfig) -> String {
        let mut tcl = String::new();
        let _ = writeln!(tcl, "create_project -force -part {} {} .", cfg.target.xilinx_part(), cfg.project);
        match self.synth {
            VivadoSynth::Vivado => {
                for src in &cfg.sources {
                    let _ = writeln!(tcl, "read_verilog {{{}}}", src.display());
                }
            }
            VivadoSynth::Yosys => {
                let _ = writeln!(tcl, "read_edif {EDIF}");
            }
        }
        if let Some(xdc) = &cfg.constraints.xdc {
            let _ = writeln!(tcl, "read_xdc {{{}}}", xdc.display());
        }
        match self.synth {
            VivadoSynth::Vivado => {
                let _ = writeln!(tcl, "synth_design -top {} -part {}", cfg.top, cfg.target.xilinx_part());
            }
            VivadoSynth::Yosys => {
                let _ = writeln!(tcl, "link_design -top {} -part {}", cfg.top, cfg.target.xilinx_part());
            }
        }
        let directive = cfg
            .strategy
            .as_deref()
            .map(|s| format!(" -directive {s}"))
            .unwrap_or_default();
        tcl.push_str("opt_design\n");
        let _ = writeln!(tcl, "place_design{directive}");
        let _ = writeln!(tcl, "route_design{directive}");
        let _ = writeln!(tcl, "write_bitstream -force {}.bit", cfg.top);
        let _ = writeln!(tcl, "report_timing_summary -file {TIMING_REPORT}");
        let _ = writeln!(tcl, "report_utilization -file {UTILIZATION_REPORT}");
        tcl
    }

    fn yosys_command(&self, cfg: &ToolchainConfig) -> ToolCommand {
        let script = format!(
            "synth_xilinx -flatten -top {}{}; write_edif -pvector bra {EDIF}",
            cfg.top,
            yosys_carry_flag(cfg.carry)
        );
        ToolCommand::new(self.tools.exe("yosys"))
            .args(["-q", "-l", "yosys.log", "-p"])
            .arg(script)
            .args(&cfg.sources)
            .current_dir(&cfg.out_dir)
    }

    fn vivado_command(&self, cfg: &ToolchainConfig) -> PerfResult<ToolCommand> {
        Ok(ToolCommand::new(self.tools.exe("vivado"))
            .arg_string(&format!("-mode batch -nojournal -log vivado.log -source {TCL}"))?
            .current_dir(&cfg.out_dir))
    }
}

impl Runnable for Vivado {
    fn name(&self) -> &'static str {
        match self.synth {
            VivadoSynth::Vivado => "vivado",
            VivadoSynth::Yosys => "vivado-yosys",
        }
    }

    fn capabilities(&self) -> FlowCapabilities {
        FlowCapabilities {
            seedable: false,
            carries: match self.synth {
                VivadoSynth::Vivado => &[],
                VivadoSynth::Yosys => &[true, false],
            },
            strategies: Strategies::Any,
        }
    }

    fn configure(&mut self, config: &ToolchainConfig) -> PerfResult<()> {
        config.target.require(self.name(), Family::Xc7, None)?;
        self.capabilities().validate(self.name(), config)?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn run(&mut self, stages: &mut StageTimings) -> PerfResult<()> {
        let cfg = configured(&self.config, self.name())?;
        let tcl_path = cfg.out_path(TCL);
        std::fs::write(&tcl_path, self.tcl_script(cfg)).map_err(|e| {
            PerfError::Message(format!("failed to write {}: {e}", tcl_path.display()))
        })?;
        let vivado = self.vivado_command(cfg)?;
        tracing::info!(part = %cfg.target.xilinx_part(), top = %cfg.top, "running Vivado");
        stages.group("bit-all", |sub| {
            if self.synth == VivadoSynth::Yosys {
                sub.timed("synthesis", || self.yosys_command(cfg).run())?;
            }
            sub.timed("vivado", || vivado.run())?;
            Ok(())
        })
    }
}

impl FrequencyReporting for Vivado {
    fn max_freq(&self) -> PerfResult<MaxFreq> {
        let cfg = configured(&self.config, self.name())?;
        parse_timing_summary(&read_report(cfg.out_path(TIMING_REPORT))?)
    }
}

impl ResourceReporting for Vivado {
    fn resources(&self) -> PerfResult<Resources> {
        let cfg = configured(&self.config, self.name())?;
        parse_utilization(&read_report(cfg.out_path(UTILIZATION_REPORT))?)
    }
}

impl VersionReporting for Vivado {
    fn versions(&self) -> Versions {
        tool_versions(&self.requirements())
    }
}

impl EnvironmentCheckable for Vivado {
    fn requirements(&self) -> Vec<Requirement> {
        let mut reqs = Vec::new();
        if self.synth == VivadoSynth::Yosys {
            reqs.push(Requirement::executable("yosys", self.tools.exe("yosys")));
        }
        reqs.push(Requirement::executable("vivado", self.tools.exe("vivado")));
        reqs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CarryMode, Constraints, ProjectDescription};
    use crate::core::target::Target;

    fn config() -> ToolchainConfig {
        let project = ProjectDescription {
            name: "picosoc".into(),
            srcs: vec!["soc.v".into(), "cpu.v".into()],
            top: "top".into(),
            data: vec![],
        };
        ToolchainConfig::new(&project, Target::new(Family::Xc7, "a35t", "csg324-1"), "vivado", "/tmp/x")
            .with_constraints(Constraints {
                xdc: Some("arty.xdc".into()),
                ..Constraints::default()
            })
    }

    #[test]
    fn test_tcl_vivado_synthesis() {
        let tc = Vivado::new(VivadoSynth::Vivado, ToolPaths::default());
        let tcl = tc.tcl_script(&config().with_strategy(Some("Explore".into())));
        assert!(tcl.starts_with("create_project -force -part xc7a35tcsg324-1 picosoc ."));
        assert!(tcl.contains("read_verilog {soc.v}\nread_verilog {cpu.v}\n"));
        assert!(tcl.contains("read_xdc {arty.xdc}"));
        assert!(tcl.contains("synth_design -top top"));
        assert!(tcl.contains("route_design -directive Explore"));
        assert!(tcl.contains(&format!("report_timing_summary -file {TIMING_REPORT}")));
    }

    #[test]
    fn test_tcl_yosys_synthesis_links_edif() {
        let tc = Vivado::new(VivadoSynth::Yosys, ToolPaths::default());
        let tcl = tc.tcl_script(&config());
        assert!(tcl.contains("read_edif top.edf"));
        assert!(tcl.contains("link_design -top top"));
        assert!(!tcl.contains("read_verilog"));
        assert!(tcl.contains("route_design\n"));
    }

    #[test]
    fn test_carry_only_for_yosys() {
        let cfg = config().with_carry(CarryMode::ForceOff);
        assert!(Vivado::new(VivadoSynth::Vivado, ToolPaths::default()).configure(&cfg).is_err());
        let tc = Vivado::new(VivadoSynth::Yosys, ToolPaths::default());
        let script = tc.yosys_command(&cfg).arguments()[4].to_string_lossy().into_owned();
        assert_eq!(script, "synth_xilinx -flatten -top top -nocarry; write_edif -pvector bra top.edf");
    }

    #[test]
    fn test_vivado_rejects_ice40() {
        let mut cfg = config();
        cfg.target = Target::new(Family::Ice40, "hx8k", "ct256");
        let err = Vivado::new(VivadoSynth::Vivado, ToolPaths::default())
            .configure(&cfg)
            .unwrap_err();
        assert!(matches!(err, PerfError::UnsupportedTarget { .. }));
    }

    #[test]
    fn test_batch_arguments() {
        let tc = Vivado::new(VivadoSynth::Vivado, ToolPaths::default());
        let cmd = tc.vivado_command(&config()).unwrap();
        assert_eq!(cmd.arguments().len(), 7);
        assert_eq!(cmd.arguments()[6].to_str(), Some(TCL));
    }
}
