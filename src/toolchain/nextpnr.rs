//! Yosys and nextpnr-ice40.

use crate::core::config::{ToolPaths, ToolchainConfig};
use crate::core::metrics::{MaxFreq, Resources, Versions};
use crate::core::target::Family;
use crate::engine::probe::Requirement;
use crate::engine::runner::ToolCommand;
use crate::engine::timing::StageTimings;
use crate::parse::parse_nextpnr_log;
use crate::{PerfResult, read_report};

use super::icestorm;
use super::versions::tool_versions;
use super::traits::{
    EnvironmentCheckable, FlowCapabilities, FrequencyReporting, ResourceReporting, Runnable,
    Strategies, VersionReporting, configured,
};

pub const NEXTPNR_LOG: &str = "nextpnr.log";
const JSON: &str = "my.json";

pub(crate) const CAPS: FlowCapabilities = FlowCapabilities {
    seedable: true,
    carries: &[true, false],
    strategies: Strategies::None,
};

pub struct Nextpnr {
    tools: ToolPaths,
    config: Option<ToolchainConfig>,
}

impl Nextpnr {
    pub fn new(tools: ToolPaths) -> Self {
        Nextpnr { tools, config: None }
    }

    fn pnr_command(&self, cfg: &ToolchainConfig) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.tools.exe("nextpnr-ice40"))
            .arg(format!("--{}", cfg.target.device))
            .args(["--package", cfg.target.package.as_str(), "--json", JSON, "--asc", icestorm::ASC])
            .args(["--log", NEXTPNR_LOG]);
        if let Some(pcf) = &cfg.constraints.pcf {
            cmd = cmd.arg("--pcf").arg(pcf);
        }
        if let Some(seed) = cfg.seed {
            cmd = cmd.arg("--seed").arg(seed.to_string());
        }
        cmd.current_dir(&cfg.out_dir)
    }
}

impl Runnable for Nextpnr {
    fn name(&self) -> &'static str {
        "nextpnr"
    }

    fn capabilities(&self) -> FlowCapabilities {
        CAPS
    }

    fn configure(&mut self, config: &ToolchainConfig) -> PerfResult<()> {
        config.target.require(self.name(), Family::Ice40, None)?;
        self.capabilities().validate(self.name(), config)?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn run(&mut self, stages: &mut StageTimings) -> PerfResult<()> {
        let cfg = configured(&self.config, self.name())?;
        let tools = &self.tools;
        let pnr = self.pnr_command(cfg);
        tracing::info!(top = %cfg.top, device = %cfg.target.device, seed = ?cfg.seed, "running nextpnr flow");
        stages.group("bit-all", |sub| {
            sub.timed("synthesis", || icestorm::yosys_synth(tools, cfg, "json", JSON).run())?;
            sub.timed("pnr", || pnr.run())?;
            sub.timed("bitstream", || icestorm::icepack(tools, cfg).run())?;
            // nextpnr does its own timing analysis
            icestorm::analyze(sub, tools, cfg, false)
        })
    }
}

impl FrequencyReporting for Nextpnr {
    fn max_freq(&self) -> PerfResult<MaxFreq> {
        let cfg = configured(&self.config, self.name())?;
        parse_nextpnr_log(&read_report(cfg.out_path(NEXTPNR_LOG))?)
    }
}

impl ResourceReporting for Nextpnr {
    fn resources(&self) -> PerfResult<Resources> {
        icestorm::read_icebox_stat(configured(&self.config, self.name())?)
    }
}

impl VersionReporting for Nextpnr {
    fn versions(&self) -> Versions {
        tool_versions(&self.requirements())
    }
}

impl EnvironmentCheckable for Nextpnr {
    fn requirements(&self) -> Vec<Requirement> {
        let tools = &self.tools;
        let mut reqs = vec![
            Requirement::executable("yosys", tools.exe("yosys")),
            Requirement::executable("nextpnr-ice40", tools.exe("nextpnr-ice40")),
            Requirement::executable("icepack", tools.exe("icepack")),
        ];
        reqs.extend(icestorm::backend_requirements(tools, false));
        reqs
    }
}
