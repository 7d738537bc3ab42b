//! Yosys and arachne-pnr, timed with icetime.

use crate::core::config::{ToolPaths, ToolchainConfig};
use crate::core::metrics::{MaxFreq, Resources, Versions};
use crate::core::target::Family;
use crate::engine::probe::Requirement;
use crate::engine::runner::ToolCommand;
use crate::engine::timing::StageTimings;
use crate::PerfResult;

use super::icestorm;
use super::versions::tool_versions;
use super::nextpnr::CAPS;
use super::traits::{
    EnvironmentCheckable, FlowCapabilities, FrequencyReporting, ResourceReporting, Runnable,
    VersionReporting, configured,
};

const BLIF: &str = "my.blif";

/// arachne-pnr names parts by logic size only: `hx8k` -> `8k`, `up5k` -> `5k`.
fn arachne_device(device: &str) -> &str {
    device.trim_start_matches(|c: char| c.is_ascii_alphabetic())
}

pub struct Arachne {
    tools: ToolPaths,
    config: Option<ToolchainConfig>,
}

impl Arachne {
    pub fn new(tools: ToolPaths) -> Self {
        Arachne { tools, config: None }
    }

    fn pnr_command(&self, cfg: &ToolchainConfig) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.tools.exe("arachne-pnr"))
            .args(["-d", arachne_device(&cfg.target.device), "-P", cfg.target.package.as_str()])
            .args(["-o", icestorm::ASC]);
        if let Some(pcf) = &cfg.constraints.pcf {
            cmd = cmd.arg("-p").arg(pcf);
        }
        if let Some(seed) = cfg.seed {
            cmd = cmd.arg("-s").arg(seed.to_string());
        }
        cmd.arg(BLIF).current_dir(&cfg.out_dir)
    }
}

impl Runnable for Arachne {
    fn name(&self) -> &'static str {
        "arachne"
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
        tracing::info!(top = %cfg.top, device = %cfg.target.device, seed = ?cfg.seed, "running arachne flow");
        stages.group("bit-all", |sub| {
            sub.timed("synthesis", || icestorm::yosys_synth(tools, cfg, "blif", BLIF).run())?;
            sub.timed("pnr", || pnr.run())?;
            sub.timed("bitstream", || icestorm::icepack(tools, cfg).run())?;
            icestorm::analyze(sub, tools, cfg, true)
        })
    }
}

impl FrequencyReporting for Arachne {
    fn max_freq(&self) -> PerfResult<MaxFreq> {
        icestorm::read_icetime(configured(&self.config, self.name())?)
    }
}

impl ResourceReporting for Arachne {
    fn resources(&self) -> PerfResult<Resources> {
        icestorm::read_icebox_stat(configured(&self.config, self.name())?)
    }
}

impl VersionReporting for Arachne {
    fn versions(&self) -> Versions {
        tool_versions(&self.requirements())
    }
}

impl EnvironmentCheckable for Arachne {
    fn requirements(&self) -> Vec<Requirement> {
        let tools = &self.tools;
        let mut reqs = vec![
            Requirement::executable("yosys", tools.exe("yosys")),
            Requirement::executable("arachne-pnr", tools.exe("arachne-pnr")),
            Requirement::executable("icepack", tools.exe("icepack")),
        ];
        reqs.extend(icestorm::backend_requirements(tools, true));
        reqs
    }
}
