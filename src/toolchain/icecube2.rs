//! Lattice iCEcube2, driven through the `icecubed.sh` wrapper script.

use crate::core::config::{CarryMode, ToolPaths, ToolchainConfig};
use crate::core::metrics::{MaxFreq, Resources, Versions};
use crate::core::target::Family;
use crate::engine::probe::Requirement;
use crate::engine::runner::ToolCommand;
use crate::engine::timing::StageTimings;
use crate::parse::version::parse_icecube2_asc_version;
use crate::{PerfResult, read_report};

use super::icestorm;
use super::versions::tool_versions;
use super::traits::{
    EnvironmentCheckable, FlowCapabilities, FrequencyReporting, ResourceReporting, Runnable,
    Strategies, VersionReporting, configured,
};

pub const SCRIPT: &str = "icecubed.sh";

/// Synthesis engine iCEcube2 runs before its own place and route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icecube2Synth {
    Synplify,
    Lse,
    Yosys,
}

impl Icecube2Synth {
    fn id(self) -> &'static str {
        match self {
            Icecube2Synth::Synplify => "icecube2-synpro",
            Icecube2Synth::Lse => "icecube2-lse",
            Icecube2Synth::Yosys => "icecube2-yosys",
        }
    }

    /// Value of the script's `--syn` argument.
    fn script_arg(self) -> &'static str {
        match self {
            Icecube2Synth::Synplify => "synpro",
            Icecube2Synth::Lse => "lse",
            Icecube2Synth::Yosys => "yosys-synpro",
        }
    }

    fn carries(self) -> &'static [bool] {
        match self {
            Icecube2Synth::Yosys => &[true, false],
            _ => &[true],
        }
    }
}

pub struct Icecube2 {
    synth: Icecube2Synth,
    tools: ToolPaths,
    config: Option<ToolchainConfig>,
}

impl Icecube2 {
    pub fn new(synth: Icecube2Synth, tools: ToolPaths) -> Self {
        Icecube2 {
            synth,
            tools,
            config: None,
        }
    }

    fn build_command(&self, cfg: &ToolchainConfig) -> ToolCommand {
        let mut env = icestorm::script_env(cfg)
            .with("ICECUBEDIR", self.tools.icecube_dir().to_string_lossy())
            .with("ICEDEV", cfg.target.lattice_dev());
        if cfg.carry == CarryMode::ForceOff {
            env = env.with("YOSYS_NOCARRY", "1");
        }
        let mut cmd = ToolCommand::new(self.tools.script(SCRIPT)).args(["--syn", self.synth.script_arg()]);
        if let Some(strategy) = &cfg.strategy {
            cmd = cmd.arg("--strategy").arg(strategy);
        }
        cmd.env(env).current_dir(&cfg.out_dir)
    }
}

impl Runnable for Icecube2 {
    fn name(&self) -> &'static str {
        self.synth.id()
    }

    fn capabilities(&self) -> FlowCapabilities {
        FlowCapabilities {
            seedable: false,
            carries: self.synth.carries(),
            strategies: Strategies::Any,
        }
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
        let build = self.build_command(cfg);
        tracing::info!(top = %cfg.top, dev = %cfg.target.lattice_dev(), "running iCEcube2");
        stages.group("bit-all", |sub| {
            sub.timed("icecube2", || build.run())?;
            sub.timed("unpack", || icestorm::iceunpack(tools, cfg).run())?;
            icestorm::analyze(sub, tools, cfg, true)
        })
    }
}

impl FrequencyReporting for Icecube2 {
    fn max_freq(&self) -> PerfResult<MaxFreq> {
        icestorm::read_icetime(configured(&self.config, self.name())?)
    }
}

impl ResourceReporting for Icecube2 {
    fn resources(&self) -> PerfResult<Resources> {
        icestorm::read_icebox_stat(configured(&self.config, self.name())?)
    }
}

impl VersionReporting for Icecube2 {
    fn versions(&self) -> Versions {
        // iCEcube2 has no version flag; the placed .asc header names the build.
        let icecube2 = self
            .config
            .as_ref()
            .and_then(|cfg| read_report(cfg.out_path(icestorm::ASC)).ok())
            .and_then(|asc| parse_icecube2_asc_version(&asc).ok());
        let mut versions = tool_versions(&self.requirements());
        versions.insert("icecube2".to_string(), icecube2);
        versions
    }
}

impl EnvironmentCheckable for Icecube2 {
    fn requirements(&self) -> Vec<Requirement> {
        let tools = &self.tools;
        let mut reqs = Vec::new();
        if self.synth == Icecube2Synth::Yosys {
            reqs.push(Requirement::executable("yosys", tools.exe("yosys")));
        }
        reqs.push(Requirement::path("ICECUBEDIR", tools.icecube_dir()));
        reqs.push(Requirement::executable(SCRIPT, tools.script(SCRIPT)));
        reqs.push(Requirement::executable("iceunpack", tools.exe("iceunpack")));
        reqs.extend(icestorm::backend_requirements(tools, true));
        reqs
    }
}
