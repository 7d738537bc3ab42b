//! Lattice Radiant for the UltraPlus parts, driven through `radiant.sh`.

use crate::core::config::{ToolPaths, ToolchainConfig};
use crate::core::metrics::{MaxFreq, Resources, Versions};
use crate::core::target::Family;
use crate::engine::probe::Requirement;
use crate::engine::runner::ToolCommand;
use crate::engine::timing::StageTimings;
use crate::parse::version::parse_radiant_ini;
use crate::{PerfResult, read_report};

use super::icestorm;
use super::versions::tool_versions;
use super::traits::{
    EnvironmentCheckable, FlowCapabilities, FrequencyReporting, ResourceReporting, Runnable,
    Strategies, VersionReporting, configured,
};

pub const SCRIPT: &str = "radiant.sh";

/// (device, package) pairs Radiant is known to place for.
pub const SUPPORTED: &[(&str, &str)] = &[("up3k", "uwg30"), ("up5k", "uwg30"), ("up5k", "sg48")];

pub const STRATEGIES: &[&str] = &["Timing", "Quick", "Area"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiantSynth {
    Synplify,
    Lse,
}

impl RadiantSynth {
    fn id(self) -> &'static str {
        match self {
            RadiantSynth::Synplify => "radiant-synpro",
            RadiantSynth::Lse => "radiant-lse",
        }
    }

    fn script_arg(self) -> &'static str {
        match self {
            RadiantSynth::Synplify => "synplify",
            RadiantSynth::Lse => "lse",
        }
    }
}

pub struct Radiant {
    synth: RadiantSynth,
    tools: ToolPaths,
    config: Option<ToolchainConfig>,
}

impl Radiant {
    pub fn new(synth: RadiantSynth, tools: ToolPaths) -> Self {
        Radiant {
            synth,
            tools,
            config: None,
        }
    }

    fn build_command(&self, cfg: &ToolchainConfig) -> ToolCommand {
        let env = icestorm::script_env(cfg)
            .with("RADIANTDIR", self.tools.radiant_dir().to_string_lossy())
            .with("RADDEV", cfg.target.lattice_dev());
        let mut cmd = ToolCommand::new(self.tools.script(SCRIPT)).args(["--syn", self.synth.script_arg()]);
        if let Some(strategy) = &cfg.strategy {
            cmd = cmd.arg("--strategy").arg(strategy);
        }
        cmd.env(env).current_dir(&cfg.out_dir)
    }

    fn radiant_version(&self) -> Option<String> {
        let ini = self.tools.radiant_dir().join("data").join("ispsys.ini");
        read_report(ini).ok().and_then(|s| parse_radiant_ini(&s).ok())
    }
}

impl Runnable for Radiant {
    fn name(&self) -> &'static str {
        self.synth.id()
    }

    fn capabilities(&self) -> FlowCapabilities {
        FlowCapabilities {
            seedable: false,
            carries: &[true],
            strategies: Strategies::OneOf(STRATEGIES),
        }
    }

    fn configure(&mut self, config: &ToolchainConfig) -> PerfResult<()> {
        config.target.require(self.name(), Family::Ice40, Some(SUPPORTED))?;
        self.capabilities().validate(self.name(), config)?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn run(&mut self, stages: &mut StageTimings) -> PerfResult<()> {
        let cfg = configured(&self.config, self.name())?;
        let tools = &self.tools;
        let build = self.build_command(cfg);
        tracing::info!(top = %cfg.top, dev = %cfg.target.lattice_dev(), "running Radiant");
        stages.group("bit-all", |sub| {
            sub.timed("radiant", || build.run())?;
            sub.timed("unpack", || icestorm::iceunpack(tools, cfg).run())?;
            icestorm::analyze(sub, tools, cfg, true)
        })
    }
}

impl FrequencyReporting for Radiant {
    fn max_freq(&self) -> PerfResult<MaxFreq> {
        icestorm::read_icetime(configured(&self.config, self.name())?)
    }
}

impl ResourceReporting for Radiant {
    fn resources(&self) -> PerfResult<Resources> {
        icestorm::read_icebox_stat(configured(&self.config, self.name())?)
    }
}

impl VersionReporting for Radiant {
    fn versions(&self) -> Versions {
        let mut versions = tool_versions(&self.requirements());
        versions.insert("radiant".to_string(), self.radiant_version());
        versions
    }
}

impl EnvironmentCheckable for Radiant {
    fn requirements(&self) -> Vec<Requirement> {
        let tools = &self.tools;
        let mut reqs = vec![
            Requirement::path("RADIANTDIR", tools.radiant_dir()),
            Requirement::executable(SCRIPT, tools.script(SCRIPT)),
            Requirement::executable("iceunpack", tools.exe("iceunpack")),
        ];
        reqs.extend(icestorm::backend_requirements(tools, true));
        reqs
    }
}
