//! Capability traits every toolchain adapter implements.
//!
//! A flow is split into what it can do (`Runnable`, `FrequencyReporting`,
//! `ResourceReporting`, `VersionReporting`) and what it needs from the host
//! (`EnvironmentCheckable`). `Toolchain` is the union the orchestrator drives.
//!
//! Building an adapter has no side effects, so capability queries run on a
//! fresh, unconfigured adapter.

use serde::Serialize;

use crate::core::config::{CarryMode, ToolchainConfig};
use crate::core::metrics::{MaxFreq, Resources, Versions};
use crate::engine::probe::{CapabilityReport, Requirement, probe};
use crate::engine::timing::StageTimings;
use crate::{PerfError, PerfResult};

/// Which optimization strategies a flow takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strategies {
    None,
    Any,
    OneOf(&'static [&'static str]),
}

/// Static description of the knobs a flow honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowCapabilities {
    /// Accepts a deterministic PnR seed.
    pub seedable: bool,
    /// Forced carry values the flow can honor.
    pub carries: &'static [bool],
    pub strategies: Strategies,
}

impl FlowCapabilities {
    /// Reject seed, carry or strategy requests the flow cannot honor.
    pub fn validate(&self, toolchain: &str, config: &ToolchainConfig) -> PerfResult<()> {
        let unsupported = |option: String| PerfError::UnsupportedOption {
            toolchain: toolchain.to_string(),
            option,
        };
        if let Some(seed) = config.seed {
            if !self.seedable {
                return Err(unsupported(format!("seed {seed}")));
            }
        }
        if let Some(forced) = config.carry.forced() {
            if !self.carries.contains(&forced) {
                return Err(unsupported(format!("carry {}", config.carry)));
            }
        }
        if let Some(strategy) = &config.strategy {
            let ok = match self.strategies {
                Strategies::None => false,
                Strategies::Any => true,
                Strategies::OneOf(list) => list.contains(&strategy.as_str()),
            };
            if !ok {
                return Err(unsupported(format!("strategy {strategy}")));
            }
        }
        Ok(())
    }
}

pub trait Runnable {
    /// Toolchain id, e.g. `icecube2-lse`.
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> FlowCapabilities;

    fn seedable(&self) -> bool {
        self.capabilities().seedable
    }

    /// Validate the target and options and remember the config. Starts no process.
    fn configure(&mut self, config: &ToolchainConfig) -> PerfResult<()>;

    /// Drive the external flow end to end, recording stage times into `stages`.
    fn run(&mut self, stages: &mut StageTimings) -> PerfResult<()>;
}

pub trait FrequencyReporting {
    fn max_freq(&self) -> PerfResult<MaxFreq>;
}

pub trait ResourceReporting {
    fn resources(&self) -> PerfResult<Resources>;
}

pub trait VersionReporting {
    /// Best-effort: a tool whose version cannot be found maps to `None`.
    fn versions(&self) -> Versions;
}

pub trait EnvironmentCheckable {
    /// Executables and install paths the flow needs. Does not depend on `configure`.
    fn requirements(&self) -> Vec<Requirement>;

    fn check_env(&self) -> CapabilityReport {
        probe(&self.requirements())
    }
}

pub trait Toolchain:
    Runnable + FrequencyReporting + ResourceReporting + VersionReporting + EnvironmentCheckable
{
}

impl<T> Toolchain for T where
    T: Runnable + FrequencyReporting + ResourceReporting + VersionReporting + EnvironmentCheckable
{
}

/// The stored config, or an error if `configure` has not succeeded yet.
pub(crate) fn configured<'a>(
    config: &'a Option<ToolchainConfig>,
    toolchain: &str,
) -> PerfResult<&'a ToolchainConfig> {
    config
        .as_ref()
        .ok_or_else(|| PerfError::Message(format!("{toolchain}: configure() has not been called")))
}

/// `-nocarry` for Yosys synthesis when carry is forced off.
pub(crate) fn yosys_carry_flag(carry: CarryMode) -> &'static str {
    match carry {
        CarryMode::ForceOff => " -nocarry",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProjectDescription;
    use crate::core::target::{Family, Target};

    fn config() -> ToolchainConfig {
        let project = ProjectDescription {
            name: "oneblink".into(),
            srcs: vec!["top.v".into()],
            top: "top".into(),
            data: vec![],
        };
        ToolchainConfig::new(&project, Target::new(Family::Ice40, "hx8k", "ct256"), "x", "/tmp/x")
    }

    const CAPS: FlowCapabilities = FlowCapabilities {
        seedable: false,
        carries: &[true],
        strategies: Strategies::OneOf(&["Timing", "Area"]),
    };

    #[test]
    fn test_defaults_are_accepted() {
        assert!(CAPS.validate("x", &config()).is_ok());
    }

    #[test]
    fn test_seed_rejected_when_not_seedable() {
        let cfg = config().with_seed(Some(7)).unwrap();
        assert!(matches!(
            CAPS.validate("x", &cfg),
            Err(PerfError::UnsupportedOption { .. })
        ));
    }

    #[test]
    fn test_carry_and_strategy() {
        assert!(CAPS.validate("x", &config().with_carry(CarryMode::ForceOn)).is_ok());
        assert!(CAPS.validate("x", &config().with_carry(CarryMode::ForceOff)).is_err());
        assert!(CAPS
            .validate("x", &config().with_strategy(Some("Area".into())))
            .is_ok());
        assert!(CAPS
            .validate("x", &config().with_strategy(Some("Quick".into())))
            .is_err());
    }
}
