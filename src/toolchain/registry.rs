//! Every toolchain id the harness knows, and the listing queries over them.

use std::collections::BTreeMap;
use std::fmt;

use crate::core::config::ToolPaths;
use crate::engine::probe::CapabilityReport;
use crate::{PerfError, PerfResult};

use super::arachne::Arachne;
use super::icecube2::{Icecube2, Icecube2Synth};
use super::nextpnr::Nextpnr;
use super::radiant::{Radiant, RadiantSynth};
use super::traits::Toolchain;
use super::vivado::{Vivado, VivadoSynth};
use super::vpr::Vpr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolchainKind {
    Vivado,
    VivadoYosys,
    Arachne,
    Vpr,
    Nextpnr,
    Icecube2Synpro,
    Icecube2Lse,
    Icecube2Yosys,
    RadiantSynpro,
    RadiantLse,
}

impl ToolchainKind {
    pub const ALL: [ToolchainKind; 10] = [
        ToolchainKind::Vivado,
        ToolchainKind::VivadoYosys,
        ToolchainKind::Arachne,
        ToolchainKind::Vpr,
        ToolchainKind::Nextpnr,
        ToolchainKind::Icecube2Synpro,
        ToolchainKind::Icecube2Lse,
        ToolchainKind::Icecube2Yosys,
        ToolchainKind::RadiantSynpro,
        ToolchainKind::RadiantLse,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ToolchainKind::Vivado => "vivado",
            ToolchainKind::VivadoYosys => "vivado-yosys",
            ToolchainKind::Arachne => "arachne",
            ToolchainKind::Vpr => "vpr",
            ToolchainKind::Nextpnr => "nextpnr",
            ToolchainKind::Icecube2Synpro => "icecube2-synpro",
            ToolchainKind::Icecube2Lse => "icecube2-lse",
            ToolchainKind::Icecube2Yosys => "icecube2-yosys",
            ToolchainKind::RadiantSynpro => "radiant-synpro",
            ToolchainKind::RadiantLse => "radiant-lse",
        }
    }

    pub fn parse(id: &str) -> PerfResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.id() == id)
            .ok_or_else(|| PerfError::InvalidConfig(format!("unknown toolchain '{id}'")))
    }

    /// A fresh, unconfigured adapter.
    pub fn instantiate(self, tools: &ToolPaths) -> Box<dyn Toolchain> {
        let tools = tools.clone();
        match self {
            ToolchainKind::Vivado => Box::new(Vivado::new(VivadoSynth::Vivado, tools)),
            ToolchainKind::VivadoYosys => Box::new(Vivado::new(VivadoSynth::Yosys, tools)),
            ToolchainKind::Arachne => Box::new(Arachne::new(tools)),
            ToolchainKind::Vpr => Box::new(Vpr::new(tools)),
            ToolchainKind::Nextpnr => Box::new(Nextpnr::new(tools)),
            ToolchainKind::Icecube2Synpro => Box::new(Icecube2::new(Icecube2Synth::Synplify, tools)),
            ToolchainKind::Icecube2Lse => Box::new(Icecube2::new(Icecube2Synth::Lse, tools)),
            ToolchainKind::Icecube2Yosys => Box::new(Icecube2::new(Icecube2Synth::Yosys, tools)),
            ToolchainKind::RadiantSynpro => Box::new(Radiant::new(RadiantSynth::Synplify, tools)),
            ToolchainKind::RadiantLse => Box::new(Radiant::new(RadiantSynth::Lse, tools)),
        }
    }

    pub fn seedable(self) -> bool {
        self.instantiate(&ToolPaths::default()).seedable()
    }

    pub fn check_env(self, tools: &ToolPaths) -> CapabilityReport {
        self.instantiate(tools).check_env()
    }
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// All toolchain ids, sorted.
pub fn get_toolchains() -> Vec<&'static str> {
    let mut ids: Vec<_> = ToolchainKind::ALL.iter().map(|k| k.id()).collect();
    ids.sort_unstable();
    ids
}

/// Ids of toolchains that accept a PnR seed, sorted.
pub fn get_seedable() -> Vec<&'static str> {
    let mut ids: Vec<_> = ToolchainKind::ALL
        .iter()
        .filter(|k| k.seedable())
        .map(|k| k.id())
        .collect();
    ids.sort_unstable();
    ids
}

/// Capability reports for one toolchain, or all of them when `only` is `None`.
pub fn check_env_all(
    tools: &ToolPaths,
    only: Option<&str>,
) -> PerfResult<BTreeMap<&'static str, CapabilityReport>> {
    let kinds = match only {
        Some(id) => vec![ToolchainKind::parse(id)?],
        None => ToolchainKind::ALL.to_vec(),
    };
    Ok(kinds.into_iter().map(|k| (k.id(), k.check_env(tools))).collect())
}

/// Whether every requirement of every toolchain is present.
pub fn env_ready(tools: &ToolPaths) -> bool {
    ToolchainKind::ALL
        .iter()
        .all(|k| k.check_env(tools).values().all(|ok| *ok))
}
