//! Run configuration: what to build, for which part, and where the tools live.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::target::Target;
use crate::{PerfError, PerfResult};

/// Largest accepted seed; some PnR tools take it as a signed 32-bit value.
pub const MAX_SEED: u32 = 0x7FFF_FFFF;

/// Whether carry-chain primitives are forced on, forced off, or left to the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CarryMode {
    ForceOn,
    ForceOff,
    #[default]
    Default,
}

impl CarryMode {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => CarryMode::ForceOn,
            Some(false) => CarryMode::ForceOff,
            None => CarryMode::Default,
        }
    }

    /// The forced value, if any.
    pub fn forced(&self) -> Option<bool> {
        match self {
            CarryMode::ForceOn => Some(true),
            CarryMode::ForceOff => Some(false),
            CarryMode::Default => None,
        }
    }
}

impl fmt::Display for CarryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CarryMode::ForceOn => "carry-y",
            CarryMode::ForceOff => "carry-n",
            CarryMode::Default => "carry-d",
        })
    }
}

/// Parse a seed given in decimal or `0x` hex and check it is in `1..=MAX_SEED`.
pub fn parse_seed(s: &str) -> PerfResult<u32> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    }
    .map_err(|e| PerfError::InvalidConfig(format!("invalid seed '{s}': {e}")))?;
    validate_seed(parsed)
}

pub fn validate_seed(seed: u64) -> PerfResult<u32> {
    if seed == 0 || seed > MAX_SEED as u64 {
        return Err(PerfError::InvalidConfig(format!(
            "seed {seed} out of range 1..={MAX_SEED}"
        )));
    }
    Ok(seed as u32)
}

/// A design in the benchmark corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDescription {
    pub name: String,
    pub srcs: Vec<PathBuf>,
    pub top: String,
    /// Extra data files the design reads (memory init files and the like).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<PathBuf>,
}

impl ProjectDescription {
    /// Load a project JSON file; relative source paths resolve against its directory.
    pub fn load(path: &Path) -> PerfResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            PerfError::Message(format!("failed to read project {}: {e}", path.display()))
        })?;
        let mut project: ProjectDescription = serde_json::from_str(&s).map_err(|e| {
            PerfError::Message(format!("failed to parse project {}: {e}", path.display()))
        })?;
        if let Some(base) = path.parent() {
            for p in project.srcs.iter_mut().chain(project.data.iter_mut()) {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(project)
    }
}

/// Constraint files handed to the flow. Each is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcf: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdc: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xdc: Option<PathBuf>,
}

/// Everything one run needs to know. Built once per invocation, never mutated after `configure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    pub project: String,
    #[serde(flatten)]
    pub target: Target,
    pub toolchain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    pub carry: CarryMode,
    pub sources: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<PathBuf>,
    pub top: String,
    #[serde(flatten)]
    pub constraints: Constraints,
    pub out_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
}

impl ToolchainConfig {
    pub fn new(
        project: &ProjectDescription,
        target: Target,
        toolchain: impl Into<String>,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        ToolchainConfig {
            project: project.name.clone(),
            target,
            toolchain: toolchain.into(),
            strategy: None,
            seed: None,
            carry: CarryMode::Default,
            sources: project.srcs.clone(),
            data: project.data.clone(),
            top: project.top.clone(),
            constraints: Constraints::default(),
            out_dir: out_dir.into(),
            build: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Option<String>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_seed(mut self, seed: Option<u32>) -> PerfResult<Self> {
        if let Some(s) = seed {
            validate_seed(s as u64)?;
        }
        self.seed = seed;
        Ok(self)
    }

    pub fn with_carry(mut self, carry: CarryMode) -> Self {
        self.carry = carry;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_build(mut self, build: Option<String>) -> Self {
        self.build = build;
        self
    }

    /// `<project>_<toolchain>_<family>_<device>_<package>_<carry>`
    pub fn design(&self) -> String {
        design_name(&self.project, &self.toolchain, &self.target, self.carry)
    }

    pub fn out_path(&self, file: &str) -> PathBuf {
        self.out_dir.join(file)
    }

    /// Source list joined with spaces, as the wrapper scripts expect in `SRCS`.
    pub fn sources_joined(&self) -> String {
        self.sources
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn design_name(project: &str, toolchain: &str, target: &Target, carry: CarryMode) -> String {
    format!(
        "{}_{}_{}_{}_{}_{}",
        project, toolchain, target.family, target.device, target.package, carry
    )
}

/// Where external tools are installed. Read from an optional TOML file, then environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Directory holding the vendor wrapper scripts (`icecubed.sh`, `radiant.sh`).
    pub scripts_dir: Option<PathBuf>,
    pub icecube_dir: Option<PathBuf>,
    pub radiant_dir: Option<PathBuf>,
    pub vpr_arch_dir: Option<PathBuf>,
    /// Per-executable overrides, keyed by the tool's usual name (e.g. `yosys`).
    pub executables: BTreeMap<String, PathBuf>,
}

pub const ICECUBEDIR_DEFAULT: &str = "/opt/lscc/iCEcube2.2017.08";
pub const RADIANTDIR_DEFAULT: &str = "/opt/lscc/radiant/1.0";
pub const SCRIPTS_DIR_DEFAULT: &str = "scripts";
pub const VPR_ARCH_DIR_DEFAULT: &str = "/opt/symbiflow/arch";

impl ToolPaths {
    /// Load from `path` if given, then fill unset directories from the environment.
    pub fn load(path: Option<&Path>) -> PerfResult<Self> {
        let mut paths = match path {
            Some(p) => {
                let s = std::fs::read_to_string(p).map_err(|e| {
                    PerfError::Message(format!("failed to read config {}: {e}", p.display()))
                })?;
                toml::from_str(&s).map_err(|e| {
                    PerfError::InvalidConfig(format!("{}: {e}", p.display()))
                })?
            }
            None => ToolPaths::default(),
        };
        paths.fill_from_env();
        Ok(paths)
    }

    fn fill_from_env(&mut self) {
        fn env_or(slot: &mut Option<PathBuf>, var: &str, default: &str) {
            if slot.is_none() {
                *slot = Some(
                    std::env::var_os(var)
                        .map(PathBuf::from)
                        .unwrap_or_else(|| PathBuf::from(default)),
                );
            }
        }
        env_or(&mut self.icecube_dir, "ICECUBEDIR", ICECUBEDIR_DEFAULT);
        env_or(&mut self.radiant_dir, "RADIANTDIR", RADIANTDIR_DEFAULT);
        env_or(&mut self.scripts_dir, "FPGA_TOOL_PERF_SCRIPTS", SCRIPTS_DIR_DEFAULT);
        env_or(&mut self.vpr_arch_dir, "VPR_ARCH_DIR", VPR_ARCH_DIR_DEFAULT);
    }

    /// Path used to invoke the named executable: an override, or the bare name for a PATH lookup.
    pub fn exe(&self, name: &str) -> PathBuf {
        self.executables
            .get(name)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(name))
    }

    pub fn with_exe(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(name.into(), path.into());
        self
    }

    pub fn script(&self, name: &str) -> PathBuf {
        match self.executables.get(name) {
            Some(p) => p.clone(),
            None => self
                .scripts_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(SCRIPTS_DIR_DEFAULT))
                .join(name),
        }
    }

    pub fn icecube_dir(&self) -> PathBuf {
        self.icecube_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(ICECUBEDIR_DEFAULT))
    }

    pub fn radiant_dir(&self) -> PathBuf {
        self.radiant_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(RADIANTDIR_DEFAULT))
    }

    pub fn vpr_arch_dir(&self) -> PathBuf {
        self.vpr_arch_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(VPR_ARCH_DIR_DEFAULT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::Family;

    fn project() -> ProjectDescription {
        ProjectDescription {
            name: "blinky".into(),
            srcs: vec!["a.v".into(), "b.v".into()],
            top: "top".into(),
            data: vec![],
        }
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("1").unwrap(), 1);
        assert_eq!(parse_seed("0x7FFFFFFF").unwrap(), MAX_SEED);
        assert!(parse_seed("0").is_err());
        assert!(parse_seed("0x80000000").is_err());
        assert!(parse_seed("banana").is_err());
    }

    #[test]
    fn test_carry_mode() {
        assert_eq!(CarryMode::from_flag(Some(false)), CarryMode::ForceOff);
        assert_eq!(CarryMode::from_flag(None).forced(), None);
        assert_eq!(CarryMode::ForceOn.to_string(), "carry-y");
    }

    #[test]
    fn test_design_name() {
        let cfg = ToolchainConfig::new(
            &project(),
            Target::new(Family::Ice40, "hx8k", "ct256"),
            "nextpnr",
            "/tmp/out",
        );
        assert_eq!(cfg.design(), "blinky_nextpnr_ice40_hx8k_ct256_carry-d");
        assert_eq!(cfg.sources_joined(), "a.v b.v");
    }

    #[test]
    fn test_with_seed_rejects_zero() {
        let cfg = ToolchainConfig::new(
            &project(),
            Target::new(Family::Ice40, "hx8k", "ct256"),
            "nextpnr",
            "/tmp/out",
        );
        assert!(cfg.clone().with_seed(Some(0)).is_err());
        assert_eq!(cfg.with_seed(Some(42)).unwrap().seed, Some(42));
    }

    #[test]
    fn test_tool_paths_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.toml");
        std::fs::write(
            &path,
            "icecube_dir = \"/opt/ice\"\n[executables]\nyosys = \"/usr/local/bin/yosys\"\n",
        )
        .unwrap();
        let paths = ToolPaths::load(Some(&path)).unwrap();
        assert_eq!(paths.icecube_dir(), PathBuf::from("/opt/ice"));
        assert_eq!(paths.exe("yosys"), PathBuf::from("/usr/local/bin/yosys"));
        assert_eq!(paths.exe("icetime"), PathBuf::from("icetime"));
        assert!(paths.scripts_dir.is_some());
    }

    #[test]
    fn test_project_load_resolves_relative_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blinky.json");
        std::fs::write(&path, r#"{"name":"blinky","srcs":["src/top.v"],"top":"top"}"#).unwrap();
        let p = ProjectDescription::load(&path).unwrap();
        assert_eq!(p.srcs[0], dir.path().join("src/top.v"));
        assert!(p.data.is_empty());
    }
}
