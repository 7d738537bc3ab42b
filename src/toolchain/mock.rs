//! Mock toolchain for testing.

use crate::core::config::ToolchainConfig;
use crate::core::metrics::{MaxFreq, Resources, Versions};
use crate::core::target::Family;
use crate::engine::probe::Requirement;
use crate::engine::timing::StageTimings;
use crate::{PerfError, PerfResult};

use super::traits::{
    EnvironmentCheckable, FlowCapabilities, FrequencyReporting, ResourceReporting, Runnable,
    Strategies, VersionReporting, configured,
};

/// Canned results for the mock toolchain.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub name: &'static str,
    pub family: Family,
    pub capabilities: FlowCapabilities,
    /// Sub-stages recorded under `bit-all`, in order.
    pub stages: Vec<&'static str>,
    /// Stage that fails with a `ToolFailure`, if any.
    pub fail_at: Option<&'static str>,
    pub max_freq: Option<MaxFreq>,
    pub resources: Option<Resources>,
    pub versions: Versions,
}

impl MockConfig {
    pub fn new(name: &'static str) -> Self {
        MockConfig {
            name,
            family: Family::Ice40,
            capabilities: FlowCapabilities {
                seedable: true,
                carries: &[true, false],
                strategies: Strategies::Any,
            },
            stages: vec!["synthesis", "pnr", "bitstream"],
            fail_at: None,
            max_freq: Some(MaxFreq::single(100.0)),
            resources: Some(Resources::from([("LCs".to_string(), 42)])),
            versions: Versions::from([("mock".to_string(), Some("mock-1.0.0".to_string()))]),
        }
    }

    pub fn with_family(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    pub fn with_capabilities(mut self, caps: FlowCapabilities) -> Self {
        self.capabilities = caps;
        self
    }

    pub fn fails_at(mut self, stage: &'static str) -> Self {
        self.fail_at = Some(stage);
        self
    }

    /// Make `max_freq` report a missing file.
    pub fn without_max_freq(mut self) -> Self {
        self.max_freq = None;
        self
    }

    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = Some(resources);
        self
    }
}

/// Toolchain that starts no processes and returns the configured results.
pub struct MockToolchain {
    mock: MockConfig,
    config: Option<ToolchainConfig>,
    runs: usize,
}

impl MockToolchain {
    pub fn new(mock: MockConfig) -> Self {
        MockToolchain {
            mock,
            config: None,
            runs: 0,
        }
    }

    pub fn default_mock() -> Self {
        Self::new(MockConfig::new("mock"))
    }

    /// How many times `run` was entered.
    pub fn runs(&self) -> usize {
        self.runs
    }

    fn missing(&self, file: &str) -> PerfError {
        let path = self
            .config
            .as_ref()
            .map(|c| c.out_path(file))
            .unwrap_or_else(|| file.into());
        PerfError::ReportMissing { path }
    }
}

impl Runnable for MockToolchain {
    fn name(&self) -> &'static str {
        self.mock.name
    }

    fn capabilities(&self) -> FlowCapabilities {
        self.mock.capabilities
    }

    fn configure(&mut self, config: &ToolchainConfig) -> PerfResult<()> {
        config.target.require(self.name(), self.mock.family, None)?;
        self.capabilities().validate(self.name(), config)?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn run(&mut self, stages: &mut StageTimings) -> PerfResult<()> {
        configured(&self.config, self.name())?;
        self.runs += 1;
        let mock = &self.mock;
        stages.group("bit-all", |sub| {
            for stage in &mock.stages {
                sub.timed(stage, || {
                    if mock.fail_at == Some(*stage) {
                        Err(PerfError::ToolFailure {
                            program: stage.to_string(),
                            status: "exit status: 1".to_string(),
                            stderr_tail: format!("{stage}: mock failure"),
                        })
                    } else {
                        Ok(())
                    }
                })?;
            }
            Ok(())
        })
    }
}

impl FrequencyReporting for MockToolchain {
    fn max_freq(&self) -> PerfResult<MaxFreq> {
        configured(&self.config, self.name())?;
        self.mock.max_freq.clone().ok_or_else(|| self.missing("mock-timing.rpt"))
    }
}

impl ResourceReporting for MockToolchain {
    fn resources(&self) -> PerfResult<Resources> {
        configured(&self.config, self.name())?;
        self.mock.resources.clone().ok_or_else(|| self.missing("mock-util.rpt"))
    }
}

impl VersionReporting for MockToolchain {
    fn versions(&self) -> Versions {
        self.mock.versions.clone()
    }
}

impl EnvironmentCheckable for MockToolchain {
    fn requirements(&self) -> Vec<Requirement> {
        Vec::new()
    }
}
