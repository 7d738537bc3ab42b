//! RunReport schema v1, the document persisted for every run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::ToolchainConfig;
use super::env::EnvironmentInfo;
use super::metrics::RunMetrics;
use crate::engine::timing::StageTimings;
use crate::{PerfError, PerfResult, sha256_hex};

/// Schema version for forward compatibility
pub const SCHEMA_VERSION: u32 = 1;

/// A completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: u32,

    pub record_id: String,

    /// RFC 3339, UTC
    pub timestamp: String,

    /// `<project>_<toolchain>_<family>_<device>_<package>_<carry>`
    pub design: String,

    pub config: ToolchainConfig,

    #[serde(flatten)]
    pub metrics: RunMetrics,

    pub env: EnvironmentInfo,

    /// Source path to SHA-256 of its contents at run time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_sha256: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cli_args: Vec<String>,
}

impl RunReport {
    pub fn new(config: ToolchainConfig, metrics: RunMetrics, env: EnvironmentInfo) -> Self {
        let (record_id, timestamp) = new_record_id();
        RunReport {
            schema_version: SCHEMA_VERSION,
            record_id,
            timestamp,
            design: config.design(),
            config,
            metrics,
            env,
            source_sha256: BTreeMap::new(),
            cli_args: Vec::new(),
        }
    }

    pub fn with_source_hashes(mut self, hashes: BTreeMap<String, String>) -> Self {
        self.source_sha256 = hashes;
        self
    }

    pub fn with_cli_args(mut self, args: Vec<String>) -> Self {
        self.cli_args = args;
        self
    }

    pub fn toolchain(&self) -> &str {
        &self.config.toolchain
    }
}

/// A run that stopped on an error; keeps the stage times recorded up to the failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub schema_version: u32,
    pub record_id: String,
    pub timestamp: String,
    pub design: String,
    pub config: ToolchainConfig,
    pub runtimes: StageTimings,
    pub error: String,
}

impl FailureReport {
    pub fn new(config: ToolchainConfig, runtimes: StageTimings, error: &PerfError) -> Self {
        let (record_id, timestamp) = new_record_id();
        FailureReport {
            schema_version: SCHEMA_VERSION,
            record_id,
            timestamp,
            design: config.design(),
            config,
            runtimes,
            error: error.to_string(),
        }
    }
}

/// Record id from the current time; returns `(id, rfc3339 timestamp)`.
fn new_record_id() -> (String, String) {
    let now = time::OffsetDateTime::now_utc();
    let timestamp = now
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let record_id = format!("{:x}-{}", now.unix_timestamp_nanos(), now.unix_timestamp());
    (record_id, timestamp)
}

/// SHA-256 of every source file, keyed by path.
pub fn hash_sources(sources: &[PathBuf]) -> PerfResult<BTreeMap<String, String>> {
    sources
        .iter()
        .map(|p| {
            let bytes = std::fs::read(p).map_err(|e| {
                PerfError::InvalidConfig(format!("cannot read source {}: {e}", p.display()))
            })?;
            Ok((p.to_string_lossy().into_owned(), sha256_hex(&bytes)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProjectDescription;
    use crate::core::metrics::MaxFreq;
    use crate::core::target::{Family, Target};

    fn config() -> ToolchainConfig {
        let project = ProjectDescription {
            name: "oneblink".into(),
            srcs: vec!["top.v".into()],
            top: "top".into(),
            data: vec![],
        };
        ToolchainConfig::new(&project, Target::new(Family::Ice40, "hx8k", "ct256"), "nextpnr", "/tmp/x")
    }

    #[test]
    fn test_report_fields_are_stable() {
        let metrics = RunMetrics {
            runtimes: StageTimings::new(),
            max_freq: MaxFreq::single(100.0),
            resources: [("LCs".to_string(), 12)].into(),
            versions: [("yosys".to_string(), None)].into(),
        };
        let report = RunReport::new(config(), metrics, EnvironmentInfo::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["schema_version"], 1);
        assert_eq!(json["design"], "oneblink_nextpnr_ice40_hx8k_ct256_carry-d");
        assert_eq!(json["config"]["device"], "hx8k");
        assert_eq!(json["max_freq"]["mhz"], 100.0);
        assert_eq!(json["resources"]["LCs"], 12);
        assert!(json["versions"]["yosys"].is_null());
        // RFC 3339 in UTC: `2026-10-19T12:00:00.123Z`
        assert!(report.timestamp.contains('T'));
        assert!(report.timestamp.ends_with('Z'));
        assert_eq!(report.timestamp.as_bytes()[4], b'-');

        let back: RunReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_hash_sources() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("top.v");
        std::fs::write(&src, "module top; endmodule\n").unwrap();
        let hashes = hash_sources(&[src.clone()]).unwrap();
        assert_eq!(hashes[&src.to_string_lossy().into_owned()].len(), 64);
        assert!(hash_sources(&[dir.path().join("missing.v")]).is_err());
    }
}
