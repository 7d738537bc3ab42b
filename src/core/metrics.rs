//! Normalized results of one toolchain run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::timing::StageTimings;

/// Timing of one clock domain. Frequencies in MHz, violations (worst slack) in ns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockDomainFreq {
    pub actual: f64,
    pub requested: f64,
    pub met: bool,
    /// Worst setup slack; negative means violated. `None` when the tool does not report it.
    pub setup_violation: Option<f64>,
    /// Worst hold slack; negative means violated. `None` when the tool does not report it.
    pub hold_violation: Option<f64>,
}

/// Achieved frequency: one figure for the whole design, or one per clock domain.
///
/// Which shape comes back depends on the report, not on the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaxFreq {
    Single { mhz: f64 },
    PerDomain { domains: BTreeMap<String, ClockDomainFreq> },
}

impl MaxFreq {
    pub fn single(mhz: f64) -> Self {
        MaxFreq::Single { mhz }
    }

    /// Slowest achieved frequency across domains.
    pub fn worst_mhz(&self) -> Option<f64> {
        match self {
            MaxFreq::Single { mhz } => Some(*mhz),
            MaxFreq::PerDomain { domains } => domains
                .values()
                .map(|d| d.actual)
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v)))),
        }
    }
}

/// Resource kind (vendor terminology, kept verbatim) to count.
pub type Resources = BTreeMap<String, u64>;

/// Tool name to version; `None` when the version could not be determined.
pub type Versions = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub runtimes: StageTimings,
    pub max_freq: MaxFreq,
    pub resources: Resources,
    pub versions: Versions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_freq_tagging() {
        let json = serde_json::to_value(MaxFreq::single(100.0)).unwrap();
        assert_eq!(json["kind"], "single");
        assert_eq!(json["mhz"], 100.0);

        let mut domains = BTreeMap::new();
        domains.insert(
            "clk".to_string(),
            ClockDomainFreq {
                actual: 48.0,
                requested: 50.0,
                met: false,
                setup_violation: Some(-0.833),
                hold_violation: None,
            },
        );
        let json = serde_json::to_value(MaxFreq::PerDomain { domains }).unwrap();
        assert_eq!(json["kind"], "per_domain");
        assert_eq!(json["domains"]["clk"]["met"], false);
        assert!(json["domains"]["clk"]["hold_violation"].is_null());
    }

    #[test]
    fn test_worst_mhz() {
        let mut domains = BTreeMap::new();
        for (name, actual) in [("a", 120.0), ("b", 80.0)] {
            domains.insert(
                name.to_string(),
                ClockDomainFreq {
                    actual,
                    requested: 100.0,
                    met: actual >= 100.0,
                    setup_violation: None,
                    hold_violation: None,
                },
            );
        }
        assert_eq!(MaxFreq::PerDomain { domains }.worst_mhz(), Some(80.0));
        assert_eq!(
            MaxFreq::PerDomain { domains: BTreeMap::new() }.worst_mhz(),
            None
        );
    }
}
