//! nextpnr log: per-clock achieved frequency.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::metrics::{ClockDomainFreq, MaxFreq};
use crate::{PerfError, PerfResult};

static MAX_FREQ: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Max frequency for clock\s+'([^']+)':\s*([0-9]+(?:\.[0-9]+)?)\s*MHz\s*\((PASS|FAIL) at ([0-9]+(?:\.[0-9]+)?)\s*MHz\)",
    )
    .expect("static regex")
});

/// nextpnr prints the figures after placement and again after routing; the last one wins.
pub fn parse_nextpnr_log(text: &str) -> PerfResult<MaxFreq> {
    let mut domains = BTreeMap::new();
    for caps in MAX_FREQ.captures_iter(text) {
        let actual: f64 = caps[2]
            .parse()
            .map_err(|_| PerfError::parse("nextpnr log", "a numeric achieved frequency"))?;
        let requested: f64 = caps[4]
            .parse()
            .map_err(|_| PerfError::parse("nextpnr log", "a numeric requested frequency"))?;
        let setup_violation = (actual > 0.0 && requested > 0.0)
            .then(|| 1000.0 / requested - 1000.0 / actual);
        domains.insert(
            caps[1].to_string(),
            ClockDomainFreq {
                actual,
                requested,
                met: &caps[3] == "PASS",
                setup_violation,
                hold_violation: None,
            },
        );
    }
    if domains.is_empty() {
        return Err(PerfError::parse(
            "nextpnr log",
            "Max frequency for clock '<clk>': <MHz> MHz (PASS|FAIL at <MHz> MHz)",
        ));
    }
    Ok(MaxFreq::PerDomain { domains })
}
