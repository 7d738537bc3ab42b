//! VPR route log and pack log.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::metrics::{MaxFreq, Resources};
use crate::{PerfError, PerfResult};

static FMAX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Fmax:\s*([0-9]+(?:\.[0-9]+)?)\s*MHz").expect("static regex"));

static BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(\d+)\s+blocks of type:\s*(\S+)\s*$").expect("static regex")
});

/// Last reported `Fmax` (the post-route figure).
pub fn parse_vpr_fmax(text: &str) -> PerfResult<MaxFreq> {
    let caps = FMAX
        .captures_iter(text)
        .last()
        .ok_or_else(|| PerfError::parse("vpr log", "Fmax: <MHz> MHz"))?;
    let mhz = caps[1]
        .parse()
        .map_err(|_| PerfError::parse("vpr log", "a numeric Fmax"))?;
    Ok(MaxFreq::single(mhz))
}

pub fn parse_vpr_pack_log(text: &str) -> PerfResult<Resources> {
    let mut resources = Resources::new();
    for caps in BLOCKS.captures_iter(text) {
        let count: u64 = caps[1]
            .parse()
            .map_err(|_| PerfError::parse("vpr pack log", "an integer block count"))?;
        *resources.entry(caps[2].to_string()).or_insert(0) += count;
    }
    if resources.is_empty() {
        return Err(PerfError::parse("vpr pack log", "<n> blocks of type: <name>"));
    }
    Ok(resources)
}
