//! `icetime` static timing report.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::metrics::MaxFreq;
use crate::{PerfError, PerfResult};

static PATH_DELAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Total path delay:\s*([0-9]+(?:\.[0-9]+)?)\s*ns\s*\(\s*([0-9]+(?:\.[0-9]+)?)\s*MHz\s*\)")
        .expect("static regex")
});

static LOGIC_LEVELS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Total number of logic levels:\s*(\d+)").expect("static regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct IcetimeReport {
    pub path_delay_ns: f64,
    pub max_freq_mhz: f64,
    pub logic_levels: Option<u32>,
}

impl IcetimeReport {
    pub fn max_freq(&self) -> MaxFreq {
        MaxFreq::single(self.max_freq_mhz)
    }
}

pub fn parse_icetime(text: &str) -> PerfResult<IcetimeReport> {
    let caps = PATH_DELAY
        .captures(text)
        .ok_or_else(|| PerfError::parse("icetime report", "Total path delay: <ns> ns (<MHz> MHz)"))?;
    let path_delay_ns = caps[1]
        .parse()
        .map_err(|_| PerfError::parse("icetime report", "a numeric path delay"))?;
    let max_freq_mhz = caps[2]
        .parse()
        .map_err(|_| PerfError::parse("icetime report", "a numeric frequency"))?;
    let logic_levels = LOGIC_LEVELS
        .captures(text)
        .and_then(|c| c[1].parse().ok());
    Ok(IcetimeReport {
        path_delay_ns,
        max_freq_mhz,
        logic_levels,
    })
}
