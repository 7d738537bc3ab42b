//! `icebox_stat` resource summary of a placed iCE40 `.asc`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::metrics::Resources;
use crate::{PerfError, PerfResult};

static STAT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*([A-Za-z][A-Za-z0-9_ ]*?)\s*:\s*(\d+)\s*$").expect("static regex")
});

/// Every `<Kind>: <count>` line becomes a resource entry; kinds are kept as printed.
pub fn parse_icebox_stat(text: &str) -> PerfResult<Resources> {
    let mut resources = Resources::new();
    for caps in STAT_LINE.captures_iter(text) {
        let count = caps[2]
            .parse()
            .map_err(|_| PerfError::parse("icebox_stat output", "an integer count"))?;
        resources.insert(caps[1].to_string(), count);
    }
    if resources.is_empty() {
        return Err(PerfError::parse("icebox_stat output", "<Kind>: <count> lines"));
    }
    Ok(resources)
}
