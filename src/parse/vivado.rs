//! Vivado `report_timing_summary` and `report_utilization` output.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::metrics::{ClockDomainFreq, MaxFreq, Resources};
use crate::{PerfError, PerfResult};

static UTIL_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\|\s*([^|]*?[^|\s])\s*\|\s*(\d+)\s*\|").expect("static regex")
});

/// Rows of the whitespace table that starts at the header line matching `is_header`.
fn table_rows<'a>(text: &'a str, is_header: impl Fn(&str) -> bool) -> Option<Vec<Vec<&'a str>>> {
    let mut lines = text.lines().skip_while(|l| !is_header(l.trim_start()));
    lines.next()?;
    let rows = lines
        .skip_while(|l| l.trim_start().starts_with('-'))
        .take_while(|l| !l.trim().is_empty())
        .map(|l| l.split_whitespace().collect())
        .collect();
    Some(rows)
}

struct ClockSummary {
    period_ns: f64,
    requested_mhz: f64,
}

fn num(tok: &str, expected: &'static str) -> PerfResult<f64> {
    tok.parse()
        .map_err(|_| PerfError::parse("vivado timing summary", expected))
}

/// Join the Clock Summary (periods) with the Intra Clock Table (WNS/WHS).
pub fn parse_timing_summary(text: &str) -> PerfResult<MaxFreq> {
    let summary_rows = table_rows(text, |l| {
        l.starts_with("Clock") && l.contains("Waveform(ns)") && l.contains("Period(ns)")
    })
    .ok_or_else(|| {
        PerfError::parse("vivado timing summary", "Clock Summary table (Clock Waveform(ns) Period(ns))")
    })?;

    let mut clocks = BTreeMap::new();
    for row in summary_rows {
        if row.len() < 3 {
            continue;
        }
        let n = row.len();
        clocks.insert(
            row[0].to_string(),
            ClockSummary {
                period_ns: num(row[n - 2], "a numeric clock period")?,
                requested_mhz: num(row[n - 1], "a numeric clock frequency")?,
            },
        );
    }

    let intra_rows = table_rows(text, |l| l.starts_with("Clock") && l.contains("WNS(ns)"))
        .ok_or_else(|| PerfError::parse("vivado timing summary", "Intra Clock Table (Clock WNS(ns) ...)"))?;

    let mut domains = BTreeMap::new();
    for row in intra_rows {
        if row.len() < 6 {
            continue;
        }
        let Some(clock) = clocks.get(row[0]) else {
            continue;
        };
        let wns = num(row[1], "a numeric WNS")?;
        let whs = num(row[5], "a numeric WHS")?;
        let actual = if wns.is_finite() && clock.period_ns - wns > 0.0 {
            1000.0 / (clock.period_ns - wns)
        } else {
            clock.requested_mhz
        };
        domains.insert(
            row[0].to_string(),
            ClockDomainFreq {
                actual,
                requested: clock.requested_mhz,
                met: wns >= 0.0 && whs >= 0.0,
                setup_violation: wns.is_finite().then_some(wns),
                hold_violation: whs.is_finite().then_some(whs),
            },
        );
    }

    if domains.is_empty() {
        return Err(PerfError::parse(
            "vivado timing summary",
            "an Intra Clock Table row for a summarized clock",
        ));
    }
    Ok(MaxFreq::PerDomain { domains })
}

/// `| <Site Type> | <Used> | ...` rows; the first row for a name wins (later tables repeat names).
pub fn parse_utilization(text: &str) -> PerfResult<Resources> {
    let mut resources = Resources::new();
    for caps in UTIL_ROW.captures_iter(text) {
        let name = caps[1].trim_end_matches('*').trim_end();
        let used: u64 = caps[2]
            .parse()
            .map_err(|_| PerfError::parse("vivado utilization report", "an integer Used column"))?;
        resources.entry(name.to_string()).or_insert(used);
    }
    if resources.is_empty() {
        return Err(PerfError::parse(
            "vivado utilization report",
            "| <Site Type> | <Used> | table rows",
        ));
    }
    Ok(resources)
}
