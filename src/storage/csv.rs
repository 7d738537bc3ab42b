//! CSV export of run reports.
//!
//! Columns are fixed so files from different toolchains concatenate cleanly.
//! Resource kinds vary per vendor and are flattened into one column.

use std::io::Write;
use std::path::Path;

use crate::PerfError;
use crate::core::metrics::{MaxFreq, Resources};
use crate::core::schema::RunReport;

pub const CSV_HEADERS: &[&str] = &[
    "schema_version",
    "record_id",
    "timestamp",
    "design",
    "project",
    "toolchain",
    "family",
    "device",
    "package",
    "strategy",
    "seed",
    "carry",
    "build",
    "max_freq_mhz",
    "timing_met",
    "runtime_total_s",
    "resources",
    "git_sha",
    "hostname",
];

#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        CsvExporter
    }

    pub fn export(&self, reports: &[RunReport], output: &Path) -> Result<(), PerfError> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PerfError::Message(format!("failed to create directory: {e}")))?;
            }
        }

        let file = std::fs::File::create(output)
            .map_err(|e| PerfError::Message(format!("failed to create {}: {e}", output.display())))?;

        self.export_to_writer(reports, file)
    }

    pub fn export_to_stdout(&self, reports: &[RunReport]) -> Result<(), PerfError> {
        let stdout = std::io::stdout();
        self.export_to_writer(reports, stdout.lock())
    }

    pub fn export_to_writer<W: Write>(&self, reports: &[RunReport], writer: W) -> Result<(), PerfError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer
            .write_record(CSV_HEADERS)
            .map_err(|e| PerfError::Message(format!("failed to write CSV headers: {e}")))?;

        for report in reports {
            csv_writer
                .write_record(self.report_to_row(report))
                .map_err(|e| PerfError::Message(format!("failed to write CSV row: {e}")))?;
        }

        csv_writer
            .flush()
            .map_err(|e| PerfError::Message(format!("failed to flush CSV writer: {e}")))?;

        Ok(())
    }

    fn report_to_row(&self, report: &RunReport) -> Vec<String> {
        let cfg = &report.config;
        let metrics = &report.metrics;
        vec![
            report.schema_version.to_string(),
            report.record_id.clone(),
            report.timestamp.clone(),
            report.design.clone(),
            cfg.project.clone(),
            cfg.toolchain.clone(),
            cfg.target.family.to_string(),
            cfg.target.device.clone(),
            cfg.target.package.clone(),
            cfg.strategy.clone().unwrap_or_default(),
            cfg.seed.map(|s| s.to_string()).unwrap_or_default(),
            cfg.carry.to_string(),
            cfg.build.clone().unwrap_or_default(),
            metrics
                .max_freq
                .worst_mhz()
                .map(|v| format!("{v:.3}"))
                .unwrap_or_default(),
            timing_met(&metrics.max_freq),
            format!("{:.3}", metrics.runtimes.total()),
            flatten_resources(&metrics.resources),
            report.env.git_sha.clone().unwrap_or_default(),
            report.env.hostname.clone().unwrap_or_default(),
        ]
    }
}

/// `kind=count;kind=count`, sorted by kind.
pub fn flatten_resources(resources: &Resources) -> String {
    resources
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Empty for single-figure reports, which carry no pass/fail.
fn timing_met(freq: &MaxFreq) -> String {
    match freq {
        MaxFreq::Single { .. } => String::new(),
        MaxFreq::PerDomain { domains } => domains.values().all(|d| d.met).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ProjectDescription, ToolchainConfig};
    use crate::core::env::EnvironmentInfo;
    use crate::core::metrics::RunMetrics;
    use crate::core::target::{Family, Target};
    use crate::engine::timing::StageTimings;

    fn report() -> RunReport {
        let project = ProjectDescription {
            name: "picosoc".into(),
            srcs: vec!["soc.v".into()],
            top: "top".into(),
            data: vec![],
        };
        let config = ToolchainConfig::new(
            &project,
            Target::new(Family::Ice40, "up5k", "sg48"),
            "radiant-lse",
            "/tmp/x",
        )
        .with_strategy(Some("Timing".into()));
        let mut runtimes = StageTimings::new();
        runtimes.timed("bit-all", || ());
        let metrics = RunMetrics {
            runtimes,
            max_freq: MaxFreq::single(42.5),
            resources: [("PLBs".to_string(), 7), ("LCs".to_string(), 50)].into(),
            versions: Default::default(),
        };
        RunReport::new(config, metrics, EnvironmentInfo::default())
    }

    #[test]
    fn test_row_matches_headers() {
        let mut out = Vec::new();
        CsvExporter::new().export_to_writer(&[report()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADERS.join(","));

        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(row.len(), CSV_HEADERS.len());
        assert_eq!(&row[5], "radiant-lse");
        assert_eq!(&row[9], "Timing");
        assert_eq!(&row[13], "42.500");
        assert_eq!(&row[16], "LCs=50;PLBs=7");
    }
}
