//! Tool versions, looked up from an adapter's requirement list.

use std::path::Path;

use crate::PerfResult;
use crate::core::metrics::Versions;
use crate::engine::probe::{Requirement, RequirementKind};
use crate::engine::runner::ToolCommand;
use crate::parse::version::{first_line, parse_vivado_version, parse_vpr_version, parse_yosys_version};

type VersionParser = fn(&str) -> PerfResult<String>;

enum VersionSource {
    Flag(&'static str, VersionParser),
    /// The tool has no way to print its version.
    Unavailable,
}

fn version_source(tool: &str) -> Option<VersionSource> {
    match tool {
        "yosys" => Some(VersionSource::Flag("-V", parse_yosys_version)),
        "nextpnr-ice40" | "arachne-pnr" => Some(VersionSource::Flag("--version", first_line)),
        "vivado" => Some(VersionSource::Flag("-version", parse_vivado_version)),
        "vpr" | "genfasm" => Some(VersionSource::Flag("--version", parse_vpr_version)),
        "icepack" | "iceunpack" | "icetime" | "icebox_stat" => Some(VersionSource::Unavailable),
        _ => None,
    }
}

/// Best-effort version from `<program> <flag>`, reduced with `parse`.
fn query(program: &Path, flag: &str, parse: VersionParser) -> Option<String> {
    ToolCommand::new(program)
        .arg(flag)
        .best_effort()
        .run()
        .ok()
        .filter(|o| o.success)
        .and_then(|o| parse(&o.stdout).or_else(|_| parse(&o.stderr)).ok())
}

/// One entry per required executable with a known version source.
///
/// Wrapper scripts have none; adapters add the vendor version themselves.
pub fn tool_versions(requirements: &[Requirement]) -> Versions {
    let mut versions = Versions::new();
    for req in requirements {
        let RequirementKind::Executable(program) = &req.kind else {
            continue;
        };
        match version_source(&req.name) {
            Some(VersionSource::Flag(flag, parse)) => {
                versions.insert(req.name.clone(), query(program, flag, parse));
            }
            Some(VersionSource::Unavailable) => {
                versions.insert(req.name.clone(), None);
            }
            None => {}
        }
    }
    versions
}
