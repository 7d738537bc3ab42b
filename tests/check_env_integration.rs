//! Capability reports over the whole registry.

use std::collections::BTreeSet;

use fpga_tool_perf::core::config::ToolPaths;
use fpga_tool_perf::engine::probe::RequirementKind;
use fpga_tool_perf::toolchain::{
    EnvironmentCheckable, ToolchainKind, VersionReporting, check_env_all, env_ready, get_seedable, get_toolchains,
};

fn missing_tools() -> ToolPaths {
    ToolPaths {
        scripts_dir: Some("/nonexistent/scripts".into()),
        icecube_dir: Some("/nonexistent/icecube".into()),
        radiant_dir: Some("/nonexistent/radiant".into()),
        vpr_arch_dir: Some("/nonexistent/arch".into()),
        ..ToolPaths::default()
    }
}

#[test]
fn check_env_keys_are_stable_across_calls() {
    let tools = ToolPaths::default();
    for kind in ToolchainKind::ALL {
        let a = kind.check_env(&tools);
        let b = kind.check_env(&tools);
        assert!(!a.is_empty(), "{kind} declares no requirements");
        assert_eq!(a, b, "{kind} report changed between calls");
    }
}

#[test]
fn check_env_all_covers_every_toolchain() {
    let reports = check_env_all(&missing_tools(), None).unwrap();
    let ids: Vec<_> = reports.keys().copied().collect();
    assert_eq!(ids, get_toolchains());
    assert_eq!(reports["radiant-lse"].get("RADIANTDIR"), Some(&false));
    assert_eq!(reports["vpr"].get("VPR_ARCH_DIR"), Some(&false));
    assert!(!env_ready(&missing_tools()));
}

#[cfg(unix)]
#[test]
fn present_install_dir_reports_true() {
    let dir = tempfile::tempdir().unwrap();
    let tools = ToolPaths {
        radiant_dir: Some(dir.path().to_path_buf()),
        ..missing_tools()
    };
    let report = ToolchainKind::RadiantSynpro.check_env(&tools);
    assert_eq!(report.get("RADIANTDIR"), Some(&true));
    assert_eq!(report.get("radiant.sh"), Some(&false));
}

#[test]
fn seedable_listing() {
    let seedable = get_seedable();
    assert_eq!(seedable, vec!["arachne", "nextpnr", "vpr"]);
    assert!(seedable.iter().all(|id| get_toolchains().contains(id)));
}

/// Every executable pointed at a path that does not exist.
fn unreachable_executables() -> ToolPaths {
    [
        "yosys", "nextpnr-ice40", "arachne-pnr", "vivado", "vpr", "genfasm", "icepack", "iceunpack",
        "icetime", "icebox_stat", "icecubed.sh", "radiant.sh",
    ]
    .into_iter()
    .fold(missing_tools(), |tools, name| tools.with_exe(name, format!("/nonexistent/bin/{name}")))
}

#[test]
fn versions_follow_required_executables() {
    let tools = unreachable_executables();
    for kind in ToolchainKind::ALL {
        let tc = kind.instantiate(&tools);
        let executables: BTreeSet<String> = tc
            .requirements()
            .into_iter()
            .filter(|r| matches!(r.kind, RequirementKind::Executable(_)))
            .map(|r| r.name)
            .collect();
        let versions = tc.versions();
        for name in versions.keys() {
            let vendor = name == "icecube2" || name == "radiant";
            assert!(vendor || executables.contains(name), "{kind} reports a version for {name}");
        }
        assert!(versions.values().all(Option::is_none), "{kind} ran a missing tool");
    }

    let synpro = ToolchainKind::Icecube2Synpro.instantiate(&tools).versions();
    assert!(!synpro.contains_key("yosys"));
    assert!(synpro.contains_key("icecube2"));
    let yosys_flow = ToolchainKind::Icecube2Yosys.instantiate(&tools).versions();
    assert!(yosys_flow.contains_key("yosys"));
    let radiant = ToolchainKind::RadiantLse.instantiate(&tools).versions();
    for name in ["radiant", "iceunpack", "icetime"] {
        assert!(radiant.contains_key(name), "radiant-lse is missing {name}");
    }
}
