//! End-to-end runs of real adapters against stub vendor tools.
//!
//! Each stub is a small shell script that writes the files the real tool
//! would, with known contents, so the whole run/parse/report path is covered
//! without any vendor software installed.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use fpga_tool_perf::PerfError;
use fpga_tool_perf::core::config::{Constraints, ProjectDescription, ToolPaths, ToolchainConfig};
use fpga_tool_perf::core::metrics::MaxFreq;
use fpga_tool_perf::core::schema::RunReport;
use fpga_tool_perf::core::target::{Family, Target};
use fpga_tool_perf::engine::orchestrator::{self, FAILURE_FILE, META_FILE, RunRequest};
use fpga_tool_perf::engine::timing::{StageEntry, StageTimings};
use fpga_tool_perf::storage::RunHistory;
use fpga_tool_perf::toolchain::icecube2::{Icecube2, Icecube2Synth};
use fpga_tool_perf::toolchain::{FrequencyReporting, ResourceReporting, Runnable};

fn write_exe(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\nset -e\n{body}")).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// Stub iCEcube2 install: wrapper script plus the IceStorm back-end tools.
fn stub_icecube2(bin: &Path) -> ToolPaths {
    fs::create_dir_all(bin).unwrap();
    write_exe(
        &bin.join("icecubed.sh"),
        r#"env | grep -E '^(SRCS|TOP|ICEDEV|ICECUBEDIR|PCF)=' | sort > script_env.txt
echo "$@" > script_args.txt
printf 'bitstream' > my.bin
"#,
    );
    write_exe(
        &bin.join("iceunpack"),
        r#"printf '.comment\nLattice\niCEcube2 2017.08.27940\n' > "$2"
"#,
    );
    write_exe(
        &bin.join("icetime"),
        r#"echo "// Reading input .asc file.."
echo "Total number of logic levels: 4"
echo "Total path delay: 10.00 ns (100.00 MHz)"
"#,
    );
    write_exe(
        &bin.join("icebox_stat"),
        r#"printf 'DFFs:     22\nLUTs:     45\nCARRYs:   10\nBRAMs:     0\nIOBs:      4\nPLLs:      0\nGLBs:      2\n'
"#,
    );
    ToolPaths {
        icecube_dir: Some(bin.to_path_buf()),
        ..ToolPaths::default()
    }
    .with_exe("icecubed.sh", bin.join("icecubed.sh"))
    .with_exe("iceunpack", bin.join("iceunpack"))
    .with_exe("icetime", bin.join("icetime"))
    .with_exe("icebox_stat", bin.join("icebox_stat"))
}

/// Two sources and a pin constraint file.
fn project(dir: &Path) -> (ProjectDescription, PathBuf) {
    let src = dir.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("top.v"), "module top(input clk, output led); blink b(clk, led); endmodule\n").unwrap();
    fs::write(src.join("blink.v"), "module blink(input clk, output reg led); endmodule\n").unwrap();
    let pcf = src.join("pins.pcf");
    fs::write(&pcf, "set_io clk J3\nset_io led B5\n").unwrap();
    let project = ProjectDescription {
        name: "oneblink".into(),
        srcs: vec![src.join("top.v"), src.join("blink.v")],
        top: "top".into(),
        data: vec![],
    };
    (project, pcf)
}

#[test]
fn icecube2_adapter_against_stub_tools() {
    let dir = tempfile::tempdir().unwrap();
    let tools = stub_icecube2(&dir.path().join("bin"));
    let (project, pcf) = project(dir.path());
    let out = dir.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let cfg = ToolchainConfig::new(
        &project,
        Target::new(Family::Ice40, "hx8k", "ct256"),
        "icecube2-lse",
        &out,
    )
    .with_constraints(Constraints {
        pcf: Some(pcf.clone()),
        ..Constraints::default()
    });

    let mut tc = Icecube2::new(Icecube2Synth::Lse, tools);
    tc.configure(&cfg).unwrap();
    let mut stages = StageTimings::new();
    tc.run(&mut stages).unwrap();

    assert_eq!(tc.max_freq().unwrap(), MaxFreq::single(100.0));
    let resources = tc.resources().unwrap();
    assert_eq!(resources.len(), 7);
    assert_eq!(resources["LUTs"], 45);
    assert_eq!(resources["DFFs"], 22);

    assert_eq!(stages.len(), 1);
    let (name, entry) = stages.iter().next().unwrap();
    assert_eq!(name, "bit-all");
    assert!(entry.elapsed() >= 0.0);
    match entry {
        StageEntry::Group(g) => {
            let subs: Vec<&str> = g.stages.keys().map(String::as_str).collect();
            assert_eq!(subs, vec!["icecube2", "unpack", "timing", "stat"]);
        }
        StageEntry::Leaf(_) => panic!("expected sub-stages under bit-all"),
    }

    let env = fs::read_to_string(out.join("script_env.txt")).unwrap();
    assert!(env.contains("ICEDEV=hx8k-ct256"));
    assert!(env.contains("TOP=top"));
    assert!(env.contains("top.v"));
    assert!(env.contains("blink.v"));
    assert!(env.contains(&format!("PCF={}", pcf.display())));
    assert_eq!(fs::read_to_string(out.join("script_args.txt")).unwrap().trim(), "--syn lse");
    // the overlay stays in the child
    assert!(std::env::var_os("ICEDEV").is_none());
}

#[test]
fn orchestrated_run_writes_meta_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let tools = stub_icecube2(&dir.path().join("bin"));
    let (project, pcf) = project(dir.path());

    let request = RunRequest::new(project, "ice40", "hx8k", "ct256", "icecube2-synpro")
        .with_out_prefix(dir.path().join("build"))
        .with_constraints(Constraints {
            pcf: Some(pcf),
            ..Constraints::default()
        });
    let report = orchestrator::run(&request, &tools).unwrap();

    assert_eq!(report.design, "oneblink_icecube2-synpro_ice40_hx8k_ct256_carry-d");
    assert_eq!(report.metrics.versions["icecube2"].as_deref(), Some("2017.08.27940"));
    assert_eq!(report.metrics.versions["icetime"], None);
    assert!(!report.metrics.versions.contains_key("yosys"));
    assert_eq!(report.source_sha256.len(), 2);

    let out = dir.path().join("build").join(&report.design);
    let meta: RunReport = serde_json::from_str(&fs::read_to_string(out.join(META_FILE)).unwrap()).unwrap();
    assert_eq!(meta.record_id, report.record_id);
    assert_eq!(meta.config, report.config);
    assert_eq!(meta.metrics.max_freq, MaxFreq::single(100.0));
    assert_eq!(meta.metrics.resources, report.metrics.resources);

    let history = RunHistory::new(dir.path().join("runs.jsonl"));
    history.append(&report).unwrap();
    assert_eq!(history.read_toolchain(Some("icecube2-synpro")).unwrap().len(), 1);

    // a second run into the same directory needs --overwrite
    let again = orchestrator::run(&request, &tools).unwrap_err();
    assert!(matches!(again, PerfError::InvalidConfig(_)));
    let replaced = orchestrator::run(&request.clone().with_overwrite(true), &tools).unwrap();
    assert_ne!(replaced.record_id, "");
}

#[test]
fn tool_failure_keeps_stderr_tail_and_timings() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    let tools = stub_icecube2(&bin);
    write_exe(
        &bin.join("icecubed.sh"),
        "echo 'E2055: top module not found' >&2\nexit 2\n",
    );
    let (project, _) = project(dir.path());
    let out = dir.path().join("out");

    let request = RunRequest::new(project, "ice40", "hx8k", "ct256", "icecube2-lse").with_out_dir(&out);
    let err = orchestrator::run(&request, &tools).unwrap_err();
    match &err {
        PerfError::ToolFailure { program, stderr_tail, .. } => {
            assert_eq!(program, "icecubed.sh");
            assert!(stderr_tail.contains("E2055"));
        }
        other => panic!("expected ToolFailure, got {other:?}"),
    }
    assert!(!out.join(META_FILE).exists());
    let failure = fs::read_to_string(out.join(FAILURE_FILE)).unwrap();
    assert!(failure.contains("bit-all"));
    assert!(failure.contains("E2055"));
}

#[test]
fn unsupported_target_is_rejected_before_any_process() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    let tools = stub_icecube2(&bin);
    write_exe(&bin.join("icecubed.sh"), "touch \"$0.ran\"\n");
    let (project, _) = project(dir.path());
    let out = dir.path().join("out");

    let request = RunRequest::new(project.clone(), "ice40", "hx8k", "sg48", "icecube2-lse").with_out_dir(&out);
    assert!(matches!(
        orchestrator::run(&request, &tools),
        Err(PerfError::UnsupportedTarget { .. })
    ));

    let request = RunRequest::new(project, "xc7", "a35t", "csg324-1", "radiant-lse").with_out_dir(&out);
    assert!(matches!(
        orchestrator::run(&request, &tools),
        Err(PerfError::UnsupportedTarget { .. })
    ));

    assert!(!out.exists());
    assert!(!bin.join("icecubed.sh.ran").exists());
}

#[test]
fn seed_on_unseedable_toolchain_is_unsupported_option() {
    let dir = tempfile::tempdir().unwrap();
    let tools = stub_icecube2(&dir.path().join("bin"));
    let (project, _) = project(dir.path());
    let out = dir.path().join("out");

    let request = RunRequest::new(project, "ice40", "hx8k", "ct256", "icecube2-lse")
        .with_out_dir(&out)
        .with_seed(42);
    assert!(matches!(
        orchestrator::run(&request, &tools),
        Err(PerfError::UnsupportedOption { .. })
    ));
    assert!(!out.exists());
}
