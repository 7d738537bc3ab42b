//! Engine: command runner, timing harness, capability prober and run orchestrator.
//!
//! Adapters in `crate::toolchain` build commands and read reports; this module
//! runs the commands, times them and decides what gets persisted.

pub mod orchestrator;
pub mod probe;
pub mod runner;
pub mod timing;

pub use orchestrator::{RunRequest, run, run_with};
pub use probe::{CapabilityReport, Requirement, probe};
pub use runner::{EnvOverlay, ToolCommand, ToolOutput};
pub use timing::{StageEntry, StageTimings, SubStages};
