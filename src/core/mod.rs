//! Core types: run configuration, device tables, metrics and the persisted report schema.

pub mod config;
pub mod env;
pub mod metrics;
pub mod schema;
pub mod target;

pub use config::{CarryMode, Constraints, ProjectDescription, ToolPaths, ToolchainConfig};
pub use env::EnvironmentInfo;
pub use metrics::{ClockDomainFreq, MaxFreq, Resources, RunMetrics, Versions};
pub use schema::{FailureReport, RunReport, SCHEMA_VERSION};
pub use target::{Family, Target};
