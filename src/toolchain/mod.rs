//! Toolchain adapters: one per vendor flow, behind the capability traits.

pub mod arachne;
pub mod icecube2;
pub mod icestorm;
pub mod mock;
pub mod nextpnr;
pub mod radiant;
pub mod registry;
pub mod traits;
pub mod versions;
pub mod vivado;
pub mod vpr;

pub use mock::{MockConfig, MockToolchain};
pub use registry::{ToolchainKind, check_env_all, env_ready, get_seedable, get_toolchains};
pub use traits::{
    EnvironmentCheckable, FlowCapabilities, FrequencyReporting, ResourceReporting, Runnable,
    Strategies, Toolchain, VersionReporting,
};
