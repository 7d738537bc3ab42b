//! Parsers for vendor report formats.
//!
//! Each parser takes the text of one report and returns normalized data, or
//! `PerfError::Parse` naming the pattern it could not find. None of them fall
//! back to a zero or default measurement.

pub mod icebox;
pub mod icetime;
pub mod nextpnr;
pub mod version;
pub mod vivado;
pub mod vpr;

pub use icebox::parse_icebox_stat;
pub use icetime::{IcetimeReport, parse_icetime};
pub use nextpnr::parse_nextpnr_log;
pub use vivado::{parse_timing_summary, parse_utilization};
pub use vpr::{parse_vpr_fmax, parse_vpr_pack_log};
