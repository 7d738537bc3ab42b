//! Persistence for run reports: JSONL history and CSV export.

pub mod csv;
pub mod jsonl;

pub use self::csv::{CSV_HEADERS, CsvExporter};
pub use self::jsonl::RunHistory;
