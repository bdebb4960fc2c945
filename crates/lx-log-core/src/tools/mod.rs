//! JSON tools over the session manager.
//!
//! - process_file: decode, detect and parse a file into a new session
//! - session_info: metadata of the published session
//! - search_records: structured and raw-text search
//! - log_stats: per-field distributions, histogram and time series

pub mod log_stats;
pub mod process_file;
pub mod search_records;
pub mod session_info;

pub use log_stats::LogStats;
pub use process_file::ProcessFile;
pub use search_records::SearchRecords;
pub use session_info::SessionInfo;

use crate::types::LogTool;

/// Every tool this crate provides.
pub fn all_tools() -> Vec<Box<dyn LogTool>> {
    vec![
        Box::new(ProcessFile),
        Box::new(SessionInfo),
        Box::new(SearchRecords),
        Box::new(LogStats),
    ]
}
