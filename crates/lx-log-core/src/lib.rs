//! Log ingestion and inference engine for logxray.
//!
//! Turns an arbitrary, possibly compressed log file into a session of typed
//! records without a declared schema: transparent decompression, format
//! detection over a sample, per-line parsing (JSON, CSV, LTSV, key-value,
//! Apache/Nginx, syslog, systemd journal export), per-value type inference
//! and normalization. Sessions are then searched with structured queries and
//! summarized by the stats aggregator. The `tools` module exposes all of it
//! as JSON-in / JSON-out operations.

pub mod config;
pub mod decoder;
pub mod detect;
pub mod error;
pub mod infer;
pub mod ingest;
pub mod mock;
pub mod normalize;
pub mod parsers;
pub mod query;
pub mod record;
pub mod session;
pub mod source;
pub mod stats;
pub mod tools;
pub mod types;

// Re-export key types for convenience
pub use config::EngineConfig;
pub use error::{LogError, LogResult};
pub use mock::MockLogSource;
pub use query::{QuerySpec, SearchQuery, SearchResult, search};
pub use record::{FieldValue, Record, ValueKind};
pub use session::{Session, SessionManager, SessionSummary};
pub use source::{FileLogSource, LogSource};
pub use stats::{StatsReport, aggregate};
pub use types::{Compression, LogFormat, LogTool, ParseStatus, ToolResult};
