//! Log source abstraction: open a path as a stream of decoded lines.

use std::path::Path;

use crate::decoder;
use crate::error::LogResult;
use crate::types::{Compression, RawLine};

/// Lazy, finite, non-restartable sequence of decoded lines.
pub type LineStream = Box<dyn Iterator<Item = LogResult<RawLine>> + Send>;

/// A freshly opened source: its detected compression plus the line stream.
pub struct OpenedSource {
    pub compression: Compression,
    pub lines: LineStream,
}

/// Abstraction for reading log data from various backends.
///
/// Sources are synchronous: a processing pass runs on a blocking worker
/// and pulls lines one at a time, so memory stays bounded by the records
/// it keeps, not by the decoded file size.
pub trait LogSource: Send + Sync {
    /// Open `path` and return its decoded lines.
    fn open(&self, path: &str) -> LogResult<OpenedSource>;

    /// Check if a source path exists and is readable.
    fn exists(&self, path: &str) -> bool;
}

/// Reads logs from the local filesystem, decompressing transparently.
pub struct FileLogSource;

impl LogSource for FileLogSource {
    fn open(&self, path: &str) -> LogResult<OpenedSource> {
        let reader = decoder::open(Path::new(path))?;
        Ok(OpenedSource {
            compression: reader.compression(),
            lines: Box::new(reader),
        })
    }

    fn exists(&self, path: &str) -> bool {
        std::fs::metadata(path).is_ok_and(|m| m.is_file())
    }
}
