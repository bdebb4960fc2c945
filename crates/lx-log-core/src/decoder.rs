//! Transparent decoder: sniff compression from magic bytes and stream lines.
//!
//! The file extension is never consulted. Anything that does not start with
//! a gzip, bzip2, xz or LZMA-alone signature is read as plain text.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use xz2::read::XzDecoder;
use xz2::stream::Stream;

use crate::error::{LogError, LogResult};
use crate::types::{Compression, RawLine};

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const LZMA_MAGIC: &[u8] = &[0x5d, 0x00, 0x00];

const READ_BUFFER: usize = 64 * 1024;

/// Container detected from the first bytes of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Gzip,
    Bzip2,
    Xz,
    Lzma,
    Plain,
}

impl Container {
    fn sniff(prefix: &[u8]) -> Self {
        if prefix.starts_with(GZIP_MAGIC) {
            Self::Gzip
        } else if prefix.starts_with(BZIP2_MAGIC) {
            Self::Bzip2
        } else if prefix.starts_with(XZ_MAGIC) {
            Self::Xz
        } else if prefix.starts_with(LZMA_MAGIC) {
            Self::Lzma
        } else {
            Self::Plain
        }
    }

    fn compression(self) -> Compression {
        match self {
            Self::Gzip => Compression::Gzip,
            Self::Bzip2 => Compression::Bzip2,
            Self::Xz | Self::Lzma => Compression::Xz,
            Self::Plain => Compression::None,
        }
    }
}

/// Detect compression from a byte prefix (at least 6 bytes for xz).
pub fn detect_compression(prefix: &[u8]) -> Compression {
    Container::sniff(prefix).compression()
}

/// Lazy, finite iterator of decoded lines. Not restartable: reopen the
/// source for a second pass.
pub struct LineReader {
    inner: Box<dyn BufRead + Send>,
    compression: Compression,
    next_number: usize,
    buf: Vec<u8>,
    done: bool,
}

impl LineReader {
    /// Compression detected for this stream.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    fn map_err(&self, e: std::io::Error) -> LogError {
        match self.compression {
            Compression::None => LogError::Io(e.to_string()),
            other => LogError::Decode(format!("{other} stream: {e}")),
        }
    }
}

impl Iterator for LineReader {
    type Item = LogResult<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.inner.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                let number = self.next_number;
                self.next_number += 1;
                let text = String::from_utf8_lossy(&self.buf).into_owned();
                Some(Ok(RawLine::new(number, text)))
            }
            Err(e) => {
                // A failed decoder cannot resume; stop after reporting.
                self.done = true;
                Some(Err(self.map_err(e)))
            }
        }
    }
}

/// Open a file and stream its decoded lines.
pub fn open(path: &Path) -> LogResult<LineReader> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LogError::NotFound(path.display().to_string())
        } else {
            LogError::Io(format!("{}: {e}", path.display()))
        }
    })?;
    let reader = from_reader(file)?;
    tracing::info!(
        path = %path.display(),
        compression = %reader.compression(),
        "opened log file"
    );
    Ok(reader)
}

/// Wrap any byte stream, sniffing its compression first.
pub fn from_reader<R: Read + Send + 'static>(reader: R) -> LogResult<LineReader> {
    let mut buffered = BufReader::with_capacity(READ_BUFFER, reader);
    let container = {
        let prefix = buffered
            .fill_buf()
            .map_err(|e| LogError::Io(e.to_string()))?;
        Container::sniff(prefix)
    };

    let inner: Box<dyn BufRead + Send> = match container {
        Container::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(buffered))),
        Container::Bzip2 => Box::new(BufReader::new(MultiBzDecoder::new(buffered))),
        Container::Xz => Box::new(BufReader::new(XzDecoder::new_multi_decoder(buffered))),
        Container::Lzma => {
            let stream = Stream::new_lzma_decoder(u64::MAX)
                .map_err(|e| LogError::Decode(format!("lzma decoder: {e}")))?;
            Box::new(BufReader::new(XzDecoder::new_stream(buffered, stream)))
        }
        Container::Plain => Box::new(buffered),
    };

    Ok(LineReader {
        inner,
        compression: container.compression(),
        next_number: 1,
        buf: Vec::new(),
        done: false,
    })
}
