//! The processing pass: decode → detect → parse → normalize → Session.
//!
//! Runs synchronously, one line at a time, checking the cancellation token
//! between lines. A pass that fails or is cancelled returns an error and
//! drops everything it built.

use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::detect::{Detection, detect};
use crate::error::{LogError, LogResult};
use crate::normalize::normalize;
use crate::parsers::LineParser;
use crate::record::Record;
use crate::session::Session;
use crate::source::LogSource;
use crate::types::{LogFormat, RawLine};

/// Process one file into a complete Session.
pub fn process(
    source: &dyn LogSource,
    path: &str,
    config: &EngineConfig,
    cancel: &CancellationToken,
) -> LogResult<Session> {
    let opened = source.open(path)?;
    let mut lines = opened.lines;

    // Buffer the head of the file so it can be sampled and then parsed.
    let mut head: Vec<RawLine> = Vec::new();
    let mut sampled = 0;
    while sampled < config.detector.sample_size {
        check_cancelled(cancel, path)?;
        match lines.next() {
            Some(Ok(line)) => {
                if !line.is_blank() {
                    sampled += 1;
                }
                head.push(line);
            }
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }

    let sample: Vec<&str> = head.iter().map(|l| l.text.as_str()).collect();
    let Detection {
        format,
        ratio,
        parser,
        ..
    } = detect(&sample, &config.detector);

    let stream = head.into_iter().map(Ok).chain(lines);
    let mut pass = Pass::new(format, parser.as_ref());
    for line in stream {
        check_cancelled(cancel, path)?;
        pass.push(line?);
    }
    let (records, total_lines) = pass.finish();

    Ok(Session::new(
        path,
        format,
        opened.compression,
        ratio,
        total_lines,
        records,
    ))
}

fn check_cancelled(cancel: &CancellationToken, path: &str) -> LogResult<()> {
    if cancel.is_cancelled() {
        tracing::warn!(path, "processing cancelled");
        return Err(LogError::Cancelled);
    }
    Ok(())
}

/// Accumulates Records line by line, grouping multi-line entries.
struct Pass<'a> {
    format: LogFormat,
    parser: &'a dyn LineParser,
    records: Vec<Record>,
    block: Vec<RawLine>,
    total_lines: usize,
}

impl<'a> Pass<'a> {
    fn new(format: LogFormat, parser: &'a dyn LineParser) -> Self {
        Self {
            format,
            parser,
            records: Vec::new(),
            block: Vec::new(),
            total_lines: 0,
        }
    }

    fn push(&mut self, line: RawLine) {
        self.total_lines += 1;
        if line.is_blank() {
            self.flush_block();
            return;
        }
        if self.parser.is_multiline() {
            self.block.push(line);
            return;
        }
        let parsed = self.parser.parse(line.text.trim());
        self.records
            .push(normalize(line.number, line.text, self.format, parsed));
    }

    fn flush_block(&mut self) {
        let Some(first) = self.block.first() else {
            return;
        };
        let line_number = first.number;
        let block = std::mem::take(&mut self.block);
        let trimmed: Vec<&str> = block.iter().map(|l| l.text.trim()).collect();
        let parsed = self.parser.parse_entry(&trimmed);
        let raw = block
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.records
            .push(normalize(line_number, raw, self.format, parsed));
    }

    fn finish(mut self) -> (Vec<Record>, usize) {
        self.flush_block();
        (self.records, self.total_lines)
    }
}
