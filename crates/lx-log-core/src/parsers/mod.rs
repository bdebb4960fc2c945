//! Per-format line parsers.
//!
//! Every format is a `LineParser` strategy: detection scores them all the
//! same way, and the ingest pass never branches on the format name. A new
//! format is a new strategy plus a `LogFormat` variant (its priority rank).
//!
//! Parsers never fail. A line that does not fit the grammar comes back as
//! `ParsedFields::unparsed()`, and nearly-well-formed lines come back
//! `Partial` with whatever could be recovered.

pub mod apache;
pub mod csv;
pub mod journald;
pub mod json;
pub mod keyvalue;
pub mod ltsv;
pub mod syslog;
pub mod unstructured;

use indexmap::IndexMap;

use crate::types::{LogFormat, ParseStatus, ParsedFields};

pub use apache::ApacheNginxParser;
pub use csv::CsvParser;
pub use journald::JournalParser;
pub use json::JsonParser;
pub use keyvalue::KeyValueParser;
pub use ltsv::LtsvParser;
pub use syslog::SyslogParser;
pub use unstructured::UnstructuredParser;

/// A matcher + extractor for one log format.
pub trait LineParser: Send + Sync {
    /// Format this parser recognises.
    fn format(&self) -> LogFormat;

    /// Parse one trimmed line.
    fn parse(&self, line: &str) -> ParsedFields;

    /// Multi-line formats group consecutive non-blank lines into one entry,
    /// parsed with `parse_entry` and kept as a single Record.
    fn is_multiline(&self) -> bool {
        false
    }

    /// Parse a group of lines as one entry.
    fn parse_entry(&self, lines: &[&str]) -> ParsedFields {
        merge_entry(lines.iter().map(|line| self.parse(line)))
    }
}

/// Merge per-line results into one entry. The entry is `Matched` only when
/// every line matched; later duplicates of a field name overwrite earlier ones.
pub fn merge_entry(parts: impl IntoIterator<Item = ParsedFields>) -> ParsedFields {
    let mut fields = IndexMap::new();
    let mut all_matched = true;
    let mut any = false;
    for part in parts {
        any = true;
        all_matched &= part.is_match();
        fields.extend(part.fields);
    }
    let status = if any && all_matched {
        ParseStatus::Matched
    } else {
        ParseStatus::Partial
    };
    ParsedFields::with_status(status, fields)
}

/// Build one parser per candidate format for the given sample, in priority
/// order. CSV is only a candidate when a delimiter can be inferred from the
/// sample; the unstructured fallback is not a candidate.
pub fn candidates(sample: &[&str]) -> Vec<Box<dyn LineParser>> {
    let mut parsers: Vec<Box<dyn LineParser>> = vec![
        Box::new(JsonParser),
        Box::new(SyslogParser),
        Box::new(ApacheNginxParser),
        Box::new(JournalParser),
        Box::new(KeyValueParser),
        Box::new(LtsvParser),
    ];
    if let Some(csv) = CsvParser::infer(sample) {
        parsers.push(Box::new(csv));
    }
    parsers
}

/// Insert `value` under `name` unless it is empty or the `-` placeholder.
pub(crate) fn insert_present(fields: &mut IndexMap<String, String>, name: &str, value: &str) {
    if !value.is_empty() && value != "-" {
        fields.insert(name.to_string(), value.to_string());
    }
}
