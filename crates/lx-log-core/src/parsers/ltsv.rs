//! Labeled Tab-separated Values (`label:value<TAB>label:value`).

use indexmap::IndexMap;

use super::LineParser;
use crate::types::{LogFormat, ParseStatus, ParsedFields};

/// LTSV line parser. A line needs at least two segments, and every
/// segment must be a valid `label:value` pair, to count as a full match.
pub struct LtsvParser;

impl LineParser for LtsvParser {
    fn format(&self) -> LogFormat {
        LogFormat::Ltsv
    }

    fn parse(&self, line: &str) -> ParsedFields {
        let segments: Vec<&str> = line.split('\t').collect();
        let mut fields = IndexMap::new();
        for segment in &segments {
            if let Some((label, value)) = segment.split_once(':')
                && is_label(label)
            {
                fields.insert(label.to_string(), value.to_string());
            }
        }

        let status = if segments.len() >= 2 && fields.len() == segments.len() {
            ParseStatus::Matched
        } else if segments.len() >= 2 && !fields.is_empty() {
            ParseStatus::Partial
        } else {
            return ParsedFields::unparsed();
        };
        ParsedFields::with_status(status, fields)
    }
}

fn is_label(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
}
