//! Generic key-value token scanner (`key=value`, `key="quoted"`, `key: value`).

use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

use super::LineParser;
use crate::types::{LogFormat, ParseStatus, ParsedFields};

// The `key: value` form needs whitespace after the colon, so LTSV labels,
// URLs and clock times are not read as pairs.
static RE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[\s,;])([A-Za-z_][\w.\-]*)(?:=|:\s+)("(?:[^"\\]|\\.)*"|'[^']*'|[^\s,;]+)"#,
    )
    .unwrap()
});

/// Key-value line parser: two or more pairs is a full match.
pub struct KeyValueParser;

impl LineParser for KeyValueParser {
    fn format(&self) -> LogFormat {
        LogFormat::KeyValue
    }

    fn parse(&self, line: &str) -> ParsedFields {
        let fields = scan_pairs(line);
        let status = if fields.len() >= 2 {
            ParseStatus::Matched
        } else {
            ParseStatus::Partial
        };
        ParsedFields::with_status(status, fields)
    }
}

/// Extract every key-value pair from `line`, in order of appearance.
pub fn scan_pairs(line: &str) -> IndexMap<String, String> {
    let mut fields = IndexMap::new();
    for caps in RE_PAIR.captures_iter(line) {
        let key = caps[1].to_string();
        let value = strip_quotes(&caps[2]);
        fields.insert(key, value);
    }
    fields
}

fn strip_quotes(raw: &str) -> String {
    let bytes = raw.as_bytes();
    if raw.len() >= 2 {
        let (first, last) = (bytes[0], bytes[raw.len() - 1]);
        if first == b'"' && last == b'"' {
            return raw[1..raw.len() - 1].replace("\\\"", "\"");
        }
        if first == b'\'' && last == b'\'' {
            return raw[1..raw.len() - 1].to_string();
        }
    }
    raw.to_string()
}
