//! systemd journal export format parser.
//!
//! Parses the text export format (`journalctl -o export`), where entries
//! are separated by blank lines and each field is `KEY=VALUE`. One entry
//! becomes one Record.

use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

use super::{LineParser, merge_entry};
use crate::types::{LogFormat, LogSeverity, ParseStatus, ParsedFields};

static RE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(_{0,2}[A-Z][A-Z0-9_]*)=(.*)$").unwrap());

// A second ` key=` token in the value means this is a key=value line,
// not a journal field.
static RE_EMBEDDED_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s[A-Za-z_][\w.\-]*=").unwrap());

/// Journal export parser.
pub struct JournalParser;

impl LineParser for JournalParser {
    fn format(&self) -> LogFormat {
        LogFormat::SystemdJournal
    }

    fn parse(&self, line: &str) -> ParsedFields {
        let Some(caps) = RE_FIELD.captures(line) else {
            return ParsedFields::unparsed();
        };
        let mut fields = IndexMap::new();
        fields.insert(caps[1].to_string(), caps[2].to_string());
        let status = if RE_EMBEDDED_PAIR.is_match(&caps[2]) {
            ParseStatus::Partial
        } else {
            ParseStatus::Matched
        };
        ParsedFields::with_status(status, fields)
    }

    fn is_multiline(&self) -> bool {
        true
    }

    fn parse_entry(&self, lines: &[&str]) -> ParsedFields {
        let mut entry = merge_entry(lines.iter().map(|line| self.parse(line)));
        if !entry.is_parsed() {
            return entry;
        }
        // every exported entry carries MESSAGE
        if !entry.fields.contains_key("MESSAGE") {
            entry.status = ParseStatus::Partial;
        }
        if !entry.fields.contains_key("timestamp")
            && let Some(ts) = entry
                .get("__REALTIME_TIMESTAMP")
                .and_then(|us| us.parse::<i64>().ok())
                .and_then(|us| Utc.timestamp_micros(us).single())
        {
            entry.fields.insert("timestamp".to_string(), ts.to_rfc3339());
        }
        if !entry.fields.contains_key("level")
            && let Some(priority) = entry.get("PRIORITY").and_then(|p| p.parse::<u8>().ok())
        {
            entry.fields.insert(
                "level".to_string(),
                LogSeverity::from_syslog_severity(priority).to_string(),
            );
        }
        entry
    }
}
