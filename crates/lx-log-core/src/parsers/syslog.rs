//! Syslog parser for RFC 3164 (BSD) and RFC 5424 (IETF).

use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::{LineParser, insert_present};
use crate::types::{LogFormat, LogSeverity, ParsedFields};

// RFC 5424: <PRI>VER TIMESTAMP HOSTNAME APP PROCID MSGID [SD] MSG
static RE_5424: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^<(?P<pri>\d{1,3})>(?P<version>\d{1,2})\s+(?P<timestamp>\S+)\s+(?P<hostname>\S+)\s+(?P<program>\S+)\s+(?P<pid>\S+)\s+(?P<msgid>\S+)(?:\s+(?P<rest>.*))?$",
    )
    .unwrap()
});

// RFC 3164: [<PRI>]Mmm dd HH:MM:SS HOSTNAME TAG[PID]: MSG
static RE_3164: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:<(?P<pri>\d{1,3})>)?(?P<timestamp>[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}|\d{4}-\d{2}-\d{2}T\S+)\s+(?P<hostname>\S+)\s+(?P<program>[^:\[\s]+)(?:\[(?P<pid>\d+)\])?:\s?(?P<message>.*)$",
    )
    .unwrap()
});

// Timestamp + host with no recognisable tag.
static RE_PARTIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:<(?P<pri>\d{1,3})>)?(?P<timestamp>[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(?P<hostname>\S+)(?:\s+(?P<message>.*))?$",
    )
    .unwrap()
});

/// Largest valid PRI value (facility 23, severity 7).
const MAX_PRI: u16 = 191;

/// Syslog parser.
pub struct SyslogParser;

impl LineParser for SyslogParser {
    fn format(&self) -> LogFormat {
        LogFormat::Syslog
    }

    fn parse(&self, line: &str) -> ParsedFields {
        // 5424 first: it is the more specific grammar (version digit after PRI)
        if let Some(caps) = RE_5424.captures(line)
            && let Some(fields) = parse_5424(&caps)
        {
            return ParsedFields::matched(fields);
        }
        if let Some(caps) = RE_3164.captures(line)
            && let Some(mut fields) = decode_pri(&caps)
        {
            for name in ["timestamp", "hostname", "program", "pid", "message"] {
                if let Some(m) = caps.name(name) {
                    insert_present(&mut fields, name, m.as_str());
                }
            }
            return ParsedFields::matched(fields);
        }
        if let Some(caps) = RE_PARTIAL.captures(line)
            && let Some(mut fields) = decode_pri(&caps)
        {
            for name in ["timestamp", "hostname", "message"] {
                if let Some(m) = caps.name(name) {
                    insert_present(&mut fields, name, m.as_str());
                }
            }
            return ParsedFields::partial(fields);
        }
        ParsedFields::unparsed()
    }
}

fn parse_5424(caps: &Captures<'_>) -> Option<IndexMap<String, String>> {
    let mut fields = decode_pri(caps)?;
    for name in ["version", "timestamp", "hostname", "program", "pid", "msgid"] {
        insert_present(&mut fields, name, &caps[name]);
    }
    if let Some(rest) = caps.name("rest") {
        let (sd, message) = split_structured_data(rest.as_str());
        insert_present(&mut fields, "structured_data", sd);
        insert_present(&mut fields, "message", message);
    }
    Some(fields)
}

/// Decode `<PRI>` into priority, facility, severity and level. Returns an
/// empty map when the header is absent, `None` when it is out of range.
fn decode_pri(caps: &Captures<'_>) -> Option<IndexMap<String, String>> {
    let mut fields = IndexMap::new();
    let Some(pri) = caps.name("pri") else {
        return Some(fields);
    };
    let pri: u16 = pri.as_str().parse().ok()?;
    if pri > MAX_PRI {
        return None;
    }
    let severity = (pri & 0x07) as u8;
    fields.insert("priority".to_string(), pri.to_string());
    fields.insert("facility".to_string(), (pri >> 3).to_string());
    fields.insert("severity".to_string(), severity.to_string());
    fields.insert(
        "level".to_string(),
        LogSeverity::from_syslog_severity(severity).to_string(),
    );
    Some(fields)
}

/// Split `[SD...] MSG` (or `- MSG`) into structured data and message.
fn split_structured_data(s: &str) -> (&str, &str) {
    let s = s.trim();
    // NILVALUE: SD is "-" meaning no structured data
    if s == "-" {
        return ("", "");
    }
    if let Some(msg) = s.strip_prefix("- ") {
        return ("", msg.trim_start());
    }
    if s.starts_with('[') {
        let mut depth = 0;
        let mut in_quotes = false;
        let mut prev = '\0';
        for (i, c) in s.char_indices() {
            match c {
                '"' if prev != '\\' => in_quotes = !in_quotes,
                '[' if !in_quotes => depth += 1,
                ']' if !in_quotes => {
                    depth -= 1;
                    // SD elements may be chained: [a][b]
                    if depth == 0 && !s[i + 1..].starts_with('[') {
                        return (&s[..=i], s[i + 1..].trim_start());
                    }
                }
                _ => {}
            }
            prev = c;
        }
    }
    ("", s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParseStatus;

    #[test]
    fn parse_rfc3164_basic() {
        let parsed =
            SyslogParser.parse("<134>Jan 15 12:00:01 web1 api[1234]: Service started successfully");
        assert!(parsed.is_match());
        assert_eq!(parsed.get("priority"), Some("134"));
        assert_eq!(parsed.get("facility"), Some("16"));
        assert_eq!(parsed.get("severity"), Some("6"));
        assert_eq!(parsed.get("level"), Some("info"));
        assert_eq!(parsed.get("timestamp"), Some("Jan 15 12:00:01"));
        assert_eq!(parsed.get("hostname"), Some("web1"));
        assert_eq!(parsed.get("program"), Some("api"));
        assert_eq!(parsed.get("pid"), Some("1234"));
        assert_eq!(parsed.get("message"), Some("Service started successfully"));
    }

    #[test]
    fn parse_rfc3164_severities() {
        let err = SyslogParser.parse("<131>Jan 15 12:00:05 web1 api[1234]: Connection refused");
        assert_eq!(err.get("level"), Some("error"));
        let crit = SyslogParser.parse("<128>Jan 15 12:00:15 web1 kernel: System halted");
        assert_eq!(crit.get("level"), Some("critical"));
    }

    #[test]
    fn parse_rfc3164_without_pri() {
        let parsed = SyslogParser.parse("Jan  5 08:01:02 web1 sshd[99]: Accepted publickey");
        assert!(parsed.is_match());
        assert!(parsed.get("priority").is_none());
        assert_eq!(parsed.get("program"), Some("sshd"));
        assert_eq!(parsed.get("timestamp"), Some("Jan  5 08:01:02"));
    }

    #[test]
    fn parse_rfc3164_no_pid() {
        let parsed = SyslogParser.parse("<134>Jan 15 12:00:10 web1 kernel: [12345.678] eth0: link up");
        assert_eq!(parsed.get("program"), Some("kernel"));
        assert!(parsed.get("pid").is_none());
        assert_eq!(parsed.get("message"), Some("[12345.678] eth0: link up"));
    }

    #[test]
    fn parse_rfc5424_basic() {
        let parsed = SyslogParser.parse(
            "<165>1 2024-01-15T12:34:56.789Z myhost myapp 1234 ID47 [exampleSDID@32473 iut=\"3\"] An application event",
        );
        assert!(parsed.is_match());
        assert_eq!(parsed.get("level"), Some("notice"));
        assert_eq!(parsed.get("version"), Some("1"));
        assert_eq!(parsed.get("timestamp"), Some("2024-01-15T12:34:56.789Z"));
        assert_eq!(parsed.get("program"), Some("myapp"));
        assert_eq!(parsed.get("msgid"), Some("ID47"));
        assert_eq!(
            parsed.get("structured_data"),
            Some("[exampleSDID@32473 iut=\"3\"]")
        );
        assert_eq!(parsed.get("message"), Some("An application event"));
    }

    #[test]
    fn parse_rfc5424_no_sd() {
        let parsed = SyslogParser.parse("<134>1 2024-01-15T12:00:00Z web1 agent 999 - - Service ready");
        assert!(parsed.get("msgid").is_none());
        assert!(parsed.get("structured_data").is_none());
        assert_eq!(parsed.get("message"), Some("Service ready"));
    }

    #[test]
    fn chained_structured_data() {
        let (sd, msg) = split_structured_data("[a x=\"]\"][b y=\"2\"] done");
        assert_eq!(sd, "[a x=\"]\"][b y=\"2\"]");
        assert_eq!(msg, "done");
    }

    #[test]
    fn missing_tag_is_partial() {
        let parsed = SyslogParser.parse("Jan 15 12:00:01 web1 something without a tag");
        assert_eq!(parsed.status, ParseStatus::Partial);
        assert_eq!(parsed.get("hostname"), Some("web1"));
    }

    #[test]
    fn out_of_range_pri_unparsed() {
        assert!(!SyslogParser.parse("<999>Jan 15 12:00:01 web1 app: x").is_parsed());
    }

    #[test]
    fn non_syslog_unparsed() {
        assert!(!SyslogParser.parse("plain text line").is_parsed());
        assert!(!SyslogParser.parse(r#"{"level":"info"}"#).is_parsed());
    }
}
