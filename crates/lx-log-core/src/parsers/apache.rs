//! Apache / Nginx access and error log parser.
//!
//! Access lines cover the common and combined layouts, an optional leading
//! virtual host, and an optional trailing request time. The Nginx error
//! log is matched separately.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::{LineParser, insert_present};
use crate::types::{LogFormat, ParsedFields};

// [VHOST] CLIENT IDENT USER [TIMESTAMP] "REQUEST" STATUS SIZE ["REFERRER" "UA"] [RT]
static RE_ACCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:(?P<vhost>\S+)\s+)?(?P<client>\S+)\s+(?P<ident>\S+)\s+(?P<user>\S+)\s+\[(?P<timestamp>[^\]]+)\]\s+"(?P<request>[^"]*)"\s+(?P<status>\d{3})\s+(?P<size>\d+|-)(?:\s+"(?P<referrer>[^"]*)"\s+"(?P<user_agent>[^"]*)")?(?:\s+(?P<response_time>\d+(?:\.\d+)?)(?:\s|$))?"#,
    )
    .unwrap()
});

// YYYY/MM/DD HH:MM:SS [LEVEL] PID#TID: *CONN MESSAGE
static RE_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}/\d{2}/\d{2}\s+\d{2}:\d{2}:\d{2})\s+\[(?P<level>\w+)\]\s+(?:(?P<pid>\d+)#(?P<tid>\d+):\s*)?(?:\*(?P<connection>\d+)\s+)?(?P<message>.*)$",
    )
    .unwrap()
});

// Just the CLIENT IDENT USER [TIMESTAMP] prefix of a damaged access line.
static RE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<client>\S+)\s+(?P<ident>\S+)\s+(?P<user>\S+)\s+\[(?P<timestamp>\d[^\]]*)\]",
    )
    .unwrap()
});

const ACCESS_FIELDS: &[&str] = &[
    "vhost",
    "client",
    "ident",
    "user",
    "timestamp",
    "request",
    "status",
    "size",
    "referrer",
    "user_agent",
    "response_time",
];

const ERROR_FIELDS: &[&str] = &["timestamp", "level", "pid", "tid", "connection", "message"];

const PREFIX_FIELDS: &[&str] = &["client", "ident", "user", "timestamp"];

/// Apache / Nginx parser.
pub struct ApacheNginxParser;

impl LineParser for ApacheNginxParser {
    fn format(&self) -> LogFormat {
        LogFormat::ApacheNginx
    }

    fn parse(&self, line: &str) -> ParsedFields {
        if let Some(caps) = RE_ACCESS.captures(line) {
            return ParsedFields::matched(collect(&caps, ACCESS_FIELDS));
        }
        if let Some(caps) = RE_ERROR.captures(line) {
            return ParsedFields::matched(collect(&caps, ERROR_FIELDS));
        }
        if let Some(caps) = RE_PREFIX.captures(line) {
            return ParsedFields::partial(collect(&caps, PREFIX_FIELDS));
        }
        ParsedFields::unparsed()
    }
}

fn collect(caps: &Captures<'_>, names: &[&str]) -> IndexMap<String, String> {
    let mut fields = IndexMap::new();
    for name in names {
        let Some(value) = caps.name(name) else {
            continue;
        };
        if *name == "request" {
            split_request(&mut fields, value.as_str());
        } else {
            insert_present(&mut fields, name, value.as_str());
        }
    }
    fields
}

/// `GET /path HTTP/1.1` becomes method, path and protocol. Anything else is
/// kept whole under `request`.
fn split_request(fields: &mut IndexMap<String, String>, request: &str) {
    let parts: Vec<&str> = request.split_whitespace().collect();
    match parts.as_slice() {
        [method, path, protocol] => {
            insert_present(fields, "method", method);
            insert_present(fields, "path", path);
            insert_present(fields, "protocol", protocol);
        }
        [method, path] => {
            insert_present(fields, "method", method);
            insert_present(fields, "path", path);
        }
        _ => insert_present(fields, "request", request),
    }
}
