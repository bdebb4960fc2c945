//! Newline-delimited JSON (NDJSON) log parser.

use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

use super::LineParser;
use crate::types::{LogFormat, ParsedFields};

// "key": scalar, used to salvage fields from broken objects
static RE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""((?:[^"\\]|\\.)+)"\s*:\s*("(?:[^"\\]|\\.)*"|-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?|true|false|null)"#,
    )
    .unwrap()
});

/// One JSON object per line; top-level keys become field names.
pub struct JsonParser;

impl LineParser for JsonParser {
    fn format(&self) -> LogFormat {
        LogFormat::Json
    }

    fn parse(&self, line: &str) -> ParsedFields {
        if !looks_like_json(line) {
            return ParsedFields::unparsed();
        }
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(serde_json::Value::Object(map)) => {
                let fields = map
                    .into_iter()
                    .map(|(k, v)| (k, value_text(v)))
                    .collect();
                ParsedFields::matched(fields)
            }
            Ok(_) => ParsedFields::unparsed(),
            Err(_) => ParsedFields::partial(salvage_pairs(line)),
        }
    }
}

/// Check if a line looks like a JSON object.
pub fn looks_like_json(line: &str) -> bool {
    line.trim_start().starts_with('{')
}

/// Strings are unwrapped; everything else keeps its compact JSON text.
fn value_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn salvage_pairs(line: &str) -> IndexMap<String, String> {
    RE_PAIR
        .captures_iter(line)
        .map(|caps| {
            let key = unquote(&format!("\"{}\"", &caps[1]));
            let raw = &caps[2];
            let value = if raw.starts_with('"') {
                unquote(raw)
            } else {
                raw.to_string()
            };
            (key, value)
        })
        .collect()
}

fn unquote(quoted: &str) -> String {
    serde_json::from_str::<String>(quoted)
        .unwrap_or_else(|_| quoted.trim_matches('"').to_string())
}
