//! Core ingestion types and the LogTool trait.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{LogError, LogResult};
use crate::session::SessionManager;

// ── Log Severity ──────────────────────────────────────────────

/// Log severity level, ordered from least to most severe.
///
/// `#[derive(Ord)]` follows declaration order, so
/// Debug < Info < Notice < Warning < Error < Critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
}

impl LogSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Map syslog numeric severity (0–7) to `LogSeverity`.
    pub fn from_syslog_severity(sev: u8) -> Self {
        match sev {
            0..=2 => Self::Critical, // Emergency, Alert, Critical
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Info,
            _ => Self::Debug, // 7 or unknown
        }
    }
}

impl std::fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Log Format ────────────────────────────────────────────────

/// Supported log formats, with stable identifiers.
///
/// Variant declaration order is the detector's tie-break priority:
/// earlier variants win when two formats match the same share of the
/// sample. `Unstructured` is last and is the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// RFC 3164 / RFC 5424 syslog.
    Syslog,
    /// Apache / Nginx access logs and the Nginx error log.
    ApacheNginx,
    /// `journalctl -o export` blocks.
    SystemdJournal,
    /// `key=value` / `key: value` token lines.
    #[serde(rename = "keyvalue")]
    KeyValue,
    /// Labeled tab-separated values.
    Ltsv,
    /// Delimiter-separated values with an inferred header.
    Csv,
    /// Raw text, no structured fields.
    Unstructured,
}

impl LogFormat {
    /// All formats, in priority order.
    pub const ALL: [LogFormat; 8] = [
        Self::Json,
        Self::Syslog,
        Self::ApacheNginx,
        Self::SystemdJournal,
        Self::KeyValue,
        Self::Ltsv,
        Self::Csv,
        Self::Unstructured,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Syslog => "syslog",
            Self::ApacheNginx => "apache_nginx",
            Self::SystemdJournal => "systemd_journal",
            Self::KeyValue => "keyvalue",
            Self::Csv => "csv",
            Self::Ltsv => "ltsv",
            Self::Unstructured => "unstructured",
        }
    }

    /// Tie-break rank: lower wins.
    pub fn priority(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| LogError::Other(format!("unknown format: {s}")))
    }
}

// ── Compression ───────────────────────────────────────────────

/// Compression detected from a file's magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Gzip,
    Bzip2,
    /// xz container or legacy LZMA-alone stream.
    Xz,
    None,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Raw Line ──────────────────────────────────────────────────

/// One decoded line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-based physical line number.
    pub number: usize,
    /// Line text without its terminator.
    pub text: String,
}

impl RawLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// Blank or whitespace-only lines produce no Record.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// ── Parsed Fields ─────────────────────────────────────────────

/// How well a line fit its parser's grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    /// The full grammar matched.
    Matched,
    /// Some fields were recovered from a malformed line.
    Partial,
    /// Nothing recognisable; the line is kept as raw text only.
    Unparsed,
}

/// Field name → raw string value, in order of appearance in the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFields {
    pub status: ParseStatus,
    pub fields: IndexMap<String, String>,
}

impl ParsedFields {
    pub fn unparsed() -> Self {
        Self {
            status: ParseStatus::Unparsed,
            fields: IndexMap::new(),
        }
    }

    /// Wrap extracted fields. An empty map is always `Unparsed`.
    pub fn with_status(status: ParseStatus, fields: IndexMap<String, String>) -> Self {
        if fields.is_empty() {
            return Self::unparsed();
        }
        Self { status, fields }
    }

    pub fn matched(fields: IndexMap<String, String>) -> Self {
        Self::with_status(ParseStatus::Matched, fields)
    }

    pub fn partial(fields: IndexMap<String, String>) -> Self {
        Self::with_status(ParseStatus::Partial, fields)
    }

    /// True when the full grammar matched (used for detection scoring).
    pub fn is_match(&self) -> bool {
        self.status == ParseStatus::Matched
    }

    /// True when at least one field was extracted.
    pub fn is_parsed(&self) -> bool {
        self.status != ParseStatus::Unparsed
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

// ── Tool Result ───────────────────────────────────────────────

/// Result of executing a log tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool name that produced this result.
    pub tool_name: String,
    /// Whether the tool execution succeeded.
    pub success: bool,
    /// Structured result data (JSON).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Error message if success is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(
        tool_name: impl Into<String>,
        data: serde_json::Value,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            data: Some(data),
            summary: Some(summary.into()),
            error: None,
        }
    }

    pub fn failure(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            data: None,
            summary: None,
            error: Some(error.into()),
        }
    }
}

// ── LogTool Trait ─────────────────────────────────────────────

/// A JSON-in / JSON-out operation over the session manager.
///
/// This is the surface a presentation layer drives: it builds argument
/// objects from user input and renders the returned `ToolResult`.
#[async_trait]
pub trait LogTool: Send + Sync {
    /// Tool name (e.g., "search_records").
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema describing accepted arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with JSON arguments.
    async fn execute(
        &self,
        args: serde_json::Value,
        sessions: &SessionManager,
    ) -> LogResult<ToolResult>;
}
