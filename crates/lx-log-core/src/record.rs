//! Canonical record types: typed field values and the per-line Record.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{LogFormat, ParseStatus};

// ── Field Value ───────────────────────────────────────────────

/// Semantic type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Timestamp,
    Integer,
    Float,
    Boolean,
    String,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::String => "string",
        }
    }
}

/// A typed field value that keeps its original text.
///
/// Typing is per value: the same field name may carry different variants
/// in different records of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldValue {
    Timestamp { value: DateTime<Utc>, raw: String },
    Integer { value: i64, raw: String },
    Float { value: f64, raw: String },
    Boolean { value: bool, raw: String },
    String { raw: String },
}

impl FieldValue {
    /// Original text, exactly as extracted from the line.
    pub fn raw(&self) -> &str {
        match self {
            Self::Timestamp { raw, .. }
            | Self::Integer { raw, .. }
            | Self::Float { raw, .. }
            | Self::Boolean { raw, .. }
            | Self::String { raw } => raw,
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Timestamp { .. } => ValueKind::Timestamp,
            Self::Integer { .. } => ValueKind::Integer,
            Self::Float { .. } => ValueKind::Float,
            Self::Boolean { .. } => ValueKind::Boolean,
            Self::String { .. } => ValueKind::String,
        }
    }

    /// Numeric view for integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer { value, .. } => Some(*value as f64),
            Self::Float { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer { .. } | Self::Float { .. })
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.raw())
    }
}

// ── Record ────────────────────────────────────────────────────

/// One normalized log record. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// 1-based line number of the first line of this record.
    pub line_number: usize,
    /// Original text, verbatim (journal entries join their lines with `\n`).
    pub raw: String,
    /// Format the session was parsed as.
    pub format: LogFormat,
    /// How well this line fit the format's grammar.
    pub status: ParseStatus,
    /// Typed fields in order of appearance.
    pub fields: IndexMap<String, FieldValue>,
    /// Primary timestamp used for time filters and histograms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// True when at least one structured field was extracted.
    pub fn is_parsed(&self) -> bool {
        !self.fields.is_empty()
    }
}
