//! Structured search over a Session's records.
//!
//! A `SearchQuery` is a conjunction of per-field conditions, an optional
//! raw-text condition and an optional time filter. Each record is checked
//! independently, cheapest test first (time, then fields, then raw text),
//! in one linear pass. Results keep file order.
//!
//! Queries usually arrive as a `QuerySpec`, the all-strings form a
//! presentation layer builds from user input. `QuerySpec::compile` turns it
//! into a `SearchQuery` and reports malformed input as
//! `LogError::QueryParse` naming the offending field.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

use crate::error::{LogError, LogResult};
use crate::infer::infer_value;
use crate::record::{FieldValue, Record};
use crate::session::Session;

/// Time format accepted for query time ranges.
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Operators ─────────────────────────────────────────────────

/// Comparison applied by a field condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    Regex,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::GreaterOrEqual => "greater_or_equal",
            Self::LessOrEqual => "less_or_equal",
            Self::Contains => "contains",
            Self::Regex => "regex",
        }
    }

    fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::LessThan | Self::GreaterOrEqual | Self::LessOrEqual
        )
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equals" | "eq" | "=" | "==" => Ok(Self::Equals),
            "not_equals" | "ne" | "!=" => Ok(Self::NotEquals),
            "greater_than" | "gt" | ">" => Ok(Self::GreaterThan),
            "less_than" | "lt" | "<" => Ok(Self::LessThan),
            "greater_or_equal" | "gte" | ">=" => Ok(Self::GreaterOrEqual),
            "less_or_equal" | "lte" | "<=" => Ok(Self::LessOrEqual),
            "contains" => Ok(Self::Contains),
            "regex" | "matches" | "~" => Ok(Self::Regex),
            other => Err(format!("unknown operator: {other}")),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Text matching ─────────────────────────────────────────────

/// How a raw-text pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMode {
    #[default]
    Substring,
    Regex,
}

impl FromStr for TextMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "substring" | "text" => Ok(Self::Substring),
            "regex" => Ok(Self::Regex),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Compiled substring or regex matcher.
#[derive(Debug, Clone)]
enum TextMatcher {
    Plain(String),
    Pattern(Regex),
}

impl TextMatcher {
    fn new(pattern: &str, mode: TextMode, case_sensitive: bool) -> Result<Self, String> {
        let source = match (mode, case_sensitive) {
            (TextMode::Substring, true) => return Ok(Self::Plain(pattern.to_string())),
            (TextMode::Substring, false) => regex::escape(pattern),
            (TextMode::Regex, _) => pattern.to_string(),
        };
        RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()
            .map(Self::Pattern)
            .map_err(|e| format!("invalid regex: {e}"))
    }

    fn is_match(&self, haystack: &str) -> bool {
        match self {
            Self::Plain(needle) => haystack.contains(needle.as_str()),
            Self::Pattern(re) => re.is_match(haystack),
        }
    }
}

// ── Conditions ────────────────────────────────────────────────

/// One `field <operator> value` test.
///
/// The comparison value goes through the same type inference as record
/// values, so `"199"` compares numerically and `"2024-01-15 14:30:00"`
/// compares as an instant.
#[derive(Debug, Clone)]
pub struct FieldCondition {
    pub field: String,
    pub operator: Operator,
    pub value: FieldValue,
    pub case_sensitive: bool,
    lowered: String,
    matcher: Option<TextMatcher>,
}

impl FieldCondition {
    /// Build a condition. Errors name `field` or `value`.
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: &str,
        case_sensitive: bool,
    ) -> LogResult<Self> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(LogError::query("field", "field name must not be empty"));
        }
        let typed = infer_value(value);
        if operator.is_ordering() && typed.as_f64().is_none() && typed.as_timestamp().is_none() {
            return Err(LogError::query(
                "value",
                format!("'{value}' is not a number or timestamp, required by {operator}"),
            ));
        }
        let matcher = match operator {
            Operator::Contains => Some(TextMatcher::new(value, TextMode::Substring, case_sensitive)),
            Operator::Regex => Some(TextMatcher::new(value, TextMode::Regex, case_sensitive)),
            _ => None,
        }
        .transpose()
        .map_err(|e| LogError::query("value", e))?;

        Ok(Self {
            field,
            operator,
            lowered: value.to_lowercase(),
            value: typed,
            case_sensitive,
            matcher,
        })
    }

    /// Evaluate against one record. An absent field never matches.
    pub fn matches(&self, record: &Record) -> bool {
        let Some(stored) = record.get(&self.field) else {
            return false;
        };
        match self.operator {
            Operator::Equals => self.equals(stored),
            Operator::NotEquals => !self.equals(stored),
            Operator::GreaterThan => self.compare(stored).is_some_and(|o| o.is_gt()),
            Operator::LessThan => self.compare(stored).is_some_and(|o| o.is_lt()),
            Operator::GreaterOrEqual => self.compare(stored).is_some_and(|o| o.is_ge()),
            Operator::LessOrEqual => self.compare(stored).is_some_and(|o| o.is_le()),
            Operator::Contains | Operator::Regex => self
                .matcher
                .as_ref()
                .is_some_and(|m| m.is_match(stored.raw())),
        }
    }

    fn equals(&self, stored: &FieldValue) -> bool {
        if let (Some(a), Some(b)) = (stored.as_f64(), self.value.as_f64()) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (stored.as_timestamp(), self.value.as_timestamp()) {
            return a == b;
        }
        if let (FieldValue::Boolean { value: a, .. }, FieldValue::Boolean { value: b, .. }) =
            (stored, &self.value)
        {
            return a == b;
        }
        if self.case_sensitive {
            stored.raw() == self.value.raw()
        } else {
            stored.raw().to_lowercase() == self.lowered
        }
    }

    /// Order of the stored value relative to the query value, when both
    /// are numbers or both are timestamps.
    fn compare(&self, stored: &FieldValue) -> Option<std::cmp::Ordering> {
        if let (Some(a), Some(b)) = (stored.as_f64(), self.value.as_f64()) {
            return a.partial_cmp(&b);
        }
        if let (Some(a), Some(b)) = (stored.as_timestamp(), self.value.as_timestamp()) {
            return Some(a.cmp(&b));
        }
        None
    }
}

/// Substring or regex test against a record's raw text.
#[derive(Debug, Clone)]
pub struct RawTextCondition {
    pub pattern: String,
    pub mode: TextMode,
    pub case_sensitive: bool,
    matcher: TextMatcher,
}

impl RawTextCondition {
    /// Errors name `pattern`.
    pub fn new(pattern: impl Into<String>, mode: TextMode, case_sensitive: bool) -> LogResult<Self> {
        let pattern = pattern.into();
        let matcher = TextMatcher::new(&pattern, mode, case_sensitive)
            .map_err(|e| LogError::query("pattern", e))?;
        Ok(Self {
            pattern,
            mode,
            case_sensitive,
            matcher,
        })
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.matcher.is_match(&record.raw)
    }
}

// ── Time filters ──────────────────────────────────────────────

/// Inclusive bounds on the primary timestamp. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Records without a primary timestamp never fall inside a range.
    pub fn contains(&self, ts: Option<DateTime<Utc>>) -> bool {
        let Some(ts) = ts else {
            return false;
        };
        self.start.is_none_or(|s| ts >= s) && self.end.is_none_or(|e| ts <= e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    Range(TimeRange),
    /// The trailing window ending at the session's latest timestamp.
    LastMinutes(u32),
}

impl TimeFilter {
    fn resolve(&self, latest: Option<DateTime<Utc>>) -> TimeRange {
        match *self {
            Self::Range(range) => range,
            Self::LastMinutes(minutes) => match latest {
                Some(end) => TimeRange {
                    start: Some(end - Duration::minutes(i64::from(minutes))),
                    end: Some(end),
                },
                None => TimeRange::default(),
            },
        }
    }
}

/// Parse a `YYYY-MM-DD HH:MM:SS` query time (taken as UTC).
pub fn parse_query_time(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(s.trim(), QUERY_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("'{s}' is not a valid time, expected YYYY-MM-DD HH:MM:SS"))
}

// ── Query ─────────────────────────────────────────────────────

/// A compiled, ready-to-run query.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub conditions: Vec<FieldCondition>,
    pub raw_text: Option<RawTextCondition>,
    pub time: Option<TimeFilter>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, condition: FieldCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_raw_text(mut self, raw_text: RawTextCondition) -> Self {
        self.raw_text = Some(raw_text);
        self
    }

    pub fn with_time(mut self, time: TimeFilter) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_page(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    fn matches(&self, record: &Record, window: Option<&TimeRange>) -> bool {
        if let Some(window) = window
            && !window.contains(record.timestamp)
        {
            return false;
        }
        if !self.conditions.iter().all(|c| c.matches(record)) {
            return false;
        }
        self.raw_text.as_ref().is_none_or(|r| r.matches(record))
    }
}

/// Matching records in file order plus facets over all matches.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult<'a> {
    /// The requested page of matches.
    pub records: Vec<&'a Record>,
    /// Matches before pagination.
    pub total_matches: usize,
    /// Field name → value → count, over every match, most frequent first.
    pub field_counts: IndexMap<String, IndexMap<String, usize>>,
}

/// Run `query` against `session` in a single pass.
pub fn search<'a>(session: &'a Session, query: &SearchQuery) -> SearchResult<'a> {
    let started = Instant::now();
    let window = query.time.map(|t| t.resolve(session.latest));

    let matched: Vec<&Record> = session
        .records
        .iter()
        .filter(|r| query.matches(r, window.as_ref()))
        .collect();
    let total_matches = matched.len();
    let field_counts = facet(&matched);

    let page = matched.into_iter().skip(query.offset);
    let records: Vec<&Record> = match query.limit {
        Some(limit) => page.take(limit).collect(),
        None => page.collect(),
    };

    tracing::debug!(
        session = %session.id,
        total_matches,
        returned = records.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "search complete"
    );

    SearchResult {
        records,
        total_matches,
        field_counts,
    }
}

fn facet(records: &[&Record]) -> IndexMap<String, IndexMap<String, usize>> {
    let mut counts: IndexMap<String, IndexMap<String, usize>> = IndexMap::new();
    for record in records {
        for (name, value) in &record.fields {
            *counts
                .entry(name.clone())
                .or_default()
                .entry(value.raw().to_string())
                .or_default() += 1;
        }
    }
    for values in counts.values_mut() {
        // stable sort: equal counts keep first-seen order
        values.sort_by(|_, a, _, b| b.cmp(a));
    }
    counts
}

// ── Serialized queries ────────────────────────────────────────────────

/// String-typed query description, as submitted by a presentation layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuerySpec {
    pub conditions: Vec<ConditionSpec>,
    pub raw_text: Option<RawTextSpec>,
    pub time_range: Option<TimeRangeSpec>,
    pub last_minutes: Option<u32>,
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConditionSpec {
    pub field: String,
    pub operator: String,
    pub value: String,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTextSpec {
    pub pattern: String,
    /// `substring` (default) or `regex`.
    pub mode: String,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimeRangeSpec {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl QuerySpec {
    /// Validate and compile. The first problem found is returned.
    pub fn compile(&self) -> LogResult<SearchQuery> {
        let mut query = SearchQuery::new().with_page(self.offset, self.limit);

        for (i, spec) in self.conditions.iter().enumerate() {
            let operator = spec
                .operator
                .parse::<Operator>()
                .map_err(|e| LogError::query(format!("conditions[{i}].operator"), e))?;
            let condition =
                FieldCondition::new(&spec.field, operator, &spec.value, spec.case_sensitive)
                    .map_err(|e| scoped(&format!("conditions[{i}]"), e))?;
            query = query.with_condition(condition);
        }

        if let Some(raw) = &self.raw_text
            && !raw.pattern.is_empty()
        {
            let mode = raw
                .mode
                .parse::<TextMode>()
                .map_err(|e| LogError::query("raw_text.mode", e))?;
            let condition = RawTextCondition::new(&raw.pattern, mode, raw.case_sensitive)
                .map_err(|e| scoped("raw_text", e))?;
            query = query.with_raw_text(condition);
        }

        match (&self.time_range, self.last_minutes) {
            (Some(_), Some(_)) => {
                return Err(LogError::query(
                    "last_minutes",
                    "cannot be combined with time_range",
                ));
            }
            (Some(range), None) => {
                let start = bound(range.start.as_deref(), "time_range.start")?;
                let end = bound(range.end.as_deref(), "time_range.end")?;
                if let (Some(s), Some(e)) = (start, end)
                    && s > e
                {
                    return Err(LogError::query("time_range", "start is after end"));
                }
                query = query.with_time(TimeFilter::Range(TimeRange { start, end }));
            }
            (None, Some(0)) => {
                return Err(LogError::query("last_minutes", "must be at least 1"));
            }
            (None, Some(minutes)) => query = query.with_time(TimeFilter::LastMinutes(minutes)),
            (None, None) => {}
        }

        Ok(query)
    }
}

fn bound(value: Option<&str>, field: &str) -> LogResult<Option<DateTime<Utc>>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_query_time(s)
            .map(Some)
            .map_err(|e| LogError::query(field, e)),
    }
}

/// Prefix the field name of a `QueryParse` error.
fn scoped(prefix: &str, err: LogError) -> LogError {
    match err {
        LogError::QueryParse { field, message } => LogError::QueryParse {
            field: format!("{prefix}.{field}"),
            message,
        },
        other => other,
    }
}
