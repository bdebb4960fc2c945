//! Per-value type inference.
//!
//! Coercion order is fixed: timestamp → integer → float → boolean → string.
//! The first successful coercion wins. Numbers use `.` as the only decimal
//! separator regardless of locale.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

use crate::record::FieldValue;

/// Zone-less shapes, taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S,%3f",
    "%Y/%m/%d %H:%M:%S",
    "%d/%b/%Y:%H:%M:%S",
];

/// Shapes carrying a numeric UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    "%d/%b/%Y:%H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

/// Infer the typed value of one raw field string.
pub fn infer_value(raw: &str) -> FieldValue {
    if let Some(value) = parse_timestamp(raw) {
        return FieldValue::Timestamp {
            value,
            raw: raw.to_string(),
        };
    }
    if let Ok(value) = raw.parse::<i64>() {
        return FieldValue::Integer {
            value,
            raw: raw.to_string(),
        };
    }
    if let Some(value) = parse_float(raw) {
        return FieldValue::Float {
            value,
            raw: raw.to_string(),
        };
    }
    if let Some(value) = parse_bool(raw) {
        return FieldValue::Boolean {
            value,
            raw: raw.to_string(),
        };
    }
    FieldValue::String {
        raw: raw.to_string(),
    }
}

/// Try every accepted timestamp shape against `s`.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if !looks_temporal(s) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = parse_bsd_timestamp(s) {
        return Some(dt);
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Syslog "Jan 15 12:34:56" has no year; assume the current one.
fn parse_bsd_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if !s.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    let year = Utc::now().year();
    let with_year = format!("{year} {s}");
    NaiveDateTime::parse_from_str(&with_year, "%Y %b %e %H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

/// Cheap pre-filter so plain words and short numbers skip the chrono attempts.
fn looks_temporal(s: &str) -> bool {
    (8..=40).contains(&s.len())
        && s.bytes().any(|b| b.is_ascii_digit())
        && s.bytes().any(|b| matches!(b, b':' | b'-' | b'/'))
}

fn parse_float(s: &str) -> Option<f64> {
    let plausible = s.bytes().any(|b| b.is_ascii_digit())
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
    if !plausible {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
