//! Record normalizer: parsed fields + inferred types → canonical Record.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::infer::infer_value;
use crate::record::{FieldValue, Record};
use crate::types::{LogFormat, ParsedFields};

/// Conventional timestamp field names, highest priority first.
/// Matched case-insensitively.
pub const PRIMARY_TIMESTAMP_FIELDS: &[&str] = &[
    "timestamp",
    "time",
    "date",
    "datetime",
    "@timestamp",
    "ts",
    "time_local",
    "time_iso8601",
];

/// Build a Record from one parsed line (or journal entry).
pub fn normalize(
    line_number: usize,
    raw: impl Into<String>,
    format: LogFormat,
    parsed: ParsedFields,
) -> Record {
    let status = parsed.status;
    let fields: IndexMap<String, FieldValue> = parsed
        .fields
        .into_iter()
        .map(|(name, value)| {
            let typed = infer_value(&value);
            (name, typed)
        })
        .collect();
    let timestamp = primary_timestamp(&fields);

    Record {
        line_number,
        raw: raw.into(),
        format,
        status,
        fields,
        timestamp,
    }
}

/// Pick the primary timestamp: a conventionally named timestamp field
/// first, then the first field of any name that inferred as a timestamp.
pub fn primary_timestamp(fields: &IndexMap<String, FieldValue>) -> Option<DateTime<Utc>> {
    for wanted in PRIMARY_TIMESTAMP_FIELDS {
        let hit = fields
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .find_map(|(_, value)| value.as_timestamp());
        if hit.is_some() {
            return hit;
        }
    }
    fields.values().find_map(FieldValue::as_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ValueKind;
    use crate::types::ParseStatus;
    use chrono::TimeZone;

    fn parsed(pairs: &[(&str, &str)]) -> ParsedFields {
        ParsedFields::matched(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn builds_typed_record() {
        let record = normalize(
            3,
            "raw text",
            LogFormat::KeyValue,
            parsed(&[("status", "200"), ("ok", "true"), ("msg", "fine")]),
        );
        assert_eq!(record.line_number, 3);
        assert_eq!(record.raw, "raw text");
        assert_eq!(record.status, ParseStatus::Matched);
        assert_eq!(record.get("status").unwrap().kind(), ValueKind::Integer);
        assert_eq!(record.get("ok").unwrap().kind(), ValueKind::Boolean);
        assert_eq!(record.get("msg").unwrap().kind(), ValueKind::String);
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn field_order_is_preserved() {
        let record = normalize(
            1,
            "",
            LogFormat::KeyValue,
            parsed(&[("z", "1"), ("a", "2"), ("m", "3")]),
        );
        let names: Vec<&str> = record.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["z", "a", "m"]);
    }

    #[test]
    fn conventional_name_wins_over_position() {
        let record = normalize(
            1,
            "",
            LogFormat::Json,
            parsed(&[
                ("created", "2020-01-01 00:00:00"),
                ("time", "2024-01-15 14:30:00"),
            ]),
        );
        assert_eq!(
            record.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap())
        );
    }

    #[test]
    fn any_timestamp_field_is_fallback() {
        let record = normalize(
            1,
            "",
            LogFormat::Json,
            parsed(&[("created", "2020-01-01 00:00:00"), ("n", "1")]),
        );
        assert_eq!(
            record.timestamp,
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn non_timestamp_conventional_name_is_skipped() {
        let record = normalize(
            1,
            "",
            LogFormat::Csv,
            parsed(&[("Time", "soon"), ("seen", "2024-01-15")]),
        );
        assert_eq!(
            record.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparsed_line_keeps_raw_only() {
        let record = normalize(9, "garbage ~~", LogFormat::Json, ParsedFields::unparsed());
        assert!(record.fields.is_empty());
        assert!(!record.is_parsed());
        assert_eq!(record.raw, "garbage ~~");
        assert!(record.timestamp.is_none());
    }
}
