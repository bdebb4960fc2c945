//! E2E tests for the ingestion pipeline: decoding, detection, parsing and
//! normalization over real files.

mod helpers;

use chrono::{TimeZone, Utc};

use helpers::{Container, TestHarness};
use lx_log_core::{
    Compression, FieldValue, FileLogSource, LogFormat, LogSource, ParseStatus, ValueKind,
};

/// A single JSON line is detected as JSON with typed fields and a primary timestamp.
#[tokio::test]
async fn e2e_json_line_typed_fields() {
    let h = TestHarness::new();
    let path = h.write(
        Container::Plain,
        &[r#"{"level":"ERROR","msg":"boom","ts":"2024-01-15 14:30:00"}"#],
    );

    let session = h.sessions.process(&path).await.unwrap();
    assert_eq!(session.format, LogFormat::Json);
    let record = &session.records[0];
    assert_eq!(
        record.get("level"),
        Some(&FieldValue::String {
            raw: "ERROR".into()
        })
    );
    let expected = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
    assert_eq!(record.get("ts").unwrap().as_timestamp(), Some(expected));
    assert_eq!(record.timestamp, Some(expected));
}

/// Three gzip-compressed lines decode to exactly three identical RawLines.
#[test]
fn e2e_gzip_decodes_three_lines() {
    let h = TestHarness::new();
    let lines = ["first line", "second line", "third line"];
    let path = h.write(Container::Gzip, &lines);

    let opened = FileLogSource.open(&path).unwrap();
    assert_eq!(opened.compression, Compression::Gzip);
    let decoded: Vec<_> = opened.lines.map(|l| l.unwrap()).collect();
    assert_eq!(decoded.len(), 3);
    for (i, line) in decoded.iter().enumerate() {
        assert_eq!(line.number, i + 1);
        assert_eq!(line.text, lines[i]);
    }
}

/// Every container yields the same records; compression comes from content,
/// not from the (misleading) file name.
#[tokio::test]
async fn e2e_every_container_same_session() {
    let h = TestHarness::new();
    let lines = [
        "time=2024-01-15T10:00:00Z level=info msg=\"service up\" port=8080",
        "time=2024-01-15T10:00:02Z level=warn msg=\"slow query\" duration=1.25",
        "time=2024-01-15T10:00:03Z level=error msg=\"query failed\" duration=5.5",
    ];

    for container in Container::ALL {
        let path = h.write(container, &lines);
        let session = h.sessions.process(&path).await.unwrap();
        let expected = match container {
            Container::Plain => Compression::None,
            Container::Gzip => Compression::Gzip,
            Container::Bzip2 => Compression::Bzip2,
            Container::Xz | Container::Lzma => Compression::Xz,
        };
        assert_eq!(session.compression, expected, "{container:?}");
        assert_eq!(session.format, LogFormat::KeyValue, "{container:?}");
        let raws: Vec<&str> = session.records.iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(raws, lines, "{container:?}");
        assert_eq!(
            session.records[1].get("duration").unwrap().kind(),
            ValueKind::Float
        );
    }
}

/// Raw text survives verbatim for parsed and unparsed records alike.
#[tokio::test]
async fn e2e_raw_text_round_trip() {
    let h = TestHarness::new();
    let lines = [
        "<134>Jan 15 12:00:01 web1 api[1234]: Service started",
        "   indented free text that matches nothing   ",
        "<131>Jan 15 12:00:05 web1 api[1234]: Failed to connect: refused",
        "\tTAB\tseparated\tnoise",
        "<134>Jan 15 12:00:10 web1 kernel: eth0: link up",
    ];
    let path = h.write_bytes("mixed.log", lines.join("\r\n").as_bytes());

    let session = h.sessions.process(&path).await.unwrap();
    assert_eq!(session.format, LogFormat::Syslog);
    assert_eq!(session.records.len(), lines.len());
    for (record, line) in session.records.iter().zip(lines) {
        assert_eq!(record.raw, line);
    }
    assert_eq!(session.records[1].status, ParseStatus::Unparsed);
    assert!(session.records[1].fields.is_empty());
    assert_eq!(session.parsed_lines, 3);
}

/// Each supported grammar is detected end to end.
#[tokio::test]
async fn e2e_detects_every_format() {
    let cases: [(&[&str], LogFormat); 8] = [
        (
            &[r#"{"a":1,"b":"x"}"#, r#"{"a":2,"b":"y"}"#],
            LogFormat::Json,
        ),
        (
            &[
                "time,host,status",
                "2024-01-15 10:00:00,web1,200",
                "2024-01-15 10:00:01,web2,500",
            ],
            LogFormat::Csv,
        ),
        (
            &["host:a\tstatus:200\tsize:1", "host:b\tstatus:404\tsize:2"],
            LogFormat::Ltsv,
        ),
        (&["user=alice action=login", "user=bob action=logout"], LogFormat::KeyValue),
        (
            &[
                r#"10.0.0.1 - - [15/Jan/2024:14:30:00 +0000] "GET / HTTP/1.1" 200 512 "-" "curl/8.0""#,
                r#"10.0.0.2 - - [15/Jan/2024:14:30:01 +0000] "GET /x HTTP/1.1" 404 0 "-" "curl/8.0""#,
            ],
            LogFormat::ApacheNginx,
        ),
        (
            &[
                "<34>1 2024-01-15T14:30:00.003Z host app 42 ID47 - hello",
                "<165>1 2024-01-15T14:30:01Z host app 42 ID48 [meta k=\"v\"] again",
            ],
            LogFormat::Syslog,
        ),
        (
            &[
                "__REALTIME_TIMESTAMP=1705312801000000",
                "PRIORITY=6",
                "MESSAGE=one",
                "",
                "__REALTIME_TIMESTAMP=1705312802000000",
                "PRIORITY=3",
                "MESSAGE=two",
            ],
            LogFormat::SystemdJournal,
        ),
        (
            &["just some words", "and some more words"],
            LogFormat::Unstructured,
        ),
    ];

    let h = TestHarness::new();
    for (i, (lines, expected)) in cases.iter().enumerate() {
        let path = h.write_bytes(&format!("case{i}.log"), lines.join("\n").as_bytes());
        let session = h.sessions.process(&path).await.unwrap();
        assert_eq!(session.format, *expected, "case {i}");
    }
}

/// Journal export entries become one record each, with the derived timestamp.
#[tokio::test]
async fn e2e_journal_entries_xz() {
    let h = TestHarness::new();
    let path = h.write(
        Container::Xz,
        &[
            "__REALTIME_TIMESTAMP=1705312801000000",
            "_HOSTNAME=web1",
            "PRIORITY=3",
            "MESSAGE=disk failure",
            "",
            "__REALTIME_TIMESTAMP=1705312802500000",
            "_HOSTNAME=web1",
            "PRIORITY=6",
            "MESSAGE=recovered",
        ],
    );

    let session = h.sessions.process(&path).await.unwrap();
    assert_eq!(session.format, LogFormat::SystemdJournal);
    assert_eq!(session.records.len(), 2);
    assert_eq!(session.records[1].line_number, 6);
    assert_eq!(session.records[0].get("level").unwrap().raw(), "error");
    let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 1).unwrap();
    assert_eq!(session.records[0].timestamp, Some(expected));
    assert_eq!(session.total_lines, 9);
}
