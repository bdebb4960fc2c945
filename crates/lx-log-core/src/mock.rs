//! Mock log source for testing, serving pre-loaded lines by path.

use std::collections::HashMap;

use crate::error::{LogError, LogResult};
use crate::source::{LogSource, OpenedSource};
use crate::types::{Compression, RawLine};

#[derive(Clone)]
struct MockFile {
    lines: Vec<String>,
    /// Emit a decode error after the lines instead of ending cleanly.
    corrupt: bool,
}

/// A mock log source that serves pre-loaded content by path.
#[derive(Default)]
pub struct MockLogSource {
    files: HashMap<String, MockFile>,
}

impl MockLogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given lines.
    pub fn add_file(&mut self, path: impl Into<String>, lines: Vec<String>) {
        self.files.insert(
            path.into(),
            MockFile {
                lines,
                corrupt: false,
            },
        );
    }

    /// Add a file whose stream fails with a decode error after `lines`.
    pub fn add_corrupt_file(&mut self, path: impl Into<String>, lines: Vec<String>) {
        self.files.insert(
            path.into(),
            MockFile {
                lines,
                corrupt: true,
            },
        );
    }

    /// Builder form of `add_file`.
    pub fn with_file(mut self, path: impl Into<String>, lines: &[&str]) -> Self {
        self.add_file(path, lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Sample syslog (RFC 3164) file at `/var/log/syslog`.
    pub fn with_syslog_sample() -> Self {
        Self::new().with_file(
            "/var/log/syslog",
            &[
                "<134>Jan 15 12:00:01 web1 api[1234]: Service started successfully",
                "<131>Jan 15 12:00:05 web1 api[1234]: Failed to connect to database: connection refused",
                "<134>Jan 15 12:00:10 web1 kernel: [12345.678] eth0: link up",
                "<132>Jan 15 12:00:15 web1 api[1234]: disk usage at 95%",
                "<134>Jan 15 12:00:20 web1 cron[5678]: (root) CMD (/usr/bin/healthcheck)",
                "<131>Jan 15 12:00:25 web1 api[1234]: upstream timeout after 500ms",
                "<134>Jan 15 12:00:30 web1 systemd[1]: Started Daily Cleanup",
                "<131>Jan 15 12:00:35 web1 api[1234]: Failed to connect to database: connection refused",
                "<134>Jan 15 12:00:40 web1 api[1234]: Retrying connection in 5 seconds",
                "<134>Jan 15 12:00:45 web1 api[1234]: Database connection established",
            ],
        )
    }

    /// Sample JSON lines file at `/var/log/app.json`.
    pub fn with_json_sample() -> Self {
        Self::new().with_file(
            "/var/log/app.json",
            &[
                r#"{"timestamp":"2024-01-15T12:00:01Z","level":"info","message":"Service started","service":"gateway"}"#,
                r#"{"timestamp":"2024-01-15T12:00:05Z","level":"error","message":"upstream timeout","service":"billing","latency_ms":5012}"#,
                r#"{"timestamp":"2024-01-15T12:00:10Z","level":"warning","message":"Memory usage high: 82%","service":"monitor"}"#,
                r#"{"timestamp":"2024-01-15T12:00:15Z","level":"info","message":"request served","service":"billing","latency_ms":42}"#,
                r#"{"timestamp":"2024-01-15T12:00:20Z","level":"error","message":"Connection refused: cache","service":"cache","retry":3}"#,
                r#"{"timestamp":"2024-01-15T12:00:25Z","level":"debug","message":"Heartbeat sent","service":"gateway"}"#,
                r#"{"timestamp":"2024-01-15T12:00:30Z","level":"error","message":"upstream timeout","service":"billing","latency_ms":5003}"#,
                r#"{"timestamp":"2024-01-15T12:00:35Z","level":"info","message":"request served","service":"billing","latency_ms":37}"#,
            ],
        )
    }

    /// Sample `journalctl -o export` file at `/var/log/journal.export`.
    pub fn with_journald_sample() -> Self {
        Self::new().with_file(
            "/var/log/journal.export",
            &[
                "__REALTIME_TIMESTAMP=1705312801000000",
                "_HOSTNAME=web1",
                "SYSLOG_IDENTIFIER=gateway",
                "PRIORITY=6",
                "MESSAGE=Gateway started",
                "",
                "__REALTIME_TIMESTAMP=1705312805000000",
                "_HOSTNAME=web1",
                "SYSLOG_IDENTIFIER=gateway",
                "PRIORITY=3",
                "MESSAGE=listener error: address in use",
                "",
                "__REALTIME_TIMESTAMP=1705312810000000",
                "_HOSTNAME=web1",
                "SYSLOG_IDENTIFIER=kernel",
                "PRIORITY=4",
                "MESSAGE=eth0: carrier lost",
                "",
            ],
        )
    }

    /// Sample combined-format access log at `/var/log/nginx/access.log`.
    pub fn with_access_log_sample() -> Self {
        Self::new().with_file(
            "/var/log/nginx/access.log",
            &[
                r#"10.0.0.1 - - [15/Jan/2024:14:30:00 +0000] "GET /index.html HTTP/1.1" 200 512 "-" "curl/8.0""#,
                r#"10.0.0.2 - alice [15/Jan/2024:14:31:00 +0000] "POST /api/login HTTP/1.1" 302 0 "https://example.com/" "Mozilla/5.0""#,
                r#"10.0.0.1 - - [15/Jan/2024:14:32:00 +0000] "GET /missing HTTP/1.1" 404 153 "-" "curl/8.0""#,
                r#"10.0.0.3 - - [15/Jan/2024:14:33:00 +0000] "GET /api/items HTTP/1.1" 500 87 "-" "python-requests/2.31""#,
            ],
        )
    }

    /// Sample CSV export at `/var/log/export.csv`.
    pub fn with_csv_sample() -> Self {
        Self::new().with_file(
            "/var/log/export.csv",
            &[
                "time,host,status,bytes",
                "2024-01-15 10:00:00,web1,200,512",
                "2024-01-15 10:05:00,web2,500,0",
                "2024-01-15 10:10:00,web1,200,1024",
            ],
        )
    }

    /// Sample key=value log at `/var/log/app.log`.
    pub fn with_keyvalue_sample() -> Self {
        Self::new().with_file(
            "/var/log/app.log",
            &[
                r#"time=2024-01-15T10:00:00Z level=info msg="service up" port=8080"#,
                r#"time=2024-01-15T10:00:02Z level=warn msg="slow query" duration=1.25"#,
                r#"time=2024-01-15T10:00:03Z level=error msg="query failed" duration=5.5"#,
            ],
        )
    }

    /// Sample LTSV log at `/var/log/access.ltsv`.
    pub fn with_ltsv_sample() -> Self {
        Self::new().with_file(
            "/var/log/access.ltsv",
            &[
                "time:2024-01-15T10:00:00Z\thost:10.0.0.1\tstatus:200\tsize:512",
                "time:2024-01-15T10:00:01Z\thost:10.0.0.2\tstatus:404\tsize:0",
            ],
        )
    }

    /// Sample free-text log at `/var/log/notes.txt`.
    pub fn with_plaintext_sample() -> Self {
        Self::new().with_file(
            "/var/log/notes.txt",
            &[
                "Starting application",
                "Could not open cache directory, continuing without it",
                "Shutting down",
            ],
        )
    }
}

impl LogSource for MockLogSource {
    fn open(&self, path: &str) -> LogResult<OpenedSource> {
        let file = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| LogError::NotFound(path.to_string()))?;

        let corrupt_at = file.lines.len() + 1;
        let mut lines: Vec<LogResult<RawLine>> = file
            .lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| Ok(RawLine::new(i + 1, text)))
            .collect();
        if file.corrupt {
            lines.push(Err(LogError::Decode(format!(
                "{path}: corrupt stream at line {corrupt_at}"
            ))));
        }

        Ok(OpenedSource {
            compression: Compression::None,
            lines: Box::new(lines.into_iter()),
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}
