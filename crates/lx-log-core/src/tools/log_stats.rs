//! log_stats: field distributions, numeric summaries, histogram and time
//! series for the current session.

use async_trait::async_trait;
use serde_json::json;

use crate::error::{LogError, LogResult};
use crate::session::SessionManager;
use crate::stats;
use crate::types::{LogTool, ToolResult};

pub struct LogStats;

#[async_trait]
impl LogTool for LogStats {
    fn name(&self) -> &str {
        "log_stats"
    }

    fn description(&self) -> &str {
        "Compute per-field value distributions, numeric summaries and a time histogram"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "buckets": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": stats::MAX_HISTOGRAM_BUCKETS,
                    "description": "Histogram bucket count (default from engine config)"
                },
                "top_values": {
                    "type": "integer",
                    "description": "Keep only the N most frequent values per field"
                },
                "fields": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Restrict per-field output to these fields"
                }
            }
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        sessions: &SessionManager,
    ) -> LogResult<ToolResult> {
        let buckets = match args["buckets"].as_u64() {
            None => sessions.config().stats.histogram_buckets,
            Some(n) if n == 0 || n > stats::MAX_HISTOGRAM_BUCKETS as u64 => {
                return Err(LogError::query(
                    "buckets",
                    format!("must be between 1 and {}", stats::MAX_HISTOGRAM_BUCKETS),
                ));
            }
            Some(n) => n as usize,
        };
        let top_values = args["top_values"].as_u64().map(|n| n as usize);
        let wanted: Option<Vec<&str>> = args["fields"]
            .as_array()
            .map(|names| names.iter().filter_map(|v| v.as_str()).collect());

        let session = sessions.require().await?;
        let mut report = stats::aggregate(&session, buckets);

        if let Some(wanted) = &wanted {
            report.fields.retain(|name, _| wanted.contains(&name.as_str()));
        }
        if let Some(top) = top_values {
            for field in report.fields.values_mut() {
                field.frequencies.truncate(top);
            }
        }

        let message = format!(
            "{} records, {:.1}% parsed, {} fields",
            report.total_records,
            report.success_rate * 100.0,
            report.fields.len()
        );
        let mut data = serde_json::to_value(&report)
            .map_err(|e| LogError::Other(format!("serialize stats: {e}")))?;
        data["session_id"] = json!(session.id);
        data["path"] = json!(session.path);
        data["format"] = json!(session.format);

        Ok(ToolResult::success(self.name(), data, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::mock::MockLogSource;
    use std::sync::Arc;

    async fn processed(source: MockLogSource, path: &str) -> SessionManager {
        let sessions = SessionManager::new(Arc::new(source), EngineConfig::default());
        sessions.process(path).await.unwrap();
        sessions
    }

    #[tokio::test]
    async fn stats_json_sample() {
        let sessions = processed(MockLogSource::with_json_sample(), "/var/log/app.json").await;
        let result = LogStats.execute(json!({}), &sessions).await.unwrap();
        assert!(result.success);
        let data = result.data.as_ref().unwrap();
        assert_eq!(data["total_records"], 8);
        assert_eq!(data["format"], "json");
        assert_eq!(data["histogram"]["buckets"].as_array().unwrap().len(), 50);
        let latency = &data["fields"]["latency_ms"]["numeric"];
        assert!(latency["min"].as_f64().unwrap() <= latency["mean"].as_f64().unwrap());
        assert!(latency["mean"].as_f64().unwrap() <= latency["max"].as_f64().unwrap());
    }

    #[tokio::test]
    async fn stats_csv_with_options() {
        let sessions = processed(MockLogSource::with_csv_sample(), "/var/log/export.csv").await;
        let result = LogStats
            .execute(
                json!({"buckets": 4, "top_values": 1, "fields": ["host", "status"]}),
                &sessions,
            )
            .await
            .unwrap();
        let data = result.data.as_ref().unwrap();
        let fields = data["fields"].as_object().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["host"]["frequencies"]["web1"], 2);
        assert_eq!(fields["status"]["frequencies"].as_object().unwrap().len(), 1);
        assert_eq!(data["histogram"]["buckets"].as_array().unwrap().len(), 4);
        // the header row is an unparsed record
        assert_eq!(data["unparsed_records"], 1);
    }

    #[tokio::test]
    async fn stats_reject_out_of_range_buckets() {
        let sessions = processed(MockLogSource::with_json_sample(), "/var/log/app.json").await;
        for buckets in [json!(0), json!(u64::MAX), json!(10_000_000_000u64)] {
            let err = LogStats
                .execute(json!({ "buckets": buckets }), &sessions)
                .await
                .unwrap_err();
            assert_eq!(err.query_field(), Some("buckets"));
        }
        let ok = LogStats
            .execute(json!({ "buckets": stats::MAX_HISTOGRAM_BUCKETS }), &sessions)
            .await
            .unwrap();
        assert!(ok.success);
    }

    #[tokio::test]
    async fn stats_require_session() {
        let sessions = SessionManager::new(Arc::new(MockLogSource::new()), EngineConfig::default());
        let result = LogStats.execute(json!({}), &sessions).await;
        assert!(matches!(result, Err(LogError::NoSession)));
    }
}
