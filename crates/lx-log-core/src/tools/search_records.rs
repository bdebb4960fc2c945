//! search_records: structured field conditions, raw-text match and time
//! filters over the current session.

use async_trait::async_trait;
use serde_json::json;

use crate::error::{LogError, LogResult};
use crate::query::{self, QuerySpec};
use crate::session::SessionManager;
use crate::types::{LogTool, ToolResult};

const DEFAULT_LIMIT: usize = 100;
const DEFAULT_FACET_LIMIT: usize = 10;

pub struct SearchRecords;

#[async_trait]
impl LogTool for SearchRecords {
    fn name(&self) -> &str {
        "search_records"
    }

    fn description(&self) -> &str {
        "Search the current session by field conditions, raw text and time range"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "conditions": {
                    "type": "array",
                    "description": "Field conditions, all of which must hold",
                    "items": {
                        "type": "object",
                        "properties": {
                            "field": { "type": "string" },
                            "operator": {
                                "type": "string",
                                "enum": ["equals", "not_equals", "greater_than", "less_than",
                                         "greater_or_equal", "less_or_equal", "contains", "regex"]
                            },
                            "value": { "type": "string" },
                            "case_sensitive": { "type": "boolean", "default": false }
                        },
                        "required": ["field", "operator", "value"]
                    }
                },
                "raw_text": {
                    "type": "object",
                    "properties": {
                        "pattern": { "type": "string" },
                        "mode": { "type": "string", "enum": ["substring", "regex"], "default": "substring" },
                        "case_sensitive": { "type": "boolean", "default": false }
                    },
                    "required": ["pattern"]
                },
                "time_range": {
                    "type": "object",
                    "description": "Inclusive bounds, YYYY-MM-DD HH:MM:SS (UTC)",
                    "properties": {
                        "start": { "type": "string" },
                        "end": { "type": "string" }
                    }
                },
                "last_minutes": {
                    "type": "integer",
                    "description": "Window ending at the session's latest timestamp"
                },
                "offset": { "type": "integer", "default": 0 },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of records returned (default: 100)",
                    "default": DEFAULT_LIMIT
                },
                "raw_only": {
                    "type": "boolean",
                    "description": "Return only line numbers and raw text",
                    "default": false
                },
                "facet_limit": {
                    "type": "integer",
                    "description": "Top values kept per field in facets (default: 10)",
                    "default": DEFAULT_FACET_LIMIT
                }
            }
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        sessions: &SessionManager,
    ) -> LogResult<ToolResult> {
        let mut spec: QuerySpec = serde_json::from_value(args.clone())
            .map_err(|e| LogError::query("arguments", e.to_string()))?;
        spec.limit = spec.limit.or(Some(DEFAULT_LIMIT));
        let raw_only = args["raw_only"].as_bool().unwrap_or(false);
        let facet_limit = args["facet_limit"]
            .as_u64()
            .map_or(DEFAULT_FACET_LIMIT, |n| n as usize);

        let query = spec.compile()?;
        let session = sessions.require().await?;
        let result = query::search(&session, &query);

        let records: Vec<serde_json::Value> = if raw_only {
            result
                .records
                .iter()
                .map(|r| json!({ "line": r.line_number, "raw": r.raw }))
                .collect()
        } else {
            result
                .records
                .iter()
                .map(|r| serde_json::to_value(r))
                .collect::<Result<_, _>>()
                .map_err(|e| LogError::Other(format!("serialize records: {e}")))?
        };

        let facets: serde_json::Map<String, serde_json::Value> = result
            .field_counts
            .iter()
            .map(|(field, counts)| {
                let top: serde_json::Map<String, serde_json::Value> = counts
                    .iter()
                    .take(facet_limit)
                    .map(|(value, count)| (value.clone(), json!(count)))
                    .collect();
                (field.clone(), serde_json::Value::Object(top))
            })
            .collect();

        let returned = records.len();
        let total = result.total_matches;
        let data = json!({
            "session_id": session.id,
            "path": session.path,
            "total_matches": total,
            "returned": returned,
            "offset": query.offset,
            "records": records,
            "facets": facets,
        });

        Ok(ToolResult::success(
            self.name(),
            data,
            format!(
                "{total} of {} records matched, returning {returned}",
                session.record_count()
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::mock::MockLogSource;
    use std::sync::Arc;

    async fn syslog_sessions() -> SessionManager {
        let sessions = SessionManager::new(
            Arc::new(MockLogSource::with_syslog_sample()),
            EngineConfig::default(),
        );
        sessions.process("/var/log/syslog").await.unwrap();
        sessions
    }

    fn lines(result: &ToolResult) -> Vec<u64> {
        result.data.as_ref().unwrap()["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["line_number"].as_u64().or_else(|| r["line"].as_u64()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn raw_text_search() {
        let sessions = syslog_sessions().await;
        let result = SearchRecords
            .execute(json!({"raw_text": {"pattern": "database"}}), &sessions)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(lines(&result), [2, 8, 10]);
    }

    #[tokio::test]
    async fn field_condition_on_decoded_level() {
        let sessions = syslog_sessions().await;
        let result = SearchRecords
            .execute(
                json!({"conditions": [{"field": "level", "operator": "equals", "value": "error"}]}),
                &sessions,
            )
            .await
            .unwrap();
        assert_eq!(lines(&result), [2, 6, 8]);
        let facets = &result.data.as_ref().unwrap()["facets"];
        assert_eq!(facets["program"]["api"], 3);
    }

    #[tokio::test]
    async fn raw_only_with_limit() {
        let sessions = syslog_sessions().await;
        let result = SearchRecords
            .execute(json!({"limit": 3, "offset": 1, "raw_only": true}), &sessions)
            .await
            .unwrap();
        let data = result.data.as_ref().unwrap();
        assert_eq!(data["total_matches"], 10);
        assert_eq!(data["returned"], 3);
        assert_eq!(lines(&result), [2, 3, 4]);
        assert!(data["records"][0]["fields"].is_null());
    }

    #[tokio::test]
    async fn malformed_time_is_query_error() {
        let sessions = syslog_sessions().await;
        let err = SearchRecords
            .execute(json!({"time_range": {"start": "not-a-date"}}), &sessions)
            .await
            .unwrap_err();
        assert_eq!(err.query_field(), Some("time_range.start"));
    }

    #[tokio::test]
    async fn requires_session() {
        let sessions = SessionManager::new(Arc::new(MockLogSource::new()), EngineConfig::default());
        let result = SearchRecords.execute(json!({}), &sessions).await;
        assert!(matches!(result, Err(LogError::NoSession)));
    }
}
