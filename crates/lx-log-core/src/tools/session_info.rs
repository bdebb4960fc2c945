//! session_info: metadata of the published session.

use async_trait::async_trait;
use serde_json::json;

use crate::error::{LogError, LogResult};
use crate::session::SessionManager;
use crate::types::{LogTool, ToolResult};

pub struct SessionInfo;

#[async_trait]
impl LogTool for SessionInfo {
    fn name(&self) -> &str {
        "session_info"
    }

    fn description(&self) -> &str {
        "Show format, record counts, time span and field names of the current session"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(
        &self,
        _args: serde_json::Value,
        sessions: &SessionManager,
    ) -> LogResult<ToolResult> {
        let Some(session) = sessions.current().await else {
            return Ok(ToolResult::failure(
                self.name(),
                "no file has been processed yet",
            ));
        };

        let mut data = serde_json::to_value(session.summary())
            .map_err(|e| LogError::Other(format!("serialize session summary: {e}")))?;
        data["processing"] = json!(sessions.is_processing());

        Ok(ToolResult::success(
            self.name(),
            data,
            format!(
                "{}: {} records, format {}",
                session.path,
                session.record_count(),
                session.format
            ),
        ))
    }
}
