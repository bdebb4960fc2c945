//! process_file: ingest a file and publish it as the current session.

use async_trait::async_trait;
use serde_json::json;

use crate::error::{LogError, LogResult};
use crate::session::SessionManager;
use crate::types::{LogTool, ToolResult};

pub struct ProcessFile;

#[async_trait]
impl LogTool for ProcessFile {
    fn name(&self) -> &str {
        "process_file"
    }

    fn description(&self) -> &str {
        "Decode, detect and parse a log file into a new analysis session"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the log file (plain, gzip, bzip2, xz or lzma)"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        sessions: &SessionManager,
    ) -> LogResult<ToolResult> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| LogError::Other("missing 'path' argument".into()))?;

        let session = sessions.process(path).await?;
        let summary = session.summary();
        let message = format!(
            "Processed {path}: {} records as {} ({} parsed, {} fields)",
            summary.record_count,
            summary.format,
            summary.parsed_lines,
            summary.field_names.len()
        );
        let data = serde_json::to_value(&summary)
            .map_err(|e| LogError::Other(format!("serialize session summary: {e}")))?;

        Ok(ToolResult::success(self.name(), data, message))
    }
}
