//! Tool registry: name → tool lookup and dispatch.

use std::collections::HashMap;

use lx_log_core::{LogError, LogResult, LogTool, SessionManager, ToolResult};

/// Metadata about a registered tool (used for `--list-tools`).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub schema: serde_json::Value,
}

/// Log tools indexed by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn LogTool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Box<dyn LogTool>>) -> Self {
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, tool)| (tool.name().to_string(), i))
            .collect();
        Self { tools, index }
    }

    /// Build with every tool the engine provides.
    pub fn with_defaults() -> Self {
        Self::new(lx_log_core::tools::all_tools())
    }

    pub fn get(&self, name: &str) -> Option<&dyn LogTool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// Run the named tool against `sessions`.
    pub async fn execute(
        &self,
        name: &str,
        args: serde_json::Value,
        sessions: &SessionManager,
    ) -> LogResult<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| LogError::Other(format!("unknown tool: {name}")))?;
        tracing::debug!(tool = name, "executing tool");
        tool.execute(args, sessions).await
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|tool| ToolInfo {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                schema: tool.parameters_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
