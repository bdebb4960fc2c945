//! logxray explorer: process one log file and print what the engine found.
//!
//! Usage: `lx-explorer [--config <file.toml>] [--query <json>] <log-file>`
//!        `lx-explorer --list-tools`
//!
//! Prints the session summary, the optional search result and the stats
//! report as JSON tool results on stdout. Logs go to stderr.

use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use lx_explorer::config::ExplorerConfig;
use lx_explorer::registry::ToolRegistry;
use lx_log_core::{FileLogSource, SessionManager, ToolResult};

const USAGE: &str = "usage: lx-explorer [--config <file>] [--query <json>] <log-file>";

#[derive(Default)]
struct Args {
    config: Option<String>,
    query: Option<String>,
    path: Option<String>,
    list_tools: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config = Some(args.next().context("--config needs a path")?),
            "--query" => parsed.query = Some(args.next().context("--query needs a JSON object")?),
            "--list-tools" => parsed.list_tools = true,
            other if parsed.path.is_none() => parsed.path = Some(other.to_string()),
            other => anyhow::bail!("unexpected argument: {other}\n{USAGE}"),
        }
    }
    Ok(parsed)
}

fn print(result: &ToolResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    if args.list_tools {
        let tools = ToolRegistry::with_defaults().list_tools();
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }
    let path = args.path.clone().context(USAGE)?;

    let config = match &args.config {
        Some(path) => ExplorerConfig::from_file(path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => ExplorerConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lx-explorer starting");

    let query = args
        .query
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--query is not valid JSON")?;

    // ── Session manager + tools ─────────────────────────────────
    let sessions = SessionManager::new(Arc::new(FileLogSource), config.engine.clone());
    let registry = ToolRegistry::with_defaults();
    tracing::info!(tool_count = registry.len(), "tool registry initialized");

    // ── Process, cancellable with Ctrl-C ────────────────────────
    let processed = tokio::select! {
        result = registry.execute("process_file", json!({ "path": path }), &sessions) => result?,
        _ = tokio::signal::ctrl_c() => {
            sessions.cancel();
            anyhow::bail!("interrupted while processing {path}");
        }
    };
    print(&processed)?;

    if let Some(query) = query {
        print(&registry.execute("search_records", query, &sessions).await?)?;
    }
    print(&registry.execute("log_stats", json!({ "top_values": 10 }), &sessions).await?)?;

    tracing::info!("lx-explorer done");
    Ok(())
}
