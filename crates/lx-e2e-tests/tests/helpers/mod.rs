//! Shared fixtures: write log lines to disk in each supported container and
//! wire a session manager plus tool registry over the real filesystem.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use lx_explorer::registry::ToolRegistry;
use lx_log_core::{EngineConfig, FileLogSource, SessionManager};

/// Container a fixture file is written in.
#[derive(Debug, Clone, Copy)]
pub enum Container {
    Plain,
    Gzip,
    Bzip2,
    Xz,
    Lzma,
}

impl Container {
    pub const ALL: [Container; 5] = [
        Self::Plain,
        Self::Gzip,
        Self::Bzip2,
        Self::Xz,
        Self::Lzma,
    ];

    /// Deliberately misleading extensions: detection must go by content.
    fn file_name(&self) -> &'static str {
        match self {
            Self::Plain => "app.log.gz",
            Self::Gzip => "app.log",
            Self::Bzip2 => "app.txt",
            Self::Xz => "app.dat",
            Self::Lzma => "app.lzma.log",
        }
    }
}

/// Join lines with `\n`, keeping a trailing newline.
pub fn join(lines: &[&str]) -> Vec<u8> {
    let mut out = lines.join("\n").into_bytes();
    out.push(b'\n');
    out
}

pub fn encode(container: Container, data: &[u8]) -> Vec<u8> {
    match container {
        Container::Plain => data.to_vec(),
        Container::Gzip => {
            let mut enc =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        }
        Container::Bzip2 => {
            let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        }
        Container::Xz => {
            let mut enc = xz2::write::XzEncoder::new(Vec::new(), 6);
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        }
        Container::Lzma => {
            let options = xz2::stream::LzmaOptions::new_preset(6).unwrap();
            let stream = xz2::stream::Stream::new_lzma_encoder(&options).unwrap();
            let mut enc = xz2::write::XzEncoder::new_stream(Vec::new(), stream);
            enc.write_all(data).unwrap();
            enc.finish().unwrap()
        }
    }
}

/// A temp directory of fixture files plus an engine over the real filesystem.
pub struct TestHarness {
    pub dir: TempDir,
    pub sessions: SessionManager,
    pub registry: ToolRegistry,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            sessions: SessionManager::new(Arc::new(FileLogSource), config),
            registry: ToolRegistry::with_defaults(),
        }
    }

    /// Write raw bytes under `name`, returning the full path.
    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> String {
        let path: PathBuf = self.dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Write `lines` in `container` format under a misleading file name.
    pub fn write(&self, container: Container, lines: &[&str]) -> String {
        self.write_bytes(container.file_name(), &encode(container, &join(lines)))
    }

    /// Run a tool and return its `data` payload.
    pub async fn tool(&self, name: &str, args: serde_json::Value) -> serde_json::Value {
        let result = self
            .registry
            .execute(name, args, &self.sessions)
            .await
            .unwrap_or_else(|e| panic!("{name} failed: {e}"));
        assert!(result.success, "{name}: {:?}", result.error);
        result.data.unwrap()
    }
}
