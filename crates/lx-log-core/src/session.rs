//! Analysis sessions and the single-slot processing manager.
//!
//! A `Session` is immutable once built and shared as `Arc<Session>`, so
//! searches and stats never take a lock while they scan it. The
//! `SessionManager` owns the published session and allows one processing
//! pass in flight at a time: a second `process` call while one is running
//! is rejected with `LogError::Busy`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{LogError, LogResult};
use crate::ingest;
use crate::record::Record;
use crate::source::LogSource;
use crate::types::{Compression, LogFormat};

// ── Session ───────────────────────────────────────────────────

/// The complete, ordered set of Records for one processed file.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub path: String,
    pub format: LogFormat,
    pub compression: Compression,
    /// Fraction of sampled lines the detected format matched.
    pub detection_ratio: f64,
    /// Physical lines read, blank ones included.
    pub total_lines: usize,
    /// Records with at least one extracted field.
    pub parsed_lines: usize,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    /// Every field name observed, in order of first appearance.
    pub field_names: Vec<String>,
    pub records: Vec<Record>,
    pub processed_at: DateTime<Utc>,
}

impl Session {
    /// Assemble a session and derive its metadata from the records.
    pub fn new(
        path: impl Into<String>,
        format: LogFormat,
        compression: Compression,
        detection_ratio: f64,
        total_lines: usize,
        records: Vec<Record>,
    ) -> Self {
        let mut field_names = indexmap::IndexSet::new();
        let mut parsed_lines = 0;
        let mut earliest: Option<DateTime<Utc>> = None;
        let mut latest: Option<DateTime<Utc>> = None;

        for record in &records {
            if record.is_parsed() {
                parsed_lines += 1;
            }
            for name in record.fields.keys() {
                if !field_names.contains(name) {
                    field_names.insert(name.clone());
                }
            }
            if let Some(ts) = record.timestamp {
                earliest = Some(earliest.map_or(ts, |e| e.min(ts)));
                latest = Some(latest.map_or(ts, |l| l.max(ts)));
            }
        }

        Self {
            id: Uuid::now_v7(),
            path: path.into(),
            format,
            compression,
            detection_ratio,
            total_lines,
            parsed_lines,
            earliest,
            latest,
            field_names: field_names.into_iter().collect(),
            records,
            processed_at: Utc::now(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Metadata view for the presentation layer (no records).
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            path: self.path.clone(),
            format: self.format,
            compression: self.compression,
            detection_ratio: self.detection_ratio,
            total_lines: self.total_lines,
            record_count: self.records.len(),
            parsed_lines: self.parsed_lines,
            unparsed_lines: self.records.len() - self.parsed_lines,
            earliest: self.earliest,
            latest: self.latest,
            field_names: self.field_names.clone(),
            processed_at: self.processed_at,
        }
    }
}

/// Serializable session metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub path: String,
    pub format: LogFormat,
    pub compression: Compression,
    pub detection_ratio: f64,
    pub total_lines: usize,
    pub record_count: usize,
    pub parsed_lines: usize,
    pub unparsed_lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<DateTime<Utc>>,
    pub field_names: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

// ── Session Manager ───────────────────────────────────────────

/// Holds the published session and the single in-flight processing slot.
pub struct SessionManager {
    source: Arc<dyn LogSource>,
    config: EngineConfig,
    current: RwLock<Option<Arc<Session>>>,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl SessionManager {
    pub fn new(source: Arc<dyn LogSource>, config: EngineConfig) -> Self {
        Self {
            source,
            config,
            current: RwLock::new(None),
            in_flight: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process `path` on a blocking worker and publish the result.
    ///
    /// On any failure the previously published session stays in place.
    pub async fn process(&self, path: &str) -> LogResult<Arc<Session>> {
        let token = CancellationToken::new();
        let _slot = self.claim(token.clone())?;

        tracing::info!(path, "processing started");
        let source = Arc::clone(&self.source);
        let config = self.config.clone();
        let owned_path = path.to_string();
        let worker_token = token.clone();
        let result = tokio::task::spawn_blocking(move || {
            ingest::process(source.as_ref(), &owned_path, &config, &worker_token)
        })
        .await
        .map_err(|e| LogError::Other(format!("processing task failed: {e}")))?;

        let session = result.inspect_err(|e| {
            tracing::warn!(path, error = %e, "processing failed, keeping previous session");
        })?;
        if token.is_cancelled() {
            tracing::warn!(path, "processing cancelled before publish");
            return Err(LogError::Cancelled);
        }

        let session = Arc::new(session);
        *self.current.write().await = Some(Arc::clone(&session));
        tracing::info!(
            path,
            session_id = %session.id,
            format = %session.format,
            records = session.records.len(),
            "session published"
        );
        Ok(session)
    }

    /// Cancel the running pass, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        let slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The published session, if any.
    pub async fn current(&self) -> Option<Arc<Session>> {
        self.current.read().await.clone()
    }

    /// The published session, or `NoSession`.
    pub async fn require(&self) -> LogResult<Arc<Session>> {
        self.current().await.ok_or(LogError::NoSession)
    }

    fn claim(&self, token: CancellationToken) -> LogResult<InFlight<'_>> {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            tracing::warn!("rejected process request: a pass is already running");
            return Err(LogError::Busy);
        }
        *slot = Some(token);
        Ok(InFlight {
            slot: &self.in_flight,
        })
    }
}

/// Releases the in-flight slot when the `process` call ends, however it ends.
struct InFlight<'a> {
    slot: &'a Mutex<Option<CancellationToken>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        // stops an orphaned worker if the caller dropped the future early
        if let Some(token) = slot.take() {
            token.cancel();
        }
    }
}
