//! Format detection over a sample of leading lines.
//!
//! Every candidate parser is scored the same way: the fraction of sampled
//! lines it fully matches. The best ratio wins, ties go to the format with
//! the higher priority, and anything under the configured minimum falls
//! back to `unstructured`. The choice is deterministic for a given sample.

use serde::Serialize;

use crate::config::DetectorConfig;
use crate::parsers::{self, LineParser, UnstructuredParser};
use crate::types::LogFormat;

/// Match ratio of one candidate format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormatScore {
    pub format: LogFormat,
    pub ratio: f64,
}

/// Outcome of detection: the winning format plus the parser to use for the
/// full pass (CSV parsers carry the delimiter and header they inferred).
pub struct Detection {
    pub format: LogFormat,
    /// Match ratio of the winner; 0.0 for the unstructured fallback.
    pub ratio: f64,
    /// Ratio of every candidate, in priority order.
    pub scores: Vec<FormatScore>,
    pub parser: Box<dyn LineParser>,
}

impl std::fmt::Debug for Detection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detection")
            .field("format", &self.format)
            .field("ratio", &self.ratio)
            .field("scores", &self.scores)
            .finish_non_exhaustive()
    }
}

impl Detection {
    fn fallback(scores: Vec<FormatScore>) -> Self {
        Self {
            format: LogFormat::Unstructured,
            ratio: 0.0,
            scores,
            parser: Box::new(UnstructuredParser),
        }
    }
}

/// Classify the dominant format of `lines`.
///
/// Blank lines are skipped and at most `config.sample_size` lines are
/// scored. Lines are trimmed before matching.
pub fn detect(lines: &[&str], config: &DetectorConfig) -> Detection {
    let sample: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .take(config.sample_size)
        .collect();
    if sample.is_empty() {
        tracing::info!("empty sample, falling back to unstructured");
        return Detection::fallback(Vec::new());
    }

    let mut candidates = parsers::candidates(&sample);
    candidates.sort_by_key(|p| p.format().priority());

    let mut scores = Vec::with_capacity(candidates.len());
    let mut best: Option<(usize, f64)> = None;
    for (i, parser) in candidates.iter().enumerate() {
        let matched = sample.iter().filter(|l| parser.parse(l).is_match()).count();
        let ratio = matched as f64 / sample.len() as f64;
        tracing::debug!(format = %parser.format(), ratio, "detection score");
        scores.push(FormatScore {
            format: parser.format(),
            ratio,
        });
        // strict comparison keeps the earlier (higher-priority) format on ties
        if best.is_none_or(|(_, r)| ratio > r) {
            best = Some((i, ratio));
        }
    }

    match best {
        Some((i, ratio)) if ratio > 0.0 && ratio >= config.min_match_ratio => {
            let parser = candidates.swap_remove(i);
            let format = parser.format();
            tracing::info!(%format, ratio, sample = sample.len(), "detected log format");
            Detection {
                format,
                ratio,
                scores,
                parser,
            }
        }
        _ => {
            tracing::info!(
                sample = sample.len(),
                "no format above threshold, falling back to unstructured"
            );
            Detection::fallback(scores)
        }
    }
}
