//! Stats aggregation over a Session.
//!
//! One pass over the records builds per-field frequency tables, numeric and
//! timestamp summaries, and collects primary timestamps for the histogram
//! and time-series views. Reports are recomputed on demand and never cached.

use chrono::{DateTime, Duration, Timelike, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::record::{FieldValue, ValueKind};
use crate::session::Session;

/// Upper bound on histogram buckets; larger requests are clamped.
pub const MAX_HISTOGRAM_BUCKETS: usize = 10_000;

// ── Report types ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub total_records: usize,
    pub parsed_records: usize,
    pub unparsed_records: usize,
    /// parsed / total; 0.0 for an empty session.
    pub success_rate: f64,
    /// Per-field statistics, in order of first appearance.
    pub fields: IndexMap<String, FieldStats>,
    /// Primary-timestamp histogram; absent when no record has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_series: Option<TimeSeries>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldStats {
    /// Records in which the field is present.
    pub present: usize,
    /// present / total records.
    pub extraction_rate: f64,
    /// How many values inferred as each type.
    pub type_counts: BTreeMap<ValueKind, usize>,
    /// Raw value → occurrences, most frequent first. Not capped.
    pub frequencies: IndexMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<TimestampSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimestampSummary {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
    /// Mean instant, at millisecond precision.
    pub mean: DateTime<Utc>,
    pub count: usize,
}

/// Fixed-width buckets over the primary-timestamp span. Every bucket is
/// listed, empty ones included.
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub bucket_width_ms: i64,
    pub buckets: Vec<HistogramBucket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistogramBucket {
    pub start: DateTime<Utc>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    /// Hour of day (0-23, UTC) → records.
    pub counts_per_hour: BTreeMap<u32, usize>,
    /// Calendar day (`YYYY-MM-DD`, UTC) → records.
    pub counts_per_day: BTreeMap<String, usize>,
    pub peak_hour: u32,
    pub peak_day: String,
    pub span_seconds: f64,
    /// Timestamped records per second of span; 0.0 for a zero span.
    pub entries_per_second: f64,
}

// ── Accumulators ──────────────────────────────────────────────

#[derive(Default)]
struct FieldAccumulator {
    stats: FieldStats,
    numeric: Option<(f64, f64, f64, usize)>,
    timestamps: Option<(DateTime<Utc>, DateTime<Utc>, i128, usize)>,
}

impl FieldAccumulator {
    fn add(&mut self, value: &FieldValue) {
        self.stats.present += 1;
        *self.stats.type_counts.entry(value.kind()).or_default() += 1;
        *self
            .stats
            .frequencies
            .entry(value.raw().to_string())
            .or_default() += 1;

        if let Some(n) = value.as_f64() {
            self.numeric = Some(match self.numeric {
                Some((min, max, sum, count)) => (min.min(n), max.max(n), sum + n, count + 1),
                None => (n, n, n, 1),
            });
        }
        if let Some(ts) = value.as_timestamp() {
            let ms = i128::from(ts.timestamp_millis());
            self.timestamps = Some(match self.timestamps {
                Some((earliest, latest, sum, count)) => {
                    (earliest.min(ts), latest.max(ts), sum + ms, count + 1)
                }
                None => (ts, ts, ms, 1),
            });
        }
    }

    fn finish(mut self, total: usize) -> FieldStats {
        self.stats.extraction_rate = ratio(self.stats.present, total);
        self.stats.frequencies.sort_by(|_, a, _, b| b.cmp(a));
        self.stats.numeric = self.numeric.map(|(min, max, sum, count)| NumericSummary {
            min,
            max,
            // clamp guards against rounding drift on long sums
            mean: (sum / count as f64).clamp(min, max),
            count,
        });
        self.stats.timestamps = self
            .timestamps
            .map(|(earliest, latest, sum, count)| {
                let mean_ms = (sum / count as i128) as i64;
                let mean = DateTime::from_timestamp_millis(mean_ms)
                    .unwrap_or(earliest)
                    .clamp(earliest, latest);
                TimestampSummary {
                    earliest,
                    latest,
                    mean,
                    count,
                }
            });
        self.stats
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

// ── Aggregation ───────────────────────────────────────────────

/// Summarize `session`, cutting the timestamp span into `buckets` buckets.
pub fn aggregate(session: &Session, buckets: usize) -> StatsReport {
    let started = Instant::now();
    let total = session.records.len();

    let mut fields: IndexMap<String, FieldAccumulator> = IndexMap::new();
    let mut parsed = 0;
    let mut timestamps = Vec::new();

    for record in &session.records {
        if record.is_parsed() {
            parsed += 1;
        }
        for (name, value) in &record.fields {
            fields.entry(name.clone()).or_default().add(value);
        }
        if let Some(ts) = record.timestamp {
            timestamps.push(ts);
        }
    }

    let fields: IndexMap<String, FieldStats> = fields
        .into_iter()
        .map(|(name, acc)| (name, acc.finish(total)))
        .collect();

    timestamps.sort_unstable();
    let histogram = histogram(&timestamps, buckets);
    let time_series = time_series(&timestamps);

    tracing::debug!(
        session = %session.id,
        records = total,
        fields = fields.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "stats aggregated"
    );

    StatsReport {
        total_records: total,
        parsed_records: parsed,
        unparsed_records: total - parsed,
        success_rate: ratio(parsed, total),
        fields,
        histogram,
        time_series,
    }
}

/// Bucket sorted timestamps. A zero span yields a single bucket; the count
/// is clamped to `1..=MAX_HISTOGRAM_BUCKETS`.
fn histogram(sorted: &[DateTime<Utc>], buckets: usize) -> Option<Histogram> {
    let (&start, &end) = (sorted.first()?, sorted.last()?);
    let span_ms = (end - start).num_milliseconds();
    let n = if span_ms == 0 {
        1
    } else {
        buckets.clamp(1, MAX_HISTOGRAM_BUCKETS)
    };
    let width_ms = if span_ms == 0 {
        0
    } else {
        // ceiling division so the last timestamp lands in the last bucket
        ((span_ms + n as i64 - 1) / n as i64).max(1)
    };

    let mut counts = vec![0usize; n];
    for ts in sorted {
        let offset = (*ts - start).num_milliseconds();
        let index = if width_ms == 0 {
            0
        } else {
            ((offset / width_ms) as usize).min(n - 1)
        };
        counts[index] += 1;
    }

    let buckets = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBucket {
            start: start + Duration::milliseconds(width_ms * i as i64),
            count,
        })
        .collect();

    Some(Histogram {
        start,
        end,
        bucket_width_ms: width_ms,
        buckets,
    })
}

fn time_series(sorted: &[DateTime<Utc>]) -> Option<TimeSeries> {
    let (&first, &last) = (sorted.first()?, sorted.last()?);

    let mut counts_per_hour: BTreeMap<u32, usize> = BTreeMap::new();
    let mut counts_per_day: BTreeMap<String, usize> = BTreeMap::new();
    for ts in sorted {
        *counts_per_hour.entry(ts.hour()).or_default() += 1;
        *counts_per_day
            .entry(ts.format("%Y-%m-%d").to_string())
            .or_default() += 1;
    }

    let peak_hour = peak(&counts_per_hour).copied().unwrap_or_default();
    let peak_day = peak(&counts_per_day).cloned().unwrap_or_default();

    let span_seconds = (last - first).num_milliseconds() as f64 / 1000.0;
    let entries_per_second = if span_seconds > 0.0 {
        sorted.len() as f64 / span_seconds
    } else {
        0.0
    };

    Some(TimeSeries {
        counts_per_hour,
        counts_per_day,
        peak_hour,
        peak_day,
        span_seconds,
        entries_per_second,
    })
}

/// Key with the highest count; the smallest key wins ties.
fn peak<K: Ord>(counts: &BTreeMap<K, usize>) -> Option<&K> {
    counts
        .iter()
        .rev()
        .max_by_key(|(_, count)| **count)
        .map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::ingest;
    use crate::mock::MockLogSource;
    use tokio_util::sync::CancellationToken;

    fn process(source: &MockLogSource, path: &str) -> Session {
        ingest::process(
            source,
            path,
            &EngineConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    fn metrics_session() -> Session {
        let source = MockLogSource::new().with_file(
            "/m.log",
            &[
                "time=2024-01-15T10:00:00Z host=a latency=10",
                "time=2024-01-15T10:30:00Z host=b latency=2.5",
                "time=2024-01-15T11:00:00Z host=a latency=slow",
                "time=2024-01-16T11:00:00Z host=a",
                "not a key value line",
            ],
        );
        process(&source, "/m.log")
    }

    #[test]
    fn record_totals() {
        let report = aggregate(&metrics_session(), 50);
        assert_eq!(report.total_records, 5);
        assert_eq!(report.parsed_records, 4);
        assert_eq!(report.unparsed_records, 1);
        assert!((report.success_rate - 0.8).abs() < 1e-9);
    }

    #[test]
    fn frequency_totals_match_presence() {
        let report = aggregate(&metrics_session(), 50);
        for (name, stats) in &report.fields {
            let sum: usize = stats.frequencies.values().sum();
            assert_eq!(sum, stats.present, "field {name}");
        }
        let host = &report.fields["host"];
        assert_eq!(host.present, 4);
        assert_eq!(host.frequencies.get_index(0), Some((&"a".to_string(), &3)));
        assert!((host.extraction_rate - 0.8).abs() < 1e-9);
    }

    #[test]
    fn numeric_summary_over_numeric_values_only() {
        let report = aggregate(&metrics_session(), 50);
        let latency = &report.fields["latency"];
        let numeric = latency.numeric.unwrap();
        assert_eq!(numeric.count, 2);
        assert_eq!(numeric.min, 2.5);
        assert_eq!(numeric.max, 10.0);
        assert!(numeric.min <= numeric.mean && numeric.mean <= numeric.max);
        assert_eq!(latency.type_counts[&ValueKind::String], 1);
        assert_eq!(latency.type_counts[&ValueKind::Integer], 1);
        assert_eq!(latency.type_counts[&ValueKind::Float], 1);
    }

    #[test]
    fn timestamp_field_summary() {
        let report = aggregate(&metrics_session(), 50);
        let time = report.fields["time"].timestamps.unwrap();
        assert_eq!(time.count, 4);
        assert!(time.earliest < time.latest);
        assert!(time.earliest <= time.mean && time.mean <= time.latest);
        // 10:00, 10:30, 11:00 on the 15th and 11:00 on the 16th
        assert_eq!(time.mean.to_rfc3339(), "2024-01-15T16:37:30+00:00");
        assert!(report.fields["host"].timestamps.is_none());
    }

    #[test]
    fn histogram_lists_every_bucket() {
        let report = aggregate(&metrics_session(), 10);
        let histogram = report.histogram.unwrap();
        assert_eq!(histogram.buckets.len(), 10);
        assert_eq!(histogram.buckets.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(histogram.buckets[0].count, 3);
        assert_eq!(histogram.buckets[9].count, 1);
        assert!(histogram.buckets.iter().any(|b| b.count == 0));
        assert_eq!(histogram.buckets[0].start, histogram.start);
    }

    #[test]
    fn single_instant_is_one_bucket() {
        let source = MockLogSource::new().with_file(
            "/one",
            &["time=2024-01-15T10:00:00Z a=1", "time=2024-01-15T10:00:00Z a=2"],
        );
        let report = aggregate(&process(&source, "/one"), 50);
        let histogram = report.histogram.unwrap();
        assert_eq!(histogram.buckets.len(), 1);
        assert_eq!(histogram.buckets[0].count, 2);
        assert_eq!(report.time_series.unwrap().entries_per_second, 0.0);
    }

    #[test]
    fn oversized_bucket_count_is_clamped() {
        let session = metrics_session();
        let histogram = aggregate(&session, usize::MAX).histogram.unwrap();
        assert_eq!(histogram.buckets.len(), MAX_HISTOGRAM_BUCKETS);
        assert_eq!(histogram.buckets.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(aggregate(&session, 0).histogram.unwrap().buckets.len(), 1);
    }

    #[test]
    fn time_series_peaks() {
        let report = aggregate(&metrics_session(), 50);
        let series = report.time_series.unwrap();
        assert_eq!(series.counts_per_hour[&10], 2);
        assert_eq!(series.counts_per_hour[&11], 2);
        // ties go to the earlier hour
        assert_eq!(series.peak_hour, 10);
        assert_eq!(series.peak_day, "2024-01-15");
        assert_eq!(series.counts_per_day["2024-01-16"], 1);
        assert!(series.entries_per_second > 0.0);
    }

    #[test]
    fn empty_session_report() {
        let source = MockLogSource::new().with_file("/empty", &[]);
        let report = aggregate(&process(&source, "/empty"), 50);
        assert_eq!(report.total_records, 0);
        assert_eq!(report.success_rate, 0.0);
        assert!(report.fields.is_empty());
        assert!(report.histogram.is_none());
        assert!(report.time_series.is_none());
    }

    #[test]
    fn unparsed_records_only_count_in_totals() {
        let source = MockLogSource::with_plaintext_sample();
        let report = aggregate(&process(&source, "/var/log/notes.txt"), 50);
        assert!(report.total_records > 0);
        assert_eq!(report.parsed_records, 0);
        assert!(report.fields.is_empty());
    }

    #[test]
    fn aggregation_is_repeatable() {
        let session = metrics_session();
        let a = serde_json::to_value(aggregate(&session, 20)).unwrap();
        let b = serde_json::to_value(aggregate(&session, 20)).unwrap();
        assert_eq!(a, b);
    }
}
