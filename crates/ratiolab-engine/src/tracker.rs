// RatioLab - Adaptive Compression Selection
// Copyright (C) 2025 RatioLab Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Prediction accuracy tracker
//!
//! Append-only store of predicted-vs-actual outcomes, keyed by
//! `(algorithm, content type)`. The recommender reads it back to calibrate
//! future predictions. Records can be persisted as JSON lines so that
//! short-lived processes (the CLI) keep learning across invocations.

use crate::analyzer::ContentType;
use crate::error::EngineResult;
use crate::executor::CompressionResult;
use crate::recommend::CompressionCandidate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

/// One predicted-vs-actual observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyRecord {
    /// Algorithm that ran
    pub algorithm_id: String,
    /// Content type of the input
    pub detected_type: ContentType,
    /// Ratio the recommender predicted
    pub predicted_ratio: f64,
    /// Ratio actually achieved
    pub actual_ratio: f64,
    /// Time the recommender predicted
    pub predicted_time_ms: f64,
    /// Time actually taken
    pub actual_time_ms: f64,
    /// Uncalibrated ratio prediction, the reference for calibration
    #[serde(default)]
    pub baseline_ratio: f64,
    /// Uncalibrated time prediction
    #[serde(default)]
    pub baseline_time_ms: f64,
    /// When the run happened
    pub timestamp: DateTime<Utc>,
}

impl AccuracyRecord {
    /// Signed ratio error (actual - predicted)
    pub fn ratio_error(&self) -> f64 {
        self.actual_ratio - self.predicted_ratio
    }

    /// Absolute ratio error as a percentage of the actual ratio
    pub fn ratio_error_percent(&self) -> f64 {
        if self.actual_ratio > 0.0 {
            (self.ratio_error().abs() / self.actual_ratio) * 100.0
        } else {
            0.0
        }
    }
}

/// Aggregated accuracy over a set of records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyStats {
    /// Number of records aggregated
    pub count: usize,
    /// Mean signed ratio error (positive: predictions too pessimistic)
    pub mean_ratio_error: f64,
    /// Mean absolute percentage error of the ratio
    pub mean_abs_percent_error: f64,
    /// Mean of actual / predicted ratio
    pub mean_ratio_factor: f64,
}

impl AccuracyStats {
    fn from_records<'a>(records: impl Iterator<Item = &'a AccuracyRecord>) -> Self {
        let mut stats = AccuracyStats::default();
        let mut factor_count = 0usize;

        for record in records {
            stats.count += 1;
            stats.mean_ratio_error += record.ratio_error();
            stats.mean_abs_percent_error += record.ratio_error_percent();
            if record.predicted_ratio > 0.0 {
                stats.mean_ratio_factor += record.actual_ratio / record.predicted_ratio;
                factor_count += 1;
            }
        }

        if stats.count > 0 {
            stats.mean_ratio_error /= stats.count as f64;
            stats.mean_abs_percent_error /= stats.count as f64;
        }
        if factor_count > 0 {
            stats.mean_ratio_factor /= factor_count as f64;
        }
        stats
    }
}

/// Keyed access to accuracy history for one `(algorithm, content type)` pair
pub trait HistoryLookup {
    /// Run `f` over the records for a pair, oldest first
    fn with_records<R>(
        &self,
        algorithm_id: &str,
        detected_type: ContentType,
        f: impl FnOnce(&[AccuracyRecord]) -> R,
    ) -> R;
}

impl HistoryLookup for [AccuracyRecord] {
    fn with_records<R>(
        &self,
        algorithm_id: &str,
        detected_type: ContentType,
        f: impl FnOnce(&[AccuracyRecord]) -> R,
    ) -> R {
        let matching: Vec<AccuracyRecord> = self
            .iter()
            .filter(|r| r.algorithm_id == algorithm_id && r.detected_type == detected_type)
            .cloned()
            .collect();
        f(&matching)
    }
}

impl HistoryLookup for AccuracyTracker {
    fn with_records<R>(
        &self,
        algorithm_id: &str,
        detected_type: ContentType,
        f: impl FnOnce(&[AccuracyRecord]) -> R,
    ) -> R {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let key = (algorithm_id.to_string(), detected_type);
        f(records.get(&key).map(Vec::as_slice).unwrap_or_default())
    }
}

type RecordKey = (String, ContentType);

fn chronological(a: &AccuracyRecord, b: &AccuracyRecord) -> std::cmp::Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.algorithm_id.cmp(&b.algorithm_id))
        .then_with(|| a.detected_type.cmp(&b.detected_type))
}

/// Thread-safe accuracy store
#[derive(Debug, Default)]
pub struct AccuracyTracker {
    records: RwLock<HashMap<RecordKey, Vec<AccuracyRecord>>>,
}

impl AccuracyTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of running a candidate
    ///
    /// Only successful results are stored; failures are logged and `None` is
    /// returned.
    pub fn record(
        &self,
        candidate: &CompressionCandidate,
        result: &CompressionResult,
        detected_type: ContentType,
    ) -> Option<AccuracyRecord> {
        let actual_ratio = match (result.is_success(), result.ratio) {
            (true, Some(ratio)) => ratio,
            _ => {
                tracing::warn!(
                    algorithm = %result.algorithm_id,
                    error = result.error.as_deref().unwrap_or("unverified"),
                    "not recording failed run"
                );
                return None;
            }
        };

        let record = AccuracyRecord {
            algorithm_id: result.algorithm_id.clone(),
            detected_type,
            predicted_ratio: candidate.predicted_ratio,
            actual_ratio,
            predicted_time_ms: candidate.predicted_time_ms,
            actual_time_ms: result.duration_ms,
            baseline_ratio: candidate.baseline_ratio,
            baseline_time_ms: candidate.baseline_time_ms,
            timestamp: Utc::now(),
        };

        self.insert(record.clone());
        Some(record)
    }

    /// Append an existing record
    pub fn insert(&self, record: AccuracyRecord) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records
            .entry((record.algorithm_id.clone(), record.detected_type))
            .or_default()
            .push(record);
    }

    /// Records for one `(algorithm, content type)` pair, oldest first
    pub fn query(&self, algorithm_id: &str, detected_type: ContentType) -> Vec<AccuracyRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(&(algorithm_id.to_string(), detected_type))
            .cloned()
            .unwrap_or_default()
    }

    /// Records for every algorithm on one content type
    pub fn records_for_type(&self, detected_type: ContentType) -> Vec<AccuracyRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<AccuracyRecord> = records
            .iter()
            .filter(|((_, ty), _)| *ty == detected_type)
            .flat_map(|(_, list)| list.iter().cloned())
            .collect();
        out.sort_by(chronological);
        out
    }

    /// Every record, ordered by timestamp
    pub fn snapshot(&self) -> Vec<AccuracyRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<AccuracyRecord> = records.values().flatten().cloned().collect();
        out.sort_by(chronological);
        out
    }

    /// Aggregate accuracy, optionally narrowed by algorithm and content type
    pub fn stats(
        &self,
        algorithm_id: Option<&str>,
        detected_type: Option<ContentType>,
    ) -> AccuracyStats {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        AccuracyStats::from_records(
            records
                .iter()
                .filter(|((id, ty), _)| {
                    algorithm_id.is_none_or(|wanted| wanted == id.as_str())
                        && detected_type.is_none_or(|wanted| wanted == *ty)
                })
                .flat_map(|(_, list)| list.iter()),
        )
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.values().map(Vec::len).sum()
    }

    /// Check whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every record to `path` as JSON lines
    pub fn save_to(&self, path: &Path) -> EngineResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        for record in self.snapshot() {
            serde_json::to_writer(&mut writer, &record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        tracing::debug!(path = %path.display(), records = self.len(), "saved accuracy history");
        Ok(())
    }

    /// Load a tracker from a JSON-lines file
    ///
    /// Blank lines are skipped; a malformed line is an error.
    pub fn load_from(path: &Path) -> EngineResult<Self> {
        let tracker = AccuracyTracker::new();
        let reader = BufReader::new(File::open(path)?);

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            tracker.insert(serde_json::from_str(&line)?);
        }

        tracing::debug!(path = %path.display(), records = tracker.len(), "loaded accuracy history");
        Ok(tracker)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::CompressionParameters;
    use std::sync::Arc;

    fn candidate(algorithm: &str, predicted_ratio: f64) -> CompressionCandidate {
        CompressionCandidate {
            algorithm_id: algorithm.to_string(),
            parameters: CompressionParameters::new(6),
            confidence: 0.8,
            predicted_ratio,
            predicted_time_ms: 1.0,
            baseline_ratio: predicted_ratio,
            baseline_time_ms: 1.0,
        }
    }

    fn success(algorithm: &str, ratio: f64) -> CompressionResult {
        CompressionResult {
            algorithm_id: algorithm.to_string(),
            parameters: CompressionParameters::new(6),
            original_size: 1000,
            compressed_size: (1000.0 / ratio) as u64,
            ratio: Some(ratio),
            duration_ms: 2.0,
            decompression_ms: Some(1.0),
            throughput_mbps: 100.0,
            integrity_verified: true,
            error: None,
        }
    }

    #[test]
    fn test_record_success() {
        let tracker = AccuracyTracker::new();
        let record = tracker
            .record(&candidate("gzip", 3.0), &success("gzip", 4.0), ContentType::Text)
            .unwrap();
        assert_eq!(record.actual_ratio, 4.0);
        assert_eq!(record.predicted_ratio, 3.0);
        assert_eq!(record.baseline_ratio, 3.0);
        assert_eq!(tracker.query("gzip", ContentType::Text), vec![record]);
        assert!(tracker.query("gzip", ContentType::Json).is_empty());
    }

    #[test]
    fn test_failures_not_recorded() {
        let tracker = AccuracyTracker::new();
        let failed = CompressionResult::failed("gzip", CompressionParameters::new(6), 10, "boom");
        assert!(tracker
            .record(&candidate("gzip", 3.0), &failed, ContentType::Text)
            .is_none());

        let mut unverified = success("gzip", 2.0);
        unverified.integrity_verified = false;
        unverified.error = Some("integrity check failed".to_string());
        assert!(tracker
            .record(&candidate("gzip", 3.0), &unverified, ContentType::Text)
            .is_none());

        assert!(tracker.is_empty());
    }

    #[test]
    fn test_records_for_type() {
        let tracker = AccuracyTracker::new();
        tracker.record(&candidate("gzip", 2.0), &success("gzip", 2.0), ContentType::Json);
        tracker.record(&candidate("zstd", 2.0), &success("zstd", 3.0), ContentType::Json);
        tracker.record(&candidate("lz4", 2.0), &success("lz4", 1.5), ContentType::Binary);

        assert_eq!(tracker.records_for_type(ContentType::Json).len(), 2);
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_record_keeps_baseline_apart_from_prediction() {
        let tracker = AccuracyTracker::new();
        let calibrated = CompressionCandidate {
            predicted_ratio: 6.0,
            predicted_time_ms: 4.0,
            baseline_ratio: 2.0,
            baseline_time_ms: 0.5,
            ..candidate("gzip", 2.0)
        };
        let record = tracker
            .record(&calibrated, &success("gzip", 6.0), ContentType::Text)
            .unwrap();
        assert_eq!(record.predicted_ratio, 6.0);
        assert_eq!(record.baseline_ratio, 2.0);
        assert_eq!(record.baseline_time_ms, 0.5);
    }

    #[test]
    fn test_lookup_is_keyed() {
        let tracker = AccuracyTracker::new();
        tracker.record(&candidate("gzip", 2.0), &success("gzip", 2.0), ContentType::Json);
        tracker.record(&candidate("gzip", 2.0), &success("gzip", 3.0), ContentType::Json);
        tracker.record(&candidate("zstd", 2.0), &success("zstd", 3.0), ContentType::Json);
        tracker.record(&candidate("gzip", 2.0), &success("gzip", 1.5), ContentType::Binary);

        let ratios = tracker.with_records("gzip", ContentType::Json, |records| {
            records.iter().map(|r| r.actual_ratio).collect::<Vec<_>>()
        });
        assert_eq!(ratios, vec![2.0, 3.0]);
        assert_eq!(tracker.with_records("lz4", ContentType::Json, |r| r.len()), 0);

        let snapshot = tracker.snapshot();
        let from_slice = snapshot
            .as_slice()
            .with_records("gzip", ContentType::Json, |r| r.len());
        assert_eq!(from_slice, 2);
    }

    #[test]
    fn test_legacy_record_without_baseline_loads() {
        let legacy = serde_json::json!({
            "algorithm_id": "gzip",
            "detected_type": "text",
            "predicted_ratio": 2.0,
            "actual_ratio": 3.0,
            "predicted_time_ms": 1.0,
            "actual_time_ms": 2.0,
            "timestamp": "2025-01-01T00:00:00Z",
        });
        let record: AccuracyRecord = serde_json::from_value(legacy).unwrap();
        assert_eq!(record.baseline_ratio, 0.0);
    }

    #[test]
    fn test_stats() {
        let tracker = AccuracyTracker::new();
        tracker.record(&candidate("gzip", 2.0), &success("gzip", 4.0), ContentType::Text);
        tracker.record(&candidate("gzip", 4.0), &success("gzip", 4.0), ContentType::Text);
        tracker.record(&candidate("zstd", 1.0), &success("zstd", 1.0), ContentType::Text);

        let gzip = tracker.stats(Some("gzip"), None);
        assert_eq!(gzip.count, 2);
        assert!((gzip.mean_ratio_error - 1.0).abs() < 1e-9);
        assert!((gzip.mean_abs_percent_error - 25.0).abs() < 1e-9);
        assert!((gzip.mean_ratio_factor - 1.5).abs() < 1e-9);

        assert_eq!(tracker.stats(None, Some(ContentType::Text)).count, 3);
        assert_eq!(tracker.stats(None, Some(ContentType::Xml)), AccuracyStats::default());
    }

    #[test]
    fn test_concurrent_appends() {
        let tracker = Arc::new(AccuracyTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        tracker.record(
                            &candidate("zstd", 2.0),
                            &success("zstd", 2.5),
                            ContentType::Mixed,
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.query("zstd", ContentType::Mixed).len(), 200);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history").join("accuracy.jsonl");

        let tracker = AccuracyTracker::new();
        tracker.record(&candidate("gzip", 2.0), &success("gzip", 4.0), ContentType::Text);
        tracker.record(&candidate("lzma", 5.0), &success("lzma", 6.0), ContentType::Xml);
        tracker.save_to(&path).unwrap();

        let loaded = AccuracyTracker::load_from(&path).unwrap();
        assert_eq!(loaded.snapshot(), tracker.snapshot());
    }

    #[test]
    fn test_load_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();
        assert!(matches!(
            AccuracyTracker::load_from(&path),
            Err(crate::EngineError::Serialization(_))
        ));
    }
}
