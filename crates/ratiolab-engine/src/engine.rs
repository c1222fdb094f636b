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

//! Engine facade
//!
//! [`CompressionEngine`] owns one of each component and wires the data flow
//! `analyze → recommend → execute → record` for single compressions and
//! `analyze → compare → record` for benchmarks. Components are injected
//! through [`EngineBuilder`]; nothing is global.

use crate::analyzer::{self, ContentProfile};
use crate::benchmark::{BenchmarkReport, Comparator, ComparatorSettings};
use crate::codec::Codec;
use crate::error::{EngineError, EngineResult};
use crate::executor::{Execution, Executor};
use crate::recommend::{CompressionCandidate, Recommender, RecommenderSettings};
use crate::registry::{AlgorithmRegistry, AlgorithmSpec};
use crate::tracker::{AccuracyRecord, AccuracyTracker};
use std::sync::Arc;

/// Result of [`CompressionEngine::compress`]
#[derive(Debug, Clone)]
pub struct CompressOutcome {
    /// Profile of the input
    pub profile: ContentProfile,
    /// Candidate that was executed, with its predictions
    pub candidate: CompressionCandidate,
    /// Run outcome and compressed bytes
    pub execution: Execution,
    /// Accuracy record, when the run succeeded
    pub record: Option<AccuracyRecord>,
}

/// Builder for [`CompressionEngine`]
#[derive(Debug, Default)]
pub struct EngineBuilder {
    registry: Option<AlgorithmRegistry>,
    extra: Vec<(AlgorithmSpec, Arc<dyn Codec>)>,
    recommender: RecommenderSettings,
    comparator: ComparatorSettings,
    tracker: Option<Arc<AccuracyTracker>>,
}

impl EngineBuilder {
    /// Start from the built-in registry and default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry
    pub fn registry(mut self, registry: AlgorithmRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Register an extra algorithm on top of the registry
    pub fn algorithm(mut self, spec: AlgorithmSpec, codec: Arc<dyn Codec>) -> Self {
        self.extra.push((spec, codec));
        self
    }

    /// Recommender tunables
    pub fn recommender_settings(mut self, settings: RecommenderSettings) -> Self {
        self.recommender = settings;
        self
    }

    /// Comparator tunables
    pub fn comparator_settings(mut self, settings: ComparatorSettings) -> Self {
        self.comparator = settings;
        self
    }

    /// Share an existing tracker (e.g. one loaded from disk)
    pub fn tracker(mut self, tracker: Arc<AccuracyTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Build the engine
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateAlgorithm`] or [`EngineError::InvalidParameter`]
    /// from extra registrations, and [`EngineError::EmptyRegistry`] if no
    /// algorithm remains.
    pub fn build(self) -> EngineResult<CompressionEngine> {
        let mut registry = self.registry.unwrap_or_else(AlgorithmRegistry::with_builtins);
        for (spec, codec) in self.extra {
            registry.register(spec, codec)?;
        }
        if registry.is_empty() {
            return Err(EngineError::EmptyRegistry);
        }

        let registry = Arc::new(registry);
        let executor = Executor::new(Arc::clone(&registry));

        tracing::debug!(algorithms = ?registry.ids(), "compression engine ready");

        Ok(CompressionEngine {
            recommender: Recommender::with_settings(Arc::clone(&registry), self.recommender),
            comparator: Comparator::with_settings(executor.clone(), self.comparator),
            executor,
            tracker: self.tracker.unwrap_or_default(),
            registry,
        })
    }
}

/// Content-adaptive compression engine
#[derive(Debug, Clone)]
pub struct CompressionEngine {
    registry: Arc<AlgorithmRegistry>,
    recommender: Recommender,
    executor: Executor,
    comparator: Comparator,
    tracker: Arc<AccuracyTracker>,
}

impl CompressionEngine {
    /// Engine with every built-in algorithm and default settings
    pub fn new() -> Self {
        let registry = Arc::new(AlgorithmRegistry::with_builtins());
        let executor = Executor::new(Arc::clone(&registry));
        CompressionEngine {
            recommender: Recommender::new(Arc::clone(&registry)),
            comparator: Comparator::new(executor.clone()),
            executor,
            tracker: Arc::new(AccuracyTracker::new()),
            registry,
        }
    }

    /// Start building a customised engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Algorithm catalog
    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Accuracy history
    pub fn tracker(&self) -> &Arc<AccuracyTracker> {
        &self.tracker
    }

    /// Recommendation engine
    pub fn recommender(&self) -> &Recommender {
        &self.recommender
    }

    /// Executor
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Comparator
    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    /// Profile content
    pub fn analyze(&self, content: &[u8]) -> ContentProfile {
        analyzer::analyze(content)
    }

    /// Ranked candidates for a profile, calibrated with tracked history
    pub fn recommend(&self, profile: &ContentProfile) -> EngineResult<Vec<CompressionCandidate>> {
        self.recommender.recommend(profile, self.tracker.as_ref())
    }

    /// Analyze, pick, compress, verify and record
    ///
    /// With `algorithm` of `None` the top recommendation runs with its
    /// recommended level and `level` is ignored. With an explicit algorithm,
    /// `level` defaults to the algorithm's default level.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownAlgorithm`] and [`EngineError::InvalidParameter`]
    /// only; runtime failures are reported in the execution result.
    pub fn compress(
        &self,
        content: &[u8],
        algorithm: Option<&str>,
        level: Option<i32>,
    ) -> EngineResult<CompressOutcome> {
        let profile = self.analyze(content);
        let history = self.tracker.as_ref();

        let candidate = match algorithm {
            None => self
                .recommender
                .recommend(&profile, history)?
                .into_iter()
                .next()
                .ok_or(EngineError::EmptyRegistry)?,
            Some(id) => {
                let spec = self.registry.get(id)?;
                let level = level.unwrap_or(spec.default_level);
                self.recommender.candidate_for(&profile, spec, level, history)
            }
        };

        let execution = self
            .executor
            .run(content, &candidate.algorithm_id, candidate.parameters)?;
        let record = self
            .tracker
            .record(&candidate, &execution.result, profile.detected_type);

        Ok(CompressOutcome {
            profile,
            candidate,
            execution,
            record,
        })
    }

    /// Compare algorithms and record every successful run
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownAlgorithm`] for any unknown requested id.
    pub fn compare(
        &self,
        content: &[u8],
        algorithm_ids: Option<&[String]>,
    ) -> EngineResult<BenchmarkReport> {
        let report = self.comparator.compare(content, algorithm_ids)?;
        let profile = &report.content_profile;
        let history = self.tracker.as_ref();

        for result in report.results.iter().filter(|r| r.is_success()) {
            let spec = self.registry.get(&result.algorithm_id)?;
            let level = result.parameters.level;
            let candidate = self.recommender.candidate_for(profile, spec, level, history);
            self.tracker.record(&candidate, result, profile.detected_type);
        }

        Ok(report)
    }

    /// Decompress data produced by a registered algorithm
    pub fn decompress(&self, algorithm_id: &str, data: &[u8]) -> EngineResult<Vec<u8>> {
        self.executor.decompress(algorithm_id, data)
    }

    /// Identify the algorithm that produced `data`, when its format is tagged
    pub fn detect(&self, data: &[u8]) -> Option<&AlgorithmSpec> {
        self.registry.detect(data)
    }
}

impl Default for CompressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::analyzer::ContentType;

    #[test]
    fn test_compress_auto_records_history() {
        let engine = CompressionEngine::new();
        let data = b"The quick brown fox jumps over the lazy dog. ".repeat(30);

        let outcome = engine.compress(&data, None, None).unwrap();
        assert!(outcome.execution.result.is_success());
        assert!(outcome.record.is_some());
        assert_eq!(engine.tracker().len(), 1);

        let restored = engine
            .decompress(&outcome.candidate.algorithm_id, &outcome.execution.compressed)
            .unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_compress_explicit_algorithm_default_level() {
        let engine = CompressionEngine::new();
        let outcome = engine.compress(b"explicit", Some("bzip2"), None).unwrap();
        assert_eq!(outcome.candidate.algorithm_id, "bzip2");
        assert_eq!(outcome.candidate.parameters.level, 9);
    }

    #[test]
    fn test_compress_unknown_and_invalid() {
        let engine = CompressionEngine::new();
        assert!(engine
            .compress(b"x", Some("made_up_algo"), None)
            .unwrap_err()
            .is_unknown_algorithm());
        assert!(engine
            .compress(b"x", Some("lz4"), Some(99))
            .unwrap_err()
            .is_invalid_parameter());
        assert!(engine.tracker().is_empty());
    }

    #[test]
    fn test_compare_records_successes() {
        let engine = CompressionEngine::new();
        let data = br#"{"id": 1, "name": "user", "tags": ["a", "b"]}"#;
        let report = engine.compare(data, None).unwrap();
        assert_eq!(report.content_profile.detected_type, ContentType::Json);
        assert_eq!(engine.tracker().len(), report.ranking().len());
        assert_eq!(
            engine.tracker().records_for_type(ContentType::Json).len(),
            report.results.len()
        );
    }

    #[test]
    fn test_history_changes_recommendation_confidence() {
        let engine = CompressionEngine::new();
        let data = b"calibrate me please. ".repeat(200);
        let profile = engine.analyze(&data);
        let before = engine.recommend(&profile).unwrap();

        for _ in 0..5 {
            engine.compare(&data, None).unwrap();
        }
        let after = engine.recommend(&profile).unwrap();

        assert_eq!(before.len(), after.len());
        assert_ne!(before, after);
    }

    #[test]
    fn test_repeated_runs_converge_on_observed_ratio() {
        let engine = CompressionEngine::new();
        let data = b"The quick brown fox jumps over the lazy dog. ".repeat(100);
        let min_history = engine.recommender().settings().min_history;

        for run in 0..60 {
            let outcome = engine.compress(&data, Some("gzip"), None).unwrap();
            let actual = outcome.execution.result.ratio.unwrap();
            if run >= min_history {
                let predicted = outcome.candidate.predicted_ratio;
                assert!(
                    (predicted / actual - 1.0).abs() < 0.01,
                    "run {run}: predicted {predicted} vs actual {actual}"
                );
            }
        }
    }

    #[test]
    fn test_builder_empty_registry() {
        let err = CompressionEngine::builder()
            .registry(AlgorithmRegistry::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyRegistry));
    }

    #[test]
    fn test_builder_shares_tracker() {
        let tracker = Arc::new(AccuracyTracker::new());
        let engine = CompressionEngine::builder()
            .tracker(Arc::clone(&tracker))
            .build()
            .unwrap();
        engine.compress(b"shared history", Some("gzip"), None).unwrap();
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_detect() {
        let engine = CompressionEngine::new();
        let outcome = engine.compress(b"detect", Some("lzma"), None).unwrap();
        assert_eq!(
            engine.detect(&outcome.execution.compressed).map(|s| s.id.as_str()),
            Some("lzma")
        );
    }
}
