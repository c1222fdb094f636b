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

//! Recommendation engine
//!
//! Scores every registered algorithm against a [`ContentProfile`]:
//!
//! - **Affinity**: full credit when the detected content type is one of the
//!   algorithm's affinities, a configurable baseline otherwise
//! - **Trade-off**: large compressible inputs weight ratio merit, small or
//!   incompressible inputs weight speed merit
//! - **Calibration**: with enough accuracy history for an
//!   `(algorithm, content type)` pair, predictions are rescaled by the mean
//!   observed error and confidence drifts towards how well past predictions held.
//!   Errors are measured against the uncalibrated baseline, so repeated runs
//!   converge on the observed ratio

use crate::analyzer::{ContentProfile, SizeClass};
use crate::error::{EngineError, EngineResult};
use crate::registry::{AlgorithmRegistry, AlgorithmSpec};
use crate::tracker::{AccuracyRecord, HistoryLookup};
use crate::CompressionParameters;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Tunables for the recommender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderSettings {
    /// Affinity credit for content types an algorithm is not tuned for
    pub affinity_baseline: f64,
    /// Candidates scoring below this are dropped
    pub min_confidence: f64,
    /// History records needed before calibration applies
    pub min_history: usize,
    /// Blend weight of historical accuracy into confidence
    pub calibration_weight: f64,
    /// Algorithm used when no candidate qualifies
    pub fallback_algorithm: String,
    /// Level used with the fallback algorithm
    pub fallback_level: i32,
    /// Keep at most this many candidates
    pub max_candidates: Option<usize>,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        RecommenderSettings {
            affinity_baseline: 0.4,
            min_confidence: 0.0,
            min_history: 5,
            calibration_weight: 0.5,
            fallback_algorithm: "gzip".to_string(),
            fallback_level: 6,
            max_candidates: None,
        }
    }
}

/// A ranked recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionCandidate {
    /// Registered algorithm id
    pub algorithm_id: String,
    /// Parameters to run it with
    pub parameters: CompressionParameters,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Expected original / compressed ratio
    pub predicted_ratio: f64,
    /// Expected compression time
    pub predicted_time_ms: f64,
    /// Ratio predicted before history calibration
    #[serde(default)]
    pub baseline_ratio: f64,
    /// Time predicted before history calibration
    #[serde(default)]
    pub baseline_time_ms: f64,
}

impl CompressionCandidate {
    /// Ranking order: confidence desc, predicted ratio desc, predicted time asc
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .confidence
            .total_cmp(&self.confidence)
            .then_with(|| other.predicted_ratio.total_cmp(&self.predicted_ratio))
            .then_with(|| self.predicted_time_ms.total_cmp(&other.predicted_time_ms))
    }
}

/// Prediction for one algorithm at one level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Expected ratio
    pub ratio: f64,
    /// Expected compression time in milliseconds
    pub time_ms: f64,
    /// Ratio from the content model alone
    pub baseline_ratio: f64,
    /// Time from the content model alone
    pub baseline_time_ms: f64,
}

/// Recommendation engine
#[derive(Debug, Clone)]
pub struct Recommender {
    registry: Arc<AlgorithmRegistry>,
    settings: RecommenderSettings,
}

impl Recommender {
    /// Create a recommender with default settings
    pub fn new(registry: Arc<AlgorithmRegistry>) -> Self {
        Self::with_settings(registry, RecommenderSettings::default())
    }

    /// Create a recommender with explicit settings
    pub fn with_settings(registry: Arc<AlgorithmRegistry>, settings: RecommenderSettings) -> Self {
        Recommender { registry, settings }
    }

    /// Active settings
    pub fn settings(&self) -> &RecommenderSettings {
        &self.settings
    }

    /// Produce ranked candidates for a profile
    ///
    /// `history` is consulted once per registered algorithm for the
    /// profile's content type. The result is never empty for a non-empty
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyRegistry`] when nothing is registered.
    pub fn recommend<H: HistoryLookup + ?Sized>(
        &self,
        profile: &ContentProfile,
        history: &H,
    ) -> EngineResult<Vec<CompressionCandidate>> {
        if self.registry.is_empty() {
            return Err(EngineError::EmptyRegistry);
        }

        let mut candidates: Vec<CompressionCandidate> = self
            .registry
            .list()
            .into_iter()
            .map(|spec| {
                let level = self.choose_level(profile, spec);
                self.candidate_for(profile, spec, level, history)
            })
            .filter(|candidate| candidate.confidence >= self.settings.min_confidence)
            .collect();

        if candidates.is_empty() {
            let fallback = self.fallback(profile, history)?;
            tracing::debug!(
                algorithm = %fallback.algorithm_id,
                "no candidate met min_confidence, using fallback"
            );
            candidates.push(fallback);
        }

        candidates.sort_by(CompressionCandidate::rank_cmp);

        if let Some(max) = self.settings.max_candidates {
            candidates.truncate(max.max(1));
        }

        tracing::debug!(
            detected_type = %profile.detected_type,
            size = profile.size_bytes,
            top = %candidates[0].algorithm_id,
            count = candidates.len(),
            "recommendation complete"
        );

        Ok(candidates)
    }

    /// Predict ratio, time and confidence for an algorithm at a given level
    pub fn predict<H: HistoryLookup + ?Sized>(
        &self,
        profile: &ContentProfile,
        spec: &AlgorithmSpec,
        level: i32,
        history: &H,
    ) -> Prediction {
        let base = self.base_confidence(profile, spec);
        let position = spec.level_range.position(level);

        let range = spec.typical_ratio_range;
        let baseline_ratio = range.min
            + (range.max - range.min) * profile.compressibility_score * (0.75 + 0.25 * position);

        let size_mb = profile.size_bytes as f64 / BYTES_PER_MB;
        let baseline_time_ms =
            size_mb / spec.speed_class.nominal_throughput_mbps() * 1000.0 * (0.5 + 1.5 * position);

        let mut ratio = baseline_ratio;
        let mut time_ms = baseline_time_ms;
        let mut confidence = base;

        let calibration = history.with_records(&spec.id, profile.detected_type, |records| {
            self.calibration(records)
        });
        if let Some(calibration) = calibration {
            ratio *= calibration.ratio_factor;
            time_ms *= calibration.time_factor;
            let w = self.settings.calibration_weight.clamp(0.0, 1.0);
            let accuracy = 1.0 / (1.0 + calibration.ratio_factor.ln().abs());
            confidence = (1.0 - w) * base + w * accuracy;
        }

        Prediction {
            confidence: confidence.clamp(0.0, 1.0),
            ratio,
            time_ms,
            baseline_ratio,
            baseline_time_ms,
        }
    }

    /// Level chosen for an algorithm: its default, or the fastest level for
    /// large inputs
    pub fn choose_level(&self, profile: &ContentProfile, spec: &AlgorithmSpec) -> i32 {
        match profile.size_class() {
            SizeClass::Large | SizeClass::Huge => spec.level_range.min,
            _ => spec.default_level,
        }
    }

    /// Build a candidate for an algorithm at a given level
    pub fn candidate_for<H: HistoryLookup + ?Sized>(
        &self,
        profile: &ContentProfile,
        spec: &AlgorithmSpec,
        level: i32,
        history: &H,
    ) -> CompressionCandidate {
        let prediction = self.predict(profile, spec, level, history);
        CompressionCandidate {
            algorithm_id: spec.id.clone(),
            parameters: CompressionParameters::new(level),
            confidence: prediction.confidence,
            predicted_ratio: prediction.ratio,
            predicted_time_ms: prediction.time_ms,
            baseline_ratio: prediction.baseline_ratio,
            baseline_time_ms: prediction.baseline_time_ms,
        }
    }

    fn base_confidence(&self, profile: &ContentProfile, spec: &AlgorithmSpec) -> f64 {
        let affinity = if spec.has_affinity(profile.detected_type) {
            1.0
        } else {
            self.settings.affinity_baseline.clamp(0.0, 1.0)
        };

        let size_factor = if profile.size_bytes == 0 {
            0.0
        } else {
            ((profile.size_bytes as f64).log10() / 6.0).clamp(0.0, 1.0)
        };
        let ratio_weight = (profile.compressibility_score * size_factor).clamp(0.0, 1.0);

        let best_ratio = self
            .registry
            .list()
            .iter()
            .map(|s| s.typical_ratio_range.max)
            .fold(f64::MIN_POSITIVE, f64::max);
        let ratio_merit = (spec.typical_ratio_range.max / best_ratio).clamp(0.0, 1.0);
        let speed_merit = spec.speed_class.speed_merit();

        let merit = ratio_weight * ratio_merit + (1.0 - ratio_weight) * speed_merit;
        (0.5 * affinity + 0.5 * merit).clamp(0.0, 1.0)
    }

    /// Correction factors from records of a single `(algorithm, type)` pair
    fn calibration(&self, records: &[AccuracyRecord]) -> Option<Calibration> {
        if records.len() < self.settings.min_history.max(1) {
            return None;
        }

        let ratio_factor = mean(
            records
                .iter()
                .filter(|r| r.baseline_ratio > 0.0)
                .map(|r| r.actual_ratio / r.baseline_ratio),
        )?;
        if !ratio_factor.is_finite() || ratio_factor <= 0.0 {
            return None;
        }

        let time_factor = mean(
            records
                .iter()
                .filter(|r| r.baseline_time_ms > 0.0)
                .map(|r| r.actual_time_ms / r.baseline_time_ms),
        )
        .filter(|f| f.is_finite() && *f > 0.0)
        .unwrap_or(1.0);

        Some(Calibration {
            ratio_factor,
            time_factor,
        })
    }

    fn fallback<H: HistoryLookup + ?Sized>(
        &self,
        profile: &ContentProfile,
        history: &H,
    ) -> EngineResult<CompressionCandidate> {
        if let Ok(spec) = self.registry.get(&self.settings.fallback_algorithm) {
            let level = if spec.level_range.contains(self.settings.fallback_level) {
                self.settings.fallback_level
            } else {
                spec.default_level
            };
            return Ok(self.candidate_for(profile, spec, level, history));
        }

        let spec = self
            .registry
            .list()
            .into_iter()
            .next()
            .ok_or(EngineError::EmptyRegistry)?;
        Ok(self.candidate_for(profile, spec, spec.default_level, history))
    }
}

struct Calibration {
    ratio_factor: f64,
    time_factor: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
