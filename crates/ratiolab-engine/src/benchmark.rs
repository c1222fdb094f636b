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

//! Benchmark comparator
//!
//! Runs the executor for several algorithms over the same content on a
//! bounded rayon pool and collects a [`BenchmarkReport`]. One algorithm
//! failing never aborts the others; it becomes a row with `error` set.

use crate::analyzer::{self, ContentProfile};
use crate::error::{EngineError, EngineResult};
use crate::executor::{CompressionResult, Executor};
use crate::CompressionParameters;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

/// Comparator tunables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparatorSettings {
    /// Upper bound on worker threads; 0 means one per core
    pub max_workers: usize,
    /// Stop waiting for stragglers after this long
    pub timeout: Option<Duration>,
}

/// Side-by-side comparison of algorithms on one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Profile of the compared content
    pub content_profile: ContentProfile,
    /// One row per attempted algorithm, in request order
    pub results: Vec<CompressionResult>,
    /// Index into `results` of the highest-ratio successful run
    pub best_result: Option<usize>,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
}

impl BenchmarkReport {
    fn new(content_profile: ContentProfile, results: Vec<CompressionResult>) -> Self {
        let best_result = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_success())
            .filter_map(|(i, r)| r.ratio.map(|ratio| (i, ratio)))
            .fold(None, |best: Option<(usize, f64)>, (i, ratio)| match best {
                Some((_, top)) if top >= ratio => best,
                _ => Some((i, ratio)),
            })
            .map(|(i, _)| i);

        BenchmarkReport {
            content_profile,
            results,
            best_result,
            generated_at: Utc::now(),
        }
    }

    /// Highest-ratio successful run
    pub fn best(&self) -> Option<&CompressionResult> {
        self.best_result.and_then(|i| self.results.get(i))
    }

    /// Successful runs ordered by ratio desc, then duration asc
    pub fn ranking(&self) -> Vec<&CompressionResult> {
        let mut ranked: Vec<&CompressionResult> =
            self.results.iter().filter(|r| r.is_success()).collect();
        ranked.sort_by(|a, b| {
            b.ratio
                .unwrap_or(0.0)
                .total_cmp(&a.ratio.unwrap_or(0.0))
                .then_with(|| a.duration_ms.total_cmp(&b.duration_ms))
        });
        ranked
    }

    /// Runs that failed
    pub fn failed(&self) -> Vec<&CompressionResult> {
        self.results.iter().filter(|r| !r.is_success()).collect()
    }
}

/// Benchmark comparator
#[derive(Debug, Clone)]
pub struct Comparator {
    executor: Executor,
    settings: ComparatorSettings,
}

impl Comparator {
    /// Create a comparator with default settings
    pub fn new(executor: Executor) -> Self {
        Self::with_settings(executor, ComparatorSettings::default())
    }

    /// Create a comparator with explicit settings
    pub fn with_settings(executor: Executor, settings: ComparatorSettings) -> Self {
        Comparator { executor, settings }
    }

    /// Active settings
    pub fn settings(&self) -> &ComparatorSettings {
        &self.settings
    }

    /// Compare algorithms on `content`
    ///
    /// `None` (or an empty list) compares every registered algorithm. Each
    /// algorithm runs at its default level.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownAlgorithm`] if any requested id is missing,
    /// checked before anything runs.
    pub fn compare(
        &self,
        content: &[u8],
        algorithm_ids: Option<&[String]>,
    ) -> EngineResult<BenchmarkReport> {
        let registry = self.executor.registry();
        let ids: Vec<String> = match algorithm_ids {
            Some(ids) if !ids.is_empty() => ids.to_vec(),
            _ => registry.ids(),
        };

        let jobs = ids
            .iter()
            .map(|id| {
                registry
                    .get(id)
                    .map(|spec| (id.clone(), CompressionParameters::new(spec.default_level)))
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let profile = analyzer::analyze(content);
        let workers = self.worker_count(jobs.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("ratiolab-bench-{}", i))
            .build()
            .map_err(|e| EngineError::runtime("benchmark", e))?;

        tracing::debug!(
            algorithms = jobs.len(),
            workers,
            size = content.len(),
            "starting benchmark"
        );

        let results = match self.settings.timeout {
            None => pool.install(|| {
                jobs.par_iter()
                    .map(|(id, parameters)| run_one(&self.executor, content, id, *parameters))
                    .collect()
            }),
            Some(timeout) => self.run_with_deadline(&pool, content, jobs, timeout),
        };

        let report = BenchmarkReport::new(profile, results);
        match report.best() {
            Some(best) => tracing::info!(
                best = %best.algorithm_id,
                ratio = best.ratio.unwrap_or_default(),
                failed = report.failed().len(),
                "benchmark complete"
            ),
            None => tracing::warn!(
                attempted = report.results.len(),
                "benchmark complete, every algorithm failed"
            ),
        }
        Ok(report)
    }

    fn worker_count(&self, jobs: usize) -> usize {
        let cores = num_cpus::get();
        let limit = if self.settings.max_workers == 0 {
            cores
        } else {
            self.settings.max_workers
        };
        jobs.min(cores).min(limit).max(1)
    }

    fn run_with_deadline(
        &self,
        pool: &rayon::ThreadPool,
        content: &[u8],
        jobs: Vec<(String, CompressionParameters)>,
        timeout: Duration,
    ) -> Vec<CompressionResult> {
        let shared: Arc<[u8]> = Arc::from(content);
        let (tx, rx) = mpsc::channel();

        for (index, (id, parameters)) in jobs.iter().cloned().enumerate() {
            let tx = tx.clone();
            let executor = self.executor.clone();
            let content = Arc::clone(&shared);
            pool.spawn(move || {
                let result = run_one(&executor, &content, &id, parameters);
                // receiver is gone once the deadline passed
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<CompressionResult>> = vec![None; jobs.len()];
        let deadline = Instant::now() + timeout;
        let mut pending = jobs.len();

        while pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((index, result)) => {
                    slots[index] = Some(result);
                    pending -= 1;
                }
                Err(_) => break,
            }
        }

        slots
            .into_iter()
            .zip(jobs)
            .map(|(slot, (id, parameters))| {
                slot.unwrap_or_else(|| {
                    tracing::warn!(algorithm = %id, "benchmark deadline elapsed");
                    CompressionResult::failed(
                        id,
                        parameters,
                        content.len() as u64,
                        EngineError::Timeout.to_string(),
                    )
                })
            })
            .collect()
    }
}

fn run_one(
    executor: &Executor,
    content: &[u8],
    id: &str,
    parameters: CompressionParameters,
) -> CompressionResult {
    executor
        .execute(content, id, parameters)
        .unwrap_or_else(|e| {
            CompressionResult::failed(id, parameters, content.len() as u64, e.to_string())
        })
}
