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

//! Prometheus metrics for engine runs and HTTP requests

use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use ratiolab_engine::CompressionResult;
use std::fmt;
use std::sync::Arc;

/// Metrics registry shared by all handlers
///
/// Cheap to clone; every clone feeds the same Prometheus registry.
#[derive(Clone)]
pub struct ServerMetrics {
    inner: Arc<ServerMetricsInner>,
}

struct ServerMetricsInner {
    registry: Registry,

    /// HTTP requests by route and status
    requests_total: CounterVec,

    /// Compression runs by algorithm and outcome
    runs_total: CounterVec,
    /// Original bytes fed to each algorithm
    original_bytes: CounterVec,
    /// Compressed bytes produced by each algorithm
    compressed_bytes: CounterVec,
    /// Last observed ratio per algorithm
    compression_ratio: GaugeVec,
    /// Compression wall time
    run_duration: HistogramVec,

    /// Records held by the accuracy tracker
    tracker_records: Gauge,
}

impl ServerMetrics {
    /// Create and register every metric
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("ratiolab_requests_total", "HTTP requests handled"),
            &["route", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let runs_total = CounterVec::new(
            Opts::new("ratiolab_runs_total", "Compression runs by outcome"),
            &["algorithm", "status"],
        )?;
        registry.register(Box::new(runs_total.clone()))?;

        let original_bytes = CounterVec::new(
            Opts::new(
                "ratiolab_original_bytes_total",
                "Original bytes before compression",
            ),
            &["algorithm"],
        )?;
        registry.register(Box::new(original_bytes.clone()))?;

        let compressed_bytes = CounterVec::new(
            Opts::new("ratiolab_compressed_bytes_total", "Compressed bytes"),
            &["algorithm"],
        )?;
        registry.register(Box::new(compressed_bytes.clone()))?;

        let compression_ratio = GaugeVec::new(
            Opts::new(
                "ratiolab_compression_ratio",
                "Last compression ratio by algorithm (original / compressed)",
            ),
            &["algorithm"],
        )?;
        registry.register(Box::new(compression_ratio.clone()))?;

        let run_duration = HistogramVec::new(
            HistogramOpts::new(
                "ratiolab_run_duration_seconds",
                "Compression duration in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
            &["algorithm"],
        )?;
        registry.register(Box::new(run_duration.clone()))?;

        let tracker_records = Gauge::with_opts(Opts::new(
            "ratiolab_tracker_records",
            "Accuracy records held in memory",
        ))?;
        registry.register(Box::new(tracker_records.clone()))?;

        Ok(Self {
            inner: Arc::new(ServerMetricsInner {
                registry,
                requests_total,
                runs_total,
                original_bytes,
                compressed_bytes,
                compression_ratio,
                run_duration,
                tracker_records,
            }),
        })
    }

    /// Underlying Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Count one HTTP request
    pub fn record_request(&self, route: &str, status: u16) {
        self.inner
            .requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Record the outcome of one compression run
    ///
    /// Failed runs only bump the failure counter.
    pub fn record_result(&self, result: &CompressionResult) {
        let algorithm = result.algorithm_id.as_str();

        if !result.is_success() {
            self.inner
                .runs_total
                .with_label_values(&[algorithm, "failure"])
                .inc();
            return;
        }

        self.inner
            .runs_total
            .with_label_values(&[algorithm, "success"])
            .inc();
        self.inner
            .original_bytes
            .with_label_values(&[algorithm])
            .inc_by(result.original_size as f64);
        self.inner
            .compressed_bytes
            .with_label_values(&[algorithm])
            .inc_by(result.compressed_size as f64);
        if let Some(ratio) = result.ratio {
            self.inner
                .compression_ratio
                .with_label_values(&[algorithm])
                .set(ratio);
        }
        self.inner
            .run_duration
            .with_label_values(&[algorithm])
            .observe(result.duration_ms / 1000.0);
    }

    /// Publish the tracker size
    pub fn set_tracker_records(&self, count: usize) {
        self.inner.tracker_records.set(count as f64);
    }

    /// Encode every metric in the Prometheus text format
    ///
    /// Returns the content type together with the body.
    pub fn encode(&self) -> prometheus::Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.inner.registry.gather(), &mut buffer)?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}

impl fmt::Debug for ServerMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerMetrics").finish_non_exhaustive()
    }
}
