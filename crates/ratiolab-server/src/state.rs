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

use ratiolab_config::Config;
use ratiolab_engine::CompressionEngine;
use std::path::PathBuf;

use crate::metrics::ServerMetrics;

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    /// Compression engine; every request runs against the same tracker
    pub engine: CompressionEngine,

    /// Prometheus metrics
    pub metrics: ServerMetrics,

    /// Whether `/metrics` is served
    pub metrics_enabled: bool,

    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,

    /// Whether permissive CORS headers are added
    pub cors_enabled: bool,

    /// Where accuracy history is persisted on shutdown
    pub history_path: Option<PathBuf>,
}

impl AppState {
    /// Create state from an engine and the loaded configuration
    pub fn new(engine: CompressionEngine, config: &Config) -> prometheus::Result<Self> {
        let metrics = ServerMetrics::new()?;
        metrics.set_tracker_records(engine.tracker().len());

        Ok(Self {
            engine,
            metrics,
            metrics_enabled: config.observability.metrics_enabled,
            max_body_bytes: config.server.max_body_bytes,
            cors_enabled: config.server.cors_enabled,
            history_path: config.tracker.history_path.as_ref().map(PathBuf::from),
        })
    }

    /// Refresh gauges that mirror engine state
    pub fn sync_gauges(&self) {
        self.metrics.set_tracker_records(self.engine.tracker().len());
    }
}
