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

//! Configuration schema
//!
//! Every section is optional in a file; missing sections and fields take the
//! defaults below.

use serde::{Deserialize, Serialize};

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Recommendation tuning
    pub engine: EngineConfig,

    /// Benchmark comparator settings
    pub benchmark: BenchmarkConfig,

    /// Accuracy history settings
    pub tracker: TrackerConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Logging and metrics
    pub observability: ObservabilityConfig,
}

/// Recommendation tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Affinity credit for content types an algorithm is not tuned for (0.0 to 1.0)
    #[serde(default = "default_affinity_baseline")]
    pub affinity_baseline: f64,

    /// Candidates below this confidence are dropped (0.0 to 1.0)
    #[serde(default)]
    pub min_confidence: f64,

    /// History records needed before predictions are calibrated
    #[serde(default = "default_min_history")]
    pub min_history: usize,

    /// Weight of historical accuracy in confidence (0.0 to 1.0)
    #[serde(default = "default_calibration_weight")]
    pub calibration_weight: f64,

    /// Algorithm used when no candidate qualifies
    #[serde(default = "default_fallback_algorithm")]
    pub fallback_algorithm: String,

    /// Level used with the fallback algorithm
    #[serde(default = "default_fallback_level")]
    pub fallback_level: i32,

    /// Keep at most this many candidates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_candidates: Option<usize>,
}

/// Benchmark comparator settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    /// Worker thread cap (0 = one per core)
    #[serde(default)]
    pub max_workers: usize,

    /// Give up on algorithms still running after this many milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Accuracy history settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackerConfig {
    /// JSON-lines file the history is loaded from and saved to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_path: Option<String>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body (in bytes)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Allow cross-origin requests
    #[serde(default)]
    pub cors_enabled: bool,
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Expose Prometheus metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_affinity_baseline() -> f64 {
    0.4
}

fn default_min_history() -> usize {
    5
}

fn default_calibration_weight() -> f64 {
    0.5
}

fn default_fallback_algorithm() -> String {
    "gzip".to_string()
}

fn default_fallback_level() -> i32 {
    6
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024 // 16MB
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            affinity_baseline: default_affinity_baseline(),
            min_confidence: 0.0,
            min_history: default_min_history(),
            calibration_weight: default_calibration_weight(),
            fallback_algorithm: default_fallback_algorithm(),
            fallback_level: default_fallback_level(),
            max_candidates: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            cors_enabled: false,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        ObservabilityConfig {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_enabled: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.fallback_algorithm, "gzip");
        assert_eq!(config.engine.fallback_level, 6);
        assert_eq!(config.engine.min_history, 5);
        assert_eq!(config.server.bind_addr(), "127.0.0.1:8080");
        assert!(config.tracker.history_path.is_none());
    }

    #[test]
    fn test_partial_section_uses_field_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"engine": {"min_confidence": 0.3}}"#).unwrap();
        assert_eq!(config.engine.min_confidence, 0.3);
        assert_eq!(config.engine.affinity_baseline, 0.4);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.benchmark.timeout_ms = Some(2500);
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
