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

use crate::error::{ConfigError, ConfigResult};
use crate::schema::*;

/// Validator for configuration settings
pub trait Validator {
    /// Check the settings, returning the first problem found
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.engine.validate()?;
        self.benchmark.validate()?;
        self.tracker.validate()?;
        self.server.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl Validator for EngineConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_unit_interval("engine.affinity_baseline", self.affinity_baseline)?;
        check_unit_interval("engine.min_confidence", self.min_confidence)?;
        check_unit_interval("engine.calibration_weight", self.calibration_weight)?;

        if self.min_history == 0 {
            return Err(ConfigError::invalid_value(
                "engine.min_history",
                "must be at least 1",
            ));
        }

        if self.fallback_algorithm.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "engine.fallback_algorithm".to_string(),
            ));
        }

        if self.max_candidates == Some(0) {
            return Err(ConfigError::invalid_value(
                "engine.max_candidates",
                "must be at least 1 when set",
            ));
        }

        Ok(())
    }
}

impl Validator for BenchmarkConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "benchmark.timeout_ms",
                "must be greater than 0 when set",
            ));
        }
        Ok(())
    }
}

impl Validator for TrackerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(path) = &self.history_path {
            if path.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "tracker.history_path",
                    "must not be empty when set",
                ));
            }
        }
        Ok(())
    }
}

impl Validator for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.host.is_empty() {
            return Err(ConfigError::MissingRequired("server.host".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "server.port",
                format!("port must be between 1 and 65535, got {}", self.port),
            ));
        }

        if self.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        Ok(())
    }
}

fn check_unit_interval(field: &str, value: f64) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be between 0.0 and 1.0, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_engine_ranges() {
        let mut engine = EngineConfig {
            min_confidence: 1.2,
            ..Default::default()
        };
        assert!(engine.validate().is_err());

        engine.min_confidence = 0.5;
        engine.calibration_weight = -0.1;
        assert!(engine.validate().is_err());

        engine.calibration_weight = 0.5;
        engine.min_history = 0;
        assert!(engine.validate().is_err());

        engine.min_history = 3;
        engine.max_candidates = Some(0);
        assert!(engine.validate().is_err());

        engine.max_candidates = Some(2);
        assert!(engine.validate().is_ok());
    }

    #[test]
    fn test_fallback_required() {
        let engine = EngineConfig {
            fallback_algorithm: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            engine.validate(),
            Err(ConfigError::MissingRequired(field)) if field == "engine.fallback_algorithm"
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let benchmark = BenchmarkConfig {
            max_workers: 2,
            timeout_ms: Some(0),
        };
        assert!(benchmark.validate().is_err());
    }

    #[test]
    fn test_server_validation() {
        let mut server = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(server.validate().is_err());

        server.port = 9000;
        server.max_body_bytes = 0;
        assert!(server.validate().is_err());
    }

    #[test]
    fn test_invalid_log_settings() {
        let mut observability = ObservabilityConfig {
            log_level: "invalid_level".to_string(),
            ..Default::default()
        };
        assert!(observability.validate().is_err());

        observability.log_level = "DEBUG".to_string();
        observability.log_format = "xml".to_string();
        assert!(observability.validate().is_err());

        observability.log_format = "json".to_string();
        assert!(observability.validate().is_ok());
    }

    #[test]
    fn test_empty_history_path_rejected() {
        let tracker = TrackerConfig {
            history_path: Some(String::new()),
        };
        assert!(tracker.validate().is_err());
    }
}
