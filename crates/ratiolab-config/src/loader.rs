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
use crate::validation::Validator;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "RATIOLAB_";

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "ratiolab.toml";

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML
    Toml,
    /// YAML
    Yaml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).await?;

        info!(
            "Loaded {} configuration file: {}",
            format.name(),
            path.display()
        );

        self.load_from_string(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config: Config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };

        debug!("Configuration loaded from {}", format.name());

        if self.validate {
            config.validate()?;
        }

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub async fn load_with_overrides<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let mut config = self.load_file(path).await?;
        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Resolve the effective configuration
    ///
    /// Uses `path` when given, otherwise [`DEFAULT_CONFIG_FILE`] if it exists in
    /// the working directory, otherwise defaults. Environment overrides are
    /// applied last in every case.
    pub async fn load_or_default(&self, path: Option<&Path>) -> ConfigResult<Config> {
        if let Some(path) = path {
            return self.load_with_overrides(path).await;
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fs::try_exists(fallback).await.unwrap_or(false) {
            return self.load_with_overrides(fallback).await;
        }

        debug!("No configuration file, using defaults");
        let mut config = Config::default();
        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Merge multiple configuration files
    ///
    /// Later files take precedence section by section: a section that differs
    /// from its defaults replaces the one merged so far.
    pub async fn load_and_merge<P: AsRef<Path>>(&self, paths: &[P]) -> ConfigResult<Config> {
        let Some((first, rest)) = paths.split_first() else {
            return Err(ConfigError::validation_error(
                "at least one configuration file must be provided",
            ));
        };

        let loader = ConfigLoader::without_validation();
        let mut merged = loader.load_file(first).await?;

        for path in rest {
            let config = loader.load_file(path).await?;
            merge_configs(&mut merged, &config);
        }

        if self.validate {
            merged.validate()?;
        }

        Ok(merged)
    }

    /// Apply `RATIOLAB_*` environment variable overrides
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        self.apply_overrides_from(config, |name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides_from<F>(&self, config: &mut Config, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let name = format!("{}{}", ENV_PREFIX, suffix);
            lookup(&name).map(|value| (name, value))
        };

        // Engine settings
        if let Some((name, value)) = var("AFFINITY_BASELINE") {
            config.engine.affinity_baseline = parse(&name, &value, "expected a number")?;
        }
        if let Some((name, value)) = var("MIN_CONFIDENCE") {
            config.engine.min_confidence = parse(&name, &value, "expected a number")?;
        }
        if let Some((name, value)) = var("MIN_HISTORY") {
            config.engine.min_history = parse(&name, &value, "expected valid integer")?;
        }
        if let Some((_, value)) = var("FALLBACK_ALGORITHM") {
            config.engine.fallback_algorithm = value;
        }
        if let Some((name, value)) = var("FALLBACK_LEVEL") {
            config.engine.fallback_level = parse(&name, &value, "expected valid integer")?;
        }
        if let Some((name, value)) = var("MAX_CANDIDATES") {
            config.engine.max_candidates = Some(parse(&name, &value, "expected valid integer")?);
        }

        // Benchmark settings
        if let Some((name, value)) = var("MAX_WORKERS") {
            config.benchmark.max_workers = parse(&name, &value, "expected valid integer")?;
        }
        if let Some((name, value)) = var("BENCHMARK_TIMEOUT_MS") {
            config.benchmark.timeout_ms = Some(parse(&name, &value, "expected milliseconds")?);
        }

        // Tracker settings
        if let Some((_, value)) = var("HISTORY_PATH") {
            config.tracker.history_path = Some(value);
        }

        // Server settings
        if let Some((_, value)) = var("SERVER_HOST") {
            config.server.host = value;
        }
        if let Some((name, value)) = var("SERVER_PORT") {
            config.server.port =
                parse(&name, &value, "expected valid port number (1-65535)")?;
        }
        if let Some((name, value)) = var("MAX_BODY_BYTES") {
            config.server.max_body_bytes = parse(&name, &value, "expected valid integer")?;
        }
        if let Some((name, value)) = var("CORS_ENABLED") {
            config.server.cors_enabled = parse_bool(&name, &value)?;
        }

        // Observability settings
        if let Some((_, value)) = var("LOG_LEVEL") {
            config.observability.log_level = value;
        }
        if let Some((_, value)) = var("LOG_FORMAT") {
            config.observability.log_format = value;
        }
        if let Some((name, value)) = var("METRICS_ENABLED") {
            config.observability.metrics_enabled = parse_bool(&name, &value)?;
        }

        if self.validate {
            config.validate()?;
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge second config into first (second takes precedence)
fn merge_configs(base: &mut Config, overlay: &Config) {
    if overlay.engine != EngineConfig::default() {
        base.engine = overlay.engine.clone();
    }
    if overlay.benchmark != BenchmarkConfig::default() {
        base.benchmark = overlay.benchmark.clone();
    }
    if overlay.tracker.history_path.is_some() {
        base.tracker.history_path.clone_from(&overlay.tracker.history_path);
    }
    if overlay.server != ServerConfig::default() {
        base.server = overlay.server.clone();
    }
    if overlay.observability != ObservabilityConfig::default() {
        base.observability = overlay.observability.clone();
    }
}

fn parse<T: std::str::FromStr>(name: &str, value: &str, reason: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_var_parsing_error(name, value, reason))
}

/// Parse boolean from string (accepts: true, false, yes, no, 1, 0, on, off)
fn parse_bool(name: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::env_var_parsing_error(
            name,
            value,
            "expected 'true', 'false', 'yes', 'no', '1', '0', 'on', or 'off'",
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path("config.toml").unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("config.yaml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("config.yml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("config.json").unwrap(), ConfigFormat::Json);
    }

    #[test]
    fn test_format_detection_error() {
        assert!(matches!(
            ConfigFormat::from_path("config.xml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ConfigFormat::from_path("config"),
            Err(ConfigError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_parse_bool() {
        for yes in ["true", "yes", "1", "on", "TRUE"] {
            assert!(parse_bool("X", yes).unwrap());
        }
        for no in ["false", "no", "0", "off"] {
            assert!(!parse_bool("X", no).unwrap());
        }
        assert!(parse_bool("X", "invalid").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
        [engine]
        min_confidence = 0.25
        fallback_algorithm = "zstd"
        fallback_level = 3

        [benchmark]
        max_workers = 2
        timeout_ms = 5000

        [server]
        port = 9090
        "#;
        let config = ConfigLoader::new()
            .load_from_string(toml, ConfigFormat::Toml)
            .unwrap();
        assert_eq!(config.engine.fallback_algorithm, "zstd");
        assert_eq!(config.benchmark.timeout_ms, Some(5000));
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "observability:\n  log_level: debug\n  log_format: json\n\
                    tracker:\n  history_path: /tmp/h.jsonl\n";
        let config = ConfigLoader::new()
            .load_from_string(yaml, ConfigFormat::Yaml)
            .unwrap();
        assert_eq!(config.observability.log_format, "json");
        assert_eq!(config.tracker.history_path.as_deref(), Some("/tmp/h.jsonl"));
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"engine": {"max_candidates": 3}}"#;
        let config = ConfigLoader::new()
            .load_from_string(json, ConfigFormat::Json)
            .unwrap();
        assert_eq!(config.engine.max_candidates, Some(3));
    }

    #[test]
    fn test_validation_toggle() {
        let json = r#"{"engine": {"min_confidence": 4.0}}"#;
        assert!(ConfigLoader::new()
            .load_from_string(json, ConfigFormat::Json)
            .is_err());
        assert!(ConfigLoader::without_validation()
            .load_from_string(json, ConfigFormat::Json)
            .is_ok());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        ConfigLoader::new()
            .apply_overrides_from(
                &mut config,
                lookup(&[
                    ("RATIOLAB_SERVER_PORT", "9999"),
                    ("RATIOLAB_LOG_FORMAT", "json"),
                    ("RATIOLAB_METRICS_ENABLED", "off"),
                    ("RATIOLAB_BENCHMARK_TIMEOUT_MS", "750"),
                    ("RATIOLAB_HISTORY_PATH", "history.jsonl"),
                ]),
            )
            .unwrap();

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.observability.log_format, "json");
        assert!(!config.observability.metrics_enabled);
        assert_eq!(config.benchmark.timeout_ms, Some(750));
        assert_eq!(config.tracker.history_path.as_deref(), Some("history.jsonl"));
    }

    #[test]
    fn test_override_parse_error() {
        let mut config = Config::default();
        let err = ConfigLoader::new()
            .apply_overrides_from(&mut config, lookup(&[("RATIOLAB_SERVER_PORT", "http")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParsingError { ref variable_name, .. }
                if variable_name == "RATIOLAB_SERVER_PORT"
        ));
    }

    #[test]
    fn test_override_validated() {
        let mut config = Config::default();
        assert!(ConfigLoader::new()
            .apply_overrides_from(&mut config, lookup(&[("RATIOLAB_MIN_CONFIDENCE", "7")]))
            .is_err());
    }

    #[test]
    fn test_merge_configs() {
        let mut base = Config::default();
        base.server.port = 7000;
        base.tracker.history_path = Some("base.jsonl".to_string());

        let mut overlay = Config::default();
        overlay.engine.min_history = 10;

        merge_configs(&mut base, &overlay);
        assert_eq!(base.engine.min_history, 10);
        assert_eq!(base.server.port, 7000);
        assert_eq!(base.tracker.history_path.as_deref(), Some("base.jsonl"));
    }
}
