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

//! Logging initialization and setup.

use crate::config::{LogConfig, LogError, LogFormat, LogOutput};
use std::io;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Initialize tracing with the specified format and optional log level.
///
/// If `level` is None, `RUST_LOG` is consulted, then `info`.
///
/// # Example
///
/// ```ignore
/// use ratiolab_observability::{init_tracing, LogFormat};
///
/// fn main() {
///     init_tracing(LogFormat::Pretty, Some("debug")).unwrap();
///     tracing::info!("Application started");
/// }
/// ```
pub fn init_tracing(format: LogFormat, level: Option<&str>) -> Result<(), LogError> {
    let mut config = LogConfig::new().with_format(format);
    if let Some(level) = level {
        config = config.with_level(level);
    }
    init_tracing_with_config(config)
}

/// Initialize tracing with a detailed configuration.
///
/// Fails with [`LogError::AlreadyInitialized`] if a global subscriber is
/// already set.
pub fn init_tracing_with_config(config: LogConfig) -> Result<(), LogError> {
    let env_filter = build_env_filter(&config)?;
    let writer = get_writer(config.output);

    let layer = match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(config.include_targets)
                .with_thread_names(config.include_thread_names)
                .with_ansi(config.use_color)
                .pretty();
            if config.use_timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(config.include_targets)
                .with_thread_names(config.include_thread_names)
                .with_ansi(config.use_color)
                .compact();
            if config.use_timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(writer)
                .json()
                .with_target(config.include_targets)
                .with_thread_names(config.include_thread_names)
                .with_span_events(FmtSpan::CLOSE);
            if config.use_timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
    };

    Registry::default()
        .with(layer.with_filter(env_filter))
        .try_init()
        .map_err(|e| LogError::AlreadyInitialized(e.to_string()))
}

/// Get the writer for the specified output
fn get_writer(output: LogOutput) -> fn() -> Box<dyn io::Write + Send> {
    match output {
        LogOutput::Stderr => || Box::new(io::stderr()),
        LogOutput::Stdout => || Box::new(io::stdout()),
    }
}

/// Build an environment filter for the given configuration
pub fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let level_str = config.get_effective_level();

    EnvFilter::try_new(&level_str).map_err(|e| LogError::InvalidFilter {
        filter: level_str.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Global subscriber installation is covered by the integration tests,
    // which run in their own process.

    #[test]
    fn test_env_filter_parsing() {
        assert!(build_env_filter(&LogConfig::new().with_level("debug")).is_ok());
        let directives = LogConfig::new().with_level("ratiolab_engine=trace,warn");
        assert!(build_env_filter(&directives).is_ok());
    }

    #[test]
    fn test_invalid_filter() {
        let result = build_env_filter(&LogConfig::new().with_level("ratiolab=[{bogus"));
        assert!(matches!(result, Err(LogError::InvalidFilter { .. })));
    }
}
