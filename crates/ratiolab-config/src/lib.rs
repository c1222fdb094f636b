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

//! Configuration management for RatioLab
//!
//! Layered configuration with support for multiple formats (TOML, YAML, JSON),
//! `RATIOLAB_` environment variable overrides and validation.
//!
//! # Example
//!
//! ```no_run
//! use ratiolab_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = ConfigLoader::new();
//!     let config = loader.load_with_overrides("ratiolab.toml").await?;
//!
//!     println!("Listening on: {}", config.server.bind_addr());
//!     println!("Fallback: {}", config.engine.fallback_algorithm);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

// Re-export commonly used items
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader, DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use schema::*;
pub use validation::Validator;
