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

//! Structured logging for RatioLab
//!
//! Thin setup layer over `tracing-subscriber` shared by the CLI and the
//! server. Library crates only depend on `tracing` and never install a
//! subscriber themselves.
//!
//! # Example
//!
//! ```ignore
//! use ratiolab_observability::{init_tracing, LogFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_tracing(LogFormat::Compact, None)?;
//!     tracing::info!("Application started");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{build_env_filter, init_tracing, init_tracing_with_config};
