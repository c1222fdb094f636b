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

// Command modules for the RatioLab CLI
pub mod algorithms;
pub mod analyze;
pub mod compare;
pub mod compress;
pub mod decompress;
pub mod recommend;
pub mod serve;

pub use algorithms::AlgorithmsCmd;
pub use analyze::AnalyzeCmd;
pub use compare::CompareCmd;
pub use compress::CompressCmd;
pub use decompress::DecompressCmd;
pub use recommend::RecommendCmd;
pub use serve::ServeCmd;

use anyhow::{Context as _, Result};
use ratiolab_config::Config;
use ratiolab_engine::CompressionEngine;
use std::path::{Path, PathBuf};

/// Settings shared by every command
#[derive(Debug)]
pub struct Context {
    /// Effective configuration
    pub config: Config,
    /// Print JSON instead of human-readable output
    pub json: bool,
    /// Suppress informational output
    pub quiet: bool,
}

impl Context {
    /// Build the engine, loading tracked history when configured
    pub fn engine(&self) -> Result<CompressionEngine> {
        ratiolab_server::engine_from_config(&self.config)
    }

    /// Persist tracked history when a history path is configured
    pub fn save_history(&self, engine: &CompressionEngine) -> Result<()> {
        if let Some(path) = self.config.tracker.history_path.as_deref() {
            engine
                .tracker()
                .save_to(Path::new(path))
                .with_context(|| format!("Failed to save accuracy history to {}", path))?;
            tracing::debug!(path, records = engine.tracker().len(), "Saved accuracy history");
        }
        Ok(())
    }

    /// Whether human-readable output should be printed
    pub fn human(&self) -> bool {
        !self.json && !self.quiet
    }
}

/// Read an input file
pub async fn read_input(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Write an output file
pub async fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Conventional file extension for an algorithm's output
pub fn extension_for(algorithm: &str) -> &str {
    match algorithm {
        "gzip" => "gz",
        "bzip2" => "bz2",
        "lz4" => "lz4",
        "zstd" => "zst",
        "lzma" => "xz",
        "brotli" => "br",
        other => other,
    }
}

/// Algorithm implied by a file extension
pub fn algorithm_for_extension(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "gz" => Some("gzip"),
        "bz2" => Some("bzip2"),
        "lz4" => Some("lz4"),
        "zst" => Some("zstd"),
        "xz" => Some("lzma"),
        "br" => Some("brotli"),
        _ => None,
    }
}

/// Append the algorithm's extension: `data.txt` becomes `data.txt.zst`
pub fn compressed_path(input: &Path, algorithm: &str) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".");
    name.push(extension_for(algorithm));
    PathBuf::from(name)
}

/// Strip a known extension, or append `.out` when there is none
pub fn decompressed_path(input: &Path) -> PathBuf {
    if algorithm_for_extension(input).is_some() {
        input.with_extension("")
    } else {
        let mut name = input.as_os_str().to_os_string();
        name.push(".out");
        PathBuf::from(name)
    }
}
