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

//! Compression metrics helpers
//!
//! Size and timing arithmetic shared by the executor, the comparator and the
//! adapters, so that every surface reports ratio and throughput the same way.

use std::time::{Duration, Instant};

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Compression ratio (original / compressed, higher is better)
///
/// Undefined when nothing was produced.
pub fn compression_ratio(original_size: u64, compressed_size: u64) -> Option<f64> {
    (compressed_size > 0).then(|| original_size as f64 / compressed_size as f64)
}

/// Space saved as a percentage of the original; negative when output grew
pub fn space_saved_percent(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        0.0
    } else {
        (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0
    }
}

/// Throughput in MB/s; zero when the duration is too short to measure
pub fn throughput_mbps(bytes: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        bytes as f64 / BYTES_PER_MB / seconds
    } else {
        0.0
    }
}

/// Duration as fractional milliseconds
pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Human-readable one-line summary of a run
pub fn summary(
    algorithm: &str,
    original_size: u64,
    compressed_size: u64,
    duration: Duration,
) -> String {
    let ratio = compression_ratio(original_size, compressed_size)
        .map(|r| format!("{:.2}x", r))
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "{}: {} → {} bytes ({:.1}% reduction, {} ratio) in {:.2}ms ({:.1} MB/s)",
        algorithm,
        original_size,
        compressed_size,
        space_saved_percent(original_size, compressed_size),
        ratio,
        duration_ms(duration),
        throughput_mbps(original_size, duration)
    )
}

/// Timer for measuring compression operations
#[derive(Debug, Clone, Copy)]
pub struct CompressionTimer {
    start: Instant,
}

impl CompressionTimer {
    /// Create and start a new timer
    pub fn start() -> Self {
        CompressionTimer {
            start: Instant::now(),
        }
    }

    /// Stop timer and return elapsed duration
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}
