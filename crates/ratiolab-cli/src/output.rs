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

//! Shared output formatting utilities for CLI commands.
//!
//! Human-readable lines go to stdout with a colored emoji prefix; errors go
//! to stderr. With `--json` commands print a single JSON document instead.

use anyhow::Result;
use console::style;
use serde::Serialize;

/// Print a success message with green checkmark emoji.
pub fn success(msg: &str) {
    println!("{} {}", style("✅").green().bold(), msg);
}

/// Print an error message to stderr with red X emoji.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("❌").red().bold(), msg);
}

/// Print an informational message with cyan info emoji.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ️").cyan(), msg);
}

/// Print a warning message with yellow warning emoji.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠️").yellow(), msg);
}

/// Print a detail line with key-value formatting.
///
/// ```text
///   Algorithm: zstd
///   Ratio: 0.312
/// ```
pub fn detail(key: &str, value: &str) {
    println!("  {}: {}", key, style(value).cyan());
}

/// Print a header message with package emoji (for RatioLab branding).
pub fn header(msg: &str) {
    println!("{} {}", style("📦").green().bold(), msg);
}

/// Pretty-print a value as JSON on stdout.
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a ratio, or `-` when undefined.
pub fn ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "-".to_string(), |r| format!("{:.3}", r))
}

/// Format a duration in milliseconds.
pub fn millis(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.3} ms", ms)
    } else {
        format!("{:.1} ms", ms)
    }
}
