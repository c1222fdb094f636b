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

use anyhow::{bail, Result};
use clap::Parser;
use indicatif::HumanBytes;
use ratiolab_engine::{CompressionCandidate, CompressionResult, ContentProfile};
use serde::Serialize;
use std::path::PathBuf;

use super::{compressed_path, read_input, write_output, Context};
use crate::output;

/// Compress a file with a chosen or recommended algorithm
#[derive(Parser, Debug)]
pub struct CompressCmd {
    /// File to compress
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Algorithm id, or "auto" for the top recommendation
    #[arg(short, long, value_name = "ALGO", default_value = "auto")]
    pub algorithm: String,

    /// Compression level (defaults to the algorithm's default; ignored for auto)
    #[arg(short, long, value_name = "LEVEL", allow_negative_numbers = true)]
    pub level: Option<i32>,

    /// Output path (defaults to FILE plus the algorithm's extension)
    #[arg(short, long, value_name = "OUT")]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct CompressReport<'a> {
    output: PathBuf,
    profile: &'a ContentProfile,
    candidate: &'a CompressionCandidate,
    result: &'a CompressionResult,
}

impl CompressCmd {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let content = read_input(&self.file).await?;
        let engine = ctx.engine()?;

        let algorithm = match self.algorithm.as_str() {
            "auto" => None,
            id => Some(id),
        };
        if algorithm.is_none() && self.level.is_some() && ctx.human() {
            output::warning("--level is ignored with --algorithm auto");
        }

        let outcome = engine.compress(&content, algorithm, self.level)?;
        let result = &outcome.execution.result;
        if let Some(error) = &result.error {
            bail!("{} failed: {}", result.algorithm_id, error);
        }

        let path = self
            .output
            .clone()
            .unwrap_or_else(|| compressed_path(&self.file, &result.algorithm_id));
        write_output(&path, &outcome.execution.compressed).await?;
        ctx.save_history(&engine)?;

        if ctx.json {
            return output::json(&CompressReport {
                output: path,
                profile: &outcome.profile,
                candidate: &outcome.candidate,
                result,
            });
        }
        if ctx.quiet {
            return Ok(());
        }

        output::success(&format!(
            "Compressed {} to {}",
            self.file.display(),
            path.display()
        ));
        output::detail(
            "Algorithm",
            &format!("{} (level {})", result.algorithm_id, result.parameters.level),
        );
        output::detail("Content", outcome.profile.detected_type.as_str());
        output::detail("Original", &HumanBytes(result.original_size).to_string());
        output::detail("Compressed", &HumanBytes(result.compressed_size).to_string());
        output::detail("Ratio", &output::ratio(result.ratio));
        output::detail("Saved", &format!("{:.1}%", result.space_saved_percent()));
        output::detail("Time", &output::millis(result.duration_ms));
        output::detail("Throughput", &format!("{:.1} MB/s", result.throughput_mbps));
        if algorithm.is_none() {
            output::detail(
                "Confidence",
                &format!("{:.3}", outcome.candidate.confidence),
            );
        }
        output::detail(
            "Predicted ratio",
            &format!("{:.3}", outcome.candidate.predicted_ratio),
        );

        Ok(())
    }
}
