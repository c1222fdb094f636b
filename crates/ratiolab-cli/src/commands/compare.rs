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

use anyhow::{Context as _, Result};
use clap::Parser;
use console::style;
use indicatif::HumanBytes;
use std::path::PathBuf;

use super::{read_input, Context};
use crate::{output, progress};

/// Benchmark algorithms side by side on a file
#[derive(Parser, Debug)]
pub struct CompareCmd {
    /// File to benchmark
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Algorithm to include (repeatable; all when omitted)
    #[arg(short, long = "algorithm", value_name = "ALGO")]
    pub algorithms: Vec<String>,
}

impl CompareCmd {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let content = read_input(&self.file).await?;
        let engine = ctx.engine()?;
        let size = content.len() as u64;

        let spinner = progress::spinner(
            &format!("Benchmarking {} ({})", self.file.display(), HumanBytes(size)),
            !ctx.human(),
        );
        let worker = engine.clone();
        let algorithms = self.algorithms.clone();
        let report = tokio::task::spawn_blocking(move || {
            worker.compare(&content, Some(algorithms.as_slice()))
        })
        .await
        .context("Benchmark task failed")?;
        spinner.finish_and_clear();
        let report = report?;

        ctx.save_history(&engine)?;

        if ctx.json {
            return output::json(&report);
        }
        if ctx.quiet {
            return Ok(());
        }

        output::header(&format!(
            "Benchmark for {} ({}, {})",
            self.file.display(),
            report.content_profile.detected_type,
            HumanBytes(size)
        ));
        println!();
        println!(
            "  {:<8} {:>5} {:>12} {:>8} {:>7} {:>12} {:>10}  {}",
            style("ALGO").bold(),
            style("LEVEL").bold(),
            style("SIZE").bold(),
            style("RATIO").bold(),
            style("SAVED").bold(),
            style("TIME").bold(),
            style("MB/s").bold(),
            style("STATUS").bold(),
        );

        let best = report.best().map(|r| r.algorithm_id.clone());
        for result in &report.results {
            let is_best = best.as_deref() == Some(result.algorithm_id.as_str());
            let id = if is_best {
                style(&result.algorithm_id).green().bold()
            } else {
                style(&result.algorithm_id).cyan()
            };
            let status = match &result.error {
                Some(error) => style(error.clone()).red(),
                None if is_best => style("best".to_string()).green().bold(),
                None => style("ok".to_string()).dim(),
            };
            println!(
                "  {:<8} {:>5} {:>12} {:>8} {:>6.1}% {:>12} {:>10.1}  {}",
                id,
                result.parameters.level,
                HumanBytes(result.compressed_size).to_string(),
                output::ratio(result.ratio),
                result.space_saved_percent(),
                output::millis(result.duration_ms),
                result.throughput_mbps,
                status,
            );
        }

        println!();
        match report.best() {
            Some(winner) => output::success(&format!(
                "Best verified ratio: {} at level {} ({})",
                winner.algorithm_id,
                winner.parameters.level,
                output::ratio(winner.ratio)
            )),
            None => output::warning("No algorithm produced a verified result"),
        }
        let failed = report.failed();
        if !failed.is_empty() {
            output::warning(&format!("{} algorithm(s) failed", failed.len()));
        }

        Ok(())
    }
}
