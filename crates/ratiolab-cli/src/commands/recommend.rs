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

use anyhow::Result;
use clap::Parser;
use console::style;
use ratiolab_engine::{CompressionCandidate, ContentProfile};
use serde::Serialize;
use std::path::PathBuf;

use super::{read_input, Context};
use crate::output;

/// Rank algorithms for a file without compressing it
#[derive(Parser, Debug)]
pub struct RecommendCmd {
    /// File to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Show at most N candidates
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct RecommendReport<'a> {
    profile: &'a ContentProfile,
    candidates: &'a [CompressionCandidate],
}

impl RecommendCmd {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let content = read_input(&self.file).await?;
        let engine = ctx.engine()?;
        let profile = engine.analyze(&content);
        let mut candidates = engine.recommend(&profile)?;
        if let Some(limit) = self.limit {
            candidates.truncate(limit.max(1));
        }

        if ctx.json {
            return output::json(&RecommendReport {
                profile: &profile,
                candidates: &candidates,
            });
        }
        if ctx.quiet {
            return Ok(());
        }

        output::header(&format!(
            "Recommendations for {} ({}, entropy {:.2})",
            self.file.display(),
            profile.detected_type,
            profile.entropy
        ));
        println!();
        println!(
            "  {:>2}  {:<8} {:>5} {:>10} {:>9} {:>12}",
            "#",
            style("ALGO").bold(),
            style("LEVEL").bold(),
            style("CONFIDENCE").bold(),
            style("RATIO").bold(),
            style("TIME").bold(),
        );
        for (rank, candidate) in candidates.iter().enumerate() {
            let id = if rank == 0 {
                style(&candidate.algorithm_id).green().bold()
            } else {
                style(&candidate.algorithm_id).cyan()
            };
            println!(
                "  {:>2}  {:<8} {:>5} {:>10.3} {:>9.3} {:>12}",
                rank + 1,
                id,
                candidate.parameters.level,
                candidate.confidence,
                candidate.predicted_ratio,
                output::millis(candidate.predicted_time_ms),
            );
        }

        let history = engine.tracker().stats(None, Some(profile.detected_type)).count;
        if history > 0 {
            println!();
            output::info(&format!(
                "Calibrated with {} tracked run(s) on {} content",
                history, profile.detected_type
            ));
        }

        Ok(())
    }
}
