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
use indicatif::HumanBytes;
use std::path::PathBuf;

use super::{read_input, Context};
use crate::output;

/// Profile a file's content
#[derive(Parser, Debug)]
pub struct AnalyzeCmd {
    /// File to analyze
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

impl AnalyzeCmd {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let content = read_input(&self.file).await?;
        let engine = ctx.engine()?;
        let profile = engine.analyze(&content);

        if ctx.json {
            return output::json(&profile);
        }
        if ctx.quiet {
            return Ok(());
        }

        output::header(&format!("Content profile for {}", self.file.display()));
        output::detail("Size", &HumanBytes(profile.size_bytes).to_string());
        output::detail("Type", profile.detected_type.as_str());
        output::detail(
            "Entropy",
            &format!("{:.3} bits/byte ({:?})", profile.entropy, profile.entropy_class()),
        );
        output::detail("Redundancy", &format!("{:.3}", profile.redundancy));
        output::detail(
            "Compressibility",
            &format!("{:.3}", profile.compressibility_score),
        );
        output::detail("Size class", &format!("{:?}", profile.size_class()));

        if let Some(spec) = engine.detect(&content) {
            println!();
            output::warning(&format!(
                "Input already looks {}-compressed; expect little gain",
                style(&spec.id).bold()
            ));
        }

        Ok(())
    }
}
