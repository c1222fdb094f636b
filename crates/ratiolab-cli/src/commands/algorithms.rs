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
use ratiolab_engine::AlgorithmSpec;

use super::Context;
use crate::output;

/// List the registered compression algorithms
#[derive(Parser, Debug)]
pub struct AlgorithmsCmd {}

impl AlgorithmsCmd {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let engine = ctx.engine()?;
        let specs: Vec<&AlgorithmSpec> = engine.registry().list();

        if ctx.json {
            return output::json(&specs);
        }
        if ctx.quiet {
            return Ok(());
        }

        output::header(&format!("{} algorithms registered", specs.len()));
        println!();
        println!(
            "  {:<8} {:<10} {:>7} {:>7}  {:<9} {:<13}  {}",
            style("ID").bold(),
            style("NAME").bold(),
            style("LEVELS").bold(),
            style("DEFAULT").bold(),
            style("SPEED").bold(),
            style("RATIO").bold(),
            style("AFFINITIES").bold(),
        );
        for spec in specs {
            let affinities: Vec<&str> =
                spec.content_affinities.iter().map(|t| t.as_str()).collect();
            println!(
                "  {:<8} {:<10} {:>7} {:>7}  {:<9} {:<13}  {}",
                style(&spec.id).cyan(),
                spec.display_name,
                format!("{}-{}", spec.level_range.min, spec.level_range.max),
                spec.default_level,
                spec.speed_class.to_string(),
                format!(
                    "{:.2}-{:.2}",
                    spec.typical_ratio_range.min, spec.typical_ratio_range.max
                ),
                affinities.join(", "),
            );
        }

        Ok(())
    }
}
