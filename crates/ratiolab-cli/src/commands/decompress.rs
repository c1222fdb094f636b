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

use anyhow::{anyhow, Result};
use clap::Parser;
use indicatif::HumanBytes;
use std::path::PathBuf;

use super::{algorithm_for_extension, decompressed_path, read_input, write_output, Context};
use crate::output;

/// Decompress a file produced by `ratiolab compress`
#[derive(Parser, Debug)]
pub struct DecompressCmd {
    /// File to decompress
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Algorithm that produced the file (detected from magic bytes or extension when omitted)
    #[arg(short, long, value_name = "ALGO")]
    pub algorithm: Option<String>,

    /// Output path (defaults to FILE without its compression extension)
    #[arg(short, long, value_name = "OUT")]
    pub output: Option<PathBuf>,
}

impl DecompressCmd {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let data = read_input(&self.file).await?;
        let engine = ctx.engine()?;

        let algorithm = match &self.algorithm {
            Some(id) => id.clone(),
            None => engine
                .detect(&data)
                .map(|spec| spec.id.clone())
                .or_else(|| algorithm_for_extension(&self.file).map(str::to_string))
                .ok_or_else(|| {
                    anyhow!(
                        "Cannot tell which algorithm produced {}; pass --algorithm",
                        self.file.display()
                    )
                })?,
        };

        let restored = engine.decompress(&algorithm, &data)?;
        let path = self
            .output
            .clone()
            .unwrap_or_else(|| decompressed_path(&self.file));
        write_output(&path, &restored).await?;

        if ctx.json {
            return output::json(&serde_json::json!({
                "algorithm": algorithm,
                "output": path,
                "compressed_size": data.len(),
                "decompressed_size": restored.len(),
            }));
        }
        if ctx.human() {
            output::success(&format!(
                "Decompressed {} to {}",
                self.file.display(),
                path.display()
            ));
            output::detail("Algorithm", &algorithm);
            output::detail("Size", &HumanBytes(restored.len() as u64).to_string());
        }

        Ok(())
    }
}
