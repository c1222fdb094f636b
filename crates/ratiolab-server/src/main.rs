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
use ratiolab_config::ConfigLoader;
use ratiolab_observability::{init_tracing, LogFormat};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    // Optional config path as the only argument; otherwise ratiolab.toml or defaults
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = ConfigLoader::new()
        .load_or_default(config_path.as_deref())
        .await?;

    let format: LogFormat = config.observability.log_format.parse()?;
    init_tracing(format, Some(&config.observability.log_level))?;
    tracing::debug!("Server configuration: {:?}", config);

    let engine = ratiolab_server::engine_from_config(&config)?;
    ratiolab_server::serve(&config, engine).await
}
