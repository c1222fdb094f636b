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

use super::Context;

/// Run the HTTP API
#[derive(Parser, Debug)]
pub struct ServeCmd {
    /// Bind host (overrides server.host)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Bind port (overrides server.port)
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,
}

impl ServeCmd {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let mut config = ctx.config.clone();
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        let engine = ratiolab_server::engine_from_config(&config)?;
        ratiolab_server::serve(&config, engine).await
    }
}
