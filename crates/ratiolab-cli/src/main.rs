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

mod commands;
mod output;
mod progress;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use commands::*;
use ratiolab_config::ConfigLoader;
use ratiolab_observability::{init_tracing_with_config, LogConfig, LogFormat};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ratiolab")]
#[command(version, about = "Content-adaptive compression selection and benchmarking")]
#[command(
    long_about = "RatioLab profiles content, recommends the compression algorithm and level most
likely to suit it, compresses with integrity verification, and benchmarks algorithms side by side."
)]
#[command(propagate_version = true)]
#[command(author = "RatioLab Contributors")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML, YAML or JSON; defaults to ./ratiolab.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Colored output
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorChoice {
    Always,
    Auto,
    Never,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile a file's content
    Analyze(AnalyzeCmd),

    /// List registered algorithms
    Algorithms(AlgorithmsCmd),

    /// Rank algorithms for a file
    Recommend(RecommendCmd),

    /// Compress a file
    Compress(CompressCmd),

    /// Decompress a file
    Decompress(DecompressCmd),

    /// Benchmark algorithms on a file
    Compare(CompareCmd),

    /// Run the HTTP API
    Serve(ServeCmd),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Never => console::set_colors_enabled(false),
        ColorChoice::Always => console::set_colors_enabled(true),
        ColorChoice::Auto => {}
    }

    // Commands that need no engine
    match &cli.command {
        Commands::Completions { shell } => {
            generate_completions(*shell);
            return Ok(());
        }
        Commands::Version => {
            print_version();
            return Ok(());
        }
        _ => {}
    }

    let config = match ConfigLoader::new().load_or_default(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            output::error(&format!("Error: {}", e));
            std::process::exit(2);
        }
    };

    // Initialize structured logging
    if !cli.quiet {
        let format = config
            .observability
            .log_format
            .parse()
            .unwrap_or(LogFormat::Compact);
        // Library chatter stays at warn unless asked for; the server keeps its configured level
        let level = if cli.verbose {
            "debug"
        } else if matches!(cli.command, Commands::Serve(_)) {
            config.observability.log_level.as_str()
        } else {
            "warn"
        };
        let log_config = LogConfig::new()
            .with_format(format)
            .with_level(level)
            .with_color(!matches!(cli.color, ColorChoice::Never));
        init_tracing_with_config(log_config).ok(); // Ignore errors if already initialized
    }

    let ctx = Context {
        config,
        json: cli.json,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Analyze(cmd) => cmd.execute(&ctx).await,
        Commands::Algorithms(cmd) => cmd.execute(&ctx).await,
        Commands::Recommend(cmd) => cmd.execute(&ctx).await,
        Commands::Compress(cmd) => cmd.execute(&ctx).await,
        Commands::Decompress(cmd) => cmd.execute(&ctx).await,
        Commands::Compare(cmd) => cmd.execute(&ctx).await,
        Commands::Serve(cmd) => cmd.execute(&ctx).await,
        Commands::Completions { .. } | Commands::Version => Ok(()),
    };

    // Handle errors
    if let Err(e) = result {
        output::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

fn print_version() {
    println!("ratiolab {}", env!("CARGO_PKG_VERSION"));
    println!("rust-version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!("license: {}", env!("CARGO_PKG_LICENSE"));
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "ratiolab", &mut io::stdout());
}
