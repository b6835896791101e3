// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! GraphMatch command-line entry point

mod cli;

use clap::Parser;
use colored::Colorize;

use cli::{handle_query, handle_repl, handle_version, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.level_filter())
        .format_timestamp_millis()
        .init();

    let result = match cli.command {
        Commands::Version => {
            handle_version();
            Ok(())
        }
        Commands::Query {
            query,
            graph,
            engine,
            format,
            timings,
        } => handle_query(graph, query, engine, format, timings),
        Commands::Repl {
            graph,
            engine,
            timings,
        } => handle_repl(graph, engine, timings),
    };

    if let Err(e) = result {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}
