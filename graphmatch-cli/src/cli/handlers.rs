// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for GraphMatch

use colored::Colorize;
use rustyline::{error::ReadlineError, CompletionType, Config, EditMode, Editor};
use std::path::{Path, PathBuf};

use super::commands::{EngineArgs, OutputFormat};
use super::output::ResultFormatter;
use graphmatch::{load_graph, QueryEngine, QueryTelemetry};

const HISTORY_PATH: &str = ".graphmatch/history.txt";

/// Handle the version command
pub fn handle_version() {
    println!(
        "{} {}",
        "GraphMatch".bold().green(),
        env!("CARGO_PKG_VERSION")
    );
    println!("Groupers:      global, two_step, local_merge");
    println!("Storages:      bucket, list, array");
    println!("Modes:         materialized, half_streamed, streamed");
}

/// Handle the query command (one-off query execution)
pub fn handle_query(
    graph: PathBuf,
    query: String,
    engine: EngineArgs,
    format: OutputFormat,
    timings: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(&graph, &engine)?;
    let telemetry = QueryTelemetry::new();

    let result = engine.execute_with_telemetry(strip_terminator(&query), &telemetry)?;
    println!("{}", ResultFormatter::format(&result, format));
    if timings {
        eprintln!("{}", ResultFormatter::format_timings(&telemetry));
    }
    Ok(())
}

/// Handle the repl command
pub fn handle_repl(graph: PathBuf, engine: EngineArgs, timings: bool) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(&graph, &engine)?;

    println!("{}", "GraphMatch".bold().green());
    println!("Type 'help' for commands, 'exit' or 'quit' to exit");
    println!("Multi-line queries supported - use ';' to terminate");
    println!(
        "{}",
        format!(
            "Graph: {:?} ({} vertices, {} edges), {} threads",
            graph,
            engine.graph().vertex_count(),
            engine.graph().edge_count(),
            engine.config().thread_count
        )
        .cyan()
    );

    let config = Config::builder()
        .edit_mode(EditMode::Emacs)
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .auto_add_history(false)
        .build();
    let mut rl = Editor::<(), _>::with_config(config)?;

    if let Some(parent) = Path::new(HISTORY_PATH).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.load_history(HISTORY_PATH);

    let mut query_buffer = String::new();
    let mut show_timings = timings;

    loop {
        let prompt = if query_buffer.is_empty() { "pgql> " } else { "...> " };

        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                if !query_buffer.is_empty() {
                    query_buffer.clear();
                    println!("{}", "\nQuery buffer cleared".yellow());
                }
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };

        let trimmed = line.trim();

        if query_buffer.is_empty() {
            match trimmed.to_lowercase().as_str() {
                "exit" | "quit" => {
                    println!("{}", "Goodbye!".green());
                    break;
                }
                "help" => {
                    print_help();
                    continue;
                }
                "timings" => {
                    show_timings = !show_timings;
                    println!("Timings {}", if show_timings { "on" } else { "off" });
                    continue;
                }
                "config" => {
                    println!("{:#?}", engine.config());
                    continue;
                }
                "" => continue,
                _ => {}
            }
        }

        query_buffer.push_str(&line);
        query_buffer.push('\n');

        if trimmed.ends_with(';') {
            let query = query_buffer.trim().to_string();
            rl.add_history_entry(&query)?;

            let telemetry = QueryTelemetry::new();
            match engine.execute_with_telemetry(strip_terminator(&query), &telemetry) {
                Ok(result) => {
                    println!("{}", ResultFormatter::format(&result, OutputFormat::Table));
                    if show_timings {
                        println!("{}", ResultFormatter::format_timings(&telemetry));
                    }
                }
                Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
            }

            query_buffer.clear();
        }
    }

    let _ = rl.save_history(HISTORY_PATH);
    Ok(())
}

fn load_engine(graph: &Path, args: &EngineArgs) -> Result<QueryEngine, Box<dyn std::error::Error>> {
    let config = args.to_config()?;
    let graph = load_graph(graph).map_err(|e| format!("Failed to load graph {:?}: {}", graph, e))?;
    Ok(QueryEngine::new(graph, config)?)
}

/// Drop the trailing ';' of a console statement
fn strip_terminator(query: &str) -> &str {
    query.trim().trim_end_matches(';').trim_end()
}

fn print_help() {
    println!("{}", "Available commands:".bold().green());
    println!("  {}  - Show this help message", "help".cyan());
    println!("  {}  - Exit the console", "exit/quit".cyan());
    println!("  {}  - Toggle per-stage timings", "timings".cyan());
    println!("  {}  - Show the engine configuration", "config".cyan());
    println!("\n{}", "Query syntax:".bold().green());
    println!("  Multi-line queries are supported");
    println!("  Terminate queries with semicolon (;)");
    println!("\n{}", "Examples:".bold().green());
    println!("  {}", "SELECT count(*) MATCH (x)->(y);".yellow());
    println!(
        "  {}",
        "SELECT x.age, count(*) AS n MATCH (x:Person)-[:knows]->(y) GROUP BY x.age ORDER BY n DESC;".yellow()
    );
    println!("  {}", "MATCH (x)-[e]->(y) WHERE e.since > 2010 RETURN id(x), id(y) LIMIT 10;".yellow());
}
