// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command definitions for GraphMatch

use clap::{Args, Parser, Subcommand, ValueEnum};
use graphmatch::{AggregateStorageKind, EngineConfig, ExecutionMode, GrouperKind};
use std::path::PathBuf;

/// Log level options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors
    Info,
    /// Debug messages and above (verbose)
    Debug,
    /// All messages including trace (very verbose)
    Trace,
    /// Disable all logging
    Off,
}

impl LogLevel {
    /// Convert to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// GraphMatch CLI - parallel PGQL-style pattern matching
#[derive(Parser)]
#[command(name = "graphmatch")]
#[command(about = "GraphMatch - parallel pattern matching and aggregation over property graphs")]
#[command(version)]
pub struct Cli {
    /// Set log level (error, warn, info, debug, trace, off)
    #[arg(short = 'l', long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Verbose mode (equivalent to --log-level debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective log level; an explicit level wins over --verbose
    pub fn level_filter(&self) -> log::LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level.to_level_filter(),
            (None, true) => log::LevelFilter::Debug,
            (None, false) => log::LevelFilter::Warn,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show detailed version information
    Version,

    /// Execute a single query
    Query {
        /// The query to execute
        query: String,

        /// Graph file (JSON)
        #[arg(short, long)]
        graph: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Print per-stage timings after the result
        #[arg(short, long)]
        timings: bool,
    },

    /// Interactive query console (REPL)
    Repl {
        /// Graph file (JSON)
        #[arg(short, long)]
        graph: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        /// Print per-stage timings after each result
        #[arg(short, long)]
        timings: bool,
    },
}

/// Engine settings; flags override the config file
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Engine configuration file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Worker threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// Start vertices handed to a worker per request
    #[arg(long)]
    pub vertices_per_thread: Option<usize>,

    /// Group-by algorithm (global, two_step, local_merge)
    #[arg(long)]
    pub grouper: Option<GrouperKind>,

    /// Aggregate storage (bucket, list, array)
    #[arg(long)]
    pub storage: Option<AggregateStorageKind>,

    /// Execution mode (materialized, half_streamed, streamed)
    #[arg(long)]
    pub mode: Option<ExecutionMode>,
}

impl EngineArgs {
    /// Build the engine configuration
    pub fn to_config(&self) -> graphmatch::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(threads) = self.threads {
            config.thread_count = threads;
        }
        if let Some(vertices) = self.vertices_per_thread {
            config.vertices_per_thread = vertices;
        }
        if let Some(grouper) = self.grouper {
            config.grouper = grouper;
            // storage from the file may not fit the new grouper
            if self.storage.is_none() && self.config.is_some() {
                config.storage = None;
            }
        }
        if let Some(storage) = self.storage {
            config.storage = Some(storage);
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_query_command() {
        let cli = Cli::parse_from([
            "graphmatch",
            "query",
            "SELECT count(*) MATCH (x)",
            "--graph",
            "g.json",
            "--threads",
            "3",
            "--grouper",
            "local_merge",
            "--mode",
            "half_streamed",
            "--format",
            "csv",
            "-v",
        ]);
        assert_eq!(cli.level_filter(), log::LevelFilter::Debug);
        match cli.command {
            Commands::Query { engine, format, .. } => {
                assert_eq!(format, OutputFormat::Csv);
                let config = engine.to_config().unwrap();
                assert_eq!(config.thread_count, 3);
                assert_eq!(config.grouper, GrouperKind::LocalTwoWayMerge);
                assert_eq!(config.resolved_storage(), AggregateStorageKind::List);
                assert_eq!(config.mode, ExecutionMode::HalfStreamed);
            }
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"thread_count": 6, "grouper": "Global", "storage": "Array"}"#)
            .unwrap();
        let args = EngineArgs {
            config: Some(file.path().to_path_buf()),
            threads: Some(2),
            ..Default::default()
        };
        let config = args.to_config().unwrap();
        assert_eq!(config.thread_count, 2);
        assert_eq!(config.grouper, GrouperKind::Global);
        assert_eq!(config.storage, Some(AggregateStorageKind::Array));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = EngineArgs {
            threads: Some(0),
            ..Default::default()
        };
        assert!(args.to_config().is_err());
    }
}
