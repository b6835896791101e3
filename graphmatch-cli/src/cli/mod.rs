// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for GraphMatch
//!
//! Provides one-off query execution against a JSON graph file and an
//! interactive query console (REPL).

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::{handle_query, handle_repl, handle_version};
