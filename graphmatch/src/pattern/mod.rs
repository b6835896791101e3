// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Match pattern model
//!
//! This module provides:
//! - The variable registry mapping names to scope slots
//! - The compiled pattern walked by the DFS matcher
//! - Compilation from parsed chains (ordering, splitting, registration)

pub mod compiler;
pub mod node;
pub mod variables;

pub use compiler::compile;
pub use node::{MatchKind, MatchNode, Pattern};
pub use variables::{Registration, VariableInfo, VariableMap};
