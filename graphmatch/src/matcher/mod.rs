// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pattern matching
//!
//! This module provides:
//! - A single-thread DFS matcher over the compiled pattern
//! - Vertex-range and column distributors
//! - A parallel driver that counts, materializes or streams matches
//! - The merge of per-worker tables into one table

pub mod dfs;
pub mod distributor;
pub mod merge;
pub mod parallel;

pub use dfs::{CountSink, DfsMatcher, MatchSink};
pub use distributor::{ColumnDistributor, VertexDistributor};
pub use merge::merge_tables;
pub use parallel::ParallelMatcher;
