// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! GraphMatch - parallel pattern matching and aggregation over a labeled-property graph
//!
//! This crate provides:
//! - A PGQL-style query parser
//! - A multi-threaded DFS pattern matcher writing into block-column result tables
//! - Group-by algorithms over bucket, list and array aggregate storage
//! - Streaming result processors and parallel sorting
//! - A query engine tying the stages together

pub mod aggregate;
pub mod ast;
pub mod compare;
pub mod config;
pub mod error;
pub mod expr;
pub mod graph;
pub mod group;
pub mod matcher;
pub mod parser;
pub mod pattern;
pub mod query;
pub mod sort;
pub mod streaming;
pub mod table;
pub mod telemetry;

pub use aggregate::OutputValue;
pub use config::{AggregateStorageKind, EngineConfig, ExecutionMode, GrouperKind};
pub use error::{GraphError, QueryError, Result};
pub use graph::{load_graph, parse_graph, Element, Graph, GraphBuilder, Value, ValueType};
pub use parser::parse_query;
pub use query::{QueryEngine, QueryResult};
pub use telemetry::{QueryTelemetry, Stage};
