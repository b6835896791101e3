// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Labeled-property graph consumed by the query core
//!
//! This module provides:
//! - Element handles and scalar values
//! - Tables (element types) and graph-wide typed property keys
//! - An immutable in-memory graph with in/out adjacency lists
//! - A builder and a JSON loader

pub mod loader;
pub mod schema;
pub mod store;
pub mod value;

pub use loader::{load_graph, parse_graph};
pub use schema::{PropertyId, PropertyKey, Schema, Table, TableId, TableKind};
pub use store::{Adjacency, Edge, Graph, GraphBuilder, Vertex};
pub use value::{Element, Value, ValueType};
