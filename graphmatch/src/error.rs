// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for query compilation and execution

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors raised while building a graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Table declared twice
    #[error("Duplicate table: {0}")]
    DuplicateTable(String),

    /// Element id declared twice
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: i64 },

    /// Reference to a table that does not exist or has the wrong kind
    #[error("Unknown {kind} table: {name}")]
    UnknownTable { kind: &'static str, name: String },

    /// Edge endpoint that is not a vertex of the graph
    #[error("Edge {edge} references missing vertex {vertex}")]
    DanglingEdge { edge: i64, vertex: i64 },

    /// Property not declared by the element's table
    #[error("Table '{table}' has no property '{property}'")]
    UnknownProperty { table: String, property: String },

    /// Property declared with two different types or given an ill-typed value
    #[error("Property '{property}' expects {expected}, got {found}")]
    PropertyType {
        property: String,
        expected: String,
        found: String,
    },
}

/// Main error type for query processing
///
/// Every variant is raised synchronously before or during a single query and
/// is never retried: the engine works on an immutable graph snapshot.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Query text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Pattern or expression is semantically invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid engine configuration (thread counts, ranges, block sizes)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No implementation exists for the requested function/type/storage combination
    #[error("Unsupported combination: {0}")]
    TypeDispatch(String),

    /// Graph construction errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        QueryError::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        QueryError::Configuration(msg.into())
    }

    pub fn type_dispatch(msg: impl Into<String>) -> Self {
        QueryError::TypeDispatch(msg.into())
    }
}
