// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine configuration
//!
//! Provides:
//! - Thread and work-range sizing for the parallel matcher
//! - Result table block size
//! - Grouper algorithm and aggregate storage selection
//! - Materialized vs streamed execution

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{QueryError, Result};

/// Group-by algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum GrouperKind {
    /// One concurrent dictionary shared by every worker
    #[serde(alias = "global")]
    Global,
    /// Local dictionaries merged into one shared dictionary
    #[serde(alias = "two_step", alias = "twostep")]
    TwoStep,
    /// Local dictionaries merged pairwise in a tree
    #[serde(alias = "local_two_way_merge", alias = "local_merge")]
    LocalTwoWayMerge,
}

impl GrouperKind {
    pub fn name(&self) -> &'static str {
        match self {
            GrouperKind::Global => "global",
            GrouperKind::TwoStep => "two_step",
            GrouperKind::LocalTwoWayMerge => "local_merge",
        }
    }
}

impl FromStr for GrouperKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "global" => Ok(GrouperKind::Global),
            "two_step" | "twostep" => Ok(GrouperKind::TwoStep),
            "local_merge" | "local_two_way_merge" | "localtwowaymerge" => {
                Ok(GrouperKind::LocalTwoWayMerge)
            }
            _ => Err(QueryError::type_dispatch(format!("unknown grouper '{}'", s))),
        }
    }
}

impl fmt::Display for GrouperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of the per-group aggregate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum AggregateStorageKind {
    #[serde(alias = "bucket")]
    Bucket,
    #[serde(alias = "list")]
    List,
    #[serde(alias = "array")]
    Array,
}

impl AggregateStorageKind {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateStorageKind::Bucket => "bucket",
            AggregateStorageKind::List => "list",
            AggregateStorageKind::Array => "array",
        }
    }

    /// Storage used when a grouper is requested without one
    pub fn default_for(grouper: GrouperKind) -> Self {
        match grouper {
            GrouperKind::Global | GrouperKind::TwoStep => AggregateStorageKind::Bucket,
            GrouperKind::LocalTwoWayMerge => AggregateStorageKind::List,
        }
    }
}

impl FromStr for AggregateStorageKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bucket" | "buckets" => Ok(AggregateStorageKind::Bucket),
            "list" | "lists" => Ok(AggregateStorageKind::List),
            "array" | "arrays" => Ok(AggregateStorageKind::Array),
            _ => Err(QueryError::type_dispatch(format!("unknown aggregate storage '{}'", s))),
        }
    }
}

impl fmt::Display for AggregateStorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How matched rows reach the grouper or sorter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum ExecutionMode {
    /// Match into a merged table, then group and sort it
    #[default]
    #[serde(alias = "materialized")]
    Materialized,
    /// Push rows into a processor that keeps one representative row per group
    #[serde(alias = "half_streamed", alias = "half")]
    HalfStreamed,
    /// Push rows into a processor that keeps no rows at all
    #[serde(alias = "streamed")]
    Streamed,
}

impl FromStr for ExecutionMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "materialized" => Ok(ExecutionMode::Materialized),
            "half_streamed" | "half" => Ok(ExecutionMode::HalfStreamed),
            "streamed" | "full" => Ok(ExecutionMode::Streamed),
            _ => Err(QueryError::configuration(format!("unknown execution mode '{}'", s))),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionMode::Materialized => "materialized",
            ExecutionMode::HalfStreamed => "half_streamed",
            ExecutionMode::Streamed => "streamed",
        };
        f.write_str(name)
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads for matching, grouping and sorting
    pub thread_count: usize,
    /// Start vertices handed out per distributor request
    pub vertices_per_thread: usize,
    /// Rows per result table block
    pub block_size: usize,
    /// Group-by algorithm
    pub grouper: GrouperKind,
    /// Aggregate storage, `None` picks the grouper's default
    pub storage: Option<AggregateStorageKind>,
    /// Materialized or streamed execution
    pub mode: ExecutionMode,
    /// Initial group capacity of array storage
    pub array_initial_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            vertices_per_thread: 512,
            block_size: 4096,
            grouper: GrouperKind::TwoStep,
            storage: None,
            mode: ExecutionMode::Materialized,
            array_initial_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Create with a fixed thread count
    pub fn with_threads(thread_count: usize) -> Self {
        Self {
            thread_count,
            ..Default::default()
        }
    }

    /// Single-threaded configuration (for testing)
    pub fn single_threaded() -> Self {
        Self::with_threads(1)
    }

    pub fn vertices_per_thread(mut self, vertices: usize) -> Self {
        self.vertices_per_thread = vertices;
        self
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn grouper(mut self, grouper: GrouperKind, storage: Option<AggregateStorageKind>) -> Self {
        self.grouper = grouper;
        self.storage = storage;
        self
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Storage the grouper will actually use
    pub fn resolved_storage(&self) -> AggregateStorageKind {
        self.storage
            .unwrap_or_else(|| AggregateStorageKind::default_for(self.grouper))
    }

    pub fn validate(&self) -> Result<()> {
        if self.thread_count == 0 {
            return Err(QueryError::configuration("thread_count must be at least 1"));
        }
        if self.vertices_per_thread == 0 {
            return Err(QueryError::configuration("vertices_per_thread must be at least 1"));
        }
        if self.block_size == 0 {
            return Err(QueryError::configuration("block_size must be at least 1"));
        }
        if self.array_initial_capacity == 0 {
            return Err(QueryError::configuration(
                "array_initial_capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_storage_per_grouper() {
        let config = EngineConfig::default();
        assert_eq!(config.resolved_storage(), AggregateStorageKind::Bucket);

        let config = config.grouper(GrouperKind::LocalTwoWayMerge, None);
        assert_eq!(config.resolved_storage(), AggregateStorageKind::List);
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        assert!(EngineConfig::with_threads(0).validate().is_err());
        assert!(EngineConfig::default().vertices_per_thread(0).validate().is_err());
        assert!(EngineConfig::default().block_size(0).validate().is_err());
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_aliases() {
        assert_eq!("two-step".parse::<GrouperKind>().unwrap(), GrouperKind::TwoStep);
        assert_eq!("Array".parse::<AggregateStorageKind>().unwrap(), AggregateStorageKind::Array);
        assert!(matches!(
            "hash".parse::<GrouperKind>(),
            Err(QueryError::TypeDispatch(_))
        ));
    }

    #[test]
    fn test_from_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"thread_count": 3, "grouper": "global", "storage": "array"}}"#).unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.thread_count, 3);
        assert_eq!(config.grouper, GrouperKind::Global);
        assert_eq!(config.storage, Some(AggregateStorageKind::Array));
        assert_eq!(config.block_size, 4096);
    }
}
