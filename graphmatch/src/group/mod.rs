// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Group-by algorithms
//!
//! This module provides:
//! - `GlobalGroupBy`: one concurrent dictionary shared by every worker
//! - `TwoStepGroupBy`: lock-free local dictionaries merged into a shared one
//! - `LocalTwoWayMergeGroupBy`: local dictionaries merged pairwise in a join tree
//! - `SingleGroupGroupBy`: aggregates without grouping keys
//!
//! Groupers read one merged table and produce one `GroupEntry` per group:
//! the representative row, the key values and the final aggregate values.

pub mod global;
pub mod key;
pub mod local_merge;
pub mod shared;
pub mod single;
pub mod two_step;

use rayon::ThreadPool;
use std::ops::Range;

use crate::aggregate::{AggregateSpec, OutputValue};
use crate::compare::GroupKeyExprs;
use crate::config::{AggregateStorageKind, GrouperKind};
use crate::error::{QueryError, Result};
use crate::graph::{Graph, Value};
use crate::table::{RowProxy, TableResults};

pub use global::GlobalGroupBy;
pub use key::{LocalGroup, LocalGroups};
pub use local_merge::LocalTwoWayMergeGroupBy;
pub use shared::SharedGroups;
pub use single::SingleGroupGroupBy;
pub use two_step::TwoStepGroupBy;

/// Storage position of a row: table ordinal and raw row index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRef {
    pub table: usize,
    pub row: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    /// First row stored for the group, absent when rows are never stored
    pub representative: Option<RowRef>,
    pub keys: Vec<Option<Value>>,
    pub aggregates: Vec<OutputValue>,
}

/// Groups together with the tables their representatives live in
#[derive(Debug, Clone, Default)]
pub struct GroupByResults {
    pub tables: Vec<TableResults>,
    pub groups: Vec<GroupEntry>,
}

impl GroupByResults {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn representative(&self, group: &GroupEntry) -> Option<RowProxy<'_>> {
        let row = group.representative?;
        let table = self.tables.get(row.table)?;
        Some(table.raw_row(row.row))
    }
}

/// Inputs shared by every grouper
pub struct GroupContext<'a> {
    pub graph: &'a Graph,
    pub keys: &'a GroupKeyExprs,
    pub aggregates: &'a [AggregateSpec],
    pub pool: &'a ThreadPool,
    pub thread_count: usize,
    pub array_capacity: usize,
}

pub trait Grouper: Send + Sync {
    fn name(&self) -> &'static str;

    /// Group every row of `table`, which is table 0 of the resulting references
    fn group(&self, ctx: &GroupContext<'_>, table: &TableResults) -> Vec<GroupEntry>;
}

/// Reject grouper × storage pairs without an implementation
pub fn check_combination(kind: GrouperKind, storage: AggregateStorageKind) -> Result<()> {
    use AggregateStorageKind::*;
    use GrouperKind::*;
    match (kind, storage) {
        (Global, Bucket) | (Global, Array) | (TwoStep, Bucket) | (TwoStep, Array) | (LocalTwoWayMerge, List) => Ok(()),
        _ => Err(QueryError::type_dispatch(format!(
            "grouper '{}' does not support '{}' aggregate storage",
            kind, storage
        ))),
    }
}

/// Create a grouper for a validated grouper × storage pair
pub fn create_grouper(kind: GrouperKind, storage: AggregateStorageKind) -> Result<Box<dyn Grouper>> {
    check_combination(kind, storage)?;
    let grouper: Box<dyn Grouper> = match kind {
        GrouperKind::Global => Box::new(GlobalGroupBy::new(storage)),
        GrouperKind::TwoStep => Box::new(TwoStepGroupBy::new(storage)),
        GrouperKind::LocalTwoWayMerge => Box::new(LocalTwoWayMergeGroupBy),
    };
    Ok(grouper)
}

/// Split `rows` into at most `parts` contiguous, non-empty ranges
pub fn row_ranges(rows: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1).min(rows.max(1));
    let chunk = rows / parts;
    let extra = rows % parts;
    let mut start = 0;
    (0..parts)
        .map(|part| {
            let len = chunk + usize::from(part < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}
