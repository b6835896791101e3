// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Streaming result processors
//!
//! Matcher workers push every match into a processor instead of a table;
//! each worker ends its stream with `None`. Half-streamed processors store
//! the first row of each group into a private per-thread table so that
//! non-key outputs can still be projected. Fully streamed processors key
//! on evaluated values and never store a row.
//!
//! Per-thread state sits behind a mutex that only its owning worker locks,
//! so the lock is never contended during matching.

pub mod global;
pub mod local;
pub mod local_merge;
pub mod single;
pub mod sorter;
pub mod two_step;

use rayon::ThreadPool;

use crate::aggregate::AggregateSpec;
use crate::compare::{GroupKeyExprs, RowComparer};
use crate::config::{AggregateStorageKind, GrouperKind};
use crate::error::Result;
use crate::graph::{Element, Graph};
use crate::group::{check_combination, GroupByResults, RowRef};
use crate::table::TableResults;

pub use global::GlobalStreamed;
pub use local_merge::LocalMergeStreamed;
pub use single::SingleGroupStreamed;
pub use sorter::MergeSorter;
pub use two_step::TwoStepStreamed;

/// Consumer of matches pushed by the matcher workers
pub trait ResultProcessor: Sync {
    /// `Some(scope)` per match, `None` once the worker `thread` is done
    fn process(&self, thread: usize, row: Option<&[Option<Element>]>);

    fn finish(self: Box<Self>) -> ProcessorOutput;
}

#[derive(Debug)]
pub enum ProcessorOutput {
    Groups(GroupByResults),
    /// Sorted rows, referencing the per-thread tables
    Rows {
        tables: Vec<TableResults>,
        order: Vec<RowRef>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Store one representative row per group
    Half,
    /// Never store rows
    Full,
}

/// Inputs shared by every processor
#[derive(Clone)]
pub struct StreamContext<'a> {
    pub graph: &'a Graph,
    pub keys: &'a GroupKeyExprs,
    pub aggregates: &'a [AggregateSpec],
    pub pool: &'a ThreadPool,
    pub thread_count: usize,
    /// Slots stored for representatives and sorted rows
    pub used: Vec<bool>,
    pub block_size: usize,
    pub array_capacity: usize,
}

impl StreamContext<'_> {
    pub(crate) fn new_tables(&self) -> Vec<TableResults> {
        (0..self.thread_count)
            .map(|_| TableResults::new(self.used.clone(), self.block_size))
            .collect()
    }
}

pub enum ProcessorKind {
    Grouped {
        grouper: GrouperKind,
        storage: AggregateStorageKind,
        mode: StreamMode,
    },
    SingleGroup,
    Sorted(RowComparer),
}

/// Processor for a validated combination
pub fn create_processor<'a>(
    kind: ProcessorKind,
    ctx: StreamContext<'a>,
) -> Result<Box<dyn ResultProcessor + 'a>> {
    let processor: Box<dyn ResultProcessor + 'a> = match kind {
        ProcessorKind::Grouped {
            grouper,
            storage,
            mode,
        } => {
            check_combination(grouper, storage)?;
            match grouper {
                GrouperKind::Global => Box::new(GlobalStreamed::new(ctx, storage, mode)),
                GrouperKind::TwoStep => Box::new(TwoStepStreamed::new(ctx, storage, mode)),
                GrouperKind::LocalTwoWayMerge => Box::new(LocalMergeStreamed::new(ctx, mode)),
            }
        }
        ProcessorKind::SingleGroup => Box::new(SingleGroupStreamed::new(ctx)),
        ProcessorKind::Sorted(comparer) => Box::new(MergeSorter::new(ctx, comparer)),
    };
    Ok(processor)
}
