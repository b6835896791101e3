// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Group-by over a single concurrent dictionary

use log::debug;

use super::shared::SharedGroups;
use super::{row_ranges, GroupContext, GroupEntry, Grouper, RowRef};
use crate::aggregate::{evaluate_inputs, kinds};
use crate::config::AggregateStorageKind;
use crate::table::TableResults;

/// Every worker owns a contiguous row range and updates the shared dictionary directly
#[derive(Debug, Clone, Copy)]
pub struct GlobalGroupBy {
    storage: AggregateStorageKind,
}

impl GlobalGroupBy {
    pub fn new(storage: AggregateStorageKind) -> Self {
        Self { storage }
    }
}

impl Grouper for GlobalGroupBy {
    fn name(&self) -> &'static str {
        "global"
    }

    fn group(&self, ctx: &GroupContext<'_>, table: &TableResults) -> Vec<GroupEntry> {
        let shared = SharedGroups::new(self.storage, &kinds(ctx.aggregates), ctx.array_capacity);
        let ranges = row_ranges(table.row_count(), ctx.thread_count);

        let work = |range: std::ops::Range<usize>| {
            for index in range {
                let row = table.raw_row(index);
                let probe = ctx.keys.probe(&row, ctx.graph);
                let inputs = evaluate_inputs(ctx.aggregates, &row, ctx.graph);
                shared.apply(probe, &inputs, || Some(RowRef { table: 0, row: index }));
            }
        };
        if ranges.len() == 1 {
            ranges.into_iter().for_each(work);
        } else {
            ctx.pool.scope(|s| {
                for range in ranges {
                    let work = &work;
                    s.spawn(move |_| work(range));
                }
            });
        }

        debug!("Global group-by ({}) produced {} groups", self.storage, shared.len());
        shared.into_entries()
    }
}
