// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-thread local dictionary state

use super::{StreamContext, StreamMode};
use crate::aggregate::{evaluate_inputs, AggregateKind};
use crate::graph::Element;
use crate::group::{LocalGroups, RowRef};
use crate::table::TableResults;

/// Local dictionary of one worker plus the table holding its representatives
#[derive(Debug)]
pub struct LocalState {
    pub groups: LocalGroups,
    pub table: TableResults,
}

impl LocalState {
    pub fn new(kinds: &[AggregateKind], table: TableResults) -> Self {
        Self {
            groups: LocalGroups::new(kinds),
            table,
        }
    }

    /// Aggregate one match of worker `thread`
    ///
    /// In half mode the row is staged as the table's temporary row, so it is
    /// only copied when it becomes a new group's representative.
    pub fn process(&mut self, ctx: &StreamContext<'_>, thread: usize, row: &[Option<Element>], mode: StreamMode) {
        match mode {
            StreamMode::Half => {
                self.table.set_temporary_row(row);
                let proxy = self.table.temporary_proxy();
                let probe = ctx.keys.probe(&proxy, ctx.graph);
                let inputs = evaluate_inputs(ctx.aggregates, &proxy, ctx.graph);

                let table = &mut self.table;
                let group = self.groups.find_or_insert(probe, || {
                    Some(RowRef {
                        table: thread,
                        row: table.store_temporary_row(),
                    })
                });
                self.groups.apply(group, &inputs);
            }
            StreamMode::Full => {
                let probe = ctx.keys.probe(row, ctx.graph);
                let group = self.groups.find_or_insert(probe, || None);
                self.groups
                    .apply(group, &evaluate_inputs(ctx.aggregates, row, ctx.graph));
            }
        }
    }
}
