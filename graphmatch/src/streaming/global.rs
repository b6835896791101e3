// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Streamed global group-by

use parking_lot::Mutex;

use super::{ProcessorOutput, ResultProcessor, StreamContext, StreamMode};
use crate::aggregate::{evaluate_inputs, kinds};
use crate::config::AggregateStorageKind;
use crate::graph::Element;
use crate::group::{GroupByResults, RowRef, SharedGroups};
use crate::table::TableResults;

/// Every match updates the shared dictionary directly
pub struct GlobalStreamed<'a> {
    ctx: StreamContext<'a>,
    mode: StreamMode,
    shared: SharedGroups,
    tables: Vec<Mutex<TableResults>>,
}

impl<'a> GlobalStreamed<'a> {
    pub fn new(ctx: StreamContext<'a>, storage: AggregateStorageKind, mode: StreamMode) -> Self {
        let shared = SharedGroups::new(storage, &kinds(ctx.aggregates), ctx.array_capacity);
        let tables = ctx.new_tables().into_iter().map(Mutex::new).collect();
        Self {
            ctx,
            mode,
            shared,
            tables,
        }
    }
}

impl ResultProcessor for GlobalStreamed<'_> {
    fn process(&self, thread: usize, row: Option<&[Option<Element>]>) {
        let Some(row) = row else {
            return;
        };
        let probe = self.ctx.keys.probe(row, self.ctx.graph);
        let inputs = evaluate_inputs(self.ctx.aggregates, row, self.ctx.graph);
        match self.mode {
            StreamMode::Half => self.shared.apply(probe, &inputs, || {
                let mut table = self.tables[thread].lock();
                table.store_row(row);
                Some(RowRef {
                    table: thread,
                    row: table.row_count() - 1,
                })
            }),
            StreamMode::Full => self.shared.apply(probe, &inputs, || None),
        }
    }

    fn finish(self: Box<Self>) -> ProcessorOutput {
        let this = *self;
        ProcessorOutput::Groups(GroupByResults {
            tables: this.tables.into_iter().map(Mutex::into_inner).collect(),
            groups: this.shared.into_entries(),
        })
    }
}
