// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Streamed local two-way merge group-by

use log::debug;
use parking_lot::Mutex;

use super::local::LocalState;
use super::{ProcessorOutput, ResultProcessor, StreamContext, StreamMode};
use crate::aggregate::{kinds, AggregateKind};
use crate::graph::Element;
use crate::group::local_merge::merge_tree;
use crate::group::GroupByResults;

/// Workers only touch their own dictionary; the join-tree merge runs at finish
pub struct LocalMergeStreamed<'a> {
    ctx: StreamContext<'a>,
    mode: StreamMode,
    kinds: Vec<AggregateKind>,
    states: Vec<Mutex<LocalState>>,
}

impl<'a> LocalMergeStreamed<'a> {
    pub fn new(ctx: StreamContext<'a>, mode: StreamMode) -> Self {
        let kinds = kinds(ctx.aggregates);
        let states = ctx
            .new_tables()
            .into_iter()
            .map(|table| Mutex::new(LocalState::new(&kinds, table)))
            .collect();
        Self {
            ctx,
            mode,
            kinds,
            states,
        }
    }
}

impl ResultProcessor for LocalMergeStreamed<'_> {
    fn process(&self, thread: usize, row: Option<&[Option<Element>]>) {
        if let Some(row) = row {
            self.states[thread]
                .lock()
                .process(&self.ctx, thread, row, self.mode);
        }
    }

    fn finish(self: Box<Self>) -> ProcessorOutput {
        let this = *self;
        let (parts, tables): (Vec<_>, Vec<_>) = this
            .states
            .into_iter()
            .map(|state| {
                let state = state.into_inner();
                (state.groups, state.table)
            })
            .unzip();

        let kinds = &this.kinds;
        let merged = this.ctx.pool.install(|| merge_tree(parts, kinds));
        debug!("Streamed two-way merge produced {} groups", merged.len());
        ProcessorOutput::Groups(GroupByResults {
            tables,
            groups: merged.into_entries(),
        })
    }
}
