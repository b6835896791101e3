// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Streamed two-step group-by
//!
//! Each worker fills a local dictionary and publishes it into the shared
//! one when its stream ends.

use parking_lot::Mutex;

use super::local::LocalState;
use super::{ProcessorOutput, ResultProcessor, StreamContext, StreamMode};
use crate::aggregate::{kinds, AggregateKind};
use crate::config::AggregateStorageKind;
use crate::graph::Element;
use crate::group::two_step::publish;
use crate::group::{GroupByResults, LocalGroups, SharedGroups};

pub struct TwoStepStreamed<'a> {
    ctx: StreamContext<'a>,
    mode: StreamMode,
    kinds: Vec<AggregateKind>,
    states: Vec<Mutex<LocalState>>,
    shared: SharedGroups,
}

impl<'a> TwoStepStreamed<'a> {
    pub fn new(ctx: StreamContext<'a>, storage: AggregateStorageKind, mode: StreamMode) -> Self {
        let kinds = kinds(ctx.aggregates);
        let states = ctx
            .new_tables()
            .into_iter()
            .map(|table| Mutex::new(LocalState::new(&kinds, table)))
            .collect();
        let shared = SharedGroups::new(storage, &kinds, ctx.array_capacity);
        Self {
            ctx,
            mode,
            kinds,
            states,
            shared,
        }
    }
}

impl ResultProcessor for TwoStepStreamed<'_> {
    fn process(&self, thread: usize, row: Option<&[Option<Element>]>) {
        let mut state = self.states[thread].lock();
        match row {
            Some(row) => state.process(&self.ctx, thread, row, self.mode),
            None => {
                let local = std::mem::replace(&mut state.groups, LocalGroups::new(&self.kinds));
                drop(state);
                publish(local, &self.shared);
            }
        }
    }

    fn finish(self: Box<Self>) -> ProcessorOutput {
        let this = *self;
        ProcessorOutput::Groups(GroupByResults {
            tables: this
                .states
                .into_iter()
                .map(|state| state.into_inner().table)
                .collect(),
            groups: this.shared.into_entries(),
        })
    }
}
