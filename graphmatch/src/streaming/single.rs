// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Streamed aggregation without grouping keys

use parking_lot::Mutex;

use super::{ProcessorOutput, ResultProcessor, StreamContext};
use crate::aggregate::{evaluate_inputs, kinds, AggregateKind, ListStorage};
use crate::graph::Element;
use crate::group::{GroupByResults, GroupEntry};

/// One partial group per worker; `count(*)`-only queries just count rows
pub struct SingleGroupStreamed<'a> {
    ctx: StreamContext<'a>,
    kinds: Vec<AggregateKind>,
    count_only: bool,
    partials: Vec<Mutex<(ListStorage, u64)>>,
}

impl<'a> SingleGroupStreamed<'a> {
    pub fn new(ctx: StreamContext<'a>) -> Self {
        let kinds = kinds(ctx.aggregates);
        let count_only = kinds.iter().all(|k| k.is_count_all());
        let partials = (0..ctx.thread_count)
            .map(|_| {
                let mut storage = ListStorage::new(&kinds);
                storage.add_group();
                Mutex::new((storage, 0))
            })
            .collect();
        Self {
            ctx,
            kinds,
            count_only,
            partials,
        }
    }
}

impl ResultProcessor for SingleGroupStreamed<'_> {
    fn process(&self, thread: usize, row: Option<&[Option<Element>]>) {
        let Some(row) = row else {
            return;
        };
        let mut partial = self.partials[thread].lock();
        if self.count_only {
            partial.1 += 1;
        } else {
            partial
                .0
                .apply(0, &evaluate_inputs(self.ctx.aggregates, row, self.ctx.graph));
        }
    }

    fn finish(self: Box<Self>) -> ProcessorOutput {
        let this = *self;
        let mut total = ListStorage::new(&this.kinds);
        let group = total.add_group();
        for partial in this.partials {
            let (storage, rows) = partial.into_inner();
            if this.count_only {
                total.add_count_all(group, rows);
            } else {
                total.merge_group(group, &storage, 0);
            }
        }
        ProcessorOutput::Groups(GroupByResults {
            tables: Vec::new(),
            groups: vec![GroupEntry {
                representative: None,
                keys: Vec::new(),
                aggregates: total.values(group),
            }],
        })
    }
}
