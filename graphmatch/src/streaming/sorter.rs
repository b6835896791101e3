// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Streamed merge sort
//!
//! Every worker stores its matches into a private run and sorts the run when
//! its stream ends. `finish` merges the sorted runs with a k-way heap merge.

use log::{debug, warn};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{ProcessorOutput, ResultProcessor, StreamContext};
use crate::compare::RowComparer;
use crate::graph::{Element, Graph};
use crate::group::RowRef;
use crate::sort::sorted_order;
use crate::table::TableResults;

pub struct MergeSorter<'a> {
    ctx: StreamContext<'a>,
    comparer: RowComparer,
    runs: Vec<Mutex<TableResults>>,
}

impl<'a> MergeSorter<'a> {
    pub fn new(ctx: StreamContext<'a>, comparer: RowComparer) -> Self {
        let runs = ctx.new_tables().into_iter().map(Mutex::new).collect();
        Self { ctx, comparer, runs }
    }
}

/// Head of one sorted run
struct RunHead<'h> {
    run: usize,
    position: usize,
    runs: &'h [TableResults],
    comparer: &'h RowComparer,
    graph: &'h Graph,
}

impl RunHead<'_> {
    fn cmp_rows(&self, other: &Self) -> Ordering {
        let mine = self.runs[self.run].row(self.position);
        let theirs = other.runs[other.run].row(other.position);
        self.comparer
            .compare(self.graph, &mine, &theirs)
            .then(self.run.cmp(&other.run))
    }
}

impl PartialEq for RunHead<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RunHead<'_> {}

impl PartialOrd for RunHead<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RunHead<'_> {
    // BinaryHeap is a max-heap; the smallest row must surface first
    fn cmp(&self, other: &Self) -> Ordering {
        other.cmp_rows(self)
    }
}

impl ResultProcessor for MergeSorter<'_> {
    fn process(&self, thread: usize, row: Option<&[Option<Element>]>) {
        let mut run = self.runs[thread].lock();
        match row {
            Some(row) => run.store_row(row),
            None => {
                let order = sorted_order(&run, &self.comparer, self.ctx.graph);
                if let Err(e) = run.add_order(order) {
                    warn!("Failed to attach sorted order to run {}: {}", thread, e);
                }
            }
        }
    }

    fn finish(self: Box<Self>) -> ProcessorOutput {
        let this = *self;
        let runs: Vec<TableResults> = this.runs.into_iter().map(Mutex::into_inner).collect();
        let total = runs.iter().map(TableResults::row_count).sum();

        let mut heap = BinaryHeap::with_capacity(runs.len());
        for (run, table) in runs.iter().enumerate() {
            if !table.is_empty() {
                heap.push(RunHead {
                    run,
                    position: 0,
                    runs: &runs,
                    comparer: &this.comparer,
                    graph: this.ctx.graph,
                });
            }
        }

        let mut order = Vec::with_capacity(total);
        while let Some(mut head) = heap.pop() {
            let table = &runs[head.run];
            order.push(RowRef {
                table: head.run,
                row: table.row(head.position).index(),
            });
            head.position += 1;
            if head.position < table.row_count() {
                heap.push(head);
            }
        }
        drop(heap);
        debug!("Merged {} sorted runs into {} rows", runs.len(), order.len());

        ProcessorOutput::Rows { tables: runs, order }
    }
}
