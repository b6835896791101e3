// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Array aggregate storage
//!
//! Groups are addressed by positions handed out by an atomic counter. Every
//! update holds a shared guard of the resize barrier; growing the columns
//! holds the exclusive guard, so no update can observe a half-resized array.

use log::debug;
use parking_lot::RwLock;

use super::{AggregateCell, AggregateInput, AggregateKind, ListStorage, OutputValue};

#[derive(Debug)]
struct Columns {
    capacity: usize,
    /// `cells[aggregate][position]`
    cells: Vec<Vec<AggregateCell>>,
}

#[derive(Debug)]
pub struct ArrayStorage {
    kinds: Vec<AggregateKind>,
    columns: RwLock<Columns>,
}

impl ArrayStorage {
    pub fn new(kinds: &[AggregateKind], initial_capacity: usize) -> Self {
        let capacity = initial_capacity.max(1);
        let cells = kinds
            .iter()
            .map(|kind| (0..capacity).map(|_| AggregateCell::new(*kind)).collect())
            .collect();
        Self {
            kinds: kinds.to_vec(),
            columns: RwLock::new(Columns { capacity, cells }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.columns.read().capacity
    }

    /// Grow until `position` is addressable
    fn ensure(&self, position: usize) {
        if position < self.columns.read().capacity {
            return;
        }

        let mut columns = self.columns.write();
        if position < columns.capacity {
            return;
        }
        let grown = (position + 1).max(columns.capacity * 2);
        for (column, kind) in columns.cells.iter_mut().zip(&self.kinds) {
            column.resize_with(grown, || AggregateCell::new(*kind));
        }
        debug!(
            "Array aggregate storage grown from {} to {} groups",
            columns.capacity, grown
        );
        columns.capacity = grown;
    }

    /// Apply one row to the group at `position`
    pub fn apply(&self, position: usize, inputs: &[AggregateInput]) {
        self.ensure(position);
        let columns = self.columns.read();
        for ((column, kind), input) in columns.cells.iter().zip(&self.kinds).zip(inputs) {
            column[position].apply_thread_safe(*kind, input);
        }
    }

    /// Fold a local group into the group at `position`
    pub fn merge_list(&self, position: usize, local: &ListStorage, group: usize) {
        self.ensure(position);
        let columns = self.columns.read();
        for (aggregate, column) in columns.cells.iter().enumerate() {
            local.merge_cell(group, aggregate, &column[position], true);
        }
    }

    pub fn values(&self, position: usize) -> Vec<OutputValue> {
        let columns = self.columns.read();
        columns
            .cells
            .iter()
            .map(|column| {
                column
                    .get(position)
                    .map(AggregateCell::value)
                    .unwrap_or(OutputValue::Null)
            })
            .collect()
    }
}
