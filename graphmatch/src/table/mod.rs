// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Block-column result table
//!
//! This module provides:
//! - Column storage split into fixed-capacity blocks, allocated only for used slots
//! - A row proxy giving O(1) column access without copying rows
//! - A temporary row standing in for the row about to be appended
//! - A sort-order overlay that permutes logical rows without moving data

use crate::error::{QueryError, Result};
use crate::expr::RowAccess;
use crate::graph::Element;

/// Fixed-capacity segment of one column
pub type Block = Vec<Option<Element>>;

#[derive(Debug, Clone)]
pub struct TableResults {
    block_size: usize,
    used: Vec<bool>,
    /// `columns[slot][block]`, empty for unused slots
    columns: Vec<Vec<Block>>,
    row_count: usize,
    temporary_row: Vec<Option<Element>>,
    order: Option<Vec<usize>>,
}

impl TableResults {
    /// Empty table over a scope of `used.len()` slots
    pub fn new(used: Vec<bool>, block_size: usize) -> Self {
        let width = used.len();
        Self {
            block_size: block_size.max(1),
            used,
            columns: vec![Vec::new(); width],
            row_count: 0,
            temporary_row: vec![None; width],
            order: None,
        }
    }

    /// Rebuild a table from merged column blocks
    pub(crate) fn from_columns(
        used: Vec<bool>,
        block_size: usize,
        columns: Vec<Vec<Block>>,
        row_count: usize,
    ) -> Self {
        let width = used.len();
        Self {
            block_size,
            used,
            columns,
            row_count,
            temporary_row: vec![None; width],
            order: None,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Scope width
    pub fn width(&self) -> usize {
        self.used.len()
    }

    pub fn used(&self) -> &[bool] {
        &self.used
    }

    pub fn used_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.used
            .iter()
            .enumerate()
            .filter_map(|(slot, used)| used.then_some(slot))
    }

    pub(crate) fn block_count(&self) -> usize {
        self.used_slots()
            .next()
            .map(|slot| self.columns[slot].len())
            .unwrap_or(0)
    }

    pub(crate) fn take_column(&mut self, slot: usize) -> Vec<Block> {
        std::mem::take(&mut self.columns[slot])
    }

    /// Append a copy of the used slots of `scope`
    pub fn store_row(&mut self, scope: &[Option<Element>]) {
        let block = self.row_count / self.block_size;
        let offset = self.row_count % self.block_size;
        for slot in 0..self.used.len() {
            if !self.used[slot] {
                continue;
            }
            let column = &mut self.columns[slot];
            if offset == 0 {
                column.push(Vec::with_capacity(self.block_size));
            }
            column[block].push(scope.get(slot).copied().flatten());
        }
        self.row_count += 1;
    }

    /// Stage `scope` as the row at index `row_count`
    pub fn set_temporary_row(&mut self, scope: &[Option<Element>]) {
        for (slot, target) in self.temporary_row.iter_mut().enumerate() {
            *target = if self.used[slot] {
                scope.get(slot).copied().flatten()
            } else {
                None
            };
        }
    }

    /// Proxy reading the staged temporary row
    pub fn temporary_proxy(&self) -> RowProxy<'_> {
        RowProxy {
            table: self,
            index: self.row_count,
        }
    }

    /// Append the staged temporary row, returning its index
    pub fn store_temporary_row(&mut self) -> usize {
        let row = std::mem::take(&mut self.temporary_row);
        self.store_row(&row);
        self.temporary_row = row;
        self.row_count - 1
    }

    /// Row at storage position `index`, ignoring any order overlay
    pub fn raw_row(&self, index: usize) -> RowProxy<'_> {
        RowProxy { table: self, index }
    }

    /// Logical row `index`, resolved through the order overlay when present
    pub fn row(&self, index: usize) -> RowProxy<'_> {
        let index = match &self.order {
            Some(order) => order[index],
            None => index,
        };
        RowProxy { table: self, index }
    }

    /// Rows in logical order
    pub fn iter(&self) -> impl Iterator<Item = RowProxy<'_>> + '_ {
        (0..self.row_count).map(move |i| self.row(i))
    }

    /// Attach a permutation of storage positions as the logical order
    pub fn add_order(&mut self, order: Vec<usize>) -> Result<()> {
        if order.len() != self.row_count {
            return Err(QueryError::validation(format!(
                "order of {} rows attached to a table of {} rows",
                order.len(),
                self.row_count
            )));
        }
        self.order = Some(order);
        Ok(())
    }

    pub fn order(&self) -> Option<&[usize]> {
        self.order.as_deref()
    }

    fn element_at(&self, index: usize, slot: usize) -> Option<Element> {
        if index == self.row_count {
            return self.temporary_row.get(slot).copied().flatten();
        }
        if !self.used.get(slot).copied().unwrap_or(false) {
            return None;
        }
        let block = self.columns[slot].get(index / self.block_size)?;
        block.get(index % self.block_size).copied().flatten()
    }
}

/// `(table, storage index)` handle
///
/// The index equal to the table's row count designates the temporary row.
#[derive(Debug, Clone, Copy)]
pub struct RowProxy<'a> {
    table: &'a TableResults,
    index: usize,
}

impl<'a> RowProxy<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_temporary(&self) -> bool {
        self.index == self.table.row_count
    }

    /// Copy of the full row in scope layout
    pub fn to_scope(&self) -> Vec<Option<Element>> {
        (0..self.table.width()).map(|slot| self.element(slot)).collect()
    }
}

impl RowAccess for RowProxy<'_> {
    fn element(&self, slot: usize) -> Option<Element> {
        self.table.element_at(self.index, slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: u32) -> Option<Element> {
        Some(Element::Vertex(i))
    }

    #[test]
    fn test_store_rows_across_blocks() {
        let mut table = TableResults::new(vec![true, false, true], 2);
        for i in 0..5 {
            table.store_row(&[v(i), v(100), Some(Element::Edge(i))]);
        }

        assert_eq!(table.row_count(), 5);
        assert_eq!(table.block_count(), 3);
        let row = table.raw_row(3);
        assert_eq!(row.element(0), v(3));
        assert_eq!(row.element(1), None);
        assert_eq!(row.element(2), Some(Element::Edge(3)));
    }

    #[test]
    fn test_temporary_row_round_trip() {
        let mut table = TableResults::new(vec![true, true], 4);
        table.store_row(&[v(1), v(2)]);

        table.set_temporary_row(&[v(7), v(8)]);
        let proxy = table.temporary_proxy();
        assert!(proxy.is_temporary());
        assert_eq!(proxy.element(0), v(7));
        assert_eq!(table.row_count(), 1);

        let index = table.store_temporary_row();
        assert_eq!(index, 1);
        assert_eq!(table.raw_row(1).to_scope(), vec![v(7), v(8)]);
        assert_eq!(table.raw_row(0).to_scope(), vec![v(1), v(2)]);
    }

    #[test]
    fn test_order_overlay() {
        let mut table = TableResults::new(vec![true], 2);
        for i in 0..3 {
            table.store_row(&[v(i)]);
        }
        table.add_order(vec![2, 0, 1]).unwrap();

        let logical: Vec<_> = table.iter().map(|r| r.element(0)).collect();
        assert_eq!(logical, vec![v(2), v(0), v(1)]);
        assert_eq!(table.raw_row(0).element(0), v(0));
        assert!(table.add_order(vec![0]).is_err());
    }
}
