// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! List aggregate storage: one growable column per aggregate, indexed by group ordinal
//!
//! Owned by exactly one thread; no atomics.

use std::cmp::Ordering;

use super::cell::{replace_if, Partial};
use super::{AggregateCell, AggregateInput, AggregateKind, Bucket, OutputValue};

#[derive(Debug, Clone)]
enum ListColumn {
    Count(Vec<u64>),
    Sum(Vec<i64>),
    Avg(Vec<(i64, u64)>),
    MinInt(Vec<Option<i64>>),
    MaxInt(Vec<Option<i64>>),
    MinStr(Vec<Option<String>>),
    MaxStr(Vec<Option<String>>),
}

impl ListColumn {
    fn new(kind: AggregateKind) -> Self {
        match kind {
            AggregateKind::CountAll | AggregateKind::Count => ListColumn::Count(Vec::new()),
            AggregateKind::SumInt => ListColumn::Sum(Vec::new()),
            AggregateKind::AvgInt => ListColumn::Avg(Vec::new()),
            AggregateKind::MinInt => ListColumn::MinInt(Vec::new()),
            AggregateKind::MaxInt => ListColumn::MaxInt(Vec::new()),
            AggregateKind::MinStr => ListColumn::MinStr(Vec::new()),
            AggregateKind::MaxStr => ListColumn::MaxStr(Vec::new()),
        }
    }

    fn push(&mut self) {
        match self {
            ListColumn::Count(v) => v.push(0),
            ListColumn::Sum(v) => v.push(0),
            ListColumn::Avg(v) => v.push((0, 0)),
            ListColumn::MinInt(v) | ListColumn::MaxInt(v) => v.push(None),
            ListColumn::MinStr(v) | ListColumn::MaxStr(v) => v.push(None),
        }
    }

    fn absorb(&mut self, group: usize, partial: Partial<'_>) {
        match (self, partial) {
            (ListColumn::Count(v), Partial::Count(n)) => v[group] += n,
            (ListColumn::Sum(v), Partial::Sum(s)) => v[group] = v[group].wrapping_add(s),
            (ListColumn::Avg(v), Partial::Avg { sum, count }) => {
                let (s, n) = &mut v[group];
                *s = s.wrapping_add(sum);
                *n += count;
            }
            (ListColumn::MinInt(v), Partial::Int(x)) => {
                v[group] = Some(v[group].map_or(x, |cur| cur.min(x)));
            }
            (ListColumn::MaxInt(v), Partial::Int(x)) => {
                v[group] = Some(v[group].map_or(x, |cur| cur.max(x)));
            }
            (ListColumn::MinStr(v), Partial::Str(s)) => replace_if(&mut v[group], s, Ordering::Less),
            (ListColumn::MaxStr(v), Partial::Str(s)) => {
                replace_if(&mut v[group], s, Ordering::Greater)
            }
            _ => {}
        }
    }

    fn partial(&self, group: usize) -> Option<Partial<'_>> {
        match self {
            ListColumn::Count(v) => Some(Partial::Count(v[group])),
            ListColumn::Sum(v) => Some(Partial::Sum(v[group])),
            ListColumn::Avg(v) => {
                let (sum, count) = v[group];
                Some(Partial::Avg { sum, count })
            }
            ListColumn::MinInt(v) | ListColumn::MaxInt(v) => v[group].map(Partial::Int),
            ListColumn::MinStr(v) | ListColumn::MaxStr(v) => v[group].as_deref().map(Partial::Str),
        }
    }

    fn value(&self, group: usize) -> OutputValue {
        match self {
            ListColumn::Count(v) => OutputValue::Int(v[group] as i64),
            ListColumn::Sum(v) => OutputValue::Int(v[group]),
            ListColumn::Avg(v) => match v[group] {
                (_, 0) => OutputValue::Null,
                (sum, count) => OutputValue::Float(sum as f64 / count as f64),
            },
            ListColumn::MinInt(v) | ListColumn::MaxInt(v) => {
                v[group].map(OutputValue::Int).unwrap_or(OutputValue::Null)
            }
            ListColumn::MinStr(v) | ListColumn::MaxStr(v) => v[group]
                .clone()
                .map(OutputValue::Str)
                .unwrap_or(OutputValue::Null),
        }
    }
}

/// Per-aggregate columns indexed by group ordinal
#[derive(Debug, Clone)]
pub struct ListStorage {
    kinds: Vec<AggregateKind>,
    columns: Vec<ListColumn>,
    groups: usize,
}

impl ListStorage {
    pub fn new(kinds: &[AggregateKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            columns: kinds.iter().map(|k| ListColumn::new(*k)).collect(),
            groups: 0,
        }
    }

    pub fn kinds(&self) -> &[AggregateKind] {
        &self.kinds
    }

    pub fn group_count(&self) -> usize {
        self.groups
    }

    /// Append an empty group, returning its ordinal
    pub fn add_group(&mut self) -> usize {
        for column in &mut self.columns {
            column.push();
        }
        self.groups += 1;
        self.groups - 1
    }

    pub fn apply(&mut self, group: usize, inputs: &[AggregateInput]) {
        for ((column, kind), input) in self.columns.iter_mut().zip(&self.kinds).zip(inputs) {
            if let Some(partial) = Partial::from_input(*kind, input) {
                column.absorb(group, partial);
            }
        }
    }

    /// Add `count` rows to every `count(*)` column of `group`
    pub fn add_count_all(&mut self, group: usize, count: u64) {
        for (column, kind) in self.columns.iter_mut().zip(&self.kinds) {
            if kind.is_count_all() {
                column.absorb(group, Partial::Count(count));
            }
        }
    }

    /// Fold `other_group` of `other` into `group`
    pub fn merge_group(&mut self, group: usize, other: &ListStorage, other_group: usize) {
        for (column, theirs) in self.columns.iter_mut().zip(&other.columns) {
            if let Some(partial) = theirs.partial(other_group) {
                column.absorb(group, partial);
            }
        }
    }

    /// Fold `group` into shared cells
    pub fn merge_into_cells(&self, group: usize, cells: &[AggregateCell], thread_safe: bool) {
        for (column, cell) in self.columns.iter().zip(cells) {
            if let Some(partial) = column.partial(group) {
                cell.absorb(partial, thread_safe);
            }
        }
    }

    /// Fold one aggregate of `group` into a shared cell
    pub fn merge_cell(&self, group: usize, aggregate: usize, cell: &AggregateCell, thread_safe: bool) {
        if let Some(partial) = self.columns[aggregate].partial(group) {
            cell.absorb(partial, thread_safe);
        }
    }

    /// Copy `group` into a new bucket
    pub fn to_bucket(&self, group: usize) -> Bucket {
        let bucket = super::new_bucket(&self.kinds);
        self.merge_into_cells(group, &bucket, false);
        bucket
    }

    pub fn value(&self, group: usize, aggregate: usize) -> OutputValue {
        self.columns[aggregate].value(group)
    }

    pub fn values(&self, group: usize) -> Vec<OutputValue> {
        self.columns.iter().map(|c| c.value(group)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_groups_across_storages() {
        let kinds = [AggregateKind::CountAll, AggregateKind::AvgInt, AggregateKind::MaxStr];
        let mut left = ListStorage::new(&kinds);
        let mut right = ListStorage::new(&kinds);
        let a = left.add_group();
        let b = right.add_group();

        for v in [1, 2, 3] {
            left.apply(
                a,
                &[AggregateInput::Count, AggregateInput::Int(v), AggregateInput::Str("m".into())],
            );
        }
        for v in [4, 5] {
            right.apply(
                b,
                &[AggregateInput::Count, AggregateInput::Int(v), AggregateInput::Skip],
            );
        }

        left.merge_group(a, &right, b);
        assert_eq!(
            left.values(a),
            vec![OutputValue::Int(5), OutputValue::Float(3.0), OutputValue::Str("m".into())]
        );
    }

    #[test]
    fn test_to_bucket_matches_list_values() {
        let kinds = [AggregateKind::MinInt, AggregateKind::SumInt];
        let mut list = ListStorage::new(&kinds);
        let g = list.add_group();
        list.apply(g, &[AggregateInput::Int(-4), AggregateInput::Int(-4)]);
        list.apply(g, &[AggregateInput::Int(-9), AggregateInput::Int(1)]);

        let bucket = list.to_bucket(g);
        assert_eq!(super::super::bucket_values(&bucket), list.values(g));
    }

    #[test]
    fn test_empty_group_values() {
        let mut list = ListStorage::new(&[AggregateKind::Count, AggregateKind::MinStr, AggregateKind::AvgInt]);
        let g = list.add_group();
        assert_eq!(
            list.values(g),
            vec![OutputValue::Int(0), OutputValue::Null, OutputValue::Null]
        );
    }
}
