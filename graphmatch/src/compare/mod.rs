// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Row comparison and group-key hashing
//!
//! Comparers are specialized per value type and chosen by the declared type
//! of the expression. A value that fails to evaluate sorts last ascending and
//! first descending. Two rows binding the same elements on every slot an
//! expression reads compare equal without evaluating it.

pub mod hasher;

use std::cmp::Ordering;

use crate::expr::{Expression, RowAccess};
use crate::graph::{Graph, Schema, Value, ValueType};
use crate::table::TableResults;

pub use hasher::{GroupKey, GroupKeyExprs, KeyProbe};

/// Value type a comparer is specialized for
pub trait SortKey: Sized + Clone + Send + Sync {
    fn extract(value: Value, graph: &Graph) -> Option<Self>;
    fn cmp_key(&self, other: &Self) -> Ordering;
}

impl SortKey for bool {
    fn extract(value: Value, _graph: &Graph) -> Option<Self> {
        value.as_bool()
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl SortKey for i64 {
    fn extract(value: Value, _graph: &Graph) -> Option<Self> {
        value.as_int()
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl SortKey for String {
    fn extract(value: Value, _graph: &Graph) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// Element ordered by its external id; vertices before edges on equal ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ElementKey {
    id: i64,
    edge: bool,
}

impl SortKey for ElementKey {
    fn extract(value: Value, graph: &Graph) -> Option<Self> {
        match value {
            Value::Element(e) => Some(ElementKey {
                id: graph.element_id(e),
                edge: e.is_edge(),
            }),
            _ => None,
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// Last evaluated operand, keyed by storage row
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    row: usize,
    value: Option<T>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            row: usize::MAX,
            value: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypedComparer<T: SortKey> {
    expr: Expression,
    slots: Vec<usize>,
    ascending: bool,
    left: CacheEntry<T>,
    right: CacheEntry<T>,
}

impl<T: SortKey> TypedComparer<T> {
    pub fn new(expr: Expression, ascending: bool) -> Self {
        let slots = expr.slots();
        Self {
            expr,
            slots,
            ascending,
            left: CacheEntry::default(),
            right: CacheEntry::default(),
        }
    }

    fn same_bindings<A: RowAccess + ?Sized, B: RowAccess + ?Sized>(&self, a: &A, b: &B) -> bool {
        self.slots.iter().all(|slot| a.element(*slot) == b.element(*slot))
    }

    fn evaluate<R: RowAccess + ?Sized>(&self, row: &R, graph: &Graph) -> Option<T> {
        self.expr.evaluate(row, graph).and_then(|v| T::extract(v, graph))
    }

    fn order(&self, left: Option<&T>, right: Option<&T>) -> Ordering {
        let ordering = match (left, right) {
            (Some(l), Some(r)) => l.cmp_key(r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }

    pub fn compare<A: RowAccess + ?Sized, B: RowAccess + ?Sized>(&self, graph: &Graph, a: &A, b: &B) -> Ordering {
        if self.same_bindings(a, b) {
            return Ordering::Equal;
        }
        let left = self.evaluate(a, graph);
        let right = self.evaluate(b, graph);
        self.order(left.as_ref(), right.as_ref())
    }

    /// Compare storage rows `a` and `b`, reusing the last evaluation of each side
    pub fn compare_cached(&mut self, graph: &Graph, table: &TableResults, a: usize, b: usize) -> Ordering {
        let (row_a, row_b) = (table.raw_row(a), table.raw_row(b));
        if self.same_bindings(&row_a, &row_b) {
            return Ordering::Equal;
        }
        if self.left.row != a {
            self.left = CacheEntry {
                row: a,
                value: self.evaluate(&row_a, graph),
            };
        }
        if self.right.row != b {
            self.right = CacheEntry {
                row: b,
                value: self.evaluate(&row_b, graph),
            };
        }
        self.order(self.left.value.as_ref(), self.right.value.as_ref())
    }
}

/// Comparer for one ORDER BY key, specialized by declared type
#[derive(Debug, Clone)]
pub enum ExpressionComparer {
    Bool(TypedComparer<bool>),
    Int(TypedComparer<i64>),
    Str(TypedComparer<String>),
    Element(TypedComparer<ElementKey>),
}

impl ExpressionComparer {
    pub fn new(expr: Expression, ascending: bool, schema: &Schema) -> Self {
        match expr.value_type(schema) {
            ValueType::Bool => ExpressionComparer::Bool(TypedComparer::new(expr, ascending)),
            ValueType::Int => ExpressionComparer::Int(TypedComparer::new(expr, ascending)),
            ValueType::Str => ExpressionComparer::Str(TypedComparer::new(expr, ascending)),
            ValueType::Element => ExpressionComparer::Element(TypedComparer::new(expr, ascending)),
        }
    }

    pub fn compare<A: RowAccess + ?Sized, B: RowAccess + ?Sized>(&self, graph: &Graph, a: &A, b: &B) -> Ordering {
        match self {
            ExpressionComparer::Bool(c) => c.compare(graph, a, b),
            ExpressionComparer::Int(c) => c.compare(graph, a, b),
            ExpressionComparer::Str(c) => c.compare(graph, a, b),
            ExpressionComparer::Element(c) => c.compare(graph, a, b),
        }
    }

    pub fn compare_cached(&mut self, graph: &Graph, table: &TableResults, a: usize, b: usize) -> Ordering {
        match self {
            ExpressionComparer::Bool(c) => c.compare_cached(graph, table, a, b),
            ExpressionComparer::Int(c) => c.compare_cached(graph, table, a, b),
            ExpressionComparer::Str(c) => c.compare_cached(graph, table, a, b),
            ExpressionComparer::Element(c) => c.compare_cached(graph, table, a, b),
        }
    }
}

/// Lexicographic multi-key comparer
#[derive(Debug, Clone, Default)]
pub struct RowComparer {
    keys: Vec<ExpressionComparer>,
}

impl RowComparer {
    pub fn new(order: &[(Expression, bool)], schema: &Schema) -> Self {
        Self {
            keys: order
                .iter()
                .map(|(expr, ascending)| ExpressionComparer::new(expr.clone(), *ascending, schema))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn compare<A: RowAccess + ?Sized, B: RowAccess + ?Sized>(&self, graph: &Graph, a: &A, b: &B) -> Ordering {
        for key in &self.keys {
            match key.compare(graph, a, b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    /// Single-threaded comparison of storage rows with per-key caching
    pub fn compare_cached(&mut self, graph: &Graph, table: &TableResults, a: usize, b: usize) -> Ordering {
        for key in &mut self.keys {
            match key.compare_cached(graph, table, a, b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Element, GraphBuilder, PropertyId};

    fn graph() -> (Graph, PropertyId) {
        let mut builder = GraphBuilder::new();
        let person = builder.vertex_table("Person", [("val", ValueType::Int)]).unwrap();
        builder.add_vertex(1, person, [("val", Value::Int(5))]).unwrap();
        builder.add_vertex(2, person, [("val", Value::Int(3))]).unwrap();
        builder.add_vertex(3, person, Vec::<(&str, Value)>::new()).unwrap();
        let graph = builder.build();
        let val = graph.schema().property_by_name("val").unwrap();
        (graph, val)
    }

    fn row(v: u32) -> [Option<Element>; 1] {
        [Some(Element::Vertex(v))]
    }

    #[test]
    fn test_missing_values_sort_last_then_mirror() {
        let (graph, val) = graph();
        let expr = Expression::Property { slot: 0, property: val };

        let asc = ExpressionComparer::new(expr.clone(), true, graph.schema());
        assert_eq!(asc.compare(&graph, &row(1)[..], &row(0)[..]), Ordering::Less);
        assert_eq!(asc.compare(&graph, &row(2)[..], &row(0)[..]), Ordering::Greater);

        let desc = ExpressionComparer::new(expr, false, graph.schema());
        assert_eq!(desc.compare(&graph, &row(1)[..], &row(0)[..]), Ordering::Greater);
        assert_eq!(desc.compare(&graph, &row(2)[..], &row(0)[..]), Ordering::Less);
    }

    #[test]
    fn test_elements_order_by_external_id() {
        let mut builder = GraphBuilder::new();
        let person = builder.vertex_table("Person", Vec::<(&str, ValueType)>::new()).unwrap();
        // arena order is the reverse of id order
        for id in [30, 20, 10] {
            builder.add_vertex(id, person, Vec::<(&str, Value)>::new()).unwrap();
        }
        let graph = builder.build();
        let comparer = RowComparer::new(&[(Expression::Variable(0), true)], graph.schema());

        let mut table = TableResults::new(vec![true], 4);
        for v in 0..3 {
            table.store_row(&row(v));
        }
        let order = crate::sort::sorted_order(&table, &comparer, &graph);
        let ids: Vec<_> = order
            .iter()
            .map(|r| graph.element_id(table.raw_row(*r).element(0).unwrap()))
            .collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(comparer.compare(&graph, &row(0)[..], &row(2)[..]), Ordering::Greater);
    }

    #[test]
    fn test_identical_bindings_short_circuit() {
        let (graph, val) = graph();
        let comparer = RowComparer::new(&[(Expression::Property { slot: 0, property: val }, true)], graph.schema());
        assert_eq!(comparer.compare(&graph, &row(2)[..], &row(2)[..]), Ordering::Equal);
    }

    #[test]
    fn test_cached_matches_uncached() {
        let (graph, val) = graph();
        let mut table = TableResults::new(vec![true], 2);
        for v in [0, 1, 2, 1] {
            table.store_row(&row(v));
        }
        let order = [
            (Expression::Property { slot: 0, property: val }, false),
            (Expression::Id(0), true),
        ];
        let comparer = RowComparer::new(&order, graph.schema());
        let mut cached = comparer.clone();
        for a in 0..4 {
            for b in 0..4 {
                assert_eq!(
                    cached.compare_cached(&graph, &table, a, b),
                    comparer.compare(&graph, &table.raw_row(a), &table.raw_row(b)),
                );
            }
        }
    }
}
