// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sorting of result tables and projected rows
//!
//! Tables are never reordered in place: sorting computes a permutation and
//! attaches it as the table's order overlay.

use log::debug;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::cmp::Ordering;

use crate::aggregate::OutputValue;
use crate::compare::RowComparer;
use crate::error::Result;
use crate::graph::Graph;
use crate::table::TableResults;

/// Sorted permutation of the storage rows, computed on the calling thread
///
/// Uses the caching comparer, which is only valid single-threaded.
pub fn sorted_order(table: &TableResults, comparer: &RowComparer, graph: &Graph) -> Vec<usize> {
    let mut comparer = comparer.clone();
    let mut order: Vec<usize> = (0..table.row_count()).collect();
    order.sort_by(|a, b| comparer.compare_cached(graph, table, *a, *b));
    order
}

/// Sort `table` by attaching an order overlay
pub fn sort_table(
    table: &mut TableResults,
    comparer: &RowComparer,
    graph: &Graph,
    pool: &ThreadPool,
    thread_count: usize,
) -> Result<()> {
    let order = if thread_count <= 1 {
        sorted_order(table, comparer, graph)
    } else {
        let rows: &TableResults = table;
        let mut order: Vec<usize> = (0..rows.row_count()).collect();
        pool.install(|| {
            order.par_sort_by(|a, b| comparer.compare(graph, &rows.raw_row(*a), &rows.raw_row(*b)))
        });
        order
    };
    debug!("Sorted {} rows on {} threads", order.len(), thread_count.max(1));
    table.add_order(order)
}

/// Lexicographic comparison of projected sort values
pub fn compare_values(a: &[OutputValue], b: &[OutputValue], ascending: &[bool]) -> Ordering {
    for ((x, y), asc) in a.iter().zip(b).zip(ascending) {
        match x.order_cmp(y, *asc) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Sort already projected items by their sort values
pub fn sort_by_values<T, F>(items: &mut [T], key: F, ascending: &[bool], pool: &ThreadPool, thread_count: usize)
where
    T: Send,
    F: Fn(&T) -> &[OutputValue] + Sync,
{
    if thread_count <= 1 {
        items.sort_by(|a, b| compare_values(key(a), key(b), ascending));
    } else {
        pool.install(|| items.par_sort_by(|a, b| compare_values(key(a), key(b), ascending)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expression, RowAccess};
    use crate::graph::{Element, GraphBuilder, Value, ValueType};
    use rayon::ThreadPoolBuilder;

    #[test]
    fn test_sort_table_single_and_parallel_agree() {
        let mut builder = GraphBuilder::new();
        let person = builder.vertex_table("Person", [("val", ValueType::Int)]).unwrap();
        let values = [7, 3, 9, 3, 1, 8];
        for (id, val) in values.iter().enumerate() {
            builder
                .add_vertex(id as i64, person, [("val", Value::Int(*val))])
                .unwrap();
        }
        let graph = builder.build();
        let val = graph.schema().property_by_name("val").unwrap();
        let comparer = RowComparer::new(
            &[
                (Expression::Property { slot: 0, property: val }, false),
                (Expression::Id(0), true),
            ],
            graph.schema(),
        );
        let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();

        let mut results = Vec::new();
        for threads in [1, 4] {
            let mut table = TableResults::new(vec![true], 4);
            for v in 0..values.len() as u32 {
                table.store_row(&[Some(Element::Vertex(v))]);
            }
            sort_table(&mut table, &comparer, &graph, &pool, threads).unwrap();
            let ids: Vec<_> = table
                .iter()
                .map(|row| graph.element_id(row.element(0).unwrap()))
                .collect();
            results.push(ids);
        }
        assert_eq!(results[0], vec![2, 5, 0, 1, 3, 4]);
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn test_sort_by_values_nulls_last() {
        let pool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let mut rows = vec![
            vec![OutputValue::Null],
            vec![OutputValue::Int(2)],
            vec![OutputValue::Int(1)],
        ];
        sort_by_values(&mut rows, |r| &r[..], &[true], &pool, 2);
        assert_eq!(
            rows,
            vec![vec![OutputValue::Int(1)], vec![OutputValue::Int(2)], vec![OutputValue::Null]]
        );
    }
}
