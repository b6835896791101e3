// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Merge of per-worker tables into one table
//!
//! Full blocks are kept as they are. Partial blocks are sorted by fill and
//! the smallest one is drained into the free space of the largest one, with
//! both cursors moving inward, so at most one partial block survives and it
//! ends up last. Every column of a worker has the same block shape, so each
//! column undergoes the same permutation and rows stay aligned.

use log::debug;
use parking_lot::Mutex;
use rayon::ThreadPool;

use super::distributor::ColumnDistributor;
use crate::table::{Block, TableResults};

/// Merge worker tables, dividing the columns among at most `thread_count` workers
pub fn merge_tables(mut tables: Vec<TableResults>, pool: &ThreadPool, thread_count: usize) -> TableResults {
    if tables.len() == 1 {
        if let Some(table) = tables.pop() {
            return table;
        }
    }
    let Some(first) = tables.first() else {
        return TableResults::new(Vec::new(), 1);
    };

    let used = first.used().to_vec();
    let block_size = first.block_size();
    let width = first.width();
    let row_count = tables.iter().map(TableResults::row_count).sum();
    let columns: Vec<usize> = first.used_slots().collect();

    // inputs[column][thread]
    let inputs: Vec<Mutex<Vec<Vec<Block>>>> = columns
        .iter()
        .map(|slot| Mutex::new(tables.iter_mut().map(|t| t.take_column(*slot)).collect()))
        .collect();
    let outputs: Vec<Mutex<Vec<Block>>> = columns.iter().map(|_| Mutex::new(Vec::new())).collect();

    let distributor = ColumnDistributor::new(columns.len());
    let workers = thread_count.min(columns.len()).max(1);
    let merge_next = || {
        while let Some(column) = distributor.next() {
            let blocks = std::mem::take(&mut *inputs[column].lock());
            *outputs[column].lock() = merge_column(blocks, block_size);
        }
    };
    if workers == 1 {
        merge_next();
    } else {
        pool.scope(|s| {
            for _ in 0..workers {
                s.spawn(|_| merge_next());
            }
        });
    }

    let mut merged = vec![Vec::new(); width];
    for (slot, output) in columns.iter().zip(outputs) {
        merged[*slot] = output.into_inner();
    }
    debug!(
        "Merged {} worker tables into {} rows over {} columns",
        tables.len(),
        row_count,
        columns.len()
    );
    TableResults::from_columns(used, block_size, merged, row_count)
}

/// Merge the blocks of one column, `per_thread[thread]` in thread order
fn merge_column(per_thread: Vec<Vec<Block>>, block_size: usize) -> Vec<Block> {
    let mut full = Vec::new();
    let mut partials = Vec::new();
    for (thread, blocks) in per_thread.into_iter().enumerate() {
        for block in blocks {
            if block.len() == block_size {
                full.push(block);
            } else if !block.is_empty() {
                partials.push((block.len(), thread, block));
            }
        }
    }
    if partials.is_empty() {
        return full;
    }

    partials.sort_by_key(|(len, thread, _)| (*len, *thread));
    let mut partials: Vec<Block> = partials.into_iter().map(|(_, _, block)| block).collect();

    let (mut lo, mut hi) = (0, partials.len() - 1);
    while lo < hi {
        let free = block_size - partials[hi].len();
        let take = free.min(partials[lo].len());
        let start = partials[lo].len() - take;
        let moved = partials[lo].split_off(start);
        partials[hi].extend(moved);

        if partials[hi].len() == block_size {
            full.push(std::mem::take(&mut partials[hi]));
            hi -= 1;
        }
        if partials[lo].is_empty() {
            lo += 1;
        }
    }
    if lo == hi && !partials[lo].is_empty() {
        full.push(std::mem::take(&mut partials[lo]));
    }
    full
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::RowAccess;
    use crate::graph::Element;
    use rayon::ThreadPoolBuilder;

    fn table(thread: u32, rows: u32, block_size: usize) -> TableResults {
        let mut table = TableResults::new(vec![true, false, true], block_size);
        for i in 0..rows {
            let id = thread * 1000 + i;
            table.store_row(&[Some(Element::Vertex(id)), None, Some(Element::Edge(id))]);
        }
        table
    }

    fn collect(table: &TableResults) -> Vec<(Option<Element>, Option<Element>)> {
        let mut rows: Vec<_> = table.iter().map(|r| (r.element(0), r.element(2))).collect();
        rows.sort();
        rows
    }

    #[test]
    fn test_merge_keeps_every_row_aligned() {
        let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        for counts in [[5, 0, 3, 4], [4, 4, 4, 4], [1, 2, 3, 9], [0, 0, 0, 0], [7, 1, 0, 2]] {
            let tables: Vec<_> = counts
                .iter()
                .enumerate()
                .map(|(t, n)| table(t as u32, *n, 4))
                .collect();
            let mut expected: Vec<_> = tables.iter().flat_map(collect).collect();
            expected.sort();

            let merged = merge_tables(tables, &pool, 4);
            assert_eq!(merged.row_count(), counts.iter().sum::<u32>() as usize);
            assert_eq!(collect(&merged), expected);
            for row in merged.iter() {
                if let (Some(Element::Vertex(v)), Some(Element::Edge(e))) = (row.element(0), row.element(2)) {
                    assert_eq!(v, e);
                }
            }
        }
    }

    #[test]
    fn test_merge_column_leaves_one_partial_last() {
        let block = |n: u32| (0..n).map(|i| Some(Element::Vertex(i))).collect::<Block>();
        let merged = merge_column(vec![vec![block(4), block(1)], vec![block(3)], vec![block(2)]], 4);
        let sizes: Vec<_> = merged.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }
}
