// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lock-free work distribution for matcher and merge workers

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out contiguous ranges of start vertices
#[derive(Debug)]
pub struct VertexDistributor {
    next: AtomicUsize,
    total: usize,
    chunk: usize,
}

impl VertexDistributor {
    pub fn new(total: usize, chunk: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            total,
            chunk: chunk.max(1),
        }
    }

    /// Next `[start, end)` range, `None` once every vertex has been handed out
    pub fn next_range(&self) -> Option<Range<u32>> {
        let start = self.next.fetch_add(self.chunk, Ordering::Relaxed);
        if start >= self.total {
            return None;
        }
        let end = (start + self.chunk).min(self.total);
        Some(start as u32..end as u32)
    }
}

/// Hands out column indices one at a time
#[derive(Debug)]
pub struct ColumnDistributor {
    next: AtomicUsize,
    count: usize,
}

impl ColumnDistributor {
    pub fn new(count: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            count,
        }
    }

    pub fn next(&self) -> Option<usize> {
        let column = self.next.fetch_add(1, Ordering::Relaxed);
        (column < self.count).then_some(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_ranges_cover_all_vertices() {
        let distributor = VertexDistributor::new(10, 4);
        assert_eq!(distributor.next_range(), Some(0..4));
        assert_eq!(distributor.next_range(), Some(4..8));
        assert_eq!(distributor.next_range(), Some(8..10));
        assert_eq!(distributor.next_range(), None);
        assert_eq!(distributor.next_range(), None);
    }

    #[test]
    fn test_concurrent_ranges_are_disjoint() {
        let distributor = VertexDistributor::new(1000, 7);
        let mut seen = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        let mut mine = Vec::new();
                        while let Some(range) = distributor.next_range() {
                            mine.extend(range);
                        }
                        mine
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });
        seen.sort_unstable();
        assert_eq!(seen, (0..1000).collect::<Vec<u32>>());
    }

    #[test]
    fn test_columns() {
        let distributor = ColumnDistributor::new(2);
        assert_eq!(distributor.next(), Some(0));
        assert_eq!(distributor.next(), Some(1));
        assert_eq!(distributor.next(), None);
    }
}
