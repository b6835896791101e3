// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Parallel matcher driving one DFS matcher per worker

use log::debug;
use parking_lot::Mutex;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicU64, Ordering};

use super::dfs::{DfsMatcher, MatchSink};
use super::distributor::VertexDistributor;
use crate::config::EngineConfig;
use crate::error::{QueryError, Result};
use crate::graph::{Element, Graph};
use crate::pattern::Pattern;
use crate::streaming::ResultProcessor;
use crate::table::TableResults;

/// Forwards matches of one worker to a shared processor
struct ProcessorSink<'a> {
    thread: usize,
    processor: &'a dyn ResultProcessor,
}

impl MatchSink for ProcessorSink<'_> {
    fn emit(&mut self, scope: &[Option<Element>]) {
        self.processor.process(self.thread, Some(scope));
    }
}

pub struct ParallelMatcher<'a> {
    graph: &'a Graph,
    pattern: &'a Pattern,
    pool: &'a ThreadPool,
    thread_count: usize,
    vertices_per_thread: usize,
    block_size: usize,
}

impl<'a> ParallelMatcher<'a> {
    pub fn new(
        graph: &'a Graph,
        pattern: &'a Pattern,
        pool: &'a ThreadPool,
        config: &EngineConfig,
    ) -> Result<Self> {
        if config.thread_count == 0 {
            return Err(QueryError::configuration("thread_count must be at least 1"));
        }
        if config.vertices_per_thread == 0 {
            return Err(QueryError::configuration(
                "vertices_per_thread must be at least 1",
            ));
        }
        Ok(Self {
            graph,
            pattern,
            pool,
            thread_count: config.thread_count,
            vertices_per_thread: config.vertices_per_thread,
            block_size: config.block_size,
        })
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    fn all_vertices(&self) -> std::ops::Range<u32> {
        0..self.graph.vertex_count() as u32
    }

    /// Run one worker until the distributor is exhausted
    fn work<S: MatchSink + ?Sized>(&self, distributor: &VertexDistributor, sink: &mut S) -> u64 {
        let mut matcher = DfsMatcher::new(self.graph, self.pattern);
        while let Some(range) = distributor.next_range() {
            for start in range {
                matcher.run_from(start, sink);
            }
        }
        matcher.matched()
    }

    /// Number of matches, without storing any row
    pub fn count(&self) -> u64 {
        if self.thread_count == 1 {
            return DfsMatcher::new(self.graph, self.pattern).count_from(self.all_vertices());
        }

        let distributor = VertexDistributor::new(self.graph.vertex_count(), self.vertices_per_thread);
        let total = AtomicU64::new(0);
        self.pool.scope(|s| {
            for _ in 0..self.thread_count {
                s.spawn(|_| {
                    let mut matcher = DfsMatcher::new(self.graph, self.pattern);
                    let mut matched = 0;
                    while let Some(range) = distributor.next_range() {
                        matched += matcher.count_from(range);
                    }
                    total.fetch_add(matched, Ordering::Relaxed);
                });
            }
        });
        total.into_inner()
    }

    /// Store every match into one private table per worker
    ///
    /// A single thread skips the distributor and the pool entirely.
    pub fn collect(&self, used: &[bool]) -> (Vec<TableResults>, u64) {
        if self.thread_count == 1 {
            let mut table = TableResults::new(used.to_vec(), self.block_size);
            let mut matcher = DfsMatcher::new(self.graph, self.pattern);
            for start in self.all_vertices() {
                matcher.run_from(start, &mut table);
            }
            return (vec![table], matcher.matched());
        }

        let distributor = VertexDistributor::new(self.graph.vertex_count(), self.vertices_per_thread);
        let slots: Vec<Mutex<Option<TableResults>>> =
            (0..self.thread_count).map(|_| Mutex::new(None)).collect();
        let total = AtomicU64::new(0);

        self.pool.scope(|s| {
            for slot in &slots {
                let distributor = &distributor;
                let total = &total;
                s.spawn(move |_| {
                    let mut table = TableResults::new(used.to_vec(), self.block_size);
                    let matched = self.work(distributor, &mut table);
                    total.fetch_add(matched, Ordering::Relaxed);
                    *slot.lock() = Some(table);
                });
            }
        });

        let tables: Vec<TableResults> = slots.into_iter().filter_map(|s| s.into_inner()).collect();
        let matched = total.into_inner();
        debug!(
            "Matched {} rows across {} worker tables",
            matched,
            tables.len()
        );
        (tables, matched)
    }

    /// Push every match into `processor`, each worker ending its stream with `None`
    pub fn stream(&self, processor: &dyn ResultProcessor) -> u64 {
        if self.thread_count == 1 {
            let mut sink = ProcessorSink { thread: 0, processor };
            let mut matcher = DfsMatcher::new(self.graph, self.pattern);
            for start in self.all_vertices() {
                matcher.run_from(start, &mut sink);
            }
            processor.process(0, None);
            return matcher.matched();
        }

        let distributor = VertexDistributor::new(self.graph.vertex_count(), self.vertices_per_thread);
        let total = AtomicU64::new(0);
        self.pool.scope(|s| {
            for thread in 0..self.thread_count {
                let distributor = &distributor;
                let total = &total;
                s.spawn(move |_| {
                    let mut sink = ProcessorSink { thread, processor };
                    let matched = self.work(distributor, &mut sink);
                    processor.process(thread, None);
                    total.fetch_add(matched, Ordering::Relaxed);
                });
            }
        });
        total.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, Value, ValueType};
    use crate::parser::parse_query;
    use crate::pattern::compile;
    use rayon::ThreadPoolBuilder;

    fn chain_graph(n: i64) -> Graph {
        let mut builder = GraphBuilder::new();
        let node = builder.vertex_table("Node", Vec::<(&str, ValueType)>::new()).unwrap();
        let next = builder.edge_table("Next", Vec::<(&str, ValueType)>::new()).unwrap();
        for id in 0..n {
            builder.add_vertex(id, node, Vec::<(&str, Value)>::new()).unwrap();
        }
        for id in 0..n - 1 {
            builder
                .add_edge(id, next, id, id + 1, Vec::<(&str, Value)>::new())
                .unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_thread_counts_agree() {
        let graph = chain_graph(200);
        let query = parse_query("SELECT * MATCH (a)->(b)->(c)").unwrap();
        let (pattern, vars) = compile(query.patterns, graph.schema()).unwrap();
        let used = vec![true; vars.len()];

        for threads in [1, 2, 8] {
            let pool = ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
            let config = EngineConfig::with_threads(threads).vertices_per_thread(16);
            let matcher = ParallelMatcher::new(&graph, &pattern, &pool, &config).unwrap();

            assert_eq!(matcher.count(), 198);
            let (tables, matched) = matcher.collect(&used);
            assert_eq!(matched, 198);
            assert_eq!(tables.iter().map(|t| t.row_count()).sum::<usize>(), 198);
        }
    }

    #[test]
    fn test_invalid_configuration() {
        let graph = chain_graph(2);
        let query = parse_query("SELECT * MATCH (a)").unwrap();
        let (pattern, _) = compile(query.patterns, graph.schema()).unwrap();
        let pool = ThreadPoolBuilder::new().num_threads(1).build().unwrap();

        let config = EngineConfig::with_threads(0);
        assert!(matches!(
            ParallelMatcher::new(&graph, &pattern, &pool, &config),
            Err(QueryError::Configuration(_))
        ));
        let config = EngineConfig::single_threaded().vertices_per_thread(0);
        assert!(matches!(
            ParallelMatcher::new(&graph, &pattern, &pool, &config),
            Err(QueryError::Configuration(_))
        ));
    }
}
