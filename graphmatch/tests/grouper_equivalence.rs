// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Every grouper, aggregate storage and execution mode must produce the same
//! groups as a single-threaded materialized run.

#[cfg(test)]
mod grouper_equivalence {
    use graphmatch::{
        AggregateStorageKind, EngineConfig, ExecutionMode, Graph, GraphBuilder, GrouperKind, OutputValue,
        QueryEngine, Value, ValueType,
    };
    use std::sync::Arc;

    const COMBINATIONS: [(GrouperKind, AggregateStorageKind); 5] = [
        (GrouperKind::Global, AggregateStorageKind::Bucket),
        (GrouperKind::Global, AggregateStorageKind::Array),
        (GrouperKind::TwoStep, AggregateStorageKind::Bucket),
        (GrouperKind::TwoStep, AggregateStorageKind::Array),
        (GrouperKind::LocalTwoWayMerge, AggregateStorageKind::List),
    ];

    fn random_graph(seed: u64, vertices: i64, edges: i64) -> Graph {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut builder = GraphBuilder::new();
        let person = builder
            .vertex_table("Person", [("val", ValueType::Int), ("name", ValueType::Str)])
            .unwrap();
        let knows = builder.edge_table("Knows", [("weight", ValueType::Int)]).unwrap();

        for id in 0..vertices {
            let mut properties = vec![("val", Value::Int(rng.i64(0..7)))];
            // leave some names unset so null handling is exercised
            if rng.u8(0..4) > 0 {
                properties.push(("name", Value::Str(format!("p{}", rng.u32(0..50)))));
            }
            builder.add_vertex(id, person, properties).unwrap();
        }
        for id in 0..edges {
            let from = rng.i64(0..vertices);
            let to = rng.i64(0..vertices);
            builder
                .add_edge(id, knows, from, to, [("weight", Value::Int(rng.i64(-5..20)))])
                .unwrap();
        }
        builder.build()
    }

    fn run(graph: &Arc<Graph>, config: EngineConfig, query: &str) -> Vec<Vec<OutputValue>> {
        let label = format!("{:?}", config);
        QueryEngine::new(Arc::clone(graph), config)
            .unwrap()
            .execute(query)
            .unwrap_or_else(|e| panic!("{} failed under {}: {}", query, label, e))
            .rows
    }

    fn check(query: &str) {
        let graph = Arc::new(random_graph(7, 300, 1200));
        let expected = run(&graph, EngineConfig::single_threaded(), query);
        assert!(!expected.is_empty());

        for threads in [1, 2, 8] {
            for (grouper, storage) in COMBINATIONS {
                for mode in [
                    ExecutionMode::Materialized,
                    ExecutionMode::HalfStreamed,
                    ExecutionMode::Streamed,
                ] {
                    let config = EngineConfig::with_threads(threads)
                        .vertices_per_thread(16)
                        .block_size(64)
                        .grouper(grouper, Some(storage))
                        .mode(mode);
                    let rows = run(&graph, config, query);
                    assert_eq!(
                        rows, expected,
                        "{} with {} threads, {} ({}), {}",
                        query, threads, grouper, storage, mode
                    );
                }
            }
        }
    }

    #[test]
    fn test_single_key_aggregates() {
        check(
            "SELECT x.val, count(*), count(y.name), sum(e.weight), avg(e.weight), min(y.name), max(y.val) \
             MATCH (x)-[e]->(y) GROUP BY x.val ORDER BY x.val",
        );
    }

    #[test]
    fn test_composite_key_with_nulls() {
        check(
            "SELECT x.name, y.val, count(*) AS n, max(e.weight) \
             MATCH (x)-[e]->(y) GROUP BY x.name, y.val ORDER BY x.name, y.val",
        );
    }

    #[test]
    fn test_filtered_two_hop() {
        check(
            "SELECT z.val, count(*), sum(y.val) MATCH (x)->(y)->(z) WHERE x.val < z.val \
             GROUP BY z.val ORDER BY z.val DESC",
        );
    }

    #[test]
    fn test_ordered_rows() {
        let graph = Arc::new(random_graph(11, 120, 400));
        let query = "SELECT x.val, e.weight, id(x), id(y) MATCH (x)-[e]->(y) \
                     WHERE e.weight > 10 ORDER BY x.val, e.weight DESC, id(x), id(y) LIMIT 40";
        let expected = run(&graph, EngineConfig::single_threaded(), query);
        for threads in [2, 8] {
            for mode in [ExecutionMode::Materialized, ExecutionMode::HalfStreamed] {
                let config = EngineConfig::with_threads(threads).block_size(16).mode(mode);
                assert_eq!(run(&graph, config, query), expected, "{} threads, {}", threads, mode);
            }
        }
    }
}
