// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! End-to-end query tests against small JSON graphs

#[cfg(test)]
mod end_to_end {
    use graphmatch::{
        load_graph, parse_graph, AggregateStorageKind, EngineConfig, ExecutionMode, GrouperKind, OutputValue,
        QueryEngine, QueryError, QueryTelemetry, Stage,
    };
    use std::io::Write;

    const CHAIN: &str = r#"{
        "vertex_tables": [{"name": "Person", "properties": {"val": "int", "name": "string"}}],
        "edge_tables": [{"name": "Knows", "properties": {"since": "int"}}],
        "vertices": [
            {"id": 1, "table": "Person", "properties": {"val": 10, "name": "ann"}},
            {"id": 2, "table": "Person", "properties": {"val": 10, "name": "bob"}},
            {"id": 3, "table": "Person", "properties": {"val": 20}}
        ],
        "edges": [
            {"id": 1, "table": "Knows", "from": 1, "to": 2, "properties": {"since": 2001}},
            {"id": 2, "table": "Knows", "from": 2, "to": 3, "properties": {"since": 2010}}
        ]
    }"#;

    fn engine(config: EngineConfig) -> QueryEngine {
        let graph = parse_graph(CHAIN).expect("Failed to parse graph");
        QueryEngine::new(graph, config).expect("Failed to create engine")
    }

    fn int(v: i64) -> OutputValue {
        OutputValue::Int(v)
    }

    #[test]
    fn test_edge_count_across_thread_counts() {
        for threads in [1, 4] {
            let result = engine(EngineConfig::with_threads(threads))
                .execute("MATCH (x)->(y) RETURN count(*)")
                .unwrap();
            assert_eq!(result.rows, vec![vec![int(2)]], "threads = {}", threads);
            assert_eq!(result.matched, 2);
        }
    }

    #[test]
    fn test_group_by_property() {
        for threads in [1, 2, 4] {
            let result = engine(EngineConfig::with_threads(threads))
                .execute("SELECT x.val, count(*) AS n MATCH (x) GROUP BY x.val ORDER BY x.val")
                .unwrap();
            assert_eq!(result.columns, vec!["x.val", "n"]);
            assert_eq!(
                result.rows,
                vec![vec![int(10), int(2)], vec![int(20), int(1)]],
                "threads = {}",
                threads
            );
        }
    }

    #[test]
    fn test_count_only_limit_agrees_across_modes() {
        let modes = [
            ExecutionMode::Materialized,
            ExecutionMode::HalfStreamed,
            ExecutionMode::Streamed,
        ];
        for (query, expected) in [
            ("SELECT count(*) MATCH (x) LIMIT 0", vec![]),
            ("SELECT count(*) MATCH (x) LIMIT 1", vec![vec![int(3)]]),
        ] {
            for mode in modes {
                let result = engine(EngineConfig::single_threaded().mode(mode)).execute(query).unwrap();
                assert_eq!(result.rows, expected, "{} under {}", query, mode);
                assert_eq!(result.matched, 3);
            }
        }
    }

    #[test]
    fn test_where_filters_with_missing_properties() {
        // vertex 3 has no name, so the comparison is unknown and filtered out
        let result = engine(EngineConfig::single_threaded())
            .execute("SELECT count(*) MATCH (x) WHERE x.name <> 'ann'")
            .unwrap();
        assert_eq!(result.rows, vec![vec![int(1)]]);
    }

    #[test]
    fn test_edge_property_and_path() {
        let result = engine(EngineConfig::with_threads(2))
            .execute("SELECT x.name, z.val MATCH (x)-[e]->(y)-[f]->(z) WHERE e.since < f.since")
            .unwrap();
        assert_eq!(result.rows, vec![vec![OutputValue::Str("ann".into()), int(20)]]);
    }

    #[test]
    fn test_return_form_with_limit() {
        let result = engine(EngineConfig::with_threads(3))
            .execute("MATCH (x)->(y) RETURN y.val ORDER BY y.val DESC LIMIT 1")
            .unwrap();
        assert_eq!(result.rows, vec![vec![int(20)]]);
        assert_eq!(result.matched, 2);
    }

    #[test]
    fn test_aggregates_in_single_group() {
        let result = engine(EngineConfig::with_threads(2))
            .execute("SELECT count(x.name), sum(x.val), avg(x.val), min(x.name), max(x.val) MATCH (x)")
            .unwrap();
        assert_eq!(
            result.rows,
            vec![vec![
                int(2),
                int(40),
                OutputValue::Float(40.0 / 3.0),
                OutputValue::Str("ann".into()),
                int(20),
            ]]
        );
    }

    #[test]
    fn test_empty_match_yields_one_group_without_keys() {
        let result = engine(EngineConfig::single_threaded())
            .execute("SELECT count(*), avg(x.val) MATCH (x) WHERE x.val > 100")
            .unwrap();
        assert_eq!(result.rows, vec![vec![int(0), OutputValue::Null]]);

        let grouped = engine(EngineConfig::single_threaded())
            .execute("SELECT x.val, count(*) MATCH (x) WHERE x.val > 100 GROUP BY x.val")
            .unwrap();
        assert!(grouped.is_empty());
    }

    #[test]
    fn test_streamed_modes_match_materialized() {
        let query = "SELECT y.val, count(*), max(x.name) MATCH (x)->(y) GROUP BY y.val ORDER BY y.val";
        let expected = engine(EngineConfig::with_threads(2)).execute(query).unwrap();
        for mode in [ExecutionMode::HalfStreamed, ExecutionMode::Streamed] {
            let result = engine(EngineConfig::with_threads(2).mode(mode)).execute(query).unwrap();
            assert_eq!(result.rows, expected.rows, "mode = {}", mode);
        }
    }

    #[test]
    fn test_telemetry_records_stages() {
        let telemetry = QueryTelemetry::new();
        engine(EngineConfig::with_threads(2))
            .execute_with_telemetry("SELECT x.name MATCH (x) ORDER BY x.name", &telemetry)
            .unwrap();
        assert_eq!(telemetry.matched(), 3);
        assert!(telemetry.stage_duration(Stage::Parse).is_some());
        assert!(telemetry.stage_duration(Stage::Sort).is_some());
        assert!(telemetry.stage_duration(Stage::Group).is_none());
    }

    #[test]
    fn test_errors_are_reported() {
        let engine = engine(EngineConfig::single_threaded());
        assert!(matches!(engine.execute("SELECT MATCH"), Err(QueryError::Parse(_))));
        assert!(matches!(
            engine.execute("SELECT x.val MATCH (x:Company)"),
            Err(QueryError::Validation(_))
        ));
        assert!(matches!(
            engine.execute("SELECT x.val, count(*) MATCH (x)"),
            Err(QueryError::Validation(_))
        ));

        let bad = EngineConfig::single_threaded().grouper(GrouperKind::LocalTwoWayMerge, Some(AggregateStorageKind::Bucket));
        let engine = QueryEngine::new(parse_graph(CHAIN).unwrap(), bad).unwrap();
        assert!(matches!(
            engine.execute("SELECT x.val, count(*) MATCH (x) GROUP BY x.val"),
            Err(QueryError::TypeDispatch(_))
        ));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let graph = parse_graph(CHAIN).unwrap();
        assert!(matches!(
            QueryEngine::new(graph, EngineConfig::with_threads(0)),
            Err(QueryError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(CHAIN.as_bytes()).unwrap();
        let graph = load_graph(file.path()).unwrap();
        let engine = QueryEngine::new(graph, EngineConfig::single_threaded()).unwrap();
        let result = engine.execute("SELECT count(*) MATCH (x)-(y)").unwrap();
        assert_eq!(result.rows, vec![vec![int(4)]]);
    }
}
