// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query execution engine
//!
//! Ties the stages together: parse, plan, match, then either merge, group
//! and sort materialized tables or feed a streaming processor, and finally
//! project the output columns.

use log::{debug, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

use super::plan::{OutputExpr, PlanShape, QueryPlan};
use super::result::QueryResult;
use crate::aggregate::OutputValue;
use crate::ast::Query;
use crate::compare::RowComparer;
use crate::config::{EngineConfig, ExecutionMode};
use crate::error::{QueryError, Result};
use crate::expr::RowAccess;
use crate::graph::Graph;
use crate::group::{create_grouper, GroupByResults, GroupContext, GroupEntry, Grouper, SingleGroupGroupBy};
use crate::matcher::{merge_tables, ParallelMatcher};
use crate::parser::parse_query;
use crate::sort::{sort_by_values, sort_table};
use crate::streaming::{create_processor, ProcessorKind, ProcessorOutput, StreamContext, StreamMode};
use crate::telemetry::{QueryTelemetry, Stage};

/// Projected row plus the values it is ordered by
type SortableRow = (Vec<OutputValue>, Vec<OutputValue>);

/// Executes queries against one immutable graph on a fixed worker pool
#[derive(Clone)]
pub struct QueryEngine {
    graph: Arc<Graph>,
    config: EngineConfig,
    pool: Arc<ThreadPool>,
}

impl QueryEngine {
    /// Create an engine; fails on an invalid configuration
    pub fn new(graph: impl Into<Arc<Graph>>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.thread_count)
            .thread_name(|i| format!("graphmatch-worker-{}", i))
            .build()
            .map_err(|e| QueryError::configuration(format!("failed to build worker pool: {}", e)))?;
        info!(
            "Query engine ready: {} threads, grouper {} ({}), {} execution",
            config.thread_count,
            config.grouper,
            config.resolved_storage(),
            config.mode
        );
        Ok(Self {
            graph: graph.into(),
            config,
            pool: Arc::new(pool),
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn execute(&self, text: &str) -> Result<QueryResult> {
        self.execute_with_telemetry(text, &QueryTelemetry::new())
    }

    /// Execute `text`, recording stage timings into `telemetry`
    pub fn execute_with_telemetry(&self, text: &str, telemetry: &QueryTelemetry) -> Result<QueryResult> {
        let query = telemetry.time(Stage::Parse, || parse_query(text))?;
        self.execute_query(query, telemetry)
    }

    pub fn execute_query(&self, query: Query, telemetry: &QueryTelemetry) -> Result<QueryResult> {
        let plan = telemetry.time(Stage::Plan, || QueryPlan::build(query, self.graph.schema()))?;
        let matcher = ParallelMatcher::new(&self.graph, &plan.pattern, &self.pool, &self.config)?;

        let streamable = match plan.shape {
            PlanShape::Rows => !plan.row_order.is_empty(),
            PlanShape::Grouped | PlanShape::SingleGroup => true,
        };
        let (rows, matched) = match self.config.mode {
            ExecutionMode::HalfStreamed | ExecutionMode::Streamed if streamable => {
                self.run_streamed(&plan, &matcher, telemetry)?
            }
            mode => {
                if mode != ExecutionMode::Materialized {
                    debug!("Unordered row query runs materialized under {} execution", mode);
                }
                self.run_materialized(&plan, &matcher, telemetry)?
            }
        };
        telemetry.set_matched(matched);

        Ok(QueryResult {
            columns: plan.column_names(),
            rows,
            matched,
        })
    }

    fn limit(&self, plan: &QueryPlan) -> usize {
        plan.limit.unwrap_or(usize::MAX)
    }

    fn run_materialized(
        &self,
        plan: &QueryPlan,
        matcher: &ParallelMatcher<'_>,
        telemetry: &QueryTelemetry,
    ) -> Result<(Vec<Vec<OutputValue>>, u64)> {
        if plan.is_count_only() {
            let matched = telemetry.time(Stage::Match, || matcher.count());
            let row = plan
                .outputs
                .iter()
                .map(|_| OutputValue::Int(matched as i64))
                .collect();
            let rows = std::iter::once(row).take(self.limit(plan)).collect();
            return Ok((rows, matched));
        }

        // resolve the grouper before doing any work
        let grouper: Option<Box<dyn Grouper>> = match plan.shape {
            PlanShape::Rows => None,
            PlanShape::SingleGroup => Some(Box::new(SingleGroupGroupBy)),
            PlanShape::Grouped => Some(create_grouper(
                self.config.grouper,
                self.config.resolved_storage(),
            )?),
        };

        let (tables, matched) = telemetry.time(Stage::Match, || matcher.collect(&plan.used));
        let mut table = telemetry.time(Stage::Merge, || {
            merge_tables(tables, &self.pool, self.config.thread_count)
        });
        debug!("Materialized {} rows", table.row_count());

        let Some(grouper) = grouper else {
            if !plan.row_order.is_empty() {
                let comparer = RowComparer::new(&plan.row_order, self.graph.schema());
                telemetry.time(Stage::Sort, || {
                    sort_table(&mut table, &comparer, &self.graph, &self.pool, self.config.thread_count)
                })?;
            }
            let rows = telemetry.time(Stage::Project, || {
                table
                    .iter()
                    .take(self.limit(plan))
                    .map(|row| self.project_row(plan, &row))
                    .collect()
            });
            return Ok((rows, matched));
        };

        let ctx = GroupContext {
            graph: &self.graph,
            keys: &plan.group_keys,
            aggregates: &plan.aggregates,
            pool: &self.pool,
            thread_count: self.config.thread_count,
            array_capacity: self.config.array_initial_capacity,
        };
        let groups = telemetry.time(Stage::Group, || grouper.group(&ctx, &table));
        debug!("{} grouper produced {} groups", grouper.name(), groups.len());

        let results = GroupByResults {
            tables: vec![table],
            groups,
        };
        Ok((self.project_groups(plan, &results, telemetry), matched))
    }

    fn run_streamed(
        &self,
        plan: &QueryPlan,
        matcher: &ParallelMatcher<'_>,
        telemetry: &QueryTelemetry,
    ) -> Result<(Vec<Vec<OutputValue>>, u64)> {
        let kind = match plan.shape {
            PlanShape::Rows => ProcessorKind::Sorted(RowComparer::new(&plan.row_order, self.graph.schema())),
            PlanShape::SingleGroup => ProcessorKind::SingleGroup,
            PlanShape::Grouped => {
                let mode = match self.config.mode {
                    ExecutionMode::Streamed if plan.supports_full_streaming() => StreamMode::Full,
                    ExecutionMode::Streamed => {
                        warn!("Output reads non-key columns of a group; streaming half instead of fully");
                        StreamMode::Half
                    }
                    _ => StreamMode::Half,
                };
                ProcessorKind::Grouped {
                    grouper: self.config.grouper,
                    storage: self.config.resolved_storage(),
                    mode,
                }
            }
        };
        let ctx = StreamContext {
            graph: &self.graph,
            keys: &plan.group_keys,
            aggregates: &plan.aggregates,
            pool: &self.pool,
            thread_count: self.config.thread_count,
            used: plan.used.clone(),
            block_size: self.config.block_size,
            array_capacity: self.config.array_initial_capacity,
        };
        let processor = create_processor(kind, ctx)?;

        let matched = telemetry.time(Stage::Match, || matcher.stream(processor.as_ref()));
        let output = telemetry.time(Stage::Group, || processor.finish());

        let rows = match output {
            ProcessorOutput::Groups(results) => self.project_groups(plan, &results, telemetry),
            ProcessorOutput::Rows { tables, order } => telemetry.time(Stage::Project, || {
                order
                    .iter()
                    .take(self.limit(plan))
                    .map(|r| self.project_row(plan, &tables[r.table].raw_row(r.row)))
                    .collect()
            }),
        };
        Ok((rows, matched))
    }

    fn project_row<R: RowAccess + ?Sized>(&self, plan: &QueryPlan, row: &R) -> Vec<OutputValue> {
        plan.outputs
            .iter()
            .map(|column| match &column.expr {
                OutputExpr::Row(expr) => OutputValue::from_value(expr.evaluate(row, &self.graph), &self.graph),
                // key and aggregate outputs only exist in grouped plans
                OutputExpr::Key(_) | OutputExpr::Aggregate(_) => OutputValue::Null,
            })
            .collect()
    }

    fn group_value(&self, expr: &OutputExpr, group: &GroupEntry, results: &GroupByResults) -> OutputValue {
        match expr {
            OutputExpr::Key(key) => OutputValue::from_value(group.keys[*key].clone(), &self.graph),
            OutputExpr::Aggregate(aggregate) => group.aggregates[*aggregate].clone(),
            OutputExpr::Row(expr) => match results.representative(group) {
                Some(row) => OutputValue::from_value(expr.evaluate(&row, &self.graph), &self.graph),
                None => OutputValue::Null,
            },
        }
    }

    fn project_groups(
        &self,
        plan: &QueryPlan,
        results: &GroupByResults,
        telemetry: &QueryTelemetry,
    ) -> Vec<Vec<OutputValue>> {
        let mut rows: Vec<SortableRow> = telemetry.time(Stage::Project, || {
            results
                .groups
                .iter()
                .map(|group| {
                    let values = plan
                        .outputs
                        .iter()
                        .map(|c| self.group_value(&c.expr, group, results))
                        .collect();
                    let keys = plan
                        .group_order
                        .iter()
                        .map(|(expr, _)| self.group_value(expr, group, results))
                        .collect();
                    (values, keys)
                })
                .collect()
        });

        if !plan.group_order.is_empty() {
            let ascending: Vec<bool> = plan.group_order.iter().map(|(_, asc)| *asc).collect();
            telemetry.time(Stage::Sort, || {
                sort_by_values(
                    &mut rows,
                    |row: &SortableRow| &row.1[..],
                    &ascending,
                    &self.pool,
                    self.config.thread_count,
                )
            });
        }
        rows.truncate(self.limit(plan));
        rows.into_iter().map(|(values, _)| values).collect()
    }
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("vertices", &self.graph.vertex_count())
            .field("edges", &self.graph.edge_count())
            .field("config", &self.config)
            .finish()
    }
}
