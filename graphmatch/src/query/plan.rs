// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query planning: binding a parsed query against the graph schema

use log::debug;

use crate::aggregate::{AggregateFunction, AggregateKind, AggregateSpec};
use crate::ast::{Expr, Projection, Query};
use crate::compare::GroupKeyExprs;
use crate::error::{QueryError, Result};
use crate::expr::{Binder, Expression};
use crate::graph::Schema;
use crate::pattern::{compile, Pattern, VariableMap};

/// How an output column is computed
#[derive(Debug, Clone, PartialEq)]
pub enum OutputExpr {
    /// Evaluated on a match row, or on the group representative
    Row(Expression),
    /// Value of the GROUP BY key at this index
    Key(usize),
    /// Final value of the aggregate at this index
    Aggregate(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub name: String,
    pub expr: OutputExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanShape {
    /// One output row per match
    Rows,
    /// One output row per GROUP BY group
    Grouped,
    /// Aggregates without GROUP BY: exactly one output row
    SingleGroup,
}

#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub pattern: Pattern,
    pub variables: VariableMap,
    /// Scope slots that must be stored in result tables
    pub used: Vec<bool>,
    pub group_keys: GroupKeyExprs,
    pub aggregates: Vec<AggregateSpec>,
    pub outputs: Vec<OutputColumn>,
    /// ORDER BY of a `Rows` plan
    pub row_order: Vec<(Expression, bool)>,
    /// ORDER BY of a grouped plan
    pub group_order: Vec<(OutputExpr, bool)>,
    pub limit: Option<usize>,
    pub shape: PlanShape,
}

/// Aggregates referenced by a query, deduplicated
struct AggregateSet<'b> {
    binder: &'b Binder<'b>,
    specs: Vec<AggregateSpec>,
}

impl AggregateSet<'_> {
    fn index(&mut self, function: AggregateFunction, argument: Option<&Expr>) -> Result<usize> {
        let spec = match argument {
            None => AggregateSpec {
                kind: AggregateKind::resolve(function, None)?,
                argument: None,
            },
            Some(argument) => {
                if argument.contains_aggregate() {
                    return Err(QueryError::validation(format!(
                        "aggregate '{}' cannot be nested inside '{}'",
                        argument,
                        function.name()
                    )));
                }
                let bound = self.binder.bind(argument)?;
                let kind = AggregateKind::resolve(function, Some(bound.value_type(self.binder.schema())))?;
                AggregateSpec {
                    kind,
                    argument: Some(bound),
                }
            }
        };
        if let Some(existing) = self.specs.iter().position(|s| *s == spec) {
            return Ok(existing);
        }
        self.specs.push(spec);
        Ok(self.specs.len() - 1)
    }
}

/// Classify one SELECT or ORDER BY expression
fn output_expr(expr: &Expr, group_by: &[Expr], aggregates: &mut AggregateSet<'_>) -> Result<OutputExpr> {
    if let Expr::Aggregate { function, argument } = expr {
        return Ok(OutputExpr::Aggregate(
            aggregates.index(*function, argument.as_deref())?,
        ));
    }
    if expr.contains_aggregate() {
        return Err(QueryError::validation(format!(
            "aggregates cannot be combined with other operations in '{}'",
            expr
        )));
    }
    if let Some(key) = group_by.iter().position(|k| k == expr) {
        return Ok(OutputExpr::Key(key));
    }
    Ok(OutputExpr::Row(aggregates.binder.bind(expr)?))
}

fn mark_slots(used: &mut [bool], expr: &Expression) {
    for slot in expr.slots() {
        used[slot] = true;
    }
}

impl QueryPlan {
    pub fn build(query: Query, schema: &Schema) -> Result<Self> {
        let Query {
            projection,
            patterns,
            filter,
            group_by,
            order_by,
            limit,
        } = query;

        let (mut pattern, variables) = compile(patterns, schema)?;
        let binder = Binder::new(&variables, schema);

        if let Some(filter) = filter {
            if filter.contains_aggregate() {
                return Err(QueryError::validation("aggregates are not allowed in WHERE"));
            }
            for conjunct in filter.into_conjuncts() {
                let bound = binder.bind_boolean(&conjunct)?;
                let position = pattern.binding_position(&bound.slots());
                pattern.attach_filter(position, bound);
            }
        }

        let mut keys = Vec::with_capacity(group_by.len());
        for expr in &group_by {
            if expr.contains_aggregate() {
                return Err(QueryError::validation("aggregates are not allowed in GROUP BY"));
            }
            keys.push(binder.bind(expr)?);
        }

        let mut aggregates = AggregateSet {
            binder: &binder,
            specs: Vec::new(),
        };
        let outputs = match projection {
            Projection::All => {
                if !group_by.is_empty() {
                    return Err(QueryError::validation("SELECT * cannot be combined with GROUP BY"));
                }
                variables
                    .iter()
                    .map(|v| OutputColumn {
                        name: v.name.clone(),
                        expr: OutputExpr::Row(Expression::Variable(v.slot)),
                    })
                    .collect()
            }
            Projection::Items(items) => items
                .iter()
                .map(|item| -> Result<OutputColumn> {
                    Ok(OutputColumn {
                        name: item.column_name(),
                        expr: output_expr(&item.expr, &group_by, &mut aggregates)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        };

        let shape = if !group_by.is_empty() {
            PlanShape::Grouped
        } else if !aggregates.specs.is_empty() {
            PlanShape::SingleGroup
        } else {
            PlanShape::Rows
        };
        if shape == PlanShape::SingleGroup {
            if let Some(column) = outputs.iter().find(|c| matches!(c.expr, OutputExpr::Row(_))) {
                return Err(QueryError::validation(format!(
                    "'{}' must be an aggregate when the query has no GROUP BY",
                    column.name
                )));
            }
        }

        let mut row_order = Vec::new();
        let mut group_order = Vec::new();
        for item in &order_by {
            let alias = match &item.expr {
                Expr::Variable(name) if variables.slot(name).is_none() => {
                    outputs.iter().find(|c| &c.name == name).map(|c| c.expr.clone())
                }
                _ => None,
            };
            let expr = match alias {
                Some(expr) => expr,
                None if shape == PlanShape::Rows && item.expr.contains_aggregate() => {
                    return Err(QueryError::validation(format!(
                        "cannot order by aggregate '{}' without GROUP BY or aggregated output",
                        item.expr
                    )));
                }
                None => output_expr(&item.expr, &group_by, &mut aggregates)?,
            };
            match (shape, expr) {
                (PlanShape::Rows, OutputExpr::Row(expr)) => row_order.push((expr, item.ascending)),
                (PlanShape::SingleGroup, OutputExpr::Row(_)) => {
                    return Err(QueryError::validation(format!(
                        "cannot order by '{}' when the query has no GROUP BY",
                        item.expr
                    )));
                }
                (_, expr) => group_order.push((expr, item.ascending)),
            }
        }
        let aggregates = aggregates.specs;

        let mut used = vec![false; variables.len()];
        let row_exprs = outputs
            .iter()
            .map(|c| &c.expr)
            .chain(group_order.iter().map(|(e, _)| e))
            .filter_map(|e| match e {
                OutputExpr::Row(expr) => Some(expr),
                _ => None,
            });
        for expr in row_exprs
            .chain(row_order.iter().map(|(e, _)| e))
            .chain(keys.iter())
            .chain(aggregates.iter().filter_map(|a| a.argument.as_ref()))
        {
            mark_slots(&mut used, expr);
        }

        let plan = Self {
            pattern,
            used,
            group_keys: GroupKeyExprs::new(keys),
            aggregates,
            outputs,
            row_order,
            group_order,
            limit,
            shape,
            variables,
        };
        debug!(
            "Planned {:?} query over {} with {} aggregates",
            plan.shape,
            plan.pattern,
            plan.aggregates.len()
        );
        Ok(plan)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.outputs.iter().map(|c| c.name.clone()).collect()
    }

    /// Some output of a grouped plan reads the group representative
    pub fn needs_representative(&self) -> bool {
        self.shape == PlanShape::Grouped
            && self
                .outputs
                .iter()
                .map(|c| &c.expr)
                .chain(self.group_order.iter().map(|(e, _)| e))
                .any(|e| matches!(e, OutputExpr::Row(_)))
    }

    /// Full streaming is allowed when every non-aggregate output is a key
    pub fn supports_full_streaming(&self) -> bool {
        !self.needs_representative()
    }

    /// Every aggregate is `count(*)` and there is nothing to group by
    pub fn is_count_only(&self) -> bool {
        self.shape == PlanShape::SingleGroup && self.aggregates.iter().all(|a| a.kind.is_count_all())
    }
}
