// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bound scalar expressions
//!
//! Expressions reference variables by scope slot and properties by id, so
//! evaluation never looks up names. A missing binding, missing property or
//! comparison between different types evaluates to `None`.

pub mod binder;

use std::cmp::Ordering;

use crate::graph::{Element, Graph, PropertyId, Schema, Value, ValueType};

pub use binder::Binder;

/// Column access to one row (a scope, a stored table row or the temporary row)
pub trait RowAccess {
    fn element(&self, slot: usize) -> Option<Element>;
}

impl RowAccess for [Option<Element>] {
    fn element(&self, slot: usize) -> Option<Element> {
        self.get(slot).copied().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Variable(usize),
    Property { slot: usize, property: PropertyId },
    Id(usize),
    Compare {
        op: CompareOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    pub fn evaluate<R: RowAccess + ?Sized>(&self, row: &R, graph: &Graph) -> Option<Value> {
        match self {
            Expression::Literal(value) => Some(value.clone()),
            Expression::Variable(slot) => row.element(*slot).map(Value::Element),
            Expression::Property { slot, property } => {
                graph.try_get_property(row.element(*slot)?, *property).cloned()
            }
            Expression::Id(slot) => row.element(*slot).map(|e| Value::Int(graph.element_id(e))),
            Expression::Compare { op, left, right } => {
                let left = left.evaluate(row, graph)?;
                let right = right.evaluate(row, graph)?;
                if left.value_type() != right.value_type() {
                    return None;
                }
                Some(Value::Bool(op.holds(left.cmp(&right))))
            }
            // three-valued logic: a missing operand only matters when it can change the result
            Expression::And(left, right) => {
                match (truth(left, row, graph), truth(right, row, graph)) {
                    (Some(false), _) | (_, Some(false)) => Some(Value::Bool(false)),
                    (Some(true), Some(true)) => Some(Value::Bool(true)),
                    _ => None,
                }
            }
            Expression::Or(left, right) => {
                match (truth(left, row, graph), truth(right, row, graph)) {
                    (Some(true), _) | (_, Some(true)) => Some(Value::Bool(true)),
                    (Some(false), Some(false)) => Some(Value::Bool(false)),
                    _ => None,
                }
            }
            Expression::Not(inner) => truth(inner, row, graph).map(|b| Value::Bool(!b)),
        }
    }

    /// Filter semantics: only a definite `true` passes
    pub fn is_true<R: RowAccess + ?Sized>(&self, row: &R, graph: &Graph) -> bool {
        matches!(self.evaluate(row, graph), Some(Value::Bool(true)))
    }

    /// Declared result type
    pub fn value_type(&self, schema: &Schema) -> ValueType {
        match self {
            Expression::Literal(value) => value.value_type(),
            Expression::Variable(_) => ValueType::Element,
            Expression::Property { property, .. } => schema.property(*property).value_type,
            Expression::Id(_) => ValueType::Int,
            Expression::Compare { .. }
            | Expression::And(..)
            | Expression::Or(..)
            | Expression::Not(_) => ValueType::Bool,
        }
    }

    /// Scope slots read by this expression, sorted and deduplicated
    pub fn slots(&self) -> Vec<usize> {
        let mut slots = Vec::new();
        self.collect_slots(&mut slots);
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    fn collect_slots(&self, out: &mut Vec<usize>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Variable(slot) | Expression::Id(slot) => out.push(*slot),
            Expression::Property { slot, .. } => out.push(*slot),
            Expression::Compare { left, right, .. }
            | Expression::And(left, right)
            | Expression::Or(left, right) => {
                left.collect_slots(out);
                right.collect_slots(out);
            }
            Expression::Not(inner) => inner.collect_slots(out),
        }
    }
}

fn truth<R: RowAccess + ?Sized>(expr: &Expression, row: &R, graph: &Graph) -> Option<bool> {
    expr.evaluate(row, graph)?.as_bool()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn graph() -> Graph {
        let mut builder = GraphBuilder::new();
        let person = builder
            .vertex_table("Person", [("val", ValueType::Int), ("name", ValueType::Str)])
            .unwrap();
        builder.add_vertex(10, person, [("val", Value::Int(3))]).unwrap();
        builder.build()
    }

    fn prop(graph: &Graph, name: &str) -> Expression {
        Expression::Property {
            slot: 0,
            property: graph.schema().property_by_name(name).unwrap(),
        }
    }

    #[test]
    fn test_property_and_id() {
        let graph = graph();
        let row = [Some(Element::Vertex(0))];
        assert_eq!(prop(&graph, "val").evaluate(&row[..], &graph), Some(Value::Int(3)));
        assert_eq!(prop(&graph, "name").evaluate(&row[..], &graph), None);
        assert_eq!(Expression::Id(0).evaluate(&row[..], &graph), Some(Value::Int(10)));
    }

    #[test]
    fn test_missing_values_in_logic() {
        let graph = graph();
        let row = [Some(Element::Vertex(0))];
        let missing = Expression::Compare {
            op: CompareOp::Eq,
            left: Box::new(prop(&graph, "name")),
            right: Box::new(Expression::Literal(Value::Str("x".into()))),
        };
        let falsy = Expression::Literal(Value::Bool(false));
        let truthy = Expression::Literal(Value::Bool(true));

        assert!(!missing.is_true(&row[..], &graph));
        let and = Expression::And(Box::new(missing.clone()), Box::new(falsy));
        assert_eq!(and.evaluate(&row[..], &graph), Some(Value::Bool(false)));
        let or = Expression::Or(Box::new(missing.clone()), Box::new(truthy));
        assert!(or.is_true(&row[..], &graph));
        assert_eq!(Expression::Not(Box::new(missing)).evaluate(&row[..], &graph), None);
    }

    #[test]
    fn test_slots_are_deduplicated() {
        let expr = Expression::And(
            Box::new(Expression::Variable(2)),
            Box::new(Expression::Or(
                Box::new(Expression::Id(0)),
                Box::new(Expression::Variable(2)),
            )),
        );
        assert_eq!(expr.slots(), vec![0, 2]);
    }
}
