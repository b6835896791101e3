// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Name resolution from parsed to bound expressions

use super::{CompareOp, Expression};
use crate::ast::{BinaryOperator, Expr, Literal};
use crate::error::{QueryError, Result};
use crate::graph::{Schema, Value, ValueType};
use crate::pattern::VariableMap;

pub struct Binder<'a> {
    variables: &'a VariableMap,
    schema: &'a Schema,
}

impl<'a> Binder<'a> {
    pub fn new(variables: &'a VariableMap, schema: &'a Schema) -> Self {
        Self { variables, schema }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Bind a scalar expression; aggregates are rejected
    pub fn bind(&self, expr: &Expr) -> Result<Expression> {
        match expr {
            Expr::Literal(literal) => Ok(Expression::Literal(match literal {
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(i) => Value::Int(*i),
                Literal::Str(s) => Value::Str(s.clone()),
            })),
            Expr::Variable(name) => Ok(Expression::Variable(self.slot(name)?)),
            Expr::Id(name) => Ok(Expression::Id(self.slot(name)?)),
            Expr::Property { variable, property } => {
                let slot = self.slot(variable)?;
                let property = self.schema.property_by_name(property).ok_or_else(|| {
                    QueryError::validation(format!("unknown property '{}.{}'", variable, property))
                })?;
                Ok(Expression::Property { slot, property })
            }
            Expr::Not(inner) => {
                let inner = self.bind_boolean(inner)?;
                Ok(Expression::Not(Box::new(inner)))
            }
            Expr::Binary { op, left, right } => match op {
                BinaryOperator::And => Ok(Expression::And(
                    Box::new(self.bind_boolean(left)?),
                    Box::new(self.bind_boolean(right)?),
                )),
                BinaryOperator::Or => Ok(Expression::Or(
                    Box::new(self.bind_boolean(left)?),
                    Box::new(self.bind_boolean(right)?),
                )),
                BinaryOperator::Equal => self.bind_comparison(CompareOp::Eq, left, right, expr),
                BinaryOperator::NotEqual => self.bind_comparison(CompareOp::Ne, left, right, expr),
                BinaryOperator::Less => self.bind_comparison(CompareOp::Lt, left, right, expr),
                BinaryOperator::LessEqual => self.bind_comparison(CompareOp::Le, left, right, expr),
                BinaryOperator::Greater => self.bind_comparison(CompareOp::Gt, left, right, expr),
                BinaryOperator::GreaterEqual => {
                    self.bind_comparison(CompareOp::Ge, left, right, expr)
                }
            },
            Expr::Aggregate { .. } => Err(QueryError::validation(format!(
                "aggregate '{}' is not allowed here",
                expr
            ))),
        }
    }

    fn bind_comparison(&self, op: CompareOp, left: &Expr, right: &Expr, whole: &Expr) -> Result<Expression> {
        let left = self.bind(left)?;
        let right = self.bind(right)?;
        let (lt, rt) = (left.value_type(self.schema), right.value_type(self.schema));
        if lt != rt {
            return Err(QueryError::validation(format!(
                "cannot compare {} with {} in '{}'",
                lt, rt, whole
            )));
        }
        Ok(Expression::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Bind an expression that must produce a boolean
    pub fn bind_boolean(&self, expr: &Expr) -> Result<Expression> {
        let bound = self.bind(expr)?;
        match bound.value_type(self.schema) {
            ValueType::Bool => Ok(bound),
            other => Err(QueryError::validation(format!(
                "'{}' is {}, expected a boolean",
                expr, other
            ))),
        }
    }

    fn slot(&self, name: &str) -> Result<usize> {
        self.variables
            .slot(name)
            .ok_or_else(|| QueryError::validation(format!("unknown variable '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TableKind;
    use crate::parser::expression;

    fn setup() -> (VariableMap, Schema) {
        let mut schema = Schema::new();
        schema
            .add_table("Person", TableKind::Vertex, [("val", ValueType::Int), ("name", ValueType::Str)])
            .unwrap();
        let mut variables = VariableMap::new();
        variables.register("x", None, false).unwrap();
        (variables, schema)
    }

    fn bind(text: &str) -> Result<Expression> {
        let (variables, schema) = setup();
        let (_, expr) = expression(text).unwrap();
        Binder::new(&variables, &schema).bind(&expr)
    }

    #[test]
    fn test_bind_resolves_names() {
        let bound = bind("x.val >= 3 AND id(x) <> 7").unwrap();
        assert!(matches!(bound, Expression::And(..)));
        assert_eq!(bound.slots(), vec![0]);
    }

    #[test]
    fn test_bind_errors() {
        assert!(matches!(bind("y.val = 1"), Err(QueryError::Validation(_))));
        assert!(matches!(bind("x.age = 1"), Err(QueryError::Validation(_))));
        assert!(matches!(bind("x.val = 'a'"), Err(QueryError::Validation(_))));
        assert!(matches!(bind("x.val AND TRUE"), Err(QueryError::Validation(_))));
        assert!(matches!(bind("count(*)"), Err(QueryError::Validation(_))));
    }
}
