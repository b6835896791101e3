// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Values of result columns

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::graph::{Graph, Value};

/// One cell of a query result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// User-visible id of a vertex or edge
    Element(i64),
}

impl OutputValue {
    pub fn from_value(value: Option<Value>, graph: &Graph) -> Self {
        match value {
            None => OutputValue::Null,
            Some(Value::Bool(b)) => OutputValue::Bool(b),
            Some(Value::Int(i)) => OutputValue::Int(i),
            Some(Value::Str(s)) => OutputValue::Str(s),
            Some(Value::Element(e)) => OutputValue::Element(graph.element_id(e)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, OutputValue::Null)
    }

    fn rank(&self) -> u8 {
        match self {
            OutputValue::Bool(_) => 0,
            OutputValue::Int(_) | OutputValue::Float(_) => 1,
            OutputValue::Str(_) => 2,
            OutputValue::Element(_) => 3,
            OutputValue::Null => 4,
        }
    }

    /// Total order with nulls last; ints and floats compare numerically
    pub fn total_cmp(&self, other: &OutputValue) -> Ordering {
        match (self, other) {
            (OutputValue::Bool(a), OutputValue::Bool(b)) => a.cmp(b),
            (OutputValue::Int(a), OutputValue::Int(b)) => a.cmp(b),
            (OutputValue::Float(a), OutputValue::Float(b)) => a.total_cmp(b),
            (OutputValue::Int(a), OutputValue::Float(b)) => (*a as f64).total_cmp(b),
            (OutputValue::Float(a), OutputValue::Int(b)) => a.total_cmp(&(*b as f64)),
            (OutputValue::Str(a), OutputValue::Str(b)) => a.cmp(b),
            (OutputValue::Element(a), OutputValue::Element(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Ordering for an ORDER BY item: nulls last ascending, first descending
    pub fn order_cmp(&self, other: &OutputValue, ascending: bool) -> Ordering {
        let ordering = self.total_cmp(other);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

impl fmt::Display for OutputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputValue::Null => f.write_str("NULL"),
            OutputValue::Bool(b) => write!(f, "{}", b),
            OutputValue::Int(i) => write!(f, "{}", i),
            OutputValue::Float(v) => write!(f, "{}", v),
            OutputValue::Str(s) => f.write_str(s),
            OutputValue::Element(id) => write!(f, "{}", id),
        }
    }
}
