// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Property values and element handles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a graph element
///
/// Vertex and edge are capability tags over the graph's arenas; the handle
/// carries no data of its own and is cheap to copy into scopes and blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    Vertex(u32),
    Edge(u32),
}

impl Element {
    pub fn is_vertex(&self) -> bool {
        matches!(self, Element::Vertex(_))
    }

    pub fn is_edge(&self) -> bool {
        matches!(self, Element::Edge(_))
    }
}

/// Scalar value produced by property access or expression evaluation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    Element(Element),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Str(_) => ValueType::Str,
            Value::Element(_) => ValueType::Element,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{}", s),
            Value::Element(Element::Vertex(v)) => write!(f, "v#{}", v),
            Value::Element(Element::Edge(e)) => write!(f, "e#{}", e),
        }
    }
}

/// Declared type of a property or expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[serde(alias = "boolean")]
    Bool,
    #[serde(alias = "integer")]
    Int,
    #[serde(rename = "string", alias = "str")]
    Str,
    #[serde(skip)]
    Element,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Str => "string",
            ValueType::Element => "element",
        };
        f.write_str(name)
    }
}
