// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Aggregate functions and their storage
//!
//! This module provides:
//! - Function × argument type dispatch (`AggregateKind::resolve`)
//! - Atomic per-group cells used by bucket and array storage
//! - Single-threaded list storage used by local dictionaries
//! - Index-addressed array storage behind a resize barrier

pub mod array;
pub mod cell;
pub mod list;
pub mod output;

use std::fmt;
use std::sync::Arc;

pub use array::ArrayStorage;
pub use cell::AggregateCell;
pub use list::ListStorage;
pub use output::OutputValue;

use crate::error::{QueryError, Result};
use crate::expr::{Expression, RowAccess};
use crate::graph::{Graph, Value, ValueType};

/// Aggregate function named in a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateFunction::Count),
            "sum" => Some(AggregateFunction::Sum),
            "avg" => Some(AggregateFunction::Avg),
            "min" => Some(AggregateFunction::Min),
            "max" => Some(AggregateFunction::Max),
            _ => None,
        }
    }
}

/// Concrete aggregate implementation chosen for a function and argument type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    /// `count(*)`
    CountAll,
    /// `count(expr)`, skips missing values
    Count,
    SumInt,
    AvgInt,
    MinInt,
    MaxInt,
    MinStr,
    MaxStr,
}

impl AggregateKind {
    /// Pick the implementation for `function` applied to an argument of `argument` type
    ///
    /// `argument` is `None` for `count(*)`.
    pub fn resolve(function: AggregateFunction, argument: Option<ValueType>) -> Result<Self> {
        use AggregateFunction as F;
        match (function, argument) {
            (F::Count, None) => Ok(AggregateKind::CountAll),
            (F::Count, Some(_)) => Ok(AggregateKind::Count),
            (F::Sum, Some(ValueType::Int)) => Ok(AggregateKind::SumInt),
            (F::Avg, Some(ValueType::Int)) => Ok(AggregateKind::AvgInt),
            (F::Min, Some(ValueType::Int)) => Ok(AggregateKind::MinInt),
            (F::Max, Some(ValueType::Int)) => Ok(AggregateKind::MaxInt),
            (F::Min, Some(ValueType::Str)) => Ok(AggregateKind::MinStr),
            (F::Max, Some(ValueType::Str)) => Ok(AggregateKind::MaxStr),
            (function, Some(t)) => Err(QueryError::type_dispatch(format!(
                "{}() is not defined for {} arguments",
                function.name(),
                t
            ))),
            (function, None) => Err(QueryError::type_dispatch(format!(
                "{}(*) is not defined",
                function.name()
            ))),
        }
    }

    pub fn is_count_all(&self) -> bool {
        matches!(self, AggregateKind::CountAll)
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateKind::CountAll => "count(*)",
            AggregateKind::Count => "count",
            AggregateKind::SumInt => "sum<int>",
            AggregateKind::AvgInt => "avg<int>",
            AggregateKind::MinInt => "min<int>",
            AggregateKind::MaxInt => "max<int>",
            AggregateKind::MinStr => "min<string>",
            AggregateKind::MaxStr => "max<string>",
        };
        f.write_str(name)
    }
}

/// One aggregate of a query: implementation plus bound argument
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSpec {
    pub kind: AggregateKind,
    pub argument: Option<Expression>,
}

impl AggregateSpec {
    pub fn count_all() -> Self {
        Self {
            kind: AggregateKind::CountAll,
            argument: None,
        }
    }

    /// Evaluate the argument for one row
    pub fn input<R: RowAccess + ?Sized>(&self, row: &R, graph: &Graph) -> AggregateInput {
        if self.kind == AggregateKind::CountAll {
            return AggregateInput::Count;
        }
        let value = match &self.argument {
            Some(argument) => argument.evaluate(row, graph),
            None => None,
        };
        match (self.kind, value) {
            (AggregateKind::Count, Some(_)) => AggregateInput::Count,
            (_, Some(Value::Int(i))) => AggregateInput::Int(i),
            (_, Some(Value::Str(s))) => AggregateInput::Str(s),
            _ => AggregateInput::Skip,
        }
    }
}

/// Evaluated argument of one aggregate for one row
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateInput {
    /// Missing value, the row does not contribute
    Skip,
    /// Counted row
    Count,
    Int(i64),
    Str(String),
}

/// Evaluate every aggregate argument of `row`
pub fn evaluate_inputs<R: RowAccess + ?Sized>(
    specs: &[AggregateSpec],
    row: &R,
    graph: &Graph,
) -> Vec<AggregateInput> {
    specs.iter().map(|spec| spec.input(row, graph)).collect()
}

/// Aggregate kinds of a spec list
pub fn kinds(specs: &[AggregateSpec]) -> Vec<AggregateKind> {
    specs.iter().map(|s| s.kind).collect()
}

/// Cells of one group in bucket storage
pub type Bucket = Arc<[AggregateCell]>;

pub fn new_bucket(kinds: &[AggregateKind]) -> Bucket {
    kinds.iter().map(|k| AggregateCell::new(*k)).collect()
}

/// Final values of a bucket
pub fn bucket_values(bucket: &[AggregateCell]) -> Vec<OutputValue> {
    bucket.iter().map(AggregateCell::value).collect()
}
