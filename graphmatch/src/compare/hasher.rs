// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Group-key hashing and equality
//!
//! Keys are the evaluated GROUP BY values of a row. Dictionaries store them
//! with a precomputed hash, so the representative row is only read when a
//! group is projected.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::expr::{Expression, RowAccess};
use crate::graph::{Graph, Value};

/// GROUP BY expressions
#[derive(Debug, Clone, Default)]
pub struct GroupKeyExprs {
    exprs: Vec<Expression>,
}

impl GroupKeyExprs {
    pub fn new(exprs: Vec<Expression>) -> Self {
        Self { exprs }
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn exprs(&self) -> &[Expression] {
        &self.exprs
    }

    pub fn evaluate<R: RowAccess + ?Sized>(&self, row: &R, graph: &Graph) -> Box<[Option<Value>]> {
        self.exprs.iter().map(|e| e.evaluate(row, graph)).collect()
    }

    /// Per-value hashes combined in key order
    pub fn hash_values(values: &[Option<Value>]) -> u64 {
        values.iter().fold(0u64, |h, value| {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            h.wrapping_mul(31).wrapping_add(hasher.finish())
        })
    }

    /// Evaluate the key of `row` once for a dictionary probe
    pub fn probe<R: RowAccess + ?Sized>(&self, row: &R, graph: &Graph) -> KeyProbe {
        let values = self.evaluate(row, graph);
        let hash = Self::hash_values(&values);
        KeyProbe { values, hash }
    }
}

/// Evaluated key of the row being looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyProbe {
    pub values: Box<[Option<Value>]>,
    pub hash: u64,
}

impl KeyProbe {
    pub fn matches(&self, hash: u64, values: &[Option<Value>]) -> bool {
        self.hash == hash && *self.values == *values
    }

    pub fn into_key(self) -> GroupKey {
        GroupKey {
            hash: self.hash,
            values: self.values,
        }
    }
}

/// Owned key of a concurrent group dictionary
///
/// Hashing writes the precomputed key hash; equality compares key values.
#[derive(Debug, Clone)]
pub struct GroupKey {
    pub hash: u64,
    pub values: Box<[Option<Value>]>,
}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.values == other.values
    }
}

impl Eq for GroupKey {}
