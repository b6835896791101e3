// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Variable name → scope slot registry

use std::collections::HashMap;

use crate::error::{QueryError, Result};
use crate::graph::TableId;

#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub slot: usize,
    pub table: Option<TableId>,
    pub is_edge: bool,
}

/// Result of registering one pattern occurrence of a variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Registration {
    pub slot: usize,
    pub first_appearance: bool,
    /// Type constraint after inheriting an earlier occurrence's table
    pub table: Option<TableId>,
}

#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    variables: Vec<VariableInfo>,
    by_name: HashMap<String, usize>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&VariableInfo> {
        self.by_name.get(name).map(|slot| &self.variables[*slot])
    }

    pub fn slot(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Variables in slot order
    pub fn iter(&self) -> impl Iterator<Item = &VariableInfo> {
        self.variables.iter()
    }

    /// Register one occurrence of `name`
    ///
    /// The first occurrence allocates the next slot. A repeat reuses it and
    /// inherits the recorded table when it names none itself.
    pub fn register(&mut self, name: &str, table: Option<TableId>, is_edge: bool) -> Result<Registration> {
        let Some(&slot) = self.by_name.get(name) else {
            let slot = self.variables.len();
            self.variables.push(VariableInfo {
                name: name.to_string(),
                slot,
                table,
                is_edge,
            });
            self.by_name.insert(name.to_string(), slot);
            return Ok(Registration {
                slot,
                first_appearance: true,
                table,
            });
        };

        let existing = &mut self.variables[slot];
        if existing.is_edge || is_edge {
            let message = if existing.is_edge && is_edge {
                format!("edge variable '{}' is used more than once", name)
            } else {
                format!("variable '{}' is used both as a vertex and as an edge", name)
            };
            return Err(QueryError::validation(message));
        }

        match (existing.table, table) {
            (Some(recorded), Some(explicit)) if recorded != explicit => {
                Err(QueryError::validation(format!(
                    "variable '{}' is declared with two different types",
                    name
                )))
            }
            (recorded, explicit) => {
                let table = explicit.or(recorded);
                existing.table = table;
                Ok(Registration {
                    slot,
                    first_appearance: false,
                    table,
                })
            }
        }
    }
}
