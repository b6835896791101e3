// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Compiled match pattern

use std::fmt;

use crate::ast::NodeVariant;
use crate::expr::Expression;
use crate::graph::TableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Vertex,
    InEdge,
    OutEdge,
    AnyEdge,
}

impl MatchKind {
    pub fn is_vertex(&self) -> bool {
        matches!(self, MatchKind::Vertex)
    }
}

impl From<NodeVariant> for MatchKind {
    fn from(variant: NodeVariant) -> Self {
        match variant {
            NodeVariant::Vertex => MatchKind::Vertex,
            NodeVariant::InEdge => MatchKind::InEdge,
            NodeVariant::OutEdge => MatchKind::OutEdge,
            NodeVariant::AnyEdge => MatchKind::AnyEdge,
        }
    }
}

/// One position of the flattened pattern
#[derive(Debug, Clone, PartialEq)]
pub struct MatchNode {
    pub kind: MatchKind,
    /// Type constraint, `None` matches any table
    pub table: Option<TableId>,
    /// Scope slot, `None` for anonymous nodes
    pub slot: Option<usize>,
    /// The slot is bound here rather than compared
    pub first_appearance: bool,
    /// First node of a chain
    pub chain_start: bool,
}

impl MatchNode {
    pub fn is_anonymous(&self) -> bool {
        self.slot.is_none()
    }
}

/// Ordered chains flattened into positions, with WHERE conjuncts attached per position
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    nodes: Vec<MatchNode>,
    filters: Vec<Vec<Expression>>,
    variable_count: usize,
}

impl Pattern {
    pub(crate) fn new(nodes: Vec<MatchNode>, variable_count: usize) -> Self {
        let filters = vec![Vec::new(); nodes.len()];
        Self {
            nodes,
            filters,
            variable_count,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, position: usize) -> &MatchNode {
        &self.nodes[position]
    }

    pub fn nodes(&self) -> &[MatchNode] {
        &self.nodes
    }

    pub fn chain_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.chain_start).count()
    }

    /// Scope size
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn filters(&self, position: usize) -> &[Expression] {
        &self.filters[position]
    }

    pub fn attach_filter(&mut self, position: usize, filter: Expression) {
        self.filters[position].push(filter);
    }

    /// Position where `slot` gets bound
    pub fn first_position(&self, slot: usize) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.slot == Some(slot) && n.first_appearance)
    }

    /// Earliest position after which every slot in `slots` is bound
    pub fn binding_position(&self, slots: &[usize]) -> usize {
        slots
            .iter()
            .filter_map(|slot| self.first_position(*slot))
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, node) in self.nodes.iter().enumerate() {
            if node.chain_start && position > 0 {
                f.write_str(", ")?;
            }
            let name = node.slot.map(|s| format!("${}", s)).unwrap_or_default();
            match node.kind {
                MatchKind::Vertex => write!(f, "({})", name)?,
                MatchKind::OutEdge => write!(f, "-[{}]->", name)?,
                MatchKind::InEdge => write!(f, "<-[{}]-", name)?,
                MatchKind::AnyEdge => write!(f, "-[{}]-", name)?,
            }
        }
        Ok(())
    }
}
