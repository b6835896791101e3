// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Parsed query representation
//!
//! The parser produces these nodes verbatim from the query text; names are
//! resolved later by the pattern compiler and the planner.

use std::fmt;

use crate::aggregate::AggregateFunction;

/// Variant of a single match token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeVariant {
    /// `(x)`
    Vertex,
    /// `<-[e]-`
    InEdge,
    /// `-[e]->`
    OutEdge,
    /// `-[e]-`
    AnyEdge,
}

impl NodeVariant {
    pub fn is_edge(&self) -> bool {
        !matches!(self, NodeVariant::Vertex)
    }

    /// Variant seen when the chain is walked in the opposite direction
    pub fn reversed(self) -> Self {
        match self {
            NodeVariant::InEdge => NodeVariant::OutEdge,
            NodeVariant::OutEdge => NodeVariant::InEdge,
            other => other,
        }
    }
}

/// One match token, e.g. `(x:Person)` or `-[e]->`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPatternNode {
    pub name: Option<String>,
    pub table: Option<String>,
    pub variant: NodeVariant,
}

impl ParsedPatternNode {
    pub fn vertex(name: Option<&str>, table: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            table: table.map(str::to_string),
            variant: NodeVariant::Vertex,
        }
    }

    pub fn edge(variant: NodeVariant, name: Option<&str>, table: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            table: table.map(str::to_string),
            variant,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// Both nodes name the same variable with the same type constraint
    pub fn same_variable(&self, other: &ParsedPatternNode) -> bool {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => a == b && self.table == other.table,
            _ => false,
        }
    }

    fn reversed(mut self) -> Self {
        self.variant = self.variant.reversed();
        self
    }
}

/// One comma-separated chain of a MATCH clause
///
/// Vertices sit at even positions and edges at odd positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPattern {
    pub nodes: Vec<ParsedPatternNode>,
    pub split_by: Option<String>,
}

impl ParsedPattern {
    pub fn new(nodes: Vec<ParsedPatternNode>) -> Self {
        Self {
            nodes,
            split_by: None,
        }
    }

    /// Named variables in chain order, repeats included
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|n| n.name.as_deref())
    }

    pub fn contains_variable(&self, name: &str) -> bool {
        self.variable_names().any(|n| n == name)
    }

    /// Reverse the chain in place, flipping edge directions
    pub fn reverse(&mut self) {
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = nodes.into_iter().rev().map(ParsedPatternNode::reversed).collect();
    }

    /// Split the chain so that it starts at `split_by`
    ///
    /// When the split variable sits strictly inside the chain the prefix up
    /// to and including it is removed and returned as a new reversed chain,
    /// while `self` keeps the suffix starting at the variable. When it is the
    /// last node the chain is reversed in place and nothing is returned. A
    /// split variable at the head (or none at all) leaves the chain unchanged.
    pub fn split(&mut self) -> Option<ParsedPattern> {
        let name = self.split_by.take()?;
        let index = self
            .nodes
            .iter()
            .position(|n| n.name.as_deref() == Some(name.as_str()))?;

        if index == 0 {
            return None;
        }
        if index == self.nodes.len() - 1 {
            self.reverse();
            return None;
        }

        let suffix = self.nodes.split_off(index);
        let mut prefix = std::mem::replace(&mut self.nodes, suffix);
        prefix.push(self.nodes[0].clone());
        let mut head = ParsedPattern::new(prefix);
        head.reverse();
        Some(head)
    }
}

impl fmt::Display for ParsedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            let name = node.name.as_deref().unwrap_or("");
            let label = node
                .table
                .as_deref()
                .map(|t| format!(":{}", t))
                .unwrap_or_default();
            match node.variant {
                NodeVariant::Vertex => write!(f, "({}{})", name, label)?,
                NodeVariant::OutEdge => write!(f, "-[{}{}]->", name, label)?,
                NodeVariant::InEdge => write!(f, "<-[{}{}]-", name, label)?,
                NodeVariant::AnyEdge => write!(f, "-[{}{}]-", name, label)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

/// Unresolved expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal(Literal),
    Variable(String),
    Property { variable: String, property: String },
    Id(String),
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    /// `count(*)` has no argument
    Aggregate {
        function: AggregateFunction,
        argument: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Binary { left, right, .. } => left.contains_aggregate() || right.contains_aggregate(),
            Expr::Not(inner) => inner.contains_aggregate(),
            _ => false,
        }
    }

    /// Split a conjunction into its conjuncts
    pub fn into_conjuncts(self) -> Vec<Expr> {
        match self {
            Expr::Binary {
                op: BinaryOperator::And,
                left,
                right,
            } => {
                let mut conjuncts = left.into_conjuncts();
                conjuncts.extend(right.into_conjuncts());
                conjuncts
            }
            other => vec![other],
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Literal::Bool(b)) => write!(f, "{}", b),
            Expr::Literal(Literal::Int(i)) => write!(f, "{}", i),
            Expr::Literal(Literal::Str(s)) => write!(f, "'{}'", s),
            Expr::Variable(v) => write!(f, "{}", v),
            Expr::Property { variable, property } => write!(f, "{}.{}", variable, property),
            Expr::Id(v) => write!(f, "id({})", v),
            Expr::Binary { op, left, right } => {
                let symbol = match op {
                    BinaryOperator::Equal => "=",
                    BinaryOperator::NotEqual => "<>",
                    BinaryOperator::Less => "<",
                    BinaryOperator::LessEqual => "<=",
                    BinaryOperator::Greater => ">",
                    BinaryOperator::GreaterEqual => ">=",
                    BinaryOperator::And => "AND",
                    BinaryOperator::Or => "OR",
                };
                write!(f, "{} {} {}", left, symbol, right)
            }
            Expr::Not(inner) => write!(f, "NOT {}", inner),
            Expr::Aggregate { function, argument } => match argument {
                Some(arg) => write!(f, "{}({})", function.name(), arg),
                None => write!(f, "{}(*)", function.name()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    /// Column header: alias, or the expression text
    pub fn column_name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| self.expr.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expr,
    pub ascending: bool,
}

/// `SELECT *` or an explicit item list
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Items(Vec<SelectItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub projection: Projection,
    pub patterns: Vec<ParsedPattern>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> ParsedPatternNode {
        ParsedPatternNode::vertex(Some(name), None)
    }

    fn out() -> ParsedPatternNode {
        ParsedPatternNode::edge(NodeVariant::OutEdge, None, None)
    }

    fn names(p: &ParsedPattern) -> Vec<String> {
        p.nodes
            .iter()
            .map(|n| match n.variant {
                NodeVariant::Vertex => n.name.clone().unwrap_or_default(),
                NodeVariant::OutEdge => "->".to_string(),
                NodeVariant::InEdge => "<-".to_string(),
                NodeVariant::AnyEdge => "-".to_string(),
            })
            .collect()
    }

    fn chain_abc() -> ParsedPattern {
        ParsedPattern::new(vec![v("a"), out(), v("b"), out(), v("c")])
    }

    #[test]
    fn test_split_in_middle() {
        let mut chain = chain_abc();
        chain.split_by = Some("b".to_string());
        let head = chain.split().expect("middle split produces a new chain");

        assert_eq!(names(&head), vec!["b", "<-", "a"]);
        assert_eq!(names(&chain), vec!["b", "->", "c"]);
    }

    #[test]
    fn test_split_at_first_is_noop() {
        let mut chain = chain_abc();
        chain.split_by = Some("a".to_string());
        assert!(chain.split().is_none());
        assert_eq!(chain, chain_abc());
    }

    #[test]
    fn test_split_at_last_reverses_in_place() {
        let mut chain = chain_abc();
        chain.split_by = Some("c".to_string());
        assert!(chain.split().is_none());
        assert_eq!(names(&chain), vec!["c", "<-", "b", "<-", "a"]);
    }

    #[test]
    fn test_reverse_keeps_any_edges() {
        let mut chain = ParsedPattern::new(vec![
            v("a"),
            ParsedPatternNode::edge(NodeVariant::AnyEdge, None, None),
            v("b"),
            ParsedPatternNode::edge(NodeVariant::InEdge, None, None),
            v("c"),
        ]);
        chain.reverse();
        assert_eq!(names(&chain), vec!["c", "->", "b", "-", "a"]);
    }

    #[test]
    fn test_same_variable_requires_names() {
        let a = ParsedPatternNode::vertex(Some("x"), Some("T"));
        let b = ParsedPatternNode::vertex(Some("x"), Some("T"));
        let anon = ParsedPatternNode::vertex(None, Some("T"));
        assert!(a.same_variable(&b));
        assert!(!anon.same_variable(&anon.clone()));
    }

    #[test]
    fn test_into_conjuncts() {
        let a = Expr::Variable("a".into());
        let b = Expr::Variable("b".into());
        let c = Expr::Variable("c".into());
        let expr = Expr::Binary {
            op: BinaryOperator::And,
            left: Box::new(Expr::Binary {
                op: BinaryOperator::And,
                left: Box::new(a.clone()),
                right: Box::new(b.clone()),
            }),
            right: Box::new(c.clone()),
        };
        assert_eq!(expr.into_conjuncts(), vec![a, b, c]);
    }
}
