// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pattern compilation: chain ordering, splitting and variable registration

use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};

use super::node::{MatchKind, MatchNode, Pattern};
use super::variables::VariableMap;
use crate::ast::{NodeVariant, ParsedPattern};
use crate::error::{QueryError, Result};
use crate::graph::{Schema, TableKind};

/// Compile parsed chains into a pattern the DFS can walk forward
pub fn compile(chains: Vec<ParsedPattern>, schema: &Schema) -> Result<(Pattern, VariableMap)> {
    if chains.is_empty() || chains.iter().any(|c| c.nodes.is_empty()) {
        return Err(QueryError::validation("empty match pattern"));
    }
    check_edge_variables(&chains)?;

    let mut ordered = Vec::with_capacity(chains.len());
    for mut chain in order_chains(chains) {
        let head = chain.split();
        ordered.push(chain);
        if let Some(head) = head {
            ordered.push(head);
        }
    }

    let mut variables = VariableMap::new();
    let mut nodes = Vec::new();
    for chain in &ordered {
        for (index, parsed) in chain.nodes.iter().enumerate() {
            let kind = MatchKind::from(parsed.variant);
            let table_kind = if kind.is_vertex() {
                TableKind::Vertex
            } else {
                TableKind::Edge
            };
            let table = parsed
                .table
                .as_deref()
                .map(|name| schema.resolve_table(name, table_kind))
                .transpose()
                .map_err(|e| QueryError::validation(e.to_string()))?;

            let node = match parsed.name.as_deref() {
                Some(name) => {
                    let registration = variables.register(name, table, !kind.is_vertex())?;
                    MatchNode {
                        kind,
                        table: registration.table,
                        slot: Some(registration.slot),
                        first_appearance: registration.first_appearance,
                        chain_start: index == 0,
                    }
                }
                None => MatchNode {
                    kind,
                    table,
                    slot: None,
                    first_appearance: false,
                    chain_start: index == 0,
                },
            };
            nodes.push(node);
        }
    }

    if variables.is_empty() {
        return Err(QueryError::validation("match pattern declares no variables"));
    }

    let pattern = Pattern::new(nodes, variables.len());
    debug!("Compiled pattern {} with {} variables", pattern, variables.len());
    Ok((pattern, variables))
}

/// Edge variables may appear once and never as a vertex
fn check_edge_variables(chains: &[ParsedPattern]) -> Result<()> {
    let mut seen: HashMap<&str, bool> = HashMap::new();
    for node in chains.iter().flat_map(|c| c.nodes.iter()) {
        let Some(name) = node.name.as_deref() else {
            continue;
        };
        let is_edge = node.variant.is_edge();
        match seen.insert(name, is_edge) {
            Some(true) if is_edge => {
                return Err(QueryError::validation(format!(
                    "edge variable '{}' is used more than once",
                    name
                )))
            }
            Some(previous) if previous != is_edge => {
                return Err(QueryError::validation(format!(
                    "variable '{}' is used both as a vertex and as an edge",
                    name
                )))
            }
            _ => {}
        }
    }
    Ok(())
}

/// Breadth-first order over chains connected by shared vertex variables
///
/// Every chain reached from an earlier one is marked with the connecting
/// variable so that it can be split to start there.
fn order_chains(mut chains: Vec<ParsedPattern>) -> Vec<ParsedPattern> {
    let names: Vec<HashSet<String>> = chains
        .iter()
        .map(|c| vertex_names(c).map(str::to_string).collect())
        .collect();

    let mut visited = vec![false; chains.len()];
    let mut order = Vec::with_capacity(chains.len());
    let mut queue = VecDeque::new();

    for root in 0..chains.len() {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        queue.push_back(root);

        while let Some(current) = queue.pop_front() {
            order.push(current);
            for next in 0..chains.len() {
                if visited[next] {
                    continue;
                }
                let shared = vertex_names(&chains[next])
                    .find(|name| names[current].contains(*name))
                    .map(str::to_string);
                if let Some(shared) = shared {
                    chains[next].split_by = Some(shared);
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
    }

    let mut slots: Vec<Option<ParsedPattern>> = chains.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

fn vertex_names(chain: &ParsedPattern) -> impl Iterator<Item = &str> {
    chain
        .nodes
        .iter()
        .filter(|n| n.variant == NodeVariant::Vertex)
        .filter_map(|n| n.name.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ValueType;
    use crate::parser::parse_query;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema
            .add_table("Person", TableKind::Vertex, [("val", ValueType::Int)])
            .unwrap();
        schema
            .add_table("Knows", TableKind::Edge, Vec::<(&str, ValueType)>::new())
            .unwrap();
        schema
    }

    fn compile_text(text: &str) -> Result<(Pattern, VariableMap)> {
        let query = parse_query(text).unwrap();
        compile(query.patterns, &schema())
    }

    #[test]
    fn test_second_chain_reversed_at_shared_last_vertex() {
        let (pattern, vars) = compile_text("SELECT * MATCH (a)->(b), (c)->(b)").unwrap();
        assert_eq!(pattern.len(), 6);
        assert_eq!(pattern.chain_count(), 2);

        let b = vars.slot("b").unwrap();
        let second = pattern.node(3);
        assert!(second.chain_start);
        assert_eq!(second.slot, Some(b));
        assert!(!second.first_appearance);
        assert_eq!(pattern.node(4).kind, MatchKind::InEdge);
        assert_eq!(pattern.node(5).slot, vars.slot("c"));
    }

    #[test]
    fn test_chain_split_in_middle() {
        let (pattern, vars) = compile_text("SELECT * MATCH (x)->(y), (a)->(x)->(b)").unwrap();
        // (x)->(y), (x)->(b), (x)<-(a)
        assert_eq!(pattern.chain_count(), 3);
        let x = vars.slot("x");
        assert_eq!(pattern.node(3).slot, x);
        assert_eq!(pattern.node(4).kind, MatchKind::OutEdge);
        assert_eq!(pattern.node(5).slot, vars.slot("b"));
        assert_eq!(pattern.node(6).slot, x);
        assert_eq!(pattern.node(7).kind, MatchKind::InEdge);
        assert_eq!(pattern.node(8).slot, vars.slot("a"));
    }

    #[test]
    fn test_disconnected_chains_keep_order() {
        let (pattern, vars) = compile_text("SELECT * MATCH (a), (b)->(c)").unwrap();
        assert_eq!(pattern.chain_count(), 2);
        assert_eq!(vars.slot("a"), Some(0));
        assert!(pattern.node(1).first_appearance);
    }

    #[test]
    fn test_table_constraints_resolved() {
        let (pattern, _) = compile_text("SELECT * MATCH (a:Person)-[e:Knows]->(b)").unwrap();
        assert!(pattern.node(0).table.is_some());
        assert!(pattern.node(1).table.is_some());
        assert!(pattern.node(2).table.is_none());
    }

    #[test]
    fn test_validation_errors() {
        for text in [
            "SELECT * MATCH (a:Knows)",
            "SELECT * MATCH (a)-[e:Person]->(b)",
            "SELECT * MATCH (a:Missing)",
            "SELECT * MATCH (a)-[e]->(b), (b)-[e]->(c)",
            "SELECT * MATCH (a)-[a]->(b)",
            "SELECT * MATCH ()->()",
        ] {
            assert!(
                matches!(compile_text(text), Err(QueryError::Validation(_))),
                "expected validation error for {}",
                text
            );
        }
    }
}
