// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Single-thread depth-first matcher
//!
//! The search is an explicit state machine over pattern positions. Every
//! position owns one candidate frame, so the depth never exceeds the pattern
//! length and no recursion is involved.

use std::ops::Range;

use crate::graph::{Adjacency, Element, Graph};
use crate::pattern::{MatchKind, Pattern};

/// Receiver of complete matches
pub trait MatchSink {
    fn emit(&mut self, scope: &[Option<Element>]);
}

/// Sink that only lets the matcher count
#[derive(Debug, Default)]
pub struct CountSink;

impl MatchSink for CountSink {
    fn emit(&mut self, _scope: &[Option<Element>]) {}
}

impl MatchSink for crate::table::TableResults {
    fn emit(&mut self, scope: &[Option<Element>]) {
        self.store_row(scope);
    }
}

/// Candidate enumeration of one position
#[derive(Debug)]
enum Candidates<'g> {
    Empty,
    Single(Option<Element>),
    Vertices(Range<u32>),
    Edges {
        adjacency: &'g [Adjacency],
        index: usize,
    },
    /// Out-edges then in-edges; self-loops appear in both lists and are taken once
    BothEdges {
        out: &'g [Adjacency],
        incoming: &'g [Adjacency],
        vertex: u32,
        index: usize,
    },
}

impl Candidates<'_> {
    /// Next candidate and, for edges, the vertex on the far side
    fn next(&mut self) -> Option<(Element, Option<u32>)> {
        match self {
            Candidates::Empty => None,
            Candidates::Single(element) => element.take().map(|e| (e, None)),
            Candidates::Vertices(range) => range.next().map(|v| (Element::Vertex(v), None)),
            Candidates::Edges { adjacency, index } => {
                let entry = adjacency.get(*index)?;
                *index += 1;
                Some((Element::Edge(entry.edge), Some(entry.neighbor)))
            }
            Candidates::BothEdges {
                out,
                incoming,
                vertex,
                index,
            } => loop {
                let entry = if *index < out.len() {
                    out[*index]
                } else {
                    let entry = incoming.get(*index - out.len())?;
                    if entry.neighbor == *vertex {
                        *index += 1;
                        continue;
                    }
                    *entry
                };
                *index += 1;
                return Some((Element::Edge(entry.edge), Some(entry.neighbor)));
            },
        }
    }
}

/// DFS matcher over one scope arena
///
/// The pattern is shared by reference; cloning a matcher for another worker
/// only allocates a fresh scope.
pub struct DfsMatcher<'g> {
    graph: &'g Graph,
    pattern: &'g Pattern,
    scope: Vec<Option<Element>>,
    /// Element bound at each position
    path: Vec<Option<Element>>,
    /// Far endpoint of the edge bound at each position
    neighbors: Vec<Option<u32>>,
    frames: Vec<Candidates<'g>>,
    matched: u64,
}

impl<'g> DfsMatcher<'g> {
    pub fn new(graph: &'g Graph, pattern: &'g Pattern) -> Self {
        let len = pattern.len();
        Self {
            graph,
            pattern,
            scope: vec![None; pattern.variable_count()],
            path: vec![None; len],
            neighbors: vec![None; len],
            frames: (0..len).map(|_| Candidates::Empty).collect(),
            matched: 0,
        }
    }

    /// Full matches found so far
    pub fn matched(&self) -> u64 {
        self.matched
    }

    /// Enumerate every match whose first chain starts at `start`
    pub fn run_from<S: MatchSink + ?Sized>(&mut self, start: u32, sink: &mut S) {
        if self.pattern.is_empty() {
            return;
        }
        let last = self.pattern.len() - 1;
        let mut position = 0;
        self.frames[0] = Candidates::Single(Some(Element::Vertex(start)));

        loop {
            match self.frames[position].next() {
                Some((candidate, neighbor)) => {
                    if !self.apply(position, candidate) {
                        continue;
                    }
                    self.neighbors[position] = neighbor;
                    if position == last {
                        sink.emit(&self.scope);
                        self.matched += 1;
                        self.unbind(position);
                    } else {
                        position += 1;
                        self.frames[position] = self.candidates(position);
                    }
                }
                None => {
                    if position == 0 {
                        break;
                    }
                    position -= 1;
                    self.unbind(position);
                }
            }
        }
    }

    /// Count matches starting at every vertex of `range` without storing them
    pub fn count_from(&mut self, range: Range<u32>) -> u64 {
        let before = self.matched;
        let mut sink = CountSink;
        for start in range {
            self.run_from(start, &mut sink);
        }
        self.matched - before
    }

    fn candidates(&self, position: usize) -> Candidates<'g> {
        let node = self.pattern.node(position);
        if node.chain_start {
            return match node.slot {
                Some(slot) if !node.first_appearance => Candidates::Single(self.scope[slot]),
                _ => Candidates::Vertices(0..self.graph.vertex_count() as u32),
            };
        }

        let previous = self.path[position - 1];
        match node.kind {
            MatchKind::Vertex => match self.neighbors[position - 1] {
                Some(vertex) => Candidates::Single(Some(Element::Vertex(vertex))),
                None => Candidates::Empty,
            },
            kind => {
                let Some(Element::Vertex(vertex)) = previous else {
                    return Candidates::Empty;
                };
                match kind {
                    MatchKind::OutEdge => Candidates::Edges {
                        adjacency: self.graph.out_edges(vertex),
                        index: 0,
                    },
                    MatchKind::InEdge => Candidates::Edges {
                        adjacency: self.graph.in_edges(vertex),
                        index: 0,
                    },
                    _ => Candidates::BothEdges {
                        out: self.graph.out_edges(vertex),
                        incoming: self.graph.in_edges(vertex),
                        vertex,
                        index: 0,
                    },
                }
            }
        }
    }

    /// Bind `candidate` at `position` if it satisfies the node and its filters
    fn apply(&mut self, position: usize, candidate: Element) -> bool {
        let node = self.pattern.node(position);
        if node.kind.is_vertex() != candidate.is_vertex() {
            return false;
        }
        if let Some(table) = node.table {
            if self.graph.table_of(candidate) != table {
                return false;
            }
        }
        if let Some(slot) = node.slot {
            if node.first_appearance {
                self.scope[slot] = Some(candidate);
            } else if self.scope[slot] != Some(candidate) {
                return false;
            }
        }
        self.path[position] = Some(candidate);

        let passes = self
            .pattern
            .filters(position)
            .iter()
            .all(|filter| filter.is_true(&self.scope[..], self.graph));
        if !passes {
            self.unbind(position);
        }
        passes
    }

    fn unbind(&mut self, position: usize) {
        let node = self.pattern.node(position);
        if let (Some(slot), true) = (node.slot, node.first_appearance) {
            self.scope[slot] = None;
        }
        self.path[position] = None;
        self.neighbors[position] = None;
    }
}

impl Clone for DfsMatcher<'_> {
    fn clone(&self) -> Self {
        Self::new(self.graph, self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, Value, ValueType};
    use crate::parser::parse_query;
    use crate::pattern::compile;

    /// 1 -> 2 -> 3, 3 -> 3
    fn graph() -> Graph {
        let mut builder = GraphBuilder::new();
        let person = builder.vertex_table("Person", [("val", ValueType::Int)]).unwrap();
        let knows = builder.edge_table("Knows", Vec::<(&str, ValueType)>::new()).unwrap();
        for id in 1..=3 {
            builder
                .add_vertex(id, person, [("val", Value::Int(id * 10))])
                .unwrap();
        }
        builder.add_edge(1, knows, 1, 2, Vec::<(&str, Value)>::new()).unwrap();
        builder.add_edge(2, knows, 2, 3, Vec::<(&str, Value)>::new()).unwrap();
        builder.add_edge(3, knows, 3, 3, Vec::<(&str, Value)>::new()).unwrap();
        builder.build()
    }

    fn count(graph: &Graph, text: &str) -> u64 {
        let query = parse_query(text).unwrap();
        let (pattern, _) = compile(query.patterns, graph.schema()).unwrap();
        let mut matcher = DfsMatcher::new(graph, &pattern);
        matcher.count_from(0..graph.vertex_count() as u32)
    }

    #[test]
    fn test_directed_edges() {
        let g = graph();
        assert_eq!(count(&g, "SELECT * MATCH (x)->(y)"), 3);
        assert_eq!(count(&g, "SELECT * MATCH (x)<-(y)"), 3);
        assert_eq!(count(&g, "SELECT * MATCH (x)->(y)->(z)"), 3);
    }

    #[test]
    fn test_any_edge_takes_self_loop_once() {
        let g = graph();
        // 1-2 both ways, 2-3 both ways, 3-3 once
        assert_eq!(count(&g, "SELECT * MATCH (x)-(y)"), 5);
    }

    #[test]
    fn test_repeated_variable_requires_identity() {
        let g = graph();
        assert_eq!(count(&g, "SELECT * MATCH (x)->(x)"), 1);
        assert_eq!(count(&g, "SELECT * MATCH (x)->(y), (y)->(z)"), 3);
    }

    #[test]
    fn test_disconnected_chains_form_cross_product() {
        let g = graph();
        assert_eq!(count(&g, "SELECT * MATCH (x), (y)"), 9);
    }

    #[test]
    fn test_emits_bound_scope() {
        let g = graph();
        let query = parse_query("SELECT * MATCH (a)-[e]->(b)").unwrap();
        let (pattern, vars) = compile(query.patterns, g.schema()).unwrap();
        let mut matcher = DfsMatcher::new(&g, &pattern);

        struct Collect(Vec<Vec<Option<Element>>>);
        impl MatchSink for Collect {
            fn emit(&mut self, scope: &[Option<Element>]) {
                self.0.push(scope.to_vec());
            }
        }
        let mut sink = Collect(Vec::new());
        matcher.run_from(0, &mut sink);

        assert_eq!(sink.0.len(), 1);
        let row = &sink.0[0];
        assert_eq!(row[vars.slot("a").unwrap()], Some(Element::Vertex(0)));
        assert_eq!(row[vars.slot("e").unwrap()], Some(Element::Edge(0)));
        assert_eq!(row[vars.slot("b").unwrap()], Some(Element::Vertex(1)));
        assert_eq!(matcher.matched(), 1);
    }
}
