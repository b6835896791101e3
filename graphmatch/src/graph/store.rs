// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory graph with adjacency lists
//!
//! The graph is immutable once built: the matcher, groupers and sorters all
//! read it concurrently through shared references.

use std::collections::{HashMap, HashSet};

use super::schema::{PropertyId, Schema, TableId, TableKind};
use super::value::{Element, Value, ValueType};
use crate::error::GraphError;

/// One entry of a vertex's adjacency list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacency {
    /// Edge arena index
    pub edge: u32,
    /// Vertex arena index on the other side of the edge
    pub neighbor: u32,
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: i64,
    pub table: TableId,
    properties: Vec<Option<Value>>,
    out_edges: Vec<Adjacency>,
    in_edges: Vec<Adjacency>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: i64,
    pub table: TableId,
    properties: Vec<Option<Value>>,
    pub source: u32,
    pub target: u32,
}

/// Immutable labeled-property graph
#[derive(Debug, Clone, Default)]
pub struct Graph {
    schema: Schema,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex(&self, index: u32) -> &Vertex {
        &self.vertices[index as usize]
    }

    pub fn edge(&self, index: u32) -> &Edge {
        &self.edges[index as usize]
    }

    /// All vertices in arena order
    pub fn vertices(&self) -> impl Iterator<Item = Element> + '_ {
        (0..self.vertices.len() as u32).map(Element::Vertex)
    }

    pub fn out_edges(&self, vertex: u32) -> &[Adjacency] {
        &self.vertices[vertex as usize].out_edges
    }

    pub fn in_edges(&self, vertex: u32) -> &[Adjacency] {
        &self.vertices[vertex as usize].in_edges
    }

    pub fn table_of(&self, element: Element) -> TableId {
        match element {
            Element::Vertex(v) => self.vertices[v as usize].table,
            Element::Edge(e) => self.edges[e as usize].table,
        }
    }

    /// User-visible identity of an element
    pub fn element_id(&self, element: Element) -> i64 {
        match element {
            Element::Vertex(v) => self.vertices[v as usize].id,
            Element::Edge(e) => self.edges[e as usize].id,
        }
    }

    /// Property value of an element, `None` when the table lacks it or the value is unset
    pub fn try_get_property(&self, element: Element, property: PropertyId) -> Option<&Value> {
        let (table, values) = match element {
            Element::Vertex(v) => {
                let vertex = &self.vertices[v as usize];
                (vertex.table, &vertex.properties)
            }
            Element::Edge(e) => {
                let edge = &self.edges[e as usize];
                (edge.table, &edge.properties)
            }
        };
        let position = self.schema.table(table).position(property)?;
        values.get(position)?.as_ref()
    }
}

/// Incremental graph construction keyed by user-visible ids
#[derive(Debug, Default)]
pub struct GraphBuilder {
    schema: Schema,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    vertex_ids: HashMap<i64, u32>,
    edge_ids: HashSet<i64>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn vertex_table<I, S>(&mut self, name: &str, properties: I) -> Result<TableId, GraphError>
    where
        I: IntoIterator<Item = (S, ValueType)>,
        S: AsRef<str>,
    {
        self.schema.add_table(name, TableKind::Vertex, properties)
    }

    pub fn edge_table<I, S>(&mut self, name: &str, properties: I) -> Result<TableId, GraphError>
    where
        I: IntoIterator<Item = (S, ValueType)>,
        S: AsRef<str>,
    {
        self.schema.add_table(name, TableKind::Edge, properties)
    }

    pub fn add_vertex<I, S>(&mut self, id: i64, table: TableId, properties: I) -> Result<u32, GraphError>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        self.check_kind(table, TableKind::Vertex)?;
        if self.vertex_ids.contains_key(&id) {
            return Err(GraphError::DuplicateId { kind: "vertex", id });
        }

        let properties = self.layout_properties(table, properties)?;
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex {
            id,
            table,
            properties,
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        });
        self.vertex_ids.insert(id, index);
        Ok(index)
    }

    pub fn add_edge<I, S>(
        &mut self,
        id: i64,
        table: TableId,
        from: i64,
        to: i64,
        properties: I,
    ) -> Result<u32, GraphError>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        self.check_kind(table, TableKind::Edge)?;
        if !self.edge_ids.insert(id) {
            return Err(GraphError::DuplicateId { kind: "edge", id });
        }

        let source = *self
            .vertex_ids
            .get(&from)
            .ok_or(GraphError::DanglingEdge { edge: id, vertex: from })?;
        let target = *self
            .vertex_ids
            .get(&to)
            .ok_or(GraphError::DanglingEdge { edge: id, vertex: to })?;

        let properties = self.layout_properties(table, properties)?;
        let index = self.edges.len() as u32;
        self.edges.push(Edge {
            id,
            table,
            properties,
            source,
            target,
        });
        self.vertices[source as usize].out_edges.push(Adjacency {
            edge: index,
            neighbor: target,
        });
        self.vertices[target as usize].in_edges.push(Adjacency {
            edge: index,
            neighbor: source,
        });
        Ok(index)
    }

    pub fn build(self) -> Graph {
        Graph {
            schema: self.schema,
            vertices: self.vertices,
            edges: self.edges,
        }
    }

    fn check_kind(&self, table: TableId, kind: TableKind) -> Result<(), GraphError> {
        let declared = self.schema.table(table);
        if declared.kind() != kind {
            return Err(GraphError::UnknownTable {
                kind: kind.name(),
                name: declared.name().to_string(),
            });
        }
        Ok(())
    }

    fn layout_properties<I, S>(&self, table: TableId, properties: I) -> Result<Vec<Option<Value>>, GraphError>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let table = self.schema.table(table);
        let mut slots = vec![None; table.properties().len()];

        for (name, value) in properties {
            let name = name.as_ref();
            let position = self
                .schema
                .property_by_name(name)
                .and_then(|id| table.position(id).map(|p| (id, p)));
            let Some((id, position)) = position else {
                return Err(GraphError::UnknownProperty {
                    table: table.name().to_string(),
                    property: name.to_string(),
                });
            };

            let expected = self.schema.property(id).value_type;
            if value.value_type() != expected {
                return Err(GraphError::PropertyType {
                    property: name.to_string(),
                    expected: expected.to_string(),
                    found: value.value_type().to_string(),
                });
            }
            slots[position] = Some(value);
        }

        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_props() -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    #[test]
    fn test_adjacency_and_properties() {
        let mut builder = GraphBuilder::new();
        let person = builder.vertex_table("Person", [("val", ValueType::Int)]).unwrap();
        let knows = builder
            .edge_table("Knows", Vec::<(&str, ValueType)>::new())
            .unwrap();
        builder.add_vertex(1, person, [("val", Value::Int(10))]).unwrap();
        builder.add_vertex(2, person, no_props()).unwrap();
        builder.add_edge(7, knows, 1, 2, no_props()).unwrap();
        let graph = builder.build();

        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.out_edges(0), &[Adjacency { edge: 0, neighbor: 1 }]);
        assert_eq!(graph.in_edges(1), &[Adjacency { edge: 0, neighbor: 0 }]);
        assert_eq!(graph.element_id(Element::Edge(0)), 7);

        let val = graph.schema().property_by_name("val").unwrap();
        assert_eq!(graph.try_get_property(Element::Vertex(0), val), Some(&Value::Int(10)));
        assert_eq!(graph.try_get_property(Element::Vertex(1), val), None);
        assert_eq!(graph.try_get_property(Element::Edge(0), val), None);
    }

    #[test]
    fn test_builder_rejects_bad_input() {
        let mut builder = GraphBuilder::new();
        let person = builder.vertex_table("Person", [("val", ValueType::Int)]).unwrap();
        let knows = builder
            .edge_table("Knows", Vec::<(&str, ValueType)>::new())
            .unwrap();
        builder.add_vertex(1, person, no_props()).unwrap();

        assert!(matches!(
            builder.add_vertex(1, person, no_props()),
            Err(GraphError::DuplicateId { .. })
        ));
        assert!(matches!(
            builder.add_vertex(2, person, [("val", Value::Str("x".into()))]),
            Err(GraphError::PropertyType { .. })
        ));
        assert!(matches!(
            builder.add_edge(1, knows, 1, 99, no_props()),
            Err(GraphError::DanglingEdge { vertex: 99, .. })
        ));
        assert!(matches!(
            builder.add_vertex(3, knows, no_props()),
            Err(GraphError::UnknownTable { .. })
        ));
    }
}
