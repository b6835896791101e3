// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! JSON graph loading

use log::info;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::store::{Graph, GraphBuilder};
use super::value::{Value, ValueType};
use crate::error::{GraphError, Result};

#[derive(Debug, Deserialize)]
struct GraphFile {
    #[serde(default)]
    vertex_tables: Vec<TableDecl>,
    #[serde(default)]
    edge_tables: Vec<TableDecl>,
    #[serde(default)]
    vertices: Vec<VertexDecl>,
    #[serde(default)]
    edges: Vec<EdgeDecl>,
}

#[derive(Debug, Deserialize)]
struct TableDecl {
    name: String,
    #[serde(default)]
    properties: BTreeMap<String, ValueType>,
}

#[derive(Debug, Deserialize)]
struct VertexDecl {
    id: i64,
    table: String,
    #[serde(default)]
    properties: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EdgeDecl {
    id: i64,
    table: String,
    from: i64,
    to: i64,
    #[serde(default)]
    properties: BTreeMap<String, serde_json::Value>,
}

/// Load a graph from a JSON file
pub fn load_graph(path: impl AsRef<Path>) -> Result<Graph> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let graph = parse_graph(&text)?;
    info!(
        "Loaded graph from {:?}: {} vertices, {} edges",
        path,
        graph.vertex_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Build a graph from its JSON representation
pub fn parse_graph(json: &str) -> Result<Graph> {
    let file: GraphFile = serde_json::from_str(json)?;
    let mut builder = GraphBuilder::new();

    for table in &file.vertex_tables {
        builder.vertex_table(&table.name, table.properties.iter().map(|(k, t)| (k, *t)))?;
    }
    for table in &file.edge_tables {
        builder.edge_table(&table.name, table.properties.iter().map(|(k, t)| (k, *t)))?;
    }

    for vertex in file.vertices {
        let table = builder
            .schema()
            .resolve_table(&vertex.table, super::TableKind::Vertex)?;
        let properties = convert_properties(&builder, &vertex.table, vertex.properties)?;
        builder.add_vertex(vertex.id, table, properties)?;
    }
    for edge in file.edges {
        let table = builder
            .schema()
            .resolve_table(&edge.table, super::TableKind::Edge)?;
        let properties = convert_properties(&builder, &edge.table, edge.properties)?;
        builder.add_edge(edge.id, table, edge.from, edge.to, properties)?;
    }

    Ok(builder.build())
}

fn convert_properties(
    builder: &GraphBuilder,
    table: &str,
    properties: BTreeMap<String, serde_json::Value>,
) -> std::result::Result<Vec<(String, Value)>, GraphError> {
    let mut converted = Vec::with_capacity(properties.len());
    for (name, json) in properties {
        if json.is_null() {
            continue;
        }
        let expected = builder
            .schema()
            .property_by_name(&name)
            .map(|id| builder.schema().property(id).value_type);
        let value = match (expected, &json) {
            (Some(ValueType::Bool), serde_json::Value::Bool(b)) => Value::Bool(*b),
            (Some(ValueType::Int), serde_json::Value::Number(n)) if n.is_i64() => {
                Value::Int(n.as_i64().unwrap_or_default())
            }
            (Some(ValueType::Str), serde_json::Value::String(s)) => Value::Str(s.clone()),
            (Some(expected), other) => {
                return Err(GraphError::PropertyType {
                    property: name,
                    expected: expected.to_string(),
                    found: other.to_string(),
                })
            }
            (None, _) => {
                return Err(GraphError::UnknownProperty {
                    table: table.to_string(),
                    property: name,
                })
            }
        };
        converted.push((name, value));
    }
    Ok(converted)
}
