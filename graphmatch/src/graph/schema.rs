// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Tables (element types) and property keys

use std::collections::HashMap;

use super::value::ValueType;
use crate::error::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Vertex,
    Edge,
}

impl TableKind {
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Vertex => "vertex",
            TableKind::Edge => "edge",
        }
    }
}

/// Type descriptor shared by every element of one kind
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    kind: TableKind,
    properties: Vec<PropertyId>,
    positions: HashMap<PropertyId, usize>,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Slot of `property` inside this table's property layout
    pub fn position(&self, property: PropertyId) -> Option<usize> {
        self.positions.get(&property).copied()
    }
}

/// Graph-wide property name with its declared type
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyKey {
    pub name: String,
    pub value_type: ValueType,
}

/// Table and property registry of a graph
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: Vec<Table>,
    table_names: HashMap<String, TableId>,
    properties: Vec<PropertyKey>,
    property_names: HashMap<String, PropertyId>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table; property names are shared graph-wide and must keep one type
    pub fn add_table<I, S>(
        &mut self,
        name: &str,
        kind: TableKind,
        properties: I,
    ) -> Result<TableId, GraphError>
    where
        I: IntoIterator<Item = (S, ValueType)>,
        S: AsRef<str>,
    {
        if self.table_names.contains_key(name) {
            return Err(GraphError::DuplicateTable(name.to_string()));
        }

        let mut layout = Vec::new();
        let mut positions = HashMap::new();
        for (property, value_type) in properties {
            let id = self.intern_property(property.as_ref(), value_type)?;
            if positions.insert(id, layout.len()).is_none() {
                layout.push(id);
            }
        }

        let id = TableId(self.tables.len() as u32);
        self.tables.push(Table {
            name: name.to_string(),
            kind,
            properties: layout,
            positions,
        });
        self.table_names.insert(name.to_string(), id);
        Ok(id)
    }

    fn intern_property(&mut self, name: &str, value_type: ValueType) -> Result<PropertyId, GraphError> {
        if let Some(id) = self.property_names.get(name) {
            let existing = &self.properties[id.0 as usize];
            if existing.value_type != value_type {
                return Err(GraphError::PropertyType {
                    property: name.to_string(),
                    expected: existing.value_type.to_string(),
                    found: value_type.to_string(),
                });
            }
            return Ok(*id);
        }

        let id = PropertyId(self.properties.len() as u32);
        self.properties.push(PropertyKey {
            name: name.to_string(),
            value_type,
        });
        self.property_names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.0 as usize]
    }

    pub fn tables(&self) -> impl Iterator<Item = (TableId, &Table)> {
        self.tables
            .iter()
            .enumerate()
            .map(|(i, t)| (TableId(i as u32), t))
    }

    pub fn table_by_name(&self, name: &str) -> Option<TableId> {
        self.table_names.get(name).copied()
    }

    /// Look up a table by name, requiring it to hold elements of `kind`
    pub fn resolve_table(&self, name: &str, kind: TableKind) -> Result<TableId, GraphError> {
        match self.table_by_name(name) {
            Some(id) if self.table(id).kind == kind => Ok(id),
            _ => Err(GraphError::UnknownTable {
                kind: kind.name(),
                name: name.to_string(),
            }),
        }
    }

    pub fn property(&self, id: PropertyId) -> &PropertyKey {
        &self.properties[id.0 as usize]
    }

    pub fn property_by_name(&self, name: &str) -> Option<PropertyId> {
        self.property_names.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_shared_across_tables() {
        let mut schema = Schema::new();
        let person = schema
            .add_table("Person", TableKind::Vertex, [("name", ValueType::Str), ("age", ValueType::Int)])
            .unwrap();
        let city = schema
            .add_table("City", TableKind::Vertex, [("name", ValueType::Str)])
            .unwrap();

        let name = schema.property_by_name("name").unwrap();
        assert_eq!(schema.table(person).position(name), Some(0));
        assert_eq!(schema.table(city).position(name), Some(0));
        let age = schema.property_by_name("age").unwrap();
        assert_eq!(schema.table(city).position(age), None);
    }

    #[test]
    fn test_conflicting_property_type_rejected() {
        let mut schema = Schema::new();
        schema
            .add_table("Person", TableKind::Vertex, [("age", ValueType::Int)])
            .unwrap();
        let err = schema
            .add_table("Dog", TableKind::Vertex, [("age", ValueType::Str)])
            .unwrap_err();
        assert!(matches!(err, GraphError::PropertyType { .. }));
    }

    #[test]
    fn test_resolve_table_checks_kind() {
        let mut schema = Schema::new();
        schema
            .add_table("Knows", TableKind::Edge, Vec::<(&str, ValueType)>::new())
            .unwrap();
        assert!(schema.resolve_table("Knows", TableKind::Edge).is_ok());
        assert!(schema.resolve_table("Knows", TableKind::Vertex).is_err());
        assert!(schema.resolve_table("Missing", TableKind::Edge).is_err());
    }
}
