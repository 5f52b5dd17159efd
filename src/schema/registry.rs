//! Registered schema table for hosts that only know a type by name at
//! runtime (routing tables, plugin-provided models).

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{GraphDeltaError, Result};
use crate::graph::GraphDelta;
use crate::options::GraphDeltaOptions;
use crate::schema::node::{Model, Schema};

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, &'static Schema>,
    options: GraphDeltaOptions,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GraphDeltaOptions) -> Self {
        Self {
            schemas: HashMap::new(),
            options,
        }
    }

    /// Register `T` under its schema name.
    pub fn register<T: Model>(&mut self) -> &mut Self {
        self.insert(T::schema())
    }

    /// Register a schema. A later schema with the same name replaces the
    /// earlier one.
    pub fn insert(&mut self, schema: &'static Schema) -> &mut Self {
        self.schemas.insert(schema.name(), schema);
        self
    }

    pub fn get(&self, name: &str) -> Option<&'static Schema> {
        self.schemas.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Build a delta for the type registered as `type_name`.
    pub fn graph_delta(&self, type_name: &str, document: &Value) -> Result<GraphDelta> {
        if type_name.is_empty() {
            return Err(GraphDeltaError::invalid_argument(
                "type",
                "type name is empty",
            ));
        }
        let schema = self.get(type_name).ok_or_else(|| {
            GraphDeltaError::invalid_argument("type", format!("unknown type {type_name}"))
        })?;
        GraphDelta::with_options(schema, document, &self.options)
    }
}
