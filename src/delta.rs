//! Delta — the flat changeset for one schema level.
//!
//! Holds pending (leaf property, value) assignments and writes them onto an
//! instance of the schema's type when driven. It knows nothing about nested
//! models; `GraphDelta` builds one per level of the graph.

use std::any::Any;

use tracing::trace;

use crate::error::{GraphDeltaError, Result};
use crate::schema::leaf::LeafValue;
use crate::schema::node::Schema;

#[derive(Debug, Clone)]
pub struct Delta {
    schema: &'static Schema,
    /// Recorded changes in first-recorded order.
    changes: Vec<(&'static str, LeafValue)>,
}

impl Delta {
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            changes: Vec::new(),
        }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Record a pending value for a leaf property. Recording the same
    /// property twice keeps the last value.
    pub fn try_set(&mut self, name: &str, value: LeafValue) -> Result<()> {
        let property = self
            .schema
            .property(name)
            .filter(|p| p.is_leaf())
            .ok_or_else(|| GraphDeltaError::introspection(self.schema.name(), name))?;
        let name = property.name();

        trace!(
            schema = self.schema.name(),
            property = name,
            kind = value.kind(),
            "recording leaf change"
        );
        match self.changes.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.changes.push((name, value)),
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&LeafValue> {
        self.changes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }

    pub fn changed_properties(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changes.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Write every recorded value onto `target`, which must be an instance
    /// of the schema's type. Values overwrite unconditionally; properties
    /// without a recorded change are not touched.
    pub fn patch(&self, target: &mut dyn Any) -> Result<()> {
        for (name, value) in &self.changes {
            let property = self
                .schema
                .property(name)
                .ok_or_else(|| GraphDeltaError::introspection(self.schema.name(), *name))?;
            property.set_leaf(target, value.clone())?;
        }
        Ok(())
    }
}
