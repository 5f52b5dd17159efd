//! GraphDelta — recursive PATCH application over a model graph.
//!
//! Construction splits a document against the target schema: leaf keys go
//! into one `Delta`, nested objects become child `GraphDelta`s, and explicit
//! nulls on nested properties become clear markers. `patch` then replays
//! exactly what was recorded onto a live instance, leaves first.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::convert::convert;
use crate::delta::Delta;
use crate::error::{json_kind, GraphDeltaError, Result};
use crate::options::GraphDeltaOptions;
use crate::schema::node::{resolve_mut, Entity, Model, Schema};

// ============================================================================
// BranchChange
// ============================================================================

/// What a document asked for on a nested model property.
#[derive(Debug, Clone)]
pub enum BranchChange {
    /// The document set the property to null.
    Clear,
    /// The document held an object; apply it to the existing or a new child.
    Patch(GraphDelta),
}

// ============================================================================
// GraphDelta
// ============================================================================

#[derive(Debug, Clone)]
pub struct GraphDelta {
    root: Delta,
    /// Only branch properties present in the document have an entry.
    children: BTreeMap<&'static str, BranchChange>,
}

impl GraphDelta {
    /// Build a delta for `schema` from a JSON object document.
    pub fn new(schema: &'static Schema, document: &Value) -> Result<Self> {
        Self::with_options(schema, document, &GraphDeltaOptions::default())
    }

    pub fn with_options(
        schema: &'static Schema,
        document: &Value,
        options: &GraphDeltaOptions,
    ) -> Result<Self> {
        match document {
            Value::Object(object) => Self::read(schema, object, options, 0),
            Value::Null => Err(GraphDeltaError::invalid_argument(
                "document",
                "document is absent",
            )),
            other => Err(GraphDeltaError::invalid_argument(
                "document",
                format!("expected a JSON object, got {}", json_kind(other)),
            )),
        }
    }

    fn read(
        schema: &'static Schema,
        object: &Map<String, Value>,
        options: &GraphDeltaOptions,
        depth: usize,
    ) -> Result<Self> {
        if depth > options.max_depth {
            return Err(GraphDeltaError::DepthExceeded(options.max_depth));
        }
        Ok(Self {
            root: Self::read_root(schema, object)?,
            children: Self::read_children(schema, object, options, depth)?,
        })
    }

    fn read_root(schema: &'static Schema, object: &Map<String, Value>) -> Result<Delta> {
        let mut root = Delta::new(schema);

        for property in schema.leaves() {
            let Some(ty) = property.leaf_type() else {
                continue;
            };
            let node = match object.get(property.name()) {
                Some(node) if node.is_object() || node.is_array() => {
                    debug!(
                        schema = schema.name(),
                        property = property.name(),
                        found = json_kind(node),
                        "skipping non-scalar value for leaf property"
                    );
                    continue;
                }
                Some(node) => node,
                None => continue,
            };

            let value = convert(node, ty).map_err(|source| GraphDeltaError::ConversionFailure {
                type_name: schema.name(),
                property: property.name().to_string(),
                source,
            })?;
            root.try_set(property.name(), value)?;
        }

        Ok(root)
    }

    fn read_children(
        schema: &'static Schema,
        object: &Map<String, Value>,
        options: &GraphDeltaOptions,
        depth: usize,
    ) -> Result<BTreeMap<&'static str, BranchChange>> {
        let mut children = BTreeMap::new();

        for property in schema.branches() {
            let Some(child_schema) = property.branch_schema() else {
                continue;
            };
            match object.get(property.name()) {
                Some(Value::Object(nested)) => {
                    let child = Self::read(child_schema, nested, options, depth + 1)?;
                    children.insert(property.name(), BranchChange::Patch(child));
                }
                Some(Value::Null) => {
                    children.insert(property.name(), BranchChange::Clear);
                }
                Some(other) => {
                    debug!(
                        schema = schema.name(),
                        property = property.name(),
                        found = json_kind(other),
                        "skipping non-object value for nested property"
                    );
                }
                None => {}
            }
        }

        Ok(children)
    }

    pub fn schema(&self) -> &'static Schema {
        self.root.schema()
    }

    /// The leaf changeset for this level.
    pub fn root(&self) -> &Delta {
        &self.root
    }

    /// Nested property changes, keyed by property name.
    pub fn children(&self) -> impl Iterator<Item = (&'static str, &BranchChange)> + '_ {
        self.children.iter().map(|(name, change)| (*name, change))
    }

    pub fn child(&self, name: &str) -> Option<&BranchChange> {
        self.children.get(name)
    }

    /// Whether applying this delta would change nothing.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.children.is_empty()
    }

    /// Apply the recorded changes to `model`.
    ///
    /// `model` must be of the delta's type or extend it. Leaf changes are
    /// written first, then each nested property is cleared or patched,
    /// creating missing children with their default. A failure in a nested
    /// property leaves the changes already written in place.
    pub fn patch(&self, model: &mut dyn Entity) -> Result<()> {
        let schema = self.schema();
        let runtime = model.runtime_schema();
        if runtime.has_cyclic_base() {
            return Err(GraphDeltaError::introspection(runtime.name(), "base"));
        }
        if !schema.is_assignable_from(runtime) {
            return Err(GraphDeltaError::TypeMismatch {
                model: runtime.name(),
                expected: schema.name(),
            });
        }
        let target = resolve_mut(model, schema)
            .ok_or_else(|| GraphDeltaError::introspection(runtime.name(), "base_mut"))?;

        self.root.patch(&mut *target)?;

        for (name, change) in &self.children {
            let property = schema
                .property(name)
                .ok_or_else(|| GraphDeltaError::introspection(schema.name(), *name))?;
            match change {
                BranchChange::Clear => {
                    trace!(schema = schema.name(), property = *name, "clearing nested model");
                    property.clear_branch(&mut *target)?;
                }
                BranchChange::Patch(child) => {
                    trace!(schema = schema.name(), property = *name, "patching nested model");
                    let value = property.branch_or_default(&mut *target)?;
                    child.patch(value)?;
                }
            }
        }

        Ok(())
    }

    /// `patch` for a model that may be absent.
    pub fn patch_opt(&self, model: Option<&mut dyn Entity>) -> Result<()> {
        match model {
            Some(model) => self.patch(model),
            None => Err(GraphDeltaError::invalid_argument(
                "model",
                "model is absent",
            )),
        }
    }
}

// ============================================================================
// TypedGraphDelta
// ============================================================================

/// A `GraphDelta` whose target type is known statically.
pub struct TypedGraphDelta<T> {
    inner: GraphDelta,
    _model: PhantomData<fn() -> T>,
}

impl<T: Model> TypedGraphDelta<T> {
    pub fn new(document: &Value) -> Result<Self> {
        Self::with_options(document, &GraphDeltaOptions::default())
    }

    pub fn with_options(document: &Value, options: &GraphDeltaOptions) -> Result<Self> {
        Ok(Self {
            inner: GraphDelta::with_options(T::schema(), document, options)?,
            _model: PhantomData,
        })
    }

    pub fn into_inner(self) -> GraphDelta {
        self.inner
    }
}

impl<T> Deref for TypedGraphDelta<T> {
    type Target = GraphDelta;

    fn deref(&self) -> &GraphDelta {
        &self.inner
    }
}

impl<T> Clone for TypedGraphDelta<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _model: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedGraphDelta<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedGraphDelta").field(&self.inner).finish()
    }
}
