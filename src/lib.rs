//! Graph delta: sparse PATCH application onto typed model graphs.
//!
//! A JSON document is split against a model's schema into leaf changes and
//! nested model changes. Applying it writes only what the document names:
//! absent keys leave properties untouched, explicit nulls clear them, and
//! nested objects are patched recursively, creating children on demand.

pub mod convert;
pub mod delta;
pub mod error;
pub mod graph;
pub mod options;
pub mod reader;
pub mod schema;

pub use convert::convert;
pub use delta::Delta;
pub use error::{ConvertError, GraphDeltaError, Result};
pub use graph::{BranchChange, GraphDelta, TypedGraphDelta};
pub use options::{GraphDeltaOptions, DEFAULT_MAX_DEPTH};
pub use reader::{GraphDeltaReader, JSON_MEDIA_TYPE};
pub use schema::{
    Entity, Leaf, LeafType, LeafValue, Model, Property, PropertyKind, ScalarType, Schema,
    SchemaBuilder, SchemaRegistry,
};
