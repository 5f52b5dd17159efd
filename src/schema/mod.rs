pub mod leaf;
pub mod node;
pub mod registry;

pub use leaf::{Leaf, LeafType, LeafValue, ScalarType};
pub use node::{Entity, Model, Property, PropertyKind, Schema, SchemaBuilder};
pub use registry::SchemaRegistry;
