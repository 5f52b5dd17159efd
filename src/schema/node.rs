//! Schema descriptors for patchable model types.
//!
//! A `Schema` is the registered description of one Rust type: its ordered
//! properties, each classified once as a leaf (scalar, text, binary) or a
//! branch (nested model slot), with typed accessors bound at build time.
//! Nothing here inspects runtime values to decide a property's kind.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

use crate::error::{ConvertError, GraphDeltaError, Result};
use crate::schema::leaf::{Leaf, LeafType, LeafValue};

// ============================================================================
// Entity / Model
// ============================================================================

/// A live instance that a graph delta can be applied to.
///
/// Wrapper types (change-tracking proxies and the like) implement this with
/// their own schema declaring `extends::<Base>()`, and return the wrapped
/// instance from `base_mut`, so deltas built for `Base` accept them.
pub trait Entity: Any {
    /// Schema of the instance's runtime type.
    fn runtime_schema(&self) -> &'static Schema;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The instance this one extends, if any.
    fn base_mut(&mut self) -> Option<&mut dyn Entity> {
        None
    }
}

/// A model type with a static schema and a default constructor.
pub trait Model: Entity + Default {
    fn schema() -> &'static Schema;
}

/// Resolve `model` to the instance of `target`'s type: the model itself, or
/// the first base in its `base_mut` chain whose type matches.
pub(crate) fn resolve_mut<'a>(
    model: &'a mut dyn Entity,
    target: &Schema,
) -> Option<&'a mut dyn Any> {
    if model.runtime_schema().type_id() == target.type_id() {
        return Some(model.as_any_mut());
    }
    match model.base_mut() {
        Some(base) => resolve_mut(base, target),
        None => None,
    }
}

// ============================================================================
// Accessors
// ============================================================================

trait LeafAccess: Send + Sync {
    /// `None` when `target` is not of the owning type.
    fn set(&self, target: &mut dyn Any, value: LeafValue) -> Option<Result<(), ConvertError>>;
}

trait BranchAccess: Send + Sync {
    /// `false` when `target` is not of the owning type.
    fn clear(&self, target: &mut dyn Any) -> bool;

    /// The child instance held by the slot, created with its default when
    /// the slot is empty.
    fn get_or_default<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Entity>;
}

struct LeafField<T, V> {
    get: fn(&mut T) -> &mut V,
}

impl<T: 'static, V: Leaf> LeafAccess for LeafField<T, V> {
    fn set(&self, target: &mut dyn Any, value: LeafValue) -> Option<Result<(), ConvertError>> {
        let model = target.downcast_mut::<T>()?;
        Some(V::from_leaf(value).map(|v| *(self.get)(model) = v))
    }
}

struct BranchField<T, C> {
    get: fn(&mut T) -> &mut Option<C>,
}

impl<T: 'static, C: Model> BranchAccess for BranchField<T, C> {
    fn clear(&self, target: &mut dyn Any) -> bool {
        match target.downcast_mut::<T>() {
            Some(model) => {
                *(self.get)(model) = None;
                true
            }
            None => false,
        }
    }

    fn get_or_default<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Entity> {
        let model = target.downcast_mut::<T>()?;
        let child = (self.get)(model).get_or_insert_with(C::default);
        Some(child as &mut dyn Entity)
    }
}

struct BoxedBranchField<T, C> {
    get: fn(&mut T) -> &mut Option<Box<C>>,
}

impl<T: 'static, C: Model> BranchAccess for BoxedBranchField<T, C> {
    fn clear(&self, target: &mut dyn Any) -> bool {
        match target.downcast_mut::<T>() {
            Some(model) => {
                *(self.get)(model) = None;
                true
            }
            None => false,
        }
    }

    fn get_or_default<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Entity> {
        let model = target.downcast_mut::<T>()?;
        let child = (self.get)(model).get_or_insert_with(|| Box::new(C::default()));
        Some(child.as_mut() as &mut dyn Entity)
    }
}

// ============================================================================
// Property
// ============================================================================

/// Classification of a property, fixed by its declared type.
#[derive(Clone, Copy)]
pub enum PropertyKind {
    Leaf(LeafType),
    /// Nested model; the function returns the declared child schema.
    Branch(fn() -> &'static Schema),
}

impl fmt::Debug for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(ty) => write!(f, "Leaf({ty})"),
            Self::Branch(schema) => write!(f, "Branch({})", schema().name()),
        }
    }
}

enum Access {
    Leaf(Box<dyn LeafAccess>),
    Branch(Box<dyn BranchAccess>),
}

pub struct Property {
    owner: &'static str,
    name: &'static str,
    kind: PropertyKind,
    access: Access,
}

impl Property {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, PropertyKind::Leaf(_))
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.kind, PropertyKind::Branch(_))
    }

    pub fn leaf_type(&self) -> Option<LeafType> {
        match self.kind {
            PropertyKind::Leaf(ty) => Some(ty),
            PropertyKind::Branch(_) => None,
        }
    }

    /// Declared schema of a branch property.
    pub fn branch_schema(&self) -> Option<&'static Schema> {
        match self.kind {
            PropertyKind::Branch(schema) => Some(schema()),
            PropertyKind::Leaf(_) => None,
        }
    }

    fn introspection_error(&self) -> GraphDeltaError {
        GraphDeltaError::introspection(self.owner, self.name)
    }

    /// Write a leaf value onto `target`, which must be the owning type.
    pub(crate) fn set_leaf(&self, target: &mut dyn Any, value: LeafValue) -> Result<()> {
        let Access::Leaf(access) = &self.access else {
            return Err(self.introspection_error());
        };
        match access.set(target, value) {
            Some(result) => result.map_err(|source| GraphDeltaError::ConversionFailure {
                type_name: self.owner,
                property: self.name.to_string(),
                source,
            }),
            None => Err(self.introspection_error()),
        }
    }

    /// Empty the branch slot on `target`.
    pub(crate) fn clear_branch(&self, target: &mut dyn Any) -> Result<()> {
        match &self.access {
            Access::Branch(access) if access.clear(target) => Ok(()),
            _ => Err(self.introspection_error()),
        }
    }

    /// The branch slot's child on `target`, created with its default if empty.
    pub(crate) fn branch_or_default<'a>(
        &self,
        target: &'a mut dyn Any,
    ) -> Result<&'a mut dyn Entity> {
        let Access::Branch(access) = &self.access else {
            return Err(self.introspection_error());
        };
        match access.get_or_default(target) {
            Some(child) => Ok(child),
            None => Err(self.introspection_error()),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

// ============================================================================
// Schema
// ============================================================================

pub struct Schema {
    name: &'static str,
    type_id: TypeId,
    base: Option<fn() -> &'static Schema>,
    properties: Vec<Property>,
}

impl Schema {
    pub fn builder<T: 'static>(name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            name,
            base: None,
            properties: Vec::new(),
            _model: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Schema of the type this one extends.
    pub fn base(&self) -> Option<&'static Schema> {
        self.base.map(|base| base())
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.is_leaf())
    }

    pub fn branches(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.is_branch())
    }

    /// Whether an instance whose runtime schema is `runtime` can be patched
    /// as this type: `runtime` is this type or extends it, directly or
    /// through a chain of bases.
    ///
    /// A cyclic base chain is walked once and yields `false`.
    pub fn is_assignable_from(&self, runtime: &Schema) -> bool {
        let mut seen = Vec::new();
        let mut current = Some(runtime);
        while let Some(schema) = current {
            if schema.type_id == self.type_id {
                return true;
            }
            if seen.contains(&schema.type_id) {
                return false;
            }
            seen.push(schema.type_id);
            current = schema.base();
        }
        false
    }

    /// Whether following `base` from this schema revisits a type.
    pub(crate) fn has_cyclic_base(&self) -> bool {
        let mut seen = vec![self.type_id];
        let mut current = self.base();
        while let Some(schema) = current {
            if seen.contains(&schema.type_id) {
                return true;
            }
            seen.push(schema.type_id);
            current = schema.base();
        }
        false
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("base", &self.base().map(Schema::name))
            .field("properties", &self.properties)
            .finish()
    }
}

// ============================================================================
// SchemaBuilder
// ============================================================================

/// Builder for a model type's schema.
///
/// ```ignore
/// Schema::builder::<Person>("Person")
///     .leaf("Name", |p: &mut Person| &mut p.name)
///     .branch("Address", |p: &mut Person| &mut p.address)
///     .build()
/// ```
pub struct SchemaBuilder<T> {
    name: &'static str,
    base: Option<fn() -> &'static Schema>,
    properties: Vec<Property>,
    _model: PhantomData<fn() -> T>,
}

impl<T: 'static> SchemaBuilder<T> {
    fn push(mut self, name: &'static str, kind: PropertyKind, access: Access) -> Self {
        // Re-registering a name replaces the earlier descriptor.
        self.properties.retain(|p| p.name != name);
        self.properties.push(Property {
            owner: self.name,
            name,
            kind,
            access,
        });
        self
    }

    /// Register a leaf property (scalar, text, binary, or `Option` of one).
    pub fn leaf<V: Leaf>(self, name: &'static str, get: fn(&mut T) -> &mut V) -> Self {
        self.push(
            name,
            PropertyKind::Leaf(V::TYPE),
            Access::Leaf(Box::new(LeafField { get })),
        )
    }

    /// Register a nested model held as `Option<C>`.
    pub fn branch<C: Model>(self, name: &'static str, get: fn(&mut T) -> &mut Option<C>) -> Self {
        self.push(
            name,
            PropertyKind::Branch(C::schema),
            Access::Branch(Box::new(BranchField { get })),
        )
    }

    /// Register a nested model held as `Option<Box<C>>`, for recursive types.
    pub fn boxed_branch<C: Model>(
        self,
        name: &'static str,
        get: fn(&mut T) -> &mut Option<Box<C>>,
    ) -> Self {
        self.push(
            name,
            PropertyKind::Branch(C::schema),
            Access::Branch(Box::new(BoxedBranchField { get })),
        )
    }

    /// Declare that `T` extends `B`: deltas built for `B` accept `T`.
    pub fn extends<B: Model>(mut self) -> Self {
        self.base = Some(B::schema as fn() -> &'static Schema);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            name: self.name,
            type_id: TypeId::of::<T>(),
            base: self.base,
            properties: self.properties,
        }
    }
}

// ============================================================================
// model! macro
// ============================================================================

/// Implement `Entity` and `Model` for a struct from a property list.
///
/// Each entry is `leaf`, `branch` or `boxed_branch`, followed by the
/// document name and the struct field:
///
/// ```ignore
/// #[derive(Default)]
/// struct Order { id: i32, note: Option<String>, customer: Option<Customer> }
///
/// graph_delta::model!(Order {
///     leaf "Id" => id,
///     leaf "Note" => note,
///     branch "Customer" => customer,
/// });
/// ```
#[macro_export]
macro_rules! model {
    ($ty:ident { $($kind:ident $name:literal => $field:ident),* $(,)? }) => {
        impl $crate::Entity for $ty {
            fn runtime_schema(&self) -> &'static $crate::Schema {
                <$ty as $crate::Model>::schema()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }

        impl $crate::Model for $ty {
            fn schema() -> &'static $crate::Schema {
                static SCHEMA: ::std::sync::OnceLock<$crate::Schema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    $crate::Schema::builder::<$ty>(stringify!($ty))
                        $(.$kind($name, |model: &mut $ty| &mut model.$field))*
                        .build()
                })
            }
        }
    };
}
