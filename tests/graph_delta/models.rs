//! Shared test models.

use std::any::Any;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use graph_delta::{Entity, Model, Schema};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleModel {
    pub id: i32,
    pub value: String,
    pub count: i32,
}

graph_delta::model!(SimpleModel {
    leaf "Id" => id,
    leaf "Value" => value,
    leaf "Count" => count,
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexModel {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub child: Option<SimpleModel>,
}

graph_delta::model!(ComplexModel {
    leaf "Id" => id,
    leaf "FirstName" => first_name,
    leaf "LastName" => last_name,
    branch "Child" => child,
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NullableModel {
    pub id: Option<i32>,
    pub created: Option<NaiveDateTime>,
    pub tri_state: Option<bool>,
}

graph_delta::model!(NullableModel {
    leaf "Id" => id,
    leaf "Created" => created,
    leaf "TriState" => tri_state,
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ByteModel {
    pub value: Option<Vec<u8>>,
}

graph_delta::model!(ByteModel {
    leaf "Value" => value,
});

/// Two levels of nesting: Order → Customer → Address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: Option<String>,
}

graph_delta::model!(Address {
    leaf "Street" => street,
    leaf "City" => city,
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub name: String,
    pub address: Option<Address>,
    pub billing: Option<Box<Address>>,
}

graph_delta::model!(Customer {
    leaf "Name" => name,
    branch "Address" => address,
    boxed_branch "Billing" => billing,
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Order {
    pub id: u64,
    pub total: f64,
    pub customer: Option<Customer>,
}

graph_delta::model!(Order {
    leaf "Id" => id,
    leaf "Total" => total,
    branch "Customer" => customer,
});

// ============================================================================
// Proxies
// ============================================================================

/// Change-tracking wrapper around a `SimpleModel`, in the way a persistence
/// layer hands out instances that extend the declared model.
#[derive(Debug, Default)]
pub struct TrackedSimple {
    pub inner: SimpleModel,
    pub loaded: bool,
}

impl Entity for TrackedSimple {
    fn runtime_schema(&self) -> &'static Schema {
        <TrackedSimple as Model>::schema()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn base_mut(&mut self) -> Option<&mut dyn Entity> {
        Some(&mut self.inner)
    }
}

impl Model for TrackedSimple {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<TrackedSimple>("TrackedSimple")
                .extends::<SimpleModel>()
                .build()
        })
    }
}

/// A wrapper around a wrapper.
#[derive(Debug, Default)]
pub struct AuditedSimple {
    pub inner: TrackedSimple,
}

impl Entity for AuditedSimple {
    fn runtime_schema(&self) -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<AuditedSimple>("AuditedSimple")
                .extends::<TrackedSimple>()
                .build()
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn base_mut(&mut self) -> Option<&mut dyn Entity> {
        Some(&mut self.inner)
    }
}

/// Two schemas that name each other as base. Only a broken hand-written
/// `Model` impl can produce this; the engine must still terminate.
#[derive(Debug, Default)]
pub struct LoopA;

#[derive(Debug, Default)]
pub struct LoopB;

impl Entity for LoopA {
    fn runtime_schema(&self) -> &'static Schema {
        <LoopA as Model>::schema()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Model for LoopA {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| Schema::builder::<LoopA>("LoopA").extends::<LoopB>().build())
    }
}

impl Entity for LoopB {
    fn runtime_schema(&self) -> &'static Schema {
        <LoopB as Model>::schema()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Model for LoopB {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| Schema::builder::<LoopB>("LoopB").extends::<LoopA>().build())
    }
}
