//! Building deltas: argument checks, changeset shape, conversion failures.

use graph_delta::{
    BranchChange, ConvertError, Entity, GraphDelta, GraphDeltaError, LeafValue, Model,
    SchemaRegistry, TypedGraphDelta,
};
use serde_json::{json, Value};

use crate::models::{ByteModel, ComplexModel, NullableModel, Order, SimpleModel};

// ============================================================================
// Argument checks
// ============================================================================

#[test]
fn absent_document_is_invalid_argument() {
    let err = GraphDelta::new(SimpleModel::schema(), &Value::Null).unwrap_err();
    assert!(matches!(
        err,
        GraphDeltaError::InvalidArgument {
            argument: "document",
            ..
        }
    ));
}

#[test]
fn non_object_document_is_invalid_argument() {
    for document in [json!([]), json!("x"), json!(3)] {
        assert!(matches!(
            GraphDelta::new(SimpleModel::schema(), &document),
            Err(GraphDeltaError::InvalidArgument {
                argument: "document",
                ..
            })
        ));
    }
}

#[test]
fn absent_type_is_invalid_argument() {
    let mut registry = SchemaRegistry::new();
    registry.register::<SimpleModel>();

    assert!(matches!(
        registry.graph_delta("", &json!({})),
        Err(GraphDeltaError::InvalidArgument { argument: "type", .. })
    ));
    assert!(registry.graph_delta("SimpleModel", &json!({})).is_ok());
}

#[test]
fn absent_model_is_invalid_argument() {
    let delta = GraphDelta::new(SimpleModel::schema(), &json!({ "Value": "Updated" })).unwrap();
    assert!(matches!(
        delta.patch_opt(None),
        Err(GraphDeltaError::InvalidArgument {
            argument: "model",
            ..
        })
    ));

    let mut model = SimpleModel::default();
    delta.patch_opt(Some(&mut model as &mut dyn Entity)).unwrap();
    assert_eq!(model.value, "Updated");
}

#[test]
fn unrelated_model_is_type_mismatch() {
    let delta = GraphDelta::new(SimpleModel::schema(), &json!({ "Value": "Updated" })).unwrap();
    let mut other = NullableModel::default();

    let err = delta.patch(&mut other).unwrap_err();
    match &err {
        GraphDeltaError::TypeMismatch { model, expected } => {
            assert_eq!(*model, "NullableModel");
            assert_eq!(*expected, "SimpleModel");
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Model is of type NullableModel but delta is for SimpleModel"
    );
}

// ============================================================================
// Changeset shape
// ============================================================================

#[test]
fn leaf_changeset_records_only_present_keys() {
    let delta = GraphDelta::new(
        NullableModel::schema(),
        &json!({ "Id": 10, "TriState": null }),
    )
    .unwrap();

    let root = delta.root();
    assert_eq!(root.len(), 2);
    assert_eq!(root.get("Id"), Some(&LeafValue::Int(10)));
    assert_eq!(root.get("TriState"), Some(&LeafValue::Null));
    assert_eq!(root.get("Created"), None);
}

#[test]
fn branch_map_distinguishes_absent_null_and_object() {
    let absent = GraphDelta::new(ComplexModel::schema(), &json!({ "Id": 1 })).unwrap();
    assert!(absent.child("Child").is_none());
    assert_eq!(absent.children().count(), 0);

    let cleared = GraphDelta::new(ComplexModel::schema(), &json!({ "Child": null })).unwrap();
    assert!(matches!(cleared.child("Child"), Some(BranchChange::Clear)));

    let patched = GraphDelta::new(
        ComplexModel::schema(),
        &json!({ "Child": { "Count": 5 } }),
    )
    .unwrap();
    let Some(BranchChange::Patch(child)) = patched.child("Child") else {
        panic!("expected nested delta");
    };
    assert_eq!(child.schema().name(), "SimpleModel");
    assert_eq!(child.root().get("Count"), Some(&LeafValue::Int(5)));
}

#[test]
fn nested_engines_follow_schema_not_payload() {
    let delta = TypedGraphDelta::<Order>::new(&json!({
        "Customer": { "Address": { "Street": "x" } }
    }))
    .unwrap();

    let Some(BranchChange::Patch(customer)) = delta.child("Customer") else {
        panic!("expected customer delta");
    };
    assert!(customer.root().is_empty());
    let names: Vec<_> = customer.children().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Address"]);
}

// ============================================================================
// Conversion failures
// ============================================================================

#[test]
fn unconvertible_leaf_aborts_construction() {
    let err = GraphDelta::new(SimpleModel::schema(), &json!({ "Count": "many" })).unwrap_err();
    match err {
        GraphDeltaError::ConversionFailure {
            type_name,
            property,
            source,
        } => {
            assert_eq!(type_name, "SimpleModel");
            assert_eq!(property, "Count");
            assert!(matches!(source, ConvertError::InvalidText { .. }));
        }
        other => panic!("expected ConversionFailure, got {other:?}"),
    }
}

#[test]
fn out_of_range_leaf_aborts_construction() {
    let err = GraphDelta::new(Order::schema(), &json!({ "Id": -5 })).unwrap_err();
    assert!(matches!(
        err,
        GraphDeltaError::ConversionFailure {
            source: ConvertError::OutOfRange { .. },
            ..
        }
    ));
}

#[test]
fn malformed_base64_aborts_construction() {
    let err = GraphDelta::new(ByteModel::schema(), &json!({ "Value": "%%%" })).unwrap_err();
    assert!(matches!(
        err,
        GraphDeltaError::ConversionFailure {
            source: ConvertError::Base64(_),
            ..
        }
    ));
}

#[test]
fn nested_conversion_failure_aborts_whole_construction() {
    let err = GraphDelta::new(
        ComplexModel::schema(),
        &json!({ "LastName": "Doe", "Child": { "Id": "abc" } }),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        GraphDeltaError::ConversionFailure {
            type_name: "SimpleModel",
            ..
        }
    ));
}
