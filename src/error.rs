use thiserror::Error;

use crate::schema::leaf::ScalarType;

/// Failure converting a JSON scalar (or a recorded leaf value) into a
/// declared leaf type.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Value {value} is out of range for {target}")]
    OutOfRange { value: String, target: ScalarType },

    #[error("Cannot convert a JSON {found} to {target}")]
    Unsupported {
        found: &'static str,
        target: ScalarType,
    },

    #[error("Cannot parse \"{value}\" as {target}")]
    InvalidText { value: String, target: ScalarType },

    #[error("Invalid date: {0}")]
    Date(#[from] chrono::ParseError),

    #[error("Invalid UUID: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("Expected a {expected} value, got {found}")]
    UnexpectedValue {
        expected: ScalarType,
        found: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum GraphDeltaError {
    #[error("Invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    #[error("Model is of type {model} but delta is for {expected}")]
    TypeMismatch {
        model: &'static str,
        expected: &'static str,
    },

    #[error("Cannot convert property {type_name}.{property}: {source}")]
    ConversionFailure {
        type_name: &'static str,
        property: String,
        #[source]
        source: ConvertError,
    },

    #[error("Property {type_name}.{property} cannot be resolved")]
    IntrospectionFailure {
        type_name: &'static str,
        property: String,
    },

    #[error("Maximum graph delta depth exceeded ({0})")]
    DepthExceeded(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphDeltaError {
    pub(crate) fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    pub(crate) fn introspection(type_name: &'static str, property: impl Into<String>) -> Self {
        Self::IntrospectionFailure {
            type_name,
            property: property.into(),
        }
    }
}

pub type Result<T, E = GraphDeltaError> = std::result::Result<T, E>;

/// Name of a JSON value's kind, for diagnostics.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
