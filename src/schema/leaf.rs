//! Leaf value model: the scalar types a leaf property may declare, the
//! converted values a changeset carries, and the `Leaf` trait that binds
//! Rust field types to both.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConvertError;

// ============================================================================
// ScalarType / LeafType
// ============================================================================

/// Underlying scalar type of a leaf property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    Text,
    /// Binary blob, carried in documents as a base64 string.
    Bytes,
    Date,
    DateTime,
    /// UTC timestamp.
    Timestamp,
    Uuid,
}

impl ScalarType {
    pub fn is_unsigned(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Inclusive bounds for the integer types.
    pub(crate) fn int_bounds(self) -> Option<(i128, i128)> {
        let bounds = match self {
            Self::I8 => (i8::MIN as i128, i8::MAX as i128),
            Self::I16 => (i16::MIN as i128, i16::MAX as i128),
            Self::I32 => (i32::MIN as i128, i32::MAX as i128),
            Self::I64 => (i64::MIN as i128, i64::MAX as i128),
            Self::U8 => (0, u8::MAX as i128),
            Self::U16 => (0, u16::MAX as i128),
            Self::U32 => (0, u32::MAX as i128),
            Self::U64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(bounds)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// Declared type of a leaf property: its scalar type and whether it may hold
/// "no value".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeafType {
    pub scalar: ScalarType,
    pub nullable: bool,
}

impl LeafType {
    pub const fn required(scalar: ScalarType) -> Self {
        Self {
            scalar,
            nullable: false,
        }
    }

    pub const fn nullable(scalar: ScalarType) -> Self {
        Self {
            scalar,
            nullable: true,
        }
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.scalar)
        } else {
            write!(f, "{}", self.scalar)
        }
    }
}

// ============================================================================
// LeafValue
// ============================================================================

/// A converted leaf value, ready to be written onto a property.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    /// Explicit null: clears nullable leaves, resets others to their default.
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl LeafValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Timestamp(_) => "timestamp",
            Self::Uuid(_) => "uuid",
        }
    }
}

// ============================================================================
// Leaf trait
// ============================================================================

/// A Rust type that can be stored in a leaf property.
///
/// `Option<V>` is the nullable form of `V`. Non-nullable leaves receive
/// their type's default when a null is assigned.
pub trait Leaf: Sized + 'static {
    const TYPE: LeafType;

    fn from_leaf(value: LeafValue) -> Result<Self, ConvertError>;
}

fn unexpected(expected: ScalarType, value: &LeafValue) -> ConvertError {
    ConvertError::UnexpectedValue {
        expected,
        found: value.kind(),
    }
}

fn out_of_range(value: impl ToString, target: ScalarType) -> ConvertError {
    ConvertError::OutOfRange {
        value: value.to_string(),
        target,
    }
}

macro_rules! integer_leaf {
    ($($ty:ty => $scalar:ident),* $(,)?) => {$(
        impl Leaf for $ty {
            const TYPE: LeafType = LeafType::required(ScalarType::$scalar);

            fn from_leaf(value: LeafValue) -> Result<Self, ConvertError> {
                match value {
                    LeafValue::Null => Ok(0),
                    LeafValue::Int(n) => {
                        <$ty>::try_from(n).map_err(|_| out_of_range(n, ScalarType::$scalar))
                    }
                    LeafValue::UInt(n) => {
                        <$ty>::try_from(n).map_err(|_| out_of_range(n, ScalarType::$scalar))
                    }
                    other => Err(unexpected(ScalarType::$scalar, &other)),
                }
            }
        }
    )*};
}

integer_leaf! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

impl Leaf for f64 {
    const TYPE: LeafType = LeafType::required(ScalarType::F64);

    fn from_leaf(value: LeafValue) -> Result<Self, ConvertError> {
        match value {
            LeafValue::Null => Ok(0.0),
            LeafValue::Float(f) => Ok(f),
            LeafValue::Int(n) => Ok(n as f64),
            LeafValue::UInt(n) => Ok(n as f64),
            other => Err(unexpected(ScalarType::F64, &other)),
        }
    }
}

impl Leaf for f32 {
    const TYPE: LeafType = LeafType::required(ScalarType::F32);

    fn from_leaf(value: LeafValue) -> Result<Self, ConvertError> {
        let wide = match value {
            LeafValue::Null => return Ok(0.0),
            LeafValue::Float(f) => f,
            LeafValue::Int(n) => n as f64,
            LeafValue::UInt(n) => n as f64,
            other => return Err(unexpected(ScalarType::F32, &other)),
        };
        if wide.is_finite() && wide.abs() > f32::MAX as f64 {
            return Err(out_of_range(wide, ScalarType::F32));
        }
        Ok(wide as f32)
    }
}

macro_rules! simple_leaf {
    ($($ty:ty => $scalar:ident($variant:ident), default $default:expr);* $(;)?) => {$(
        impl Leaf for $ty {
            const TYPE: LeafType = LeafType::required(ScalarType::$scalar);

            fn from_leaf(value: LeafValue) -> Result<Self, ConvertError> {
                match value {
                    LeafValue::Null => Ok($default),
                    LeafValue::$variant(v) => Ok(v),
                    other => Err(unexpected(ScalarType::$scalar, &other)),
                }
            }
        }
    )*};
}

simple_leaf! {
    bool => Bool(Bool), default false;
    char => Char(Char), default '\0';
    String => Text(Text), default String::new();
    Vec<u8> => Bytes(Bytes), default Vec::new();
    NaiveDate => Date(Date), default NaiveDate::default();
    NaiveDateTime => DateTime(DateTime), default NaiveDateTime::default();
    DateTime<Utc> => Timestamp(Timestamp), default DateTime::<Utc>::default();
    Uuid => Uuid(Uuid), default Uuid::nil();
}

impl<V: Leaf> Leaf for Option<V> {
    const TYPE: LeafType = LeafType::nullable(V::TYPE.scalar);

    fn from_leaf(value: LeafValue) -> Result<Self, ConvertError> {
        match value {
            LeafValue::Null => Ok(None),
            other => V::from_leaf(other).map(Some),
        }
    }
}
