//! Conversion of JSON scalars to declared leaf types.
//!
//! Nullable leaves convert through their underlying scalar type. Binary
//! leaves take base64 strings. Everything else follows a lenient
//! change-type rule: numbers, booleans and numeric strings interconvert,
//! anything may become text, and narrowing is range-checked.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Number, Value};
use uuid::Uuid;

use crate::error::{json_kind, ConvertError};
use crate::schema::leaf::{LeafType, LeafValue, ScalarType};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Convert a document scalar to a value of the declared leaf type.
///
/// `null` always converts to `LeafValue::Null`; arrays and objects are not
/// scalars and are rejected.
pub fn convert(value: &Value, ty: LeafType) -> Result<LeafValue, ConvertError> {
    if value.is_null() {
        return Ok(LeafValue::Null);
    }
    let target = ty.scalar;
    match target {
        ScalarType::Bool => to_bool(value),
        _ if target.int_bounds().is_some() => to_integer(value, target),
        ScalarType::F32 | ScalarType::F64 => to_float(value, target),
        ScalarType::Char => to_char(value),
        ScalarType::Text => to_text(value),
        ScalarType::Bytes => {
            let s = expect_str(value, target)?;
            // Line-wrapped payloads (MIME style) carry CR/LF breaks.
            let compact: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            Ok(LeafValue::Bytes(STANDARD.decode(compact)?))
        }
        ScalarType::Date => {
            let s = expect_str(value, target)?;
            parse_date(s).map(LeafValue::Date)
        }
        ScalarType::DateTime => {
            let s = expect_str(value, target)?;
            parse_datetime(s).map(|dt| LeafValue::DateTime(dt.naive_utc()))
        }
        ScalarType::Timestamp => {
            let s = expect_str(value, target)?;
            parse_datetime(s).map(LeafValue::Timestamp)
        }
        ScalarType::Uuid => {
            let s = expect_str(value, target)?;
            Ok(LeafValue::Uuid(Uuid::parse_str(s)?))
        }
        // Integer types are handled by the bounds guard above.
        _ => Err(unsupported(value, target)),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn unsupported(value: &Value, target: ScalarType) -> ConvertError {
    ConvertError::Unsupported {
        found: json_kind(value),
        target,
    }
}

fn invalid_text(s: &str, target: ScalarType) -> ConvertError {
    ConvertError::InvalidText {
        value: s.to_string(),
        target,
    }
}

fn expect_str(value: &Value, target: ScalarType) -> Result<&str, ConvertError> {
    value.as_str().ok_or_else(|| unsupported(value, target))
}

fn to_bool(value: &Value) -> Result<LeafValue, ConvertError> {
    match value {
        Value::Bool(b) => Ok(LeafValue::Bool(*b)),
        Value::Number(n) => Ok(LeafValue::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(LeafValue::Bool(true)),
            "false" => Ok(LeafValue::Bool(false)),
            _ => Err(invalid_text(s, ScalarType::Bool)),
        },
        other => Err(unsupported(other, ScalarType::Bool)),
    }
}

fn to_integer(value: &Value, target: ScalarType) -> Result<LeafValue, ConvertError> {
    let wide: i128 = match value {
        Value::Bool(b) => i128::from(*b),
        Value::Number(n) => number_to_i128(n, target)?,
        Value::String(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|_| invalid_text(s, target))?,
        other => return Err(unsupported(other, target)),
    };
    narrow(wide, target)
}

fn number_to_i128(n: &Number, target: ScalarType) -> Result<i128, ConvertError> {
    if let Some(i) = n.as_i64() {
        return Ok(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(i128::from(u));
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    // Fractional values round half to even before narrowing.
    let rounded = f.round_ties_even();
    if !rounded.is_finite() || rounded.abs() > i128::MAX as f64 {
        return Err(ConvertError::OutOfRange {
            value: n.to_string(),
            target,
        });
    }
    Ok(rounded as i128)
}

fn narrow(wide: i128, target: ScalarType) -> Result<LeafValue, ConvertError> {
    let out_of_range = || ConvertError::OutOfRange {
        value: wide.to_string(),
        target,
    };
    let (min, max) = target.int_bounds().ok_or_else(out_of_range)?;
    if wide < min || wide > max {
        return Err(out_of_range());
    }
    if target.is_unsigned() {
        u64::try_from(wide)
            .map(LeafValue::UInt)
            .map_err(|_| out_of_range())
    } else {
        i64::try_from(wide)
            .map(LeafValue::Int)
            .map_err(|_| out_of_range())
    }
}

fn to_float(value: &Value, target: ScalarType) -> Result<LeafValue, ConvertError> {
    let f = match value {
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().ok_or_else(|| unsupported(value, target))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid_text(s, target))?,
        other => return Err(unsupported(other, target)),
    };
    if target == ScalarType::F32 && f.is_finite() && f.abs() > f32::MAX as f64 {
        return Err(ConvertError::OutOfRange {
            value: f.to_string(),
            target,
        });
    }
    Ok(LeafValue::Float(f))
}

fn to_char(value: &Value) -> Result<LeafValue, ConvertError> {
    match value {
        Value::String(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(LeafValue::Char(c)),
                _ => Err(invalid_text(s, ScalarType::Char)),
            }
        }
        Value::Number(n) => n
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
            .and_then(char::from_u32)
            .map(LeafValue::Char)
            .ok_or_else(|| ConvertError::OutOfRange {
                value: n.to_string(),
                target: ScalarType::Char,
            }),
        other => Err(unsupported(other, ScalarType::Char)),
    }
}

fn to_text(value: &Value) -> Result<LeafValue, ConvertError> {
    match value {
        Value::String(s) => Ok(LeafValue::Text(s.clone())),
        Value::Number(n) => Ok(LeafValue::Text(n.to_string())),
        Value::Bool(b) => Ok(LeafValue::Text(b.to_string())),
        other => Err(unsupported(other, ScalarType::Text)),
    }
}

/// Parse a date, or the local date of a date/time. Offsets are not applied.
fn parse_date(s: &str) -> Result<NaiveDate, ConvertError> {
    let s = s.trim();
    let err = match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => return Ok(date),
        Err(err) => err,
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| naive.date())
        .ok_or(ConvertError::Date(err))
}

/// Parse an RFC 3339 timestamp, or a naive date/time taken as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ConvertError> {
    let s = s.trim();
    let err = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => return Ok(dt.with_timezone(&Utc)),
        Err(err) => err,
    };
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(ConvertError::Date(err))
}
