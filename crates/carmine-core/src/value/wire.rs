use crate::{
    error::{ErrorClass, ErrorOrigin, StoreError},
    model::{PropertyModel, ScalarType},
    value::Value,
};
use chrono::{DateTime, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use std::{fmt::Write as _, str::FromStr};
use thiserror::Error as ThisError;
use uuid::Uuid;

///
/// Value wire codec
///
/// Every non-blob value is stored as its canonical UTF-8 text; blobs pass
/// through untouched. The canonical text is shared with key-part encoding,
/// so any change here changes the keyspace.
///

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_TIME_OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

const NANOS_PER_SECOND: i128 = 1_000_000_000;

///
/// DecodeError
/// (decode / corruption boundary)
///

#[derive(Debug, ThisError)]
#[error("cannot decode property '{property}' of type '{declared}' on entity type '{entity}': {reason}")]
pub struct DecodeError {
    pub entity: String,
    pub property: String,
    pub declared: ScalarType,
    pub reason: String,
}

impl From<DecodeError> for StoreError {
    fn from(err: DecodeError) -> Self {
        Self::new(ErrorClass::Decode, ErrorOrigin::Codec, err.to_string())
    }
}

/// Encode one non-null value into its stored byte form.
#[must_use]
pub fn encode(value: &Value) -> Vec<u8> {
    match value {
        Value::Blob(bytes) => bytes.clone(),
        other => canonical_text(other).into_bytes(),
    }
}

/// Canonical textual form of a value.
///
/// Shortest-round-trip notation for floats, scale-preserving notation for
/// decimals, signed total nanoseconds for durations. Blobs only appear
/// here when used as a key part, where they render as lowercase hex.
#[must_use]
pub fn canonical_text(value: &Value) -> String {
    match value {
        Value::Blob(bytes) => {
            let mut out = String::with_capacity(bytes.len() * 2);
            for byte in bytes {
                let _ = write!(out, "{byte:02x}");
            }
            out
        }
        Value::Bool(v) => v.to_string(),
        Value::Char(v) => v.to_string(),
        Value::DateTime(v) => v.format(DATE_TIME_FORMAT).to_string(),
        Value::DateTimeOffset(v) => v.format(DATE_TIME_OFFSET_FORMAT).to_string(),
        Value::Decimal(v) => v.to_string(),
        Value::Duration(v) => duration_nanos(v).to_string(),
        Value::Enum(v) => v.clone(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::Text(v) => v.clone(),
        Value::U8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::Uuid(v) => v.to_string(),
    }
}

/// Decode stored bytes back into a typed value, per the property's
/// declared scalar shape. Field absence never reaches this function; it
/// is handled by the retriever as a null slot.
pub fn decode(bytes: &[u8], property: &PropertyModel, entity: &str) -> Result<Value, DecodeError> {
    if property.scalar == ScalarType::Blob {
        return Ok(Value::Blob(bytes.to_vec()));
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|err| decode_error(property, entity, format!("not valid UTF-8: {err}")))?;

    match property.scalar {
        ScalarType::Blob => unreachable!("blob handled before UTF-8 decode"),
        ScalarType::Text => Ok(Value::Text(text.to_owned())),
        ScalarType::Enum => Ok(Value::Enum(text.to_owned())),
        ScalarType::Bool => parse_with(text, property, entity, Value::Bool),
        ScalarType::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(decode_error(
                    property,
                    entity,
                    format!("expected a single character, found {text:?}"),
                )),
            }
        }
        ScalarType::I8 => parse_with(text, property, entity, Value::I8),
        ScalarType::I16 => parse_with(text, property, entity, Value::I16),
        ScalarType::I32 => parse_with(text, property, entity, Value::I32),
        ScalarType::I64 => parse_with(text, property, entity, Value::I64),
        ScalarType::U8 => parse_with(text, property, entity, Value::U8),
        ScalarType::U16 => parse_with(text, property, entity, Value::U16),
        ScalarType::U32 => parse_with(text, property, entity, Value::U32),
        ScalarType::U64 => parse_with(text, property, entity, Value::U64),
        ScalarType::F32 => parse_with(text, property, entity, Value::F32),
        ScalarType::F64 => parse_with(text, property, entity, Value::F64),
        ScalarType::Decimal => Decimal::from_str(text)
            .map(Value::Decimal)
            .map_err(|err| decode_error(property, entity, err.to_string())),
        ScalarType::Uuid => Uuid::parse_str(text)
            .map(Value::Uuid)
            .map_err(|err| decode_error(property, entity, err.to_string())),
        ScalarType::DateTime => NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
            .map(Value::DateTime)
            .map_err(|err| decode_error(property, entity, err.to_string())),
        ScalarType::DateTimeOffset => decode_date_time_offset(text, property, entity),
        ScalarType::Duration => decode_duration(text, property, entity),
    }
}

// Offset-tolerant decode: a value whose offset suffix cannot be parsed is
// re-read as a naive timestamp pinned to a zero offset. This mirrors the
// store's historical contents; see DESIGN.md before tightening it.
fn decode_date_time_offset(
    text: &str,
    property: &PropertyModel,
    entity: &str,
) -> Result<Value, DecodeError> {
    if let Ok(v) = DateTime::parse_from_str(text, DATE_TIME_OFFSET_FORMAT) {
        return Ok(Value::DateTimeOffset(v));
    }

    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .map(|naive| Value::DateTimeOffset(naive.and_utc().fixed_offset()))
        .map_err(|err| decode_error(property, entity, err.to_string()))
}

fn decode_duration(text: &str, property: &PropertyModel, entity: &str) -> Result<Value, DecodeError> {
    let nanos = i128::from_str(text)
        .map_err(|err| decode_error(property, entity, err.to_string()))?;

    let seconds = i64::try_from(nanos.div_euclid(NANOS_PER_SECOND))
        .map_err(|_| decode_error(property, entity, "duration out of range".to_string()))?;

    // rem_euclid of a positive modulus is always in [0, 1e9)
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let subsec = nanos.rem_euclid(NANOS_PER_SECOND) as u32;

    TimeDelta::new(seconds, subsec)
        .map(Value::Duration)
        .ok_or_else(|| decode_error(property, entity, "duration out of range".to_string()))
}

fn duration_nanos(delta: &TimeDelta) -> i128 {
    i128::from(delta.num_seconds()) * NANOS_PER_SECOND + i128::from(delta.subsec_nanos())
}

fn parse_with<T: FromStr, F: FnOnce(T) -> Value>(
    text: &str,
    property: &PropertyModel,
    entity: &str,
    wrap: F,
) -> Result<Value, DecodeError>
where
    T::Err: std::fmt::Display,
{
    text.parse::<T>()
        .map(wrap)
        .map_err(|err| decode_error(property, entity, err.to_string()))
}

fn decode_error(property: &PropertyModel, entity: &str, reason: String) -> DecodeError {
    DecodeError {
        entity: entity.to_owned(),
        property: property.name.clone(),
        declared: property.scalar,
        reason,
    }
}
