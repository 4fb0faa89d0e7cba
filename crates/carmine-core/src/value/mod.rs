pub mod wire;

#[cfg(test)]
mod tests;

use crate::model::ScalarType;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

pub use wire::DecodeError;

///
/// Value
///
/// One non-null scalar as the engine sees it. Null is always
/// `Option::<Value>::None` at the edges, never a variant: the store
/// represents null as the absence of a hash field and the codec must not
/// be reachable with one.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Blob(Vec<u8>),
    Bool(bool),
    Char(char),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Decimal(Decimal),
    Duration(TimeDelta),
    Enum(String),
    F32(f32),
    F64(f64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Text(String),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Uuid(Uuid),
}

impl Value {
    /// The scalar shape of this value.
    #[must_use]
    pub const fn kind(&self) -> ScalarType {
        match self {
            Self::Blob(_) => ScalarType::Blob,
            Self::Bool(_) => ScalarType::Bool,
            Self::Char(_) => ScalarType::Char,
            Self::DateTime(_) => ScalarType::DateTime,
            Self::DateTimeOffset(_) => ScalarType::DateTimeOffset,
            Self::Decimal(_) => ScalarType::Decimal,
            Self::Duration(_) => ScalarType::Duration,
            Self::Enum(_) => ScalarType::Enum,
            Self::F32(_) => ScalarType::F32,
            Self::F64(_) => ScalarType::F64,
            Self::I8(_) => ScalarType::I8,
            Self::I16(_) => ScalarType::I16,
            Self::I32(_) => ScalarType::I32,
            Self::I64(_) => ScalarType::I64,
            Self::Text(_) => ScalarType::Text,
            Self::U8(_) => ScalarType::U8,
            Self::U16(_) => ScalarType::U16,
            Self::U32(_) => ScalarType::U32,
            Self::U64(_) => ScalarType::U64,
            Self::Uuid(_) => ScalarType::Uuid,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}
