use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// PropertyModel
/// Runtime property metadata used by planning and decoding.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PropertyModel {
    /// Property name; used verbatim as the hash field name.
    pub name: String,
    /// Declared scalar shape of the stored value.
    pub scalar: ScalarType,
    /// Whether a null value is representable for this property.
    pub nullable: bool,
    /// Position of this property's slot in a full-width row.
    pub ordinal: usize,
}

///
/// ScalarType
///
/// The scalar surface the wire codec understands. Aligned with `Value`
/// variants; nullability is carried by `PropertyModel`, not here.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
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
    Decimal,
    Text,
    Char,
    Blob,
    /// Local timestamp without an offset.
    DateTime,
    /// Timestamp with an explicit UTC offset.
    DateTimeOffset,
    /// Signed span of time.
    Duration,
    Uuid,
    /// Enumeration member, stored by name.
    Enum,
}

impl ScalarType {
    /// Whether values of this type can seed a generated sequence.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }
}
