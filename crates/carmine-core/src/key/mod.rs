#[cfg(test)]
mod tests;

use crate::{
    error::{ErrorClass, ErrorOrigin, StoreError},
    model::{EntityModel, PropertyModel},
    value::{Value, wire::canonical_text},
};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// Keyspace construction
///
/// Every stored key is `carmine:<category>:<entity>[:<key-encoding>]`.
/// The separator character is escaped inside any single component, so
/// concatenation is unambiguous and two processes always compute the same
/// key for the same primary-key values. Pure string work, no I/O.
///

const KEY_SEPARATOR: &str = ":";
const ESCAPED_KEY_SEPARATOR: &str = r"\x3A";

/// Joins the parts of a composite primary key. Distinct from the key
/// separator, which never survives escaping inside a part.
const KEY_PART_SEPARATOR: &str = "::";

const NAMESPACE: &str = "carmine";

const INDEX_PREFIX: &str = "Index:PK";
const DATA_PREFIX: &str = "Data";
const SEQUENCE_PREFIX: &str = "ValueGenerator";

///
/// KeyError
/// (key construction boundary)
///

#[derive(Debug, ThisError)]
pub enum KeyError {
    #[error("primary key value for entity '{entity}', property '{property}' cannot be null")]
    NullPrimaryKey { entity: String, property: String },
}

impl From<KeyError> for StoreError {
    fn from(err: KeyError) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Key, err.to_string())
    }
}

///
/// KeyEncoding
///
/// Canonical, escaped, joined string form of an entity's primary-key
/// values. Doubles as the member stored in the primary-key index set.
///

#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KeyEncoding(String);

impl KeyEncoding {
    /// Wrap an encoding read back from the store. The index set holds
    /// exactly the strings this module produced, so no re-validation.
    #[must_use]
    pub(crate) const fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

///
/// DataKey / IndexKey / SequenceKey
///

#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub struct DataKey(String);

impl DataKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub struct IndexKey(String);

impl IndexKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub struct SequenceKey(String);

impl SequenceKey {
    /// A caller-supplied override name is used verbatim, matching the
    /// stored counter the caller already owns.
    #[must_use]
    pub fn from_override(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Replace the key separator wherever it appears inside one component.
#[must_use]
pub fn escape(raw: &str) -> String {
    raw.replace(KEY_SEPARATOR, ESCAPED_KEY_SEPARATOR)
}

/// Canonical, escaped string form of one key part.
#[must_use]
pub fn encode_key_part(value: &Value) -> String {
    escape(&canonical_text(value))
}

/// Encode an entity's primary key from a full-width value row.
///
/// Parts are joined in primary-key declaration order; a null (or absent)
/// key value is an error, never an empty part.
pub fn primary_key_encoding(
    entity: &EntityModel,
    values: &[Option<Value>],
) -> Result<KeyEncoding, KeyError> {
    let mut parts = Vec::with_capacity(entity.primary_key().len());
    for property in entity.primary_key_properties() {
        let value = values
            .get(property.ordinal)
            .and_then(Option::as_ref)
            .ok_or_else(|| KeyError::NullPrimaryKey {
                entity: entity.name().to_string(),
                property: property.name.clone(),
            })?;
        parts.push(encode_key_part(value));
    }

    Ok(KeyEncoding(parts.join(KEY_PART_SEPARATOR)))
}

/// Key of the hash holding one entity instance.
#[must_use]
pub fn data_key(entity: &EntityModel, key: &KeyEncoding) -> DataKey {
    DataKey(format!(
        "{NAMESPACE}:{DATA_PREFIX}:{}:{}",
        escape(entity.name()),
        key.0
    ))
}

/// Key of the set holding every primary-key encoding for an entity type.
#[must_use]
pub fn index_key(entity: &EntityModel) -> IndexKey {
    IndexKey(format!(
        "{NAMESPACE}:{INDEX_PREFIX}:{}",
        escape(entity.name())
    ))
}

/// Key of the generated-value counter for one property.
#[must_use]
pub fn sequence_key(entity: &EntityModel, property: &PropertyModel) -> SequenceKey {
    SequenceKey(format!(
        "{NAMESPACE}:{SEQUENCE_PREFIX}:{}:{}",
        escape(entity.name()),
        escape(&property.name)
    ))
}
