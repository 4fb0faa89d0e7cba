use crate::{
    error::{ErrorClass, ErrorOrigin, StoreError},
    model::{EntityModel, PropertyModel},
    value::Value,
};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// QueryError
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("entity '{entity}' has no property '{property}'")]
    UnknownProperty { entity: String, property: String },
}

impl From<QueryError> for StoreError {
    fn from(err: QueryError) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Query, err.to_string())
    }
}

///
/// QuerySpec
///
/// What a read wants: an entity type and, optionally, a subset of its
/// properties. An empty subset means "all properties", and the resulting
/// rows are full-width and ordinal-slotted; an explicit subset produces
/// rows in the caller's selection order.
///

#[derive(Clone, Debug)]
pub struct QuerySpec {
    entity: Arc<EntityModel>,
    selected: Vec<usize>,
}

impl QuerySpec {
    /// Retrieve every property.
    #[must_use]
    pub const fn all(entity: Arc<EntityModel>) -> Self {
        Self {
            entity,
            selected: Vec::new(),
        }
    }

    /// Retrieve only the named properties, in the given order.
    pub fn select<I, S>(entity: Arc<EntityModel>, names: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected = Vec::new();
        for name in names {
            let name = name.as_ref();
            let Some(property) = entity.property(name) else {
                return Err(QueryError::UnknownProperty {
                    entity: entity.name().to_string(),
                    property: name.to_string(),
                });
            };
            selected.push(property.ordinal);
        }

        Ok(Self { entity, selected })
    }

    #[must_use]
    pub fn entity(&self) -> &Arc<EntityModel> {
        &self.entity
    }

    /// Whether this query reads the full property set.
    #[must_use]
    pub fn is_full_width(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected properties in caller order; empty for full-width reads.
    pub(crate) fn selected_properties(&self) -> impl Iterator<Item = &PropertyModel> {
        self.selected.iter().map(|&i| &self.entity.properties()[i])
    }
}

///
/// Row
///
/// Decoded property values for one entity instance. Full-width rows have
/// one slot per model property, at the property's ordinal; selected rows
/// have one slot per requested property, in request order. A null stored
/// value is a `None` slot.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Row(Vec<Option<Value>>);

impl Row {
    pub(crate) const fn new(slots: Vec<Option<Value>>) -> Self {
        Self(slots)
    }

    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.0.get(slot).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn slots(&self) -> &[Option<Value>] {
        &self.0
    }

    #[must_use]
    pub fn into_slots(self) -> Vec<Option<Value>> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

///
/// TESTS
///
