use crate::{
    error::{ErrorClass, ErrorOrigin, StoreError},
    model::{EntityModel, ScalarType},
    value::Value,
};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// ChangeError
/// Structural problems in a change record, caught at construction.
///

#[derive(Debug, ThisError)]
pub enum ChangeError {
    #[error("change for entity '{entity}' carries {found} values, expected {expected}")]
    WrongWidth {
        entity: String,
        expected: usize,
        found: usize,
    },

    #[error("value for '{entity}.{property}' is {found}, property is declared {declared}")]
    KindMismatch {
        entity: String,
        property: String,
        declared: ScalarType,
        found: ScalarType,
    },
}

impl From<ChangeError> for StoreError {
    fn from(err: ChangeError) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Transaction, err.to_string())
    }
}

///
/// ChangeRecord
///
/// One pending insert, update, or delete for one entity instance,
/// submitted to the store in a batch. Value vectors are full-width rows
/// indexed by property ordinal; a `None` slot is a null.
///
/// Updates and deletes carry *original* values so that a primary key
/// mutated in memory still targets the row it was loaded from.
///

#[derive(Clone, Debug)]
pub struct ChangeRecord {
    entity: Arc<EntityModel>,
    kind: ChangeKind,
}

#[derive(Clone, Debug)]
pub enum ChangeKind {
    Insert {
        values: Vec<Option<Value>>,
    },
    Update {
        current: Vec<Option<Value>>,
        original: Vec<Option<Value>>,
    },
    Delete {
        original: Vec<Option<Value>>,
    },
}

impl ChangeRecord {
    pub fn insert(
        entity: Arc<EntityModel>,
        values: Vec<Option<Value>>,
    ) -> Result<Self, ChangeError> {
        check_row(&entity, &values)?;
        Ok(Self {
            entity,
            kind: ChangeKind::Insert { values },
        })
    }

    pub fn update(
        entity: Arc<EntityModel>,
        current: Vec<Option<Value>>,
        original: Vec<Option<Value>>,
    ) -> Result<Self, ChangeError> {
        check_row(&entity, &current)?;
        check_row(&entity, &original)?;
        Ok(Self {
            entity,
            kind: ChangeKind::Update { current, original },
        })
    }

    pub fn delete(
        entity: Arc<EntityModel>,
        original: Vec<Option<Value>>,
    ) -> Result<Self, ChangeError> {
        check_row(&entity, &original)?;
        Ok(Self {
            entity,
            kind: ChangeKind::Delete { original },
        })
    }

    #[must_use]
    pub fn entity(&self) -> &Arc<EntityModel> {
        &self.entity
    }

    #[must_use]
    pub const fn kind(&self) -> &ChangeKind {
        &self.kind
    }
}

fn check_row(entity: &EntityModel, values: &[Option<Value>]) -> Result<(), ChangeError> {
    if values.len() != entity.properties().len() {
        return Err(ChangeError::WrongWidth {
            entity: entity.name().to_string(),
            expected: entity.properties().len(),
            found: values.len(),
        });
    }

    for (property, slot) in entity.properties().iter().zip(values) {
        if let Some(value) = slot {
            if value.kind() != property.scalar {
                return Err(ChangeError::KindMismatch {
                    entity: entity.name().to_string(),
                    property: property.name.clone(),
                    declared: property.scalar,
                    found: value.kind(),
                });
            }
        }
    }

    Ok(())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScalarType;

    fn customer() -> Arc<EntityModel> {
        EntityModel::builder("Customer")
            .property("Id", ScalarType::I64)
            .nullable_property("Name", ScalarType::Text)
            .primary_key(["Id"])
            .build()
            .unwrap()
    }

    #[test]
    fn insert_accepts_full_width_row() {
        let record = ChangeRecord::insert(
            customer(),
            vec![Some(Value::I64(42)), Some(Value::Text("Unikorn".into()))],
        );
        assert!(record.is_ok());
    }

    #[test]
    fn short_row_is_rejected() {
        let err = ChangeRecord::insert(customer(), vec![Some(Value::I64(42))]).unwrap_err();
        assert!(matches!(err, ChangeError::WrongWidth { expected: 2, found: 1, .. }));
    }

    #[test]
    fn mismatched_value_kind_is_rejected() {
        let err = ChangeRecord::insert(
            customer(),
            vec![Some(Value::Text("42".into())), None],
        )
        .unwrap_err();
        assert!(matches!(err, ChangeError::KindMismatch { .. }));
    }

    #[test]
    fn null_slots_are_not_kind_checked() {
        let record = ChangeRecord::update(
            customer(),
            vec![Some(Value::I64(42)), None],
            vec![Some(Value::I64(42)), Some(Value::Text("Unikorn".into()))],
        );
        assert!(record.is_ok());
    }
}
