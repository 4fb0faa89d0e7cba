use crate::model::property::{PropertyModel, ScalarType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// ModelError
/// Structural problems detected when a model is built.
///

#[derive(Debug, ThisError)]
pub enum ModelError {
    #[error("entity name cannot be empty")]
    EmptyEntityName,

    #[error("entity '{entity}' has no properties")]
    NoProperties { entity: String },

    #[error("entity '{entity}' declares duplicate property '{property}'")]
    DuplicateProperty { entity: String, property: String },

    #[error("entity '{entity}' has no primary key")]
    NoPrimaryKey { entity: String },

    #[error("entity '{entity}' primary key names unknown property '{property}'")]
    UnknownKeyProperty { entity: String, property: String },

    #[error("entity '{entity}' primary key property '{property}' cannot be nullable")]
    NullableKeyProperty { entity: String, property: String },
}

///
/// EntityModel
///
/// Immutable runtime description of one entity type: a stable external
/// name, an ordered property list, and the primary key as ordinals into
/// that list (declaration order is significant and must be stable across
/// processes).
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EntityModel {
    name: String,
    properties: Vec<PropertyModel>,
    primary_key: Vec<usize>,
}

impl EntityModel {
    /// Start building a model for the named entity type.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> EntityModelBuilder {
        EntityModelBuilder {
            name: name.into(),
            properties: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyModel] {
        &self.properties
    }

    /// Look a property up by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyModel> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Primary-key ordinals, in key declaration order.
    #[must_use]
    pub fn primary_key(&self) -> &[usize] {
        &self.primary_key
    }

    /// Primary-key properties, in key declaration order.
    pub fn primary_key_properties(&self) -> impl Iterator<Item = &PropertyModel> {
        self.primary_key.iter().map(|&i| &self.properties[i])
    }
}

///
/// EntityModelBuilder
///

pub struct EntityModelBuilder {
    name: String,
    properties: Vec<PropertyModel>,
    primary_key: Vec<String>,
}

impl EntityModelBuilder {
    /// Append a non-nullable property; ordinals follow declaration order.
    #[must_use]
    pub fn property(self, name: impl Into<String>, scalar: ScalarType) -> Self {
        self.push_property(name.into(), scalar, false)
    }

    /// Append a nullable property.
    #[must_use]
    pub fn nullable_property(self, name: impl Into<String>, scalar: ScalarType) -> Self {
        self.push_property(name.into(), scalar, true)
    }

    /// Declare the primary key as an ordered list of property names.
    #[must_use]
    pub fn primary_key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the structure and freeze it behind an `Arc`.
    pub fn build(self) -> Result<Arc<EntityModel>, ModelError> {
        if self.name.is_empty() {
            return Err(ModelError::EmptyEntityName);
        }
        if self.properties.is_empty() {
            return Err(ModelError::NoProperties { entity: self.name });
        }

        for (i, property) in self.properties.iter().enumerate() {
            if self.properties[..i].iter().any(|p| p.name == property.name) {
                return Err(ModelError::DuplicateProperty {
                    entity: self.name,
                    property: property.name.clone(),
                });
            }
        }

        if self.primary_key.is_empty() {
            return Err(ModelError::NoPrimaryKey { entity: self.name });
        }

        let mut key_ordinals = Vec::with_capacity(self.primary_key.len());
        for name in &self.primary_key {
            let Some(ordinal) = self.properties.iter().position(|p| &p.name == name) else {
                return Err(ModelError::UnknownKeyProperty {
                    entity: self.name,
                    property: name.clone(),
                });
            };
            if self.properties[ordinal].nullable {
                return Err(ModelError::NullableKeyProperty {
                    entity: self.name,
                    property: name.clone(),
                });
            }
            key_ordinals.push(ordinal);
        }

        Ok(Arc::new(EntityModel {
            name: self.name,
            properties: self.properties,
            primary_key: key_ordinals,
        }))
    }

    fn push_property(mut self, name: String, scalar: ScalarType, nullable: bool) -> Self {
        let ordinal = self.properties.len();
        self.properties.push(PropertyModel {
            name,
            scalar,
            nullable,
            ordinal,
        });
        self
    }
}
