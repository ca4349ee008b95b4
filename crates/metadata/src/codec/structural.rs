//! Entity and complex type documents
//!
//! Export writes only the properties a type declares itself; inherited
//! members are rebuilt on load by resolving the base type again.

use serde::{Deserialize, Serialize};

use super::is_false;
use super::property::{DataPropertyDocument, NavigationPropertyDocument};
use crate::error::{MetadataError, MetadataResult};
use crate::naming::NamingConvention;
use crate::property::{DataProperty, NavigationProperty};
use crate::registry::TypeRegistry;
use crate::types::{AutoGeneratedKeyType, ComplexType, EntityType, StructuralType};

/// Portable form of an [`EntityType`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeDocument {
    pub short_name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type_name: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_abstract: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generated_key_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_resource_name: Option<String>,

    #[serde(default)]
    pub data_properties: Vec<DataPropertyDocument>,

    #[serde(default)]
    pub navigation_properties: Vec<NavigationPropertyDocument>,
}

/// Portable form of a [`ComplexType`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexTypeDocument {
    pub short_name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub data_properties: Vec<DataPropertyDocument>,
}

fn require_short_name(short_name: &str) -> MetadataResult<()> {
    if short_name.trim().is_empty() {
        return Err(MetadataError::decode("shortName cannot be empty"));
    }
    Ok(())
}

impl EntityType {
    /// Export this type; `registry` supplies the default resource name and
    /// the property naming convention
    pub fn to_document(&self, registry: &dyn TypeRegistry) -> EntityTypeDocument {
        let convention = registry.naming_convention();
        EntityTypeDocument {
            short_name: self.short_name().to_string(),
            namespace: self.namespace().to_string(),
            base_type_name: self.base_type_name().map(str::to_string),
            is_abstract: self.is_abstract(),
            auto_generated_key_type: Some(self.auto_generated_key_type().as_str().to_string()),
            default_resource_name: self.default_resource_name(registry),
            data_properties: self
                .data_properties()
                .own()
                .map(|property| property.to_document(convention))
                .collect(),
            navigation_properties: self
                .navigation_properties()
                .own()
                .map(|property| property.to_document(convention))
                .collect(),
        }
    }

    /// Build a type from its document
    ///
    /// Scalar fields are read first so navigation targets are qualified with
    /// the document's namespace. The default resource name is handed to
    /// `registry` only once every property decoded.
    pub fn from_document(
        document: EntityTypeDocument,
        registry: &dyn TypeRegistry,
    ) -> MetadataResult<Self> {
        let (entity_type, default_resource_name) =
            Self::decode_document(document, registry.naming_convention())?;
        if let Some(resource_name) = default_resource_name {
            registry.register_resource_name(&resource_name, &entity_type, true)?;
        }
        Ok(entity_type)
    }

    /// Build a type from its document without touching any registry
    ///
    /// Returns the type together with the default resource name the document
    /// declares, for the caller to register once the type is accepted.
    pub fn decode_document(
        document: EntityTypeDocument,
        convention: NamingConvention,
    ) -> MetadataResult<(Self, Option<String>)> {
        require_short_name(&document.short_name)?;
        let key_type = document
            .auto_generated_key_type
            .as_deref()
            .map(str::parse::<AutoGeneratedKeyType>)
            .transpose()?
            .unwrap_or_default();

        let mut entity_type = EntityType::new(document.short_name, document.namespace)
            .with_abstract(document.is_abstract)
            .with_auto_generated_key_type(key_type);
        if let Some(base_type_name) = document.base_type_name {
            entity_type = entity_type.with_base_type_name(base_type_name);
        }

        for property in document.data_properties {
            entity_type.add_data_property(DataProperty::from_document(property, convention)?)?;
        }
        for property in document.navigation_properties {
            entity_type
                .add_navigation_property(NavigationProperty::from_document(property, convention))?;
        }

        tracing::debug!(
            "Decoded entity type {} ({} data, {} navigation properties)",
            entity_type.qualified_name(),
            entity_type.data_properties().len(),
            entity_type.navigation_properties().len()
        );
        Ok((entity_type, document.default_resource_name))
    }

    pub fn from_value(
        value: serde_json::Value,
        registry: &dyn TypeRegistry,
    ) -> MetadataResult<Self> {
        let document = serde_json::from_value(value).map_err(MetadataError::from_serde)?;
        Self::from_document(document, registry)
    }

    pub fn from_json(json: &str, registry: &dyn TypeRegistry) -> MetadataResult<Self> {
        let document = serde_json::from_str(json).map_err(MetadataError::from_serde)?;
        Self::from_document(document, registry)
    }

    pub fn to_json(&self, registry: &dyn TypeRegistry) -> MetadataResult<String> {
        Ok(serde_json::to_string(&self.to_document(registry))?)
    }
}

impl ComplexType {
    pub fn to_document(&self, convention: NamingConvention) -> ComplexTypeDocument {
        ComplexTypeDocument {
            short_name: self.short_name().to_string(),
            namespace: self.namespace().to_string(),
            data_properties: self
                .data_properties()
                .own()
                .map(|property| property.to_document(convention))
                .collect(),
        }
    }

    pub fn from_document(
        document: ComplexTypeDocument,
        convention: NamingConvention,
    ) -> MetadataResult<Self> {
        require_short_name(&document.short_name)?;
        let mut complex_type = ComplexType::new(document.short_name, document.namespace);
        for property in document.data_properties {
            complex_type.add_data_property(DataProperty::from_document(property, convention)?)?;
        }
        Ok(complex_type)
    }
}
