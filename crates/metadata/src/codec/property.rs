//! Property documents

use serde::{Deserialize, Serialize};

use super::is_false;
use crate::error::MetadataResult;
use crate::naming::NamingConvention;
use crate::property::{ConcurrencyMode, DataProperty, DataType, NavigationProperty};

/// Portable form of a [`DataProperty`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPropertyDocument {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_nullable: Option<bool>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_part_of_key: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_foreign_key: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_unmapped: bool,
}

/// Portable form of a [`NavigationProperty`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPropertyDocument {
    pub name: String,

    pub entity_type_name: String,

    #[serde(default = "default_true")]
    pub is_scalar: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_key_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inv_foreign_key_names: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl DataProperty {
    pub fn to_document(&self, convention: NamingConvention) -> DataPropertyDocument {
        DataPropertyDocument {
            name: convention.client_to_server(self.name()),
            data_type: Some(self.data_type().as_str().to_string()),
            is_nullable: Some(self.is_nullable()),
            is_part_of_key: self.is_part_of_key(),
            is_foreign_key: self.is_foreign_key(),
            concurrency_mode: self
                .is_concurrency_property()
                .then(|| self.concurrency_mode().as_str().to_string()),
            max_length: self.max_length(),
            default_value: self.default_value().cloned(),
            is_unmapped: self.is_unmapped(),
        }
    }

    /// Decode a data property; unknown symbols are decode errors
    pub fn from_document(
        document: DataPropertyDocument,
        convention: NamingConvention,
    ) -> MetadataResult<Self> {
        let data_type = document
            .data_type
            .as_deref()
            .map(str::parse::<DataType>)
            .transpose()?
            .unwrap_or_default();
        let concurrency_mode = document
            .concurrency_mode
            .as_deref()
            .map(str::parse::<ConcurrencyMode>)
            .transpose()?
            .unwrap_or_default();

        let mut property = DataProperty::new(convention.server_to_client(&document.name), data_type)
            .with_part_of_key(document.is_part_of_key)
            .with_foreign_key(document.is_foreign_key)
            .with_concurrency_mode(concurrency_mode)
            .with_unmapped(document.is_unmapped);

        if let Some(is_nullable) = document.is_nullable {
            property = property.with_nullable(is_nullable);
        }
        if let Some(max_length) = document.max_length {
            property = property.with_max_length(max_length);
        }
        if let Some(default_value) = document.default_value {
            property = property.with_default_value(default_value);
        }
        Ok(property)
    }
}

impl NavigationProperty {
    /// Foreign key names refer to data properties and follow the same
    /// naming convention as the property name
    pub fn to_document(&self, convention: NamingConvention) -> NavigationPropertyDocument {
        NavigationPropertyDocument {
            name: convention.client_to_server(self.name()),
            entity_type_name: self.entity_type_name().to_string(),
            is_scalar: self.is_scalar(),
            association_name: self.association_name().map(str::to_string),
            foreign_key_names: convention.names_to_server(self.foreign_key_names()),
            inv_foreign_key_names: convention.names_to_server(self.inv_foreign_key_names()),
        }
    }

    pub fn from_document(document: NavigationPropertyDocument, convention: NamingConvention) -> Self {
        let mut property = NavigationProperty::new(
            convention.server_to_client(&document.name),
            document.entity_type_name,
        )
        .with_scalar(document.is_scalar)
        .with_foreign_key_names(convention.names_to_client(document.foreign_key_names))
        .with_inv_foreign_key_names(convention.names_to_client(document.inv_foreign_key_names));
        if let Some(association_name) = document.association_name {
            property = property.with_association_name(association_name);
        }
        property
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_data_property_document() {
        let document: DataPropertyDocument =
            serde_json::from_value(json!({ "name": "Id", "isPartOfKey": true })).unwrap();
        let property = DataProperty::from_document(document, NamingConvention::Identity).unwrap();

        assert_eq!(property.name(), "Id");
        assert!(property.is_part_of_key());
        assert!(!property.is_nullable());
        assert_eq!(property.data_type(), DataType::Undefined);
    }

    #[test]
    fn test_full_data_property_document() {
        let document: DataPropertyDocument = serde_json::from_value(json!({
            "name": "RowVersion",
            "dataType": "Binary",
            "isNullable": false,
            "concurrencyMode": "Fixed",
            "maxLength": 8,
            "defaultValue": "AAAA",
            "validators": [{ "name": "required" }]
        }))
        .unwrap();
        let property = DataProperty::from_document(document, NamingConvention::Identity).unwrap();

        assert_eq!(property.data_type(), DataType::Binary);
        assert!(property.is_concurrency_property());
        assert_eq!(property.max_length(), Some(8));
        assert_eq!(property.default_value(), Some(&json!("AAAA")));
    }

    #[test]
    fn test_unknown_data_type_is_decode_error() {
        let document: DataPropertyDocument =
            serde_json::from_value(json!({ "name": "Id", "dataType": "Varchar" })).unwrap();
        assert!(DataProperty::from_document(document, NamingConvention::Identity).unwrap_err().is_decode());

        let document: DataPropertyDocument =
            serde_json::from_value(json!({ "name": "Id", "concurrencyMode": "Loose" })).unwrap();
        assert!(DataProperty::from_document(document, NamingConvention::Identity).unwrap_err().is_decode());
    }

    #[test]
    fn test_data_property_export_omits_defaults() {
        let property = DataProperty::new("Total", DataType::Decimal);
        let value = serde_json::to_value(property.to_document(NamingConvention::Identity)).unwrap();

        assert_eq!(
            value,
            json!({ "name": "Total", "dataType": "Decimal", "isNullable": true })
        );
    }

    #[test]
    fn test_navigation_property_document() {
        let document: NavigationPropertyDocument = serde_json::from_value(json!({
            "name": "Lines",
            "entityTypeName": "OrderLine",
            "isScalar": false,
            "associationName": "Order_Lines",
            "invForeignKeyNames": ["OrderId"]
        }))
        .unwrap();
        let property = NavigationProperty::from_document(document.clone(), NamingConvention::Identity);

        assert!(!property.is_scalar());
        assert_eq!(property.entity_type_name(), "OrderLine");
        assert_eq!(property.to_document(NamingConvention::Identity), document);
    }

    #[test]
    fn test_navigation_property_defaults_to_scalar() {
        let document: NavigationPropertyDocument = serde_json::from_value(json!({
            "name": "Customer",
            "entityTypeName": "Sales.Customer"
        }))
        .unwrap();
        assert!(NavigationProperty::from_document(document, NamingConvention::Identity).is_scalar());
    }

    #[test]
    fn test_camel_case_convention_maps_names() {
        let document: DataPropertyDocument = serde_json::from_value(json!({
            "name": "CustomerId",
            "dataType": "Int32",
            "isForeignKey": true
        }))
        .unwrap();
        let property = DataProperty::from_document(document, NamingConvention::CamelCase).unwrap();
        assert_eq!(property.name(), "customerId");
        assert_eq!(property.to_document(NamingConvention::CamelCase).name, "CustomerId");

        let document: NavigationPropertyDocument = serde_json::from_value(json!({
            "name": "Customer",
            "entityTypeName": "Sales.Customer",
            "foreignKeyNames": ["CustomerId"]
        }))
        .unwrap();
        let property = NavigationProperty::from_document(document.clone(), NamingConvention::CamelCase);
        assert_eq!(property.name(), "customer");
        assert_eq!(property.entity_type_name(), "Sales.Customer");
        assert_eq!(property.foreign_key_names(), ["customerId".to_string()]);
        assert_eq!(property.to_document(NamingConvention::CamelCase), document);
    }
}
