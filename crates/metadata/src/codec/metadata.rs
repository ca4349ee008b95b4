//! Whole-metadata documents and import reports

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::structural::{ComplexTypeDocument, EntityTypeDocument};

/// Every type known to a metadata store, plus its extra resource names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_version: Option<String>,

    #[serde(default)]
    pub entity_types: Vec<EntityTypeDocument>,

    #[serde(default)]
    pub complex_types: Vec<ComplexTypeDocument>,

    /// Resource name -> qualified entity type name, default resource names
    /// excluded (they travel on the entity type documents)
    #[serde(default)]
    pub resource_entity_type_map: BTreeMap<String, String>,
}

/// Same shape as [`MetadataDocument`], with each type left undecoded so a
/// single malformed type can be skipped
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawMetadataDocument {
    #[serde(default)]
    pub metadata_version: Option<String>,

    #[serde(default)]
    pub entity_types: Vec<serde_json::Value>,

    #[serde(default)]
    pub complex_types: Vec<serde_json::Value>,

    #[serde(default)]
    pub resource_entity_type_map: BTreeMap<String, String>,
}

/// A type left out of an import
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedType {
    /// Position of the type in the document, e.g. `entityTypes[2]`
    pub location: String,
    pub error: String,
}

/// Outcome of a whole-document import
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportReport {
    pub metadata_version: Option<String>,
    pub entity_types: Vec<String>,
    pub complex_types: Vec<String>,
    pub resource_names: usize,
    pub skipped: Vec<SkippedType>,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn total_types(&self) -> usize {
        self.entity_types.len() + self.complex_types.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_document_defaults() {
        let document: MetadataDocument = serde_json::from_value(json!({})).unwrap();
        assert_eq!(document, MetadataDocument::default());
    }

    #[test]
    fn test_raw_document_keeps_types_undecoded() {
        let raw: RawMetadataDocument = serde_json::from_value(json!({
            "metadataVersion": "1.0.0",
            "entityTypes": [{ "shortName": "Order" }, { "broken": true }],
            "resourceEntityTypeMap": { "Orders": "Sales.Order" }
        }))
        .unwrap();

        assert_eq!(raw.metadata_version.as_deref(), Some("1.0.0"));
        assert_eq!(raw.entity_types.len(), 2);
        assert!(raw.complex_types.is_empty());
        assert_eq!(raw.resource_entity_type_map["Orders"], "Sales.Order");
    }

    #[test]
    fn test_import_report_summary() {
        let mut report = ImportReport::default();
        assert!(report.is_complete());

        report.entity_types.push("Sales.Order".to_string());
        report.complex_types.push("Sales.Address".to_string());
        report.skipped.push(SkippedType {
            location: "entityTypes[1]".to_string(),
            error: "Decode error: missing field `shortName`".to_string(),
        });

        assert_eq!(report.total_types(), 2);
        assert!(!report.is_complete());
    }
}
