//! Metadata Store configuration
//!
//! Loaded from YAML; every field has a default so a partial file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MetadataError, MetadataResult};
use crate::naming::NamingConvention;

/// What a whole-document import does when one type fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeErrorPolicy {
    /// Stop the import and return the error
    #[default]
    Abort,
    /// Log the failure, leave the type out and continue
    Skip,
}

/// What registering an already known qualified type name does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTypePolicy {
    #[default]
    Reject,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub on_type_error: TypeErrorPolicy,
    pub duplicate_types: DuplicateTypePolicy,
    /// Property name mapping applied on import and export
    pub naming_convention: NamingConvention,
    /// Version stamped on exported metadata documents
    pub metadata_version: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            on_type_error: TypeErrorPolicy::Abort,
            duplicate_types: DuplicateTypePolicy::Reject,
            naming_convention: NamingConvention::Identity,
            metadata_version: "1.0.0".to_string(),
        }
    }
}

impl MetadataConfig {
    pub fn from_yaml_str(content: &str) -> MetadataResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> MetadataResult<()> {
        if self.metadata_version.trim().is_empty() {
            return Err(MetadataError::configuration(
                "metadata_version cannot be empty",
            ));
        }
        Ok(())
    }

    pub fn with_on_type_error(mut self, policy: TypeErrorPolicy) -> Self {
        self.on_type_error = policy;
        self
    }

    pub fn with_duplicate_types(mut self, policy: DuplicateTypePolicy) -> Self {
        self.duplicate_types = policy;
        self
    }

    pub fn with_naming_convention(mut self, convention: NamingConvention) -> Self {
        self.naming_convention = convention;
        self
    }
}
