//! Error types for the metadata model
//!
//! Structural and document errors always propagate to the caller. A lookup
//! that finds nothing is not an error and is reported as `None`.

use thiserror::Error;

/// Result type alias for metadata operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Error type for metadata model operations
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A document field has an unrecognized or malformed value
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// An entity type could not produce a runtime instance
    #[error("Cannot instantiate entity type '{type_name}': {reason}")]
    Instantiation { type_name: String, reason: String },

    #[error("Property '{property}' is already defined on type '{type_name}'")]
    DuplicateProperty { type_name: String, property: String },

    #[error("Type '{type_name}' is already registered")]
    DuplicateType { type_name: String },

    #[error("Type '{type_name}' is finalized and cannot be modified")]
    Finalized { type_name: String },

    #[error("Unknown type: {type_name}")]
    UnknownType { type_name: String },

    #[error("Lock error on resource: {resource}")]
    Lock { resource: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetadataError {
    /// Create a new decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a new instantiation error
    pub fn instantiation(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Instantiation {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new duplicate property error
    pub fn duplicate_property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::DuplicateProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Create a new duplicate type error
    pub fn duplicate_type(type_name: impl Into<String>) -> Self {
        Self::DuplicateType {
            type_name: type_name.into(),
        }
    }

    /// Create a new finalized type error
    pub fn finalized(type_name: impl Into<String>) -> Self {
        Self::Finalized {
            type_name: type_name.into(),
        }
    }

    /// Create a new unknown type error
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Create a new lock error
    pub fn lock(resource: impl Into<String>) -> Self {
        Self::Lock {
            resource: resource.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a serde failure raised while reading a document
    pub(crate) fn from_serde(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }

    /// Check if this error came from a malformed document
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Check if this error came from a failed instantiation
    pub fn is_instantiation(&self) -> bool {
        matches!(self, Self::Instantiation { .. })
    }
}
