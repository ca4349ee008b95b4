//! Type Registry - where entity types are found by name and resource name
//!
//! `TypeRegistry` is the boundary the codec and entity types consume;
//! `MetadataStore` is the implementation shipped with this crate.

pub mod constructors;
pub mod store;

pub use constructors::*;
pub use store::*;

use std::sync::Arc;

use crate::error::MetadataResult;
use crate::naming::NamingConvention;
use crate::types::EntityType;

/// Registry operations used while decoding and exporting entity types
pub trait TypeRegistry: Send + Sync {
    /// The resource name marked as default for `entity_type`, if any
    fn default_resource_name(&self, entity_type: &EntityType) -> Option<String>;

    /// Associate `resource_name` with `entity_type`
    fn register_resource_name(
        &self,
        resource_name: &str,
        entity_type: &EntityType,
        is_default: bool,
    ) -> MetadataResult<()>;

    fn lookup_entity_type(&self, qualified_name: &str) -> Option<Arc<EntityType>>;

    /// Property name mapping used when types are read from or written to documents
    fn naming_convention(&self) -> NamingConvention {
        NamingConvention::Identity
    }
}
