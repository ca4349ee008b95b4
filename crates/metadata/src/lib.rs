//! # entity-metadata: Runtime Entity Metadata for elif.rs
//!
//! Describes the shape of client-side domain entities: entity and complex
//! types, their data and navigation properties, key/foreign key/concurrency
//! classification, inheritance between entity types and a JSON metadata
//! document format to move the whole model between processes.
//!
//! Types are registered in a [`MetadataStore`], which resolves base types,
//! keeps subtype links, maps resource names to entity types and creates
//! entity instances through registered constructors.

pub mod codec;
pub mod config;
pub mod error;
pub mod naming;
pub mod property;
pub mod registry;
pub mod types;

// Re-export the model and the store
pub use config::*;
pub use error::*;
pub use naming::NamingConvention;
pub use property::*;
pub use registry::*;
pub use types::*;

pub use codec::{
    ComplexTypeDocument, DataPropertyDocument, EntityTypeDocument, ImportReport,
    MetadataDocument, NavigationPropertyDocument, SkippedType,
};
