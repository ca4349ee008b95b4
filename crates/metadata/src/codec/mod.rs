//! Metadata Document Codec - portable form of the type model
//!
//! Documents are plain serde structures using camelCase keys. Unknown keys
//! are ignored on import.

pub mod metadata;
pub mod property;
pub mod structural;

pub use metadata::{ImportReport, MetadataDocument, SkippedType};
pub use property::{DataPropertyDocument, NavigationPropertyDocument};
pub use structural::{ComplexTypeDocument, EntityTypeDocument};

pub(crate) use metadata::RawMetadataDocument;

fn is_false(value: &bool) -> bool {
    !*value
}
