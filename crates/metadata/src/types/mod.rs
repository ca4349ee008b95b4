//! Structural Types - named, namespaced schema types owning ordered properties
//!
//! - `entity`: entity types with keys, inheritance and instantiation
//! - `complex`: value-object types holding data properties only

pub mod complex;
pub mod entity;

pub use complex::ComplexType;
pub use entity::{AutoGeneratedKeyType, EntityType};

use serde::{Deserialize, Serialize};

use crate::error::{MetadataError, MetadataResult};
use crate::naming;
use crate::property::{DataProperty, PropertyHandle, PropertyList, StructuralProperty};

/// Lifecycle of a structural type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TypeState {
    /// Created, no properties yet
    #[default]
    Unregistered,
    /// Properties are being added
    Populating,
    /// Reachable through the metadata store
    Registered,
    /// No further structural mutation is accepted
    Finalized,
}

/// State shared by every structural type
#[derive(Debug, Clone, Default)]
pub struct StructuralCore {
    short_name: String,
    namespace: String,
    is_abstract: bool,
    state: TypeState,
    data_properties: PropertyList<DataProperty>,
}

impl StructuralCore {
    pub fn new(short_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn qualified_name(&self) -> String {
        naming::qualified_name(&self.short_name, &self.namespace)
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn state(&self) -> TypeState {
        self.state
    }

    pub fn data_properties(&self) -> &PropertyList<DataProperty> {
        &self.data_properties
    }

    pub(crate) fn data_properties_mut(&mut self) -> &mut PropertyList<DataProperty> {
        &mut self.data_properties
    }

    pub(crate) fn set_abstract(&mut self, is_abstract: bool) {
        self.is_abstract = is_abstract;
    }

    pub(crate) fn set_state(&mut self, state: TypeState) {
        self.state = state;
    }

    /// Fail if the type no longer accepts structural changes, otherwise note
    /// that it is being populated
    pub(crate) fn begin_mutation(&mut self) -> MetadataResult<()> {
        match self.state {
            TypeState::Finalized => Err(MetadataError::finalized(self.qualified_name())),
            TypeState::Unregistered => {
                self.state = TypeState::Populating;
                Ok(())
            }
            TypeState::Populating | TypeState::Registered => Ok(()),
        }
    }
}

/// Common interface over entity and complex types
pub trait StructuralType {
    fn core(&self) -> &StructuralCore;

    fn is_entity_type(&self) -> bool;

    fn short_name(&self) -> &str {
        self.core().short_name()
    }

    fn namespace(&self) -> &str {
        self.core().namespace()
    }

    /// `Namespace.ShortName`
    fn qualified_name(&self) -> String {
        self.core().qualified_name()
    }

    fn is_abstract(&self) -> bool {
        self.core().is_abstract()
    }

    fn state(&self) -> TypeState {
        self.core().state()
    }

    fn data_properties(&self) -> &PropertyList<DataProperty> {
        self.core().data_properties()
    }

    fn get_data_property(&self, name: &str) -> Option<&PropertyHandle<DataProperty>> {
        self.core().data_properties().get(name)
    }

    /// Look a property up by name, `None` if the type has no such property
    fn get_property(&self, name: &str) -> Option<StructuralProperty> {
        self.get_data_property(name)
            .cloned()
            .map(StructuralProperty::Data)
    }

    /// Every visible property, inherited ones included, in declaration order
    fn properties(&self) -> Vec<StructuralProperty> {
        self.data_properties()
            .iter()
            .cloned()
            .map(StructuralProperty::Data)
            .collect()
    }
}
