//! Complex Types - value objects embedded in entities
//!
//! A complex type owns data properties only. It has no key, no base type and
//! is never instantiated on its own.

use super::{StructuralCore, StructuralType, TypeState};
use crate::error::{MetadataError, MetadataResult};
use crate::property::{DataProperty, PropertyHandle};

#[derive(Debug, Clone)]
pub struct ComplexType {
    core: StructuralCore,
}

impl ComplexType {
    pub fn new(short_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            core: StructuralCore::new(short_name, namespace),
        }
    }

    /// Append a data property
    ///
    /// Key and foreign key flags carry no meaning on a complex type and are
    /// rejected.
    pub fn add_data_property(
        &mut self,
        property: DataProperty,
    ) -> MetadataResult<PropertyHandle<DataProperty>> {
        if property.is_part_of_key() || property.is_foreign_key() {
            return Err(MetadataError::decode(format!(
                "complex type '{}' cannot declare key property '{}'",
                self.qualified_name(),
                property.name()
            )));
        }
        if self.core.data_properties().contains(property.name()) {
            return Err(MetadataError::duplicate_property(
                self.qualified_name(),
                property.name(),
            ));
        }
        self.core.begin_mutation()?;

        let handle = PropertyHandle::declared(property);
        self.core.data_properties_mut().push(handle.clone());
        Ok(handle)
    }

    pub(crate) fn set_state(&mut self, state: TypeState) {
        self.core.set_state(state);
    }
}

impl StructuralType for ComplexType {
    fn core(&self) -> &StructuralCore {
        &self.core
    }

    fn is_entity_type(&self) -> bool {
        false
    }
}
