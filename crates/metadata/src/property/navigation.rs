//! Navigation Properties - relationship slots pointing at another entity type

use crate::naming;

/// A relationship-valued property
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationProperty {
    name: String,
    entity_type_name: String,
    is_scalar: bool,
    association_name: Option<String>,
    foreign_key_names: Vec<String>,
    inv_foreign_key_names: Vec<String>,
}

impl NavigationProperty {
    /// Create a scalar (to-one) navigation property
    pub fn new(name: impl Into<String>, entity_type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type_name: entity_type_name.into(),
            is_scalar: true,
            association_name: None,
            foreign_key_names: Vec::new(),
            inv_foreign_key_names: Vec::new(),
        }
    }

    /// Set whether the relationship points at one entity or a collection
    pub fn with_scalar(mut self, is_scalar: bool) -> Self {
        self.is_scalar = is_scalar;
        self
    }

    pub fn with_association_name(mut self, association_name: impl Into<String>) -> Self {
        self.association_name = Some(association_name.into());
        self
    }

    /// Names of the data properties on the owning type holding the foreign key
    pub fn with_foreign_key_names(mut self, names: Vec<String>) -> Self {
        self.foreign_key_names = names;
        self
    }

    /// Names of the data properties on the target type holding the foreign key
    pub fn with_inv_foreign_key_names(mut self, names: Vec<String>) -> Self {
        self.inv_foreign_key_names = names;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_type_name(&self) -> &str {
        &self.entity_type_name
    }

    pub fn is_scalar(&self) -> bool {
        self.is_scalar
    }

    pub fn association_name(&self) -> Option<&str> {
        self.association_name.as_deref()
    }

    pub fn foreign_key_names(&self) -> &[String] {
        &self.foreign_key_names
    }

    pub fn inv_foreign_key_names(&self) -> &[String] {
        &self.inv_foreign_key_names
    }

    /// Returns true if the target type name carries a namespace
    pub fn is_qualified(&self) -> bool {
        naming::is_qualified_type_name(&self.entity_type_name)
    }

    /// Rewrite an unqualified target type name into `namespace`
    pub(crate) fn qualify_target(&mut self, namespace: &str) {
        if !self.is_qualified() {
            self.entity_type_name = naming::qualify_type_name(&self.entity_type_name, namespace);
        }
    }
}
