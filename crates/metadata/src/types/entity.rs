//! Entity Types - structural types with keys, inheritance and instantiation
//!
//! Classification indexes (key, foreign key, concurrency) are maintained as
//! properties are attached and are never rebuilt on read. Base and subtype
//! links are qualified type names resolved through the metadata store, so an
//! entity type never owns its base or its subtypes.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{StructuralCore, StructuralType, TypeState};
use crate::error::{MetadataError, MetadataResult};
use crate::naming;
use crate::property::{
    DataProperty, NavigationProperty, PropertyHandle, PropertyList, StructuralProperty,
};
use crate::registry::{ConstructorRegistry, Entity, TypeRegistry};

/// How key values of new entities are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AutoGeneratedKeyType {
    /// Keys are assigned by the client
    #[default]
    None,
    /// Keys are assigned by the server on insert
    Identity,
    /// Keys are assigned by a client-side key generator
    KeyGenerator,
}

impl AutoGeneratedKeyType {
    /// Symbolic name used in metadata documents
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Identity => "Identity",
            Self::KeyGenerator => "KeyGenerator",
        }
    }
}

impl fmt::Display for AutoGeneratedKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoGeneratedKeyType {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "Identity" => Ok(Self::Identity),
            "KeyGenerator" => Ok(Self::KeyGenerator),
            other => Err(MetadataError::decode(format!(
                "unknown autoGeneratedKeyType '{}'",
                other
            ))),
        }
    }
}

/// A persistable domain entity type
#[derive(Debug, Clone)]
pub struct EntityType {
    core: StructuralCore,
    base_type_name: Option<String>,
    base_entity_type: Option<String>,
    auto_generated_key_type: AutoGeneratedKeyType,
    navigation_properties: PropertyList<NavigationProperty>,
    key_properties: Vec<PropertyHandle<DataProperty>>,
    foreign_key_properties: Vec<PropertyHandle<DataProperty>>,
    concurrency_properties: Vec<PropertyHandle<DataProperty>>,
    subtypes: Vec<String>,
}

impl EntityType {
    /// Create an empty entity type
    pub fn new(short_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            core: StructuralCore::new(short_name, namespace),
            base_type_name: None,
            base_entity_type: None,
            auto_generated_key_type: AutoGeneratedKeyType::None,
            navigation_properties: PropertyList::new(),
            key_properties: Vec::new(),
            foreign_key_properties: Vec::new(),
            concurrency_properties: Vec::new(),
            subtypes: Vec::new(),
        }
    }

    /// Name of the base type, qualified or relative to this type's namespace
    pub fn with_base_type_name(mut self, base_type_name: impl Into<String>) -> Self {
        self.base_type_name = Some(base_type_name.into());
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.core.set_abstract(is_abstract);
        self
    }

    pub fn with_auto_generated_key_type(mut self, key_type: AutoGeneratedKeyType) -> Self {
        self.auto_generated_key_type = key_type;
        self
    }

    /// Base type name as declared
    pub fn base_type_name(&self) -> Option<&str> {
        self.base_type_name.as_deref()
    }

    /// Base type name qualified with this type's namespace
    pub fn qualified_base_type_name(&self) -> Option<String> {
        self.base_type_name
            .as_deref()
            .map(|name| naming::qualify_type_name(name, self.core.namespace()))
    }

    /// Qualified name of the base type once the store has resolved it
    pub fn base_entity_type(&self) -> Option<&str> {
        self.base_entity_type.as_deref()
    }

    pub fn auto_generated_key_type(&self) -> AutoGeneratedKeyType {
        self.auto_generated_key_type
    }

    /// Default resource name, as known to the registry
    pub fn default_resource_name(&self, registry: &dyn TypeRegistry) -> Option<String> {
        registry.default_resource_name(self)
    }

    /// Qualified names of the entity types deriving directly from this one
    pub fn subtypes(&self) -> &[String] {
        &self.subtypes
    }

    pub fn navigation_properties(&self) -> &PropertyList<NavigationProperty> {
        &self.navigation_properties
    }

    pub fn key_properties(&self) -> &[PropertyHandle<DataProperty>] {
        &self.key_properties
    }

    pub fn foreign_key_properties(&self) -> &[PropertyHandle<DataProperty>] {
        &self.foreign_key_properties
    }

    pub fn concurrency_properties(&self) -> &[PropertyHandle<DataProperty>] {
        &self.concurrency_properties
    }

    pub fn get_navigation_property(&self, name: &str) -> Option<&PropertyHandle<NavigationProperty>> {
        self.navigation_properties.get(name)
    }

    /// Attach either kind of property
    ///
    /// The property becomes a declared member of this type even when the
    /// handle was taken from another type's inherited view.
    pub fn add_property(
        &mut self,
        property: impl Into<StructuralProperty>,
    ) -> MetadataResult<StructuralProperty> {
        match property.into() {
            StructuralProperty::Data(handle) => {
                self.attach_data(handle).map(StructuralProperty::Data)
            }
            StructuralProperty::Navigation(handle) => {
                self.attach_navigation(handle).map(StructuralProperty::Navigation)
            }
        }
    }

    /// Append a data property and record it in every classification index
    /// its flags select
    pub fn add_data_property(
        &mut self,
        property: DataProperty,
    ) -> MetadataResult<PropertyHandle<DataProperty>> {
        self.attach_data(PropertyHandle::declared(property))
    }

    /// Append a navigation property, qualifying its target type name with
    /// this type's namespace when needed
    pub fn add_navigation_property(
        &mut self,
        property: NavigationProperty,
    ) -> MetadataResult<PropertyHandle<NavigationProperty>> {
        self.attach_navigation(PropertyHandle::declared(property))
    }

    /// Record `subtype_name` as deriving from this type
    pub fn register_subtype(&mut self, subtype_name: impl Into<String>) {
        let subtype_name = subtype_name.into();
        if !self.subtypes.contains(&subtype_name) {
            tracing::debug!(
                "Registered subtype {} under {}",
                subtype_name,
                self.qualified_name()
            );
            self.subtypes.push(subtype_name);
        }
    }

    /// Produce a blank runtime instance described by this type
    pub fn create(
        self: &Arc<Self>,
        constructors: &ConstructorRegistry,
    ) -> MetadataResult<Box<dyn Entity>> {
        let type_name = self.qualified_name();
        if self.is_abstract() {
            return Err(MetadataError::instantiation(
                type_name,
                "abstract types cannot be instantiated",
            ));
        }

        let constructor = constructors.get(&type_name).ok_or_else(|| {
            MetadataError::instantiation(&type_name, "no constructor is registered")
        })?;

        let mut entity = constructor();
        entity.set_entity_type(Arc::clone(self));
        Ok(entity)
    }

    fn ensure_unique(&self, name: &str) -> MetadataResult<()> {
        if self.core.data_properties().contains(name) || self.navigation_properties.contains(name) {
            return Err(MetadataError::duplicate_property(self.qualified_name(), name));
        }
        Ok(())
    }

    fn attach_data(
        &mut self,
        handle: PropertyHandle<DataProperty>,
    ) -> MetadataResult<PropertyHandle<DataProperty>> {
        let handle = handle.to_declared();
        self.ensure_unique(handle.name())?;
        self.core.begin_mutation()?;

        if handle.is_part_of_key() {
            self.key_properties.push(handle.clone());
        }
        if handle.is_foreign_key() {
            self.foreign_key_properties.push(handle.clone());
        }
        if handle.is_concurrency_property() {
            self.concurrency_properties.push(handle.clone());
        }
        self.core.data_properties_mut().push(handle.clone());

        Ok(handle)
    }

    fn attach_navigation(
        &mut self,
        handle: PropertyHandle<NavigationProperty>,
    ) -> MetadataResult<PropertyHandle<NavigationProperty>> {
        let mut handle = handle.to_declared();
        self.ensure_unique(handle.name())?;
        self.core.begin_mutation()?;

        if !handle.is_qualified() {
            let namespace = self.core.namespace().to_string();
            handle.make_mut().qualify_target(&namespace);
        }
        self.navigation_properties.push(handle.clone());

        Ok(handle)
    }

    /// Take over every visible property of `base` as inherited members and
    /// record the resolved base link
    pub(crate) fn inherit_from(&mut self, base: &EntityType) -> MetadataResult<()> {
        let data: Vec<_> = base
            .data_properties()
            .iter()
            .map(PropertyHandle::to_inherited)
            .collect();
        let navigation: Vec<_> = base
            .navigation_properties
            .iter()
            .map(PropertyHandle::to_inherited)
            .collect();

        self.prepend_inherited(&data, &navigation)?;
        self.base_entity_type = Some(base.qualified_name());
        Ok(())
    }

    /// Check that none of the given names collide with a visible property
    pub(crate) fn check_inheritable<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> MetadataResult<()> {
        names.into_iter().try_for_each(|name| self.ensure_unique(name))
    }

    /// Insert ancestor properties ahead of everything already visible
    pub(crate) fn prepend_inherited(
        &mut self,
        data: &[PropertyHandle<DataProperty>],
        navigation: &[PropertyHandle<NavigationProperty>],
    ) -> MetadataResult<()> {
        self.check_inheritable(
            data.iter()
                .map(|p| p.name())
                .chain(navigation.iter().map(|p| p.name())),
        )?;
        self.core.begin_mutation()?;

        prepend_matching(&mut self.key_properties, data, DataProperty::is_part_of_key);
        prepend_matching(&mut self.foreign_key_properties, data, DataProperty::is_foreign_key);
        prepend_matching(
            &mut self.concurrency_properties,
            data,
            DataProperty::is_concurrency_property,
        );

        self.core.data_properties_mut().prepend(data.iter().cloned());
        self.navigation_properties.prepend(navigation.iter().cloned());
        Ok(())
    }

    /// Drop inherited members named in `names`, returning the names removed
    pub(crate) fn drop_inherited(&mut self, names: &HashSet<String>) -> HashSet<String> {
        let doomed = |handle_name: &str, inherited: bool| inherited && names.contains(handle_name);

        let mut removed: HashSet<String> = self
            .core
            .data_properties_mut()
            .remove_where(|p| doomed(p.name(), p.is_inherited()))
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        removed.extend(
            self.navigation_properties
                .remove_where(|p| doomed(p.name(), p.is_inherited()))
                .iter()
                .map(|p| p.name().to_string()),
        );

        for index in [
            &mut self.key_properties,
            &mut self.foreign_key_properties,
            &mut self.concurrency_properties,
        ] {
            index.retain(|p| !removed.contains(p.name()));
        }
        removed
    }

    /// Forget the resolved base link and every inherited member
    pub(crate) fn detach_base(&mut self) -> HashSet<String> {
        self.base_entity_type = None;
        let inherited: HashSet<String> = self
            .properties()
            .into_iter()
            .filter(StructuralProperty::is_inherited)
            .map(|p| p.name().to_string())
            .collect();
        self.drop_inherited(&inherited)
    }

    pub(crate) fn remove_subtype(&mut self, subtype_name: &str) {
        self.subtypes.retain(|name| name != subtype_name);
    }

    pub(crate) fn set_state(&mut self, state: TypeState) {
        self.core.set_state(state);
    }
}

fn prepend_matching(
    index: &mut Vec<PropertyHandle<DataProperty>>,
    inherited: &[PropertyHandle<DataProperty>],
    pick: fn(&DataProperty) -> bool,
) {
    let existing = std::mem::take(index);
    *index = inherited
        .iter()
        .filter(|handle| pick(handle))
        .cloned()
        .chain(existing)
        .collect();
}

impl StructuralType for EntityType {
    fn core(&self) -> &StructuralCore {
        &self.core
    }

    fn is_entity_type(&self) -> bool {
        true
    }

    fn get_property(&self, name: &str) -> Option<StructuralProperty> {
        if let Some(property) = self.get_data_property(name) {
            return Some(StructuralProperty::Data(property.clone()));
        }
        self.get_navigation_property(name)
            .cloned()
            .map(StructuralProperty::Navigation)
    }

    fn properties(&self) -> Vec<StructuralProperty> {
        self.data_properties()
            .iter()
            .cloned()
            .map(StructuralProperty::Data)
            .chain(
                self.navigation_properties
                    .iter()
                    .cloned()
                    .map(StructuralProperty::Navigation),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{ConcurrencyMode, DataType};

    fn order_type() -> EntityType {
        let mut order = EntityType::new("Order", "Sales")
            .with_auto_generated_key_type(AutoGeneratedKeyType::Identity);
        order
            .add_data_property(DataProperty::new("Id", DataType::Int32).with_part_of_key(true))
            .unwrap();
        order
            .add_data_property(DataProperty::new("CustomerId", DataType::Int32).with_foreign_key(true))
            .unwrap();
        order
            .add_data_property(DataProperty::new("Total", DataType::Decimal))
            .unwrap();
        order
            .add_data_property(
                DataProperty::new("RowVersion", DataType::Binary)
                    .with_concurrency_mode(ConcurrencyMode::Fixed),
            )
            .unwrap();
        order
    }

    #[test]
    fn test_auto_generated_key_type_symbols() {
        assert_eq!(
            "KeyGenerator".parse::<AutoGeneratedKeyType>().unwrap(),
            AutoGeneratedKeyType::KeyGenerator
        );
        assert_eq!(AutoGeneratedKeyType::Identity.to_string(), "Identity");
        assert!("Sequence".parse::<AutoGeneratedKeyType>().unwrap_err().is_decode());
    }

    #[test]
    fn test_classification_indexes() {
        let order = order_type();

        let names = |index: &[PropertyHandle<DataProperty>]| {
            index.iter().map(|p| p.name().to_string()).collect::<Vec<_>>()
        };
        assert_eq!(names(order.key_properties()), vec!["Id"]);
        assert_eq!(names(order.foreign_key_properties()), vec!["CustomerId"]);
        assert_eq!(names(order.concurrency_properties()), vec!["RowVersion"]);
        assert_eq!(
            order.data_properties().names(),
            vec!["Id", "CustomerId", "Total", "RowVersion"]
        );
    }

    #[test]
    fn test_index_members_share_data_property_allocation() {
        let order = order_type();
        let key = &order.key_properties()[0];
        assert!(key.ptr_eq(order.get_data_property("Id").unwrap()));
    }

    #[test]
    fn test_composite_key_order_follows_insertion() {
        let mut line = EntityType::new("OrderLine", "Sales");
        line.add_data_property(DataProperty::new("OrderId", DataType::Int32).with_part_of_key(true))
            .unwrap();
        line.add_data_property(DataProperty::new("Quantity", DataType::Int32))
            .unwrap();
        line.add_data_property(DataProperty::new("LineNo", DataType::Int16).with_part_of_key(true))
            .unwrap();

        let keys: Vec<_> = line.key_properties().iter().map(|p| p.name()).collect();
        assert_eq!(keys, vec!["OrderId", "LineNo"]);
    }

    #[test]
    fn test_navigation_target_is_qualified() {
        let mut order = order_type();
        let customer = order
            .add_navigation_property(NavigationProperty::new("Customer", "Customer"))
            .unwrap();
        let owner = order
            .add_navigation_property(NavigationProperty::new("Owner", "Crm.Contact"))
            .unwrap();

        assert_eq!(customer.entity_type_name(), "Sales.Customer");
        assert_eq!(owner.entity_type_name(), "Crm.Contact");
        assert_eq!(
            order
                .get_navigation_property("Customer")
                .map(|p| p.entity_type_name()),
            Some("Sales.Customer")
        );
    }

    #[test]
    fn test_get_property_checks_data_then_navigation() {
        let mut order = order_type();
        order
            .add_navigation_property(NavigationProperty::new("Customer", "Customer"))
            .unwrap();

        assert!(matches!(order.get_property("Total"), Some(StructuralProperty::Data(_))));
        assert!(matches!(
            order.get_property("Customer"),
            Some(StructuralProperty::Navigation(_))
        ));
        assert!(order.get_property("Missing").is_none());
    }

    #[test]
    fn test_properties_lists_data_then_navigation() {
        let mut order = EntityType::new("Order", "Sales");
        order
            .add_navigation_property(NavigationProperty::new("Customer", "Customer"))
            .unwrap();
        order
            .add_data_property(DataProperty::new("Id", DataType::Int32))
            .unwrap();

        let names: Vec<_> = order
            .properties()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Id", "Customer"]);
    }

    #[test]
    fn test_duplicate_property_names_rejected() {
        let mut order = order_type();
        let err = order
            .add_data_property(DataProperty::new("Total", DataType::Double))
            .unwrap_err();
        assert!(matches!(err, MetadataError::DuplicateProperty { .. }));

        let err = order
            .add_navigation_property(NavigationProperty::new("Id", "Customer"))
            .unwrap_err();
        assert!(matches!(err, MetadataError::DuplicateProperty { .. }));
        assert_eq!(order.data_properties().len(), 4);
    }

    #[test]
    fn test_add_property_dispatches_by_kind() {
        let mut order = EntityType::new("Order", "Sales");
        order
            .add_property(DataProperty::new("Id", DataType::Int32).with_part_of_key(true))
            .unwrap();
        let added = order
            .add_property(NavigationProperty::new("Customer", "Customer"))
            .unwrap();

        assert_eq!(order.key_properties().len(), 1);
        assert_eq!(
            added.as_navigation().map(|p| p.entity_type_name()),
            Some("Sales.Customer")
        );
    }

    #[test]
    fn test_add_property_redeclares_inherited_handles() {
        let order = order_type();
        let mut special = EntityType::new("SpecialOrder", "Sales");
        special.inherit_from(&order).unwrap();

        let total = special.get_property("Total").unwrap();
        assert!(total.is_inherited());

        let mut archive = EntityType::new("ArchivedOrder", "Sales");
        let added = archive.add_property(total).unwrap();

        assert!(!added.is_inherited());
        assert_eq!(archive.data_properties().own().count(), 1);
        match added {
            StructuralProperty::Data(handle) => {
                assert!(handle.ptr_eq(order.get_data_property("Total").unwrap()))
            }
            StructuralProperty::Navigation(_) => panic!("expected a data property"),
        }
    }

    #[test]
    fn test_state_moves_to_populating_on_first_property() {
        let mut order = EntityType::new("Order", "Sales");
        assert_eq!(order.state(), TypeState::Unregistered);
        order
            .add_data_property(DataProperty::new("Id", DataType::Int32))
            .unwrap();
        assert_eq!(order.state(), TypeState::Populating);
    }

    #[test]
    fn test_finalized_type_rejects_properties() {
        let mut order = order_type();
        order.set_state(TypeState::Finalized);
        let err = order
            .add_data_property(DataProperty::new("Notes", DataType::String))
            .unwrap_err();
        assert!(matches!(err, MetadataError::Finalized { .. }));
    }

    #[test]
    fn test_inherit_from_prepends_base_members() {
        let order = order_type();
        let mut special = EntityType::new("SpecialOrder", "Sales").with_base_type_name("Order");
        special
            .add_data_property(DataProperty::new("Discount", DataType::Decimal))
            .unwrap();

        special.inherit_from(&order).unwrap();

        assert_eq!(special.base_entity_type(), Some("Sales.Order"));
        assert_eq!(
            special.data_properties().names(),
            vec!["Id", "CustomerId", "Total", "RowVersion", "Discount"]
        );
        assert_eq!(special.key_properties().len(), 1);
        assert!(special.key_properties()[0].is_inherited());
        assert!(special.key_properties()[0].ptr_eq(order.get_data_property("Id").unwrap()));
        assert!(!special.get_data_property("Discount").unwrap().is_inherited());
    }

    #[test]
    fn test_inherit_from_rejects_shadowing() {
        let order = order_type();
        let mut special = EntityType::new("SpecialOrder", "Sales");
        special
            .add_data_property(DataProperty::new("Total", DataType::Decimal))
            .unwrap();

        let err = special.inherit_from(&order).unwrap_err();
        assert!(matches!(err, MetadataError::DuplicateProperty { .. }));
        assert_eq!(special.data_properties().names(), vec!["Total"]);
        assert_eq!(special.base_entity_type(), None);
    }

    #[test]
    fn test_detach_base_keeps_own_members() {
        let order = order_type();
        let mut special = EntityType::new("SpecialOrder", "Sales");
        special
            .add_data_property(DataProperty::new("Discount", DataType::Decimal))
            .unwrap();
        special.inherit_from(&order).unwrap();

        let removed = special.detach_base();

        assert_eq!(removed.len(), 4);
        assert_eq!(special.data_properties().names(), vec!["Discount"]);
        assert!(special.key_properties().is_empty());
        assert!(special.concurrency_properties().is_empty());
        assert_eq!(special.base_entity_type(), None);
    }

    #[test]
    fn test_register_subtype_ignores_duplicates() {
        let mut order = order_type();
        order.register_subtype("Sales.SpecialOrder");
        order.register_subtype("Sales.SpecialOrder");
        assert_eq!(order.subtypes(), ["Sales.SpecialOrder".to_string()]);

        order.remove_subtype("Sales.SpecialOrder");
        assert!(order.subtypes().is_empty());
    }

    #[test]
    fn test_qualified_base_type_name() {
        let special = EntityType::new("SpecialOrder", "Sales").with_base_type_name("Order");
        assert_eq!(special.base_type_name(), Some("Order"));
        assert_eq!(special.qualified_base_type_name().as_deref(), Some("Sales.Order"));
    }
}
