//! Property Collections - ordered, name-indexed property storage
//!
//! Properties are held through [`PropertyHandle`], so the inherited view a
//! subtype exposes shares the allocation of the declaring type's property.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

/// Shared reference to a property plus whether it is inherited on the
/// type holding this handle
#[derive(Debug)]
pub struct PropertyHandle<P> {
    property: Arc<P>,
    inherited: bool,
}

impl<P> PropertyHandle<P> {
    /// Wrap a property declared by the type that will hold it
    pub fn declared(property: P) -> Self {
        Self {
            property: Arc::new(property),
            inherited: false,
        }
    }

    /// Returns true if the property was declared on an ancestor type
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    /// A handle to the same property, as seen from a subtype
    pub fn to_inherited(&self) -> Self {
        Self {
            property: Arc::clone(&self.property),
            inherited: true,
        }
    }

    /// A handle to the same property, as declared by the type holding it
    pub fn to_declared(&self) -> Self {
        Self {
            property: Arc::clone(&self.property),
            inherited: false,
        }
    }

    /// Returns true if both handles point at the same property allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.property, &other.property)
    }
}

impl<P: Clone> PropertyHandle<P> {
    /// Mutable access, cloning the property first if it is shared
    pub(crate) fn make_mut(&mut self) -> &mut P {
        Arc::make_mut(&mut self.property)
    }
}

impl<P> Clone for PropertyHandle<P> {
    fn clone(&self) -> Self {
        Self {
            property: Arc::clone(&self.property),
            inherited: self.inherited,
        }
    }
}

impl<P> Deref for PropertyHandle<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.property
    }
}

impl<P: PartialEq> PartialEq for PropertyHandle<P> {
    fn eq(&self, other: &Self) -> bool {
        self.inherited == other.inherited && *self.property == *other.property
    }
}

/// Anything stored in a [`PropertyList`] is looked up by name
pub trait NamedProperty {
    fn property_name(&self) -> &str;
}

impl NamedProperty for super::DataProperty {
    fn property_name(&self) -> &str {
        self.name()
    }
}

impl NamedProperty for super::NavigationProperty {
    fn property_name(&self) -> &str {
        self.name()
    }
}

/// Insertion-ordered property list with O(1) lookup by name
#[derive(Debug)]
pub struct PropertyList<P> {
    items: Vec<PropertyHandle<P>>,
    by_name: HashMap<String, usize>,
}

impl<P> Default for PropertyList<P> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<P> Clone for PropertyList<P> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            by_name: self.by_name.clone(),
        }
    }
}

impl<P: NamedProperty> PropertyList<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handle; the caller is responsible for name uniqueness
    pub fn push(&mut self, handle: PropertyHandle<P>) {
        self.by_name
            .insert(handle.property_name().to_string(), self.items.len());
        self.items.push(handle);
    }

    /// Insert handles ahead of every existing entry, keeping their order
    pub fn prepend(&mut self, handles: impl IntoIterator<Item = PropertyHandle<P>>) {
        let mut items: Vec<_> = handles.into_iter().collect();
        if items.is_empty() {
            return;
        }
        items.append(&mut self.items);
        self.items = items;
        self.reindex();
    }

    /// Drop every entry matching `predicate`, returning the removed handles
    pub fn remove_where(
        &mut self,
        mut predicate: impl FnMut(&PropertyHandle<P>) -> bool,
    ) -> Vec<PropertyHandle<P>> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.items.drain(..).partition(|handle| predicate(handle));
        self.items = kept;
        self.reindex();
        removed
    }

    pub fn get(&self, name: &str) -> Option<&PropertyHandle<P>> {
        self.by_name.get(name).map(|&index| &self.items[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyHandle<P>> {
        self.items.iter()
    }

    /// Properties declared by the owning type itself
    pub fn own(&self) -> impl Iterator<Item = &PropertyHandle<P>> {
        self.items.iter().filter(|handle| !handle.is_inherited())
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|handle| handle.property_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn reindex(&mut self) {
        self.by_name = self
            .items
            .iter()
            .enumerate()
            .map(|(index, handle)| (handle.property_name().to_string(), index))
            .collect();
    }
}

impl<'a, P> IntoIterator for &'a PropertyList<P> {
    type Item = &'a PropertyHandle<P>;
    type IntoIter = std::slice::Iter<'a, PropertyHandle<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{DataProperty, DataType};

    fn handle(name: &str) -> PropertyHandle<DataProperty> {
        PropertyHandle::declared(DataProperty::new(name, DataType::String))
    }

    #[test]
    fn test_push_preserves_order_and_lookup() {
        let mut list = PropertyList::new();
        list.push(handle("Id"));
        list.push(handle("Total"));

        assert_eq!(list.names(), vec!["Id", "Total"]);
        assert_eq!(list.get("Total").map(|p| p.name()), Some("Total"));
        assert!(list.get("Missing").is_none());
    }

    #[test]
    fn test_prepend_reindexes() {
        let mut list = PropertyList::new();
        list.push(handle("Discount"));
        list.prepend(vec![handle("Id").to_inherited(), handle("Total").to_inherited()]);

        assert_eq!(list.names(), vec!["Id", "Total", "Discount"]);
        assert_eq!(list.get("Discount").map(|p| p.name()), Some("Discount"));
        assert_eq!(list.own().count(), 1);
    }

    #[test]
    fn test_remove_where() {
        let mut list = PropertyList::new();
        list.push(handle("Id").to_inherited());
        list.push(handle("Discount"));

        let removed = list.remove_where(|p| p.is_inherited());
        assert_eq!(removed.len(), 1);
        assert_eq!(list.names(), vec!["Discount"]);
        assert!(!list.contains("Id"));
        assert!(list.get("Discount").is_some());
    }

    #[test]
    fn test_inherited_handle_shares_allocation() {
        let declared = handle("Id");
        let inherited = declared.to_inherited();

        assert!(inherited.ptr_eq(&declared));
        assert!(inherited.is_inherited());
        assert!(!declared.is_inherited());
        assert_ne!(inherited, declared);

        let redeclared = inherited.to_declared();
        assert!(redeclared.ptr_eq(&declared));
        assert_eq!(redeclared, declared);
    }
}
