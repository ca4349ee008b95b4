//! Constructor Registry - runtime representations behind entity types

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use dashmap::DashMap;

use crate::types::EntityType;

/// A live object described by an entity type
pub trait Entity: Any + Send + Sync + Debug {
    /// The type descriptor attached at creation
    fn entity_type(&self) -> Option<&Arc<EntityType>>;

    fn set_entity_type(&mut self, entity_type: Arc<EntityType>);

    fn as_any(&self) -> &dyn Any;
}

/// Factory producing a blank instance
pub type EntityConstructor = Arc<dyn Fn() -> Box<dyn Entity> + Send + Sync>;

/// Thread-safe map of qualified type name -> constructor
#[derive(Clone, Default)]
pub struct ConstructorRegistry {
    constructors: Arc<DashMap<String, EntityConstructor>>,
}

impl ConstructorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the constructor for a qualified type name, replacing any
    /// previous one
    pub fn register(&self, type_name: impl Into<String>, constructor: EntityConstructor) {
        let type_name = type_name.into();
        tracing::debug!("Registering entity constructor for {}", type_name);
        self.constructors.insert(type_name, constructor);
    }

    /// Register `T::default` as the constructor for a qualified type name
    pub fn register_default<T>(&self, type_name: impl Into<String>)
    where
        T: Entity + Default,
    {
        self.register(type_name, Arc::new(|| Box::new(T::default()) as Box<dyn Entity>));
    }

    pub fn get(&self, type_name: &str) -> Option<EntityConstructor> {
        self.constructors
            .get(type_name)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl Debug for ConstructorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self
            .constructors
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        f.debug_struct("ConstructorRegistry")
            .field("types", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::property::{DataProperty, DataType};
    use crate::types::StructuralType;

    #[derive(Debug, Default)]
    struct Order {
        entity_type: Option<Arc<EntityType>>,
    }

    impl Entity for Order {
        fn entity_type(&self) -> Option<&Arc<EntityType>> {
            self.entity_type.as_ref()
        }

        fn set_entity_type(&mut self, entity_type: Arc<EntityType>) {
            self.entity_type = Some(entity_type);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn order_type() -> Arc<EntityType> {
        let mut order = EntityType::new("Order", "Sales");
        order
            .add_data_property(DataProperty::new("Id", DataType::Int32).with_part_of_key(true))
            .unwrap();
        Arc::new(order)
    }

    #[test]
    fn test_create_attaches_type_descriptor() {
        let constructors = ConstructorRegistry::new();
        constructors.register_default::<Order>("Sales.Order");

        let order_type = order_type();
        let entity = order_type.create(&constructors).unwrap();

        let descriptor = entity.entity_type().unwrap();
        assert!(Arc::ptr_eq(descriptor, &order_type));
        assert_eq!(descriptor.qualified_name(), "Sales.Order");
        assert!(entity.as_any().downcast_ref::<Order>().is_some());
    }

    #[test]
    fn test_create_without_constructor_fails() {
        let constructors = ConstructorRegistry::new();
        let err = order_type().create(&constructors).unwrap_err();
        assert!(matches!(err, MetadataError::Instantiation { .. }));
    }

    #[test]
    fn test_create_abstract_type_fails() {
        let constructors = ConstructorRegistry::new();
        constructors.register_default::<Order>("Sales.Party");

        let party = Arc::new(EntityType::new("Party", "Sales").with_abstract(true));
        let err = party.create(&constructors).unwrap_err();
        assert!(err.is_instantiation());
    }

    #[test]
    fn test_registry_bookkeeping() {
        let constructors = ConstructorRegistry::new();
        assert!(constructors.is_empty());

        constructors.register_default::<Order>("Sales.Order");
        assert!(constructors.contains("Sales.Order"));
        assert!(!constructors.contains("Sales.Customer"));
        assert_eq!(constructors.len(), 1);
        assert!(format!("{:?}", constructors).contains("Sales.Order"));
    }
}
