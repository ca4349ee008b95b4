//! Property Model - data and navigation properties of structural types

pub mod collection;
pub mod data;
pub mod navigation;

pub use collection::*;
pub use data::*;
pub use navigation::*;

/// Either kind of property, as seen through the polymorphic `properties` view
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralProperty {
    Data(PropertyHandle<DataProperty>),
    Navigation(PropertyHandle<NavigationProperty>),
}

impl StructuralProperty {
    pub fn name(&self) -> &str {
        match self {
            Self::Data(property) => property.name(),
            Self::Navigation(property) => property.name(),
        }
    }

    pub fn is_inherited(&self) -> bool {
        match self {
            Self::Data(property) => property.is_inherited(),
            Self::Navigation(property) => property.is_inherited(),
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigation(_))
    }

    pub fn as_data(&self) -> Option<&DataProperty> {
        match self {
            Self::Data(property) => Some(property),
            Self::Navigation(_) => None,
        }
    }

    pub fn as_navigation(&self) -> Option<&NavigationProperty> {
        match self {
            Self::Navigation(property) => Some(property),
            Self::Data(_) => None,
        }
    }
}

impl From<DataProperty> for StructuralProperty {
    fn from(property: DataProperty) -> Self {
        Self::Data(PropertyHandle::declared(property))
    }
}

impl From<NavigationProperty> for StructuralProperty {
    fn from(property: NavigationProperty) -> Self {
        Self::Navigation(PropertyHandle::declared(property))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_property_dispatch() {
        let data: StructuralProperty = DataProperty::new("Id", DataType::Int32).into();
        let navigation: StructuralProperty = NavigationProperty::new("Customer", "Customer").into();

        assert_eq!(data.name(), "Id");
        assert!(!data.is_navigation());
        assert!(data.as_data().is_some());
        assert!(data.as_navigation().is_none());

        assert!(navigation.is_navigation());
        assert_eq!(
            navigation.as_navigation().map(|p| p.entity_type_name()),
            Some("Customer")
        );
        assert!(!navigation.is_inherited());
    }
}
