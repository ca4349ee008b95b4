//! Metadata Store - owns every structural type by qualified name
//!
//! Types are held as `Arc` snapshots behind a single lock. Structural changes
//! after registration go through `Arc::make_mut`, so a reader holding an older
//! `Arc` (an entity's type descriptor, for instance) keeps a consistent view.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::DashMap;

use super::{ConstructorRegistry, Entity, TypeRegistry};
use crate::codec::{
    ComplexTypeDocument, EntityTypeDocument, ImportReport, MetadataDocument, RawMetadataDocument,
    SkippedType,
};
use crate::config::{DuplicateTypePolicy, MetadataConfig, TypeErrorPolicy};
use crate::error::{MetadataError, MetadataResult};
use crate::naming::NamingConvention;
use crate::property::PropertyHandle;
use crate::types::{ComplexType, EntityType, StructuralType, TypeState};

#[derive(Debug, Clone, Default)]
struct TypeTable {
    entity_types: HashMap<String, Arc<EntityType>>,
    complex_types: HashMap<String, Arc<ComplexType>>,
    /// Registration order, used for export
    entity_order: Vec<String>,
    complex_order: Vec<String>,
    /// Qualified base name -> subtypes waiting for that base to be registered
    pending: HashMap<String, Vec<String>>,
}

impl TypeTable {
    fn entity(&self, name: &str) -> MetadataResult<&Arc<EntityType>> {
        self.entity_types
            .get(name)
            .ok_or_else(|| MetadataError::unknown_type(name))
    }

    fn entity_mut(&mut self, name: &str) -> MetadataResult<&mut EntityType> {
        self.entity_types
            .get_mut(name)
            .map(Arc::make_mut)
            .ok_or_else(|| MetadataError::unknown_type(name))
    }

    /// `name` followed by every type deriving from it, breadth first
    fn descendants(&self, name: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([name.to_string()]);
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(entity_type) = self.entity_types.get(&current) {
                queue.extend(entity_type.subtypes().iter().cloned());
            }
            result.push(current);
        }
        result
    }

    /// Resolved base chain of `entity_type`, nearest first
    fn ancestors(&self, entity_type: &EntityType) -> Vec<String> {
        let mut chain = Vec::new();
        let mut next = entity_type.base_entity_type().map(str::to_string);
        while let Some(name) = next {
            if chain.contains(&name) {
                break;
            }
            next = self
                .entity_types
                .get(&name)
                .and_then(|base| base.base_entity_type().map(str::to_string));
            chain.push(name);
        }
        chain
    }

    /// Verify that `child` and its descendants can take over every visible
    /// member of `base` without a name collision
    fn check_link(&self, child: &str, base: &EntityType) -> MetadataResult<()> {
        let base_name = base.qualified_name();
        let lineage = self.descendants(child);
        if lineage.contains(&base_name) || self.ancestors(base).iter().any(|a| lineage.contains(a)) {
            return Err(MetadataError::decode(format!(
                "circular inheritance between '{}' and '{}'",
                child, base_name
            )));
        }

        let names: Vec<String> = base
            .properties()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        for name in &lineage {
            self.entity(name)?
                .check_inheritable(names.iter().map(String::as_str))?;
        }
        Ok(())
    }

    /// Resolve `child`'s base link to the registered `base_name`
    fn link(&mut self, child: &str, base_name: &str) -> MetadataResult<()> {
        let base = Arc::clone(self.entity(base_name)?);
        self.check_link(child, &base)?;

        let data: Vec<_> = base
            .data_properties()
            .iter()
            .map(PropertyHandle::to_inherited)
            .collect();
        let navigation: Vec<_> = base
            .navigation_properties()
            .iter()
            .map(PropertyHandle::to_inherited)
            .collect();

        for name in self.descendants(child) {
            let entity_type = self.entity_mut(&name)?;
            if name == child {
                entity_type.inherit_from(&base)?;
            } else {
                entity_type.prepend_inherited(&data, &navigation)?;
            }
        }
        self.entity_mut(base_name)?.register_subtype(child);

        tracing::debug!("Linked entity type {} to base {}", child, base_name);
        Ok(())
    }

    /// Insert `entity_type`, link it to its base and link the subtypes
    /// waiting for it
    ///
    /// May leave the table half updated on error; callers run it on a copy.
    fn register(
        &mut self,
        mut entity_type: EntityType,
        duplicates: DuplicateTypePolicy,
    ) -> MetadataResult<Arc<EntityType>> {
        let name = entity_type.qualified_name();

        if self.entity_types.contains_key(&name) {
            match duplicates {
                DuplicateTypePolicy::Reject => return Err(MetadataError::duplicate_type(name)),
                DuplicateTypePolicy::Replace => {
                    tracing::warn!("Replacing registered entity type {}", name);
                    self.detach(&name)?;
                }
            }
        }

        let base_name = entity_type.qualified_base_type_name();
        if let Some(base_name) = &base_name {
            if *base_name == name {
                return Err(MetadataError::decode(format!(
                    "entity type '{}' cannot derive from itself",
                    name
                )));
            }
            if let Some(base) = self.entity_types.get(base_name).cloned() {
                if self.ancestors(&base).contains(&name) {
                    return Err(MetadataError::decode(format!(
                        "circular inheritance between '{}' and '{}'",
                        name, base_name
                    )));
                }
                entity_type.inherit_from(&base)?;
            }
        }

        let waiting = self.pending.get(&name).cloned().unwrap_or_default();
        for subtype in &waiting {
            if self.ancestors(&entity_type).contains(subtype) {
                return Err(MetadataError::decode(format!(
                    "circular inheritance between '{}' and '{}'",
                    subtype, name
                )));
            }
            self.check_link(subtype, &entity_type)?;
        }

        match base_name {
            Some(base_name) if entity_type.base_entity_type().is_some() => {
                self.entity_mut(&base_name)?.register_subtype(&name);
            }
            Some(base_name) => {
                tracing::debug!("Entity type {} waits for base {}", name, base_name);
                self.pending.entry(base_name).or_default().push(name.clone());
            }
            None => {}
        }

        entity_type.set_state(TypeState::Registered);
        self.entity_types.insert(name.clone(), Arc::new(entity_type));
        self.entity_order.push(name.clone());

        self.pending.remove(&name);
        for subtype in waiting {
            self.link(&subtype, &name)?;
        }

        self.entity(&name).cloned()
    }

    /// Remove a type, orphaning its subtypes
    ///
    /// Orphans drop their inherited members, keep their own, and wait in the
    /// pending table for a type with the same name to be registered.
    fn detach(&mut self, name: &str) -> MetadataResult<Option<Arc<EntityType>>> {
        let Some(removed) = self.entity_types.remove(name) else {
            return Ok(None);
        };
        self.entity_order.retain(|n| n != name);
        for waiting in self.pending.values_mut() {
            waiting.retain(|n| n != name);
        }
        if let Some(base_name) = removed.base_entity_type() {
            if let Some(base) = self.entity_types.get_mut(base_name) {
                Arc::make_mut(base).remove_subtype(name);
            }
        }

        for subtype in removed.subtypes() {
            let dropped = self.entity_mut(subtype)?.detach_base();
            for descendant in self.descendants(subtype).into_iter().skip(1) {
                self.entity_mut(&descendant)?.drop_inherited(&dropped);
            }
            self.pending
                .entry(name.to_string())
                .or_default()
                .push(subtype.clone());
            tracing::debug!("Entity type {} orphaned by removal of {}", subtype, name);
        }
        Ok(Some(removed))
    }
}

/// Counts describing the content of a metadata store
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataStats {
    pub entity_types: usize,
    pub complex_types: usize,
    pub abstract_types: usize,
    pub resource_names: usize,
    pub pending_subtypes: usize,
    /// Declared (non-inherited) properties over all entity types
    pub declared_properties: usize,
}

impl MetadataStats {
    pub fn average_properties_per_entity_type(&self) -> f64 {
        if self.entity_types == 0 {
            0.0
        } else {
            self.declared_properties as f64 / self.entity_types as f64
        }
    }
}

/// Registry of every entity and complex type known to the application
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    types: Arc<RwLock<TypeTable>>,
    /// Resource name -> qualified entity type name
    resource_names: Arc<DashMap<String, String>>,
    /// Qualified entity type name -> default resource name
    default_resource_names: Arc<DashMap<String, String>>,
    constructors: ConstructorRegistry,
    config: MetadataConfig,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MetadataConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &MetadataConfig {
        &self.config
    }

    pub fn constructors(&self) -> &ConstructorRegistry {
        &self.constructors
    }

    fn read(&self) -> RwLockReadGuard<'_, TypeTable> {
        self.types.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> MetadataResult<RwLockWriteGuard<'_, TypeTable>> {
        self.types
            .write()
            .map_err(|_| MetadataError::lock("metadata type table"))
    }

    /// Register an entity type and resolve its base link
    ///
    /// When the base is not registered yet the link is resolved as soon as it
    /// is. Subtypes already waiting for this type are linked to it. A failed
    /// registration leaves the store as it was.
    pub fn add_entity_type(&self, entity_type: EntityType) -> MetadataResult<Arc<EntityType>> {
        let mut table = self.write()?;
        let mut staged = table.clone();
        let registered = staged.register(entity_type, self.config.duplicate_types)?;
        *table = staged;

        tracing::debug!("Registered entity type {}", registered.qualified_name());
        Ok(registered)
    }

    pub fn add_complex_type(&self, mut complex_type: ComplexType) -> MetadataResult<Arc<ComplexType>> {
        let name = complex_type.qualified_name();
        let mut table = self.write()?;

        let replacing = table.complex_types.contains_key(&name);
        if replacing && self.config.duplicate_types == DuplicateTypePolicy::Reject {
            return Err(MetadataError::duplicate_type(name));
        }

        complex_type.set_state(TypeState::Registered);
        let complex_type = Arc::new(complex_type);
        table.complex_types.insert(name.clone(), Arc::clone(&complex_type));
        if !replacing {
            table.complex_order.push(name.clone());
        }

        tracing::debug!("Registered complex type {}", name);
        Ok(complex_type)
    }

    /// Decode an entity type document and register the result
    ///
    /// The document's default resource name is recorded only once the type
    /// is registered.
    pub fn import_entity_type(&self, document: EntityTypeDocument) -> MetadataResult<Arc<EntityType>> {
        let (entity_type, default_resource_name) =
            EntityType::decode_document(document, self.config.naming_convention)?;
        let registered = self.add_entity_type(entity_type)?;
        if let Some(resource_name) = default_resource_name {
            self.register_resource_name(&resource_name, &registered, true)?;
        }
        Ok(registered)
    }

    pub fn get_entity_type(&self, qualified_name: &str) -> Option<Arc<EntityType>> {
        self.read().entity_types.get(qualified_name).cloned()
    }

    pub fn get_complex_type(&self, qualified_name: &str) -> Option<Arc<ComplexType>> {
        self.read().complex_types.get(qualified_name).cloned()
    }

    /// Entity types in registration order
    pub fn entity_types(&self) -> Vec<Arc<EntityType>> {
        let table = self.read();
        table
            .entity_order
            .iter()
            .filter_map(|name| table.entity_types.get(name).cloned())
            .collect()
    }

    /// Complex types in registration order
    pub fn complex_types(&self) -> Vec<Arc<ComplexType>> {
        let table = self.read();
        table
            .complex_order
            .iter()
            .filter_map(|name| table.complex_types.get(name).cloned())
            .collect()
    }

    pub fn entity_type_for_resource_name(&self, resource_name: &str) -> Option<Arc<EntityType>> {
        let type_name = self.resource_names.get(resource_name)?.value().clone();
        self.get_entity_type(&type_name)
    }

    /// Every resource name associated with a type, sorted
    pub fn resource_names_for(&self, qualified_name: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .resource_names
            .iter()
            .filter(|entry| entry.value() == qualified_name)
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Forget an entity type
    ///
    /// Its subtypes are kept: they lose their base link and inherited members
    /// and are relinked if a type with the same name is registered again.
    pub fn remove_entity_type(&self, qualified_name: &str) -> MetadataResult<Option<Arc<EntityType>>> {
        let removed = {
            let mut table = self.write()?;
            let mut staged = table.clone();
            let removed = staged.detach(qualified_name)?;
            *table = staged;
            removed
        };
        if removed.is_some() {
            self.resource_names
                .retain(|_, type_name| type_name.as_str() != qualified_name);
            self.default_resource_names.remove(qualified_name);
            tracing::debug!("Removed entity type {}", qualified_name);
        }
        Ok(removed)
    }

    /// Mark every registered type as finalized
    pub fn finalize(&self) -> MetadataResult<()> {
        let mut table = self.write()?;
        for entity_type in table.entity_types.values_mut() {
            Arc::make_mut(entity_type).set_state(TypeState::Finalized);
        }
        for complex_type in table.complex_types.values_mut() {
            Arc::make_mut(complex_type).set_state(TypeState::Finalized);
        }
        tracing::debug!(
            "Finalized {} entity types and {} complex types",
            table.entity_types.len(),
            table.complex_types.len()
        );
        Ok(())
    }

    /// Instantiate a registered entity type through its constructor
    pub fn create_entity(&self, qualified_name: &str) -> MetadataResult<Box<dyn Entity>> {
        let entity_type = self
            .get_entity_type(qualified_name)
            .ok_or_else(|| MetadataError::unknown_type(qualified_name))?;
        entity_type.create(&self.constructors)
    }

    pub fn stats(&self) -> MetadataStats {
        let table = self.read();
        MetadataStats {
            entity_types: table.entity_types.len(),
            complex_types: table.complex_types.len(),
            abstract_types: table
                .entity_types
                .values()
                .filter(|entity_type| entity_type.is_abstract())
                .count(),
            resource_names: self.resource_names.len(),
            pending_subtypes: table.pending.values().map(Vec::len).sum(),
            declared_properties: table
                .entity_types
                .values()
                .map(|entity_type| {
                    entity_type.data_properties().own().count()
                        + entity_type.navigation_properties().own().count()
                })
                .sum(),
        }
    }

    /// Load a whole metadata document
    ///
    /// Complex types are loaded first, then entity types in document order,
    /// then the extra resource names.
    pub fn import_metadata(&self, document: MetadataDocument) -> MetadataResult<ImportReport> {
        self.import_parts(
            document.metadata_version,
            document.complex_types.into_iter().map(Ok),
            document.entity_types.into_iter().map(Ok),
            document.resource_entity_type_map,
        )
    }

    /// Load a whole metadata document from JSON text
    pub fn import_json(&self, json: &str) -> MetadataResult<ImportReport> {
        let raw: RawMetadataDocument =
            serde_json::from_str(json).map_err(MetadataError::from_serde)?;
        self.import_parts(
            raw.metadata_version,
            raw.complex_types
                .into_iter()
                .map(|value| serde_json::from_value(value).map_err(MetadataError::from_serde)),
            raw.entity_types
                .into_iter()
                .map(|value| serde_json::from_value(value).map_err(MetadataError::from_serde)),
            raw.resource_entity_type_map,
        )
    }

    fn import_parts(
        &self,
        metadata_version: Option<String>,
        complex_types: impl IntoIterator<Item = MetadataResult<ComplexTypeDocument>>,
        entity_types: impl IntoIterator<Item = MetadataResult<EntityTypeDocument>>,
        resource_map: BTreeMap<String, String>,
    ) -> MetadataResult<ImportReport> {
        let mut report = ImportReport {
            metadata_version,
            ..ImportReport::default()
        };
        let convention = self.config.naming_convention;

        for (index, document) in complex_types.into_iter().enumerate() {
            let outcome = document
                .and_then(|document| ComplexType::from_document(document, convention))
                .and_then(|complex_type| self.add_complex_type(complex_type));
            match outcome {
                Ok(complex_type) => report.complex_types.push(complex_type.qualified_name()),
                Err(err) => self.skip_or_abort(&mut report, format!("complexTypes[{}]", index), err)?,
            }
        }

        for (index, document) in entity_types.into_iter().enumerate() {
            match document.and_then(|document| self.import_entity_type(document)) {
                Ok(entity_type) => report.entity_types.push(entity_type.qualified_name()),
                Err(err) => self.skip_or_abort(&mut report, format!("entityTypes[{}]", index), err)?,
            }
        }

        for (resource_name, type_name) in resource_map {
            match self.get_entity_type(&type_name) {
                Some(entity_type) => {
                    self.register_resource_name(&resource_name, &entity_type, false)?;
                    report.resource_names += 1;
                }
                None => self.skip_or_abort(
                    &mut report,
                    format!("resourceEntityTypeMap[{}]", resource_name),
                    MetadataError::unknown_type(type_name),
                )?,
            }
        }

        tracing::info!(
            "Imported metadata: {} entity types, {} complex types, {} resource names, {} skipped",
            report.entity_types.len(),
            report.complex_types.len(),
            report.resource_names,
            report.skipped.len()
        );
        Ok(report)
    }

    fn skip_or_abort(
        &self,
        report: &mut ImportReport,
        location: String,
        err: MetadataError,
    ) -> MetadataResult<()> {
        match self.config.on_type_error {
            TypeErrorPolicy::Abort => Err(err),
            TypeErrorPolicy::Skip => {
                tracing::warn!("Skipping {} during metadata import: {}", location, err);
                report.skipped.push(SkippedType {
                    location,
                    error: err.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Export every registered type
    pub fn export_metadata(&self) -> MetadataDocument {
        let resource_entity_type_map = self
            .resource_names
            .iter()
            .filter(|entry| {
                self.default_resource_names
                    .get(entry.value())
                    .map_or(true, |default| default.value() != entry.key())
            })
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        MetadataDocument {
            metadata_version: Some(self.config.metadata_version.clone()),
            entity_types: self
                .entity_types()
                .iter()
                .map(|entity_type| entity_type.to_document(self))
                .collect(),
            complex_types: self
                .complex_types()
                .iter()
                .map(|complex_type| complex_type.to_document(self.config.naming_convention))
                .collect(),
            resource_entity_type_map,
        }
    }

    pub fn export_json(&self) -> MetadataResult<String> {
        Ok(serde_json::to_string_pretty(&self.export_metadata())?)
    }
}

impl TypeRegistry for MetadataStore {
    fn default_resource_name(&self, entity_type: &EntityType) -> Option<String> {
        self.default_resource_names
            .get(&entity_type.qualified_name())
            .map(|entry| entry.value().clone())
    }

    fn register_resource_name(
        &self,
        resource_name: &str,
        entity_type: &EntityType,
        is_default: bool,
    ) -> MetadataResult<()> {
        let type_name = entity_type.qualified_name();
        tracing::debug!(
            "Registering resource name {} for {} (default: {})",
            resource_name,
            type_name,
            is_default
        );
        if is_default {
            self.default_resource_names
                .insert(type_name.clone(), resource_name.to_string());
        }
        self.resource_names
            .insert(resource_name.to_string(), type_name);
        Ok(())
    }

    fn lookup_entity_type(&self, qualified_name: &str) -> Option<Arc<EntityType>> {
        self.get_entity_type(qualified_name)
    }

    fn naming_convention(&self) -> NamingConvention {
        self.config.naming_convention
    }
}
