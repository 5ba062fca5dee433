//! Schema Registry
//!
//! Immutable descriptor table built once from externally supplied schema
//! records. Every lookup is total: a miss is `None` or an empty list.
//!
//! A registered schema can be found three ways, all resolving to the same
//! [`SchemaInfo`]:
//!
//! - by handle, as assigned at build time
//! - by identifier, e.g. `TestBasicVersioned_1`
//! - by family and version, e.g. `("TestBasicVersioned", 1)`
//!
//! Family lookups match the family key literally. Passing a versioned
//! identifier such as `TestBasicVersioned_1` as a family finds nothing unless a
//! schema was actually registered under that family.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SchemaError};
use crate::identifier::{is_allowed_schema_identifier, make_schema_identifier};
use crate::schema::{SchemaHandle, SchemaInfo, SchemaKind, SchemaRecord};
use crate::version::{SchemaVersion, VersionPolicy};

/// On-disk list of schema records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryManifest {
    #[serde(default)]
    pub schemas: Vec<SchemaRecord>,
}

/// Collects schema records before the registry is frozen
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    records: Vec<SchemaRecord>,
}

impl SchemaRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, record: SchemaRecord) -> &mut Self {
        self.records.push(record);
        self
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = SchemaRecord>) -> &mut Self {
        self.records.extend(records);
        self
    }

    /// Freeze the collected records into a registry.
    ///
    /// Fails if two records share an identifier (exactly, or once parsed and
    /// re-encoded). Also fails if two records share a type name, since the
    /// type-name index maps each name to one schema.
    pub fn build(self) -> Result<SchemaRegistry> {
        let mut schemas: Vec<SchemaInfo> = Vec::with_capacity(self.records.len());
        let mut by_identifier = HashMap::with_capacity(self.records.len());
        let mut by_canonical: HashMap<String, usize> = HashMap::with_capacity(self.records.len());
        let mut by_type_name: HashMap<String, usize> = HashMap::with_capacity(self.records.len());

        for mut record in self.records {
            let index = schemas.len();

            if !is_allowed_schema_identifier(&record.identifier) {
                warn!(identifier = %record.identifier, "Registering schema with an identifier that is not allowed");
            }
            if record.kind == SchemaKind::ConcreteTyped && record.applies_to.take().is_some() {
                warn!(identifier = %record.identifier, "Ignoring applies-to rule on concrete typed schema");
            }

            let handle = SchemaHandle(index as u32);
            let info = SchemaInfo::from_record(handle, record);
            let canonical = make_schema_identifier(&info.family, info.version);

            if by_identifier.contains_key(&info.identifier) || by_canonical.contains_key(&canonical) {
                return Err(SchemaError::DuplicateIdentifier { identifier: canonical });
            }
            if let Some(&existing) = by_type_name.get(&info.type_name) {
                return Err(SchemaError::DuplicateTypeName {
                    type_name: info.type_name,
                    first: schemas[existing].identifier.clone(),
                    second: info.identifier,
                });
            }

            by_identifier.insert(info.identifier.clone(), index);
            by_canonical.insert(canonical, index);
            by_type_name.insert(info.type_name.clone(), index);
            schemas.push(info);
        }

        let mut by_family: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, info) in schemas.iter().enumerate() {
            by_family.entry(info.family.clone()).or_default().push(index);
        }
        for indices in by_family.values_mut() {
            indices.sort_by(|a, b| schemas[*b].version.cmp(&schemas[*a].version));
        }

        debug!(
            schemas = schemas.len(),
            families = by_family.len(),
            "Built schema registry"
        );

        Ok(SchemaRegistry {
            schemas,
            by_identifier,
            by_type_name,
            by_family,
        })
    }
}

/// The schema descriptor table
#[derive(Debug)]
pub struct SchemaRegistry {
    /// Descriptors in registration order; a handle is an index into this list
    schemas: Vec<SchemaInfo>,
    by_identifier: HashMap<String, usize>,
    by_type_name: HashMap<String, usize>,
    /// Family key to descriptor indices, highest version first
    by_family: BTreeMap<String, Vec<usize>>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    /// Build a registry from a list of records
    pub fn build(records: impl IntoIterator<Item = SchemaRecord>) -> Result<Self> {
        let mut builder = SchemaRegistryBuilder::new();
        builder.extend(records);
        builder.build()
    }

    /// Build a registry from a JSON manifest
    pub fn from_manifest_json(content: &str) -> Result<Self> {
        let manifest: RegistryManifest = serde_json::from_str(content)?;
        Self::build(manifest.schemas)
    }

    /// Load a registry from a JSON manifest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading schema manifest");
        let content = fs::read_to_string(path)?;
        Self::from_manifest_json(&content)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// All descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &SchemaInfo> {
        self.schemas.iter()
    }

    /// Registered family keys, sorted
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.by_family.keys().map(String::as_str)
    }

    pub fn find_by_identifier(&self, identifier: &str) -> Option<&SchemaInfo> {
        self.by_identifier.get(identifier).map(|&i| &self.schemas[i])
    }

    pub fn find_by_handle(&self, handle: SchemaHandle) -> Option<&SchemaInfo> {
        self.schemas.get(handle.0 as usize)
    }

    pub fn find_by_type_name(&self, type_name: &str) -> Option<&SchemaInfo> {
        self.by_type_name.get(type_name).map(|&i| &self.schemas[i])
    }

    /// Handle for the schema describing the named host type
    pub fn find_handle_by_type_name(&self, type_name: &str) -> Option<SchemaHandle> {
        self.find_by_type_name(type_name).map(|info| info.handle)
    }

    /// Find the schema registered with exactly this family and version.
    pub fn find_by_family_version(&self, family: &str, version: SchemaVersion) -> Option<&SchemaInfo> {
        self.family_infos(family).find(|info| info.version == version)
    }

    /// All versions registered under `family`, highest version first.
    pub fn find_family_versions(&self, family: &str) -> Vec<&SchemaInfo> {
        self.family_members(family).collect()
    }

    /// Versions of `family` selected by `policy` relative to `version`,
    /// highest version first.
    pub fn find_schema_infos_in_family(
        &self,
        family: &str,
        version: SchemaVersion,
        policy: VersionPolicy,
    ) -> Vec<&SchemaInfo> {
        self.family_members(family)
            .filter(|info| policy.admits(info.version, version))
            .collect()
    }

    /// Family listing, empty when `family` is itself a registered identifier
    /// of a non-zero version
    fn family_members<'a>(&'a self, family: &str) -> impl Iterator<Item = &'a SchemaInfo> + 'a {
        let versioned = self
            .find_by_identifier(family)
            .is_some_and(|info| info.version != 0);
        self.family_infos(family).filter(move |_| !versioned)
    }

    fn family_infos<'a>(&'a self, family: &str) -> impl Iterator<Item = &'a SchemaInfo> + 'a {
        self.by_family
            .get(family)
            .into_iter()
            .flatten()
            .map(move |&i| &self.schemas[i])
    }
}
