//! Schema types and structures

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifier::parse_family_and_version;
use crate::version::SchemaVersion;

/// Lightweight handle for a registered schema type.
///
/// Handles are assigned by the registry in registration order and are only
/// meaningful for the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaHandle(pub u32);

impl fmt::Display for SchemaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaKind {
    /// Fixed type of an object
    #[serde(rename = "concreteTyped")]
    ConcreteTyped,
    /// API schema applied at most once per object
    #[serde(rename = "singleApplyAPI")]
    SingleApplyApi,
    /// API schema applied once per instance name
    #[serde(rename = "multipleApplyAPI")]
    MultipleApplyApi,
}

/// Static compatibility rule for an API schema, consulted only when asking
/// whether the schema can be applied to an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliesTo {
    /// Identifiers of the concrete schemas this API may be applied to. Empty
    /// means any concrete schema.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub can_only_apply_to: Vec<String>,
    /// Instance names a multiple-apply API accepts. Empty means any allowed name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_instance_names: Vec<String>,
}

impl AppliesTo {
    pub fn only(identifiers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            can_only_apply_to: identifiers.into_iter().map(Into::into).collect(),
            allowed_instance_names: Vec::new(),
        }
    }

    pub fn with_instance_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_instance_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a concrete schema of this family and version is admitted.
    pub fn admits_type(&self, family: &str, version: SchemaVersion) -> bool {
        self.can_only_apply_to.is_empty()
            || self.can_only_apply_to.iter().any(|id| {
                let (allowed_family, allowed_version) = parse_family_and_version(id);
                allowed_version == version && allowed_family == family
            })
    }

    pub fn admits_instance(&self, instance: &str) -> bool {
        self.allowed_instance_names.is_empty()
            || self.allowed_instance_names.iter().any(|name| name == instance)
    }
}

/// A schema descriptor as supplied by the external loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRecord {
    /// Name of the host type this schema describes
    pub type_name: String,
    /// Canonical identifier (family plus version suffix)
    pub identifier: String,
    pub kind: SchemaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<AppliesTo>,
}

impl SchemaRecord {
    pub fn new(type_name: impl Into<String>, identifier: impl Into<String>, kind: SchemaKind) -> Self {
        Self {
            type_name: type_name.into(),
            identifier: identifier.into(),
            kind,
            applies_to: None,
        }
    }

    pub fn with_applies_to(mut self, applies_to: AppliesTo) -> Self {
        self.applies_to = Some(applies_to);
        self
    }
}

/// Registered schema descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    pub handle: SchemaHandle,
    pub type_name: String,
    pub identifier: String,
    pub kind: SchemaKind,
    pub family: String,
    pub version: SchemaVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<AppliesTo>,
}

impl SchemaInfo {
    pub(crate) fn from_record(handle: SchemaHandle, record: SchemaRecord) -> Self {
        let (family, version) = parse_family_and_version(&record.identifier);
        Self {
            handle,
            type_name: record.type_name,
            identifier: record.identifier,
            kind: record.kind,
            family,
            version,
            applies_to: record.applies_to,
        }
    }

    /// Whether this descriptor names the same family and version as `other`.
    pub fn same_schema_as(&self, other: &SchemaInfo) -> bool {
        self.version == other.version && self.family == other.family
    }
}
