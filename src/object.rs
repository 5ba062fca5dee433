//! Schema-typed objects and their applied API schemas
//!
//! A [`SchemaObject`] has one fixed concrete type, chosen at creation, and a
//! mutable set of applied API schemas. Every query and mutation takes the
//! schema in any of the three addressing forms of [`SchemaRef`]; all forms
//! naming the same registered schema give the same answer, and a form that
//! does not resolve gives a negative answer rather than an error.
//!
//! Versions match exactly. An object typed with `Foo_1` is not a `Foo` or a
//! `Foo_2`, and applying `FooAPI_1` does not make the object have `FooAPI`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApplyRejection, Result, SchemaError};
use crate::identifier::{is_allowed_instance_name, NAMESPACE_DELIMITER};
use crate::registry::SchemaRegistry;
use crate::schema::{SchemaHandle, SchemaInfo, SchemaKind};
use crate::version::SchemaVersion;

/// One of the three ways to name a registered schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaRef<'a> {
    Handle(SchemaHandle),
    Identifier(&'a str),
    FamilyVersion(&'a str, SchemaVersion),
}

impl SchemaRef<'_> {
    /// Resolve to the registered descriptor, if any.
    pub fn resolve<'r>(self, registry: &'r SchemaRegistry) -> Option<&'r SchemaInfo> {
        match self {
            SchemaRef::Handle(handle) => registry.find_by_handle(handle),
            SchemaRef::Identifier(identifier) => registry.find_by_identifier(identifier),
            SchemaRef::FamilyVersion(family, version) => registry.find_by_family_version(family, version),
        }
    }
}

impl From<SchemaHandle> for SchemaRef<'_> {
    fn from(handle: SchemaHandle) -> Self {
        SchemaRef::Handle(handle)
    }
}

impl<'a> From<&'a str> for SchemaRef<'a> {
    fn from(identifier: &'a str) -> Self {
        SchemaRef::Identifier(identifier)
    }
}

impl<'a> From<&'a String> for SchemaRef<'a> {
    fn from(identifier: &'a String) -> Self {
        SchemaRef::Identifier(identifier)
    }
}

impl<'a> From<(&'a str, SchemaVersion)> for SchemaRef<'a> {
    fn from((family, version): (&'a str, SchemaVersion)) -> Self {
        SchemaRef::FamilyVersion(family, version)
    }
}

impl<'a> From<&'a SchemaInfo> for SchemaRef<'a> {
    fn from(info: &'a SchemaInfo) -> Self {
        SchemaRef::Handle(info.handle)
    }
}

impl fmt::Display for SchemaRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaRef::Handle(handle) => write!(f, "handle {}", handle),
            SchemaRef::Identifier(identifier) => write!(f, "identifier '{}'", identifier),
            SchemaRef::FamilyVersion(family, version) => {
                write!(f, "family '{}' version {}", family, version)
            }
        }
    }
}

/// An API schema applied to an object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppliedEntry {
    /// Identifier the schema was registered under
    pub identifier: String,
    pub family: String,
    pub version: SchemaVersion,
    /// Present only for multiple-apply schemas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl AppliedEntry {
    /// `identifier` or `identifier:instance`
    pub fn token(&self) -> String {
        match &self.instance {
            Some(instance) => format!("{}{}{}", self.identifier, NAMESPACE_DELIMITER, instance),
            None => self.identifier.clone(),
        }
    }

    fn is_schema(&self, info: &SchemaInfo) -> bool {
        self.version == info.version && self.family == info.family
    }
}

impl fmt::Display for AppliedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

/// Treat an empty instance name as no instance name.
fn instance_name(instance: Option<&str>) -> Option<&str> {
    instance.filter(|name| !name.is_empty())
}

/// An object with a fixed concrete schema type and applied API schemas
#[derive(Debug, Clone)]
pub struct SchemaObject {
    registry: Arc<SchemaRegistry>,
    type_info: SchemaInfo,
    applied: Vec<AppliedEntry>,
}

impl SchemaObject {
    /// Create an object typed with the given concrete schema.
    pub fn new<'a>(registry: Arc<SchemaRegistry>, type_schema: impl Into<SchemaRef<'a>>) -> Result<Self> {
        let type_schema = type_schema.into();
        let type_info = type_schema
            .resolve(&registry)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownSchema(type_schema.to_string()))?;

        if type_info.kind != SchemaKind::ConcreteTyped {
            return Err(SchemaError::NotConcreteTyped {
                identifier: type_info.identifier,
            });
        }

        Ok(Self {
            registry,
            type_info,
            applied: Vec::new(),
        })
    }

    /// The fixed concrete type of this object
    pub fn type_info(&self) -> &SchemaInfo {
        &self.type_info
    }

    /// Applied API schemas in application order
    pub fn applied_entries(&self) -> &[AppliedEntry] {
        &self.applied
    }

    /// Applied API schemas as `identifier` / `identifier:instance` tokens
    pub fn applied_schemas(&self) -> Vec<String> {
        self.applied.iter().map(AppliedEntry::token).collect()
    }

    fn resolve<'a>(&self, schema: impl Into<SchemaRef<'a>>) -> Option<&SchemaInfo> {
        schema.into().resolve(&self.registry)
    }

    /// Whether this object's type is exactly the given schema, version included.
    pub fn is_a<'a>(&self, schema: impl Into<SchemaRef<'a>>) -> bool {
        self.resolve(schema)
            .is_some_and(|info| info.same_schema_as(&self.type_info))
    }

    /// Whether the given API schema is applied.
    ///
    /// For a multiple-apply schema without an instance name this asks whether
    /// any instance of that exact version is applied.
    pub fn has_api<'a>(&self, schema: impl Into<SchemaRef<'a>>, instance: Option<&str>) -> bool {
        let Some(info) = self.resolve(schema) else {
            return false;
        };
        let instance = instance_name(instance);

        match info.kind {
            SchemaKind::ConcreteTyped => false,
            SchemaKind::SingleApplyApi => {
                instance.is_none()
                    && self
                        .applied
                        .iter()
                        .any(|entry| entry.is_schema(info) && entry.instance.is_none())
            }
            SchemaKind::MultipleApplyApi => self.applied.iter().any(|entry| {
                entry.is_schema(info)
                    && match instance {
                        Some(name) => entry.instance.as_deref() == Some(name),
                        None => entry.instance.is_some(),
                    }
            }),
        }
    }

    /// Whether the API schema's applies-to rule permits it on this object.
    ///
    /// Does not look at what is already applied and does not gate
    /// [`apply_api`](Self::apply_api).
    pub fn can_apply_api<'a>(&self, schema: impl Into<SchemaRef<'a>>, instance: Option<&str>) -> bool {
        self.check_can_apply_api(schema, instance).is_ok()
    }

    /// Like [`can_apply_api`](Self::can_apply_api), explaining a refusal.
    pub fn check_can_apply_api<'a>(
        &self,
        schema: impl Into<SchemaRef<'a>>,
        instance: Option<&str>,
    ) -> std::result::Result<(), ApplyRejection> {
        let schema = schema.into();
        let info = schema
            .resolve(&self.registry)
            .ok_or_else(|| ApplyRejection::UnknownSchema(schema.to_string()))?;
        let instance = instance_name(instance);

        match (info.kind, instance) {
            (SchemaKind::ConcreteTyped, _) => {
                return Err(ApplyRejection::NotApiSchema {
                    identifier: info.identifier.clone(),
                });
            }
            (SchemaKind::SingleApplyApi, Some(name)) => {
                return Err(ApplyRejection::UnexpectedInstanceName {
                    identifier: info.identifier.clone(),
                    instance: name.to_string(),
                });
            }
            (SchemaKind::MultipleApplyApi, None) => {
                return Err(ApplyRejection::MissingInstanceName {
                    identifier: info.identifier.clone(),
                });
            }
            (SchemaKind::MultipleApplyApi, Some(name)) if !is_allowed_instance_name(name) => {
                return Err(ApplyRejection::InvalidInstanceName {
                    instance: name.to_string(),
                });
            }
            _ => {}
        }

        let Some(rule) = &info.applies_to else {
            return Ok(());
        };

        if let Some(name) = instance {
            if !rule.admits_instance(name) {
                return Err(ApplyRejection::DisallowedInstanceName {
                    identifier: info.identifier.clone(),
                    instance: name.to_string(),
                });
            }
        }

        if !rule.admits_type(&self.type_info.family, self.type_info.version) {
            return Err(ApplyRejection::IncompatibleType {
                identifier: info.identifier.clone(),
                object_type: self.type_info.identifier.clone(),
                allowed: rule.can_only_apply_to.join(", "),
            });
        }

        Ok(())
    }

    /// Apply an API schema. Re-applying an applied schema is a successful no-op.
    ///
    /// Returns false when the schema does not resolve to an API schema or the
    /// instance name does not fit its kind.
    pub fn apply_api<'a>(&mut self, schema: impl Into<SchemaRef<'a>>, instance: Option<&str>) -> bool {
        let Some(entry) = self.entry_for(schema.into(), instance, "apply") else {
            return false;
        };

        if !self.applied.contains(&entry) {
            debug!(object_type = %self.type_info.identifier, api = %entry, "Applied API schema");
            self.applied.push(entry);
        }
        true
    }

    /// Remove an API schema. Removing a schema that is not applied is a
    /// successful no-op.
    pub fn remove_api<'a>(&mut self, schema: impl Into<SchemaRef<'a>>, instance: Option<&str>) -> bool {
        let Some(entry) = self.entry_for(schema.into(), instance, "remove") else {
            return false;
        };

        if let Some(position) = self.applied.iter().position(|applied| *applied == entry) {
            debug!(object_type = %self.type_info.identifier, api = %entry, "Removed API schema");
            self.applied.remove(position);
        }
        true
    }

    fn entry_for(&self, schema: SchemaRef<'_>, instance: Option<&str>, action: &str) -> Option<AppliedEntry> {
        let Some(info) = schema.resolve(&self.registry) else {
            warn!(%schema, "Cannot {} unknown API schema", action);
            return None;
        };

        let instance = match (info.kind, instance_name(instance)) {
            (SchemaKind::SingleApplyApi, None) => None,
            (SchemaKind::MultipleApplyApi, Some(name)) => Some(name.to_string()),
            (SchemaKind::ConcreteTyped, _) => {
                warn!(identifier = %info.identifier, "Cannot {} concrete typed schema as an API schema", action);
                return None;
            }
            (SchemaKind::SingleApplyApi, Some(name)) => {
                warn!(identifier = %info.identifier, instance = name, "Cannot {} single-apply API schema with an instance name", action);
                return None;
            }
            (SchemaKind::MultipleApplyApi, None) => {
                warn!(identifier = %info.identifier, "Cannot {} multiple-apply API schema without an instance name", action);
                return None;
            }
        };

        Some(AppliedEntry {
            identifier: info.identifier.clone(),
            family: info.family.clone(),
            version: info.version,
            instance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AppliesTo, SchemaRecord};

    fn registry() -> Arc<SchemaRegistry> {
        let records = vec![
            SchemaRecord::new("Mesh", "Mesh", SchemaKind::ConcreteTyped),
            SchemaRecord::new("Mesh1", "Mesh_1", SchemaKind::ConcreteTyped),
            SchemaRecord::new("Xform", "Xform", SchemaKind::ConcreteTyped),
            SchemaRecord::new("BindingAPI", "BindingAPI", SchemaKind::SingleApplyApi)
                .with_applies_to(AppliesTo::only(["Mesh"])),
            SchemaRecord::new("BindingAPI1", "BindingAPI_1", SchemaKind::SingleApplyApi),
            SchemaRecord::new("CollectionAPI", "CollectionAPI", SchemaKind::MultipleApplyApi)
                .with_applies_to(AppliesTo::default().with_instance_names(["lights", "shadows"])),
        ];
        Arc::new(SchemaRegistry::build(records).unwrap())
    }

    #[test]
    fn test_new_requires_concrete_type() {
        let registry = registry();
        assert!(SchemaObject::new(registry.clone(), "Mesh").is_ok());
        assert!(matches!(
            SchemaObject::new(registry.clone(), "BindingAPI"),
            Err(SchemaError::NotConcreteTyped { .. })
        ));
        assert!(matches!(
            SchemaObject::new(registry, ("Mesh", 7)),
            Err(SchemaError::UnknownSchema(_))
        ));
    }

    #[test]
    fn test_is_a_exact_version() {
        let object = SchemaObject::new(registry(), ("Mesh", 1)).unwrap();
        assert!(object.is_a("Mesh_1"));
        assert!(!object.is_a("Mesh"));
        assert!(!object.is_a("Xform"));
        assert!(!object.is_a("Unregistered"));
        assert_eq!(object.type_info().identifier, "Mesh_1");
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut object = SchemaObject::new(registry(), "Xform").unwrap();
        assert!(object.apply_api("BindingAPI", None));
        assert!(object.apply_api(("BindingAPI", 0), None));
        assert_eq!(object.applied_schemas(), vec!["BindingAPI"]);
        assert!(object.has_api("BindingAPI", None));
        assert!(!object.has_api("BindingAPI_1", None));
    }

    #[test]
    fn test_remove_absent_is_success() {
        let mut object = SchemaObject::new(registry(), "Xform").unwrap();
        assert!(object.remove_api("BindingAPI_1", None));
        assert!(object.applied_entries().is_empty());
    }

    #[test]
    fn test_kind_mismatched_instance_names() {
        let mut object = SchemaObject::new(registry(), "Mesh").unwrap();
        assert!(!object.apply_api("BindingAPI", Some("lights")));
        assert!(!object.apply_api("CollectionAPI", None));
        assert!(!object.apply_api("CollectionAPI", Some("")));
        assert!(!object.apply_api("Mesh", None));
        assert!(!object.apply_api("Unregistered", None));
        assert!(object.applied_entries().is_empty());

        assert!(object.apply_api("BindingAPI", Some("")));
        assert!(!object.has_api("BindingAPI", Some("lights")));
        assert!(object.has_api("BindingAPI", Some("")));
    }

    #[test]
    fn test_applied_tokens_keep_order() {
        let mut object = SchemaObject::new(registry(), "Mesh").unwrap();
        object.apply_api("CollectionAPI", Some("shadows"));
        object.apply_api("BindingAPI_1", None);
        object.apply_api("CollectionAPI", Some("lights"));
        assert_eq!(
            object.applied_schemas(),
            vec!["CollectionAPI:shadows", "BindingAPI_1", "CollectionAPI:lights"]
        );

        object.remove_api("CollectionAPI", Some("shadows"));
        assert_eq!(object.applied_schemas(), vec!["BindingAPI_1", "CollectionAPI:lights"]);
    }

    #[test]
    fn test_applied_tokens_use_registered_identifier() {
        let registry = Arc::new(
            SchemaRegistry::build(vec![
                SchemaRecord::new("Mesh", "Mesh", SchemaKind::ConcreteTyped),
                SchemaRecord::new("PaddedAPI", "PaddedAPI_0", SchemaKind::SingleApplyApi),
            ])
            .unwrap(),
        );
        let mut object = SchemaObject::new(registry.clone(), "Mesh").unwrap();
        assert!(object.apply_api("PaddedAPI_0", None));

        let tokens = object.applied_schemas();
        assert_eq!(tokens, vec!["PaddedAPI_0"]);
        assert!(registry.find_by_identifier(&tokens[0]).is_some());
        assert!(object.has_api(("PaddedAPI", 0), None));
    }

    #[test]
    fn test_check_can_apply_reasons() {
        let registry = registry();
        let mesh = SchemaObject::new(registry.clone(), "Mesh").unwrap();
        let xform = SchemaObject::new(registry, "Xform").unwrap();

        assert_eq!(mesh.check_can_apply_api("BindingAPI", None), Ok(()));
        assert!(matches!(
            xform.check_can_apply_api("BindingAPI", None),
            Err(ApplyRejection::IncompatibleType { ref allowed, .. }) if allowed == "Mesh"
        ));
        assert!(matches!(
            mesh.check_can_apply_api("Missing", None),
            Err(ApplyRejection::UnknownSchema(_))
        ));
        assert!(matches!(
            mesh.check_can_apply_api("Xform", None),
            Err(ApplyRejection::NotApiSchema { .. })
        ));
        assert!(matches!(
            mesh.check_can_apply_api("BindingAPI", Some("lights")),
            Err(ApplyRejection::UnexpectedInstanceName { .. })
        ));
        assert!(matches!(
            mesh.check_can_apply_api("CollectionAPI", None),
            Err(ApplyRejection::MissingInstanceName { .. })
        ));
        assert!(matches!(
            mesh.check_can_apply_api("CollectionAPI", Some("bad name")),
            Err(ApplyRejection::InvalidInstanceName { .. })
        ));
        assert!(matches!(
            mesh.check_can_apply_api("CollectionAPI", Some("fog")),
            Err(ApplyRejection::DisallowedInstanceName { .. })
        ));
        assert!(mesh.can_apply_api("CollectionAPI", Some("lights")));
        assert!(xform.can_apply_api("BindingAPI_1", None));
    }

    #[test]
    fn test_can_apply_does_not_gate_apply() {
        let mut xform = SchemaObject::new(registry(), "Xform").unwrap();
        assert!(!xform.can_apply_api("BindingAPI", None));
        assert!(xform.apply_api("BindingAPI", None));
        assert!(xform.has_api("BindingAPI", None));
        assert!(!xform.can_apply_api("BindingAPI", None));
    }

    #[test]
    fn test_schema_ref_conversions() {
        let registry = registry();
        let info = registry.find_by_identifier("Mesh_1").unwrap();
        let forms: [SchemaRef<'_>; 4] = [
            info.handle.into(),
            "Mesh_1".into(),
            ("Mesh", 1).into(),
            info.into(),
        ];
        for form in forms {
            assert_eq!(form.resolve(&registry), Some(info));
        }
        assert_eq!(SchemaRef::from(("Mesh_1", 0)).resolve(&registry), None);
    }
}
