//! Versioned Schema Registry
//!
//! A registry of typed and API schema descriptors that carry a version in
//! their identifier, plus the per-object queries built on top of it.
//!
//! ## Features
//!
//! - **Identifier Codec**: `Foo_2` <-> `("Foo", 2)`, with allowed-ness checks
//! - **Descriptor Table**: built once, looked up by handle, identifier, or family and version
//! - **Version Queries**: all versions of a family filtered by a [`VersionPolicy`]
//! - **Applied API Schemas**: `is_a` / `has_api` / `can_apply_api` / `apply_api` / `remove_api`
//!   on a [`SchemaObject`], with several instances of a multiple-apply schema at
//!   different versions side by side
//!
//! ## Example
//!
//! ```text
//! TestBasicVersioned      concreteTyped     v0
//! TestBasicVersioned_1    concreteTyped     v1
//! TestBasicVersioned_2    concreteTyped     v2
//!
//! object typed TestBasicVersioned_1
//!   is_a("TestBasicVersioned_1")        -> true
//!   is_a(("TestBasicVersioned", 2))     -> false
//! ```

pub mod config;
pub mod error;
pub mod identifier;
pub mod object;
pub mod registry;
pub mod schema;
pub mod version;

pub use config::{OutputFormat, RegistryConfig};
pub use error::{ApplyRejection, Result, SchemaError};
pub use identifier::{
    is_allowed_instance_name, is_allowed_schema_family, is_allowed_schema_identifier,
    is_valid_identifier, make_schema_identifier, parse_family_and_version,
};
pub use object::{AppliedEntry, SchemaObject, SchemaRef};
pub use registry::{RegistryManifest, SchemaRegistry, SchemaRegistryBuilder};
pub use schema::{AppliesTo, SchemaHandle, SchemaInfo, SchemaKind, SchemaRecord};
pub use version::{SchemaVersion, VersionPolicy};
