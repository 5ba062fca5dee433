//! Error types for the schema registry

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema registry errors
///
/// Queries never produce these; they are raised while building the registry,
/// loading its inputs, or creating an object with an unusable type.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Ambiguous registration: identifier '{identifier}' is registered more than once")]
    DuplicateIdentifier { identifier: String },

    #[error("Ambiguous type-name index: type '{type_name}' is registered for both '{first}' and '{second}'")]
    DuplicateTypeName {
        type_name: String,
        first: String,
        second: String,
    },

    #[error("Schema not found: {0}")]
    UnknownSchema(String),

    #[error("Schema '{identifier}' is not a concrete typed schema")]
    NotConcreteTyped { identifier: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

/// Reason an API schema cannot be applied to an object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyRejection {
    #[error("no registered schema matches {0}")]
    UnknownSchema(String),

    #[error("'{identifier}' is not an API schema")]
    NotApiSchema { identifier: String },

    #[error("multiple-apply API schema '{identifier}' requires an instance name")]
    MissingInstanceName { identifier: String },

    #[error("single-apply API schema '{identifier}' does not take an instance name (got '{instance}')")]
    UnexpectedInstanceName { identifier: String, instance: String },

    #[error("'{instance}' is not a valid instance name")]
    InvalidInstanceName { instance: String },

    #[error("instance name '{instance}' is not allowed for '{identifier}'")]
    DisallowedInstanceName { identifier: String, instance: String },

    #[error("'{identifier}' can only be applied to [{allowed}], not '{object_type}'")]
    IncompatibleType {
        identifier: String,
        object_type: String,
        allowed: String,
    },
}
