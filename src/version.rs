//! Schema versioning utilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Revision number of a schema within its family. Version 0 is the original,
/// unsuffixed schema.
pub type SchemaVersion = u32;

/// Filter selecting versions of a family relative to a reference version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionPolicy {
    /// Every version; the reference version is ignored
    #[default]
    All,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl VersionPolicy {
    pub const VARIANTS: [VersionPolicy; 5] = [
        VersionPolicy::All,
        VersionPolicy::GreaterThan,
        VersionPolicy::GreaterThanOrEqual,
        VersionPolicy::LessThan,
        VersionPolicy::LessThanOrEqual,
    ];

    /// Whether `candidate` passes this filter against `reference`
    pub fn admits(self, candidate: SchemaVersion, reference: SchemaVersion) -> bool {
        match self {
            VersionPolicy::All => true,
            VersionPolicy::GreaterThan => candidate > reference,
            VersionPolicy::GreaterThanOrEqual => candidate >= reference,
            VersionPolicy::LessThan => candidate < reference,
            VersionPolicy::LessThanOrEqual => candidate <= reference,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VersionPolicy::All => "all",
            VersionPolicy::GreaterThan => "greater-than",
            VersionPolicy::GreaterThanOrEqual => "greater-than-or-equal",
            VersionPolicy::LessThan => "less-than",
            VersionPolicy::LessThanOrEqual => "less-than-or-equal",
        }
    }
}

impl fmt::Display for VersionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(VersionPolicy::All),
            "greater-than" | "gt" => Ok(VersionPolicy::GreaterThan),
            "greater-than-or-equal" | "ge" => Ok(VersionPolicy::GreaterThanOrEqual),
            "less-than" | "lt" => Ok(VersionPolicy::LessThan),
            "less-than-or-equal" | "le" => Ok(VersionPolicy::LessThanOrEqual),
            other => Err(format!("unknown version policy '{}'", other)),
        }
    }
}
