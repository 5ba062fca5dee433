//! Schema identifier codec
//!
//! Converts between textual schema identifiers and `(family, version)` pairs.
//!
//! An identifier is the family name alone for version 0, otherwise the family
//! followed by `_` and the decimal version:
//!
//! ```text
//! TestBasicVersioned      -> ("TestBasicVersioned", 0)
//! TestBasicVersioned_2    -> ("TestBasicVersioned", 2)
//! Foo_Bar_20              -> ("Foo_Bar", 20)
//! ```
//!
//! Parsing never fails. Whether a family or identifier is *allowed* is a
//! separate check built on round-tripping through [`make_schema_identifier`].

use crate::version::SchemaVersion;

/// Separator between a family name and its version suffix.
pub const VERSION_SEPARATOR: char = '_';

/// Split a trailing `_<digits>` suffix off `identifier`, if there is one that
/// fits in a [`SchemaVersion`].
fn split_version_suffix(identifier: &str) -> Option<(&str, SchemaVersion)> {
    let (family, digits) = identifier.rsplit_once(VERSION_SEPARATOR)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Overflowing suffixes are left on the family.
    let version = digits.parse::<SchemaVersion>().ok()?;
    Some((family, version))
}

/// Whether `identifier` ends in `_` followed by one or more ASCII digits.
fn has_digit_suffix(identifier: &str) -> bool {
    identifier
        .rsplit_once(VERSION_SEPARATOR)
        .is_some_and(|(_, digits)| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse the family and version out of a schema identifier.
///
/// Total over all strings. A suffix like `_01` or `_0` still parses (to 1 and
/// 0), and a suffix that is not all digits (`_22.5`, `_-1`) is not a suffix at
/// all, so the whole string is returned as the family at version 0.
pub fn parse_family_and_version(identifier: &str) -> (String, SchemaVersion) {
    match split_version_suffix(identifier) {
        Some((family, version)) => (family.to_string(), version),
        None => (identifier.to_string(), 0),
    }
}

/// Make the canonical identifier for a family and version.
pub fn make_schema_identifier(family: &str, version: SchemaVersion) -> String {
    if version == 0 {
        family.to_string()
    } else {
        format!("{}{}{}", family, VERSION_SEPARATOR, version)
    }
}

/// Whether `name` is a valid identifier: an ASCII letter or `_` followed by
/// ASCII alphanumerics or `_`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Separator between the components of a namespaced instance name.
pub const NAMESPACE_DELIMITER: char = ':';

/// Whether `instance` may name an instance of a multiple-apply API schema:
/// one or more valid identifiers joined by `:`.
pub fn is_allowed_instance_name(instance: &str) -> bool {
    !instance.is_empty() && instance.split(NAMESPACE_DELIMITER).all(is_valid_identifier)
}

/// Whether `family` may be used as a schema family.
///
/// The family must be a valid identifier and must not end in a version
/// suffix, since it would then read back as a versioned identifier of some
/// shorter family.
pub fn is_allowed_schema_family(family: &str) -> bool {
    is_valid_identifier(family) && !has_digit_suffix(family)
}

/// Whether `identifier` is an allowed schema identifier.
///
/// Its parsed family must be allowed and re-encoding the parsed pair must
/// reproduce `identifier` exactly.
pub fn is_allowed_schema_identifier(identifier: &str) -> bool {
    let (family, version) = parse_family_and_version(identifier);
    is_allowed_schema_family(&family) && make_schema_identifier(&family, version) == identifier
}
