//! Object name validation.
//!
//! Object names are single path components of the on-disk hierarchy, so they
//! must be non-empty and must not contain the path separator.

use crate::error::{TypeError, TypeResult};

/// Separator between components of an object path.
pub const PATH_SEPARATOR: char = '/';

/// Validate an object name, returning `Ok(())` if it is usable.
///
/// # Examples
///
/// ```
/// use hdm_types::validate_name;
///
/// assert!(validate_name("acquisition").is_ok());
/// assert!(validate_name("a/b").is_err());
/// ```
pub fn validate_name(name: &str) -> TypeResult<()> {
    if name.is_empty() {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty".into(),
        });
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: format!("name cannot contain '{PATH_SEPARATOR}'"),
        });
    }
    Ok(())
}
