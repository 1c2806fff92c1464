//! Schema error types.
//!
//! Parse and conflict errors surface immediately from the builder entry
//! points; resolution problems discovered during validation become warnings
//! on the built schema instead (the offending element is dropped).

use thiserror::Error;

/// Error raised by schema parsing, registration and lookup operations.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A textual schema element definition could not be parsed.
    #[error("invalid schema element definition \"{definition}\": {message}")]
    InvalidDefinition { definition: String, message: String },

    /// A new element shares its identity key with an existing element and
    /// overwriting was not requested.
    #[error("{kind} {name} conflicts with {existing}: both use the key {key}")]
    ConflictingElement {
        kind: &'static str,
        name: String,
        existing: String,
        key: String,
    },

    /// A strict-mode lookup did not find the requested element.
    #[error("{kind} {name} is not defined in the schema")]
    UnknownElement { kind: &'static str, name: String },

    /// A name matched more than one element of the same kind.
    #[error("{kind} name {name} is ambiguous: it refers to more than one element")]
    AmbiguousName { kind: &'static str, name: String },

    /// An entry could not be obtained from an [`EntryResolver`].
    ///
    /// [`EntryResolver`]: crate::policy::EntryResolver
    #[error("entry {dn} could not be resolved: {message}")]
    EntryResolution { dn: String, message: String },
}

impl SchemaError {
    /// Create an invalid definition error.
    pub fn invalid_definition(
        definition: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SchemaError::InvalidDefinition {
            definition: definition.into(),
            message: message.into(),
        }
    }

    /// Create a conflicting element error.
    pub fn conflicting_element(
        kind: &'static str,
        name: impl Into<String>,
        existing: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        SchemaError::ConflictingElement {
            kind,
            name: name.into(),
            existing: existing.into(),
            key: key.into(),
        }
    }

    /// Create an unknown element error.
    pub fn unknown_element(kind: &'static str, name: impl Into<String>) -> Self {
        SchemaError::UnknownElement {
            kind,
            name: name.into(),
        }
    }

    /// Create an ambiguous name error.
    pub fn ambiguous_name(kind: &'static str, name: impl Into<String>) -> Self {
        SchemaError::AmbiguousName {
            kind,
            name: name.into(),
        }
    }

    /// Create an entry resolution error.
    pub fn entry_resolution(dn: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::EntryResolution {
            dn: dn.into(),
            message: message.into(),
        }
    }
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::unknown_element("attribute type", "undefinedAttr");
        assert_eq!(
            err.to_string(),
            "attribute type undefinedAttr is not defined in the schema"
        );

        let err = SchemaError::conflicting_element("object class", "person", "human", "2.5.6.6");
        assert_eq!(
            err.to_string(),
            "object class person conflicts with human: both use the key 2.5.6.6"
        );
    }
}
