//! Attribute type definitions.
//!
//! An attribute type names a value type: its syntax, matching rules and
//! cardinality. Types form a forest through SUP references; a type without
//! an explicit syntax inherits one transitively from its superior, and the
//! validation pass guarantees that every surviving type resolves to a
//! syntax.

use std::fmt;

use crate::element::{
    write_description, write_extra_properties, write_names, ExtraProperties,
};
use crate::oids;

/// The intended use of an attribute type (RFC 4512 section 4.1.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUsage {
    /// User data.
    #[default]
    UserApplications,
    /// Operational data local to a server.
    DirectoryOperation,
    /// Operational data shared between servers.
    DistributedOperation,
    /// Operational data specific to a DSA.
    DsaOperation,
}

impl AttributeUsage {
    /// The RFC 2252 keyword for this usage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeUsage::UserApplications => "userApplications",
            AttributeUsage::DirectoryOperation => "directoryOperation",
            AttributeUsage::DistributedOperation => "distributedOperation",
            AttributeUsage::DsaOperation => "dSAOperation",
        }
    }

    /// True for every usage other than `userApplications`.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        !matches!(self, AttributeUsage::UserApplications)
    }
}

impl fmt::Display for AttributeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attribute type definition.
#[derive(Debug, Clone, Default)]
pub struct AttributeType {
    pub(crate) oid: String,
    pub(crate) names: Vec<String>,
    pub(crate) description: String,
    pub(crate) obsolete: bool,
    pub(crate) superior_oid: Option<String>,
    pub(crate) equality_oid: Option<String>,
    pub(crate) ordering_oid: Option<String>,
    pub(crate) substring_oid: Option<String>,
    pub(crate) approximate_oid: Option<String>,
    pub(crate) syntax_oid: Option<String>,
    pub(crate) single_value: bool,
    pub(crate) collective: bool,
    pub(crate) no_user_modification: bool,
    pub(crate) usage: AttributeUsage,
    pub(crate) extra_properties: ExtraProperties,
    pub(crate) definition: Option<String>,
    pub(crate) placeholder: bool,
    // Resolved by validation: the superior's canonical OID, and the
    // matching rules / syntax in effect after inheritance.
    pub(crate) effective_superior_oid: Option<String>,
    pub(crate) effective_syntax_oid: Option<String>,
    pub(crate) effective_equality_oid: Option<String>,
    pub(crate) effective_ordering_oid: Option<String>,
    pub(crate) effective_substring_oid: Option<String>,
    pub(crate) effective_approximate_oid: Option<String>,
}

impl AttributeType {
    /// Create an attribute type with the given OID.
    pub fn new(oid: impl Into<String>) -> Self {
        AttributeType {
            oid: oid.into(),
            ..AttributeType::default()
        }
    }

    /// Add a user-friendly name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the superior type reference.
    #[must_use]
    pub fn with_superior(mut self, superior: impl Into<String>) -> Self {
        self.superior_oid = Some(superior.into());
        self
    }

    /// Set the syntax OID.
    #[must_use]
    pub fn with_syntax(mut self, syntax_oid: impl Into<String>) -> Self {
        self.syntax_oid = Some(syntax_oid.into());
        self
    }

    /// Set the equality matching rule reference.
    #[must_use]
    pub fn with_equality(mut self, rule: impl Into<String>) -> Self {
        self.equality_oid = Some(rule.into());
        self
    }

    /// Mark the type single-valued.
    #[must_use]
    pub fn single_valued(mut self) -> Self {
        self.single_value = true;
        self
    }

    /// Set the usage.
    #[must_use]
    pub fn with_usage(mut self, usage: AttributeUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Mark the type as not modifiable by end users.
    #[must_use]
    pub fn no_user_modification(mut self) -> Self {
        self.no_user_modification = true;
        self
    }

    /// Synthesize a place-holder type for an attribute unknown to a
    /// non-strict schema. The OID is the lowercased name with `-oid`
    /// appended and values use the Octet String syntax.
    #[must_use]
    pub(crate) fn placeholder(name: &str) -> Self {
        let mut attribute_type = AttributeType::new(format!("{}-oid", name.to_lowercase()))
            .with_name(name)
            .with_syntax(oids::SYNTAX_OCTET_STRING_OID)
            .with_equality(oids::EMR_OCTET_STRING_OID);
        attribute_type.placeholder = true;
        attribute_type.effective_syntax_oid = Some(oids::SYNTAX_OCTET_STRING_OID.to_string());
        attribute_type.effective_equality_oid = Some(oids::EMR_OCTET_STRING_OID.to_string());
        attribute_type
    }

    /// The numeric OID.
    #[must_use]
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// All declared names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The first declared name, or the OID when the type is unnamed.
    #[must_use]
    pub fn name_or_oid(&self) -> &str {
        self.names.first().map_or(&self.oid, String::as_str)
    }

    /// True if one of the declared names matches, ignoring case.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// The description, possibly empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// True if the type is marked OBSOLETE.
    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// The declared superior type reference, if any.
    #[must_use]
    pub fn superior_oid(&self) -> Option<&str> {
        self.superior_oid.as_deref()
    }

    /// The canonical OID of the superior type, resolved by validation.
    #[must_use]
    pub fn effective_superior_oid(&self) -> Option<&str> {
        self.effective_superior_oid.as_deref()
    }

    /// The syntax in effect, after inheritance from superiors.
    ///
    /// Always present on a type that survived validation.
    #[must_use]
    pub fn syntax_oid(&self) -> Option<&str> {
        self.effective_syntax_oid
            .as_deref()
            .or(self.syntax_oid.as_deref())
    }

    /// The equality matching rule in effect, after inheritance.
    #[must_use]
    pub fn equality_matching_rule_oid(&self) -> Option<&str> {
        self.effective_equality_oid
            .as_deref()
            .or(self.equality_oid.as_deref())
    }

    /// The ordering matching rule in effect, after inheritance.
    #[must_use]
    pub fn ordering_matching_rule_oid(&self) -> Option<&str> {
        self.effective_ordering_oid
            .as_deref()
            .or(self.ordering_oid.as_deref())
    }

    /// The substring matching rule in effect, after inheritance.
    #[must_use]
    pub fn substring_matching_rule_oid(&self) -> Option<&str> {
        self.effective_substring_oid
            .as_deref()
            .or(self.substring_oid.as_deref())
    }

    /// The approximate matching rule in effect, after inheritance.
    #[must_use]
    pub fn approximate_matching_rule_oid(&self) -> Option<&str> {
        self.effective_approximate_oid
            .as_deref()
            .or(self.approximate_oid.as_deref())
    }

    /// True if attributes of this type hold at most one value.
    #[must_use]
    pub fn is_single_value(&self) -> bool {
        self.single_value
    }

    /// True if this is a collective attribute type.
    #[must_use]
    pub fn is_collective(&self) -> bool {
        self.collective
    }

    /// True if end users may not modify values of this type.
    #[must_use]
    pub fn is_no_user_modification(&self) -> bool {
        self.no_user_modification
    }

    /// The declared usage.
    #[must_use]
    pub fn usage(&self) -> AttributeUsage {
        self.usage
    }

    /// True for operational attribute types.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.usage.is_operational()
    }

    /// True for a place-holder synthesized by a non-strict schema.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Vendor extension properties.
    #[must_use]
    pub fn extra_properties(&self) -> &ExtraProperties {
        &self.extra_properties
    }

    /// The RFC 2252 definition string.
    #[must_use]
    pub fn definition(&self) -> String {
        match &self.definition {
            Some(definition) => definition.clone(),
            None => self.build_definition(),
        }
    }

    pub(crate) fn build_definition(&self) -> String {
        let mut buf = format!("( {}", self.oid);
        write_names(&mut buf, &self.names);
        write_description(&mut buf, &self.description);
        if self.obsolete {
            buf.push_str(" OBSOLETE");
        }
        if let Some(superior) = &self.superior_oid {
            buf.push_str(&format!(" SUP {superior}"));
        }
        if let Some(rule) = &self.equality_oid {
            buf.push_str(&format!(" EQUALITY {rule}"));
        }
        if let Some(rule) = &self.ordering_oid {
            buf.push_str(&format!(" ORDERING {rule}"));
        }
        if let Some(rule) = &self.substring_oid {
            buf.push_str(&format!(" SUBSTR {rule}"));
        }
        if let Some(syntax) = &self.syntax_oid {
            buf.push_str(&format!(" SYNTAX {syntax}"));
        }
        if self.single_value {
            buf.push_str(" SINGLE-VALUE");
        }
        if self.collective {
            buf.push_str(" COLLECTIVE");
        }
        if self.no_user_modification {
            buf.push_str(" NO-USER-MODIFICATION");
        }
        if self.usage != AttributeUsage::UserApplications {
            buf.push_str(&format!(" USAGE {}", self.usage));
        }
        write_extra_properties(&mut buf, &self.extra_properties);
        buf.push_str(" )");
        buf
    }

    pub(crate) fn cache_definition(&mut self) {
        if self.definition.is_none() {
            self.definition = Some(self.build_definition());
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_shape() {
        let at = AttributeType::placeholder("undefinedAttr");
        assert_eq!(at.oid(), "undefinedattr-oid");
        assert!(at.has_name("undefinedAttr"));
        assert_eq!(at.syntax_oid(), Some(oids::SYNTAX_OCTET_STRING_OID));
        assert!(at.is_placeholder());
    }

    #[test]
    fn test_definition_emission() {
        let at = AttributeType::new("2.5.4.3")
            .with_name("cn")
            .with_name("commonName")
            .with_superior("name");
        assert_eq!(
            at.definition(),
            "( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )"
        );
    }

    #[test]
    fn test_operational_usage() {
        assert!(!AttributeUsage::UserApplications.is_operational());
        assert!(AttributeUsage::DirectoryOperation.is_operational());
        assert_eq!(AttributeUsage::DsaOperation.as_str(), "dSAOperation");
    }
}
