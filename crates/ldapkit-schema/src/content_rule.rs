//! DIT content rule definitions.
//!
//! A content rule refines what entries of one structural class may contain:
//! extra required/optional attributes, prohibited attributes, and the
//! auxiliary classes that may be mixed in. It is keyed by the structural
//! class's OID rather than an OID of its own.

use std::collections::BTreeSet;
use std::fmt;

use crate::element::{
    write_description, write_extra_properties, write_names, write_oids, ExtraProperties,
};

/// A DIT content rule definition.
#[derive(Debug, Clone, Default)]
pub struct DitContentRule {
    pub(crate) structural_class_oid: String,
    pub(crate) names: Vec<String>,
    pub(crate) description: String,
    pub(crate) obsolete: bool,
    pub(crate) auxiliary_oids: Vec<String>,
    pub(crate) required_oids: Vec<String>,
    pub(crate) optional_oids: Vec<String>,
    pub(crate) prohibited_oids: Vec<String>,
    pub(crate) extra_properties: ExtraProperties,
    pub(crate) definition: Option<String>,
    // Resolved by validation.
    pub(crate) effective_auxiliary: BTreeSet<String>,
    pub(crate) effective_required: BTreeSet<String>,
    pub(crate) effective_optional: BTreeSet<String>,
    pub(crate) effective_prohibited: BTreeSet<String>,
}

impl DitContentRule {
    /// Create a content rule for the given structural class OID.
    pub fn new(structural_class_oid: impl Into<String>) -> Self {
        DitContentRule {
            structural_class_oid: structural_class_oid.into(),
            ..DitContentRule::default()
        }
    }

    /// Add a user-friendly name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Add a permitted auxiliary class reference.
    #[must_use]
    pub fn with_auxiliary(mut self, class: impl Into<String>) -> Self {
        self.auxiliary_oids.push(class.into());
        self
    }

    /// Add a required attribute reference.
    #[must_use]
    pub fn with_required(mut self, attribute: impl Into<String>) -> Self {
        self.required_oids.push(attribute.into());
        self
    }

    /// Add an optional attribute reference.
    #[must_use]
    pub fn with_optional(mut self, attribute: impl Into<String>) -> Self {
        self.optional_oids.push(attribute.into());
        self
    }

    /// Add a prohibited attribute reference.
    #[must_use]
    pub fn with_prohibited(mut self, attribute: impl Into<String>) -> Self {
        self.prohibited_oids.push(attribute.into());
        self
    }

    /// OID of the structural class this rule governs (the identity key).
    #[must_use]
    pub fn structural_class_oid(&self) -> &str {
        &self.structural_class_oid
    }

    /// All declared names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The first declared name, or the structural class OID.
    #[must_use]
    pub fn name_or_oid(&self) -> &str {
        self.names
            .first()
            .map_or(&self.structural_class_oid, String::as_str)
    }

    /// True if one of the declared names matches, ignoring case.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// True if the rule is marked OBSOLETE.
    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// OIDs of auxiliary classes entries may carry, resolved by validation.
    #[must_use]
    pub fn auxiliary_oids(&self) -> &BTreeSet<String> {
        &self.effective_auxiliary
    }

    /// Attribute type OIDs this rule additionally requires.
    #[must_use]
    pub fn required_oids(&self) -> &BTreeSet<String> {
        &self.effective_required
    }

    /// Attribute type OIDs this rule additionally permits.
    #[must_use]
    pub fn optional_oids(&self) -> &BTreeSet<String> {
        &self.effective_optional
    }

    /// Attribute type OIDs this rule prohibits.
    #[must_use]
    pub fn prohibited_oids(&self) -> &BTreeSet<String> {
        &self.effective_prohibited
    }

    /// True if the attribute type OID is required or permitted here.
    #[must_use]
    pub fn is_required_or_optional(&self, attribute_oid: &str) -> bool {
        self.effective_required.contains(attribute_oid)
            || self.effective_optional.contains(attribute_oid)
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
        let mut buf = format!("( {}", self.structural_class_oid);
        write_names(&mut buf, &self.names);
        write_description(&mut buf, &self.description);
        if self.obsolete {
            buf.push_str(" OBSOLETE");
        }
        write_oids(&mut buf, "AUX", &self.auxiliary_oids);
        write_oids(&mut buf, "MUST", &self.required_oids);
        write_oids(&mut buf, "MAY", &self.optional_oids);
        write_oids(&mut buf, "NOT", &self.prohibited_oids);
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

impl fmt::Display for DitContentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_emission() {
        let rule = DitContentRule::new("2.5.6.6")
            .with_name("personContent")
            .with_auxiliary("strongAuthenticationUser")
            .with_prohibited("telephoneNumber");
        assert_eq!(
            rule.definition(),
            "( 2.5.6.6 NAME 'personContent' AUX strongAuthenticationUser NOT telephoneNumber )"
        );
    }
}
