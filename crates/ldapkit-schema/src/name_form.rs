//! Name form definitions: which attributes may and must appear in the RDN
//! of entries governed by a given structural object class.

use std::collections::BTreeSet;
use std::fmt;

use crate::element::{
    write_description, write_extra_properties, write_names, write_oids, ExtraProperties,
};

/// A name form definition.
#[derive(Debug, Clone, Default)]
pub struct NameForm {
    pub(crate) oid: String,
    pub(crate) names: Vec<String>,
    pub(crate) description: String,
    pub(crate) obsolete: bool,
    pub(crate) structural_class_oid: String,
    pub(crate) required_oids: Vec<String>,
    pub(crate) optional_oids: Vec<String>,
    pub(crate) extra_properties: ExtraProperties,
    pub(crate) definition: Option<String>,
    // Resolved by validation.
    pub(crate) effective_structural_class_oid: String,
    pub(crate) effective_required: BTreeSet<String>,
    pub(crate) effective_optional: BTreeSet<String>,
}

impl NameForm {
    /// Create a name form with the given OID, structural class and first
    /// required naming attribute. The required set may not be empty.
    pub fn new(
        oid: impl Into<String>,
        structural_class: impl Into<String>,
        required: impl Into<String>,
    ) -> Self {
        NameForm {
            oid: oid.into(),
            structural_class_oid: structural_class.into(),
            required_oids: vec![required.into()],
            ..NameForm::default()
        }
    }

    /// Add a user-friendly name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Add a required naming attribute reference.
    #[must_use]
    pub fn with_required(mut self, attribute: impl Into<String>) -> Self {
        self.required_oids.push(attribute.into());
        self
    }

    /// Add an optional naming attribute reference.
    #[must_use]
    pub fn with_optional(mut self, attribute: impl Into<String>) -> Self {
        self.optional_oids.push(attribute.into());
        self
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

    /// The first declared name, or the OID when the form is unnamed.
    #[must_use]
    pub fn name_or_oid(&self) -> &str {
        self.names.first().map_or(&self.oid, String::as_str)
    }

    /// True if one of the declared names matches, ignoring case.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// True if the form is marked OBSOLETE.
    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// The declared structural class reference.
    #[must_use]
    pub fn structural_class_oid(&self) -> &str {
        if self.effective_structural_class_oid.is_empty() {
            &self.structural_class_oid
        } else {
            &self.effective_structural_class_oid
        }
    }

    /// Attribute type OIDs that must appear in a conforming RDN.
    #[must_use]
    pub fn required_oids(&self) -> &BTreeSet<String> {
        &self.effective_required
    }

    /// Attribute type OIDs that may additionally appear in the RDN.
    #[must_use]
    pub fn optional_oids(&self) -> &BTreeSet<String> {
        &self.effective_optional
    }

    /// True if the attribute type OID is allowed in a conforming RDN.
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
        let mut buf = format!("( {}", self.oid);
        write_names(&mut buf, &self.names);
        write_description(&mut buf, &self.description);
        if self.obsolete {
            buf.push_str(" OBSOLETE");
        }
        buf.push_str(&format!(" OC {}", self.structural_class_oid));
        write_oids(&mut buf, "MUST", &self.required_oids);
        write_oids(&mut buf, "MAY", &self.optional_oids);
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

impl fmt::Display for NameForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition())
    }
}
