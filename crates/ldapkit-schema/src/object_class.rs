//! Object class definitions.
//!
//! RFC 4512 constrains how classes may derive from one another: ABSTRACT
//! classes only from ABSTRACT, AUXILIARY from ABSTRACT or AUXILIARY,
//! STRUCTURAL from ABSTRACT or STRUCTURAL, and every STRUCTURAL class must
//! transitively derive from `top`. The validation pass enforces the matrix
//! and computes the effective attribute sets (declared plus everything
//! inherited from the whole superior chain).

use std::collections::BTreeSet;
use std::fmt;

use crate::element::{
    write_description, write_extra_properties, write_names, write_oids, ExtraProperties,
};

/// RFC 4512 object class classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectClassKind {
    /// Cannot be instantiated; exists to be derived from.
    Abstract,
    /// Governs an entry's structure; exactly one per entry.
    #[default]
    Structural,
    /// Mixed into entries alongside a structural class.
    Auxiliary,
}

impl ObjectClassKind {
    /// The RFC 2252 keyword for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClassKind::Abstract => "ABSTRACT",
            ObjectClassKind::Structural => "STRUCTURAL",
            ObjectClassKind::Auxiliary => "AUXILIARY",
        }
    }
}

impl fmt::Display for ObjectClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An object class definition.
#[derive(Debug, Clone, Default)]
pub struct ObjectClass {
    pub(crate) oid: String,
    pub(crate) names: Vec<String>,
    pub(crate) description: String,
    pub(crate) obsolete: bool,
    pub(crate) superior_oids: Vec<String>,
    pub(crate) required_oids: Vec<String>,
    pub(crate) optional_oids: Vec<String>,
    pub(crate) kind: ObjectClassKind,
    pub(crate) extra_properties: ExtraProperties,
    pub(crate) definition: Option<String>,
    // Resolved by validation.
    pub(crate) effective_superior_oids: Vec<String>,
    pub(crate) ancestor_oids: BTreeSet<String>,
    pub(crate) declared_required: BTreeSet<String>,
    pub(crate) effective_required: BTreeSet<String>,
    pub(crate) effective_optional: BTreeSet<String>,
}

impl ObjectClass {
    /// Create an object class with the given OID.
    pub fn new(oid: impl Into<String>) -> Self {
        ObjectClass {
            oid: oid.into(),
            ..ObjectClass::default()
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

    /// Add a superior class reference.
    #[must_use]
    pub fn with_superior(mut self, superior: impl Into<String>) -> Self {
        self.superior_oids.push(superior.into());
        self
    }

    /// Set the classification.
    #[must_use]
    pub fn with_kind(mut self, kind: ObjectClassKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a required (MUST) attribute reference.
    #[must_use]
    pub fn with_required(mut self, attribute: impl Into<String>) -> Self {
        self.required_oids.push(attribute.into());
        self
    }

    /// Add an optional (MAY) attribute reference.
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

    /// The first declared name, or the OID when the class is unnamed.
    #[must_use]
    pub fn name_or_oid(&self) -> &str {
        self.names.first().map_or(&self.oid, String::as_str)
    }

    /// True if one of the declared names matches, ignoring case.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// True if the class is marked OBSOLETE.
    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// The classification.
    #[must_use]
    pub fn kind(&self) -> ObjectClassKind {
        self.kind
    }

    /// Declared superior class references.
    #[must_use]
    pub fn superior_oids(&self) -> &[String] {
        &self.superior_oids
    }

    /// Canonical superior class OIDs after validation, including a
    /// default-injected `top` for structural classes declaring none.
    #[must_use]
    pub fn effective_superior_oids(&self) -> &[String] {
        &self.effective_superior_oids
    }

    /// OIDs of every class this class transitively derives from.
    #[must_use]
    pub fn ancestor_oids(&self) -> &BTreeSet<String> {
        &self.ancestor_oids
    }

    /// True if this class transitively derives from `other`.
    #[must_use]
    pub fn is_descendant_of(&self, other: &ObjectClass) -> bool {
        self.ancestor_oids.contains(other.oid())
    }

    /// Attribute type OIDs declared MUST on this class (not inherited).
    #[must_use]
    pub fn declared_required_oids(&self) -> &BTreeSet<String> {
        &self.declared_required
    }

    /// Attribute type OIDs required by this class or any superior.
    #[must_use]
    pub fn required_oids(&self) -> &BTreeSet<String> {
        &self.effective_required
    }

    /// Attribute type OIDs permitted by this class or any superior.
    #[must_use]
    pub fn optional_oids(&self) -> &BTreeSet<String> {
        &self.effective_optional
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
        let mut buf = format!("( {}", self.oid);
        write_names(&mut buf, &self.names);
        write_description(&mut buf, &self.description);
        if self.obsolete {
            buf.push_str(" OBSOLETE");
        }
        write_oids(&mut buf, "SUP", &self.superior_oids);
        buf.push_str(&format!(" {}", self.kind));
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

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_emission() {
        let oc = ObjectClass::new("2.5.6.6")
            .with_name("person")
            .with_superior("top")
            .with_kind(ObjectClassKind::Structural)
            .with_required("sn")
            .with_required("cn")
            .with_optional("description");
        assert_eq!(
            oc.definition(),
            "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn ) MAY description )"
        );
    }

    #[test]
    fn test_descendant_check_uses_ancestors() {
        let top = ObjectClass::new("2.5.6.0")
            .with_name("top")
            .with_kind(ObjectClassKind::Abstract);
        let mut person = ObjectClass::new("2.5.6.6").with_name("person");
        person.ancestor_oids.insert("2.5.6.0".to_string());
        assert!(person.is_descendant_of(&top));
        assert!(!top.is_descendant_of(&person));
    }
}
