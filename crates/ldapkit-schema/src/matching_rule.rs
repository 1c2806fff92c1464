//! Matching rule and matching rule use definitions.

use std::cmp::Ordering;
use std::fmt;

use crate::element::{
    write_description, write_extra_properties, write_names, write_oids, ExtraProperties,
};

/// Comparison behavior of a matching rule.
#[derive(Debug, Clone, Default)]
pub enum MatchingRuleKind {
    /// Case-insensitive string comparison over normalized values.
    #[default]
    Standard,
    /// Ordering by position within an enumerated value list, synthesized
    /// for syntaxes carrying an `X-ENUM` extension.
    EnumOrdering(Vec<String>),
}

/// A matching rule: equality, ordering or substring comparison semantics
/// for attribute values of a given assertion syntax.
#[derive(Debug, Clone, Default)]
pub struct MatchingRule {
    pub(crate) oid: String,
    pub(crate) names: Vec<String>,
    pub(crate) description: String,
    pub(crate) obsolete: bool,
    pub(crate) syntax_oid: String,
    pub(crate) extra_properties: ExtraProperties,
    pub(crate) definition: Option<String>,
    pub(crate) kind: MatchingRuleKind,
}

impl MatchingRule {
    /// Create a matching rule with the given OID and assertion syntax OID.
    pub fn new(oid: impl Into<String>, syntax_oid: impl Into<String>) -> Self {
        MatchingRule {
            oid: oid.into(),
            syntax_oid: syntax_oid.into(),
            ..MatchingRule::default()
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

    /// The first declared name, or the OID when the rule is unnamed.
    #[must_use]
    pub fn name_or_oid(&self) -> &str {
        self.names.first().map_or(&self.oid, String::as_str)
    }

    /// True if one of the declared names matches, ignoring case.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// OID of the assertion syntax.
    #[must_use]
    pub fn syntax_oid(&self) -> &str {
        &self.syntax_oid
    }

    /// True if the rule is marked OBSOLETE.
    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// Vendor extension properties.
    #[must_use]
    pub fn extra_properties(&self) -> &ExtraProperties {
        &self.extra_properties
    }

    /// Normalize an attribute value for comparison under this rule.
    #[must_use]
    pub fn normalize(&self, value: &str) -> String {
        value.trim().to_lowercase()
    }

    /// Compare two attribute values under this rule.
    ///
    /// Enum-ordering rules compare by position in the enumeration; a value
    /// outside the enumeration compares greater than any member.
    #[must_use]
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.kind {
            MatchingRuleKind::Standard => self.normalize(a).cmp(&self.normalize(b)),
            MatchingRuleKind::EnumOrdering(values) => {
                let index_of = |v: &str| {
                    values
                        .iter()
                        .position(|candidate| candidate.eq_ignore_ascii_case(v))
                        .unwrap_or(values.len())
                };
                index_of(a).cmp(&index_of(b))
            }
        }
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
        buf.push_str(&format!(" SYNTAX {}", self.syntax_oid));
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

impl fmt::Display for MatchingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition())
    }
}

/// A matching rule use: the set of attribute types a matching rule may be
/// applied to. Keyed by the matching rule's OID.
#[derive(Debug, Clone, Default)]
pub struct MatchingRuleUse {
    pub(crate) matching_rule_oid: String,
    pub(crate) names: Vec<String>,
    pub(crate) description: String,
    pub(crate) obsolete: bool,
    pub(crate) applies_oids: Vec<String>,
    pub(crate) extra_properties: ExtraProperties,
    pub(crate) definition: Option<String>,
    // Attribute type OIDs, resolved by validation.
    pub(crate) effective_applies: Vec<String>,
}

impl MatchingRuleUse {
    /// Create a matching rule use for the given matching rule OID.
    pub fn new(
        matching_rule_oid: impl Into<String>,
        applies: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        MatchingRuleUse {
            matching_rule_oid: matching_rule_oid.into(),
            applies_oids: applies.into_iter().map(Into::into).collect(),
            ..MatchingRuleUse::default()
        }
    }

    /// OID of the matching rule this use applies to.
    #[must_use]
    pub fn matching_rule_oid(&self) -> &str {
        &self.matching_rule_oid
    }

    /// All declared names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The first declared name, or the matching rule OID.
    #[must_use]
    pub fn name_or_oid(&self) -> &str {
        self.names
            .first()
            .map_or(&self.matching_rule_oid, String::as_str)
    }

    /// True if one of the declared names matches, ignoring case.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// True if the use is marked OBSOLETE.
    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// OIDs of the attribute types the rule applies to, resolved during
    /// validation.
    #[must_use]
    pub fn applies(&self) -> &[String] {
        &self.effective_applies
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
        let mut buf = format!("( {}", self.matching_rule_oid);
        write_names(&mut buf, &self.names);
        write_description(&mut buf, &self.description);
        if self.obsolete {
            buf.push_str(" OBSOLETE");
        }
        write_oids(&mut buf, "APPLIES", &self.applies_oids);
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

impl fmt::Display for MatchingRuleUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition())
    }
}
