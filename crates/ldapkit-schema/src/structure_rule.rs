//! DIT structure rule definitions.
//!
//! Structure rules constrain which structural-class/name-form combinations
//! may be parent and child in the DIT. They are keyed by an integer rule ID
//! and form a hierarchy through SUP references to other rule IDs.

use std::fmt;

use crate::element::{
    write_description, write_extra_properties, write_names, ExtraProperties,
};

/// A DIT structure rule definition.
#[derive(Debug, Clone, Default)]
pub struct DitStructureRule {
    pub(crate) rule_id: u32,
    pub(crate) names: Vec<String>,
    pub(crate) description: String,
    pub(crate) obsolete: bool,
    pub(crate) name_form_oid: String,
    pub(crate) superior_rule_ids: Vec<u32>,
    pub(crate) extra_properties: ExtraProperties,
    pub(crate) definition: Option<String>,
    // Resolved by validation.
    pub(crate) effective_name_form_oid: String,
}

impl DitStructureRule {
    /// Create a structure rule with the given rule ID and name form.
    pub fn new(rule_id: u32, name_form: impl Into<String>) -> Self {
        DitStructureRule {
            rule_id,
            name_form_oid: name_form.into(),
            ..DitStructureRule::default()
        }
    }

    /// Add a user-friendly name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Add a superior rule reference.
    #[must_use]
    pub fn with_superior(mut self, rule_id: u32) -> Self {
        self.superior_rule_ids.push(rule_id);
        self
    }

    /// The integer rule ID (the identity key).
    #[must_use]
    pub fn rule_id(&self) -> u32 {
        self.rule_id
    }

    /// All declared names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The first declared name, or the rule ID rendered as a string.
    #[must_use]
    pub fn name_or_rule_id(&self) -> String {
        self.names
            .first()
            .cloned()
            .unwrap_or_else(|| self.rule_id.to_string())
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

    /// OID of the governing name form, canonical after validation.
    #[must_use]
    pub fn name_form_oid(&self) -> &str {
        if self.effective_name_form_oid.is_empty() {
            &self.name_form_oid
        } else {
            &self.effective_name_form_oid
        }
    }

    /// IDs of the superior rules.
    #[must_use]
    pub fn superior_rule_ids(&self) -> &[u32] {
        &self.superior_rule_ids
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
        let mut buf = format!("( {}", self.rule_id);
        write_names(&mut buf, &self.names);
        write_description(&mut buf, &self.description);
        if self.obsolete {
            buf.push_str(" OBSOLETE");
        }
        buf.push_str(&format!(" FORM {}", self.name_form_oid));
        match self.superior_rule_ids.as_slice() {
            [] => {}
            [single] => buf.push_str(&format!(" SUP {single}")),
            many => {
                buf.push_str(" SUP (");
                for id in many {
                    buf.push_str(&format!(" {id}"));
                }
                buf.push_str(" )");
            }
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

impl fmt::Display for DitStructureRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_emission() {
        let rule = DitStructureRule::new(2, "personNameForm")
            .with_name("personStructure")
            .with_superior(1);
        assert_eq!(
            rule.definition(),
            "( 2 NAME 'personStructure' FORM personNameForm SUP 1 )"
        );
    }

    #[test]
    fn test_name_or_rule_id() {
        let rule = DitStructureRule::new(7, "form");
        assert_eq!(rule.name_or_rule_id(), "7");
    }
}
