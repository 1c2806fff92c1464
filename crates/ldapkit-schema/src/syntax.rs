//! Attribute syntax definitions.
//!
//! A syntax describes the legal encoding of an attribute's values. Most
//! syntaxes published by a server are opaque to the SDK; three kinds of
//! behavior can be attached through vendor extensions:
//!
//! - `X-SUBST 'oid'` — delegate value handling to another syntax,
//! - `X-PATTERN 'regex'` — values must match a regular expression,
//! - `X-ENUM ( 'v1' 'v2' ... )` — values come from an ordered enumeration.
//!
//! Extension resolution happens during schema validation; an unresolvable
//! substitution or pattern falls back to the schema default with a warning
//! rather than failing the build.

use std::fmt;

use crate::element::{write_description, write_extra_properties, ExtraProperties};

/// The resolved behavior of a syntax.
#[derive(Debug, Clone, Default)]
pub enum SyntaxKind {
    /// No special value handling.
    #[default]
    Standard,
    /// Value handling delegated to another syntax.
    Substitution(String),
    /// Values constrained by a regular expression.
    Pattern(regex::Regex),
    /// Values drawn from an ordered enumeration.
    Enumeration(Vec<String>),
}

/// An attribute syntax definition.
#[derive(Debug, Clone, Default)]
pub struct Syntax {
    pub(crate) oid: String,
    pub(crate) description: String,
    pub(crate) extra_properties: ExtraProperties,
    pub(crate) definition: Option<String>,
    pub(crate) kind: SyntaxKind,
    // Default matching rules, cached by validation.
    pub(crate) equality_oid: Option<String>,
    pub(crate) ordering_oid: Option<String>,
}

impl Syntax {
    /// Create a syntax with the given numeric OID.
    pub fn new(oid: impl Into<String>) -> Self {
        Syntax {
            oid: oid.into(),
            ..Syntax::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a vendor extension property.
    #[must_use]
    pub fn with_extra_property(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.extra_properties
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// The numeric OID.
    #[must_use]
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// The description, possibly empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Vendor extension properties.
    #[must_use]
    pub fn extra_properties(&self) -> &ExtraProperties {
        &self.extra_properties
    }

    /// The resolved value-handling behavior.
    #[must_use]
    pub fn kind(&self) -> &SyntaxKind {
        &self.kind
    }

    /// OID of the default equality matching rule, once validated.
    #[must_use]
    pub fn equality_matching_rule_oid(&self) -> Option<&str> {
        self.equality_oid.as_deref()
    }

    /// OID of the default ordering matching rule, once validated.
    #[must_use]
    pub fn ordering_matching_rule_oid(&self) -> Option<&str> {
        self.ordering_oid.as_deref()
    }

    /// Check a value against this syntax's resolved behavior.
    ///
    /// Standard and substitution syntaxes accept every value; value-level
    /// checking for those is a transport concern.
    #[must_use]
    pub fn value_matches(&self, value: &str) -> bool {
        match &self.kind {
            SyntaxKind::Standard | SyntaxKind::Substitution(_) => true,
            SyntaxKind::Pattern(pattern) => pattern.is_match(value),
            SyntaxKind::Enumeration(values) => {
                values.iter().any(|v| v.eq_ignore_ascii_case(value))
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
        write_description(&mut buf, &self.description);
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

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_round_trip_shape() {
        let syntax = Syntax::new("1.3.6.1.4.1.1466.115.121.1.15")
            .with_description("Directory String");
        assert_eq!(
            syntax.definition(),
            "( 1.3.6.1.4.1.1466.115.121.1.15 DESC 'Directory String' )"
        );
    }

    #[test]
    fn test_enumeration_value_matching() {
        let mut syntax = Syntax::new("1.2.3.4");
        syntax.kind = SyntaxKind::Enumeration(vec![
            "low".to_string(),
            "medium".to_string(),
            "high".to_string(),
        ]);
        assert!(syntax.value_matches("medium"));
        assert!(syntax.value_matches("HIGH"));
        assert!(!syntax.value_matches("critical"));
    }

    #[test]
    fn test_pattern_value_matching() {
        let mut syntax = Syntax::new("1.2.3.5");
        syntax.kind = SyntaxKind::Pattern(regex::Regex::new(r"^\d{4}$").unwrap());
        assert!(syntax.value_matches("2024"));
        assert!(!syntax.value_matches("24"));
    }
}
