//! Entry validation policy.
//!
//! Each check performed by [`Schema::validate_entry`] can independently be
//! disabled, run in warn-only mode, or cause rejection. Structure rule
//! checking needs the parent entry's structural class, which is obtained
//! through a caller-supplied [`EntryResolver`].
//!
//! [`Schema::validate_entry`]: crate::schema::Schema::validate_entry

use std::sync::Arc;

use crate::entry::{Dn, Entry};
use crate::error::SchemaResult;

/// How a validation check reacts to a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Skip the check entirely.
    Disabled,
    /// Record a message and continue.
    Warn,
    /// Record a message and reject the entry.
    #[default]
    Reject,
}

impl Action {
    /// True unless the check is disabled.
    #[must_use]
    pub fn needs_checking(&self) -> bool {
        !matches!(self, Action::Disabled)
    }

    /// True if a violation rejects the entry.
    #[must_use]
    pub fn is_reject(&self) -> bool {
        matches!(self, Action::Reject)
    }
}

/// Resolves entries by DN on behalf of structure rule checking.
pub trait EntryResolver: Send + Sync {
    /// Return the entry named by `dn`.
    fn resolve_entry(&self, dn: &Dn) -> SchemaResult<Entry>;
}

impl<F> EntryResolver for F
where
    F: Fn(&Dn) -> SchemaResult<Entry> + Send + Sync,
{
    fn resolve_entry(&self, dn: &Dn) -> SchemaResult<Entry> {
        self(dn)
    }
}

/// The set of toggles controlling [`Schema::validate_entry`].
///
/// [`Schema::validate_entry`]: crate::schema::Schema::validate_entry
#[derive(Clone, Default)]
pub struct SchemaValidationPolicy {
    pub(crate) check_attributes_and_object_classes: Action,
    pub(crate) check_attribute_values: Action,
    pub(crate) check_dit_content_rules: Action,
    pub(crate) check_name_forms: Action,
    pub(crate) check_dit_structure_rules: Action,
    pub(crate) require_single_structural_object_class: Action,
    pub(crate) entry_resolver: Option<Arc<dyn EntryResolver>>,
}

impl std::fmt::Debug for SchemaValidationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidationPolicy")
            .field(
                "check_attributes_and_object_classes",
                &self.check_attributes_and_object_classes,
            )
            .field("check_attribute_values", &self.check_attribute_values)
            .field("check_dit_content_rules", &self.check_dit_content_rules)
            .field("check_name_forms", &self.check_name_forms)
            .field("check_dit_structure_rules", &self.check_dit_structure_rules)
            .field(
                "require_single_structural_object_class",
                &self.require_single_structural_object_class,
            )
            .field("entry_resolver", &self.entry_resolver.is_some())
            .finish()
    }
}

impl SchemaValidationPolicy {
    /// A policy with every check disabled.
    #[must_use]
    pub fn ignore_all() -> Self {
        SchemaValidationPolicy {
            check_attributes_and_object_classes: Action::Disabled,
            check_attribute_values: Action::Disabled,
            check_dit_content_rules: Action::Disabled,
            check_name_forms: Action::Disabled,
            check_dit_structure_rules: Action::Disabled,
            require_single_structural_object_class: Action::Disabled,
            entry_resolver: None,
        }
    }

    /// The default policy: reject object class, attribute and value
    /// violations; leave content rule, name form and structure rule
    /// checking disabled (those require server-published rules).
    #[must_use]
    pub fn default_policy() -> Self {
        SchemaValidationPolicy {
            check_attributes_and_object_classes: Action::Reject,
            check_attribute_values: Action::Reject,
            check_dit_content_rules: Action::Disabled,
            check_name_forms: Action::Disabled,
            check_dit_structure_rules: Action::Disabled,
            require_single_structural_object_class: Action::Reject,
            entry_resolver: None,
        }
    }

    /// Set the action for object class and attribute checking.
    #[must_use]
    pub fn check_attributes_and_object_classes(mut self, action: Action) -> Self {
        self.check_attributes_and_object_classes = action;
        self
    }

    /// Set the action for attribute value cardinality checking.
    #[must_use]
    pub fn check_attribute_values(mut self, action: Action) -> Self {
        self.check_attribute_values = action;
        self
    }

    /// Set the action for DIT content rule checking.
    #[must_use]
    pub fn check_dit_content_rules(mut self, action: Action) -> Self {
        self.check_dit_content_rules = action;
        self
    }

    /// Set the action for name form checking.
    #[must_use]
    pub fn check_name_forms(mut self, action: Action) -> Self {
        self.check_name_forms = action;
        self
    }

    /// Set the action for DIT structure rule checking.
    #[must_use]
    pub fn check_dit_structure_rules(mut self, action: Action) -> Self {
        self.check_dit_structure_rules = action;
        self
    }

    /// Set the action for the single-structural-class requirement.
    #[must_use]
    pub fn require_single_structural_object_class(mut self, action: Action) -> Self {
        self.require_single_structural_object_class = action;
        self
    }

    /// Supply the parent entry resolver used by structure rule checking.
    #[must_use]
    pub fn with_entry_resolver(mut self, resolver: Arc<dyn EntryResolver>) -> Self {
        self.entry_resolver = Some(resolver);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_predicates() {
        assert!(!Action::Disabled.needs_checking());
        assert!(Action::Warn.needs_checking());
        assert!(!Action::Warn.is_reject());
        assert!(Action::Reject.is_reject());
    }

    #[test]
    fn test_ignore_all() {
        let policy = SchemaValidationPolicy::ignore_all();
        assert!(!policy.check_attributes_and_object_classes.needs_checking());
        assert!(!policy.check_dit_structure_rules.needs_checking());
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |dn: &Dn| Ok(Entry::new(dn.clone()));
        let entry = resolver
            .resolve_entry(&Dn::new("dc=example,dc=com"))
            .unwrap();
        assert_eq!(entry.name().as_str(), "dc=example,dc=com");
    }
}
