//! Entry validation against object classes, content rules, name forms and
//! structure rules under configurable policies.

use std::sync::Arc;

use ldapkit_schema::prelude::*;

fn person_entry() -> Entry {
    Entry::new(Dn::new("cn=John Doe,ou=people,dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "person"])
        .with_attribute("cn", ["John Doe"])
        .with_attribute("sn", ["Doe"])
}

fn reject_all_policy() -> SchemaValidationPolicy {
    SchemaValidationPolicy::default_policy()
}

#[test]
fn conforming_entry_is_accepted() {
    let schema = Schema::core_schema();
    let mut messages = Vec::new();
    assert!(schema.validate_entry(&person_entry(), &reject_all_policy(), Some(&mut messages)));
    assert!(messages.is_empty(), "{messages:?}");
}

#[test]
fn missing_required_attribute_is_rejected() {
    let schema = Schema::core_schema();
    let entry = Entry::new(Dn::new("cn=John Doe,ou=people,dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "person"])
        .with_attribute("cn", ["John Doe"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &reject_all_policy(), Some(&mut messages)));
    assert!(
        messages.iter().any(|m| m.contains("sn") && m.contains("person")),
        "{messages:?}"
    );
}

#[test]
fn attribute_not_allowed_by_any_class_is_rejected() {
    let schema = Schema::core_schema();
    let entry = person_entry().with_attribute("member", ["cn=group,dc=example,dc=com"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &reject_all_policy(), Some(&mut messages)));
    assert!(
        messages.iter().any(|m| m.contains("member")),
        "{messages:?}"
    );
}

#[test]
fn operational_attributes_are_exempt_from_the_allowed_check() {
    let schema = Schema::core_schema();
    let entry = person_entry().with_attribute("modifyTimestamp", ["20250101000000Z"]);
    assert!(schema.validate_entry(&entry, &reject_all_policy(), None));
}

#[test]
fn unknown_object_class_is_rejected_or_warned_per_policy() {
    let schema = Schema::core_schema();
    let entry = person_entry().with_attribute("objectClass", ["noSuchClass"]);

    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &reject_all_policy(), Some(&mut messages)));
    assert!(
        messages.iter().any(|m| m.contains("noSuchClass")),
        "{messages:?}"
    );

    // Warn mode records the message but accepts the entry.
    let warn_policy = SchemaValidationPolicy::default_policy()
        .check_attributes_and_object_classes(Action::Warn);
    let mut messages = Vec::new();
    assert!(schema.validate_entry(&entry, &warn_policy, Some(&mut messages)));
    assert!(!messages.is_empty());
}

#[test]
fn entry_without_structural_class_is_rejected() {
    let schema = Schema::core_schema();
    let entry = Entry::new(Dn::new("dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "dcObject"])
        .with_attribute("dc", ["example"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &reject_all_policy(), Some(&mut messages)));
    assert!(
        messages.iter().any(|m| m.contains("no structural object class")),
        "{messages:?}"
    );
}

#[test]
fn unrelated_structural_classes_are_rejected() {
    let schema = Schema::core_schema();
    let entry = Entry::new(Dn::new("cn=Conflicted,dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "person", "organization"])
        .with_attribute("cn", ["Conflicted"])
        .with_attribute("sn", ["Conflicted"])
        .with_attribute("o", ["Example"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &reject_all_policy(), Some(&mut messages)));
    assert!(
        messages
            .iter()
            .any(|m| m.contains("multiple unrelated structural object classes")),
        "{messages:?}"
    );
}

#[test]
fn related_structural_classes_resolve_to_most_specific() {
    let schema = Schema::core_schema();
    let entry = Entry::new(Dn::new("cn=John,dc=example,dc=com"))
        .with_attribute(
            "objectClass",
            ["top", "person", "organizationalPerson", "inetOrgPerson"],
        )
        .with_attribute("cn", ["John"])
        .with_attribute("sn", ["Doe"])
        .with_attribute("mail", ["john@example.com"]);
    // mail is only allowed on inetOrgPerson; acceptance shows the most
    // specific structural class won.
    assert!(schema.validate_entry(&entry, &reject_all_policy(), None));
}

#[test]
fn empty_and_single_value_violations_are_reported() {
    let schema = Schema::core_schema();

    let empty = person_entry().with_attribute("description", Vec::<String>::new());
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&empty, &reject_all_policy(), Some(&mut messages)));
    assert!(
        messages.iter().any(|m| m.contains("has no values")),
        "{messages:?}"
    );

    let entry = Entry::new(Dn::new("cn=John,dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "person", "organizationalPerson", "inetOrgPerson"])
        .with_attribute("cn", ["John"])
        .with_attribute("sn", ["Doe"])
        .with_attribute("displayName", ["Johnny", "John"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &reject_all_policy(), Some(&mut messages)));
    assert!(
        messages
            .iter()
            .any(|m| m.contains("single-valued attribute displayName")),
        "{messages:?}"
    );
}

#[test]
fn audit_mode_collects_all_messages_without_rejecting() {
    let schema = Schema::core_schema();
    let entry = Entry::new(Dn::new("cn=Audit,dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "person"])
        .with_attribute("cn", ["Audit"])
        // Missing sn, plus an attribute no class allows.
        .with_attribute("member", ["cn=x,dc=example,dc=com"]);
    let audit = SchemaValidationPolicy::default_policy()
        .check_attributes_and_object_classes(Action::Warn)
        .check_attribute_values(Action::Warn)
        .require_single_structural_object_class(Action::Warn);
    let mut messages = Vec::new();
    assert!(schema.validate_entry(&entry, &audit, Some(&mut messages)));
    assert!(messages.len() >= 2, "{messages:?}");
}

// ---------------------------------------------------------------------
// Content rules
// ---------------------------------------------------------------------

fn schema_with_content_rule() -> Schema {
    let mut builder = SchemaBuilder::from_schema(Schema::core_schema());
    builder
        .add_dit_content_rule(
            "( 2.5.6.6 NAME 'personContent' AUX dcObject MUST uid NOT telephoneNumber )",
            false,
        )
        .unwrap();
    let schema = builder.to_schema();
    assert!(schema.warnings().is_empty(), "{:?}", schema.warnings());
    schema
}

fn content_rule_policy() -> SchemaValidationPolicy {
    SchemaValidationPolicy::default_policy().check_dit_content_rules(Action::Reject)
}

#[test]
fn content_rule_requirements_are_enforced() {
    let schema = schema_with_content_rule();

    // uid is required by the content rule.
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&person_entry(), &content_rule_policy(), Some(&mut messages)));
    assert!(
        messages
            .iter()
            .any(|m| m.contains("uid") && m.contains("personContent")),
        "{messages:?}"
    );

    let entry = person_entry().with_attribute("uid", ["jdoe"]);
    assert!(schema.validate_entry(&entry, &content_rule_policy(), None));
}

#[test]
fn content_rule_prohibited_attribute_is_rejected() {
    let schema = schema_with_content_rule();
    let entry = person_entry()
        .with_attribute("uid", ["jdoe"])
        .with_attribute("telephoneNumber", ["+1 555 0100"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &content_rule_policy(), Some(&mut messages)));
    assert!(
        messages
            .iter()
            .any(|m| m.contains("telephoneNumber") && m.contains("prohibited")),
        "{messages:?}"
    );
}

#[test]
fn content_rule_rejects_unlisted_auxiliary_class() {
    let schema = schema_with_content_rule();
    // extensibleObject is auxiliary but not in the rule's AUX list.
    let entry = person_entry()
        .with_attribute("uid", ["jdoe"])
        .with_attribute("objectClass", ["extensibleObject"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &content_rule_policy(), Some(&mut messages)));
    assert!(
        messages
            .iter()
            .any(|m| m.contains("extensibleObject") && m.contains("not allowed")),
        "{messages:?}"
    );

    // dcObject is listed and therefore fine.
    let entry = person_entry()
        .with_attribute("uid", ["jdoe"])
        .with_attribute("objectClass", ["dcObject"])
        .with_attribute("dc", ["example"]);
    let mut messages = Vec::new();
    assert!(
        schema.validate_entry(&entry, &content_rule_policy(), Some(&mut messages)),
        "{messages:?}"
    );
}

// ---------------------------------------------------------------------
// Name forms and DIT structure rules
// ---------------------------------------------------------------------

fn schema_with_structure_rules() -> Schema {
    let mut builder = SchemaBuilder::from_schema(Schema::core_schema());
    builder
        .add_name_form(
            "( 1.2.3.200 NAME 'ouNameForm' OC organizationalUnit MUST ou )",
            false,
        )
        .unwrap()
        .add_name_form(
            "( 1.2.3.201 NAME 'personNameForm' OC person MUST cn MAY uid )",
            false,
        )
        .unwrap()
        .add_dit_structure_rule("( 1 NAME 'ouRule' FORM ouNameForm )", false)
        .unwrap()
        .add_dit_structure_rule("( 2 NAME 'personRule' FORM personNameForm SUP 1 )", false)
        .unwrap();
    let schema = builder.to_schema();
    assert!(schema.warnings().is_empty(), "{:?}", schema.warnings());
    schema
}

fn structure_policy(resolver: Arc<dyn EntryResolver>) -> SchemaValidationPolicy {
    SchemaValidationPolicy::default_policy()
        .check_name_forms(Action::Reject)
        .check_dit_structure_rules(Action::Reject)
        .with_entry_resolver(resolver)
}

fn directory_resolver() -> Arc<dyn EntryResolver> {
    Arc::new(|dn: &Dn| {
        let entry = match dn.as_str() {
            "ou=people,dc=example,dc=com" => {
                Entry::new(dn.clone())
                    .with_attribute("objectClass", ["top", "organizationalUnit"])
                    .with_attribute("ou", ["people"])
            }
            "cn=John Doe,ou=people,dc=example,dc=com" => person_entry(),
            _ => {
                return Err(SchemaError::entry_resolution(
                    dn.to_string(),
                    "no such entry",
                ))
            }
        };
        Ok(entry)
    })
}

#[test]
fn name_form_accepts_conforming_rdn() {
    let schema = schema_with_structure_rules();
    let policy = SchemaValidationPolicy::default_policy().check_name_forms(Action::Reject);
    assert!(schema.validate_entry(&person_entry(), &policy, None));
}

#[test]
fn name_form_rejects_rdn_missing_required_attribute() {
    let schema = schema_with_structure_rules();
    let policy = SchemaValidationPolicy::default_policy().check_name_forms(Action::Reject);
    let entry = Entry::new(Dn::new("sn=Doe,ou=people,dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "person"])
        .with_attribute("cn", ["John Doe"])
        .with_attribute("sn", ["Doe"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &policy, Some(&mut messages)));
    assert!(
        messages
            .iter()
            .any(|m| m.contains("personNameForm")),
        "{messages:?}"
    );
}

#[test]
fn name_form_rejects_rdn_with_disallowed_attribute() {
    let schema = schema_with_structure_rules();
    let policy = SchemaValidationPolicy::default_policy().check_name_forms(Action::Reject);
    // Multi-valued RDN carrying sn, which the form neither requires nor
    // permits.
    let entry = Entry::new(Dn::new("cn=John Doe+sn=Doe,ou=people,dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "person"])
        .with_attribute("cn", ["John Doe"])
        .with_attribute("sn", ["Doe"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &policy, Some(&mut messages)));
    assert!(
        messages.iter().any(|m| m.contains("not allowed by name form")),
        "{messages:?}"
    );
}

#[test]
fn structure_rule_accepts_entry_under_legal_parent() {
    let schema = schema_with_structure_rules();
    let policy = structure_policy(directory_resolver());
    let mut messages = Vec::new();
    assert!(
        schema.validate_entry(&person_entry(), &policy, Some(&mut messages)),
        "{messages:?}"
    );
}

#[test]
fn structure_rule_rejects_entry_under_illegal_parent() {
    let schema = schema_with_structure_rules();
    // A person under a person: rule 2's superior (rule 1) governs
    // organizationalUnit parents only.
    let policy = structure_policy(directory_resolver());
    let entry = Entry::new(Dn::new(
        "cn=Child,cn=John Doe,ou=people,dc=example,dc=com",
    ))
    .with_attribute("objectClass", ["top", "person"])
    .with_attribute("cn", ["Child"])
    .with_attribute("sn", ["Doe"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &policy, Some(&mut messages)));
    assert!(
        messages
            .iter()
            .any(|m| m.contains("personRule") && m.contains("placed under")),
        "{messages:?}"
    );
}

#[test]
fn structure_rule_without_superiors_needs_no_parent() {
    let schema = schema_with_structure_rules();
    // The resolver fails for everything, which must not matter for the
    // top rule since it has no superiors.
    let failing_resolver: Arc<dyn EntryResolver> = Arc::new(|dn: &Dn| {
        Err(SchemaError::entry_resolution(dn.to_string(), "unreachable"))
    });
    let policy = structure_policy(failing_resolver);
    let entry = Entry::new(Dn::new("ou=people,dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "organizationalUnit"])
        .with_attribute("ou", ["people"]);
    assert!(schema.validate_entry(&entry, &policy, None));
}

#[test]
fn entry_without_rule_under_governed_parent_is_rejected() {
    let schema = schema_with_structure_rules();
    let policy = structure_policy(directory_resolver());
    // groupOfNames has no name form, so no structure rule applies to the
    // entry, but its parent is governed by ouRule.
    let entry = Entry::new(Dn::new("cn=Admins,ou=people,dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "groupOfNames"])
        .with_attribute("cn", ["Admins"])
        .with_attribute("member", ["cn=John Doe,ou=people,dc=example,dc=com"]);
    let mut messages = Vec::new();
    assert!(!schema.validate_entry(&entry, &policy, Some(&mut messages)));
    assert!(
        messages
            .iter()
            .any(|m| m.contains("applies to the parent entry")),
        "{messages:?}"
    );
}

#[test]
fn obsolete_name_forms_are_ignored() {
    let mut builder = SchemaBuilder::from_schema(Schema::core_schema());
    builder
        .add_name_form(
            "( 1.2.3.210 NAME 'oldPersonForm' OBSOLETE OC person MUST uid )",
            false,
        )
        .unwrap();
    let schema = builder.to_schema();
    // The only form for person is obsolete, so name form checking finds
    // no candidates and the cn-named entry passes.
    let policy = SchemaValidationPolicy::default_policy().check_name_forms(Action::Reject);
    assert!(schema.validate_entry(&person_entry(), &policy, None));
}
