//! The core schema: standard LDAP schema elements from RFC 4512 (directory
//! information models), RFC 4517 (syntaxes and matching rules) and RFC 4519
//! (user application schema).
//!
//! This is a deliberately compact subset covering the elements the SDK and
//! common directory deployments rely on; servers publish their full schema
//! through the subschema subentry, which is the authoritative source.

use std::sync::LazyLock;

use crate::builder::SchemaBuilder;
use crate::schema::Schema;

static CORE_SCHEMA: LazyLock<Schema> = LazyLock::new(build_core_schema);

pub(crate) fn core_schema() -> &'static Schema {
    &CORE_SCHEMA
}

const CORE_SYNTAXES: &[&str] = &[
    "( 1.3.6.1.4.1.1466.115.121.1.3 DESC 'Attribute Type Description' )",
    "( 1.3.6.1.4.1.1466.115.121.1.7 DESC 'Boolean' )",
    "( 1.3.6.1.4.1.1466.115.121.1.12 DESC 'DN' )",
    "( 1.3.6.1.4.1.1466.115.121.1.15 DESC 'Directory String' )",
    "( 1.3.6.1.4.1.1466.115.121.1.16 DESC 'DIT Content Rule Description' )",
    "( 1.3.6.1.4.1.1466.115.121.1.17 DESC 'DIT Structure Rule Description' )",
    "( 1.3.6.1.4.1.1466.115.121.1.24 DESC 'Generalized Time' )",
    "( 1.3.6.1.4.1.1466.115.121.1.26 DESC 'IA5 String' )",
    "( 1.3.6.1.4.1.1466.115.121.1.27 DESC 'INTEGER' )",
    "( 1.3.6.1.4.1.1466.115.121.1.30 DESC 'Matching Rule Description' )",
    "( 1.3.6.1.4.1.1466.115.121.1.31 DESC 'Matching Rule Use Description' )",
    "( 1.3.6.1.4.1.1466.115.121.1.35 DESC 'Name Form Description' )",
    "( 1.3.6.1.4.1.1466.115.121.1.37 DESC 'Object Class Description' )",
    "( 1.3.6.1.4.1.1466.115.121.1.38 DESC 'OID' )",
    "( 1.3.6.1.4.1.1466.115.121.1.40 DESC 'Octet String' )",
    "( 1.3.6.1.4.1.1466.115.121.1.50 DESC 'Telephone Number' )",
    "( 1.3.6.1.4.1.1466.115.121.1.54 DESC 'LDAP Syntax Description' )",
    "( 1.3.6.1.4.1.1466.115.121.1.58 DESC 'Substring Assertion' )",
];

const CORE_MATCHING_RULES: &[&str] = &[
    "( 2.5.13.0 NAME 'objectIdentifierMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 )",
    "( 2.5.13.1 NAME 'distinguishedNameMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 )",
    "( 2.5.13.2 NAME 'caseIgnoreMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 2.5.13.3 NAME 'caseIgnoreOrderingMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 2.5.13.4 NAME 'caseIgnoreSubstringsMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.58 )",
    "( 2.5.13.5 NAME 'caseExactMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 2.5.13.13 NAME 'booleanMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.7 )",
    "( 2.5.13.14 NAME 'integerMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.27 )",
    "( 2.5.13.15 NAME 'integerOrderingMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.27 )",
    "( 2.5.13.17 NAME 'octetStringMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.40 )",
    "( 2.5.13.18 NAME 'octetStringOrderingMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.40 )",
    "( 2.5.13.20 NAME 'telephoneNumberMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.50 )",
    "( 2.5.13.27 NAME 'generalizedTimeMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.24 )",
    "( 2.5.13.28 NAME 'generalizedTimeOrderingMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.24 )",
    "( 1.3.6.1.4.1.1466.109.114.2 NAME 'caseIgnoreIA5Match' SYNTAX 1.3.6.1.4.1.1466.115.121.1.26 )",
];

const CORE_ATTRIBUTE_TYPES: &[&str] = &[
    "( 2.5.4.0 NAME 'objectClass' EQUALITY objectIdentifierMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 X-ORIGIN 'RFC 4512' )",
    "( 2.5.4.1 NAME 'aliasedObjectName' EQUALITY distinguishedNameMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 SINGLE-VALUE X-ORIGIN 'RFC 4512' )",
    "( 2.5.4.41 NAME 'name' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.4 NAME ( 'sn' 'surname' ) SUP name X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.7 NAME 'l' SUP name X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.8 NAME 'st' SUP name X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.10 NAME 'o' SUP name X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.11 NAME 'ou' SUP name X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.12 NAME 'title' SUP name X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.13 NAME 'description' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.20 NAME 'telephoneNumber' EQUALITY telephoneNumberMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.50 X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.31 NAME 'member' EQUALITY distinguishedNameMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.32 NAME 'owner' EQUALITY distinguishedNameMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.34 NAME 'seeAlso' SUP distinguishedName X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.35 NAME 'userPassword' EQUALITY octetStringMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.40 X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.42 NAME 'givenName' SUP name X-ORIGIN 'RFC 4519' )",
    "( 2.5.4.49 NAME 'distinguishedName' EQUALITY distinguishedNameMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 X-ORIGIN 'RFC 4519' )",
    "( 0.9.2342.19200300.100.1.1 NAME 'uid' EQUALITY caseIgnoreMatch \
     SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 \
     X-ORIGIN 'RFC 4519' )",
    "( 0.9.2342.19200300.100.1.3 NAME 'mail' EQUALITY caseIgnoreIA5Match \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.26 X-ORIGIN 'RFC 4524' )",
    "( 0.9.2342.19200300.100.1.25 NAME 'dc' EQUALITY caseIgnoreIA5Match \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.26 SINGLE-VALUE X-ORIGIN 'RFC 4519' )",
    "( 2.16.840.1.113730.3.1.241 NAME 'displayName' EQUALITY caseIgnoreMatch \
     SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 \
     SINGLE-VALUE X-ORIGIN 'RFC 2798' )",
    // Operational attributes.
    "( 2.5.18.1 NAME 'createTimestamp' EQUALITY generalizedTimeMatch \
     ORDERING generalizedTimeOrderingMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.24 \
     SINGLE-VALUE NO-USER-MODIFICATION USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.18.2 NAME 'modifyTimestamp' EQUALITY generalizedTimeMatch \
     ORDERING generalizedTimeOrderingMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.24 \
     SINGLE-VALUE NO-USER-MODIFICATION USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.18.3 NAME 'creatorsName' EQUALITY distinguishedNameMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 SINGLE-VALUE NO-USER-MODIFICATION \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.18.4 NAME 'modifiersName' EQUALITY distinguishedNameMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 SINGLE-VALUE NO-USER-MODIFICATION \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.18.10 NAME 'subschemaSubentry' EQUALITY distinguishedNameMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 SINGLE-VALUE NO-USER-MODIFICATION \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.21.9 NAME 'structuralObjectClass' EQUALITY objectIdentifierMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 SINGLE-VALUE NO-USER-MODIFICATION \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.21.10 NAME 'governingStructureRule' EQUALITY integerMatch \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.27 SINGLE-VALUE NO-USER-MODIFICATION \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    // Subschema subentry attributes.
    "( 2.5.21.1 NAME 'dITStructureRules' SYNTAX 1.3.6.1.4.1.1466.115.121.1.17 \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.21.2 NAME 'dITContentRules' SYNTAX 1.3.6.1.4.1.1466.115.121.1.16 \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.21.4 NAME 'matchingRules' SYNTAX 1.3.6.1.4.1.1466.115.121.1.30 \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.21.5 NAME 'attributeTypes' SYNTAX 1.3.6.1.4.1.1466.115.121.1.3 \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.21.6 NAME 'objectClasses' SYNTAX 1.3.6.1.4.1.1466.115.121.1.37 \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.21.7 NAME 'nameForms' SYNTAX 1.3.6.1.4.1.1466.115.121.1.35 \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 2.5.21.8 NAME 'matchingRuleUse' SYNTAX 1.3.6.1.4.1.1466.115.121.1.31 \
     USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
    "( 1.3.6.1.4.1.1466.101.120.16 NAME 'ldapSyntaxes' \
     SYNTAX 1.3.6.1.4.1.1466.115.121.1.54 USAGE directoryOperation X-ORIGIN 'RFC 4512' )",
];

const CORE_OBJECT_CLASSES: &[&str] = &[
    "( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass X-ORIGIN 'RFC 4512' )",
    "( 2.5.6.1 NAME 'alias' SUP top STRUCTURAL MUST aliasedObjectName X-ORIGIN 'RFC 4512' )",
    "( 2.5.6.4 NAME 'organization' SUP top STRUCTURAL MUST o \
     MAY ( description $ l $ st $ seeAlso $ telephoneNumber ) X-ORIGIN 'RFC 4519' )",
    "( 2.5.6.5 NAME 'organizationalUnit' SUP top STRUCTURAL MUST ou \
     MAY ( description $ l $ st $ seeAlso $ telephoneNumber ) X-ORIGIN 'RFC 4519' )",
    "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn ) \
     MAY ( userPassword $ telephoneNumber $ seeAlso $ description ) X-ORIGIN 'RFC 4519' )",
    "( 2.5.6.7 NAME 'organizationalPerson' SUP person STRUCTURAL \
     MAY ( title $ l $ st $ ou $ telephoneNumber ) X-ORIGIN 'RFC 4519' )",
    "( 2.16.840.1.113730.3.2.2 NAME 'inetOrgPerson' SUP organizationalPerson STRUCTURAL \
     MAY ( givenName $ displayName $ mail $ uid ) X-ORIGIN 'RFC 2798' )",
    "( 2.5.6.9 NAME 'groupOfNames' SUP top STRUCTURAL MUST ( member $ cn ) \
     MAY ( o $ ou $ owner $ seeAlso $ description ) X-ORIGIN 'RFC 4519' )",
    "( 1.3.6.1.4.1.1466.344 NAME 'dcObject' SUP top AUXILIARY MUST dc X-ORIGIN 'RFC 4519' )",
    "( 2.5.20.1 NAME 'subschema' AUXILIARY \
     MAY ( dITStructureRules $ nameForms $ dITContentRules $ objectClasses $ \
     attributeTypes $ matchingRules $ matchingRuleUse ) X-ORIGIN 'RFC 4512' )",
    "( 1.3.6.1.4.1.1466.101.120.111 NAME 'extensibleObject' SUP top AUXILIARY \
     X-ORIGIN 'RFC 4512' )",
];

fn build_core_schema() -> Schema {
    let mut builder = SchemaBuilder::with_name("Core Schema");
    for definition in CORE_SYNTAXES {
        builder
            .add_syntax(definition, false)
            .expect("core schema syntax definition");
    }
    for definition in CORE_MATCHING_RULES {
        builder
            .add_matching_rule(definition, false)
            .expect("core schema matching rule definition");
    }
    for definition in CORE_ATTRIBUTE_TYPES {
        builder
            .add_attribute_type(definition, false)
            .expect("core schema attribute type definition");
    }
    for definition in CORE_OBJECT_CLASSES {
        builder
            .add_object_class(definition, false)
            .expect("core schema object class definition");
    }
    builder.to_schema().as_non_strict_schema()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_class::ObjectClassKind;

    #[test]
    fn test_core_schema_is_clean() {
        let schema = Schema::core_schema();
        assert!(
            schema.warnings().is_empty(),
            "core schema has warnings: {:?}",
            schema.warnings()
        );
        assert!(!schema.is_strict());
    }

    #[test]
    fn test_core_schema_contents() {
        let schema = Schema::core_schema();
        assert!(schema.has_syntax("1.3.6.1.4.1.1466.115.121.1.15"));
        assert!(schema.has_matching_rule("caseIgnoreMatch"));
        assert!(schema.has_attribute_type("cn"));
        assert!(schema.has_object_class("person"));
        assert!(schema.has_object_class("inetOrgPerson"));

        let top = schema.get_object_class("top").unwrap();
        assert_eq!(top.kind(), ObjectClassKind::Abstract);
    }

    #[test]
    fn test_person_inherits_from_top() {
        let schema = Schema::core_schema();
        let top = schema.get_object_class("top").unwrap();
        let person = schema.get_object_class("person").unwrap();
        let inet = schema.get_object_class("inetOrgPerson").unwrap();

        assert!(person.is_descendant_of(&top));
        assert!(inet.is_descendant_of(&person));
        assert!(inet.is_descendant_of(&top));

        // Effective sets union the whole chain.
        let cn = schema.get_attribute_type("cn").unwrap();
        let mail = schema.get_attribute_type("mail").unwrap();
        assert!(inet.required_oids().contains(cn.oid()));
        assert!(inet.optional_oids().contains(mail.oid()));
    }

    #[test]
    fn test_attribute_type_inheritance() {
        let schema = Schema::core_schema();
        let cn = schema.get_attribute_type("cn").unwrap();
        // cn has no SYNTAX of its own; it inherits Directory String
        // through its superior.
        assert_eq!(cn.syntax_oid(), Some("1.3.6.1.4.1.1466.115.121.1.15"));
        assert_eq!(cn.equality_matching_rule_oid(), Some("2.5.13.2"));
    }
}
