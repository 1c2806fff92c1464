//! Well-known OIDs and attribute names used by the schema subsystem.
//!
//! Only the constants the SDK itself needs are listed here; servers publish
//! many more elements, all of which are handled generically.

/// Octet String syntax (RFC 4517).
pub const SYNTAX_OCTET_STRING_OID: &str = "1.3.6.1.4.1.1466.115.121.1.40";
/// Directory String syntax (RFC 4517).
pub const SYNTAX_DIRECTORY_STRING_OID: &str = "1.3.6.1.4.1.1466.115.121.1.15";
/// DN syntax (RFC 4517).
pub const SYNTAX_DN_OID: &str = "1.3.6.1.4.1.1466.115.121.1.12";
/// INTEGER syntax (RFC 4517).
pub const SYNTAX_INTEGER_OID: &str = "1.3.6.1.4.1.1466.115.121.1.27";
/// Boolean syntax (RFC 4517).
pub const SYNTAX_BOOLEAN_OID: &str = "1.3.6.1.4.1.1466.115.121.1.7";
/// OID syntax (RFC 4517).
pub const SYNTAX_OID_OID: &str = "1.3.6.1.4.1.1466.115.121.1.38";
/// Generalized Time syntax (RFC 4517).
pub const SYNTAX_GENERALIZED_TIME_OID: &str = "1.3.6.1.4.1.1466.115.121.1.24";
/// IA5 String syntax (RFC 4517).
pub const SYNTAX_IA5_STRING_OID: &str = "1.3.6.1.4.1.1466.115.121.1.26";
/// Substring Assertion syntax (RFC 4517).
pub const SYNTAX_SUBSTRING_ASSERTION_OID: &str = "1.3.6.1.4.1.1466.115.121.1.58";
/// Telephone Number syntax (RFC 4517).
pub const SYNTAX_TELEPHONE_NUMBER_OID: &str = "1.3.6.1.4.1.1466.115.121.1.50";
/// Attribute Type Description syntax (RFC 4517).
pub const SYNTAX_ATTRIBUTE_TYPE_OID: &str = "1.3.6.1.4.1.1466.115.121.1.3";
/// Object Class Description syntax (RFC 4517).
pub const SYNTAX_OBJECTCLASS_OID: &str = "1.3.6.1.4.1.1466.115.121.1.37";
/// DIT Content Rule Description syntax (RFC 4517).
pub const SYNTAX_DIT_CONTENT_RULE_OID: &str = "1.3.6.1.4.1.1466.115.121.1.16";
/// DIT Structure Rule Description syntax (RFC 4517).
pub const SYNTAX_DIT_STRUCTURE_RULE_OID: &str = "1.3.6.1.4.1.1466.115.121.1.17";
/// Matching Rule Description syntax (RFC 4517).
pub const SYNTAX_MATCHING_RULE_OID: &str = "1.3.6.1.4.1.1466.115.121.1.30";
/// Matching Rule Use Description syntax (RFC 4517).
pub const SYNTAX_MATCHING_RULE_USE_OID: &str = "1.3.6.1.4.1.1466.115.121.1.31";
/// Name Form Description syntax (RFC 4517).
pub const SYNTAX_NAME_FORM_OID: &str = "1.3.6.1.4.1.1466.115.121.1.35";
/// LDAP Syntax Description syntax (RFC 4517).
pub const SYNTAX_LDAP_SYNTAX_OID: &str = "1.3.6.1.4.1.1466.115.121.1.54";

/// objectIdentifierMatch.
pub const EMR_OID_OID: &str = "2.5.13.0";
/// distinguishedNameMatch.
pub const EMR_DN_OID: &str = "2.5.13.1";
/// caseIgnoreMatch.
pub const EMR_CASE_IGNORE_OID: &str = "2.5.13.2";
/// caseIgnoreOrderingMatch.
pub const OMR_CASE_IGNORE_OID: &str = "2.5.13.3";
/// caseIgnoreSubstringsMatch.
pub const SMR_CASE_IGNORE_OID: &str = "2.5.13.4";
/// caseExactMatch.
pub const EMR_CASE_EXACT_OID: &str = "2.5.13.5";
/// booleanMatch.
pub const EMR_BOOLEAN_OID: &str = "2.5.13.13";
/// integerMatch.
pub const EMR_INTEGER_OID: &str = "2.5.13.14";
/// integerOrderingMatch.
pub const OMR_INTEGER_OID: &str = "2.5.13.15";
/// octetStringMatch.
pub const EMR_OCTET_STRING_OID: &str = "2.5.13.17";
/// octetStringOrderingMatch.
pub const OMR_OCTET_STRING_OID: &str = "2.5.13.18";
/// telephoneNumberMatch.
pub const EMR_TELEPHONE_OID: &str = "2.5.13.20";
/// generalizedTimeMatch.
pub const EMR_GENERALIZED_TIME_OID: &str = "2.5.13.27";
/// generalizedTimeOrderingMatch.
pub const OMR_GENERALIZED_TIME_OID: &str = "2.5.13.28";
/// caseIgnoreIA5Match.
pub const EMR_CASE_IGNORE_IA5_OID: &str = "1.3.6.1.4.1.1466.109.114.2";

/// The `top` abstract object class.
pub const TOP_OBJECTCLASS_OID: &str = "2.5.6.0";
/// The `top` object class name.
pub const TOP_OBJECTCLASS_NAME: &str = "top";

/// Name prefix of ordering matching rules synthesized for `X-ENUM` syntaxes.
pub const OMR_GENERIC_ENUM_NAME: &str = "enumOrderingMatch";
/// OID arc under which synthesized enumeration ordering rules are minted;
/// the enumeration syntax's own OID is appended.
pub const OMR_GENERIC_ENUM_OID_PREFIX: &str = "1.3.6.1.4.1.26027.1.4.5";

/// Subschema subentry attribute holding syntax definitions.
pub const ATTR_LDAP_SYNTAXES: &str = "ldapSyntaxes";
/// Subschema subentry attribute holding attribute type definitions.
pub const ATTR_ATTRIBUTE_TYPES: &str = "attributeTypes";
/// Subschema subentry attribute holding object class definitions.
pub const ATTR_OBJECT_CLASSES: &str = "objectClasses";
/// Subschema subentry attribute holding matching rule definitions.
pub const ATTR_MATCHING_RULES: &str = "matchingRules";
/// Subschema subentry attribute holding matching rule use definitions.
pub const ATTR_MATCHING_RULE_USE: &str = "matchingRuleUse";
/// Subschema subentry attribute holding DIT content rule definitions.
pub const ATTR_DIT_CONTENT_RULES: &str = "dITContentRules";
/// Subschema subentry attribute holding DIT structure rule definitions.
pub const ATTR_DIT_STRUCTURE_RULES: &str = "dITStructureRules";
/// Subschema subentry attribute holding name form definitions.
pub const ATTR_NAME_FORMS: &str = "nameForms";
/// The `objectClass` attribute.
pub const ATTR_OBJECT_CLASS: &str = "objectClass";
/// The `subschemaSubentry` operational attribute.
pub const ATTR_SUBSCHEMA_SUBENTRY: &str = "subschemaSubentry";
