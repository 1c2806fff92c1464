//! # ldapkit-schema
//!
//! Directory schema model, parsing and validation for the ldapkit LDAP
//! SDK.
//!
//! This crate models the schema elements a directory server publishes
//! (attribute types, object classes, syntaxes, matching rules, name
//! forms, DIT content and structure rules) as an immutable, validated
//! graph, with strict and non-strict resolution semantics.
//!
//! ## Example
//!
//! ```
//! use ldapkit_schema::prelude::*;
//!
//! let mut builder = SchemaBuilder::from_schema(Schema::core_schema());
//! builder
//!     .add_attribute_type(
//!         "( 1.2.3.4 NAME 'deviceSerial' EQUALITY caseIgnoreMatch \
//!          SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 SINGLE-VALUE )",
//!         false,
//!     )
//!     .unwrap();
//! let schema = builder.to_schema();
//! assert!(schema.warnings().is_empty());
//! assert!(schema.has_attribute_type("deviceSerial"));
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - the immutable [`Schema`] aggregate and its views
//! - [`builder`] - [`SchemaBuilder`]: parsing and incremental assembly
//! - [`attribute_type`], [`object_class`], [`syntax`], [`matching_rule`],
//!   [`name_form`], [`content_rule`], [`structure_rule`] - element types
//! - [`policy`] - entry validation policy
//! - [`entry`] - minimal entry/DN containers consumed by validation
//! - [`oids`] - well-known OID constants
//!
//! [`Schema`]: schema::Schema
//! [`SchemaBuilder`]: builder::SchemaBuilder

pub mod attribute_type;
pub mod builder;
pub mod content_rule;
mod core;
pub mod element;
pub mod entry;
pub mod error;
pub mod matching_rule;
pub mod name_form;
pub mod object_class;
pub mod oids;
pub mod policy;
mod reader;
pub mod schema;
pub mod structure_rule;
pub mod syntax;
mod validation;

/// Prelude module for convenient imports.
///
/// ```
/// use ldapkit_schema::prelude::*;
/// ```
pub mod prelude {
    pub use crate::attribute_type::{AttributeType, AttributeUsage};
    pub use crate::builder::SchemaBuilder;
    pub use crate::content_rule::DitContentRule;
    pub use crate::element::ExtraProperties;
    pub use crate::entry::{Attribute, Ava, Dn, Entry, Rdn};
    pub use crate::error::{SchemaError, SchemaResult};
    pub use crate::matching_rule::{MatchingRule, MatchingRuleKind, MatchingRuleUse};
    pub use crate::name_form::NameForm;
    pub use crate::object_class::{ObjectClass, ObjectClassKind};
    pub use crate::policy::{Action, EntryResolver, SchemaValidationPolicy};
    pub use crate::schema::Schema;
    pub use crate::structure_rule::DitStructureRule;
    pub use crate::syntax::{Syntax, SyntaxKind};
}

pub use crate::builder::SchemaBuilder;
pub use crate::error::{SchemaError, SchemaResult};
pub use crate::schema::Schema;
