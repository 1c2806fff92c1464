//! Schema builder: the mutable staging area for schema construction.
//!
//! Definitions are accepted either as RFC 2252 text or as structured
//! elements, staged in mutable indices, and materialized into an immutable
//! [`Schema`] by [`SchemaBuilder::to_schema`], which runs full
//! cross-reference validation.
//!
//! The builder is a single-writer object and is not safe for concurrent
//! mutation. After `to_schema` it re-arms itself with the freshly built
//! schema as a copy-on-write base, so it can keep being used for
//! incremental edits without paying a rebuild when nothing changed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::attribute_type::{AttributeType, AttributeUsage};
use crate::content_rule::DitContentRule;
use crate::entry::Entry;
use crate::error::{SchemaError, SchemaResult};
use crate::matching_rule::{MatchingRule, MatchingRuleKind, MatchingRuleUse};
use crate::name_form::NameForm;
use crate::object_class::{ObjectClass, ObjectClassKind};
use crate::oids;
use crate::reader::{is_extension_token, DefinitionReader};
use crate::schema::Schema;
use crate::structure_rule::DitStructureRule;
use crate::syntax::{Syntax, SyntaxKind};
use crate::validation;

static NEXT_SCHEMA_ID: AtomicUsize = AtomicUsize::new(0);

/// Mutable staging indices. Lives only between the first mutation and the
/// next `to_schema` call.
#[derive(Debug, Default)]
pub(crate) struct Staging {
    pub(crate) syntaxes: BTreeMap<String, Syntax>,
    pub(crate) matching_rules: BTreeMap<String, MatchingRule>,
    pub(crate) matching_rule_uses: BTreeMap<String, MatchingRuleUse>,
    pub(crate) attribute_types: BTreeMap<String, AttributeType>,
    pub(crate) object_classes: BTreeMap<String, ObjectClass>,
    pub(crate) name_forms: BTreeMap<String, NameForm>,
    pub(crate) content_rules: BTreeMap<String, DitContentRule>,
    pub(crate) structure_rules: BTreeMap<u32, DitStructureRule>,
    // Lowercase name to identity keys; a name may refer to several
    // elements of the same kind.
    pub(crate) matching_rules_by_name: BTreeMap<String, Vec<String>>,
    pub(crate) matching_rule_uses_by_name: BTreeMap<String, Vec<String>>,
    pub(crate) attribute_types_by_name: BTreeMap<String, Vec<String>>,
    pub(crate) object_classes_by_name: BTreeMap<String, Vec<String>>,
    pub(crate) name_forms_by_name: BTreeMap<String, Vec<String>>,
    pub(crate) content_rules_by_name: BTreeMap<String, Vec<String>>,
    pub(crate) structure_rules_by_name: BTreeMap<String, Vec<u32>>,
    pub(crate) warnings: Vec<String>,
    pub(crate) default_syntax_oid: String,
    pub(crate) default_matching_rule_oid: String,
}

fn index_names(index: &mut BTreeMap<String, Vec<String>>, names: &[String], key: &str) {
    for name in names {
        index
            .entry(name.to_lowercase())
            .or_default()
            .push(key.to_string());
    }
}

fn unindex_names(index: &mut BTreeMap<String, Vec<String>>, names: &[String], key: &str) {
    for name in names {
        let lower = name.to_lowercase();
        if let Some(keys) = index.get_mut(&lower) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                index.remove(&lower);
            }
        }
    }
}

impl Staging {
    fn new() -> Self {
        Staging {
            default_syntax_oid: oids::SYNTAX_OCTET_STRING_OID.to_string(),
            default_matching_rule_oid: oids::EMR_OCTET_STRING_OID.to_string(),
            ..Staging::default()
        }
    }

    fn from_base(base: Option<Schema>) -> Self {
        let mut staging = Staging::new();
        if let Some(schema) = base {
            staging.default_syntax_oid = schema.default_syntax().oid().to_string();
            staging.default_matching_rule_oid =
                schema.default_matching_rule().oid().to_string();
            // Elements are duplicated so that no element is ever shared
            // between the base schema and the one built from this staging.
            for syntax in schema.syntaxes() {
                staging.insert_syntax((*syntax).clone());
            }
            for rule in schema.matching_rules() {
                staging.insert_matching_rule((*rule).clone());
            }
            for use_ in schema.matching_rule_uses() {
                staging.insert_matching_rule_use((*use_).clone());
            }
            for attribute_type in schema.attribute_types() {
                staging.insert_attribute_type((*attribute_type).clone());
            }
            for object_class in schema.object_classes() {
                staging.insert_object_class((*object_class).clone());
            }
            for form in schema.name_forms() {
                staging.insert_name_form((*form).clone());
            }
            for rule in schema.dit_content_rules() {
                staging.insert_content_rule((*rule).clone());
            }
            for rule in schema.dit_structure_rules() {
                staging.insert_structure_rule((*rule).clone());
            }
        }
        staging
    }

    fn insert_syntax(&mut self, syntax: Syntax) {
        self.syntaxes.insert(syntax.oid.clone(), syntax);
    }

    fn remove_syntax_element(&mut self, oid: &str) {
        self.syntaxes.remove(oid);
    }

    fn insert_matching_rule(&mut self, rule: MatchingRule) {
        index_names(&mut self.matching_rules_by_name, &rule.names, &rule.oid);
        self.matching_rules.insert(rule.oid.clone(), rule);
    }

    pub(crate) fn remove_matching_rule_element(&mut self, oid: &str) {
        if let Some(rule) = self.matching_rules.remove(oid) {
            unindex_names(&mut self.matching_rules_by_name, &rule.names, oid);
        }
    }

    fn insert_matching_rule_use(&mut self, use_: MatchingRuleUse) {
        index_names(
            &mut self.matching_rule_uses_by_name,
            &use_.names,
            &use_.matching_rule_oid,
        );
        self.matching_rule_uses
            .insert(use_.matching_rule_oid.clone(), use_);
    }

    pub(crate) fn remove_matching_rule_use_element(&mut self, key: &str) {
        if let Some(use_) = self.matching_rule_uses.remove(key) {
            unindex_names(&mut self.matching_rule_uses_by_name, &use_.names, key);
        }
    }

    fn insert_attribute_type(&mut self, attribute_type: AttributeType) {
        index_names(
            &mut self.attribute_types_by_name,
            &attribute_type.names,
            &attribute_type.oid,
        );
        self.attribute_types
            .insert(attribute_type.oid.clone(), attribute_type);
    }

    pub(crate) fn remove_attribute_type_element(&mut self, oid: &str) {
        if let Some(attribute_type) = self.attribute_types.remove(oid) {
            unindex_names(&mut self.attribute_types_by_name, &attribute_type.names, oid);
        }
    }

    fn insert_object_class(&mut self, object_class: ObjectClass) {
        index_names(
            &mut self.object_classes_by_name,
            &object_class.names,
            &object_class.oid,
        );
        self.object_classes
            .insert(object_class.oid.clone(), object_class);
    }

    pub(crate) fn remove_object_class_element(&mut self, oid: &str) {
        if let Some(object_class) = self.object_classes.remove(oid) {
            unindex_names(&mut self.object_classes_by_name, &object_class.names, oid);
        }
    }

    fn insert_name_form(&mut self, form: NameForm) {
        index_names(&mut self.name_forms_by_name, &form.names, &form.oid);
        self.name_forms.insert(form.oid.clone(), form);
    }

    pub(crate) fn remove_name_form_element(&mut self, oid: &str) {
        if let Some(form) = self.name_forms.remove(oid) {
            unindex_names(&mut self.name_forms_by_name, &form.names, oid);
        }
    }

    fn insert_content_rule(&mut self, rule: DitContentRule) {
        index_names(
            &mut self.content_rules_by_name,
            &rule.names,
            &rule.structural_class_oid,
        );
        self.content_rules
            .insert(rule.structural_class_oid.clone(), rule);
    }

    pub(crate) fn remove_content_rule_element(&mut self, key: &str) {
        if let Some(rule) = self.content_rules.remove(key) {
            unindex_names(&mut self.content_rules_by_name, &rule.names, key);
        }
    }

    fn insert_structure_rule(&mut self, rule: DitStructureRule) {
        for name in &rule.names {
            self.structure_rules_by_name
                .entry(name.to_lowercase())
                .or_default()
                .push(rule.rule_id);
        }
        self.structure_rules.insert(rule.rule_id, rule);
    }

    pub(crate) fn remove_structure_rule_element(&mut self, rule_id: u32) {
        if let Some(rule) = self.structure_rules.remove(&rule_id) {
            for name in &rule.names {
                let lower = name.to_lowercase();
                if let Some(ids) = self.structure_rules_by_name.get_mut(&lower) {
                    ids.retain(|id| *id != rule_id);
                    if ids.is_empty() {
                        self.structure_rules_by_name.remove(&lower);
                    }
                }
            }
        }
    }

    /// Resolve an attribute type reference (name or OID) to its OID.
    pub(crate) fn find_attribute_type_oid(&self, name_or_oid: &str) -> Result<String, String> {
        if self.attribute_types.contains_key(name_or_oid) {
            return Ok(name_or_oid.to_string());
        }
        match self.attribute_types_by_name.get(&name_or_oid.to_lowercase()) {
            Some(keys) if keys.len() == 1 => Ok(keys[0].clone()),
            Some(_) => Err(format!("attribute type name {name_or_oid} is ambiguous")),
            None => Err(format!("attribute type {name_or_oid} is not defined")),
        }
    }

    /// Resolve an object class reference (name or OID) to its OID.
    pub(crate) fn find_object_class_oid(&self, name_or_oid: &str) -> Result<String, String> {
        if self.object_classes.contains_key(name_or_oid) {
            return Ok(name_or_oid.to_string());
        }
        match self.object_classes_by_name.get(&name_or_oid.to_lowercase()) {
            Some(keys) if keys.len() == 1 => Ok(keys[0].clone()),
            Some(_) => Err(format!("object class name {name_or_oid} is ambiguous")),
            None => Err(format!("object class {name_or_oid} is not defined")),
        }
    }

    /// Resolve a matching rule reference (name or OID) to its OID.
    pub(crate) fn find_matching_rule_oid(&self, name_or_oid: &str) -> Result<String, String> {
        if self.matching_rules.contains_key(name_or_oid) {
            return Ok(name_or_oid.to_string());
        }
        match self.matching_rules_by_name.get(&name_or_oid.to_lowercase()) {
            Some(keys) if keys.len() == 1 => Ok(keys[0].clone()),
            Some(_) => Err(format!("matching rule name {name_or_oid} is ambiguous")),
            None => Err(format!("matching rule {name_or_oid} is not defined")),
        }
    }

    /// Resolve a name form reference (name or OID) to its OID.
    pub(crate) fn find_name_form_oid(&self, name_or_oid: &str) -> Result<String, String> {
        if self.name_forms.contains_key(name_or_oid) {
            return Ok(name_or_oid.to_string());
        }
        match self.name_forms_by_name.get(&name_or_oid.to_lowercase()) {
            Some(keys) if keys.len() == 1 => Ok(keys[0].clone()),
            Some(_) => Err(format!("name form name {name_or_oid} is ambiguous")),
            None => Err(format!("name form {name_or_oid} is not defined")),
        }
    }
}

/// Mutable construction and parsing front-end for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema_name: Option<String>,
    copy_on_write: Option<Schema>,
    staging: Option<Staging>,
}

impl SchemaBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        SchemaBuilder::default()
    }

    /// Create an empty builder with a user-friendly schema name.
    pub fn with_name(name: impl Into<String>) -> Self {
        SchemaBuilder {
            schema_name: Some(name.into()),
            ..SchemaBuilder::default()
        }
    }

    /// Seed a builder from an existing schema.
    ///
    /// The schema is held copy-on-write: nothing is duplicated until the
    /// first mutation, and `to_schema` on an untouched builder returns the
    /// seed schema itself.
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Self {
        SchemaBuilder {
            schema_name: Some(schema.schema_name().to_string()),
            copy_on_write: Some(schema.clone()),
            staging: None,
        }
    }

    /// Seed a builder from a subschema subentry.
    ///
    /// Unparseable definitions are recorded as warnings on the built
    /// schema, not surfaced as errors.
    #[must_use]
    pub fn from_entry(entry: &Entry) -> Self {
        let mut builder = SchemaBuilder::with_name(entry.name().to_string());
        builder.add_schema_entry(entry, true);
        builder
    }

    fn staging_mut(&mut self) -> &mut Staging {
        let base = if self.staging.is_none() {
            self.copy_on_write.take()
        } else {
            None
        };
        self.staging.get_or_insert_with(|| Staging::from_base(base))
    }

    /// Override the default syntax used for unrecognized attributes.
    pub fn set_default_syntax_oid(&mut self, oid: impl Into<String>) -> &mut Self {
        self.staging_mut().default_syntax_oid = oid.into();
        self
    }

    /// Override the default matching rule used for unrecognized attributes.
    pub fn set_default_matching_rule_oid(&mut self, oid: impl Into<String>) -> &mut Self {
        self.staging_mut().default_matching_rule_oid = oid.into();
        self
    }

    // ------------------------------------------------------------------
    // Textual definitions
    // ------------------------------------------------------------------

    /// Parse and stage an attribute type definition.
    pub fn add_attribute_type(
        &mut self,
        definition: &str,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let attribute_type = parse_attribute_type(definition)?;
        self.insert_attribute_type(attribute_type, overwrite)?;
        Ok(self)
    }

    /// Parse and stage an object class definition.
    pub fn add_object_class(
        &mut self,
        definition: &str,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let object_class = parse_object_class(definition)?;
        self.insert_object_class(object_class, overwrite)?;
        Ok(self)
    }

    /// Parse and stage a syntax definition.
    ///
    /// A definition carrying an `X-ENUM` extension registers both the
    /// syntax and a synthesized enumeration ordering matching rule; if the
    /// matching rule registration conflicts, the syntax registration is
    /// rolled back.
    pub fn add_syntax(&mut self, definition: &str, overwrite: bool) -> SchemaResult<&mut Self> {
        let syntax = parse_syntax(definition)?;
        self.insert_syntax(syntax, overwrite)?;
        Ok(self)
    }

    /// Parse and stage a matching rule definition.
    pub fn add_matching_rule(
        &mut self,
        definition: &str,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let rule = parse_matching_rule(definition)?;
        self.insert_matching_rule(rule, overwrite)?;
        Ok(self)
    }

    /// Parse and stage a matching rule use definition.
    pub fn add_matching_rule_use(
        &mut self,
        definition: &str,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let use_ = parse_matching_rule_use(definition)?;
        self.insert_matching_rule_use(use_, overwrite)?;
        Ok(self)
    }

    /// Parse and stage a name form definition.
    pub fn add_name_form(&mut self, definition: &str, overwrite: bool) -> SchemaResult<&mut Self> {
        let form = parse_name_form(definition)?;
        self.insert_name_form(form, overwrite)?;
        Ok(self)
    }

    /// Parse and stage a DIT content rule definition.
    pub fn add_dit_content_rule(
        &mut self,
        definition: &str,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let rule = parse_content_rule(definition)?;
        self.insert_dit_content_rule(rule, overwrite)?;
        Ok(self)
    }

    /// Parse and stage a DIT structure rule definition.
    pub fn add_dit_structure_rule(
        &mut self,
        definition: &str,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let rule = parse_structure_rule(definition)?;
        self.insert_dit_structure_rule(rule, overwrite)?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Structured definitions
    // ------------------------------------------------------------------

    /// Stage a structured attribute type.
    pub fn insert_attribute_type(
        &mut self,
        attribute_type: AttributeType,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let staging = self.staging_mut();
        if let Some(existing) = staging.attribute_types.get(&attribute_type.oid) {
            if !overwrite {
                return Err(SchemaError::conflicting_element(
                    "attribute type",
                    attribute_type.name_or_oid().to_string(),
                    existing.name_or_oid().to_string(),
                    attribute_type.oid.clone(),
                ));
            }
            staging.remove_attribute_type_element(&attribute_type.oid.clone());
        }
        staging.insert_attribute_type(attribute_type);
        Ok(self)
    }

    /// Stage a structured object class.
    pub fn insert_object_class(
        &mut self,
        object_class: ObjectClass,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let staging = self.staging_mut();
        if let Some(existing) = staging.object_classes.get(&object_class.oid) {
            if !overwrite {
                return Err(SchemaError::conflicting_element(
                    "object class",
                    object_class.name_or_oid().to_string(),
                    existing.name_or_oid().to_string(),
                    object_class.oid.clone(),
                ));
            }
            staging.remove_object_class_element(&object_class.oid.clone());
        }
        staging.insert_object_class(object_class);
        Ok(self)
    }

    /// Stage a structured syntax, splitting off the enumeration ordering
    /// matching rule when an `X-ENUM` extension is present.
    pub fn insert_syntax(&mut self, mut syntax: Syntax, overwrite: bool) -> SchemaResult<&mut Self> {
        let enum_values = syntax
            .extra_properties
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("x-enum"))
            .map(|(_, values)| values.clone());

        if let Some(values) = enum_values {
            syntax.kind = SyntaxKind::Enumeration(values.clone());
            let oid = syntax.oid.clone();
            let mut ordering_rule = MatchingRule::new(
                format!("{}.{}", oids::OMR_GENERIC_ENUM_OID_PREFIX, oid),
                oid.clone(),
            )
            .with_name(format!("{}{}", oids::OMR_GENERIC_ENUM_NAME, oid));
            ordering_rule.kind = MatchingRuleKind::EnumOrdering(values);

            self.insert_raw_syntax(syntax, overwrite)?;
            let registered = self.insert_matching_rule(ordering_rule, overwrite).map(|_| ());
            if let Err(conflict) = registered {
                // Roll the syntax registration back so the two never go in
                // half-registered.
                self.staging_mut().remove_syntax_element(&oid);
                return Err(conflict);
            }
            return Ok(self);
        }

        self.insert_raw_syntax(syntax, overwrite)
    }

    fn insert_raw_syntax(&mut self, syntax: Syntax, overwrite: bool) -> SchemaResult<&mut Self> {
        let staging = self.staging_mut();
        if let Some(existing) = staging.syntaxes.get(&syntax.oid) {
            if !overwrite {
                return Err(SchemaError::conflicting_element(
                    "syntax",
                    syntax.oid.clone(),
                    existing.oid.clone(),
                    syntax.oid.clone(),
                ));
            }
            staging.remove_syntax_element(&syntax.oid.clone());
        }
        staging.insert_syntax(syntax);
        Ok(self)
    }

    /// Stage a substitution syntax delegating to another syntax.
    pub fn add_substitution_syntax(
        &mut self,
        oid: &str,
        description: &str,
        substitute_oid: &str,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let syntax = Syntax::new(oid)
            .with_description(description)
            .with_extra_property("X-SUBST", [substitute_oid]);
        self.insert_syntax(syntax, overwrite)
    }

    /// Stage a pattern syntax constraining values with a regex.
    pub fn add_pattern_syntax(
        &mut self,
        oid: &str,
        description: &str,
        pattern: &str,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let syntax = Syntax::new(oid)
            .with_description(description)
            .with_extra_property("X-PATTERN", [pattern]);
        self.insert_syntax(syntax, overwrite)
    }

    /// Stage an enumeration syntax along with its ordering matching rule.
    pub fn add_enumeration_syntax(
        &mut self,
        oid: &str,
        description: &str,
        values: impl IntoIterator<Item = impl Into<String>>,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let syntax = Syntax::new(oid)
            .with_description(description)
            .with_extra_property("X-ENUM", values);
        self.insert_syntax(syntax, overwrite)
    }

    /// Stage a structured matching rule.
    pub fn insert_matching_rule(
        &mut self,
        rule: MatchingRule,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let staging = self.staging_mut();
        if let Some(existing) = staging.matching_rules.get(&rule.oid) {
            if !overwrite {
                return Err(SchemaError::conflicting_element(
                    "matching rule",
                    rule.name_or_oid().to_string(),
                    existing.name_or_oid().to_string(),
                    rule.oid.clone(),
                ));
            }
            staging.remove_matching_rule_element(&rule.oid.clone());
        }
        staging.insert_matching_rule(rule);
        Ok(self)
    }

    /// Stage a structured matching rule use.
    pub fn insert_matching_rule_use(
        &mut self,
        use_: MatchingRuleUse,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let staging = self.staging_mut();
        if let Some(existing) = staging.matching_rule_uses.get(&use_.matching_rule_oid) {
            if !overwrite {
                return Err(SchemaError::conflicting_element(
                    "matching rule use",
                    use_.name_or_oid().to_string(),
                    existing.name_or_oid().to_string(),
                    use_.matching_rule_oid.clone(),
                ));
            }
            staging.remove_matching_rule_use_element(&use_.matching_rule_oid.clone());
        }
        staging.insert_matching_rule_use(use_);
        Ok(self)
    }

    /// Stage a structured name form.
    pub fn insert_name_form(&mut self, form: NameForm, overwrite: bool) -> SchemaResult<&mut Self> {
        let staging = self.staging_mut();
        if let Some(existing) = staging.name_forms.get(&form.oid) {
            if !overwrite {
                return Err(SchemaError::conflicting_element(
                    "name form",
                    form.name_or_oid().to_string(),
                    existing.name_or_oid().to_string(),
                    form.oid.clone(),
                ));
            }
            staging.remove_name_form_element(&form.oid.clone());
        }
        staging.insert_name_form(form);
        Ok(self)
    }

    /// Stage a structured DIT content rule.
    pub fn insert_dit_content_rule(
        &mut self,
        rule: DitContentRule,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let staging = self.staging_mut();
        if let Some(existing) = staging.content_rules.get(&rule.structural_class_oid) {
            if !overwrite {
                return Err(SchemaError::conflicting_element(
                    "DIT content rule",
                    rule.name_or_oid().to_string(),
                    existing.name_or_oid().to_string(),
                    rule.structural_class_oid.clone(),
                ));
            }
            staging.remove_content_rule_element(&rule.structural_class_oid.clone());
        }
        staging.insert_content_rule(rule);
        Ok(self)
    }

    /// Stage a structured DIT structure rule.
    pub fn insert_dit_structure_rule(
        &mut self,
        rule: DitStructureRule,
        overwrite: bool,
    ) -> SchemaResult<&mut Self> {
        let staging = self.staging_mut();
        if let Some(existing) = staging.structure_rules.get(&rule.rule_id) {
            if !overwrite {
                return Err(SchemaError::conflicting_element(
                    "DIT structure rule",
                    rule.name_or_rule_id(),
                    existing.name_or_rule_id(),
                    rule.rule_id.to_string(),
                ));
            }
            staging.remove_structure_rule_element(rule.rule_id);
        }
        staging.insert_structure_rule(rule);
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Bulk ingestion
    // ------------------------------------------------------------------

    /// Stage every definition found in a subschema subentry.
    ///
    /// Definitions that fail to parse, or that conflict when `overwrite`
    /// is `false`, are recorded as warnings on the built schema.
    pub fn add_schema_entry(&mut self, entry: &Entry, overwrite: bool) -> &mut Self {
        fn ingest(
            builder: &mut SchemaBuilder,
            entry: &Entry,
            attribute: &str,
            mut add: impl FnMut(&mut SchemaBuilder, &str) -> SchemaResult<()>,
        ) {
            let values: Vec<String> = entry
                .attribute(attribute)
                .map(|a| a.values().to_vec())
                .unwrap_or_default();
            for value in values {
                if let Err(error) = add(builder, &value) {
                    builder
                        .staging_mut()
                        .warnings
                        .push(format!("schema element was skipped: {error}"));
                }
            }
        }

        ingest(self, entry, oids::ATTR_LDAP_SYNTAXES, |b, v| {
            b.add_syntax(v, overwrite).map(|_| ())
        });
        ingest(self, entry, oids::ATTR_MATCHING_RULES, |b, v| {
            b.add_matching_rule(v, overwrite).map(|_| ())
        });
        ingest(self, entry, oids::ATTR_ATTRIBUTE_TYPES, |b, v| {
            b.add_attribute_type(v, overwrite).map(|_| ())
        });
        ingest(self, entry, oids::ATTR_OBJECT_CLASSES, |b, v| {
            b.add_object_class(v, overwrite).map(|_| ())
        });
        ingest(self, entry, oids::ATTR_MATCHING_RULE_USE, |b, v| {
            b.add_matching_rule_use(v, overwrite).map(|_| ())
        });
        ingest(self, entry, oids::ATTR_NAME_FORMS, |b, v| {
            b.add_name_form(v, overwrite).map(|_| ())
        });
        ingest(self, entry, oids::ATTR_DIT_CONTENT_RULES, |b, v| {
            b.add_dit_content_rule(v, overwrite).map(|_| ())
        });
        ingest(self, entry, oids::ATTR_DIT_STRUCTURE_RULES, |b, v| {
            b.add_dit_structure_rule(v, overwrite).map(|_| ())
        });
        self
    }

    /// Stage every element of another schema. Elements are duplicated, so
    /// the source schema shares nothing with the one built here.
    pub fn add_schema(&mut self, schema: &Schema, overwrite: bool) -> SchemaResult<&mut Self> {
        for syntax in schema.syntaxes() {
            self.insert_raw_syntax((*syntax).clone(), overwrite)?;
        }
        for rule in schema.matching_rules() {
            self.insert_matching_rule((*rule).clone(), overwrite)?;
        }
        for use_ in schema.matching_rule_uses() {
            self.insert_matching_rule_use((*use_).clone(), overwrite)?;
        }
        for attribute_type in schema.attribute_types() {
            self.insert_attribute_type((*attribute_type).clone(), overwrite)?;
        }
        for object_class in schema.object_classes() {
            self.insert_object_class((*object_class).clone(), overwrite)?;
        }
        for form in schema.name_forms() {
            self.insert_name_form((*form).clone(), overwrite)?;
        }
        for rule in schema.dit_content_rules() {
            self.insert_dit_content_rule((*rule).clone(), overwrite)?;
        }
        for rule in schema.dit_structure_rules() {
            self.insert_dit_structure_rule((*rule).clone(), overwrite)?;
        }
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove an attribute type by name or OID. Returns `true` if found.
    pub fn remove_attribute_type(&mut self, name_or_oid: &str) -> bool {
        let staging = self.staging_mut();
        match staging.find_attribute_type_oid(name_or_oid) {
            Ok(oid) => {
                staging.remove_attribute_type_element(&oid);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove an object class by name or OID. Returns `true` if found.
    pub fn remove_object_class(&mut self, name_or_oid: &str) -> bool {
        let staging = self.staging_mut();
        match staging.find_object_class_oid(name_or_oid) {
            Ok(oid) => {
                staging.remove_object_class_element(&oid);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove a syntax by numeric OID. Returns `true` if found.
    pub fn remove_syntax(&mut self, oid: &str) -> bool {
        let staging = self.staging_mut();
        if staging.syntaxes.contains_key(oid) {
            staging.remove_syntax_element(oid);
            true
        } else {
            false
        }
    }

    /// Remove a matching rule by name or OID. Returns `true` if found.
    pub fn remove_matching_rule(&mut self, name_or_oid: &str) -> bool {
        let staging = self.staging_mut();
        match staging.find_matching_rule_oid(name_or_oid) {
            Ok(oid) => {
                staging.remove_matching_rule_element(&oid);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove a matching rule use by its matching rule OID. Returns `true`
    /// if found.
    pub fn remove_matching_rule_use(&mut self, matching_rule_oid: &str) -> bool {
        let staging = self.staging_mut();
        if staging.matching_rule_uses.contains_key(matching_rule_oid) {
            staging.remove_matching_rule_use_element(matching_rule_oid);
            true
        } else {
            false
        }
    }

    /// Remove a name form by name or OID. Returns `true` if found.
    pub fn remove_name_form(&mut self, name_or_oid: &str) -> bool {
        let staging = self.staging_mut();
        match staging.find_name_form_oid(name_or_oid) {
            Ok(oid) => {
                staging.remove_name_form_element(&oid);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove a DIT content rule by its structural class OID. Returns
    /// `true` if found.
    pub fn remove_dit_content_rule(&mut self, structural_class_oid: &str) -> bool {
        let staging = self.staging_mut();
        if staging.content_rules.contains_key(structural_class_oid) {
            staging.remove_content_rule_element(structural_class_oid);
            true
        } else {
            false
        }
    }

    /// Remove a DIT structure rule by rule ID. Returns `true` if found.
    pub fn remove_dit_structure_rule(&mut self, rule_id: u32) -> bool {
        let staging = self.staging_mut();
        if staging.structure_rules.contains_key(&rule_id) {
            staging.remove_structure_rule_element(rule_id);
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // Materialization
    // ------------------------------------------------------------------

    /// Validate the staged elements and freeze them into a [`Schema`].
    ///
    /// When the builder was seeded from a schema and has seen no mutation
    /// since, that schema instance is returned directly. Otherwise a new
    /// schema is built, the full cross-reference validation of the staged
    /// graph runs (dropping broken elements with warnings), and the
    /// builder re-arms itself with the result as its new copy-on-write
    /// base.
    pub fn to_schema(&mut self) -> Schema {
        if self.staging.is_none() {
            if let Some(schema) = &self.copy_on_write {
                return schema.clone();
            }
        }
        let staging = self.staging.take().unwrap_or_else(Staging::new);
        let name = self.schema_name.clone().unwrap_or_else(|| {
            format!("Schema#{}", NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed))
        });
        let schema = validation::build_schema(name, staging);
        self.copy_on_write = Some(schema.clone());
        schema
    }
}

// ----------------------------------------------------------------------
// RFC 2252 parsing
// ----------------------------------------------------------------------

fn err_unexpected_token(definition: &str, token: &str) -> SchemaError {
    SchemaError::invalid_definition(definition, format!("illegal token \"{token}\""))
}

fn parse_attribute_type(definition: &str) -> SchemaResult<AttributeType> {
    let mut reader = DefinitionReader::new(definition);
    reader.expect_open_paren()?;

    let mut attribute_type = AttributeType::new(reader.read_oid()?);
    while let Some(token) = reader.read_token_name()? {
        match token.to_ascii_lowercase().as_str() {
            "name" => attribute_type.names = reader.read_name_descriptors()?,
            "desc" => attribute_type.description = reader.read_quoted_string()?,
            "obsolete" => attribute_type.obsolete = true,
            "sup" => attribute_type.superior_oid = Some(reader.read_oid()?),
            "equality" => attribute_type.equality_oid = Some(reader.read_oid()?),
            "ordering" => attribute_type.ordering_oid = Some(reader.read_oid()?),
            "substr" => attribute_type.substring_oid = Some(reader.read_oid()?),
            "syntax" => attribute_type.syntax_oid = Some(reader.read_oid_len()?),
            "single-value" => attribute_type.single_value = true,
            "collective" => attribute_type.collective = true,
            "no-user-modification" => attribute_type.no_user_modification = true,
            "usage" => {
                let usage = reader.read_word()?;
                attribute_type.usage = match usage.to_ascii_lowercase().as_str() {
                    "userapplications" => AttributeUsage::UserApplications,
                    "directoryoperation" => AttributeUsage::DirectoryOperation,
                    "distributedoperation" => AttributeUsage::DistributedOperation,
                    "dsaoperation" => AttributeUsage::DsaOperation,
                    _ => {
                        return Err(SchemaError::invalid_definition(
                            definition,
                            format!("invalid attribute usage \"{usage}\""),
                        ))
                    }
                };
            }
            _ if is_extension_token(&token) => {
                let values = reader.read_extensions()?;
                attribute_type.extra_properties.insert(token, values);
            }
            _ => return Err(err_unexpected_token(definition, &token)),
        }
    }

    if let Some(approx) = attribute_type
        .extra_properties
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("x-approx"))
        .and_then(|(_, values)| values.first())
    {
        attribute_type.approximate_oid = Some(approx.clone());
    }

    if attribute_type.superior_oid.is_none() && attribute_type.syntax_oid.is_none() {
        return Err(SchemaError::invalid_definition(
            definition,
            "an attribute type must declare a syntax or a superior type",
        ));
    }

    attribute_type.definition = Some(definition.trim().to_string());
    Ok(attribute_type)
}

fn parse_object_class(definition: &str) -> SchemaResult<ObjectClass> {
    let mut reader = DefinitionReader::new(definition);
    reader.expect_open_paren()?;

    let mut object_class = ObjectClass::new(reader.read_oid()?);
    // Classes declaring no kind keyword default to structural (RFC 4512).
    let mut kind = None;
    while let Some(token) = reader.read_token_name()? {
        match token.to_ascii_lowercase().as_str() {
            "name" => object_class.names = reader.read_name_descriptors()?,
            "desc" => object_class.description = reader.read_quoted_string()?,
            "obsolete" => object_class.obsolete = true,
            "sup" => object_class.superior_oids = reader.read_oids()?,
            "abstract" => kind = Some(ObjectClassKind::Abstract),
            "structural" => kind = Some(ObjectClassKind::Structural),
            "auxiliary" => kind = Some(ObjectClassKind::Auxiliary),
            "must" => object_class.required_oids = reader.read_oids()?,
            "may" => object_class.optional_oids = reader.read_oids()?,
            _ if is_extension_token(&token) => {
                let values = reader.read_extensions()?;
                object_class.extra_properties.insert(token, values);
            }
            _ => return Err(err_unexpected_token(definition, &token)),
        }
    }
    object_class.kind = kind.unwrap_or_default();
    object_class.definition = Some(definition.trim().to_string());
    Ok(object_class)
}

fn parse_syntax(definition: &str) -> SchemaResult<Syntax> {
    let mut reader = DefinitionReader::new(definition);
    reader.expect_open_paren()?;

    let mut syntax = Syntax::new(reader.read_oid()?);
    while let Some(token) = reader.read_token_name()? {
        match token.to_ascii_lowercase().as_str() {
            "desc" => syntax.description = reader.read_quoted_string()?,
            _ if is_extension_token(&token) => {
                let values = reader.read_extensions()?;
                syntax.extra_properties.insert(token, values);
            }
            _ => return Err(err_unexpected_token(definition, &token)),
        }
    }
    syntax.definition = Some(definition.trim().to_string());
    Ok(syntax)
}

fn parse_matching_rule(definition: &str) -> SchemaResult<MatchingRule> {
    let mut reader = DefinitionReader::new(definition);
    reader.expect_open_paren()?;

    let oid = reader.read_oid()?;
    let mut rule = MatchingRule::new(oid, "");
    while let Some(token) = reader.read_token_name()? {
        match token.to_ascii_lowercase().as_str() {
            "name" => rule.names = reader.read_name_descriptors()?,
            "desc" => rule.description = reader.read_quoted_string()?,
            "obsolete" => rule.obsolete = true,
            "syntax" => rule.syntax_oid = reader.read_oid()?,
            _ if is_extension_token(&token) => {
                let values = reader.read_extensions()?;
                rule.extra_properties.insert(token, values);
            }
            _ => return Err(err_unexpected_token(definition, &token)),
        }
    }
    if rule.syntax_oid.is_empty() {
        return Err(SchemaError::invalid_definition(
            definition,
            "a matching rule must declare its assertion syntax",
        ));
    }
    rule.definition = Some(definition.trim().to_string());
    Ok(rule)
}

fn parse_matching_rule_use(definition: &str) -> SchemaResult<MatchingRuleUse> {
    let mut reader = DefinitionReader::new(definition);
    reader.expect_open_paren()?;

    let oid = reader.read_oid()?;
    let mut use_ = MatchingRuleUse::new(oid, Vec::<String>::new());
    while let Some(token) = reader.read_token_name()? {
        match token.to_ascii_lowercase().as_str() {
            "name" => use_.names = reader.read_name_descriptors()?,
            "desc" => use_.description = reader.read_quoted_string()?,
            "obsolete" => use_.obsolete = true,
            "applies" => use_.applies_oids = reader.read_oids()?,
            _ if is_extension_token(&token) => {
                let values = reader.read_extensions()?;
                use_.extra_properties.insert(token, values);
            }
            _ => return Err(err_unexpected_token(definition, &token)),
        }
    }
    if use_.applies_oids.is_empty() {
        return Err(SchemaError::invalid_definition(
            definition,
            "a matching rule use must declare the attribute types it applies to",
        ));
    }
    use_.definition = Some(definition.trim().to_string());
    Ok(use_)
}

fn parse_name_form(definition: &str) -> SchemaResult<NameForm> {
    let mut reader = DefinitionReader::new(definition);
    reader.expect_open_paren()?;

    let oid = reader.read_oid()?;
    let mut form = NameForm {
        oid,
        ..NameForm::default()
    };
    while let Some(token) = reader.read_token_name()? {
        match token.to_ascii_lowercase().as_str() {
            "name" => form.names = reader.read_name_descriptors()?,
            "desc" => form.description = reader.read_quoted_string()?,
            "obsolete" => form.obsolete = true,
            "oc" => form.structural_class_oid = reader.read_oid()?,
            "must" => form.required_oids = reader.read_oids()?,
            "may" => form.optional_oids = reader.read_oids()?,
            _ if is_extension_token(&token) => {
                let values = reader.read_extensions()?;
                form.extra_properties.insert(token, values);
            }
            _ => return Err(err_unexpected_token(definition, &token)),
        }
    }
    if form.structural_class_oid.is_empty() {
        return Err(SchemaError::invalid_definition(
            definition,
            "a name form must declare its structural object class",
        ));
    }
    if form.required_oids.is_empty() {
        return Err(SchemaError::invalid_definition(
            definition,
            "a name form must declare at least one required naming attribute",
        ));
    }
    form.definition = Some(definition.trim().to_string());
    Ok(form)
}

fn parse_content_rule(definition: &str) -> SchemaResult<DitContentRule> {
    let mut reader = DefinitionReader::new(definition);
    reader.expect_open_paren()?;

    let mut rule = DitContentRule::new(reader.read_oid()?);
    while let Some(token) = reader.read_token_name()? {
        match token.to_ascii_lowercase().as_str() {
            "name" => rule.names = reader.read_name_descriptors()?,
            "desc" => rule.description = reader.read_quoted_string()?,
            "obsolete" => rule.obsolete = true,
            "aux" => rule.auxiliary_oids = reader.read_oids()?,
            "must" => rule.required_oids = reader.read_oids()?,
            "may" => rule.optional_oids = reader.read_oids()?,
            "not" => rule.prohibited_oids = reader.read_oids()?,
            _ if is_extension_token(&token) => {
                let values = reader.read_extensions()?;
                rule.extra_properties.insert(token, values);
            }
            _ => return Err(err_unexpected_token(definition, &token)),
        }
    }
    rule.definition = Some(definition.trim().to_string());
    Ok(rule)
}

fn parse_structure_rule(definition: &str) -> SchemaResult<DitStructureRule> {
    let mut reader = DefinitionReader::new(definition);
    reader.expect_open_paren()?;

    let rule_id = reader.read_rule_id()?;
    let mut rule = DitStructureRule {
        rule_id,
        ..DitStructureRule::default()
    };
    while let Some(token) = reader.read_token_name()? {
        match token.to_ascii_lowercase().as_str() {
            "name" => rule.names = reader.read_name_descriptors()?,
            "desc" => rule.description = reader.read_quoted_string()?,
            "obsolete" => rule.obsolete = true,
            "form" => rule.name_form_oid = reader.read_oid()?,
            "sup" => rule.superior_rule_ids = reader.read_rule_ids()?,
            _ if is_extension_token(&token) => {
                let values = reader.read_extensions()?;
                rule.extra_properties.insert(token, values);
            }
            _ => return Err(err_unexpected_token(definition, &token)),
        }
    }
    if rule.name_form_oid.is_empty() {
        return Err(SchemaError::invalid_definition(
            definition,
            "a DIT structure rule must declare its name form",
        ));
    }
    rule.definition = Some(definition.trim().to_string());
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_type_requires_sup_or_syntax() {
        let mut builder = SchemaBuilder::new();
        let result = builder.add_attribute_type("( 1.2.3.4 NAME 'orphan' SINGLE-VALUE )", false);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_parse_full_attribute_type() {
        let at = parse_attribute_type(
            "( 2.5.4.3 NAME ( 'cn' 'commonName' ) DESC 'common name' SUP name \
             EQUALITY caseIgnoreMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15{32768} \
             USAGE userApplications X-ORIGIN 'RFC 4519' )",
        )
        .unwrap();
        assert_eq!(at.oid(), "2.5.4.3");
        assert_eq!(at.names(), ["cn", "commonName"]);
        assert_eq!(at.superior_oid(), Some("name"));
        assert_eq!(at.syntax_oid(), Some("1.3.6.1.4.1.1466.115.121.1.15"));
        assert_eq!(
            at.extra_properties().get("X-ORIGIN").map(Vec::as_slice),
            Some(&["RFC 4519".to_string()][..])
        );
    }

    #[test]
    fn test_parse_object_class_kinds() {
        let oc = parse_object_class(
            "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn ) MAY description )",
        )
        .unwrap();
        assert_eq!(oc.kind(), ObjectClassKind::Structural);
        assert_eq!(oc.superior_oids(), ["top"]);

        let oc = parse_object_class("( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )").unwrap();
        assert_eq!(oc.kind(), ObjectClassKind::Abstract);
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let result = parse_object_class("( 2.5.6.6 NAME 'person' BOGUS foo )");
        assert!(matches!(
            result,
            Err(SchemaError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_conflict_without_overwrite() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_attribute_type(
                "( 2.5.4.3 NAME 'cn' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
                false,
            )
            .unwrap();
        let result = builder.add_attribute_type(
            "( 2.5.4.3 NAME 'commonName' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
            false,
        );
        match result {
            Err(SchemaError::ConflictingElement { name, existing, key, .. }) => {
                assert_eq!(name, "commonName");
                assert_eq!(existing, "cn");
                assert_eq!(key, "2.5.4.3");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_overwrite_replaces_name_index() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_attribute_type(
                "( 2.5.4.3 NAME 'cn' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
                false,
            )
            .unwrap();
        builder
            .add_attribute_type(
                "( 2.5.4.3 NAME 'commonName' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
                true,
            )
            .unwrap();
        let schema = builder.to_schema();
        assert!(schema.has_attribute_type("commonName"));
        assert!(!schema.has_attribute_type("cn"));
    }

    #[test]
    fn test_enum_syntax_splits_into_syntax_and_matching_rule() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_syntax(
                "( 1.2.3.4.5 DESC 'severity' X-ENUM ( 'low' 'medium' 'high' ) )",
                false,
            )
            .unwrap();
        let schema = builder.to_schema();
        assert!(schema.has_syntax("1.2.3.4.5"));
        assert!(schema.has_matching_rule("enumOrderingMatch1.2.3.4.5"));
    }

    #[test]
    fn test_enum_matching_rule_conflict_rolls_back_syntax() {
        let mut builder = SchemaBuilder::new();
        // Occupy the OID the synthesized rule would take.
        builder
            .insert_matching_rule(
                MatchingRule::new(
                    format!("{}.1.2.3.4.5", oids::OMR_GENERIC_ENUM_OID_PREFIX),
                    "1.2.3.4.5",
                ),
                false,
            )
            .unwrap();
        let result = builder.add_syntax("( 1.2.3.4.5 X-ENUM ( 'a' 'b' ) )", false);
        assert!(matches!(
            result,
            Err(SchemaError::ConflictingElement { .. })
        ));
        let schema = builder.to_schema();
        assert!(!schema.has_syntax("1.2.3.4.5"));
    }

    #[test]
    fn test_structure_rule_parsing() {
        let rule =
            parse_structure_rule("( 2 NAME 'uddiContactStructureRule' FORM uddiContactNameForm SUP ( 1 ) )")
                .unwrap();
        assert_eq!(rule.rule_id(), 2);
        assert_eq!(rule.name_form_oid(), "uddiContactNameForm");
        assert_eq!(rule.superior_rule_ids(), [1]);
    }
}
