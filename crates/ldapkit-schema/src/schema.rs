//! The validated, immutable schema aggregate.
//!
//! A [`Schema`] is produced once by [`SchemaBuilder::to_schema`] and never
//! mutated afterwards; it is cheap to clone and safe to share across
//! threads. Every element kind is addressable by OID or by unambiguous
//! name (names may collide across distinct OIDs, in which case lookup by
//! that name fails as ambiguous).
//!
//! A schema is either *strict* or *non-strict*. Strict lookups of unknown
//! attribute types fail; non-strict lookups synthesize a place-holder type
//! with the Octet String syntax, which is what a client wants when reading
//! entries governed by a schema it has not fully loaded.
//! [`Schema::as_strict_schema`] and [`Schema::as_non_strict_schema`]
//! return alternate views over the same backing maps, not copies.
//!
//! [`SchemaBuilder::to_schema`]: crate::builder::SchemaBuilder::to_schema

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use crate::attribute_type::AttributeType;
use crate::builder::{SchemaBuilder, Staging};
use crate::content_rule::DitContentRule;
use crate::entry::Entry;
use crate::error::{SchemaError, SchemaResult};
use crate::matching_rule::{MatchingRule, MatchingRuleUse};
use crate::name_form::NameForm;
use crate::object_class::{ObjectClass, ObjectClassKind};
use crate::oids;
use crate::policy::SchemaValidationPolicy;
use crate::structure_rule::DitStructureRule;
use crate::syntax::Syntax;
use crate::validation;

static FALLBACK_SYNTAX: LazyLock<Arc<Syntax>> =
    LazyLock::new(|| Arc::new(validation::fallback_default_syntax()));
static FALLBACK_MATCHING_RULE: LazyLock<Arc<MatchingRule>> =
    LazyLock::new(|| Arc::new(validation::fallback_default_matching_rule()));

#[derive(Debug)]
pub(crate) struct SchemaData {
    name: String,
    default_syntax: Arc<Syntax>,
    default_matching_rule: Arc<MatchingRule>,
    syntaxes: BTreeMap<String, Arc<Syntax>>,
    matching_rules: BTreeMap<String, Arc<MatchingRule>>,
    matching_rule_uses: BTreeMap<String, Arc<MatchingRuleUse>>,
    attribute_types: BTreeMap<String, Arc<AttributeType>>,
    object_classes: BTreeMap<String, Arc<ObjectClass>>,
    name_forms: BTreeMap<String, Arc<NameForm>>,
    content_rules: BTreeMap<String, Arc<DitContentRule>>,
    structure_rules: BTreeMap<u32, Arc<DitStructureRule>>,
    matching_rules_by_name: BTreeMap<String, Vec<Arc<MatchingRule>>>,
    matching_rule_uses_by_name: BTreeMap<String, Vec<Arc<MatchingRuleUse>>>,
    attribute_types_by_name: BTreeMap<String, Vec<Arc<AttributeType>>>,
    object_classes_by_name: BTreeMap<String, Vec<Arc<ObjectClass>>>,
    name_forms_by_name: BTreeMap<String, Vec<Arc<NameForm>>>,
    content_rules_by_name: BTreeMap<String, Vec<Arc<DitContentRule>>>,
    structure_rules_by_name: BTreeMap<String, Vec<Arc<DitStructureRule>>>,
    class_to_name_forms: BTreeMap<String, Vec<Arc<NameForm>>>,
    form_to_structure_rules: BTreeMap<String, Vec<Arc<DitStructureRule>>>,
    warnings: Vec<String>,
}

/// Which behavior a [`Schema`] handle exposes over its backing data.
#[derive(Debug, Clone)]
enum SchemaView {
    Strict(Arc<SchemaData>),
    NonStrict(Arc<SchemaData>),
    Empty { strict: bool },
}

/// An immutable, validated directory schema.
#[derive(Debug, Clone)]
pub struct Schema {
    view: SchemaView,
}

fn lookup<T>(
    kind: &'static str,
    by_key: &BTreeMap<String, Arc<T>>,
    by_name: &BTreeMap<String, Vec<Arc<T>>>,
    name: &str,
) -> SchemaResult<Option<Arc<T>>> {
    if let Some(element) = by_key.get(name) {
        return Ok(Some(element.clone()));
    }
    match by_name.get(&name.to_lowercase()) {
        Some(elements) if elements.len() == 1 => Ok(Some(elements[0].clone())),
        Some(_) => Err(SchemaError::ambiguous_name(kind, name.to_string())),
        None => Ok(None),
    }
}

fn contains<T>(
    by_key: &BTreeMap<String, Arc<T>>,
    by_name: &BTreeMap<String, Vec<Arc<T>>>,
    name: &str,
) -> bool {
    by_key.contains_key(name)
        || by_name
            .get(&name.to_lowercase())
            .is_some_and(|elements| elements.len() == 1)
}

impl SchemaData {
    fn attribute_type(&self, name: &str) -> SchemaResult<Option<Arc<AttributeType>>> {
        lookup(
            "attribute type",
            &self.attribute_types,
            &self.attribute_types_by_name,
            name,
        )
    }

    fn object_class(&self, name: &str) -> SchemaResult<Option<Arc<ObjectClass>>> {
        lookup(
            "object class",
            &self.object_classes,
            &self.object_classes_by_name,
            name,
        )
    }

    fn matching_rule(&self, name: &str) -> SchemaResult<Option<Arc<MatchingRule>>> {
        lookup(
            "matching rule",
            &self.matching_rules,
            &self.matching_rules_by_name,
            name,
        )
    }

    fn matching_rule_use(&self, name: &str) -> SchemaResult<Option<Arc<MatchingRuleUse>>> {
        lookup(
            "matching rule use",
            &self.matching_rule_uses,
            &self.matching_rule_uses_by_name,
            name,
        )
    }

    fn name_form(&self, name: &str) -> SchemaResult<Option<Arc<NameForm>>> {
        lookup("name form", &self.name_forms, &self.name_forms_by_name, name)
    }

    fn content_rule(&self, name: &str) -> SchemaResult<Option<Arc<DitContentRule>>> {
        lookup(
            "DIT content rule",
            &self.content_rules,
            &self.content_rules_by_name,
            name,
        )
    }
}

impl Schema {
    pub(crate) fn from_staging(
        name: String,
        staging: Staging,
        class_to_forms: BTreeMap<String, Vec<String>>,
        form_to_rules: BTreeMap<String, Vec<u32>>,
    ) -> Schema {
        fn arc_map<T>(map: BTreeMap<String, T>) -> BTreeMap<String, Arc<T>> {
            map.into_iter().map(|(k, v)| (k, Arc::new(v))).collect()
        }
        fn name_map<T>(
            index: BTreeMap<String, Vec<String>>,
            elements: &BTreeMap<String, Arc<T>>,
        ) -> BTreeMap<String, Vec<Arc<T>>> {
            index
                .into_iter()
                .filter_map(|(name, keys)| {
                    let resolved: Vec<Arc<T>> = keys
                        .iter()
                        .filter_map(|key| elements.get(key).cloned())
                        .collect();
                    (!resolved.is_empty()).then_some((name, resolved))
                })
                .collect()
        }

        let syntaxes = arc_map(staging.syntaxes);
        let matching_rules = arc_map(staging.matching_rules);
        let matching_rule_uses = arc_map(staging.matching_rule_uses);
        let attribute_types = arc_map(staging.attribute_types);
        let object_classes = arc_map(staging.object_classes);
        let name_forms = arc_map(staging.name_forms);
        let content_rules = arc_map(staging.content_rules);
        let structure_rules: BTreeMap<u32, Arc<DitStructureRule>> = staging
            .structure_rules
            .into_iter()
            .map(|(k, v)| (k, Arc::new(v)))
            .collect();

        let matching_rules_by_name = name_map(staging.matching_rules_by_name, &matching_rules);
        let matching_rule_uses_by_name =
            name_map(staging.matching_rule_uses_by_name, &matching_rule_uses);
        let attribute_types_by_name =
            name_map(staging.attribute_types_by_name, &attribute_types);
        let object_classes_by_name = name_map(staging.object_classes_by_name, &object_classes);
        let name_forms_by_name = name_map(staging.name_forms_by_name, &name_forms);
        let content_rules_by_name = name_map(staging.content_rules_by_name, &content_rules);
        let structure_rules_by_name: BTreeMap<String, Vec<Arc<DitStructureRule>>> = staging
            .structure_rules_by_name
            .into_iter()
            .filter_map(|(name, ids)| {
                let resolved: Vec<Arc<DitStructureRule>> = ids
                    .iter()
                    .filter_map(|id| structure_rules.get(id).cloned())
                    .collect();
                (!resolved.is_empty()).then_some((name, resolved))
            })
            .collect();
        let class_to_name_forms: BTreeMap<String, Vec<Arc<NameForm>>> = class_to_forms
            .into_iter()
            .filter_map(|(class_oid, form_oids)| {
                let resolved: Vec<Arc<NameForm>> = form_oids
                    .iter()
                    .filter_map(|oid| name_forms.get(oid).cloned())
                    .collect();
                (!resolved.is_empty()).then_some((class_oid, resolved))
            })
            .collect();
        let form_to_structure_rules: BTreeMap<String, Vec<Arc<DitStructureRule>>> = form_to_rules
            .into_iter()
            .filter_map(|(form_oid, ids)| {
                let resolved: Vec<Arc<DitStructureRule>> = ids
                    .iter()
                    .filter_map(|id| structure_rules.get(id).cloned())
                    .collect();
                (!resolved.is_empty()).then_some((form_oid, resolved))
            })
            .collect();

        let default_syntax = syntaxes
            .get(&staging.default_syntax_oid)
            .cloned()
            .unwrap_or_else(|| FALLBACK_SYNTAX.clone());
        let default_matching_rule = matching_rules
            .get(&staging.default_matching_rule_oid)
            .cloned()
            .unwrap_or_else(|| FALLBACK_MATCHING_RULE.clone());

        Schema {
            view: SchemaView::Strict(Arc::new(SchemaData {
                name,
                default_syntax,
                default_matching_rule,
                syntaxes,
                matching_rules,
                matching_rule_uses,
                attribute_types,
                object_classes,
                name_forms,
                content_rules,
                structure_rules,
                matching_rules_by_name,
                matching_rule_uses_by_name,
                attribute_types_by_name,
                object_classes_by_name,
                name_forms_by_name,
                content_rules_by_name,
                structure_rules_by_name,
                class_to_name_forms,
                form_to_structure_rules,
                warnings: staging.warnings,
            })),
        }
    }

    /// The core schema: a non-strict schema holding the standard elements
    /// of RFC 4512, RFC 4517 and RFC 4519 that the SDK itself relies on.
    #[must_use]
    pub fn core_schema() -> &'static Schema {
        crate::core::core_schema()
    }

    /// The empty schema: non-strict and holding no elements at all.
    #[must_use]
    pub fn empty_schema() -> Schema {
        Schema {
            view: SchemaView::Empty { strict: false },
        }
    }

    /// Parse a subschema subentry into a schema. Problems encountered
    /// while parsing are reported through [`Schema::warnings`].
    #[must_use]
    pub fn value_of(entry: &Entry) -> Schema {
        SchemaBuilder::from_entry(entry).to_schema()
    }

    fn data(&self) -> Option<&Arc<SchemaData>> {
        match &self.view {
            SchemaView::Strict(data) | SchemaView::NonStrict(data) => Some(data),
            SchemaView::Empty { .. } => None,
        }
    }

    /// The schema's user-friendly name.
    #[must_use]
    pub fn schema_name(&self) -> &str {
        self.data().map_or("Empty Schema", |data| data.name.as_str())
    }

    /// True for strict schemas. See the module documentation.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        match &self.view {
            SchemaView::Strict(_) => true,
            SchemaView::NonStrict(_) => false,
            SchemaView::Empty { strict } => *strict,
        }
    }

    /// A strict view over the same backing data.
    #[must_use]
    pub fn as_strict_schema(&self) -> Schema {
        match &self.view {
            SchemaView::Strict(_) => self.clone(),
            SchemaView::NonStrict(data) => Schema {
                view: SchemaView::Strict(data.clone()),
            },
            SchemaView::Empty { .. } => Schema {
                view: SchemaView::Empty { strict: true },
            },
        }
    }

    /// A non-strict view over the same backing data.
    #[must_use]
    pub fn as_non_strict_schema(&self) -> Schema {
        match &self.view {
            SchemaView::NonStrict(_) => self.clone(),
            SchemaView::Strict(data) => Schema {
                view: SchemaView::NonStrict(data.clone()),
            },
            SchemaView::Empty { .. } => Schema {
                view: SchemaView::Empty { strict: false },
            },
        }
    }

    /// True if both handles are views over the same backing data.
    #[must_use]
    pub fn same_backing(&self, other: &Schema) -> bool {
        match (&self.view, &other.view) {
            (SchemaView::Strict(a), SchemaView::Strict(b))
            | (SchemaView::Strict(a), SchemaView::NonStrict(b))
            | (SchemaView::NonStrict(a), SchemaView::Strict(b))
            | (SchemaView::NonStrict(a), SchemaView::NonStrict(b)) => Arc::ptr_eq(a, b),
            (SchemaView::Empty { .. }, SchemaView::Empty { .. }) => true,
            _ => false,
        }
    }

    /// Warnings recorded while the schema was parsed and validated.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        self.data().map_or(&[], |data| data.warnings.as_slice())
    }

    /// The syntax used for unrecognized attributes.
    #[must_use]
    pub fn default_syntax(&self) -> Arc<Syntax> {
        self.data()
            .map_or_else(|| FALLBACK_SYNTAX.clone(), |data| data.default_syntax.clone())
    }

    /// The matching rule used for unrecognized attributes.
    #[must_use]
    pub fn default_matching_rule(&self) -> Arc<MatchingRule> {
        self.data().map_or_else(
            || FALLBACK_MATCHING_RULE.clone(),
            |data| data.default_matching_rule.clone(),
        )
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Look up an attribute type by name or OID.
    ///
    /// On a non-strict schema an unknown attribute type yields a
    /// synthesized place-holder whose OID is the lowercased name with
    /// `-oid` appended and whose syntax is Octet String. An ambiguous
    /// name fails in both modes.
    pub fn get_attribute_type(&self, name: &str) -> SchemaResult<Arc<AttributeType>> {
        match &self.view {
            SchemaView::Strict(data) => data
                .attribute_type(name)?
                .ok_or_else(|| SchemaError::unknown_element("attribute type", name.to_string())),
            SchemaView::NonStrict(data) => Ok(data
                .attribute_type(name)?
                .unwrap_or_else(|| Arc::new(AttributeType::placeholder(name)))),
            SchemaView::Empty { strict: true } => Err(SchemaError::unknown_element(
                "attribute type",
                name.to_string(),
            )),
            SchemaView::Empty { strict: false } => {
                Ok(Arc::new(AttributeType::placeholder(name)))
            }
        }
    }

    /// True if the schema really contains the attribute type; a
    /// non-strict schema's synthesized place-holders do not count.
    #[must_use]
    pub fn has_attribute_type(&self, name: &str) -> bool {
        self.data().is_some_and(|data| {
            contains(&data.attribute_types, &data.attribute_types_by_name, name)
        })
    }

    /// All attribute types.
    #[must_use]
    pub fn attribute_types(&self) -> Vec<Arc<AttributeType>> {
        self.data()
            .map_or_else(Vec::new, |data| data.attribute_types.values().cloned().collect())
    }

    /// Every attribute type declaring the given name.
    #[must_use]
    pub fn attribute_types_with_name(&self, name: &str) -> Vec<Arc<AttributeType>> {
        self.data()
            .and_then(|data| data.attribute_types_by_name.get(&name.to_lowercase()).cloned())
            .unwrap_or_default()
    }

    /// Look up an object class by name or OID.
    pub fn get_object_class(&self, name: &str) -> SchemaResult<Arc<ObjectClass>> {
        match self.data() {
            Some(data) => data
                .object_class(name)?
                .ok_or_else(|| SchemaError::unknown_element("object class", name.to_string())),
            None => Err(SchemaError::unknown_element("object class", name.to_string())),
        }
    }

    /// True if the schema contains the object class.
    #[must_use]
    pub fn has_object_class(&self, name: &str) -> bool {
        self.data()
            .is_some_and(|data| contains(&data.object_classes, &data.object_classes_by_name, name))
    }

    /// All object classes.
    #[must_use]
    pub fn object_classes(&self) -> Vec<Arc<ObjectClass>> {
        self.data()
            .map_or_else(Vec::new, |data| data.object_classes.values().cloned().collect())
    }

    /// Every object class declaring the given name.
    #[must_use]
    pub fn object_classes_with_name(&self, name: &str) -> Vec<Arc<ObjectClass>> {
        self.data()
            .and_then(|data| data.object_classes_by_name.get(&name.to_lowercase()).cloned())
            .unwrap_or_default()
    }

    /// Look up a syntax by numeric OID. A non-strict schema substitutes
    /// its default syntax for an unknown OID.
    pub fn get_syntax(&self, oid: &str) -> SchemaResult<Arc<Syntax>> {
        match &self.view {
            SchemaView::Strict(data) => data
                .syntaxes
                .get(oid)
                .cloned()
                .ok_or_else(|| SchemaError::unknown_element("syntax", oid.to_string())),
            SchemaView::NonStrict(data) => Ok(data
                .syntaxes
                .get(oid)
                .cloned()
                .unwrap_or_else(|| data.default_syntax.clone())),
            SchemaView::Empty { strict: true } => {
                Err(SchemaError::unknown_element("syntax", oid.to_string()))
            }
            SchemaView::Empty { strict: false } => Ok(FALLBACK_SYNTAX.clone()),
        }
    }

    /// True if the schema contains the syntax.
    #[must_use]
    pub fn has_syntax(&self, oid: &str) -> bool {
        self.data().is_some_and(|data| data.syntaxes.contains_key(oid))
    }

    /// All syntaxes.
    #[must_use]
    pub fn syntaxes(&self) -> Vec<Arc<Syntax>> {
        self.data()
            .map_or_else(Vec::new, |data| data.syntaxes.values().cloned().collect())
    }

    /// Look up a matching rule by name or OID.
    pub fn get_matching_rule(&self, name: &str) -> SchemaResult<Arc<MatchingRule>> {
        match self.data() {
            Some(data) => data
                .matching_rule(name)?
                .ok_or_else(|| SchemaError::unknown_element("matching rule", name.to_string())),
            None => Err(SchemaError::unknown_element(
                "matching rule",
                name.to_string(),
            )),
        }
    }

    /// True if the schema contains the matching rule.
    #[must_use]
    pub fn has_matching_rule(&self, name: &str) -> bool {
        self.data()
            .is_some_and(|data| contains(&data.matching_rules, &data.matching_rules_by_name, name))
    }

    /// All matching rules.
    #[must_use]
    pub fn matching_rules(&self) -> Vec<Arc<MatchingRule>> {
        self.data()
            .map_or_else(Vec::new, |data| data.matching_rules.values().cloned().collect())
    }

    /// Every matching rule declaring the given name.
    #[must_use]
    pub fn matching_rules_with_name(&self, name: &str) -> Vec<Arc<MatchingRule>> {
        self.data()
            .and_then(|data| data.matching_rules_by_name.get(&name.to_lowercase()).cloned())
            .unwrap_or_default()
    }

    /// Look up a matching rule use by name or matching rule OID.
    pub fn get_matching_rule_use(&self, name: &str) -> SchemaResult<Arc<MatchingRuleUse>> {
        match self.data() {
            Some(data) => data.matching_rule_use(name)?.ok_or_else(|| {
                SchemaError::unknown_element("matching rule use", name.to_string())
            }),
            None => Err(SchemaError::unknown_element(
                "matching rule use",
                name.to_string(),
            )),
        }
    }

    /// True if the schema contains the matching rule use.
    #[must_use]
    pub fn has_matching_rule_use(&self, name: &str) -> bool {
        self.data().is_some_and(|data| {
            contains(
                &data.matching_rule_uses,
                &data.matching_rule_uses_by_name,
                name,
            )
        })
    }

    /// All matching rule uses.
    #[must_use]
    pub fn matching_rule_uses(&self) -> Vec<Arc<MatchingRuleUse>> {
        self.data().map_or_else(Vec::new, |data| {
            data.matching_rule_uses.values().cloned().collect()
        })
    }

    /// Every matching rule use declaring the given name.
    #[must_use]
    pub fn matching_rule_uses_with_name(&self, name: &str) -> Vec<Arc<MatchingRuleUse>> {
        self.data()
            .and_then(|data| {
                data.matching_rule_uses_by_name
                    .get(&name.to_lowercase())
                    .cloned()
            })
            .unwrap_or_default()
    }

    /// Look up a name form by name or OID.
    pub fn get_name_form(&self, name: &str) -> SchemaResult<Arc<NameForm>> {
        match self.data() {
            Some(data) => data
                .name_form(name)?
                .ok_or_else(|| SchemaError::unknown_element("name form", name.to_string())),
            None => Err(SchemaError::unknown_element("name form", name.to_string())),
        }
    }

    /// True if the schema contains the name form.
    #[must_use]
    pub fn has_name_form(&self, name: &str) -> bool {
        self.data()
            .is_some_and(|data| contains(&data.name_forms, &data.name_forms_by_name, name))
    }

    /// All name forms.
    #[must_use]
    pub fn name_forms(&self) -> Vec<Arc<NameForm>> {
        self.data()
            .map_or_else(Vec::new, |data| data.name_forms.values().cloned().collect())
    }

    /// Every name form declaring the given name.
    #[must_use]
    pub fn name_forms_with_name(&self, name: &str) -> Vec<Arc<NameForm>> {
        self.data()
            .and_then(|data| data.name_forms_by_name.get(&name.to_lowercase()).cloned())
            .unwrap_or_default()
    }

    /// The name forms registered against a structural object class.
    #[must_use]
    pub fn name_forms_for_structural_class(&self, object_class: &ObjectClass) -> Vec<Arc<NameForm>> {
        self.data()
            .and_then(|data| data.class_to_name_forms.get(object_class.oid()).cloned())
            .unwrap_or_default()
    }

    /// Look up a DIT content rule by name or structural class OID.
    pub fn get_dit_content_rule(&self, name: &str) -> SchemaResult<Arc<DitContentRule>> {
        match self.data() {
            Some(data) => data.content_rule(name)?.ok_or_else(|| {
                SchemaError::unknown_element("DIT content rule", name.to_string())
            }),
            None => Err(SchemaError::unknown_element(
                "DIT content rule",
                name.to_string(),
            )),
        }
    }

    /// The content rule keyed by a structural object class, if any.
    #[must_use]
    pub fn dit_content_rule_for_class(
        &self,
        object_class: &ObjectClass,
    ) -> Option<Arc<DitContentRule>> {
        self.data()
            .and_then(|data| data.content_rules.get(object_class.oid()).cloned())
    }

    /// True if the schema contains the content rule.
    #[must_use]
    pub fn has_dit_content_rule(&self, name: &str) -> bool {
        self.data()
            .is_some_and(|data| contains(&data.content_rules, &data.content_rules_by_name, name))
    }

    /// All DIT content rules.
    #[must_use]
    pub fn dit_content_rules(&self) -> Vec<Arc<DitContentRule>> {
        self.data()
            .map_or_else(Vec::new, |data| data.content_rules.values().cloned().collect())
    }

    /// Every DIT content rule declaring the given name.
    #[must_use]
    pub fn dit_content_rules_with_name(&self, name: &str) -> Vec<Arc<DitContentRule>> {
        self.data()
            .and_then(|data| data.content_rules_by_name.get(&name.to_lowercase()).cloned())
            .unwrap_or_default()
    }

    /// Look up a DIT structure rule by its rule ID.
    pub fn get_dit_structure_rule(&self, rule_id: u32) -> SchemaResult<Arc<DitStructureRule>> {
        self.data()
            .and_then(|data| data.structure_rules.get(&rule_id).cloned())
            .ok_or_else(|| {
                SchemaError::unknown_element("DIT structure rule", rule_id.to_string())
            })
    }

    /// True if the schema contains the structure rule.
    #[must_use]
    pub fn has_dit_structure_rule(&self, rule_id: u32) -> bool {
        self.data()
            .is_some_and(|data| data.structure_rules.contains_key(&rule_id))
    }

    /// All DIT structure rules.
    #[must_use]
    pub fn dit_structure_rules(&self) -> Vec<Arc<DitStructureRule>> {
        self.data().map_or_else(Vec::new, |data| {
            data.structure_rules.values().cloned().collect()
        })
    }

    /// Every DIT structure rule declaring the given name.
    #[must_use]
    pub fn dit_structure_rules_with_name(&self, name: &str) -> Vec<Arc<DitStructureRule>> {
        self.data()
            .and_then(|data| {
                data.structure_rules_by_name
                    .get(&name.to_lowercase())
                    .cloned()
            })
            .unwrap_or_default()
    }

    /// The structure rules registered against a name form.
    #[must_use]
    pub fn dit_structure_rules_for_name_form(
        &self,
        name_form: &NameForm,
    ) -> Vec<Arc<DitStructureRule>> {
        self.data()
            .and_then(|data| data.form_to_structure_rules.get(name_form.oid()).cloned())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Subschema subentry emission
    // ------------------------------------------------------------------

    /// Add every element definition held by this schema to the provided
    /// subschema subentry. Existing attributes are preserved.
    pub fn to_entry(&self, entry: &mut Entry) {
        fn add<T>(entry: &mut Entry, attribute: &str, elements: Vec<Arc<T>>, def: impl Fn(&T) -> String) {
            let values: Vec<String> = elements.iter().map(|e| def(e.as_ref())).collect();
            if !values.is_empty() {
                entry.add_attribute(attribute, values);
            }
        }
        add(entry, oids::ATTR_LDAP_SYNTAXES, self.syntaxes(), Syntax::definition);
        add(
            entry,
            oids::ATTR_ATTRIBUTE_TYPES,
            self.attribute_types(),
            AttributeType::definition,
        );
        add(
            entry,
            oids::ATTR_OBJECT_CLASSES,
            self.object_classes(),
            ObjectClass::definition,
        );
        add(
            entry,
            oids::ATTR_MATCHING_RULE_USE,
            self.matching_rule_uses(),
            MatchingRuleUse::definition,
        );
        add(
            entry,
            oids::ATTR_MATCHING_RULES,
            self.matching_rules(),
            MatchingRule::definition,
        );
        add(
            entry,
            oids::ATTR_DIT_CONTENT_RULES,
            self.dit_content_rules(),
            DitContentRule::definition,
        );
        add(
            entry,
            oids::ATTR_DIT_STRUCTURE_RULES,
            self.dit_structure_rules(),
            DitStructureRule::definition,
        );
        add(entry, oids::ATTR_NAME_FORMS, self.name_forms(), NameForm::definition);
    }

    // ------------------------------------------------------------------
    // Entry validation
    // ------------------------------------------------------------------

    fn find_object_class(&self, name: &str) -> Option<Arc<ObjectClass>> {
        self.data()
            .and_then(|data| data.object_class(name).ok().flatten())
    }

    /// Resolve an entry attribute to its type, synthesizing a place-holder
    /// for names the schema does not know. Validation never fails on
    /// resolution alone; an unknown attribute simply matches no rule sets.
    fn attribute_type_or_placeholder(&self, name: &str) -> Arc<AttributeType> {
        self.data()
            .and_then(|data| data.attribute_type(name).ok().flatten())
            .unwrap_or_else(|| Arc::new(AttributeType::placeholder(name)))
    }

    /// The most specific structural object class among the entry's
    /// `objectClass` values, if any.
    fn structural_object_class_of(&self, entry: &Entry) -> Option<Arc<ObjectClass>> {
        let mut structural: Option<Arc<ObjectClass>> = None;
        if let Some(attribute) = entry.attribute(oids::ATTR_OBJECT_CLASS) {
            for value in attribute.values() {
                let Some(object_class) = self.find_object_class(value) else {
                    continue;
                };
                if object_class.kind() != ObjectClassKind::Structural {
                    continue;
                }
                match structural.clone() {
                    None => structural = Some(object_class),
                    Some(current) if object_class.is_descendant_of(&current) => {
                        structural = Some(object_class);
                    }
                    Some(_) => {}
                }
            }
        }
        structural
    }

    /// Validate an entry against this schema under the given policy.
    ///
    /// Returns `true` if the entry is acceptable. When `error_messages`
    /// is provided it accumulates every message generated, including ones
    /// produced by warn-only checks that did not cause rejection.
    pub fn validate_entry(
        &self,
        entry: &Entry,
        policy: &SchemaValidationPolicy,
        mut error_messages: Option<&mut Vec<String>>,
    ) -> bool {
        let dn = entry.name();

        // Resolve the object classes, tracking the most specific
        // structural class.
        let mut object_classes: Vec<Arc<ObjectClass>> = Vec::new();
        let mut structural: Option<Arc<ObjectClass>> = None;
        if let Some(attribute) = entry.attribute(oids::ATTR_OBJECT_CLASS) {
            for value in attribute.values() {
                let Some(object_class) = self.find_object_class(value) else {
                    if policy.check_attributes_and_object_classes.needs_checking() {
                        report(
                            &mut error_messages,
                            format!("entry {dn}: unknown object class {value}"),
                        );
                        if policy.check_attributes_and_object_classes.is_reject() {
                            return false;
                        }
                    }
                    continue;
                };
                object_classes.push(object_class.clone());
                if object_class.kind() == ObjectClassKind::Structural {
                    match structural.clone() {
                        None => structural = Some(object_class),
                        Some(current) => {
                            if object_class.is_descendant_of(&current) {
                                structural = Some(object_class);
                            } else if !current.is_descendant_of(&object_class)
                                && policy.require_single_structural_object_class.needs_checking()
                            {
                                report(
                                    &mut error_messages,
                                    format!(
                                        "entry {dn}: multiple unrelated structural object \
                                         classes {} and {}",
                                        current.name_or_oid(),
                                        object_class.name_or_oid()
                                    ),
                                );
                                if policy.require_single_structural_object_class.is_reject() {
                                    return false;
                                }
                            }
                        }
                    }
                }
            }
        }

        let mut content_rule: Option<Arc<DitContentRule>> = None;
        match &structural {
            None => {
                if policy.require_single_structural_object_class.needs_checking() {
                    report(
                        &mut error_messages,
                        format!("entry {dn}: no structural object class"),
                    );
                    if policy.require_single_structural_object_class.is_reject() {
                        return false;
                    }
                }
            }
            Some(structural) => {
                content_rule = self
                    .dit_content_rule_for_class(structural)
                    .filter(|rule| !rule.is_obsolete());
            }
        }

        if !self.check_attributes_and_object_classes(
            entry,
            policy,
            &mut error_messages,
            &object_classes,
            content_rule.as_deref(),
        ) {
            return false;
        }

        // Match the RDN against the name forms for the structural class.
        // Several forms may be registered; the first acceptable one wins
        // and selects the DIT structure rules to apply.
        let mut structure_rules: Vec<Arc<DitStructureRule>> = Vec::new();
        if policy.check_name_forms.needs_checking() {
            if let Some(structural) = &structural {
                let mut found_candidate_forms = false;
                let mut matched_form: Option<Arc<NameForm>> = None;
                let mut form_warnings: Vec<String> = Vec::new();
                for form in self.name_forms_for_structural_class(structural) {
                    if form.is_obsolete() {
                        continue;
                    }
                    found_candidate_forms = true;
                    if self.check_name_form(entry, &mut form_warnings, &form) {
                        matched_form = Some(form);
                        break;
                    }
                }
                if found_candidate_forms {
                    match matched_form {
                        Some(form) => {
                            structure_rules = self.dit_structure_rules_for_name_form(&form);
                        }
                        None => {
                            if let Some(messages) = error_messages.as_deref_mut() {
                                messages.extend(form_warnings);
                            }
                            if policy.check_name_forms.is_reject() {
                                return false;
                            }
                        }
                    }
                }
            }
        }

        // Structure rules need the parent entry's structural class.
        if policy.check_dit_structure_rules.needs_checking() && !dn.is_root() {
            let mut found_candidate_rules = false;
            let mut found_valid_rule = false;
            let mut rule_warnings: Vec<String> = Vec::new();
            let mut parent_structural: Option<Arc<ObjectClass>> = None;
            let mut parent_read = false;
            for rule in &structure_rules {
                if rule.is_obsolete() {
                    continue;
                }
                found_candidate_rules = true;
                // A rule with no superiors is valid on its own; skip the
                // parent read.
                if rule.superior_rule_ids().is_empty() {
                    found_valid_rule = true;
                    break;
                }
                if !parent_read {
                    parent_structural =
                        self.parent_structural_object_class(entry, policy, &mut rule_warnings);
                    parent_read = true;
                }
                if let Some(parent_structural) = &parent_structural {
                    if self.check_dit_structure_rule(
                        entry,
                        &mut rule_warnings,
                        rule,
                        structural.as_deref(),
                        parent_structural,
                    ) {
                        found_valid_rule = true;
                        break;
                    }
                }
            }

            if found_candidate_rules {
                if !found_valid_rule {
                    if let Some(messages) = error_messages.as_deref_mut() {
                        messages.extend(rule_warnings);
                    }
                    if policy.check_dit_structure_rules.is_reject() {
                        return false;
                    }
                }
            } else {
                // No rule applies to this entry; if one applies to the
                // parent, the entry cannot be legally placed beneath it.
                let parent_structural =
                    self.parent_structural_object_class(entry, policy, &mut rule_warnings);
                match parent_structural {
                    None => {
                        if let Some(messages) = error_messages.as_deref_mut() {
                            messages.extend(rule_warnings);
                        }
                        if policy.check_dit_structure_rules.is_reject() {
                            return false;
                        }
                    }
                    Some(parent_structural) => {
                        for form in self.name_forms_for_structural_class(&parent_structural) {
                            if form.is_obsolete() {
                                continue;
                            }
                            for rule in self.dit_structure_rules_for_name_form(&form) {
                                if rule.is_obsolete() {
                                    continue;
                                }
                                report(
                                    &mut error_messages,
                                    format!(
                                        "entry {dn}: DIT structure rule {} applies to the \
                                         parent entry but no rule applies to this entry",
                                        rule.name_or_rule_id()
                                    ),
                                );
                                if policy.check_dit_structure_rules.is_reject() {
                                    return false;
                                }
                            }
                        }
                    }
                }
            }
        }

        true
    }

    fn check_attributes_and_object_classes(
        &self,
        entry: &Entry,
        policy: &SchemaValidationPolicy,
        error_messages: &mut Option<&mut Vec<String>>,
        object_classes: &[Arc<ObjectClass>],
        content_rule: Option<&DitContentRule>,
    ) -> bool {
        let dn = entry.name();
        let check_content_rule =
            policy.check_dit_content_rules.needs_checking() && content_rule.is_some();
        let check_object_classes = policy.check_attributes_and_object_classes.needs_checking();
        let check_attribute_values = policy.check_attribute_values.needs_checking();

        // Resolve each entry attribute's type once.
        let entry_types: Vec<Arc<AttributeType>> = entry
            .attributes()
            .iter()
            .map(|attribute| self.attribute_type_or_placeholder(attribute.name()))
            .collect();
        let entry_has_type =
            |oid: &str| entry_types.iter().any(|attribute_type| attribute_type.oid() == oid);

        if check_object_classes || check_content_rule {
            for object_class in object_classes {
                if let Some(rule) = content_rule {
                    if check_content_rule
                        && object_class.kind() == ObjectClassKind::Auxiliary
                        && !rule.auxiliary_oids().contains(object_class.oid())
                    {
                        report(
                            error_messages,
                            format!(
                                "entry {dn}: auxiliary object class {} is not allowed by DIT \
                                 content rule {}",
                                object_class.name_or_oid(),
                                rule.name_or_oid()
                            ),
                        );
                        if policy.check_dit_content_rules.is_reject() {
                            return false;
                        }
                    }
                }

                if check_object_classes {
                    for required in object_class.declared_required_oids() {
                        if !entry_has_type(required) {
                            report(
                                error_messages,
                                format!(
                                    "entry {dn}: missing attribute {} required by object \
                                     class {}",
                                    self.attribute_name_for(required),
                                    object_class.name_or_oid()
                                ),
                            );
                            if policy.check_attributes_and_object_classes.is_reject() {
                                return false;
                            }
                        }
                    }
                }
            }

            if let Some(rule) = content_rule {
                if check_content_rule {
                    for required in rule.required_oids() {
                        if !entry_has_type(required) {
                            report(
                                error_messages,
                                format!(
                                    "entry {dn}: missing attribute {} required by DIT content \
                                     rule {}",
                                    self.attribute_name_for(required),
                                    rule.name_or_oid()
                                ),
                            );
                            if policy.check_dit_content_rules.is_reject() {
                                return false;
                            }
                        }
                    }
                    for prohibited in rule.prohibited_oids() {
                        if entry_has_type(prohibited) {
                            report(
                                error_messages,
                                format!(
                                    "entry {dn}: attribute {} is prohibited by DIT content \
                                     rule {}",
                                    self.attribute_name_for(prohibited),
                                    rule.name_or_oid()
                                ),
                            );
                            if policy.check_dit_content_rules.is_reject() {
                                return false;
                            }
                        }
                    }
                }
            }
        }

        if check_object_classes || check_content_rule || check_attribute_values {
            for (attribute, attribute_type) in entry.attributes().iter().zip(&entry_types) {
                if !attribute_type.is_operational() && (check_object_classes || check_content_rule)
                {
                    let mut allowed = object_classes
                        .iter()
                        .any(|object_class| object_class.is_required_or_optional(attribute_type.oid()));
                    if !allowed {
                        if let Some(rule) = content_rule {
                            allowed = rule.is_required_or_optional(attribute_type.oid());
                        }
                    }
                    if !allowed {
                        let message = match content_rule {
                            None => format!(
                                "entry {dn}: attribute {} is not allowed by any object class",
                                attribute.name()
                            ),
                            Some(rule) => format!(
                                "entry {dn}: attribute {} is not allowed by any object class \
                                 or by DIT content rule {}",
                                attribute.name(),
                                rule.name_or_oid()
                            ),
                        };
                        report(error_messages, message);
                        if policy.check_attributes_and_object_classes.is_reject()
                            || policy.check_dit_content_rules.is_reject()
                        {
                            return false;
                        }
                    }
                }

                if check_attribute_values {
                    if attribute.is_empty() {
                        report(
                            error_messages,
                            format!("entry {dn}: attribute {} has no values", attribute.name()),
                        );
                        if policy.check_attribute_values.is_reject() {
                            return false;
                        }
                    } else if attribute.len() > 1 && attribute_type.is_single_value() {
                        report(
                            error_messages,
                            format!(
                                "entry {dn}: single-valued attribute {} has multiple values",
                                attribute.name()
                            ),
                        );
                        if policy.check_attribute_values.is_reject() {
                            return false;
                        }
                    }
                }
            }
        }

        true
    }

    fn check_name_form(
        &self,
        entry: &Entry,
        form_warnings: &mut Vec<String>,
        form: &NameForm,
    ) -> bool {
        let dn = entry.name();
        let Some(rdn) = dn.rdn() else {
            return true;
        };

        let rdn_types: Vec<Arc<AttributeType>> = rdn
            .avas()
            .iter()
            .map(|ava| self.attribute_type_or_placeholder(ava.attribute()))
            .collect();

        for required in form.required_oids() {
            if !rdn_types.iter().any(|attribute_type| attribute_type.oid() == required) {
                form_warnings.push(format!(
                    "entry {dn}: RDN is missing attribute {} required by name form {}",
                    self.attribute_name_for(required),
                    form.name_or_oid()
                ));
                return false;
            }
        }

        for (ava, attribute_type) in rdn.avas().iter().zip(&rdn_types) {
            if !form.is_required_or_optional(attribute_type.oid()) {
                form_warnings.push(format!(
                    "entry {dn}: RDN attribute {} is not allowed by name form {}",
                    ava.attribute(),
                    form.name_or_oid()
                ));
                return false;
            }
        }

        true
    }

    fn check_dit_structure_rule(
        &self,
        entry: &Entry,
        rule_warnings: &mut Vec<String>,
        rule: &DitStructureRule,
        structural: Option<&ObjectClass>,
        parent_structural: &ObjectClass,
    ) -> bool {
        let mut match_found = false;
        for superior_id in rule.superior_rule_ids() {
            if let Some(superior) = self
                .data()
                .and_then(|data| data.structure_rules.get(superior_id).cloned())
            {
                if let Ok(form) = self.get_name_form(superior.name_form_oid()) {
                    if form.structural_class_oid() == parent_structural.oid() {
                        match_found = true;
                        break;
                    }
                }
            }
        }

        if !match_found {
            rule_warnings.push(format!(
                "entry {}: DIT structure rule {} does not allow entries governed by {} to be \
                 placed under {}",
                entry.name(),
                rule.name_or_rule_id(),
                structural.map_or("an unknown class", ObjectClass::name_or_oid),
                parent_structural.name_or_oid()
            ));
            return false;
        }
        true
    }

    fn parent_structural_object_class(
        &self,
        entry: &Entry,
        policy: &SchemaValidationPolicy,
        rule_warnings: &mut Vec<String>,
    ) -> Option<Arc<ObjectClass>> {
        let dn = entry.name();
        let parent_dn = dn.parent()?;

        let parent = match &policy.entry_resolver {
            None => {
                rule_warnings.push(format!(
                    "entry {dn}: parent entry could not be read: no entry resolver configured"
                ));
                return None;
            }
            Some(resolver) => match resolver.resolve_entry(&parent_dn) {
                Ok(parent) => parent,
                Err(error) => {
                    rule_warnings.push(format!(
                        "entry {dn}: parent entry could not be read: {error}"
                    ));
                    return None;
                }
            },
        };

        match self.structural_object_class_of(&parent) {
            Some(parent_structural) => Some(parent_structural),
            None => {
                rule_warnings.push(format!(
                    "entry {dn}: parent entry has no structural object class"
                ));
                None
            }
        }
    }

    /// A human-friendly label for an attribute type OID.
    fn attribute_name_for(&self, oid: &str) -> String {
        self.data()
            .and_then(|data| data.attribute_types.get(oid))
            .map_or_else(|| oid.to_string(), |t| t.name_or_oid().to_string())
    }
}

fn report(error_messages: &mut Option<&mut Vec<String>>, message: String) {
    if let Some(messages) = error_messages {
        messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SchemaBuilder;

    fn minimal_schema() -> Schema {
        let mut builder = SchemaBuilder::with_name("test");
        builder
            .add_syntax("( 1.3.6.1.4.1.1466.115.121.1.15 DESC 'Directory String' )", false)
            .unwrap()
            .add_attribute_type(
                "( 2.5.4.3 NAME 'cn' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
                false,
            )
            .unwrap();
        builder.to_schema()
    }

    #[test]
    fn test_strict_lookup_fails_for_unknown() {
        let schema = minimal_schema();
        assert!(schema.is_strict());
        assert!(schema.get_attribute_type("undefinedAttr").is_err());
    }

    #[test]
    fn test_non_strict_lookup_synthesizes_placeholder() {
        let schema = minimal_schema().as_non_strict_schema();
        let attribute_type = schema.get_attribute_type("undefinedAttr").unwrap();
        assert!(attribute_type.oid().ends_with("-oid"));
        assert_eq!(
            attribute_type.syntax_oid(),
            Some(oids::SYNTAX_OCTET_STRING_OID)
        );
        assert!(!schema.has_attribute_type("undefinedAttr"));
    }

    #[test]
    fn test_views_share_backing_data() {
        let schema = minimal_schema();
        let non_strict = schema.as_non_strict_schema();
        assert!(schema.same_backing(&non_strict));
        assert!(non_strict.as_strict_schema().same_backing(&schema));
        assert!(!schema.same_backing(&minimal_schema()));
    }

    #[test]
    fn test_empty_schema() {
        let schema = Schema::empty_schema();
        assert!(!schema.is_strict());
        assert!(schema.attribute_types().is_empty());
        assert!(schema.get_object_class("person").is_err());
        let placeholder = schema.get_attribute_type("anything").unwrap();
        assert!(placeholder.is_placeholder());
        assert!(schema.as_strict_schema().get_attribute_type("anything").is_err());
    }

    #[test]
    fn test_ambiguous_name_fails_in_both_modes() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_syntax("( 1.3.6.1.4.1.1466.115.121.1.15 )", false)
            .unwrap()
            .add_attribute_type(
                "( 1.2.3.1 NAME 'sharedName' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
                false,
            )
            .unwrap()
            .add_attribute_type(
                "( 1.2.3.2 NAME 'sharedName' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
                false,
            )
            .unwrap();
        let schema = builder.to_schema();
        assert!(matches!(
            schema.get_attribute_type("sharedName"),
            Err(SchemaError::AmbiguousName { .. })
        ));
        assert!(matches!(
            schema.as_non_strict_schema().get_attribute_type("sharedName"),
            Err(SchemaError::AmbiguousName { .. })
        ));
        assert_eq!(schema.attribute_types_with_name("sharedName").len(), 2);
    }
}
