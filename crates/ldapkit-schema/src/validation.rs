//! Cross-reference validation of a staged schema.
//!
//! The pass runs in a fixed order so that each phase can rely on the ones
//! before it: syntaxes, matching rules, attribute types, object classes,
//! matching rule uses, name forms, DIT content rules, DIT structure rules.
//! Elements with hierarchical dependencies (attribute types, object
//! classes, structure rules) are resolved with a memoized depth-first walk
//! instead of a separate topological sort.
//!
//! Validation never aborts the build: an element that cannot be resolved
//! is excised from the schema and a warning is recorded. Directory schemas
//! in the wild routinely carry minor inconsistencies, and a schema with a
//! few broken elements is more useful than no schema at all.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::builder::Staging;
use crate::oids;
use crate::schema::Schema;
use crate::syntax::{Syntax, SyntaxKind};

/// Tri-state used by the memoized walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Valid,
    Invalid,
}

pub(crate) fn build_schema(name: String, mut staging: Staging) -> Schema {
    validate_syntaxes(&mut staging);
    validate_matching_rules(&mut staging);
    validate_attribute_types(&mut staging);
    validate_object_classes(&mut staging);
    validate_matching_rule_uses(&mut staging);
    let class_to_forms = validate_name_forms(&mut staging);
    validate_content_rules(&mut staging);
    let form_to_rules = validate_structure_rules(&mut staging);
    cache_definitions(&mut staging);
    Schema::from_staging(name, staging, class_to_forms, form_to_rules)
}

fn cache_definitions(staging: &mut Staging) {
    for syntax in staging.syntaxes.values_mut() {
        syntax.cache_definition();
    }
    for rule in staging.matching_rules.values_mut() {
        rule.cache_definition();
    }
    for use_ in staging.matching_rule_uses.values_mut() {
        use_.cache_definition();
    }
    for attribute_type in staging.attribute_types.values_mut() {
        attribute_type.cache_definition();
    }
    for object_class in staging.object_classes.values_mut() {
        object_class.cache_definition();
    }
    for form in staging.name_forms.values_mut() {
        form.cache_definition();
    }
    for rule in staging.content_rules.values_mut() {
        rule.cache_definition();
    }
    for rule in staging.structure_rules.values_mut() {
        rule.cache_definition();
    }
}

// ----------------------------------------------------------------------
// Phase 1: syntaxes
// ----------------------------------------------------------------------

/// Resolve `X-SUBST` and `X-PATTERN` behavior. An unresolvable extension
/// falls back to default handling with a warning; it never drops the
/// syntax.
fn validate_syntaxes(staging: &mut Staging) {
    let oids: Vec<String> = staging.syntaxes.keys().cloned().collect();
    let known: BTreeSet<String> = oids.iter().cloned().collect();
    let substitutes: BTreeMap<String, Option<String>> = staging
        .syntaxes
        .iter()
        .map(|(oid, syntax)| {
            let target = syntax
                .extra_properties
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("x-subst"))
                .and_then(|(_, values)| values.first().cloned());
            (oid.clone(), target)
        })
        .collect();

    for oid in oids {
        let mut resolved_kind = None;
        let mut warning = None;

        let syntax = &staging.syntaxes[&oid];
        if matches!(syntax.kind, SyntaxKind::Standard) {
            let subst = syntax
                .extra_properties
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("x-subst"))
                .and_then(|(_, values)| values.first().cloned());
            let pattern = syntax
                .extra_properties
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("x-pattern"))
                .and_then(|(_, values)| values.first().cloned());

            if let Some(target) = subst {
                match check_substitution_chain(&oid, &target, &known, &substitutes) {
                    Ok(()) => resolved_kind = Some(SyntaxKind::Substitution(target)),
                    Err(reason) => {
                        warning = Some(format!(
                            "syntax {oid} falls back to default handling: {reason}"
                        ));
                    }
                }
            } else if let Some(pattern) = pattern {
                match regex::Regex::new(&pattern) {
                    Ok(compiled) => resolved_kind = Some(SyntaxKind::Pattern(compiled)),
                    Err(error) => {
                        warning = Some(format!(
                            "syntax {oid} falls back to default handling: invalid pattern \
                             \"{pattern}\": {error}"
                        ));
                    }
                }
            }
        }

        if let Some(message) = warning {
            debug!(syntax = %oid, "syntax fell back to default handling");
            staging.warnings.push(message);
        }
        let default_matching_rule = staging.default_matching_rule_oid.clone();
        if let Some(syntax) = staging.syntaxes.get_mut(&oid) {
            if let Some(kind) = resolved_kind {
                syntax.kind = kind;
            }
            syntax.equality_oid = Some(default_matching_rule);
            if let SyntaxKind::Enumeration(_) = syntax.kind {
                syntax.ordering_oid =
                    Some(format!("{}.{}", oids::OMR_GENERIC_ENUM_OID_PREFIX, oid));
            }
        }
    }
}

fn check_substitution_chain(
    origin: &str,
    target: &str,
    known: &BTreeSet<String>,
    substitutes: &BTreeMap<String, Option<String>>,
) -> Result<(), String> {
    if target == origin {
        return Err(format!("substitute syntax {target} refers to itself"));
    }
    if !known.contains(target) {
        return Err(format!("substitute syntax {target} is not defined"));
    }
    // Follow the substitution chain to reject cycles.
    let mut visited = BTreeSet::from([origin.to_string()]);
    let mut current = target.to_string();
    loop {
        if !visited.insert(current.clone()) {
            return Err(format!(
                "substitute syntax {target} forms a substitution cycle"
            ));
        }
        match substitutes.get(&current).and_then(Clone::clone) {
            Some(next) if known.contains(&next) => current = next,
            _ => return Ok(()),
        }
    }
}

// ----------------------------------------------------------------------
// Phase 2: matching rules
// ----------------------------------------------------------------------

fn validate_matching_rules(staging: &mut Staging) {
    let oids: Vec<String> = staging.matching_rules.keys().cloned().collect();
    for oid in oids {
        let syntax_oid = staging.matching_rules[&oid].syntax_oid.clone();
        if !staging.syntaxes.contains_key(&syntax_oid) {
            let name = staging.matching_rules[&oid].name_or_oid().to_string();
            staging.warnings.push(format!(
                "matching rule {name} was removed from the schema: assertion syntax \
                 {syntax_oid} is not defined"
            ));
            staging.remove_matching_rule_element(&oid);
        }
    }
}

// ----------------------------------------------------------------------
// Phase 3: attribute types
// ----------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
struct ResolvedAttributeType {
    superior: Option<String>,
    syntax: Option<String>,
    equality: Option<String>,
    ordering: Option<String>,
    substring: Option<String>,
    approximate: Option<String>,
}

fn validate_attribute_types(staging: &mut Staging) {
    let oids: Vec<String> = staging.attribute_types.keys().cloned().collect();
    let mut states: HashMap<String, VisitState> = HashMap::new();
    let mut resolved: HashMap<String, ResolvedAttributeType> = HashMap::new();
    let mut failures: Vec<(String, String)> = Vec::new();

    for oid in &oids {
        check_attribute_type(oid, staging, &mut states, &mut resolved, &mut failures);
    }

    for (oid, reason) in failures {
        let name = staging
            .attribute_types
            .get(&oid)
            .map_or_else(|| oid.clone(), |a| a.name_or_oid().to_string());
        staging.warnings.push(format!(
            "attribute type {name} was removed from the schema: {reason}"
        ));
        staging.remove_attribute_type_element(&oid);
    }

    for (oid, res) in resolved {
        if states.get(&oid) != Some(&VisitState::Valid) {
            continue;
        }
        if let Some(attribute_type) = staging.attribute_types.get_mut(&oid) {
            attribute_type.effective_superior_oid = res.superior;
            attribute_type.effective_syntax_oid = res.syntax;
            attribute_type.effective_equality_oid = res.equality;
            attribute_type.effective_ordering_oid = res.ordering;
            attribute_type.effective_substring_oid = res.substring;
            attribute_type.effective_approximate_oid = res.approximate;
        }
    }
}

fn check_attribute_type(
    oid: &str,
    staging: &Staging,
    states: &mut HashMap<String, VisitState>,
    resolved: &mut HashMap<String, ResolvedAttributeType>,
    failures: &mut Vec<(String, String)>,
) -> bool {
    match states.get(oid) {
        Some(VisitState::Valid) => return true,
        // An in-progress re-entry means a superior cycle; the member being
        // revisited is treated as unresolved, which invalidates the whole
        // cycle.
        Some(VisitState::Invalid) | Some(VisitState::InProgress) => return false,
        None => {}
    }
    states.insert(oid.to_string(), VisitState::InProgress);

    let Some(attribute_type) = staging.attribute_types.get(oid) else {
        states.insert(oid.to_string(), VisitState::Invalid);
        return false;
    };

    let mut invalid = |states: &mut HashMap<String, VisitState>,
                       failures: &mut Vec<(String, String)>,
                       reason: String| {
        states.insert(oid.to_string(), VisitState::Invalid);
        failures.push((oid.to_string(), reason));
        false
    };

    let mut res = ResolvedAttributeType::default();

    if let Some(superior_ref) = &attribute_type.superior_oid {
        match staging.find_attribute_type_oid(superior_ref) {
            Ok(superior_oid) => {
                if !check_attribute_type(&superior_oid, staging, states, resolved, failures) {
                    return invalid(
                        states,
                        failures,
                        format!("superior attribute type {superior_ref} is invalid"),
                    );
                }
                res.superior = Some(superior_oid);
            }
            Err(reason) => return invalid(states, failures, reason),
        }
    }

    if let Some(syntax_oid) = &attribute_type.syntax_oid {
        if staging.syntaxes.contains_key(syntax_oid) {
            res.syntax = Some(syntax_oid.clone());
        } else {
            return invalid(
                states,
                failures,
                format!("syntax {syntax_oid} is not defined"),
            );
        }
    } else if let Some(superior_oid) = &res.superior {
        res.syntax = resolved.get(superior_oid).and_then(|r| r.syntax.clone());
        if res.syntax.is_none() {
            return invalid(
                states,
                failures,
                "no syntax could be resolved through the superior type chain".to_string(),
            );
        }
    }

    let superior_resolved = res
        .superior
        .as_ref()
        .and_then(|superior| resolved.get(superior).cloned());
    let slots = [
        (&attribute_type.equality_oid, "equality"),
        (&attribute_type.ordering_oid, "ordering"),
        (&attribute_type.substring_oid, "substring"),
        (&attribute_type.approximate_oid, "approximate"),
    ];
    let mut effective = [None, None, None, None];
    for (i, (declared, label)) in slots.iter().enumerate() {
        if let Some(rule_ref) = declared {
            match staging.find_matching_rule_oid(rule_ref) {
                Ok(rule_oid) => effective[i] = Some(rule_oid),
                Err(_) => {
                    return invalid(
                        states,
                        failures,
                        format!("{label} matching rule {rule_ref} is not defined"),
                    )
                }
            }
        } else if let Some(superior_resolved) = &superior_resolved {
            effective[i] = match i {
                0 => superior_resolved.equality.clone(),
                1 => superior_resolved.ordering.clone(),
                2 => superior_resolved.substring.clone(),
                _ => superior_resolved.approximate.clone(),
            };
        }
    }
    let [equality, ordering, substring, approximate] = effective;
    res.equality = equality;
    res.ordering = ordering;
    res.substring = substring;
    res.approximate = approximate;

    states.insert(oid.to_string(), VisitState::Valid);
    resolved.insert(oid.to_string(), res);
    true
}

// ----------------------------------------------------------------------
// Phase 4: object classes
// ----------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
struct ResolvedObjectClass {
    superiors: Vec<String>,
    ancestors: BTreeSet<String>,
    declared_required: BTreeSet<String>,
    required: BTreeSet<String>,
    optional: BTreeSet<String>,
}

fn validate_object_classes(staging: &mut Staging) {
    let oids: Vec<String> = staging.object_classes.keys().cloned().collect();
    let mut states: HashMap<String, VisitState> = HashMap::new();
    let mut resolved: HashMap<String, ResolvedObjectClass> = HashMap::new();
    let mut failures: Vec<(String, String)> = Vec::new();

    for oid in &oids {
        check_object_class(oid, staging, &mut states, &mut resolved, &mut failures);
    }

    for (oid, reason) in failures {
        let name = staging
            .object_classes
            .get(&oid)
            .map_or_else(|| oid.clone(), |c| c.name_or_oid().to_string());
        staging.warnings.push(format!(
            "object class {name} was removed from the schema: {reason}"
        ));
        staging.remove_object_class_element(&oid);
    }

    for (oid, res) in resolved {
        if states.get(&oid) != Some(&VisitState::Valid) {
            continue;
        }
        if let Some(object_class) = staging.object_classes.get_mut(&oid) {
            object_class.effective_superior_oids = res.superiors;
            object_class.ancestor_oids = res.ancestors;
            object_class.declared_required = res.declared_required;
            object_class.effective_required = res.required;
            object_class.effective_optional = res.optional;
        }
    }
}

fn check_object_class(
    oid: &str,
    staging: &Staging,
    states: &mut HashMap<String, VisitState>,
    resolved: &mut HashMap<String, ResolvedObjectClass>,
    failures: &mut Vec<(String, String)>,
) -> bool {
    match states.get(oid) {
        Some(VisitState::Valid) => return true,
        Some(VisitState::Invalid) | Some(VisitState::InProgress) => return false,
        None => {}
    }
    states.insert(oid.to_string(), VisitState::InProgress);

    let Some(object_class) = staging.object_classes.get(oid) else {
        states.insert(oid.to_string(), VisitState::Invalid);
        return false;
    };

    let mut invalid = |states: &mut HashMap<String, VisitState>,
                       failures: &mut Vec<(String, String)>,
                       reason: String| {
        states.insert(oid.to_string(), VisitState::Invalid);
        failures.push((oid.to_string(), reason));
        false
    };

    use crate::object_class::ObjectClassKind::{Abstract, Auxiliary, Structural};

    let is_top = oid == oids::TOP_OBJECTCLASS_OID || object_class.has_name(oids::TOP_OBJECTCLASS_NAME);
    let mut superior_refs = object_class.superior_oids.clone();
    // RFC 4512: a structural class ultimately derives from top. One that
    // declares no superior gets top injected as its default superior.
    if superior_refs.is_empty() && object_class.kind == Structural && !is_top {
        superior_refs.push(oids::TOP_OBJECTCLASS_NAME.to_string());
    }

    let mut res = ResolvedObjectClass::default();
    for superior_ref in &superior_refs {
        let superior_oid = match staging.find_object_class_oid(superior_ref) {
            Ok(superior_oid) => superior_oid,
            Err(reason) => return invalid(states, failures, reason),
        };
        if !check_object_class(&superior_oid, staging, states, resolved, failures) {
            return invalid(
                states,
                failures,
                format!("superior object class {superior_ref} is invalid"),
            );
        }
        let superior = &staging.object_classes[&superior_oid];
        let compatible = match object_class.kind {
            Abstract => superior.kind == Abstract,
            Auxiliary => matches!(superior.kind, Abstract | Auxiliary),
            Structural => matches!(superior.kind, Abstract | Structural),
        };
        if !compatible {
            return invalid(
                states,
                failures,
                format!(
                    "{} class {} may not derive from {} class {}",
                    object_class.kind,
                    object_class.name_or_oid(),
                    superior.kind,
                    superior.name_or_oid()
                ),
            );
        }
        res.superiors.push(superior_oid.clone());
        res.ancestors.insert(superior_oid.clone());
        if let Some(superior_resolved) = resolved.get(&superior_oid) {
            res.ancestors
                .extend(superior_resolved.ancestors.iter().cloned());
            // Required and optional attributes are unioned across the
            // whole superior chain into the effective sets.
            res.required.extend(superior_resolved.required.iter().cloned());
            res.optional.extend(superior_resolved.optional.iter().cloned());
        }
    }

    if object_class.kind == Structural && !is_top {
        let derives_from_top = res.ancestors.iter().any(|ancestor| {
            ancestor == oids::TOP_OBJECTCLASS_OID
                || staging
                    .object_classes
                    .get(ancestor)
                    .is_some_and(|c| c.has_name(oids::TOP_OBJECTCLASS_NAME))
        });
        if !derives_from_top {
            return invalid(
                states,
                failures,
                format!(
                    "structural object class {} does not derive from top",
                    object_class.name_or_oid()
                ),
            );
        }
    }

    for attribute_ref in &object_class.required_oids {
        match staging.find_attribute_type_oid(attribute_ref) {
            Ok(attribute_oid) => {
                res.declared_required.insert(attribute_oid.clone());
                res.required.insert(attribute_oid);
            }
            Err(reason) => {
                return invalid(
                    states,
                    failures,
                    format!("required attribute {attribute_ref}: {reason}"),
                )
            }
        }
    }
    for attribute_ref in &object_class.optional_oids {
        match staging.find_attribute_type_oid(attribute_ref) {
            Ok(attribute_oid) => {
                res.optional.insert(attribute_oid);
            }
            Err(reason) => {
                return invalid(
                    states,
                    failures,
                    format!("optional attribute {attribute_ref}: {reason}"),
                )
            }
        }
    }

    states.insert(oid.to_string(), VisitState::Valid);
    resolved.insert(oid.to_string(), res);
    true
}

// ----------------------------------------------------------------------
// Phase 5: matching rule uses
// ----------------------------------------------------------------------

fn validate_matching_rule_uses(staging: &mut Staging) {
    let keys: Vec<String> = staging.matching_rule_uses.keys().cloned().collect();
    for key in keys {
        let use_ = &staging.matching_rule_uses[&key];
        let name = use_.name_or_oid().to_string();

        let mut failure = None;
        if !staging.matching_rules.contains_key(&use_.matching_rule_oid) {
            failure = Some(format!(
                "matching rule {} is not defined",
                use_.matching_rule_oid
            ));
        }
        let mut applies = Vec::new();
        if failure.is_none() {
            for attribute_ref in &use_.applies_oids {
                match staging.find_attribute_type_oid(attribute_ref) {
                    Ok(attribute_oid) => applies.push(attribute_oid),
                    Err(reason) => {
                        failure = Some(reason);
                        break;
                    }
                }
            }
        }

        match failure {
            Some(reason) => {
                staging.warnings.push(format!(
                    "matching rule use {name} was removed from the schema: {reason}"
                ));
                staging.remove_matching_rule_use_element(&key);
            }
            None => {
                if let Some(use_) = staging.matching_rule_uses.get_mut(&key) {
                    use_.effective_applies = applies;
                }
            }
        }
    }
}

// ----------------------------------------------------------------------
// Phase 6: name forms
// ----------------------------------------------------------------------

fn validate_name_forms(staging: &mut Staging) -> BTreeMap<String, Vec<String>> {
    let mut class_to_forms: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let keys: Vec<String> = staging.name_forms.keys().cloned().collect();
    for key in keys {
        let form = &staging.name_forms[&key];
        let name = form.name_or_oid().to_string();

        let mut failure = None;
        let mut class_oid = String::new();
        match staging.find_object_class_oid(&form.structural_class_oid) {
            Ok(resolved_class) => {
                let class = &staging.object_classes[&resolved_class];
                if class.kind != crate::object_class::ObjectClassKind::Structural {
                    failure = Some(format!(
                        "object class {} is not structural",
                        class.name_or_oid()
                    ));
                } else {
                    class_oid = resolved_class;
                }
            }
            Err(reason) => failure = Some(reason),
        }

        let mut required = BTreeSet::new();
        let mut optional = BTreeSet::new();
        if failure.is_none() {
            for attribute_ref in &form.required_oids {
                match staging.find_attribute_type_oid(attribute_ref) {
                    Ok(attribute_oid) => {
                        required.insert(attribute_oid);
                    }
                    Err(reason) => {
                        failure = Some(reason);
                        break;
                    }
                }
            }
        }
        if failure.is_none() {
            for attribute_ref in &form.optional_oids {
                match staging.find_attribute_type_oid(attribute_ref) {
                    Ok(attribute_oid) => {
                        optional.insert(attribute_oid);
                    }
                    Err(reason) => {
                        failure = Some(reason);
                        break;
                    }
                }
            }
        }

        match failure {
            Some(reason) => {
                staging.warnings.push(format!(
                    "name form {name} was removed from the schema: {reason}"
                ));
                staging.remove_name_form_element(&key);
            }
            None => {
                if let Some(form) = staging.name_forms.get_mut(&key) {
                    form.effective_structural_class_oid = class_oid.clone();
                    form.effective_required = required;
                    form.effective_optional = optional;
                }
                class_to_forms.entry(class_oid).or_default().push(key);
            }
        }
    }
    class_to_forms
}

// ----------------------------------------------------------------------
// Phase 7: DIT content rules
// ----------------------------------------------------------------------

fn validate_content_rules(staging: &mut Staging) {
    let keys: Vec<String> = staging.content_rules.keys().cloned().collect();
    for key in keys {
        let rule = &staging.content_rules[&key];
        let name = rule.name_or_oid().to_string();

        let mut failure = None;
        let mut structural_oid = String::new();
        match staging.find_object_class_oid(&rule.structural_class_oid) {
            Ok(resolved_class) => {
                let class = &staging.object_classes[&resolved_class];
                if class.kind != crate::object_class::ObjectClassKind::Structural {
                    failure = Some(format!(
                        "object class {} is not structural",
                        class.name_or_oid()
                    ));
                } else {
                    structural_oid = resolved_class;
                }
            }
            Err(reason) => failure = Some(reason),
        }

        let mut auxiliary = BTreeSet::new();
        if failure.is_none() {
            for class_ref in &rule.auxiliary_oids {
                match staging.find_object_class_oid(class_ref) {
                    Ok(class_oid) => {
                        let class = &staging.object_classes[&class_oid];
                        if class.kind != crate::object_class::ObjectClassKind::Auxiliary {
                            failure = Some(format!(
                                "object class {} is not auxiliary",
                                class.name_or_oid()
                            ));
                            break;
                        }
                        auxiliary.insert(class_oid);
                    }
                    Err(reason) => {
                        failure = Some(reason);
                        break;
                    }
                }
            }
        }

        let mut sets = [BTreeSet::new(), BTreeSet::new(), BTreeSet::new()];
        if failure.is_none() {
            let slots = [
                &rule.required_oids,
                &rule.optional_oids,
                &rule.prohibited_oids,
            ];
            'outer: for (i, refs) in slots.iter().enumerate() {
                for attribute_ref in refs.iter() {
                    match staging.find_attribute_type_oid(attribute_ref) {
                        Ok(attribute_oid) => {
                            sets[i].insert(attribute_oid);
                        }
                        Err(reason) => {
                            failure = Some(reason);
                            break 'outer;
                        }
                    }
                }
            }
        }

        match failure {
            Some(reason) => {
                staging.warnings.push(format!(
                    "DIT content rule {name} was removed from the schema: {reason}"
                ));
                staging.remove_content_rule_element(&key);
            }
            None => {
                let [required, optional, prohibited] = sets;
                if let Some(mut rule) = staging.content_rules.remove(&key) {
                    rule.effective_auxiliary = auxiliary;
                    rule.effective_required = required;
                    rule.effective_optional = optional;
                    rule.effective_prohibited = prohibited;
                    // Re-key under the canonical structural class OID so
                    // entry validation can find the rule by class.
                    rule.structural_class_oid = structural_oid.clone();
                    staging.content_rules.insert(structural_oid, rule);
                }
            }
        }
    }
}

// ----------------------------------------------------------------------
// Phase 8: DIT structure rules
// ----------------------------------------------------------------------

fn validate_structure_rules(staging: &mut Staging) -> BTreeMap<String, Vec<u32>> {
    let ids: Vec<u32> = staging.structure_rules.keys().copied().collect();
    let mut states: HashMap<u32, VisitState> = HashMap::new();
    let mut resolved_forms: HashMap<u32, String> = HashMap::new();
    let mut failures: Vec<(u32, String)> = Vec::new();

    for id in &ids {
        check_structure_rule(*id, staging, &mut states, &mut resolved_forms, &mut failures);
    }

    for (id, reason) in failures {
        let name = staging
            .structure_rules
            .get(&id)
            .map_or_else(|| id.to_string(), |r| r.name_or_rule_id());
        staging.warnings.push(format!(
            "DIT structure rule {name} was removed from the schema: {reason}"
        ));
        staging.remove_structure_rule_element(id);
    }

    let mut form_to_rules: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for (id, form_oid) in resolved_forms {
        if states.get(&id) != Some(&VisitState::Valid) {
            continue;
        }
        if let Some(rule) = staging.structure_rules.get_mut(&id) {
            rule.effective_name_form_oid = form_oid.clone();
            form_to_rules.entry(form_oid).or_default().push(id);
        }
    }
    form_to_rules
}

fn check_structure_rule(
    id: u32,
    staging: &Staging,
    states: &mut HashMap<u32, VisitState>,
    resolved_forms: &mut HashMap<u32, String>,
    failures: &mut Vec<(u32, String)>,
) -> bool {
    match states.get(&id) {
        Some(VisitState::Valid) => return true,
        Some(VisitState::Invalid) => return false,
        // A superior-rule cycle is not treated as a failure: revisiting an
        // in-progress rule short-circuits as resolved, matching the
        // behavior directory servers have historically accepted.
        Some(VisitState::InProgress) => return true,
        None => {}
    }
    states.insert(id, VisitState::InProgress);

    let Some(rule) = staging.structure_rules.get(&id) else {
        states.insert(id, VisitState::Invalid);
        return false;
    };

    let mut invalid = |states: &mut HashMap<u32, VisitState>,
                       failures: &mut Vec<(u32, String)>,
                       reason: String| {
        states.insert(id, VisitState::Invalid);
        failures.push((id, reason));
        false
    };

    for superior_id in &rule.superior_rule_ids {
        if !staging.structure_rules.contains_key(superior_id) {
            return invalid(
                states,
                failures,
                format!("superior rule {superior_id} is not defined"),
            );
        }
        if !check_structure_rule(*superior_id, staging, states, resolved_forms, failures) {
            return invalid(
                states,
                failures,
                format!("superior rule {superior_id} is invalid"),
            );
        }
    }

    match staging.find_name_form_oid(&rule.name_form_oid) {
        Ok(form_oid) => {
            resolved_forms.insert(id, form_oid);
        }
        Err(reason) => return invalid(states, failures, reason),
    }

    states.insert(id, VisitState::Valid);
    true
}

// Keep an Octet String fallback available even when a staged schema lacks
// the default syntax or matching rule it names.
pub(crate) fn fallback_default_syntax() -> Syntax {
    Syntax::new(oids::SYNTAX_OCTET_STRING_OID).with_description("Octet String")
}

pub(crate) fn fallback_default_matching_rule() -> crate::matching_rule::MatchingRule {
    crate::matching_rule::MatchingRule::new(
        oids::EMR_OCTET_STRING_OID,
        oids::SYNTAX_OCTET_STRING_OID,
    )
    .with_name("octetStringMatch")
}
