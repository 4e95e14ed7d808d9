//! Lookups over a [`RuleSet`]: transitivity, cardinality and required
//! properties. Rules are checked here, never applied.

use tracing::warn;

use crate::ontology;
use crate::primitives::{NodeTypeId, PredicateId, PropertyNameId};
use crate::types::{Ontology, RuleCardinality, RuleSet, RuleTransitivity};

// --- transitivity ------------------------------------------------------------

pub fn get_transitivity_rule<'r>(
    rs: &'r RuleSet,
    source: &NodeTypeId,
    predicate: &PredicateId,
    target: &NodeTypeId,
) -> Option<&'r RuleTransitivity> {
    rs.transitivity_rules.iter().find(|r| {
        &r.source_type_id == source && &r.predicate_id == predicate && &r.target_type_id == target
    })
}

pub fn is_transitive(rs: &RuleSet, source: &NodeTypeId, predicate: &PredicateId, target: &NodeTypeId) -> bool {
    get_transitivity_rule(rs, source, predicate, target).is_some()
}

// --- cardinality -------------------------------------------------------------

/// The first cardinality rule for the triple, if any.
pub fn get_cardinality<'r>(
    rs: &'r RuleSet,
    source: &NodeTypeId,
    predicate: &PredicateId,
    target: &NodeTypeId,
) -> Option<&'r RuleCardinality> {
    rs.cardinality_rules.iter().find(|r| {
        &r.source_type_id == source && &r.predicate_id == predicate && &r.target_type_id == target
    })
}

pub fn has_cardinality_constraint(
    rs: &RuleSet,
    source: &NodeTypeId,
    predicate: &PredicateId,
    target: &NodeTypeId,
) -> bool {
    get_cardinality(rs, source, predicate, target).is_some()
}

/// Whether `count` targets satisfy the triple's cardinality rule. A triple
/// with no rule accepts any count.
pub fn check_cardinality(
    rs: &RuleSet,
    source: &NodeTypeId,
    predicate: &PredicateId,
    target: &NodeTypeId,
    count: u64,
) -> bool {
    get_cardinality(rs, source, predicate, target).map_or(true, |rule| rule.allows(count))
}

// --- required properties -----------------------------------------------------

/// Property names that nodes of `node_type` must carry.
pub fn get_required_properties_for_node_type(rs: &RuleSet, node_type: &NodeTypeId) -> Vec<PropertyNameId> {
    rs.required_node_properties
        .iter()
        .filter(|r| r.required && &r.node_type_id == node_type)
        .map(|r| r.property_name_id.clone())
        .collect()
}

pub fn is_node_property_required(rs: &RuleSet, node_type: &NodeTypeId, property: &PropertyNameId) -> bool {
    rs.required_node_properties
        .iter()
        .any(|r| r.required && &r.node_type_id == node_type && &r.property_name_id == property)
}

/// Whether any rule mentions the pair, whatever its `required` flag.
pub fn has_required_node_property_rule(rs: &RuleSet, node_type: &NodeTypeId, property: &PropertyNameId) -> bool {
    rs.required_node_properties
        .iter()
        .any(|r| &r.node_type_id == node_type && &r.property_name_id == property)
}

/// Property names that edges labelled `predicate` must carry.
pub fn get_required_properties_for_predicate(rs: &RuleSet, predicate: &PredicateId) -> Vec<PropertyNameId> {
    rs.required_edge_properties
        .iter()
        .filter(|r| r.required && &r.predicate_id == predicate)
        .map(|r| r.property_name_id.clone())
        .collect()
}

pub fn is_edge_property_required(rs: &RuleSet, predicate: &PredicateId, property: &PropertyNameId) -> bool {
    rs.required_edge_properties
        .iter()
        .any(|r| r.required && &r.predicate_id == predicate && &r.property_name_id == property)
}

pub fn has_required_edge_property_rule(rs: &RuleSet, predicate: &PredicateId, property: &PropertyNameId) -> bool {
    rs.required_edge_properties
        .iter()
        .any(|r| &r.predicate_id == predicate && &r.property_name_id == property)
}

// --- integrity ---------------------------------------------------------------

/// Problems with a rule set relative to its ontology: mismatched ontology id,
/// ids that do not resolve, and cardinality rules with `min > max`.
pub fn check_integrity(rs: &RuleSet, o: &Ontology) -> Vec<String> {
    let mut errors = Vec::new();

    if rs.ontology_id != o.ontology_id {
        errors.push(format!(
            "rule set {}: targets ontology {} but was checked against {}",
            rs.rule_set_ref, rs.ontology_id, o.ontology_id
        ));
    }

    let mut check_triple = |kind: &str, s: &NodeTypeId, p: &PredicateId, t: &NodeTypeId| {
        for (role, id) in [("source", s), ("target", t)] {
            if !ontology::has_node_type(o, id) {
                errors.push(format!("{kind} rule: {role} node type {id} not found"));
            }
        }
        if !ontology::has_predicate(o, p) {
            errors.push(format!("{kind} rule: predicate {p} not found"));
        }
    };
    for r in rs.transitivity_rules.iter() {
        check_triple("transitivity", &r.source_type_id, &r.predicate_id, &r.target_type_id);
    }
    for r in rs.cardinality_rules.iter() {
        check_triple("cardinality", &r.source_type_id, &r.predicate_id, &r.target_type_id);
    }

    for r in rs.cardinality_rules.iter() {
        if let Some(max) = r.max_targets {
            if r.min_targets > max {
                errors.push(format!(
                    "cardinality rule {} --{}--> {}: min {} exceeds max {}",
                    ontology::node_type_label(o, &r.source_type_id),
                    ontology::predicate_label(o, &r.predicate_id),
                    ontology::node_type_label(o, &r.target_type_id),
                    r.min_targets,
                    max
                ));
            }
        }
    }

    for r in rs.required_node_properties.iter() {
        if !ontology::has_node_type(o, &r.node_type_id) {
            errors.push(format!("required node property rule: node type {} not found", r.node_type_id));
        }
        if ontology::get_property_name(o, &r.property_name_id).is_none() {
            errors.push(format!(
                "required node property rule: property name {} not found",
                r.property_name_id
            ));
        }
    }
    for r in rs.required_edge_properties.iter() {
        if !ontology::has_predicate(o, &r.predicate_id) {
            errors.push(format!("required edge property rule: predicate {} not found", r.predicate_id));
        }
        if ontology::get_property_name(o, &r.property_name_id).is_none() {
            errors.push(format!(
                "required edge property rule: property name {} not found",
                r.property_name_id
            ));
        }
    }

    if !errors.is_empty() {
        warn!(rule_set = %rs.rule_set_ref, problems = errors.len(), "rule set integrity check failed");
    }
    errors
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::types::RuleRequiredNodeProperty;

    #[test]
    fn cardinality_lookup() {
        let rs = testing::code_structure_rule_set();
        let method = testing::node_type_id("method");
        let class = testing::node_type_id("class");
        let in_ = testing::predicate_id("in");
        let rule = get_cardinality(&rs, &method, &in_, &class).unwrap();
        assert_eq!(rule.min_targets.get(), 1);
        assert_eq!(rule.max_targets.map(|m| m.get()), Some(1));
        assert!(has_cardinality_constraint(&rs, &method, &in_, &class));
        assert!(!has_cardinality_constraint(&rs, &class, &in_, &method));
    }

    #[test]
    fn check_cardinality_without_rule_accepts_anything() {
        let rs = testing::code_structure_rule_set();
        let class = testing::node_type_id("class");
        let contains = testing::predicate_id("contains");
        assert!(check_cardinality(&rs, &class, &contains, &class, 99));
        let method = testing::node_type_id("method");
        let in_ = testing::predicate_id("in");
        assert!(!check_cardinality(&rs, &method, &in_, &class, 0));
        assert!(check_cardinality(&rs, &method, &in_, &class, 1));
        assert!(!check_cardinality(&rs, &method, &in_, &class, 2));
    }

    #[test]
    fn transitivity_lookup() {
        let rs = testing::code_structure_rule_set();
        let class = testing::node_type_id("class");
        let inherits = testing::predicate_id("inherits_from");
        assert!(is_transitive(&rs, &class, &inherits, &class));
        assert!(get_transitivity_rule(&rs, &class, &testing::predicate_id("contains"), &class).is_none());
    }

    #[test]
    fn required_properties_honour_flag() {
        let mut rs = testing::code_structure_rule_set();
        let method = testing::node_type_id("method");
        let line = testing::property_name_id("line_number");
        let doc = testing::property_name_id("docstring");
        rs.required_node_properties.push(RuleRequiredNodeProperty {
            node_type_id: method.clone(),
            property_name_id: doc.clone(),
            required: false,
        });
        assert_eq!(get_required_properties_for_node_type(&rs, &method), vec![line.clone()]);
        assert!(is_node_property_required(&rs, &method, &line));
        assert!(!is_node_property_required(&rs, &method, &doc));
        assert!(has_required_node_property_rule(&rs, &method, &doc));
    }

    #[test]
    fn required_edge_properties() {
        let rs = testing::code_structure_rule_set();
        let calls = testing::predicate_id("calls");
        let line = testing::property_name_id("line_number");
        assert_eq!(get_required_properties_for_predicate(&rs, &calls), vec![line.clone()]);
        assert!(is_edge_property_required(&rs, &calls, &line));
        assert!(has_required_edge_property_rule(&rs, &calls, &line));
        assert!(!is_edge_property_required(&rs, &testing::predicate_id("in"), &line));
    }

    #[test]
    fn fixture_rule_set_is_consistent() {
        let rs = testing::code_structure_rule_set();
        let o = testing::code_structure_ontology();
        assert_eq!(check_integrity(&rs, &o), Vec::<String>::new());
    }

    #[test]
    fn integrity_flags_min_above_max() {
        let mut rs = testing::code_structure_rule_set();
        rs.cardinality_rules.push(RuleCardinality::new(
            testing::node_type_id("class"),
            testing::predicate_id("in"),
            testing::node_type_id("module"),
            3,
            Some(1),
        ));
        let errors = check_integrity(&rs, &testing::code_structure_ontology());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("min 3 exceeds max 1"), "{}", errors[0]);
    }
}
