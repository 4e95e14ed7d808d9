//! Lookups and edge-rule checks over an [`Ontology`].
//!
//! Id lookups are O(1) map reads; ref lookups scan. [`is_valid_edge`] scans
//! the rule list, which is fine for hand-written ontologies. Callers that
//! check many edges against the same ontology (the builder and the
//! validator) build an [`EdgeRuleIndex`] once instead.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::primitives::{
    NodeTypeId, NodeTypeRef, PredicateId, PredicateRef, PropertyNameId, PropertyNameRef,
    PropertyTypeId, PropertyTypeRef,
};
use crate::taxonomy;
use crate::types::{
    Ontology, OntologyNodeType, OntologyPredicate, OntologyPropertyName, OntologyPropertyType,
    Taxonomy,
};

// --- lookups -----------------------------------------------------------------

pub fn get_node_type<'o>(o: &'o Ontology, id: &NodeTypeId) -> Option<&'o OntologyNodeType> {
    o.node_types.get(id)
}

pub fn has_node_type(o: &Ontology, id: &NodeTypeId) -> bool {
    o.node_types.contains_key(id)
}

pub fn get_predicate<'o>(o: &'o Ontology, id: &PredicateId) -> Option<&'o OntologyPredicate> {
    o.predicates.get(id)
}

pub fn has_predicate(o: &Ontology, id: &PredicateId) -> bool {
    o.predicates.contains_key(id)
}

pub fn get_property_name<'o>(o: &'o Ontology, id: &PropertyNameId) -> Option<&'o OntologyPropertyName> {
    o.property_names.get(id)
}

pub fn get_property_type<'o>(o: &'o Ontology, id: &PropertyTypeId) -> Option<&'o OntologyPropertyType> {
    o.property_types.get(id)
}

pub fn get_node_type_by_ref<'o>(o: &'o Ontology, r: &NodeTypeRef) -> Option<&'o OntologyNodeType> {
    o.node_types.values().find(|nt| &nt.node_type_ref == r)
}

pub fn get_predicate_by_ref<'o>(o: &'o Ontology, r: &PredicateRef) -> Option<&'o OntologyPredicate> {
    o.predicates.values().find(|p| &p.predicate_ref == r)
}

pub fn get_property_name_by_ref<'o>(o: &'o Ontology, r: &PropertyNameRef) -> Option<&'o OntologyPropertyName> {
    o.property_names.values().find(|p| &p.property_name_ref == r)
}

pub fn get_property_type_by_ref<'o>(o: &'o Ontology, r: &PropertyTypeRef) -> Option<&'o OntologyPropertyType> {
    o.property_types.values().find(|p| &p.property_type_ref == r)
}

pub fn node_type_ids(o: &Ontology) -> Vec<NodeTypeId> {
    o.node_types.keys().cloned().collect()
}

/// The ref of a node type, or its id when the ontology does not define it.
/// Used for error messages.
pub fn node_type_label(o: &Ontology, id: &NodeTypeId) -> String {
    get_node_type(o, id).map_or_else(|| id.to_string(), |nt| nt.node_type_ref.to_string())
}

/// The ref of a predicate, or its id when the ontology does not define it.
pub fn predicate_label(o: &Ontology, id: &PredicateId) -> String {
    get_predicate(o, id).map_or_else(|| id.to_string(), |p| p.predicate_ref.to_string())
}

pub fn property_name_label(o: &Ontology, id: &PropertyNameId) -> String {
    get_property_name(o, id).map_or_else(|| id.to_string(), |p| p.property_name_ref.to_string())
}

// --- predicates and edges ----------------------------------------------------

/// The predicate named by `pred`'s `inverse_id`.
///
/// A symmetric predicate returns itself. `None` when `pred` is unknown, has
/// no inverse, or its inverse does not resolve.
pub fn get_inverse_predicate<'o>(o: &'o Ontology, pred: &PredicateId) -> Option<&'o OntologyPredicate> {
    let inverse_id = o.predicates.get(pred)?.inverse_id.as_ref()?;
    o.predicates.get(inverse_id)
}

/// Whether some edge rule matches the triple exactly.
pub fn is_valid_edge(o: &Ontology, source: &NodeTypeId, predicate: &PredicateId, target: &NodeTypeId) -> bool {
    o.edge_rules.iter().any(|r| {
        &r.source_type_id == source && &r.predicate_id == predicate && &r.target_type_id == target
    })
}

/// The permitted `(source, predicate, target)` triples, lazily.
pub fn all_valid_edges(o: &Ontology) -> impl Iterator<Item = (&NodeTypeId, &PredicateId, &NodeTypeId)> {
    o.edge_rules
        .iter()
        .map(|r| (&r.source_type_id, &r.predicate_id, &r.target_type_id))
}

/// Target types allowed for `source --predicate-->`, in rule order.
pub fn valid_targets<'o>(o: &'o Ontology, source: &NodeTypeId, predicate: &PredicateId) -> Vec<&'o NodeTypeId> {
    o.edge_rules
        .iter()
        .filter(|r| &r.source_type_id == source && &r.predicate_id == predicate)
        .map(|r| &r.target_type_id)
        .collect()
}

/// `"{source}_{predicate}_{target}"`, e.g. `module_contains_class`.
pub fn edge_forward_name(source: &NodeTypeRef, predicate: &PredicateRef, target: &NodeTypeRef) -> String {
    format!("{source}_{predicate}_{target}")
}

/// The forward name read backwards through the inverse predicate, e.g.
/// `class_in_module` for `(module, contains, class)`. Empty when `predicate`
/// is unknown or has no inverse.
pub fn edge_inverse_name(o: &Ontology, source: &NodeTypeRef, predicate: &PredicateRef, target: &NodeTypeRef) -> String {
    get_predicate_by_ref(o, predicate)
        .and_then(|p| get_inverse_predicate(o, &p.predicate_id))
        .map(|inverse| format!("{target}_{}_{source}", inverse.predicate_ref))
        .unwrap_or_default()
}

/// Edge rules indexed by `(source, predicate)`.
#[derive(Debug, Clone, Default)]
pub struct EdgeRuleIndex {
    targets: HashMap<(NodeTypeId, PredicateId), Vec<NodeTypeId>>,
}

impl EdgeRuleIndex {
    pub fn new(o: &Ontology) -> Self {
        let mut targets: HashMap<(NodeTypeId, PredicateId), Vec<NodeTypeId>> = HashMap::new();
        for rule in o.edge_rules.iter() {
            let slot = targets
                .entry((rule.source_type_id.clone(), rule.predicate_id.clone()))
                .or_default();
            if !slot.contains(&rule.target_type_id) {
                slot.push(rule.target_type_id.clone());
            }
        }
        Self { targets }
    }

    pub fn is_valid(&self, source: &NodeTypeId, predicate: &PredicateId, target: &NodeTypeId) -> bool {
        self.targets(source, predicate).contains(target)
    }

    pub fn targets(&self, source: &NodeTypeId, predicate: &PredicateId) -> &[NodeTypeId] {
        self.targets
            .get(&(source.clone(), predicate.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct `(source, predicate)` pairs.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

// --- integrity ---------------------------------------------------------------

/// Referential problems inside an ontology, as human-readable messages.
///
/// Checks that property names point at known property types, edge rules
/// name known node types and predicates, inverse predicates resolve and
/// agree, and refs are unique per kind. With a taxonomy, node-type
/// categories must resolve in it and its id must match `o.taxonomy_id`.
pub fn check_integrity(o: &Ontology, t: Option<&Taxonomy>) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(t) = t {
        if t.taxonomy_id != o.taxonomy_id {
            errors.push(format!(
                "ontology {}: references taxonomy {} but was checked against {}",
                o.ontology_ref, o.taxonomy_id, t.taxonomy_id
            ));
        }
        for nt in o.node_types.values() {
            if !taxonomy::has_category(t, &nt.category_id) {
                errors.push(format!(
                    "node type {}: category {} not found in taxonomy",
                    nt.node_type_ref, nt.category_id
                ));
            }
        }
    }

    for pn in o.property_names.values() {
        if !o.property_types.contains_key(&pn.property_type_id) {
            errors.push(format!(
                "property name {}: property type {} not found",
                pn.property_name_ref, pn.property_type_id
            ));
        }
    }

    for rule in o.edge_rules.iter() {
        for (role, id) in [("source", &rule.source_type_id), ("target", &rule.target_type_id)] {
            if !has_node_type(o, id) {
                errors.push(format!("edge rule: {role} node type {id} not found"));
            }
        }
        if !has_predicate(o, &rule.predicate_id) {
            errors.push(format!("edge rule: predicate {} not found", rule.predicate_id));
        }
    }

    for p in o.predicates.values() {
        let Some(inverse_id) = &p.inverse_id else {
            continue;
        };
        match o.predicates.get(inverse_id) {
            None => errors.push(format!(
                "predicate {}: inverse {} not found",
                p.predicate_ref, inverse_id
            )),
            Some(inverse) if inverse.inverse_id.as_ref() != Some(&p.predicate_id) => {
                errors.push(format!(
                    "predicate {}: inverse {} does not point back",
                    p.predicate_ref, inverse.predicate_ref
                ))
            }
            Some(_) => {}
        }
    }

    duplicate_refs("node type", o.node_types.values().map(|x| x.node_type_ref.as_str()), &mut errors);
    duplicate_refs("predicate", o.predicates.values().map(|x| x.predicate_ref.as_str()), &mut errors);
    duplicate_refs(
        "property type",
        o.property_types.values().map(|x| x.property_type_ref.as_str()),
        &mut errors,
    );
    duplicate_refs(
        "property name",
        o.property_names.values().map(|x| x.property_name_ref.as_str()),
        &mut errors,
    );

    if !errors.is_empty() {
        warn!(ontology = %o.ontology_ref, problems = errors.len(), "ontology integrity check failed");
    }
    errors
}

fn duplicate_refs<'a>(kind: &str, refs: impl Iterator<Item = &'a str>, errors: &mut Vec<String>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for r in refs {
        if !seen.insert(r) && reported.insert(r) {
            errors.push(format!("{kind} ref '{r}' is not unique"));
        }
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn refs(s: &str, p: &str, t: &str) -> (NodeTypeRef, PredicateRef, NodeTypeRef) {
        (
            NodeTypeRef::new(s).unwrap(),
            PredicateRef::new(p).unwrap(),
            NodeTypeRef::new(t).unwrap(),
        )
    }

    #[test]
    fn every_rule_is_a_valid_edge() {
        let o = testing::code_structure_ontology();
        for (s, p, t) in all_valid_edges(&o) {
            assert!(is_valid_edge(&o, s, p, t));
        }
        assert_eq!(all_valid_edges(&o).count(), o.edge_rules.len());
    }

    #[test]
    fn invalid_edge_is_rejected() {
        let o = testing::code_structure_ontology();
        let method = testing::node_type_id("method");
        let class = testing::node_type_id("class");
        let contains = testing::predicate_id("contains");
        assert!(is_valid_edge(&o, &class, &contains, &method));
        assert!(!is_valid_edge(&o, &method, &contains, &class));
    }

    #[test]
    fn inverse_predicates_are_symmetric() {
        let o = testing::code_structure_ontology();
        let contains = testing::predicate_id("contains");
        let in_ = testing::predicate_id("in");
        assert_eq!(get_inverse_predicate(&o, &contains).unwrap().predicate_id, in_);
        assert_eq!(get_inverse_predicate(&o, &in_).unwrap().predicate_id, contains);
        for p in o.predicates.values() {
            if let Some(q) = get_inverse_predicate(&o, &p.predicate_id) {
                let back = get_inverse_predicate(&o, &q.predicate_id).unwrap();
                assert_eq!(back.predicate_id, p.predicate_id);
            }
        }
    }

    #[test]
    fn edge_names() {
        let o = testing::code_structure_ontology();
        let (s, p, t) = refs("module", "contains", "class");
        assert_eq!(edge_forward_name(&s, &p, &t), "module_contains_class");
        assert_eq!(edge_inverse_name(&o, &s, &p, &t), "class_in_module");
        let (s, p, t) = refs("module", "unknown", "class");
        assert_eq!(edge_inverse_name(&o, &s, &p, &t), "");
    }

    #[test]
    fn lookups_by_ref() {
        let o = testing::code_structure_ontology();
        let method = get_node_type_by_ref(&o, &NodeTypeRef::new("method").unwrap()).unwrap();
        assert_eq!(method.node_type_id, testing::node_type_id("method"));
        assert!(get_predicate_by_ref(&o, &PredicateRef::new("calls").unwrap()).is_some());
        assert!(get_node_type_by_ref(&o, &NodeTypeRef::new("nope").unwrap()).is_none());
        assert_eq!(node_type_label(&o, &method.node_type_id), "method");
    }

    #[test]
    fn index_agrees_with_scan() {
        let o = testing::code_structure_ontology();
        let index = EdgeRuleIndex::new(&o);
        for s in node_type_ids(&o) {
            for p in o.predicates.keys() {
                for t in node_type_ids(&o) {
                    assert_eq!(index.is_valid(&s, p, &t), is_valid_edge(&o, &s, p, &t));
                }
                let scanned: HashSet<&NodeTypeId> = valid_targets(&o, &s, p).into_iter().collect();
                let indexed: HashSet<&NodeTypeId> = index.targets(&s, p).iter().collect();
                assert_eq!(indexed, scanned);
            }
        }
    }

    #[test]
    fn fixture_ontology_is_consistent() {
        let t = testing::code_elements_taxonomy();
        let o = testing::code_structure_ontology();
        assert_eq!(check_integrity(&o, Some(&t)), Vec::<String>::new());
    }

    #[test]
    fn integrity_flags_one_sided_inverse_and_dangling_rule() {
        let mut o = testing::code_structure_ontology();
        let in_ = testing::predicate_id("in");
        o.predicates.get_mut(&in_).unwrap().inverse_id = None;
        o.edge_rules.push(crate::types::EdgeRule::new(
            NodeTypeId::from_seed("nowhere"),
            in_,
            testing::node_type_id("class"),
        ));
        let errors = check_integrity(&o, None);
        assert!(errors.iter().any(|e| e.contains("does not point back")));
        assert!(errors.iter().any(|e| e.contains("source node type")));
    }
}
