use serde::{Deserialize, Serialize};

use crate::collections::TypedList;
use crate::primitives::{
    IdSource, NodeTypeId, OntologyId, PredicateId, PropertyNameId, RuleSetId, RuleSetRef,
    SafeStrText, SafeStrVersion, SafeUInt,
};

/// Bounds on how many `predicate` edges a `source_type` node may have to
/// `target_type` nodes. `max_targets = None` means unbounded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleCardinality {
    pub source_type_id: NodeTypeId,
    pub predicate_id: PredicateId,
    pub target_type_id: NodeTypeId,

    #[serde(default)]
    pub min_targets: SafeUInt,

    #[serde(default)]
    pub max_targets: Option<SafeUInt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<SafeStrText>,
}

impl RuleCardinality {
    pub fn new(
        source_type_id: NodeTypeId,
        predicate_id: PredicateId,
        target_type_id: NodeTypeId,
        min_targets: u64,
        max_targets: Option<u64>,
    ) -> Self {
        Self {
            source_type_id,
            predicate_id,
            target_type_id,
            min_targets: SafeUInt::new(min_targets),
            max_targets: max_targets.map(SafeUInt::new),
            description: None,
        }
    }

    /// Whether `count` targets satisfy this rule.
    pub fn allows(&self, count: u64) -> bool {
        count >= self.min_targets.get() && self.max_targets.map_or(true, |max| count <= max.get())
    }
}

/// Declares that a `(source, predicate, target)` relationship is transitive.
/// Rules are checked, never applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleTransitivity {
    pub source_type_id: NodeTypeId,
    pub predicate_id: PredicateId,
    pub target_type_id: NodeTypeId,
}

fn required_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleRequiredNodeProperty {
    pub node_type_id: NodeTypeId,
    pub property_name_id: PropertyNameId,

    #[serde(default = "required_default")]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleRequiredEdgeProperty {
    pub predicate_id: PredicateId,
    pub property_name_id: PropertyNameId,

    #[serde(default = "required_default")]
    pub required: bool,
}

/// Auxiliary constraints over one ontology.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSet {
    pub rule_set_id: RuleSetId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_set_id_source: Option<IdSource>,

    pub rule_set_ref: RuleSetRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<SafeStrVersion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<SafeStrText>,

    pub ontology_id: OntologyId,

    #[serde(default)]
    pub transitivity_rules: TypedList<RuleTransitivity>,

    #[serde(default)]
    pub cardinality_rules: TypedList<RuleCardinality>,

    #[serde(default)]
    pub required_node_properties: TypedList<RuleRequiredNodeProperty>,

    #[serde(default)]
    pub required_edge_properties: TypedList<RuleRequiredEdgeProperty>,
}

impl RuleSet {
    pub fn new(rule_set_id: RuleSetId, rule_set_ref: RuleSetRef, ontology_id: OntologyId) -> Self {
        Self {
            rule_set_id,
            rule_set_id_source: None,
            rule_set_ref,
            version: None,
            description: None,
            ontology_id,
            transitivity_rules: TypedList::new(),
            cardinality_rules: TypedList::new(),
            required_node_properties: TypedList::new(),
            required_edge_properties: TypedList::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaEntity;
    use serde_json::json;

    fn ids() -> (NodeTypeId, PredicateId, NodeTypeId) {
        (
            NodeTypeId::from_seed("test:node_type:method"),
            PredicateId::from_seed("test:predicate:in"),
            NodeTypeId::from_seed("test:node_type:class"),
        )
    }

    #[test]
    fn cardinality_bounds() {
        let (s, p, t) = ids();
        let exactly_one = RuleCardinality::new(s.clone(), p.clone(), t.clone(), 1, Some(1));
        assert!(!exactly_one.allows(0));
        assert!(exactly_one.allows(1));
        assert!(!exactly_one.allows(2));
        let at_least_one = RuleCardinality::new(s, p, t, 1, None);
        assert!(at_least_one.allows(100));
    }

    #[test]
    fn cardinality_rejects_boolean_bounds() {
        let raw = json!({
            "source_type_id": "99a23b6f",
            "predicate_id": "c35666f3",
            "target_type_id": "2a530b24",
            "min_targets": true
        });
        assert!(RuleCardinality::try_from_json(raw).is_err());
    }

    #[test]
    fn required_defaults_to_true() {
        let rule = RuleRequiredNodeProperty::try_from_json(json!({
            "node_type_id": "99a23b6f",
            "property_name_id": "a1234567"
        }))
        .unwrap();
        assert!(rule.required);
    }

    #[test]
    fn rule_set_roundtrip() {
        let (s, p, t) = ids();
        let mut rs = RuleSet::new(
            RuleSetId::from_seed("kb:rules"),
            RuleSetRef::new("kb_rules").unwrap(),
            OntologyId::from_seed("kb:ontology"),
        );
        rs.cardinality_rules.push(RuleCardinality::new(s.clone(), p.clone(), t.clone(), 1, Some(1)));
        rs.transitivity_rules.push(RuleTransitivity {
            source_type_id: s,
            predicate_id: p,
            target_type_id: t,
        });
        let json = rs.to_json().unwrap();
        assert_eq!(json["rule_set_id"], "e5ea36c9");
        assert_eq!(json["cardinality_rules"][0]["max_targets"], 1);
        assert_eq!(RuleSet::try_from_json(json).unwrap(), rs);
    }
}
