use std::collections::HashMap;

use tracing::debug;

use crate::ontology::{self, EdgeRuleIndex};
use crate::primitives::{NodeId, NodeTypeId, PredicateId};
use crate::rules;
use crate::types::{Ontology, RuleSet, SemanticGraph, ValidationResult};

/// Checks a finished [`SemanticGraph`] against an ontology and, optionally,
/// a rule set.
///
/// Passes run in a fixed order and every problem found is reported:
///
/// 1. every node type resolves in the ontology;
/// 2. every edge has both endpoints and is allowed by an edge rule;
/// 3. cardinality rules hold (rule set only);
/// 4. required properties are present (rule set and
///    [`with_required_properties`](Self::with_required_properties) only).
///
/// Type and predicate ids are rendered as refs in messages whenever the
/// ontology defines them.
#[derive(Debug, Clone)]
pub struct Validator<'o> {
    ontology: &'o Ontology,
    index: EdgeRuleIndex,
    rule_set: Option<&'o RuleSet>,
    required_properties: bool,
}

impl<'o> Validator<'o> {
    pub fn new(ontology: &'o Ontology) -> Self {
        Self {
            ontology,
            index: EdgeRuleIndex::new(ontology),
            rule_set: None,
            required_properties: false,
        }
    }

    pub fn with_rule_set(mut self, rule_set: &'o RuleSet) -> Self {
        self.rule_set = Some(rule_set);
        self
    }

    /// Also check the rule set's required node and edge properties.
    pub fn with_required_properties(mut self) -> Self {
        self.required_properties = true;
        self
    }

    /// Run every enabled pass over `graph`. Never fails; problems are
    /// returned in [`ValidationResult::errors`].
    pub fn validate(&self, graph: &SemanticGraph) -> ValidationResult {
        let mut errors = Vec::new();

        self.check_node_types(graph, &mut errors);
        self.check_edges(graph, &mut errors);
        if let Some(rs) = self.rule_set {
            self.check_cardinality(graph, rs, &mut errors);
            if self.required_properties {
                self.check_required_properties(graph, rs, &mut errors);
            }
        }

        debug!(
            graph = %graph.graph_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            errors = errors.len(),
            "validated graph"
        );
        ValidationResult::from_errors(errors)
    }

    /// Whether an edge `from --predicate--> to` would be valid in `graph`:
    /// both nodes exist and an edge rule allows their types.
    pub fn validate_edge(&self, graph: &SemanticGraph, from: &NodeId, predicate: &PredicateId, to: &NodeId) -> bool {
        match (graph.nodes.get(from), graph.nodes.get(to)) {
            (Some(f), Some(t)) => self.index.is_valid(&f.node_type_id, predicate, &t.node_type_id),
            _ => false,
        }
    }

    // --- passes --------------------------------------------------------------

    fn check_node_types(&self, graph: &SemanticGraph, errors: &mut Vec<String>) {
        for node in graph.nodes.values() {
            if !ontology::has_node_type(self.ontology, &node.node_type_id) {
                errors.push(format!(
                    "Node {}: unknown node_type '{}'",
                    node.node_id, node.node_type_id
                ));
            }
        }
    }

    fn check_edges(&self, graph: &SemanticGraph, errors: &mut Vec<String>) {
        for edge in graph.edges.iter() {
            let Some(from) = graph.nodes.get(&edge.from_node_id) else {
                errors.push(format!(
                    "Edge {}: from_node '{}' not found",
                    edge.edge_id, edge.from_node_id
                ));
                continue;
            };
            let Some(to) = graph.nodes.get(&edge.to_node_id) else {
                errors.push(format!(
                    "Edge {}: to_node '{}' not found",
                    edge.edge_id, edge.to_node_id
                ));
                continue;
            };
            if !self.index.is_valid(&from.node_type_id, &edge.predicate_id, &to.node_type_id) {
                errors.push(format!(
                    "Edge {}: invalid edge {} --{}--> {}",
                    edge.edge_id,
                    self.type_label(&from.node_type_id),
                    ontology::predicate_label(self.ontology, &edge.predicate_id),
                    self.type_label(&to.node_type_id),
                ));
            }
        }
    }

    fn check_cardinality(&self, graph: &SemanticGraph, rs: &RuleSet, errors: &mut Vec<String>) {
        if rs.cardinality_rules.is_empty() {
            return;
        }

        // (from node, predicate, target type) -> count
        let mut counts: HashMap<(&NodeId, &PredicateId, &NodeTypeId), u64> = HashMap::new();
        for edge in graph.edges.iter() {
            if let Some(target) = graph.nodes.get(&edge.to_node_id) {
                *counts
                    .entry((&edge.from_node_id, &edge.predicate_id, &target.node_type_id))
                    .or_default() += 1;
            }
        }

        for rule in rs.cardinality_rules.iter() {
            let pred = ontology::predicate_label(self.ontology, &rule.predicate_id);
            let target = self.type_label(&rule.target_type_id);
            for node in graph.nodes.values().filter(|n| n.node_type_id == rule.source_type_id) {
                let count = counts
                    .get(&(&node.node_id, &rule.predicate_id, &rule.target_type_id))
                    .copied()
                    .unwrap_or(0);
                let min = rule.min_targets.get();
                if count < min {
                    errors.push(format!(
                        "Node {}: needs at least {min} {pred} edges to {target}, has {count}",
                        node.node_id
                    ));
                }
                if let Some(max) = rule.max_targets.map(|m| m.get()) {
                    if count > max {
                        errors.push(format!(
                            "Node {}: allows at most {max} {pred} edges to {target}, has {count}",
                            node.node_id
                        ));
                    }
                }
            }
        }
    }

    fn check_required_properties(&self, graph: &SemanticGraph, rs: &RuleSet, errors: &mut Vec<String>) {
        for node in graph.nodes.values() {
            for property in rules::get_required_properties_for_node_type(rs, &node.node_type_id) {
                if node.property(&property).is_none() {
                    errors.push(format!(
                        "Node {}: missing required property '{}'",
                        node.node_id,
                        ontology::property_name_label(self.ontology, &property)
                    ));
                }
            }
        }
        for edge in graph.edges.iter() {
            for property in rules::get_required_properties_for_predicate(rs, &edge.predicate_id) {
                if edge.property(&property).is_none() {
                    errors.push(format!(
                        "Edge {}: missing required property '{}'",
                        edge.edge_id,
                        ontology::property_name_label(self.ontology, &property)
                    ));
                }
            }
        }
    }

    fn type_label(&self, id: &NodeTypeId) -> String {
        ontology::node_type_label(self.ontology, id)
    }
}

// --- tests -------------------------------------------------------------------
