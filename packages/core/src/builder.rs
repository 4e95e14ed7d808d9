//! Fluent construction of [`SemanticGraph`]s.
//!
//! ```text
//! fresh ──create──► building ──build──► SemanticGraph
//!                     │  ▲
//!                     └──┘ with_ontology / add_node / add_edge
//! ```
//!
//! With an ontology attached, edges that no edge rule allows are not added.
//! [`SemanticGraphBuilder::add_edge`] reports that by returning `None`;
//! [`SemanticGraphBuilder::try_add_edge`] says why. Use the
//! [`Validator`](crate::validation::Validator) to enumerate every problem in
//! a finished graph rather than relying on builder rejections.

use thiserror::Error;
use tracing::debug;

use crate::graph::GraphView;
use crate::ontology::{self, EdgeRuleIndex};
use crate::primitives::{
    mint_id, EdgeId, GraphId, IdSeed, NodeId, NodeTypeId, NodeTypeRef, OntologyId,
    PredicateId, PredicateRef, PropertyNameId, RuleSetId, SafeStrId, SafeStrText,
};
use crate::registry::OntologyRegistry;
use crate::types::{Ontology, SemanticGraph, SemanticGraphEdge, SemanticGraphNode};

/// Why the builder refused an edge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EdgeRejection {
    #[error("from node {node_id} not found")]
    UnknownFromNode { node_id: NodeId },

    #[error("to node {node_id} not found")]
    UnknownToNode { node_id: NodeId },

    #[error("invalid edge {from_type} --{predicate}--> {to_type}")]
    InvalidEdge {
        from_type: String,
        predicate: String,
        to_type: String,
    },

    #[error("unresolved {kind} ref '{value}'")]
    UnresolvedRef { kind: &'static str, value: String },
}

/// Builds one graph. Owns the graph until [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct SemanticGraphBuilder<'a> {
    graph: SemanticGraph,
    ontology: Option<(&'a Ontology, EdgeRuleIndex)>,
    registry: Option<&'a OntologyRegistry>,
}

impl<'a> SemanticGraphBuilder<'a> {
    /// Start a graph for `ontology_id` with a random graph id.
    pub fn create(ontology_id: OntologyId, rule_set_id: Option<RuleSetId>) -> Self {
        let mut graph = SemanticGraph::new(GraphId::random(), ontology_id);
        graph.rule_set_id = rule_set_id;
        Self {
            graph,
            ontology: None,
            registry: None,
        }
    }

    pub fn with_graph_id(mut self, graph_id: GraphId) -> Self {
        self.graph.graph_id = graph_id;
        self.graph.graph_id_source = None;
        self
    }

    /// Derive the graph id from `seed` and record the seed.
    pub fn with_deterministic_graph_id(mut self, seed: &IdSeed) -> Self {
        let (graph_id, source) = mint_id::<GraphId>(Some(seed));
        self.graph.graph_id = graph_id;
        self.graph.graph_id_source = source;
        self
    }

    /// Enable edge validation against `ontology`.
    pub fn with_ontology(mut self, ontology: &'a Ontology) -> Self {
        self.ontology = Some((ontology, EdgeRuleIndex::new(ontology)));
        self
    }

    /// Resolve node-type and predicate refs through `registry` when no
    /// ontology is attached. Does not enable validation.
    pub fn with_registry(mut self, registry: &'a OntologyRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The graph built so far.
    pub fn graph(&self) -> &SemanticGraph {
        &self.graph
    }

    pub fn build(self) -> SemanticGraph {
        self.graph
    }

    // --- nodes ---------------------------------------------------------------

    /// Append a node. The id is derived from `seed` when given, random otherwise.
    pub fn add_node(&mut self, node_type: &NodeTypeId, name: &SafeStrId, seed: Option<&IdSeed>) -> NodeId {
        let (node_id, source) = mint_id::<NodeId>(seed);
        let mut node = SemanticGraphNode::new(node_id.clone(), node_type.clone(), name.clone());
        node.node_id_source = source;
        self.graph.nodes.insert(node_id.clone(), node);
        node_id
    }

    /// Append a node with a caller-chosen id. A node already stored under
    /// `node_id` is replaced in place.
    pub fn add_node_with_id(&mut self, node_id: NodeId, node_type: &NodeTypeId, name: &SafeStrId) -> NodeId {
        let node = SemanticGraphNode::new(node_id.clone(), node_type.clone(), name.clone());
        self.graph.nodes.insert(node_id.clone(), node);
        node_id
    }

    /// Append a node whose type is given by ref. `None` when the ref does not
    /// resolve.
    pub fn add_node_by_ref(&mut self, type_ref: &NodeTypeRef, name: &SafeStrId, seed: Option<&IdSeed>) -> Option<NodeId> {
        match self.resolve_node_type(type_ref) {
            Ok(node_type) => Some(self.add_node(&node_type, name, seed)),
            Err(rejection) => {
                debug!(%rejection, "node not added");
                None
            }
        }
    }

    /// Set a property on an existing node. Returns false if the node is unknown.
    pub fn set_node_property(&mut self, node_id: &NodeId, property: PropertyNameId, value: SafeStrText) -> bool {
        match self.graph.nodes.get_mut(node_id) {
            Some(node) => {
                node.set_property(property, value);
                true
            }
            None => false,
        }
    }

    // --- edges ---------------------------------------------------------------

    /// Append an edge, or return `None` if the attached ontology rejects it.
    pub fn add_edge(&mut self, from: &NodeId, predicate: &PredicateId, to: &NodeId, seed: Option<&IdSeed>) -> Option<EdgeId> {
        match self.try_add_edge(from, predicate, to, seed) {
            Ok(edge_id) => Some(edge_id),
            Err(rejection) => {
                debug!(%rejection, "edge not added");
                None
            }
        }
    }

    /// Append an edge, or say why the attached ontology rejects it.
    ///
    /// Without an ontology every edge is accepted, including edges whose
    /// endpoints are not in the graph.
    pub fn try_add_edge(
        &mut self,
        from: &NodeId,
        predicate: &PredicateId,
        to: &NodeId,
        seed: Option<&IdSeed>,
    ) -> Result<EdgeId, EdgeRejection> {
        if let Some((o, index)) = &self.ontology {
            let from_node = self.graph.nodes.get(from).ok_or_else(|| EdgeRejection::UnknownFromNode {
                node_id: from.clone(),
            })?;
            let to_node = self.graph.nodes.get(to).ok_or_else(|| EdgeRejection::UnknownToNode {
                node_id: to.clone(),
            })?;
            if !index.is_valid(&from_node.node_type_id, predicate, &to_node.node_type_id) {
                return Err(EdgeRejection::InvalidEdge {
                    from_type: ontology::node_type_label(o, &from_node.node_type_id),
                    predicate: ontology::predicate_label(o, predicate),
                    to_type: ontology::node_type_label(o, &to_node.node_type_id),
                });
            }
        }

        let (edge_id, source) = mint_id::<EdgeId>(seed);
        let mut edge = SemanticGraphEdge::new(edge_id.clone(), from.clone(), predicate.clone(), to.clone());
        edge.edge_id_source = source;
        self.graph.edges.push(edge);
        Ok(edge_id)
    }

    /// [`add_edge`](Self::add_edge) with the predicate given by ref.
    pub fn add_edge_by_ref(&mut self, from: &NodeId, predicate: &PredicateRef, to: &NodeId, seed: Option<&IdSeed>) -> Option<EdgeId> {
        match self.try_add_edge_by_ref(from, predicate, to, seed) {
            Ok(edge_id) => Some(edge_id),
            Err(rejection) => {
                debug!(%rejection, "edge not added");
                None
            }
        }
    }

    pub fn try_add_edge_by_ref(
        &mut self,
        from: &NodeId,
        predicate: &PredicateRef,
        to: &NodeId,
        seed: Option<&IdSeed>,
    ) -> Result<EdgeId, EdgeRejection> {
        let predicate_id = self.resolve_predicate(predicate)?;
        self.try_add_edge(from, &predicate_id, to, seed)
    }

    /// Set a property on an existing edge. Returns false if the edge is unknown.
    pub fn set_edge_property(&mut self, edge_id: &EdgeId, property: PropertyNameId, value: SafeStrText) -> bool {
        match self.graph.edges.iter_mut().find(|e| &e.edge_id == edge_id) {
            Some(edge) => {
                edge.set_property(property, value);
                true
            }
            None => false,
        }
    }

    // --- lookups -------------------------------------------------------------

    pub fn find_node_by_name(&self, name: &SafeStrId) -> Option<NodeId> {
        GraphView::new(&self.graph)
            .find_node_by_name(name)
            .map(|n| n.node_id.clone())
    }

    pub fn find_nodes_by_type(&self, node_type: &NodeTypeId) -> Vec<NodeId> {
        GraphView::new(&self.graph)
            .nodes_by_type(node_type)
            .into_iter()
            .map(|n| n.node_id.clone())
            .collect()
    }

    /// The ontology used for ref resolution: the attached one, else the
    /// registry entry for the graph's ontology id.
    fn resolving_ontology(&self) -> Option<&'a Ontology> {
        if let Some((o, _)) = &self.ontology {
            return Some(*o);
        }
        self.registry?.get(&self.graph.ontology_id)
    }

    fn resolve_node_type(&self, type_ref: &NodeTypeRef) -> Result<NodeTypeId, EdgeRejection> {
        self.resolving_ontology()
            .and_then(|o| ontology::get_node_type_by_ref(o, type_ref))
            .map(|nt| nt.node_type_id.clone())
            .ok_or_else(|| EdgeRejection::UnresolvedRef {
                kind: "node_type",
                value: type_ref.to_string(),
            })
    }

    fn resolve_predicate(&self, predicate: &PredicateRef) -> Result<PredicateId, EdgeRejection> {
        self.resolving_ontology()
            .and_then(|o| ontology::get_predicate_by_ref(o, predicate))
            .map(|p| p.predicate_id.clone())
            .ok_or_else(|| EdgeRejection::UnresolvedRef {
                kind: "predicate",
                value: predicate.to_string(),
            })
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::validation::Validator;

    fn name(s: &str) -> SafeStrId {
        SafeStrId::new(s).unwrap()
    }

    fn seed(s: &str) -> IdSeed {
        IdSeed::new(s).unwrap()
    }

    #[test]
    fn seeded_nodes_are_deterministic() {
        let o = testing::code_structure_ontology();
        let mut a = SemanticGraphBuilder::create(o.ontology_id.clone(), None);
        let mut b = SemanticGraphBuilder::create(o.ontology_id.clone(), None);
        let module = testing::node_type_id("module");
        let id_a = a.add_node(&module, &name("m"), Some(&seed("test:node:m")));
        let id_b = b.add_node(&module, &name("m"), Some(&seed("test:node:m")));
        assert_eq!(id_a, id_b);
        assert_eq!(id_a, NodeId::from_seed("test:node:m"));
        let g = a.build();
        let node = g.nodes.get(&id_a).unwrap();
        assert_eq!(node.node_id_source.as_ref().unwrap().seed, Some(seed("test:node:m")));
    }

    #[test]
    fn unseeded_nodes_get_distinct_ids() {
        let mut b = SemanticGraphBuilder::create(OntologyId::random(), None);
        let t = testing::node_type_id("module");
        let x = b.add_node(&t, &name("x"), None);
        let y = b.add_node(&t, &name("y"), None);
        assert_ne!(x, y);
        assert_eq!(b.graph().node_count(), 2);
    }

    #[test]
    fn builder_with_ontology_rejects_invalid_edge() {
        let o = testing::code_structure_ontology();
        let mut b = SemanticGraphBuilder::create(o.ontology_id.clone(), None).with_ontology(&o);
        let class = b.add_node(&testing::node_type_id("class"), &name("MyClass"), None);
        let method = b.add_node(&testing::node_type_id("method"), &name("my_method"), None);
        let contains = testing::predicate_id("contains");

        assert!(b.add_edge(&method, &contains, &class, None).is_none());
        assert_eq!(b.graph().edge_count(), 0);

        let err = b.try_add_edge(&method, &contains, &class, None).unwrap_err();
        assert_eq!(err.to_string(), "invalid edge method --contains--> class");

        assert!(b.add_edge(&class, &contains, &method, None).is_some());
        assert_eq!(b.graph().edge_count(), 1);
    }

    #[test]
    fn builder_with_ontology_rejects_missing_endpoints() {
        let o = testing::code_structure_ontology();
        let mut b = SemanticGraphBuilder::create(o.ontology_id.clone(), None).with_ontology(&o);
        let class = b.add_node(&testing::node_type_id("class"), &name("C"), None);
        let ghost = NodeId::from_seed("ghost");
        let contains = testing::predicate_id("contains");
        assert_eq!(
            b.try_add_edge(&ghost, &contains, &class, None),
            Err(EdgeRejection::UnknownFromNode { node_id: ghost.clone() })
        );
        assert_eq!(
            b.try_add_edge(&class, &contains, &ghost, None),
            Err(EdgeRejection::UnknownToNode { node_id: ghost })
        );
    }

    #[test]
    fn builder_without_ontology_accepts_anything_and_validator_catches_it() {
        let o = testing::code_structure_ontology();
        let mut b = SemanticGraphBuilder::create(o.ontology_id.clone(), None);
        let class = b.add_node(&testing::node_type_id("class"), &name("MyClass"), None);
        let method = b.add_node(&testing::node_type_id("method"), &name("my_method"), None);
        assert!(b
            .add_edge(&method, &testing::predicate_id("contains"), &class, None)
            .is_some());
        let g = b.build();
        let result = Validator::new(&o).validate(&g);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("invalid edge method --contains--> class"));
    }

    #[test]
    fn refs_resolve_through_registry() {
        let mut registry = OntologyRegistry::new();
        let o = testing::code_structure_ontology();
        let ontology_id = o.ontology_id.clone();
        registry.register(o);

        let mut b = SemanticGraphBuilder::create(ontology_id, None).with_registry(&registry);
        let module = b
            .add_node_by_ref(&NodeTypeRef::new("module").unwrap(), &name("m"), None)
            .unwrap();
        let class = b
            .add_node_by_ref(&NodeTypeRef::new("class").unwrap(), &name("C"), None)
            .unwrap();
        assert!(b
            .add_node_by_ref(&NodeTypeRef::new("widget").unwrap(), &name("w"), None)
            .is_none());
        let contains = PredicateRef::new("contains").unwrap();
        assert!(b.add_edge_by_ref(&module, &contains, &class, None).is_some());
        assert_eq!(
            b.try_add_edge_by_ref(&module, &PredicateRef::new("owns").unwrap(), &class, None),
            Err(EdgeRejection::UnresolvedRef {
                kind: "predicate",
                value: "owns".into()
            })
        );
        assert_eq!(b.graph().node_count(), 2);
        assert_eq!(b.graph().edge_count(), 1);
    }

    #[test]
    fn graph_ids_and_properties() {
        let o = testing::code_structure_ontology();
        let mut b = SemanticGraphBuilder::create(o.ontology_id.clone(), Some(RuleSetId::from_seed("r")))
            .with_deterministic_graph_id(&seed("test:graph:x"));
        let m = b.add_node(&testing::node_type_id("module"), &name("m"), None);
        let c = b.add_node(&testing::node_type_id("class"), &name("c"), None);
        let e = b.add_edge(&m, &testing::predicate_id("contains"), &c, Some(&seed("test:edge:m_c"))).unwrap();
        let line = testing::property_name_id("line_number");
        assert!(b.set_node_property(&m, line.clone(), SafeStrText::new("1").unwrap()));
        assert!(b.set_edge_property(&e, line.clone(), SafeStrText::new("2").unwrap()));
        assert!(!b.set_edge_property(&EdgeId::from_seed("nope"), line.clone(), SafeStrText::new("3").unwrap()));
        assert_eq!(b.find_node_by_name(&name("c")), Some(c));
        assert_eq!(b.find_nodes_by_type(&testing::node_type_id("module")), vec![m]);

        let g = b.build();
        assert_eq!(g.graph_id, GraphId::from_seed("test:graph:x"));
        assert_eq!(g.rule_set_id, Some(RuleSetId::from_seed("r")));
        assert_eq!(g.edges.get(0).unwrap().edge_id, EdgeId::from_seed("test:edge:m_c"));

        let fixed = SemanticGraphBuilder::create(o.ontology_id.clone(), None)
            .with_graph_id(GraphId::new("0000beef").unwrap())
            .build();
        assert_eq!(fixed.graph_id.as_str(), "0000beef");
    }
}
