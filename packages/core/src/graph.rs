use std::collections::{HashSet, VecDeque};

use crate::ontology;
use crate::primitives::{EdgeId, NodeId, NodeTypeId, PredicateId, PredicateRef, PropertyNameId, SafeStrId, SafeStrText};
use crate::types::{Ontology, SemanticGraph, SemanticGraphEdge, SemanticGraphNode};

/// A read-only query surface over a [`SemanticGraph`].
///
/// The view borrows a graph value and answers
/// lookups over it. Attach an ontology with [`GraphView::with_ontology`] to
/// let predicate refs stand in for predicate ids.
///
/// Node results follow the graph's insertion order and edge results follow
/// its list order.
#[derive(Debug, Clone, Copy)]
pub struct GraphView<'g> {
    graph: &'g SemanticGraph,
    ontology: Option<&'g Ontology>,
}

/// Which edges a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From an edge's source to its target.
    Outgoing,
    /// From an edge's target back to its source.
    Incoming,
    /// Either way.
    Both,
}

/// A predicate named by id or by ref.
#[derive(Debug, Clone, Copy)]
pub enum PredicateKey<'k> {
    Id(&'k PredicateId),
    Ref(&'k PredicateRef),
}

impl<'k> From<&'k PredicateId> for PredicateKey<'k> {
    fn from(id: &'k PredicateId) -> Self {
        PredicateKey::Id(id)
    }
}

impl<'k> From<&'k PredicateRef> for PredicateKey<'k> {
    fn from(r: &'k PredicateRef) -> Self {
        PredicateKey::Ref(r)
    }
}

impl<'g> GraphView<'g> {
    pub fn new(graph: &'g SemanticGraph) -> Self {
        Self { graph, ontology: None }
    }

    pub fn with_ontology(mut self, ontology: &'g Ontology) -> Self {
        self.ontology = Some(ontology);
        self
    }

    pub fn graph(&self) -> &'g SemanticGraph {
        self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edges.len()
    }

    // --- nodes ---------------------------------------------------------------

    pub fn get_node(&self, id: &NodeId) -> Option<&'g SemanticGraphNode> {
        self.graph.nodes.get(id)
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.graph.nodes.contains_key(id)
    }

    pub fn all_node_ids(&self) -> Vec<NodeId> {
        self.graph.nodes.keys().cloned().collect()
    }

    pub fn nodes_by_type(&self, node_type: &NodeTypeId) -> Vec<&'g SemanticGraphNode> {
        self.graph
            .nodes
            .values()
            .filter(|n| &n.node_type_id == node_type)
            .collect()
    }

    /// The first node, in insertion order, with the given name.
    pub fn find_node_by_name(&self, name: &SafeStrId) -> Option<&'g SemanticGraphNode> {
        self.graph.nodes.values().find(|n| &n.name == name)
    }

    pub fn get_node_property(&self, id: &NodeId, property: &PropertyNameId) -> Option<&'g SafeStrText> {
        self.get_node(id)?.property(property)
    }

    pub fn has_node_property(&self, id: &NodeId, property: &PropertyNameId) -> bool {
        self.get_node_property(id, property).is_some()
    }

    pub fn nodes_with_property(&self, property: &PropertyNameId) -> Vec<&'g SemanticGraphNode> {
        self.graph
            .nodes
            .values()
            .filter(|n| n.property(property).is_some())
            .collect()
    }

    // --- edges ---------------------------------------------------------------

    pub fn get_edge(&self, id: &EdgeId) -> Option<&'g SemanticGraphEdge> {
        self.graph.edges.iter().find(|e| &e.edge_id == id)
    }

    /// Edges leaving `id`.
    pub fn edges_from(&self, id: &NodeId) -> Vec<&'g SemanticGraphEdge> {
        self.graph.edges.iter().filter(|e| &e.from_node_id == id).collect()
    }

    /// Edges arriving at `id`.
    pub fn edges_to(&self, id: &NodeId) -> Vec<&'g SemanticGraphEdge> {
        self.graph.edges.iter().filter(|e| &e.to_node_id == id).collect()
    }

    pub fn edges_with_predicate(&self, predicate: &PredicateId) -> Vec<&'g SemanticGraphEdge> {
        self.graph
            .edges
            .iter()
            .filter(|e| &e.predicate_id == predicate)
            .collect()
    }

    /// Edges labelled with a predicate given by id or by ref.
    ///
    /// A ref only matches when the view has an ontology that defines it.
    pub fn edges_by_verb<'k>(&self, key: impl Into<PredicateKey<'k>>) -> Vec<&'g SemanticGraphEdge> {
        match self.resolve_predicate(key.into()) {
            Some(id) => self.edges_with_predicate(&id),
            None => vec![],
        }
    }

    pub fn has_edge(&self, from: &NodeId, predicate: &PredicateId, to: &NodeId) -> bool {
        self.find_edge(from, predicate, to).is_some()
    }

    /// The first edge matching the triple.
    pub fn find_edge(&self, from: &NodeId, predicate: &PredicateId, to: &NodeId) -> Option<&'g SemanticGraphEdge> {
        self.graph
            .edges
            .iter()
            .find(|e| &e.from_node_id == from && &e.predicate_id == predicate && &e.to_node_id == to)
    }

    pub fn get_edge_property(&self, id: &EdgeId, property: &PropertyNameId) -> Option<&'g SafeStrText> {
        self.get_edge(id)?.property(property)
    }

    pub fn has_edge_property(&self, id: &EdgeId, property: &PropertyNameId) -> bool {
        self.get_edge_property(id, property).is_some()
    }

    pub fn edges_with_property(&self, property: &PropertyNameId) -> Vec<&'g SemanticGraphEdge> {
        self.graph
            .edges
            .iter()
            .filter(|e| e.property(property).is_some())
            .collect()
    }

    // --- neighbours ----------------------------------------------------------

    /// Targets of edges leaving `id`, optionally restricted to one predicate.
    /// Each neighbour appears once, in edge order.
    pub fn neighbors(&self, id: &NodeId, predicate: Option<&PredicateId>) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.graph
            .edges
            .iter()
            .filter(|e| &e.from_node_id == id && predicate.map_or(true, |p| &e.predicate_id == p))
            .filter(|e| seen.insert(&e.to_node_id))
            .map(|e| e.to_node_id.clone())
            .collect()
    }

    /// Sources of edges arriving at `id`, optionally restricted to one
    /// predicate.
    pub fn reverse_neighbors(&self, id: &NodeId, predicate: Option<&PredicateId>) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.graph
            .edges
            .iter()
            .filter(|e| &e.to_node_id == id && predicate.map_or(true, |p| &e.predicate_id == p))
            .filter(|e| seen.insert(&e.from_node_id))
            .map(|e| e.from_node_id.clone())
            .collect()
    }

    // --- traversal -----------------------------------------------------------

    /// Every node reachable from `start` in `direction`, breadth-first,
    /// excluding `start`. Edges to ids that are not in the graph are not
    /// followed.
    pub fn reachable(&self, start: &NodeId, direction: Direction) -> Vec<NodeId> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut result: Vec<NodeId> = Vec::new();

        visited.insert(start.clone());
        queue.push_back(start.clone());

        while let Some(current) = queue.pop_front() {
            for neighbour in self.step(&current, direction) {
                if self.has_node(&neighbour) && visited.insert(neighbour.clone()) {
                    queue.push_back(neighbour.clone());
                    result.push(neighbour);
                }
            }
        }

        result
    }

    /// The part of the graph connected to `id`: everything it reaches, everything
    /// that reaches it, and the node itself, with the edges among them.
    ///
    /// Node and edge order follow the source graph.
    pub fn subgraph(&self, id: &NodeId) -> SemanticGraph {
        let mut keep: HashSet<NodeId> = HashSet::new();
        if self.has_node(id) {
            keep.insert(id.clone());
            keep.extend(self.reachable(id, Direction::Outgoing));
            keep.extend(self.reachable(id, Direction::Incoming));
        }

        let mut sub = SemanticGraph::new(self.graph.graph_id.clone(), self.graph.ontology_id.clone());
        sub.graph_id_source = self.graph.graph_id_source.clone();
        sub.version = self.graph.version.clone();
        sub.rule_set_id = self.graph.rule_set_id.clone();
        for (node_id, node) in self.graph.nodes.iter() {
            if keep.contains(node_id) {
                sub.nodes.insert(node_id.clone(), node.clone());
            }
        }
        sub.edges.extend(
            self.graph
                .edges
                .iter()
                .filter(|e| keep.contains(&e.from_node_id) && keep.contains(&e.to_node_id))
                .cloned(),
        );
        sub
    }

    fn step(&self, id: &NodeId, direction: Direction) -> Vec<NodeId> {
        match direction {
            Direction::Outgoing => self.neighbors(id, None),
            Direction::Incoming => self.reverse_neighbors(id, None),
            Direction::Both => {
                let mut out = self.neighbors(id, None);
                for n in self.reverse_neighbors(id, None) {
                    if !out.contains(&n) {
                        out.push(n);
                    }
                }
                out
            }
        }
    }

    fn resolve_predicate(&self, key: PredicateKey<'_>) -> Option<PredicateId> {
        match key {
            PredicateKey::Id(id) => Some(id.clone()),
            PredicateKey::Ref(r) => {
                let o = self.ontology?;
                ontology::get_predicate_by_ref(o, r).map(|p| p.predicate_id.clone())
            }
        }
    }
}

// --- tests -------------------------------------------------------------------
