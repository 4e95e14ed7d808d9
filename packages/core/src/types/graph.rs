use serde::{Deserialize, Serialize};

use crate::collections::{TypedList, TypedMap};
use crate::primitives::{
    EdgeId, GraphId, IdSource, NodeId, NodeTypeId, OntologyId, PredicateId, PropertyNameId,
    RuleSetId, SafeStrId, SafeStrText, SafeStrVersion,
};

/// Property values on a node or edge, keyed by property-name id.
pub type Properties = TypedMap<PropertyNameId, SafeStrText>;

/// An instance node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SemanticGraphNode {
    pub node_id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id_source: Option<IdSource>,

    pub node_type_id: NodeTypeId,

    pub name: SafeStrId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl SemanticGraphNode {
    pub fn new(node_id: NodeId, node_type_id: NodeTypeId, name: SafeStrId) -> Self {
        Self {
            node_id,
            node_id_source: None,
            node_type_id,
            name,
            properties: None,
        }
    }

    pub fn property(&self, name: &PropertyNameId) -> Option<&SafeStrText> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }

    /// Set a property, creating the property map on first use.
    pub fn set_property(&mut self, name: PropertyNameId, value: SafeStrText) {
        self.properties.get_or_insert_with(Properties::new).insert(name, value);
    }
}

/// A directed, predicate-labelled edge between two nodes of the same graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SemanticGraphEdge {
    pub edge_id: EdgeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_id_source: Option<IdSource>,

    pub from_node_id: NodeId,

    pub predicate_id: PredicateId,

    pub to_node_id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl SemanticGraphEdge {
    pub fn new(edge_id: EdgeId, from_node_id: NodeId, predicate_id: PredicateId, to_node_id: NodeId) -> Self {
        Self {
            edge_id,
            edge_id_source: None,
            from_node_id,
            predicate_id,
            to_node_id,
            properties: None,
        }
    }

    pub fn property(&self, name: &PropertyNameId) -> Option<&SafeStrText> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }

    pub fn set_property(&mut self, name: PropertyNameId, value: SafeStrText) {
        self.properties.get_or_insert_with(Properties::new).insert(name, value);
    }
}

/// An instance graph typed by an ontology.
///
/// Nodes are kept in insertion order and edges in list order; both orders
/// carry through to projections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SemanticGraph {
    pub graph_id: GraphId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_id_source: Option<IdSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<SafeStrVersion>,

    pub ontology_id: OntologyId,

    #[serde(default)]
    pub rule_set_id: Option<RuleSetId>,

    #[serde(default)]
    pub nodes: TypedMap<NodeId, SemanticGraphNode>,

    #[serde(default)]
    pub edges: TypedList<SemanticGraphEdge>,
}

impl SemanticGraph {
    pub fn new(graph_id: GraphId, ontology_id: OntologyId) -> Self {
        Self {
            graph_id,
            graph_id_source: None,
            version: None,
            ontology_id,
            rule_set_id: None,
            nodes: TypedMap::new(),
            edges: TypedList::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaEntity;
    use serde_json::json;

    fn sample() -> SemanticGraph {
        let mut g = SemanticGraph::new(GraphId::from_seed("g"), OntologyId::from_seed("test:ontology"));
        let a = NodeId::from_seed("test:node:a");
        let b = NodeId::from_seed("test:node:b");
        let module = NodeTypeId::from_seed("test:node_type:module");
        let class = NodeTypeId::from_seed("test:node_type:class");
        g.nodes.insert(a.clone(), SemanticGraphNode::new(a.clone(), module, SafeStrId::new("my_module").unwrap()));
        g.nodes.insert(b.clone(), SemanticGraphNode::new(b.clone(), class, SafeStrId::new("MyClass").unwrap()));
        g.edges.push(SemanticGraphEdge::new(
            EdgeId::from_seed("test:edge:a_b"),
            a,
            PredicateId::from_seed("test:predicate:contains"),
            b,
        ));
        g
    }

    #[test]
    fn graph_roundtrip_preserves_order() {
        let g = sample();
        let json = g.to_json().unwrap();
        let back = SemanticGraph::try_from_json(json.clone()).unwrap();
        assert_eq!(back, g);
        assert_eq!(back.to_json().unwrap(), json);
        let names: Vec<_> = back.nodes.values().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["my_module", "MyClass"]);
    }

    #[test]
    fn properties_omitted_when_absent() {
        let g = sample();
        let json = g.to_json().unwrap();
        let first = json["nodes"].as_object().unwrap().values().next().unwrap();
        assert!(first.get("properties").is_none());
        assert!(json["rule_set_id"].is_null());
    }

    #[test]
    fn set_property_creates_map() {
        let mut g = sample();
        let prop = PropertyNameId::from_seed("test:property:line");
        let id = NodeId::from_seed("test:node:a");
        let node = g.nodes.get_mut(&id).unwrap();
        node.set_property(prop.clone(), SafeStrText::new("42").unwrap());
        assert_eq!(node.property(&prop).unwrap().as_str(), "42");
    }

    #[test]
    fn edge_with_unknown_key_shape_fails() {
        let raw = json!({
            "edge_id": "a1234567",
            "from_node_id": "b1234567",
            "predicate_id": 7,
            "to_node_id": "c1234567"
        });
        assert!(SemanticGraphEdge::try_from_json(raw).is_err());
    }
}
