use serde::{Deserialize, Serialize};

use crate::collections::{TypedList, TypedMap};
use crate::primitives::{
    CategoryId, IdSource, NodeTypeId, NodeTypeRef, OntologyId, OntologyRef, PredicateId,
    PredicateRef, PropertyNameId, PropertyNameRef, PropertyTypeId, PropertyTypeRef, SafeStrText,
    SafeStrVersion, TaxonomyId,
};

/// A kind of node, classified by a taxonomy category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OntologyNodeType {
    pub node_type_id: NodeTypeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type_id_source: Option<IdSource>,

    pub node_type_ref: NodeTypeRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<SafeStrText>,

    pub category_id: CategoryId,
}

impl OntologyNodeType {
    pub fn new(node_type_id: NodeTypeId, node_type_ref: NodeTypeRef, category_id: CategoryId) -> Self {
        Self {
            node_type_id,
            node_type_id_source: None,
            node_type_ref,
            description: None,
            category_id,
        }
    }
}

/// A relationship verb that may label edges.
///
/// `inverse_id` names the predicate read in the opposite direction
/// (`contains` ↔ `in`). A symmetric predicate points at itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OntologyPredicate {
    pub predicate_id: PredicateId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate_id_source: Option<IdSource>,

    pub predicate_ref: PredicateRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<SafeStrText>,

    #[serde(default)]
    pub inverse_id: Option<PredicateId>,
}

impl OntologyPredicate {
    pub fn new(predicate_id: PredicateId, predicate_ref: PredicateRef) -> Self {
        Self {
            predicate_id,
            predicate_id_source: None,
            predicate_ref,
            description: None,
            inverse_id: None,
        }
    }

    pub fn with_inverse(mut self, inverse_id: PredicateId) -> Self {
        self.inverse_id = Some(inverse_id);
        self
    }

    pub fn is_symmetric(&self) -> bool {
        self.inverse_id.as_ref() == Some(&self.predicate_id)
    }
}

/// The value type of a property (e.g. `string`, `integer`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OntologyPropertyType {
    pub property_type_id: PropertyTypeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type_id_source: Option<IdSource>,

    pub property_type_ref: PropertyTypeRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<SafeStrText>,
}

impl OntologyPropertyType {
    pub fn new(property_type_id: PropertyTypeId, property_type_ref: PropertyTypeRef) -> Self {
        Self {
            property_type_id,
            property_type_id_source: None,
            property_type_ref,
            description: None,
        }
    }
}

/// A named property that nodes and edges may carry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OntologyPropertyName {
    pub property_name_id: PropertyNameId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name_id_source: Option<IdSource>,

    pub property_name_ref: PropertyNameRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<SafeStrText>,

    pub property_type_id: PropertyTypeId,
}

impl OntologyPropertyName {
    pub fn new(
        property_name_id: PropertyNameId,
        property_name_ref: PropertyNameRef,
        property_type_id: PropertyTypeId,
    ) -> Self {
        Self {
            property_name_id,
            property_name_id_source: None,
            property_name_ref,
            description: None,
            property_type_id,
        }
    }
}

/// A permitted `(source type, predicate, target type)` triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EdgeRule {
    pub source_type_id: NodeTypeId,
    pub predicate_id: PredicateId,
    pub target_type_id: NodeTypeId,
}

impl EdgeRule {
    pub fn new(source_type_id: NodeTypeId, predicate_id: PredicateId, target_type_id: NodeTypeId) -> Self {
        Self {
            source_type_id,
            predicate_id,
            target_type_id,
        }
    }
}

/// The schema for a problem domain: which node types, predicates and
/// properties exist, and which edges between them are allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ontology {
    pub ontology_id: OntologyId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ontology_id_source: Option<IdSource>,

    pub ontology_ref: OntologyRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<SafeStrVersion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<SafeStrText>,

    pub taxonomy_id: TaxonomyId,

    #[serde(default)]
    pub node_types: TypedMap<NodeTypeId, OntologyNodeType>,

    #[serde(default)]
    pub predicates: TypedMap<PredicateId, OntologyPredicate>,

    #[serde(default)]
    pub property_types: TypedMap<PropertyTypeId, OntologyPropertyType>,

    #[serde(default)]
    pub property_names: TypedMap<PropertyNameId, OntologyPropertyName>,

    #[serde(default)]
    pub edge_rules: TypedList<EdgeRule>,
}

impl Ontology {
    pub fn new(ontology_id: OntologyId, ontology_ref: OntologyRef, taxonomy_id: TaxonomyId) -> Self {
        Self {
            ontology_id,
            ontology_id_source: None,
            ontology_ref,
            version: None,
            description: None,
            taxonomy_id,
            node_types: TypedMap::new(),
            predicates: TypedMap::new(),
            property_types: TypedMap::new(),
            property_names: TypedMap::new(),
            edge_rules: TypedList::new(),
        }
    }
}
