use serde::{Deserialize, Serialize};

use crate::collections::{TypedList, TypedMap};
use crate::primitives::{
    CategoryId, CategoryRef, GraphId, IdSeed, NodeTypeId, NodeTypeRef, PredicateId,
    PredicateRef, PropertyNameId, PropertyNameRef, PropertyTypeId, PropertyTypeRef, SafeStrId,
    SafeStrText,
};

/// Property values keyed by property-name ref.
pub type ProjectedProperties = TypedMap<PropertyNameRef, SafeStrText>;

/// A node as a human reads it: its type ref and its name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectedNode {
    #[serde(rename = "ref")]
    pub node_type_ref: NodeTypeRef,

    pub name: SafeStrId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ProjectedProperties>,
}

/// An edge addressed by endpoint names and predicate ref.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectedEdge {
    pub from_name: SafeStrId,

    pub to_name: SafeStrId,

    #[serde(rename = "ref")]
    pub predicate_ref: PredicateRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ProjectedProperties>,
}

/// The id-free content section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProjectedData {
    pub nodes: TypedList<ProjectedNode>,
    pub edges: TypedList<ProjectedEdge>,
}

/// Ref → id cross-index, restricted to the refs the content uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProjectedReferences {
    pub node_types: TypedMap<NodeTypeRef, NodeTypeId>,
    pub predicates: TypedMap<PredicateRef, PredicateId>,
    pub categories: TypedMap<CategoryRef, CategoryId>,
    pub property_names: TypedMap<PropertyNameRef, PropertyNameId>,
    pub property_types: TypedMap<PropertyTypeRef, PropertyTypeId>,
}

/// Category membership of the projected node types and the ancestor chain
/// of each such category. The root maps to `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProjectedTaxonomy {
    pub node_type_categories: TypedMap<NodeTypeRef, CategoryRef>,
    pub category_parents: TypedMap<CategoryRef, Option<CategoryRef>>,
}

/// Provenance of a projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectedSources {
    pub source_graph_id: GraphId,

    #[serde(default)]
    pub ontology_seed: Option<IdSeed>,

    /// Unix epoch milliseconds.
    pub generated_at: i64,
}

/// A generated, read-only view of a [`SemanticGraph`](super::SemanticGraph).
///
/// Exactly four sections. Ids appear only in `references` and `sources`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectedSemanticGraph {
    pub projection: ProjectedData,
    pub references: ProjectedReferences,
    pub taxonomy: ProjectedTaxonomy,
    pub sources: ProjectedSources,
}
