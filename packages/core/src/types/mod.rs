//! Schema entities: the data model every other module works over.
//!
//! | Module | Entities |
//! |--------|----------|
//! | [`taxonomy`](self::taxonomy) | [`Taxonomy`], [`TaxonomyCategory`] |
//! | [`ontology`](self::ontology) | [`Ontology`], [`OntologyNodeType`], [`OntologyPredicate`], [`OntologyPropertyType`], [`OntologyPropertyName`], [`EdgeRule`] |
//! | [`rule`](self::rule) | [`RuleSet`], [`RuleCardinality`], [`RuleTransitivity`], [`RuleRequiredNodeProperty`], [`RuleRequiredEdgeProperty`] |
//! | [`graph`](self::graph) | [`SemanticGraph`], [`SemanticGraphNode`], [`SemanticGraphEdge`] |
//! | [`projected`](self::projected) | [`ProjectedSemanticGraph`] and its four sections |
//!
//! All entities are plain data. Their JSON keys are exactly their field names;
//! nullable fields accept both `null` and absence on input. Behaviour lives in
//! the utility modules ([`crate::taxonomy`], [`crate::ontology`],
//! [`crate::rules`], [`crate::graph`]).

pub mod graph;
pub mod ontology;
pub mod projected;
pub mod rule;
pub mod taxonomy;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use graph::{Properties, SemanticGraph, SemanticGraphEdge, SemanticGraphNode};
pub use ontology::{
    EdgeRule, Ontology, OntologyNodeType, OntologyPredicate, OntologyPropertyName,
    OntologyPropertyType,
};
pub use projected::{
    ProjectedData, ProjectedEdge, ProjectedNode, ProjectedReferences, ProjectedSemanticGraph,
    ProjectedSources, ProjectedTaxonomy,
};
pub use rule::{
    RuleCardinality, RuleRequiredEdgeProperty, RuleRequiredNodeProperty, RuleSet,
    RuleTransitivity,
};
pub use taxonomy::{Taxonomy, TaxonomyCategory};

/// Explicit JSON conversions shared by every schema entity.
///
/// Parsing raw JSON into an entity is always a deliberate call to
/// [`try_from_json`](SchemaEntity::try_from_json); nothing coerces silently.
pub trait SchemaEntity: Serialize + DeserializeOwned {
    fn try_from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// RFC 8785 canonical JSON. Byte-identical for equal entities.
    fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_jcs::to_string(self)
    }
}

/// The outcome of [`Validator::validate`](crate::validation::Validator::validate).
///
/// `valid` is true exactly when `errors` is empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

impl SchemaEntity for TaxonomyCategory {}
impl SchemaEntity for Taxonomy {}
impl SchemaEntity for OntologyNodeType {}
impl SchemaEntity for OntologyPredicate {}
impl SchemaEntity for OntologyPropertyType {}
impl SchemaEntity for OntologyPropertyName {}
impl SchemaEntity for EdgeRule {}
impl SchemaEntity for Ontology {}
impl SchemaEntity for RuleCardinality {}
impl SchemaEntity for RuleTransitivity {}
impl SchemaEntity for RuleRequiredNodeProperty {}
impl SchemaEntity for RuleRequiredEdgeProperty {}
impl SchemaEntity for RuleSet {}
impl SchemaEntity for SemanticGraphNode {}
impl SchemaEntity for SemanticGraphEdge {}
impl SchemaEntity for SemanticGraph {}
impl SchemaEntity for ProjectedSemanticGraph {}
impl SchemaEntity for ValidationResult {}
