//! Typed semantic graphs over ontologies, taxonomies and rule sets.
//!
//! A graph's nodes and edges are typed by an [`Ontology`], whose node types
//! are classified by a [`Taxonomy`] and whose edges are further constrained
//! by an optional [`RuleSet`]. This crate provides the data model, the
//! builder and validator that enforce the schema, the registries that hold
//! schemas by id and ref, and the projector that turns a graph into an
//! id-free view for people and downstream tools. It backs the `sgraph` CLI.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`primitives`] | Typed ids, refs and constrained strings |
//! | [`collections`] | [`TypedMap`] (insertion-ordered) and [`TypedList`] |
//! | [`types`] | Schema entities, graphs, projections, [`ValidationResult`] |
//! | [`taxonomy`] | Category lookups and hierarchy walks |
//! | [`ontology`] | Node type, predicate and edge-rule lookups |
//! | [`rules`] | Cardinality, transitivity and required-property lookups |
//! | [`graph`] | [`GraphView`] queries and traversal |
//! | [`builder`] | [`SemanticGraphBuilder`] |
//! | [`validation`] | [`Validator`] |
//! | [`registry`] | [`OntologyRegistry`], [`TaxonomyRegistry`], [`RuleEngine`] |
//! | [`projector`] | [`SemanticGraphProjector`] |
//! | [`render`] | Plain-text rendering of projections |
//! | [`testing`] | Fixture schemas and graphs |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use semantic_graphs::{
//!     testing, FixedClock, OntologyRegistry, SemanticGraphBuilder, SemanticGraphProjector,
//!     Validator,
//! };
//!
//! let ontology = testing::code_structure_ontology();
//!
//! // Build a graph; edges the ontology does not allow are refused.
//! let mut builder = SemanticGraphBuilder::create(ontology.ontology_id.clone(), None)
//!     .with_ontology(&ontology);
//! let module = builder.add_node(&testing::node_type_id("module"), &"my_module".parse()?, None);
//! let class = builder.add_node(&testing::node_type_id("class"), &"MyClass".parse()?, None);
//! builder.add_edge(&module, &testing::predicate_id("contains"), &class, None);
//! let graph = builder.build();
//!
//! // Validate it.
//! assert!(Validator::new(&ontology).validate(&graph).valid);
//!
//! // Project it.
//! let mut ontologies = OntologyRegistry::new();
//! ontologies.register(ontology);
//! let projected = SemanticGraphProjector::new(&ontologies)
//!     .with_clock(FixedClock(0))
//!     .project(&graph);
//! println!("{}", serde_json::to_string_pretty(&projected)?);
//! ```

pub mod builder;
pub mod collections;
pub mod graph;
pub mod ontology;
pub mod primitives;
pub mod projector;
pub mod registry;
pub mod render;
pub mod rules;
pub mod taxonomy;
pub mod testing;
pub mod types;
pub mod validation;

pub use builder::{EdgeRejection, SemanticGraphBuilder};
pub use collections::{ContainerError, TypedList, TypedMap};
pub use graph::{Direction, GraphView, PredicateKey};
pub use ontology::EdgeRuleIndex;
pub use primitives::{
    CategoryId, CategoryRef, EdgeId, GraphId, IdSeed, IdSource, IdSourceType, KindedId, NodeId,
    NodeTypeId, NodeTypeRef, ObjId, OntologyId, OntologyRef, PredicateId, PredicateRef,
    Primitive, PrimitiveError, PropertyNameId, PropertyNameRef, PropertyTypeId, PropertyTypeRef,
    RuleSetId, RuleSetRef, SafeStrId, SafeStrText, SafeStrVersion, SafeUInt, TaxonomyId,
    TaxonomyRef,
};
pub use projector::{Clock, FixedClock, SemanticGraphProjector, SystemClock};
pub use registry::{OntologyRegistry, Registered, Registry, RegistryError, RuleEngine, TaxonomyRegistry};
pub use render::render_projection;
pub use taxonomy::TaxonomyError;
pub use types::{
    Ontology, ProjectedSemanticGraph, RuleSet, SchemaEntity, SemanticGraph, SemanticGraphEdge,
    SemanticGraphNode, Taxonomy, TaxonomyCategory, ValidationResult,
};
pub use validation::Validator;
