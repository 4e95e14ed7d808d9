//! Projection of a [`SemanticGraph`] into its id-free, human-facing form.
//!
//! A [`ProjectedSemanticGraph`] has four sections:
//!
//! | Section | Contents | Ids? |
//! |---------|----------|------|
//! | `projection` | nodes as `{ref, name}`, edges as `{from_name, to_name, ref}` | no |
//! | `references` | ref → id for every ref the projection uses, and nothing else | yes |
//! | `taxonomy` | category of each used node type, parent of each such category up to the root | no |
//! | `sources` | source graph id, ontology seed, generation time | yes |
//!
//! Projection is total. A graph whose ontology is not registered still
//! projects: its refs come out empty and the `references` and `taxonomy`
//! sections are empty. Given the same inputs and a [`FixedClock`], two
//! projections are byte-identical.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::ontology;
use crate::primitives::{
    CategoryId, CategoryRef, NodeId, NodeTypeId, NodeTypeRef, PredicateId, PredicateRef,
    PropertyNameId, SafeStrId,
};
use crate::registry::{OntologyRegistry, TaxonomyRegistry};
use crate::taxonomy;
use crate::types::{
    Ontology, ProjectedData, ProjectedEdge, ProjectedNode, ProjectedReferences,
    ProjectedSemanticGraph, ProjectedSources, ProjectedTaxonomy, Properties, SemanticGraph,
    Taxonomy,
};
use crate::types::projected::ProjectedProperties;

// --- clock -------------------------------------------------------------------

/// Source of the `generated_at` timestamp.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Always the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

// --- projector ---------------------------------------------------------------

/// Projects graphs against the schemas held in registries.
pub struct SemanticGraphProjector<'a> {
    ontologies: &'a OntologyRegistry,
    taxonomies: Option<&'a TaxonomyRegistry>,
    clock: Box<dyn Clock + 'a>,
}

impl<'a> SemanticGraphProjector<'a> {
    pub fn new(ontologies: &'a OntologyRegistry) -> Self {
        Self {
            ontologies,
            taxonomies: None,
            clock: Box::new(SystemClock),
        }
    }

    /// Without taxonomies the `taxonomy` section is always empty.
    pub fn with_taxonomies(mut self, taxonomies: &'a TaxonomyRegistry) -> Self {
        self.taxonomies = Some(taxonomies);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'a) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn project(&self, graph: &SemanticGraph) -> ProjectedSemanticGraph {
        let ontology = self.ontologies.get(&graph.ontology_id);
        if ontology.is_none() {
            warn!(
                graph = %graph.graph_id,
                ontology = %graph.ontology_id,
                "ontology not registered; projecting without refs"
            );
        }
        let taxonomy = ontology.and_then(|o| self.taxonomies?.get(&o.taxonomy_id));

        let mut used = UsedRefs::default();
        let projection = project_data(graph, ontology, &mut used);
        let (references, taxonomy_section) = match ontology {
            Some(o) => (
                build_references(o, taxonomy, &used),
                build_taxonomy(o, taxonomy, &used),
            ),
            None => (ProjectedReferences::default(), ProjectedTaxonomy::default()),
        };

        let sources = ProjectedSources {
            source_graph_id: graph.graph_id.clone(),
            ontology_seed: ontology
                .and_then(|o| o.ontology_id_source.as_ref())
                .and_then(|s| s.seed.clone()),
            generated_at: self.clock.now_millis(),
        };

        debug!(
            graph = %graph.graph_id,
            nodes = projection.nodes.len(),
            edges = projection.edges.len(),
            node_types = references.node_types.len(),
            predicates = references.predicates.len(),
            "projected graph"
        );

        ProjectedSemanticGraph {
            projection,
            references,
            taxonomy: taxonomy_section,
            sources,
        }
    }
}

/// Ids that made it into the projection, in order of first use.
#[derive(Default)]
struct UsedRefs {
    node_types: Vec<NodeTypeId>,
    predicates: Vec<PredicateId>,
    property_names: Vec<PropertyNameId>,
    seen_node_types: HashSet<NodeTypeId>,
    seen_predicates: HashSet<PredicateId>,
    seen_property_names: HashSet<PropertyNameId>,
}

impl UsedRefs {
    fn node_type(&mut self, id: &NodeTypeId) {
        if self.seen_node_types.insert(id.clone()) {
            self.node_types.push(id.clone());
        }
    }

    fn predicate(&mut self, id: &PredicateId) {
        if self.seen_predicates.insert(id.clone()) {
            self.predicates.push(id.clone());
        }
    }

    fn property_name(&mut self, id: &PropertyNameId) {
        if self.seen_property_names.insert(id.clone()) {
            self.property_names.push(id.clone());
        }
    }
}

// --- projection section ------------------------------------------------------

fn project_data(graph: &SemanticGraph, o: Option<&Ontology>, used: &mut UsedRefs) -> ProjectedData {
    let names: HashMap<&NodeId, &SafeStrId> = graph
        .nodes
        .values()
        .map(|n| (&n.node_id, &n.name))
        .collect();
    let name_of = |id: &NodeId| names.get(id).map(|n| (*n).clone()).unwrap_or_default();

    let mut data = ProjectedData::default();

    for node in graph.nodes.values() {
        let node_type = o.and_then(|o| ontology::get_node_type(o, &node.node_type_id));
        let node_type_ref = match node_type {
            Some(nt) => {
                used.node_type(&nt.node_type_id);
                nt.node_type_ref.clone()
            }
            None => NodeTypeRef::default(),
        };
        data.nodes.push(ProjectedNode {
            node_type_ref,
            name: node.name.clone(),
            properties: node
                .properties
                .as_ref()
                .map(|p| project_properties(p, o, used)),
        });
    }

    for edge in graph.edges.iter() {
        let predicate = o.and_then(|o| ontology::get_predicate(o, &edge.predicate_id));
        let predicate_ref = match predicate {
            Some(p) => {
                used.predicate(&p.predicate_id);
                p.predicate_ref.clone()
            }
            None => PredicateRef::default(),
        };
        data.edges.push(ProjectedEdge {
            from_name: name_of(&edge.from_node_id),
            to_name: name_of(&edge.to_node_id),
            predicate_ref,
            properties: edge
                .properties
                .as_ref()
                .map(|p| project_properties(p, o, used)),
        });
    }

    data
}

/// Re-key properties by ref. Names the ontology cannot resolve are dropped.
fn project_properties(properties: &Properties, o: Option<&Ontology>, used: &mut UsedRefs) -> ProjectedProperties {
    let mut out = ProjectedProperties::new();
    for (name_id, value) in properties.iter() {
        match o.and_then(|o| ontology::get_property_name(o, name_id)) {
            Some(pn) => {
                used.property_name(name_id);
                out.insert(pn.property_name_ref.clone(), value.clone());
            }
            None => warn!(property_name = %name_id, "dropping property with unresolved name"),
        }
    }
    out
}

// --- references section ------------------------------------------------------

fn build_references(o: &Ontology, t: Option<&Taxonomy>, used: &UsedRefs) -> ProjectedReferences {
    let mut refs = ProjectedReferences::default();

    for id in &used.node_types {
        if let Some(nt) = ontology::get_node_type(o, id) {
            refs.node_types.insert(nt.node_type_ref.clone(), id.clone());
        }
    }
    for id in &used.predicates {
        if let Some(p) = ontology::get_predicate(o, id) {
            refs.predicates.insert(p.predicate_ref.clone(), id.clone());
        }
    }
    for id in &used.property_names {
        let Some(pn) = ontology::get_property_name(o, id) else {
            continue;
        };
        refs.property_names.insert(pn.property_name_ref.clone(), id.clone());
        if let Some(pt) = ontology::get_property_type(o, &pn.property_type_id) {
            refs.property_types
                .insert(pt.property_type_ref.clone(), pn.property_type_id.clone());
        }
    }
    if let Some(t) = t {
        for (category_ref, category_id, _) in category_chain(o, t, used) {
            refs.categories.insert(category_ref, category_id);
        }
    }

    refs
}

// --- taxonomy section --------------------------------------------------------

fn build_taxonomy(o: &Ontology, t: Option<&Taxonomy>, used: &UsedRefs) -> ProjectedTaxonomy {
    let mut section = ProjectedTaxonomy::default();
    let Some(t) = t else {
        return section;
    };

    for id in &used.node_types {
        let Some(nt) = ontology::get_node_type(o, id) else {
            continue;
        };
        match taxonomy::get_category(t, &nt.category_id) {
            Some(c) => {
                section
                    .node_type_categories
                    .insert(nt.node_type_ref.clone(), c.category_ref.clone());
            }
            None => warn!(
                node_type = %nt.node_type_ref,
                category = %nt.category_id,
                "node type category not in taxonomy"
            ),
        }
    }
    for (category_ref, _, parent_ref) in category_chain(o, t, used) {
        section.category_parents.insert(category_ref, parent_ref);
    }

    section
}

/// Every category of a used node type plus its ancestors up to the root, as
/// `(ref, id, parent ref)`. Each category appears once. A parent that does
/// not resolve ends the chain.
fn category_chain(o: &Ontology, t: &Taxonomy, used: &UsedRefs) -> Vec<(CategoryRef, CategoryId, Option<CategoryRef>)> {
    let mut seen: HashSet<CategoryId> = HashSet::new();
    let mut chain = Vec::new();

    for id in &used.node_types {
        let Some(nt) = ontology::get_node_type(o, id) else {
            continue;
        };
        let mut current = Some(nt.category_id.clone());
        while let Some(category_id) = current.take() {
            if !seen.insert(category_id.clone()) {
                break;
            }
            let Some(category) = taxonomy::get_category(t, &category_id) else {
                break;
            };
            let parent = category
                .parent_id
                .as_ref()
                .and_then(|p| taxonomy::get_category(t, p));
            if category.parent_id.is_some() && parent.is_none() {
                warn!(category = %category.category_ref, "parent category not in taxonomy");
            }
            chain.push((
                category.category_ref.clone(),
                category_id,
                parent.map(|p| p.category_ref.clone()),
            ));
            current = parent.map(|p| p.category_id.clone());
        }
    }

    chain
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::TypedMap;
    use crate::primitives::{Primitive, PropertyNameRef};
    use crate::testing;
    use crate::types::SchemaEntity;

    fn registries() -> (OntologyRegistry, TaxonomyRegistry) {
        let mut ontologies = OntologyRegistry::new();
        ontologies.register(testing::code_structure_ontology());
        let mut taxonomies = TaxonomyRegistry::new();
        taxonomies.register(testing::code_elements_taxonomy());
        (ontologies, taxonomies)
    }

    fn keys<K: Primitive, V>(map: &TypedMap<K, V>) -> Vec<String> {
        map.keys().map(|k| k.to_string()).collect()
    }

    #[test]
    fn projection_section_has_no_ids() {
        let (ontologies, taxonomies) = registries();
        let p = SemanticGraphProjector::new(&ontologies)
            .with_taxonomies(&taxonomies)
            .with_clock(FixedClock(0))
            .project(&testing::code_graph_with_calls());
        let json = serde_json::to_string(&p.projection).unwrap();
        for key in ["node_id", "edge_id", "node_type_id", "predicate_id", "ontology_id", "graph_id"] {
            assert!(!json.contains(&format!("\"{key}\"")), "{key} leaked into {json}");
        }
        assert_eq!(p.projection.nodes.get(0).unwrap().node_type_ref.as_str(), "module");
        let call = p.projection.edges.get(3).unwrap();
        assert_eq!(call.from_name.as_str(), "run");
        assert_eq!(call.to_name.as_str(), "helper");
        assert_eq!(call.predicate_ref.as_str(), "calls");
        let line = PropertyNameRef::new("line_number").unwrap();
        assert_eq!(call.properties.as_ref().unwrap().get(&line).unwrap().as_str(), "14");
    }

    #[test]
    fn references_are_filtered_to_used_refs() {
        let (ontologies, taxonomies) = registries();
        let p = SemanticGraphProjector::new(&ontologies)
            .with_taxonomies(&taxonomies)
            .with_clock(FixedClock(0))
            .project(&testing::simple_class_graph());

        assert_eq!(keys(&p.references.node_types), vec!["module", "class", "method"]);
        assert_eq!(keys(&p.references.predicates), vec!["contains"]);
        assert!(p.references.property_names.is_empty());
        assert!(p.references.property_types.is_empty());
        assert_eq!(
            p.references.node_types.get(&NodeTypeRef::new("method").unwrap()),
            Some(&testing::node_type_id("method"))
        );

        assert_eq!(keys(&p.taxonomy.node_type_categories), vec!["module", "class", "method"]);
        let parents = &p.taxonomy.category_parents;
        let cat = |s: &str| CategoryRef::new(s).unwrap();
        assert_eq!(parents.len(), 4);
        assert_eq!(parents.get(&cat("container")), Some(&Some(cat("code_element"))));
        assert_eq!(parents.get(&cat("callable")), Some(&Some(cat("code_unit"))));
        assert_eq!(parents.get(&cat("code_unit")), Some(&Some(cat("code_element"))));
        assert_eq!(parents.get(&cat("code_element")), Some(&None));
        assert_eq!(keys(&p.references.categories).len(), 4);
    }

    #[test]
    fn property_refs_pull_in_their_types() {
        let (ontologies, taxonomies) = registries();
        let p = SemanticGraphProjector::new(&ontologies)
            .with_taxonomies(&taxonomies)
            .with_clock(FixedClock(0))
            .project(&testing::code_graph_with_calls());
        assert_eq!(keys(&p.references.property_names), vec!["line_number"]);
        assert_eq!(keys(&p.references.property_types), vec!["integer"]);
        assert_eq!(keys(&p.references.predicates), vec!["in", "calls"]);
    }

    #[test]
    fn fixed_clock_makes_projection_deterministic() {
        let (ontologies, taxonomies) = registries();
        let projector = SemanticGraphProjector::new(&ontologies)
            .with_taxonomies(&taxonomies)
            .with_clock(FixedClock(1_700_000_000_000));
        let g = testing::code_graph_with_calls();
        let a = projector.project(&g).canonical_json().unwrap();
        let b = projector.project(&g).canonical_json().unwrap();
        assert_eq!(a, b);
        let p = projector.project(&g);
        assert_eq!(p.sources.generated_at, 1_700_000_000_000);
        assert_eq!(p.sources.source_graph_id, g.graph_id);
        assert_eq!(
            p.sources.ontology_seed.as_ref().map(|s| s.as_str()),
            Some("test:ontology:code_structure")
        );
    }

    #[test]
    fn missing_ontology_degrades_gracefully() {
        let ontologies = OntologyRegistry::new();
        let g = testing::simple_class_graph();
        let p = SemanticGraphProjector::new(&ontologies)
            .with_clock(FixedClock(5))
            .project(&g);
        assert_eq!(p.projection.nodes.len(), 3);
        assert_eq!(p.projection.edges.len(), 2);
        assert!(p.projection.nodes.iter().all(|n| n.node_type_ref.is_empty()));
        assert!(p.projection.edges.iter().all(|e| e.predicate_ref.is_empty()));
        assert_eq!(p.references, ProjectedReferences::default());
        assert_eq!(p.taxonomy, ProjectedTaxonomy::default());
        assert_eq!(p.sources.ontology_seed, None);
        assert_eq!(p.sources.generated_at, 5);
    }

    #[test]
    fn unresolved_properties_are_dropped() {
        let (ontologies, _) = registries();
        let mut g = testing::simple_class_graph();
        let module = NodeId::from_seed("test:node:my_module");
        if let Some(n) = g.nodes.get_mut(&module) {
            n.set_property(
                PropertyNameId::from_seed("not:in:ontology"),
                crate::primitives::SafeStrText::new("x").unwrap(),
            );
        }
        let p = SemanticGraphProjector::new(&ontologies)
            .with_clock(FixedClock(0))
            .project(&g);
        let node = p.projection.nodes.get(0).unwrap();
        assert_eq!(node.properties.as_ref().map(|p| p.len()), Some(0));
        assert!(p.references.property_names.is_empty());
        // no taxonomy registry attached
        assert!(p.taxonomy.category_parents.is_empty());
    }

    #[test]
    fn dangling_edge_endpoints_project_to_empty_names() {
        let (ontologies, _) = registries();
        let mut g = testing::simple_class_graph();
        g.edges.push(crate::types::SemanticGraphEdge::new(
            crate::primitives::EdgeId::from_seed("dangling"),
            NodeId::from_seed("test:node:my_module"),
            testing::predicate_id("contains"),
            NodeId::from_seed("ghost"),
        ));
        let p = SemanticGraphProjector::new(&ontologies)
            .with_clock(FixedClock(0))
            .project(&g);
        let last = p.projection.edges.get(2).unwrap();
        assert_eq!(last.from_name.as_str(), "my_module");
        assert!(last.to_name.is_empty());
    }
}
