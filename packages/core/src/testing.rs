//! Ready-made schemas and graphs.
//!
//! Two families share this module:
//!
//! - **code structure**: modules, classes, methods and functions linked by
//!   `contains`/`in` and `calls`/`called_by`. Ids are seeded with `test:`.
//! - **knowledge base**: topics, articles, concepts, authors and tags. Ids
//!   are seeded with `kb:`.
//!
//! Every id is derived from a fixed seed, so two calls return equal values.
//! The literals here are known to be valid; the constructors panic if one is
//! edited into an invalid value.

use crate::primitives::{
    CategoryId, EdgeId, GraphId, IdSeed, IdSource, NodeId, NodeTypeId, OntologyId, PredicateId,
    Primitive, PropertyNameId, PropertyTypeId, RuleSetId, SafeStrId, SafeStrText, SafeStrVersion,
    TaxonomyId,
};
use crate::types::{
    EdgeRule, Ontology, OntologyNodeType, OntologyPredicate, OntologyPropertyName,
    OntologyPropertyType, RuleCardinality, RuleRequiredEdgeProperty, RuleRequiredNodeProperty,
    RuleSet, RuleTransitivity, SemanticGraph, SemanticGraphEdge, SemanticGraphNode, Taxonomy,
    TaxonomyCategory,
};

fn lit<T: Primitive>(raw: &str) -> T {
    T::parse(raw).expect("invalid fixture literal")
}

fn seeded(seed: &str) -> IdSource {
    IdSource::deterministic(lit(seed))
}

// --- code structure ids ------------------------------------------------------

pub fn node_type_id(node_type_ref: &str) -> NodeTypeId {
    NodeTypeId::from_seed(&format!("test:node_type:{node_type_ref}"))
}

pub fn predicate_id(predicate_ref: &str) -> PredicateId {
    PredicateId::from_seed(&format!("test:predicate:{predicate_ref}"))
}

pub fn category_id(category_ref: &str) -> CategoryId {
    CategoryId::from_seed(&format!("test:category:{category_ref}"))
}

pub fn property_name_id(property_name_ref: &str) -> PropertyNameId {
    PropertyNameId::from_seed(&format!("test:property_name:{property_name_ref}"))
}

pub fn property_type_id(property_type_ref: &str) -> PropertyTypeId {
    PropertyTypeId::from_seed(&format!("test:property_type:{property_type_ref}"))
}

// --- shared builders ---------------------------------------------------------

/// Insert categories given as `(id, ref, parent)` and wire up `child_ids`.
/// Parents must precede their children.
fn fill_categories(t: &mut Taxonomy, categories: &[(CategoryId, &str, Option<CategoryId>)]) {
    for (id, category_ref, parent) in categories {
        let mut category = TaxonomyCategory::new(id.clone(), lit(category_ref));
        category.parent_id = parent.clone();
        t.categories.insert(id.clone(), category);
        if let Some(parent) = parent {
            if let Some(p) = t.categories.get_mut(parent) {
                p.child_ids.push(id.clone());
            }
        }
    }
}

/// Insert predicates given as `(id, ref, inverse)`.
fn fill_predicates(o: &mut Ontology, predicates: &[(PredicateId, &str, Option<PredicateId>)]) {
    for (id, predicate_ref, inverse) in predicates {
        let mut p = OntologyPredicate::new(id.clone(), lit(predicate_ref));
        p.inverse_id = inverse.clone();
        o.predicates.insert(id.clone(), p);
    }
}

fn node(graph: &mut SemanticGraph, seed: &str, node_type: NodeTypeId, name: &str) -> NodeId {
    let node_id = NodeId::from_seed(seed);
    let mut n = SemanticGraphNode::new(node_id.clone(), node_type, lit::<SafeStrId>(name));
    n.node_id_source = Some(seeded(seed));
    graph.nodes.insert(node_id.clone(), n);
    node_id
}

fn edge(graph: &mut SemanticGraph, seed: &str, from: &NodeId, predicate: PredicateId, to: &NodeId) -> EdgeId {
    let edge_id = EdgeId::from_seed(seed);
    let mut e = SemanticGraphEdge::new(edge_id.clone(), from.clone(), predicate, to.clone());
    e.edge_id_source = Some(seeded(seed));
    graph.edges.push(e);
    edge_id
}

fn text(raw: &str) -> SafeStrText {
    lit(raw)
}

// --- code structure ----------------------------------------------------------

/// `code_element` ⟶ {`container`, `code_unit` ⟶ `callable`}.
pub fn code_elements_taxonomy() -> Taxonomy {
    let seed = "test:taxonomy:code_elements";
    let mut t = Taxonomy::new(
        TaxonomyId::from_seed(seed),
        lit("code_elements"),
        category_id("code_element"),
    );
    t.taxonomy_id_source = Some(seeded(seed));
    t.version = Some(lit::<SafeStrVersion>("1.0.0"));
    fill_categories(
        &mut t,
        &[
            (category_id("code_element"), "code_element", None),
            (category_id("container"), "container", Some(category_id("code_element"))),
            (category_id("code_unit"), "code_unit", Some(category_id("code_element"))),
            (category_id("callable"), "callable", Some(category_id("code_unit"))),
        ],
    );
    t
}

/// Module, class, method, function and external node types over
/// [`code_elements_taxonomy`].
pub fn code_structure_ontology() -> Ontology {
    let seed = "test:ontology:code_structure";
    let taxonomy = code_elements_taxonomy();
    let mut o = Ontology::new(OntologyId::from_seed(seed), lit("code_structure"), taxonomy.taxonomy_id);
    o.ontology_id_source = Some(seeded(seed));
    o.version = Some(lit::<SafeStrVersion>("1.0.0"));

    for (node_type_ref, category) in [
        ("module", "container"),
        ("class", "container"),
        ("method", "callable"),
        ("function", "callable"),
        ("external", "code_element"),
    ] {
        let id = node_type_id(node_type_ref);
        o.node_types.insert(
            id.clone(),
            OntologyNodeType::new(id, lit(node_type_ref), category_id(category)),
        );
    }

    fill_predicates(
        &mut o,
        &[
            (predicate_id("contains"), "contains", Some(predicate_id("in"))),
            (predicate_id("in"), "in", Some(predicate_id("contains"))),
            (predicate_id("calls"), "calls", Some(predicate_id("called_by"))),
            (predicate_id("called_by"), "called_by", Some(predicate_id("calls"))),
            (predicate_id("inherits_from"), "inherits_from", None),
        ],
    );

    for property_type_ref in ["string", "integer"] {
        let id = property_type_id(property_type_ref);
        o.property_types
            .insert(id.clone(), OntologyPropertyType::new(id, lit(property_type_ref)));
    }
    for (property_name_ref, property_type) in [("line_number", "integer"), ("docstring", "string")] {
        let id = property_name_id(property_name_ref);
        o.property_names.insert(
            id.clone(),
            OntologyPropertyName::new(id, lit(property_name_ref), property_type_id(property_type)),
        );
    }

    for (s, p, t) in [
        ("module", "contains", "class"),
        ("module", "contains", "function"),
        ("class", "contains", "method"),
        ("class", "in", "module"),
        ("method", "in", "class"),
        ("function", "in", "module"),
        ("method", "calls", "method"),
        ("method", "calls", "function"),
        ("function", "calls", "method"),
        ("function", "calls", "function"),
        ("class", "inherits_from", "class"),
        ("class", "inherits_from", "external"),
    ] {
        o.edge_rules
            .push(EdgeRule::new(node_type_id(s), predicate_id(p), node_type_id(t)));
    }
    o
}

/// Every method sits in exactly one class and carries a line number;
/// inheritance between classes is transitive; calls record their line.
pub fn code_structure_rule_set() -> RuleSet {
    let seed = "test:rule_set:code_structure";
    let mut rs = RuleSet::new(
        RuleSetId::from_seed(seed),
        lit("code_structure_rules"),
        code_structure_ontology().ontology_id,
    );
    rs.rule_set_id_source = Some(seeded(seed));
    rs.cardinality_rules.push(RuleCardinality::new(
        node_type_id("method"),
        predicate_id("in"),
        node_type_id("class"),
        1,
        Some(1),
    ));
    rs.transitivity_rules.push(RuleTransitivity {
        source_type_id: node_type_id("class"),
        predicate_id: predicate_id("inherits_from"),
        target_type_id: node_type_id("class"),
    });
    rs.required_node_properties.push(RuleRequiredNodeProperty {
        node_type_id: node_type_id("method"),
        property_name_id: property_name_id("line_number"),
        required: true,
    });
    rs.required_edge_properties.push(RuleRequiredEdgeProperty {
        predicate_id: predicate_id("calls"),
        property_name_id: property_name_id("line_number"),
        required: true,
    });
    rs
}

/// `my_module --contains--> MyClass --contains--> my_method`.
pub fn simple_class_graph() -> SemanticGraph {
    let seed = "test:graph:simple_class";
    let mut g = SemanticGraph::new(GraphId::from_seed(seed), code_structure_ontology().ontology_id);
    g.graph_id_source = Some(seeded(seed));
    let module = node(&mut g, "test:node:my_module", node_type_id("module"), "my_module");
    let class = node(&mut g, "test:node:MyClass", node_type_id("class"), "MyClass");
    let method = node(&mut g, "test:node:my_method", node_type_id("method"), "my_method");
    edge(&mut g, "test:edge:my_module_contains_MyClass", &module, predicate_id("contains"), &class);
    edge(&mut g, "test:edge:MyClass_contains_my_method", &class, predicate_id("contains"), &method);
    g
}

/// A class with two methods, one calling the other. Methods and the call
/// carry `line_number` properties.
pub fn code_graph_with_calls() -> SemanticGraph {
    let seed = "test:graph:calls";
    let ontology = code_structure_ontology();
    let mut g = SemanticGraph::new(GraphId::from_seed(seed), ontology.ontology_id);
    g.graph_id_source = Some(seeded(seed));
    g.rule_set_id = Some(code_structure_rule_set().rule_set_id);

    let line = property_name_id("line_number");
    let module = node(&mut g, "test:node:runner_mod", node_type_id("module"), "runner_mod");
    let class = node(&mut g, "test:node:Runner", node_type_id("class"), "Runner");
    let run = node(&mut g, "test:node:run", node_type_id("method"), "run");
    let helper = node(&mut g, "test:node:helper", node_type_id("method"), "helper");
    for (id, value) in [(&run, "12"), (&helper, "20")] {
        if let Some(n) = g.nodes.get_mut(id) {
            n.set_property(line.clone(), text(value));
        }
    }

    edge(&mut g, "test:edge:Runner_in_runner_mod", &class, predicate_id("in"), &module);
    edge(&mut g, "test:edge:run_in_Runner", &run, predicate_id("in"), &class);
    edge(&mut g, "test:edge:helper_in_Runner", &helper, predicate_id("in"), &class);
    edge(&mut g, "test:edge:run_calls_helper", &run, predicate_id("calls"), &helper);
    if let Some(call) = g.edges.iter_mut().last() {
        call.set_property(line, text("14"));
    }
    g
}

// --- knowledge base ----------------------------------------------------------

pub fn kb_node_type_id(node_type_ref: &str) -> NodeTypeId {
    NodeTypeId::from_seed(&format!("kb:nt:{node_type_ref}"))
}

pub fn kb_predicate_id(predicate_ref: &str) -> PredicateId {
    PredicateId::from_seed(&format!("kb:pred:{predicate_ref}"))
}

pub fn kb_category_id(category_ref: &str) -> CategoryId {
    CategoryId::from_seed(&format!("kb:cat:{category_ref}"))
}

pub fn kb_property_name_id(property_name_ref: &str) -> PropertyNameId {
    PropertyNameId::from_seed(&format!("kb:pn:{property_name_ref}"))
}

/// `root` ⟶ {`content`, `metadata`, `entity`}.
pub fn kb_taxonomy() -> Taxonomy {
    let mut t = Taxonomy::new(
        TaxonomyId::from_seed("kb:taxonomy"),
        lit("kb_categories"),
        kb_category_id("root"),
    );
    t.taxonomy_id_source = Some(seeded("kb:taxonomy"));
    fill_categories(
        &mut t,
        &[
            (kb_category_id("root"), "root", None),
            (kb_category_id("content"), "content", Some(kb_category_id("root"))),
            (kb_category_id("metadata"), "metadata", Some(kb_category_id("root"))),
            (kb_category_id("entity"), "entity", Some(kb_category_id("root"))),
        ],
    );
    t
}

pub fn kb_ontology() -> Ontology {
    let mut o = Ontology::new(
        OntologyId::from_seed("kb:ontology"),
        lit("knowledge_base"),
        TaxonomyId::from_seed("kb:taxonomy"),
    );
    o.ontology_id_source = Some(seeded("kb:ontology"));
    o.version = Some(lit::<SafeStrVersion>("0.1.0"));

    for (node_type_ref, category) in [
        ("topic", "content"),
        ("article", "content"),
        ("concept", "content"),
        ("author", "entity"),
        ("tag", "metadata"),
    ] {
        let id = kb_node_type_id(node_type_ref);
        o.node_types.insert(
            id.clone(),
            OntologyNodeType::new(id, lit(node_type_ref), kb_category_id(category)),
        );
    }

    fill_predicates(
        &mut o,
        &[
            (kb_predicate_id("contains"), "contains", None),
            (kb_predicate_id("references"), "references", None),
            (kb_predicate_id("written_by"), "written_by", None),
            (kb_predicate_id("tagged_with"), "tagged_with", None),
            (kb_predicate_id("defines"), "defines", None),
            (kb_predicate_id("related_to"), "related_to", Some(kb_predicate_id("related_to"))),
        ],
    );

    let string = PropertyTypeId::from_seed("kb:pt:string");
    o.property_types
        .insert(string.clone(), OntologyPropertyType::new(string.clone(), lit("string")));
    for property_name_ref in ["summary", "url"] {
        let id = kb_property_name_id(property_name_ref);
        o.property_names.insert(
            id.clone(),
            OntologyPropertyName::new(id, lit(property_name_ref), string.clone()),
        );
    }

    for (s, p, t) in [
        ("topic", "contains", "article"),
        ("topic", "contains", "concept"),
        ("article", "references", "article"),
        ("article", "references", "concept"),
        ("article", "written_by", "author"),
        ("article", "tagged_with", "tag"),
        ("article", "defines", "concept"),
        ("concept", "related_to", "concept"),
        ("topic", "related_to", "topic"),
    ] {
        o.edge_rules
            .push(EdgeRule::new(kb_node_type_id(s), kb_predicate_id(p), kb_node_type_id(t)));
    }
    o
}

/// Every article has at least one author.
pub fn kb_rule_set() -> RuleSet {
    let mut rs = RuleSet::new(
        RuleSetId::from_seed("kb:rules"),
        lit("kb_rules"),
        OntologyId::from_seed("kb:ontology"),
    );
    rs.rule_set_id_source = Some(seeded("kb:rules"));
    rs.cardinality_rules.push(RuleCardinality::new(
        kb_node_type_id("article"),
        kb_predicate_id("written_by"),
        kb_node_type_id("author"),
        1,
        None,
    ));
    rs
}

/// A small knowledge base about machine learning. Uses the topic, article,
/// concept, author and tag types but leaves the `references` predicate and
/// the `url` property unused.
pub fn kb_graph() -> SemanticGraph {
    let mut g = SemanticGraph::new(GraphId::from_seed("kb:graph:ml"), OntologyId::from_seed("kb:ontology"));
    g.graph_id_source = Some(seeded("kb:graph:ml"));
    g.rule_set_id = Some(RuleSetId::from_seed("kb:rules"));

    let topic = node(&mut g, "kb:node:ml", kb_node_type_id("topic"), "Machine Learning");
    let article = node(&mut g, "kb:node:nn_intro", kb_node_type_id("article"), "Intro to Neural Networks");
    let backprop = node(&mut g, "kb:node:backprop", kb_node_type_id("concept"), "Backpropagation");
    let descent = node(&mut g, "kb:node:gd", kb_node_type_id("concept"), "Gradient Descent");
    let author = node(&mut g, "kb:node:chen", kb_node_type_id("author"), "Dr. Sarah Chen");
    let tag = node(&mut g, "kb:node:deep_learning", kb_node_type_id("tag"), "deep-learning");

    if let Some(n) = g.nodes.get_mut(&article) {
        n.set_property(kb_property_name_id("summary"), text("A gentle introduction."));
    }

    edge(&mut g, "kb:edge:ml_contains_nn", &topic, kb_predicate_id("contains"), &article);
    edge(&mut g, "kb:edge:ml_contains_bp", &topic, kb_predicate_id("contains"), &backprop);
    edge(&mut g, "kb:edge:nn_by_chen", &article, kb_predicate_id("written_by"), &author);
    edge(&mut g, "kb:edge:nn_tagged", &article, kb_predicate_id("tagged_with"), &tag);
    edge(&mut g, "kb:edge:nn_defines_bp", &article, kb_predicate_id("defines"), &backprop);
    edge(&mut g, "kb:edge:bp_related_gd", &backprop, kb_predicate_id("related_to"), &descent);
    g
}

/// The seed a fixture id was derived from, as an [`IdSeed`].
pub fn seed(raw: &str) -> IdSeed {
    lit(raw)
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ontology, rules, taxonomy};

    #[test]
    fn fixtures_are_deterministic() {
        assert_eq!(code_structure_ontology(), code_structure_ontology());
        assert_eq!(kb_graph(), kb_graph());
        assert_eq!(node_type_id("module").as_str(), "d84ade10");
        assert_eq!(predicate_id("contains").as_str(), "b8dbb70e");
        assert_eq!(kb_ontology().ontology_id.as_str(), "d7eff75c");
    }

    #[test]
    fn kb_schemas_are_consistent() {
        let t = kb_taxonomy();
        let o = kb_ontology();
        assert!(taxonomy::check_integrity(&t).is_empty());
        assert_eq!(ontology::check_integrity(&o, Some(&t)), Vec::<String>::new());
        assert_eq!(rules::check_integrity(&kb_rule_set(), &o), Vec::<String>::new());
        assert_eq!(o.taxonomy_id, t.taxonomy_id);
    }

    #[test]
    fn kb_graph_uses_sanitised_names() {
        let g = kb_graph();
        let names: Vec<_> = g.nodes.values().map(|n| n.name.as_str()).collect();
        assert_eq!(names[0], "Machine_Learning");
        assert!(names.contains(&"Dr._Sarah_Chen"));
        assert_eq!(g.edge_count(), 6);
    }
}
