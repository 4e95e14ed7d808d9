//! Raw JSON documents for the semantic graph conformance suite.
//!
//! Each function returns the document a user would write by hand: plain JSON
//! with literal ids. Tests push these through the same entry points as real
//! callers ([`SchemaEntity::try_from_json`] and the registries'
//! `load_from_dict`) rather than constructing typed values directly.
//!
//! The schemas describe source code:
//!
//! ```text
//! taxonomy   code_element ─┬─ container
//!                          └─ code_unit ── callable
//!
//! ontology   module, class          (container)
//!            method, function       (callable)
//!            external               (code_element)
//!            contains ⇄ in, inherits_from
//! ```
//!
//! Ids are derived from `conf:` seeds; [`id`] computes one.

use semantic_graphs::{
    ObjId, OntologyRegistry, RuleEngine, SchemaEntity, SemanticGraph, TaxonomyRegistry,
};
use serde_json::{json, Map, Value};

pub const ONTOLOGY_SEED: &str = "conf:ontology";

/// The object id derived from `seed`, as a string.
pub fn id(seed: &str) -> String {
    ObjId::from_seed(seed).to_string()
}

pub fn category(r: &str) -> String {
    id(&format!("conf:category:{r}"))
}

pub fn node_type(r: &str) -> String {
    id(&format!("conf:node_type:{r}"))
}

pub fn predicate(r: &str) -> String {
    id(&format!("conf:predicate:{r}"))
}

pub fn node(name: &str) -> String {
    id(&format!("conf:node:{name}"))
}

fn keyed(entries: Vec<(String, Value)>) -> Value {
    Value::Object(entries.into_iter().collect::<Map<String, Value>>())
}

// --- schemas -----------------------------------------------------------------

pub fn taxonomy_json() -> Value {
    let cat = |r: &str, parent: Option<&str>, children: &[&str]| {
        (
            category(r),
            json!({
                "category_id": category(r),
                "category_ref": r,
                "parent_id": parent.map(category),
                "child_ids": children.iter().map(|c| category(c)).collect::<Vec<_>>(),
            }),
        )
    };
    json!({
        "taxonomy_id": id("conf:taxonomy"),
        "taxonomy_ref": "code_elements",
        "version": "1.0.0",
        "root_id": category("code_element"),
        "categories": keyed(vec![
            cat("code_element", None, &["container", "code_unit"]),
            cat("container", Some("code_element"), &[]),
            cat("code_unit", Some("code_element"), &["callable"]),
            cat("callable", Some("code_unit"), &[]),
        ]),
    })
}

/// Node types `module`, `class`, `method`, `function` and `external`;
/// predicates `contains`/`in` (mutual inverses) and `inherits_from`.
pub fn ontology_json() -> Value {
    let nt = |r: &str, cat: &str| {
        (
            node_type(r),
            json!({
                "node_type_id": node_type(r),
                "node_type_ref": r,
                "category_id": category(cat),
            }),
        )
    };
    let pred = |r: &str, inverse: Option<&str>| {
        (
            predicate(r),
            json!({
                "predicate_id": predicate(r),
                "predicate_ref": r,
                "inverse_id": inverse.map(predicate),
            }),
        )
    };
    let rule = |s: &str, p: &str, t: &str| {
        json!({
            "source_type_id": node_type(s),
            "predicate_id": predicate(p),
            "target_type_id": node_type(t),
        })
    };
    json!({
        "ontology_id": id(ONTOLOGY_SEED),
        "ontology_id_source": {"source_type": "deterministic", "seed": ONTOLOGY_SEED},
        "ontology_ref": "code_structure",
        "version": "1.0.0",
        "taxonomy_id": id("conf:taxonomy"),
        "node_types": keyed(vec![
            nt("module", "container"),
            nt("class", "container"),
            nt("method", "callable"),
            nt("function", "callable"),
            nt("external", "code_element"),
        ]),
        "predicates": keyed(vec![
            pred("contains", Some("in")),
            pred("in", Some("contains")),
            pred("inherits_from", None),
        ]),
        "edge_rules": [
            rule("module", "contains", "class"),
            rule("module", "contains", "function"),
            rule("class", "contains", "method"),
            rule("class", "in", "module"),
            rule("method", "in", "class"),
            rule("function", "in", "module"),
            rule("class", "inherits_from", "class"),
            rule("class", "inherits_from", "external"),
        ],
    })
}

/// Every method is `in` exactly one class.
pub fn rule_set_json() -> Value {
    json!({
        "rule_set_id": id("conf:rules"),
        "rule_set_ref": "code_structure_rules",
        "ontology_id": id(ONTOLOGY_SEED),
        "cardinality_rules": [{
            "source_type_id": node_type("method"),
            "predicate_id": predicate("in"),
            "target_type_id": node_type("class"),
            "min_targets": 1,
            "max_targets": 1,
        }],
    })
}

// --- graphs ------------------------------------------------------------------

/// `my_module --contains--> MyClass --contains--> my_method`.
pub fn simple_class_graph_json() -> Value {
    let n = |name: &str, t: &str| {
        (
            node(name),
            json!({"node_id": node(name), "node_type_id": node_type(t), "name": name}),
        )
    };
    let e = |from: &str, p: &str, to: &str| {
        json!({
            "edge_id": id(&format!("conf:edge:{from}_{p}_{to}")),
            "from_node_id": node(from),
            "predicate_id": predicate(p),
            "to_node_id": node(to),
        })
    };
    json!({
        "graph_id": id("conf:graph:simple_class"),
        "ontology_id": id(ONTOLOGY_SEED),
        "rule_set_id": null,
        "nodes": keyed(vec![
            n("my_module", "module"),
            n("MyClass", "class"),
            n("my_method", "method"),
        ]),
        "edges": [
            e("my_module", "contains", "MyClass"),
            e("MyClass", "contains", "my_method"),
        ],
    })
}

pub fn simple_class_graph() -> SemanticGraph {
    SemanticGraph::try_from_json(simple_class_graph_json()).expect("conformance graph must parse")
}

// --- registries --------------------------------------------------------------

/// Registries loaded from [`taxonomy_json`], [`ontology_json`] and
/// [`rule_set_json`].
pub struct Loaded {
    pub taxonomies: TaxonomyRegistry,
    pub ontologies: OntologyRegistry,
    pub rule_sets: RuleEngine,
}

pub fn load_registries() -> Loaded {
    let mut taxonomies = TaxonomyRegistry::new();
    let mut ontologies = OntologyRegistry::new();
    let mut rule_sets = RuleEngine::new();
    assert!(taxonomies.load_from_dict(&taxonomy_json()).is_some(), "taxonomy must load");
    assert!(ontologies.load_from_dict(&ontology_json()).is_some(), "ontology must load");
    assert!(rule_sets.load_from_dict(&rule_set_json()).is_some(), "rule set must load");
    Loaded {
        taxonomies,
        ontologies,
        rule_sets,
    }
}
