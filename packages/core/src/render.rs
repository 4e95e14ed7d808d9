//! Human-readable text rendering of [`ProjectedSemanticGraph`]s.
//!
//! The output is stable plain text suitable for terminals and logs. It is
//! not a canonical format; only the JSON form of a projection is normative.

use std::collections::HashSet;

use crate::primitives::CategoryRef;
use crate::types::projected::ProjectedProperties;
use crate::types::{ProjectedNode, ProjectedSemanticGraph};

/// Render a projection as a summary: nodes grouped by type, then edges,
/// then the category tree of the types in use.
///
/// ```text
/// Semantic Graph  3 nodes, 2 edges
/// ────────────────────────────────
///
/// MODULE (1)
///   my_module
///
/// CLASS (1)
///   MyClass
///
/// METHOD (1)
///   my_method
///
/// EDGES (2)
///   my_module --contains--> MyClass
///   MyClass --contains--> my_method
///
/// TAXONOMY
///   code_element
///     container  [module, class]
///     code_unit
///       callable  [method]
///
/// source: 4f1c2a9b  generated: 1700000000000
/// ```
pub fn render_projection(p: &ProjectedSemanticGraph) -> String {
    let nodes = &p.projection.nodes;
    let edges = &p.projection.edges;
    let header = format!(
        "Semantic Graph  {} node{}, {} edge{}",
        nodes.len(),
        plural(nodes.len()),
        edges.len(),
        plural(edges.len())
    );
    let rule = "─".repeat(header.chars().count());
    let mut out = format!("{}\n{}\n", header, rule);

    // node groups, in order of first appearance
    let mut type_refs: Vec<&str> = Vec::new();
    for n in nodes.iter() {
        if !type_refs.contains(&n.node_type_ref.as_str()) {
            type_refs.push(n.node_type_ref.as_str());
        }
    }
    for type_ref in type_refs {
        let group: Vec<&ProjectedNode> = nodes
            .iter()
            .filter(|n| n.node_type_ref.as_str() == type_ref)
            .collect();
        let label = if type_ref.is_empty() {
            "(UNTYPED)".to_string()
        } else {
            type_ref.to_uppercase()
        };
        out.push('\n');
        out.push_str(&format!("{} ({})\n", label, group.len()));
        for n in group {
            out.push_str(&format!("  {}{}\n", n.name, properties_suffix(n.properties.as_ref())));
        }
    }

    if !edges.is_empty() {
        out.push('\n');
        out.push_str(&format!("EDGES ({})\n", edges.len()));
        for e in edges.iter() {
            let verb = if e.predicate_ref.is_empty() { "?" } else { e.predicate_ref.as_str() };
            out.push_str(&format!(
                "  {} --{}--> {}{}\n",
                or_placeholder(e.from_name.as_str()),
                verb,
                or_placeholder(e.to_name.as_str()),
                properties_suffix(e.properties.as_ref())
            ));
        }
    }

    if !p.taxonomy.category_parents.is_empty() {
        out.push('\n');
        out.push_str("TAXONOMY\n");
        let mut visited = HashSet::new();
        for (category, parent) in p.taxonomy.category_parents.iter() {
            let orphan = parent
                .as_ref()
                .map_or(true, |parent| !p.taxonomy.category_parents.contains_key(parent));
            if orphan {
                render_category(p, category, 1, &mut visited, &mut out);
            }
        }
    }

    out.push('\n');
    out.push_str(&format!(
        "source: {}  generated: {}\n",
        p.sources.source_graph_id, p.sources.generated_at
    ));

    out
}

// --- helpers -----------------------------------------------------------------

fn render_category(
    p: &ProjectedSemanticGraph,
    category: &CategoryRef,
    depth: usize,
    visited: &mut HashSet<CategoryRef>,
    out: &mut String,
) {
    if !visited.insert(category.clone()) {
        return;
    }
    let members: Vec<&str> = p
        .taxonomy
        .node_type_categories
        .iter()
        .filter(|(_, c)| *c == category)
        .map(|(t, _)| t.as_str())
        .collect();
    let suffix = if members.is_empty() {
        String::new()
    } else {
        format!("  [{}]", members.join(", "))
    };
    out.push_str(&format!("{}{}{}\n", "  ".repeat(depth), category, suffix));

    for (child, parent) in p.taxonomy.category_parents.iter() {
        if parent.as_ref() == Some(category) {
            render_category(p, child, depth + 1, visited, out);
        }
    }
}

fn properties_suffix(properties: Option<&ProjectedProperties>) -> String {
    match properties {
        Some(props) if !props.is_empty() => {
            let pairs: Vec<String> = props
                .iter()
                .map(|(k, v)| format!("{}={}", k, truncate(v.as_str(), 40)))
                .collect();
            format!("  {}", pairs.join(", "))
        }
        _ => String::new(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max - 1).collect();
        format!("{}…", kept)
    }
}

fn or_placeholder(name: &str) -> &str {
    if name.is_empty() {
        "?"
    } else {
        name
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

// --- tests -------------------------------------------------------------------
