//! Hierarchy navigation over a [`Taxonomy`].
//!
//! All operations take the taxonomy as their first argument; the entity
//! itself stays plain data. Walks that follow parent or child links fail
//! with [`TaxonomyError::CyclicTaxonomy`] instead of looping when the input
//! is malformed.

use std::collections::HashSet;

use thiserror::Error;
use tracing::warn;

use crate::primitives::{CategoryId, CategoryRef};
use crate::types::{Taxonomy, TaxonomyCategory};

/// Errors raised while walking a taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("cycle detected in taxonomy at category {category_id}")]
    CyclicTaxonomy { category_id: CategoryId },
}

/// The category whose id equals `t.root_id`.
pub fn get_root(t: &Taxonomy) -> Option<&TaxonomyCategory> {
    t.categories.get(&t.root_id)
}

pub fn get_category<'t>(t: &'t Taxonomy, id: &CategoryId) -> Option<&'t TaxonomyCategory> {
    t.categories.get(id)
}

pub fn has_category(t: &Taxonomy, id: &CategoryId) -> bool {
    t.categories.contains_key(id)
}

/// Linear scan for the category with the given ref.
pub fn get_category_by_ref<'t>(t: &'t Taxonomy, category_ref: &CategoryRef) -> Option<&'t TaxonomyCategory> {
    t.categories.values().find(|c| &c.category_ref == category_ref)
}

pub fn all_category_ids(t: &Taxonomy) -> Vec<CategoryId> {
    t.categories.keys().cloned().collect()
}

/// The resolved children of `id`, in `child_ids` order.
///
/// Child ids that do not resolve are skipped so partially loaded taxonomies
/// remain navigable.
pub fn get_children<'t>(t: &'t Taxonomy, id: &CategoryId) -> Vec<&'t TaxonomyCategory> {
    let Some(category) = t.categories.get(id) else {
        return vec![];
    };
    category
        .child_ids
        .iter()
        .filter_map(|child| t.categories.get(child))
        .collect()
}

/// The parent of `id`. `None` for the root, unknown ids and dangling parents.
pub fn get_parent<'t>(t: &'t Taxonomy, id: &CategoryId) -> Option<&'t TaxonomyCategory> {
    let parent_id = t.categories.get(id)?.parent_id.as_ref()?;
    t.categories.get(parent_id)
}

/// The parent chain of `id` from nearest to farthest, excluding `id` itself.
///
/// The walk stops at the root or at the first parent id that does not
/// resolve (that id is still included).
pub fn get_ancestors(t: &Taxonomy, id: &CategoryId) -> Result<Vec<CategoryId>, TaxonomyError> {
    let mut result = Vec::new();
    let mut seen: HashSet<&CategoryId> = HashSet::new();
    seen.insert(id);

    let mut current = t.categories.get(id);
    while let Some(category) = current {
        let Some(parent_id) = category.parent_id.as_ref() else {
            break;
        };
        if !seen.insert(parent_id) {
            return Err(TaxonomyError::CyclicTaxonomy {
                category_id: parent_id.clone(),
            });
        }
        result.push(parent_id.clone());
        current = t.categories.get(parent_id);
    }
    Ok(result)
}

/// Every category below `id`, depth-first in `child_ids` order.
pub fn get_descendants(t: &Taxonomy, id: &CategoryId) -> Result<Vec<CategoryId>, TaxonomyError> {
    let mut result = Vec::new();
    let mut path: HashSet<CategoryId> = HashSet::new();
    path.insert(id.clone());
    collect_descendants(t, id, &mut path, &mut result)?;
    Ok(result)
}

fn collect_descendants(
    t: &Taxonomy,
    id: &CategoryId,
    path: &mut HashSet<CategoryId>,
    out: &mut Vec<CategoryId>,
) -> Result<(), TaxonomyError> {
    let Some(category) = t.categories.get(id) else {
        return Ok(());
    };
    for child in category.child_ids.iter() {
        if path.contains(child) {
            return Err(TaxonomyError::CyclicTaxonomy {
                category_id: child.clone(),
            });
        }
        if !t.categories.contains_key(child) {
            continue;
        }
        out.push(child.clone());
        path.insert(child.clone());
        collect_descendants(t, child, path, out)?;
        path.remove(child);
    }
    Ok(())
}

/// Number of ancestors; the root has depth 0.
pub fn depth(t: &Taxonomy, id: &CategoryId) -> Result<usize, TaxonomyError> {
    get_ancestors(t, id).map(|a| a.len())
}

/// Whether `ancestor` lies on the parent chain of `category`.
pub fn is_ancestor_of(t: &Taxonomy, ancestor: &CategoryId, category: &CategoryId) -> Result<bool, TaxonomyError> {
    Ok(get_ancestors(t, category)?.contains(ancestor))
}

/// Whether `category` lies below `ancestor`.
pub fn is_descendant_of(t: &Taxonomy, category: &CategoryId, ancestor: &CategoryId) -> Result<bool, TaxonomyError> {
    is_ancestor_of(t, ancestor, category)
}

/// Structural problems with a taxonomy, as human-readable messages.
///
/// An empty list means the taxonomy is well formed: the root exists and has
/// no parent, it is the only parentless category, every parent and child id
/// resolves, parent and child links agree, and there are no cycles.
pub fn check_integrity(t: &Taxonomy) -> Vec<String> {
    let mut errors = Vec::new();

    match get_root(t) {
        None => errors.push(format!("root category {} not found", t.root_id)),
        Some(root) if root.parent_id.is_some() => {
            errors.push(format!("root category {} has a parent", t.root_id))
        }
        Some(_) => {}
    }

    for (id, category) in t.categories.iter() {
        if &category.category_id != id {
            errors.push(format!(
                "category {id}: stored under a different id than its category_id {}",
                category.category_id
            ));
        }
        match &category.parent_id {
            None if id != &t.root_id => {
                errors.push(format!("category {id}: has no parent but is not the root"))
            }
            None => {}
            Some(parent_id) => match t.categories.get(parent_id) {
                None => errors.push(format!("category {id}: parent {parent_id} not found")),
                Some(parent) if !parent.child_ids.contains(id) => errors.push(format!(
                    "category {id}: parent {parent_id} does not list it as a child"
                )),
                Some(_) => {}
            },
        }
        for child_id in category.child_ids.iter() {
            match t.categories.get(child_id) {
                None => errors.push(format!("category {id}: child {child_id} not found")),
                Some(child) if child.parent_id.as_ref() != Some(id) => errors.push(format!(
                    "category {id}: child {child_id} names a different parent"
                )),
                Some(_) => {}
            }
        }
        if let Err(err) = get_ancestors(t, id) {
            errors.push(format!("category {id}: {err}"));
        }
    }

    if !errors.is_empty() {
        warn!(taxonomy = %t.taxonomy_ref, problems = errors.len(), "taxonomy integrity check failed");
    }
    errors
}

// --- tests -------------------------------------------------------------------
