use serde::{Deserialize, Serialize};

use crate::collections::{TypedList, TypedMap};
use crate::primitives::{
    CategoryId, CategoryRef, IdSource, SafeStrText, SafeStrVersion, TaxonomyId, TaxonomyRef,
};

/// A node in a taxonomy tree.
///
/// `parent_id` is `None` only for the root. `child_ids` mirrors the parent
/// links of other categories in the same taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxonomyCategory {
    pub category_id: CategoryId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id_source: Option<IdSource>,

    pub category_ref: CategoryRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<SafeStrText>,

    #[serde(default)]
    pub parent_id: Option<CategoryId>,

    #[serde(default)]
    pub child_ids: TypedList<CategoryId>,
}

impl TaxonomyCategory {
    /// A category with no parent and no children.
    pub fn new(category_id: CategoryId, category_ref: CategoryRef) -> Self {
        Self {
            category_id,
            category_id_source: None,
            category_ref,
            description: None,
            parent_id: None,
            child_ids: TypedList::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A single-rooted hierarchy of categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Taxonomy {
    pub taxonomy_id: TaxonomyId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_id_source: Option<IdSource>,

    pub taxonomy_ref: TaxonomyRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<SafeStrVersion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<SafeStrText>,

    pub root_id: CategoryId,

    #[serde(default)]
    pub categories: TypedMap<CategoryId, TaxonomyCategory>,
}

impl Taxonomy {
    /// An empty taxonomy. Callers are expected to insert the root category
    /// under `root_id`.
    pub fn new(taxonomy_id: TaxonomyId, taxonomy_ref: TaxonomyRef, root_id: CategoryId) -> Self {
        Self {
            taxonomy_id,
            taxonomy_id_source: None,
            taxonomy_ref,
            version: None,
            description: None,
            root_id,
            categories: TypedMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaEntity;
    use serde_json::json;

    #[test]
    fn category_accepts_missing_or_null_parent() {
        let a = TaxonomyCategory::try_from_json(json!({
            "category_id": "327d7688",
            "category_ref": "root",
            "parent_id": null,
            "child_ids": []
        }))
        .unwrap();
        let b = TaxonomyCategory::try_from_json(json!({
            "category_id": "327d7688",
            "category_ref": "root"
        }))
        .unwrap();
        assert_eq!(a, b);
        assert!(a.is_root());
    }

    #[test]
    fn taxonomy_roundtrip() {
        let root = CategoryId::from_seed("kb:cat:root");
        let mut t = Taxonomy::new(
            TaxonomyId::from_seed("kb:taxonomy"),
            TaxonomyRef::new("knowledge").unwrap(),
            root.clone(),
        );
        t.version = Some(SafeStrVersion::new("1.0.0").unwrap());
        t.categories.insert(
            root.clone(),
            TaxonomyCategory::new(root, CategoryRef::new("root").unwrap()),
        );
        let json = t.to_json().unwrap();
        assert_eq!(json["taxonomy_id"], "db44d51c");
        assert_eq!(json["root_id"], "327d7688");
        let back = Taxonomy::try_from_json(json.clone()).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.to_json().unwrap(), json);
    }

    #[test]
    fn bad_child_id_is_rejected() {
        let err = TaxonomyCategory::try_from_json(json!({
            "category_id": "327d7688",
            "category_ref": "root",
            "child_ids": ["not an id"]
        }));
        assert!(err.is_err());
    }
}
