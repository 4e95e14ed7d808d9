//! Registries preloaded from schema JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use semantic_graphs::registry::read_json_file;
use semantic_graphs::{OntologyRegistry, RegistryError, RuleEngine, TaxonomyRegistry};
use serde_json::Value;
use tracing::{debug, info, warn};

/// What a JSON document holds, judged by its id key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Taxonomy,
    Ontology,
    RuleSet,
    Graph,
}

/// Classify a document. Rule sets and graphs also carry an `ontology_id`,
/// so their own id keys are checked first.
pub fn classify(value: &Value) -> Option<SchemaKind> {
    let obj = value.as_object()?;
    if obj.contains_key("rule_set_id") {
        Some(SchemaKind::RuleSet)
    } else if obj.contains_key("graph_id") {
        Some(SchemaKind::Graph)
    } else if obj.contains_key("root_id") {
        Some(SchemaKind::Taxonomy)
    } else if obj.contains_key("ontology_id") {
        Some(SchemaKind::Ontology)
    } else {
        None
    }
}

/// One registry per schema kind.
#[derive(Debug, Default)]
pub struct Schemas {
    pub taxonomies: TaxonomyRegistry,
    pub ontologies: OntologyRegistry,
    pub rule_sets: RuleEngine,
}

impl Schemas {
    /// Load every `*.json` file in `dir`, in file-name order. Files that are
    /// unreadable, malformed or not schemas are skipped and logged.
    pub fn load_dir(dir: &Path) -> Result<Self, RegistryError> {
        let io_err = |source| RegistryError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut schemas = Self::default();
        for path in paths {
            match read_json_file(&path) {
                Ok(Some(value)) => {
                    if schemas.load(&value).is_none() {
                        debug!(path = %path.display(), "skipping non-schema file");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable schema file"),
            }
        }

        info!(
            dir = %dir.display(),
            taxonomies = schemas.taxonomies.len(),
            ontologies = schemas.ontologies.len(),
            rule_sets = schemas.rule_sets.len(),
            "loaded schemas"
        );
        Ok(schemas)
    }

    /// Register one schema document. Returns its kind when it was loaded;
    /// graphs are never loaded.
    pub fn load(&mut self, value: &Value) -> Option<SchemaKind> {
        let kind = classify(value)?;
        let loaded = match kind {
            SchemaKind::Taxonomy => self.taxonomies.load_from_dict(value).is_some(),
            SchemaKind::Ontology => self.ontologies.load_from_dict(value).is_some(),
            SchemaKind::RuleSet => self.rule_sets.load_from_dict(value).is_some(),
            SchemaKind::Graph => false,
        };
        loaded.then_some(kind)
    }
}

// --- tests -------------------------------------------------------------------
