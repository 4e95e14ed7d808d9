//! Caches of taxonomies, ontologies and rule sets.
//!
//! A [`Registry`] maps an entity's id to the entity and keeps a second index
//! from the entity's ref to its id. Registries are plain values: build one,
//! fill it, and pass it by reference to whatever needs it (the projector, the
//! builder). Reads through `&Registry` may be shared; writes need `&mut` and
//! are not synchronised.
//!
//! Loading is forgiving by contract: an empty mapping, a missing file and a
//! malformed document all yield `None`. The reason is logged, not returned.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::collections::TypedMap;
use crate::primitives::{
    mint_id, IdSeed, IdSource, KindedId, OntologyId, OntologyRef, Primitive, RuleSetId,
    RuleSetRef, TaxonomyId, TaxonomyRef,
};
use crate::types::{Ontology, RuleSet, SchemaEntity, Taxonomy};

/// Why a schema document could not be read.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

/// An entity that can live in a [`Registry`].
pub trait Registered: SchemaEntity {
    type Id: KindedId;
    type Ref: Primitive;

    /// Entity name used in log lines (e.g. `"ontology"`).
    const ENTITY: &'static str;

    fn id(&self) -> &Self::Id;

    fn entity_ref(&self) -> &Self::Ref;

    /// Overwrite the entity's id and its recorded id source.
    fn assign_id(&mut self, id: Self::Id, source: Option<IdSource>);
}

impl Registered for Ontology {
    type Id = OntologyId;
    type Ref = OntologyRef;
    const ENTITY: &'static str = "ontology";

    fn id(&self) -> &OntologyId {
        &self.ontology_id
    }

    fn entity_ref(&self) -> &OntologyRef {
        &self.ontology_ref
    }

    fn assign_id(&mut self, id: OntologyId, source: Option<IdSource>) {
        self.ontology_id = id;
        self.ontology_id_source = source;
    }
}

impl Registered for Taxonomy {
    type Id = TaxonomyId;
    type Ref = TaxonomyRef;
    const ENTITY: &'static str = "taxonomy";

    fn id(&self) -> &TaxonomyId {
        &self.taxonomy_id
    }

    fn entity_ref(&self) -> &TaxonomyRef {
        &self.taxonomy_ref
    }

    fn assign_id(&mut self, id: TaxonomyId, source: Option<IdSource>) {
        self.taxonomy_id = id;
        self.taxonomy_id_source = source;
    }
}

impl Registered for RuleSet {
    type Id = RuleSetId;
    type Ref = RuleSetRef;
    const ENTITY: &'static str = "rule_set";

    fn id(&self) -> &RuleSetId {
        &self.rule_set_id
    }

    fn entity_ref(&self) -> &RuleSetRef {
        &self.rule_set_ref
    }

    fn assign_id(&mut self, id: RuleSetId, source: Option<IdSource>) {
        self.rule_set_id = id;
        self.rule_set_id_source = source;
    }
}

pub type OntologyRegistry = Registry<Ontology>;
pub type TaxonomyRegistry = Registry<Taxonomy>;
/// The rule-set registry.
pub type RuleEngine = Registry<RuleSet>;

/// An id-keyed cache with a secondary ref index.
#[derive(Debug, Clone)]
pub struct Registry<E: Registered> {
    by_id: TypedMap<E::Id, E>,
    by_ref: HashMap<E::Ref, E::Id>,
}

impl<E: Registered> Default for Registry<E> {
    fn default() -> Self {
        Self {
            by_id: TypedMap::new(),
            by_ref: HashMap::new(),
        }
    }
}

impl<E: Registered> Registry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache `entity` under its id, replacing any entry with the same id.
    ///
    /// If the replaced entry had a different ref, that ref falls back to
    /// another cached entity carrying it, or stops resolving. If another
    /// entity already used this entity's ref, the ref now points here.
    pub fn register(&mut self, entity: E) -> &E {
        let id = entity.id().clone();
        let entity_ref = entity.entity_ref().clone();

        // A ref the replaced entry leaves behind, and who else still holds it.
        let released = self
            .by_id
            .get(&id)
            .map(|previous| previous.entity_ref().clone())
            .filter(|old_ref| old_ref != &entity_ref && self.by_ref.get(old_ref) == Some(&id))
            .map(|old_ref| {
                let holder = self
                    .by_id
                    .iter()
                    .find(|(other_id, other)| *other_id != &id && other.entity_ref() == &old_ref)
                    .map(|(other_id, _)| other_id.clone());
                (old_ref, holder)
            });
        match released {
            Some((old_ref, Some(holder))) => {
                self.by_ref.insert(old_ref, holder);
            }
            Some((old_ref, None)) => {
                self.by_ref.remove(&old_ref);
            }
            None => {}
        }

        let (stored, _) = self.by_id.insert_full(id.clone(), entity);
        debug!(entity = E::ENTITY, id = %id, entity_ref = %entity_ref, "registered");
        self.by_ref.insert(entity_ref, id);
        stored
    }

    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.by_id.get(id)
    }

    pub fn get_by_ref(&self, entity_ref: &E::Ref) -> Option<&E> {
        self.by_ref.get(entity_ref).and_then(|id| self.by_id.get(id))
    }

    pub fn has_id(&self, id: &E::Id) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn has_ref(&self, entity_ref: &E::Ref) -> bool {
        self.by_ref.contains_key(entity_ref)
    }

    /// Cached ids in registration order.
    pub fn list_ids(&self) -> Vec<E::Id> {
        self.by_id.keys().cloned().collect()
    }

    /// Cached refs in registration order of their entities.
    pub fn list_refs(&self) -> Vec<E::Ref> {
        self.by_id.values().map(|e| e.entity_ref().clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_ref.clear();
    }

    // --- factories -----------------------------------------------------------

    /// Give `entity` a fresh random id and register it.
    pub fn create_with_random_id(&mut self, mut entity: E) -> &E {
        let (id, _) = mint_id::<E::Id>(None);
        entity.assign_id(id, Some(IdSource::random()));
        self.register(entity)
    }

    /// Give `entity` the id derived from `seed` and register it. The seed is
    /// recorded in the entity's id source.
    pub fn create_with_deterministic_id(&mut self, mut entity: E, seed: &IdSeed) -> &E {
        let (id, source) = mint_id::<E::Id>(Some(seed));
        entity.assign_id(id, source);
        self.register(entity)
    }

    /// Give `entity` exactly `id` and register it. Any previous id source is
    /// dropped.
    pub fn create_with_explicit_id(&mut self, mut entity: E, id: E::Id) -> &E {
        entity.assign_id(id, None);
        self.register(entity)
    }

    // --- loading -------------------------------------------------------------

    /// Parse `raw` into an entity and cache it.
    ///
    /// Returns `None`, caching nothing, when `raw` is not an object, is an
    /// empty object, or does not parse.
    pub fn load_from_dict(&mut self, raw: &Value) -> Option<&E> {
        match raw.as_object() {
            Some(map) if !map.is_empty() => {}
            _ => {
                debug!(entity = E::ENTITY, "nothing to load from empty document");
                return None;
            }
        }
        match E::try_from_json(raw.clone()) {
            Ok(entity) => Some(self.register(entity)),
            Err(err) => {
                warn!(entity = E::ENTITY, error = %err, "could not parse document");
                None
            }
        }
    }

    /// Read `path` as JSON and [`load_from_dict`](Self::load_from_dict) it.
    /// A missing or unreadable file yields `None`.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Option<&E> {
        let path = path.as_ref();
        match read_json_file(path) {
            Ok(Some(raw)) => self.load_from_dict(&raw),
            Ok(None) => {
                debug!(entity = E::ENTITY, path = %path.display(), "file not found");
                None
            }
            Err(err) => {
                warn!(entity = E::ENTITY, error = %err, "could not load file");
                None
            }
        }
    }
}

/// Read a JSON document from disk. `Ok(None)` when the file does not exist.
pub fn read_json_file(path: &Path) -> Result<Option<Value>, RegistryError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(RegistryError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| RegistryError::Parse {
            what: path.display().to_string(),
            source,
        })
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;

    #[test]
    fn register_and_get() {
        let mut reg = OntologyRegistry::new();
        let o = testing::code_structure_ontology();
        let id = o.ontology_id.clone();
        reg.register(o);
        assert!(reg.has_id(&id));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.list_ids(), vec![id.clone()]);
        let by_ref = reg.get_by_ref(&OntologyRef::new("code_structure").unwrap()).unwrap();
        assert_eq!(by_ref.ontology_id, id);
    }

    #[test]
    fn register_replaces_same_id() {
        let mut reg = OntologyRegistry::new();
        let o = testing::code_structure_ontology();
        let mut renamed = o.clone();
        renamed.ontology_ref = OntologyRef::new("renamed").unwrap();
        reg.register(o);
        reg.register(renamed);
        assert_eq!(reg.len(), 1);
        assert!(!reg.has_ref(&OntologyRef::new("code_structure").unwrap()));
        assert!(reg.has_ref(&OntologyRef::new("renamed").unwrap()));
        assert_eq!(reg.list_refs(), vec![OntologyRef::new("renamed").unwrap()]);
    }

    #[test]
    fn renaming_falls_back_to_other_holder_of_ref() {
        let mut reg = OntologyRegistry::new();
        let first = testing::code_structure_ontology();
        let first_id = first.ontology_id.clone();
        let mut second = first.clone();
        second.ontology_id = OntologyId::from_seed("test:ontology:second");
        let mut renamed = second.clone();
        renamed.ontology_ref = OntologyRef::new("renamed").unwrap();

        reg.register(first);
        reg.register(second);
        reg.register(renamed);

        let shared = OntologyRef::new("code_structure").unwrap();
        assert_eq!(reg.get_by_ref(&shared).map(|o| &o.ontology_id), Some(&first_id));
        assert_eq!(
            reg.get_by_ref(&OntologyRef::new("renamed").unwrap()).map(|o| o.ontology_id.as_str()),
            Some(OntologyId::from_seed("test:ontology:second").as_str())
        );
    }

    #[test]
    fn load_from_dict_caches_entity() {
        let mut reg = TaxonomyRegistry::new();
        let raw = testing::code_elements_taxonomy().to_json().unwrap();
        let loaded = reg.load_from_dict(&raw).unwrap().taxonomy_id.clone();
        assert_eq!(reg.get(&loaded).unwrap().categories.len(), 4);
    }

    #[test]
    fn load_from_dict_returns_none_for_empty_or_bad_input() {
        let mut reg = RuleEngine::new();
        assert!(reg.load_from_dict(&json!({})).is_none());
        assert!(reg.load_from_dict(&json!(null)).is_none());
        assert!(reg.load_from_dict(&json!([1, 2])).is_none());
        assert!(reg.load_from_dict(&json!({"rule_set_id": "nope"})).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn load_from_file_handles_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = RuleEngine::new();
        assert!(reg.load_from_file(dir.path().join("absent.json")).is_none());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(reg.load_from_file(&bad).is_none());

        let good = dir.path().join("rules.json");
        let raw = testing::code_structure_rule_set().to_json().unwrap();
        std::fs::write(&good, serde_json::to_string_pretty(&raw).unwrap()).unwrap();
        assert!(reg.load_from_file(&good).is_some());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn read_json_file_distinguishes_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_json_file(&dir.path().join("absent.json")).unwrap().is_none());
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[").unwrap();
        assert!(matches!(read_json_file(&bad), Err(RegistryError::Parse { .. })));
    }

    #[test]
    fn factories_assign_ids() {
        let mut reg = OntologyRegistry::new();
        let template = testing::code_structure_ontology();

        let seed = IdSeed::new("kb:ontology").unwrap();
        let o = reg.create_with_deterministic_id(template.clone(), &seed);
        assert_eq!(o.ontology_id.as_str(), "d7eff75c");
        assert_eq!(o.ontology_id_source.as_ref().unwrap().seed.as_ref(), Some(&seed));

        let explicit = OntologyId::new("0badcafe").unwrap();
        let o = reg.create_with_explicit_id(template.clone(), explicit.clone());
        assert_eq!(o.ontology_id, explicit);
        assert!(o.ontology_id_source.is_none());

        let o = reg.create_with_random_id(template);
        assert_eq!(
            o.ontology_id_source.as_ref().map(|s| s.source_type),
            Some(crate::primitives::IdSourceType::Random)
        );
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn clear_empties_both_indexes() {
        let mut reg = OntologyRegistry::new();
        reg.register(testing::code_structure_ontology());
        reg.clear();
        assert!(reg.is_empty());
        assert!(!reg.has_ref(&OntologyRef::new("code_structure").unwrap()));
    }
}
