//! Strongly-typed identifiers, refs, and constrained strings.
//!
//! Every value that crosses the schema boundary is wrapped in a newtype so
//! that a [`CategoryId`] can never be handed to something expecting a
//! [`NodeTypeId`], even though both are eight hex characters underneath.
//!
//! | Family | Types | Shape |
//! |--------|-------|-------|
//! | Object id | [`ObjId`] | `^[0-9a-f]{8}$`, random or seeded |
//! | Kinded ids | [`NodeId`], [`EdgeId`], [`GraphId`], [`NodeTypeId`], … | an [`ObjId`] with a nominal kind |
//! | Refs | [`CategoryRef`], [`NodeTypeRef`], [`PredicateRef`], … | `[a-zA-Z0-9_\-.]*`, ≤ 128 chars |
//! | Text | [`SafeStrId`], [`SafeStrText`], [`SafeStrVersion`], [`IdSeed`] | display names, free text, versions, seeds |
//! | Numbers | [`SafeUInt`] | non-negative integer |
//!
//! All string primitives trim surrounding whitespace and serialise as plain
//! JSON strings.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors returned when a primitive rejects its input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("invalid {kind}: {value:?} ({reason})")]
    InvalidPrimitive {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{kind} must be at most {max} characters, got {len}")]
    TooLong {
        kind: &'static str,
        max: usize,
        len: usize,
    },
}

/// The shared surface of every string-backed primitive.
///
/// Typed containers rely on this to turn map keys into canonical strings and
/// back again.
pub trait Primitive: Sized + Clone + Eq + Hash + fmt::Debug + fmt::Display {
    /// Short name of the primitive, used in error messages (e.g. `"node_id"`).
    const KIND: &'static str;

    fn parse(raw: &str) -> Result<Self, PrimitiveError>;

    fn as_str(&self) -> &str;
}

// --- object ids --------------------------------------------------------------

/// `^[0-9a-f]{8}$`
static OBJ_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{8}$").expect("invalid obj_id regex"));

/// `^[a-zA-Z0-9_\-.]*$`
static REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-.]*$").expect("invalid ref regex"));

/// `^[a-zA-Z0-9_\-.:/]*$`
static SEED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-.:/]*$").expect("invalid seed regex"));

/// `^[0-9A-Za-z.\-+]*$`
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z.\-+]*$").expect("invalid version regex"));

/// An opaque eight-hex-character identifier.
///
/// Two constructors:
/// - [`ObjId::random`] draws a fresh random id.
/// - [`ObjId::from_seed`] hashes a seed string with SHA-256 and keeps the
///   first four bytes, so the same seed yields the same id in every process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(String);

impl ObjId {
    pub const LEN: usize = 8;

    /// Parse an existing id. Surrounding whitespace is ignored.
    pub fn new(raw: &str) -> Result<Self, PrimitiveError> {
        let value = raw.trim();
        if !OBJ_ID_RE.is_match(value) {
            return Err(PrimitiveError::InvalidPrimitive {
                kind: "obj_id",
                value: value.to_string(),
                reason: "expected 8 lowercase hex characters",
            });
        }
        Ok(Self(value.to_string()))
    }

    /// A fresh random id.
    pub fn random() -> Self {
        let n: u32 = rand::thread_rng().gen();
        Self(format!("{n:08x}"))
    }

    /// A deterministic id derived from `seed`.
    pub fn from_seed(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        Self(hex::encode(&digest[..Self::LEN / 2]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A kinded id reduced to `(kind, value)`.
///
/// Kinded ids cannot be compared across kinds at compile time; erasing them
/// is the only way to put two kinds side by side, and erased ids of
/// different kinds never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErasedId {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ErasedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// An [`ObjId`] carrying a nominal kind.
pub trait KindedId: Primitive {
    fn from_obj_id(id: ObjId) -> Self;

    fn obj_id(&self) -> &ObjId;

    fn random() -> Self {
        Self::from_obj_id(ObjId::random())
    }

    fn from_seed(seed: &str) -> Self {
        Self::from_obj_id(ObjId::from_seed(seed))
    }

    fn erased(&self) -> ErasedId {
        ErasedId {
            kind: Self::KIND,
            value: self.as_str().to_string(),
        }
    }
}

/// How an id was minted. Attached to entities so tools can reproduce ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdSourceType {
    Random,
    Deterministic,
}

/// Provenance of an id: random, or deterministic from a recorded seed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdSource {
    pub source_type: IdSourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<IdSeed>,
}

impl IdSource {
    pub fn random() -> Self {
        Self {
            source_type: IdSourceType::Random,
            seed: None,
        }
    }

    pub fn deterministic(seed: IdSeed) -> Self {
        Self {
            source_type: IdSourceType::Deterministic,
            seed: Some(seed),
        }
    }
}

/// Mint an id of kind `I`.
///
/// With a seed the id is deterministic and the returned [`IdSource`] records
/// the seed; without one the id is random and no source is attached.
pub fn mint_id<I: KindedId>(seed: Option<&IdSeed>) -> (I, Option<IdSource>) {
    match seed {
        Some(seed) => (
            I::from_obj_id(ObjId::from_seed(seed.as_str())),
            Some(IdSource::deterministic(seed.clone())),
        ),
        None => (I::from_obj_id(ObjId::random()), None),
    }
}

// --- macros ------------------------------------------------------------------

/// Display, FromStr, AsRef, TryFrom and string serde for a [`Primitive`].
macro_rules! primitive_traits {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(Primitive::as_str(self))
            }
        }

        impl FromStr for $name {
            type Err = PrimitiveError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as Primitive>::parse(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = PrimitiveError;
            fn try_from(s: &str) -> Result<Self, Self::Error> {
                <$name as Primitive>::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                Primitive::as_str(self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(Primitive::as_str(self))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                <$name as Primitive>::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

macro_rules! kinded_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(ObjId);

        impl $name {
            pub fn new(raw: &str) -> Result<Self, PrimitiveError> {
                ObjId::new(raw).map(Self).map_err(|e| rekind(e, $kind))
            }

            pub fn random() -> Self {
                Self(ObjId::random())
            }

            pub fn from_seed(seed: &str) -> Self {
                Self(ObjId::from_seed(seed))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl Primitive for $name {
            const KIND: &'static str = $kind;
            fn parse(raw: &str) -> Result<Self, PrimitiveError> {
                Self::new(raw)
            }
            fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl KindedId for $name {
            fn from_obj_id(id: ObjId) -> Self {
                Self(id)
            }
            fn obj_id(&self) -> &ObjId {
                &self.0
            }
        }

        impl From<ObjId> for $name {
            fn from(id: ObjId) -> Self {
                Self(id)
            }
        }

        primitive_traits!($name);
    };
}

macro_rules! pattern_str {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $re:ident, $max:expr, $reason:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(String);

        impl $name {
            pub const MAX_LEN: usize = $max;

            pub fn new(raw: impl AsRef<str>) -> Result<Self, PrimitiveError> {
                let value = raw.as_ref().trim();
                check_len($kind, value, Self::MAX_LEN)?;
                if !$re.is_match(value) {
                    return Err(PrimitiveError::InvalidPrimitive {
                        kind: $kind,
                        value: value.to_string(),
                        reason: $reason,
                    });
                }
                Ok(Self(value.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Primitive for $name {
            const KIND: &'static str = $kind;
            fn parse(raw: &str) -> Result<Self, PrimitiveError> {
                Self::new(raw)
            }
            fn as_str(&self) -> &str {
                &self.0
            }
        }

        primitive_traits!($name);
    };
}

fn rekind(err: PrimitiveError, kind: &'static str) -> PrimitiveError {
    match err {
        PrimitiveError::InvalidPrimitive { value, reason, .. } => {
            PrimitiveError::InvalidPrimitive { kind, value, reason }
        }
        PrimitiveError::TooLong { max, len, .. } => PrimitiveError::TooLong { kind, max, len },
    }
}

fn check_len(kind: &'static str, value: &str, max: usize) -> Result<(), PrimitiveError> {
    let len = value.chars().count();
    if len > max {
        return Err(PrimitiveError::TooLong { kind, max, len });
    }
    Ok(())
}

impl Primitive for ObjId {
    const KIND: &'static str = "obj_id";
    fn parse(raw: &str) -> Result<Self, PrimitiveError> {
        Self::new(raw)
    }
    fn as_str(&self) -> &str {
        &self.0
    }
}

primitive_traits!(ObjId);

// --- kinded ids --------------------------------------------------------------

kinded_id!(
    /// Identifies a [`SemanticGraph`](crate::types::SemanticGraph).
    GraphId, "graph_id"
);
kinded_id!(
    /// Identifies a node inside a graph.
    NodeId, "node_id"
);
kinded_id!(
    /// Identifies an edge inside a graph.
    EdgeId, "edge_id"
);
kinded_id!(NodeTypeId, "node_type_id");
kinded_id!(PredicateId, "predicate_id");
kinded_id!(CategoryId, "category_id");
kinded_id!(TaxonomyId, "taxonomy_id");
kinded_id!(OntologyId, "ontology_id");
kinded_id!(RuleSetId, "rule_set_id");
kinded_id!(PropertyNameId, "property_name_id");
kinded_id!(PropertyTypeId, "property_type_id");

// --- refs --------------------------------------------------------------------

pattern_str!(
    /// Human-readable name of a taxonomy category (e.g. `"callable"`).
    CategoryRef, "category_ref", REF_RE, 128, "allowed characters are [a-zA-Z0-9_-.]"
);
pattern_str!(
    /// Human-readable name of a node type (e.g. `"method"`).
    NodeTypeRef, "node_type_ref", REF_RE, 128, "allowed characters are [a-zA-Z0-9_-.]"
);
pattern_str!(
    /// Human-readable name of a predicate (e.g. `"contains"`).
    PredicateRef, "predicate_ref", REF_RE, 128, "allowed characters are [a-zA-Z0-9_-.]"
);
pattern_str!(PropertyNameRef, "property_name_ref", REF_RE, 128, "allowed characters are [a-zA-Z0-9_-.]");
pattern_str!(PropertyTypeRef, "property_type_ref", REF_RE, 128, "allowed characters are [a-zA-Z0-9_-.]");
pattern_str!(OntologyRef, "ontology_ref", REF_RE, 128, "allowed characters are [a-zA-Z0-9_-.]");
pattern_str!(TaxonomyRef, "taxonomy_ref", REF_RE, 128, "allowed characters are [a-zA-Z0-9_-.]");
pattern_str!(RuleSetRef, "rule_set_ref", REF_RE, 128, "allowed characters are [a-zA-Z0-9_-.]");

// --- text --------------------------------------------------------------------

pattern_str!(
    /// Seed for a deterministic id (e.g. `"test:node:my_module"`).
    IdSeed, "id_seed", SEED_RE, 512, "allowed characters are [a-zA-Z0-9_-.:/]"
);
pattern_str!(
    /// A loose version label (`"1.0.0"`, `"2.1-beta"`).
    SafeStrVersion, "version", VERSION_RE, 64, "allowed characters are [0-9A-Za-z.-+]"
);

/// A display name used on graph nodes.
///
/// Unlike refs, names are sanitised rather than rejected: every character
/// outside `[a-zA-Z0-9_\-.]` becomes `_`, so `"Dr. Sarah Chen"` is stored as
/// `"Dr._Sarah_Chen"`. Only over-long input is an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SafeStrId(String);

impl SafeStrId {
    pub const MAX_LEN: usize = 128;

    pub fn new(raw: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let value = raw.as_ref().trim();
        check_len("safe_str_id", value, Self::MAX_LEN)?;
        let sanitised = value
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Ok(Self(sanitised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Primitive for SafeStrId {
    const KIND: &'static str = "safe_str_id";
    fn parse(raw: &str) -> Result<Self, PrimitiveError> {
        Self::new(raw)
    }
    fn as_str(&self) -> &str {
        &self.0
    }
}

primitive_traits!(SafeStrId);

/// Free text for descriptions and property values.
///
/// Up to 4096 characters; control characters other than newline, carriage
/// return and tab are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SafeStrText(String);

impl SafeStrText {
    pub const MAX_LEN: usize = 4096;

    pub fn new(raw: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let value = raw.as_ref().trim();
        check_len("text", value, Self::MAX_LEN)?;
        if value
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        {
            return Err(PrimitiveError::InvalidPrimitive {
                kind: "text",
                value: value.to_string(),
                reason: "control characters are not allowed",
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Primitive for SafeStrText {
    const KIND: &'static str = "text";
    fn parse(raw: &str) -> Result<Self, PrimitiveError> {
        Self::new(raw)
    }
    fn as_str(&self) -> &str {
        &self.0
    }
}

primitive_traits!(SafeStrText);

// --- numbers -----------------------------------------------------------------

/// A non-negative integer.
///
/// Serialises as a bare JSON number. Deserialisation rejects booleans,
/// negative numbers and floats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct SafeUInt(u64);

impl SafeUInt {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SafeUInt {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SafeUInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_seed_is_deterministic() {
        let a = ObjId::from_seed("test:node_type:module");
        let b = ObjId::from_seed("test:node_type:module");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "d84ade10");
        assert_eq!(ObjId::from_seed("test:predicate:contains").as_str(), "b8dbb70e");
    }

    #[test]
    fn different_seeds_give_different_ids() {
        assert_ne!(ObjId::from_seed("a"), ObjId::from_seed("b"));
    }

    #[test]
    fn random_ids_are_well_formed() {
        let id = ObjId::random();
        assert_eq!(id.as_str().len(), ObjId::LEN);
        assert!(ObjId::new(id.as_str()).is_ok());
    }

    #[test]
    fn obj_id_rejects_bad_shapes() {
        assert!(ObjId::new("a1234567").is_ok());
        assert!(ObjId::new("  a1234567 ").is_ok());
        assert!(ObjId::new("aaaa_bbb_cccc").is_err());
        assert!(ObjId::new("A1234567").is_err());
        assert!(ObjId::new("").is_err());
    }

    #[test]
    fn kinded_id_errors_name_their_kind() {
        let err = NodeId::new("not-an-id").unwrap_err();
        assert!(matches!(err, PrimitiveError::InvalidPrimitive { kind: "node_id", .. }));
    }

    #[test]
    fn kinds_never_compare_equal_when_erased() {
        let cat = CategoryId::new("a1234567").unwrap();
        let nt = NodeTypeId::new("a1234567").unwrap();
        assert_eq!(cat.as_str(), nt.as_str());
        assert_ne!(cat.erased(), nt.erased());
        assert_eq!(cat.erased(), CategoryId::new("a1234567").unwrap().erased());
    }

    #[test]
    fn mint_with_seed_records_source() {
        let seed = IdSeed::new("test:node:my_module").unwrap();
        let (id, source): (NodeId, _) = mint_id(Some(&seed));
        assert_eq!(id, NodeId::from_seed("test:node:my_module"));
        let source = source.unwrap();
        assert_eq!(source.source_type, IdSourceType::Deterministic);
        assert_eq!(source.seed, Some(seed));
    }

    #[test]
    fn mint_without_seed_has_no_source() {
        let (_, source): (EdgeId, _) = mint_id(None);
        assert!(source.is_none());
    }

    #[test]
    fn refs_trim_and_validate() {
        assert_eq!(NodeTypeRef::new("  method ").unwrap().as_str(), "method");
        assert!(NodeTypeRef::new("has space").is_err());
        assert!(PredicateRef::new("is-a.v2").is_ok());
        assert!(CategoryRef::new("").unwrap().is_empty());
        let long = "x".repeat(129);
        assert!(matches!(
            OntologyRef::new(&long),
            Err(PrimitiveError::TooLong { max: 128, len: 129, .. })
        ));
    }

    #[test]
    fn safe_str_id_sanitises() {
        assert_eq!(SafeStrId::new("Dr. Sarah Chen").unwrap().as_str(), "Dr._Sarah_Chen");
        assert_eq!(SafeStrId::new("Machine Learning").unwrap().as_str(), "Machine_Learning");
        assert!(SafeStrId::new("x".repeat(200)).is_err());
    }

    #[test]
    fn seeds_allow_colons() {
        assert!(IdSeed::new("kb:node:topic_ml").is_ok());
        assert!(IdSeed::new("bad seed").is_err());
    }

    #[test]
    fn text_rejects_control_characters() {
        assert!(SafeStrText::new("line one\nline two").is_ok());
        assert!(SafeStrText::new("bell\u{7}").is_err());
    }

    #[test]
    fn serde_uses_plain_strings() {
        let id = PredicateId::from_seed("test:predicate:in");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_str()));
        let back: PredicateId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<PredicateId>("\"nope\"").is_err());
    }

    #[test]
    fn safe_uint_rejects_bool_and_negative() {
        assert_eq!(serde_json::from_str::<SafeUInt>("3").unwrap(), SafeUInt::new(3));
        assert!(serde_json::from_str::<SafeUInt>("true").is_err());
        assert!(serde_json::from_str::<SafeUInt>("-1").is_err());
        assert!(serde_json::from_str::<SafeUInt>("1.5").is_err());
    }

    #[test]
    fn id_source_serialises_lowercase() {
        let source = IdSource::deterministic(IdSeed::new("s").unwrap());
        assert_eq!(
            serde_json::to_value(&source).unwrap(),
            serde_json::json!({"source_type": "deterministic", "seed": "s"})
        );
        let random: IdSource = serde_json::from_str(r#"{"source_type":"random"}"#).unwrap();
        assert_eq!(random, IdSource::random());
    }
}
