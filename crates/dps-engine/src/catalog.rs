//! Skill-code catalog (spec §6): a read-only JSON document used only for
//! actor-class inference. Loading it is optional — an engine with no
//! catalog configured simply never resolves a class for any actor.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use dps_common::CatalogError;
use serde::{Serialize, Serializer};

use crate::types::SkillCode;

/// One class recognized at a specific skill origin (spec §6 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorClass {
    Gladiator,
    Templar,
    Assassin,
    Ranger,
    Sorcerer,
    Elementalist,
    Cleric,
    Chanter,
}

impl ActorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorClass::Gladiator => "GLADIATOR",
            ActorClass::Templar => "TEMPLAR",
            ActorClass::Assassin => "ASSASSIN",
            ActorClass::Ranger => "RANGER",
            ActorClass::Sorcerer => "SORCERER",
            ActorClass::Elementalist => "ELEMENTALIST",
            ActorClass::Cleric => "CLERIC",
            ActorClass::Chanter => "CHANTER",
        }
    }
}

impl Serialize for ActorClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

const ORIGIN_TABLE: [(SkillCode, ActorClass); 8] = [
    (11_020_000, ActorClass::Gladiator),
    (12_010_000, ActorClass::Templar),
    (13_010_000, ActorClass::Assassin),
    (14_340_000, ActorClass::Ranger),
    (15_210_000, ActorClass::Sorcerer),
    (16_010_000, ActorClass::Elementalist),
    (17_010_000, ActorClass::Cleric),
    (18_010_000, ActorClass::Chanter),
];

/// Raw shape of the on-disk catalog document (spec §6 / SPEC_FULL.md §4.8):
/// a flat map of `"<skill_code>": {"name": "..."}}`, no wrapper key. Parsed
/// only to validate the document's shape; actor-class inference never
/// consults it (the fixed origin table above is the entire lookup).
type CatalogDocument = HashMap<String, serde_json::Value>;

/// The catalog document is metadata the engine does not otherwise need;
/// class inference depends only on the fixed origin table above, so there
/// is nothing to hold onto after a successful load.
pub struct Catalog;

impl Catalog {
    /// A catalog with no document loaded. Actor-class inference still works
    /// (it depends only on the fixed origin table), since loading a catalog
    /// file never changes how classes are resolved.
    pub fn empty() -> Catalog {
        Catalog
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let _doc: CatalogDocument = serde_json::from_str(&raw)?;
        Ok(Catalog)
    }

    /// Infers the actor class for an already-zeroed origin code (spec §6).
    pub fn class_for_origin(&self, origin_code: SkillCode) -> Option<ActorClass> {
        ORIGIN_TABLE
            .iter()
            .find(|&&(code, _)| code == origin_code)
            .map(|&(_, class)| class)
    }
}
