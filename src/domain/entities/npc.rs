//! NPC entity - characters the player is not

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{LocationId, NpcId};

/// A non-player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    pub name: String,
    pub description: String,
    pub location_id: LocationId,
    /// Canon NPCs come from lore config and never wander; dynamically
    /// created ones do
    pub is_canon: bool,
    /// Standing toward other characters, keyed by name
    #[serde(default)]
    pub relationships: BTreeMap<String, i32>,
}

impl Npc {
    pub fn new(name: impl Into<String>, location_id: LocationId) -> Self {
        Self {
            id: NpcId::new(),
            name: name.into(),
            description: String::new(),
            location_id,
            is_canon: false,
            relationships: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark as a lore-defined, immovable NPC
    pub fn canon(mut self) -> Self {
        self.is_canon = true;
        self
    }
}
