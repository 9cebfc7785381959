//! GameState - the single root aggregate
//!
//! Created once at game start, mutated only through the operations on this
//! type and the application services, discarded when the player exits to the
//! main menu. The whole tree serializes to JSON so the persistence
//! collaborator can snapshot it after each completed turn.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Location, Npc, PlayerCharacter, StoryEntry};
use crate::domain::value_objects::{
    DestinyPath, GameDate, LocationId, RealmConfig, StoryEntryId,
};

/// Why the game ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameOverReason {
    /// A DEATH tag fired
    Death { reason: Option<String> },
    /// Age exceeded the lifespan attribute
    OldAge,
}

/// A shop offer staged by a SHOW_SHOP tag for the external UI to render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopOffer {
    pub shop_name: Option<String>,
    pub items: Vec<ShopItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItem {
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
}

/// The root aggregate for one playthrough
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub date: GameDate,
    pub player: PlayerCharacter,
    pub npcs: Vec<Npc>,
    /// The discovered location set; keys are exactly the known ids
    pub locations: BTreeMap<LocationId, Location>,
    pub current_location_id: LocationId,
    pub story_log: Vec<StoryEntry>,
    pub rumors: Vec<String>,
    pub pending_shop: Option<ShopOffer>,
    pub realm_config: RealmConfig,
    pub destiny_paths: Vec<DestinyPath>,
    /// Destiny path ids unlocked by a breakthrough and awaiting an explicit
    /// choice
    pub pending_destiny_choice: Vec<String>,
    pub game_over: Option<GameOverReason>,
}

impl GameState {
    /// Start a new playthrough at the given location
    pub fn new(player: PlayerCharacter, start: Location, date: GameDate) -> Self {
        let current_location_id = start.id.clone();
        let mut locations = BTreeMap::new();
        locations.insert(start.id.clone(), start);

        Self {
            date,
            player,
            npcs: Vec::new(),
            locations,
            current_location_id,
            story_log: Vec::new(),
            rumors: Vec::new(),
            pending_shop: None,
            realm_config: RealmConfig::standard(),
            destiny_paths: Vec::new(),
            pending_destiny_choice: Vec::new(),
            game_over: None,
        }
    }

    pub fn with_realm_config(mut self, config: RealmConfig) -> Self {
        self.realm_config = config;
        self
    }

    pub fn with_destiny_paths(mut self, paths: Vec<DestinyPath>) -> Self {
        self.destiny_paths = paths;
        self
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    // ========================================================================
    // Story log
    // ========================================================================

    pub fn push_entry(&mut self, entry: StoryEntry) -> StoryEntryId {
        let id = entry.id;
        self.story_log.push(entry);
        id
    }

    pub fn entry_mut(&mut self, id: StoryEntryId) -> Option<&mut StoryEntry> {
        self.story_log.iter_mut().find(|e| e.id == id)
    }

    /// Remove an entry (used to retract streaming placeholders)
    pub fn remove_entry(&mut self, id: StoryEntryId) -> Option<StoryEntry> {
        let pos = self.story_log.iter().position(|e| e.id == id)?;
        Some(self.story_log.remove(pos))
    }

    // ========================================================================
    // NPCs
    // ========================================================================

    pub fn find_npc(&self, name: &str) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.name == name)
    }

    pub fn find_npc_mut(&mut self, name: &str) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|n| n.name == name)
    }

    /// Add an NPC unless one with the same name already exists
    pub fn add_npc(&mut self, npc: Npc) -> bool {
        if self.find_npc(&npc.name).is_some() {
            return false;
        }
        self.npcs.push(npc);
        true
    }

    // ========================================================================
    // Location graph
    // ========================================================================

    pub fn location(&self, id: &LocationId) -> Option<&Location> {
        self.locations.get(id)
    }

    pub fn current_location(&self) -> Option<&Location> {
        self.locations.get(&self.current_location_id)
    }

    /// Insert a newly discovered location and link it bidirectionally with
    /// the origin. No-op (returns false) when the id is already known.
    pub fn discover_location(&mut self, mut location: Location, from: &LocationId) -> bool {
        if self.locations.contains_key(&location.id) {
            return false;
        }
        location.add_neighbor(from.clone());
        let new_id = location.id.clone();
        self.locations.insert(new_id.clone(), location);
        if let Some(origin) = self.locations.get_mut(from) {
            origin.add_neighbor(new_id);
        }
        true
    }
}
