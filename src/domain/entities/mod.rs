//! Domain entities - objects with identity and a lifecycle

mod character;
mod location;
mod npc;
mod story_entry;

pub use character::{
    Attribute, AttributeGroup, AttributeValue, BonusDirection, CultivationState, EquipmentSlot,
    EquippedItem, InventoryItem, PlayerCharacter, Recipe, Technique, ATTR_AGE, ATTR_LIFESPAN,
};
pub use location::Location;
pub use npc::Npc;
pub use story_entry::{StoryEntry, StoryEntryKind};
