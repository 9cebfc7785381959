//! Domain layer - Core game rules with no external collaborators
//!
//! This layer contains:
//! - Entities: PlayerCharacter, Npc, Location, StoryEntry
//! - Value Objects: calendar, realm ladder, relationship tiers, command tags
//! - Aggregates: the GameState root

pub mod aggregates;
pub mod entities;
pub mod value_objects;
