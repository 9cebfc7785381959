//! Story log entries - the append-only narrative transcript

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::StoryEntryId;

/// Who or what produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoryEntryKind {
    /// The player's own action text
    Player,
    /// Generated narrative; may temporarily hold a streaming, tag-laden
    /// buffer before finalization strips the tags
    Narrative,
    /// Engine-produced notes (attribute changes, breakthroughs, ...)
    System,
    /// Generator/network failures surfaced to the player
    Error,
}

/// One item in the story log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryEntry {
    pub id: StoryEntryId,
    pub kind: StoryEntryKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl StoryEntry {
    pub fn new(kind: StoryEntryKind, content: impl Into<String>) -> Self {
        Self {
            id: StoryEntryId::new(),
            kind,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn player(content: impl Into<String>) -> Self {
        Self::new(StoryEntryKind::Player, content)
    }

    pub fn narrative(content: impl Into<String>) -> Self {
        Self::new(StoryEntryKind::Narrative, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(StoryEntryKind::System, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(StoryEntryKind::Error, content)
    }
}
