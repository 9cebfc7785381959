//! Relationship tracking between the player and NPCs
//!
//! The value is a bounded score in `[-100, 100]`; the status tier is always
//! re-derived from the value, never stored independently.

use serde::{Deserialize, Serialize};

pub const RELATIONSHIP_MIN: i32 = -100;
pub const RELATIONSHIP_MAX: i32 = 100;

/// Status tier derived from the relationship value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipStatus {
    ThuDich,
    LanhNhat,
    TrungLap,
    ThanThien,
    TriKy,
}

impl RelationshipStatus {
    /// Fixed thresholds: `<= -50` hostile, `< 0` cold, `0` neutral,
    /// `> 0` friendly, `>= 50` bosom friend.
    pub fn from_value(value: i32) -> Self {
        if value <= -50 {
            RelationshipStatus::ThuDich
        } else if value < 0 {
            RelationshipStatus::LanhNhat
        } else if value == 0 {
            RelationshipStatus::TrungLap
        } else if value >= 50 {
            RelationshipStatus::TriKy
        } else {
            RelationshipStatus::ThanThien
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RelationshipStatus::ThuDich => "Thù địch",
            RelationshipStatus::LanhNhat => "Lạnh nhạt",
            RelationshipStatus::TrungLap => "Trung lập",
            RelationshipStatus::ThanThien => "Thân thiện",
            RelationshipStatus::TriKy => "Tri kỷ",
        }
    }
}

/// The player's standing with one NPC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub value: i32,
    pub status: RelationshipStatus,
}

impl Default for Relationship {
    fn default() -> Self {
        Self {
            value: 0,
            status: RelationshipStatus::TrungLap,
        }
    }
}

impl Relationship {
    /// Apply an additive delta, clamping to the bounds and re-deriving the
    /// status tier.
    pub fn apply_delta(&mut self, delta: i32) {
        self.value = (self.value + delta).clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX);
        self.status = RelationshipStatus::from_value(self.value);
    }
}
