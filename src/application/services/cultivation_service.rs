//! Cultivation state machine - qi accumulation, breakthroughs, tribulation
//! signals and destiny-path offers
//!
//! States are `(realm_index, stage_index)` pairs ordered by the configured
//! ladder; transitions are strictly forward. Tribulations are narrated by
//! the caller; this service only raises the signal.

use tracing::info;

use crate::domain::aggregates::GameState;
use crate::domain::entities::{BonusDirection, StoryEntry};
use crate::domain::value_objects::RealmStage;

/// What a breakthrough did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakthroughOutcome {
    /// Moved to the next stage within the same realm
    AdvancedStage { realm: String, stage: String },
    /// Crossed into the first stage of the next realm
    EnteredRealm {
        realm: String,
        stage: String,
        /// The caller should trigger tribulation narration
        tribulation: bool,
        /// Destiny path ids newly surfaced for an explicit choice
        pending_destiny_paths: Vec<String>,
    },
    /// Already at the last stage of the last realm; nothing changed
    PeakOfThisWorld,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CultivationError {
    /// Breakthrough precondition unmet; the UI renders this as a disabled
    /// action, not a failure dialog
    #[error("insufficient spiritual qi: {have}/{required}")]
    InsufficientQi { have: u64, required: u64 },

    /// The configured ladder does not contain the current state
    #[error("cultivation state ({realm_index},{stage_index}) is outside the configured ladder")]
    InvalidState { realm_index: usize, stage_index: usize },

    #[error("unknown destiny path: {0}")]
    UnknownDestinyPath(String),

    #[error("destiny path not currently offered: {0}")]
    PathNotOffered(String),
}

/// Service owning realm/stage progression
#[derive(Debug, Default)]
pub struct CultivationService;

impl CultivationService {
    pub fn new() -> Self {
        Self
    }

    /// The stage the player currently occupies
    pub fn current_stage<'a>(&self, state: &'a GameState) -> Result<&'a RealmStage, CultivationError> {
        let cultivation = &state.player.cultivation;
        state
            .realm_config
            .stage(cultivation.realm_index, cultivation.stage_index)
            .ok_or(CultivationError::InvalidState {
                realm_index: cultivation.realm_index,
                stage_index: cultivation.stage_index,
            })
    }

    /// Accumulate qi, clamped at the current stage requirement so the
    /// invariant `qi <= qi_required` holds before any breakthrough
    pub fn add_qi(&self, state: &mut GameState, amount: u64) -> Result<u64, CultivationError> {
        let required = self.current_stage(state)?.qi_required;
        let cultivation = &mut state.player.cultivation;
        cultivation.spiritual_qi = cultivation.spiritual_qi.saturating_add(amount).min(required);
        Ok(cultivation.spiritual_qi)
    }

    /// Breakthrough precondition, for enabling/disabling the UI action
    pub fn can_break_through(&self, state: &GameState) -> bool {
        self.current_stage(state)
            .map(|stage| state.player.cultivation.spiritual_qi >= stage.qi_required)
            .unwrap_or(false)
    }

    /// Attempt a breakthrough.
    ///
    /// Within a realm: advance one stage, reset qi to 0, apply the new
    /// stage's bonuses. At a realm's last stage: enter the next realm's
    /// first stage, signalling tribulation and surfacing unchosen destiny
    /// paths gated on it. At the very top of the ladder: no-op.
    pub fn break_through(&self, state: &mut GameState) -> Result<BreakthroughOutcome, CultivationError> {
        let stage = self.current_stage(state)?;
        let required = stage.qi_required;
        let have = state.player.cultivation.spiritual_qi;
        if have < required {
            return Err(CultivationError::InsufficientQi { have, required });
        }

        let realm_index = state.player.cultivation.realm_index;
        let stage_index = state.player.cultivation.stage_index;
        let realm = state
            .realm_config
            .realm(realm_index)
            .ok_or(CultivationError::InvalidState { realm_index, stage_index })?;

        if stage_index + 1 < realm.stages.len() {
            let next = realm.stages[stage_index + 1].clone();
            let realm_name = realm.name.clone();
            state.player.cultivation.stage_index += 1;
            state.player.cultivation.spiritual_qi = 0;
            state.player.apply_bonuses(&next.bonuses, BonusDirection::Apply);
            state.push_entry(StoryEntry::system(format!(
                "Đột phá thành công: {} - {}",
                realm_name, next.name
            )));
            info!(realm = %realm_name, stage = %next.name, "stage breakthrough");
            return Ok(BreakthroughOutcome::AdvancedStage {
                realm: realm_name,
                stage: next.name,
            });
        }

        let Some(next_realm) = state.realm_config.realm(realm_index + 1).cloned() else {
            // Peak of this world: the breakthrough is a no-op.
            return Ok(BreakthroughOutcome::PeakOfThisWorld);
        };
        // A realm without stages is a broken ladder, not a panic.
        let first_stage = next_realm
            .stages
            .first()
            .cloned()
            .ok_or(CultivationError::InvalidState {
                realm_index: realm_index + 1,
                stage_index: 0,
            })?;

        state.player.cultivation.realm_index += 1;
        state.player.cultivation.stage_index = 0;
        state.player.cultivation.spiritual_qi = 0;
        state
            .player
            .apply_bonuses(&first_stage.bonuses, BonusDirection::Apply);
        state.push_entry(StoryEntry::system(format!(
            "Tiến nhập cảnh giới mới: {} - {}",
            next_realm.name, first_stage.name
        )));

        let pending: Vec<String> = state
            .destiny_paths
            .iter()
            .filter(|path| path.required_realm == next_realm.id)
            .filter(|path| !state.player.chosen_destiny_paths.contains(&path.id))
            .map(|path| path.id.clone())
            .collect();
        for id in &pending {
            if !state.pending_destiny_choice.contains(id) {
                state.pending_destiny_choice.push(id.clone());
            }
        }

        info!(realm = %next_realm.name, tribulation = next_realm.has_tribulation, "realm breakthrough");
        Ok(BreakthroughOutcome::EnteredRealm {
            realm: next_realm.name,
            stage: first_stage.name,
            tribulation: next_realm.has_tribulation,
            pending_destiny_paths: pending,
        })
    }

    /// Apply a destiny path the player explicitly picked from the pending
    /// offer. Bonuses apply exactly once.
    pub fn choose_destiny_path(&self, state: &mut GameState, path_id: &str) -> Result<(), CultivationError> {
        let offered = state.pending_destiny_choice.iter().any(|id| id == path_id);
        if !offered {
            return Err(CultivationError::PathNotOffered(path_id.to_string()));
        }
        let path = state
            .destiny_paths
            .iter()
            .find(|p| p.id == path_id)
            .cloned()
            .ok_or_else(|| CultivationError::UnknownDestinyPath(path_id.to_string()))?;

        state.pending_destiny_choice.retain(|id| id != path_id);
        state.player.chosen_destiny_paths.push(path.id.clone());
        state.player.apply_bonuses(&path.bonuses, BonusDirection::Apply);
        state.push_entry(StoryEntry::system(format!("Đã chọn cơ duyên: {}", path.name)));
        Ok(())
    }
}
