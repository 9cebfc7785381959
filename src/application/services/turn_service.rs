//! Turn service - orchestrates one player turn around the asynchronous,
//! chunked narrative source
//!
//! The streaming state machine is `Idle → Streaming → Finalizing → {Done,
//! Error}`. While streaming, the raw buffer (partial tags included) is
//! mirrored into a placeholder story entry for live display; tags are only
//! interpreted once, on the complete buffer, because a payload may be split
//! across chunk boundaries and re-running the interpreter per chunk would
//! double-apply commands. Only one turn may be in flight; a second attempt
//! is rejected rather than queued.

use rand::Rng;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use futures_util::StreamExt;

use crate::application::ports::outbound::{NarrativePort, NarrativeRequest};
use crate::application::services::npc_simulator;
use crate::application::services::tag_interpreter::{StateChange, TagInterpreter};
use crate::domain::aggregates::{GameOverReason, GameState};
use crate::domain::entities::{StoryEntry, ATTR_AGE, ATTR_LIFESPAN};
use crate::domain::value_objects::StoryEntryId;

/// How many story entries are replayed to the generator as context
const HISTORY_WINDOW: usize = 8;

/// Streaming lifecycle, surfaced through [`TurnEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Streaming,
    Finalizing,
    Done,
    Error,
}

/// A player action with its time and action-point costs
#[derive(Debug, Clone)]
pub struct PlayerAction {
    pub text: String,
    /// Shichen consumed by the action (travel takes several)
    pub shichen_cost: u32,
    pub ap_cost: u32,
}

impl PlayerAction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            shichen_cost: 1,
            ap_cost: 1,
        }
    }

    pub fn with_shichen_cost(mut self, cost: u32) -> Self {
        self.shichen_cost = cost;
        self
    }

    pub fn with_ap_cost(mut self, cost: u32) -> Self {
        self.ap_cost = cost;
        self
    }
}

/// Rejections raised before a turn starts; rendered as disabled inputs
#[derive(Debug, Clone, thiserror::Error)]
pub enum TurnError {
    #[error("a narrative response is already pending")]
    TurnInFlight,

    #[error("the game is over; only returning to the main menu remains")]
    GameOver,

    #[error("not enough action points: {have}/{need}")]
    NotEnoughActionPoints { have: u32, need: u32 },
}

/// How a started turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnStatus {
    /// Stream finished; tags were applied exactly once
    Completed { changes: Vec<StateChange> },
    /// Generator or stream failure; no command mutation was applied
    Failed { message: String },
    /// The player cancelled mid-stream; no command mutation was applied
    Cancelled,
    /// A year rolled over and age exceeded the lifespan attribute
    DiedOfOldAge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub status: TurnStatus,
    pub month_passed: bool,
    pub year_passed: bool,
}

/// Progress notifications for the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    PhaseChanged(TurnPhase),
    /// The streaming placeholder grew; `len` is the buffer size in bytes
    Fragment { entry: StoryEntryId, len: usize },
}

/// Create the cancellation pair for [`TurnService::run_turn`]. Send `true`
/// to abort the in-flight stream.
pub fn cancellation() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Coordinates calendar, simulator, generator and interpreter for one turn
pub struct TurnService<N: NarrativePort> {
    generator: N,
    interpreter: TagInterpreter,
    in_flight: bool,
    events: Option<mpsc::UnboundedSender<TurnEvent>>,
}

impl<N: NarrativePort> TurnService<N> {
    pub fn new(generator: N) -> Self {
        Self {
            generator,
            interpreter: TagInterpreter::new(),
            in_flight: false,
            events: None,
        }
    }

    /// Attach a progress listener (replacing any previous one)
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<TurnEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    fn emit(&self, event: TurnEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    /// Run one player turn end to end.
    ///
    /// Rejects with a [`TurnError`] before touching state; once started the
    /// turn always runs to one of the [`TurnStatus`] ends and the in-flight
    /// guard is released on every path.
    pub async fn run_turn<R: Rng>(
        &mut self,
        state: &mut GameState,
        action: PlayerAction,
        rng: &mut R,
        cancel: watch::Receiver<bool>,
    ) -> Result<TurnOutcome, TurnError> {
        if self.in_flight {
            return Err(TurnError::TurnInFlight);
        }
        if state.is_game_over() {
            return Err(TurnError::GameOver);
        }
        let have = state.date.action_points;
        if have < action.ap_cost {
            return Err(TurnError::NotEnoughActionPoints {
                have,
                need: action.ap_cost,
            });
        }

        self.in_flight = true;
        let outcome = self.run_inner(state, action, rng, cancel).await;
        self.in_flight = false;
        Ok(outcome)
    }

    async fn run_inner<R: Rng>(
        &mut self,
        state: &mut GameState,
        action: PlayerAction,
        rng: &mut R,
        mut cancel: watch::Receiver<bool>,
    ) -> TurnOutcome {
        // Time moves first: calendar, then one simulator tick per shichen,
        // then the action-point cost (advance restores the bar).
        let advance = state.date.advance(action.shichen_cost, rng);
        npc_simulator::simulate_ticks(state, action.shichen_cost, rng);
        state.date.action_points = state.date.action_points.saturating_sub(action.ap_cost);

        if advance.year_passed {
            if let Some(age) = state.player.adjust_attribute(ATTR_AGE, 1) {
                let lifespan = state
                    .player
                    .attribute_number(ATTR_LIFESPAN)
                    .unwrap_or(i64::MAX);
                if age > lifespan {
                    state.game_over = Some(GameOverReason::OldAge);
                    state.push_entry(StoryEntry::system(
                        "Thọ nguyên đã tận. Thân xác không chống nổi tuế nguyệt.",
                    ));
                    info!(age, lifespan, "player died of old age");
                    return TurnOutcome {
                        status: TurnStatus::DiedOfOldAge,
                        month_passed: advance.month_passed,
                        year_passed: advance.year_passed,
                    };
                }
            }
        }

        state.push_entry(StoryEntry::player(action.text.clone()));
        let placeholder = state.push_entry(StoryEntry::narrative(String::new()));
        self.emit(TurnEvent::PhaseChanged(TurnPhase::Streaming));

        let request = self.build_request(state, &action);
        let mut stream = match self.generator.generate(request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "narrative generator unavailable");
                state.remove_entry(placeholder);
                state.push_entry(StoryEntry::error(format!("Thiên cơ hỗn loạn: {}", e)));
                self.emit(TurnEvent::PhaseChanged(TurnPhase::Error));
                return TurnOutcome {
                    status: TurnStatus::Failed {
                        message: e.to_string(),
                    },
                    month_passed: advance.month_passed,
                    year_passed: advance.year_passed,
                };
            }
        };

        let mut buffer = String::new();
        let mut cancel_alive = true;
        loop {
            tokio::select! {
                changed = cancel.changed(), if cancel_alive => match changed {
                    Ok(()) => {
                        if *cancel.borrow() {
                            // A stale stream must not write into state after
                            // the player walked away.
                            state.remove_entry(placeholder);
                            info!("turn cancelled mid-stream");
                            self.emit(TurnEvent::PhaseChanged(TurnPhase::Idle));
                            return TurnOutcome {
                                status: TurnStatus::Cancelled,
                                month_passed: advance.month_passed,
                                year_passed: advance.year_passed,
                            };
                        }
                    }
                    Err(_) => cancel_alive = false,
                },
                next = stream.next() => match next {
                    Some(Ok(fragment)) => {
                        buffer.push_str(&fragment);
                        if let Some(entry) = state.entry_mut(placeholder) {
                            entry.content = buffer.clone();
                        }
                        self.emit(TurnEvent::Fragment {
                            entry: placeholder,
                            len: buffer.len(),
                        });
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "narrative stream failed mid-response");
                        state.remove_entry(placeholder);
                        state.push_entry(StoryEntry::error(format!("Thiên cơ đứt đoạn: {}", e)));
                        self.emit(TurnEvent::PhaseChanged(TurnPhase::Error));
                        return TurnOutcome {
                            status: TurnStatus::Failed {
                                message: e.to_string(),
                            },
                            month_passed: advance.month_passed,
                            year_passed: advance.year_passed,
                        };
                    }
                    None => break,
                },
            }
        }

        self.emit(TurnEvent::PhaseChanged(TurnPhase::Finalizing));
        let interpreted = self.interpreter.apply_narrative(state, &buffer);
        match interpreted.visible_text {
            Some(text) => {
                if let Some(entry) = state.entry_mut(placeholder) {
                    entry.content = text;
                }
            }
            // Nothing but tags and whitespace: no blank bubble.
            None => {
                state.remove_entry(placeholder);
            }
        }
        self.emit(TurnEvent::PhaseChanged(TurnPhase::Done));

        TurnOutcome {
            status: TurnStatus::Completed {
                changes: interpreted.changes,
            },
            month_passed: advance.month_passed,
            year_passed: advance.year_passed,
        }
    }

    fn build_request(&self, state: &GameState, action: &PlayerAction) -> NarrativeRequest {
        let recent_history = state
            .story_log
            .iter()
            .rev()
            .skip(1) // the empty placeholder
            .take(HISTORY_WINDOW)
            .map(|entry| entry.content.clone())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        let location = state
            .current_location()
            .map(|l| l.name.as_str())
            .unwrap_or("?");
        let realm = state
            .realm_config
            .realm(state.player.cultivation.realm_index)
            .map(|r| r.name.as_str())
            .unwrap_or("?");

        NarrativeRequest {
            player_action: action.text.clone(),
            recent_history,
            state_summary: format!("{} | {} | {}", state.date, location, realm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures_util::stream;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::application::ports::outbound::{NarrativeError, NarrativeStream};
    use crate::domain::entities::{Attribute, AttributeGroup, Location, PlayerCharacter, StoryEntryKind};
    use crate::domain::value_objects::{GameDate, Season, Shichen};

    /// Replays a fixed chunk script
    struct Scripted {
        chunks: Vec<Result<String, NarrativeError>>,
    }

    impl Scripted {
        fn ok(chunks: &[&str]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| Ok(c.to_string())).collect(),
            }
        }
    }

    #[async_trait]
    impl NarrativePort for Scripted {
        async fn generate(&self, _request: NarrativeRequest) -> Result<NarrativeStream, NarrativeError> {
            Ok(stream::iter(self.chunks.clone()).boxed())
        }
    }

    /// Fails before producing any stream
    struct Unreachable;

    #[async_trait]
    impl NarrativePort for Unreachable {
        async fn generate(&self, _request: NarrativeRequest) -> Result<NarrativeStream, NarrativeError> {
            Err(NarrativeError::Unavailable("connection refused".to_string()))
        }
    }

    /// Never yields anything; used to test cancellation
    struct Silent;

    #[async_trait]
    impl NarrativePort for Silent {
        async fn generate(&self, _request: NarrativeRequest) -> Result<NarrativeStream, NarrativeError> {
            Ok(stream::pending().boxed())
        }
    }

    fn state() -> GameState {
        GameState::new(
            PlayerCharacter::new("Lâm Phong"),
            Location::new("thanh-van-tran", "Thanh Vân Trấn"),
            GameDate::new("Thiên Nguyên", 1, 3),
        )
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[tokio::test]
    async fn tag_split_across_chunks_applies_exactly_once() {
        let mut service = TurnService::new(Scripted::ok(&[
            "Bạn thấy [ADD_ITEM:{\"name\":\"Linh Thạch\",",
            "\"quantity\":5}] nơi góc tường.",
        ]));
        let mut state = state();
        let (_tx, cancel) = cancellation();

        let outcome = service
            .run_turn(&mut state, PlayerAction::new("Nhặt viên đá"), &mut rng(), cancel)
            .await
            .unwrap();

        assert_eq!(state.player.item_quantity("Linh Thạch"), 5);
        let TurnStatus::Completed { changes } = outcome.status else {
            panic!("expected completion");
        };
        assert_eq!(changes.len(), 1);

        let narrative = state
            .story_log
            .iter()
            .find(|e| e.kind == StoryEntryKind::Narrative)
            .expect("narrative entry");
        assert_eq!(narrative.content, "Bạn thấy  nơi góc tường.");
    }

    #[tokio::test]
    async fn generator_failure_leaves_no_mutation() {
        let mut service = TurnService::new(Unreachable);
        let mut state = state();
        let inventory_before = state.player.inventory.clone();
        let (_tx, cancel) = cancellation();

        let outcome = service
            .run_turn(&mut state, PlayerAction::new("Hỏi thăm"), &mut rng(), cancel)
            .await
            .unwrap();

        assert!(matches!(outcome.status, TurnStatus::Failed { .. }));
        assert_eq!(state.player.inventory, inventory_before);
        assert!(state.story_log.iter().all(|e| e.kind != StoryEntryKind::Narrative));
        assert!(state.story_log.iter().any(|e| e.kind == StoryEntryKind::Error));
    }

    #[tokio::test]
    async fn mid_stream_failure_replaces_placeholder_with_error_entry() {
        let mut service = TurnService::new(Scripted {
            chunks: vec![
                Ok("Gió nổi lên, [ADD_ITEM:{\"name\":\"Bí Kíp\"".to_string()),
                Err(NarrativeError::Interrupted("socket closed".to_string())),
            ],
        });
        let mut state = state();
        let (_tx, cancel) = cancellation();

        let outcome = service
            .run_turn(&mut state, PlayerAction::new("Mở rương"), &mut rng(), cancel)
            .await
            .unwrap();

        assert!(matches!(outcome.status, TurnStatus::Failed { .. }));
        // The partial tag was never applied and the placeholder is gone.
        assert!(state.player.inventory.is_empty());
        assert!(state.story_log.iter().all(|e| e.kind != StoryEntryKind::Narrative));
        assert!(state.story_log.iter().any(|e| e.kind == StoryEntryKind::Error));
    }

    #[tokio::test]
    async fn cancellation_discards_the_placeholder() {
        let mut service = TurnService::new(Silent);
        let mut state = state();
        let (tx, cancel) = cancellation();
        tx.send(true).unwrap();

        let outcome = service
            .run_turn(&mut state, PlayerAction::new("Thiền định"), &mut rng(), cancel)
            .await
            .unwrap();

        assert_eq!(outcome.status, TurnStatus::Cancelled);
        assert!(state.story_log.iter().all(|e| e.kind != StoryEntryKind::Narrative));
    }

    #[tokio::test]
    async fn tag_only_response_discards_the_bubble() {
        let mut service =
            TurnService::new(Scripted::ok(&["[ADD_RUMOR:{\"text\":\"Tin đồn\"}]"]));
        let mut state = state();
        let (_tx, cancel) = cancellation();

        let outcome = service
            .run_turn(&mut state, PlayerAction::new("Nghe ngóng"), &mut rng(), cancel)
            .await
            .unwrap();

        assert!(matches!(outcome.status, TurnStatus::Completed { .. }));
        assert_eq!(state.rumors, vec!["Tin đồn".to_string()]);
        assert!(state.story_log.iter().all(|e| e.kind != StoryEntryKind::Narrative));
    }

    #[tokio::test]
    async fn in_flight_guard_rejects_a_second_turn() {
        let mut service = TurnService::new(Scripted::ok(&["..."]));
        service.in_flight = true;
        let mut state = state();
        let (_tx, cancel) = cancellation();

        let err = service
            .run_turn(&mut state, PlayerAction::new("Vội vàng"), &mut rng(), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::TurnInFlight));
    }

    #[tokio::test]
    async fn insufficient_action_points_is_rejected_untouched() {
        let mut service = TurnService::new(Scripted::ok(&["..."]));
        let mut state = state();
        state.date.action_points = 0;
        let shichen_before = state.date.shichen;
        let (_tx, cancel) = cancellation();

        let err = service
            .run_turn(
                &mut state,
                PlayerAction::new("Luyện kiếm").with_ap_cost(2),
                &mut rng(),
                cancel,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TurnError::NotEnoughActionPoints { have: 0, need: 2 }));
        assert_eq!(state.date.shichen, shichen_before);
        assert!(state.story_log.is_empty());
    }

    #[tokio::test]
    async fn no_turns_after_game_over() {
        let mut service = TurnService::new(Scripted::ok(&["..."]));
        let mut state = state();
        state.game_over = Some(GameOverReason::Death { reason: None });
        let (_tx, cancel) = cancellation();

        let err = service
            .run_turn(&mut state, PlayerAction::new("Đứng dậy"), &mut rng(), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::GameOver));
    }

    #[tokio::test]
    async fn year_rollover_past_lifespan_ends_the_game() {
        let mut service = TurnService::new(Scripted::ok(&["không bao giờ tới"]));
        let mut state = state();
        state.date.season = Season::Dong;
        state.date.day = 30;
        state.date.shichen = Shichen::Hoi;
        state.player.attributes.insert(
            ATTR_AGE.to_string(),
            Attribute::number(AttributeGroup::Identity, 80),
        );
        let (_tx, cancel) = cancellation();

        let outcome = service
            .run_turn(&mut state, PlayerAction::new("Bế quan"), &mut rng(), cancel)
            .await
            .unwrap();

        assert_eq!(outcome.status, TurnStatus::DiedOfOldAge);
        assert!(outcome.year_passed);
        assert_eq!(state.game_over, Some(GameOverReason::OldAge));
        // Narration was never requested.
        assert!(state.story_log.iter().all(|e| e.kind != StoryEntryKind::Player));
    }

    #[tokio::test]
    async fn progress_events_track_phases_and_fragments() {
        let mut service = TurnService::new(Scripted::ok(&["một ", "hai"]));
        let mut events = service.subscribe();
        let mut state = state();
        let (_tx, cancel) = cancellation();

        service
            .run_turn(&mut state, PlayerAction::new("Quan sát"), &mut rng(), cancel)
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen[0], TurnEvent::PhaseChanged(TurnPhase::Streaming));
        assert!(seen.iter().any(|e| matches!(e, TurnEvent::Fragment { .. })));
        assert_eq!(seen.last(), Some(&TurnEvent::PhaseChanged(TurnPhase::Done)));
    }
}
