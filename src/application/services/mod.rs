//! Application services - use-case orchestration over the domain model

pub mod cultivation_service;
pub mod npc_simulator;
pub mod skill_check;
pub mod tag_interpreter;
pub mod turn_service;

pub use cultivation_service::{BreakthroughOutcome, CultivationError, CultivationService};
pub use skill_check::SkillCheckResult;
pub use tag_interpreter::{InterpreterOutcome, StateChange, TagInterpreter};
pub use turn_service::{
    cancellation, PlayerAction, TurnError, TurnEvent, TurnOutcome, TurnPhase, TurnService,
    TurnStatus,
};
