//! Tu Tien Engine - Turn and narrative state-mutation engine
//!
//! The engine is the subsystem of a text-driven cultivation RPG that turns a
//! player action plus an externally generated narrative response into
//! consistent, invariant-preserving changes to game state:
//! - Advances the in-game calendar and derives weather/season/year rollovers
//! - Relocates non-scripted NPCs across the discovered location graph
//! - Resolves attribute-vs-difficulty skill checks
//! - Extracts bracketed command tags from narrative text and applies them
//! - Governs realm/stage advancement, tribulations and destiny paths
//! - Coordinates a chunked narrative stream so commands apply exactly once
//!
//! Rendering, mod authoring, save transport and prompt construction are
//! external collaborators reached through the ports in `application::ports`.

pub mod application;
pub mod domain;
