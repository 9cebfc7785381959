//! NPC locomotion simulator - stochastic wandering across the discovered
//! location graph
//!
//! Runs strictly between discrete player turns, never concurrently with the
//! tag interpreter. Canon NPCs are pinned; dynamically created ones drift.

use rand::Rng;
use tracing::debug;

use crate::domain::aggregates::GameState;

/// Per-tick chance that a movable NPC relocates
pub const MOVE_CHANCE: f64 = 0.05;

/// Run `ticks` simulation ticks (one per shichen advanced). Each tick, every
/// non-canon NPC moves with probability [`MOVE_CHANCE`] to a uniformly
/// chosen neighbor of its current location, restricted to neighbors in the
/// discovered set. Returns the number of moves made.
pub fn simulate_ticks<R: Rng>(state: &mut GameState, ticks: u32, rng: &mut R) -> u32 {
    let GameState { npcs, locations, .. } = state;
    let mut moves = 0;

    for _ in 0..ticks {
        for npc in npcs.iter_mut() {
            if npc.is_canon {
                continue;
            }
            if !rng.gen_bool(MOVE_CHANCE) {
                continue;
            }
            let Some(here) = locations.get(&npc.location_id) else {
                continue;
            };
            let discovered: Vec<_> = here
                .neighbors
                .iter()
                .filter(|id| locations.contains_key(*id))
                .cloned()
                .collect();
            if discovered.is_empty() {
                continue;
            }
            let destination = discovered[rng.gen_range(0..discovered.len())].clone();
            debug!(npc = %npc.name, from = %npc.location_id, to = %destination, "npc wandered");
            npc.location_id = destination;
            moves += 1;
        }
    }

    moves
}
