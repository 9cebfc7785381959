//! Aggregates - consistency boundaries around entity clusters

mod game_state;

pub use game_state::{GameOverReason, GameState, ShopItem, ShopOffer};
