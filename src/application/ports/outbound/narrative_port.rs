//! Narrative generator port - the external text generator
//!
//! The generator produces a lazy, finite, non-restartable sequence of text
//! fragments. The concatenated text may contain zero or more command tags
//! per the grammar in `domain::value_objects::command`; the coordinator
//! buffers the whole sequence before any tag is interpreted.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Errors surfaced by the narrative generator
#[derive(Debug, Clone, thiserror::Error)]
pub enum NarrativeError {
    /// The generator could not be reached at all
    #[error("narrative generator unavailable: {0}")]
    Unavailable(String),

    /// The fragment stream broke mid-response
    #[error("narrative stream interrupted: {0}")]
    Interrupted(String),
}

/// A chunked narrative response
pub type NarrativeStream = BoxStream<'static, Result<String, NarrativeError>>;

/// What the generator is asked to narrate
#[derive(Debug, Clone)]
pub struct NarrativeRequest {
    /// The player's action text
    pub player_action: String,
    /// Recent story-log contents, oldest first
    pub recent_history: Vec<String>,
    /// A compact summary of the current state (date, location, realm, ...)
    pub state_summary: String,
}

/// Port for requesting narrative text from the external generator
#[async_trait]
pub trait NarrativePort: Send + Sync {
    /// Start generating a response. The returned stream is finite and may
    /// not be restarted; a fresh call is a fresh generation.
    async fn generate(&self, request: NarrativeRequest) -> Result<NarrativeStream, NarrativeError>;
}
