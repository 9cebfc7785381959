//! Outbound ports - Interfaces the application requires from external systems

mod narrative_port;

pub use narrative_port::{NarrativeError, NarrativePort, NarrativeRequest, NarrativeStream};
