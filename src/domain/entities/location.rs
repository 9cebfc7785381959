//! Location entity - a node in the discovered location graph

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::LocationId;

/// A discovered location and its adjacency list.
///
/// Adjacency must stay bidirectional: linking is always done through the
/// aggregate so both endpoints are updated together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: String,
    pub neighbors: Vec<LocationId>,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            neighbors: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Record a neighbor, ignoring duplicates
    pub fn add_neighbor(&mut self, neighbor: LocationId) {
        if !self.neighbors.contains(&neighbor) {
            self.neighbors.push(neighbor);
        }
    }
}
