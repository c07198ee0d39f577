//! Location definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A location in the game world.
///
/// Locations switch between named states (e.g. `"intact"`, `"burned"`). Each state
/// can describe itself differently and may reroute the location's connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,

    /// Tags for grouping and search.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Neighbouring location ids when the current state does not override them.
    #[serde(default)]
    pub default_connections: Vec<String>,

    #[serde(default)]
    pub states: BTreeMap<String, LocationStateDef>,

    pub default_state: String,
}

/// One named state of a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationStateDef {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub atmosphere: Atmosphere,
    /// Replaces the default connections while this state is active.
    #[serde(default)]
    pub connections: Option<Vec<String>>,
}

/// Sensory description of a location state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    #[serde(default)]
    pub lighting: String,
    #[serde(default)]
    pub sounds: String,
    #[serde(default)]
    pub smells: String,
    #[serde(default)]
    pub mood: String,
}

impl Location {
    /// Create a location with a single `default_state`.
    pub fn new(id: impl Into<String>, name: impl Into<String>, default_state: impl Into<String>) -> Self {
        let default_state = default_state.into();
        let mut states = BTreeMap::new();
        states.insert(default_state.clone(), LocationStateDef::default());
        Self {
            id: id.into(),
            name: name.into(),
            tags: Vec::new(),
            default_connections: Vec::new(),
            states,
            default_state,
        }
    }

    /// Add a named state.
    pub fn with_state(mut self, name: impl Into<String>, state: LocationStateDef) -> Self {
        self.states.insert(name.into(), state);
        self
    }

    /// Set the default connections.
    pub fn with_connections(mut self, connections: Vec<String>) -> Self {
        self.default_connections = connections;
        self
    }

    /// Get a state definition by name.
    pub fn state(&self, name: &str) -> Option<&LocationStateDef> {
        self.states.get(name)
    }

    /// Connections while in `current_state` (or the default state when `None`).
    pub fn connections_in(&self, current_state: Option<&str>) -> &[String] {
        let state_name = current_state.unwrap_or(&self.default_state);
        self.states
            .get(state_name)
            .and_then(|state| state.connections.as_deref())
            .unwrap_or(&self.default_connections)
    }
}
