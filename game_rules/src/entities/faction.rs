//! Faction definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A faction and the stats it starts a fresh world with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: String,
    pub name: String,
    #[serde(default = "unlocked_by_default")]
    pub unlocked: bool,
    /// Initial stat values, e.g. `reputation -> 0`.
    #[serde(default)]
    pub stats: BTreeMap<String, i32>,
    /// Member character ids.
    #[serde(default)]
    pub members: Vec<String>,
}

fn unlocked_by_default() -> bool {
    true
}

impl Faction {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unlocked: true,
            stats: BTreeMap::new(),
            members: Vec::new(),
        }
    }

    /// Set an initial stat value.
    pub fn with_stat(mut self, stat: impl Into<String>, value: i32) -> Self {
        self.stats.insert(stat.into(), value);
        self
    }

    /// Add a member character.
    pub fn with_member(mut self, character_id: impl Into<String>) -> Self {
        self.members.push(character_id.into());
        self
    }
}
