//! Content definitions for the narrative layer.
//!
//! Content is immutable once loaded and cross-references other content by stable
//! string id, never by pointer. Quests are addressed by their [`QuestFullId`].

mod character;
mod components;
mod dialog;
mod faction;
mod location;
mod quest;

pub use character::*;
pub use components::*;
pub use dialog::*;
pub use faction::*;
pub use location::*;
pub use quest::*;

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Create a new random player ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a player ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a player ID from its hyphenated string form.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical quest key: `faction_id + "." + quest_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestFullId(String);

impl QuestFullId {
    /// Build the key for a quest declared by a faction.
    pub fn new(faction_id: &str, quest_id: &str) -> Self {
        Self(format!("{faction_id}.{quest_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The faction part of the key.
    pub fn faction_id(&self) -> &str {
        self.0.split_once('.').map(|(f, _)| f).unwrap_or(&self.0)
    }
}

impl From<&str> for QuestFullId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for QuestFullId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for QuestFullId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `"faction.stat"` key, split once when content is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatKey {
    pub faction: String,
    pub stat: String,
}

/// Raised for stat keys without a `faction.stat` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stat key `{0}` is not of the form `faction.stat`")]
pub struct InvalidStatKey(pub String);

impl StatKey {
    pub fn new(faction: impl Into<String>, stat: impl Into<String>) -> Self {
        Self {
            faction: faction.into(),
            stat: stat.into(),
        }
    }

    /// Split `faction.stat` at the first dot. Both halves must be non-empty.
    pub fn parse(key: &str) -> Option<Self> {
        let (faction, stat) = key.trim().split_once('.')?;
        if faction.is_empty() || stat.is_empty() {
            return None;
        }
        Some(Self::new(faction, stat))
    }
}

impl TryFrom<String> for StatKey {
    type Error = InvalidStatKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(InvalidStatKey(value))
    }
}

impl From<StatKey> for String {
    fn from(key: StatKey) -> Self {
        key.to_string()
    }
}

impl std::fmt::Display for StatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.faction, self.stat)
    }
}

/// Deserialize a `"faction.stat" -> value` map, dropping malformed keys with a warning
/// instead of rejecting the whole content file.
pub(crate) fn lenient_stat_map<'de, D, V>(deserializer: D) -> Result<BTreeMap<StatKey, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw = BTreeMap::<String, V>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match StatKey::parse(&key) {
            Some(parsed) => Some((parsed, value)),
            None => {
                tracing::warn!(key = %key, "Dropping malformed faction stat key");
                None
            }
        })
        .collect())
}
