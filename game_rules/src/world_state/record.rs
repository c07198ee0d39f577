//! Persisted layout of the world state.
//!
//! One JSON record per world. Missing sections load as empty; unknown quest states
//! and unparsable player ids are skipped.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::{CharacterExtra, Party, QuestState, Tick, WorldState};
use crate::entities::{PlayerId, QuestFullId};

/// Errors from saving or loading a world record.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("world record I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("world record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WorldRecord {
    pub party: PartyRecord,
    pub quest_states: BTreeMap<String, String>,
    pub completed_branches: BTreeMap<String, String>,
    pub quest_timers: BTreeMap<String, Tick>,
    pub faction_stats: BTreeMap<String, BTreeMap<String, i32>>,
    pub location_states: BTreeMap<String, String>,
    pub global_vars: BTreeMap<String, bool>,
    pub character_extras: BTreeMap<String, Vec<CharacterExtra>>,
    pub character_locations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PartyRecord {
    pub leader: Option<String>,
    pub members: Vec<String>,
    pub pending_invites: Vec<String>,
    pub pending_requests: Vec<String>,
}

fn player_ids(raw: Vec<String>) -> Vec<PlayerId> {
    raw.into_iter()
        .filter_map(|value| {
            let id = PlayerId::parse(&value);
            if id.is_none() {
                tracing::warn!(player = %value, "Skipping unparsable player id");
            }
            id
        })
        .collect()
}

fn quest_keyed<V>(raw: BTreeMap<String, V>) -> BTreeMap<QuestFullId, V> {
    raw.into_iter()
        .map(|(id, value)| (QuestFullId::from(id), value))
        .collect()
}

impl PartyRecord {
    fn from_party(party: &Party) -> Self {
        let ids = |set: &BTreeSet<PlayerId>| -> Vec<String> {
            set.iter().map(PlayerId::to_string).collect()
        };
        Self {
            leader: party.leader().map(|id| id.to_string()),
            members: ids(party.members()),
            pending_invites: ids(party.pending_invites()),
            pending_requests: ids(party.pending_requests()),
        }
    }

    fn into_party(self) -> Party {
        let leader = self.leader.and_then(|value| {
            let id = PlayerId::parse(&value);
            if id.is_none() {
                tracing::warn!(player = %value, "Skipping unparsable party leader");
            }
            id
        });
        Party::from_parts(
            leader,
            player_ids(self.members),
            player_ids(self.pending_invites),
            player_ids(self.pending_requests),
        )
    }
}

impl WorldState {
    /// Snapshot the store into its persisted layout.
    pub fn to_record(&self) -> WorldRecord {
        let string_keyed = |map: &BTreeMap<QuestFullId, String>| -> BTreeMap<String, String> {
            map.iter()
                .map(|(id, value)| (id.to_string(), value.clone()))
                .collect()
        };

        WorldRecord {
            party: PartyRecord::from_party(&self.party),
            quest_states: self
                .quest_states
                .iter()
                .map(|(id, state)| (id.to_string(), state.name().to_string()))
                .collect(),
            completed_branches: string_keyed(&self.completed_branches),
            quest_timers: self
                .quest_timers
                .iter()
                .map(|(id, tick)| (id.to_string(), *tick))
                .collect(),
            faction_stats: self.faction_stats.clone(),
            location_states: self.location_states.clone(),
            global_vars: self.global_vars.clone(),
            character_extras: self.character_extras.clone(),
            character_locations: self.character_locations.clone(),
        }
    }

    /// Rebuild a clean store from a persisted record.
    pub fn from_record(record: WorldRecord) -> Self {
        let quest_states = record
            .quest_states
            .into_iter()
            .filter_map(|(id, name)| match name.parse::<QuestState>() {
                Ok(state) => Some((QuestFullId::from(id), state)),
                Err(_) => {
                    tracing::warn!(quest = %id, state = %name, "Skipping unknown quest state");
                    None
                }
            })
            .collect();

        let mut character_extras = record.character_extras;
        character_extras.retain(|_, extras| !extras.is_empty());

        Self {
            party: record.party.into_party(),
            quest_states,
            completed_branches: quest_keyed(record.completed_branches),
            quest_timers: quest_keyed(record.quest_timers),
            faction_stats: record.faction_stats,
            location_states: record.location_states,
            global_vars: record.global_vars,
            character_extras,
            character_locations: record.character_locations,
            dirty: false,
        }
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let record: WorldRecord = serde_json::from_str(json)?;
        Ok(Self::from_record(record))
    }

    /// Write the record next to `path` and move it into place.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, self.to_json()?)?;
        fs::rename(&staging, path)?;
        tracing::info!(path = %path.display(), "Saved world state");
        Ok(())
    }

    /// Load a world record. A missing file is an empty world.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No saved world state, starting fresh");
            return Ok(Self::new());
        }
        let json = fs::read_to_string(path)?;
        let state = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), "Loaded world state");
        Ok(state)
    }
}
