//! World state management - the single owner of all mutable narrative data.
//!
//! Every setter marks the store dirty so the host knows when to persist it. Reads
//! of absent keys fall back to neutral values: `Blocked` quests, zero stats,
//! `false` flags.

mod party;
mod record;

pub use party::*;
pub use record::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::entities::QuestFullId;

/// World ticks since the world was created.
pub type Tick = u64;

/// Lifecycle state of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestState {
    #[default]
    Blocked,
    Available,
    Active,
    Completed,
    Failed,
}

impl QuestState {
    pub const ALL: [QuestState; 5] = [
        QuestState::Blocked,
        QuestState::Available,
        QuestState::Active,
        QuestState::Completed,
        QuestState::Failed,
    ];

    /// The persisted and displayed name, e.g. `"ACTIVE"`.
    pub fn name(&self) -> &'static str {
        match self {
            QuestState::Blocked => "BLOCKED",
            QuestState::Available => "AVAILABLE",
            QuestState::Active => "ACTIVE",
            QuestState::Completed => "COMPLETED",
            QuestState::Failed => "FAILED",
        }
    }

    /// Completed and failed quests never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestState::Completed | QuestState::Failed)
    }
}

impl FromStr for QuestState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestState::ALL
            .into_iter()
            .find(|state| state.name() == s)
            .ok_or_else(|| format!("unknown quest state `{s}`"))
    }
}

impl std::fmt::Display for QuestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A flavor line injected into a character's dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterExtra {
    pub text: String,
    /// Who added it, usually `quest_full_id.branch_id`.
    pub source: String,
}

/// The complete mutable state of the narrative world.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    party: Party,
    quest_states: BTreeMap<QuestFullId, QuestState>,
    completed_branches: BTreeMap<QuestFullId, String>,
    /// Acceptance tick of each active quest.
    quest_timers: BTreeMap<QuestFullId, Tick>,
    faction_stats: BTreeMap<String, BTreeMap<String, i32>>,
    location_states: BTreeMap<String, String>,
    global_vars: BTreeMap<String, bool>,
    character_extras: BTreeMap<String, Vec<CharacterExtra>>,
    character_locations: BTreeMap<String, String>,
    dirty: bool,
}

impl PartialEq for WorldState {
    fn eq(&self, other: &Self) -> bool {
        self.party == other.party
            && self.quest_states == other.quest_states
            && self.completed_branches == other.completed_branches
            && self.quest_timers == other.quest_timers
            && self.faction_stats == other.faction_stats
            && self.location_states == other.location_states
            && self.global_vars == other.global_vars
            && self.character_extras == other.character_extras
            && self.character_locations == other.character_locations
    }
}

impl WorldState {
    /// Create a new empty world state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the store as persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // Party

    pub fn party(&self) -> &Party {
        &self.party
    }

    /// Mutable party access. Marks the store dirty.
    pub fn party_mut(&mut self) -> &mut Party {
        self.dirty = true;
        &mut self.party
    }

    // Quests

    /// State of a quest; unset quests are `Blocked`.
    pub fn quest_state(&self, id: &QuestFullId) -> QuestState {
        self.quest_states.get(id).copied().unwrap_or_default()
    }

    /// Whether a state has ever been recorded for the quest.
    pub fn has_quest_state(&self, id: &QuestFullId) -> bool {
        self.quest_states.contains_key(id)
    }

    pub fn set_quest_state(&mut self, id: &QuestFullId, state: QuestState) {
        self.quest_states.insert(id.clone(), state);
        self.dirty = true;
    }

    /// All recorded quest states, ordered by id.
    pub fn quest_states(&self) -> impl Iterator<Item = (&QuestFullId, QuestState)> {
        self.quest_states.iter().map(|(id, state)| (id, *state))
    }

    pub fn completed_branch(&self, id: &QuestFullId) -> Option<&str> {
        self.completed_branches.get(id).map(String::as_str)
    }

    pub fn set_completed_branch(&mut self, id: &QuestFullId, branch_id: impl Into<String>) {
        self.completed_branches.insert(id.clone(), branch_id.into());
        self.dirty = true;
    }

    pub fn completed_branches(&self) -> impl Iterator<Item = (&QuestFullId, &str)> {
        self.completed_branches
            .iter()
            .map(|(id, branch)| (id, branch.as_str()))
    }

    pub fn quest_timer(&self, id: &QuestFullId) -> Option<Tick> {
        self.quest_timers.get(id).copied()
    }

    pub fn set_quest_timer(&mut self, id: &QuestFullId, accepted_at: Tick) {
        self.quest_timers.insert(id.clone(), accepted_at);
        self.dirty = true;
    }

    pub fn clear_quest_timer(&mut self, id: &QuestFullId) {
        if self.quest_timers.remove(id).is_some() {
            self.dirty = true;
        }
    }

    /// Snapshot of the live timers, safe to iterate while resolving quests.
    pub fn quest_timers(&self) -> Vec<(QuestFullId, Tick)> {
        self.quest_timers
            .iter()
            .map(|(id, tick)| (id.clone(), *tick))
            .collect()
    }

    // Factions

    /// Current value of a faction stat; unset stats are 0.
    pub fn faction_stat(&self, faction: &str, stat: &str) -> i32 {
        self.faction_stats
            .get(faction)
            .and_then(|stats| stats.get(stat))
            .copied()
            .unwrap_or(0)
    }

    pub fn set_faction_stat(&mut self, faction: &str, stat: &str, value: i32) {
        self.faction_stats
            .entry(faction.to_string())
            .or_default()
            .insert(stat.to_string(), value);
        self.dirty = true;
    }

    /// Add a delta to a stat. No floor or ceiling.
    pub fn add_faction_stat(&mut self, faction: &str, stat: &str, delta: i32) {
        let value = self.faction_stat(faction, stat).saturating_add(delta);
        self.set_faction_stat(faction, stat, value);
    }

    pub fn faction_stats(&self, faction: &str) -> Option<&BTreeMap<String, i32>> {
        self.faction_stats.get(faction)
    }

    // Locations

    /// Current state of a location, or `None` when it is in its default state.
    pub fn location_state(&self, location: &str) -> Option<&str> {
        self.location_states.get(location).map(String::as_str)
    }

    pub fn set_location_state(&mut self, location: &str, state: impl Into<String>) {
        self.location_states.insert(location.to_string(), state.into());
        self.dirty = true;
    }

    // Global flags

    /// Value of a global flag; unset flags are `false`.
    pub fn global_var(&self, name: &str) -> bool {
        self.global_vars.get(name).copied().unwrap_or(false)
    }

    pub fn set_global_var(&mut self, name: &str, value: bool) {
        self.global_vars.insert(name.to_string(), value);
        self.dirty = true;
    }

    pub fn global_vars(&self) -> &BTreeMap<String, bool> {
        &self.global_vars
    }

    // Characters

    pub fn character_extras(&self, character: &str) -> &[CharacterExtra] {
        self.character_extras
            .get(character)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn add_character_extra(
        &mut self,
        character: &str,
        text: impl Into<String>,
        source: impl Into<String>,
    ) {
        self.character_extras
            .entry(character.to_string())
            .or_default()
            .push(CharacterExtra {
                text: text.into(),
                source: source.into(),
            });
        self.dirty = true;
    }

    /// Remove every extra line added by `source`. Returns how many were removed.
    pub fn remove_character_extras_by_source(&mut self, source: &str) -> usize {
        let mut removed = 0;
        for extras in self.character_extras.values_mut() {
            let before = extras.len();
            extras.retain(|extra| extra.source != source);
            removed += before - extras.len();
        }
        self.character_extras.retain(|_, extras| !extras.is_empty());
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    pub fn character_location(&self, character: &str) -> Option<&str> {
        self.character_locations.get(character).map(String::as_str)
    }

    pub fn set_character_location(&mut self, character: &str, location: impl Into<String>) {
        self.character_locations
            .insert(character.to_string(), location.into());
        self.dirty = true;
    }

    /// Characters currently at a location, ordered by id.
    pub fn characters_at(&self, location: &str) -> Vec<&str> {
        self.character_locations
            .iter()
            .filter(|(_, at)| at.as_str() == location)
            .map(|(character, _)| character.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_values_are_neutral() {
        let state = WorldState::new();
        let id = QuestFullId::from("guild.intro");

        assert_eq!(state.quest_state(&id), QuestState::Blocked);
        assert!(!state.has_quest_state(&id));
        assert_eq!(state.faction_stat("guild", "trust"), 0);
        assert!(!state.global_var("gate_open"));
        assert!(state.location_state("harbor").is_none());
        assert!(state.character_extras("mira").is_empty());
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_setters_mark_dirty() {
        let mut state = WorldState::new();
        state.set_global_var("gate_open", true);
        assert!(state.is_dirty());

        state.mark_clean();
        assert!(!state.is_dirty());

        state.party_mut();
        assert!(state.is_dirty());
    }

    #[test]
    fn test_faction_stats_are_additive() {
        let mut state = WorldState::new();
        state.add_faction_stat("guild", "trust", 3);
        state.add_faction_stat("guild", "trust", -5);

        assert_eq!(state.faction_stat("guild", "trust"), -2);
        assert_eq!(state.faction_stats("guild").map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_remove_extras_by_source() {
        let mut state = WorldState::new();
        state.add_character_extra("mira", "You helped the guild.", "guild.intro.help");
        state.add_character_extra("mira", "Stay safe.", "guild.other.done");
        state.add_character_extra("tom", "Heard about the guild.", "guild.intro.help");

        assert_eq!(state.remove_character_extras_by_source("guild.intro.help"), 2);
        assert_eq!(state.character_extras("mira").len(), 1);
        assert!(state.character_extras("tom").is_empty());
        assert_eq!(state.remove_character_extras_by_source("guild.intro.help"), 0);
    }

    #[test]
    fn test_characters_at() {
        let mut state = WorldState::new();
        state.set_character_location("mira", "harbor");
        state.set_character_location("tom", "harbor");
        state.set_character_location("vex", "vault");

        assert_eq!(state.characters_at("harbor"), vec!["mira", "tom"]);
        assert!(state.characters_at("market").is_empty());
    }

    #[test]
    fn test_quest_state_names() {
        assert_eq!("ACTIVE".parse::<QuestState>(), Ok(QuestState::Active));
        assert!("active".parse::<QuestState>().is_err());
        assert!(QuestState::Failed.is_terminal());
        assert!(!QuestState::Available.is_terminal());
        assert_eq!(
            serde_json::to_string(&QuestState::Completed).unwrap(),
            "\"COMPLETED\""
        );
    }

    #[test]
    fn test_equality_ignores_dirty_flag() {
        let mut a = WorldState::new();
        a.set_global_var("x", true);
        let mut b = a.clone();
        b.mark_clean();
        assert_eq!(a, b);
    }
}
