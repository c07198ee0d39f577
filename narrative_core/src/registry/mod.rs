//! Content Registry - the read-only catalog of narrative content.
//!
//! The registry is rebuilt from a [`ContentSet`] on every reload and swapped in
//! whole. Lookups of unknown ids return `None`; callers treat those as missing
//! content and carry on.

mod loader;
mod quest_graph;
mod validation;

pub use loader::*;
pub use quest_graph::*;
pub use validation::*;

use game_rules::{Character, DialogTree, Faction, Location, Quest, QuestFullId, WorldState};
use std::collections::BTreeMap;

/// Raw content as read from disk or built in code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentSet {
    pub characters: Vec<Character>,
    pub locations: Vec<Location>,
    pub factions: Vec<Faction>,
    pub quests: Vec<Quest>,
    pub dialogs: Vec<DialogTree>,
}

impl ContentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(mut self, character: Character) -> Self {
        self.characters.push(character);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    pub fn with_faction(mut self, faction: Faction) -> Self {
        self.factions.push(faction);
        self
    }

    pub fn with_quest(mut self, quest: Quest) -> Self {
        self.quests.push(quest);
        self
    }

    pub fn with_dialog(mut self, dialog: DialogTree) -> Self {
        self.dialogs.push(dialog);
        self
    }

    pub fn len(&self) -> usize {
        self.characters.len()
            + self.locations.len()
            + self.factions.len()
            + self.quests.len()
            + self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Insert by id, reporting when an earlier entry is replaced.
fn insert_unique<K: Ord + std::fmt::Display + Clone, V>(
    map: &mut BTreeMap<K, V>,
    kind: &str,
    key: K,
    value: V,
) {
    if map.insert(key.clone(), value).is_some() {
        tracing::warn!(kind, id = %key, "Duplicate content id, keeping the last definition");
    }
}

/// Catalog of characters, locations, factions, quests and dialog trees.
#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    characters: BTreeMap<String, Character>,
    locations: BTreeMap<String, Location>,
    factions: BTreeMap<String, Faction>,
    /// Keyed by full id.
    quests: BTreeMap<QuestFullId, Quest>,
    dialogs: BTreeMap<String, DialogTree>,
}

impl ContentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a content set.
    pub fn from_content(content: ContentSet) -> Self {
        let mut registry = Self::new();
        registry.load(content);
        registry
    }

    /// Replace the whole catalog with `content`.
    ///
    /// The new maps are built first and swapped in at the end, so the registry is
    /// never observed half-loaded.
    pub fn load(&mut self, content: ContentSet) {
        let mut fresh = Self::new();

        for character in content.characters {
            insert_unique(&mut fresh.characters, "character", character.id.clone(), character);
        }
        for location in content.locations {
            insert_unique(&mut fresh.locations, "location", location.id.clone(), location);
        }
        for faction in content.factions {
            insert_unique(&mut fresh.factions, "faction", faction.id.clone(), faction);
        }
        for quest in content.quests {
            insert_unique(&mut fresh.quests, "quest", quest.full_id(), quest);
        }
        for mut dialog in content.dialogs {
            // Nodes may omit their id; the map key is authoritative.
            for (key, node) in dialog.nodes.iter_mut() {
                if node.id.is_empty() {
                    node.id = key.clone();
                }
            }
            insert_unique(&mut fresh.dialogs, "dialog", dialog.id.clone(), dialog);
        }

        *self = fresh;

        tracing::info!(
            characters = self.characters.len(),
            locations = self.locations.len(),
            factions = self.factions.len(),
            quests = self.quests.len(),
            dialogs = self.dialogs.len(),
            "Loaded narrative content"
        );
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.get(id)
    }

    pub fn faction(&self, id: &str) -> Option<&Faction> {
        self.factions.get(id)
    }

    pub fn quest(&self, id: &QuestFullId) -> Option<&Quest> {
        self.quests.get(id)
    }

    pub fn dialog(&self, id: &str) -> Option<&DialogTree> {
        self.dialogs.get(id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn factions(&self) -> impl Iterator<Item = &Faction> {
        self.factions.values()
    }

    /// All quests, ordered by full id.
    pub fn quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests.values()
    }

    pub fn dialogs(&self) -> impl Iterator<Item = &DialogTree> {
        self.dialogs.values()
    }

    pub fn quests_for_faction(&self, faction_id: &str) -> Vec<&Quest> {
        self.quests
            .values()
            .filter(|quest| quest.faction_id == faction_id)
            .collect()
    }

    /// Quests a character takes part in, ordered by full id.
    pub fn quests_involving(&self, character_id: &str) -> Vec<&Quest> {
        self.quests
            .values()
            .filter(|quest| quest.involves(character_id))
            .collect()
    }

    /// Display name of a character, or the raw id when it is unknown.
    pub fn character_name(&self, id: &str) -> String {
        self.character(id)
            .map(|character| character.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Neighbours of a location in its current state.
    pub fn current_connections(&self, location_id: &str, state: &WorldState) -> &[String] {
        match self.location(location_id) {
            Some(location) => location.connections_in(state.location_state(location_id)),
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_rules::{DialogNode, LocationStateDef};

    fn sample_content() -> ContentSet {
        ContentSet::new()
            .with_location(
                Location::new("harbor", "Harbor", "calm")
                    .with_connections(vec!["market".into(), "lighthouse".into()])
                    .with_state(
                        "flooded",
                        LocationStateDef {
                            connections: Some(vec!["lighthouse".into()]),
                            ..Default::default()
                        },
                    ),
            )
            .with_character(Character::new("mira", "Mira", "harbor"))
            .with_faction(Faction::new("guild", "Merchant Guild"))
            .with_quest(Quest::new("guild", "intro", "harbor").with_character("mira"))
            .with_quest(Quest::new("guild", "heist", "harbor"))
            .with_quest(Quest::new("smugglers", "run", "harbor").with_character("mira"))
            .with_dialog(
                DialogTree::new("talk", "hello").with_node(DialogNode::new("hello", "mira", "Hi.")),
            )
    }

    #[test]
    fn test_lookups() {
        let registry = ContentRegistry::from_content(sample_content());

        assert_eq!(registry.character("mira").unwrap().name, "Mira");
        assert!(registry.character("ghost").is_none());
        assert!(registry.quest(&QuestFullId::from("guild.intro")).is_some());
        assert_eq!(registry.quests_for_faction("guild").len(), 2);
        assert_eq!(registry.quests_involving("mira").len(), 2);
        assert_eq!(registry.character_name("ghost"), "ghost");
    }

    #[test]
    fn test_reload_replaces_everything() {
        let mut registry = ContentRegistry::from_content(sample_content());
        registry.load(ContentSet::new().with_faction(Faction::new("crown", "Crown")));

        assert!(registry.character("mira").is_none());
        assert_eq!(registry.quests().count(), 0);
        assert!(registry.faction("crown").is_some());
    }

    #[test]
    fn test_dialog_node_ids_filled_from_keys() {
        let mut content = ContentSet::new();
        let mut tree = DialogTree::new("talk", "hello");
        tree.nodes.insert("hello".into(), DialogNode::new("", "mira", "Hi."));
        content.dialogs.push(tree);

        let registry = ContentRegistry::from_content(content);
        assert_eq!(registry.dialog("talk").unwrap().start().unwrap().id, "hello");
    }

    #[test]
    fn test_current_connections_follow_location_state() {
        let registry = ContentRegistry::from_content(sample_content());
        let mut state = WorldState::new();

        assert_eq!(registry.current_connections("harbor", &state).len(), 2);
        state.set_location_state("harbor", "flooded");
        assert_eq!(registry.current_connections("harbor", &state), ["lighthouse".to_string()]);
        assert!(registry.current_connections("nowhere", &state).is_empty());
    }
}
