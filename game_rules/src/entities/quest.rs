//! Quest definitions: requirements, branches, outcomes and auto-resolve policy.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use super::{lenient_stat_map, QuestFullId, StatKey};

/// A quest offered by a faction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub faction_id: String,

    /// Quest level, also the multiplier for the unattended time budget.
    #[serde(default = "default_level")]
    pub level: u32,

    #[serde(default)]
    pub consequential: bool,
    #[serde(default)]
    pub summary: String,

    /// Dialog tree played by the quest's characters. Empty means no dialog.
    #[serde(default)]
    pub dialog_id: String,

    pub location: String,

    /// Characters involved in the quest.
    #[serde(default)]
    pub characters: Vec<String>,

    #[serde(default)]
    pub requirements: QuestRequirements,

    /// Possible resolutions, in declaration order.
    #[serde(default)]
    pub branches: Vec<QuestBranch>,

    #[serde(default)]
    pub auto_resolve: Option<AutoResolve>,
}

fn default_level() -> u32 {
    1
}

impl Quest {
    /// Create a quest with no requirements and no branches.
    pub fn new(faction_id: impl Into<String>, id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            faction_id: faction_id.into(),
            level: 1,
            consequential: false,
            summary: String::new(),
            dialog_id: String::new(),
            location: location.into(),
            characters: Vec::new(),
            requirements: QuestRequirements::default(),
            branches: Vec::new(),
            auto_resolve: None,
        }
    }

    /// The canonical cross-reference key.
    pub fn full_id(&self) -> QuestFullId {
        QuestFullId::new(&self.faction_id, &self.id)
    }

    /// Find a branch by id.
    pub fn branch(&self, branch_id: &str) -> Option<&QuestBranch> {
        self.branches.iter().find(|b| b.id == branch_id)
    }

    /// Check whether a character takes part in this quest.
    pub fn involves(&self, character_id: &str) -> bool {
        self.characters.iter().any(|c| c == character_id)
    }

    pub fn has_dialog(&self) -> bool {
        !self.dialog_id.is_empty()
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_dialog(mut self, dialog_id: impl Into<String>) -> Self {
        self.dialog_id = dialog_id.into();
        self
    }

    pub fn with_character(mut self, character_id: impl Into<String>) -> Self {
        self.characters.push(character_id.into());
        self
    }

    pub fn with_requirements(mut self, requirements: QuestRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_branch(mut self, branch: QuestBranch) -> Self {
        self.branches.push(branch);
        self
    }

    pub fn with_auto_resolve(mut self, auto_resolve: AutoResolve) -> Self {
        self.auto_resolve = Some(auto_resolve);
        self
    }
}

/// What must hold in the world before a quest becomes available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestRequirements {
    /// Quests that must be completed (any branch).
    #[serde(default)]
    pub quests_completed: Vec<QuestFullId>,

    /// Stat comparisons, e.g. `guild.reputation -> ">= 5"`.
    #[serde(default, deserialize_with = "lenient_stat_map")]
    pub faction_stats: BTreeMap<StatKey, String>,

    /// Global flags that must have the given value.
    #[serde(default)]
    pub global_vars: BTreeMap<String, bool>,
}

impl QuestRequirements {
    pub fn is_empty(&self) -> bool {
        self.quests_completed.is_empty() && self.faction_stats.is_empty() && self.global_vars.is_empty()
    }

    pub fn with_completed(mut self, quest: impl Into<QuestFullId>) -> Self {
        self.quests_completed.push(quest.into());
        self
    }

    pub fn with_stat(mut self, key: StatKey, comparison: impl Into<String>) -> Self {
        self.faction_stats.insert(key, comparison.into());
        self
    }

    pub fn with_global(mut self, name: impl Into<String>, value: bool) -> Self {
        self.global_vars.insert(name.into(), value);
        self
    }
}

/// One way a quest can be resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestBranch {
    /// Unique within its quest.
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub requirements: BranchRequirements,
    #[serde(default)]
    pub outcomes: QuestOutcomes,
}

impl QuestBranch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: String::new(),
            requirements: BranchRequirements::default(),
            outcomes: QuestOutcomes::default(),
        }
    }

    pub fn with_outcomes(mut self, outcomes: QuestOutcomes) -> Self {
        self.outcomes = outcomes;
        self
    }
}

/// Items a player must carry to take a branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchRequirements {
    #[serde(default)]
    pub item_requirements: BTreeMap<String, u32>,
}

/// Declarative world-state changes applied when a branch resolves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestOutcomes {
    /// Additive stat deltas.
    #[serde(default, deserialize_with = "lenient_stat_map")]
    pub faction_stats: BTreeMap<StatKey, i32>,
    #[serde(default)]
    pub global_vars: BTreeMap<String, bool>,
    /// Location id -> new state name.
    #[serde(default)]
    pub location_states: BTreeMap<String, String>,
    /// Flavor lines injected into character dialog.
    #[serde(default)]
    pub character_extras: Vec<CharacterExtraEntry>,
    /// Character id -> location id.
    #[serde(default)]
    pub move_characters: BTreeMap<String, String>,
    #[serde(default)]
    pub unlocks: Vec<QuestFullId>,
    #[serde(default)]
    pub triggers: Vec<QuestFullId>,
    #[serde(default)]
    pub blocks: Vec<QuestFullId>,
    #[serde(default)]
    pub unlock_factions: Vec<String>,
}

impl QuestOutcomes {
    /// Every quest this outcome references, with the reference kind.
    pub fn quest_references(&self) -> impl Iterator<Item = (QuestLink, &QuestFullId)> {
        self.unlocks
            .iter()
            .map(|id| (QuestLink::Unlock, id))
            .chain(self.triggers.iter().map(|id| (QuestLink::Trigger, id)))
            .chain(self.blocks.iter().map(|id| (QuestLink::Block, id)))
    }
}

/// How a branch outcome refers to another quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestLink {
    Unlock,
    Trigger,
    Block,
}

impl QuestLink {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestLink::Unlock => "unlocks",
            QuestLink::Trigger => "triggers",
            QuestLink::Block => "blocks",
        }
    }
}

/// A flavor line added to a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterExtraEntry {
    pub character: String,
    pub text: String,
}

/// What happens to an active quest nobody finishes in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutoResolve {
    /// Integer-weight lottery over branches, then `fallback`, then failure.
    #[serde(alias = "WEIGHTED_RANDOM")]
    WeightedRandom {
        #[serde(default)]
        weights: BranchWeights,
        #[serde(default)]
        fallback: Option<String>,
    },
    /// The `fallback` branch, else the first declared branch, else failure.
    #[serde(alias = "PREDETERMINED")]
    Predetermined {
        #[serde(default)]
        fallback: Option<String>,
    },
    /// A uniformly chosen branch, else failure.
    #[serde(alias = "RANDOM")]
    Random,
    #[serde(alias = "FAIL")]
    Fail,
}

/// Branch weights in declaration order.
///
/// Kept as an ordered list so the lottery walks entries in the order the content
/// author wrote them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchWeights(pub Vec<(String, i32)>);

impl BranchWeights {
    pub fn new(entries: impl IntoIterator<Item = (impl Into<String>, i32)>) -> Self {
        Self(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Serialize for BranchWeights {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (branch, weight) in &self.0 {
            map.serialize_entry(branch, weight)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BranchWeights {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WeightsVisitor;

        impl<'de> Visitor<'de> for WeightsVisitor {
            type Value = BranchWeights;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of branch id to integer weight")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((branch, weight)) = access.next_entry::<String, i32>()? {
                    // Later duplicates replace earlier ones in place.
                    match entries.iter_mut().find(|(b, _): &&mut (String, i32)| *b == branch) {
                        Some(existing) => existing.1 = weight,
                        None => entries.push((branch, weight)),
                    }
                }
                Ok(BranchWeights(entries))
            }
        }

        deserializer.deserialize_map(WeightsVisitor)
    }
}
