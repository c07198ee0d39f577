//! Dialog trees.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{lenient_stat_map, QuestFullId, StatKey};
use crate::mechanics::Comparison;

/// A branching conversation, walked node by node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogTree {
    pub id: String,
    pub start_node: String,
    #[serde(default)]
    pub nodes: BTreeMap<String, DialogNode>,
}

impl DialogTree {
    pub fn new(id: impl Into<String>, start_node: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_node: start_node.into(),
            nodes: BTreeMap::new(),
        }
    }

    /// Add a node, keyed by its own id.
    pub fn with_node(mut self, node: DialogNode) -> Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    pub fn node(&self, id: &str) -> Option<&DialogNode> {
        self.nodes.get(id)
    }

    pub fn start(&self) -> Option<&DialogNode> {
        self.nodes.get(&self.start_node)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogNode {
    /// Filled from the map key when omitted in content.
    #[serde(default)]
    pub id: String,
    /// Character id of the speaker.
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub responses: Vec<DialogResponse>,
    /// Applied once, when a session enters the node.
    #[serde(default)]
    pub outcome: Option<DialogOutcome>,
}

impl DialogNode {
    pub fn new(id: impl Into<String>, speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            speaker: speaker.into(),
            text: text.into(),
            responses: Vec::new(),
            outcome: None,
        }
    }

    pub fn with_response(mut self, response: DialogResponse) -> Self {
        self.responses.push(response);
        self
    }

    pub fn with_outcome(mut self, outcome: DialogOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// A node with no responses ends the conversation.
    pub fn is_terminal(&self) -> bool {
        self.responses.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogResponse {
    pub text: String,
    pub next_node: String,
    #[serde(default)]
    pub condition: Option<DialogCondition>,
}

impl DialogResponse {
    pub fn new(text: impl Into<String>, next_node: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_node: next_node.into(),
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: DialogCondition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Predicates gating a response. Every predicate that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogCondition {
    #[serde(default)]
    pub quest_completed: Option<QuestFullId>,
    #[serde(default)]
    pub faction_stat: Option<StatCheck>,
    #[serde(default)]
    pub has_item: Option<String>,
    /// Required count of `has_item`.
    #[serde(default = "default_item_count")]
    pub has_item_count: u32,
    /// A global flag that must be set.
    #[serde(default)]
    pub global_var: Option<String>,
}

fn default_item_count() -> u32 {
    1
}

/// A `"faction.stat <comparison>"` check, parsed when content loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatCheck {
    Parsed { key: StatKey, comparison: Comparison },
    /// Kept verbatim so it can be reported; never holds.
    Malformed(String),
}

impl StatCheck {
    /// Split at the first whitespace or comparison operator.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let split = trimmed
            .find(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '='))
            .unwrap_or(trimmed.len());
        let (key, expr) = trimmed.split_at(split);

        match (StatKey::parse(key), Comparison::parse(expr)) {
            (Some(key), Some(comparison)) => StatCheck::Parsed { key, comparison },
            _ => StatCheck::Malformed(raw.to_string()),
        }
    }
}

impl From<String> for StatCheck {
    fn from(value: String) -> Self {
        let check = Self::parse(&value);
        if let StatCheck::Malformed(raw) = &check {
            tracing::warn!(check = %raw, "Malformed faction stat condition");
        }
        check
    }
}

impl From<StatCheck> for String {
    fn from(check: StatCheck) -> Self {
        match check {
            StatCheck::Parsed { key, comparison } => format!("{key} {comparison}"),
            StatCheck::Malformed(raw) => raw,
        }
    }
}

/// World changes a node applies when entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogOutcome {
    /// Branch committed when the session ends.
    #[serde(default)]
    pub select_branch: Option<String>,
    #[serde(default, deserialize_with = "lenient_stat_map")]
    pub faction_stats: BTreeMap<StatKey, i32>,
    #[serde(default)]
    pub global_vars: BTreeMap<String, bool>,
    #[serde(default)]
    pub give_items: BTreeMap<String, u32>,
    #[serde(default)]
    pub take_items: BTreeMap<String, u32>,
}

impl DialogOutcome {
    pub fn selecting(branch: impl Into<String>) -> Self {
        Self {
            select_branch: Some(branch.into()),
            ..Default::default()
        }
    }
}
