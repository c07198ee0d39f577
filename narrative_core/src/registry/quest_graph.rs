//! Quest dependency graph built from branch outcomes.

use game_rules::{QuestFullId, QuestLink};
use std::collections::{BTreeMap, BTreeSet};

use super::ContentRegistry;

/// One outcome reference from a branch of `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestEdge {
    pub from: QuestFullId,
    pub to: QuestFullId,
    pub link: QuestLink,
    pub branch: String,
    /// Target belongs to another faction. False when the target is unknown.
    pub cross_faction: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A structural problem in a quest chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainIssue {
    /// An edge points at a quest that does not exist.
    Dangling(QuestEdge),
    /// A quest with no incoming or outgoing edges.
    Isolated(QuestFullId),
    /// Two consecutive quest levels differ by more than one.
    LevelGap { lower: u32, upper: u32 },
}

impl ChainIssue {
    pub fn severity(&self) -> IssueSeverity {
        match self {
            ChainIssue::Dangling(_) => IssueSeverity::Error,
            ChainIssue::Isolated(_) | ChainIssue::LevelGap { .. } => IssueSeverity::Warning,
        }
    }
}

impl std::fmt::Display for ChainIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainIssue::Dangling(edge) => write!(
                f,
                "quest {} branch {} {} non-existent quest {}",
                edge.from,
                edge.branch,
                edge.link.as_str(),
                edge.to
            ),
            ChainIssue::Isolated(quest) => write!(f, "quest {quest} is isolated (no connections)"),
            ChainIssue::LevelGap { lower, upper } => write!(f, "level gap between {lower} and {upper}"),
        }
    }
}

/// Quests in scope and the edges leaving them.
#[derive(Debug, Clone, Default)]
pub struct QuestGraph {
    levels: BTreeMap<QuestFullId, u32>,
    edges: Vec<QuestEdge>,
    /// Every quest in the registry, for dangling checks.
    known: BTreeSet<QuestFullId>,
}

impl QuestGraph {
    /// Build the graph of all quests, or only those of `faction`.
    pub fn build(registry: &ContentRegistry, faction: Option<&str>) -> Self {
        let mut graph = Self {
            known: registry.quests().map(|quest| quest.full_id()).collect(),
            ..Default::default()
        };

        for quest in registry.quests() {
            if faction.is_some_and(|f| f != quest.faction_id) {
                continue;
            }
            let from = quest.full_id();
            graph.levels.insert(from.clone(), quest.level);

            for branch in &quest.branches {
                for (link, to) in branch.outcomes.quest_references() {
                    let cross_faction = registry
                        .quest(to)
                        .is_some_and(|target| target.faction_id != quest.faction_id);
                    graph.edges.push(QuestEdge {
                        from: from.clone(),
                        to: to.clone(),
                        link,
                        branch: branch.id.clone(),
                        cross_faction,
                    });
                }
            }
        }

        graph
    }

    /// Quests in scope, ordered by full id.
    pub fn quests(&self) -> impl Iterator<Item = &QuestFullId> {
        self.levels.keys()
    }

    pub fn edges(&self) -> &[QuestEdge] {
        &self.edges
    }

    pub fn edges_from<'a>(&'a self, quest: &'a QuestFullId) -> impl Iterator<Item = &'a QuestEdge> {
        self.edges.iter().filter(move |edge| &edge.from == quest)
    }

    pub fn edges_to<'a>(&'a self, quest: &'a QuestFullId) -> impl Iterator<Item = &'a QuestEdge> {
        self.edges.iter().filter(move |edge| &edge.to == quest)
    }

    /// Quests in scope sorted by level, then id.
    pub fn by_level(&self) -> Vec<(&QuestFullId, u32)> {
        let mut quests: Vec<_> = self.levels.iter().map(|(id, level)| (id, *level)).collect();
        quests.sort_by_key(|(id, level)| (*level, (*id).clone()));
        quests
    }

    /// Dangling edges, isolated quests and level gaps.
    pub fn chain_issues(&self) -> Vec<ChainIssue> {
        let mut issues: Vec<ChainIssue> = self
            .edges
            .iter()
            .filter(|edge| !self.known.contains(&edge.to))
            .cloned()
            .map(ChainIssue::Dangling)
            .collect();

        if self.levels.len() > 1 {
            let connected: BTreeSet<&QuestFullId> = self
                .edges
                .iter()
                .flat_map(|edge| [&edge.from, &edge.to])
                .collect();
            issues.extend(
                self.levels
                    .keys()
                    .filter(|quest| !connected.contains(quest))
                    .cloned()
                    .map(ChainIssue::Isolated),
            );
        }

        let levels: BTreeSet<u32> = self.levels.values().copied().collect();
        let levels: Vec<u32> = levels.into_iter().collect();
        issues.extend(
            levels
                .windows(2)
                .filter(|pair| pair[1] - pair[0] > 1)
                .map(|pair| ChainIssue::LevelGap {
                    lower: pair[0],
                    upper: pair[1],
                }),
        );

        issues
    }
}
