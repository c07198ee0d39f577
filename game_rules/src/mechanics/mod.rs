//! Game mechanics: the comparison grammar and requirement/condition rules.
//!
//! Everything here is a pure function of content and world state. Parse errors in
//! comparison expressions evaluate to `false`.

use serde::{Deserialize, Serialize};

use crate::entities::{BranchRequirements, DialogCondition, PlayerId, QuestRequirements, StatCheck};
use crate::world_state::{QuestState, WorldState};

/// Comparison operators understood by requirement expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Eq => "==",
        }
    }
}

/// A parsed comparison such as `>= 5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comparison {
    pub op: CompareOp,
    pub target: i32,
}

impl Comparison {
    pub fn new(op: CompareOp, target: i32) -> Self {
        Self { op, target }
    }

    /// Parse `[op] integer`. A bare integer means `>=`.
    ///
    /// Two-character operators are tried before their one-character prefixes.
    pub fn parse(expr: &str) -> Option<Self> {
        const OPERATORS: [(&str, CompareOp); 5] = [
            (">=", CompareOp::Ge),
            ("<=", CompareOp::Le),
            ("==", CompareOp::Eq),
            (">", CompareOp::Gt),
            ("<", CompareOp::Lt),
        ];

        let expr = expr.trim();
        let (op, rest) = OPERATORS
            .iter()
            .find_map(|(symbol, op)| expr.strip_prefix(symbol).map(|rest| (*op, rest)))
            .unwrap_or((CompareOp::Ge, expr));

        rest.trim().parse::<i32>().ok().map(|target| Self::new(op, target))
    }

    pub fn holds(&self, value: i32) -> bool {
        match self.op {
            CompareOp::Ge => value >= self.target,
            CompareOp::Le => value <= self.target,
            CompareOp::Gt => value > self.target,
            CompareOp::Lt => value < self.target,
            CompareOp::Eq => value == self.target,
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.op.symbol(), self.target)
    }
}

/// Evaluate a comparison expression against a value. Malformed expressions are false.
pub fn evaluate_comparison(expr: &str, value: i32) -> bool {
    Comparison::parse(expr).is_some_and(|comparison| comparison.holds(value))
}

/// Item holdings of players, owned by the host game.
pub trait Inventories {
    fn item_count(&self, player: PlayerId, item_id: &str) -> u32;

    fn give_items(&mut self, player: PlayerId, item_id: &str, count: u32);

    /// Remove up to `count` items, returning how many were removed.
    fn take_items(&mut self, player: PlayerId, item_id: &str, count: u32) -> u32;
}

/// Check a quest's requirement set against the world.
pub fn check_requirements(requirements: &QuestRequirements, state: &WorldState) -> bool {
    let quests_done = requirements
        .quests_completed
        .iter()
        .all(|id| state.quest_state(id) == QuestState::Completed);

    let stats_hold = requirements.faction_stats.iter().all(|(key, expr)| {
        evaluate_comparison(expr, state.faction_stat(&key.faction, &key.stat))
    });

    let vars_match = requirements
        .global_vars
        .iter()
        .all(|(name, required)| state.global_var(name) == *required);

    quests_done && stats_hold && vars_match
}

/// Check that a player carries every item a branch needs.
pub fn check_branch_requirements(
    requirements: &BranchRequirements,
    inventories: &dyn Inventories,
    player: PlayerId,
) -> bool {
    requirements
        .item_requirements
        .iter()
        .all(|(item, count)| inventories.item_count(player, item) >= *count)
}

/// Evaluate a dialog condition for a player. A condition with nothing set holds.
pub fn evaluate_condition(
    condition: &DialogCondition,
    state: &WorldState,
    inventories: &dyn Inventories,
    player: PlayerId,
) -> bool {
    if let Some(quest) = &condition.quest_completed {
        if state.quest_state(quest) != QuestState::Completed {
            return false;
        }
    }

    if let Some(check) = &condition.faction_stat {
        let holds = match check {
            StatCheck::Parsed { key, comparison } => {
                comparison.holds(state.faction_stat(&key.faction, &key.stat))
            }
            StatCheck::Malformed(_) => false,
        };
        if !holds {
            return false;
        }
    }

    if let Some(item) = &condition.has_item {
        if inventories.item_count(player, item) < condition.has_item_count {
            return false;
        }
    }

    if let Some(var) = &condition.global_var {
        if !state.global_var(var) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{InventoryLedger, QuestFullId, StatKey};

    #[test]
    fn test_comparison_grammar() {
        assert!(evaluate_comparison(">= 5", 5));
        assert!(!evaluate_comparison("< 5", 5));
        assert!(evaluate_comparison("<= 5", 5));
        assert!(evaluate_comparison("> 4", 5));
        assert!(evaluate_comparison("== 5", 5));
        assert!(!evaluate_comparison("==5", 6));
        assert!(evaluate_comparison(">=-3", -3));
    }

    #[test]
    fn test_bare_number_means_at_least() {
        assert!(evaluate_comparison("3", 5));
        assert!(evaluate_comparison("5", 5));
        assert!(!evaluate_comparison("6", 5));
    }

    #[test]
    fn test_malformed_comparison_is_false() {
        assert!(!evaluate_comparison("abc", 5));
        assert!(!evaluate_comparison(">= abc", 5));
        assert!(!evaluate_comparison("", 5));
        assert!(!evaluate_comparison("=> 5", 5));
    }

    #[test]
    fn test_check_requirements() {
        let mut state = WorldState::new();
        let intro = QuestFullId::from("guild.intro");
        let requirements = QuestRequirements::default()
            .with_completed(intro.clone())
            .with_stat(StatKey::new("guild", "trust"), ">= 2")
            .with_global("gate_open", true);

        assert!(!check_requirements(&requirements, &state));

        state.set_quest_state(&intro, QuestState::Completed);
        state.set_faction_stat("guild", "trust", 2);
        assert!(!check_requirements(&requirements, &state));

        state.set_global_var("gate_open", true);
        assert!(check_requirements(&requirements, &state));

        assert!(check_requirements(&QuestRequirements::default(), &WorldState::new()));
    }

    #[test]
    fn test_required_false_global_matches_unset() {
        let requirements = QuestRequirements::default().with_global("alarm", false);
        assert!(check_requirements(&requirements, &WorldState::new()));
    }

    #[test]
    fn test_evaluate_condition() {
        let player = PlayerId::new();
        let mut state = WorldState::new();
        let mut ledger = InventoryLedger::new();

        assert!(evaluate_condition(&DialogCondition::default(), &state, &ledger, player));

        let condition = DialogCondition {
            faction_stat: Some(StatCheck::parse("guild.trust > 1")),
            has_item: Some("token".into()),
            has_item_count: 2,
            ..Default::default()
        };
        state.add_faction_stat("guild", "trust", 2);
        ledger.give_items(player, "token", 1);
        assert!(!evaluate_condition(&condition, &state, &ledger, player));

        ledger.give_items(player, "token", 1);
        assert!(evaluate_condition(&condition, &state, &ledger, player));

        let malformed = DialogCondition {
            faction_stat: Some(StatCheck::parse("trust > 1")),
            ..Default::default()
        };
        assert!(!evaluate_condition(&malformed, &state, &ledger, player));
    }

    #[test]
    fn test_branch_item_requirements() {
        let player = PlayerId::new();
        let mut ledger = InventoryLedger::new();
        let mut requirements = BranchRequirements::default();
        requirements.item_requirements.insert("lockpick".into(), 2);

        ledger.give_items(player, "lockpick", 1);
        assert!(!check_branch_requirements(&requirements, &ledger, player));
        ledger.give_items(player, "lockpick", 1);
        assert!(check_branch_requirements(&requirements, &ledger, player));
    }
}
