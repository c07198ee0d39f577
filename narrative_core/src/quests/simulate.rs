//! Preview the world a sequence of branch choices would produce.

use game_rules::{InventoryLedger, QuestFullId, QuestLink, QuestState, WorldState};

use super::{apply_quest_outcomes, WorldContext};
use crate::events::Outbox;
use crate::registry::ContentRegistry;

/// Result of [`simulate`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub state: WorldState,
    /// Quests unlocked or triggered along the way, first occurrence order.
    pub unlocked: Vec<QuestFullId>,
    pub blocked: Vec<QuestFullId>,
}

/// Apply the outcome of each `(quest, branch)` pick, in order, to a fresh world.
///
/// Picks naming unknown quests or branches are skipped. No requirements are
/// checked; this shows what the outcomes do, not whether the path is reachable.
pub fn simulate(registry: &ContentRegistry, picks: &[(QuestFullId, String)]) -> SimulationReport {
    let mut state = WorldState::new();
    let mut ledger = InventoryLedger::new();
    let mut outbox = Outbox::new();
    let mut unlocked = Vec::new();
    let mut blocked = Vec::new();

    let mut ctx = WorldContext {
        registry,
        state: &mut state,
        inventories: &mut ledger,
        outbox: &mut outbox,
        now: 0,
    };

    for (quest_id, branch_id) in picks {
        let Some(branch) = registry.quest(quest_id).and_then(|q| q.branch(branch_id)) else {
            tracing::warn!(quest = %quest_id, branch = %branch_id, "Skipping unknown simulation pick");
            continue;
        };

        ctx.state.set_quest_state(quest_id, QuestState::Completed);
        ctx.state.set_completed_branch(quest_id, branch_id.clone());
        apply_quest_outcomes(&mut ctx, &branch.outcomes, &format!("{quest_id}.{branch_id}"));

        for (link, target) in branch.outcomes.quest_references() {
            let list = match link {
                QuestLink::Unlock | QuestLink::Trigger => &mut unlocked,
                QuestLink::Block => &mut blocked,
            };
            if !list.contains(target) {
                list.push(target.clone());
            }
        }
    }

    SimulationReport {
        state,
        unlocked,
        blocked,
    }
}
