//! Auto-Resolve Scheduler - resolves active quests nobody finished in time.
//!
//! A quest gets `level * ticks_per_level` ticks from acceptance. When that runs
//! out, its [`AutoResolve`] policy picks a branch or fails it.

use game_rules::{AutoResolve, BranchWeights, Quest, QuestFullId, QuestState, Tick};
use rand::Rng;

use super::{QuestManager, WorldContext};

/// How an overdue quest ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Complete(String),
    Fail,
}

/// Draw a branch from integer weights, walking entries in declaration order.
///
/// Non-positive weights never win. Returns `None` when nothing has weight.
pub fn weighted_pick<'a, R: Rng + ?Sized>(weights: &'a BranchWeights, rng: &mut R) -> Option<&'a str> {
    let total: i64 = weights.iter().map(|(_, weight)| i64::from(weight.max(0))).sum();
    if total <= 0 {
        return None;
    }

    let draw = rng.gen_range(0..total);
    let mut cumulative = 0;
    for (branch, weight) in weights.iter() {
        cumulative += i64::from(weight.max(0));
        if cumulative > draw {
            return Some(branch);
        }
    }
    None
}

/// Decide how an overdue quest resolves under its policy.
pub fn choose_resolution<R: Rng + ?Sized>(quest: &Quest, rng: &mut R) -> Resolution {
    let existing = |branch: &str| quest.branch(branch).map(|b| b.id.clone());
    let fallback_or_fail = |fallback: &Option<String>| {
        fallback
            .as_deref()
            .and_then(existing)
            .map(Resolution::Complete)
            .unwrap_or(Resolution::Fail)
    };

    match &quest.auto_resolve {
        None | Some(AutoResolve::Fail) => Resolution::Fail,
        Some(AutoResolve::Predetermined { fallback }) => fallback
            .as_deref()
            .and_then(existing)
            .or_else(|| quest.branches.first().map(|b| b.id.clone()))
            .map(Resolution::Complete)
            .unwrap_or(Resolution::Fail),
        Some(AutoResolve::Random) => {
            if quest.branches.is_empty() {
                Resolution::Fail
            } else {
                let index = rng.gen_range(0..quest.branches.len());
                Resolution::Complete(quest.branches[index].id.clone())
            }
        }
        Some(AutoResolve::WeightedRandom { weights, fallback }) => {
            match weighted_pick(weights, rng).and_then(existing) {
                Some(branch) => Resolution::Complete(branch),
                None => fallback_or_fail(fallback),
            }
        }
    }
}

/// Resolve every active quest whose time budget has run out.
///
/// Returns what happened to each resolved quest, in id order.
pub fn sweep<R: Rng + ?Sized>(
    ctx: &mut WorldContext,
    ticks_per_level: Tick,
    rng: &mut R,
) -> Vec<(QuestFullId, Resolution)> {
    let registry = ctx.registry;
    let now = ctx.now;
    let mut resolved = Vec::new();

    for (id, accepted_at) in ctx.state.quest_timers() {
        if ctx.state.quest_state(&id) != QuestState::Active {
            continue;
        }
        let Some(quest) = registry.quest(&id) else {
            tracing::warn!(quest = %id, "Active quest timer for unknown quest");
            continue;
        };

        let deadline = Tick::from(quest.level.max(1)).saturating_mul(ticks_per_level);
        if now.saturating_sub(accepted_at) < deadline {
            continue;
        }

        let resolution = choose_resolution(quest, rng);
        tracing::info!(quest = %id, resolution = ?resolution, "Auto-resolving overdue quest");

        let mut quests = QuestManager::new(ctx);
        let applied = match &resolution {
            Resolution::Complete(branch) => quests.complete(&id, branch),
            Resolution::Fail => quests.fail(&id),
        };
        if applied {
            resolved.push((id, resolution));
        }
    }

    resolved
}
