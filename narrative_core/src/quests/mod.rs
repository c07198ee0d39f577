//! Quest Manager - the quest state machine.
//!
//! States move `Blocked -> Available -> Active -> {Completed | Failed}` and never
//! leave a terminal state. Every transition runs its whole cascade (outcomes,
//! unlocks and blocks, re-evaluation, broadcast) before returning. Illegal calls are
//! logged and change nothing.

mod auto_resolve;
mod outcome;
mod simulate;

pub use auto_resolve::*;
pub use outcome::*;
pub use simulate::*;

use game_rules::{
    check_requirements, Inventories, PlayerId, Quest, QuestFullId, QuestLink, QuestState, Tick,
    WorldState,
};
use std::collections::BTreeSet;

use crate::events::{HostEvent, JournalEntry, OutboundEvent, Outbox};
use crate::registry::ContentRegistry;

/// Everything a transition reads or writes, borrowed for one unit of work.
pub struct WorldContext<'a> {
    pub registry: &'a ContentRegistry,
    pub state: &'a mut WorldState,
    pub inventories: &'a mut dyn Inventories,
    pub outbox: &'a mut Outbox,
    /// Current world tick.
    pub now: Tick,
}

/// Drives quest transitions against a [`WorldContext`].
pub struct QuestManager<'c, 'w> {
    ctx: &'c mut WorldContext<'w>,
}

impl<'c, 'w> QuestManager<'c, 'w> {
    pub fn new(ctx: &'c mut WorldContext<'w>) -> Self {
        Self { ctx }
    }

    /// Give every quest without a recorded state its initial state.
    pub fn initialize_states(&mut self) {
        let blocked = self.blocked_by_history();
        let registry = self.ctx.registry;
        let mut available = 0;

        for quest in registry.quests() {
            let id = quest.full_id();
            if self.ctx.state.has_quest_state(&id) {
                continue;
            }
            let state = if !blocked.contains(&id) && check_requirements(&quest.requirements, self.ctx.state) {
                available += 1;
                QuestState::Available
            } else {
                QuestState::Blocked
            };
            self.ctx.state.set_quest_state(&id, state);
        }

        tracing::info!(available, "Initialized quest states");
    }

    /// Promote blocked quests whose requirements now hold. Returns the promoted ids.
    pub fn reevaluate_availability(&mut self) -> Vec<QuestFullId> {
        let blocked = self.blocked_by_history();
        let registry = self.ctx.registry;
        let mut promoted = Vec::new();

        for quest in registry.quests() {
            let id = quest.full_id();
            if self.ctx.state.quest_state(&id) != QuestState::Blocked || blocked.contains(&id) {
                continue;
            }
            if check_requirements(&quest.requirements, self.ctx.state) {
                self.ctx.state.set_quest_state(&id, QuestState::Available);
                tracing::info!(quest = %id, "Quest now available");
                promoted.push(id);
            }
        }

        promoted
    }

    /// Accept an available quest: start its timer and gather its characters.
    pub fn accept(&mut self, id: &QuestFullId) -> bool {
        let registry = self.ctx.registry;
        let Some(quest) = registry.quest(id) else {
            tracing::warn!(quest = %id, "Cannot accept unknown quest");
            return false;
        };

        let current = self.ctx.state.quest_state(id);
        if current != QuestState::Available {
            tracing::warn!(quest = %id, state = %current, "Cannot accept quest that is not available");
            return false;
        }

        self.ctx.state.set_quest_state(id, QuestState::Active);
        self.ctx.state.set_quest_timer(id, self.ctx.now);

        for character in &quest.characters {
            self.move_character(character, &quest.location);
        }

        tracing::info!(quest = %id, tick = self.ctx.now, "Quest accepted");
        self.broadcast_quest_states();
        true
    }

    /// Complete an active quest through one of its branches.
    pub fn complete(&mut self, id: &QuestFullId, branch_id: &str) -> bool {
        let registry = self.ctx.registry;
        let Some(quest) = registry.quest(id) else {
            tracing::warn!(quest = %id, "Cannot complete unknown quest");
            return false;
        };
        let Some(branch) = quest.branch(branch_id) else {
            tracing::warn!(quest = %id, branch = %branch_id, "Cannot complete quest: branch not found");
            return false;
        };

        let current = self.ctx.state.quest_state(id);
        if current != QuestState::Active {
            tracing::warn!(quest = %id, state = %current, "Cannot complete quest that is not active");
            return false;
        }

        self.ctx.state.set_quest_state(id, QuestState::Completed);
        self.ctx.state.set_completed_branch(id, branch_id);
        self.ctx.state.clear_quest_timer(id);

        let source = format!("{id}.{branch_id}");
        apply_quest_outcomes(self.ctx, &branch.outcomes, &source);

        // Characters the outcome relocated stay where it put them.
        self.return_characters_home(quest, |character| {
            branch.outcomes.move_characters.contains_key(character)
        });

        for (link, target) in branch.outcomes.quest_references() {
            let target_state = self.ctx.state.quest_state(target);
            match link {
                QuestLink::Unlock | QuestLink::Trigger => {
                    if registry.quest(target).is_none() {
                        tracing::warn!(quest = %id, target = %target, "Outcome references unknown quest");
                    } else if target_state == QuestState::Blocked {
                        self.ctx.state.set_quest_state(target, QuestState::Available);
                        tracing::info!(quest = %target, by = %id, link = link.as_str(), "Quest opened");
                    }
                }
                QuestLink::Block => {
                    if target_state == QuestState::Available {
                        self.ctx.state.set_quest_state(target, QuestState::Blocked);
                        tracing::info!(quest = %target, by = %id, "Quest blocked");
                    }
                }
            }
        }

        self.reevaluate_availability();

        tracing::info!(quest = %id, branch = %branch_id, "Quest completed");
        self.broadcast_quest_states();
        true
    }

    /// Fail an active quest. No branch outcome applies.
    pub fn fail(&mut self, id: &QuestFullId) -> bool {
        let registry = self.ctx.registry;
        let Some(quest) = registry.quest(id) else {
            tracing::warn!(quest = %id, "Cannot fail unknown quest");
            return false;
        };

        let current = self.ctx.state.quest_state(id);
        if current != QuestState::Active {
            tracing::warn!(quest = %id, state = %current, "Cannot fail quest that is not active");
            return false;
        }

        self.ctx.state.set_quest_state(id, QuestState::Failed);
        self.ctx.state.clear_quest_timer(id);
        self.return_characters_home(quest, |_| false);

        tracing::info!(quest = %id, "Quest failed");
        self.reevaluate_availability();
        self.broadcast_quest_states();
        true
    }

    /// Quests currently open for acceptance.
    pub fn available_quests(&self) -> Vec<QuestFullId> {
        self.ctx
            .registry
            .quests()
            .map(Quest::full_id)
            .filter(|id| self.ctx.state.quest_state(id) == QuestState::Available)
            .collect()
    }

    /// Every known quest with its state and timer.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.ctx
            .registry
            .quests()
            .map(|quest| {
                let id = quest.full_id();
                JournalEntry {
                    state: self.ctx.state.quest_state(&id),
                    timer: self.ctx.state.quest_timer(&id).unwrap_or(0),
                    quest: id,
                    summary: quest.summary.clone(),
                    faction_id: quest.faction_id.clone(),
                    level: quest.level,
                    location: quest.location.clone(),
                }
            })
            .collect()
    }

    pub fn send_journal(&mut self, player: PlayerId) {
        let entries = self.journal();
        self.ctx.outbox.send(player, OutboundEvent::Journal { entries });
    }

    /// The full quest-state table, ordered by id.
    pub fn quest_state_table(&self) -> Vec<(QuestFullId, QuestState)> {
        self.ctx
            .state
            .quest_states()
            .map(|(id, state)| (id.clone(), state))
            .collect()
    }

    /// Push the quest-state table to every party member.
    pub fn broadcast_quest_states(&mut self) {
        let states = self.quest_state_table();
        let members: Vec<PlayerId> = self.ctx.state.party().members().iter().copied().collect();
        self.ctx
            .outbox
            .broadcast(members.iter(), OutboundEvent::QuestStates { states });
    }

    /// Quests named in the `blocks` of any recorded completed branch.
    fn blocked_by_history(&self) -> BTreeSet<QuestFullId> {
        let registry = self.ctx.registry;
        self.ctx
            .state
            .completed_branches()
            .filter_map(|(id, branch)| registry.quest(id)?.branch(branch))
            .flat_map(|branch| branch.outcomes.blocks.iter().cloned())
            .collect()
    }

    fn move_character(&mut self, character: &str, location: &str) {
        if self.ctx.state.character_location(character) == Some(location) {
            return;
        }
        self.ctx.state.set_character_location(character, location);
        self.ctx.outbox.host(HostEvent::CharacterMoved {
            character: character.to_string(),
            location: location.to_string(),
        });
        tracing::debug!(character = %character, location = %location, "Moved character");
    }

    fn return_characters_home(&mut self, quest: &Quest, skip: impl Fn(&str) -> bool) {
        let registry = self.ctx.registry;
        for character_id in &quest.characters {
            if skip(character_id) {
                continue;
            }
            if let Some(character) = registry.character(character_id) {
                self.move_character(character_id, &character.home_location);
            }
        }
    }
}
