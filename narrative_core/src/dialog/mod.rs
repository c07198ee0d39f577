//! Dialog Engine - walks dialog trees one node at a time per player.
//!
//! A session opens when a player talks to a character with quest dialog and
//! closes when the tree reaches a node without responses, the player closes it,
//! or the player disconnects. A branch picked along the way completes the quest
//! when the session ends, except on disconnect.

mod session;

pub use session::*;

use game_rules::{DialogNode, PlayerId, Quest, QuestState};
use std::collections::HashMap;

use crate::events::OutboundEvent;
use crate::quests::{apply_dialog_outcome, QuestManager, WorldContext};

/// Live dialog sessions, one per player.
#[derive(Debug, Clone, Default)]
pub struct DialogManager {
    sessions: HashMap<PlayerId, DialogSession>,
}

impl DialogManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self, player: PlayerId) -> Option<&DialogSession> {
        self.sessions.get(&player)
    }

    pub fn has_session(&self, player: PlayerId) -> bool {
        self.sessions.contains_key(&player)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Handle a player talking to a character.
    ///
    /// Picks the character's first active quest with dialog, else the first
    /// available one (accepting it). Without one the player is told the character
    /// has nothing to say.
    pub fn start_interaction(&mut self, ctx: &mut WorldContext, player: PlayerId, character_id: &str) {
        let registry = ctx.registry;
        let quests = registry.quests_involving(character_id);
        let with_state = |wanted: QuestState| {
            quests
                .iter()
                .copied()
                .find(|quest| quest.has_dialog() && ctx.state.quest_state(&quest.full_id()) == wanted)
        };
        let quest: Option<&Quest> = with_state(QuestState::Active).or_else(|| with_state(QuestState::Available));

        let opening = quest.and_then(|quest| {
            let tree = registry.dialog(&quest.dialog_id)?;
            let start = tree.start()?;
            Some((quest, tree, start))
        });

        let Some((quest, tree, start)) = opening else {
            if let Some(quest) = quest {
                tracing::warn!(quest = %quest.full_id(), dialog = %quest.dialog_id, "Dialog tree or start node not found");
            }
            let name = registry.character_name(character_id);
            ctx.outbox
                .system_message(player, format!("{name} has nothing to say right now."));
            return;
        };

        let quest_id = quest.full_id();
        if ctx.state.quest_state(&quest_id) == QuestState::Available {
            QuestManager::new(ctx).accept(&quest_id);
        }

        if self.sessions.remove(&player).is_some() {
            tracing::debug!(player = %player, "Replacing existing dialog session");
        }

        let mut session = DialogSession::new(tree.id.clone(), quest_id.clone(), tree.start_node.clone());
        Self::enter_node(ctx, &mut session, start, player);
        let responses = session.filter_responses(start, ctx.state, ctx.inventories, player);

        tracing::info!(player = %player, quest = %quest_id, dialog = %tree.id, "Dialog opened");
        ctx.outbox.send(
            player,
            OutboundEvent::DialogOpen {
                speaker: registry.character_name(&start.speaker),
                text: start.text.clone(),
                responses,
                quest: quest_id,
            },
        );
        self.sessions.insert(player, session);
    }

    /// Follow the visible response at `index`.
    pub fn advance(&mut self, ctx: &mut WorldContext, player: PlayerId, index: usize) {
        let registry = ctx.registry;
        let Some(session) = self.sessions.get_mut(&player) else {
            tracing::warn!(player = %player, "No active dialog session");
            return;
        };

        let Some(response_index) = session.response_index(index) else {
            tracing::warn!(player = %player, index, visible = session.visible_count(), "Invalid dialog response index");
            return;
        };

        let current = registry
            .dialog(&session.dialog_id)
            .and_then(|tree| Some((tree, tree.node(&session.current_node)?)));
        let Some((tree, node)) = current else {
            tracing::warn!(player = %player, dialog = %session.dialog_id, "Dialog content vanished, closing session");
            self.end_dialog(ctx, player);
            return;
        };

        let Some(response) = node.responses.get(response_index) else {
            self.end_dialog(ctx, player);
            return;
        };
        let Some(next) = tree.node(&response.next_node) else {
            tracing::warn!(dialog = %tree.id, node = %response.next_node, "Next dialog node not found");
            self.end_dialog(ctx, player);
            return;
        };

        session.current_node = next.id.clone();
        Self::enter_node(ctx, session, next, player);

        if next.is_terminal() {
            self.end_dialog(ctx, player);
            return;
        }

        let responses = session.filter_responses(next, ctx.state, ctx.inventories, player);
        ctx.outbox.send(
            player,
            OutboundEvent::DialogUpdate {
                speaker: registry.character_name(&next.speaker),
                text: next.text.clone(),
                responses,
            },
        );
    }

    /// Close the player's session, completing its quest when a branch was picked.
    pub fn end_dialog(&mut self, ctx: &mut WorldContext, player: PlayerId) {
        if let Some(session) = self.sessions.remove(&player) {
            tracing::info!(player = %player, quest = %session.quest, "Dialog closed");
            if let Some(branch) = &session.selected_branch {
                QuestManager::new(ctx).complete(&session.quest, branch);
            }
        }
        ctx.outbox.send(player, OutboundEvent::DialogClose);
    }

    /// Drop the player's session without resolving anything.
    pub fn disconnect(&mut self, player: PlayerId) {
        if let Some(session) = self.sessions.remove(&player) {
            tracing::info!(player = %player, quest = %session.quest, "Dropped dialog session on disconnect");
        }
    }

    /// Apply a node's outcome on entry.
    fn enter_node(ctx: &mut WorldContext, session: &mut DialogSession, node: &DialogNode, player: PlayerId) {
        if let Some(outcome) = &node.outcome {
            if let Some(branch) = apply_dialog_outcome(ctx, outcome, player) {
                tracing::debug!(player = %player, branch = %branch, "Dialog selected branch");
                session.selected_branch = Some(branch);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::tests::{id, Fixture};
    use crate::registry::ContentSet;
    use game_rules::{
        Character, DialogCondition, DialogOutcome, DialogResponse, DialogTree, Inventories,
        QuestBranch, StatKey,
    };

    fn tree() -> DialogTree {
        let mut bribe = DialogOutcome::selecting("bribe");
        bribe.faction_stats.insert(StatKey::new("guard", "greed"), 1);

        DialogTree::new("gate_talk", "n0")
            .with_node(
                DialogNode::new("n0", "guard", "Halt.")
                    .with_response(DialogResponse::new("r0", "pay"))
                    .with_response(DialogResponse::new("r1", "pass").with_condition(DialogCondition {
                        has_item: Some("pass".into()),
                        ..Default::default()
                    }))
                    .with_response(DialogResponse::new("lost", "nowhere")),
            )
            .with_node(
                DialogNode::new("pay", "guard", "That'll cost you.")
                    .with_outcome(bribe)
                    .with_response(DialogResponse::new("Fine.", "done")),
            )
            .with_node(DialogNode::new("done", "guard", "Move along."))
    }

    fn fixture() -> Fixture {
        let mut fixture = Fixture::new(
            ContentSet::new()
                .with_character(Character::new("guard", "Gate Guard", "gate"))
                .with_dialog(tree())
                .with_quest(
                    Quest::new("city", "gate", "gate")
                        .with_character("guard")
                        .with_dialog("gate_talk")
                        .with_branch(QuestBranch::new("bribe"))
                        .with_branch(QuestBranch::new("papers")),
                ),
        );
        fixture.with_quests(|quests| quests.initialize_states());
        fixture
    }

    #[test]
    fn test_open_filters_responses_and_accepts() {
        let mut fixture = fixture();
        let mut dialogs = DialogManager::new();
        let player = PlayerId::new();

        dialogs.start_interaction(&mut fixture.ctx(), player, "guard");

        assert_eq!(fixture.state.quest_state(&id("city.gate")), QuestState::Active);
        let open = fixture.outbox.for_player(player).last().unwrap();
        assert_eq!(
            open,
            &OutboundEvent::DialogOpen {
                speaker: "Gate Guard".into(),
                text: "Halt.".into(),
                responses: vec!["r0".into(), "lost".into()],
                quest: id("city.gate"),
            }
        );
        assert!(dialogs.has_session(player));
    }

    #[test]
    fn test_walk_to_end_completes_quest() {
        let mut fixture = fixture();
        let mut dialogs = DialogManager::new();
        let player = PlayerId::new();
        dialogs.start_interaction(&mut fixture.ctx(), player, "guard");

        dialogs.advance(&mut fixture.ctx(), player, 0);
        assert_eq!(dialogs.session(player).unwrap().selected_branch.as_deref(), Some("bribe"));
        // Applied once on entry.
        assert_eq!(fixture.state.faction_stat("guard", "greed"), 1);
        assert!(matches!(
            fixture.outbox.for_player(player).last(),
            Some(OutboundEvent::DialogUpdate { .. })
        ));

        dialogs.advance(&mut fixture.ctx(), player, 0);
        assert!(!dialogs.has_session(player));
        assert_eq!(fixture.state.quest_state(&id("city.gate")), QuestState::Completed);
        assert_eq!(fixture.state.completed_branch(&id("city.gate")), Some("bribe"));
        assert_eq!(fixture.state.faction_stat("guard", "greed"), 1);
        assert_eq!(fixture.outbox.for_player(player).last(), Some(&OutboundEvent::DialogClose));
    }

    #[test]
    fn test_invalid_index_is_ignored() {
        let mut fixture = fixture();
        let mut dialogs = DialogManager::new();
        let player = PlayerId::new();
        dialogs.start_interaction(&mut fixture.ctx(), player, "guard");
        let before = fixture.outbox.deliveries().len();

        // Index 2 exists on the node but only two responses are visible.
        dialogs.advance(&mut fixture.ctx(), player, 2);

        assert_eq!(fixture.outbox.deliveries().len(), before);
        assert_eq!(dialogs.session(player).unwrap().current_node, "n0");
    }

    #[test]
    fn test_conditional_response_becomes_visible() {
        let mut fixture = fixture();
        let player = PlayerId::new();
        fixture.ledger.give_items(player, "pass", 1);
        let mut dialogs = DialogManager::new();

        dialogs.start_interaction(&mut fixture.ctx(), player, "guard");
        match fixture.outbox.for_player(player).last() {
            Some(OutboundEvent::DialogOpen { responses, .. }) => assert_eq!(responses.len(), 3),
            other => panic!("expected dialog open, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_next_node_ends_without_branch() {
        let mut fixture = fixture();
        let mut dialogs = DialogManager::new();
        let player = PlayerId::new();
        dialogs.start_interaction(&mut fixture.ctx(), player, "guard");

        dialogs.advance(&mut fixture.ctx(), player, 1);

        assert!(!dialogs.has_session(player));
        assert_eq!(fixture.state.quest_state(&id("city.gate")), QuestState::Active);
        assert_eq!(fixture.outbox.for_player(player).last(), Some(&OutboundEvent::DialogClose));
    }

    #[test]
    fn test_disconnect_drops_session_without_completing() {
        let mut fixture = fixture();
        let mut dialogs = DialogManager::new();
        let player = PlayerId::new();
        dialogs.start_interaction(&mut fixture.ctx(), player, "guard");
        dialogs.advance(&mut fixture.ctx(), player, 0);

        dialogs.disconnect(player);

        assert_eq!(dialogs.session_count(), 0);
        assert_eq!(fixture.state.quest_state(&id("city.gate")), QuestState::Active);
    }

    #[test]
    fn test_close_commits_selected_branch() {
        let mut fixture = fixture();
        let mut dialogs = DialogManager::new();
        let player = PlayerId::new();
        dialogs.start_interaction(&mut fixture.ctx(), player, "guard");
        dialogs.advance(&mut fixture.ctx(), player, 0);

        dialogs.end_dialog(&mut fixture.ctx(), player);

        assert_eq!(fixture.state.quest_state(&id("city.gate")), QuestState::Completed);
    }

    #[test]
    fn test_nothing_to_say() {
        let mut fixture = fixture();
        let mut dialogs = DialogManager::new();
        let player = PlayerId::new();

        dialogs.start_interaction(&mut fixture.ctx(), player, "baker");

        assert_eq!(
            fixture.outbox.for_player(player).last(),
            Some(&OutboundEvent::SystemMessage {
                text: "baker has nothing to say right now.".into()
            })
        );
        assert!(!dialogs.has_session(player));
    }
}
