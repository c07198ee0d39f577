use game_rules::{evaluate_condition, DialogNode, Inventories, PlayerId, QuestFullId, WorldState};

/// One player's cursor over a dialog tree.
///
/// The tree is held by id so a content reload never leaves a session pointing at
/// stale data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSession {
    pub dialog_id: String,
    pub quest: QuestFullId,
    pub current_node: String,
    /// Branch chosen during the conversation, committed when it ends.
    pub selected_branch: Option<String>,
    /// Indices into the current node's responses that passed their conditions.
    visible: Vec<usize>,
}

impl DialogSession {
    pub fn new(dialog_id: impl Into<String>, quest: QuestFullId, start_node: impl Into<String>) -> Self {
        Self {
            dialog_id: dialog_id.into(),
            quest,
            current_node: start_node.into(),
            selected_branch: None,
            visible: Vec::new(),
        }
    }

    /// Recompute the visible responses of `node` for `player`. Returns their texts.
    pub fn filter_responses(
        &mut self,
        node: &DialogNode,
        state: &WorldState,
        inventories: &dyn Inventories,
        player: PlayerId,
    ) -> Vec<String> {
        self.visible = node
            .responses
            .iter()
            .enumerate()
            .filter(|(_, response)| {
                response
                    .condition
                    .as_ref()
                    .map_or(true, |condition| evaluate_condition(condition, state, inventories, player))
            })
            .map(|(index, _)| index)
            .collect();

        self.visible
            .iter()
            .map(|&index| node.responses[index].text.clone())
            .collect()
    }

    /// Map a visible-response index back to the node's response index.
    pub fn response_index(&self, visible_index: usize) -> Option<usize> {
        self.visible.get(visible_index).copied()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_rules::{DialogCondition, DialogResponse, InventoryLedger};

    #[test]
    fn test_filter_responses() {
        let node = DialogNode::new("n0", "mira", "Well?")
            .with_response(DialogResponse::new("r0", "a"))
            .with_response(DialogResponse::new("r1", "b").with_condition(DialogCondition {
                global_var: Some("secret".into()),
                ..Default::default()
            }))
            .with_response(DialogResponse::new("r2", "c"));

        let mut session = DialogSession::new("talk", QuestFullId::from("guild.a"), "n0");
        let mut state = WorldState::new();
        let ledger = InventoryLedger::new();
        let player = PlayerId::new();

        let texts = session.filter_responses(&node, &state, &ledger, player);
        assert_eq!(texts, vec!["r0", "r2"]);
        assert_eq!(session.response_index(1), Some(2));
        assert_eq!(session.response_index(2), None);

        state.set_global_var("secret", true);
        let texts = session.filter_responses(&node, &state, &ledger, player);
        assert_eq!(texts.len(), 3);
        assert_eq!(session.visible_count(), 3);
    }
}
