//! Outcome Applicator - turns declarative outcome records into world-state writes.
//!
//! No decisions are made here; callers decide when an outcome applies and make
//! sure it applies once.

use game_rules::{DialogOutcome, PlayerId, QuestOutcomes};

use super::WorldContext;
use crate::events::HostEvent;

/// Apply a branch outcome. Extra dialog lines are tagged with `source`.
pub fn apply_quest_outcomes(ctx: &mut WorldContext, outcomes: &QuestOutcomes, source: &str) {
    for (key, delta) in &outcomes.faction_stats {
        ctx.state.add_faction_stat(&key.faction, &key.stat, *delta);
        tracing::debug!(stat = %key, delta, "Applied faction stat");
    }

    for (name, value) in &outcomes.global_vars {
        ctx.state.set_global_var(name, *value);
        tracing::debug!(var = %name, value, "Set global var");
    }

    for (location, state) in &outcomes.location_states {
        ctx.state.set_location_state(location, state.clone());
        ctx.outbox.host(HostEvent::LocationStateChanged {
            location: location.clone(),
            state: state.clone(),
        });
        tracing::debug!(location = %location, state = %state, "Set location state");
    }

    for extra in &outcomes.character_extras {
        ctx.state
            .add_character_extra(&extra.character, extra.text.clone(), source);
        tracing::debug!(character = %extra.character, "Added character extra");
    }

    for (character, location) in &outcomes.move_characters {
        ctx.state.set_character_location(character, location.clone());
        ctx.outbox.host(HostEvent::CharacterMoved {
            character: character.clone(),
            location: location.clone(),
        });
        tracing::debug!(character = %character, location = %location, "Moved character");
    }

    for faction in &outcomes.unlock_factions {
        if ctx.registry.faction(faction).is_some() {
            tracing::info!(faction = %faction, "Unlocked faction");
        } else {
            tracing::warn!(faction = %faction, "Cannot unlock unknown faction");
        }
    }
}

/// Apply a dialog node outcome for `player`. Returns the branch it selects, if any.
pub fn apply_dialog_outcome(ctx: &mut WorldContext, outcome: &DialogOutcome, player: PlayerId) -> Option<String> {
    for (key, delta) in &outcome.faction_stats {
        ctx.state.add_faction_stat(&key.faction, &key.stat, *delta);
        tracing::debug!(stat = %key, delta, "Applied dialog faction stat");
    }

    for (name, value) in &outcome.global_vars {
        ctx.state.set_global_var(name, *value);
    }

    for (item, count) in &outcome.give_items {
        ctx.inventories.give_items(player, item, *count);
        tracing::debug!(player = %player, item = %item, count, "Gave items");
    }

    for (item, count) in &outcome.take_items {
        let taken = ctx.inventories.take_items(player, item, *count);
        if taken < *count {
            tracing::warn!(player = %player, item = %item, wanted = count, taken, "Player was short of items");
        }
    }

    outcome.select_branch.clone()
}
