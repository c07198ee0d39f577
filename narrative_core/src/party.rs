//! Party Manager - invites, join requests, kicks and leadership.
//!
//! Refused actions leave the party untouched and tell the actor why. Every
//! membership change pushes a fresh party snapshot to all members.

use game_rules::{PlayerId, WorldState};
use std::collections::BTreeMap;

use crate::events::{OutboundEvent, Outbox};

/// Display names of connected players.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerDirectory {
    names: BTreeMap<PlayerId, String>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player: PlayerId, name: impl Into<String>) {
        self.names.insert(player, name.into());
    }

    pub fn remove(&mut self, player: PlayerId) -> Option<String> {
        self.names.remove(&player)
    }

    pub fn is_online(&self, player: PlayerId) -> bool {
        self.names.contains_key(&player)
    }

    /// Display name, or the id for unknown players.
    pub fn name(&self, player: PlayerId) -> String {
        self.names
            .get(&player)
            .cloned()
            .unwrap_or_else(|| player.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Party operations over the world's party record.
pub struct PartyManager<'a> {
    state: &'a mut WorldState,
    outbox: &'a mut Outbox,
    directory: &'a PlayerDirectory,
}

impl<'a> PartyManager<'a> {
    pub fn new(state: &'a mut WorldState, outbox: &'a mut Outbox, directory: &'a PlayerDirectory) -> Self {
        Self {
            state,
            outbox,
            directory,
        }
    }

    /// A player entered the world. The first one in leads the party.
    pub fn on_player_enter(&mut self, player: PlayerId) {
        let party = self.state.party_mut();
        party.add_member(player);
        if party.leader().is_none() {
            party.set_leader(player);
            self.outbox.system_message(player, "You are now the party leader!");
            tracing::info!(player = %player, "Player set as party leader");
        }
        self.sync_party();
    }

    pub fn invite(&mut self, leader: PlayerId, target: PlayerId) {
        let party = self.state.party();
        if !party.is_leader(leader) {
            self.outbox
                .system_message(leader, "Only the party leader can invite players.");
            return;
        }
        let target_name = self.directory.name(target);
        if party.is_member(target) {
            self.outbox
                .system_message(leader, format!("{target_name} is already in the party."));
            return;
        }

        self.state.party_mut().add_invite(target);
        self.outbox
            .system_message(leader, format!("Invited {target_name} to the party."));
        self.outbox.send(
            target,
            OutboundEvent::PartyInviteNotice {
                from: self.directory.name(leader),
            },
        );
        tracing::info!(leader = %leader, target = %target, "Party invite sent");
    }

    pub fn accept_invite(&mut self, player: PlayerId) {
        if !self.state.party().has_invite(player) {
            self.outbox
                .system_message(player, "You have no pending party invite.");
            return;
        }

        let party = self.state.party_mut();
        party.remove_invite(player);
        party.add_member(player);
        self.outbox.system_message(player, "You joined the party!");
        tracing::info!(player = %player, "Player accepted party invite");
        self.sync_party();
    }

    pub fn request_join(&mut self, player: PlayerId) {
        if self.state.party().is_member(player) {
            self.outbox
                .system_message(player, "You are already in the party.");
            return;
        }

        self.state.party_mut().add_request(player);
        self.outbox
            .system_message(player, "Join request sent to the party leader.");

        if let Some(leader) = self.state.party().leader() {
            let name = self.directory.name(player);
            self.outbox.system_message(
                leader,
                format!("{name} wants to join the party. Use /party accept <name>"),
            );
        }
    }

    pub fn accept_request(&mut self, leader: PlayerId, requester: PlayerId) {
        let party = self.state.party();
        if !party.is_leader(leader) {
            self.outbox
                .system_message(leader, "Only the party leader can accept requests.");
            return;
        }
        if !party.has_request(requester) {
            self.outbox
                .system_message(leader, "No pending request from that player.");
            return;
        }

        let party = self.state.party_mut();
        party.remove_request(requester);
        party.add_member(requester);
        self.outbox.system_message(requester, "You joined the party!");
        tracing::info!(leader = %leader, player = %requester, "Join request accepted");
        self.sync_party();
    }

    pub fn kick(&mut self, leader: PlayerId, target: PlayerId) {
        let party = self.state.party();
        if !party.is_leader(leader) {
            self.outbox
                .system_message(leader, "Only the party leader can kick players.");
            return;
        }
        if leader == target {
            self.outbox.system_message(leader, "You cannot kick yourself.");
            return;
        }
        if !party.is_member(target) {
            let name = self.directory.name(target);
            self.outbox
                .system_message(leader, format!("{name} is not in the party."));
            return;
        }

        self.state.party_mut().remove_member(target);
        self.outbox
            .system_message(target, "You have been kicked from the party.");
        tracing::info!(leader = %leader, target = %target, "Player kicked from party");
        self.sync_party();
    }

    pub fn leave(&mut self, player: PlayerId) {
        if !self.state.party().is_member(player) {
            self.outbox.system_message(player, "You are not in a party.");
            return;
        }

        self.state.party_mut().remove_member(player);
        self.outbox.system_message(player, "You left the party.");
        tracing::info!(player = %player, leader = ?self.state.party().leader(), "Player left party");
        self.sync_party();
    }

    /// Push the party snapshot to every member.
    pub fn sync_party(&mut self) {
        let party = self.state.party();
        let snapshot = OutboundEvent::PartySnapshot {
            leader: party.leader().map(|leader| self.directory.name(leader)),
            members: party
                .members()
                .iter()
                .map(|member| self.directory.name(*member))
                .collect(),
        };
        self.outbox.broadcast(party.members(), snapshot);
    }
}
