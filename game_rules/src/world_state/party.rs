//! The party record: leader, members and pending invites or requests.

use std::collections::BTreeSet;

use crate::entities::PlayerId;

/// The world's party: a leader, members and pending invites/requests.
///
/// The leader, when present, is always a member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Party {
    leader: Option<PlayerId>,
    members: BTreeSet<PlayerId>,
    pending_invites: BTreeSet<PlayerId>,
    pending_requests: BTreeSet<PlayerId>,
}

impl Party {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a party from stored parts, restoring the leader invariant.
    pub fn from_parts(
        leader: Option<PlayerId>,
        members: impl IntoIterator<Item = PlayerId>,
        pending_invites: impl IntoIterator<Item = PlayerId>,
        pending_requests: impl IntoIterator<Item = PlayerId>,
    ) -> Self {
        let mut members: BTreeSet<PlayerId> = members.into_iter().collect();
        if let Some(leader) = leader {
            members.insert(leader);
        }
        Self {
            leader,
            members,
            pending_invites: pending_invites.into_iter().collect(),
            pending_requests: pending_requests.into_iter().collect(),
        }
    }

    pub fn leader(&self) -> Option<PlayerId> {
        self.leader
    }

    pub fn is_leader(&self, player: PlayerId) -> bool {
        self.leader == Some(player)
    }

    /// Make a member the leader. Non-members are refused.
    pub fn set_leader(&mut self, player: PlayerId) -> bool {
        if !self.members.contains(&player) {
            return false;
        }
        self.leader = Some(player);
        true
    }

    pub fn members(&self) -> &BTreeSet<PlayerId> {
        &self.members
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.members.contains(&player)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn add_member(&mut self, player: PlayerId) -> bool {
        self.members.insert(player)
    }

    /// Remove a member. A departing leader hands over to a remaining member.
    pub fn remove_member(&mut self, player: PlayerId) -> bool {
        if !self.members.remove(&player) {
            return false;
        }
        if self.leader == Some(player) {
            self.leader = self.members.iter().next().copied();
        }
        true
    }

    pub fn pending_invites(&self) -> &BTreeSet<PlayerId> {
        &self.pending_invites
    }

    pub fn has_invite(&self, player: PlayerId) -> bool {
        self.pending_invites.contains(&player)
    }

    pub fn add_invite(&mut self, player: PlayerId) -> bool {
        self.pending_invites.insert(player)
    }

    pub fn remove_invite(&mut self, player: PlayerId) -> bool {
        self.pending_invites.remove(&player)
    }

    pub fn pending_requests(&self) -> &BTreeSet<PlayerId> {
        &self.pending_requests
    }

    pub fn has_request(&self, player: PlayerId) -> bool {
        self.pending_requests.contains(&player)
    }

    pub fn add_request(&mut self, player: PlayerId) -> bool {
        self.pending_requests.insert(player)
    }

    pub fn remove_request(&mut self, player: PlayerId) -> bool {
        self.pending_requests.remove(&player)
    }
}
