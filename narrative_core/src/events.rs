//! Events crossing the engine boundary.
//!
//! Inbound [`Command`]s are queued by the host and applied on the tick. Outbound
//! [`OutboundEvent`]s are addressed to players; [`HostEvent`]s tell the host game
//! about world changes it must mirror (moving NPC entities, restyling locations).

use game_rules::{PlayerId, QuestFullId, QuestState, Tick};
use serde::{Deserialize, Serialize};

/// A request from a player, applied on the next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Forwarded to the host as [`HostEvent::SpawnCharacterEntity`].
    CreateCharacterEntity { name: String, race: String },
    /// Talk to a character.
    Interact { character: String },
    AcceptQuest { quest: QuestFullId },
    /// Pick a response from the last visible list.
    DialogResponse { index: usize },
    CloseDialog,
    RequestJournal,
    Party { action: PartyAction },
    PartyInvite { target: PlayerId },
    PartyKick { target: PlayerId },
    /// Accept a join request from `target`.
    PartyAccept { target: PlayerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyAction {
    AcceptInvite,
    RequestJoin,
    Leave,
}

/// One quest line of the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub quest: QuestFullId,
    pub summary: String,
    pub faction_id: String,
    pub level: u32,
    pub state: QuestState,
    pub location: String,
    /// Tick the quest was accepted, 0 when it has no timer.
    pub timer: Tick,
}

/// A push to one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// The full quest-state table.
    QuestStates { states: Vec<(QuestFullId, QuestState)> },
    Journal { entries: Vec<JournalEntry> },
    PartySnapshot {
        leader: Option<String>,
        members: Vec<String>,
    },
    DialogOpen {
        speaker: String,
        text: String,
        responses: Vec<String>,
        quest: QuestFullId,
    },
    DialogUpdate {
        speaker: String,
        text: String,
        responses: Vec<String>,
    },
    DialogClose,
    PartyInviteNotice { from: String },
    SystemMessage { text: String },
}

/// A world change the host game has to act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    LocationStateChanged { location: String, state: String },
    CharacterMoved { character: String, location: String },
    SpawnCharacterEntity {
        player: PlayerId,
        name: String,
        race: String,
    },
}

/// Events produced during a tick, waiting for the host to collect them.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    deliveries: Vec<(PlayerId, OutboundEvent)>,
    host_events: Vec<HostEvent>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, player: PlayerId, event: OutboundEvent) {
        self.deliveries.push((player, event));
    }

    /// Send a copy of `event` to each player.
    pub fn broadcast<'a>(&mut self, players: impl IntoIterator<Item = &'a PlayerId>, event: OutboundEvent) {
        for player in players {
            self.deliveries.push((*player, event.clone()));
        }
    }

    pub fn system_message(&mut self, player: PlayerId, text: impl Into<String>) {
        self.send(player, OutboundEvent::SystemMessage { text: text.into() });
    }

    pub fn host(&mut self, event: HostEvent) {
        self.host_events.push(event);
    }

    pub fn deliveries(&self) -> &[(PlayerId, OutboundEvent)] {
        &self.deliveries
    }

    pub fn host_events(&self) -> &[HostEvent] {
        &self.host_events
    }

    /// Events queued for one player, in order.
    pub fn for_player(&self, player: PlayerId) -> impl Iterator<Item = &OutboundEvent> {
        self.deliveries
            .iter()
            .filter(move |(to, _)| *to == player)
            .map(|(_, event)| event)
    }

    pub fn drain_deliveries(&mut self) -> Vec<(PlayerId, OutboundEvent)> {
        std::mem::take(&mut self.deliveries)
    }

    pub fn drain_host_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.host_events)
    }
}
