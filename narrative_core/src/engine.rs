//! Engine - owns the world and runs the tick loop.
//!
//! Hosts enqueue [`Command`]s from any player; nothing touches the world until
//! [`Engine::tick`] applies them one after another. Events produced along the way
//! wait in the outbox until the host drains them.

use game_rules::{
    EngineConfig, Inventories, InventoryLedger, PersistError, PlayerId, QuestFullId, Tick,
    WorldState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

use crate::dialog::DialogManager;
use crate::events::{Command, HostEvent, OutboundEvent, Outbox, PartyAction};
use crate::party::{PartyManager, PlayerDirectory};
use crate::quests::{sweep, QuestManager, Resolution, WorldContext};
use crate::registry::{ContentRegistry, ContentSet, ValidationReport};

pub struct Engine {
    config: EngineConfig,
    registry: ContentRegistry,
    state: WorldState,
    inventories: Box<dyn Inventories>,
    outbox: Outbox,
    dialogs: DialogManager,
    players: PlayerDirectory,
    queue: VecDeque<(PlayerId, Command)>,
    rng: StdRng,
    tick: Tick,
}

impl Engine {
    /// Create an engine over a fresh world.
    pub fn new(config: EngineConfig, content: ContentSet) -> Self {
        Self::with_state(config, content, WorldState::new())
    }

    /// Create an engine over a previously saved world.
    pub fn with_state(config: EngineConfig, content: ContentSet, state: WorldState) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut engine = Self {
            config,
            registry: ContentRegistry::new(),
            state,
            inventories: Box::new(InventoryLedger::new()),
            outbox: Outbox::new(),
            dialogs: DialogManager::new(),
            players: PlayerDirectory::new(),
            queue: VecDeque::new(),
            rng,
            tick: 0,
        };
        engine.reload_content(content);
        engine
    }

    /// Build an engine from the content directory and save file named in `config`.
    ///
    /// Broken content files are logged and skipped. A missing save file starts a
    /// fresh world; an unreadable one is an error.
    pub fn open(config: EngineConfig) -> Result<Self, PersistError> {
        let content = match &config.content_dir {
            Some(dir) => {
                let (content, errors) = ContentSet::load_dir(dir);
                for error in &errors {
                    tracing::warn!(path = %error.path().display(), error = %error, "Skipping content file");
                }
                content
            }
            None => ContentSet::new(),
        };

        let state = match &config.save_path {
            Some(path) => WorldState::load(path)?,
            None => WorldState::new(),
        };

        Ok(Self::with_state(config, content, state))
    }

    /// Swap in new content, validate it and bring the world up to date with it.
    pub fn reload_content(&mut self, content: ContentSet) -> ValidationReport {
        self.registry.load(content);
        let report = self.registry.validate();
        self.initialize_world();
        report
    }

    /// Replace the inventory collaborator.
    pub fn with_inventories(mut self, inventories: Box<dyn Inventories>) -> Self {
        self.inventories = inventories;
        self
    }

    fn initialize_world(&mut self) {
        for faction in self.registry.factions() {
            for (stat, &initial) in &faction.stats {
                if initial != 0 && self.state.faction_stat(&faction.id, stat) == 0 {
                    self.state.set_faction_stat(&faction.id, stat, initial);
                }
            }
        }

        let mut placed = 0;
        for character in self.registry.characters() {
            if self.state.character_location(&character.id).is_none() {
                self.state
                    .set_character_location(&character.id, &character.home_location);
                placed += 1;
            }
        }
        tracing::info!(placed, "Placed characters at their homes");

        let tick = self.tick;
        let (mut ctx, _) = self.split(tick);
        QuestManager::new(&mut ctx).initialize_states();
    }

    /// Borrow the world for one unit of work, alongside the dialog sessions.
    fn split(&mut self, now: Tick) -> (WorldContext<'_>, &mut DialogManager) {
        let ctx = WorldContext {
            registry: &self.registry,
            state: &mut self.state,
            inventories: self.inventories.as_mut(),
            outbox: &mut self.outbox,
            now,
        };
        (ctx, &mut self.dialogs)
    }

    /// Register a connected player, add them to the party and send them the quest table.
    pub fn player_joined(&mut self, player: PlayerId, name: impl Into<String>) {
        let name = name.into();
        tracing::info!(player = %player, name = %name, "Player joined");
        self.players.insert(player, name);

        PartyManager::new(&mut self.state, &mut self.outbox, &self.players).on_player_enter(player);

        let tick = self.tick;
        let (mut ctx, _) = self.split(tick);
        let states = QuestManager::new(&mut ctx).quest_state_table();
        self.outbox.send(player, OutboundEvent::QuestStates { states });
    }

    /// Forget a departed player. Party membership is kept for their return.
    pub fn player_left(&mut self, player: PlayerId) {
        self.dialogs.disconnect(player);
        self.queue.retain(|(from, _)| *from != player);
        if let Some(name) = self.players.remove(player) {
            tracing::info!(player = %player, name = %name, "Player left");
        }
    }

    /// Queue a command. It is applied on the next [`Engine::tick`].
    pub fn enqueue(&mut self, player: PlayerId, command: Command) {
        self.queue.push_back((player, command));
    }

    /// Advance the world by one tick. Returns the quests the sweep resolved.
    pub fn tick(&mut self) -> Vec<(QuestFullId, Resolution)> {
        self.tick += 1;

        while let Some((player, command)) = self.queue.pop_front() {
            self.dispatch(player, command);
        }

        if self.tick % self.config.sweep_interval() != 0 {
            return Vec::new();
        }

        let tick = self.tick;
        let ticks_per_level = self.config.ticks_per_level;
        let mut ctx = WorldContext {
            registry: &self.registry,
            state: &mut self.state,
            inventories: self.inventories.as_mut(),
            outbox: &mut self.outbox,
            now: tick,
        };
        sweep(&mut ctx, ticks_per_level, &mut self.rng)
    }

    fn dispatch(&mut self, player: PlayerId, command: Command) {
        tracing::debug!(player = %player, command = ?command, "Applying command");
        let tick = self.tick;

        match command {
            Command::CreateCharacterEntity { name, race } => {
                tracing::info!(player = %player, name = %name, race = %race, "Character entity requested");
                self.outbox
                    .host(HostEvent::SpawnCharacterEntity { player, name, race });
            }
            Command::Interact { character } => {
                let (mut ctx, dialogs) = self.split(tick);
                dialogs.start_interaction(&mut ctx, player, &character);
            }
            Command::AcceptQuest { quest } => {
                let (mut ctx, _) = self.split(tick);
                if !QuestManager::new(&mut ctx).accept(&quest) {
                    self.outbox
                        .system_message(player, "That quest is not available.");
                }
            }
            Command::DialogResponse { index } => {
                let (mut ctx, dialogs) = self.split(tick);
                dialogs.advance(&mut ctx, player, index);
            }
            Command::CloseDialog => {
                let (mut ctx, dialogs) = self.split(tick);
                dialogs.end_dialog(&mut ctx, player);
            }
            Command::RequestJournal => {
                let (mut ctx, _) = self.split(tick);
                QuestManager::new(&mut ctx).send_journal(player);
            }
            Command::Party { action } => {
                let mut party = PartyManager::new(&mut self.state, &mut self.outbox, &self.players);
                match action {
                    PartyAction::AcceptInvite => party.accept_invite(player),
                    PartyAction::RequestJoin => party.request_join(player),
                    PartyAction::Leave => party.leave(player),
                }
            }
            Command::PartyInvite { target } => {
                if !self.players.is_online(target) {
                    self.outbox.system_message(player, "Player not found.");
                    return;
                }
                PartyManager::new(&mut self.state, &mut self.outbox, &self.players).invite(player, target);
            }
            Command::PartyKick { target } => {
                PartyManager::new(&mut self.state, &mut self.outbox, &self.players).kick(player, target);
            }
            Command::PartyAccept { target } => {
                PartyManager::new(&mut self.state, &mut self.outbox, &self.players)
                    .accept_request(player, target);
            }
        }
    }

    /// Take every player-addressed event produced since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<(PlayerId, OutboundEvent)> {
        self.outbox.drain_deliveries()
    }

    /// Take every world change the host must mirror since the last drain.
    pub fn drain_host_events(&mut self) -> Vec<HostEvent> {
        self.outbox.drain_host_events()
    }

    /// Write the world to the configured save path if anything changed.
    ///
    /// Returns whether a write happened.
    pub fn save(&mut self) -> Result<bool, PersistError> {
        let Some(path) = &self.config.save_path else {
            return Ok(false);
        };
        if !self.state.is_dirty() {
            return Ok(false);
        }

        self.state.save(path)?;
        self.state.mark_clean();
        tracing::info!(path = %path.display(), tick = self.tick, "Saved world state");
        Ok(true)
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn players(&self) -> &PlayerDirectory {
        &self.players
    }

    pub fn dialogs(&self) -> &DialogManager {
        &self.dialogs
    }

    pub fn inventories_mut(&mut self) -> &mut dyn Inventories {
        self.inventories.as_mut()
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_rules::{Character, Faction, Location, Quest, QuestBranch, QuestState};

    fn content() -> ContentSet {
        ContentSet::new()
            .with_location(Location::new("harbor", "Harbor", "calm"))
            .with_character(Character::new("mira", "Mira", "harbor"))
            .with_faction(Faction::new("guild", "Guild").with_stat("trust", 3))
            .with_quest(Quest::new("guild", "a", "harbor").with_branch(QuestBranch::new("x")))
    }

    fn config() -> EngineConfig {
        EngineConfig {
            auto_resolve_interval: 10,
            ticks_per_level: 20,
            ..EngineConfig::default()
        }
        .with_seed(9)
    }

    #[test]
    fn test_start_initializes_world() {
        let engine = Engine::new(config(), content());
        let state = engine.state();

        assert_eq!(state.faction_stat("guild", "trust"), 3);
        assert_eq!(state.character_location("mira"), Some("harbor"));
        assert_eq!(state.quest_state(&QuestFullId::from("guild.a")), QuestState::Available);
    }

    #[test]
    fn test_saved_progress_survives_start() {
        let mut saved = WorldState::new();
        saved.set_faction_stat("guild", "trust", 8);
        saved.set_character_location("mira", "docks");

        let engine = Engine::with_state(config(), content(), saved);
        assert_eq!(engine.state().faction_stat("guild", "trust"), 8);
        assert_eq!(engine.state().character_location("mira"), Some("docks"));
    }

    #[test]
    fn test_commands_wait_for_tick() {
        let mut engine = Engine::new(config(), content());
        let player = PlayerId::new();
        engine.player_joined(player, "Ana");
        engine.drain_outbox();

        let quest = QuestFullId::from("guild.a");
        engine.enqueue(player, Command::AcceptQuest { quest: quest.clone() });
        assert_eq!(engine.state().quest_state(&quest), QuestState::Available);
        assert_eq!(engine.pending_commands(), 1);

        engine.tick();
        assert_eq!(engine.state().quest_state(&quest), QuestState::Active);
        assert_eq!(engine.state().quest_timer(&quest), Some(1));

        // A second accept is refused.
        engine.enqueue(player, Command::AcceptQuest { quest: quest.clone() });
        engine.tick();
        let deliveries = engine.drain_outbox();
        assert!(deliveries.iter().any(|(to, event)| *to == player
            && *event
                == OutboundEvent::SystemMessage {
                    text: "That quest is not available.".into()
                }));
    }

    #[test]
    fn test_sweep_runs_on_interval() {
        let mut engine = Engine::new(config(), content());
        let player = PlayerId::new();
        engine.player_joined(player, "Ana");

        let quest = QuestFullId::from("guild.a");
        engine.enqueue(player, Command::AcceptQuest { quest: quest.clone() });

        let mut resolved = Vec::new();
        for _ in 0..30 {
            resolved.extend(engine.tick());
        }

        // Accepted on tick 1, due at tick 21, swept on tick 30.
        assert_eq!(resolved, vec![(quest.clone(), Resolution::Fail)]);
        assert_eq!(engine.state().quest_state(&quest), QuestState::Failed);
    }

    #[test]
    fn test_create_character_entity_reaches_host() {
        let mut engine = Engine::new(config(), content());
        let player = PlayerId::new();
        engine.enqueue(
            player,
            Command::CreateCharacterEntity {
                name: "Bo".into(),
                race: "dwarf".into(),
            },
        );
        engine.tick();

        assert_eq!(
            engine.drain_host_events(),
            vec![HostEvent::SpawnCharacterEntity {
                player,
                name: "Bo".into(),
                race: "dwarf".into(),
            }]
        );
    }

    #[test]
    fn test_save_only_when_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        let config = EngineConfig {
            save_path: Some(path.clone()),
            ..config()
        };

        let mut engine = Engine::new(config.clone(), content());
        assert!(engine.save().unwrap());
        assert!(!engine.save().unwrap());

        let reopened = Engine::open(config).unwrap();
        assert_eq!(reopened.state(), engine.state());
    }

    #[test]
    fn test_leaving_drops_dialog_and_queue() {
        let mut engine = Engine::new(config(), content());
        let player = PlayerId::new();
        engine.player_joined(player, "Ana");
        engine.enqueue(player, Command::RequestJournal);

        engine.player_left(player);
        assert_eq!(engine.pending_commands(), 0);
        assert!(!engine.players().is_online(player));
        assert!(!engine.dialogs().has_session(player));
    }
}
