use game_rules::{EngineConfig, PlayerId, QuestFullId, QuestState};
use narrative_core::{Command, ContentSet, Engine, HostEvent, OutboundEvent, PartyAction};
use std::fs;
use std::path::Path;

fn write(root: &Path, kind: &str, name: &str, json: &str) {
    let dir = root.join(kind);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), json).unwrap();
}

fn write_campaign(root: &Path) {
    write(
        root,
        "locations",
        "harbor.json",
        r#"{
            "id": "harbor",
            "name": "Harbor",
            "default_state": "calm",
            "default_connections": ["docks"],
            "states": {
                "calm": {"description": "Gulls and rope."},
                "festive": {"description": "Lanterns everywhere.", "atmosphere": {"mood": "joyful"}}
            }
        }"#,
    );
    write(
        root,
        "locations",
        "docks.json",
        r#"{"id": "docks", "name": "Docks", "default_state": "busy", "default_connections": ["harbor"]}"#,
    );
    write(
        root,
        "characters",
        "mira.json",
        r#"{"id": "mira", "name": "Mira", "home_location": "harbor", "appearance": {"race": "elf"}}"#,
    );
    write(
        root,
        "factions",
        "guild.json",
        r#"{"id": "guild", "name": "Harbor Guild", "stats": {"trust": 2}, "members": ["mira"]}"#,
    );
    write(
        root,
        "quests",
        "rescue.json",
        r#"{
            "id": "rescue",
            "faction_id": "guild",
            "summary": "Pull the crew from the wreck.",
            "location": "docks",
            "dialog_id": "rescue_talk",
            "characters": ["mira"],
            "branches": [
                {
                    "id": "saved",
                    "outcomes": {
                        "faction_stats": {"guild.trust": 3},
                        "location_states": {"harbor": "festive"},
                        "unlocks": ["guild.reward"],
                        "blocks": ["guild.betray"]
                    }
                }
            ]
        }"#,
    );
    write(
        root,
        "quests",
        "reward.json",
        r#"{
            "id": "reward",
            "faction_id": "guild",
            "location": "harbor",
            "requirements": {"quests_completed": ["guild.rescue"]},
            "branches": [{"id": "paid"}]
        }"#,
    );
    write(
        root,
        "quests",
        "betray.json",
        r#"{"id": "betray", "faction_id": "guild", "location": "docks", "branches": [{"id": "sold"}]}"#,
    );
    write(
        root,
        "dialogs",
        "rescue_talk.json",
        r#"{
            "id": "rescue_talk",
            "start_node": "ask",
            "nodes": {
                "ask": {
                    "speaker": "mira",
                    "text": "The crew is trapped. Will you help?",
                    "responses": [
                        {"text": "I'll help.", "next_node": "thanks"},
                        {"text": "Pay me first.", "next_node": "haggle", "condition": {"has_item": "guild_seal"}}
                    ]
                },
                "haggle": {"speaker": "mira", "text": "Fine.", "responses": []},
                "thanks": {
                    "speaker": "mira",
                    "text": "Thank you!",
                    "responses": [],
                    "outcome": {"select_branch": "saved"}
                }
            }
        }"#,
    );
}

fn events_for(deliveries: &[(PlayerId, OutboundEvent)], player: PlayerId) -> Vec<&OutboundEvent> {
    deliveries
        .iter()
        .filter(|(to, _)| *to == player)
        .map(|(_, event)| event)
        .collect()
}

#[test]
fn test_campaign_through_dialog() {
    let dir = tempfile::tempdir().unwrap();
    let content_dir = dir.path().join("content");
    write_campaign(&content_dir);

    let config = EngineConfig {
        content_dir: Some(content_dir),
        save_path: Some(dir.path().join("saves").join("world.json")),
        ..EngineConfig::default()
    }
    .with_seed(11);

    let mut engine = Engine::open(config.clone()).unwrap();
    let rescue = QuestFullId::from("guild.rescue");
    let reward = QuestFullId::from("guild.reward");
    let betray = QuestFullId::from("guild.betray");

    assert_eq!(engine.state().quest_state(&rescue), QuestState::Available);
    assert_eq!(engine.state().quest_state(&reward), QuestState::Blocked);
    assert_eq!(engine.state().quest_state(&betray), QuestState::Available);
    assert_eq!(engine.state().faction_stat("guild", "trust"), 2);

    let (ana, ben) = (PlayerId::new(), PlayerId::new());
    engine.player_joined(ana, "Ana");
    engine.player_joined(ben, "Ben");
    engine.drain_outbox();

    // Talking to Mira accepts the quest and hides the gated response.
    engine.enqueue(ana, Command::Interact { character: "mira".into() });
    engine.tick();

    let deliveries = engine.drain_outbox();
    let opened = events_for(&deliveries, ana)
        .into_iter()
        .find(|event| matches!(event, OutboundEvent::DialogOpen { .. }))
        .cloned();
    assert_eq!(
        opened,
        Some(OutboundEvent::DialogOpen {
            speaker: "Mira".into(),
            text: "The crew is trapped. Will you help?".into(),
            responses: vec!["I'll help.".into()],
            quest: rescue.clone(),
        })
    );
    assert_eq!(engine.state().quest_state(&rescue), QuestState::Active);
    assert_eq!(engine.state().character_location("mira"), Some("docks"));

    // Party members see the accepted quest.
    assert!(events_for(&deliveries, ben)
        .iter()
        .any(|event| matches!(event, OutboundEvent::QuestStates { states }
            if states.contains(&(rescue.clone(), QuestState::Active)))));

    // The reply reaches a terminal node that picks the branch.
    engine.enqueue(ana, Command::DialogResponse { index: 0 });
    engine.tick();

    let state = engine.state();
    assert_eq!(state.quest_state(&rescue), QuestState::Completed);
    assert_eq!(state.completed_branch(&rescue), Some("saved"));
    assert_eq!(state.quest_state(&reward), QuestState::Available);
    assert_eq!(state.quest_state(&betray), QuestState::Blocked);
    assert_eq!(state.faction_stat("guild", "trust"), 5);
    assert_eq!(state.location_state("harbor"), Some("festive"));
    assert_eq!(state.character_location("mira"), Some("harbor"));
    assert!(!engine.dialogs().has_session(ana));

    let deliveries = engine.drain_outbox();
    assert!(events_for(&deliveries, ana).contains(&&OutboundEvent::DialogClose));

    let host_events = engine.drain_host_events();
    assert!(host_events.contains(&HostEvent::LocationStateChanged {
        location: "harbor".into(),
        state: "festive".into(),
    }));
    assert!(host_events.contains(&HostEvent::CharacterMoved {
        character: "mira".into(),
        location: "harbor".into(),
    }));

    // The journal reflects the new world.
    engine.enqueue(ben, Command::RequestJournal);
    engine.tick();
    let deliveries = engine.drain_outbox();
    let journal = events_for(&deliveries, ben)
        .into_iter()
        .find_map(|event| match event {
            OutboundEvent::Journal { entries } => Some(entries.clone()),
            _ => None,
        })
        .unwrap();
    let entry = journal.iter().find(|entry| entry.quest == rescue).unwrap();
    assert_eq!(entry.state, QuestState::Completed);
    assert_eq!(entry.summary, "Pull the crew from the wreck.");
    assert_eq!(entry.timer, 0);

    // Saved progress comes back intact, and blocked quests stay blocked.
    assert!(engine.save().unwrap());
    let reopened = Engine::open(config).unwrap();
    assert_eq!(reopened.state(), engine.state());
    assert_eq!(reopened.state().quest_state(&betray), QuestState::Blocked);
}

#[test]
fn test_leader_leaving_hands_party_over() {
    let mut engine = Engine::new(EngineConfig::default().with_seed(1), ContentSet::new());
    let (leader, member) = (PlayerId::new(), PlayerId::new());
    engine.player_joined(leader, "Lead");
    engine.player_joined(member, "Mem");

    engine.enqueue(leader, Command::Party { action: PartyAction::Leave });
    engine.tick();

    let party = engine.state().party();
    assert_eq!(party.leader(), Some(member));
    assert!(party.is_member(member));
    assert!(!party.is_member(leader));

    let deliveries = engine.drain_outbox();
    assert!(events_for(&deliveries, member).contains(&&OutboundEvent::PartySnapshot {
        leader: Some("Mem".into()),
        members: vec!["Mem".into()],
    }));
}

#[test]
fn test_invite_needs_online_target() {
    let mut engine = Engine::new(EngineConfig::default().with_seed(1), ContentSet::new());
    let leader = PlayerId::new();
    engine.player_joined(leader, "Lead");
    engine.drain_outbox();

    engine.enqueue(leader, Command::PartyInvite { target: PlayerId::new() });
    engine.tick();

    let deliveries = engine.drain_outbox();
    assert_eq!(
        events_for(&deliveries, leader),
        vec![&OutboundEvent::SystemMessage {
            text: "Player not found.".into()
        }]
    );
}

#[test]
fn test_nothing_to_say() {
    let dir = tempfile::tempdir().unwrap();
    write_campaign(dir.path());
    let (content, errors) = ContentSet::load_dir(dir.path());
    assert!(errors.is_empty());

    let mut engine = Engine::new(EngineConfig::default().with_seed(1), content);
    let ana = PlayerId::new();
    engine.player_joined(ana, "Ana");
    engine.drain_outbox();

    engine.enqueue(ana, Command::Interact { character: "stranger".into() });
    engine.tick();

    let deliveries = engine.drain_outbox();
    assert_eq!(
        events_for(&deliveries, ana),
        vec![&OutboundEvent::SystemMessage {
            text: "stranger has nothing to say right now.".into()
        }]
    );
}
