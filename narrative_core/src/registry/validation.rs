//! Cross-reference validation of loaded content.
//!
//! Validation only reports. Broken references stay in the registry and surface
//! as missing lookups at runtime.

use game_rules::{QuestFullId, QuestLink};
use thiserror::Error;

use super::ContentRegistry;

/// A content problem found by [`ContentRegistry::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentWarning {
    #[error("quest {quest} references unknown location: {location}")]
    UnknownQuestLocation { quest: QuestFullId, location: String },
    #[error("quest {quest} references unknown character: {character}")]
    UnknownQuestCharacter { quest: QuestFullId, character: String },
    #[error("quest {quest} references unknown faction: {faction}")]
    UnknownQuestFaction { quest: QuestFullId, faction: String },
    #[error("quest {quest} references unknown dialog: {dialog}")]
    UnknownQuestDialog { quest: QuestFullId, dialog: String },
    #[error("quest {quest} branch {branch} {} unknown quest: {target}", .link.as_str())]
    UnknownQuestReference {
        quest: QuestFullId,
        branch: String,
        link: QuestLink,
        target: QuestFullId,
    },
    #[error("quest {quest} has no branches")]
    NoBranches { quest: QuestFullId },
    #[error("quest {quest} has level 0, treated as 1")]
    ZeroLevel { quest: QuestFullId },
    #[error("character {character} has unknown home_location: {location}")]
    UnknownHomeLocation { character: String, location: String },
    #[error("faction {faction} references unknown member: {character}")]
    UnknownFactionMember { faction: String, character: String },
    #[error("dialog {dialog} has unknown start node: {node}")]
    MissingStartNode { dialog: String, node: String },
    #[error("dialog {dialog} node {node} points to unknown node: {next}")]
    UnknownNextNode {
        dialog: String,
        node: String,
        next: String,
    },
    #[error("dialog {dialog} node {node} has unknown speaker: {speaker}")]
    UnknownSpeaker {
        dialog: String,
        node: String,
        speaker: String,
    },
}

/// Every warning from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<ContentWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentWarning> {
        self.warnings.iter()
    }

    fn push(&mut self, warning: ContentWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

impl ContentRegistry {
    /// Check every cross-reference and log what is broken.
    pub fn validate(&self) -> ValidationReport {
        tracing::info!("Validating narrative content cross-references");
        let mut report = ValidationReport::default();

        for quest in self.quests() {
            let id = quest.full_id();

            if self.location(&quest.location).is_none() {
                report.push(ContentWarning::UnknownQuestLocation {
                    quest: id.clone(),
                    location: quest.location.clone(),
                });
            }
            for character in &quest.characters {
                if self.character(character).is_none() {
                    report.push(ContentWarning::UnknownQuestCharacter {
                        quest: id.clone(),
                        character: character.clone(),
                    });
                }
            }
            if self.faction(&quest.faction_id).is_none() {
                report.push(ContentWarning::UnknownQuestFaction {
                    quest: id.clone(),
                    faction: quest.faction_id.clone(),
                });
            }
            if quest.has_dialog() && self.dialog(&quest.dialog_id).is_none() {
                report.push(ContentWarning::UnknownQuestDialog {
                    quest: id.clone(),
                    dialog: quest.dialog_id.clone(),
                });
            }
            if quest.branches.is_empty() {
                report.push(ContentWarning::NoBranches { quest: id.clone() });
            }
            if quest.level == 0 {
                report.push(ContentWarning::ZeroLevel { quest: id.clone() });
            }

            for branch in &quest.branches {
                for (link, target) in branch.outcomes.quest_references() {
                    if self.quest(target).is_none() {
                        report.push(ContentWarning::UnknownQuestReference {
                            quest: id.clone(),
                            branch: branch.id.clone(),
                            link,
                            target: target.clone(),
                        });
                    }
                }
            }
        }

        for character in self.characters() {
            if self.location(&character.home_location).is_none() {
                report.push(ContentWarning::UnknownHomeLocation {
                    character: character.id.clone(),
                    location: character.home_location.clone(),
                });
            }
        }

        for faction in self.factions() {
            for member in &faction.members {
                if self.character(member).is_none() {
                    report.push(ContentWarning::UnknownFactionMember {
                        faction: faction.id.clone(),
                        character: member.clone(),
                    });
                }
            }
        }

        for dialog in self.dialogs() {
            if dialog.start().is_none() {
                report.push(ContentWarning::MissingStartNode {
                    dialog: dialog.id.clone(),
                    node: dialog.start_node.clone(),
                });
            }
            for node in dialog.nodes.values() {
                if self.character(&node.speaker).is_none() {
                    report.push(ContentWarning::UnknownSpeaker {
                        dialog: dialog.id.clone(),
                        node: node.id.clone(),
                        speaker: node.speaker.clone(),
                    });
                }
                for response in &node.responses {
                    if dialog.node(&response.next_node).is_none() {
                        report.push(ContentWarning::UnknownNextNode {
                            dialog: dialog.id.clone(),
                            node: node.id.clone(),
                            next: response.next_node.clone(),
                        });
                    }
                }
            }
        }

        if report.is_clean() {
            tracing::info!("Content validation passed with no warnings");
        } else {
            tracing::warn!(warnings = report.len(), "Content validation completed with warnings");
        }
        report
    }
}
