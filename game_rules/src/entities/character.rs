//! Character definitions.

use serde::{Deserialize, Serialize};

/// A non-player character as declared in content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub appearance: Appearance,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub speech: SpeechStyle,
    #[serde(default)]
    pub backstory: String,

    /// Where the character lives when no quest has pulled them away.
    pub home_location: String,
}

impl Character {
    /// Create a character with the given id, display name and home.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        home_location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            appearance: Appearance::default(),
            personality: String::new(),
            speech: SpeechStyle::default(),
            backstory: String::new(),
            home_location: home_location.into(),
        }
    }

    /// Set the backstory.
    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }
}

/// Appearance descriptor handed to the rendering collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub age_range: String,
    #[serde(default)]
    pub notable_features: Vec<String>,
}

/// How a character talks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechStyle {
    #[serde(default)]
    pub formality: String,
    #[serde(default)]
    pub vocabulary: String,
    #[serde(default)]
    pub verbal_tics: Vec<String>,
    #[serde(default)]
    pub avoids: Vec<String>,
    #[serde(default)]
    pub sample_lines: Vec<String>,
}
