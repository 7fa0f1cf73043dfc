//! Podcast script data model.

use crate::repair::{fields, Repair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GENERIC_PERSONALITY: &str = "Thoughtful and articulate";
pub const GENERIC_EXPERTISE: &str = "General knowledge";
pub const GENERIC_PERSPECTIVE: &str = "Balanced viewpoint";
pub const FILLER_TEXT: &str = "I agree with what was said.";

/// Overall style of the conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Casual,
    #[default]
    Educational,
    Entertaining,
    Debate,
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tone::Formal => write!(f, "formal"),
            Tone::Casual => write!(f, "casual"),
            Tone::Educational => write!(f, "educational"),
            Tone::Entertaining => write!(f, "entertaining"),
            Tone::Debate => write!(f, "debate"),
        }
    }
}

impl std::str::FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "formal" => Ok(Tone::Formal),
            "casual" => Ok(Tone::Casual),
            "educational" => Ok(Tone::Educational),
            "entertaining" => Ok(Tone::Entertaining),
            "debate" => Ok(Tone::Debate),
            _ => Err(format!("Unknown tone: {}", s)),
        }
    }
}

/// Options controlling script generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptOptions {
    /// Exact number of speakers (at least 1).
    pub speaker_count: usize,
    /// Target number of dialogue turns. The model may return more or fewer.
    pub turn_count: usize,
    pub tone: Tone,
    /// Topics the conversation should emphasize.
    pub focus_topics: Vec<String>,
    pub include_introduction: bool,
    pub include_conclusion: bool,
    /// Personality hints, one per speaker in order.
    pub speaker_personalities: Vec<String>,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            speaker_count: 2,
            turn_count: 15,
            tone: Tone::default(),
            focus_topics: Vec::new(),
            include_introduction: true,
            include_conclusion: true,
            speaker_personalities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub id: String,
    pub name: String,
    pub personality: String,
    pub expertise: Vec<String>,
    pub perspective: String,
}

impl Speaker {
    /// Placeholder speaker for position `index` (zero-based).
    pub fn generic(index: usize) -> Self {
        let n = index + 1;
        Self {
            id: format!("speaker-{}", n),
            name: format!("Speaker {}", n),
            personality: GENERIC_PERSONALITY.to_string(),
            expertise: vec![GENERIC_EXPERTISE.to_string()],
            perspective: GENERIC_PERSPECTIVE.to_string(),
        }
    }
}

impl Repair for Speaker {
    fn repair(value: &Value, index: usize) -> Self {
        let generic = Speaker::generic(index);
        Self {
            id: fields::string_or(value, &["id"], generic.id),
            name: fields::string_or(value, &["name"], generic.name),
            personality: fields::string_or(value, &["personality"], generic.personality),
            expertise: fields::string_list(value, &["expertise"]).unwrap_or(generic.expertise),
            perspective: fields::string_or(value, &["perspective"], generic.perspective),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueTurn {
    pub speaker_id: String,
    pub speaker_name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

impl Repair for DialogueTurn {
    fn repair(value: &Value, _index: usize) -> Self {
        Self {
            speaker_id: fields::string_or(value, &["speakerId", "speaker_id", "speaker"], ""),
            speaker_name: fields::string_or(value, &["speakerName", "speaker_name"], ""),
            text: fields::string_or(value, &["text", "line", "content"], ""),
            emotion: fields::string(value, &["emotion", "tone"]),
            references: fields::string_list(value, &["references"]).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMetadata {
    pub topic_count: usize,
    pub entity_count: usize,
    pub speaker_count: usize,
    pub turn_count: usize,
    pub generated_at: DateTime<Utc>,
    pub options: ScriptOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastScript {
    pub id: String,
    pub title: String,
    pub description: String,
    pub speakers: Vec<Speaker>,
    /// Narrator introduction; empty when disabled.
    pub introduction: String,
    pub dialogue: Vec<DialogueTurn>,
    /// Narrator conclusion; empty when disabled.
    pub conclusion: String,
    pub source_knowledge_graph_id: String,
    pub metadata: ScriptMetadata,
}

impl PodcastScript {
    pub fn speaker(&self, id: &str) -> Option<&Speaker> {
        self.speakers.iter().find(|s| s.id == id)
    }
}
