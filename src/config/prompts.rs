//! Prompt templates for Podsmith.
//!
//! Prompts can be customized by placing `understanding.toml` or `script.toml`
//! in the custom prompts directory. Templates use `{{name}}` placeholders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub understanding: UnderstandingPrompts,
    pub script: ScriptPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// A system message and a user message template.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    fn new(system: &str, user: &str) -> Self {
        Self {
            system: system.to_string(),
            user: user.to_string(),
        }
    }
}

const ANALYST_SYSTEM: &str = "You are an expert content analyst. You read source material carefully and answer only with the JSON structure you are asked for.";

/// Prompts for the content understanding stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderstandingPrompts {
    pub summary: PromptPair,
    pub topics: PromptPair,
    pub entities: PromptPair,
    pub relationships: PromptPair,
}

impl Default for UnderstandingPrompts {
    fn default() -> Self {
        Self {
            summary: PromptPair::new(
                "You are an expert content analyst who writes concise, factual summaries.",
                r#"Summarize the following content in no more than {{max_length}} characters.
Keep the original tone and perspective and focus on factual information.

CONTENT:
{{content}}

METADATA:
{{metadata}}"#,
            ),

            topics: PromptPair::new(
                ANALYST_SYSTEM,
                r#"Identify the main topics discussed in the content below.

For each topic provide a short name, a brief description, an importance score
from 1 to 10 (10 = most important) and a few direct quotes from the content.

CONTENT:
{{content}}

METADATA:
{{metadata}}

Respond with a JSON array:
[
  {
    "id": "topic-1",
    "name": "Topic Name",
    "description": "Brief description of the topic",
    "importance": 8,
    "relatedContent": ["Quote from the content"]
  }
]

Identify between 3 and 7 distinct topics."#,
            ),

            entities: PromptPair::new(
                ANALYST_SYSTEM,
                r#"Identify the important entities in the content below: people,
organizations, locations, products, technologies, concepts.

For each entity provide a canonical name, its type, direct quotes that mention
it and any attributes the content states about it.

CONTENT:
{{content}}

Respond with a JSON array:
[
  {
    "id": "entity-1",
    "name": "Entity Name",
    "type": "person|organization|location|product|technology|concept|other",
    "mentions": ["Quote mentioning the entity"],
    "attributes": {"attribute": "value"}
  }
]

Identify between 5 and 15 distinct entities."#,
            ),

            relationships: PromptPair::new(
                ANALYST_SYSTEM,
                r#"Identify relationships between the topics and entities listed below,
as supported by the content.

CONTENT:
{{content}}

TOPICS:
{{topics}}

ENTITIES:
{{entities}}

Use only the ids listed above as endpoints. For each relationship give a type
(e.g. "mentions", "supports", "contradicts", "is part of") and a strength from
1 to 10.

Respond with a JSON array:
[
  {
    "id": "rel-1",
    "sourceId": "topic-1",
    "targetId": "entity-1",
    "relationshipType": "mentions",
    "strength": 7
  }
]"#,
            ),
        }
    }
}

/// Prompts for the script stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptPrompts {
    pub speakers: PromptPair,
    pub introduction: PromptPair,
    pub dialogue: PromptPair,
    pub conclusion: PromptPair,
}

impl Default for ScriptPrompts {
    fn default() -> Self {
        Self {
            speakers: PromptPair::new(
                "You are an expert podcast producer who casts engaging, diverse speakers for podcast discussions.",
                r#"Create {{count}} distinct speakers for a {{tone}} podcast discussion about the
topics and entities below.

TOPICS:
{{topics}}

ENTITIES:
{{entities}}

{{personalities}}
Each speaker needs a name, a short personality description, two or three areas
of expertise and the perspective they bring. Speakers should be qualified but
approach the material from different angles.

Respond with a JSON array of exactly {{count}} speakers:
[
  {
    "id": "speaker-1",
    "name": "Speaker Name",
    "personality": "Brief personality description",
    "expertise": ["Area 1", "Area 2"],
    "perspective": "Their viewpoint"
  }
]"#,
            ),

            introduction: PromptPair::new(
                "You are an experienced podcast host who writes introductions that set the stage for a good conversation.",
                r#"Write a {{tone}} narrator introduction for a podcast about these topics.

TOPICS:
{{topics}}

SPEAKERS:
{{speakers}}

Welcome the audience, introduce the main topics and each speaker by name and
background, and lead into the conversation. Aim for 150 to 250 words. Write
plain prose, not a dialogue, and do not prefix lines with speaker names."#,
            ),

            dialogue: PromptPair::new(
                "You are an expert podcast writer who creates natural, informative conversations between multiple speakers.",
                r#"Write a {{tone}} podcast conversation between these speakers.

SPEAKERS:
{{speakers}}

TOPICS:
{{topics}}

ENTITIES:
{{entities}}

RELATIONSHIPS:
{{relationships}}

{{focus}}
Guidelines:
- About {{turn_count}} turns in total
- Each speaker keeps a distinct voice and perspective
- Speakers build on, question and occasionally challenge each other
- Cover the most important topics first and cite concrete facts
- Add an emotion to a turn where it fits

Respond with a JSON array of turns, using only the speaker ids above:
[
  {
    "speakerId": "speaker-1",
    "speakerName": "Speaker Name",
    "text": "What the speaker says",
    "emotion": "curious",
    "references": ["topic or entity mentioned"]
  }
]"#,
            ),

            conclusion: PromptPair::new(
                "You are an experienced podcast host who closes episodes with a satisfying wrap-up.",
                r#"Write a {{tone}} narrator conclusion for a podcast in which these speakers
discussed {{topic_names}}.

SPEAKERS:
{{speakers}}

RECENT DIALOGUE:
{{recent_dialogue}}

Summarize the key points, note where the speakers agreed or differed, and thank
the audience. Aim for 100 to 200 words of plain prose."#,
            ),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let understanding_path = custom_path.join("understanding.toml");
            if understanding_path.exists() {
                let content = std::fs::read_to_string(&understanding_path)?;
                prompts.understanding = toml::from_str(&content)?;
            }

            let script_path = custom_path.join("script.toml");
            if script_path.exists() {
                let content = std::fs::read_to_string(&script_path)?;
                prompts.script = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.understanding.topics.user.contains("{{content}}"));
        assert!(prompts.script.dialogue.user.contains("{{turn_count}}"));
        assert!(!prompts.script.speakers.system.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Create {{count}} speakers in a {{tone}} style.";
        let mut vars = HashMap::new();
        vars.insert("count".to_string(), "3".to_string());
        vars.insert("tone".to_string(), "casual".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Create 3 speakers in a casual style.");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("show".to_string(), "Deep Dive".to_string());
        prompts.variables.insert("tone".to_string(), "formal".to_string());

        let mut vars = HashMap::new();
        vars.insert("tone".to_string(), "casual".to_string());

        let result = prompts.render_with_custom("{{show}} / {{tone}}", &vars);
        assert_eq!(result, "Deep Dive / casual");
    }

    #[test]
    fn test_load_custom_dir_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("script.toml"),
            "[conclusion]\nsystem = \"Be brief.\"\nuser = \"Wrap up {{topic_names}}.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.script.conclusion.system, "Be brief.");
        // Sections absent from the file keep their defaults
        assert!(prompts.script.dialogue.user.contains("{{speakers}}"));
        assert!(prompts.understanding.topics.user.contains("{{content}}"));
    }
}
