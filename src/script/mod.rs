//! Script generation stage.
//!
//! Turns a [`KnowledgeGraph`] into a [`PodcastScript`]: speakers, a narrator
//! introduction, the dialogue, and a narrator conclusion.

mod models;
mod writer;

pub use models::{
    DialogueTurn, PodcastScript, ScriptMetadata, ScriptOptions, Speaker, Tone, FILLER_TEXT,
    GENERIC_EXPERTISE, GENERIC_PERSONALITY, GENERIC_PERSPECTIVE,
};
pub use writer::{normalize_dialogue, LlmScriptWriter};

use crate::error::Result;
use crate::understanding::KnowledgeGraph;
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

/// Trait for script writers.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    /// Exactly `options.speaker_count` speakers (at least one) with unique ids.
    async fn generate_speakers(
        &self,
        graph: &KnowledgeGraph,
        options: &ScriptOptions,
    ) -> Result<Vec<Speaker>>;

    async fn generate_introduction(
        &self,
        graph: &KnowledgeGraph,
        speakers: &[Speaker],
        options: &ScriptOptions,
    ) -> Result<String>;

    /// Dialogue turns whose speaker ids all belong to `speakers`.
    async fn generate_dialogue(
        &self,
        graph: &KnowledgeGraph,
        speakers: &[Speaker],
        options: &ScriptOptions,
    ) -> Result<Vec<DialogueTurn>>;

    async fn generate_conclusion(
        &self,
        graph: &KnowledgeGraph,
        speakers: &[Speaker],
        dialogue: &[DialogueTurn],
        options: &ScriptOptions,
    ) -> Result<String>;

    /// Generate the complete script.
    async fn generate_script(
        &self,
        graph: &KnowledgeGraph,
        options: &ScriptOptions,
    ) -> Result<PodcastScript> {
        let speakers = self.generate_speakers(graph, options).await?;

        let introduction = if options.include_introduction {
            self.generate_introduction(graph, &speakers, options).await?
        } else {
            String::new()
        };

        let dialogue = self.generate_dialogue(graph, &speakers, options).await?;

        let conclusion = if options.include_conclusion {
            self.generate_conclusion(graph, &speakers, &dialogue, options).await?
        } else {
            String::new()
        };

        let script = PodcastScript {
            id: format!("podcast-{}", uuid::Uuid::new_v4()),
            title: script_title(graph),
            description: script_description(graph),
            metadata: models::ScriptMetadata {
                topic_count: graph.topics.len(),
                entity_count: graph.entities.len(),
                speaker_count: speakers.len(),
                turn_count: dialogue.len(),
                generated_at: Utc::now(),
                options: options.clone(),
            },
            speakers,
            introduction,
            dialogue,
            conclusion,
            source_knowledge_graph_id: graph.id.clone(),
        };

        info!(
            speakers = script.speakers.len(),
            turns = script.dialogue.len(),
            "Generated script \"{}\"",
            script.title
        );
        Ok(script)
    }
}

/// "Exploring A and B" from the two most important topics.
pub fn script_title(graph: &KnowledgeGraph) -> String {
    let topics = graph.topics_by_importance();
    match topics.as_slice() {
        [] => "Podcast Discussion".to_string(),
        [only] => format!("Exploring {}", only.name),
        [first, second, ..] => format!("Exploring {} and {}", first.name, second.name),
    }
}

/// Names the top three topics and appends the top topic's description.
pub fn script_description(graph: &KnowledgeGraph) -> String {
    let topics = graph.topics_by_importance();
    let Some(main) = topics.first() else {
        return "An engaging podcast discussion on various topics.".to_string();
    };

    let names: Vec<&str> = topics.iter().take(3).map(|t| t.name.as_str()).collect();
    format!(
        "A thought-provoking discussion exploring {}. {}",
        names.join(", "),
        main.description
    )
    .trim_end()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::understanding::Topic;

    fn graph(topics: &[(&str, u8, &str)]) -> KnowledgeGraph {
        KnowledgeGraph::new(
            topics
                .iter()
                .enumerate()
                .map(|(i, (name, importance, description))| Topic {
                    id: format!("topic-{}", i + 1),
                    name: name.to_string(),
                    description: description.to_string(),
                    importance: *importance,
                    related_content: vec![],
                })
                .collect(),
            vec![],
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_titles() {
        assert_eq!(script_title(&graph(&[])), "Podcast Discussion");
        assert_eq!(script_title(&graph(&[("Ownership", 5, "")])), "Exploring Ownership");
        assert_eq!(
            script_title(&graph(&[("Traits", 4, ""), ("Ownership", 9, ""), ("Macros", 4, "")])),
            "Exploring Ownership and Traits"
        );
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(
            script_description(&graph(&[])),
            "An engaging podcast discussion on various topics."
        );
        assert_eq!(
            script_description(&graph(&[
                ("Traits", 4, "Shared behaviour."),
                ("Ownership", 9, "Who frees memory."),
                ("Macros", 3, ""),
                ("Async", 2, ""),
            ])),
            "A thought-provoking discussion exploring Ownership, Traits, Macros. Who frees memory."
        );
    }
}
