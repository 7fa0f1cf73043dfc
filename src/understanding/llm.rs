//! LLM-backed content understanding.

use super::models::{filter_relationships, Entity, Relationship, Topic};
use super::ContentUnderstanding;
use crate::config::{PromptPair, Prompts, UnderstandingSettings};
use crate::error::{PodsmithError, Result};
use crate::generation::{GenerationRequest, Purpose, TextGenerator};
use crate::ingest::ContentPackage;
use crate::repair::{repair_records, Repair};
use crate::retry::RetryContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Understanding stage driven by a [`TextGenerator`].
pub struct LlmUnderstanding {
    generator: Arc<dyn TextGenerator>,
    prompts: Prompts,
    settings: UnderstandingSettings,
    retry: RetryContext,
}

impl LlmUnderstanding {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        prompts: Prompts,
        settings: UnderstandingSettings,
        retry: RetryContext,
    ) -> Self {
        Self {
            generator,
            prompts,
            settings,
            retry,
        }
    }

    /// Render a prompt pair and call the model through the retry wrapper.
    async fn generate(
        &self,
        purpose: Purpose,
        pair: &PromptPair,
        vars: &HashMap<String, String>,
    ) -> Result<String> {
        let request = GenerationRequest {
            purpose,
            system: self.prompts.render_with_custom(&pair.system, vars),
            prompt: self.prompts.render_with_custom(&pair.user, vars),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        self.retry
            .call(purpose.as_str(), || self.generator.generate(&request))
            .await
    }

    /// Run one extraction step. Unusable output becomes an empty list; call failures abort.
    async fn extract_step<T: Repair>(
        &self,
        step: &'static str,
        purpose: Purpose,
        pair: &PromptPair,
        vars: &HashMap<String, String>,
    ) -> Result<Vec<T>> {
        let raw = self
            .generate(purpose, pair, vars)
            .await
            .map_err(|e| PodsmithError::Understanding {
                step,
                source: Box::new(e),
            })?;

        match repair_records::<T>(&raw) {
            Ok(records) => Ok(records),
            Err(e) if e.is_output_error() => {
                warn!(step, "Unusable model output, continuing with no {}: {}", step, e);
                Ok(Vec::new())
            }
            Err(e) => Err(PodsmithError::Understanding {
                step,
                source: Box::new(e),
            }),
        }
    }

    /// Content text, capped at the configured length.
    fn content_text(&self, content: &ContentPackage) -> String {
        let text = content.full_text();
        if text.chars().count() <= self.settings.max_content_chars {
            return text;
        }
        debug!(
            max = self.settings.max_content_chars,
            "Truncating content sent to the model"
        );
        text.chars().take(self.settings.max_content_chars).collect()
    }

    fn content_vars(&self, content: &ContentPackage) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("content".to_string(), self.content_text(content));
        vars.insert(
            "metadata".to_string(),
            serde_json::to_string_pretty(&content.metadata).unwrap_or_default(),
        );
        vars.insert("title".to_string(), content.metadata.title.clone());
        vars
    }
}

#[async_trait]
impl ContentUnderstanding for LlmUnderstanding {
    #[instrument(skip(self, content), fields(content_id = %content.id))]
    async fn extract_topics(&self, content: &ContentPackage) -> Result<Vec<Topic>> {
        let vars = self.content_vars(content);
        let topics = self
            .extract_step("topics", Purpose::Topics, &self.prompts.understanding.topics, &vars)
            .await?;
        debug!("Extracted {} topics", topics.len());
        Ok(topics)
    }

    #[instrument(skip(self, content), fields(content_id = %content.id))]
    async fn identify_entities(&self, content: &ContentPackage) -> Result<Vec<Entity>> {
        let vars = self.content_vars(content);
        let entities = self
            .extract_step("entities", Purpose::Entities, &self.prompts.understanding.entities, &vars)
            .await?;
        debug!("Identified {} entities", entities.len());
        Ok(entities)
    }

    #[instrument(skip(self, topics, entities, content), fields(content_id = %content.id))]
    async fn identify_relationships(
        &self,
        topics: &[Topic],
        entities: &[Entity],
        content: &ContentPackage,
    ) -> Result<Vec<Relationship>> {
        let mut vars = self.content_vars(content);
        vars.insert("topics".to_string(), serde_json::to_string_pretty(topics)?);
        vars.insert("entities".to_string(), serde_json::to_string_pretty(entities)?);

        let relationships: Vec<Relationship> = self
            .extract_step(
                "relationships",
                Purpose::Relationships,
                &self.prompts.understanding.relationships,
                &vars,
            )
            .await?;

        let (kept, dropped) = filter_relationships(relationships, topics, entities);
        if dropped > 0 {
            debug!("Dropped {} relationships with unknown endpoints", dropped);
        }
        Ok(kept)
    }

    #[instrument(skip(self, content), fields(content_id = %content.id))]
    async fn generate_summary(&self, content: &ContentPackage, max_length: usize) -> Result<String> {
        let mut vars = self.content_vars(content);
        vars.insert("max_length".to_string(), max_length.to_string());

        let raw = self
            .generate(Purpose::Summary, &self.prompts.understanding.summary, &vars)
            .await
            .map_err(|e| PodsmithError::Understanding {
                step: "summary",
                source: Box::new(e),
            })?;

        Ok(raw.trim().chars().take(max_length).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ScriptedGenerator;
    use crate::ingest::{ContentMetadata, SourceType};
    use crate::retry::RetryPolicy;

    fn package() -> ContentPackage {
        ContentPackage::new(
            SourceType::Text,
            vec!["Rust guarantees memory safety without garbage collection.".to_string()],
            ContentMetadata::default(),
            vec!["notes.txt".to_string()],
        )
    }

    fn stage(generator: Arc<ScriptedGenerator>) -> LlmUnderstanding {
        LlmUnderstanding::new(
            generator,
            Prompts::default(),
            UnderstandingSettings::default(),
            RetryContext::new(RetryPolicy::none(), Default::default()),
        )
    }

    #[tokio::test]
    async fn test_analyze_content_builds_filtered_graph() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond(Purpose::Topics, r#"[{"id": "t1", "name": "Memory safety", "importance": 9}]"#)
                .respond(Purpose::Entities, r#"Entities: [{"id": "e1", "name": "Rust", "type": "technology"}]"#)
                .respond(
                    Purpose::Relationships,
                    r#"[{"sourceId": "t1", "targetId": "e1", "relationshipType": "describes"},
                        {"sourceId": "e1", "targetId": "e404"}]"#,
                ),
        );
        let graph = stage(generator.clone()).analyze_content(&package()).await.unwrap();

        assert_eq!(graph.topics.len(), 1);
        assert_eq!(graph.entities.len(), 1);
        assert_eq!(graph.relationships.len(), 1);
        assert_eq!(graph.sources, vec!["notes.txt"]);

        let ids: Vec<&str> = graph
            .topics
            .iter()
            .map(|t| t.id.as_str())
            .chain(graph.entities.iter().map(|e| e.id.as_str()))
            .collect();
        for rel in &graph.relationships {
            assert!(ids.contains(&rel.source_id.as_str()));
            assert!(ids.contains(&rel.target_id.as_str()));
        }

        // The relationships prompt sees the accumulated topics and entities
        let requests = generator.requests();
        assert!(requests[2].prompt.contains("Memory safety"));
        assert!(requests[2].prompt.contains("\"e1\""));
    }

    #[tokio::test]
    async fn test_empty_topics_response_yields_empty_graph() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond(Purpose::Topics, "")
                .respond(Purpose::Entities, "none found")
                .respond(Purpose::Relationships, "[]"),
        );
        let graph = stage(generator).analyze_content(&package()).await.unwrap();

        assert!(graph.topics.is_empty());
        assert!(graph.entities.is_empty());
        assert!(graph.relationships.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_step_is_empty_not_error() {
        let generator = Arc::new(ScriptedGenerator::new().respond(Purpose::Entities, r#"[{"name": "x",,}]"#));
        let entities = stage(generator).identify_entities(&package()).await.unwrap();
        assert!(entities.is_empty());
    }

    #[tokio::test]
    async fn test_call_failure_names_step() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond(Purpose::Topics, "[]")
                .fail(Purpose::Entities, "503 upstream"),
        );
        let err = stage(generator).analyze_content(&package()).await.unwrap_err();
        match err {
            PodsmithError::Understanding { step, .. } => assert_eq!(step, "entities"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_summary_capped() {
        let generator = Arc::new(ScriptedGenerator::new().respond(Purpose::Summary, "  A very long summary indeed.  "));
        let summary = stage(generator).generate_summary(&package(), 6).await.unwrap();
        assert_eq!(summary, "A very");
    }

    #[test]
    fn test_content_truncated() {
        let mut settings = UnderstandingSettings::default();
        settings.max_content_chars = 4;
        let stage = LlmUnderstanding::new(
            Arc::new(ScriptedGenerator::new()),
            Prompts::default(),
            settings,
            RetryContext::default(),
        );
        assert_eq!(stage.content_text(&package()), "Rust");
    }
}
