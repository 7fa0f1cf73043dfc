//! Content understanding stage.
//!
//! Turns a [`ContentPackage`](crate::ingest::ContentPackage) into a
//! [`KnowledgeGraph`] with three dependent model calls: topics, then
//! entities, then relationships between them.

mod llm;
mod models;

pub use llm::LlmUnderstanding;
pub use models::{filter_relationships, Entity, KnowledgeGraph, Relationship, Topic};

use crate::error::Result;
use crate::ingest::ContentPackage;
use async_trait::async_trait;
use tracing::info;

/// Trait for content understanding services.
#[async_trait]
pub trait ContentUnderstanding: Send + Sync {
    /// Extract the main topics.
    async fn extract_topics(&self, content: &ContentPackage) -> Result<Vec<Topic>>;

    /// Identify named entities.
    async fn identify_entities(&self, content: &ContentPackage) -> Result<Vec<Entity>>;

    /// Identify relationships. Only edges between the given ids are returned.
    async fn identify_relationships(
        &self,
        topics: &[Topic],
        entities: &[Entity],
        content: &ContentPackage,
    ) -> Result<Vec<Relationship>>;

    /// Summarize the content in at most `max_length` characters.
    async fn generate_summary(&self, content: &ContentPackage, max_length: usize) -> Result<String>;

    /// Build the full knowledge graph.
    async fn analyze_content(&self, content: &ContentPackage) -> Result<KnowledgeGraph> {
        let topics = self.extract_topics(content).await?;
        let entities = self.identify_entities(content).await?;
        let relationships = self.identify_relationships(&topics, &entities, content).await?;

        let graph = KnowledgeGraph::new(topics, entities, relationships, content.citations.clone());
        info!(
            topics = graph.topics.len(),
            entities = graph.entities.len(),
            relationships = graph.relationships.len(),
            "Built knowledge graph {}",
            graph.id
        );
        Ok(graph)
    }
}
