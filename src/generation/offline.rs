//! Offline generator producing canned, well-formed responses.
//!
//! Used by `podsmith generate --offline` to exercise the whole pipeline
//! without network access or API keys.

use super::{GenerationRequest, Purpose, TextGenerator};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::json;

#[derive(Debug, Default, Clone)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    pub fn new() -> Self {
        Self
    }

    fn reply(purpose: Purpose) -> String {
        match purpose {
            Purpose::Summary => "An overview of the source material covering its central ideas and their practical consequences.".to_string(),
            Purpose::Topics => json!([
                {
                    "id": "topic-1",
                    "name": "Core Ideas",
                    "description": "The central arguments made by the source.",
                    "importance": 8,
                    "relatedContent": []
                },
                {
                    "id": "topic-2",
                    "name": "Practical Implications",
                    "description": "What the ideas mean in practice.",
                    "importance": 6,
                    "relatedContent": []
                }
            ])
            .to_string(),
            Purpose::Entities => json!([
                {
                    "id": "entity-1",
                    "name": "The Author",
                    "type": "person",
                    "mentions": [],
                    "attributes": {}
                }
            ])
            .to_string(),
            Purpose::Relationships => json!([
                {
                    "id": "rel-1",
                    "sourceId": "topic-1",
                    "targetId": "entity-1",
                    "relationshipType": "is argued by",
                    "strength": 7
                },
                {
                    "id": "rel-2",
                    "sourceId": "topic-2",
                    "targetId": "topic-1",
                    "relationshipType": "follows from",
                    "strength": 6
                }
            ])
            .to_string(),
            Purpose::Speakers => json!([
                {
                    "id": "speaker-1",
                    "name": "Alex",
                    "personality": "Curious and quick to ask follow-up questions",
                    "expertise": ["Research", "Science communication"],
                    "perspective": "Wants to understand the details"
                },
                {
                    "id": "speaker-2",
                    "name": "Sam",
                    "personality": "Pragmatic and grounded",
                    "expertise": ["Industry practice"],
                    "perspective": "Focuses on real-world impact"
                }
            ])
            .to_string(),
            Purpose::Introduction => "Welcome to the show. Today Alex and Sam dig into the core ideas of this piece and what they mean in practice.".to_string(),
            Purpose::Dialogue => json!([
                {"speakerId": "speaker-1", "text": "Let's start with the core idea. What is the piece really arguing?", "emotion": "curious"},
                {"speakerId": "speaker-2", "text": "At its heart it makes a simple claim and then spends its time defending it."},
                {"speakerId": "speaker-1", "text": "And does the defence hold up?"},
                {"speakerId": "speaker-2", "text": "Mostly. The practical implications are where it gets interesting.", "emotion": "thoughtful"},
                {"speakerId": "speaker-1", "text": "Give me an example of that."},
                {"speakerId": "speaker-2", "text": "Anyone applying these ideas would have to change how they work day to day."}
            ])
            .to_string(),
            Purpose::Conclusion => "That's all for today. Thanks to Alex and Sam, and thank you for listening.".to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        Ok(Self::reply(request.purpose))
    }

    fn name(&self) -> &str {
        "offline"
    }
}
