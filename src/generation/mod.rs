//! Text generation capability.
//!
//! Stages talk to a language model only through [`TextGenerator`]. The real
//! implementation uses OpenAI chat completions; the offline and scripted
//! implementations return canned text for demos and tests.

mod chat;
mod offline;
mod scripted;

pub use chat::OpenAiGenerator;
pub use offline::OfflineGenerator;
pub use scripted::ScriptedGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// What a generation call is for. Used for logging and by the fakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Summary,
    Topics,
    Entities,
    Relationships,
    Speakers,
    Introduction,
    Dialogue,
    Conclusion,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Summary => "summary",
            Purpose::Topics => "topics",
            Purpose::Entities => "entities",
            Purpose::Relationships => "relationships",
            Purpose::Speakers => "speakers",
            Purpose::Introduction => "introduction",
            Purpose::Dialogue => "dialogue",
            Purpose::Conclusion => "conclusion",
        }
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single prompt sent to a language model.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub purpose: Purpose,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Trait for language model back-ends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion. Returns the raw model text, untrimmed and unparsed.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Human-readable back-end name.
    fn name(&self) -> &str;
}
