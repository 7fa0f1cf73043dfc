//! Queued-response generator for tests.

use super::{GenerationRequest, Purpose, TextGenerator};
use crate::error::{PodsmithError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// Returns queued replies per [`Purpose`], in order.
///
/// The last reply queued for a purpose repeats once the queue drains, so a
/// single `respond` answers every call and a single `fail` always fails.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<HashMap<Purpose, VecDeque<Reply>>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn respond(self, purpose: Purpose, text: impl Into<String>) -> Self {
        self.push(purpose, Reply::Text(text.into()));
        self
    }

    /// Queue a call failure.
    pub fn fail(self, purpose: Purpose, message: impl Into<String>) -> Self {
        self.push(purpose, Reply::Fail(message.into()));
        self
    }

    fn push(&self, purpose: Purpose, reply: Reply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.entry(purpose).or_default().push_back(reply);
        }
    }

    /// Number of calls made for `purpose`.
    pub fn calls(&self, purpose: Purpose) -> usize {
        self.calls
            .lock()
            .map(|c| c.iter().filter(|r| r.purpose == purpose).count())
            .unwrap_or(0)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let reply = {
            let mut replies = self
                .replies
                .lock()
                .map_err(|_| PodsmithError::Generation("scripted generator poisoned".to_string()))?;
            let queue = replies.get_mut(&request.purpose);
            match queue {
                Some(q) if q.len() > 1 => q.pop_front(),
                Some(q) => q.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(message)) => Err(PodsmithError::Generation(message)),
            None => Err(PodsmithError::Generation(format!(
                "no scripted response for {}",
                request.purpose
            ))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(purpose: Purpose) -> GenerationRequest {
        GenerationRequest {
            purpose,
            system: String::new(),
            prompt: String::new(),
            temperature: 0.0,
            max_tokens: 10,
        }
    }

    #[tokio::test]
    async fn test_queue_then_sticky_last() {
        let generator = ScriptedGenerator::new()
            .fail(Purpose::Topics, "boom")
            .respond(Purpose::Topics, "[]");

        assert!(generator.generate(&request(Purpose::Topics)).await.is_err());
        assert_eq!(generator.generate(&request(Purpose::Topics)).await.unwrap(), "[]");
        assert_eq!(generator.generate(&request(Purpose::Topics)).await.unwrap(), "[]");
        assert_eq!(generator.calls(Purpose::Topics), 3);
    }

    #[tokio::test]
    async fn test_unscripted_purpose_fails() {
        let generator = ScriptedGenerator::new();
        let err = generator.generate(&request(Purpose::Dialogue)).await.unwrap_err();
        assert!(err.to_string().contains("dialogue"));
    }
}
