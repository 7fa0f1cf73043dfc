//! Plain text adapter.

use super::models::{ContentMetadata, ContentPackage, SourceType};
use super::segment::segment_text;
use crate::error::{PodsmithError, Result};
use std::collections::HashSet;

const TITLE_MAX_CHARS: usize = 100;
const UNTITLED_TEXT: &str = "Untitled Text";
const LANGUAGE_SAMPLE_CHARS: usize = 1000;

/// Stop words scored per language; the best-scoring language wins.
const LANGUAGE_STOP_WORDS: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "of", "to", "a", "in", "that"]),
    ("es", &["el", "la", "de", "y", "en", "que", "un"]),
    ("fr", &["le", "la", "de", "et", "en", "un", "une"]),
    ("de", &["der", "die", "das", "und", "in", "ist", "zu"]),
];

/// Adapter for raw text input.
pub struct TextAdapter {
    max_block_chars: usize,
}

impl TextAdapter {
    pub fn new(max_block_chars: usize) -> Self {
        Self { max_block_chars }
    }

    pub fn normalize(&self, text: &str) -> Result<ContentPackage> {
        if text.trim().is_empty() {
            return Err(PodsmithError::Ingestion("Text input is empty".to_string()));
        }

        let mut metadata = ContentMetadata::default().with_title(Some(&extract_title(text)));
        metadata.language = Some(detect_language(text).to_string());
        metadata.insert_extra("characterCount", text.chars().count());
        metadata.insert_extra("wordCount", text.split_whitespace().count());
        metadata.insert_extra("lineCount", text.lines().count());

        let content = segment_text(text, self.max_block_chars);
        Ok(ContentPackage::new(SourceType::Text, content, metadata, Vec::new()))
    }
}

/// First non-blank line, unless it is too long to be a title.
fn extract_title(text: &str) -> String {
    let first = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if first.chars().count() > TITLE_MAX_CHARS {
        UNTITLED_TEXT.to_string()
    } else {
        first.to_string()
    }
}

/// Guess the language from stop words in the first part of the text. Defaults to `en`.
pub fn detect_language(text: &str) -> &'static str {
    let sample: String = text.chars().take(LANGUAGE_SAMPLE_CHARS).collect::<String>().to_lowercase();
    let words: HashSet<&str> = sample
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .collect();

    let mut best = ("en", 0usize);
    for (lang, stop_words) in LANGUAGE_STOP_WORDS {
        let score = stop_words.iter().filter(|w| words.contains(*w)).count();
        if score > best.1 {
            best = (lang, score);
        }
    }
    best.0
}
