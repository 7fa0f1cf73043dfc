//! Normalized content produced by every adapter.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const UNTITLED: &str = "Untitled";
pub const UNKNOWN: &str = "Unknown";

/// Kind of source a package was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Web,
    Document,
    Video,
    Text,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Web => write!(f, "web"),
            SourceType::Document => write!(f, "document"),
            SourceType::Video => write!(f, "video"),
            SourceType::Text => write!(f, "text"),
        }
    }
}

/// Descriptive metadata. `title`, `author` and `published` are always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    pub title: String,
    pub author: String,
    pub published: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Raw provider metadata (meta tags, yt-dlp fields, PDF info, counts).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Default for ContentMetadata {
    fn default() -> Self {
        Self {
            title: UNTITLED.to_string(),
            author: UNKNOWN.to_string(),
            published: UNKNOWN.to_string(),
            source_url: None,
            language: None,
            extra: BTreeMap::new(),
        }
    }
}

impl ContentMetadata {
    /// Set the title, ignoring blank values.
    pub fn with_title(mut self, title: Option<&str>) -> Self {
        if let Some(t) = title.map(str::trim).filter(|t| !t.is_empty()) {
            self.title = t.to_string();
        }
        self
    }

    /// Set the author, ignoring blank values.
    pub fn with_author(mut self, author: Option<&str>) -> Self {
        if let Some(a) = author.map(str::trim).filter(|a| !a.is_empty()) {
            self.author = a.to_string();
        }
        self
    }

    /// Set the publication date, ignoring blank values.
    pub fn with_published(mut self, published: Option<&str>) -> Self {
        if let Some(p) = published.map(str::trim).filter(|p| !p.is_empty()) {
            self.published = p.to_string();
        }
        self
    }

    pub fn insert_extra(&mut self, key: &str, value: impl Into<Value>) {
        self.extra.insert(key.to_string(), value.into());
    }
}

/// Normalized content: ordered, non-empty text blocks plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPackage {
    pub id: String,
    pub content: Vec<String>,
    pub metadata: ContentMetadata,
    pub citations: Vec<String>,
    pub source_type: SourceType,
}

impl ContentPackage {
    /// Build a package, dropping blank blocks.
    ///
    /// If nothing survives, a single placeholder block naming the source is
    /// used so `content` is never empty.
    pub fn new(
        source_type: SourceType,
        content: Vec<String>,
        metadata: ContentMetadata,
        citations: Vec<String>,
    ) -> Self {
        let mut content: Vec<String> = content
            .into_iter()
            .map(|block| block.trim().to_string())
            .filter(|block| !block.is_empty())
            .collect();

        if content.is_empty() {
            content.push(format!("No extractable text was found in {}.", metadata.title));
        }

        Self {
            id: format!("{}-{}", source_type, uuid::Uuid::new_v4()),
            content,
            metadata,
            citations,
            source_type,
        }
    }

    /// All blocks joined by blank lines.
    pub fn full_text(&self) -> String {
        self.content.join("\n\n")
    }

    pub fn char_count(&self) -> usize {
        self.content.iter().map(|b| b.chars().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_when_empty() {
        let metadata = ContentMetadata::default().with_title(Some("Quiet Page"));
        let package = ContentPackage::new(SourceType::Web, vec!["   ".to_string()], metadata, vec![]);
        assert_eq!(package.content, vec!["No extractable text was found in Quiet Page."]);
        assert!(package.id.starts_with("web-"));
    }

    #[test]
    fn test_blank_metadata_keeps_placeholders() {
        let metadata = ContentMetadata::default()
            .with_title(Some("  "))
            .with_author(None)
            .with_published(Some("2024-01-01"));
        assert_eq!(metadata.title, UNTITLED);
        assert_eq!(metadata.author, UNKNOWN);
        assert_eq!(metadata.published, "2024-01-01");
    }

    #[test]
    fn test_serialized_shape() {
        let package = ContentPackage::new(
            SourceType::Text,
            vec!["Hello.".to_string()],
            ContentMetadata::default(),
            vec![],
        );
        let json = serde_json::to_value(&package).unwrap();
        assert_eq!(json["sourceType"], "text");
        assert_eq!(json["metadata"]["title"], "Untitled");
    }
}
