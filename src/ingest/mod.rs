//! Content ingestion.
//!
//! Normalizes web pages, documents, videos and raw text into a
//! [`ContentPackage`]: ordered non-empty text blocks plus metadata.
//!
//! # Routing
//!
//! - `http(s)://` URLs whose host is a known video domain go to the video adapter
//! - other URLs go to the web adapter
//! - existing file paths go to the document adapter
//! - anything else is treated as raw text

mod document;
mod models;
pub mod segment;
mod text;
mod video;
mod web;

pub use document::{DocumentAdapter, DocumentReader, FsDocumentReader};
pub use models::{ContentMetadata, ContentPackage, SourceType, UNKNOWN, UNTITLED};
pub use text::{detect_language, TextAdapter};
pub use video::{parse_vtt, VideoAdapter, VideoInfo, VideoInfoFetcher, YtDlpFetcher};
pub use web::{parse_page, FetchedPage, HttpPageFetcher, PageFetcher, WebAdapter};

use crate::config::Settings;
use crate::error::{PodsmithError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};
use url::Url;

/// A classified pipeline input.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceInput {
    Url(Url),
    Document(PathBuf),
    Text(String),
}

impl SourceInput {
    /// Classify a raw CLI/API input string.
    pub fn classify(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(trimmed)
                .map_err(|e| PodsmithError::Ingestion(format!("Invalid URL {}: {}", trimmed, e)))?;
            return Ok(SourceInput::Url(url));
        }

        if !trimmed.is_empty() && !trimmed.contains('\n') {
            let path = Settings::expand_path(trimmed);
            if path.is_file() {
                return Ok(SourceInput::Document(path));
            }
        }

        Ok(SourceInput::Text(input.to_string()))
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            SourceInput::Url(url) => url.to_string(),
            SourceInput::Document(path) => path.display().to_string(),
            SourceInput::Text(text) => format!("text ({} chars)", text.chars().count()),
        }
    }
}

/// Whether `url`'s host is one of `video_domains` (case-insensitive, `www.`/`m.` ignored).
pub fn is_video_url(url: &Url, video_domains: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(&host);

    video_domains
        .iter()
        .any(|domain| domain.eq_ignore_ascii_case(host))
}

/// Routes inputs to the right adapter.
pub struct ContentIngestor {
    web: WebAdapter,
    document: DocumentAdapter,
    video: VideoAdapter,
    text: TextAdapter,
    video_domains: Vec<String>,
}

impl ContentIngestor {
    /// Build with the real network, filesystem and yt-dlp capabilities.
    pub fn new(settings: &Settings) -> Result<Self> {
        let ingestion = &settings.ingestion;
        Ok(Self::with_capabilities(
            settings,
            Arc::new(HttpPageFetcher::new(ingestion)?),
            Arc::new(FsDocumentReader),
            Arc::new(YtDlpFetcher::new(
                &ingestion.yt_dlp_path,
                &ingestion.subtitle_language,
                settings.temp_dir(),
            )),
        ))
    }

    /// Build with injected capabilities.
    pub fn with_capabilities(
        settings: &Settings,
        pages: Arc<dyn PageFetcher>,
        documents: Arc<dyn DocumentReader>,
        videos: Arc<dyn VideoInfoFetcher>,
    ) -> Self {
        let max = settings.ingestion.max_block_chars;
        Self {
            web: WebAdapter::new(pages, max),
            document: DocumentAdapter::new(documents, max),
            video: VideoAdapter::new(videos, max),
            text: TextAdapter::new(max),
            video_domains: settings.ingestion.video_domains.clone(),
        }
    }

    /// Normalize any input into a content package.
    #[instrument(skip(self, input), fields(input = %input.describe()))]
    pub async fn ingest(&self, input: &SourceInput) -> Result<ContentPackage> {
        let package = match input {
            SourceInput::Url(url) if is_video_url(url, &self.video_domains) => {
                self.video.normalize(url).await?
            }
            SourceInput::Url(url) => self.web.normalize(url).await?,
            SourceInput::Document(path) => self.document.normalize(path).await?,
            SourceInput::Text(text) => self.text.normalize(text)?,
        };

        info!(
            id = %package.id,
            blocks = package.content.len(),
            "Ingested \"{}\"",
            package.metadata.title
        );
        Ok(package)
    }
}
