//! Video adapter backed by yt-dlp.
//!
//! Metadata comes from `yt-dlp --dump-json`; captions are downloaded as
//! WebVTT into a temporary directory and flattened to text.

use super::models::{ContentMetadata, ContentPackage, SourceType};
use super::segment::{group_units, segment_text};
use crate::error::{PodsmithError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Metadata reported for a video.
#[derive(Debug, Clone, Default)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration_secs: Option<f64>,
    /// `YYYYMMDD` as reported by yt-dlp.
    pub upload_date: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub view_count: Option<u64>,
    pub language: Option<String>,
    pub webpage_url: Option<String>,
}

impl VideoInfo {
    /// Build from a yt-dlp JSON dump.
    pub fn from_ytdlp_json(json: &serde_json::Value) -> Self {
        let text = |key: &str| {
            json[key]
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            id: text("id"),
            title: text("title"),
            uploader: text("uploader").or_else(|| text("channel")),
            duration_secs: json["duration"].as_f64(),
            upload_date: text("upload_date"),
            description: text("description"),
            tags: json["tags"]
                .as_array()
                .map(|tags| {
                    tags.iter()
                        .filter_map(|t| t.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            view_count: json["view_count"].as_u64(),
            language: text("language"),
            webpage_url: text("webpage_url"),
        }
    }
}

/// Fetches video metadata and captions.
#[async_trait]
pub trait VideoInfoFetcher: Send + Sync {
    async fn fetch_info(&self, url: &Url) -> Result<VideoInfo>;

    /// Raw WebVTT captions, or `None` when the video has none.
    async fn fetch_captions(&self, url: &Url) -> Result<Option<String>>;
}

/// Runs the `yt-dlp` binary.
pub struct YtDlpFetcher {
    binary: String,
    subtitle_language: String,
    temp_dir: PathBuf,
}

impl YtDlpFetcher {
    pub fn new(binary: &str, subtitle_language: &str, temp_dir: PathBuf) -> Self {
        Self {
            binary: binary.to_string(),
            subtitle_language: subtitle_language.to_string(),
            temp_dir,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        tokio::process::Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PodsmithError::ToolNotFound(self.binary.clone())
                } else {
                    PodsmithError::Ingestion(format!("Failed to run {}: {}", self.binary, e))
                }
            })
    }
}

#[async_trait]
impl VideoInfoFetcher for YtDlpFetcher {
    async fn fetch_info(&self, url: &Url) -> Result<VideoInfo> {
        let output = self
            .run(&["--dump-json", "--no-download", "--no-warnings", "--no-playlist", url.as_str()])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PodsmithError::Ingestion(format!(
                "Video {} not found or unavailable: {}",
                url,
                stderr.trim()
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            PodsmithError::Ingestion(format!("Failed to parse yt-dlp output: {}", e))
        })?;

        Ok(VideoInfo::from_ytdlp_json(&json))
    }

    async fn fetch_captions(&self, url: &Url) -> Result<Option<String>> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let dir = tempfile::tempdir_in(&self.temp_dir)?;
        let template = dir.path().join("captions.%(ext)s");
        let template = template.to_string_lossy();
        let langs = format!("{}.*", self.subtitle_language);

        let output = self
            .run(&[
                "--skip-download",
                "--write-subs",
                "--write-auto-subs",
                "--sub-format",
                "vtt",
                "--sub-langs",
                &langs,
                "--no-playlist",
                "--no-warnings",
                "-o",
                &template,
                url.as_str(),
            ])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PodsmithError::Ingestion(format!(
                "Caption download failed: {}",
                stderr.trim()
            )));
        }

        let mut entries = tokio::fs::read_dir(dir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "vtt") {
                return Ok(Some(tokio::fs::read_to_string(&path).await?));
            }
        }

        Ok(None)
    }
}

/// Adapter turning a video URL into a [`ContentPackage`].
pub struct VideoAdapter {
    fetcher: Arc<dyn VideoInfoFetcher>,
    max_block_chars: usize,
}

impl VideoAdapter {
    pub fn new(fetcher: Arc<dyn VideoInfoFetcher>, max_block_chars: usize) -> Self {
        Self {
            fetcher,
            max_block_chars,
        }
    }

    pub async fn normalize(&self, url: &Url) -> Result<ContentPackage> {
        info!("Fetching video metadata: {}", url);
        let info = self.fetcher.fetch_info(url).await?;

        let mut metadata = ContentMetadata::default()
            .with_title(info.title.as_deref())
            .with_author(info.uploader.as_deref())
            .with_published(info.upload_date.as_deref().map(format_upload_date).as_deref());
        metadata.source_url = Some(url.to_string());
        metadata.language = info.language.clone();
        if let Some(id) = &info.id {
            metadata.insert_extra("videoId", id.clone());
        }
        if let Some(duration) = info.duration_secs {
            metadata.insert_extra("duration", duration);
        }
        if let Some(views) = info.view_count {
            metadata.insert_extra("viewCount", views);
        }
        if !info.tags.is_empty() {
            metadata.insert_extra("tags", info.tags.clone());
        }

        let mut content = vec![format!("Title: {}", metadata.title)];
        if let Some(description) = &info.description {
            content.extend(segment_text(description, self.max_block_chars));
        }

        let captions = match self.fetcher.fetch_captions(url).await {
            Ok(Some(vtt)) => parse_vtt(&vtt),
            Ok(None) => {
                warn!("No captions available for {}", url);
                Vec::new()
            }
            Err(e) => {
                warn!("Caption extraction failed for {}: {}", url, e);
                Vec::new()
            }
        };

        if captions.is_empty() {
            content.push(describe_video(&metadata.title, &metadata.author, info.duration_secs));
        } else {
            debug!(lines = captions.len(), "Parsed captions");
            content.extend(group_units(captions, self.max_block_chars));
        }

        let citation = info.webpage_url.unwrap_or_else(|| url.to_string());
        Ok(ContentPackage::new(SourceType::Video, content, metadata, vec![citation]))
    }
}

/// Caption text lines from a WebVTT document, tags stripped and consecutive repeats removed.
pub fn parse_vtt(vtt: &str) -> Vec<String> {
    let tag = Regex::new(r"<[^>]*>").ok();
    let mut lines: Vec<String> = Vec::new();
    let mut in_cue = false;

    for raw in vtt.lines() {
        let line = raw.trim();
        if line.contains("-->") {
            in_cue = true;
            continue;
        }
        if line.is_empty() {
            in_cue = false;
            continue;
        }
        if !in_cue {
            continue;
        }

        let text = match &tag {
            Some(re) => re.replace_all(line, "").to_string(),
            None => line.to_string(),
        };
        let text = text
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&nbsp;", " ");
        let text = text.trim();

        if text.is_empty() || lines.last().is_some_and(|prev| prev == text) {
            continue;
        }
        lines.push(text.to_string());
    }

    lines
}

fn describe_video(title: &str, author: &str, duration_secs: Option<f64>) -> String {
    let mut description = format!("This is a video titled \"{}\" by {}.", title, author);
    if let Some(secs) = duration_secs.filter(|s| *s > 0.0) {
        let total = secs.round() as u64;
        description.push_str(&format!(" It is {}:{:02} long.", total / 60, total % 60));
    }
    description
}

/// yt-dlp `YYYYMMDD` to `YYYY-MM-DD`.
fn format_upload_date(raw: &str) -> String {
    chrono::NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
