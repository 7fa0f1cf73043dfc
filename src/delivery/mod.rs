//! Podcast delivery: packaging audio, transcript and metadata.

mod local;
mod storage;
mod transcript;

pub use local::{slugify, LocalPublisher};
pub use storage::{FsStorage, Storage};
pub use transcript::{render_transcript, TranscriptFormat, UNTITLED_PODCAST};

use crate::config::DeliverySettings;
use crate::error::Result;
use crate::speech::{AudioFormat, PodcastAudio};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A deliverable audio format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryFormat {
    pub id: AudioFormat,
    pub name: &'static str,
    pub extension: &'static str,
    pub mime_type: &'static str,
    pub description: &'static str,
}

/// Formats a package can be delivered in.
pub fn formats() -> Vec<DeliveryFormat> {
    AudioFormat::ALL
        .iter()
        .map(|&format| {
            let (name, description) = match format {
                AudioFormat::Mp3 => (
                    "MP3",
                    "Standard audio format with good compression and wide compatibility",
                ),
                AudioFormat::Wav => ("WAV", "Uncompressed audio format with high quality"),
                AudioFormat::Ogg => ("OGG", "Ogg container (Opus from ElevenLabs) with good compression"),
            };
            DeliveryFormat {
                id: format,
                name,
                extension: format.extension(),
                mime_type: format.mime_type(),
                description,
            }
        })
        .collect()
}

/// Options for packaging a podcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryOptions {
    /// Required format. `None` accepts whatever the audio is in.
    pub format: Option<AudioFormat>,
    pub include_transcript: bool,
    pub transcript_format: TranscriptFormat,
    pub include_speaker_labels: bool,
    /// Write a `-metadata.json` file next to the audio.
    pub include_metadata: bool,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self::from(&DeliverySettings::default())
    }
}

impl From<&DeliverySettings> for DeliveryOptions {
    fn from(settings: &DeliverySettings) -> Self {
        Self {
            format: None,
            include_transcript: settings.include_transcript,
            transcript_format: settings.transcript_format,
            include_speaker_labels: settings.include_speaker_labels,
            include_metadata: settings.include_metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    pub script_id: String,
    pub audio_id: String,
    pub speaker_names: BTreeMap<String, String>,
    pub speaker_count: usize,
    pub turn_count: usize,
    pub segment_count: usize,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_format: Option<TranscriptFormat>,
    pub speaker_labels: bool,
    pub generated_at: DateTime<Utc>,
}

/// The delivered podcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastPackage {
    pub id: String,
    pub title: String,
    pub description: String,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_url: Option<String>,
    /// Seconds.
    pub duration: f64,
    pub format: AudioFormat,
    /// Audio size in bytes.
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub metadata: PackageMetadata,
}

/// Trait for delivery back-ends.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn package(&self, audio: &PodcastAudio, options: &DeliveryOptions) -> Result<PodcastPackage>;
}
