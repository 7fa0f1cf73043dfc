//! Publisher that writes packages through a [`Storage`].

use super::storage::Storage;
use super::transcript::{render_transcript, UNTITLED_PODCAST};
use super::{DeliveryOptions, PackageMetadata, PodcastPackage, Publisher};
use crate::error::{PodsmithError, Result};
use crate::speech::PodcastAudio;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

/// File-name stem for a title: lowercase alphanumerics with `_` between runs.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "podcast".to_string()
    } else {
        slug.to_string()
    }
}

/// Writes audio, transcript and metadata as sibling files.
///
/// Files are written in that order. A failure stops the run and is not
/// cleaned up, so an audio file may be left without its transcript.
pub struct LocalPublisher {
    storage: Arc<dyn Storage>,
}

impl LocalPublisher {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Publisher for LocalPublisher {
    #[instrument(skip_all, fields(audio_id = %audio.id))]
    async fn package(&self, audio: &PodcastAudio, options: &DeliveryOptions) -> Result<PodcastPackage> {
        if let Some(requested) = options.format {
            if requested != audio.format {
                return Err(PodsmithError::Delivery(format!(
                    "Requested {} delivery but the audio is {}",
                    requested, audio.format
                )));
            }
        }

        let uuid = uuid::Uuid::new_v4().simple().to_string();
        let id = format!("package-{}", uuid);
        let title = if audio.metadata.title.trim().is_empty() {
            UNTITLED_PODCAST.to_string()
        } else {
            audio.metadata.title.clone()
        };
        let stem = format!("{}_{}", slugify(&title), &uuid[..8]);

        let audio_url = self
            .storage
            .write(&format!("{}.{}", stem, audio.format.extension()), &audio.full_audio)
            .await
            .map_err(delivery_error)?;

        let transcript_url = if options.include_transcript {
            let transcript = render_transcript(
                audio,
                options.transcript_format,
                options.include_speaker_labels,
            );
            let name = format!("{}.{}", stem, options.transcript_format.extension());
            Some(
                self.storage
                    .write(&name, transcript.as_bytes())
                    .await
                    .map_err(delivery_error)?,
            )
        } else {
            None
        };

        let mut package = PodcastPackage {
            id,
            title,
            description: audio.metadata.description.clone(),
            audio_url,
            transcript_url,
            metadata_url: None,
            duration: audio.total_duration,
            format: audio.format,
            size: audio.full_audio.len() as u64,
            created_at: Utc::now(),
            metadata: PackageMetadata {
                script_id: audio.script_id.clone(),
                audio_id: audio.id.clone(),
                speaker_names: audio.metadata.speaker_names.clone(),
                speaker_count: audio.metadata.speaker_count,
                turn_count: audio.metadata.turn_count,
                segment_count: audio.segments.len(),
                mime_type: audio.format.mime_type().to_string(),
                transcript_format: options.include_transcript.then_some(options.transcript_format),
                speaker_labels: options.include_speaker_labels,
                generated_at: audio.metadata.generated_at,
            },
        };

        if options.include_metadata {
            let json = serde_json::to_vec_pretty(&package)?;
            let name = format!("{}-metadata.json", stem);
            package.metadata_url = Some(self.storage.write(&name, &json).await.map_err(delivery_error)?);
        }

        info!(
            size = package.size,
            duration = package.duration,
            "Delivered {}",
            package.audio_url
        );
        Ok(package)
    }
}

fn delivery_error(error: PodsmithError) -> PodsmithError {
    match error {
        PodsmithError::Delivery(_) => error,
        other => PodsmithError::Delivery(other.to_string()),
    }
}
