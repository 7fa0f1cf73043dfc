//! ElevenLabs text-to-speech client.

use super::models::{AudioFormat, Voice, VoiceOptions};
use super::SpeechSynthesizer;
use crate::config::SpeechSettings;
use crate::error::{PodsmithError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const API_KEY_HEADER: &str = "xi-api-key";

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<ApiVoice>,
}

#[derive(Debug, Deserialize)]
struct ApiVoice {
    voice_id: String,
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct VoiceSettingsBody {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_settings: Option<VoiceSettingsBody>,
}

/// Synthesizer backed by the ElevenLabs REST API.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model_id: String,
    format: AudioFormat,
}

impl ElevenLabsSynthesizer {
    /// Only mp3 and ogg output are available from the API as containers.
    pub fn new(api_key: &str, settings: &SpeechSettings) -> Result<Self> {
        if settings.format == AudioFormat::Wav {
            return Err(PodsmithError::Config(
                "ElevenLabs does not produce wav audio; use mp3 or ogg".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| PodsmithError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model_id: settings.model_id.clone(),
            format: settings.format,
        })
    }

    fn output_format(&self) -> &'static str {
        match self.format {
            AudioFormat::Ogg => "opus_48000_128",
            _ => "mp3_44100_128",
        }
    }

    async fn error_for(response: reqwest::Response, action: &str) -> PodsmithError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        PodsmithError::Synthesis(format!("ElevenLabs {} failed ({}): {}", action, status, body.trim()))
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let response = self
            .client
            .get(format!("{}/voices", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| PodsmithError::Synthesis(format!("ElevenLabs request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, "voice listing").await);
        }

        let body: VoicesResponse = response
            .json()
            .await
            .map_err(|e| PodsmithError::Synthesis(format!("Invalid voice list: {}", e)))?;

        Ok(body
            .voices
            .into_iter()
            .map(|v| Voice {
                id: v.voice_id,
                name: v.name,
                category: v.category.unwrap_or_else(|| "premium".to_string()),
                description: v.description,
                default_options: Some(VoiceOptions::default()),
            })
            .collect())
    }

    #[instrument(skip(self, text, options), fields(chars = text.len()))]
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        options: Option<&VoiceOptions>,
    ) -> Result<Vec<u8>> {
        let body = SpeechBody {
            text,
            model_id: &self.model_id,
            voice_settings: options.map(|o| VoiceSettingsBody {
                stability: o.stability,
                similarity_boost: o.similarity_boost,
                style: o.style,
                use_speaker_boost: o.speaker_boost > 0.0,
            }),
        };

        let response = self
            .client
            .post(format!("{}/text-to-speech/{}", self.base_url, voice_id))
            .query(&[("output_format", self.output_format())])
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, self.format.mime_type())
            .json(&body)
            .send()
            .await
            .map_err(|e| PodsmithError::Synthesis(format!("ElevenLabs request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, "synthesis").await);
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| PodsmithError::Synthesis(format!("Failed to read audio: {}", e)))?;
        debug!("Received {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }

    fn format(&self) -> AudioFormat {
        self.format
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}
