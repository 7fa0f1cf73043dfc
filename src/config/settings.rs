//! Configuration settings for Podsmith.

use crate::delivery::TranscriptFormat;
use crate::retry::RetryPolicy;
use crate::script::Tone;
use crate::speech::AudioFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::Credentials;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub credentials: CredentialSettings,
    pub ingestion: IngestionSettings,
    pub understanding: UnderstandingSettings,
    pub script: ScriptSettings,
    pub speech: SpeechSettings,
    pub delivery: DeliverySettings,
    pub retry: RetryPolicy,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where finished podcasts are written.
    pub output_dir: String,
    /// Directory for temporary files (caption downloads).
    pub temp_dir: String,
    /// Log level used without `-v` (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/podsmith".to_string(),
            temp_dir: std::env::temp_dir()
                .join("podsmith")
                .to_string_lossy()
                .into_owned(),
            log_level: "warn".to_string(),
        }
    }
}

/// API keys stored in the config file. Environment variables fill any gaps.
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CredentialSettings {
    pub understanding_api_key: Option<String>,
    pub script_api_key: Option<String>,
    pub speech_api_key: Option<String>,
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "***");
        f.debug_struct("CredentialSettings")
            .field("understanding_api_key", &mask(&self.understanding_api_key))
            .field("script_api_key", &mask(&self.script_api_key))
            .field("speech_api_key", &mask(&self.speech_api_key))
            .finish()
    }
}

/// Content ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    /// Upper bound for a content block built from regrouped sentences.
    pub max_block_chars: usize,
    /// Hosts routed to the video adapter (`www.` and `m.` are ignored).
    pub video_domains: Vec<String>,
    /// User agent sent when fetching web pages.
    pub user_agent: String,
    /// Page fetch timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum HTTP redirects followed for a page.
    pub max_redirects: usize,
    /// Path or name of the yt-dlp binary.
    pub yt_dlp_path: String,
    /// Preferred caption language for videos.
    pub subtitle_language: String,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            max_block_chars: 500,
            video_domains: vec![
                "youtube.com".to_string(),
                "youtu.be".to_string(),
                "vimeo.com".to_string(),
            ],
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            timeout_secs: 30,
            max_redirects: 5,
            yt_dlp_path: "yt-dlp".to_string(),
            subtitle_language: "en".to_string(),
        }
    }
}

/// Content understanding (LLM) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderstandingSettings {
    pub model: String,
    /// OpenAI-compatible API base URL. None uses the OpenAI default.
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Content sent to the model is truncated to this many characters.
    pub max_content_chars: usize,
    /// Maximum summary length requested from the model.
    pub summary_max_chars: usize,
    pub timeout_secs: u64,
}

impl Default for UnderstandingSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            temperature: 0.2,
            max_tokens: 8192,
            max_content_chars: 24_000,
            summary_max_chars: 1000,
            timeout_secs: 300,
        }
    }
}

/// Script generation (LLM) settings and default script options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    /// Temperature for the dialogue call, which benefits from more variety.
    pub dialogue_temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub speaker_count: usize,
    pub turn_count: usize,
    pub tone: Tone,
    pub include_introduction: bool,
    pub include_conclusion: bool,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: None,
            temperature: 0.7,
            dialogue_temperature: 0.8,
            max_tokens: 4000,
            timeout_secs: 300,
            speaker_count: 2,
            turn_count: 15,
            tone: Tone::default(),
            include_introduction: true,
            include_conclusion: true,
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// ElevenLabs API base URL.
    pub base_url: String,
    /// ElevenLabs model id.
    pub model_id: String,
    /// Container format requested from the synthesizer.
    pub format: AudioFormat,
    /// Characters per second used to estimate segment durations.
    pub chars_per_second: f64,
    /// Maximum dialogue turns synthesized concurrently (order is preserved).
    pub max_concurrent: usize,
    pub timeout_secs: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            format: AudioFormat::Mp3,
            chars_per_second: crate::speech::DEFAULT_CHARS_PER_SECOND,
            max_concurrent: 1,
            timeout_secs: 120,
        }
    }
}

/// Default delivery options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverySettings {
    pub include_transcript: bool,
    pub transcript_format: TranscriptFormat,
    pub include_speaker_labels: bool,
    pub include_metadata: bool,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            include_transcript: true,
            transcript_format: TranscriptFormat::Text,
            include_speaker_labels: true,
            include_metadata: true,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PodsmithError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podsmith")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Resolve API keys from this file and the environment.
    pub fn credentials(&self) -> Credentials {
        Credentials::resolve(&self.credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.retry.initial_backoff_ms, 1000);
        assert_eq!(settings.script.speaker_count, 2);
        assert_eq!(settings.script.turn_count, 15);
        assert_eq!(settings.ingestion.max_block_chars, 500);
        assert_eq!(settings.speech.max_concurrent, 1);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[script]
speaker_count = 3
tone = "casual"

[retry]
max_retries = 1
"#,
        )
        .unwrap();

        assert_eq!(settings.script.speaker_count, 3);
        assert_eq!(settings.script.tone, Tone::Casual);
        assert_eq!(settings.script.turn_count, 15);
        assert_eq!(settings.retry.max_retries, 1);
        assert_eq!(settings.retry.initial_backoff_ms, 1000);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.general.output_dir = "/srv/podcasts".to_string();
        settings.speech.format = AudioFormat::Wav;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.general.output_dir, "/srv/podcasts");
        assert_eq!(loaded.speech.format, AudioFormat::Wav);
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = PathBuf::from("/nonexistent/podsmith/config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.general.log_level, "warn");
    }

    #[test]
    fn test_debug_masks_keys() {
        let creds = CredentialSettings {
            script_api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("sk-secret"));
    }
}
