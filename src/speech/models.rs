//! Voice and audio data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Audio container format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Ogg,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 3] = [AudioFormat::Mp3, AudioFormat::Wav, AudioFormat::Ogg];

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Ogg => "ogg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Ogg => "audio/ogg",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "wav" => Ok(AudioFormat::Wav),
            "ogg" => Ok(AudioFormat::Ogg),
            _ => Err(format!("Unknown audio format: {}", s)),
        }
    }
}

/// Provider voice settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceOptions {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub speaker_boost: f32,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            speaker_boost: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_options: Option<VoiceOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerVoiceMapping {
    pub speaker_id: String,
    pub voice_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_options: Option<VoiceOptions>,
}

/// A synthesized unit before it is placed on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSegment {
    pub id: String,
    pub speaker_id: String,
    pub voice_id: String,
    pub text: String,
    pub audio_data: Vec<u8>,
    /// Estimated duration in seconds.
    pub duration: f64,
}

/// A synthesized unit with its place on the timeline (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSegment {
    pub id: String,
    pub speaker_id: String,
    pub voice_id: String,
    pub text: String,
    #[serde(skip)]
    pub audio_data: Vec<u8>,
    pub duration: f64,
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    pub title: String,
    pub description: String,
    /// Speaker id to display name.
    pub speaker_names: BTreeMap<String, String>,
    pub speaker_count: usize,
    pub turn_count: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastAudio {
    pub id: String,
    pub script_id: String,
    pub segments: Vec<AudioSegment>,
    #[serde(skip)]
    pub full_audio: Vec<u8>,
    /// Seconds; equals the last segment's end time.
    pub total_duration: f64,
    pub format: AudioFormat,
    pub metadata: AudioMetadata,
}

impl PodcastAudio {
    /// Display name for a segment's speaker, if it is a known speaker.
    pub fn speaker_name(&self, speaker_id: &str) -> Option<&str> {
        self.metadata.speaker_names.get(speaker_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(AudioFormat::Wav.extension(), "wav");
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!("OGG".parse::<AudioFormat>().unwrap(), AudioFormat::Ogg);
        assert!("flac".parse::<AudioFormat>().is_err());
        assert_eq!(serde_json::to_string(&AudioFormat::Mp3).unwrap(), "\"mp3\"");
    }

    #[test]
    fn test_audio_bytes_not_serialized() {
        let segment = AudioSegment {
            id: "turn-1".to_string(),
            speaker_id: "speaker-1".to_string(),
            voice_id: "voice-1".to_string(),
            text: "Hi.".to_string(),
            audio_data: vec![1, 2, 3],
            duration: 1.0,
            start_time: 0.0,
            end_time: 1.0,
        };
        let json = serde_json::to_value(&segment).unwrap();
        assert!(json.get("audioData").is_none());
        assert_eq!(json["startTime"], 0.0);
    }
}
