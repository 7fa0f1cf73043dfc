//! Offline synthesizer that produces silence.

use super::models::{AudioFormat, Voice, VoiceOptions};
use super::timeline::estimate_duration;
use super::SpeechSynthesizer;
use crate::error::Result;
use async_trait::async_trait;

/// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, no padding.
const MP3_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
const MP3_FRAME_LEN: usize = 417;
const MP3_FRAMES_PER_SECOND: f64 = 44_100.0 / 1_152.0;

const WAV_SAMPLE_RATE: u32 = 8_000;

/// Synthesizer that returns silent audio sized to the estimated duration.
pub struct SilentSynthesizer {
    format: AudioFormat,
    chars_per_second: f64,
    voices: Vec<Voice>,
}

impl SilentSynthesizer {
    pub fn new(format: AudioFormat, chars_per_second: f64) -> Self {
        let voice = |id: &str, name: &str, description: &str| Voice {
            id: id.to_string(),
            name: name.to_string(),
            category: "offline".to_string(),
            description: Some(description.to_string()),
            default_options: Some(VoiceOptions::default()),
        };

        Self {
            format,
            chars_per_second,
            voices: vec![
                voice("voice-1", "Adam", "A deep, authoritative voice"),
                voice("voice-2", "Bella", "A warm, engaging voice"),
                voice("voice-3", "Carlos", "A lively, energetic voice"),
            ],
        }
    }

    /// Replace the advertised voice list.
    pub fn with_voices(mut self, voices: Vec<Voice>) -> Self {
        self.voices = voices;
        self
    }

    fn silence(&self, seconds: f64) -> Vec<u8> {
        match self.format {
            AudioFormat::Mp3 => silent_mp3(seconds),
            AudioFormat::Wav => silent_wav(seconds),
            AudioFormat::Ogg => silent_ogg(),
        }
    }
}

fn silent_mp3(seconds: f64) -> Vec<u8> {
    let frames = (seconds * MP3_FRAMES_PER_SECOND).ceil().max(1.0) as usize;
    let mut frame = vec![0u8; MP3_FRAME_LEN];
    frame[..4].copy_from_slice(&MP3_FRAME_HEADER);
    frame.repeat(frames)
}

/// 16-bit mono PCM wrapped in a RIFF header.
fn silent_wav(seconds: f64) -> Vec<u8> {
    let samples = (seconds * WAV_SAMPLE_RATE as f64).ceil() as u32;
    let data_len = samples * 2;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&WAV_SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(WAV_SAMPLE_RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}

/// An empty beginning-of-stream Ogg page.
fn silent_ogg() -> Vec<u8> {
    let mut page = Vec::with_capacity(27);
    page.extend_from_slice(b"OggS");
    page.push(0); // version
    page.push(0x02); // beginning of stream
    page.extend_from_slice(&0u64.to_le_bytes()); // granule position
    page.extend_from_slice(&1u32.to_le_bytes()); // serial
    page.extend_from_slice(&0u32.to_le_bytes()); // sequence
    page.extend_from_slice(&0u32.to_le_bytes()); // checksum
    page.push(0); // segments
    page
}

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(self.voices.clone())
    }

    async fn synthesize(
        &self,
        text: &str,
        _voice_id: &str,
        _options: Option<&VoiceOptions>,
    ) -> Result<Vec<u8>> {
        Ok(self.silence(estimate_duration(text, self.chars_per_second)))
    }

    fn format(&self) -> AudioFormat {
        self.format
    }

    fn name(&self) -> &str {
        "silent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::sniff_format;

    #[tokio::test]
    async fn test_output_matches_format() {
        for format in AudioFormat::ALL {
            let synth = SilentSynthesizer::new(format, 3.0);
            let audio = synth.synthesize("Hello there.", "voice-1", None).await.unwrap();
            assert_eq!(sniff_format(&audio), Some(format));
        }
    }

    #[test]
    fn test_wav_length() {
        // Two seconds at 8 kHz, 16-bit mono
        let wav = silent_wav(2.0);
        assert_eq!(wav.len(), 44 + 32_000);
        assert_eq!(&wav[40..44], &32_000u32.to_le_bytes());
    }

    #[test]
    fn test_mp3_scales_with_duration() {
        assert_eq!(silent_mp3(0.0).len(), MP3_FRAME_LEN);
        assert!(silent_mp3(10.0).len() > silent_mp3(1.0).len());
    }
}
