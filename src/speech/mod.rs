//! Voice assignment and speech synthesis.
//!
//! Synthesis happens in two phases: every unit of the script is synthesized
//! and given an estimated duration, then [`assign_timeline`] places the units
//! back to back. Segment timing never depends on the order in which
//! concurrent synthesis calls finish.

mod elevenlabs;
mod models;
mod silent;
mod stage;
mod timeline;

pub use elevenlabs::ElevenLabsSynthesizer;
pub use models::{
    AudioFormat, AudioMetadata, AudioSegment, PodcastAudio, SpeakerVoiceMapping,
    SynthesizedSegment, Voice, VoiceOptions,
};
pub use silent::SilentSynthesizer;
pub use stage::VoiceStage;
pub use timeline::{
    assign_timeline, concatenate_audio, estimate_duration, sniff_format, total_duration,
    DEFAULT_CHARS_PER_SECOND,
};

use crate::error::{PodsmithError, Result};
use crate::script::Speaker;
use async_trait::async_trait;

/// Speaker id used for the introduction and conclusion.
pub const NARRATOR_ID: &str = "narrator";

/// Trait for text-to-speech back-ends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices this back-end can speak with.
    async fn list_voices(&self) -> Result<Vec<Voice>>;

    /// Synthesize `text` and return encoded audio in [`Self::format`].
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        options: Option<&VoiceOptions>,
    ) -> Result<Vec<u8>>;

    fn format(&self) -> AudioFormat;

    fn name(&self) -> &str;
}

/// Give every speaker a voice, cycling through `voices` in order.
pub fn auto_assign_voices(
    speakers: &[Speaker],
    voices: &[Voice],
) -> Result<Vec<SpeakerVoiceMapping>> {
    if voices.is_empty() {
        return Err(PodsmithError::NoVoicesAvailable);
    }

    Ok(speakers
        .iter()
        .enumerate()
        .map(|(i, speaker)| {
            let voice = &voices[i % voices.len()];
            SpeakerVoiceMapping {
                speaker_id: speaker.id.clone(),
                voice_id: voice.id.clone(),
                voice_options: voice.default_options.clone(),
            }
        })
        .collect())
}
