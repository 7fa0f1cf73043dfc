//! Voice synthesis stage.

use super::models::{
    AudioMetadata, PodcastAudio, SpeakerVoiceMapping, SynthesizedSegment, Voice, VoiceOptions,
};
use super::timeline::{assign_timeline, concatenate_audio, estimate_duration, total_duration};
use super::{auto_assign_voices, SpeechSynthesizer, NARRATOR_ID};
use crate::config::SpeechSettings;
use crate::error::{PodsmithError, Result};
use crate::retry::RetryContext;
use crate::script::{PodcastScript, Speaker};
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// One piece of the script to be spoken.
struct Unit {
    id: String,
    speaker_id: String,
    voice_id: String,
    options: Option<VoiceOptions>,
    /// Text shown in transcripts and used for timing.
    text: String,
    /// Text sent to the synthesizer (may carry an emotion cue).
    spoken: String,
}

/// Turns a script into timed podcast audio.
pub struct VoiceStage {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    retry: RetryContext,
    chars_per_second: f64,
    max_concurrent: usize,
}

impl VoiceStage {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        settings: &SpeechSettings,
        retry: RetryContext,
    ) -> Self {
        Self {
            synthesizer,
            retry,
            chars_per_second: settings.chars_per_second,
            max_concurrent: settings.max_concurrent.max(1),
        }
    }

    pub fn synthesizer(&self) -> &dyn SpeechSynthesizer {
        self.synthesizer.as_ref()
    }

    /// Voices offered by the synthesizer.
    pub async fn list_voices(&self) -> Result<Vec<Voice>> {
        let synthesizer = &self.synthesizer;
        self.retry
            .call("list_voices", move || synthesizer.list_voices())
            .await
            .map_err(|e| synthesis_error("Failed to list voices", e))
    }

    /// List voices and assign one to every speaker.
    pub async fn assign_voices(&self, speakers: &[Speaker]) -> Result<Vec<SpeakerVoiceMapping>> {
        let voices = self.list_voices().await?;
        debug!("{} voices available", voices.len());
        auto_assign_voices(speakers, &voices)
    }

    /// Synthesize introduction, dialogue and conclusion in that order.
    #[instrument(skip_all, fields(script_id = %script.id, turns = script.dialogue.len()))]
    pub async fn synthesize_podcast(
        &self,
        script: &PodcastScript,
        mappings: &[SpeakerVoiceMapping],
    ) -> Result<PodcastAudio> {
        let units = self.plan(script, mappings)?;
        let unit_count = units.len();

        let synthesized: Vec<SynthesizedSegment> = stream::iter(units)
            .map(|unit| self.synthesize_unit(unit))
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        let segments = assign_timeline(synthesized);
        let format = self.synthesizer.format();
        let full_audio = concatenate_audio(&segments, format)?;
        let total = total_duration(&segments);

        let audio = PodcastAudio {
            id: format!("audio-{}", uuid::Uuid::new_v4()),
            script_id: script.id.clone(),
            segments,
            full_audio,
            total_duration: total,
            format,
            metadata: AudioMetadata {
                title: script.title.clone(),
                description: script.description.clone(),
                speaker_names: script
                    .speakers
                    .iter()
                    .map(|s| (s.id.clone(), s.name.clone()))
                    .collect(),
                speaker_count: script.speakers.len(),
                turn_count: script.dialogue.len(),
                generated_at: Utc::now(),
            },
        };

        info!(
            segments = unit_count,
            bytes = audio.full_audio.len(),
            "Synthesized {:.1}s of audio",
            audio.total_duration
        );
        Ok(audio)
    }

    /// Lay out the units to speak. The first mapping's voice narrates.
    fn plan(&self, script: &PodcastScript, mappings: &[SpeakerVoiceMapping]) -> Result<Vec<Unit>> {
        let has_narration = !script.introduction.trim().is_empty()
            || !script.conclusion.trim().is_empty();
        if mappings.is_empty() && (has_narration || !script.dialogue.is_empty()) {
            return Err(PodsmithError::NoVoicesAvailable);
        }

        let narrator_voice = mappings
            .first()
            .map(|m| m.voice_id.clone())
            .unwrap_or_default();
        let by_speaker: HashMap<&str, &SpeakerVoiceMapping> =
            mappings.iter().map(|m| (m.speaker_id.as_str(), m)).collect();

        let narration = |id: &str, text: &str| Unit {
            id: id.to_string(),
            speaker_id: NARRATOR_ID.to_string(),
            voice_id: narrator_voice.clone(),
            options: None,
            text: text.trim().to_string(),
            spoken: text.trim().to_string(),
        };

        let mut units = Vec::with_capacity(script.dialogue.len() + 2);
        if !script.introduction.trim().is_empty() {
            units.push(narration("intro", &script.introduction));
        }

        for (i, turn) in script.dialogue.iter().enumerate() {
            let (voice_id, options) = match by_speaker.get(turn.speaker_id.as_str()) {
                Some(m) => (m.voice_id.clone(), m.voice_options.clone()),
                None => {
                    warn!("No voice for speaker {}, using the narrator voice", turn.speaker_id);
                    (narrator_voice.clone(), None)
                }
            };
            let spoken = match &turn.emotion {
                Some(emotion) => format!("[{}] {}", emotion, turn.text),
                None => turn.text.clone(),
            };
            units.push(Unit {
                id: format!("turn-{}", i + 1),
                speaker_id: turn.speaker_id.clone(),
                voice_id,
                options,
                text: turn.text.clone(),
                spoken,
            });
        }

        if !script.conclusion.trim().is_empty() {
            units.push(narration("conclusion", &script.conclusion));
        }
        Ok(units)
    }

    async fn synthesize_unit(&self, unit: Unit) -> Result<SynthesizedSegment> {
        let synthesizer = &self.synthesizer;
        let spoken = unit.spoken.as_str();
        let voice_id = unit.voice_id.as_str();
        let options = unit.options.as_ref();

        let audio_data = self
            .retry
            .call("synthesize", move || synthesizer.synthesize(spoken, voice_id, options))
            .await
            .map_err(|e| synthesis_error(&format!("Failed to synthesize {}", unit.id), e))?;

        debug!(segment = %unit.id, bytes = audio_data.len(), "Synthesized segment");
        Ok(SynthesizedSegment {
            duration: estimate_duration(&unit.text, self.chars_per_second),
            id: unit.id,
            speaker_id: unit.speaker_id,
            voice_id: unit.voice_id,
            text: unit.text,
            audio_data,
        })
    }
}

fn synthesis_error(context: &str, error: PodsmithError) -> PodsmithError {
    match error {
        PodsmithError::Cancelled => PodsmithError::Cancelled,
        PodsmithError::Synthesis(msg) => PodsmithError::Synthesis(format!("{}: {}", context, msg)),
        other => PodsmithError::Synthesis(format!("{}: {}", context, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::script::{DialogueTurn, ScriptMetadata, ScriptOptions};
    use crate::speech::{AudioFormat, SilentSynthesizer};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every synthesis call and returns the text as bytes.
    #[derive(Default)]
    struct EchoSynthesizer {
        calls: Mutex<Vec<(String, String)>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl SpeechSynthesizer for EchoSynthesizer {
        async fn list_voices(&self) -> Result<Vec<Voice>> {
            Ok(vec![])
        }

        async fn synthesize(&self, text: &str, voice_id: &str, _: Option<&VoiceOptions>) -> Result<Vec<u8>> {
            if self.fail_on.as_deref() == Some(text) {
                return Err(PodsmithError::Synthesis("quota exceeded".to_string()));
            }
            self.calls.lock().unwrap().push((text.to_string(), voice_id.to_string()));
            Ok(format!("<{}>", text).into_bytes())
        }

        fn format(&self) -> AudioFormat {
            AudioFormat::Mp3
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn turn(speaker: &str, text: &str, emotion: Option<&str>) -> DialogueTurn {
        DialogueTurn {
            speaker_id: speaker.to_string(),
            speaker_name: String::new(),
            text: text.to_string(),
            emotion: emotion.map(str::to_string),
            references: vec![],
        }
    }

    fn script(introduction: &str, dialogue: Vec<DialogueTurn>, conclusion: &str) -> PodcastScript {
        PodcastScript {
            id: "podcast-1".to_string(),
            title: "Exploring Rust".to_string(),
            description: "A chat.".to_string(),
            speakers: vec![Speaker::generic(0), Speaker::generic(1)],
            introduction: introduction.to_string(),
            metadata: ScriptMetadata {
                topic_count: 1,
                entity_count: 0,
                speaker_count: 2,
                turn_count: dialogue.len(),
                generated_at: Utc::now(),
                options: ScriptOptions::default(),
            },
            dialogue,
            conclusion: conclusion.to_string(),
            source_knowledge_graph_id: "kg-1".to_string(),
        }
    }

    fn mappings() -> Vec<SpeakerVoiceMapping> {
        vec![
            SpeakerVoiceMapping {
                speaker_id: "speaker-1".to_string(),
                voice_id: "v1".to_string(),
                voice_options: None,
            },
            SpeakerVoiceMapping {
                speaker_id: "speaker-2".to_string(),
                voice_id: "v2".to_string(),
                voice_options: None,
            },
        ]
    }

    fn stage(synthesizer: Arc<dyn SpeechSynthesizer>, max_concurrent: usize) -> VoiceStage {
        let settings = SpeechSettings {
            max_concurrent,
            ..Default::default()
        };
        VoiceStage::new(synthesizer, &settings, RetryContext::new(RetryPolicy::none(), Default::default()))
    }

    #[tokio::test]
    async fn test_units_in_order_with_narrator() {
        let synth = Arc::new(EchoSynthesizer::default());
        let script = script(
            "Welcome.",
            vec![turn("speaker-1", "Hi.", Some("excited")), turn("speaker-2", "Hello.", None)],
            "Goodbye.",
        );
        let audio = stage(synth.clone(), 1)
            .synthesize_podcast(&script, &mappings())
            .await
            .unwrap();

        let speakers: Vec<&str> = audio.segments.iter().map(|s| s.speaker_id.as_str()).collect();
        assert_eq!(speakers, vec![NARRATOR_ID, "speaker-1", "speaker-2", NARRATOR_ID]);
        assert_eq!(audio.segments[0].voice_id, "v1");
        assert_eq!(audio.segments[3].voice_id, "v1");

        // Emotion goes to the synthesizer only
        assert_eq!(synth.calls.lock().unwrap()[1].0, "[excited] Hi.");
        assert_eq!(audio.segments[1].text, "Hi.");
        assert_eq!(audio.segments[1].duration, 1.0);

        assert_eq!(audio.full_audio, b"<Welcome.><[excited] Hi.><Hello.><Goodbye.>".to_vec());
        assert_eq!(audio.total_duration, audio.segments[3].end_time);
        assert_eq!(audio.speaker_name("speaker-2"), Some("Speaker 2"));
    }

    #[tokio::test]
    async fn test_concurrent_synthesis_keeps_order() {
        let synth = Arc::new(EchoSynthesizer::default());
        let dialogue = (0..8)
            .map(|i| turn(if i % 2 == 0 { "speaker-1" } else { "speaker-2" }, &format!("Line {}", i), None))
            .collect();
        let audio = stage(synth, 4)
            .synthesize_podcast(&script("", dialogue, ""), &mappings())
            .await
            .unwrap();

        let ids: Vec<String> = audio.segments.iter().map(|s| s.id.clone()).collect();
        let expected: Vec<String> = (1..=8).map(|i| format!("turn-{}", i)).collect();
        assert_eq!(ids, expected);
        assert_eq!(audio.segments[0].start_time, 0.0);
        for pair in audio.segments.windows(2) {
            assert_eq!(pair[1].start_time, pair[0].end_time);
        }
    }

    #[tokio::test]
    async fn test_failure_is_synthesis_error() {
        let synth = Arc::new(EchoSynthesizer {
            fail_on: Some("Hello.".to_string()),
            ..Default::default()
        });
        let script = script("", vec![turn("speaker-1", "Hi.", None), turn("speaker-2", "Hello.", None)], "");
        let err = stage(synth, 1).synthesize_podcast(&script, &mappings()).await.unwrap_err();
        match err {
            PodsmithError::Synthesis(msg) => assert!(msg.contains("turn-2") && msg.contains("quota")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_mappings() {
        let synth = Arc::new(EchoSynthesizer::default());
        let script = script("Welcome.", vec![], "");
        let err = stage(synth, 1).synthesize_podcast(&script, &[]).await.unwrap_err();
        assert!(matches!(err, PodsmithError::NoVoicesAvailable));
    }

    #[tokio::test]
    async fn test_empty_script_has_zero_duration() {
        let synth = Arc::new(EchoSynthesizer::default());
        let audio = stage(synth, 1)
            .synthesize_podcast(&script("", vec![], ""), &[])
            .await
            .unwrap();
        assert!(audio.segments.is_empty());
        assert_eq!(audio.total_duration, 0.0);
    }

    #[tokio::test]
    async fn test_assign_voices_from_synthesizer() {
        let synth = Arc::new(SilentSynthesizer::new(AudioFormat::Mp3, 3.0));
        let speakers = vec![Speaker::generic(0), Speaker::generic(1)];
        let mappings = stage(synth, 1).assign_voices(&speakers).await.unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].voice_id, "voice-1");
        assert_eq!(mappings[1].voice_id, "voice-2");
    }
}
