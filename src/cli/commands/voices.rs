//! Voices command implementation.

use super::cancel_on_interrupt;
use crate::cli::Output;
use crate::config::Settings;
use crate::retry::RetryContext;
use crate::speech::{ElevenLabsSynthesizer, SilentSynthesizer, SpeechSynthesizer, VoiceStage};
use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run the voices command.
pub async fn run_voices(offline: bool, settings: Settings) -> Result<()> {
    let synthesizer: Arc<dyn SpeechSynthesizer> = if offline {
        Arc::new(SilentSynthesizer::new(
            settings.speech.format,
            settings.speech.chars_per_second,
        ))
    } else {
        let credentials = settings.credentials();
        let Some(key) = credentials.speech_api_key.as_deref() else {
            Output::error("No speech API key configured.");
            Output::info("Set PODSMITH_SPEECH_API_KEY or ELEVENLABS_API_KEY, or pass --offline.");
            anyhow::bail!("Missing speech API key");
        };
        Arc::new(ElevenLabsSynthesizer::new(key, &settings.speech)?)
    };

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());
    let stage = VoiceStage::new(
        synthesizer,
        &settings.speech,
        RetryContext::new(settings.retry, cancel),
    );

    let voices = stage.list_voices().await?;
    Output::header(&format!("Voices ({})", stage.synthesizer().name()));

    if voices.is_empty() {
        Output::warning("The speech back-end offers no voices.");
        return Ok(());
    }

    for voice in &voices {
        let line = format!("{} ({}) [{}]", voice.name, voice.id, voice.category);
        match &voice.description {
            Some(description) => Output::list_item(&format!("{} - {}", line, description)),
            None => Output::list_item(&line),
        }
    }

    Ok(())
}
