//! Pipeline orchestrator for Podsmith.
//!
//! Drives one run through ingest, understanding, script, voice and delivery.
//! Each stage failure is tagged with its stage and aborts the run; retries
//! only happen around individual back-end calls inside a stage.

use crate::config::{Prompts, Settings};
use crate::delivery::{DeliveryOptions, FsStorage, LocalPublisher, PodcastPackage, Publisher, Storage};
use crate::error::{PipelineStage, PodsmithError, Result};
use crate::generation::{OfflineGenerator, OpenAiGenerator, TextGenerator};
use crate::ingest::{ContentIngestor, ContentPackage, SourceInput};
use crate::retry::RetryContext;
use crate::script::{LlmScriptWriter, PodcastScript, ScriptOptions, ScriptWriter};
use crate::speech::{
    ElevenLabsSynthesizer, PodcastAudio, SilentSynthesizer, SpeakerVoiceMapping,
    SpeechSynthesizer, Voice, VoiceStage,
};
use crate::understanding::{ContentUnderstanding, KnowledgeGraph, LlmUnderstanding};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Per-run overrides. Anything left `None` comes from [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub script: Option<ScriptOptions>,
    pub delivery: Option<DeliveryOptions>,
    /// Explicit speaker-to-voice assignment instead of automatic assignment.
    pub voice_mappings: Option<Vec<SpeakerVoiceMapping>>,
}

impl PipelineOptions {
    /// Script options for this run.
    pub fn script_options(&self, settings: &Settings) -> ScriptOptions {
        self.script.clone().unwrap_or_else(|| {
            let script = &settings.script;
            ScriptOptions {
                speaker_count: script.speaker_count,
                turn_count: script.turn_count,
                tone: script.tone,
                include_introduction: script.include_introduction,
                include_conclusion: script.include_conclusion,
                ..Default::default()
            }
        })
    }

    /// Delivery options for this run.
    pub fn delivery_options(&self, settings: &Settings) -> DeliveryOptions {
        self.delivery
            .clone()
            .unwrap_or_else(|| DeliveryOptions::from(&settings.delivery))
    }
}

/// Wall-clock time spent in one stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub elapsed: Duration,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub content: ContentPackage,
    pub graph: KnowledgeGraph,
    pub script: PodcastScript,
    pub package: PodcastPackage,
    pub timings: Vec<StageTiming>,
}

impl PipelineRun {
    pub fn total_elapsed(&self) -> Duration {
        self.timings.iter().map(|t| t.elapsed).sum()
    }
}

/// Fully constructed stage implementations.
pub struct Components {
    pub ingestor: ContentIngestor,
    pub understanding: Arc<dyn ContentUnderstanding>,
    pub writer: Arc<dyn ScriptWriter>,
    pub voice: VoiceStage,
    pub publisher: Arc<dyn Publisher>,
}

/// Back-ends from which the orchestrator builds its own stages.
pub struct Backends {
    pub ingestor: ContentIngestor,
    pub understanding: Arc<dyn TextGenerator>,
    pub script: Arc<dyn TextGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub storage: Arc<dyn Storage>,
}

/// The main orchestrator for the Podsmith pipeline.
pub struct Orchestrator {
    settings: Settings,
    components: Components,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Create an orchestrator with the real OpenAI and ElevenLabs back-ends.
    ///
    /// Fails before any work is done if a credential is missing.
    pub fn new(settings: Settings) -> Result<Self> {
        let credentials = settings.credentials();
        credentials.validate()?;

        let missing = |name: &str| PodsmithError::Config(format!("Missing {} API key", name));
        let understanding_key = credentials
            .understanding_api_key
            .as_deref()
            .ok_or_else(|| missing("understanding"))?;
        let script_key = credentials
            .script_api_key
            .as_deref()
            .ok_or_else(|| missing("script"))?;
        let speech_key = credentials
            .speech_api_key
            .as_deref()
            .ok_or_else(|| missing("speech"))?;

        let understanding = &settings.understanding;
        info!("Using {} for content understanding", understanding.model);
        let understanding_generator = Arc::new(OpenAiGenerator::new(
            understanding_key,
            &understanding.model,
            understanding.base_url.as_deref(),
            Duration::from_secs(understanding.timeout_secs),
        )?);

        let script = &settings.script;
        info!("Using {} for script generation", script.model);
        let script_generator = Arc::new(OpenAiGenerator::new(
            script_key,
            &script.model,
            script.base_url.as_deref(),
            Duration::from_secs(script.timeout_secs),
        )?);

        let synthesizer = Arc::new(ElevenLabsSynthesizer::new(speech_key, &settings.speech)?);

        std::fs::create_dir_all(settings.temp_dir())?;
        let backends = Backends {
            ingestor: ContentIngestor::new(&settings)?,
            understanding: understanding_generator,
            script: script_generator,
            synthesizer,
            storage: Arc::new(FsStorage::new(settings.output_dir())),
        };
        Self::with_backends(settings, backends)
    }

    /// Create an orchestrator that needs no API keys: canned model output and silent audio.
    pub fn offline(settings: Settings) -> Result<Self> {
        info!("Running offline: canned model output and silent audio");
        let generator = Arc::new(OfflineGenerator::new());

        std::fs::create_dir_all(settings.temp_dir())?;
        let backends = Backends {
            ingestor: ContentIngestor::new(&settings)?,
            understanding: generator.clone(),
            script: generator,
            synthesizer: Arc::new(SilentSynthesizer::new(
                settings.speech.format,
                settings.speech.chars_per_second,
            )),
            storage: Arc::new(FsStorage::new(settings.output_dir())),
        };
        Self::with_backends(settings, backends)
    }

    /// Create an orchestrator around injected back-ends.
    pub fn with_backends(settings: Settings, backends: Backends) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let cancel = CancellationToken::new();
        let retry = RetryContext::new(settings.retry.clone(), cancel.clone());

        let components = Components {
            ingestor: backends.ingestor,
            understanding: Arc::new(LlmUnderstanding::new(
                backends.understanding,
                prompts.clone(),
                settings.understanding.clone(),
                retry.clone(),
            )),
            writer: Arc::new(LlmScriptWriter::new(
                backends.script,
                prompts,
                settings.script.clone(),
                retry.clone(),
            )),
            voice: VoiceStage::new(backends.synthesizer, &settings.speech, retry),
            publisher: Arc::new(LocalPublisher::new(backends.storage)),
        };

        Ok(Self::with_components(settings, components, cancel))
    }

    /// Create an orchestrator with custom components.
    ///
    /// `cancel` should be the token the components' retry contexts were built with.
    pub fn with_components(settings: Settings, components: Components, cancel: CancellationToken) -> Self {
        Self {
            settings,
            components,
            cancel,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Token that cancels in-flight calls and retry sleeps for this orchestrator.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Voices offered by the speech back-end.
    pub async fn voices(&self) -> Result<Vec<Voice>> {
        self.components.voice.list_voices().await
    }

    /// Ingest `input` and summarize it in at most `max_length` characters.
    pub async fn summarize(&self, input: &SourceInput, max_length: usize) -> Result<(ContentPackage, String)> {
        let content = self
            .components
            .ingestor
            .ingest(input)
            .await
            .map_err(|e| e.at_stage(PipelineStage::Ingest))?;
        let summary = self
            .components
            .understanding
            .generate_summary(&content, max_length)
            .await
            .map_err(|e| e.at_stage(PipelineStage::Understand))?;
        Ok((content, summary))
    }

    /// Run the whole pipeline.
    pub async fn run(&self, input: &SourceInput, options: &PipelineOptions) -> Result<PipelineRun> {
        self.run_observed(input, options, |_| {}).await
    }

    /// Run the whole pipeline, calling `on_stage` as each stage starts.
    #[instrument(skip(self, input, options, on_stage), fields(input = %input.describe()))]
    pub async fn run_observed(
        &self,
        input: &SourceInput,
        options: &PipelineOptions,
        mut on_stage: impl FnMut(PipelineStage) + Send,
    ) -> Result<PipelineRun> {
        let script_options = options.script_options(&self.settings);
        let delivery_options = options.delivery_options(&self.settings);
        let mut timings = Vec::with_capacity(5);

        let stage = PipelineStage::Ingest;
        let started = self.begin(stage, &mut on_stage)?;
        let content = self
            .components
            .ingestor
            .ingest(input)
            .await
            .map_err(|e| e.at_stage(stage))?;
        timings.push(finish(stage, started));

        let stage = PipelineStage::Understand;
        let started = self.begin(stage, &mut on_stage)?;
        let graph = self
            .components
            .understanding
            .analyze_content(&content)
            .await
            .map_err(|e| e.at_stage(stage))?;
        timings.push(finish(stage, started));

        let stage = PipelineStage::Script;
        let started = self.begin(stage, &mut on_stage)?;
        let script = self
            .components
            .writer
            .generate_script(&graph, &script_options)
            .await
            .map_err(|e| e.at_stage(stage))?;
        timings.push(finish(stage, started));

        let stage = PipelineStage::Synthesize;
        let started = self.begin(stage, &mut on_stage)?;
        let audio = self
            .synthesize(&script, options.voice_mappings.as_deref())
            .await
            .map_err(|e| e.at_stage(stage))?;
        timings.push(finish(stage, started));

        let stage = PipelineStage::Deliver;
        let started = self.begin(stage, &mut on_stage)?;
        let package = self
            .components
            .publisher
            .package(&audio, &delivery_options)
            .await
            .map_err(|e| e.at_stage(stage))?;
        timings.push(finish(stage, started));

        let run = PipelineRun {
            content,
            graph,
            script,
            package,
            timings,
        };
        info!(
            elapsed_ms = run.total_elapsed().as_millis() as u64,
            "Podcast \"{}\" ready at {}",
            run.package.title,
            run.package.audio_url
        );
        Ok(run)
    }

    async fn synthesize(
        &self,
        script: &PodcastScript,
        mappings: Option<&[SpeakerVoiceMapping]>,
    ) -> Result<PodcastAudio> {
        let voice = &self.components.voice;
        match mappings {
            Some(mappings) => voice.synthesize_podcast(script, mappings).await,
            None => {
                let mappings = voice.assign_voices(&script.speakers).await?;
                voice.synthesize_podcast(script, &mappings).await
            }
        }
    }

    /// Refuse to start a stage once the run is cancelled.
    fn begin(&self, stage: PipelineStage, on_stage: &mut impl FnMut(PipelineStage)) -> Result<Instant> {
        if self.cancel.is_cancelled() {
            return Err(PodsmithError::Cancelled.at_stage(stage));
        }
        info!("Starting {}", stage);
        on_stage(stage);
        Ok(Instant::now())
    }
}

fn finish(stage: PipelineStage, started: Instant) -> StageTiming {
    StageTiming {
        stage,
        elapsed: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{Purpose, ScriptedGenerator};
    use crate::retry::RetryPolicy;
    use crate::script::Tone;
    use tempfile::TempDir;

    fn settings(dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.general.output_dir = dir.path().join("out").display().to_string();
        settings.general.temp_dir = dir.path().join("tmp").display().to_string();
        settings.retry = RetryPolicy::none();
        settings
    }

    fn scripted(settings: &Settings, understanding: ScriptedGenerator) -> Orchestrator {
        let backends = Backends {
            ingestor: ContentIngestor::new(settings).unwrap(),
            understanding: Arc::new(understanding),
            script: Arc::new(OfflineGenerator::new()),
            synthesizer: Arc::new(SilentSynthesizer::new(settings.speech.format, 3.0)),
            storage: Arc::new(FsStorage::new(settings.output_dir())),
        };
        Orchestrator::with_backends(settings.clone(), backends).unwrap()
    }

    #[test]
    fn test_options_default_to_settings() {
        let mut settings = Settings::default();
        settings.script.speaker_count = 3;
        settings.script.tone = Tone::Casual;
        settings.delivery.include_transcript = false;

        let options = PipelineOptions::default();
        let script = options.script_options(&settings);
        assert_eq!(script.speaker_count, 3);
        assert_eq!(script.tone, Tone::Casual);
        assert!(!options.delivery_options(&settings).include_transcript);

        let options = PipelineOptions {
            script: Some(ScriptOptions::default()),
            ..Default::default()
        };
        assert_eq!(options.script_options(&settings).speaker_count, 2);
    }

    #[tokio::test]
    async fn test_understanding_failure_is_tagged() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        let orchestrator = scripted(&settings, ScriptedGenerator::new().fail(Purpose::Topics, "upstream 500"));

        let mut seen = Vec::new();
        let err = orchestrator
            .run_observed(
                &SourceInput::Text("Some text worth discussing.".to_string()),
                &PipelineOptions::default(),
                |stage| seen.push(stage),
            )
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Understand));
        assert_eq!(seen, vec![PipelineStage::Ingest, PipelineStage::Understand]);
        assert!(err.to_string().contains("content understanding"));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_ingest_failure_is_tagged() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        let orchestrator = scripted(&settings, ScriptedGenerator::new());

        let err = orchestrator
            .run(&SourceInput::Text("   ".to_string()), &PipelineOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Ingest));
    }

    #[tokio::test]
    async fn test_cancelled_run_does_not_start() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        let orchestrator = scripted(&settings, ScriptedGenerator::new());
        orchestrator.cancel_token().cancel();

        let err = orchestrator
            .run(&SourceInput::Text("Hello.".to_string()), &PipelineOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Ingest));
        assert!(matches!(err, PodsmithError::Stage { ref source, .. } if matches!(**source, PodsmithError::Cancelled)));
    }

    #[tokio::test]
    async fn test_summarize() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        let orchestrator = scripted(
            &settings,
            ScriptedGenerator::new().respond(Purpose::Summary, "Short and sweet."),
        );

        let (content, summary) = orchestrator
            .summarize(&SourceInput::Text("Something to summarize.".to_string()), 100)
            .await
            .unwrap();
        assert_eq!(summary, "Short and sweet.");
        assert_eq!(content.content, vec!["Something to summarize."]);
    }

    #[test]
    fn test_new_requires_credentials() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir);
        settings.credentials.understanding_api_key = Some("sk-test".to_string());
        settings.credentials.script_api_key = Some("sk-test".to_string());
        settings.credentials.speech_api_key = Some(" ".to_string());

        // The speech key may still come from the environment, so only assert when it cannot.
        if std::env::var("PODSMITH_SPEECH_API_KEY").is_err() && std::env::var("ELEVENLABS_API_KEY").is_err() {
            assert!(matches!(Orchestrator::new(settings), Err(PodsmithError::Config(_))));
        }
    }
}
