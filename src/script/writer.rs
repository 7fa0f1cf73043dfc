//! LLM-backed script writer.

use super::models::{DialogueTurn, ScriptOptions, Speaker, FILLER_TEXT};
use super::ScriptWriter;
use crate::config::{PromptPair, Prompts, ScriptSettings};
use crate::error::{PodsmithError, Result};
use crate::generation::{GenerationRequest, Purpose, TextGenerator};
use crate::repair::{fit_count, repair_records};
use crate::retry::RetryContext;
use crate::understanding::KnowledgeGraph;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const INTRO_TOPIC_LIMIT: usize = 5;
const DIALOGUE_ENTITY_LIMIT: usize = 10;
const DIALOGUE_RELATIONSHIP_LIMIT: usize = 15;
const CONCLUSION_RECENT_TURNS: usize = 5;

/// Script writer driven by a [`TextGenerator`].
pub struct LlmScriptWriter {
    generator: Arc<dyn TextGenerator>,
    prompts: Prompts,
    settings: ScriptSettings,
    retry: RetryContext,
}

impl LlmScriptWriter {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        prompts: Prompts,
        settings: ScriptSettings,
        retry: RetryContext,
    ) -> Self {
        Self {
            generator,
            prompts,
            settings,
            retry,
        }
    }

    fn request(
        &self,
        purpose: Purpose,
        pair: &PromptPair,
        vars: &HashMap<String, String>,
        temperature: f32,
    ) -> GenerationRequest {
        GenerationRequest {
            purpose,
            system: self.prompts.render_with_custom(&pair.system, vars),
            prompt: self.prompts.render_with_custom(&pair.user, vars),
            temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    /// One plain model call through the retry wrapper.
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let generator = &self.generator;
        self.retry
            .call(request.purpose.as_str(), move || generator.generate(request))
            .await
    }

    fn base_vars(&self, options: &ScriptOptions) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("tone".to_string(), options.tone.to_string());
        vars.insert("turn_count".to_string(), options.turn_count.to_string());
        vars.insert("focus".to_string(), focus_hint(options));
        vars
    }
}

fn script_error(step: &'static str) -> impl FnOnce(PodsmithError) -> PodsmithError {
    move |e| PodsmithError::Script {
        step,
        source: Box::new(e),
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn focus_hint(options: &ScriptOptions) -> String {
    if options.focus_topics.is_empty() {
        String::new()
    } else {
        format!("Focus especially on: {}.\n", options.focus_topics.join(", "))
    }
}

fn personalities_hint(options: &ScriptOptions) -> String {
    if options.speaker_personalities.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = options
        .speaker_personalities
        .iter()
        .enumerate()
        .map(|(i, p)| format!("- Speaker {}: {}", i + 1, p))
        .collect();
    format!("Use these personalities, in order:\n{}\n", lines.join("\n"))
}

/// Rewrite repeated speaker ids so every id is unique.
fn dedupe_speaker_ids(speakers: &mut [Speaker]) {
    let mut seen = HashSet::new();
    for i in 0..speakers.len() {
        if seen.insert(speakers[i].id.clone()) {
            continue;
        }

        let mut candidate = format!("speaker-{}", i + 1);
        let mut suffix = 2;
        while speakers.iter().any(|s| s.id == candidate) || seen.contains(&candidate) {
            candidate = format!("speaker-{}-{}", i + 1, suffix);
            suffix += 1;
        }
        debug!("Renaming duplicate speaker id {} to {}", speakers[i].id, candidate);
        speakers[i].id = candidate.clone();
        seen.insert(candidate);
    }
}

/// Make every turn reference a real speaker.
///
/// Turns with an unknown `speaker_id` are reassigned to `speakers[index % len]`
/// rather than dropped. `speaker_name` always comes from the speaker list and
/// empty text becomes a short filler line.
pub fn normalize_dialogue(turns: Vec<DialogueTurn>, speakers: &[Speaker]) -> Vec<DialogueTurn> {
    if speakers.is_empty() {
        return turns;
    }

    let names: HashMap<&str, &str> = speakers
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();

    let mut reassigned = 0;
    let turns: Vec<DialogueTurn> = turns
        .into_iter()
        .enumerate()
        .map(|(i, mut turn)| {
            if !names.contains_key(turn.speaker_id.as_str()) {
                reassigned += 1;
                turn.speaker_id = speakers[i % speakers.len()].id.clone();
            }
            turn.speaker_name = names
                .get(turn.speaker_id.as_str())
                .map(|n| n.to_string())
                .unwrap_or_default();
            if turn.text.trim().is_empty() {
                turn.text = FILLER_TEXT.to_string();
            }
            turn
        })
        .collect();

    if reassigned > 0 {
        warn!("Reassigned {} dialogue turns with unknown speakers", reassigned);
    }
    turns
}

#[async_trait]
impl ScriptWriter for LlmScriptWriter {
    #[instrument(skip(self, graph, options), fields(graph_id = %graph.id, count = options.speaker_count))]
    async fn generate_speakers(
        &self,
        graph: &KnowledgeGraph,
        options: &ScriptOptions,
    ) -> Result<Vec<Speaker>> {
        let count = options.speaker_count.max(1);

        let mut vars = self.base_vars(options);
        vars.insert("count".to_string(), count.to_string());
        vars.insert("topics".to_string(), to_json(&graph.topics)?);
        vars.insert("entities".to_string(), to_json(&graph.entities)?);
        vars.insert("personalities".to_string(), personalities_hint(options));

        let request = self.request(
            Purpose::Speakers,
            &self.prompts.script.speakers,
            &vars,
            self.settings.temperature,
        );
        let raw = self.generate(&request).await.map_err(script_error("speakers"))?;

        let parsed = match repair_records::<Speaker>(&raw) {
            Ok(speakers) => speakers,
            Err(e) if e.is_output_error() => {
                warn!("Unusable speakers output, using generic speakers: {}", e);
                Vec::new()
            }
            Err(e) => return Err(script_error("speakers")(e)),
        };

        let mut speakers = fit_count(parsed, count, Speaker::generic);
        dedupe_speaker_ids(&mut speakers);
        Ok(speakers)
    }

    #[instrument(skip_all, fields(graph_id = %graph.id))]
    async fn generate_introduction(
        &self,
        graph: &KnowledgeGraph,
        speakers: &[Speaker],
        options: &ScriptOptions,
    ) -> Result<String> {
        let top: Vec<_> = graph
            .topics_by_importance()
            .into_iter()
            .take(INTRO_TOPIC_LIMIT)
            .collect();

        let mut vars = self.base_vars(options);
        vars.insert("topics".to_string(), to_json(&top)?);
        vars.insert("speakers".to_string(), to_json(speakers)?);

        let request = self.request(
            Purpose::Introduction,
            &self.prompts.script.introduction,
            &vars,
            self.settings.temperature,
        );
        let raw = self
            .generate(&request)
            .await
            .map_err(script_error("introduction"))?;
        Ok(raw.trim().to_string())
    }

    #[instrument(skip_all, fields(graph_id = %graph.id, target_turns = options.turn_count))]
    async fn generate_dialogue(
        &self,
        graph: &KnowledgeGraph,
        speakers: &[Speaker],
        options: &ScriptOptions,
    ) -> Result<Vec<DialogueTurn>> {
        let entities: Vec<_> = graph.entities.iter().take(DIALOGUE_ENTITY_LIMIT).collect();
        let relationships: Vec<_> = graph
            .relationships
            .iter()
            .take(DIALOGUE_RELATIONSHIP_LIMIT)
            .collect();

        let mut vars = self.base_vars(options);
        vars.insert("speakers".to_string(), to_json(speakers)?);
        vars.insert("topics".to_string(), to_json(&graph.topics)?);
        vars.insert("entities".to_string(), to_json(&entities)?);
        vars.insert("relationships".to_string(), to_json(&relationships)?);

        let request = self.request(
            Purpose::Dialogue,
            &self.prompts.script.dialogue,
            &vars,
            self.settings.dialogue_temperature,
        );

        // Generation and parsing retry together so malformed output is regenerated.
        let generator = &self.generator;
        let request = &request;
        let turns = self
            .retry
            .call("dialogue", move || async move {
                let raw = generator.generate(request).await?;
                let turns = repair_records::<DialogueTurn>(&raw)?;
                if turns.is_empty() {
                    return Err(PodsmithError::MalformedOutput {
                        reason: "response contained no dialogue turns".to_string(),
                        raw,
                    });
                }
                Ok(turns)
            })
            .await
            .map_err(script_error("dialogue"))?;

        let turns = normalize_dialogue(turns, speakers);
        if turns.len() != options.turn_count {
            debug!(
                requested = options.turn_count,
                received = turns.len(),
                "Dialogue length differs from target"
            );
        }
        Ok(turns)
    }

    #[instrument(skip_all, fields(graph_id = %graph.id))]
    async fn generate_conclusion(
        &self,
        graph: &KnowledgeGraph,
        speakers: &[Speaker],
        dialogue: &[DialogueTurn],
        options: &ScriptOptions,
    ) -> Result<String> {
        let topic_names: Vec<&str> = graph
            .topics_by_importance()
            .into_iter()
            .take(INTRO_TOPIC_LIMIT)
            .map(|t| t.name.as_str())
            .collect();
        let recent: Vec<String> = dialogue
            .iter()
            .skip(dialogue.len().saturating_sub(CONCLUSION_RECENT_TURNS))
            .map(|t| format!("{}: {}", t.speaker_name, t.text))
            .collect();

        let mut vars = self.base_vars(options);
        vars.insert("speakers".to_string(), to_json(speakers)?);
        vars.insert("topic_names".to_string(), topic_names.join(", "));
        vars.insert("recent_dialogue".to_string(), recent.join("\n\n"));

        let request = self.request(
            Purpose::Conclusion,
            &self.prompts.script.conclusion,
            &vars,
            self.settings.temperature,
        );
        let raw = self
            .generate(&request)
            .await
            .map_err(script_error("conclusion"))?;
        Ok(raw.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ScriptedGenerator;
    use crate::retry::RetryPolicy;
    use crate::understanding::Topic;

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::new(
            vec![Topic {
                id: "topic-1".to_string(),
                name: "Ownership".to_string(),
                description: "Who owns what.".to_string(),
                importance: 9,
                related_content: vec![],
            }],
            vec![],
            vec![],
            vec![],
        )
    }

    fn writer(generator: Arc<ScriptedGenerator>, policy: RetryPolicy) -> LlmScriptWriter {
        LlmScriptWriter::new(
            generator,
            Prompts::default(),
            ScriptSettings::default(),
            RetryContext::new(policy, Default::default()),
        )
    }

    const TWO_SPEAKERS: &str = r#"[
        {"id": "speaker-1", "name": "Ada", "personality": "Precise", "expertise": ["Math"], "perspective": "Formal"},
        {"id": "speaker-2", "name": "Linus", "personality": "Blunt", "expertise": ["Kernels"], "perspective": "Practical"}
    ]"#;

    #[tokio::test]
    async fn test_speaker_count_is_exact() {
        for count in [1usize, 2, 4] {
            let generator = Arc::new(ScriptedGenerator::new().respond(Purpose::Speakers, TWO_SPEAKERS));
            let options = ScriptOptions {
                speaker_count: count,
                ..Default::default()
            };
            let speakers = writer(generator, RetryPolicy::none())
                .generate_speakers(&graph(), &options)
                .await
                .unwrap();
            assert_eq!(speakers.len(), count);
        }
    }

    #[tokio::test]
    async fn test_unparseable_speakers_become_generic() {
        let generator = Arc::new(ScriptedGenerator::new().respond(Purpose::Speakers, "Sorry, I can't help."));
        let speakers = writer(generator, RetryPolicy::none())
            .generate_speakers(&graph(), &ScriptOptions::default())
            .await
            .unwrap();
        assert_eq!(speakers, vec![Speaker::generic(0), Speaker::generic(1)]);
    }

    #[tokio::test]
    async fn test_duplicate_speaker_ids_rewritten() {
        let generator = Arc::new(ScriptedGenerator::new().respond(
            Purpose::Speakers,
            r#"[{"id": "host", "name": "A"}, {"id": "host", "name": "B"}, {"id": "speaker-3", "name": "C"}]"#,
        ));
        let options = ScriptOptions {
            speaker_count: 3,
            ..Default::default()
        };
        let speakers = writer(generator, RetryPolicy::none())
            .generate_speakers(&graph(), &options)
            .await
            .unwrap();
        let ids: HashSet<&str> = speakers.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(speakers[0].id, "host");
        assert_eq!(speakers[1].id, "speaker-2");
    }

    #[tokio::test]
    async fn test_unknown_speaker_reassigned() {
        let speakers = vec![Speaker::generic(0), Speaker::generic(1)];
        let generator = Arc::new(ScriptedGenerator::new().respond(
            Purpose::Dialogue,
            r#"[
                {"speakerId": "speaker-1", "speakerName": "Wrong Name", "text": "First."},
                {"speakerId": "speaker-9", "text": "Second."},
                {"speakerId": "speaker-2", "text": ""}
            ]"#,
        ));
        let turns = writer(generator, RetryPolicy::none())
            .generate_dialogue(&graph(), &speakers, &ScriptOptions::default())
            .await
            .unwrap();

        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].speaker_name, "Speaker 1");
        assert_eq!(turns[1].speaker_id, "speaker-2");
        assert_eq!(turns[1].speaker_name, "Speaker 2");
        assert_eq!(turns[2].text, FILLER_TEXT);
        let ids: HashSet<&str> = speakers.iter().map(|s| s.id.as_str()).collect();
        assert!(turns.iter().all(|t| ids.contains(t.speaker_id.as_str())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_dialogue_is_regenerated() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond(Purpose::Dialogue, "I'd rather not.")
                .respond(Purpose::Dialogue, r#"[{"speakerId": "speaker-1", "text": "Finally."}]"#),
        );
        let policy = RetryPolicy {
            max_retries: 2,
            initial_backoff_ms: 10,
        };
        let turns = writer(generator.clone(), policy)
            .generate_dialogue(&graph(), &[Speaker::generic(0)], &ScriptOptions::default())
            .await
            .unwrap();

        assert_eq!(turns.len(), 1);
        assert_eq!(generator.calls(Purpose::Dialogue), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistently_malformed_dialogue_fails() {
        let generator = Arc::new(ScriptedGenerator::new().respond(Purpose::Dialogue, "[]"));
        let policy = RetryPolicy {
            max_retries: 1,
            initial_backoff_ms: 10,
        };
        let err = writer(generator.clone(), policy)
            .generate_dialogue(&graph(), &[Speaker::generic(0)], &ScriptOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PodsmithError::Script { step: "dialogue", .. }));
        assert_eq!(err.raw_output(), Some("[]"));
        assert_eq!(generator.calls(Purpose::Dialogue), 2);
    }

    #[tokio::test]
    async fn test_generate_script_skips_disabled_sections() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond(Purpose::Speakers, TWO_SPEAKERS)
                .respond(Purpose::Dialogue, r#"[{"speakerId": "speaker-2", "text": "Hi."}]"#),
        );
        let options = ScriptOptions {
            include_introduction: false,
            include_conclusion: false,
            ..Default::default()
        };
        let script = writer(generator.clone(), RetryPolicy::none())
            .generate_script(&graph(), &options)
            .await
            .unwrap();

        assert!(script.introduction.is_empty());
        assert!(script.conclusion.is_empty());
        assert_eq!(generator.calls(Purpose::Introduction), 0);
        assert_eq!(generator.calls(Purpose::Conclusion), 0);
        assert_eq!(script.title, "Exploring Ownership");
        assert_eq!(script.metadata.turn_count, 1);
        assert_eq!(script.dialogue[0].speaker_name, "Linus");
    }

    #[tokio::test]
    async fn test_prompt_carries_options() {
        let generator = Arc::new(ScriptedGenerator::new().respond(Purpose::Speakers, TWO_SPEAKERS));
        let options = ScriptOptions {
            speaker_count: 2,
            tone: crate::script::Tone::Debate,
            speaker_personalities: vec!["Skeptic".to_string()],
            ..Default::default()
        };
        writer(generator.clone(), RetryPolicy::none())
            .generate_speakers(&graph(), &options)
            .await
            .unwrap();

        let prompt = &generator.requests()[0].prompt;
        assert!(prompt.contains("debate"));
        assert!(prompt.contains("Speaker 1: Skeptic"));
        assert!(prompt.contains("Ownership"));
    }
}
