//! Generate command implementation.

use super::{cancel_on_interrupt, resolve_input};
use crate::cli::output::{format_duration, format_size, preview};
use crate::cli::{preflight, GenerateArgs, Output};
use crate::config::Settings;
use crate::delivery::{DeliveryOptions, TranscriptFormat};
use crate::error::PodsmithError;
use crate::orchestrator::{Orchestrator, PipelineOptions, PipelineRun};
use crate::script::{ScriptOptions, Tone};
use crate::speech::AudioFormat;
use anyhow::Result;

/// Run the generate command.
pub async fn run_generate(args: &GenerateArgs, mut settings: Settings) -> Result<()> {
    let options = pipeline_options(args, &mut settings)?;
    let input = resolve_input(&args.source)?;
    let offline = args.source.offline;

    if let Err(e) = preflight::check(&settings, &input, offline) {
        Output::error(&e.to_string());
        Output::info("Run 'podsmith doctor' for detailed diagnostics, or pass --offline.");
        return Err(e.into());
    }

    let orchestrator = if offline {
        Orchestrator::offline(settings)?
    } else {
        Orchestrator::new(settings)?
    };
    cancel_on_interrupt(orchestrator.cancel_token());

    Output::info(&format!("Processing: {}", input.describe()));
    let spinner = Output::spinner("Starting...");
    let result = orchestrator
        .run_observed(&input, &options, |stage| {
            spinner.set_message(Output::stage_message(stage));
        })
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(run) => {
            print_run(&run, args.show_script);
            Ok(())
        }
        Err(e) => {
            report_failure(&e);
            Err(e.into())
        }
    }
}

/// Apply command-line overrides to `settings` and build the run options.
fn pipeline_options(args: &GenerateArgs, settings: &mut Settings) -> Result<PipelineOptions> {
    if let Some(output) = &args.output {
        settings.general.output_dir = output.clone();
    }

    let format = args
        .format
        .as_deref()
        .map(str::parse::<AudioFormat>)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    if let Some(format) = format {
        settings.speech.format = format;
    }

    let mut script: ScriptOptions = PipelineOptions::default().script_options(settings);
    if let Some(speakers) = args.speakers {
        script.speaker_count = speakers;
    }
    if let Some(turns) = args.turns {
        script.turn_count = turns;
    }
    if let Some(tone) = &args.tone {
        script.tone = tone.parse::<Tone>().map_err(anyhow::Error::msg)?;
    }
    script.focus_topics = args.focus.clone();
    script.speaker_personalities = args.personalities.clone();
    script.include_introduction &= !args.no_intro;
    script.include_conclusion &= !args.no_outro;

    let mut delivery = DeliveryOptions::from(&settings.delivery);
    delivery.format = format;
    if let Some(transcript_format) = &args.transcript_format {
        delivery.transcript_format = transcript_format
            .parse::<TranscriptFormat>()
            .map_err(anyhow::Error::msg)?;
    }
    delivery.include_transcript &= !args.no_transcript;
    delivery.include_speaker_labels &= !args.no_labels;

    Ok(PipelineOptions {
        script: Some(script),
        delivery: Some(delivery),
        voice_mappings: None,
    })
}

fn print_run(run: &PipelineRun, show_script: bool) {
    let package = &run.package;
    Output::success(&format!("Podcast ready: {}", package.title));

    Output::header("Files");
    Output::kv("Audio", &package.audio_url);
    if let Some(transcript) = &package.transcript_url {
        Output::kv("Transcript", transcript);
    }
    if let Some(metadata) = &package.metadata_url {
        Output::kv("Metadata", metadata);
    }

    Output::header("Podcast");
    Output::kv("Duration", &format_duration(package.duration));
    Output::kv("Size", &format_size(package.size));
    Output::kv("Format", &package.format.to_string());
    Output::kv("Turns", &run.script.dialogue.len().to_string());
    Output::kv("Topics", &run.graph.topics.len().to_string());

    Output::header("Speakers");
    for speaker in &run.script.speakers {
        Output::speaker(&speaker.name, &speaker.id, &speaker.personality);
    }

    if show_script {
        Output::header("Script");
        if !run.script.introduction.is_empty() {
            Output::dialogue("Narrator", &run.script.introduction);
        }
        for turn in &run.script.dialogue {
            Output::dialogue(&turn.speaker_name, &turn.text);
        }
        if !run.script.conclusion.is_empty() {
            Output::dialogue("Narrator", &run.script.conclusion);
        }
    }

    Output::header("Timing");
    for timing in &run.timings {
        Output::stage_timing(timing.stage, timing.elapsed);
    }
    Output::kv("Total", &format!("{:.1}s", run.total_elapsed().as_secs_f64()));
}

fn report_failure(error: &PodsmithError) {
    Output::error(&error.to_string());
    if let Some(raw) = error.raw_output() {
        Output::info(&format!("Model output: {}", preview(raw, 200)));
    }
    match error.stage() {
        Some(stage) => Output::info(&format!("The run stopped during {}.", stage)),
        None => Output::info("Run 'podsmith doctor' for detailed diagnostics."),
    }
}
