//! Summarize command implementation.

use super::{cancel_on_interrupt, resolve_input};
use crate::cli::{preflight, InputArgs, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(source: &InputArgs, max_length: Option<usize>, settings: Settings) -> Result<()> {
    let input = resolve_input(source)?;
    if let Err(e) = preflight::check(&settings, &input, source.offline) {
        Output::error(&e.to_string());
        Output::info("Run 'podsmith doctor' for detailed diagnostics, or pass --offline.");
        return Err(e.into());
    }

    let max_length = max_length.unwrap_or(settings.understanding.summary_max_chars);
    let orchestrator = if source.offline {
        Orchestrator::offline(settings)?
    } else {
        Orchestrator::new(settings)?
    };
    cancel_on_interrupt(orchestrator.cancel_token());

    let spinner = Output::spinner("Summarizing...");
    let result = orchestrator.summarize(&input, max_length).await;
    spinner.finish_and_clear();

    let (content, summary) = result.map_err(|e| {
        Output::error(&e.to_string());
        e
    })?;

    let metadata = &content.metadata;
    Output::header(&metadata.title);
    Output::kv("Type", &content.source_type.to_string());
    Output::kv("Author", &metadata.author);
    if let Some(url) = &metadata.source_url {
        Output::kv("Source", url);
    }
    Output::kv("Blocks", &content.content.len().to_string());
    println!();
    println!("{}", summary);

    Ok(())
}
