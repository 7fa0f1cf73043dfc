//! CLI command implementations.

mod config;
mod doctor;
mod formats;
mod generate;
mod summarize;
mod voices;

pub use config::run_config;
pub use doctor::run_doctor;
pub use formats::run_formats;
pub use generate::run_generate;
pub use summarize::run_summarize;
pub use voices::run_voices;

use crate::cli::InputArgs;
use crate::config::Settings;
use crate::error::{PodsmithError, Result};
use crate::ingest::SourceInput;
use tokio_util::sync::CancellationToken;

/// Turn the positional input into a [`SourceInput`], honoring `--text` and `--file`.
pub fn resolve_input(args: &InputArgs) -> Result<SourceInput> {
    if args.text {
        return Ok(SourceInput::Text(args.input.clone()));
    }

    if args.file {
        let path = Settings::expand_path(args.input.trim());
        if !path.is_file() {
            return Err(PodsmithError::Ingestion(format!(
                "File not found: {}",
                path.display()
            )));
        }
        return Ok(SourceInput::Document(path));
    }

    SourceInput::classify(&args.input)
}

/// Cancel `token` on Ctrl-C so in-flight calls and retry sleeps stop.
pub(crate) fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received SIGINT, cancelling run...");
            token.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(input: &str) -> InputArgs {
        InputArgs {
            input: input.to_string(),
            text: false,
            file: false,
            offline: true,
        }
    }

    #[test]
    fn test_text_flag_wins() {
        let input = InputArgs {
            text: true,
            ..args("https://example.com")
        };
        assert_eq!(
            resolve_input(&input).unwrap(),
            SourceInput::Text("https://example.com".to_string())
        );
    }

    #[test]
    fn test_file_flag_requires_file() {
        let input = InputArgs {
            file: true,
            ..args("/definitely/not/here.pdf")
        };
        assert!(matches!(
            resolve_input(&input),
            Err(PodsmithError::Ingestion(_))
        ));
    }

    #[test]
    fn test_file_flag_reads_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Some notes.").unwrap();
        let input = InputArgs {
            file: true,
            ..args(&file.path().display().to_string())
        };
        assert_eq!(
            resolve_input(&input).unwrap(),
            SourceInput::Document(file.path().to_path_buf())
        );
    }

    #[test]
    fn test_default_classification() {
        assert!(matches!(
            resolve_input(&args("https://example.com/a")).unwrap(),
            SourceInput::Url(_)
        ));
        assert!(matches!(
            resolve_input(&args("Just some words.")).unwrap(),
            SourceInput::Text(_)
        ));
    }
}
