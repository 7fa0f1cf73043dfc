//! CLI module for Podsmith.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Args, Parser, Subcommand};

/// Podsmith - turn anything you can read into a podcast
///
/// Ingests a web page, PDF, video or plain text, has a language model write a
/// multi-speaker conversation about it, and voices the result.
#[derive(Parser, Debug)]
#[command(name = "podsmith")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// How to read the positional input.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// URL, file path, or text
    pub input: String,

    /// Treat the input as literal text even if it looks like a URL or path
    #[arg(long, conflicts_with = "file")]
    pub text: bool,

    /// Treat the input as a file path
    #[arg(long)]
    pub file: bool,

    /// Use canned model output and silent audio (no API keys needed)
    #[arg(long)]
    pub offline: bool,
}

/// Options for `podsmith generate`.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: InputArgs,

    /// Number of speakers
    #[arg(short, long)]
    pub speakers: Option<usize>,

    /// Target number of dialogue turns
    #[arg(short, long)]
    pub turns: Option<usize>,

    /// Conversation tone (formal, casual, educational, entertaining, debate)
    #[arg(long)]
    pub tone: Option<String>,

    /// Topic to emphasize (repeatable)
    #[arg(long = "focus")]
    pub focus: Vec<String>,

    /// Personality hint for the next speaker (repeatable, in speaker order)
    #[arg(long = "personality")]
    pub personalities: Vec<String>,

    /// Skip the narrator introduction
    #[arg(long)]
    pub no_intro: bool,

    /// Skip the narrator conclusion
    #[arg(long)]
    pub no_outro: bool,

    /// Required audio format (mp3, wav, ogg)
    #[arg(long)]
    pub format: Option<String>,

    /// Transcript format (text, srt, vtt)
    #[arg(long)]
    pub transcript_format: Option<String>,

    /// Do not write a transcript
    #[arg(long)]
    pub no_transcript: bool,

    /// Leave speaker names out of the transcript
    #[arg(long)]
    pub no_labels: bool,

    /// Directory to write the podcast to
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print the generated script
    #[arg(long)]
    pub show_script: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a podcast from a URL, document, video or text
    Generate(GenerateArgs),

    /// Summarize a source without producing audio
    Summarize {
        #[command(flatten)]
        source: InputArgs,

        /// Maximum summary length in characters
        #[arg(short, long)]
        max_length: Option<usize>,
    },

    /// List the voices offered by the speech back-end
    Voices {
        /// List the offline voices instead
        #[arg(long)]
        offline: bool,
    },

    /// List deliverable audio formats
    Formats,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration (API keys masked)
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_args() {
        let cli = Cli::try_parse_from([
            "podsmith",
            "-vv",
            "generate",
            "https://example.com/post",
            "--speakers",
            "3",
            "--focus",
            "safety",
            "--focus",
            "speed",
            "--no-intro",
            "--offline",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate(GenerateArgs {
                source,
                speakers,
                focus,
                no_intro,
                ..
            }) => {
                assert_eq!(source.input, "https://example.com/post");
                assert!(source.offline);
                assert_eq!(speakers, Some(3));
                assert_eq!(focus, vec!["safety", "speed"]);
                assert!(no_intro);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_text_and_file_conflict() {
        let result = Cli::try_parse_from(["podsmith", "generate", "x", "--text", "--file"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::try_parse_from(["podsmith", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }
}
