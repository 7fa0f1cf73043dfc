//! Pre-flight checks before a run.
//!
//! Catches missing credentials and tools before any content is fetched or
//! any paid call is made.

use crate::config::Settings;
use crate::error::{PodsmithError, Result};
use crate::ingest::{is_video_url, SourceInput};
use std::process::Command;

/// Check everything a run over `input` will need.
pub fn check(settings: &Settings, input: &SourceInput, offline: bool) -> Result<()> {
    if !offline {
        settings.credentials().validate()?;
    }

    if let SourceInput::Url(url) = input {
        if is_video_url(url, &settings.ingestion.video_domains) {
            check_tool(&settings.ingestion.yt_dlp_path)?;
        }
    }
    Ok(())
}

/// Check that an external tool runs.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(PodsmithError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PodsmithError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(PodsmithError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_text_needs_nothing() {
        let input = SourceInput::Text("hello".to_string());
        assert!(check(&Settings::default(), &input, true).is_ok());
    }

    #[test]
    fn test_missing_tool() {
        let err = check_tool("podsmith-no-such-tool").unwrap_err();
        assert!(matches!(err, PodsmithError::ToolNotFound(name) if name == "podsmith-no-such-tool"));
    }

    #[test]
    fn test_video_url_needs_ytdlp() {
        let mut settings = Settings::default();
        settings.ingestion.yt_dlp_path = "podsmith-no-such-tool".to_string();
        let input = SourceInput::classify("https://www.youtube.com/watch?v=abc").unwrap();
        assert!(matches!(
            check(&settings, &input, true),
            Err(PodsmithError::ToolNotFound(_))
        ));
    }
}
