//! Formats command implementation.

use crate::cli::Output;
use crate::delivery::formats;
use anyhow::Result;

/// Run the formats command.
pub fn run_formats() -> Result<()> {
    Output::header("Audio Formats");
    for format in formats() {
        Output::list_item(&format!(
            "{} (.{}, {}) - {}",
            format.name, format.extension, format.mime_type, format.description
        ));
    }
    Ok(())
}
