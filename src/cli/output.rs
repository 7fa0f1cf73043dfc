//! Terminal output for podsmith commands.

use crate::error::PipelineStage;
use console::{style, Color};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Styled status lines. Warnings and errors go to stderr.
pub struct Output;

impl Output {
    fn status(color: Color, msg: &str, stderr: bool) {
        let marker = style(">>").fg(color).bold();
        if stderr {
            eprintln!("{} {}", marker, msg);
        } else {
            println!("{} {}", marker, msg);
        }
    }

    pub fn info(msg: &str) {
        Self::status(Color::Cyan, msg, false);
    }

    pub fn success(msg: &str) {
        Self::status(Color::Green, msg, false);
    }

    pub fn warning(msg: &str) {
        Self::status(Color::Yellow, msg, true);
    }

    pub fn error(msg: &str) {
        Self::status(Color::Red, msg, true);
    }

    /// Underlined section title preceded by a blank line.
    pub fn header(title: &str) {
        println!("\n{}", style(title).bold().underlined());
    }

    /// Indented `key: value` line.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    pub fn list_item(item: &str) {
        println!("  {} {}", style("*").cyan(), item);
    }

    /// A speaker and their personality.
    pub fn speaker(name: &str, id: &str, personality: &str) {
        println!(
            "  {} {} ({}) - {}",
            style("*").cyan(),
            style(name).bold(),
            style(id).dim(),
            personality
        );
    }

    /// One line of the script.
    pub fn dialogue(name: &str, text: &str) {
        println!("  {} {}", style(format!("{}:", name)).cyan().bold(), text);
    }

    pub fn stage_timing(stage: PipelineStage, elapsed: Duration) {
        println!(
            "  {} {:<22} {}",
            style("*").cyan(),
            stage.to_string(),
            style(format!("{:.1}s", elapsed.as_secs_f64())).dim()
        );
    }

    /// Spinner label shown while `stage` runs.
    pub fn stage_message(stage: PipelineStage) -> &'static str {
        match stage {
            PipelineStage::Ingest => "Reading source...",
            PipelineStage::Understand => "Analyzing content...",
            PipelineStage::Script => "Writing script...",
            PipelineStage::Synthesize => "Synthesizing voices...",
            PipelineStage::Deliver => "Packaging podcast...",
        }
    }

    /// Steady-ticking spinner; call `finish_and_clear` when done.
    pub fn spinner(msg: &'static str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner().with_message(msg);
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(template);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

/// Podcast length as `M:SS`, or `H:MM:SS` past the hour.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, total / 60 % 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Byte count in B, KB or MB.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in ["B", "KB"] {
        if value < 1024.0 {
            return if unit == "B" {
                format!("{} B", bytes)
            } else {
                format!("{:.1} {}", value, unit)
            };
        }
        value /= 1024.0;
    }
    format!("{:.1} MB", value)
}

/// Single-line preview of `content`, cut at `max_chars` characters.
pub fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(4.4), "0:04");
        assert_eq!(format_duration(125.0), "2:05");
        assert_eq!(format_duration(3725.0), "1:02:05");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short\ntext", 20), "short text");
        assert_eq!(preview("ééééé", 3), "ééé...");
    }
}
