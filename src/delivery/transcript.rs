//! Transcript rendering (plain text, SRT, VTT).
//!
//! Transcripts are built from the audio segments alone: text and start/end
//! times come straight from the timeline.

use crate::speech::{AudioSegment, PodcastAudio, NARRATOR_ID};
use serde::{Deserialize, Serialize};

pub const UNTITLED_PODCAST: &str = "Untitled Podcast";

/// Supported transcript formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptFormat {
    #[default]
    Text,
    Srt,
    Vtt,
}

impl TranscriptFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TranscriptFormat::Text => "txt",
            TranscriptFormat::Srt => "srt",
            TranscriptFormat::Vtt => "vtt",
        }
    }
}

impl std::str::FromStr for TranscriptFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(TranscriptFormat::Text),
            "srt" => Ok(TranscriptFormat::Srt),
            "vtt" | "webvtt" => Ok(TranscriptFormat::Vtt),
            _ => Err(format!("Unknown transcript format: {}. Use text, srt, or vtt.", s)),
        }
    }
}

/// Render a transcript of the podcast audio.
pub fn render_transcript(audio: &PodcastAudio, format: TranscriptFormat, speaker_labels: bool) -> String {
    match format {
        TranscriptFormat::Text => render_text(audio, speaker_labels),
        TranscriptFormat::Srt => render_srt(audio, speaker_labels),
        TranscriptFormat::Vtt => render_vtt(audio, speaker_labels),
    }
}

/// Display label for a segment's speaker.
fn speaker_label<'a>(audio: &'a PodcastAudio, segment: &'a AudioSegment) -> &'a str {
    if segment.speaker_id == NARRATOR_ID {
        return "Narrator";
    }
    audio
        .speaker_name(&segment.speaker_id)
        .unwrap_or(&segment.speaker_id)
}

fn cue_text(audio: &PodcastAudio, segment: &AudioSegment, speaker_labels: bool) -> String {
    if speaker_labels {
        format!("{}: {}", speaker_label(audio, segment), segment.text)
    } else {
        segment.text.clone()
    }
}

fn render_text(audio: &PodcastAudio, speaker_labels: bool) -> String {
    let title = if audio.metadata.title.trim().is_empty() {
        UNTITLED_PODCAST
    } else {
        audio.metadata.title.as_str()
    };

    let mut output = format!("# {}\n\n", title);
    for segment in &audio.segments {
        output.push_str(&format!(
            "[{}] {}\n\n",
            format_clock(segment.start_time),
            cue_text(audio, segment, speaker_labels)
        ));
    }
    output
}

fn render_srt(audio: &PodcastAudio, speaker_labels: bool) -> String {
    let mut output = String::new();

    for (i, segment) in audio.segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(segment.start_time, ','),
            format_timestamp(segment.end_time, ',')
        ));
        output.push_str(&cue_text(audio, segment, speaker_labels));
        output.push_str("\n\n");
    }

    output
}

fn render_vtt(audio: &PodcastAudio, speaker_labels: bool) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for (i, segment) in audio.segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(segment.start_time, '.'),
            format_timestamp(segment.end_time, '.')
        ));
        if speaker_labels {
            output.push_str(&format!("<v {}>{}", speaker_label(audio, segment), segment.text));
        } else {
            output.push_str(&segment.text);
        }
        output.push_str("\n\n");
    }

    output
}

/// `MM:SS`, minutes not capped at 60.
fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// `HH:MM:SS,mmm` (SRT) or `HH:MM:SS.mmm` (VTT).
fn format_timestamp(seconds: f64, separator: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, separator, ms)
}
