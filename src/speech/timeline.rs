//! Duration estimates, timeline assembly and audio concatenation.

use super::models::{AudioFormat, AudioSegment, SynthesizedSegment};
use crate::error::{PodsmithError, Result};

/// Speaking rate used when nothing better is configured.
pub const DEFAULT_CHARS_PER_SECOND: f64 = 3.0;

/// Estimated spoken duration of `text` in seconds.
///
/// This is a character-rate approximation, not a measurement of the audio.
/// It is applied to every segment of a run so the timeline stays internally
/// consistent. Non-positive rates fall back to [`DEFAULT_CHARS_PER_SECOND`].
pub fn estimate_duration(text: &str, chars_per_second: f64) -> f64 {
    let rate = if chars_per_second > 0.0 {
        chars_per_second
    } else {
        DEFAULT_CHARS_PER_SECOND
    };
    text.chars().count() as f64 / rate
}

/// Place segments back to back starting at zero.
pub fn assign_timeline(segments: Vec<SynthesizedSegment>) -> Vec<AudioSegment> {
    let mut cursor = 0.0;
    segments
        .into_iter()
        .map(|s| {
            let start_time = cursor;
            cursor += s.duration;
            AudioSegment {
                id: s.id,
                speaker_id: s.speaker_id,
                voice_id: s.voice_id,
                text: s.text,
                audio_data: s.audio_data,
                duration: s.duration,
                start_time,
                end_time: cursor,
            }
        })
        .collect()
}

/// Total duration of a timeline: the last segment's end, or zero.
pub fn total_duration(segments: &[AudioSegment]) -> f64 {
    segments.last().map(|s| s.end_time).unwrap_or(0.0)
}

/// Detect the container of an audio buffer from its leading bytes.
pub fn sniff_format(data: &[u8]) -> Option<AudioFormat> {
    match data {
        [b'I', b'D', b'3', ..] => Some(AudioFormat::Mp3),
        [0xFF, second, ..] if second & 0xE0 == 0xE0 => Some(AudioFormat::Mp3),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some(AudioFormat::Wav),
        [b'O', b'g', b'g', b'S', ..] => Some(AudioFormat::Ogg),
        _ => None,
    }
}

/// Join segment audio in timeline order.
///
/// Buffers whose container cannot be detected are accepted as-is. A buffer
/// detected as a different container than `expected` fails the run.
pub fn concatenate_audio(segments: &[AudioSegment], expected: AudioFormat) -> Result<Vec<u8>> {
    let size = segments.iter().map(|s| s.audio_data.len()).sum();
    let mut audio = Vec::with_capacity(size);

    for segment in segments {
        if let Some(found) = sniff_format(&segment.audio_data) {
            if found != expected {
                return Err(PodsmithError::Synthesis(format!(
                    "Segment {} is {} audio but the podcast is {}",
                    segment.id, found, expected
                )));
            }
        }
        audio.extend_from_slice(&segment.audio_data);
    }

    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesized(id: &str, text: &str, data: &[u8]) -> SynthesizedSegment {
        SynthesizedSegment {
            id: id.to_string(),
            speaker_id: "speaker-1".to_string(),
            voice_id: "voice-1".to_string(),
            text: text.to_string(),
            audio_data: data.to_vec(),
            duration: estimate_duration(text, DEFAULT_CHARS_PER_SECOND),
        }
    }

    #[test]
    fn test_estimate_duration() {
        assert_eq!(estimate_duration("abcdef", 3.0), 2.0);
        assert_eq!(estimate_duration("", 3.0), 0.0);
        assert_eq!(estimate_duration("abc", 0.0), 1.0);
        // Characters, not bytes
        assert_eq!(estimate_duration("ééé", 3.0), 1.0);
    }

    #[test]
    fn test_timeline_is_contiguous() {
        let segments = assign_timeline(vec![
            synthesized("intro", "Welcome to the show.", b""),
            synthesized("turn-1", "Hi.", b""),
            synthesized("turn-2", "", b""),
            synthesized("turn-3", "A much longer line of dialogue.", b""),
        ]);

        assert_eq!(segments[0].start_time, 0.0);
        for pair in segments.windows(2) {
            assert_eq!(pair[1].start_time, pair[0].end_time);
        }
        for s in &segments {
            assert!((s.end_time - s.start_time - s.duration).abs() < 1e-9);
        }
        assert_eq!(total_duration(&segments), segments[3].end_time);
        assert_eq!(total_duration(&[]), 0.0);
    }

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(b"ID3\x04\x00"), Some(AudioFormat::Mp3));
        assert_eq!(sniff_format(&[0xFF, 0xFB, 0x90, 0x64]), Some(AudioFormat::Mp3));
        assert_eq!(sniff_format(b"RIFF\x24\x00\x00\x00WAVEfmt "), Some(AudioFormat::Wav));
        assert_eq!(sniff_format(b"OggS\x00\x02"), Some(AudioFormat::Ogg));
        assert_eq!(sniff_format(b"\x00\x00\x00"), None);
        assert_eq!(sniff_format(b""), None);
    }

    #[test]
    fn test_concatenate_in_order() {
        let segments = assign_timeline(vec![
            synthesized("a", "one", b"ID3first"),
            synthesized("b", "two", b"\x00raw"),
            synthesized("c", "three", &[0xFF, 0xFB, 0x01]),
        ]);
        let audio = concatenate_audio(&segments, AudioFormat::Mp3).unwrap();
        assert_eq!(audio, b"ID3first\x00raw\xFF\xFB\x01".to_vec());
    }

    #[test]
    fn test_concatenate_rejects_mixed_formats() {
        let segments = assign_timeline(vec![
            synthesized("a", "one", b"ID3first"),
            synthesized("b", "two", b"OggSsecond"),
        ]);
        let err = concatenate_audio(&segments, AudioFormat::Mp3).unwrap_err();
        assert!(matches!(err, PodsmithError::Synthesis(ref msg) if msg.contains("Segment b")));
    }
}
