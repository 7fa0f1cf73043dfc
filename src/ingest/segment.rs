//! Splitting raw text into content blocks.

/// Default cap for blocks regrouped from sentences.
pub const DEFAULT_MAX_BLOCK_CHARS: usize = 500;

/// Split text into trimmed, non-empty blocks.
///
/// Blank lines separate blocks; line breaks inside a block become spaces.
/// When that yields at most one block, the text is split into sentences
/// instead and regrouped into blocks of at most `max_block_chars`. A single
/// sentence longer than the cap is kept whole.
pub fn segment_text(text: &str, max_block_chars: usize) -> Vec<String> {
    let paragraphs = split_paragraphs(text);
    if paragraphs.len() > 1 {
        return paragraphs;
    }

    let cleaned = collapse_whitespace(text);
    if cleaned.is_empty() {
        return Vec::new();
    }

    group_units(split_sentences(&cleaned), max_block_chars)
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_paragraphs(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(collapse_whitespace(&current.join(" ")));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(collapse_whitespace(&current.join(" ")));
    }

    blocks.retain(|b| !b.is_empty());
    blocks
}

/// Split after `.`, `!` or `?` when followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(_, next)) = chars.peek() {
                if next.is_whitespace() {
                    let end = i + c.len_utf8();
                    sentences.push(text[start..end].trim().to_string());
                    start = end;
                }
            }
        }
    }
    sentences.push(text[start..].trim().to_string());

    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Join units (sentences, caption lines) with spaces into blocks of at most `max_block_chars`.
pub fn group_units(units: Vec<String>, max_block_chars: usize) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in units {
        let len = sentence.chars().count();
        if !current.is_empty() && current_len + 1 + len > max_block_chars {
            blocks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(&sentence);
        current_len += len;
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}
