//! Locating JSON inside free-form model output.

use crate::error::{PodsmithError, Result};

/// Return the first balanced JSON array or object embedded in `raw`.
///
/// Brackets are matched with a stack, so quoted brackets and escaped quotes
/// inside strings do not confuse the scan. When the first opener never
/// closes (or closes with the wrong bracket), scanning resumes at the next
/// opener after it.
pub fn extract_json(raw: &str) -> Result<&str> {
    candidates(raw)
        .next()
        .ok_or_else(|| PodsmithError::NoStructuredOutput {
            raw: raw.to_string(),
        })
}

/// Every balanced JSON-looking span in `raw`, in order of their openers.
pub(crate) fn candidates(raw: &str) -> impl Iterator<Item = &str> {
    let bytes = raw.as_bytes();
    let mut start = 0usize;

    std::iter::from_fn(move || {
        while start < bytes.len() {
            let offset = bytes[start..]
                .iter()
                .position(|b| *b == b'[' || *b == b'{')?;
            let open = start + offset;
            start = open + 1;

            if let Some(close) = match_brackets(bytes, open) {
                start = close + 1;
                return Some(&raw[open..=close]);
            }
        }
        None
    })
}

/// Index of the bracket closing the one at `open`, if the span is balanced.
fn match_brackets(bytes: &[u8], open: usize) -> Option<usize> {
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'[' => stack.push(b']'),
            b'{' => stack.push(b'}'),
            b']' | b'}' => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_array_from_prose() {
        let raw = "Sure! Here are the topics:\n[{\"name\": \"Rust\"}]\nHope that helps.";
        assert_eq!(extract_json(raw).unwrap(), "[{\"name\": \"Rust\"}]");
    }

    #[test]
    fn test_extracts_from_code_fence() {
        let raw = "```json\n{\"speakers\": [{\"id\": \"a\"}]}\n```";
        assert_eq!(extract_json(raw).unwrap(), "{\"speakers\": [{\"id\": \"a\"}]}");
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let raw = r#"[{"text": "a ] tricky [ value with \"quotes\" }"}] trailing ]"#;
        assert_eq!(
            extract_json(raw).unwrap(),
            r#"[{"text": "a ] tricky [ value with \"quotes\" }"}]"#
        );
    }

    #[test]
    fn test_unbalanced_first_candidate_skipped() {
        let raw = "note [unfinished then {\"ok\": true}";
        assert_eq!(extract_json(raw).unwrap(), "{\"ok\": true}");
    }

    #[test]
    fn test_mismatched_closer_is_unbalanced() {
        let raw = "[} {\"a\": 1}";
        assert_eq!(extract_json(raw).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_no_structure() {
        let err = extract_json("I could not find any topics.").unwrap_err();
        assert!(matches!(err, PodsmithError::NoStructuredOutput { .. }));
        assert_eq!(err.raw_output(), Some("I could not find any topics."));
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_json("").is_err());
    }

    #[test]
    fn test_candidates_in_order() {
        let all: Vec<&str> = candidates("[see note] then [1, 2]").collect();
        assert_eq!(all, vec!["[see note]", "[1, 2]"]);
    }
}
