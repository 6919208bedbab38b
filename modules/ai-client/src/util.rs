/// Truncate a string to at most `max_bytes` bytes at a character boundary.
///
/// Prompts mix Hangul (3 bytes per syllable) with ASCII, so a plain byte slice
/// would panic mid-character.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip a surrounding markdown code fence (with or without a language tag)
/// from a model reply.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "text", "markdown", ...) on the opening line.
    let body = match rest.find('\n') {
        Some(idx) if !rest[..idx].contains(' ') => &rest[idx + 1..],
        _ => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_char_boundary() {
        let text = "트렌드 분석";
        let truncated = truncate_to_char_boundary(text, 4);
        assert_eq!(truncated, "트");
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn test_truncate_within_bounds() {
        let text = "Hello";
        assert_eq!(truncate_to_char_boundary(text, 100), "Hello");
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n니즈: A\n```"), "니즈: A");
        assert_eq!(strip_code_blocks("```text\n요약: B\n```"), "요약: B");
        assert_eq!(strip_code_blocks("니즈: A"), "니즈: A");
    }
}
